//! Matching of glyph sequences against lookup rules.

use ttf_parser::GlyphId;

use super::{ApplyContext, MAX_CONTEXT_LENGTH};
use crate::buffer::{GlyphShapingCollection, GlyphShapingData};
use crate::tables::gdef::GlyphClass;
use crate::tables::gsubgpos::{Lookup, LookupFlags};
use crate::Face;

/// Matches a glyph against the rule element at the given sequence position.
pub type MatchFunc<'a> = dyn Fn(GlyphId, usize) -> bool + 'a;

/// Which glyphs a lookup does not see.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct SkipPolicy {
    flags: LookupFlags,
    mark_filtering_set: Option<u16>,
    mark_attachment_type: u16,
}

impl SkipPolicy {
    pub fn from_lookup<T>(lookup: &Lookup<T>) -> Self {
        SkipPolicy {
            flags: lookup.flags,
            mark_filtering_set: lookup.mark_filtering_set,
            mark_attachment_type: lookup.mark_attachment_type(),
        }
    }

    /// A policy that only skips marks.
    pub fn ignore_marks() -> Self {
        SkipPolicy {
            flags: LookupFlags::IGNORE_MARKS,
            ..SkipPolicy::default()
        }
    }

    /// The same policy without the ignore-base, ignore-ligature and
    /// ignore-mark flags. Mark filtering stays.
    pub fn without_ignore_flags(mut self) -> Self {
        self.flags.remove(LookupFlags::IGNORE_FLAGS);
        self
    }

    #[inline]
    pub fn flags(&self) -> LookupFlags {
        self.flags
    }

    pub fn should_skip(&self, face: &Face, glyph: &GlyphShapingData) -> bool {
        match face.glyph_class(glyph) {
            Some(GlyphClass::Base) => self.flags.contains(LookupFlags::IGNORE_BASE_GLYPHS),
            Some(GlyphClass::Ligature) => self.flags.contains(LookupFlags::IGNORE_LIGATURES),
            Some(GlyphClass::Mark) => {
                if self.flags.contains(LookupFlags::IGNORE_MARKS) {
                    return true;
                }

                if let Some(set) = self.mark_filtering_set {
                    return !face.gdef().is_some_and(|gdef| gdef.is_mark_glyph(glyph.glyph_id, set));
                }

                if self.mark_attachment_type != 0 {
                    let class = face
                        .gdef()
                        .map_or(0, |gdef| gdef.mark_attachment_class(glyph.glyph_id));
                    return class != self.mark_attachment_type;
                }

                false
            }
            Some(GlyphClass::Component) | None => false,
        }
    }
}

/// A cursor that steps over glyphs hidden by a skip policy.
///
/// The index never leaves `lower..upper`. A step that finds no visible glyph
/// before the bound returns `None` and leaves the index where it was.
pub struct SkippingGlyphIterator<'a, 'f> {
    face: &'a Face<'f>,
    glyphs: &'a GlyphShapingCollection,
    policy: SkipPolicy,
    index: usize,
    lower: usize,
    upper: usize,
}

impl<'a, 'f> SkippingGlyphIterator<'a, 'f> {
    pub fn new(
        face: &'a Face<'f>,
        glyphs: &'a GlyphShapingCollection,
        policy: SkipPolicy,
        index: usize,
    ) -> Self {
        SkippingGlyphIterator {
            face,
            glyphs,
            policy,
            index,
            lower: 0,
            upper: glyphs.len(),
        }
    }

    /// Restricts the cursor to `lower..upper`.
    pub fn with_bounds(mut self, lower: usize, upper: usize) -> Self {
        self.upper = upper.min(self.glyphs.len());
        self.lower = lower.min(self.upper);
        self
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Moves the cursor and changes its policy.
    pub fn reset(&mut self, index: usize, policy: SkipPolicy) {
        self.index = index;
        self.policy = policy;
    }

    fn is_visible(&self, index: usize) -> bool {
        !self.policy.should_skip(self.face, &self.glyphs[index])
    }

    /// Moves back to the previous visible glyph.
    pub fn prev(&mut self) -> Option<usize> {
        let mut i = self.index;
        while i > self.lower {
            i -= 1;
            if self.is_visible(i) {
                self.index = i;
                return Some(i);
            }
        }

        None
    }

    /// Moves by `count` visible glyphs, backwards when negative.
    pub fn increment(&mut self, count: isize) -> Option<usize> {
        let mut last = None;
        for _ in 0..count.unsigned_abs() {
            last = if count < 0 { self.prev() } else { self.next() };
            last?;
        }

        last.or(Some(self.index))
    }
}

impl Iterator for SkippingGlyphIterator<'_, '_> {
    type Item = usize;

    /// Moves forward to the next visible glyph.
    fn next(&mut self) -> Option<usize> {
        let mut i = self.index;
        while i + 1 < self.upper {
            i += 1;
            if self.is_visible(i) {
                self.index = i;
                return Some(i);
            }
        }

        None
    }
}

/// The matched input sequence of a rule.
pub struct MatchedInput {
    /// Glyph positions of each input element. Only `count` are used.
    pub positions: [usize; MAX_CONTEXT_LENGTH],
    pub count: usize,
    /// The position right after the last matched glyph.
    pub end: usize,
    pub total_component_count: u8,
}

#[derive(PartialEq)]
enum Ligbase {
    NotChecked,
    MayNotSkip,
    MaySkip,
}

/// Matches the input sequence starting at the current glyph.
///
/// `input_len` is the number of elements after the first glyph, which is
/// already known to be covered.
pub(crate) fn match_input(
    ctx: &ApplyContext,
    input_len: usize,
    match_func: &MatchFunc,
) -> Option<MatchedInput> {
    let count = 1 + input_len;
    if count > MAX_CONTEXT_LENGTH {
        return None;
    }

    // Ligatures cannot be formed across marks attached to different
    // components of an earlier ligature, unless those marks belong to the
    // first glyph itself, or the earlier ligature is hidden from this lookup.

    let glyphs = &*ctx.glyphs;
    let first = &glyphs[ctx.index];
    let first_lig_id = first.lig_id;
    let first_lig_comp = first.lig_comp;
    let mut positions = [0; MAX_CONTEXT_LENGTH];
    let mut total_component_count = first.lig_num_comps;
    let mut ligbase = Ligbase::NotChecked;
    let mut iter = ctx.skippy(ctx.index);

    positions[0] = ctx.index;

    for i in 1..count {
        let pos = iter.next()?;
        let this = &glyphs[pos];
        if !match_func(this.glyph_id, i - 1) {
            return None;
        }

        positions[i] = pos;

        if first_lig_id != 0 && first_lig_comp != 0 {
            if first_lig_id != this.lig_id || first_lig_comp != this.lig_comp {
                if ligbase == Ligbase::NotChecked {
                    let mut base = None;
                    let mut j = ctx.index;
                    while j > 0 && glyphs[j - 1].lig_id == first_lig_id {
                        j -= 1;
                        if glyphs[j].lig_comp == 0 {
                            base = Some(j);
                            break;
                        }
                    }

                    ligbase = match base {
                        Some(j) if ctx.should_skip(j) => Ligbase::MaySkip,
                        _ => Ligbase::MayNotSkip,
                    };
                }

                if ligbase == Ligbase::MayNotSkip {
                    return None;
                }
            }
        } else if this.lig_id != 0 && this.lig_comp != 0 && this.lig_id != first_lig_id {
            return None;
        }

        total_component_count = total_component_count.saturating_add(this.lig_num_comps);
    }

    Some(MatchedInput {
        positions,
        count,
        end: iter.index() + 1,
        total_component_count,
    })
}

/// Matches the backtrack sequence, closest glyph first.
///
/// Sequences longer than `MAX_CONTEXT_LENGTH` never match. Returns the
/// position of the farthest matched glyph.
pub(crate) fn match_backtrack(
    ctx: &ApplyContext,
    backtrack_len: usize,
    match_func: &MatchFunc,
) -> Option<usize> {
    if backtrack_len > MAX_CONTEXT_LENGTH {
        return None;
    }

    let mut iter = ctx.skippy(ctx.index);
    for i in 0..backtrack_len {
        let pos = iter.prev()?;
        if !match_func(ctx.glyphs[pos].glyph_id, i) {
            return None;
        }
    }

    Some(iter.index())
}

/// Matches the lookahead sequence after the input that ends before `end`.
///
/// Sequences longer than `MAX_CONTEXT_LENGTH` never match. Returns the
/// position right after the last matched glyph.
pub(crate) fn match_lookahead(
    ctx: &ApplyContext,
    lookahead_len: usize,
    match_func: &MatchFunc,
    end: usize,
) -> Option<usize> {
    if lookahead_len > MAX_CONTEXT_LENGTH {
        return None;
    }

    let mut iter = ctx.skippy(end - 1);
    for i in 0..lookahead_len {
        let pos = iter.next()?;
        if !match_func(ctx.glyphs[pos].glyph_id, i) {
            return None;
        }
    }

    Some(iter.index() + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::GlyphSubstitutionCollection;
    use crate::ot::{Budget, TableIndex};
    use crate::{Direction, FontMetrics, LayoutTables};

    struct Metrics;

    impl FontMetrics for Metrics {
        fn glyph_index(&self, _: char) -> Option<GlyphId> {
            None
        }

        fn advance(&self, _: GlyphId, _: Direction) -> i32 {
            500
        }

        fn units_per_em(&self) -> u16 {
            1000
        }
    }

    fn face() -> Face<'static> {
        Face::from_tables(LayoutTables::default(), Metrics).unwrap()
    }

    // Glyph ids double as the source character: 1 is a base, 2 a mark.
    fn glyphs(ids: &[u16]) -> GlyphSubstitutionCollection {
        let mut glyphs = GlyphSubstitutionCollection::new();
        for (i, id) in ids.iter().enumerate() {
            let c = if *id == 2 { '\u{0301}' } else { 'a' };
            glyphs.add_glyph(GlyphId(*id), c, i as u32, Direction::LeftToRight);
        }
        glyphs
    }

    fn sequence(values: &[u16]) -> impl Fn(GlyphId, usize) -> bool + '_ {
        move |glyph, i| values.get(i) == Some(&glyph.0)
    }

    #[test]
    fn iterator_skips_marks() {
        let face = face();
        let glyphs = glyphs(&[1, 2, 2, 3]);
        let mut iter = SkippingGlyphIterator::new(&face, &glyphs, SkipPolicy::ignore_marks(), 0);
        assert_eq!(iter.next(), Some(3));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.index(), 3);
        assert_eq!(iter.prev(), Some(0));
        assert_eq!(iter.prev(), None);
        assert_eq!(iter.index(), 0);
    }

    #[test]
    fn iterator_stays_in_bounds() {
        let face = face();
        let glyphs = glyphs(&[1, 1, 1, 1, 1]);
        let mut iter = SkippingGlyphIterator::new(&face, &glyphs, SkipPolicy::default(), 1)
            .with_bounds(1, 3);
        assert_eq!(iter.increment(5), None);
        assert_eq!(iter.index(), 2);
        assert_eq!(iter.increment(-1), Some(1));
        assert_eq!(iter.increment(-1), None);
        assert_eq!(iter.increment(0), Some(1));

        iter.reset(0, SkipPolicy::ignore_marks());
        assert_eq!(iter.index(), 0);
    }

    #[test]
    fn match_input_sequence() {
        let face = face();
        let mut glyphs = glyphs(&[10, 11, 12]);
        let mut budget = Budget::new(3);
        let ctx = ApplyContext::new(TableIndex::GSUB, &face, &mut glyphs, &mut budget, 0, 3);

        let matched = match_input(&ctx, 1, &sequence(&[11])).unwrap();
        assert_eq!(matched.count, 2);
        assert_eq!(&matched.positions[..2], &[0, 1]);
        assert_eq!(matched.end, 2);
        assert_eq!(matched.total_component_count, 2);

        assert!(match_input(&ctx, 1, &sequence(&[12])).is_none());
        assert!(match_input(&ctx, 3, &sequence(&[11, 12, 13])).is_none());
    }

    #[test]
    fn match_context_windows() {
        let face = face();
        let mut glyphs = glyphs(&[10, 11, 12, 13]);
        let mut budget = Budget::new(4);
        let mut ctx = ApplyContext::new(TableIndex::GSUB, &face, &mut glyphs, &mut budget, 0, 4);
        ctx.index = 2;

        assert_eq!(match_backtrack(&ctx, 2, &sequence(&[11, 10])), Some(0));
        assert_eq!(match_backtrack(&ctx, 3, &sequence(&[11, 10, 9])), None);
        assert_eq!(match_lookahead(&ctx, 1, &sequence(&[13]), 3), Some(4));
        assert_eq!(match_lookahead(&ctx, 1, &sequence(&[12]), 3), None);

        // The segment bounds the context.
        ctx.start = 1;
        assert_eq!(match_backtrack(&ctx, 2, &sequence(&[11, 10])), None);
    }

    #[test]
    fn context_length_is_capped() {
        let face = face();
        let mut glyphs = glyphs(&[1; 140]);
        let mut budget = Budget::new(140);
        let mut ctx = ApplyContext::new(TableIndex::GSUB, &face, &mut glyphs, &mut budget, 0, 140);
        let any = |_: GlyphId, _: usize| true;

        assert!(match_input(&ctx, MAX_CONTEXT_LENGTH - 1, &any).is_some());
        assert!(match_input(&ctx, MAX_CONTEXT_LENGTH, &any).is_none());
        assert_eq!(match_lookahead(&ctx, MAX_CONTEXT_LENGTH, &any, 1), Some(65));
        assert_eq!(match_lookahead(&ctx, MAX_CONTEXT_LENGTH + 1, &any, 1), None);

        ctx.index = 139;
        assert_eq!(match_backtrack(&ctx, MAX_CONTEXT_LENGTH, &any), Some(75));
        assert_eq!(match_backtrack(&ctx, MAX_CONTEXT_LENGTH + 1, &any), None);
    }

    #[test]
    fn mark_filtering_policy() {
        let face = face();
        let glyphs = glyphs(&[1, 2]);
        let policy = SkipPolicy {
            mark_filtering_set: Some(0),
            ..SkipPolicy::default()
        };
        // Without GDEF no mark belongs to any set.
        assert!(!policy.should_skip(&face, &glyphs[0]));
        assert!(policy.should_skip(&face, &glyphs[1]));
    }
}
