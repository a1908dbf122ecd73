//! OpenType layout lookup application.

mod contextual;
mod matching;
pub(crate) mod position;
pub(crate) mod substitute;

use log::trace;

use crate::buffer::{GlyphShapingCollection, GlyphShapingData};
use crate::common::is_neutral_script;
use crate::complex::Shaper;
use crate::tables::gsubgpos::{Lookup, ScriptTable};
use crate::unicode::CharExt;
use crate::{Error, Face, Script, Tag};

pub(crate) use matching::{SkipPolicy, SkippingGlyphIterator};

/// The maximum depth of nested lookups.
pub const MAX_NESTING_LEVEL: usize = 6;
/// The maximum number of glyphs in a matched input sequence.
pub const MAX_CONTEXT_LENGTH: usize = 64;

/// A run may grow to its input length times this factor.
pub const MAX_LEN_FACTOR: usize = 64;
/// The lower bound of the run length limit.
pub const MAX_LEN_MIN: usize = 16384;
/// The upper bound of the run length limit.
pub const MAX_LEN_MAX: usize = 0x3FFF_FFFF;
/// A run may take its input length times this factor of lookup attempts.
pub const MAX_OPS_FACTOR: usize = 1024;
/// The lower bound of the operation limit.
pub const MAX_OPS_MIN: usize = 16384;
/// The upper bound of the operation limit.
pub const MAX_OPS_MAX: usize = 0x1FFF_FFFF;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum TableIndex {
    GSUB = 0,
    GPOS = 1,
}

impl TableIndex {
    pub fn name(self) -> &'static str {
        match self {
            TableIndex::GSUB => "GSUB",
            TableIndex::GPOS => "GPOS",
        }
    }
}

/// Work bounds of one shaping call, derived from the input length.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Budget {
    pub max_len: usize,
    ops_left: usize,
    exhausted: bool,
}

impl Budget {
    pub fn new(len: usize) -> Self {
        Budget {
            max_len: len
                .saturating_mul(MAX_LEN_FACTOR)
                .clamp(MAX_LEN_MIN, MAX_LEN_MAX),
            ops_left: len
                .saturating_mul(MAX_OPS_FACTOR)
                .clamp(MAX_OPS_MIN, MAX_OPS_MAX),
            exhausted: false,
        }
    }

    /// Consumes one operation. Returns `false` once any bound is reached.
    #[inline]
    pub fn tick(&mut self) -> bool {
        if self.exhausted || self.ops_left == 0 {
            self.exhausted = true;
            return false;
        }

        self.ops_left -= 1;
        true
    }

    /// Checks that a collection of `len` glyphs may grow by `extra`.
    ///
    /// Marks the budget as spent otherwise.
    pub fn may_grow(&mut self, len: usize, extra: usize) -> bool {
        if len.saturating_add(extra) > self.max_len {
            self.exhausted = true;
            return false;
        }

        true
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

/// State of a lookup being applied to a segment.
///
/// `start..end` is the current segment. Every mutation that changes the
/// collection length adjusts `end` by the same delta.
pub(crate) struct ApplyContext<'a, 'f> {
    pub table_index: TableIndex,
    pub face: &'a Face<'f>,
    pub glyphs: &'a mut GlyphShapingCollection,
    pub budget: &'a mut Budget,
    pub feature: Tag,
    pub lookup_index: u16,
    pub policy: SkipPolicy,
    pub nesting_level_left: usize,
    pub index: usize,
    pub start: usize,
    pub end: usize,
}

impl<'a, 'f> ApplyContext<'a, 'f> {
    pub fn new(
        table_index: TableIndex,
        face: &'a Face<'f>,
        glyphs: &'a mut GlyphShapingCollection,
        budget: &'a mut Budget,
        start: usize,
        end: usize,
    ) -> Self {
        ApplyContext {
            table_index,
            face,
            glyphs,
            budget,
            feature: Tag(0),
            lookup_index: 0,
            policy: SkipPolicy::default(),
            nesting_level_left: MAX_NESTING_LEVEL,
            index: start,
            start,
            end,
        }
    }

    pub fn set_lookup<T>(&mut self, feature: Tag, index: u16, lookup: &Lookup<T>) {
        self.feature = feature;
        self.lookup_index = index;
        self.policy = SkipPolicy::from_lookup(lookup);
    }

    #[inline]
    pub fn cur(&self) -> &GlyphShapingData {
        &self.glyphs[self.index]
    }

    #[inline]
    pub fn is_nested(&self) -> bool {
        self.nesting_level_left != MAX_NESTING_LEVEL
    }

    /// Returns a skip-aware cursor over the segment, placed at `index`.
    pub fn skippy(&self, index: usize) -> SkippingGlyphIterator<'_, 'f> {
        SkippingGlyphIterator::new(self.face, self.glyphs, self.policy, index)
            .with_bounds(self.start, self.end)
    }

    #[inline]
    pub fn should_skip(&self, index: usize) -> bool {
        self.policy.should_skip(self.face, &self.glyphs[index])
    }

    /// Checks that the current lookup may start at `index`.
    pub fn may_apply_at(&self, index: usize) -> bool {
        let glyph = &self.glyphs[index];
        glyph.is_feature_enabled(self.feature) && !self.policy.should_skip(self.face, glyph)
    }

    /// Replaces the current glyph. The index is left unchanged.
    pub fn replace_glyph(&mut self, glyph_id: ttf_parser::GlyphId) {
        self.glyphs.replace(self.index, glyph_id);
    }

    /// Removes the current glyph. The index now points to the next one.
    pub fn delete_glyph(&mut self) {
        self.glyphs.remove(self.index);
        self.end -= 1;
    }

    /// Replaces the current glyph with a sequence and moves past it.
    ///
    /// Refuses to grow the collection beyond the length bound.
    pub fn multiply_glyph(&mut self, glyph_ids: &[ttf_parser::GlyphId]) -> bool {
        let extra = glyph_ids.len().saturating_sub(1);
        if !self.budget.may_grow(self.glyphs.len(), extra) {
            return false;
        }

        self.glyphs.multiply(self.index, glyph_ids);
        self.end += extra;
        self.index += glyph_ids.len();
        true
    }

    /// Applies a nested lookup at the current index.
    pub fn recurse(&mut self, lookup_index: u16) -> Result<bool, Error> {
        if self.nesting_level_left == 0 || !self.budget.tick() {
            return Ok(false);
        }

        let face = self.face;
        let saved = (self.lookup_index, self.policy);
        self.nesting_level_left -= 1;
        self.lookup_index = lookup_index;

        let result = match self.table_index {
            TableIndex::GSUB => match face.gsub.as_ref().and_then(|t| t.lookup(lookup_index)) {
                Some(lookup) => {
                    self.policy = SkipPolicy::from_lookup(lookup);
                    lookup.apply(self)
                }
                None => Ok(false),
            },
            TableIndex::GPOS => match face.gpos.as_ref().and_then(|t| t.lookup(lookup_index)) {
                Some(lookup) => {
                    self.policy = SkipPolicy::from_lookup(lookup);
                    lookup.apply(self)
                }
                None => Ok(false),
            },
        };

        self.nesting_level_left += 1;
        (self.lookup_index, self.policy) = saved;
        result
    }
}

/// A lookup or subtable that can be applied at the current index.
pub(crate) trait Apply {
    /// Applies at `ctx.index`.
    ///
    /// On success the index points to the next position to try. On failure
    /// the collection and the index are left untouched.
    fn apply(&self, ctx: &mut ApplyContext) -> Result<bool, Error>;
}

/// Walks a lookup over the segment.
///
/// Reverse lookups run from the segment end and never move the index.
pub(crate) fn apply_string<L: Apply>(
    ctx: &mut ApplyContext,
    lookup: &L,
    reverse: bool,
) -> Result<bool, Error> {
    let mut applied = false;
    if !reverse {
        ctx.index = ctx.start;
        while ctx.index < ctx.end {
            if !ctx.budget.tick() {
                break;
            }

            if ctx.may_apply_at(ctx.index) && lookup.apply(ctx)? {
                applied = true;
            } else {
                ctx.index += 1;
            }
        }
    } else {
        let mut i = ctx.end;
        while i > ctx.start {
            i -= 1;
            if !ctx.budget.tick() {
                break;
            }

            ctx.index = i;
            if ctx.may_apply_at(i) && lookup.apply(ctx)? {
                applied = true;
            }
        }
    }

    Ok(applied)
}

/// A maximal run of glyphs sharing one script.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct Segment {
    pub start: usize,
    pub end: usize,
    pub script: Script,
}

/// Finds the script segment that begins at `start`.
///
/// Neutral glyphs join the surrounding script. A forced script makes the
/// rest of the run one segment.
pub(crate) fn next_segment(glyphs: &GlyphShapingCollection, start: usize) -> Segment {
    if let Some(script) = glyphs.script {
        return Segment { start, end: glyphs.len(), script };
    }

    let mut script = None;
    let mut end = start;
    while end < glyphs.len() {
        let current = glyphs[end].first_codepoint().map_or(Script::Common, |c| c.script());
        if !is_neutral_script(current) {
            match script {
                None => script = Some(current),
                Some(s) if s != current => break,
                _ => {}
            }
        }

        end += 1;
    }

    Segment { start, end, script: script.unwrap_or(Script::Common) }
}

pub(crate) fn trace_segment(
    table: TableIndex,
    segment: &Segment,
    chosen: Option<&ScriptTable>,
    shaper: &Shaper,
) {
    trace!(
        "{} segment {}..{}: script {:?}, tag {}, {:?} shaper",
        table.name(),
        segment.start,
        segment.end,
        segment.script,
        chosen.map_or(Tag(0), |s| s.tag),
        shaper.kind(),
    );
}
