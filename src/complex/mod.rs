//! Script-specific shaping strategies.

mod arabic;
mod arabic_table;
mod hangul;
mod hebrew;

use log::trace;
use ttf_parser::GlyphId;

use crate::buffer::{GlyphShapingCollection, GlyphShapingData};
use crate::common::script_tags;
use crate::tag::feature;
use crate::unicode::CharExt;
use crate::{Direction, Face, Feature, Script, Tag};

/// A hook that runs around a shaping stage.
///
/// Receives the segment as `start` and `len` and returns the change of the
/// collection length.
pub type StageHook = fn(&Face, &mut GlyphShapingCollection, usize, usize) -> isize;

/// One feature of a shaper, with optional hooks around its lookups.
#[derive(Clone, Copy, Debug)]
pub struct ShapingStage {
    pub feature: Tag,
    pub pre_process: Option<StageHook>,
    pub post_process: Option<StageHook>,
}

impl ShapingStage {
    const fn new(feature: Tag) -> Self {
        ShapingStage { feature, pre_process: None, post_process: None }
    }
}

/// When mark advances are set to zero.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MarkZeroingMode {
    None,
    PreGpos,
    PostGpos,
}

/// A family of scripts sharing one shaping strategy.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ShaperKind {
    Default,
    Arabic,
    Hebrew,
    Hangul,
}

impl ShaperKind {
    /// Picks a shaper for a script and the script tag chosen in the font.
    ///
    /// Syriac and N'Ko join like Arabic only when the font has a script
    /// entry for them. Otherwise there is nothing to join with.
    pub fn select(script: Script, chosen: Option<Tag>) -> Self {
        match script {
            Script::Arabic => ShaperKind::Arabic,
            Script::Syriac | Script::Nko => {
                if chosen.is_some_and(|tag| script_tags(script).contains(&tag)) {
                    ShaperKind::Arabic
                } else {
                    ShaperKind::Default
                }
            }
            Script::Hebrew => ShaperKind::Hebrew,
            Script::Hangul => ShaperKind::Hangul,
            _ => ShaperKind::Default,
        }
    }

    pub fn mark_zeroing_mode(self) -> MarkZeroingMode {
        match self {
            ShaperKind::Default | ShaperKind::Arabic => MarkZeroingMode::PostGpos,
            ShaperKind::Hebrew => MarkZeroingMode::PreGpos,
            ShaperKind::Hangul => MarkZeroingMode::None,
        }
    }
}

const POSITIONING_FEATURES: &[Tag] = &[
    feature::CURSIVE_POSITIONING,
    feature::KERNING,
    feature::DISTANCES,
    feature::ABOVE_BASE_MARK_POSITIONING,
    feature::BELOW_BASE_MARK_POSITIONING,
    feature::MARK_POSITIONING,
    feature::MARK_TO_MARK_POSITIONING,
];

/// A planned shaper for one script segment.
#[derive(Clone, Debug)]
pub struct Shaper {
    kind: ShaperKind,
    stages: Vec<ShapingStage>,
}

impl Shaper {
    /// Builds the stage list for a shaper kind and direction.
    ///
    /// Enabled user features that no stage covers run last.
    pub fn new(kind: ShaperKind, direction: Direction, user_features: &[Feature]) -> Self {
        let mut stages = match kind {
            ShaperKind::Arabic => arabic::stages(),
            _ => common_stages(kind, direction),
        };

        stages.extend(POSITIONING_FEATURES.iter().map(|tag| ShapingStage::new(*tag)));

        for user in user_features.iter().filter(|f| f.enabled) {
            if !stages.iter().any(|stage| stage.feature == user.tag) {
                stages.push(ShapingStage::new(user.tag));
            }
        }

        trace!("{:?} shaper with {} stages", kind, stages.len());
        Shaper { kind, stages }
    }

    #[inline]
    pub fn kind(&self) -> ShaperKind {
        self.kind
    }

    #[inline]
    pub fn stages(&self) -> &[ShapingStage] {
        &self.stages
    }

    #[inline]
    pub fn mark_zeroing_mode(&self) -> MarkZeroingMode {
        self.kind.mark_zeroing_mode()
    }

    /// Prepares a segment before any lookup runs.
    ///
    /// Returns the change of the collection length.
    pub fn plan(
        &self,
        face: &Face,
        glyphs: &mut GlyphShapingCollection,
        start: usize,
        len: usize,
    ) -> isize {
        match self.kind {
            ShaperKind::Hangul => hangul::compose_syllables(face, glyphs, start, len),
            _ => {
                reorder_marks(&mut glyphs.glyphs_mut()[start..start + len]);
                0
            }
        }
    }

    /// Sets the feature toggles of a segment.
    ///
    /// Toggles already on a glyph, like the user ones, are kept.
    pub fn assign_features(&self, glyphs: &mut GlyphShapingCollection, start: usize, len: usize) {
        if self.kind == ShaperKind::Arabic {
            arabic::assign_forms(&mut glyphs.glyphs_mut()[start..start + len]);
        }

        for stage in &self.stages {
            glyphs.add_feature(start, len, stage.feature, true);
        }
    }
}

fn common_stages(kind: ShaperKind, direction: Direction) -> Vec<ShapingStage> {
    let mut stages = vec![ShapingStage::new(feature::REQUIRED_VARIATION_ALTERNATES)];

    if direction.is_horizontal() {
        if direction.is_forward() {
            stages.push(ShapingStage::new(feature::LEFT_TO_RIGHT_ALTERNATES));
            stages.push(ShapingStage::new(feature::LEFT_TO_RIGHT_MIRRORED_FORMS));
        } else {
            stages.push(ShapingStage::new(feature::RIGHT_TO_LEFT_ALTERNATES));
            stages.push(ShapingStage::new(feature::RIGHT_TO_LEFT_MIRRORED_FORMS));
        }
    }

    stages.push(ShapingStage {
        feature: feature::GLYPH_COMPOSITION_DECOMPOSITION,
        pre_process: Some(decompose_unmapped),
        post_process: match kind {
            ShaperKind::Hebrew => Some(hebrew::compose_presentation_forms),
            _ => None,
        },
    });
    stages.push(ShapingStage::new(feature::LOCALIZED_FORMS));

    if kind == ShaperKind::Hangul {
        stages.push(ShapingStage::new(feature::LEADING_JAMO_FORMS));
        stages.push(ShapingStage::new(feature::VOWEL_JAMO_FORMS));
        stages.push(ShapingStage::new(feature::TRAILING_JAMO_FORMS));
    }

    stages.push(ShapingStage::new(feature::REQUIRED_LIGATURES));

    if direction.is_horizontal() {
        // Hangul fonts put jamo lookups into `calt`, which must not run.
        if kind != ShaperKind::Hangul {
            stages.push(ShapingStage::new(feature::CONTEXTUAL_ALTERNATES));
        }
        stages.push(ShapingStage::new(feature::CONTEXTUAL_LIGATURES));
        stages.push(ShapingStage::new(feature::STANDARD_LIGATURES));
        stages.push(ShapingStage::new(feature::REQUIRED_CONTEXTUAL_ALTERNATES));
    } else {
        stages.push(ShapingStage::new(feature::VERTICAL_ALTERNATES));
    }

    stages
}

/// Returns the only codepoint of a glyph that was not merged with others.
pub(crate) fn single_codepoint(glyph: &GlyphShapingData) -> Option<char> {
    match glyph.codepoints.as_slice() {
        [c] => Some(*c),
        _ => None,
    }
}

/// Sorts every run of combining marks by combining class.
///
/// The sort is stable, so marks of the same class keep their order.
fn reorder_marks(glyphs: &mut [GlyphShapingData]) {
    let class = |glyph: &GlyphShapingData| glyph.first_codepoint().map_or(0, |c| c.combining_class());

    let mut i = 0;
    while i < glyphs.len() {
        if class(&glyphs[i]) == 0 {
            i += 1;
            continue;
        }

        let start = i;
        while i < glyphs.len() && class(&glyphs[i]) != 0 {
            i += 1;
        }

        if i - start > 1 {
            glyphs[start..i].sort_by_key(class);
        }
    }
}

/// Splits glyphs the font cannot map into their canonical decomposition.
///
/// Only done when the font maps every part.
fn decompose_unmapped(
    face: &Face,
    glyphs: &mut GlyphShapingCollection,
    start: usize,
    len: usize,
) -> isize {
    let mut end = start + len;
    let mut i = start;
    while i < end {
        let glyph = &glyphs[i];
        let Some(c) = single_codepoint(glyph).filter(|_| glyph.glyph_id == GlyphId(0)) else {
            i += 1;
            continue;
        };

        let mut parts: Vec<char> = Vec::new();
        unicode_normalization::char::decompose_canonical(c, |part| parts.push(part));
        let mapped: Option<Vec<GlyphId>> = parts.iter().map(|part| face.glyph_index(*part)).collect();

        let Some(ids) = mapped.filter(|ids| ids.len() > 1) else {
            i += 1;
            continue;
        };

        let source = glyph.clone();
        let decomposed = parts.iter().zip(&ids).map(|(part, id)| {
            let mut glyph = source.clone();
            glyph.glyph_id = *id;
            glyph.codepoints.clear();
            glyph.codepoints.push(*part);
            glyph
        });

        let delta = glyphs.splice(i..i + 1, decomposed);
        end = end.saturating_add_signed(delta);
        i += ids.len();
    }

    end as isize - (start + len) as isize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FontMetrics, LayoutTables};

    struct Metrics;

    impl FontMetrics for Metrics {
        fn glyph_index(&self, c: char) -> Option<GlyphId> {
            match c {
                'e' => Some(GlyphId(1)),
                '\u{0301}' => Some(GlyphId(2)),
                _ => None,
            }
        }

        fn advance(&self, _: GlyphId, _: Direction) -> i32 {
            0
        }

        fn units_per_em(&self) -> u16 {
            1000
        }
    }

    fn collection(text: &str) -> GlyphShapingCollection {
        let mut glyphs = GlyphShapingCollection::default();
        for (i, c) in text.chars().enumerate() {
            glyphs.push(GlyphShapingData::new(GlyphId(0), c, i as u32, Direction::LeftToRight));
        }
        glyphs
    }

    fn tags(shaper: &Shaper) -> Vec<Tag> {
        shaper.stages().iter().map(|stage| stage.feature).collect()
    }

    #[test]
    fn shaper_selection() {
        assert_eq!(ShaperKind::select(Script::Arabic, None), ShaperKind::Arabic);
        assert_eq!(ShaperKind::select(Script::Syriac, Some(Tag::from_bytes(b"syrc"))), ShaperKind::Arabic);
        assert_eq!(ShaperKind::select(Script::Syriac, Some(Tag::default_script())), ShaperKind::Default);
        assert_eq!(ShaperKind::select(Script::Hebrew, None), ShaperKind::Hebrew);
        assert_eq!(ShaperKind::select(Script::Hangul, None), ShaperKind::Hangul);
        assert_eq!(ShaperKind::select(Script::Latin, None), ShaperKind::Default);
    }

    #[test]
    fn zeroing_modes() {
        assert_eq!(ShaperKind::Default.mark_zeroing_mode(), MarkZeroingMode::PostGpos);
        assert_eq!(ShaperKind::Hebrew.mark_zeroing_mode(), MarkZeroingMode::PreGpos);
        assert_eq!(ShaperKind::Hangul.mark_zeroing_mode(), MarkZeroingMode::None);
    }

    #[test]
    fn direction_features() {
        let ltr = tags(&Shaper::new(ShaperKind::Default, Direction::LeftToRight, &[]));
        assert!(ltr.contains(&feature::LEFT_TO_RIGHT_ALTERNATES));
        assert!(!ltr.contains(&feature::RIGHT_TO_LEFT_MIRRORED_FORMS));
        assert!(ltr.contains(&feature::STANDARD_LIGATURES));

        let ttb = tags(&Shaper::new(ShaperKind::Default, Direction::TopToBottom, &[]));
        assert!(ttb.contains(&feature::VERTICAL_ALTERNATES));
        assert!(!ttb.contains(&feature::STANDARD_LIGATURES));
        assert_eq!(ttb.last(), Some(&feature::MARK_TO_MARK_POSITIONING));
    }

    #[test]
    fn hangul_drops_calt() {
        let stages = tags(&Shaper::new(ShaperKind::Hangul, Direction::LeftToRight, &[]));
        assert!(!stages.contains(&feature::CONTEXTUAL_ALTERNATES));
        assert!(stages.contains(&feature::LEADING_JAMO_FORMS));
    }

    #[test]
    fn user_features_become_stages() {
        let smcp = Tag::from_bytes(b"smcp");
        let user = [
            Feature::new(smcp, true),
            Feature::new(feature::KERNING, true),
            Feature::new(Tag::from_bytes(b"onum"), false),
        ];
        let stages = tags(&Shaper::new(ShaperKind::Default, Direction::LeftToRight, &user));
        assert_eq!(stages.last(), Some(&smcp));
        assert_eq!(stages.iter().filter(|t| **t == feature::KERNING).count(), 1);
        assert!(!stages.contains(&Tag::from_bytes(b"onum")));
    }

    #[test]
    fn user_toggle_wins() {
        let mut glyphs = collection("ab");
        glyphs[0].add_feature(feature::STANDARD_LIGATURES, false);
        let shaper = Shaper::new(ShaperKind::Default, Direction::LeftToRight, &[]);
        shaper.assign_features(&mut glyphs, 0, 2);
        assert!(!glyphs[0].is_feature_enabled(feature::STANDARD_LIGATURES));
        assert!(glyphs[1].is_feature_enabled(feature::STANDARD_LIGATURES));
    }

    #[test]
    fn marks_sorted_by_class() {
        // acute (230), dot below (220), grave (230)
        let mut glyphs = collection("a\u{0301}\u{0323}\u{0300}b");
        reorder_marks(glyphs.glyphs_mut());
        let chars: Vec<char> = glyphs.iter().filter_map(|g| g.first_codepoint()).collect();
        assert_eq!(chars, ['a', '\u{0323}', '\u{0301}', '\u{0300}', 'b']);
    }

    #[test]
    fn unmapped_glyphs_decompose() {
        let face = Face::from_tables(LayoutTables::default(), Metrics).unwrap();
        let mut glyphs = collection("\u{00E9}x\u{00E8}");

        let delta = decompose_unmapped(&face, &mut glyphs, 0, 3);
        assert_eq!(delta, 1);

        let ids: Vec<u16> = glyphs.iter().map(|g| g.glyph_id.0).collect();
        assert_eq!(ids, [1, 2, 0, 0]);
        assert_eq!(glyphs[1].cluster, 0);
        assert_eq!(glyphs[1].first_codepoint(), Some('\u{0301}'));
    }
}
