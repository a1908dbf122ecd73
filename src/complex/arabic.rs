use super::arabic_table::{joining_type, JoiningType};
use super::{decompose_unmapped, ShapingStage};
use crate::buffer::GlyphShapingData;
use crate::tag::feature;
use crate::Tag;

/// Positional forms, indexed by [`Action`].
const FORM_FEATURES: [Tag; 7] = [
    feature::ISOLATED_FORMS,
    feature::TERMINAL_FORMS_1,
    feature::TERMINAL_FORMS_2,
    feature::TERMINAL_FORMS_3,
    feature::MEDIAL_FORMS_1,
    feature::MEDIAL_FORMS_2,
    feature::INITIAL_FORMS,
];

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Action {
    Isol = 0,
    Fina = 1,
    Fin2 = 2,
    Fin3 = 3,
    Medi = 4,
    Med2 = 5,
    Init = 6,
    None = 7,
}

impl Action {
    fn feature(self) -> Option<Tag> {
        FORM_FEATURES.get(self as usize).copied()
    }
}

struct Transition {
    prev: Action,
    curr: Action,
    next: usize,
}

const fn t(prev: Action, curr: Action, next: usize) -> Transition {
    Transition { prev, curr, next }
}

use Action::{Fin2, Fin3, Fina, Init, Isol, Med2, Medi, None as No};

// Columns: U, L, R, D, alaph, dalath/rish.
// States: 0 start, 1 after R, 2 after D (or L), 3 after D joined, 4 after
// alaph joined, 5 after isolated alaph, 6 after dalath/rish.
#[rustfmt::skip]
const STATE_TABLE: [[Transition; 6]; 7] = [
    [t(No, No, 0), t(No, Isol, 2), t(No, Isol, 1), t(No, Isol, 2), t(No, Isol, 1), t(No, Isol, 6)],
    [t(No, No, 0), t(No, Isol, 2), t(No, Isol, 1), t(No, Isol, 2), t(No, Fin2, 5), t(No, Isol, 6)],
    [t(No, No, 0), t(No, Isol, 2), t(Init, Fina, 1), t(Init, Fina, 3), t(Init, Fina, 4), t(Init, Fina, 6)],
    [t(No, No, 0), t(No, Isol, 2), t(Medi, Fina, 1), t(Medi, Fina, 3), t(Medi, Fina, 4), t(Medi, Fina, 6)],
    [t(No, No, 0), t(No, Isol, 2), t(Med2, Isol, 1), t(Med2, Isol, 2), t(Med2, Fin2, 5), t(Med2, Isol, 6)],
    [t(No, No, 0), t(No, Isol, 2), t(Isol, Isol, 1), t(Isol, Isol, 2), t(Isol, Fin2, 5), t(Isol, Isol, 6)],
    [t(No, No, 0), t(No, Isol, 2), t(No, Isol, 1), t(No, Isol, 2), t(No, Fin3, 5), t(No, Isol, 6)],
];

pub(super) fn stages() -> Vec<ShapingStage> {
    let mut stages = vec![
        ShapingStage::new(feature::REQUIRED_VARIATION_ALTERNATES),
        ShapingStage {
            feature: feature::GLYPH_COMPOSITION_DECOMPOSITION,
            pre_process: Some(decompose_unmapped),
            post_process: None,
        },
        ShapingStage::new(feature::LOCALIZED_FORMS),
    ];

    // Forms are applied one after another, so that later ones can rely on
    // earlier substitutions.
    stages.extend(FORM_FEATURES.iter().map(|tag| ShapingStage::new(*tag)));

    stages.extend(
        [
            feature::REQUIRED_LIGATURES,
            feature::REQUIRED_CONTEXTUAL_ALTERNATES,
            feature::CONTEXTUAL_ALTERNATES,
            feature::STANDARD_LIGATURES,
            feature::CONTEXTUAL_LIGATURES,
            feature::MARK_POSITIONING_VIA_SUBSTITUTION,
        ]
        .map(ShapingStage::new),
    );

    stages
}

/// Runs the joining state machine over a segment.
///
/// Transparent glyphs are skipped and get no form.
fn joining_actions(glyphs: &[GlyphShapingData]) -> Vec<Action> {
    let mut actions = vec![Action::None; glyphs.len()];
    let mut prev: Option<usize> = None;
    let mut state = 0;

    for (i, glyph) in glyphs.iter().enumerate() {
        let kind = glyph.first_codepoint().map_or(JoiningType::U, joining_type);
        let Some(column) = kind.column() else {
            continue;
        };

        let entry = &STATE_TABLE[state][column];
        if entry.prev != Action::None {
            if let Some(prev) = prev {
                actions[prev] = entry.prev;
            }
        }

        actions[i] = entry.curr;
        prev = Some(i);
        state = entry.next;
    }

    actions
}

/// Turns on the one positional form each glyph takes and turns off the rest.
pub(super) fn assign_forms(glyphs: &mut [GlyphShapingData]) {
    let actions = joining_actions(glyphs);
    for (glyph, action) in glyphs.iter_mut().zip(actions) {
        let form = action.feature();
        for tag in FORM_FEATURES {
            glyph.add_feature(tag, form == Some(tag));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Direction;
    use ttf_parser::GlyphId;

    fn forms(text: &str) -> Vec<Option<Tag>> {
        let glyphs: Vec<GlyphShapingData> = text
            .chars()
            .enumerate()
            .map(|(i, c)| GlyphShapingData::new(GlyphId(1), c, i as u32, Direction::RightToLeft))
            .collect();
        joining_actions(&glyphs).into_iter().map(Action::feature).collect()
    }

    fn tags(names: &[&[u8; 4]]) -> Vec<Option<Tag>> {
        names
            .iter()
            .map(|name| (*name != b"----").then(|| Tag::from_bytes(name)))
            .collect()
    }

    #[test]
    fn dual_joining_word() {
        // beh beh beh
        assert_eq!(
            forms("\u{0628}\u{0628}\u{0628}"),
            tags(&[b"init", b"medi", b"fina"])
        );
    }

    #[test]
    fn right_joining_breaks() {
        // beh alef beh
        assert_eq!(
            forms("\u{0628}\u{0627}\u{0628}"),
            tags(&[b"init", b"fina", b"isol"])
        );
    }

    #[test]
    fn marks_are_transparent() {
        // beh fatha beh
        assert_eq!(
            forms("\u{0628}\u{064E}\u{0628}"),
            tags(&[b"init", b"----", b"fina"])
        );
    }

    #[test]
    fn non_joining_resets() {
        // beh space beh
        assert_eq!(
            forms("\u{0628} \u{0628}"),
            tags(&[b"isol", b"----", b"isol"])
        );
    }

    #[test]
    fn syriac_alaph() {
        // beth alaph: a final alaph after a joining letter
        assert_eq!(forms("\u{0712}\u{0710}"), tags(&[b"init", b"fina"]));
        // alaph after a non-joining letter
        assert_eq!(forms(" \u{0710}"), tags(&[b"----", b"isol"]));
        // alaph after dalath
        assert_eq!(forms("\u{0715}\u{0710}"), tags(&[b"isol", b"fin3"]));
    }

    #[test]
    fn forms_are_exclusive() {
        let mut glyphs: Vec<GlyphShapingData> = "\u{0628}\u{0628}"
            .chars()
            .map(|c| GlyphShapingData::new(GlyphId(1), c, 0, Direction::RightToLeft))
            .collect();
        assign_forms(&mut glyphs);

        assert!(glyphs[0].is_feature_enabled(feature::INITIAL_FORMS));
        assert!(!glyphs[0].is_feature_enabled(feature::TERMINAL_FORMS_1));
        assert!(glyphs[1].is_feature_enabled(feature::TERMINAL_FORMS_1));
        assert!(!glyphs[1].is_feature_enabled(feature::ISOLATED_FORMS));
    }
}
