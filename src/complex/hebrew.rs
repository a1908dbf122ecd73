use super::single_codepoint;
use crate::buffer::{GlyphFlags, GlyphShapingCollection};
use crate::tag::feature;
use crate::unicode::CharExt;
use crate::{Face, Script};

const S_DAGESH_FORMS: &[u32] = &[
    0xFB30, // ALEF
    0xFB31, // BET
    0xFB32, // GIMEL
    0xFB33, // DALET
    0xFB34, // HE
    0xFB35, // VAV
    0xFB36, // ZAYIN
    0x0000, // HET
    0xFB38, // TET
    0xFB39, // YOD
    0xFB3A, // FINAL KAF
    0xFB3B, // KAF
    0xFB3C, // LAMED
    0x0000, // FINAL MEM
    0xFB3E, // MEM
    0x0000, // FINAL NUN
    0xFB40, // NUN
    0xFB41, // SAMEKH
    0x0000, // AYIN
    0xFB43, // FINAL PE
    0xFB44, // PE
    0x0000, // FINAL TSADI
    0xFB46, // TSADI
    0xFB47, // QOF
    0xFB48, // RESH
    0xFB49, // SHIN
    0xFB4A, // TAV
];

fn compose(has_gpos_mark: bool, a: char, b: char) -> Option<char> {
    if let Some(ab) = unicode_normalization::char::compose(a, b) {
        return Some(ab);
    }

    // Presentation forms excluded from normalization are still wanted by
    // old fonts, which position marks by substitution only.
    if has_gpos_mark {
        return None;
    }

    let a = u32::from(a);
    let ab = match u32::from(b) {
        // HIRIQ
        0x05B4 if a == 0x05D9 => 0xFB1D, // YOD
        // PATAH
        0x05B7 => match a {
            0x05D9 => 0xFB1F, // YIDDISH YOD YOD
            0x05D0 => 0xFB2E, // ALEF
            _ => return None,
        },
        // QAMATS
        0x05B8 if a == 0x05D0 => 0xFB2F, // ALEF
        // HOLAM
        0x05B9 if a == 0x05D5 => 0xFB4B, // VAV
        // DAGESH
        0x05BC => match a {
            0x05D0..=0x05EA => S_DAGESH_FORMS[(a - 0x05D0) as usize],
            0xFB2A => 0xFB2C, // SHIN WITH SHIN DOT
            0xFB2B => 0xFB2D, // SHIN WITH SIN DOT
            _ => return None,
        },
        // RAFE
        0x05BF => match a {
            0x05D1 => 0xFB4C, // BET
            0x05DB => 0xFB4D, // KAF
            0x05E4 => 0xFB4E, // PE
            _ => return None,
        },
        // SHIN DOT
        0x05C1 => match a {
            0x05E9 => 0xFB2A, // SHIN
            0xFB49 => 0xFB2C, // SHIN WITH DAGESH
            _ => return None,
        },
        // SIN DOT
        0x05C2 => match a {
            0x05E9 => 0xFB2B, // SHIN
            0xFB49 => 0xFB2D, // SHIN WITH DAGESH
            _ => return None,
        },
        _ => return None,
    };

    if ab == 0 {
        return None;
    }

    char::from_u32(ab)
}

fn has_gpos_mark(face: &Face, glyphs: &GlyphShapingCollection) -> bool {
    let Some(gpos) = face.gpos.as_ref() else {
        return false;
    };

    gpos.select_script(Script::Hebrew).is_some_and(|script| {
        !gpos
            .feature_lookups(feature::MARK_POSITIONING, script, glyphs.language)
            .is_empty()
    })
}

/// Composes letters and points into presentation forms the font maps.
///
/// Runs after `ccmp`. Returns the change of the collection length.
pub(super) fn compose_presentation_forms(
    face: &Face,
    glyphs: &mut GlyphShapingCollection,
    start: usize,
    len: usize,
) -> isize {
    let has_gpos_mark = has_gpos_mark(face, glyphs);
    let mut end = start + len;
    let mut i = start;
    // The presentation form of the glyph at `i`, if it was composed.
    let mut composed = None;

    while i + 1 < end {
        let a = composed.or_else(|| single_codepoint(&glyphs[i]));
        let b = single_codepoint(&glyphs[i + 1]).filter(|c| c.is_unicode_mark());

        let target = match (a, b) {
            (Some(a), Some(b)) => compose(has_gpos_mark, a, b)
                .and_then(|ab| face.glyph_index(ab).map(|glyph_id| (ab, glyph_id))),
            _ => None,
        };

        let Some((ab, glyph_id)) = target else {
            composed = None;
            i += 1;
            continue;
        };

        let point = glyphs.remove(i + 1);
        let glyph = &mut glyphs[i];
        glyph.glyph_id = glyph_id;
        glyph.cluster = glyph.cluster.min(point.cluster);
        glyph.codepoints.extend(point.codepoints);
        glyph.flags |= GlyphFlags::SUBSTITUTED;

        composed = Some(ab);
        end -= 1;
    }

    end as isize - (start + len) as isize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presentation_forms() {
        // YOD + HIRIQ
        assert_eq!(compose(false, '\u{05D9}', '\u{05B4}'), Some('\u{FB1D}'));
        // BET + DAGESH
        assert_eq!(compose(false, '\u{05D1}', '\u{05BC}'), Some('\u{FB31}'));
        // HET + DAGESH has no form
        assert_eq!(compose(false, '\u{05D7}', '\u{05BC}'), None);
        // SHIN + SHIN DOT, then DAGESH
        assert_eq!(compose(false, '\u{05E9}', '\u{05C1}'), Some('\u{FB2A}'));
        assert_eq!(compose(false, '\u{FB2A}', '\u{05BC}'), Some('\u{FB2C}'));
    }

    #[test]
    fn gpos_mark_disables_special_forms() {
        assert_eq!(compose(true, '\u{05D9}', '\u{05B4}'), None);
        // Canonical compositions still happen.
        assert_eq!(compose(true, 'e', '\u{0301}'), Some('\u{00E9}'));
    }
}
