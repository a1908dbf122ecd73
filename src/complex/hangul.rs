use ttf_parser::GlyphId;

use super::single_codepoint;
use crate::buffer::{GlyphShapingCollection, GlyphShapingData};
use crate::tag::feature;
use crate::{Face, Tag};

const L_BASE: u32 = 0x1100;
const V_BASE: u32 = 0x1161;
const T_BASE: u32 = 0x11A7;
const L_COUNT: u32 = 19;
const V_COUNT: u32 = 21;
const T_COUNT: u32 = 28;
const N_COUNT: u32 = V_COUNT * T_COUNT;
const S_COUNT: u32 = L_COUNT * N_COUNT;
const S_BASE: u32 = 0xAC00;

fn is_l(u: u32) -> bool {
    (0x1100..=0x115F).contains(&u) || (0xA960..=0xA97C).contains(&u)
}

fn is_v(u: u32) -> bool {
    (0x1160..=0x11A7).contains(&u) || (0xD7B0..=0xD7C6).contains(&u)
}

fn is_t(u: u32) -> bool {
    (0x11A8..=0x11FF).contains(&u) || (0xD7CB..=0xD7FB).contains(&u)
}

fn is_combining_l(u: u32) -> bool {
    (L_BASE..L_BASE + L_COUNT).contains(&u)
}

fn is_combining_v(u: u32) -> bool {
    (V_BASE..V_BASE + V_COUNT).contains(&u)
}

fn is_combining_t(u: u32) -> bool {
    (T_BASE + 1..T_BASE + T_COUNT).contains(&u)
}

fn is_combined_s(u: u32) -> bool {
    (S_BASE..S_BASE + S_COUNT).contains(&u)
}

fn codepoint(glyph: Option<&GlyphShapingData>) -> u32 {
    glyph.and_then(single_codepoint).map_or(0, u32::from)
}

fn lookup(face: &Face, u: u32) -> Option<(char, GlyphId)> {
    let c = char::from_u32(u)?;
    Some((c, face.glyph_index(c)?))
}

/// Returns a copy of `source` for another character.
fn derive(source: &GlyphShapingData, c: char, glyph_id: GlyphId) -> GlyphShapingData {
    let mut glyph = source.clone();
    glyph.glyph_id = glyph_id;
    glyph.codepoints.clear();
    glyph.codepoints.push(c);
    glyph
}

/// Merges `syllable` jamo into one precomposed glyph.
fn merge(syllable: &[GlyphShapingData], c: char, glyph_id: GlyphId) -> GlyphShapingData {
    let mut glyph = derive(&syllable[0], c, glyph_id);
    glyph.cluster = syllable.iter().map(|g| g.cluster).min().unwrap_or(glyph.cluster);
    glyph
}

const JAMO_FORMS: [Tag; 3] = [
    feature::LEADING_JAMO_FORMS,
    feature::VOWEL_JAMO_FORMS,
    feature::TRAILING_JAMO_FORMS,
];

/// Enables at most one jamo form on a glyph and disables the others.
fn with_jamo_form(mut glyph: GlyphShapingData, form: Option<Tag>) -> GlyphShapingData {
    for tag in JAMO_FORMS {
        glyph.add_feature(tag, form == Some(tag));
    }
    glyph
}

fn tagged(glyph: GlyphShapingData, tag: Tag) -> GlyphShapingData {
    with_jamo_form(glyph, Some(tag))
}

/// Composes or decomposes Hangul syllables.
///
/// A syllable the font maps as a whole is precomposed. Otherwise it is
/// fully decomposed and each jamo gets exactly one of `ljmo`, `vjmo` and
/// `tjmo`. Every other glyph has all three disabled. Returns the change of the collection length.
pub(super) fn compose_syllables(
    face: &Face,
    glyphs: &mut GlyphShapingCollection,
    start: usize,
    len: usize,
) -> isize {
    let input = &glyphs.glyphs()[start..start + len];
    let mut out: Vec<GlyphShapingData> = Vec::with_capacity(len);

    let mut i = 0;
    while i < input.len() {
        let glyph = &input[i];
        let u = codepoint(Some(glyph));

        if is_l(u) && i + 1 < input.len() {
            let l = u;
            let v = codepoint(input.get(i + 1));
            if is_v(v) {
                // <L,V> or <L,V,T>.
                let t = Some(codepoint(input.get(i + 2))).filter(|t| is_t(*t));
                let n = if t.is_some() { 3 } else { 2 };

                if is_combining_l(l) && is_combining_v(v) && t.map_or(true, is_combining_t) {
                    let t_index = t.map_or(0, |t| t - T_BASE);
                    let s = S_BASE + (l - L_BASE) * N_COUNT + (v - V_BASE) * T_COUNT + t_index;
                    if let Some((c, glyph_id)) = lookup(face, s) {
                        out.push(with_jamo_form(merge(&input[i..i + n], c, glyph_id), None));
                        i += n;
                        continue;
                    }
                }

                // Old Hangul, or a syllable the font does not have.
                out.push(tagged(input[i].clone(), feature::LEADING_JAMO_FORMS));
                out.push(tagged(input[i + 1].clone(), feature::VOWEL_JAMO_FORMS));
                if t.is_some() {
                    out.push(tagged(input[i + 2].clone(), feature::TRAILING_JAMO_FORMS));
                }

                i += n;
                continue;
            }
        } else if is_combined_s(u) {
            // <LV>, <LVT> or <LV,T>.
            let s = u;
            let has_glyph = glyph.glyph_id != GlyphId(0);
            let l_index = (s - S_BASE) / N_COUNT;
            let n_index = (s - S_BASE) % N_COUNT;
            let v_index = n_index / T_COUNT;
            let t_index = n_index % T_COUNT;
            let next = codepoint(input.get(i + 1));

            if t_index == 0 && is_combining_t(next) {
                if let Some((c, glyph_id)) = lookup(face, s + next - T_BASE) {
                    out.push(with_jamo_form(merge(&input[i..i + 2], c, glyph_id), None));
                    i += 2;
                    continue;
                }
            }

            // Decompose when the font lacks the syllable, or when a trailing
            // jamo that cannot combine follows.
            if !has_glyph || (t_index == 0 && is_t(next)) {
                let l = lookup(face, L_BASE + l_index);
                let v = lookup(face, V_BASE + v_index);
                let t = if t_index != 0 { lookup(face, T_BASE + t_index).map(Some) } else { Some(None) };

                if let (Some((l, l_id)), Some((v, v_id)), Some(t)) = (l, v, t) {
                    out.push(tagged(derive(glyph, l, l_id), feature::LEADING_JAMO_FORMS));
                    out.push(tagged(derive(glyph, v, v_id), feature::VOWEL_JAMO_FORMS));
                    if let Some((t, t_id)) = t {
                        out.push(tagged(derive(glyph, t, t_id), feature::TRAILING_JAMO_FORMS));
                    } else if has_glyph && is_t(next) {
                        // The following trailing jamo belongs to the syllable.
                        out.push(tagged(input[i + 1].clone(), feature::TRAILING_JAMO_FORMS));
                        i += 1;
                    }

                    i += 1;
                    continue;
                }
            }
        }

        out.push(with_jamo_form(glyph.clone(), None));
        i += 1;
    }

    glyphs.splice(start..start + len, out)
}
