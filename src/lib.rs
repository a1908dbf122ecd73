/*!
`typoshape` applies the OpenType `GSUB` and `GPOS` tables of a font to a run
of glyphs.

Substitution replaces, splits, merges and removes glyphs. Positioning then
adjusts advances and offsets, attaches marks to bases and chains cursive
glyphs. A per-script shaper decides which features run and in which order.

```no_run
let data = std::fs::read("font.ttf").unwrap();
let face = typoshape::Face::from_slice(&data, 0).unwrap();
let glyphs = typoshape::shape(&face, "office", &typoshape::ShapingOptions::default()).unwrap();
for (glyph, pos) in glyphs.iter().zip(glyphs.positions()) {
    println!("{} {}", glyph.glyph_id.0, pos.x_advance);
}
```
*/

#![warn(missing_docs)]

mod buffer;
mod common;
mod complex;
mod error;
mod face;
mod ot;
mod tables;
mod tag;
mod unicode;

pub use ttf_parser::GlyphId;

pub use crate::buffer::{
    GlyphFlags, GlyphPosition, GlyphPositioningCollection, GlyphShapingCollection,
    GlyphShapingData, GlyphSubstitutionCollection,
};
pub use crate::common::{script_tags, Direction, Feature, Script, ShapingOptions};
pub use crate::error::Error;
pub use crate::face::{Face, FontMetrics, LayoutTables};
pub use crate::ot::position::try_update_positions;
pub use crate::ot::substitute::apply_substitution;
pub use crate::ot::{
    MAX_CONTEXT_LENGTH, MAX_LEN_FACTOR, MAX_LEN_MAX, MAX_LEN_MIN, MAX_NESTING_LEVEL,
    MAX_OPS_FACTOR, MAX_OPS_MAX, MAX_OPS_MIN,
};
pub use crate::tag::{feature, Tag};

/// Shapes text with a face.
///
/// Characters are mapped with the face character map, substituted, given
/// their advances and positioned. Clusters are byte offsets into `text`.
pub fn shape(
    face: &Face,
    text: &str,
    options: &ShapingOptions,
) -> Result<GlyphPositioningCollection, Error> {
    let mut glyphs = GlyphSubstitutionCollection::from_text(face, text, options);
    apply_substitution(face, &mut glyphs)?;

    let mut glyphs = GlyphPositioningCollection::new(face, glyphs);
    try_update_positions(face, &mut glyphs)?;
    Ok(glyphs)
}
