use log::debug;
use ttf_parser::GlyphId;

use crate::tables::gdef::{GlyphClass, GlyphDefinitionTable};
use crate::tables::gpos::PositioningTable;
use crate::tables::gsub::SubstitutionTable;
use crate::unicode::CharExt;
use crate::{Direction, Error, GlyphShapingData};

/// Font metrics needed by shaping.
///
/// Implemented by the layer that owns the font's character map and
/// horizontal/vertical metrics tables.
pub trait FontMetrics {
    /// Maps a character to a glyph.
    fn glyph_index(&self, c: char) -> Option<GlyphId>;

    /// Returns the advance of a glyph along `direction`, in font units.
    fn advance(&self, glyph: GlyphId, direction: Direction) -> i32;

    /// Returns the number of font units per EM.
    fn units_per_em(&self) -> u16;
}

impl FontMetrics for ttf_parser::Face<'_> {
    fn glyph_index(&self, c: char) -> Option<GlyphId> {
        ttf_parser::Face::glyph_index(self, c)
    }

    fn advance(&self, glyph: GlyphId, direction: Direction) -> i32 {
        if direction.is_horizontal() {
            self.glyph_hor_advance(glyph).map_or(0, i32::from)
        } else {
            self.glyph_ver_advance(glyph)
                .map_or_else(|| i32::from(ttf_parser::Face::units_per_em(self)), i32::from)
        }
    }

    fn units_per_em(&self) -> u16 {
        ttf_parser::Face::units_per_em(self)
    }
}

/// Raw layout table data.
///
/// Any table may be absent.
#[derive(Clone, Copy, Default, Debug)]
pub struct LayoutTables<'a> {
    /// The `GDEF` table.
    pub gdef: Option<&'a [u8]>,
    /// The `GSUB` table.
    pub gsub: Option<&'a [u8]>,
    /// The `GPOS` table.
    pub gpos: Option<&'a [u8]>,
}

/// A font face with parsed layout tables.
///
/// Tables are parsed once and never mutated, so a `Face` can be shared
/// between threads.
pub struct Face<'a> {
    pub(crate) gdef: Option<GlyphDefinitionTable<'a>>,
    pub(crate) gsub: Option<SubstitutionTable<'a>>,
    pub(crate) gpos: Option<PositioningTable<'a>>,
    metrics: Box<dyn FontMetrics + Send + Sync + 'a>,
}

impl<'a> Face<'a> {
    /// Creates a new `Face` from font data.
    ///
    /// Data will be referenced, not owned.
    pub fn from_slice(data: &'a [u8], face_index: u32) -> Result<Self, Error> {
        let face = ttf_parser::Face::parse(data, face_index)?;
        let raw = face.raw_face();
        let tables = LayoutTables {
            gdef: raw.table(ttf_parser::Tag::from_bytes(b"GDEF")),
            gsub: raw.table(ttf_parser::Tag::from_bytes(b"GSUB")),
            gpos: raw.table(ttf_parser::Tag::from_bytes(b"GPOS")),
        };

        Self::from_tables(tables, face)
    }

    /// Creates a new `Face` from layout tables and metrics.
    ///
    /// A malformed table fails the whole face.
    pub fn from_tables<M>(tables: LayoutTables<'a>, metrics: M) -> Result<Self, Error>
    where
        M: FontMetrics + Send + Sync + 'a,
    {
        let gdef = tables.gdef.map(GlyphDefinitionTable::parse).transpose()?;
        let gsub = tables.gsub.map(SubstitutionTable::parse).transpose()?;
        let gpos = tables.gpos.map(PositioningTable::parse).transpose()?;

        debug!(
            "loaded layout tables: GDEF {}, GSUB {}, GPOS {}",
            gdef.is_some(),
            gsub.is_some(),
            gpos.is_some()
        );

        Ok(Face {
            gdef,
            gsub,
            gpos,
            metrics: Box::new(metrics),
        })
    }

    /// Maps a character to a glyph.
    #[inline]
    pub fn glyph_index(&self, c: char) -> Option<GlyphId> {
        self.metrics.glyph_index(c)
    }

    /// Returns the advance of a glyph along `direction`.
    #[inline]
    pub fn advance(&self, glyph: GlyphId, direction: Direction) -> i32 {
        self.metrics.advance(glyph, direction)
    }

    /// Returns the number of font units per EM.
    #[inline]
    pub fn units_per_em(&self) -> u16 {
        self.metrics.units_per_em()
    }

    /// Checks that the face has a `GSUB` table.
    pub fn has_substitutions(&self) -> bool {
        self.gsub.is_some()
    }

    /// Checks that the face has a `GPOS` table.
    pub fn has_positioning(&self) -> bool {
        self.gpos.is_some()
    }

    pub(crate) fn gdef(&self) -> Option<&GlyphDefinitionTable<'a>> {
        self.gdef.as_ref()
    }

    /// Classifies a glyph for lookup flag filtering.
    ///
    /// Uses the GDEF glyph classes when present. Otherwise a glyph whose
    /// first codepoint is a mark is a mark, one with several codepoints is a
    /// ligature, and everything else is a base.
    pub(crate) fn glyph_class(&self, glyph: &GlyphShapingData) -> Option<GlyphClass> {
        if let Some(gdef) = self.gdef.as_ref().filter(|gdef| gdef.has_glyph_classes()) {
            return gdef.glyph_class(glyph.glyph_id);
        }

        if glyph.first_codepoint().is_some_and(|c| c.is_unicode_mark()) {
            Some(GlyphClass::Mark)
        } else if glyph.codepoint_count() > 1 {
            Some(GlyphClass::Ligature)
        } else {
            Some(GlyphClass::Base)
        }
    }

    #[inline]
    pub(crate) fn is_mark(&self, glyph: &GlyphShapingData) -> bool {
        self.glyph_class(glyph) == Some(GlyphClass::Mark)
    }
}

impl core::fmt::Debug for Face<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Face")
            .field("gdef", &self.gdef.is_some())
            .field("gsub", &self.gsub.is_some())
            .field("gpos", &self.gpos.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoMetrics;

    impl FontMetrics for NoMetrics {
        fn glyph_index(&self, _: char) -> Option<GlyphId> {
            None
        }

        fn advance(&self, _: GlyphId, _: Direction) -> i32 {
            0
        }

        fn units_per_em(&self) -> u16 {
            1000
        }
    }

    #[test]
    fn face_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Face<'static>>();
    }

    #[test]
    fn absent_tables_are_fine() {
        let face = Face::from_tables(LayoutTables::default(), NoMetrics).unwrap();
        assert!(!face.has_substitutions());
        assert!(!face.has_positioning());
        assert_eq!(face.units_per_em(), 1000);
    }

    #[test]
    fn malformed_table_fails() {
        let tables = LayoutTables { gsub: Some(&[0, 1]), ..LayoutTables::default() };
        assert!(matches!(
            Face::from_tables(tables, NoMetrics),
            Err(Error::InvalidFontFile(_))
        ));
    }

    #[test]
    fn heuristic_classes() {
        let face = Face::from_tables(LayoutTables::default(), NoMetrics).unwrap();
        let mut glyph = GlyphShapingData::new(GlyphId(1), 'e', 0, Direction::LeftToRight);
        assert_eq!(face.glyph_class(&glyph), Some(GlyphClass::Base));
        glyph.codepoints.push('f');
        assert_eq!(face.glyph_class(&glyph), Some(GlyphClass::Ligature));
        let mark = GlyphShapingData::new(GlyphId(2), '\u{0301}', 1, Direction::LeftToRight);
        assert!(face.is_mark(&mark));
    }
}
