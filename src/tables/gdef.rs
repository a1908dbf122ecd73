//! The Glyph Definition Table.

use log::debug;
use ttf_parser::GlyphId;

use super::gsubgpos::{ClassDef, Coverage};
use super::parser::{Offset, Offset16, Offset32, Stream};
use crate::Error;

/// A GDEF glyph class.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GlyphClass {
    Base,
    Ligature,
    Mark,
    Component,
}

/// A parsed GDEF table.
#[derive(Clone, Debug)]
pub struct GlyphDefinitionTable<'a> {
    glyph_classes: Option<ClassDef<'a>>,
    mark_attach_classes: Option<ClassDef<'a>>,
    mark_glyph_sets: Vec<Coverage<'a>>,
}

impl<'a> GlyphDefinitionTable<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self, Error> {
        Self::parse_impl(data).ok_or_else(|| {
            debug!("GDEF is malformed, rejecting the table");
            Error::malformed("GDEF", "header or subtable")
        })?
    }

    fn parse_impl(data: &'a [u8]) -> Option<Result<Self, Error>> {
        let mut s = Stream::new(data);
        let major_version = s.read::<u16>()?;
        let minor_version = s.read::<u16>()?;
        if major_version != 1 || !matches!(minor_version, 0 | 2 | 3) {
            return Some(Err(Error::InvalidFontFile(format!(
                "GDEF table version {}.{} is not supported",
                major_version, minor_version
            ))));
        }

        let glyph_classes = read_class_def(&mut s, data)?;
        s.skip::<Offset16>(); // attachment point list
        s.skip::<Offset16>(); // ligature caret list
        let mark_attach_classes = read_class_def(&mut s, data)?;

        let mut mark_glyph_sets = Vec::new();
        if minor_version >= 2 {
            if let Some(offset) = s.read_optional::<Offset16>()? {
                mark_glyph_sets = parse_mark_glyph_sets(data.get(offset.to_usize()..)?)?;
            }
        }

        if minor_version == 3 {
            s.skip::<Offset32>(); // item variation store
        }

        Some(Ok(Self {
            glyph_classes,
            mark_attach_classes,
            mark_glyph_sets,
        }))
    }

    /// Checks that the font assigns glyph classes.
    #[inline]
    pub fn has_glyph_classes(&self) -> bool {
        self.glyph_classes.is_some()
    }

    /// Returns the glyph class, `None` for class 0 or an unknown one.
    pub fn glyph_class(&self, glyph: GlyphId) -> Option<GlyphClass> {
        match self.glyph_classes?.get(glyph) {
            1 => Some(GlyphClass::Base),
            2 => Some(GlyphClass::Ligature),
            3 => Some(GlyphClass::Mark),
            4 => Some(GlyphClass::Component),
            _ => None,
        }
    }

    pub fn mark_attachment_class(&self, glyph: GlyphId) -> u16 {
        self.mark_attach_classes.map_or(0, |classes| classes.get(glyph))
    }

    /// Checks that the glyph belongs to a mark glyph set.
    ///
    /// A missing set contains nothing.
    pub fn is_mark_glyph(&self, glyph: GlyphId, set_index: u16) -> bool {
        self.mark_glyph_sets
            .get(usize::from(set_index))
            .is_some_and(|set| set.contains(glyph))
    }
}

fn read_class_def<'a>(s: &mut Stream<'a>, data: &'a [u8]) -> Option<Option<ClassDef<'a>>> {
    match s.read_optional::<Offset16>()? {
        Some(offset) => ClassDef::parse(data.get(offset.to_usize()..)?).map(Some),
        None => Some(None),
    }
}

fn parse_mark_glyph_sets(data: &[u8]) -> Option<Vec<Coverage>> {
    let mut s = Stream::new(data);
    let format = s.read::<u16>()?;
    if format != 1 {
        return None;
    }

    let count = s.read::<u16>()?;
    s.read_array16::<Offset32>(count)?
        .into_iter()
        .map(|offset| Coverage::parse(data.get(offset.to_usize()..)?))
        .collect()
}
