//! The Glyph Substitution Table.

use ttf_parser::{GlyphId, LazyArray16};

use super::gsubgpos::*;
use super::parser::Stream;
use super::StreamExt;

pub type SubstitutionTable<'a> = LayoutTable<'a, SubstLookupSubtable<'a>>;
pub type SubstLookup<'a> = Lookup<SubstLookupSubtable<'a>>;

#[derive(Clone, Debug)]
pub enum SubstLookupSubtable<'a> {
    Single(SingleSubst<'a>),
    Multiple(MultipleSubst<'a>),
    Alternate(AlternateSubst<'a>),
    Ligature(LigatureSubst<'a>),
    Context(ContextLookup<'a>),
    ChainContext(ChainContextLookup<'a>),
    ReverseChainSingle(ReverseChainSingleSubst<'a>),
}

impl<'a> LookupSubtable<'a> for SubstLookupSubtable<'a> {
    const TABLE: &'static str = "GSUB";
    const EXTENSION: u16 = 7;

    fn parse(data: &'a [u8], kind: u16) -> Option<Self> {
        match kind {
            1 => SingleSubst::parse(data).map(Self::Single),
            2 => MultipleSubst::parse(data).map(Self::Multiple),
            3 => AlternateSubst::parse(data).map(Self::Alternate),
            4 => LigatureSubst::parse(data).map(Self::Ligature),
            5 => ContextLookup::parse(data).map(Self::Context),
            6 => ChainContextLookup::parse(data).map(Self::ChainContext),
            8 => ReverseChainSingleSubst::parse(data).map(Self::ReverseChainSingle),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum SingleSubst<'a> {
    Format1 {
        coverage: Coverage<'a>,
        delta: i16,
    },
    Format2 {
        coverage: Coverage<'a>,
        substitutes: LazyArray16<'a, GlyphId>,
    },
}

impl<'a> SingleSubst<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let format: u16 = s.read()?;
        Some(match format {
            1 => {
                let coverage = read_coverage(&mut s, data)?;
                let delta = s.read::<i16>()?;
                Self::Format1 { coverage, delta }
            }
            2 => {
                let coverage = read_coverage(&mut s, data)?;
                let count = s.read::<u16>()?;
                let substitutes = s.read_array16(count)?;
                Self::Format2 { coverage, substitutes }
            }
            _ => return None,
        })
    }

    pub fn coverage(&self) -> Coverage<'a> {
        match *self {
            Self::Format1 { coverage, .. } => coverage,
            Self::Format2 { coverage, .. } => coverage,
        }
    }
}

fn read_glyph_array(data: &[u8]) -> Option<LazyArray16<GlyphId>> {
    let mut s = Stream::new(data);
    let count = s.read::<u16>()?;
    s.read_array16(count)
}

/// Format 1 multiple substitution. One sequence per coverage index.
#[derive(Clone, Debug)]
pub struct MultipleSubst<'a> {
    pub coverage: Coverage<'a>,
    pub sequences: Vec<LazyArray16<'a, GlyphId>>,
}

impl<'a> MultipleSubst<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let format: u16 = s.read()?;
        if format != 1 {
            return None;
        }

        let coverage = read_coverage(&mut s, data)?;
        let count = s.read::<u16>()?;
        let sequences = s.read_offset16_list(count, data)?.parse_required(read_glyph_array)?;
        Some(Self { coverage, sequences })
    }
}

/// Format 1 alternate substitution.
#[derive(Clone, Debug)]
pub struct AlternateSubst<'a> {
    pub coverage: Coverage<'a>,
    pub alternate_sets: Vec<LazyArray16<'a, GlyphId>>,
}

impl<'a> AlternateSubst<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let format: u16 = s.read()?;
        if format != 1 {
            return None;
        }

        let coverage = read_coverage(&mut s, data)?;
        let count = s.read::<u16>()?;
        let alternate_sets = s.read_offset16_list(count, data)?.parse_required(read_glyph_array)?;
        Some(Self { coverage, alternate_sets })
    }
}

/// Format 1 ligature substitution.
#[derive(Clone, Debug)]
pub struct LigatureSubst<'a> {
    pub coverage: Coverage<'a>,
    pub ligature_sets: Vec<Vec<Ligature<'a>>>,
}

impl<'a> LigatureSubst<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let format: u16 = s.read()?;
        if format != 1 {
            return None;
        }

        let coverage = read_coverage(&mut s, data)?;
        let count = s.read::<u16>()?;
        let ligature_sets = s.read_offset16_list(count, data)?.parse_required(|set| {
            let mut s = Stream::new(set);
            let count = s.read::<u16>()?;
            s.read_offset16_list(count, set)?.parse_required(Ligature::parse)
        })?;
        Some(Self { coverage, ligature_sets })
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Ligature<'a> {
    pub lig_glyph: GlyphId,
    /// Components after the first one.
    pub components: LazyArray16<'a, u16>,
}

impl<'a> Ligature<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let lig_glyph = s.read::<GlyphId>()?;
        let count = s.read::<u16>()?;
        let components = s.read_array16(count.checked_sub(1)?)?;
        Some(Self { lig_glyph, components })
    }
}

/// Format 1 reverse chaining contextual single substitution.
#[derive(Clone, Debug)]
pub struct ReverseChainSingleSubst<'a> {
    pub coverage: Coverage<'a>,
    pub backtrack_coverages: Vec<Coverage<'a>>,
    pub lookahead_coverages: Vec<Coverage<'a>>,
    pub substitutes: LazyArray16<'a, GlyphId>,
}

impl<'a> ReverseChainSingleSubst<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let format: u16 = s.read()?;
        if format != 1 {
            return None;
        }

        let coverage = read_coverage(&mut s, data)?;
        let backtrack_count = s.read::<u16>()?;
        let backtrack_coverages = read_coverages(&mut s, backtrack_count, data)?;
        let lookahead_count = s.read::<u16>()?;
        let lookahead_coverages = read_coverages(&mut s, lookahead_count, data)?;
        let substitute_count = s.read::<u16>()?;
        let substitutes = s.read_array16(substitute_count)?;
        Some(Self {
            coverage,
            backtrack_coverages,
            lookahead_coverages,
            substitutes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::writer::{coverage, Writer};
    use crate::Error;

    fn gsub_with_lookup(kind: u16, subtable: &[u8]) -> Vec<u8> {
        // Header 10, script list 2, feature list 2, lookup list 4, lookup 8.
        Writer::new()
            .u16s(&[1, 0, 10, 12, 14])
            .u16(0)
            .u16(0)
            .u16(1)
            .u16(4)
            .u16s(&[kind, 0, 1, 8])
            .bytes(subtable)
            .finish()
    }

    #[test]
    fn single_subst_lookup() {
        let cov = coverage(&[5]);
        let subtable = Writer::new().u16(1).u16(6).i16(3).bytes(&cov).finish();
        let data = gsub_with_lookup(1, &subtable);
        let table = SubstitutionTable::parse(&data).unwrap();
        assert_eq!(table.lookups.len(), 1);
        assert_eq!(table.lookups[0].kind, 1);
        match table.lookups[0].subtables[0] {
            SubstLookupSubtable::Single(SingleSubst::Format1 { coverage, delta }) => {
                assert_eq!(coverage.get(GlyphId(5)), Some(0));
                assert_eq!(delta, 3);
            }
            _ => panic!("expected a single substitution"),
        }
    }

    #[test]
    fn extension_resolves_kind() {
        let cov = coverage(&[5]);
        let single = Writer::new().u16(1).u16(6).i16(3).bytes(&cov).finish();
        let extension = Writer::new().u16(1).u16(1).u32(8).bytes(&single).finish();
        let data = gsub_with_lookup(7, &extension);
        let table = SubstitutionTable::parse(&data).unwrap();
        assert_eq!(table.lookups[0].kind, 1);
        assert!(matches!(table.lookups[0].subtables[0], SubstLookupSubtable::Single(_)));
    }

    #[test]
    fn unknown_subtable_format_is_invalid() {
        let cov = coverage(&[5]);
        let subtable = Writer::new().u16(3).u16(6).i16(3).bytes(&cov).finish();
        let data = gsub_with_lookup(1, &subtable);
        match SubstitutionTable::parse(&data) {
            Err(Error::InvalidFontFile(msg)) => assert!(msg.contains("lookup 0")),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn unknown_lookup_type_is_invalid() {
        let data = gsub_with_lookup(9, &[0, 1]);
        assert!(matches!(SubstitutionTable::parse(&data), Err(Error::InvalidFontFile(_))));
    }

    #[test]
    fn unsupported_version_is_invalid() {
        let data = Writer::new().u16s(&[2, 0, 10, 10, 10]).finish();
        assert!(matches!(SubstitutionTable::parse(&data), Err(Error::InvalidFontFile(_))));
    }

    #[test]
    fn feature_variations_are_checked() {
        // Header 14, empty script, feature and lookup lists, variations at 20.
        let table = |variations: &[u16]| {
            Writer::new()
                .u16s(&[1, 1, 14, 16, 18])
                .u32(20)
                .u16s(&[0, 0, 0])
                .u16s(variations)
                .finish()
        };

        // Version 1.0 with one record.
        let data = table(&[1, 0, 0, 1, 0, 0, 0, 0]);
        assert!(SubstitutionTable::parse(&data).is_ok());

        // The record is missing.
        let data = table(&[1, 0, 0, 1]);
        assert!(matches!(SubstitutionTable::parse(&data), Err(Error::InvalidFontFile(_))));

        let data = table(&[2, 0, 0, 0]);
        assert!(matches!(SubstitutionTable::parse(&data), Err(Error::InvalidFontFile(_))));
    }
}
