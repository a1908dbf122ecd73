//! Common tables for GSUB and GPOS.

use core::cmp::Ordering;

use log::debug;
use ttf_parser::{FromData, GlyphId, LazyArray16};

use super::parser::{Offset, Offset16, Offset32, Stream};
use super::{OffsetList, StreamExt};
use crate::common::script_tags;
use crate::{Error, Script, Tag};

/// A lookup subtable of GSUB or GPOS.
pub trait LookupSubtable<'a>: Sized {
    /// The table name used in error messages.
    const TABLE: &'static str;
    /// The lookup type that wraps other subtables.
    const EXTENSION: u16;

    /// Parses a subtable of a non-extension lookup type.
    fn parse(data: &'a [u8], kind: u16) -> Option<Self>;
}

/// A GSUB or GPOS table, parsed eagerly.
#[derive(Clone, Debug)]
pub struct LayoutTable<'a, T> {
    pub scripts: Vec<ScriptTable<'a>>,
    pub features: Vec<FeatureTable<'a>>,
    pub lookups: Vec<Lookup<T>>,
}

impl<'a, T: LookupSubtable<'a>> LayoutTable<'a, T> {
    pub fn parse(data: &'a [u8]) -> Result<Self, Error> {
        let name = T::TABLE;
        let mut s = Stream::new(data);

        let (Some(major_version), Some(minor_version)) = (s.read::<u16>(), s.read::<u16>()) else {
            return Err(Error::malformed(name, "header"));
        };

        if major_version != 1 {
            return Err(Error::InvalidFontFile(format!(
                "{} table version {}.{} is not supported",
                name, major_version, minor_version
            )));
        }

        let scripts = s
            .read_offset16_data(data)
            .and_then(parse_script_list)
            .ok_or_else(|| Error::malformed(name, "script list"))?;

        let features = s
            .read_offset16_data(data)
            .and_then(parse_feature_list)
            .ok_or_else(|| Error::malformed(name, "feature list"))?;

        let lookup_data = s
            .read_offset16_data(data)
            .ok_or_else(|| Error::malformed(name, "lookup list"))?;
        let lookups = parse_lookup_list(lookup_data)?;

        // Feature variations are checked, but not applied.
        if minor_version >= 1 {
            let offset = s
                .read_optional::<Offset32>()
                .ok_or_else(|| Error::malformed(name, "header"))?;
            if let Some(offset) = offset {
                data.get(offset.to_usize()..)
                    .and_then(check_feature_variations)
                    .ok_or_else(|| Error::malformed(name, "feature variations list"))?;
            }
        }

        debug!(
            "{}: {} scripts, {} features, {} lookups",
            name,
            scripts.len(),
            features.len(),
            lookups.len()
        );

        Ok(LayoutTable { scripts, features, lookups })
    }
}

impl<'a, T> LayoutTable<'a, T> {
    pub fn find_script(&self, tag: Tag) -> Option<&ScriptTable<'a>> {
        self.scripts.iter().find(|script| script.tag == tag)
    }

    /// Finds the script table for a Unicode script.
    ///
    /// Tries the script's own tags first and then `DFLT`, `dflt` and `latn`.
    pub fn select_script(&self, script: Script) -> Option<&ScriptTable<'a>> {
        const FALLBACKS: [Tag; 3] = [
            Tag::default_script(),
            Tag::default_language(),
            Tag::from_bytes(b"latn"),
        ];

        script_tags(script)
            .into_iter()
            .chain(FALLBACKS)
            .find_map(|tag| self.find_script(tag))
    }

    pub fn lookup(&self, index: u16) -> Option<&Lookup<T>> {
        self.lookups.get(usize::from(index))
    }

    /// Collects all lookups of a feature for a script and language.
    ///
    /// The requested language system is used when present, then the default
    /// one, and otherwise every named language system of the script. The
    /// result is sorted by lookup index, which is the application order.
    pub fn feature_lookups(
        &self,
        feature: Tag,
        script: &ScriptTable<'a>,
        language: Option<Tag>,
    ) -> Vec<FeatureLookup<'_, T>> {
        let mut indices: Vec<u16> = Vec::new();
        for sys in script.language_systems(language) {
            let required = sys.required_feature.into_iter();
            for feature_index in required.chain(sys.feature_indices) {
                let Some(record) = self.features.get(usize::from(feature_index)) else {
                    continue;
                };

                if record.tag == feature {
                    indices.extend(record.lookup_indices);
                }
            }
        }

        indices.sort_unstable();
        indices.dedup();

        indices
            .into_iter()
            .filter_map(|index| {
                let lookup = self.lookup(index)?;
                Some(FeatureLookup { feature, index, lookup })
            })
            .collect()
    }
}

/// A lookup selected for a feature.
#[derive(Debug)]
pub struct FeatureLookup<'t, T> {
    pub feature: Tag,
    pub index: u16,
    pub lookup: &'t Lookup<T>,
}

impl<T> Clone for FeatureLookup<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for FeatureLookup<'_, T> {}

#[derive(Clone, Copy, Debug)]
struct TagRecord {
    tag: Tag,
    offset: Offset16,
}

impl FromData for TagRecord {
    const SIZE: usize = 6;

    #[inline]
    fn parse(data: &[u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        Some(Self {
            tag: s.read()?,
            offset: s.read()?,
        })
    }
}

fn read_records<'a>(data: &'a [u8]) -> Option<LazyArray16<'a, TagRecord>> {
    let mut s = Stream::new(data);
    let count = s.read::<u16>()?;
    s.read_array16(count)
}

fn parse_script_list(data: &[u8]) -> Option<Vec<ScriptTable>> {
    read_records(data)?
        .into_iter()
        .map(|record| ScriptTable::parse(record.tag, data.get(record.offset.to_usize()..)?))
        .collect()
}

fn parse_feature_list(data: &[u8]) -> Option<Vec<FeatureTable>> {
    read_records(data)?
        .into_iter()
        .map(|record| FeatureTable::parse(record.tag, data.get(record.offset.to_usize()..)?))
        .collect()
}

fn parse_lookup_list<'a, T: LookupSubtable<'a>>(data: &'a [u8]) -> Result<Vec<Lookup<T>>, Error> {
    let mut s = Stream::new(data);
    let list = s
        .read::<u16>()
        .and_then(|count| s.read_offset16_list(count, data))
        .ok_or_else(|| Error::malformed(T::TABLE, "lookup list"))?;

    let mut lookups = Vec::with_capacity(usize::from(list.len()));
    for i in 0..list.len() {
        let lookup = list
            .slice(i)
            .flatten()
            .and_then(Lookup::parse)
            .ok_or_else(|| {
                debug!("{} lookup {} is malformed, rejecting the table", T::TABLE, i);
                Error::malformed(T::TABLE, format_args!("lookup {}", i))
            })?;
        lookups.push(lookup);
    }

    Ok(lookups)
}

/// A script table with its language systems.
#[derive(Clone, Debug)]
pub struct ScriptTable<'a> {
    pub tag: Tag,
    pub default: Option<LangSys<'a>>,
    pub languages: Vec<(Tag, LangSys<'a>)>,
}

impl<'a> ScriptTable<'a> {
    fn parse(tag: Tag, data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let mut default = None;
        if let Some(offset) = s.read_optional::<Offset16>()? {
            default = Some(LangSys::parse(data.get(offset.to_usize()..)?)?);
        }

        // Offsets are relative to this table.
        let count = s.read::<u16>()?;
        let languages = s
            .read_array16::<TagRecord>(count)?
            .into_iter()
            .map(|record| {
                let sys = LangSys::parse(data.get(record.offset.to_usize()..)?)?;
                Some((record.tag, sys))
            })
            .collect::<Option<_>>()?;

        Some(Self { tag, default, languages })
    }

    pub fn find_language(&self, tag: Tag) -> Option<&LangSys<'a>> {
        self.languages.iter().find(|(t, _)| *t == tag).map(|(_, sys)| sys)
    }

    /// Returns the language systems used for a feature query.
    pub fn language_systems(&self, language: Option<Tag>) -> Vec<&LangSys<'a>> {
        if let Some(sys) = language.and_then(|tag| self.find_language(tag)) {
            return vec![sys];
        }

        match self.default {
            Some(ref sys) => vec![sys],
            None => self.languages.iter().map(|(_, sys)| sys).collect(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct LangSys<'a> {
    pub required_feature: Option<u16>,
    pub feature_indices: LazyArray16<'a, u16>,
}

impl<'a> LangSys<'a> {
    fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        s.skip::<Offset16>(); // lookup order
        let required_feature = match s.read::<u16>()? {
            0xFFFF => None,
            v => Some(v),
        };
        let count = s.read::<u16>()?;
        let feature_indices = s.read_array16(count)?;
        Some(Self { required_feature, feature_indices })
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FeatureTable<'a> {
    pub tag: Tag,
    pub lookup_indices: LazyArray16<'a, u16>,
}

impl<'a> FeatureTable<'a> {
    fn parse(tag: Tag, data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        s.skip::<Offset16>(); // params
        let count = s.read::<u16>()?;
        let lookup_indices = s.read_array16(count)?;
        Some(Self { tag, lookup_indices })
    }
}

/// A lookup with all of its subtables.
#[derive(Clone, Debug)]
pub struct Lookup<T> {
    /// The lookup type, with extension lookups resolved.
    pub kind: u16,
    pub flags: LookupFlags,
    pub mark_filtering_set: Option<u16>,
    pub subtables: Vec<T>,
}

impl<'a, T: LookupSubtable<'a>> Lookup<T> {
    fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let mut kind = s.read::<u16>()?;
        let flags = s.read::<LookupFlags>()?;
        let count = s.read::<u16>()?;
        let offsets = s.read_offset16_list(count, data)?;

        let mut mark_filtering_set = None;
        if flags.contains(LookupFlags::USE_MARK_FILTERING_SET) {
            mark_filtering_set = Some(s.read::<u16>()?);
        }

        let mut subtables = Vec::with_capacity(usize::from(count));
        if kind == T::EXTENSION {
            let mut resolved = None;
            for data in offsets.parse_required(Some)? {
                let (inner, subtable) = parse_extension_subtable(data)?;
                // All extension subtables must share one lookup type.
                if *resolved.get_or_insert(inner) != inner {
                    return None;
                }
                subtables.push(subtable);
            }
            kind = resolved.unwrap_or(kind);
        } else {
            subtables = offsets.parse_required(|data| T::parse(data, kind))?;
        }

        Some(Self { kind, flags, mark_filtering_set, subtables })
    }
}

impl<T> Lookup<T> {
    /// The mark attachment type required by the lookup, zero for any.
    #[inline]
    pub fn mark_attachment_type(&self) -> u16 {
        (self.flags & LookupFlags::MARK_ATTACHMENT_TYPE).bits() >> 8
    }
}

fn parse_extension_subtable<'a, T: LookupSubtable<'a>>(data: &'a [u8]) -> Option<(u16, T)> {
    let mut s = Stream::new(data);
    let format: u16 = s.read()?;
    match format {
        1 => {
            let kind = s.read::<u16>()?;
            if kind == T::EXTENSION {
                return None;
            }
            let data = s.read_offset32_data(data)?;
            Some((kind, T::parse(data, kind)?))
        }
        _ => None,
    }
}

bitflags::bitflags! {
    /// Lookup qualifiers.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct LookupFlags: u16 {
        const RIGHT_TO_LEFT          = 0x0001;
        const IGNORE_BASE_GLYPHS     = 0x0002;
        const IGNORE_LIGATURES       = 0x0004;
        const IGNORE_MARKS           = 0x0008;
        const IGNORE_FLAGS           = 0x000E;
        const USE_MARK_FILTERING_SET = 0x0010;
        const MARK_ATTACHMENT_TYPE   = 0xFF00;
    }
}

impl FromData for LookupFlags {
    const SIZE: usize = 2;

    #[inline]
    fn parse(data: &[u8]) -> Option<Self> {
        u16::parse(data).map(Self::from_bits_retain)
    }
}

/// Checks the header and record array of a feature variations list.
fn check_feature_variations(data: &[u8]) -> Option<()> {
    let mut s = Stream::new(data);
    let major_version = s.read::<u16>()?;
    s.skip::<u16>(); // minor version
    if major_version != 1 {
        return None;
    }

    let count = s.read::<u32>()?;
    s.read_array32::<FeatureVariationRecord>(count)?;
    Some(())
}

#[derive(Clone, Copy, Debug)]
struct FeatureVariationRecord {
    _conditions: Offset32,
    _substitutions: Offset32,
}

impl FromData for FeatureVariationRecord {
    const SIZE: usize = 8;

    #[inline]
    fn parse(data: &[u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        Some(Self {
            _conditions: s.read()?,
            _substitutions: s.read()?,
        })
    }
}

/// A table that defines which glyph ids are covered by some lookup.
///
/// https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#coverage-table
#[derive(Clone, Copy, Debug)]
pub enum Coverage<'a> {
    Format1 { glyphs: LazyArray16<'a, GlyphId> },
    Format2 { records: LazyArray16<'a, RangeRecord> },
}

impl<'a> Coverage<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let format: u16 = s.read()?;
        Some(match format {
            1 => {
                let count = s.read::<u16>()?;
                let glyphs = s.read_array16(count)?;
                Self::Format1 { glyphs }
            }
            2 => {
                let count = s.read::<u16>()?;
                let records = s.read_array16(count)?;
                Self::Format2 { records }
            }
            _ => return None,
        })
    }

    /// Returns the coverage index of the glyph or `None` if it is not covered.
    pub fn get(&self, glyph: GlyphId) -> Option<u16> {
        match self {
            Self::Format1 { glyphs } => glyphs.binary_search(&glyph).map(|p| p.0),
            Self::Format2 { records } => {
                let record = RangeRecord::binary_search(records, glyph)?;
                let offset = glyph.0 - record.start.0;
                record.value.checked_add(offset)
            }
        }
    }

    #[inline]
    pub fn contains(&self, glyph: GlyphId) -> bool {
        self.get(glyph).is_some()
    }
}

/// A table that defines which classes glyph ids belong to.
///
/// https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#class-definition-table
#[derive(Clone, Copy, Debug)]
pub enum ClassDef<'a> {
    Format1 {
        start: GlyphId,
        classes: LazyArray16<'a, u16>,
    },
    Format2 {
        records: LazyArray16<'a, RangeRecord>,
    },
}

impl<'a> ClassDef<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let format: u16 = s.read()?;
        Some(match format {
            1 => {
                let start = s.read::<GlyphId>()?;
                let count = s.read::<u16>()?;
                let classes = s.read_array16(count)?;
                Self::Format1 { start, classes }
            }
            2 => {
                let count = s.read::<u16>()?;
                Self::Format2 { records: s.read_array16(count)? }
            }
            _ => return None,
        })
    }

    /// A class definition that puts every glyph into class 0.
    pub fn empty() -> Self {
        Self::Format1 { start: GlyphId(0), classes: LazyArray16::new(&[]) }
    }

    /// Reads an optional offset, a NULL one meaning an empty definition.
    pub(crate) fn read_optional(s: &mut Stream<'a>, data: &'a [u8]) -> Option<Self> {
        match s.read_optional::<Offset16>()? {
            Some(offset) => Self::parse(data.get(offset.to_usize()..)?),
            None => Some(Self::empty()),
        }
    }

    /// Returns the glyph class of the glyph (zero if it is not defined).
    pub fn get(&self, glyph: GlyphId) -> u16 {
        let class = match self {
            Self::Format1 { start, classes } => {
                glyph.0.checked_sub(start.0).and_then(|index| classes.get(index))
            }
            Self::Format2 { records } => {
                RangeRecord::binary_search(records, glyph).map(|record| record.value)
            }
        };
        class.unwrap_or(0)
    }
}

/// A record that describes a range of glyph ids.
#[derive(Clone, Copy, Debug)]
pub struct RangeRecord {
    start: GlyphId,
    end: GlyphId,
    value: u16,
}

impl RangeRecord {
    fn binary_search(records: &LazyArray16<RangeRecord>, glyph: GlyphId) -> Option<RangeRecord> {
        records
            .binary_search_by(|record| {
                if glyph < record.start {
                    Ordering::Greater
                } else if glyph <= record.end {
                    Ordering::Equal
                } else {
                    Ordering::Less
                }
            })
            .map(|p| p.1)
    }
}

impl FromData for RangeRecord {
    const SIZE: usize = 6;

    #[inline]
    fn parse(data: &[u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        Some(Self {
            start: s.read::<GlyphId>()?,
            end: s.read::<GlyphId>()?,
            value: s.read::<u16>()?,
        })
    }
}

pub(crate) fn read_coverage<'a>(s: &mut Stream<'a>, data: &'a [u8]) -> Option<Coverage<'a>> {
    Coverage::parse(s.read_offset16_data(data)?)
}

/// Reads `count` coverage offsets relative to `data`.
pub(crate) fn read_coverages<'a>(
    s: &mut Stream<'a>,
    count: u16,
    data: &'a [u8],
) -> Option<Vec<Coverage<'a>>> {
    s.read_offset16_list(count, data)?.parse_required(Coverage::parse)
}

pub type RuleSet<'a> = Vec<Rule<'a>>;
pub type ChainRuleSet<'a> = Vec<ChainRule<'a>>;

fn read_rule_sets<'a, R>(
    s: &mut Stream<'a>,
    data: &'a [u8],
    parse: impl Fn(&'a [u8]) -> Option<R>,
) -> Option<Vec<Option<Vec<R>>>> {
    let count = s.read::<u16>()?;
    let sets: OffsetList<'a> = s.read_offset16_list(count, data)?;
    sets.parse_all(|set| {
        let mut s = Stream::new(set);
        let count = s.read::<u16>()?;
        s.read_offset16_list(count, set)?.parse_required(&parse)
    })
}

/// A sequence context subtable.
#[derive(Clone, Debug)]
pub enum ContextLookup<'a> {
    Format1 {
        coverage: Coverage<'a>,
        sets: Vec<Option<RuleSet<'a>>>,
    },
    Format2 {
        coverage: Coverage<'a>,
        classes: ClassDef<'a>,
        sets: Vec<Option<RuleSet<'a>>>,
    },
    Format3 {
        coverage: Coverage<'a>,
        coverages: Vec<Coverage<'a>>,
        lookups: LazyArray16<'a, LookupRecord>,
    },
}

impl<'a> ContextLookup<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let format: u16 = s.read()?;
        Some(match format {
            1 => {
                let coverage = read_coverage(&mut s, data)?;
                let sets = read_rule_sets(&mut s, data, Rule::parse)?;
                Self::Format1 { coverage, sets }
            }
            2 => {
                let coverage = read_coverage(&mut s, data)?;
                let classes = ClassDef::read_optional(&mut s, data)?;
                let sets = read_rule_sets(&mut s, data, Rule::parse)?;
                Self::Format2 { coverage, classes, sets }
            }
            3 => {
                let input_count = s.read::<u16>()?;
                let lookup_count = s.read::<u16>()?;
                let mut coverages = read_coverages(&mut s, input_count, data)?;
                if coverages.is_empty() {
                    return None;
                }
                let coverage = coverages.remove(0);
                let lookups = s.read_array16(lookup_count)?;
                Self::Format3 { coverage, coverages, lookups }
            }
            _ => return None,
        })
    }
}

/// A sequence rule. The input excludes the first glyph.
#[derive(Clone, Copy, Debug)]
pub struct Rule<'a> {
    pub input: LazyArray16<'a, u16>,
    pub lookups: LazyArray16<'a, LookupRecord>,
}

impl<'a> Rule<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let input_count = s.read::<u16>()?;
        let lookup_count = s.read::<u16>()?;
        let input = s.read_array16(input_count.checked_sub(1)?)?;
        let lookups = s.read_array16(lookup_count)?;
        Some(Self { input, lookups })
    }
}

/// A chained sequence context subtable.
#[derive(Clone, Debug)]
pub enum ChainContextLookup<'a> {
    Format1 {
        coverage: Coverage<'a>,
        sets: Vec<Option<ChainRuleSet<'a>>>,
    },
    Format2 {
        coverage: Coverage<'a>,
        backtrack_classes: ClassDef<'a>,
        input_classes: ClassDef<'a>,
        lookahead_classes: ClassDef<'a>,
        sets: Vec<Option<ChainRuleSet<'a>>>,
    },
    Format3 {
        coverage: Coverage<'a>,
        backtrack_coverages: Vec<Coverage<'a>>,
        input_coverages: Vec<Coverage<'a>>,
        lookahead_coverages: Vec<Coverage<'a>>,
        lookups: LazyArray16<'a, LookupRecord>,
    },
}

impl<'a> ChainContextLookup<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let format: u16 = s.read()?;
        Some(match format {
            1 => {
                let coverage = read_coverage(&mut s, data)?;
                let sets = read_rule_sets(&mut s, data, ChainRule::parse)?;
                Self::Format1 { coverage, sets }
            }
            2 => {
                let coverage = read_coverage(&mut s, data)?;
                let backtrack_classes = ClassDef::read_optional(&mut s, data)?;
                let input_classes = ClassDef::read_optional(&mut s, data)?;
                let lookahead_classes = ClassDef::read_optional(&mut s, data)?;
                let sets = read_rule_sets(&mut s, data, ChainRule::parse)?;
                Self::Format2 {
                    coverage,
                    backtrack_classes,
                    input_classes,
                    lookahead_classes,
                    sets,
                }
            }
            3 => {
                let backtrack_count = s.read::<u16>()?;
                let backtrack_coverages = read_coverages(&mut s, backtrack_count, data)?;
                let input_count = s.read::<u16>()?;
                let mut input_coverages = read_coverages(&mut s, input_count, data)?;
                if input_coverages.is_empty() {
                    return None;
                }
                let coverage = input_coverages.remove(0);
                let lookahead_count = s.read::<u16>()?;
                let lookahead_coverages = read_coverages(&mut s, lookahead_count, data)?;
                let lookup_count = s.read::<u16>()?;
                let lookups = s.read_array16(lookup_count)?;
                Self::Format3 {
                    coverage,
                    backtrack_coverages,
                    input_coverages,
                    lookahead_coverages,
                    lookups,
                }
            }
            _ => return None,
        })
    }
}

/// A chained sequence rule. The input excludes the first glyph.
#[derive(Clone, Copy, Debug)]
pub struct ChainRule<'a> {
    pub backtrack: LazyArray16<'a, u16>,
    pub input: LazyArray16<'a, u16>,
    pub lookahead: LazyArray16<'a, u16>,
    pub lookups: LazyArray16<'a, LookupRecord>,
}

impl<'a> ChainRule<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let backtrack_count = s.read::<u16>()?;
        let backtrack = s.read_array16(backtrack_count)?;
        let input_count = s.read::<u16>()?;
        let input = s.read_array16(input_count.checked_sub(1)?)?;
        let lookahead_count = s.read::<u16>()?;
        let lookahead = s.read_array16(lookahead_count)?;
        let lookup_count = s.read::<u16>()?;
        let lookups = s.read_array16(lookup_count)?;
        Some(Self { backtrack, input, lookahead, lookups })
    }
}

/// A nested lookup invocation at a position of the matched input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LookupRecord {
    pub sequence_index: u16,
    pub lookup_index: u16,
}

impl FromData for LookupRecord {
    const SIZE: usize = 4;

    #[inline]
    fn parse(data: &[u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        Some(Self {
            sequence_index: s.read::<u16>()?,
            lookup_index: s.read::<u16>()?,
        })
    }
}
