//! The Glyph Positioning Table.

use ttf_parser::{FromData, GlyphId, LazyArray16, LazyArray32};

use super::gsubgpos::*;
use super::parser::{Offset, Offset16, Stream};
use super::{DynArray, StreamExt};

pub type PositioningTable<'a> = LayoutTable<'a, PosLookupSubtable<'a>>;
pub type PosLookup<'a> = Lookup<PosLookupSubtable<'a>>;

#[derive(Clone, Debug)]
pub enum PosLookupSubtable<'a> {
    Single(SinglePos<'a>),
    Pair(PairPos<'a>),
    Cursive(CursivePos<'a>),
    MarkBase(MarkBasePos<'a>),
    MarkLig(MarkLigPos<'a>),
    MarkMark(MarkMarkPos<'a>),
    Context(ContextLookup<'a>),
    ChainContext(ChainContextLookup<'a>),
}

impl<'a> LookupSubtable<'a> for PosLookupSubtable<'a> {
    const TABLE: &'static str = "GPOS";
    const EXTENSION: u16 = 9;

    fn parse(data: &'a [u8], kind: u16) -> Option<Self> {
        match kind {
            1 => SinglePos::parse(data).map(Self::Single),
            2 => PairPos::parse(data).map(Self::Pair),
            3 => CursivePos::parse(data).map(Self::Cursive),
            4 => MarkBasePos::parse(data).map(Self::MarkBase),
            5 => MarkLigPos::parse(data).map(Self::MarkLig),
            6 => MarkMarkPos::parse(data).map(Self::MarkMark),
            7 => ContextLookup::parse(data).map(Self::Context),
            8 => ChainContextLookup::parse(data).map(Self::ChainContext),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum SinglePos<'a> {
    Format1 {
        coverage: Coverage<'a>,
        value: ValueRecord,
    },
    Format2 {
        coverage: Coverage<'a>,
        flags: ValueFormatFlags,
        values: DynArray<'a>,
    },
}

impl<'a> SinglePos<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let format: u16 = s.read()?;
        Some(match format {
            1 => {
                let coverage = read_coverage(&mut s, data)?;
                let flags = s.read::<ValueFormatFlags>()?;
                let value = ValueRecord::read(&mut s, flags)?;
                Self::Format1 { coverage, value }
            }
            2 => {
                let coverage = read_coverage(&mut s, data)?;
                let flags = s.read::<ValueFormatFlags>()?;
                let count = s.read::<u16>()?;
                let values = s.read_dyn_array(usize::from(count), flags.size())?;
                Self::Format2 { coverage, flags, values }
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

    /// Returns the value record for a coverage index.
    pub fn value(&self, index: u16) -> Option<ValueRecord> {
        match *self {
            Self::Format1 { value, .. } => Some(value),
            Self::Format2 { flags, values, .. } => {
                let record = values.get(usize::from(index))?;
                ValueRecord::read(&mut Stream::new(record), flags)
            }
        }
    }
}

#[derive(Clone, Debug)]
pub enum PairPos<'a> {
    Format1 {
        coverage: Coverage<'a>,
        flags: [ValueFormatFlags; 2],
        sets: Vec<PairSet<'a>>,
    },
    Format2 {
        coverage: Coverage<'a>,
        flags: [ValueFormatFlags; 2],
        classes: [ClassDef<'a>; 2],
        matrix: ClassMatrix<'a>,
    },
}

impl<'a> PairPos<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let format: u16 = s.read()?;
        Some(match format {
            1 => {
                let coverage = read_coverage(&mut s, data)?;
                let flags = [
                    s.read::<ValueFormatFlags>()?,
                    s.read::<ValueFormatFlags>()?,
                ];
                let count = s.read::<u16>()?;
                let sets = s
                    .read_offset16_list(count, data)?
                    .parse_required(|set| PairSet::parse(set, flags))?;
                Self::Format1 { coverage, flags, sets }
            }
            2 => {
                let coverage = read_coverage(&mut s, data)?;
                let flags = [
                    s.read::<ValueFormatFlags>()?,
                    s.read::<ValueFormatFlags>()?,
                ];
                let classes = [
                    ClassDef::read_optional(&mut s, data)?,
                    ClassDef::read_optional(&mut s, data)?,
                ];
                let counts = [s.read::<u16>()?, s.read::<u16>()?];
                let matrix = ClassMatrix::read(&mut s, counts, flags)?;
                Self::Format2 { coverage, flags, classes, matrix }
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

    pub fn flags(&self) -> [ValueFormatFlags; 2] {
        match *self {
            Self::Format1 { flags, .. } => flags,
            Self::Format2 { flags, .. } => flags,
        }
    }

    /// Returns the value records of a pair, the first glyph given by its
    /// coverage index.
    pub fn get(&self, index: u16, first: GlyphId, second: GlyphId) -> Option<[ValueRecord; 2]> {
        match self {
            Self::Format1 { sets, .. } => sets.get(usize::from(index))?.get(second),
            Self::Format2 { classes, matrix, .. } => {
                matrix.get([classes[0].get(first), classes[1].get(second)])
            }
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PairSet<'a> {
    records: DynArray<'a>,
    flags: [ValueFormatFlags; 2],
}

impl<'a> PairSet<'a> {
    pub fn parse(data: &'a [u8], flags: [ValueFormatFlags; 2]) -> Option<Self> {
        let mut s = Stream::new(data);
        let count = s.read::<u16>()?;
        let stride = GlyphId::SIZE + flags[0].size() + flags[1].size();
        let records = s.read_dyn_array(usize::from(count), stride)?;
        Some(Self { records, flags })
    }

    pub fn get(&self, second: GlyphId) -> Option<[ValueRecord; 2]> {
        let record = self
            .records
            .binary_search_by(|data| {
                // Records are at least two bytes long.
                let glyph = Stream::new(data).read::<GlyphId>().unwrap_or(GlyphId(0));
                glyph.cmp(&second)
            })?
            .1;

        let mut s = Stream::new(record);
        s.skip::<GlyphId>();
        Some([
            ValueRecord::read(&mut s, self.flags[0])?,
            ValueRecord::read(&mut s, self.flags[1])?,
        ])
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ClassMatrix<'a> {
    matrix: DynArray<'a>,
    counts: [u16; 2],
    flags: [ValueFormatFlags; 2],
}

impl<'a> ClassMatrix<'a> {
    pub fn read(s: &mut Stream<'a>, counts: [u16; 2], flags: [ValueFormatFlags; 2]) -> Option<Self> {
        let count = usize::from(counts[0]) * usize::from(counts[1]);
        let stride = flags[0].size() + flags[1].size();
        let matrix = s.read_dyn_array(count, stride)?;
        Some(Self { matrix, counts, flags })
    }

    pub fn get(&self, classes: [u16; 2]) -> Option<[ValueRecord; 2]> {
        if classes[0] >= self.counts[0] || classes[1] >= self.counts[1] {
            return None;
        }

        let idx = usize::from(classes[0]) * usize::from(self.counts[1]) + usize::from(classes[1]);
        let mut s = match self.matrix.get(idx) {
            Some(record) => Stream::new(record),
            // Both value formats are empty.
            None => Stream::new(&[]),
        };

        Some([
            ValueRecord::read(&mut s, self.flags[0])?,
            ValueRecord::read(&mut s, self.flags[1])?,
        ])
    }
}

/// Format 1 cursive attachment.
#[derive(Clone, Copy, Debug)]
pub struct CursivePos<'a> {
    data: &'a [u8],
    pub coverage: Coverage<'a>,
    entry_exits: LazyArray16<'a, EntryExitRecord>,
}

impl<'a> CursivePos<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let format: u16 = s.read()?;
        if format != 1 {
            return None;
        }

        let coverage = read_coverage(&mut s, data)?;
        let count = s.read::<u16>()?;
        let entry_exits = s.read_array16(count)?;
        Some(Self { data, coverage, entry_exits })
    }

    pub fn entry(&self, index: u16) -> Option<Anchor> {
        let offset = self.entry_exits.get(index)?.entry_anchor?;
        Anchor::parse(self.data.get(offset.to_usize()..)?)
    }

    pub fn exit(&self, index: u16) -> Option<Anchor> {
        let offset = self.entry_exits.get(index)?.exit_anchor?;
        Anchor::parse(self.data.get(offset.to_usize()..)?)
    }
}

#[derive(Clone, Copy, Debug)]
struct EntryExitRecord {
    entry_anchor: Option<Offset16>,
    exit_anchor: Option<Offset16>,
}

impl FromData for EntryExitRecord {
    const SIZE: usize = 4;

    #[inline]
    fn parse(data: &[u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        Some(Self {
            entry_anchor: s.read_optional()?,
            exit_anchor: s.read_optional()?,
        })
    }
}

/// Format 1 mark-to-base attachment.
#[derive(Clone, Copy, Debug)]
pub struct MarkBasePos<'a> {
    pub mark_coverage: Coverage<'a>,
    pub base_coverage: Coverage<'a>,
    pub marks: MarkArray<'a>,
    pub base_matrix: AnchorMatrix<'a>,
}

impl<'a> MarkBasePos<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let format: u16 = s.read()?;
        if format != 1 {
            return None;
        }

        let mark_coverage = read_coverage(&mut s, data)?;
        let base_coverage = read_coverage(&mut s, data)?;
        let class_count = s.read::<u16>()?;
        let marks = MarkArray::parse(s.read_offset16_data(data)?)?;
        let base_matrix = AnchorMatrix::parse(s.read_offset16_data(data)?, class_count)?;
        Some(Self { mark_coverage, base_coverage, marks, base_matrix })
    }
}

/// Format 1 mark-to-ligature attachment.
#[derive(Clone, Debug)]
pub struct MarkLigPos<'a> {
    pub mark_coverage: Coverage<'a>,
    pub lig_coverage: Coverage<'a>,
    pub marks: MarkArray<'a>,
    /// One anchor matrix per ligature, a row per component.
    pub lig_array: Vec<AnchorMatrix<'a>>,
}

impl<'a> MarkLigPos<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let format: u16 = s.read()?;
        if format != 1 {
            return None;
        }

        let mark_coverage = read_coverage(&mut s, data)?;
        let lig_coverage = read_coverage(&mut s, data)?;
        let class_count = s.read::<u16>()?;
        let marks = MarkArray::parse(s.read_offset16_data(data)?)?;
        let lig_array = parse_ligature_array(s.read_offset16_data(data)?, class_count)?;
        Some(Self { mark_coverage, lig_coverage, marks, lig_array })
    }
}

fn parse_ligature_array(data: &[u8], class_count: u16) -> Option<Vec<AnchorMatrix>> {
    let mut s = Stream::new(data);
    let count = s.read::<u16>()?;
    s.read_offset16_list(count, data)?
        .parse_required(|attach| AnchorMatrix::parse(attach, class_count))
}

/// Format 1 mark-to-mark attachment.
#[derive(Clone, Copy, Debug)]
pub struct MarkMarkPos<'a> {
    pub mark1_coverage: Coverage<'a>,
    pub mark2_coverage: Coverage<'a>,
    pub marks: MarkArray<'a>,
    pub mark2_matrix: AnchorMatrix<'a>,
}

impl<'a> MarkMarkPos<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let format: u16 = s.read()?;
        if format != 1 {
            return None;
        }

        let mark1_coverage = read_coverage(&mut s, data)?;
        let mark2_coverage = read_coverage(&mut s, data)?;
        let class_count = s.read::<u16>()?;
        let marks = MarkArray::parse(s.read_offset16_data(data)?)?;
        let mark2_matrix = AnchorMatrix::parse(s.read_offset16_data(data)?, class_count)?;
        Some(Self { mark1_coverage, mark2_coverage, marks, mark2_matrix })
    }
}

/// Placement and advance adjustments.
///
/// Device and variation offsets are skipped.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct ValueRecord {
    pub x_placement: i16,
    pub y_placement: i16,
    pub x_advance: i16,
    pub y_advance: i16,
}

impl ValueRecord {
    pub fn read(s: &mut Stream, flags: ValueFormatFlags) -> Option<Self> {
        let mut record = ValueRecord::default();

        if flags.contains(ValueFormatFlags::X_PLACEMENT) {
            record.x_placement = s.read::<i16>()?;
        }

        if flags.contains(ValueFormatFlags::Y_PLACEMENT) {
            record.y_placement = s.read::<i16>()?;
        }

        if flags.contains(ValueFormatFlags::X_ADVANCE) {
            record.x_advance = s.read::<i16>()?;
        }

        if flags.contains(ValueFormatFlags::Y_ADVANCE) {
            record.y_advance = s.read::<i16>()?;
        }

        let devices = (flags & ValueFormatFlags::DEVICES).bits().count_ones();
        s.read_bytes(devices as usize * Offset16::SIZE)?;

        Some(record)
    }
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ValueFormatFlags: u16 {
        const X_PLACEMENT        = 0x0001;
        const Y_PLACEMENT        = 0x0002;
        const X_ADVANCE          = 0x0004;
        const Y_ADVANCE          = 0x0008;
        const X_PLACEMENT_DEVICE = 0x0010;
        const Y_PLACEMENT_DEVICE = 0x0020;
        const X_ADVANCE_DEVICE   = 0x0040;
        const Y_ADVANCE_DEVICE   = 0x0080;
        const DEVICES            = Self::X_PLACEMENT_DEVICE.bits()
                                 | Self::Y_PLACEMENT_DEVICE.bits()
                                 | Self::X_ADVANCE_DEVICE.bits()
                                 | Self::Y_ADVANCE_DEVICE.bits();
    }
}

impl ValueFormatFlags {
    pub fn size(self) -> usize {
        u16::SIZE * self.bits().count_ones() as usize
    }
}

impl FromData for ValueFormatFlags {
    const SIZE: usize = 2;

    #[inline]
    fn parse(data: &[u8]) -> Option<Self> {
        u16::parse(data).map(Self::from_bits_truncate)
    }
}

/// An attachment point.
///
/// Contour points of format 2 and device tables of format 3 are not used.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct Anchor {
    pub x: i16,
    pub y: i16,
}

impl Anchor {
    pub fn parse(data: &[u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let format: u16 = s.read()?;
        if !matches!(format, 1..=3) {
            return None;
        }

        Some(Anchor {
            x: s.read::<i16>()?,
            y: s.read::<i16>()?,
        })
    }
}

#[derive(Clone, Copy, Debug)]
pub struct AnchorMatrix<'a> {
    data: &'a [u8],
    pub rows: u16,
    pub cols: u16,
    matrix: LazyArray32<'a, Offset16>,
}

impl<'a> AnchorMatrix<'a> {
    pub fn parse(data: &'a [u8], cols: u16) -> Option<Self> {
        let mut s = Stream::new(data);
        let rows = s.read::<u16>()?;
        let count = u32::from(rows) * u32::from(cols);
        let matrix = s.read_array32(count)?;
        Some(Self { data, rows, cols, matrix })
    }

    /// Returns the anchor, `None` when the offset is NULL.
    pub fn get(&self, row: u16, col: u16) -> Option<Anchor> {
        if col >= self.cols {
            return None;
        }

        let idx = u32::from(row) * u32::from(self.cols) + u32::from(col);
        let offset = self.matrix.get(idx)?;
        if offset.is_null() {
            return None;
        }

        Anchor::parse(self.data.get(offset.to_usize()..)?)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct MarkArray<'a> {
    data: &'a [u8],
    array: LazyArray16<'a, MarkRecord>,
}

impl<'a> MarkArray<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let count = s.read::<u16>()?;
        let array = s.read_array16(count)?;
        Some(Self { data, array })
    }

    /// Returns the mark class and anchor of a mark coverage index.
    pub fn get(&self, index: u16) -> Option<(u16, Anchor)> {
        let record = self.array.get(index)?;
        let anchor = Anchor::parse(self.data.get(record.mark_anchor.to_usize()..)?)?;
        Some((record.class, anchor))
    }
}

#[derive(Clone, Copy, Debug)]
struct MarkRecord {
    class: u16,
    mark_anchor: Offset16,
}

impl FromData for MarkRecord {
    const SIZE: usize = 4;

    #[inline]
    fn parse(data: &[u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        Some(Self {
            class: s.read()?,
            mark_anchor: s.read()?,
        })
    }
}
