#![allow(dead_code)]

use typoshape::{Direction, Face, FontMetrics, GlyphId, GlyphPositioningCollection, LayoutTables};

/// A big-endian byte writer.
#[derive(Default)]
pub struct Writer {
    data: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u16(mut self, v: u16) -> Self {
        self.data.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn i16(mut self, v: i16) -> Self {
        self.data.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn tag(mut self, tag: &[u8; 4]) -> Self {
        self.data.extend_from_slice(tag);
        self
    }

    pub fn u16s(self, values: &[u16]) -> Self {
        values.iter().fold(self, |w, v| w.u16(*v))
    }

    pub fn bytes(mut self, data: &[u8]) -> Self {
        self.data.extend_from_slice(data);
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.data
    }
}

/// Appends `children` after `head` and returns their offsets from the
/// start of `head`.
fn offsets(head_len: usize, children: &[Vec<u8>]) -> Vec<u16> {
    let mut offset = head_len;
    children
        .iter()
        .map(|child| {
            let current = offset as u16;
            offset += child.len();
            current
        })
        .collect()
}

pub fn coverage(glyphs: &[u16]) -> Vec<u8> {
    let mut glyphs = glyphs.to_vec();
    glyphs.sort_unstable();
    Writer::new().u16(1).u16(glyphs.len() as u16).u16s(&glyphs).finish()
}

pub fn anchor(x: i16, y: i16) -> Vec<u8> {
    Writer::new().u16(1).i16(x).i16(y).finish()
}

/// Single substitution, format 2.
pub fn single_subst(pairs: &[(u16, u16)]) -> Vec<u8> {
    let mut pairs = pairs.to_vec();
    pairs.sort_unstable();
    let input: Vec<u16> = pairs.iter().map(|p| p.0).collect();
    let output: Vec<u16> = pairs.iter().map(|p| p.1).collect();
    let head_len = 6 + 2 * pairs.len() as u16;
    Writer::new()
        .u16(2)
        .u16(head_len)
        .u16(output.len() as u16)
        .u16s(&output)
        .bytes(&coverage(&input))
        .finish()
}

/// Multiple substitution of one glyph.
pub fn multiple_subst(input: u16, sequence: &[u16]) -> Vec<u8> {
    let sequence = Writer::new().u16(sequence.len() as u16).u16s(sequence).finish();
    Writer::new()
        .u16(1)
        .u16(8 + sequence.len() as u16)
        .u16(1)
        .u16(8)
        .bytes(&sequence)
        .bytes(&coverage(&[input]))
        .finish()
}

/// Ligature substitution of one component sequence.
pub fn ligature_subst(first: u16, rest: &[u16], ligature: u16) -> Vec<u8> {
    let ligature = Writer::new()
        .u16(ligature)
        .u16(rest.len() as u16 + 1)
        .u16s(rest)
        .finish();
    let set = Writer::new().u16(1).u16(4).bytes(&ligature).finish();
    Writer::new()
        .u16(1)
        .u16(8 + set.len() as u16)
        .u16(1)
        .u16(8)
        .bytes(&set)
        .bytes(&coverage(&[first]))
        .finish()
}

/// Chained context, format 3. Records are `(sequence index, lookup index)`.
pub fn chain_context(
    backtrack: &[&[u16]],
    input: &[&[u16]],
    lookahead: &[&[u16]],
    records: &[(u16, u16)],
) -> Vec<u8> {
    let coverages: Vec<Vec<u8>> = backtrack
        .iter()
        .chain(input)
        .chain(lookahead)
        .map(|glyphs| coverage(glyphs))
        .collect();

    let head_len = 2 + 2 * 3 + 2 * coverages.len() + 2 + 4 * records.len();
    let mut offsets = offsets(head_len, &coverages).into_iter();

    let mut w = Writer::new().u16(3);
    for count in [backtrack.len(), input.len(), lookahead.len()] {
        w = w.u16(count as u16);
        for _ in 0..count {
            w = w.u16(offsets.next().unwrap());
        }
    }

    w = w.u16(records.len() as u16);
    for (sequence_index, lookup_index) in records {
        w = w.u16(*sequence_index).u16(*lookup_index);
    }

    coverages.iter().fold(w, |w, c| w.bytes(c)).finish()
}

/// Reverse chaining single substitution without context.
pub fn reverse_chain_single(input: u16, output: u16) -> Vec<u8> {
    Writer::new()
        .u16(1)
        .u16(12)
        .u16(0)
        .u16(0)
        .u16(1)
        .u16(output)
        .bytes(&coverage(&[input]))
        .finish()
}

/// Pair adjustment, format 1, with an x advance on the first glyph.
pub fn pair_pos(first: u16, second: u16, x_advance: i16) -> Vec<u8> {
    let set = Writer::new().u16(1).u16(second).i16(x_advance).finish();
    Writer::new()
        .u16(1)
        .u16(12 + set.len() as u16)
        .u16(0x0004)
        .u16(0)
        .u16(1)
        .u16(12)
        .bytes(&set)
        .bytes(&coverage(&[first]))
        .finish()
}

/// Mark-to-base attachment with one mark class.
pub fn mark_base_pos(base: u16, base_anchor: (i16, i16), mark: u16, mark_anchor: (i16, i16)) -> Vec<u8> {
    let mark_array = Writer::new()
        .u16(1)
        .u16(0)
        .u16(6)
        .bytes(&anchor(mark_anchor.0, mark_anchor.1))
        .finish();
    let base_array = Writer::new()
        .u16(1)
        .u16(4)
        .bytes(&anchor(base_anchor.0, base_anchor.1))
        .finish();

    let children = [mark_array, base_array, coverage(&[mark]), coverage(&[base])];
    let o = offsets(12, &children);
    Writer::new()
        .u16(1)
        .u16(o[2])
        .u16(o[3])
        .u16(1)
        .u16(o[0])
        .u16(o[1])
        .bytes(&children.concat())
        .finish()
}

/// Builds a `GSUB` or `GPOS` table with a single script whose default
/// language system enables every feature.
pub struct LayoutBuilder {
    script: [u8; 4],
    features: Vec<([u8; 4], Vec<u16>)>,
    lookups: Vec<Vec<u8>>,
}

impl LayoutBuilder {
    pub fn new(script: &[u8; 4]) -> Self {
        LayoutBuilder { script: *script, features: Vec::new(), lookups: Vec::new() }
    }

    pub fn feature(mut self, tag: &[u8; 4], lookups: &[u16]) -> Self {
        self.features.push((*tag, lookups.to_vec()));
        self
    }

    pub fn lookup(mut self, kind: u16, flags: u16, subtables: &[Vec<u8>]) -> Self {
        let head_len = 6 + 2 * subtables.len();
        let mut w = Writer::new()
            .u16(kind)
            .u16(flags)
            .u16(subtables.len() as u16)
            .u16s(&offsets(head_len, subtables));
        for subtable in subtables {
            w = w.bytes(subtable);
        }
        self.lookups.push(w.finish());
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let count = self.features.len() as u16;
        let script_list = Writer::new()
            .u16(1)
            .tag(&self.script)
            .u16(8)
            // script: default language system right after
            .u16(4)
            .u16(0)
            // language system
            .u16(0)
            .u16(0xFFFF)
            .u16(count)
            .u16s(&(0..count).collect::<Vec<_>>())
            .finish();

        let feature_tables: Vec<Vec<u8>> = self
            .features
            .iter()
            .map(|(_, lookups)| Writer::new().u16(0).u16(lookups.len() as u16).u16s(lookups).finish())
            .collect();
        let feature_offsets = offsets(2 + 6 * self.features.len(), &feature_tables);
        let mut feature_list = Writer::new().u16(count);
        for ((tag, _), offset) in self.features.iter().zip(feature_offsets) {
            feature_list = feature_list.tag(tag).u16(offset);
        }
        let feature_list = feature_list.bytes(&feature_tables.concat()).finish();

        let lookup_offsets = offsets(2 + 2 * self.lookups.len(), &self.lookups);
        let lookup_list = Writer::new()
            .u16(self.lookups.len() as u16)
            .u16s(&lookup_offsets)
            .bytes(&self.lookups.concat())
            .finish();

        let lists = [script_list, feature_list, lookup_list];
        let o = offsets(10, &lists);
        Writer::new()
            .u16(1)
            .u16(0)
            .u16s(&o)
            .bytes(&lists.concat())
            .finish()
    }
}

/// Character map and advances of a test font.
pub struct TestMetrics {
    pub cmap: Vec<(char, u16)>,
    pub advances: Vec<(u16, i32)>,
}

impl TestMetrics {
    pub fn new(cmap: &[(char, u16)]) -> Self {
        TestMetrics { cmap: cmap.to_vec(), advances: Vec::new() }
    }

    pub fn advance(mut self, glyph: u16, advance: i32) -> Self {
        self.advances.push((glyph, advance));
        self
    }
}

impl FontMetrics for TestMetrics {
    fn glyph_index(&self, c: char) -> Option<GlyphId> {
        self.cmap.iter().find(|(k, _)| *k == c).map(|(_, g)| GlyphId(*g))
    }

    fn advance(&self, glyph: GlyphId, _: Direction) -> i32 {
        self.advances
            .iter()
            .find(|(g, _)| *g == glyph.0)
            .map_or(500, |(_, a)| *a)
    }

    fn units_per_em(&self) -> u16 {
        1000
    }
}

pub fn face<'a>(
    gsub: Option<&'a [u8]>,
    gpos: Option<&'a [u8]>,
    metrics: TestMetrics,
) -> Face<'a> {
    let tables = LayoutTables { gdef: None, gsub, gpos };
    Face::from_tables(tables, metrics).unwrap()
}

/// Serializes glyphs as `glyph=cluster@x,y+advance|...`.
///
/// Offsets are omitted when both are zero.
pub fn serialize(glyphs: &GlyphPositioningCollection) -> String {
    glyphs
        .iter()
        .zip(glyphs.positions())
        .map(|(glyph, pos)| {
            let mut s = format!("{}={}", glyph.glyph_id.0, glyph.cluster);
            if pos.x_offset != 0 || pos.y_offset != 0 {
                s.push_str(&format!("@{},{}", pos.x_offset, pos.y_offset));
            }
            s.push_str(&format!("+{}", pos.x_advance));
            if pos.y_advance != 0 {
                s.push_str(&format!(",{}", pos.y_advance));
            }
            s
        })
        .collect::<Vec<_>>()
        .join("|")
}
