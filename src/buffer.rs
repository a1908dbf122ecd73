use core::ops::{Deref, DerefMut, Index, IndexMut};

use bitflags::bitflags;
use smallvec::SmallVec;
use ttf_parser::GlyphId;

use crate::{Direction, Face, Feature, Script, ShapingOptions, Tag};

/// Holds the positions of the glyph in both horizontal and vertical directions.
///
/// All positions are relative to the current point, in font units.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct GlyphPosition {
    /// How much the line advances after drawing this glyph when setting text in
    /// horizontal direction.
    pub x_advance: i32,
    /// How much the line advances after drawing this glyph when setting text in
    /// vertical direction.
    pub y_advance: i32,
    /// How much the glyph moves on the X-axis before drawing it, this should not
    /// affect how much the line advances.
    pub x_offset: i32,
    /// How much the glyph moves on the Y-axis before drawing it, this should
    /// not affect how much the line advances.
    pub y_offset: i32,
}

bitflags! {
    /// What happened to a glyph during shaping.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct GlyphFlags: u8 {
        /// Replaced by a substitution lookup.
        const SUBSTITUTED = 0x01;
        /// Produced by a ligature substitution.
        const LIGATED     = 0x02;
        /// Produced by a multiple substitution.
        const MULTIPLIED  = 0x04;
        /// Adjusted by a positioning lookup.
        const POSITIONED  = 0x08;
    }
}

/// Shaping state of a single glyph.
#[derive(Clone, Debug)]
pub struct GlyphShapingData {
    /// The glyph id.
    pub glyph_id: GlyphId,
    /// Source codepoints. Ligatures carry all of their components' codepoints.
    pub codepoints: SmallVec<[char; 2]>,
    /// Index of the first source character.
    pub cluster: u32,
    /// Ordered feature toggles. The first entry for a tag wins.
    pub features: Vec<(Tag, bool)>,
    /// Text direction.
    pub direction: Direction,
    /// Index of the glyph this mark is attached to.
    pub mark_attachment: Option<usize>,
    /// Index of the glyph this glyph is cursively attached to.
    pub cursive_attachment: Option<usize>,
    /// Advances and offsets.
    pub position: GlyphPosition,
    /// What happened to the glyph.
    pub flags: GlyphFlags,
    pub(crate) lig_id: u8,
    pub(crate) lig_comp: u8,
    pub(crate) lig_num_comps: u8,
}

impl GlyphShapingData {
    /// Creates a glyph for one source character.
    pub fn new(glyph_id: GlyphId, codepoint: char, cluster: u32, direction: Direction) -> Self {
        GlyphShapingData {
            glyph_id,
            codepoints: SmallVec::from_elem(codepoint, 1),
            cluster,
            features: Vec::new(),
            direction,
            mark_attachment: None,
            cursive_attachment: None,
            position: GlyphPosition::default(),
            flags: GlyphFlags::empty(),
            lig_id: 0,
            lig_comp: 0,
            lig_num_comps: 1,
        }
    }

    /// Number of source codepoints.
    #[inline]
    pub fn codepoint_count(&self) -> usize {
        self.codepoints.len()
    }

    #[inline]
    pub(crate) fn first_codepoint(&self) -> Option<char> {
        self.codepoints.first().copied()
    }

    /// Checks that the feature is present and turned on.
    pub fn is_feature_enabled(&self, tag: Tag) -> bool {
        self.features
            .iter()
            .find(|(t, _)| *t == tag)
            .is_some_and(|(_, enabled)| *enabled)
    }

    /// Adds a feature toggle unless the glyph already has one for this tag.
    pub fn add_feature(&mut self, tag: Tag, enabled: bool) {
        if !self.features.iter().any(|(t, _)| *t == tag) {
            self.features.push((tag, enabled));
        }
    }

    #[inline]
    pub(crate) fn is_ligated_component(&self) -> bool {
        self.lig_id != 0 && self.lig_comp != 0
    }

    pub(crate) fn set_lig_props_for_ligature(&mut self, lig_id: u8, num_comps: u8) {
        self.lig_id = lig_id;
        self.lig_comp = 0;
        self.lig_num_comps = num_comps;
    }

    pub(crate) fn set_lig_props_for_mark(&mut self, lig_id: u8, lig_comp: u8) {
        self.lig_id = lig_id;
        self.lig_comp = lig_comp;
        self.lig_num_comps = 1;
    }

    pub(crate) fn set_lig_props_for_component(&mut self, comp: u8) {
        self.set_lig_props_for_mark(0, comp);
    }
}

/// An ordered, index-addressable run of glyphs.
#[derive(Clone, Debug, Default)]
pub struct GlyphShapingCollection {
    glyphs: Vec<GlyphShapingData>,
    next_lig_id: u8,
    pub(crate) script: Option<Script>,
    pub(crate) language: Option<Tag>,
    pub(crate) user_features: Vec<Feature>,
}

impl GlyphShapingCollection {
    /// Returns the number of glyphs.
    #[inline]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Checks that the collection is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Returns a glyph.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&GlyphShapingData> {
        self.glyphs.get(index)
    }

    /// Returns all glyphs.
    #[inline]
    pub fn glyphs(&self) -> &[GlyphShapingData] {
        &self.glyphs
    }

    /// Returns an iterator over glyphs.
    pub fn iter(&self) -> core::slice::Iter<'_, GlyphShapingData> {
        self.glyphs.iter()
    }

    /// Adds a feature toggle to glyphs in `start..start + len`.
    ///
    /// Glyphs that already have a toggle for this tag keep it.
    pub fn add_feature(&mut self, start: usize, len: usize, tag: Tag, enabled: bool) {
        let end = (start + len).min(self.glyphs.len());
        for glyph in self.glyphs.get_mut(start..end).into_iter().flatten() {
            glyph.add_feature(tag, enabled);
        }
    }

    #[inline]
    pub(crate) fn glyphs_mut(&mut self) -> &mut [GlyphShapingData] {
        &mut self.glyphs
    }

    #[inline]
    pub(crate) fn push(&mut self, glyph: GlyphShapingData) {
        self.glyphs.push(glyph);
    }

    pub(crate) fn remove(&mut self, index: usize) -> GlyphShapingData {
        self.glyphs.remove(index)
    }

    /// Replaces `range` with `glyphs`, returning the length delta.
    pub(crate) fn splice(
        &mut self,
        range: core::ops::Range<usize>,
        glyphs: impl IntoIterator<Item = GlyphShapingData>,
    ) -> isize {
        let old_len = self.glyphs.len();
        self.glyphs.splice(range, glyphs);
        self.glyphs.len() as isize - old_len as isize
    }

    /// Replaces the glyph id at `index`.
    pub(crate) fn replace(&mut self, index: usize, glyph_id: GlyphId) {
        let glyph = &mut self.glyphs[index];
        glyph.glyph_id = glyph_id;
        glyph.flags |= GlyphFlags::SUBSTITUTED;
    }

    /// Replaces the glyph at `index` with a sequence of glyphs.
    ///
    /// Every produced glyph is a copy of the original one, so it keeps the
    /// source codepoints and feature toggles.
    pub(crate) fn multiply(&mut self, index: usize, glyph_ids: &[GlyphId]) {
        let source = self.glyphs[index].clone();
        let lig_id = source.lig_id;
        let produced = glyph_ids.iter().enumerate().map(|(i, glyph_id)| {
            let mut glyph = source.clone();
            glyph.glyph_id = *glyph_id;
            glyph.flags |= GlyphFlags::SUBSTITUTED | GlyphFlags::MULTIPLIED;
            // Glyphs attached to a ligature keep their component.
            if lig_id == 0 {
                glyph.set_lig_props_for_component(i.min(usize::from(u8::MAX)) as u8);
            }
            glyph
        });

        self.glyphs.splice(index..index + 1, produced);
    }

    pub(crate) fn allocate_lig_id(&mut self) -> u8 {
        self.next_lig_id = self.next_lig_id.wrapping_add(1);
        if self.next_lig_id == 0 {
            self.next_lig_id = 1;
        }
        self.next_lig_id
    }

    fn add_user_features(&self, glyph: &mut GlyphShapingData) {
        for feature in &self.user_features {
            glyph.add_feature(feature.tag, feature.enabled);
        }
    }
}

impl Index<usize> for GlyphShapingCollection {
    type Output = GlyphShapingData;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.glyphs[index]
    }
}

impl IndexMut<usize> for GlyphShapingCollection {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.glyphs[index]
    }
}

/// A glyph run for substitution. Its length may change.
#[derive(Clone, Debug, Default)]
pub struct GlyphSubstitutionCollection {
    inner: GlyphShapingCollection,
}

impl GlyphSubstitutionCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty collection that uses the script, language and features
    /// of `options`.
    pub fn with_options(options: &ShapingOptions) -> Self {
        let mut collection = Self::default();
        collection.inner.script = options.script;
        collection.inner.language = options.language;
        collection.inner.user_features = options.features.clone();
        collection
    }

    /// Appends a glyph mapped from `codepoint`.
    pub fn add_glyph(&mut self, glyph_id: GlyphId, codepoint: char, cluster: u32, direction: Direction) {
        let mut glyph = GlyphShapingData::new(glyph_id, codepoint, cluster, direction);
        self.inner.add_user_features(&mut glyph);
        self.inner.push(glyph);
    }

    /// Maps text to glyphs using the face character map.
    ///
    /// Unmapped characters become glyph 0. Clusters are byte offsets.
    pub fn from_text(face: &Face, text: &str, options: &ShapingOptions) -> Self {
        let mut collection = Self::with_options(options);
        for (cluster, c) in text.char_indices() {
            let glyph_id = face.glyph_index(c).unwrap_or(GlyphId(0));
            collection.add_glyph(glyph_id, c, cluster as u32, options.direction);
        }
        collection
    }

    /// Returns the underlying run.
    pub fn as_collection(&self) -> &GlyphShapingCollection {
        &self.inner
    }
}

impl Deref for GlyphSubstitutionCollection {
    type Target = GlyphShapingCollection;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for GlyphSubstitutionCollection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

/// A glyph run for positioning. Its length never changes.
#[derive(Clone, Debug)]
pub struct GlyphPositioningCollection {
    inner: GlyphShapingCollection,
}

impl GlyphPositioningCollection {
    /// Creates a positioning run from substituted glyphs.
    ///
    /// Advances are taken from the face metrics.
    pub fn new(face: &Face, substitution: GlyphSubstitutionCollection) -> Self {
        let mut inner = substitution.inner;
        for glyph in inner.glyphs_mut() {
            let advance = face.advance(glyph.glyph_id, glyph.direction);
            glyph.position = if glyph.direction.is_horizontal() {
                GlyphPosition { x_advance: advance, ..GlyphPosition::default() }
            } else {
                GlyphPosition { y_advance: -advance, ..GlyphPosition::default() }
            };
        }

        GlyphPositioningCollection { inner }
    }

    /// Returns the glyph positions.
    pub fn positions(&self) -> impl Iterator<Item = &GlyphPosition> + '_ {
        self.inner.iter().map(|glyph| &glyph.position)
    }

    /// Returns a mutable glyph position.
    pub fn position_mut(&mut self, index: usize) -> Option<&mut GlyphPosition> {
        self.inner.glyphs_mut().get_mut(index).map(|glyph| &mut glyph.position)
    }

    pub(crate) fn as_mut_inner(&mut self) -> &mut GlyphShapingCollection {
        &mut self.inner
    }
}

impl Deref for GlyphPositioningCollection {
    type Target = GlyphShapingCollection;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(glyphs: &[u16]) -> GlyphSubstitutionCollection {
        let mut collection = GlyphSubstitutionCollection::new();
        for (i, glyph) in glyphs.iter().enumerate() {
            collection.add_glyph(GlyphId(*glyph), 'a', i as u32, Direction::LeftToRight);
        }
        collection
    }

    #[test]
    fn first_feature_toggle_wins() {
        let mut glyphs = collection(&[1, 2]);
        let liga = Tag::from_bytes(b"liga");
        glyphs.add_feature(0, 1, liga, false);
        glyphs.add_feature(0, 2, liga, true);
        assert!(!glyphs[0].is_feature_enabled(liga));
        assert!(glyphs[1].is_feature_enabled(liga));
        assert!(!glyphs[1].is_feature_enabled(Tag::from_bytes(b"kern")));
    }

    #[test]
    fn user_features_come_first() {
        let options = ShapingOptions {
            features: vec!["-liga".parse().unwrap()],
            ..ShapingOptions::default()
        };
        let mut glyphs = GlyphSubstitutionCollection::with_options(&options);
        glyphs.add_glyph(GlyphId(1), 'f', 0, Direction::LeftToRight);
        glyphs.add_feature(0, 1, Tag::from_bytes(b"liga"), true);
        assert!(!glyphs[0].is_feature_enabled(Tag::from_bytes(b"liga")));
    }

    #[test]
    fn multiply_copies_source() {
        let mut glyphs = collection(&[1, 2, 3]);
        glyphs.multiply(1, &[7, 8, 9].map(GlyphId));
        let ids: Vec<u16> = glyphs.iter().map(|g| g.glyph_id.0).collect();
        assert_eq!(ids, [1, 7, 8, 9, 3]);
        assert_eq!(glyphs[3].cluster, 1);
        assert_eq!(glyphs[3].lig_comp, 2);
        assert!(glyphs[2].flags.contains(GlyphFlags::MULTIPLIED));
    }

    #[test]
    fn lig_ids_skip_zero() {
        let mut glyphs = GlyphShapingCollection::default();
        glyphs.next_lig_id = 254;
        assert_eq!(glyphs.allocate_lig_id(), 255);
        assert_eq!(glyphs.allocate_lig_id(), 1);
    }
}
