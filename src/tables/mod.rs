//! Parsers for the OpenType layout tables.
//!
//! Every table is parsed once, eagerly, into structures that borrow the font
//! data. Leaf arrays stay lazy and are decoded on access.

use ttf_parser::LazyArray16;

use self::parser::{Offset, Offset16, Offset32, Stream};

pub mod gdef;
pub mod gpos;
pub mod gsub;
pub mod gsubgpos;
pub mod parser;

pub(crate) trait StreamExt<'a> {
    fn read_dyn_array(&mut self, count: usize, stride: usize) -> Option<DynArray<'a>>;
    fn read_offset16_data(&mut self, data: &'a [u8]) -> Option<&'a [u8]>;
    fn read_offset32_data(&mut self, data: &'a [u8]) -> Option<&'a [u8]>;
    fn read_offset16_list(&mut self, count: u16, data: &'a [u8]) -> Option<OffsetList<'a>>;
}

impl<'a> StreamExt<'a> for Stream<'a> {
    #[inline]
    fn read_dyn_array(&mut self, count: usize, stride: usize) -> Option<DynArray<'a>> {
        let len = count.checked_mul(stride)?;
        self.read_bytes(len).map(|data| DynArray::new(data, stride))
    }

    #[inline]
    fn read_offset16_data(&mut self, data: &'a [u8]) -> Option<&'a [u8]> {
        let offset = self.read::<Offset16>()?.to_usize();
        data.get(offset..)
    }

    #[inline]
    fn read_offset32_data(&mut self, data: &'a [u8]) -> Option<&'a [u8]> {
        let offset = self.read::<Offset32>()?.to_usize();
        data.get(offset..)
    }

    #[inline]
    fn read_offset16_list(&mut self, count: u16, data: &'a [u8]) -> Option<OffsetList<'a>> {
        let offsets = self.read_array16(count)?;
        Some(OffsetList { data, offsets })
    }
}

/// A slice-like container with runtime-defined stride.
#[derive(Clone, Copy, Debug)]
pub struct DynArray<'a> {
    data: &'a [u8],
    stride: usize,
}

impl<'a> DynArray<'a> {
    #[inline]
    pub fn new(data: &'a [u8], stride: usize) -> Self {
        Self { data, stride }
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&'a [u8]> {
        let start = index.checked_mul(self.stride)?;
        let end = start.checked_add(self.stride)?;
        self.data.get(start..end)
    }

    #[inline]
    pub fn len(&self) -> usize {
        if self.stride == 0 {
            0
        } else {
            self.data.len() / self.stride
        }
    }

    pub fn binary_search_by<F>(&self, mut f: F) -> Option<(usize, &'a [u8])>
    where
        F: FnMut(&[u8]) -> core::cmp::Ordering,
    {
        use core::cmp::Ordering;

        let mut size = self.len();
        if size == 0 {
            return None;
        }

        let mut base = 0;
        while size > 1 {
            let half = size / 2;
            let mid = base + half;
            let cmp = f(self.get(mid)?);
            base = if cmp == Ordering::Greater { base } else { mid };
            size -= half;
        }

        let value = self.get(base)?;
        if f(value) == Ordering::Equal {
            Some((base, value))
        } else {
            None
        }
    }
}

/// Array of `Offset16` from the beginning of `data`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct OffsetList<'a> {
    data: &'a [u8],
    offsets: LazyArray16<'a, Offset16>,
}

impl<'a> OffsetList<'a> {
    pub fn len(&self) -> u16 {
        self.offsets.len()
    }

    /// Returns the data at `index`, `Some(None)` for a NULL offset.
    pub fn slice(&self, index: u16) -> Option<Option<&'a [u8]>> {
        let offset = self.offsets.get(index)?;
        if offset.is_null() {
            return Some(None);
        }

        self.data.get(offset.to_usize()..).map(Some)
    }

    /// Parses every non-NULL entry, failing if any of them is malformed.
    pub fn parse_all<T>(&self, mut f: impl FnMut(&'a [u8]) -> Option<T>) -> Option<Vec<Option<T>>> {
        let mut list = Vec::with_capacity(usize::from(self.len()));
        for i in 0..self.len() {
            let item = match self.slice(i)? {
                Some(data) => Some(f(data)?),
                None => None,
            };
            list.push(item);
        }

        Some(list)
    }

    /// Like `parse_all`, but NULL offsets are malformed as well.
    pub fn parse_required<T>(&self, mut f: impl FnMut(&'a [u8]) -> Option<T>) -> Option<Vec<T>> {
        let mut list = Vec::with_capacity(usize::from(self.len()));
        for i in 0..self.len() {
            list.push(f(self.slice(i)??)?);
        }

        Some(list)
    }
}
