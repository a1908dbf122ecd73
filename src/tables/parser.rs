//! Big-endian readers over font data.

use ttf_parser::{FromData, LazyArray16, LazyArray32};

/// An offset into font data.
pub trait Offset {
    fn to_usize(&self) -> usize;

    #[inline]
    fn is_null(&self) -> bool {
        self.to_usize() == 0
    }
}

/// A 16-bit offset, usually from the start of the enclosing table.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Offset16(pub u16);

impl Offset for Offset16 {
    #[inline]
    fn to_usize(&self) -> usize {
        usize::from(self.0)
    }
}

impl FromData for Offset16 {
    const SIZE: usize = 2;

    #[inline]
    fn parse(data: &[u8]) -> Option<Self> {
        u16::parse(data).map(Offset16)
    }
}

/// A 32-bit offset.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Offset32(pub u32);

impl Offset for Offset32 {
    #[inline]
    fn to_usize(&self) -> usize {
        self.0 as usize
    }
}

impl FromData for Offset32 {
    const SIZE: usize = 4;

    #[inline]
    fn parse(data: &[u8]) -> Option<Self> {
        u32::parse(data).map(Offset32)
    }
}

/// A cursor over font data. Reads past the end return `None`.
#[derive(Clone, Copy, Debug)]
pub struct Stream<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Stream<'a> {
    #[inline]
    pub fn new(data: &'a [u8]) -> Self {
        Stream { data, offset: 0 }
    }

    #[inline]
    pub fn skip<T: FromData>(&mut self) {
        self.offset = self.offset.saturating_add(T::SIZE);
    }

    #[inline]
    pub fn read_bytes(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.offset.checked_add(len)?;
        let bytes = self.data.get(self.offset..end)?;
        self.offset = end;
        Some(bytes)
    }

    #[inline]
    pub fn read<T: FromData>(&mut self) -> Option<T> {
        self.read_bytes(T::SIZE).and_then(T::parse)
    }

    /// Reads an offset, mapping NULL to `Some(None)`.
    #[inline]
    pub fn read_optional<T: FromData + Offset>(&mut self) -> Option<Option<T>> {
        let offset = self.read::<T>()?;
        Some((!offset.is_null()).then_some(offset))
    }

    #[inline]
    pub fn read_array16<T: FromData>(&mut self, count: u16) -> Option<LazyArray16<'a, T>> {
        let len = usize::from(count).checked_mul(T::SIZE)?;
        self.read_bytes(len).map(LazyArray16::new)
    }

    #[inline]
    pub fn read_array32<T: FromData>(&mut self, count: u32) -> Option<LazyArray32<'a, T>> {
        let len = usize::try_from(count).ok()?.checked_mul(T::SIZE)?;
        self.read_bytes(len).map(LazyArray32::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_stop_at_the_end() {
        let data = [0, 1, 0, 0, 0xFF];
        let mut s = Stream::new(&data);
        assert_eq!(s.read::<u16>(), Some(1));
        assert_eq!(s.read_optional::<Offset16>(), Some(None));
        assert_eq!(s.read::<u16>(), None);
        assert_eq!(s.read_bytes(1), Some(&[0xFF][..]));
    }

    #[test]
    fn array_length_is_checked() {
        let data = [0, 1, 0, 2, 0, 3];
        let mut s = Stream::new(&data);
        assert!(s.read_array16::<u16>(4).is_none());
        let array = s.read_array16::<u16>(3).unwrap();
        assert_eq!(array.get(2), Some(3));
    }
}
