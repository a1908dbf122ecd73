use core::fmt;
use core::str::FromStr;

use ttf_parser::FromData;

/// A type to represent 4-byte SFNT tags.
///
/// Tags are compared and ordered by their numeric value, which matches the
/// byte order used by the sorted records of OpenType lists.
#[derive(Copy, Clone, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Tag(pub u32);

impl Tag {
    /// Creates a `Tag` from bytes.
    pub const fn from_bytes(bytes: &[u8; 4]) -> Self {
        Tag(((bytes[0] as u32) << 24)
            | ((bytes[1] as u32) << 16)
            | ((bytes[2] as u32) << 8)
            | (bytes[3] as u32))
    }

    /// Creates a `Tag` from bytes.
    ///
    /// In case of empty data will return `Tag` set to 0.
    ///
    /// When `bytes` are shorter than 4, will set missing bytes to ` `.
    ///
    /// Data after first 4 bytes is ignored.
    pub fn from_bytes_lossy(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return Tag(0);
        }

        let mut raw = [b' '; 4];
        for (dst, src) in raw.iter_mut().zip(bytes) {
            *dst = *src;
        }

        Tag::from_bytes(&raw)
    }

    /// Returns tag as 4-element byte array.
    pub const fn to_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    /// Returns tag as 4-element char array.
    pub const fn to_chars(self) -> [char; 4] {
        let b = self.to_bytes();
        [b[0] as char, b[1] as char, b[2] as char, b[3] as char]
    }

    /// Returns tag for a default script.
    pub const fn default_script() -> Self {
        Tag::from_bytes(b"DFLT")
    }

    /// Returns tag for a default language.
    pub const fn default_language() -> Self {
        Tag::from_bytes(b"dflt")
    }

    /// Checks if tag is null / `[0, 0, 0, 0]`.
    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Returns tag value as `u32` number.
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    /// Converts tag to lowercase.
    pub fn to_lowercase(&self) -> Self {
        let b = self.to_bytes();
        Tag::from_bytes(&[
            b[0].to_ascii_lowercase(),
            b[1].to_ascii_lowercase(),
            b[2].to_ascii_lowercase(),
            b[3].to_ascii_lowercase(),
        ])
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.to_chars();
        write!(f, "Tag({}{}{}{})", b[0], b[1], b[2], b[3])
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.to_chars();
        write!(f, "{}{}{}{}", b[0], b[1], b[2], b[3])
    }
}

impl From<u32> for Tag {
    #[inline]
    fn from(value: u32) -> Self {
        Tag(value)
    }
}

impl From<ttf_parser::Tag> for Tag {
    #[inline]
    fn from(value: ttf_parser::Tag) -> Self {
        Tag(value.0)
    }
}

/// Parses exactly four one-byte characters.
///
/// A non-ASCII character becomes a zero byte. Strings that are not four
/// characters long produce a null tag; parsing never fails.
impl FromStr for Tag {
    type Err = core::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut raw = [0u8; 4];
        let mut count = 0;
        for c in s.chars() {
            if count == 4 {
                return Ok(Tag(0));
            }

            raw[count] = if c.is_ascii() { c as u8 } else { 0 };
            count += 1;
        }

        if count != 4 {
            return Ok(Tag(0));
        }

        Ok(Tag::from_bytes(&raw))
    }
}

impl FromData for Tag {
    const SIZE: usize = 4;

    #[inline]
    fn parse(data: &[u8]) -> Option<Self> {
        u32::parse(data).map(Tag)
    }
}

/// Feature tags referenced by the shapers.
pub mod feature {
    #![allow(missing_docs)]

    use super::Tag;

    pub const ABOVE_BASE_MARK_POSITIONING: Tag = Tag::from_bytes(b"abvm");
    pub const BELOW_BASE_MARK_POSITIONING: Tag = Tag::from_bytes(b"blwm");
    pub const CONTEXTUAL_ALTERNATES: Tag = Tag::from_bytes(b"calt");
    pub const GLYPH_COMPOSITION_DECOMPOSITION: Tag = Tag::from_bytes(b"ccmp");
    pub const CONTEXTUAL_LIGATURES: Tag = Tag::from_bytes(b"clig");
    pub const CURSIVE_POSITIONING: Tag = Tag::from_bytes(b"curs");
    pub const DISTANCES: Tag = Tag::from_bytes(b"dist");
    pub const TERMINAL_FORMS_1: Tag = Tag::from_bytes(b"fina");
    pub const TERMINAL_FORMS_2: Tag = Tag::from_bytes(b"fin2");
    pub const TERMINAL_FORMS_3: Tag = Tag::from_bytes(b"fin3");
    pub const INITIAL_FORMS: Tag = Tag::from_bytes(b"init");
    pub const ISOLATED_FORMS: Tag = Tag::from_bytes(b"isol");
    pub const KERNING: Tag = Tag::from_bytes(b"kern");
    pub const STANDARD_LIGATURES: Tag = Tag::from_bytes(b"liga");
    pub const LEADING_JAMO_FORMS: Tag = Tag::from_bytes(b"ljmo");
    pub const LOCALIZED_FORMS: Tag = Tag::from_bytes(b"locl");
    pub const LEFT_TO_RIGHT_ALTERNATES: Tag = Tag::from_bytes(b"ltra");
    pub const LEFT_TO_RIGHT_MIRRORED_FORMS: Tag = Tag::from_bytes(b"ltrm");
    pub const MARK_POSITIONING: Tag = Tag::from_bytes(b"mark");
    pub const MEDIAL_FORMS_1: Tag = Tag::from_bytes(b"medi");
    pub const MEDIAL_FORMS_2: Tag = Tag::from_bytes(b"med2");
    pub const MARK_POSITIONING_VIA_SUBSTITUTION: Tag = Tag::from_bytes(b"mset");
    pub const MARK_TO_MARK_POSITIONING: Tag = Tag::from_bytes(b"mkmk");
    pub const REQUIRED_CONTEXTUAL_ALTERNATES: Tag = Tag::from_bytes(b"rclt");
    pub const REQUIRED_LIGATURES: Tag = Tag::from_bytes(b"rlig");
    pub const RIGHT_TO_LEFT_ALTERNATES: Tag = Tag::from_bytes(b"rtla");
    pub const RIGHT_TO_LEFT_MIRRORED_FORMS: Tag = Tag::from_bytes(b"rtlm");
    pub const REQUIRED_VARIATION_ALTERNATES: Tag = Tag::from_bytes(b"rvrn");
    pub const TRAILING_JAMO_FORMS: Tag = Tag::from_bytes(b"tjmo");
    pub const VERTICAL_ALTERNATES: Tag = Tag::from_bytes(b"vert");
    pub const VOWEL_JAMO_FORMS: Tag = Tag::from_bytes(b"vjmo");
}
