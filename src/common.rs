use core::str::FromStr;

use smallvec::SmallVec;

pub use unicode_script::Script;

use crate::Tag;

/// Defines the direction in which text is to be read.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Text is set horizontally from left to right.
    #[default]
    LeftToRight,
    /// Text is set horizontally from right to left.
    RightToLeft,
    /// Text is set vertically from top to bottom.
    TopToBottom,
    /// Text is set vertically from bottom to top.
    BottomToTop,
}

impl Direction {
    /// Checks that direction is horizontal.
    #[inline]
    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::LeftToRight | Direction::RightToLeft)
    }

    /// Checks that direction is vertical.
    #[inline]
    pub fn is_vertical(self) -> bool {
        !self.is_horizontal()
    }

    /// Checks that direction is forward.
    #[inline]
    pub fn is_forward(self) -> bool {
        matches!(self, Direction::LeftToRight | Direction::TopToBottom)
    }

    /// Checks that direction is backward.
    #[inline]
    pub fn is_backward(self) -> bool {
        !self.is_forward()
    }
}

impl FromStr for Direction {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Only the first letter is significant.
        match s.as_bytes().first().map(u8::to_ascii_lowercase) {
            Some(b'l') => Ok(Direction::LeftToRight),
            Some(b'r') => Ok(Direction::RightToLeft),
            Some(b't') => Ok(Direction::TopToBottom),
            Some(b'b') => Ok(Direction::BottomToTop),
            _ => Err("invalid direction"),
        }
    }
}

/// A feature setting requested by the caller.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Feature {
    /// The feature tag.
    pub tag: Tag,
    /// Whether the feature is turned on.
    pub enabled: bool,
}

impl Feature {
    /// Creates a new `Feature`.
    pub fn new(tag: Tag, enabled: bool) -> Self {
        Feature { tag, enabled }
    }
}

impl FromStr for Feature {
    type Err = &'static str;

    /// Parses a feature string.
    ///
    /// Accepts `liga`, `+liga`, `-liga`, `liga=0` and `liga=1`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (enabled, rest) = match s.as_bytes().first() {
            Some(b'-') => (false, &s[1..]),
            Some(b'+') => (true, &s[1..]),
            Some(_) => (true, s),
            None => return Err("invalid feature"),
        };

        let (name, enabled) = match rest.split_once('=') {
            Some((name, "0")) => (name, false),
            Some((name, "1")) => (name, enabled),
            Some(_) => return Err("invalid feature value"),
            None => (rest, enabled),
        };

        let tag = Tag::from_bytes_lossy(name.as_bytes());
        if tag.is_null() {
            return Err("invalid feature");
        }

        Ok(Feature { tag, enabled })
    }
}

/// Options of a single shaping call.
#[derive(Clone, Debug, Default)]
pub struct ShapingOptions {
    /// Text direction assigned to every glyph.
    pub direction: Direction,
    /// Forces a script for the whole run. Detected per glyph when `None`.
    pub script: Option<Script>,
    /// Preferred OpenType language system.
    pub language: Option<Tag>,
    /// Features turned on or off on top of the shaper defaults.
    pub features: Vec<Feature>,
}

/// Returns the ranked OpenType script tags for a Unicode script.
///
/// New-style Indic tags come before the old ones. The generic fallbacks
/// (`DFLT`, `dflt`, `latn`) are not included.
pub fn script_tags(script: Script) -> SmallVec<[Tag; 3]> {
    let mut tags = SmallVec::new();

    let new_tag = match script {
        Script::Bengali => Some(b"bng2"),
        Script::Devanagari => Some(b"dev2"),
        Script::Gujarati => Some(b"gjr2"),
        Script::Gurmukhi => Some(b"gur2"),
        Script::Kannada => Some(b"knd2"),
        Script::Malayalam => Some(b"mlm2"),
        Script::Oriya => Some(b"ory2"),
        Script::Tamil => Some(b"tml2"),
        Script::Telugu => Some(b"tel2"),
        Script::Myanmar => Some(b"mym2"),
        _ => None,
    };

    if let Some(bytes) = new_tag {
        tags.push(Tag::from_bytes(bytes));
    }

    let old_tag = match script {
        Script::Hiragana | Script::Katakana => Tag::from_bytes(b"kana"),
        Script::Lao => Tag::from_bytes(b"lao "),
        Script::Yi => Tag::from_bytes(b"yi  "),
        Script::Nko => Tag::from_bytes(b"nko "),
        Script::Vai => Tag::from_bytes(b"vai "),
        Script::Common | Script::Inherited | Script::Unknown => return tags,
        _ => Tag::from_bytes_lossy(script.short_name().as_bytes()).to_lowercase(),
    };

    tags.push(old_tag);
    tags
}

/// Checks that script class does not start a new script run.
#[inline]
pub fn is_neutral_script(script: Script) -> bool {
    matches!(script, Script::Common | Script::Inherited | Script::Unknown)
}
