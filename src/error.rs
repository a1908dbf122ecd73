use thiserror::Error;

/// A shaping error.
#[derive(Debug, Error)]
pub enum Error {
    /// A layout table is structurally broken or uses an unknown format.
    ///
    /// Raised while loading; the whole table is rejected.
    #[error("invalid font file: {0}")]
    InvalidFontFile(String),

    /// A well-formed lookup that cannot be applied where the font uses it.
    #[error("{table} lookup type {lookup_type} is not supported in this context")]
    NotSupported {
        /// `GSUB` or `GPOS`.
        table: &'static str,
        /// The raw lookup type.
        lookup_type: u16,
    },

    /// The font file itself could not be opened.
    #[error("failed to parse font: {0}")]
    Face(#[from] ttf_parser::FaceParsingError),
}

impl Error {
    pub(crate) fn malformed(table: &str, what: impl core::fmt::Display) -> Self {
        Error::InvalidFontFile(format!("{} table has a malformed {}", table, what))
    }
}
