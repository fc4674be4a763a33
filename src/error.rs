//! Error types

use crate::binary::read::ReadEof;
use crate::tag::DisplayTag;
use std::fmt;

/// Errors that originate when parsing binary data
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum ParseError {
    BadEof,
    BadValue,
    BadVersion,
    BadOffset,
    BadIndex,
    MissingTable(u32),
}

impl From<ReadEof> for ParseError {
    fn from(_error: ReadEof) -> Self {
        ParseError::BadEof
    }
}

impl From<std::num::TryFromIntError> for ParseError {
    fn from(_error: std::num::TryFromIntError) -> Self {
        ParseError::BadValue
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::BadEof => write!(f, "end of data reached unexpectedly"),
            ParseError::BadValue => write!(f, "invalid value"),
            ParseError::BadVersion => write!(f, "unexpected data version"),
            ParseError::BadOffset => write!(f, "invalid data offset"),
            ParseError::BadIndex => write!(f, "invalid data index"),
            ParseError::MissingTable(tag) => {
                write!(f, "font is missing '{}' table", DisplayTag(*tag))
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Reasons a table is rejected by validation.
///
/// Every variant means the input is malformed. Validation stops at the first violation, so a
/// table is either accepted as a whole or rejected as a whole.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum ValidationError {
    /// A read or an offset target lies beyond the end of the table.
    TooShort,
    /// A version or format discriminant has a value outside the defined set.
    InvalidFormat,
    /// A structural invariant or cross-reference does not hold.
    InvalidData,
    /// A glyph index is not less than the number of glyphs in the font.
    InvalidGlyphId,
}

impl ValidationError {
    /// `true` for the errors that are refinements of `InvalidData`.
    ///
    /// Running out of data and out of range glyph ids are both specific kinds of invalid data.
    pub fn is_invalid_data(self) -> bool {
        match self {
            ValidationError::TooShort
            | ValidationError::InvalidData
            | ValidationError::InvalidGlyphId => true,
            ValidationError::InvalidFormat => false,
        }
    }
}

impl From<ReadEof> for ValidationError {
    fn from(_error: ReadEof) -> Self {
        ValidationError::TooShort
    }
}

impl From<ParseError> for ValidationError {
    fn from(error: ParseError) -> Self {
        match error {
            ParseError::BadEof | ParseError::BadOffset => ValidationError::TooShort,
            ParseError::BadVersion => ValidationError::InvalidFormat,
            ParseError::BadValue | ParseError::BadIndex | ParseError::MissingTable(_) => {
                ValidationError::InvalidData
            }
        }
    }
}

impl From<std::num::TryFromIntError> for ValidationError {
    fn from(_error: std::num::TryFromIntError) -> Self {
        ValidationError::InvalidData
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::TooShort => write!(f, "table is too short"),
            ValidationError::InvalidFormat => write!(f, "invalid table format"),
            ValidationError::InvalidData => write!(f, "invalid table data"),
            ValidationError::InvalidGlyphId => write!(f, "glyph index out of range"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors that prevent a font from being validated at all.
///
/// Rejection of an optional table is not an error of the font, see `Font::rejected`.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum FontValidationError {
    /// The table directory or a required table could not be read.
    Parse(ParseError),
    /// A required table was read but failed validation.
    Invalid { tag: u32, error: ValidationError },
}

impl From<ParseError> for FontValidationError {
    fn from(error: ParseError) -> Self {
        FontValidationError::Parse(error)
    }
}

impl fmt::Display for FontValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontValidationError::Parse(err) => write!(f, "parse error: {}", err),
            FontValidationError::Invalid { tag, error } => {
                write!(f, "'{}' table rejected: {}", DisplayTag(*tag), error)
            }
        }
    }
}

impl std::error::Error for FontValidationError {}
