//! Validation context shared by every table validator.
//!
//! A `Validator` is created once per validation pass and threaded by reference through the
//! table walk. It carries the requested strictness and the number of glyphs in the font. The
//! end of data is not stored here: it is the limit of the `ReadScope` the table is validated
//! through, and every nested scope derived from it shares that limit.

use std::fmt;
use std::str::FromStr;

use crate::binary::read::ReadArray;
use crate::binary::U16Be;
use crate::error::{ParseError, ValidationError};

/// How thoroughly a table is checked.
///
/// Levels are totally ordered and each one performs every check of the levels below it:
///
/// * `None` only guards memory safety and cross-references between lists.
/// * `Default` adds the structural invariants that lookups rely on, such as sorted ranges.
/// * `Tight` adds semantic checks, chiefly that glyph ids are less than the glyph count.
/// * `Paranoid` adds self-consistency checks of redundant fields such as binary search
///   parameters.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ValidationLevel {
    None,
    #[default]
    Default,
    Tight,
    Paranoid,
}

/// Per-pass validation state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Validator {
    level: ValidationLevel,
    num_glyphs: u32,
}

impl Validator {
    pub fn new(level: ValidationLevel, num_glyphs: u16) -> Validator {
        Validator {
            level,
            num_glyphs: u32::from(num_glyphs),
        }
    }

    pub fn level(&self) -> ValidationLevel {
        self.level
    }

    pub fn num_glyphs(&self) -> u32 {
        self.num_glyphs
    }

    /// Returns `true` if checks gated at `level` should run.
    pub fn at_least(&self, level: ValidationLevel) -> bool {
        self.level >= level
    }

    pub fn is_default(&self) -> bool {
        self.at_least(ValidationLevel::Default)
    }

    pub fn is_tight(&self) -> bool {
        self.at_least(ValidationLevel::Tight)
    }

    pub fn is_paranoid(&self) -> bool {
        self.at_least(ValidationLevel::Paranoid)
    }

    /// Check a condition, returning `ValidationError::InvalidData` if `false`.
    pub fn check(&self, cond: bool) -> Result<(), ValidationError> {
        match cond {
            true => Ok(()),
            false => Err(ValidationError::InvalidData),
        }
    }

    /// Check a format or version condition, returning `ValidationError::InvalidFormat` if `false`.
    pub fn check_format(&self, cond: bool) -> Result<(), ValidationError> {
        match cond {
            true => Ok(()),
            false => Err(ValidationError::InvalidFormat),
        }
    }

    /// Check that `index` refers to one of `count` entries of an already validated list.
    ///
    /// This is a structural check and runs at every level.
    pub fn check_index(&self, index: u16, count: usize) -> Result<(), ValidationError> {
        self.check(usize::from(index) < count)
    }

    /// At `Tight` and above check that `glyph_id` is a glyph of the font.
    pub fn check_glyph(&self, glyph_id: u32) -> Result<(), ValidationError> {
        if self.is_tight() && glyph_id >= self.num_glyphs {
            return Err(ValidationError::InvalidGlyphId);
        }
        Ok(())
    }

    /// At `Tight` and above check every glyph id in `glyphs`.
    pub fn check_glyphs(&self, glyphs: &ReadArray<'_, U16Be>) -> Result<(), ValidationError> {
        if self.is_tight() {
            for glyph_id in glyphs {
                self.check_glyph(u32::from(glyph_id))?;
            }
        }
        Ok(())
    }
}

impl FromStr for ValidationLevel {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(ValidationLevel::None),
            "default" => Ok(ValidationLevel::Default),
            "tight" => Ok(ValidationLevel::Tight),
            "paranoid" => Ok(ValidationLevel::Paranoid),
            _ => Err(ParseError::BadValue),
        }
    }
}

impl fmt::Display for ValidationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationLevel::None => write!(f, "none"),
            ValidationLevel::Default => write!(f, "default"),
            ValidationLevel::Tight => write!(f, "tight"),
            ValidationLevel::Paranoid => write!(f, "paranoid"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::read::ReadScope;

    #[test]
    fn levels_are_ordered() {
        assert!(ValidationLevel::None < ValidationLevel::Default);
        assert!(ValidationLevel::Default < ValidationLevel::Tight);
        assert!(ValidationLevel::Tight < ValidationLevel::Paranoid);
        assert_eq!(ValidationLevel::default(), ValidationLevel::Default);
    }

    #[test]
    fn level_from_str() {
        assert_eq!("tight".parse(), Ok(ValidationLevel::Tight));
        assert_eq!(" Paranoid ".parse(), Ok(ValidationLevel::Paranoid));
        assert_eq!("none".parse(), Ok(ValidationLevel::None));
        assert_eq!(
            "strict".parse::<ValidationLevel>(),
            Err(ParseError::BadValue)
        );
        assert_eq!(ValidationLevel::Tight.to_string(), "tight");
    }

    #[test]
    fn glyph_checks_only_when_tight() {
        let default = Validator::new(ValidationLevel::Default, 10);
        let tight = Validator::new(ValidationLevel::Tight, 10);
        assert_eq!(default.check_glyph(10), Ok(()));
        assert_eq!(tight.check_glyph(9), Ok(()));
        assert_eq!(tight.check_glyph(10), Err(ValidationError::InvalidGlyphId));
    }

    #[test]
    fn check_glyph_array() {
        let data = [0, 1, 0, 12];
        let glyphs = ReadScope::new(&data)
            .ctxt()
            .read_array::<U16Be>(2)
            .unwrap();
        let tight = Validator::new(ValidationLevel::Tight, 12);
        assert_eq!(
            tight.check_glyphs(&glyphs),
            Err(ValidationError::InvalidGlyphId)
        );
        let paranoid = Validator::new(ValidationLevel::Paranoid, 13);
        assert_eq!(paranoid.check_glyphs(&glyphs), Ok(()));
    }

    #[test]
    fn index_checks_run_at_every_level() {
        let none = Validator::new(ValidationLevel::None, 0);
        assert_eq!(none.check_index(2, 3), Ok(()));
        assert_eq!(none.check_index(3, 3), Err(ValidationError::InvalidData));
    }
}
