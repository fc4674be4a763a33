//! Format 8: mixed 16-bit and 32-bit coverage.
//!
//! The `is32` bitmap has a bit per 16-bit code unit, set when the unit is the high half of a
//! 32-bit code. A 32-bit code has both of its halves flagged, a 16-bit code has its own bit
//! clear.

use crate::binary::read::{ReadArray, ReadBinary, ReadCtxt, ReadScope};
use crate::error::{ParseError, ValidationError};
use crate::tables::cmap::{
    group_char_index, group_char_next, subtable_scope, validate_groups, CharMap,
    SequentialMapGroup,
};
use crate::validate::Validator;

const IS32_SIZE: usize = 8192;
const HEADER_SIZE: usize = 12 + IS32_SIZE + 4;

#[derive(Clone)]
pub struct Format8<'a> {
    reserved: u16,
    language: u32,
    is32: &'a [u8],
    groups: ReadArray<'a, SequentialMapGroup>,
}

impl ReadBinary for Format8<'_> {
    type HostType<'a> = Format8<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Format8<'a>, ParseError> {
        let scope = ctxt.scope();
        let format = ctxt.read_u16be()?;
        ctxt.check_version(format == 8)?;
        let reserved = ctxt.read_u16be()?;
        let length = usize::try_from(ctxt.read_u32be()?)?;
        let mut ctxt = subtable_scope(scope, length, HEADER_SIZE)?.offset(8).ctxt();
        let language = ctxt.read_u32be()?;
        let is32 = ctxt.read_slice(IS32_SIZE)?;
        let num_groups = usize::try_from(ctxt.read_u32be()?)?;
        let groups = ctxt.read_array::<SequentialMapGroup>(num_groups)?;
        Ok(Format8 {
            reserved,
            language,
            is32,
            groups,
        })
    }
}

impl<'a> Format8<'a> {
    pub fn validate(
        scope: ReadScope<'a>,
        valid: &Validator,
    ) -> Result<Format8<'a>, ValidationError> {
        let subtable = scope.read::<Format8<'_>>()?;
        if valid.is_paranoid() {
            valid.check(subtable.reserved == 0)?;
        }
        // At `Tight` the glyph range check bounds the size of each group before its codes are
        // checked against the bitmap.
        validate_groups(&subtable.groups, valid)?;
        if valid.is_tight() {
            for group in subtable.groups.iter() {
                subtable.check_is32(&group, valid)?;
            }
        }
        Ok(subtable)
    }

    pub fn language(&self) -> u32 {
        self.language
    }

    pub fn groups(&self) -> impl Iterator<Item = SequentialMapGroup> + 'a {
        self.groups.iter()
    }

    /// `true` if the 16-bit code unit `unit` is flagged as the high half of a 32-bit code.
    pub fn is32(&self, unit: u16) -> bool {
        let bit = 0x80 >> (unit & 7);
        self.is32
            .get(usize::from(unit >> 3))
            .map_or(false, |byte| byte & bit != 0)
    }

    fn check_is32(
        &self,
        group: &SequentialMapGroup,
        valid: &Validator,
    ) -> Result<(), ValidationError> {
        let codes = group.start_char_code..=group.end_char_code;
        if group.start_char_code > 0xFFFF {
            for code in codes {
                let high = (code >> 16) as u16;
                let low = (code & 0xFFFF) as u16;
                valid.check(self.is32(high) && self.is32(low))?;
            }
        } else {
            valid.check(group.end_char_code <= 0xFFFF)?;
            for code in codes {
                valid.check(!self.is32(code as u16))?;
            }
        }
        Ok(())
    }
}

impl CharMap for Format8<'_> {
    fn char_index(&self, char_code: u32) -> u16 {
        group_char_index(&self.groups, char_code)
    }

    fn char_next(&self, char_code: u32) -> Option<(u32, u16)> {
        group_char_next(&self.groups, char_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::TableBuilder;
    use crate::validate::ValidationLevel;

    fn format8(is32_units: &[u16], groups: &[(u32, u32, u32)]) -> Vec<u8> {
        let mut is32 = vec![0u8; IS32_SIZE];
        for &unit in is32_units {
            is32[usize::from(unit >> 3)] |= 0x80 >> (unit & 7);
        }
        let mut w = TableBuilder::new();
        w.u16(8)
            .u16(0)
            .u32((HEADER_SIZE + 12 * groups.len()) as u32)
            .u32(0)
            .bytes(&is32)
            .u32(groups.len() as u32);
        for &(start, end, glyph) in groups {
            w.u32(start).u32(end).u32(glyph);
        }
        w.into_inner()
    }

    #[test]
    fn mixed_width_lookup() {
        // U+10400..U+10401 as the surrogate pairs D801 DC00 and D801 DC01.
        let data = format8(
            &[0xD801, 0xDC00, 0xDC01],
            &[(0x41, 0x42, 1), (0xD801_DC00, 0xD801_DC01, 3)],
        );
        let valid = Validator::new(ValidationLevel::Paranoid, 5);
        let subtable = Format8::validate(ReadScope::new(&data), &valid).unwrap();
        assert!(subtable.is32(0xD801));
        assert!(!subtable.is32(0x41));
        assert_eq!(subtable.char_index(0x42), 2);
        assert_eq!(subtable.char_index(0xD801_DC01), 4);
        assert_eq!(subtable.char_index(0x43), 0);
        assert_eq!(subtable.char_next(0x42), Some((0xD801_DC00, 3)));
        assert_eq!(subtable.char_next(0xD801_DC01), None);
    }

    #[test]
    fn sixteen_bit_codes_must_not_be_flagged() {
        let data = format8(&[0x42], &[(0x41, 0x42, 1)]);
        let scope = ReadScope::new(&data);
        let default = Validator::new(ValidationLevel::Default, 5);
        assert!(Format8::validate(scope, &default).is_ok());
        let tight = Validator::new(ValidationLevel::Tight, 5);
        assert_eq!(
            Format8::validate(scope, &tight).err(),
            Some(ValidationError::InvalidData)
        );
    }

    #[test]
    fn thirty_two_bit_codes_must_be_flagged() {
        let tight = Validator::new(ValidationLevel::Tight, 5);
        // Low half of the second code is missing from the bitmap.
        let data = format8(&[0xD801, 0xDC00], &[(0xD801_DC00, 0xD801_DC01, 1)]);
        assert_eq!(
            Format8::validate(ReadScope::new(&data), &tight).err(),
            Some(ValidationError::InvalidData)
        );
        // A group may not cross from 16-bit into 32-bit codes.
        let data = format8(&[], &[(0xFFFF, 0x10000, 1)]);
        assert_eq!(
            Format8::validate(ReadScope::new(&data), &tight).err(),
            Some(ValidationError::InvalidData)
        );
    }

    #[test]
    fn length_includes_bitmap() {
        let mut data = format8(&[], &[]);
        let valid = Validator::new(ValidationLevel::None, 5);
        assert!(Format8::validate(ReadScope::new(&data), &valid).is_ok());
        assert_eq!(
            Format8::validate(ReadScope::new(&data[..HEADER_SIZE - 1]), &valid).err(),
            Some(ValidationError::TooShort)
        );
        // Declared length shorter than the bitmap.
        data[4..8].copy_from_slice(&100u32.to_be_bytes());
        assert_eq!(
            Format8::validate(ReadScope::new(&data), &valid).err(),
            Some(ValidationError::TooShort)
        );
    }
}
