//! Format 12: segmented coverage.

use crate::binary::read::{ReadArray, ReadBinary, ReadCtxt, ReadScope};
use crate::error::{ParseError, ValidationError};
use crate::tables::cmap::{
    group_char_index, group_char_next, subtable_scope, validate_groups, CharMap,
    SequentialMapGroup,
};
use crate::validate::Validator;

const HEADER_SIZE: usize = 16;

#[derive(Clone)]
pub struct Format12<'a> {
    reserved: u16,
    language: u32,
    groups: ReadArray<'a, SequentialMapGroup>,
}

impl ReadBinary for Format12<'_> {
    type HostType<'a> = Format12<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Format12<'a>, ParseError> {
        let scope = ctxt.scope();
        let format = ctxt.read_u16be()?;
        ctxt.check_version(format == 12)?;
        let reserved = ctxt.read_u16be()?;
        let length = usize::try_from(ctxt.read_u32be()?)?;
        let mut ctxt = subtable_scope(scope, length, HEADER_SIZE)?.offset(8).ctxt();
        let language = ctxt.read_u32be()?;
        let num_groups = usize::try_from(ctxt.read_u32be()?)?;
        let groups = ctxt.read_array::<SequentialMapGroup>(num_groups)?;
        Ok(Format12 {
            reserved,
            language,
            groups,
        })
    }
}

impl<'a> Format12<'a> {
    pub fn validate(
        scope: ReadScope<'a>,
        valid: &Validator,
    ) -> Result<Format12<'a>, ValidationError> {
        let subtable = scope.read::<Format12<'_>>()?;
        if valid.is_paranoid() {
            valid.check(subtable.reserved == 0)?;
        }
        validate_groups(&subtable.groups, valid)?;
        Ok(subtable)
    }

    pub fn language(&self) -> u32 {
        self.language
    }

    pub fn groups(&self) -> impl Iterator<Item = SequentialMapGroup> + 'a {
        self.groups.iter()
    }
}

impl CharMap for Format12<'_> {
    fn char_index(&self, char_code: u32) -> u16 {
        group_char_index(&self.groups, char_code)
    }

    fn char_next(&self, char_code: u32) -> Option<(u32, u16)> {
        group_char_next(&self.groups, char_code)
    }
}
