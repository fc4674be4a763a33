//! Format 10: trimmed array.

use crate::binary::read::{ReadArray, ReadBinary, ReadCtxt, ReadScope};
use crate::binary::U16Be;
use crate::error::{ParseError, ValidationError};
use crate::tables::cmap::{subtable_scope, CharMap};
use crate::validate::Validator;

const HEADER_SIZE: usize = 20;

/// The 32-bit counterpart of format 6.
#[derive(Clone)]
pub struct Format10<'a> {
    reserved: u16,
    language: u32,
    start_char_code: u32,
    glyphs: ReadArray<'a, U16Be>,
}

impl ReadBinary for Format10<'_> {
    type HostType<'a> = Format10<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Format10<'a>, ParseError> {
        let scope = ctxt.scope();
        let format = ctxt.read_u16be()?;
        ctxt.check_version(format == 10)?;
        let reserved = ctxt.read_u16be()?;
        let length = usize::try_from(ctxt.read_u32be()?)?;
        let mut ctxt = subtable_scope(scope, length, HEADER_SIZE)?.offset(8).ctxt();
        let language = ctxt.read_u32be()?;
        let start_char_code = ctxt.read_u32be()?;
        let num_chars = usize::try_from(ctxt.read_u32be()?)?;
        let glyphs = ctxt.read_array::<U16Be>(num_chars)?;
        Ok(Format10 {
            reserved,
            language,
            start_char_code,
            glyphs,
        })
    }
}

impl<'a> Format10<'a> {
    pub fn validate(
        scope: ReadScope<'a>,
        valid: &Validator,
    ) -> Result<Format10<'a>, ValidationError> {
        let subtable = scope.read::<Format10<'_>>()?;
        if valid.is_paranoid() {
            valid.check(subtable.reserved == 0)?;
        }
        valid.check_glyphs(&subtable.glyphs)?;
        Ok(subtable)
    }

    pub fn language(&self) -> u32 {
        self.language
    }
}

impl CharMap for Format10<'_> {
    fn char_index(&self, char_code: u32) -> u16 {
        char_code
            .checked_sub(self.start_char_code)
            .and_then(|index| usize::try_from(index).ok())
            .and_then(|index| self.glyphs.get_item(index))
            .unwrap_or(0)
    }

    fn char_next(&self, char_code: u32) -> Option<(u32, u16)> {
        let from = char_code.checked_add(1)?.max(self.start_char_code);
        let skip = usize::try_from(from - self.start_char_code).ok()?;
        self.glyphs
            .iter()
            .enumerate()
            .skip(skip)
            .find_map(|(index, glyph)| {
                let code = self
                    .start_char_code
                    .checked_add(u32::try_from(index).ok()?)?;
                (glyph != 0).then_some((code, glyph))
            })
    }
}
