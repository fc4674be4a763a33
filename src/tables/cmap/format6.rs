//! Format 6: trimmed table mapping.

use crate::binary::read::{ReadArray, ReadBinary, ReadCtxt, ReadScope};
use crate::binary::U16Be;
use crate::error::{ParseError, ValidationError};
use crate::tables::cmap::{subtable_scope, CharMap};
use crate::validate::Validator;

const HEADER_SIZE: usize = 10;

/// A dense run of 16-bit codes starting at `first_code`.
#[derive(Clone)]
pub struct Format6<'a> {
    language: u16,
    first_code: u16,
    glyph_id_array: ReadArray<'a, U16Be>,
}

impl ReadBinary for Format6<'_> {
    type HostType<'a> = Format6<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Format6<'a>, ParseError> {
        let scope = ctxt.scope();
        let format = ctxt.read_u16be()?;
        ctxt.check_version(format == 6)?;
        let length = usize::from(ctxt.read_u16be()?);
        let mut ctxt = subtable_scope(scope, length, HEADER_SIZE)?.offset(4).ctxt();
        let language = ctxt.read_u16be()?;
        let first_code = ctxt.read_u16be()?;
        let entry_count = usize::from(ctxt.read_u16be()?);
        let glyph_id_array = ctxt.read_array::<U16Be>(entry_count)?;
        Ok(Format6 {
            language,
            first_code,
            glyph_id_array,
        })
    }
}

impl<'a> Format6<'a> {
    pub fn validate(
        scope: ReadScope<'a>,
        valid: &Validator,
    ) -> Result<Format6<'a>, ValidationError> {
        let subtable = scope.read::<Format6<'_>>()?;
        valid.check_glyphs(&subtable.glyph_id_array)?;
        Ok(subtable)
    }

    pub fn language(&self) -> u16 {
        self.language
    }
}

impl CharMap for Format6<'_> {
    fn char_index(&self, char_code: u32) -> u16 {
        if char_code > 0xFFFF {
            return 0;
        }
        char_code
            .checked_sub(u32::from(self.first_code))
            .and_then(|index| usize::try_from(index).ok())
            .and_then(|index| self.glyph_id_array.get_item(index))
            .unwrap_or(0)
    }

    fn char_next(&self, char_code: u32) -> Option<(u32, u16)> {
        let first_code = u32::from(self.first_code);
        let from = char_code.checked_add(1)?.max(first_code);
        let skip = usize::try_from(from - first_code).ok()?;
        self.glyph_id_array
            .iter()
            .enumerate()
            .skip(skip)
            .find_map(|(index, glyph)| {
                let code = first_code + u32::try_from(index).ok()?;
                (glyph != 0 && code <= 0xFFFF).then_some((code, glyph))
            })
    }
}
