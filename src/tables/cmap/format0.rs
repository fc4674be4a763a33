//! Format 0: byte encoding table.

use crate::binary::read::{ReadArray, ReadBinary, ReadCtxt, ReadScope};
use crate::binary::U8;
use crate::error::{ParseError, ValidationError};
use crate::tables::cmap::{subtable_scope, CharMap};
use crate::validate::Validator;

const LENGTH: usize = 6 + 256;

/// Single byte codes mapped directly to glyph ids below 256.
#[derive(Clone)]
pub struct Format0<'a> {
    language: u16,
    glyph_id_array: ReadArray<'a, U8>,
}

impl ReadBinary for Format0<'_> {
    type HostType<'a> = Format0<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Format0<'a>, ParseError> {
        let scope = ctxt.scope();
        let format = ctxt.read_u16be()?;
        ctxt.check_version(format == 0)?;
        let length = usize::from(ctxt.read_u16be()?);
        let mut ctxt = subtable_scope(scope, length, LENGTH)?.offset(4).ctxt();
        let language = ctxt.read_u16be()?;
        let glyph_id_array = ctxt.read_array::<U8>(256)?;
        Ok(Format0 {
            language,
            glyph_id_array,
        })
    }
}

impl<'a> Format0<'a> {
    pub fn validate(
        scope: ReadScope<'a>,
        valid: &Validator,
    ) -> Result<Format0<'a>, ValidationError> {
        let subtable = scope.read::<Format0<'_>>()?;
        if valid.is_tight() {
            for glyph_id in subtable.glyph_id_array.iter() {
                valid.check_glyph(u32::from(glyph_id))?;
            }
        }
        Ok(subtable)
    }

    pub fn language(&self) -> u16 {
        self.language
    }
}

impl CharMap for Format0<'_> {
    fn char_index(&self, char_code: u32) -> u16 {
        usize::try_from(char_code)
            .ok()
            .and_then(|index| self.glyph_id_array.get_item(index))
            .map_or(0, u16::from)
    }

    fn char_next(&self, char_code: u32) -> Option<(u32, u16)> {
        (char_code.checked_add(1)?..256).find_map(|code| match self.char_index(code) {
            0 => None,
            glyph => Some((code, glyph)),
        })
    }
}
