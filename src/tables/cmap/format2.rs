//! Format 2: high-byte mapping through table.
//!
//! Mixed one and two byte encodings. The high byte of a code selects a sub-header through the
//! key table. Sub-header 0 is special: it maps single byte codes, and a high byte whose key
//! selects it is not the first byte of any two byte code.

use crate::binary::read::{ReadArray, ReadBinary, ReadCtxt, ReadFrom, ReadScope};
use crate::binary::{I16Be, U16Be};
use crate::error::{ParseError, ValidationError};
use crate::size;
use crate::tables::cmap::{subtable_scope, CharMap};
use crate::validate::Validator;

const SUB_HEADER_KEYS_OFFSET: usize = 6;
const SUB_HEADERS_OFFSET: usize = SUB_HEADER_KEYS_OFFSET + 256 * size::U16;
const SUB_HEADER_SIZE: usize = 4 * size::U16;

#[derive(Clone)]
pub struct Format2<'a> {
    scope: ReadScope<'a>,
    language: u16,
    sub_header_keys: ReadArray<'a, U16Be>,
    sub_headers: ReadArray<'a, SubHeader>,
}

// cmap subtable format 2 sub-header
#[derive(Debug, Copy, Clone)]
pub struct SubHeader {
    first_code: u16,
    entry_count: u16,
    id_delta: i16,
    id_range_offset: u16,
}

impl ReadFrom for SubHeader {
    type ReadType = ((U16Be, U16Be), (I16Be, U16Be));
    fn read_from(
        ((first_code, entry_count), (id_delta, id_range_offset)): ((u16, u16), (i16, u16)),
    ) -> Self {
        SubHeader {
            first_code,
            entry_count,
            id_delta,
            id_range_offset,
        }
    }
}

impl ReadBinary for Format2<'_> {
    type HostType<'a> = Format2<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Format2<'a>, ParseError> {
        let scope = ctxt.scope();
        let format = ctxt.read_u16be()?;
        ctxt.check_version(format == 2)?;
        let length = usize::from(ctxt.read_u16be()?);
        let scope = subtable_scope(scope, length, SUB_HEADERS_OFFSET)?;
        let mut ctxt = scope.offset(4).ctxt();
        let language = ctxt.read_u16be()?;
        let sub_header_keys = ctxt.read_array::<U16Be>(256)?;
        // Keys are sub-header indices multiplied by 8.
        let max_sub_header_index = sub_header_keys.iter().map(|key| key >> 3).max().unwrap_or(0);
        let sub_headers = ctxt.read_array::<SubHeader>(usize::from(max_sub_header_index) + 1)?;
        Ok(Format2 {
            scope,
            language,
            sub_header_keys,
            sub_headers,
        })
    }
}

impl<'a> Format2<'a> {
    pub fn validate(
        scope: ReadScope<'a>,
        valid: &Validator,
    ) -> Result<Format2<'a>, ValidationError> {
        let subtable = scope.read::<Format2<'_>>()?;
        if valid.is_paranoid() {
            valid.check(subtable.sub_header_keys.iter().all(|key| key % 8 == 0))?;
        }
        let glyph_ids_start = SUB_HEADERS_OFFSET + subtable.sub_headers.len() * SUB_HEADER_SIZE;
        for (index, sub_header) in subtable.sub_headers.iter().enumerate() {
            let first_code = usize::from(sub_header.first_code);
            let entry_count = usize::from(sub_header.entry_count);
            if valid.is_paranoid() {
                valid.check(first_code < 256 && first_code + entry_count <= 256)?;
            }
            if sub_header.id_range_offset == 0 {
                continue;
            }
            // The glyph ids must lie after the sub-headers and within the subtable.
            let position = Format2::glyph_ids_position(index, &sub_header);
            valid.check(
                position >= glyph_ids_start
                    && position + entry_count * size::U16 <= subtable.scope.len(),
            )?;
            if valid.is_tight() {
                let glyph_ids = subtable
                    .scope
                    .offset(position)
                    .ctxt()
                    .read_array::<U16Be>(entry_count)?;
                for glyph_id in glyph_ids.iter().filter(|&glyph_id| glyph_id != 0) {
                    let glyph_id = glyph_id.wrapping_add(sub_header.id_delta as u16);
                    valid.check_glyph(u32::from(glyph_id))?;
                }
            }
        }
        Ok(subtable)
    }

    pub fn language(&self) -> u16 {
        self.language
    }

    /// Position of the first glyph id of the sub-header at `index`.
    ///
    /// The range offset counts from the range offset field itself.
    fn glyph_ids_position(index: usize, sub_header: &SubHeader) -> usize {
        SUB_HEADERS_OFFSET
            + index * SUB_HEADER_SIZE
            + 3 * size::U16
            + usize::from(sub_header.id_range_offset)
    }

    /// The sub-header used by two byte codes starting with `high_byte`.
    fn sub_header_for_high_byte(&self, high_byte: u32) -> Option<(usize, SubHeader)> {
        let key = self.sub_header_keys.get_item(usize::try_from(high_byte).ok()?)?;
        match usize::from(key >> 3) {
            0 => None,
            index => Some((index, self.sub_headers.get_item(index)?)),
        }
    }

    fn sub_header_for_code(&self, char_code: u32) -> Option<(usize, SubHeader)> {
        match char_code >> 8 {
            0 => {
                let key = self.sub_header_keys.get_item(usize::try_from(char_code).ok()?)?;
                match key {
                    0 => Some((0, self.sub_headers.get_item(0)?)),
                    _ => None,
                }
            }
            0x01..=0xFF => self.sub_header_for_high_byte(char_code >> 8),
            _ => None,
        }
    }

    fn lookup(&self, char_code: u32) -> Option<u16> {
        let (index, sub_header) = self.sub_header_for_code(char_code)?;
        let low_byte = (char_code & 0xFF) as u16;
        let entry = low_byte.checked_sub(sub_header.first_code)?;
        if entry >= sub_header.entry_count || sub_header.id_range_offset == 0 {
            return None;
        }
        let position =
            Format2::glyph_ids_position(index, &sub_header) + usize::from(entry) * size::U16;
        match self.scope.offset(position).ctxt().read_u16be().ok()? {
            0 => None,
            // The delta arithmetic is modulo 65536.
            glyph_id => Some(glyph_id.wrapping_add(sub_header.id_delta as u16)),
        }
    }
}

impl CharMap for Format2<'_> {
    fn char_index(&self, char_code: u32) -> u16 {
        self.lookup(char_code).unwrap_or(0)
    }

    fn char_next(&self, char_code: u32) -> Option<(u32, u16)> {
        let mut code = char_code.checked_add(1)?;
        while code <= 0xFFFF {
            let high_byte = code >> 8;
            if high_byte != 0 {
                // Skip high bytes without a sub-header and codes outside the sub-header range.
                let next_high_byte = (high_byte + 1) << 8;
                match self.sub_header_for_high_byte(high_byte) {
                    Some((_, sub_header)) if sub_header.id_range_offset != 0 => {
                        let low_byte = code & 0xFF;
                        let first_code = u32::from(sub_header.first_code);
                        if low_byte < first_code {
                            code = (high_byte << 8) + first_code;
                            continue;
                        }
                        if low_byte >= first_code + u32::from(sub_header.entry_count) {
                            code = next_high_byte;
                            continue;
                        }
                    }
                    _ => {
                        code = next_high_byte;
                        continue;
                    }
                }
            }
            match self.char_index(code) {
                0 => code += 1,
                glyph => return Some((code, glyph)),
            }
        }
        None
    }
}
