//! Format 4: segment mapping to delta values.
//!
//! Codes are split into segments with parallel arrays of end codes, start codes, deltas and
//! range offsets. A zero range offset maps a code by adding the delta to it. Otherwise the
//! range offset locates a run of glyph ids, counted from the range offset field itself, and
//! the delta is added to any non-zero glyph id found there.

use crate::binary::read::{ReadArray, ReadBinary, ReadCtxt, ReadScope};
use crate::binary::{I16Be, U16Be};
use crate::error::{ParseError, ValidationError};
use crate::size;
use crate::tables::cmap::{subtable_scope, CharMap};
use crate::validate::Validator;

const HEADER_SIZE: usize = 7 * size::U16;

#[derive(Clone)]
pub struct Format4<'a> {
    scope: ReadScope<'a>,
    language: u16,
    seg_count_x2: u16,
    search_range: u16,
    entry_selector: u16,
    range_shift: u16,
    end_codes: ReadArray<'a, U16Be>,
    start_codes: ReadArray<'a, U16Be>,
    id_deltas: ReadArray<'a, I16Be>,
    id_range_offsets: ReadArray<'a, U16Be>,
}

impl ReadBinary for Format4<'_> {
    type HostType<'a> = Format4<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Format4<'a>, ParseError> {
        let scope = ctxt.scope();
        let format = ctxt.read_u16be()?;
        ctxt.check_version(format == 4)?;
        let length = usize::from(ctxt.read_u16be()?);
        let scope = subtable_scope(scope, length, HEADER_SIZE + size::U16)?;
        let mut ctxt = scope.offset(4).ctxt();
        let language = ctxt.read_u16be()?;
        let seg_count_x2 = ctxt.read_u16be()?;
        let search_range = ctxt.read_u16be()?;
        let entry_selector = ctxt.read_u16be()?;
        let range_shift = ctxt.read_u16be()?;
        let seg_count = usize::from(seg_count_x2 / 2);
        let end_codes = ctxt.read_array::<U16Be>(seg_count)?;
        let _reserved_pad = ctxt.read_u16be()?;
        let start_codes = ctxt.read_array::<U16Be>(seg_count)?;
        let id_deltas = ctxt.read_array::<I16Be>(seg_count)?;
        let id_range_offsets = ctxt.read_array::<U16Be>(seg_count)?;
        Ok(Format4 {
            scope,
            language,
            seg_count_x2,
            search_range,
            entry_selector,
            range_shift,
            end_codes,
            start_codes,
            id_deltas,
            id_range_offsets,
        })
    }
}

impl<'a> Format4<'a> {
    pub fn validate(
        scope: ReadScope<'a>,
        valid: &Validator,
    ) -> Result<Format4<'a>, ValidationError> {
        let subtable = scope.read::<Format4<'_>>()?;
        let seg_count = subtable.end_codes.len();
        if valid.is_default() {
            valid.check(subtable.seg_count_x2 % 2 == 0)?;
        }
        if valid.is_paranoid() {
            valid.check(subtable.has_consistent_search_params())?;
        }
        if valid.is_tight() {
            valid.check(subtable.end_codes.last() == Some(0xFFFF))?;
        }

        let glyph_ids_start = subtable.id_range_offsets_position() + seg_count * size::U16;
        let mut last_end = None;
        for segment in 0..seg_count {
            let end = subtable.end_codes.read_item(segment)?;
            let start = subtable.start_codes.read_item(segment)?;
            let id_delta = subtable.id_deltas.read_item(segment)?;
            let id_range_offset = subtable.id_range_offsets.read_item(segment)?;
            if valid.is_default() {
                valid.check(start <= end)?;
                valid.check(last_end.map_or(true, |last_end| start > last_end))?;
            }
            if id_range_offset != 0 {
                let position = subtable.glyph_ids_position(segment, id_range_offset);
                let count = (usize::from(end) + 1).saturating_sub(usize::from(start));
                valid.check(
                    position >= glyph_ids_start
                        && position + count * size::U16 <= subtable.scope.len(),
                )?;
                if valid.is_tight() {
                    let glyph_ids = subtable
                        .scope
                        .offset(position)
                        .ctxt()
                        .read_array::<U16Be>(count)?;
                    for glyph_id in glyph_ids.iter().filter(|&glyph_id| glyph_id != 0) {
                        let glyph_id = glyph_id.wrapping_add(id_delta as u16);
                        valid.check_glyph(u32::from(glyph_id))?;
                    }
                }
            }
            last_end = Some(end);
        }
        Ok(subtable)
    }

    pub fn language(&self) -> u16 {
        self.language
    }

    /// `searchRange` is twice the largest power of two not greater than the segment count,
    /// `entrySelector` is its log2 and `rangeShift` makes up the difference.
    fn has_consistent_search_params(&self) -> bool {
        let seg_count = u32::from(self.seg_count_x2 / 2);
        let search_range = u32::from(self.search_range);
        let range_shift = u32::from(self.range_shift);
        if search_range % 2 != 0 || range_shift % 2 != 0 {
            return false;
        }
        let (search_range, range_shift) = (search_range / 2, range_shift / 2);
        search_range <= seg_count
            && search_range * 2 > seg_count
            && search_range + range_shift == seg_count
            && 1u32.checked_shl(u32::from(self.entry_selector)) == Some(search_range)
    }

    fn id_range_offsets_position(&self) -> usize {
        HEADER_SIZE + size::U16 + 3 * self.end_codes.len() * size::U16
    }

    /// Position of the glyph id for the start code of `segment`.
    fn glyph_ids_position(&self, segment: usize, id_range_offset: u16) -> usize {
        self.id_range_offsets_position() + segment * size::U16 + usize::from(id_range_offset)
    }

    /// Index of the segment containing `char_code`, by binary search of the end codes.
    fn find_segment(&self, char_code: u16) -> Option<usize> {
        let (mut low, mut high) = (0, self.end_codes.len());
        while low < high {
            let mid = low + (high - low) / 2;
            if self.end_codes.get_item(mid)? < char_code {
                low = mid + 1;
            } else {
                high = mid;
            }
        }
        let start = self.start_codes.get_item(low)?;
        (start <= char_code).then_some(low)
    }

    fn segment_glyph(&self, segment: usize, char_code: u16) -> Option<u16> {
        let id_delta = self.id_deltas.get_item(segment)? as u16;
        let glyph_id = match self.id_range_offsets.get_item(segment)? {
            // The delta arithmetic is modulo 65536.
            0 => char_code.wrapping_add(id_delta),
            id_range_offset => {
                let start = self.start_codes.get_item(segment)?;
                let position = self.glyph_ids_position(segment, id_range_offset)
                    + usize::from(char_code.checked_sub(start)?) * size::U16;
                match self.scope.offset(position).ctxt().read_u16be().ok()? {
                    0 => 0,
                    glyph_id => glyph_id.wrapping_add(id_delta),
                }
            }
        };
        Some(glyph_id)
    }
}

impl CharMap for Format4<'_> {
    fn char_index(&self, char_code: u32) -> u16 {
        u16::try_from(char_code)
            .ok()
            .and_then(|char_code| {
                let segment = self.find_segment(char_code)?;
                self.segment_glyph(segment, char_code)
            })
            .unwrap_or(0)
    }

    fn char_next(&self, char_code: u32) -> Option<(u32, u16)> {
        let from = u16::try_from(char_code.checked_add(1)?).ok()?;
        for segment in 0..self.end_codes.len() {
            let end = self.end_codes.get_item(segment)?;
            if end < from {
                continue;
            }
            let start = self.start_codes.get_item(segment)?.max(from);
            for code in start..=end {
                match self.segment_glyph(segment, code) {
                    Some(0) | None => {}
                    Some(glyph) => return Some((u32::from(code), glyph)),
                }
            }
        }
        None
    }
}
