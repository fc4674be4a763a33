//! Parsing and validation of the `cmap` table.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/cmap>
//!
//! Each subtable format is validated once and can then be queried with the `CharMap`
//! operations, which never fail: a code without a mapping yields glyph 0.

use std::iter;

use log::warn;
use rustc_hash::FxHashMap;

use crate::binary::read::{ReadArray, ReadBinary, ReadCtxt, ReadFrom, ReadScope};
use crate::binary::{U16Be, U32Be};
use crate::error::{ParseError, ValidationError};
use crate::validate::Validator;

mod format0;
mod format10;
mod format12;
mod format2;
mod format4;
mod format6;
mod format8;

pub use format0::Format0;
pub use format10::Format10;
pub use format12::Format12;
pub use format2::Format2;
pub use format4::Format4;
pub use format6::Format6;
pub use format8::Format8;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PlatformId(pub u16);

impl PlatformId {
    pub const UNICODE: PlatformId = PlatformId(0);
    pub const MACINTOSH: PlatformId = PlatformId(1);
    pub const WINDOWS: PlatformId = PlatformId(3);
    pub const CUSTOM: PlatformId = PlatformId(4);
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EncodingId(pub u16);

impl EncodingId {
    pub const WINDOWS_SYMBOL: EncodingId = EncodingId(0);
    pub const WINDOWS_UNICODE_BMP_UCS2: EncodingId = EncodingId(1);
    pub const WINDOWS_SHIFT_JIS: EncodingId = EncodingId(2);
    pub const WINDOWS_PRC: EncodingId = EncodingId(3);
    pub const WINDOWS_BIG5: EncodingId = EncodingId(4);
    pub const WINDOWS_WANSUNG: EncodingId = EncodingId(5);
    pub const WINDOWS_JOHAB: EncodingId = EncodingId(6);
    pub const WINDOWS_UNICODE_UCS4: EncodingId = EncodingId(10);

    pub const MACINTOSH_APPLE_ROMAN: EncodingId = EncodingId(0);
    pub const MACINTOSH_UNICODE_UCS4: EncodingId = EncodingId(4);
}

/// Character to glyph mapping operations shared by every subtable format.
pub trait CharMap {
    /// The glyph mapped to `char_code`, 0 if the code is not mapped.
    fn char_index(&self, char_code: u32) -> u16;

    /// The smallest code greater than `char_code` that maps to a glyph other than 0, with its
    /// glyph. `None` once the code space of the subtable is exhausted.
    fn char_next(&self, char_code: u32) -> Option<(u32, u16)>;
}

pub struct Cmap<'a> {
    scope: ReadScope<'a>,
    encoding_records: ReadArray<'a, EncodingRecord>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EncodingRecord {
    pub platform_id: u16,
    pub encoding_id: u16,
    pub offset: u32,
}

/// A validated cmap subtable.
#[derive(Clone)]
pub enum CmapSubtable<'a> {
    Format0(Format0<'a>),
    Format2(Format2<'a>),
    Format4(Format4<'a>),
    Format6(Format6<'a>),
    Format8(Format8<'a>),
    Format10(Format10<'a>),
    Format12(Format12<'a>),
}

/// A run of consecutive codes mapped to consecutive glyphs, as used by formats 8 and 12.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SequentialMapGroup {
    pub start_char_code: u32,
    pub end_char_code: u32,
    pub start_glyph_id: u32,
}

impl ReadBinary for Cmap<'_> {
    type HostType<'a> = Cmap<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Cmap<'a>, ParseError> {
        let scope = ctxt.scope();
        let version = ctxt.read_u16be()?;
        ctxt.check_version(version == 0)?;
        let num_tables = usize::from(ctxt.read_u16be()?);
        let encoding_records = ctxt.read_array::<EncodingRecord>(num_tables)?;
        Ok(Cmap {
            scope,
            encoding_records,
        })
    }
}

impl ReadFrom for EncodingRecord {
    type ReadType = (U16Be, U16Be, U32Be);
    fn read_from((platform_id, encoding_id, offset): (u16, u16, u32)) -> Self {
        EncodingRecord {
            platform_id,
            encoding_id,
            offset,
        }
    }
}

impl ReadFrom for SequentialMapGroup {
    type ReadType = (U32Be, U32Be, U32Be);
    fn read_from((start_char_code, end_char_code, start_glyph_id): (u32, u32, u32)) -> Self {
        SequentialMapGroup {
            start_char_code,
            end_char_code,
            start_glyph_id,
        }
    }
}

impl<'a> Cmap<'a> {
    /// Validate the `cmap` header and encoding records.
    ///
    /// Subtables are validated separately with `subtable` or `valid_subtables` so that a bad
    /// subtable only disables itself.
    pub fn validate(
        scope: ReadScope<'a>,
        valid: &Validator,
    ) -> Result<Cmap<'a>, ValidationError> {
        let cmap = scope.read::<Cmap<'_>>()?;
        if valid.is_paranoid() {
            valid.check(cmap.encoding_records.iter().all(|record| {
                usize::try_from(record.offset).map_or(false, |offset| offset < scope.len())
            }))?;
        }
        Ok(cmap)
    }

    pub fn encoding_records(&self) -> impl Iterator<Item = EncodingRecord> + 'a {
        self.encoding_records.iter()
    }

    /// Find the first encoding record for the given `platform_id`
    pub fn find_subtable_for_platform(&self, platform_id: PlatformId) -> Option<EncodingRecord> {
        self.encoding_records
            .iter()
            .find(|record| record.platform_id == platform_id.0)
    }

    /// Find the first encoding record for the given `platform_id` and `encoding_id`
    pub fn find_subtable(
        &self,
        platform_id: PlatformId,
        encoding_id: EncodingId,
    ) -> Option<EncodingRecord> {
        self.encoding_records.iter().find(|record| {
            record.platform_id == platform_id.0 && record.encoding_id == encoding_id.0
        })
    }

    /// Validate the subtable referenced by `record`.
    pub fn subtable(
        &self,
        record: &EncodingRecord,
        valid: &Validator,
    ) -> Result<CmapSubtable<'a>, ValidationError> {
        let offset = usize::try_from(record.offset)?;
        CmapSubtable::validate(self.scope.offset(offset), valid)
    }

    /// Every encoding record whose subtable passes validation, with that subtable.
    ///
    /// Records sharing a subtable validate it once. Rejected subtables are logged and skipped.
    pub fn valid_subtables(&self, valid: &Validator) -> Vec<(EncodingRecord, CmapSubtable<'a>)> {
        let mut validated: FxHashMap<u32, Option<CmapSubtable<'a>>> = FxHashMap::default();
        let mut subtables = Vec::new();
        for record in self.encoding_records.iter() {
            let subtable = validated
                .entry(record.offset)
                .or_insert_with(|| match self.subtable(&record, valid) {
                    Ok(subtable) => Some(subtable),
                    Err(err) => {
                        warn!(
                            "cmap subtable ({}, {}) at offset {} rejected: {}",
                            record.platform_id, record.encoding_id, record.offset, err
                        );
                        None
                    }
                });
            if let Some(subtable) = subtable {
                subtables.push((record, subtable.clone()));
            }
        }
        subtables
    }
}

impl<'a> CmapSubtable<'a> {
    /// Validate a subtable, dispatching on its format.
    pub fn validate(
        scope: ReadScope<'a>,
        valid: &Validator,
    ) -> Result<CmapSubtable<'a>, ValidationError> {
        let format = scope.ctxt().read_u16be()?;
        match format {
            0 => Format0::validate(scope, valid).map(CmapSubtable::Format0),
            2 => Format2::validate(scope, valid).map(CmapSubtable::Format2),
            4 => Format4::validate(scope, valid).map(CmapSubtable::Format4),
            6 => Format6::validate(scope, valid).map(CmapSubtable::Format6),
            8 => Format8::validate(scope, valid).map(CmapSubtable::Format8),
            10 => Format10::validate(scope, valid).map(CmapSubtable::Format10),
            12 => Format12::validate(scope, valid).map(CmapSubtable::Format12),
            _ => Err(ValidationError::InvalidFormat),
        }
    }

    pub fn format(&self) -> u16 {
        match self {
            CmapSubtable::Format0(_) => 0,
            CmapSubtable::Format2(_) => 2,
            CmapSubtable::Format4(_) => 4,
            CmapSubtable::Format6(_) => 6,
            CmapSubtable::Format8(_) => 8,
            CmapSubtable::Format10(_) => 10,
            CmapSubtable::Format12(_) => 12,
        }
    }

    /// The Macintosh language code, 0 for subtables that are not language specific.
    pub fn language(&self) -> u32 {
        match self {
            CmapSubtable::Format0(subtable) => u32::from(subtable.language()),
            CmapSubtable::Format2(subtable) => u32::from(subtable.language()),
            CmapSubtable::Format4(subtable) => u32::from(subtable.language()),
            CmapSubtable::Format6(subtable) => u32::from(subtable.language()),
            CmapSubtable::Format8(subtable) => subtable.language(),
            CmapSubtable::Format10(subtable) => subtable.language(),
            CmapSubtable::Format12(subtable) => subtable.language(),
        }
    }

    /// Every mapped code with its glyph, in increasing code order.
    pub fn mappings(&self) -> impl Iterator<Item = (u32, u16)> + '_ + use<'_, 'a> {
        let first = match self.char_index(0) {
            0 => self.char_next(0),
            glyph => Some((0, glyph)),
        };
        iter::successors(first, move |&(char_code, _)| self.char_next(char_code))
    }

    fn as_char_map(&self) -> &dyn CharMap {
        match self {
            CmapSubtable::Format0(subtable) => subtable,
            CmapSubtable::Format2(subtable) => subtable,
            CmapSubtable::Format4(subtable) => subtable,
            CmapSubtable::Format6(subtable) => subtable,
            CmapSubtable::Format8(subtable) => subtable,
            CmapSubtable::Format10(subtable) => subtable,
            CmapSubtable::Format12(subtable) => subtable,
        }
    }
}

impl CharMap for CmapSubtable<'_> {
    fn char_index(&self, char_code: u32) -> u16 {
        self.as_char_map().char_index(char_code)
    }

    fn char_next(&self, char_code: u32) -> Option<(u32, u16)> {
        self.as_char_map().char_next(char_code)
    }
}

impl SequentialMapGroup {
    /// The glyph for `char_code`, which must lie in the group.
    fn glyph(&self, char_code: u32) -> Option<u16> {
        let glyph = u64::from(self.start_glyph_id) + u64::from(char_code - self.start_char_code);
        u16::try_from(glyph).ok()
    }

    /// The first code of the group at or after `char_code` that maps to a non-zero glyph.
    fn next(&self, char_code: u32) -> Option<(u32, u16)> {
        if self.end_char_code < char_code {
            return None;
        }
        let from = char_code.max(self.start_char_code);
        // Only the first code of a group can map to glyph 0.
        (from..=self.end_char_code)
            .take(2)
            .find_map(|code| match self.glyph(code) {
                Some(0) | None => None,
                Some(glyph) => Some((code, glyph)),
            })
    }
}

/// Check that groups are well formed, ascending and, at `Tight`, map to glyphs of the font.
fn validate_groups(
    groups: &ReadArray<'_, SequentialMapGroup>,
    valid: &Validator,
) -> Result<(), ValidationError> {
    let mut last_end = None;
    for group in groups.iter() {
        if valid.is_default() {
            valid.check(group.start_char_code <= group.end_char_code)?;
            valid.check(last_end.map_or(true, |end| group.start_char_code > end))?;
        }
        if valid.is_tight() {
            let span = group.end_char_code.wrapping_sub(group.start_char_code);
            let last_glyph = u64::from(group.start_glyph_id) + u64::from(span);
            valid.check_glyph(u32::try_from(last_glyph).unwrap_or(u32::MAX))?;
        }
        last_end = Some(group.end_char_code);
    }
    Ok(())
}

fn group_char_index(groups: &ReadArray<'_, SequentialMapGroup>, char_code: u32) -> u16 {
    // Groups are sorted once validated at `Default`, so stop at the first group past the code.
    for group in groups.iter() {
        if char_code < group.start_char_code {
            break;
        }
        if char_code <= group.end_char_code {
            return group.glyph(char_code).unwrap_or(0);
        }
    }
    0
}

fn group_char_next(
    groups: &ReadArray<'_, SequentialMapGroup>,
    char_code: u32,
) -> Option<(u32, u16)> {
    let from = char_code.checked_add(1)?;
    groups.iter().find_map(|group| group.next(from))
}

/// The extent of a subtable: its declared `length` bytes from the start of `scope`.
///
/// The length must fit within `scope` and be at least `min_length`, otherwise the subtable is
/// too short.
fn subtable_scope(
    scope: ReadScope<'_>,
    length: usize,
    min_length: usize,
) -> Result<ReadScope<'_>, ParseError> {
    if length < min_length {
        return Err(ParseError::BadEof);
    }
    scope.offset_length(0, length)
}
