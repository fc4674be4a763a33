//! Structures shared by the OpenType layout tables.
//!
//! `GSUB`, `GPOS`, `GDEF`, `BASE` and `JSTF` are built from the same small set of building
//! blocks: coverage tables, class definitions, device tables and the script → language system
//! → feature → lookup fan-out. Each block here is a zero-copy view onto the font data with a
//! `validate` constructor that walks the block and everything it references, plus accessors for
//! querying it once it has been validated.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2>

use std::cmp::Ordering;
use std::marker::PhantomData;

use bitflags::bitflags;
use itertools::{Either, Itertools};
use log::debug;

use crate::binary::read::{ReadArray, ReadBinary, ReadCtxt, ReadFrom, ReadScope};
use crate::binary::{U16Be, U32Be};
use crate::error::{ParseError, ValidationError};
use crate::tag::{self, DisplayTag};
use crate::validate::Validator;

/// Marker for the glyph substitution table.
pub enum GSUB {}
/// Marker for the glyph positioning table.
pub enum GPOS {}

/// Validates a single lookup subtable.
///
/// Arguments are the subtable, the number of lookups in the enclosing lookup list (for nested
/// lookup references) and the validator.
pub type SubtableValidator =
    fn(ReadScope<'_>, usize, &Validator) -> Result<(), ValidationError>;

/// Per-table data that drives the generic lookup validation.
///
/// The lookup type read from the font selects the subtable validator, so the same lookup list
/// code serves both `GSUB` and `GPOS`.
pub trait LayoutTableType {
    const TAG: u32;

    /// The lookup type that redirects to another lookup type through a 32-bit offset.
    const EXTENSION_LOOKUP_TYPE: u16;

    /// Subtable validators indexed by `lookup_type - 1`.
    const SUBTABLE_VALIDATORS: &'static [SubtableValidator];

    /// Validator for `lookup_type`, if the type is defined.
    fn subtable_validator(lookup_type: u16) -> Option<SubtableValidator> {
        let index = usize::from(lookup_type).checked_sub(1)?;
        Self::SUBTABLE_VALIDATORS.get(index).copied()
    }
}

/// Returns the sub-table at `offset` from `scope`, or `None` if the offset is null.
pub fn optional_offset(scope: ReadScope<'_>, offset: u16) -> Option<ReadScope<'_>> {
    match offset {
        0 => None,
        _ => Some(scope.offset(usize::from(offset))),
    }
}

/// Like `optional_offset` for 32-bit offsets.
pub fn optional_offset32(
    scope: ReadScope<'_>,
    offset: u32,
) -> Result<Option<ReadScope<'_>>, ParseError> {
    match offset {
        0 => Ok(None),
        _ => Ok(Some(scope.offset(usize::try_from(offset)?))),
    }
}

/// A tag paired with a 16-bit offset, as used by script, language system and feature records.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TagOffsetRecord {
    pub tag: u32,
    pub offset: u16,
}

impl ReadFrom for TagOffsetRecord {
    type ReadType = (U32Be, U16Be);
    fn read_from((tag, offset): (u32, u16)) -> Self {
        TagOffsetRecord { tag, offset }
    }
}

fn range_ordering(start: u16, end: u16, glyph: u16) -> Ordering {
    if end < glyph {
        Ordering::Less
    } else if start > glyph {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

/// Checks that inclusive `(start, end)` ranges are well formed and strictly ascending.
fn check_ranges(
    valid: &Validator,
    ranges: impl Iterator<Item = (u16, u16)> + Clone,
) -> Result<(), ValidationError> {
    for (start, end) in ranges.clone() {
        valid.check(start <= end)?;
    }
    valid.check(
        ranges
            .tuple_windows()
            .all(|((_, prev_end), (next_start, _))| next_start > prev_end),
    )
}

/// Coverage table
///
/// The set of glyphs a subtable applies to, along with each glyph's position in that set.
#[derive(Clone)]
pub enum Coverage<'a> {
    Format1 {
        glyph_array: ReadArray<'a, U16Be>,
    },
    Format2 {
        coverage_range_array: ReadArray<'a, CoverageRangeRecord>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CoverageRangeRecord {
    pub start_glyph: u16,
    pub end_glyph: u16,
    pub start_coverage_index: u16,
}

impl ReadFrom for CoverageRangeRecord {
    type ReadType = (U16Be, U16Be, U16Be);
    fn read_from((start_glyph, end_glyph, start_coverage_index): (u16, u16, u16)) -> Self {
        CoverageRangeRecord {
            start_glyph,
            end_glyph,
            start_coverage_index,
        }
    }
}

impl ReadBinary for Coverage<'_> {
    type HostType<'a> = Coverage<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Coverage<'a>, ParseError> {
        match ctxt.read_u16be()? {
            1 => {
                let glyph_count = usize::from(ctxt.read_u16be()?);
                let glyph_array = ctxt.read_array::<U16Be>(glyph_count)?;
                Ok(Coverage::Format1 { glyph_array })
            }
            2 => {
                let range_count = usize::from(ctxt.read_u16be()?);
                let coverage_range_array = ctxt.read_array::<CoverageRangeRecord>(range_count)?;
                Ok(Coverage::Format2 {
                    coverage_range_array,
                })
            }
            _ => Err(ParseError::BadValue),
        }
    }
}

impl<'a> Coverage<'a> {
    pub fn validate(
        scope: ReadScope<'a>,
        valid: &Validator,
    ) -> Result<Coverage<'a>, ValidationError> {
        let coverage = scope.read::<Coverage<'_>>()?;
        match &coverage {
            Coverage::Format1 { glyph_array } => {
                // The glyph indices must be in numerical order for binary searching of the list.
                if valid.is_paranoid() {
                    valid.check(glyph_array.iter().tuple_windows().all(|(a, b)| a < b))?;
                }
                valid.check_glyphs(glyph_array)?;
            }
            Coverage::Format2 {
                coverage_range_array,
            } => {
                if valid.is_default() {
                    check_ranges(
                        valid,
                        coverage_range_array
                            .iter()
                            .map(|range| (range.start_glyph, range.end_glyph)),
                    )?;
                    let mut expected_index = 0usize;
                    for range in coverage_range_array {
                        valid.check(usize::from(range.start_coverage_index) == expected_index)?;
                        expected_index += usize::from(range.end_glyph - range.start_glyph) + 1;
                    }
                }
                if valid.is_tight() {
                    for range in coverage_range_array {
                        valid.check_glyph(u32::from(range.end_glyph))?;
                    }
                }
            }
        }
        Ok(coverage)
    }

    /// The position of `glyph` within the coverage, or `None` if the glyph is not covered.
    pub fn index(&self, glyph: u16) -> Option<u16> {
        match self {
            Coverage::Format1 { glyph_array } => {
                let index = glyph_array.binary_search_by(|g| g.cmp(&glyph)).ok()?;
                u16::try_from(index).ok()
            }
            Coverage::Format2 {
                coverage_range_array,
            } => {
                let index = coverage_range_array
                    .binary_search_by(|range| {
                        range_ordering(range.start_glyph, range.end_glyph, glyph)
                    })
                    .ok()?;
                let range = coverage_range_array.get_item(index)?;
                range
                    .start_coverage_index
                    .checked_add(glyph - range.start_glyph)
            }
        }
    }

    /// The number of glyphs covered.
    pub fn count(&self) -> usize {
        match self {
            Coverage::Format1 { glyph_array } => glyph_array.len(),
            Coverage::Format2 {
                coverage_range_array,
            } => coverage_range_array
                .iter()
                .filter(|range| range.start_glyph <= range.end_glyph)
                .map(|range| usize::from(range.end_glyph - range.start_glyph) + 1)
                .sum(),
        }
    }

    pub fn first(&self) -> Option<u16> {
        match self {
            Coverage::Format1 { glyph_array } => glyph_array.first(),
            Coverage::Format2 {
                coverage_range_array,
            } => coverage_range_array.first().map(|range| range.start_glyph),
        }
    }

    pub fn last(&self) -> Option<u16> {
        match self {
            Coverage::Format1 { glyph_array } => glyph_array.last(),
            Coverage::Format2 {
                coverage_range_array,
            } => coverage_range_array.last().map(|range| range.end_glyph),
        }
    }

    /// The covered glyphs in coverage index order.
    pub fn glyphs(&self) -> impl Iterator<Item = u16> + 'a {
        match self {
            Coverage::Format1 { glyph_array } => Either::Left(glyph_array.iter()),
            Coverage::Format2 {
                coverage_range_array,
            } => Either::Right(
                coverage_range_array
                    .iter()
                    .flat_map(|range| range.start_glyph..=range.end_glyph),
            ),
        }
    }
}

/// Class definition table
///
/// Maps glyphs to small integer classes. Glyphs that are not listed are in class 0.
#[derive(Clone)]
pub enum ClassDef<'a> {
    Format1 {
        start_glyph: u16,
        class_value_array: ReadArray<'a, U16Be>,
    },
    Format2 {
        class_range_array: ReadArray<'a, ClassRangeRecord>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ClassRangeRecord {
    pub start_glyph: u16,
    pub end_glyph: u16,
    pub class_value: u16,
}

impl ReadFrom for ClassRangeRecord {
    type ReadType = (U16Be, U16Be, U16Be);
    fn read_from((start_glyph, end_glyph, class_value): (u16, u16, u16)) -> Self {
        ClassRangeRecord {
            start_glyph,
            end_glyph,
            class_value,
        }
    }
}

impl ReadBinary for ClassDef<'_> {
    type HostType<'a> = ClassDef<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<ClassDef<'a>, ParseError> {
        match ctxt.read_u16be()? {
            1 => {
                let start_glyph = ctxt.read_u16be()?;
                let glyph_count = usize::from(ctxt.read_u16be()?);
                let class_value_array = ctxt.read_array::<U16Be>(glyph_count)?;
                Ok(ClassDef::Format1 {
                    start_glyph,
                    class_value_array,
                })
            }
            2 => {
                let class_range_count = usize::from(ctxt.read_u16be()?);
                let class_range_array = ctxt.read_array::<ClassRangeRecord>(class_range_count)?;
                Ok(ClassDef::Format2 { class_range_array })
            }
            _ => Err(ParseError::BadValue),
        }
    }
}

impl<'a> ClassDef<'a> {
    pub fn validate(
        scope: ReadScope<'a>,
        valid: &Validator,
    ) -> Result<ClassDef<'a>, ValidationError> {
        let class_def = scope.read::<ClassDef<'_>>()?;
        match &class_def {
            ClassDef::Format1 {
                start_glyph,
                class_value_array,
            } => {
                if !class_value_array.is_empty() {
                    let last_glyph = u32::from(*start_glyph) + class_value_array.len() as u32 - 1;
                    valid.check_glyph(last_glyph)?;
                }
            }
            ClassDef::Format2 { class_range_array } => {
                if valid.is_default() {
                    check_ranges(
                        valid,
                        class_range_array
                            .iter()
                            .map(|range| (range.start_glyph, range.end_glyph)),
                    )?;
                }
                if valid.is_tight() {
                    for range in class_range_array {
                        valid.check_glyph(u32::from(range.end_glyph))?;
                    }
                }
            }
        }
        Ok(class_def)
    }

    /// Every class value stored in the table.
    pub fn class_values(&self) -> impl Iterator<Item = u16> + 'a {
        match self {
            ClassDef::Format1 {
                class_value_array, ..
            } => Either::Left(class_value_array.iter()),
            ClassDef::Format2 { class_range_array } => {
                Either::Right(class_range_array.iter().map(|range| range.class_value))
            }
        }
    }

    /// The class of `glyph`, 0 if the glyph is not assigned a class.
    pub fn class(&self, glyph: u16) -> u16 {
        match self {
            ClassDef::Format1 {
                start_glyph,
                class_value_array,
            } => match glyph.checked_sub(*start_glyph) {
                Some(index) => class_value_array.get_item(usize::from(index)).unwrap_or(0),
                None => 0,
            },
            ClassDef::Format2 { class_range_array } => class_range_array
                .binary_search_by(|range| range_ordering(range.start_glyph, range.end_glyph, glyph))
                .ok()
                .and_then(|index| class_range_array.get_item(index))
                .map_or(0, |range| range.class_value),
        }
    }
}

/// Device table
///
/// Pixel adjustments for a range of ppem sizes, packed as signed 2, 4 or 8 bit values.
#[derive(Clone)]
pub struct Device<'a> {
    start_size: u16,
    end_size: u16,
    delta_format: u16,
    delta_values: ReadArray<'a, U16Be>,
}

impl ReadBinary for Device<'_> {
    type HostType<'a> = Device<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Device<'a>, ParseError> {
        let start_size = ctxt.read_u16be()?;
        let end_size = ctxt.read_u16be()?;
        let delta_format = ctxt.read_u16be()?;
        ctxt.check((1..=3).contains(&delta_format))?;
        ctxt.check(start_size <= end_size)?;
        let count = usize::from(end_size - start_size) + 1;
        let bits = Device::bits_per_value(delta_format);
        let delta_values = ctxt.read_array::<U16Be>((count * bits + 15) / 16)?;
        Ok(Device {
            start_size,
            end_size,
            delta_format,
            delta_values,
        })
    }
}

impl<'a> Device<'a> {
    pub fn validate(
        scope: ReadScope<'a>,
        _valid: &Validator,
    ) -> Result<Device<'a>, ValidationError> {
        // Reject the header before sizing the delta array so a bad format is reported as
        // invalid data rather than a short table.
        let mut ctxt = scope.ctxt();
        ctxt.check_avail(6)?;
        Ok(ctxt.read::<Device<'_>>()?)
    }

    fn bits_per_value(delta_format: u16) -> usize {
        1 << delta_format
    }

    pub fn start_size(&self) -> u16 {
        self.start_size
    }

    pub fn end_size(&self) -> u16 {
        self.end_size
    }

    /// The adjustment in pixels at `ppem`, 0 outside the table's size range.
    pub fn delta(&self, ppem: u16) -> i16 {
        if ppem < self.start_size || ppem > self.end_size {
            return 0;
        }
        let bits = Device::bits_per_value(self.delta_format);
        let bit_index = usize::from(ppem - self.start_size) * bits;
        let word = match self.delta_values.get_item(bit_index / 16) {
            Some(word) => word,
            None => return 0,
        };
        let shift = bit_index % 16;
        // Move the value to the top of the word then sign extend it back down.
        ((word << shift) as i16) >> (16 - bits)
    }
}

bitflags! {
    /// Lookup qualifiers
    ///
    /// <https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#lookupFlags>
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct LookupFlag: u16 {
        const RIGHT_TO_LEFT = 0x0001;
        const IGNORE_BASE_GLYPHS = 0x0002;
        const IGNORE_LIGATURES = 0x0004;
        const IGNORE_MARKS = 0x0008;
        const USE_MARK_FILTERING_SET = 0x0010;
        const MARK_ATTACHMENT_TYPE = 0xFF00;
    }
}

impl LookupFlag {
    /// Mark attachment class filter from the high byte, 0 when unset.
    pub fn mark_attachment_type(self) -> u8 {
        (self.bits() >> 8) as u8
    }
}

pub struct Lookup<'a> {
    scope: ReadScope<'a>,
    lookup_type: u16,
    lookup_flag: LookupFlag,
    subtable_offsets: ReadArray<'a, U16Be>,
    mark_filtering_set: Option<u16>,
}

impl ReadBinary for Lookup<'_> {
    type HostType<'a> = Lookup<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Lookup<'a>, ParseError> {
        let scope = ctxt.scope();
        let lookup_type = ctxt.read_u16be()?;
        let lookup_flag = LookupFlag::from_bits_retain(ctxt.read_u16be()?);
        let subtable_count = usize::from(ctxt.read_u16be()?);
        let subtable_offsets = ctxt.read_array::<U16Be>(subtable_count)?;
        let mark_filtering_set = if lookup_flag.contains(LookupFlag::USE_MARK_FILTERING_SET) {
            Some(ctxt.read_u16be()?)
        } else {
            None
        };
        Ok(Lookup {
            scope,
            lookup_type,
            lookup_flag,
            subtable_offsets,
            mark_filtering_set,
        })
    }
}

impl<'a> Lookup<'a> {
    /// Validate a lookup and each of its subtables.
    ///
    /// `lookup_count` is the size of the lookup list the lookup belongs to. Nested lookup
    /// references from contextual subtables are checked against it.
    pub fn validate<T: LayoutTableType>(
        scope: ReadScope<'a>,
        lookup_count: usize,
        valid: &Validator,
    ) -> Result<Lookup<'a>, ValidationError> {
        let lookup = scope.read::<Lookup<'_>>()?;
        let validate_subtable =
            T::subtable_validator(lookup.lookup_type).ok_or(ValidationError::InvalidData)?;
        for offset in &lookup.subtable_offsets {
            validate_subtable(scope.offset(usize::from(offset)), lookup_count, valid)?;
        }
        Ok(lookup)
    }

    pub fn lookup_type(&self) -> u16 {
        self.lookup_type
    }

    pub fn lookup_flag(&self) -> LookupFlag {
        self.lookup_flag
    }

    pub fn mark_filtering_set(&self) -> Option<u16> {
        self.mark_filtering_set
    }

    pub fn subtable_count(&self) -> usize {
        self.subtable_offsets.len()
    }

    /// The subtable at `index`, `None` if there is no such subtable.
    pub fn subtable(&self, index: usize) -> Option<ReadScope<'a>> {
        let offset = self.subtable_offsets.get_item(index)?;
        Some(self.scope.offset(usize::from(offset)))
    }

    pub fn subtables(&self) -> impl Iterator<Item = ReadScope<'a>> + '_ {
        self.subtable_offsets
            .iter()
            .map(move |offset| self.scope.offset(usize::from(offset)))
    }
}

pub struct LookupList<'a, T> {
    scope: ReadScope<'a>,
    lookup_offsets: ReadArray<'a, U16Be>,
    table_type: PhantomData<T>,
}

impl<T> ReadBinary for LookupList<'_, T> {
    type HostType<'a> = LookupList<'a, T>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<LookupList<'a, T>, ParseError> {
        let scope = ctxt.scope();
        let lookup_count = usize::from(ctxt.read_u16be()?);
        let lookup_offsets = ctxt.read_array::<U16Be>(lookup_count)?;
        Ok(LookupList {
            scope,
            lookup_offsets,
            table_type: PhantomData,
        })
    }
}

impl<'a, T: LayoutTableType> LookupList<'a, T> {
    pub fn validate(
        scope: ReadScope<'a>,
        valid: &Validator,
    ) -> Result<LookupList<'a, T>, ValidationError> {
        let lookup_list = scope.read::<LookupList<'_, T>>()?;
        let lookup_count = lookup_list.len();
        for offset in &lookup_list.lookup_offsets {
            Lookup::validate::<T>(scope.offset(usize::from(offset)), lookup_count, valid)?;
        }
        Ok(lookup_list)
    }

    pub fn len(&self) -> usize {
        self.lookup_offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup_offsets.is_empty()
    }

    pub fn lookup(&self, index: usize) -> Result<Lookup<'a>, ParseError> {
        let offset = self
            .lookup_offsets
            .get_item(index)
            .ok_or(ParseError::BadIndex)?;
        self.scope.offset(usize::from(offset)).read::<Lookup<'_>>()
    }
}

pub struct Feature<'a> {
    feature_params_offset: u16,
    lookup_indices: ReadArray<'a, U16Be>,
}

impl ReadBinary for Feature<'_> {
    type HostType<'a> = Feature<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Feature<'a>, ParseError> {
        let feature_params_offset = ctxt.read_u16be()?;
        let lookup_index_count = usize::from(ctxt.read_u16be()?);
        let lookup_indices = ctxt.read_array::<U16Be>(lookup_index_count)?;
        Ok(Feature {
            feature_params_offset,
            lookup_indices,
        })
    }
}

impl<'a> Feature<'a> {
    pub fn validate(
        scope: ReadScope<'a>,
        lookup_count: usize,
        valid: &Validator,
    ) -> Result<Feature<'a>, ValidationError> {
        let feature = scope.read::<Feature<'_>>()?;
        for lookup_index in &feature.lookup_indices {
            valid.check_index(lookup_index, lookup_count)?;
        }
        Ok(feature)
    }

    pub fn feature_params_offset(&self) -> u16 {
        self.feature_params_offset
    }

    pub fn lookup_indices(&self) -> &ReadArray<'a, U16Be> {
        &self.lookup_indices
    }
}

pub struct FeatureList<'a> {
    scope: ReadScope<'a>,
    feature_records: ReadArray<'a, TagOffsetRecord>,
}

impl ReadBinary for FeatureList<'_> {
    type HostType<'a> = FeatureList<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<FeatureList<'a>, ParseError> {
        let scope = ctxt.scope();
        let feature_count = usize::from(ctxt.read_u16be()?);
        let feature_records = ctxt.read_array::<TagOffsetRecord>(feature_count)?;
        Ok(FeatureList {
            scope,
            feature_records,
        })
    }
}

impl<'a> FeatureList<'a> {
    /// Validate the feature list against the already validated lookup list size.
    pub fn validate(
        scope: ReadScope<'a>,
        lookup_count: usize,
        valid: &Validator,
    ) -> Result<FeatureList<'a>, ValidationError> {
        let feature_list = scope.read::<FeatureList<'_>>()?;
        if valid.is_paranoid() {
            valid.check(
                feature_list
                    .feature_records
                    .iter()
                    .tuple_windows()
                    .all(|(a, b)| a.tag <= b.tag),
            )?;
        }
        for record in &feature_list.feature_records {
            Feature::validate(scope.offset(usize::from(record.offset)), lookup_count, valid)?;
        }
        Ok(feature_list)
    }

    pub fn len(&self) -> usize {
        self.feature_records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feature_records.is_empty()
    }

    /// The tag and feature table at `index`.
    pub fn feature(&self, index: usize) -> Result<(u32, Feature<'a>), ParseError> {
        let record = self
            .feature_records
            .get_item(index)
            .ok_or(ParseError::BadIndex)?;
        let feature = self
            .scope
            .offset(usize::from(record.offset))
            .read::<Feature<'_>>()?;
        Ok((record.tag, feature))
    }
}

pub struct LangSys<'a> {
    required_feature_index: u16,
    feature_indices: ReadArray<'a, U16Be>,
}

impl ReadBinary for LangSys<'_> {
    type HostType<'a> = LangSys<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<LangSys<'a>, ParseError> {
        let _lookup_order_offset = ctxt.read_u16be()?;
        let required_feature_index = ctxt.read_u16be()?;
        let feature_index_count = usize::from(ctxt.read_u16be()?);
        let feature_indices = ctxt.read_array::<U16Be>(feature_index_count)?;
        Ok(LangSys {
            required_feature_index,
            feature_indices,
        })
    }
}

impl<'a> LangSys<'a> {
    const NO_REQUIRED_FEATURE: u16 = 0xFFFF;

    pub fn validate(
        scope: ReadScope<'a>,
        feature_count: usize,
        valid: &Validator,
    ) -> Result<LangSys<'a>, ValidationError> {
        let lang_sys = scope.read::<LangSys<'_>>()?;
        if let Some(required) = lang_sys.required_feature_index() {
            valid.check_index(required, feature_count)?;
        }
        for feature_index in &lang_sys.feature_indices {
            valid.check_index(feature_index, feature_count)?;
        }
        Ok(lang_sys)
    }

    pub fn required_feature_index(&self) -> Option<u16> {
        match self.required_feature_index {
            LangSys::NO_REQUIRED_FEATURE => None,
            index => Some(index),
        }
    }

    pub fn feature_indices(&self) -> &ReadArray<'a, U16Be> {
        &self.feature_indices
    }
}

pub struct Script<'a> {
    scope: ReadScope<'a>,
    default_lang_sys_offset: u16,
    lang_sys_records: ReadArray<'a, TagOffsetRecord>,
}

impl ReadBinary for Script<'_> {
    type HostType<'a> = Script<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Script<'a>, ParseError> {
        let scope = ctxt.scope();
        let default_lang_sys_offset = ctxt.read_u16be()?;
        let lang_sys_count = usize::from(ctxt.read_u16be()?);
        let lang_sys_records = ctxt.read_array::<TagOffsetRecord>(lang_sys_count)?;
        Ok(Script {
            scope,
            default_lang_sys_offset,
            lang_sys_records,
        })
    }
}

impl<'a> Script<'a> {
    pub fn validate(
        scope: ReadScope<'a>,
        feature_count: usize,
        valid: &Validator,
    ) -> Result<Script<'a>, ValidationError> {
        let script = scope.read::<Script<'_>>()?;
        if let Some(lang_sys_scope) = optional_offset(scope, script.default_lang_sys_offset) {
            LangSys::validate(lang_sys_scope, feature_count, valid)?;
        }
        if valid.is_paranoid() {
            valid.check(
                script
                    .lang_sys_records
                    .iter()
                    .tuple_windows()
                    .all(|(a, b)| a.tag < b.tag),
            )?;
        }
        for record in &script.lang_sys_records {
            LangSys::validate(scope.offset(usize::from(record.offset)), feature_count, valid)?;
        }
        Ok(script)
    }

    pub fn default_lang_sys(&self) -> Result<Option<LangSys<'a>>, ParseError> {
        optional_offset(self.scope, self.default_lang_sys_offset)
            .map(|scope| scope.read::<LangSys<'_>>())
            .transpose()
    }

    pub fn find_lang_sys(&self, lang_sys_tag: u32) -> Result<Option<LangSys<'a>>, ParseError> {
        self.lang_sys_records
            .iter()
            .find(|record| record.tag == lang_sys_tag)
            .map(|record| {
                self.scope
                    .offset(usize::from(record.offset))
                    .read::<LangSys<'_>>()
            })
            .transpose()
    }

    /// The language system for `lang_sys_tag`, falling back to the default language system.
    pub fn find_lang_sys_or_default(
        &self,
        lang_sys_tag: Option<u32>,
    ) -> Result<Option<LangSys<'a>>, ParseError> {
        if let Some(tag) = lang_sys_tag {
            if let Some(lang_sys) = self.find_lang_sys(tag)? {
                return Ok(Some(lang_sys));
            }
        }
        self.default_lang_sys()
    }

    pub fn lang_sys_tags(&self) -> impl Iterator<Item = u32> + 'a {
        self.lang_sys_records.iter().map(|record| record.tag)
    }
}

pub struct ScriptList<'a> {
    scope: ReadScope<'a>,
    script_records: ReadArray<'a, TagOffsetRecord>,
}

impl ReadBinary for ScriptList<'_> {
    type HostType<'a> = ScriptList<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<ScriptList<'a>, ParseError> {
        let scope = ctxt.scope();
        let script_count = usize::from(ctxt.read_u16be()?);
        let script_records = ctxt.read_array::<TagOffsetRecord>(script_count)?;
        Ok(ScriptList {
            scope,
            script_records,
        })
    }
}

impl<'a> ScriptList<'a> {
    /// Validate the script list against the already validated feature list size.
    pub fn validate(
        scope: ReadScope<'a>,
        feature_count: usize,
        valid: &Validator,
    ) -> Result<ScriptList<'a>, ValidationError> {
        let script_list = scope.read::<ScriptList<'_>>()?;
        if valid.is_paranoid() {
            valid.check(
                script_list
                    .script_records
                    .iter()
                    .tuple_windows()
                    .all(|(a, b)| a.tag < b.tag),
            )?;
        }
        for record in &script_list.script_records {
            Script::validate(scope.offset(usize::from(record.offset)), feature_count, valid)?;
        }
        Ok(script_list)
    }

    pub fn len(&self) -> usize {
        self.script_records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.script_records.is_empty()
    }

    pub fn script_tags(&self) -> impl Iterator<Item = u32> + 'a {
        self.script_records.iter().map(|record| record.tag)
    }

    pub fn find_script(&self, script_tag: u32) -> Result<Option<Script<'a>>, ParseError> {
        self.script_records
            .iter()
            .find(|record| record.tag == script_tag)
            .map(|record| {
                self.scope
                    .offset(usize::from(record.offset))
                    .read::<Script<'_>>()
            })
            .transpose()
    }

    /// The script for `script_tag`, falling back to the `DFLT` script.
    pub fn find_script_or_default(
        &self,
        script_tag: u32,
    ) -> Result<Option<Script<'a>>, ParseError> {
        match self.find_script(script_tag)? {
            Some(script) => Ok(Some(script)),
            None => self.find_script(tag::DFLT),
        }
    }
}

/// Header shared by `GSUB` and `GPOS`.
pub struct LayoutTable<'a, T> {
    scope: ReadScope<'a>,
    minor_version: u16,
    script_list_offset: u16,
    feature_list_offset: u16,
    lookup_list_offset: u16,
    feature_variations_offset: Option<u32>,
    table_type: PhantomData<T>,
}

impl<T> ReadBinary for LayoutTable<'_, T> {
    type HostType<'a> = LayoutTable<'a, T>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<LayoutTable<'a, T>, ParseError> {
        let scope = ctxt.scope();
        let major_version = ctxt.read_u16be()?;
        let minor_version = ctxt.read_u16be()?;
        ctxt.check_version(major_version == 1 && minor_version <= 1)?;
        let script_list_offset = ctxt.read_u16be()?;
        let feature_list_offset = ctxt.read_u16be()?;
        let lookup_list_offset = ctxt.read_u16be()?;
        let feature_variations_offset = match minor_version {
            0 => None,
            _ => Some(ctxt.read_u32be()?),
        };
        Ok(LayoutTable {
            scope,
            minor_version,
            script_list_offset,
            feature_list_offset,
            lookup_list_offset,
            feature_variations_offset,
            table_type: PhantomData,
        })
    }
}

impl<'a, T: LayoutTableType> LayoutTable<'a, T> {
    /// Validate the whole table.
    ///
    /// Lists are validated innermost first so each cross-reference can be checked against the
    /// size of a list that is already known to be valid: lookups, then features, then scripts.
    pub fn validate(
        scope: ReadScope<'a>,
        valid: &Validator,
    ) -> Result<LayoutTable<'a, T>, ValidationError> {
        let table = scope.read::<LayoutTable<'_, T>>()?;

        let lookup_count = match optional_offset(scope, table.lookup_list_offset) {
            Some(lookup_list_scope) => LookupList::<T>::validate(lookup_list_scope, valid)?.len(),
            None => 0,
        };
        let feature_count = match optional_offset(scope, table.feature_list_offset) {
            Some(feature_list_scope) => {
                FeatureList::validate(feature_list_scope, lookup_count, valid)?.len()
            }
            None => 0,
        };
        if let Some(script_list_scope) = optional_offset(scope, table.script_list_offset) {
            ScriptList::validate(script_list_scope, feature_count, valid)?;
        }
        if let Some(offset) = table.feature_variations_offset {
            if let Some(variations_scope) = optional_offset32(scope, offset)? {
                // Only the presence of the variations header is checked.
                variations_scope.ctxt().check_avail(8)?;
            }
        }

        debug!(
            "{}: {} lookups, {} features",
            DisplayTag(T::TAG),
            lookup_count,
            feature_count
        );
        Ok(table)
    }

    pub fn minor_version(&self) -> u16 {
        self.minor_version
    }

    pub fn script_list(&self) -> Result<Option<ScriptList<'a>>, ParseError> {
        optional_offset(self.scope, self.script_list_offset)
            .map(|scope| scope.read::<ScriptList<'_>>())
            .transpose()
    }

    pub fn feature_list(&self) -> Result<Option<FeatureList<'a>>, ParseError> {
        optional_offset(self.scope, self.feature_list_offset)
            .map(|scope| scope.read::<FeatureList<'_>>())
            .transpose()
    }

    pub fn lookup_list(&self) -> Result<Option<LookupList<'a, T>>, ParseError> {
        optional_offset(self.scope, self.lookup_list_offset)
            .map(|scope| scope.read::<LookupList<'_, T>>())
            .transpose()
    }

    /// Number of lookups in the lookup list, 0 if there is no lookup list.
    pub fn lookup_count(&self) -> Result<usize, ParseError> {
        Ok(self.lookup_list()?.map_or(0, |lookup_list| lookup_list.len()))
    }
}

/// Number of lookups in the optional, already validated, layout table `table`.
pub fn lookup_count<T: LayoutTableType>(
    table: Option<&LayoutTable<'_, T>>,
) -> Result<usize, ParseError> {
    match table {
        Some(table) => table.lookup_count(),
        None => Ok(0),
    }
}

/// Validate an extension subtable by dispatching to the validator of the lookup type it wraps.
pub fn validate_extension<T: LayoutTableType>(
    scope: ReadScope<'_>,
    lookup_count: usize,
    valid: &Validator,
) -> Result<(), ValidationError> {
    let mut ctxt = scope.ctxt();
    let format = ctxt.read_u16be()?;
    valid.check(format == 1)?;
    let extension_lookup_type = ctxt.read_u16be()?;
    let extension_offset = usize::try_from(ctxt.read_u32be()?)?;
    valid.check(extension_lookup_type != T::EXTENSION_LOOKUP_TYPE)?;
    let validate_subtable =
        T::subtable_validator(extension_lookup_type).ok_or(ValidationError::InvalidData)?;
    validate_subtable(scope.offset(extension_offset), lookup_count, valid)
}

/// Check `count` sequence lookup records against the input sequence length and lookup list size.
fn validate_sequence_lookup_records(
    ctxt: &mut ReadCtxt<'_>,
    count: usize,
    input_count: usize,
    lookup_count: usize,
    valid: &Validator,
) -> Result<(), ValidationError> {
    let records = ctxt.read_array::<(U16Be, U16Be)>(count)?;
    for (sequence_index, lookup_list_index) in &records {
        valid.check_index(sequence_index, input_count)?;
        valid.check_index(lookup_list_index, lookup_count)?;
    }
    Ok(())
}

fn validate_glyph_sequence(
    ctxt: &mut ReadCtxt<'_>,
    count: usize,
    valid: &Validator,
) -> Result<(), ValidationError> {
    let glyphs = ctxt.read_array::<U16Be>(count)?;
    valid.check_glyphs(&glyphs)
}

pub(crate) fn validate_coverage_offsets(
    ctxt: &mut ReadCtxt<'_>,
    scope: ReadScope<'_>,
    count: usize,
    valid: &Validator,
) -> Result<(), ValidationError> {
    let offsets = ctxt.read_array::<U16Be>(count)?;
    for offset in &offsets {
        Coverage::validate(scope.offset(usize::from(offset)), valid)?;
    }
    Ok(())
}

/// Validate the rule sets or class sets of a format 1 or 2 contextual subtable.
///
/// `is_class_based` selects whether rule inputs are classes or glyphs. Null set offsets are
/// skipped.
fn validate_rule_sets(
    scope: ReadScope<'_>,
    ctxt: &mut ReadCtxt<'_>,
    chained: bool,
    is_class_based: bool,
    lookup_count: usize,
    valid: &Validator,
) -> Result<usize, ValidationError> {
    let set_count = usize::from(ctxt.read_u16be()?);
    let set_offsets = ctxt.read_array::<U16Be>(set_count)?;
    for set_offset in &set_offsets {
        let set_scope = match optional_offset(scope, set_offset) {
            Some(set_scope) => set_scope,
            None => continue,
        };
        let mut set_ctxt = set_scope.ctxt();
        let rule_count = usize::from(set_ctxt.read_u16be()?);
        let rule_offsets = set_ctxt.read_array::<U16Be>(rule_count)?;
        for rule_offset in &rule_offsets {
            let rule_scope = set_scope.offset(usize::from(rule_offset));
            if chained {
                validate_chain_rule(rule_scope, is_class_based, lookup_count, valid)?;
            } else {
                validate_rule(rule_scope, is_class_based, lookup_count, valid)?;
            }
        }
    }
    Ok(set_count)
}

fn validate_rule(
    scope: ReadScope<'_>,
    is_class_based: bool,
    lookup_count: usize,
    valid: &Validator,
) -> Result<(), ValidationError> {
    let mut ctxt = scope.ctxt();
    let input_count = usize::from(ctxt.read_u16be()?);
    let record_count = usize::from(ctxt.read_u16be()?);
    valid.check(input_count > 0)?;
    // The first input glyph is matched by the coverage table and is not stored.
    validate_input_sequence(&mut ctxt, input_count - 1, is_class_based, valid)?;
    validate_sequence_lookup_records(&mut ctxt, record_count, input_count, lookup_count, valid)
}

fn validate_chain_rule(
    scope: ReadScope<'_>,
    is_class_based: bool,
    lookup_count: usize,
    valid: &Validator,
) -> Result<(), ValidationError> {
    let mut ctxt = scope.ctxt();
    let backtrack_count = usize::from(ctxt.read_u16be()?);
    validate_input_sequence(&mut ctxt, backtrack_count, is_class_based, valid)?;
    let input_count = usize::from(ctxt.read_u16be()?);
    valid.check(input_count > 0)?;
    validate_input_sequence(&mut ctxt, input_count - 1, is_class_based, valid)?;
    let lookahead_count = usize::from(ctxt.read_u16be()?);
    validate_input_sequence(&mut ctxt, lookahead_count, is_class_based, valid)?;
    let record_count = usize::from(ctxt.read_u16be()?);
    validate_sequence_lookup_records(&mut ctxt, record_count, input_count, lookup_count, valid)
}

fn validate_input_sequence(
    ctxt: &mut ReadCtxt<'_>,
    count: usize,
    is_class_based: bool,
    valid: &Validator,
) -> Result<(), ValidationError> {
    if is_class_based {
        ctxt.read_array::<U16Be>(count)?;
        Ok(())
    } else {
        validate_glyph_sequence(ctxt, count, valid)
    }
}

fn validate_optional_class_def(
    scope: ReadScope<'_>,
    offset: u16,
    valid: &Validator,
) -> Result<(), ValidationError> {
    if let Some(class_def_scope) = optional_offset(scope, offset) {
        ClassDef::validate(class_def_scope, valid)?;
    }
    Ok(())
}

/// Validate a contextual subtable (`GSUB` type 5, `GPOS` type 7).
pub fn validate_context(
    scope: ReadScope<'_>,
    lookup_count: usize,
    valid: &Validator,
) -> Result<(), ValidationError> {
    let mut ctxt = scope.ctxt();
    match ctxt.read_u16be()? {
        1 => {
            let coverage_offset = ctxt.read_u16be()?;
            let coverage = Coverage::validate(scope.offset(usize::from(coverage_offset)), valid)?;
            let set_count =
                validate_rule_sets(scope, &mut ctxt, false, false, lookup_count, valid)?;
            if valid.is_paranoid() {
                valid.check(set_count == coverage.count())?;
            }
            Ok(())
        }
        2 => {
            let coverage_offset = ctxt.read_u16be()?;
            let class_def_offset = ctxt.read_u16be()?;
            Coverage::validate(scope.offset(usize::from(coverage_offset)), valid)?;
            validate_optional_class_def(scope, class_def_offset, valid)?;
            validate_rule_sets(scope, &mut ctxt, false, true, lookup_count, valid)?;
            Ok(())
        }
        3 => {
            let input_count = usize::from(ctxt.read_u16be()?);
            let record_count = usize::from(ctxt.read_u16be()?);
            valid.check(input_count > 0)?;
            validate_coverage_offsets(&mut ctxt, scope, input_count, valid)?;
            validate_sequence_lookup_records(
                &mut ctxt,
                record_count,
                input_count,
                lookup_count,
                valid,
            )
        }
        _ => Err(ValidationError::InvalidData),
    }
}

/// Validate a chained contextual subtable (`GSUB` type 6, `GPOS` type 8).
pub fn validate_chain_context(
    scope: ReadScope<'_>,
    lookup_count: usize,
    valid: &Validator,
) -> Result<(), ValidationError> {
    let mut ctxt = scope.ctxt();
    match ctxt.read_u16be()? {
        1 => {
            let coverage_offset = ctxt.read_u16be()?;
            let coverage = Coverage::validate(scope.offset(usize::from(coverage_offset)), valid)?;
            let set_count = validate_rule_sets(scope, &mut ctxt, true, false, lookup_count, valid)?;
            if valid.is_paranoid() {
                valid.check(set_count == coverage.count())?;
            }
            Ok(())
        }
        2 => {
            let coverage_offset = ctxt.read_u16be()?;
            let backtrack_class_def_offset = ctxt.read_u16be()?;
            let input_class_def_offset = ctxt.read_u16be()?;
            let lookahead_class_def_offset = ctxt.read_u16be()?;
            Coverage::validate(scope.offset(usize::from(coverage_offset)), valid)?;
            validate_optional_class_def(scope, backtrack_class_def_offset, valid)?;
            validate_optional_class_def(scope, input_class_def_offset, valid)?;
            validate_optional_class_def(scope, lookahead_class_def_offset, valid)?;
            validate_rule_sets(scope, &mut ctxt, true, true, lookup_count, valid)?;
            Ok(())
        }
        3 => {
            let backtrack_count = usize::from(ctxt.read_u16be()?);
            validate_coverage_offsets(&mut ctxt, scope, backtrack_count, valid)?;
            let input_count = usize::from(ctxt.read_u16be()?);
            valid.check(input_count > 0)?;
            validate_coverage_offsets(&mut ctxt, scope, input_count, valid)?;
            let lookahead_count = usize::from(ctxt.read_u16be()?);
            validate_coverage_offsets(&mut ctxt, scope, lookahead_count, valid)?;
            let record_count = usize::from(ctxt.read_u16be()?);
            validate_sequence_lookup_records(
                &mut ctxt,
                record_count,
                input_count,
                lookup_count,
                valid,
            )
        }
        _ => Err(ValidationError::InvalidData),
    }
}
