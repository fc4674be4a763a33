//! Validation of the `GPOS` table.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/gpos>

use bitflags::bitflags;

use crate::binary::read::{
    ReadArray, ReadBinary, ReadBinaryDep, ReadCtxt, ReadFixedSizeDep, ReadScope,
};
use crate::binary::U16Be;
use crate::error::{ParseError, ValidationError};
use crate::layout::{
    optional_offset, validate_chain_context, validate_context, validate_extension, ClassDef,
    Coverage, Device, LayoutTableType, SubtableValidator, GPOS,
};
use crate::size;
use crate::tag;
use crate::validate::Validator;

impl LayoutTableType for GPOS {
    const TAG: u32 = tag::GPOS;

    const EXTENSION_LOOKUP_TYPE: u16 = 9;

    const SUBTABLE_VALIDATORS: &'static [SubtableValidator] = &[
        validate_single_pos,
        validate_pair_pos,
        validate_cursive_pos,
        validate_mark_base_pos,
        validate_mark_lig_pos,
        validate_mark_mark_pos,
        validate_context,
        validate_chain_context,
        validate_extension::<GPOS>,
    ];
}

bitflags! {
    /// The fields present in a value record.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct ValueFormat: u16 {
        const X_PLACEMENT = 0x0001;
        const Y_PLACEMENT = 0x0002;
        const X_ADVANCE = 0x0004;
        const Y_ADVANCE = 0x0008;
        const X_PLACEMENT_DEVICE = 0x0010;
        const Y_PLACEMENT_DEVICE = 0x0020;
        const X_ADVANCE_DEVICE = 0x0040;
        const Y_ADVANCE_DEVICE = 0x0080;
    }
}

impl ReadBinary for ValueFormat {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        // The high byte is reserved and must be zero.
        ValueFormat::from_bits(ctxt.read_u16be()?).ok_or(ParseError::BadValue)
    }
}

impl ValueFormat {
    /// Size in bytes of a value record with this format.
    pub fn size(self) -> usize {
        self.bits().count_ones() as usize * size::U16
    }
}

/// Positioning adjustments, with the offsets of any device tables.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ValueRecord {
    pub x_placement: i16,
    pub y_placement: i16,
    pub x_advance: i16,
    pub y_advance: i16,
    device_offsets: [u16; 4],
}

impl ReadBinaryDep for ValueRecord {
    type Args<'a> = ValueFormat;
    type HostType<'a> = Self;

    fn read_dep<'a>(ctxt: &mut ReadCtxt<'a>, format: ValueFormat) -> Result<Self, ParseError> {
        let mut read_if = |flag: ValueFormat| -> Result<u16, ParseError> {
            match format.contains(flag) {
                true => Ok(ctxt.read_u16be()?),
                false => Ok(0),
            }
        };
        let x_placement = read_if(ValueFormat::X_PLACEMENT)? as i16;
        let y_placement = read_if(ValueFormat::Y_PLACEMENT)? as i16;
        let x_advance = read_if(ValueFormat::X_ADVANCE)? as i16;
        let y_advance = read_if(ValueFormat::Y_ADVANCE)? as i16;
        let device_offsets = [
            read_if(ValueFormat::X_PLACEMENT_DEVICE)?,
            read_if(ValueFormat::Y_PLACEMENT_DEVICE)?,
            read_if(ValueFormat::X_ADVANCE_DEVICE)?,
            read_if(ValueFormat::Y_ADVANCE_DEVICE)?,
        ];
        Ok(ValueRecord {
            x_placement,
            y_placement,
            x_advance,
            y_advance,
            device_offsets,
        })
    }
}

impl ReadFixedSizeDep for ValueRecord {
    fn size(format: ValueFormat) -> usize {
        format.size()
    }
}

impl ValueRecord {
    /// Validate the device tables of the record, which are relative to the subtable `base`.
    fn validate_devices(
        &self,
        base: ReadScope<'_>,
        valid: &Validator,
    ) -> Result<(), ValidationError> {
        for &offset in &self.device_offsets {
            if let Some(device_scope) = optional_offset(base, offset) {
                Device::validate(device_scope, valid)?;
            }
        }
        Ok(())
    }
}

fn validate_value_records(
    records: &ReadArray<'_, ValueRecord>,
    base: ReadScope<'_>,
    valid: &Validator,
) -> Result<(), ValidationError> {
    for record in records.iter_res() {
        record?.validate_devices(base, valid)?;
    }
    Ok(())
}

/// An attachment point.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub x: i16,
    pub y: i16,
    pub anchor_point: Option<u16>,
}

impl ReadBinary for Anchor {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let format = ctxt.read_u16be()?;
        ctxt.check((1..=3).contains(&format))?;
        let x = ctxt.read_i16be()?;
        let y = ctxt.read_i16be()?;
        let anchor_point = match format {
            2 => Some(ctxt.read_u16be()?),
            _ => None,
        };
        Ok(Anchor { x, y, anchor_point })
    }
}

impl Anchor {
    pub fn validate(scope: ReadScope<'_>, valid: &Validator) -> Result<Anchor, ValidationError> {
        let anchor = scope.read::<Anchor>()?;
        let mut ctxt = scope.ctxt();
        if ctxt.read_u16be()? == 3 {
            ctxt.skip(2 * size::I16)?;
            for _ in 0..2 {
                if let Some(device_scope) = optional_offset(scope, ctxt.read_u16be()?) {
                    Device::validate(device_scope, valid)?;
                }
            }
        }
        Ok(anchor)
    }
}

fn optional_anchor(scope: ReadScope<'_>, offset: u16) -> Result<Option<Anchor>, ParseError> {
    optional_offset(scope, offset)
        .map(|anchor_scope| anchor_scope.read::<Anchor>())
        .transpose()
}

/// Mark class and anchor of each mark covered by a mark attachment subtable.
pub struct MarkArray<'a> {
    scope: ReadScope<'a>,
    mark_records: ReadArray<'a, (U16Be, U16Be)>,
}

impl<'a> MarkArray<'a> {
    pub fn validate(
        scope: ReadScope<'a>,
        class_count: usize,
        valid: &Validator,
    ) -> Result<MarkArray<'a>, ValidationError> {
        let mut ctxt = scope.ctxt();
        let mark_count = usize::from(ctxt.read_u16be()?);
        let mark_records = ctxt.read_array::<(U16Be, U16Be)>(mark_count)?;
        for (mark_class, anchor_offset) in &mark_records {
            valid.check_index(mark_class, class_count)?;
            valid.check(anchor_offset != 0)?;
            Anchor::validate(scope.offset(usize::from(anchor_offset)), valid)?;
        }
        Ok(MarkArray {
            scope,
            mark_records,
        })
    }

    pub fn len(&self) -> usize {
        self.mark_records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mark_records.is_empty()
    }

    /// Class and anchor of the mark at coverage `index`.
    pub fn mark(&self, index: usize) -> Result<(u16, Anchor), ParseError> {
        let (mark_class, anchor_offset) = self
            .mark_records
            .get_item(index)
            .ok_or(ParseError::BadIndex)?;
        let anchor = self
            .scope
            .offset(usize::from(anchor_offset))
            .read::<Anchor>()?;
        Ok((mark_class, anchor))
    }
}

/// Rows of anchor offsets with one column per mark class, used for base, ligature component
/// and mark2 attachment points. Null entries mean there is no attachment point.
pub struct AnchorMatrix<'a> {
    scope: ReadScope<'a>,
    class_count: usize,
    anchor_offsets: ReadArray<'a, U16Be>,
}

impl<'a> AnchorMatrix<'a> {
    fn read(scope: ReadScope<'a>, class_count: usize) -> Result<AnchorMatrix<'a>, ParseError> {
        let mut ctxt = scope.ctxt();
        let row_count = usize::from(ctxt.read_u16be()?);
        let cell_count = row_count
            .checked_mul(class_count)
            .ok_or(ParseError::BadEof)?;
        let anchor_offsets = ctxt.read_array::<U16Be>(cell_count)?;
        Ok(AnchorMatrix {
            scope,
            class_count,
            anchor_offsets,
        })
    }

    pub fn validate(
        scope: ReadScope<'a>,
        class_count: usize,
        valid: &Validator,
    ) -> Result<AnchorMatrix<'a>, ValidationError> {
        let matrix = AnchorMatrix::read(scope, class_count)?;
        for offset in &matrix.anchor_offsets {
            if let Some(anchor_scope) = optional_offset(scope, offset) {
                Anchor::validate(anchor_scope, valid)?;
            }
        }
        Ok(matrix)
    }

    pub fn rows(&self) -> usize {
        match self.class_count {
            0 => 0,
            class_count => self.anchor_offsets.len() / class_count,
        }
    }

    /// The anchor in `row` for `mark_class`, `None` if there is no attachment point.
    pub fn anchor(&self, row: usize, mark_class: u16) -> Result<Option<Anchor>, ParseError> {
        let class = usize::from(mark_class);
        if row >= self.rows() || class >= self.class_count {
            return Err(ParseError::BadIndex);
        }
        let offset = self
            .anchor_offsets
            .get_item(row * self.class_count + class)
            .ok_or(ParseError::BadIndex)?;
        optional_anchor(self.scope, offset)
    }
}

/// Lookup type 1 subtable.
pub enum SinglePos<'a> {
    Format1 {
        coverage: Coverage<'a>,
        value_record: ValueRecord,
    },
    Format2 {
        coverage: Coverage<'a>,
        value_records: ReadArray<'a, ValueRecord>,
    },
}

impl<'a> SinglePos<'a> {
    pub fn validate(
        scope: ReadScope<'a>,
        valid: &Validator,
    ) -> Result<SinglePos<'a>, ValidationError> {
        let mut ctxt = scope.ctxt();
        match ctxt.read_u16be()? {
            1 => {
                let coverage_offset = usize::from(ctxt.read_u16be()?);
                let value_format = ctxt.read::<ValueFormat>()?;
                let value_record = ctxt.read_dep::<ValueRecord>(value_format)?;
                let coverage = Coverage::validate(scope.offset(coverage_offset), valid)?;
                value_record.validate_devices(scope, valid)?;
                Ok(SinglePos::Format1 {
                    coverage,
                    value_record,
                })
            }
            2 => {
                let coverage_offset = usize::from(ctxt.read_u16be()?);
                let value_format = ctxt.read::<ValueFormat>()?;
                let value_count = usize::from(ctxt.read_u16be()?);
                let value_records = ctxt.read_array_dep::<ValueRecord>(value_count, value_format)?;
                let coverage = Coverage::validate(scope.offset(coverage_offset), valid)?;
                if valid.is_paranoid() {
                    valid.check(value_count == coverage.count())?;
                }
                validate_value_records(&value_records, scope, valid)?;
                Ok(SinglePos::Format2 {
                    coverage,
                    value_records,
                })
            }
            _ => Err(ValidationError::InvalidData),
        }
    }

    /// The adjustment for `glyph`, `None` if the subtable does not cover it.
    pub fn apply(&self, glyph: u16) -> Result<Option<ValueRecord>, ParseError> {
        match self {
            SinglePos::Format1 {
                coverage,
                value_record,
            } => Ok(coverage.index(glyph).map(|_| *value_record)),
            SinglePos::Format2 {
                coverage,
                value_records,
            } => match coverage.index(glyph) {
                Some(index) => value_records.read_item(usize::from(index)).map(Some),
                None => Ok(None),
            },
        }
    }
}

/// Pair value record of a format 1 pair adjustment subtable.
#[derive(Debug, Copy, Clone)]
pub struct PairValueRecord {
    pub second_glyph: u16,
    pub value_record1: ValueRecord,
    pub value_record2: ValueRecord,
}

impl ReadBinaryDep for PairValueRecord {
    type Args<'a> = (ValueFormat, ValueFormat);
    type HostType<'a> = Self;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        (format1, format2): (ValueFormat, ValueFormat),
    ) -> Result<Self, ParseError> {
        let second_glyph = ctxt.read_u16be()?;
        let value_record1 = ctxt.read_dep::<ValueRecord>(format1)?;
        let value_record2 = ctxt.read_dep::<ValueRecord>(format2)?;
        Ok(PairValueRecord {
            second_glyph,
            value_record1,
            value_record2,
        })
    }
}

impl ReadFixedSizeDep for PairValueRecord {
    fn size((format1, format2): (ValueFormat, ValueFormat)) -> usize {
        size::U16 + format1.size() + format2.size()
    }
}

/// Class2 record of a format 2 pair adjustment subtable.
pub enum ClassPairValues {}

impl ReadBinaryDep for ClassPairValues {
    type Args<'a> = (ValueFormat, ValueFormat);
    type HostType<'a> = (ValueRecord, ValueRecord);

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        (format1, format2): (ValueFormat, ValueFormat),
    ) -> Result<(ValueRecord, ValueRecord), ParseError> {
        let value_record1 = ctxt.read_dep::<ValueRecord>(format1)?;
        let value_record2 = ctxt.read_dep::<ValueRecord>(format2)?;
        Ok((value_record1, value_record2))
    }
}

impl ReadFixedSizeDep for ClassPairValues {
    fn size((format1, format2): (ValueFormat, ValueFormat)) -> usize {
        format1.size() + format2.size()
    }
}

/// Lookup type 2 subtable.
pub enum PairPos<'a> {
    Format1 {
        scope: ReadScope<'a>,
        coverage: Coverage<'a>,
        value_formats: (ValueFormat, ValueFormat),
        pair_set_offsets: ReadArray<'a, U16Be>,
    },
    Format2 {
        coverage: Coverage<'a>,
        class_def1: ClassDef<'a>,
        class_def2: ClassDef<'a>,
        class2_count: usize,
        class_records: ReadArray<'a, ClassPairValues>,
    },
}

fn read_pair_set(
    scope: ReadScope<'_>,
    value_formats: (ValueFormat, ValueFormat),
) -> Result<ReadArray<'_, PairValueRecord>, ParseError> {
    let mut ctxt = scope.ctxt();
    let pair_value_count = usize::from(ctxt.read_u16be()?);
    ctxt.read_array_dep::<PairValueRecord>(pair_value_count, value_formats)
}

impl<'a> PairPos<'a> {
    pub fn validate(
        scope: ReadScope<'a>,
        valid: &Validator,
    ) -> Result<PairPos<'a>, ValidationError> {
        let mut ctxt = scope.ctxt();
        match ctxt.read_u16be()? {
            1 => {
                let coverage_offset = usize::from(ctxt.read_u16be()?);
                let value_formats = (ctxt.read::<ValueFormat>()?, ctxt.read::<ValueFormat>()?);
                let pair_set_count = usize::from(ctxt.read_u16be()?);
                let pair_set_offsets = ctxt.read_array::<U16Be>(pair_set_count)?;
                let coverage = Coverage::validate(scope.offset(coverage_offset), valid)?;
                if valid.is_paranoid() {
                    valid.check(pair_set_count == coverage.count())?;
                }
                for offset in &pair_set_offsets {
                    let records = read_pair_set(scope.offset(usize::from(offset)), value_formats)?;
                    for record in records.iter_res() {
                        let record = record?;
                        valid.check_glyph(u32::from(record.second_glyph))?;
                        record.value_record1.validate_devices(scope, valid)?;
                        record.value_record2.validate_devices(scope, valid)?;
                    }
                }
                Ok(PairPos::Format1 {
                    scope,
                    coverage,
                    value_formats,
                    pair_set_offsets,
                })
            }
            2 => {
                let coverage_offset = usize::from(ctxt.read_u16be()?);
                let value_formats = (ctxt.read::<ValueFormat>()?, ctxt.read::<ValueFormat>()?);
                let class_def1_offset = usize::from(ctxt.read_u16be()?);
                let class_def2_offset = usize::from(ctxt.read_u16be()?);
                let class1_count = usize::from(ctxt.read_u16be()?);
                let class2_count = usize::from(ctxt.read_u16be()?);
                let record_count = class1_count
                    .checked_mul(class2_count)
                    .ok_or(ValidationError::TooShort)?;
                let class_records =
                    ctxt.read_array_dep::<ClassPairValues>(record_count, value_formats)?;
                let coverage = Coverage::validate(scope.offset(coverage_offset), valid)?;
                let class_def1 = ClassDef::validate(scope.offset(class_def1_offset), valid)?;
                let class_def2 = ClassDef::validate(scope.offset(class_def2_offset), valid)?;
                for values in class_records.iter_res() {
                    let (value_record1, value_record2) = values?;
                    value_record1.validate_devices(scope, valid)?;
                    value_record2.validate_devices(scope, valid)?;
                }
                Ok(PairPos::Format2 {
                    coverage,
                    class_def1,
                    class_def2,
                    class2_count,
                    class_records,
                })
            }
            _ => Err(ValidationError::InvalidData),
        }
    }

    /// The adjustments for the pair `first`, `second`, `None` if the subtable does not apply.
    pub fn apply(
        &self,
        first: u16,
        second: u16,
    ) -> Result<Option<(ValueRecord, ValueRecord)>, ParseError> {
        match self {
            PairPos::Format1 {
                scope,
                coverage,
                value_formats,
                pair_set_offsets,
            } => {
                let index = match coverage.index(first) {
                    Some(index) => usize::from(index),
                    None => return Ok(None),
                };
                let offset = pair_set_offsets
                    .get_item(index)
                    .ok_or(ParseError::BadIndex)?;
                let records = read_pair_set(scope.offset(usize::from(offset)), *value_formats)?;
                for record in records.iter_res() {
                    let record = record?;
                    if record.second_glyph == second {
                        return Ok(Some((record.value_record1, record.value_record2)));
                    }
                }
                Ok(None)
            }
            PairPos::Format2 {
                coverage,
                class_def1,
                class_def2,
                class2_count,
                class_records,
            } => {
                if coverage.index(first).is_none() {
                    return Ok(None);
                }
                let class1 = usize::from(class_def1.class(first));
                let class2 = usize::from(class_def2.class(second));
                if class2 >= *class2_count {
                    return Ok(None);
                }
                match class_records.read_item(class1 * class2_count + class2) {
                    Ok(values) => Ok(Some(values)),
                    Err(ParseError::BadIndex) => Ok(None),
                    Err(err) => Err(err),
                }
            }
        }
    }
}

/// Lookup type 3 subtable.
pub struct CursivePos<'a> {
    scope: ReadScope<'a>,
    coverage: Coverage<'a>,
    entry_exit_records: ReadArray<'a, (U16Be, U16Be)>,
}

impl<'a> CursivePos<'a> {
    pub fn validate(
        scope: ReadScope<'a>,
        valid: &Validator,
    ) -> Result<CursivePos<'a>, ValidationError> {
        let mut ctxt = scope.ctxt();
        let format = ctxt.read_u16be()?;
        valid.check(format == 1)?;
        let coverage_offset = usize::from(ctxt.read_u16be()?);
        let entry_exit_count = usize::from(ctxt.read_u16be()?);
        let entry_exit_records = ctxt.read_array::<(U16Be, U16Be)>(entry_exit_count)?;
        let coverage = Coverage::validate(scope.offset(coverage_offset), valid)?;
        if valid.is_paranoid() {
            valid.check(entry_exit_count == coverage.count())?;
        }
        for (entry_offset, exit_offset) in &entry_exit_records {
            for offset in [entry_offset, exit_offset] {
                if let Some(anchor_scope) = optional_offset(scope, offset) {
                    Anchor::validate(anchor_scope, valid)?;
                }
            }
        }
        Ok(CursivePos {
            scope,
            coverage,
            entry_exit_records,
        })
    }

    /// Entry and exit anchors of `glyph`, `None` if the subtable does not cover it.
    pub fn apply(
        &self,
        glyph: u16,
    ) -> Result<Option<(Option<Anchor>, Option<Anchor>)>, ParseError> {
        let index = match self.coverage.index(glyph) {
            Some(index) => usize::from(index),
            None => return Ok(None),
        };
        let (entry_offset, exit_offset) = self
            .entry_exit_records
            .get_item(index)
            .ok_or(ParseError::BadIndex)?;
        Ok(Some((
            optional_anchor(self.scope, entry_offset)?,
            optional_anchor(self.scope, exit_offset)?,
        )))
    }
}

/// Lookup type 4 and 6 subtables: marks attached to a base or to a preceding mark.
pub struct MarkAttachmentPos<'a> {
    mark_coverage: Coverage<'a>,
    base_coverage: Coverage<'a>,
    mark_array: MarkArray<'a>,
    base_array: AnchorMatrix<'a>,
}

impl<'a> MarkAttachmentPos<'a> {
    pub fn validate(
        scope: ReadScope<'a>,
        valid: &Validator,
    ) -> Result<MarkAttachmentPos<'a>, ValidationError> {
        let mut ctxt = scope.ctxt();
        let format = ctxt.read_u16be()?;
        valid.check(format == 1)?;
        let mark_coverage_offset = usize::from(ctxt.read_u16be()?);
        let base_coverage_offset = usize::from(ctxt.read_u16be()?);
        let class_count = usize::from(ctxt.read_u16be()?);
        let mark_array_offset = usize::from(ctxt.read_u16be()?);
        let base_array_offset = usize::from(ctxt.read_u16be()?);
        let mark_coverage = Coverage::validate(scope.offset(mark_coverage_offset), valid)?;
        let base_coverage = Coverage::validate(scope.offset(base_coverage_offset), valid)?;
        let mark_array = MarkArray::validate(scope.offset(mark_array_offset), class_count, valid)?;
        let base_array =
            AnchorMatrix::validate(scope.offset(base_array_offset), class_count, valid)?;
        if valid.is_paranoid() {
            valid.check(mark_array.len() == mark_coverage.count())?;
            valid.check(base_array.rows() == base_coverage.count())?;
        }
        Ok(MarkAttachmentPos {
            mark_coverage,
            base_coverage,
            mark_array,
            base_array,
        })
    }

    /// The anchors to align when attaching `mark` to `base`.
    ///
    /// Returns the base anchor then the mark anchor, or `None` when the subtable does not apply.
    pub fn apply(&self, base: u16, mark: u16) -> Result<Option<(Anchor, Anchor)>, ParseError> {
        let (base_index, mark_index) =
            match (self.base_coverage.index(base), self.mark_coverage.index(mark)) {
                (Some(base_index), Some(mark_index)) => {
                    (usize::from(base_index), usize::from(mark_index))
                }
                _ => return Ok(None),
            };
        let (mark_class, mark_anchor) = self.mark_array.mark(mark_index)?;
        let base_anchor = self.base_array.anchor(base_index, mark_class)?;
        Ok(base_anchor.map(|base_anchor| (base_anchor, mark_anchor)))
    }
}

/// Lookup type 5 subtable.
pub struct MarkLigPos<'a> {
    scope: ReadScope<'a>,
    mark_coverage: Coverage<'a>,
    ligature_coverage: Coverage<'a>,
    class_count: usize,
    mark_array: MarkArray<'a>,
    ligature_attach_offsets: ReadArray<'a, U16Be>,
}

impl<'a> MarkLigPos<'a> {
    pub fn validate(
        scope: ReadScope<'a>,
        valid: &Validator,
    ) -> Result<MarkLigPos<'a>, ValidationError> {
        let mut ctxt = scope.ctxt();
        let format = ctxt.read_u16be()?;
        valid.check(format == 1)?;
        let mark_coverage_offset = usize::from(ctxt.read_u16be()?);
        let ligature_coverage_offset = usize::from(ctxt.read_u16be()?);
        let class_count = usize::from(ctxt.read_u16be()?);
        let mark_array_offset = usize::from(ctxt.read_u16be()?);
        let ligature_array_offset = usize::from(ctxt.read_u16be()?);
        let mark_coverage = Coverage::validate(scope.offset(mark_coverage_offset), valid)?;
        let ligature_coverage = Coverage::validate(scope.offset(ligature_coverage_offset), valid)?;
        let mark_array = MarkArray::validate(scope.offset(mark_array_offset), class_count, valid)?;

        let ligature_array_scope = scope.offset(ligature_array_offset);
        let mut ligature_ctxt = ligature_array_scope.ctxt();
        let ligature_count = usize::from(ligature_ctxt.read_u16be()?);
        let ligature_attach_offsets = ligature_ctxt.read_array::<U16Be>(ligature_count)?;
        for offset in &ligature_attach_offsets {
            AnchorMatrix::validate(
                ligature_array_scope.offset(usize::from(offset)),
                class_count,
                valid,
            )?;
        }
        if valid.is_paranoid() {
            valid.check(mark_array.len() == mark_coverage.count())?;
            valid.check(ligature_count == ligature_coverage.count())?;
        }
        Ok(MarkLigPos {
            scope: ligature_array_scope,
            mark_coverage,
            ligature_coverage,
            class_count,
            mark_array,
            ligature_attach_offsets,
        })
    }

    /// The anchors to align when attaching `mark` to `component` of `ligature`.
    pub fn apply(
        &self,
        ligature: u16,
        component: usize,
        mark: u16,
    ) -> Result<Option<(Anchor, Anchor)>, ParseError> {
        let (ligature_index, mark_index) = match (
            self.ligature_coverage.index(ligature),
            self.mark_coverage.index(mark),
        ) {
            (Some(ligature_index), Some(mark_index)) => {
                (usize::from(ligature_index), usize::from(mark_index))
            }
            _ => return Ok(None),
        };
        let (mark_class, mark_anchor) = self.mark_array.mark(mark_index)?;
        let offset = self
            .ligature_attach_offsets
            .get_item(ligature_index)
            .ok_or(ParseError::BadIndex)?;
        let ligature_attach =
            AnchorMatrix::read(self.scope.offset(usize::from(offset)), self.class_count)?;
        if component >= ligature_attach.rows() {
            return Ok(None);
        }
        let ligature_anchor = ligature_attach.anchor(component, mark_class)?;
        Ok(ligature_anchor.map(|ligature_anchor| (ligature_anchor, mark_anchor)))
    }
}

fn validate_single_pos(
    scope: ReadScope<'_>,
    _lookup_count: usize,
    valid: &Validator,
) -> Result<(), ValidationError> {
    SinglePos::validate(scope, valid).map(drop)
}

fn validate_pair_pos(
    scope: ReadScope<'_>,
    _lookup_count: usize,
    valid: &Validator,
) -> Result<(), ValidationError> {
    PairPos::validate(scope, valid).map(drop)
}

fn validate_cursive_pos(
    scope: ReadScope<'_>,
    _lookup_count: usize,
    valid: &Validator,
) -> Result<(), ValidationError> {
    CursivePos::validate(scope, valid).map(drop)
}

fn validate_mark_base_pos(
    scope: ReadScope<'_>,
    _lookup_count: usize,
    valid: &Validator,
) -> Result<(), ValidationError> {
    MarkAttachmentPos::validate(scope, valid).map(drop)
}

fn validate_mark_lig_pos(
    scope: ReadScope<'_>,
    _lookup_count: usize,
    valid: &Validator,
) -> Result<(), ValidationError> {
    MarkLigPos::validate(scope, valid).map(drop)
}

fn validate_mark_mark_pos(
    scope: ReadScope<'_>,
    _lookup_count: usize,
    valid: &Validator,
) -> Result<(), ValidationError> {
    MarkAttachmentPos::validate(scope, valid).map(drop)
}
