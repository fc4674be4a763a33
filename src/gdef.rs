//! Validation of the `GDEF` table.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/gdef>

use log::debug;

use crate::binary::read::ReadScope;
use crate::binary::{U16Be, U32Be};
use crate::error::ValidationError;
use crate::layout::{optional_offset, optional_offset32, ClassDef, Coverage, Device};
use crate::validate::Validator;

pub const GLYPH_CLASS_NONE: u16 = 0;
pub const GLYPH_CLASS_BASE: u16 = 1;
pub const GLYPH_CLASS_LIGATURE: u16 = 2;
pub const GLYPH_CLASS_MARK: u16 = 3;
pub const GLYPH_CLASS_COMPONENT: u16 = 4;

/// Glyph definition table
pub struct GdefTable<'a> {
    minor_version: u16,
    glyph_class_def: Option<ClassDef<'a>>,
    mark_attach_class_def: Option<ClassDef<'a>>,
    mark_glyph_sets: Vec<Coverage<'a>>,
}

impl<'a> GdefTable<'a> {
    pub fn validate(
        scope: ReadScope<'a>,
        valid: &Validator,
    ) -> Result<GdefTable<'a>, ValidationError> {
        let mut ctxt = scope.ctxt();
        let major_version = ctxt.read_u16be()?;
        let minor_version = ctxt.read_u16be()?;
        ctxt.check_version(major_version == 1 && matches!(minor_version, 0 | 2 | 3))?;
        let glyph_class_def_offset = ctxt.read_u16be()?;
        let attach_list_offset = ctxt.read_u16be()?;
        let lig_caret_list_offset = ctxt.read_u16be()?;
        // Present since OpenType 1.2 without a version change, so always read.
        let mark_attach_class_def_offset = ctxt.read_u16be()?;
        let mark_glyph_sets_def_offset = match minor_version {
            0 => 0,
            _ => ctxt.read_u16be()?,
        };
        let item_var_store_offset = match minor_version {
            3 => ctxt.read_u32be()?,
            _ => 0,
        };

        let glyph_class_def = optional_offset(scope, glyph_class_def_offset)
            .map(|class_def_scope| ClassDef::validate(class_def_scope, valid))
            .transpose()?;
        if let Some(class_def) = glyph_class_def.as_ref().filter(|_| valid.is_paranoid()) {
            valid.check(
                class_def
                    .class_values()
                    .all(|class| class <= GLYPH_CLASS_COMPONENT),
            )?;
        }
        if let Some(attach_list_scope) = optional_offset(scope, attach_list_offset) {
            validate_attach_list(attach_list_scope, valid)?;
        }
        if let Some(lig_caret_list_scope) = optional_offset(scope, lig_caret_list_offset) {
            validate_lig_caret_list(lig_caret_list_scope, valid)?;
        }
        let mark_attach_class_def = optional_offset(scope, mark_attach_class_def_offset)
            .map(|class_def_scope| ClassDef::validate(class_def_scope, valid))
            .transpose()?;
        let mark_glyph_sets = match optional_offset(scope, mark_glyph_sets_def_offset) {
            Some(sets_scope) => validate_mark_glyph_sets(sets_scope, valid)?,
            None => Vec::new(),
        };
        if let Some(store_scope) = optional_offset32(scope, item_var_store_offset)? {
            // Only the item variation store header is checked.
            let mut store_ctxt = store_scope.ctxt();
            valid.check(store_ctxt.read_u16be()? == 1)?;
            store_ctxt.check_avail(6)?;
        }

        debug!(
            "GDEF 1.{}: {} mark glyph sets",
            minor_version,
            mark_glyph_sets.len()
        );
        Ok(GdefTable {
            minor_version,
            glyph_class_def,
            mark_attach_class_def,
            mark_glyph_sets,
        })
    }

    pub fn minor_version(&self) -> u16 {
        self.minor_version
    }

    pub fn has_glyph_classes(&self) -> bool {
        self.glyph_class_def.is_some()
    }

    pub fn glyph_class(&self, glyph: u16) -> u16 {
        self.glyph_class_def
            .as_ref()
            .map_or(GLYPH_CLASS_NONE, |class_def| class_def.class(glyph))
    }

    pub fn is_mark(&self, glyph: u16) -> bool {
        self.glyph_class(glyph) == GLYPH_CLASS_MARK
    }

    pub fn mark_attach_class(&self, glyph: u16) -> u16 {
        self.mark_attach_class_def
            .as_ref()
            .map_or(GLYPH_CLASS_NONE, |class_def| class_def.class(glyph))
    }

    pub fn mark_glyph_set_count(&self) -> usize {
        self.mark_glyph_sets.len()
    }

    /// Returns `true` if `glyph` is a mark in the mark glyph set at `index`.
    pub fn is_mark_in_set(&self, glyph: u16, index: usize) -> bool {
        self.is_mark(glyph)
            && self
                .mark_glyph_sets
                .get(index)
                .is_some_and(|coverage| coverage.index(glyph).is_some())
    }
}

fn validate_attach_list(scope: ReadScope<'_>, valid: &Validator) -> Result<(), ValidationError> {
    let mut ctxt = scope.ctxt();
    let coverage_offset = usize::from(ctxt.read_u16be()?);
    let glyph_count = usize::from(ctxt.read_u16be()?);
    let attach_point_offsets = ctxt.read_array::<U16Be>(glyph_count)?;
    let coverage = Coverage::validate(scope.offset(coverage_offset), valid)?;
    if valid.is_default() {
        valid.check(glyph_count == coverage.count())?;
    }
    for offset in &attach_point_offsets {
        let mut point_ctxt = scope.offset(usize::from(offset)).ctxt();
        let point_count = usize::from(point_ctxt.read_u16be()?);
        point_ctxt.read_array::<U16Be>(point_count)?;
    }
    Ok(())
}

fn validate_lig_caret_list(
    scope: ReadScope<'_>,
    valid: &Validator,
) -> Result<(), ValidationError> {
    let mut ctxt = scope.ctxt();
    let coverage_offset = usize::from(ctxt.read_u16be()?);
    let lig_glyph_count = usize::from(ctxt.read_u16be()?);
    let lig_glyph_offsets = ctxt.read_array::<U16Be>(lig_glyph_count)?;
    let coverage = Coverage::validate(scope.offset(coverage_offset), valid)?;
    if valid.is_default() {
        valid.check(lig_glyph_count == coverage.count())?;
    }
    for lig_glyph_offset in &lig_glyph_offsets {
        let lig_glyph_scope = scope.offset(usize::from(lig_glyph_offset));
        let mut lig_glyph_ctxt = lig_glyph_scope.ctxt();
        let caret_count = usize::from(lig_glyph_ctxt.read_u16be()?);
        let caret_value_offsets = lig_glyph_ctxt.read_array::<U16Be>(caret_count)?;
        for caret_value_offset in &caret_value_offsets {
            validate_caret_value(lig_glyph_scope.offset(usize::from(caret_value_offset)), valid)?;
        }
    }
    Ok(())
}

fn validate_caret_value(scope: ReadScope<'_>, valid: &Validator) -> Result<(), ValidationError> {
    let mut ctxt = scope.ctxt();
    match ctxt.read_u16be()? {
        // Coordinate or contour point index
        1 | 2 => {
            ctxt.read_u16be()?;
            Ok(())
        }
        3 => {
            let _coordinate = ctxt.read_i16be()?;
            let device_offset = ctxt.read_u16be()?;
            if let Some(device_scope) = optional_offset(scope, device_offset) {
                Device::validate(device_scope, valid)?;
            }
            Ok(())
        }
        _ => Err(ValidationError::InvalidData),
    }
}

fn validate_mark_glyph_sets<'a>(
    scope: ReadScope<'a>,
    valid: &Validator,
) -> Result<Vec<Coverage<'a>>, ValidationError> {
    let mut ctxt = scope.ctxt();
    let format = ctxt.read_u16be()?;
    valid.check(format == 1)?;
    let mark_glyph_set_count = usize::from(ctxt.read_u16be()?);
    let coverage_offsets = ctxt.read_array::<U32Be>(mark_glyph_set_count)?;
    coverage_offsets
        .iter()
        .map(|offset| Coverage::validate(scope.offset(usize::try_from(offset)?), valid))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{coverage_format1, TableBuilder};
    use crate::validate::ValidationLevel;

    fn make_gdef_header(glyph_class_def_offset: u16) -> Vec<u8> {
        let mut w = TableBuilder::new();
        w.u16(1).u16(0);
        w.u16(glyph_class_def_offset);
        w.u16(0).u16(0).u16(0);
        w.into_inner()
    }

    fn validator(level: ValidationLevel) -> Validator {
        Validator::new(level, 50)
    }

    #[test]
    fn zero_class_def_offset() {
        let data = make_gdef_header(0);
        let gdef =
            GdefTable::validate(ReadScope::new(&data), &validator(ValidationLevel::Paranoid))
                .unwrap();
        assert!(!gdef.has_glyph_classes());
        assert_eq!(gdef.glyph_class(7), GLYPH_CLASS_NONE);
    }

    #[test]
    fn class_def_offset_past_end() {
        let data = make_gdef_header(1000);
        assert_eq!(
            GdefTable::validate(ReadScope::new(&data), &validator(ValidationLevel::None)).err(),
            Some(ValidationError::TooShort)
        );
    }

    #[test]
    fn versions() {
        let valid = validator(ValidationLevel::Default);
        for (minor, header) in [(0, 12), (2, 14), (3, 18)] {
            let mut w = TableBuilder::new();
            w.u16(1).u16(minor);
            w.bytes(&vec![0; header - 4]);
            let data = w.into_inner();
            let gdef = GdefTable::validate(ReadScope::new(&data), &valid).unwrap();
            assert_eq!(gdef.minor_version(), minor);
            assert_eq!(
                GdefTable::validate(ReadScope::new(&data[..header - 1]), &valid).err(),
                Some(ValidationError::TooShort)
            );
        }
        for (major, minor) in [(1, 1), (1, 4), (2, 0), (0, 0)] {
            let mut w = TableBuilder::new();
            w.u16(major).u16(minor).bytes(&[0; 14]);
            let data = w.into_inner();
            assert_eq!(
                GdefTable::validate(ReadScope::new(&data), &valid).err(),
                Some(ValidationError::InvalidFormat)
            );
        }
    }

    #[test]
    fn glyph_classes() {
        let mut w = TableBuilder::new();
        w.u16(1).u16(0);
        let class_def = w.placeholder16();
        w.u16(0).u16(0).u16(0);
        w.link16(class_def, 0);
        w.u16(2).u16(2).u16s(&[1, 3, 1]).u16s(&[10, 12, 3]);
        let data = w.into_inner();
        let gdef =
            GdefTable::validate(ReadScope::new(&data), &validator(ValidationLevel::Paranoid))
                .unwrap();
        assert_eq!(gdef.glyph_class(2), GLYPH_CLASS_BASE);
        assert!(gdef.is_mark(11));
        assert!(!gdef.is_mark(4));
        assert!(!gdef.is_mark_in_set(11, 0));
    }

    #[test]
    fn undefined_glyph_class_is_paranoid() {
        let mut w = TableBuilder::new();
        w.u16(1).u16(0);
        let class_def = w.placeholder16();
        w.u16(0).u16(0).u16(0);
        w.link16(class_def, 0);
        w.u16(1).u16(5).u16(1).u16(9);
        let data = w.into_inner();
        let scope = ReadScope::new(&data);
        assert!(GdefTable::validate(scope, &validator(ValidationLevel::Tight)).is_ok());
        assert_eq!(
            GdefTable::validate(scope, &validator(ValidationLevel::Paranoid)).err(),
            Some(ValidationError::InvalidData)
        );
    }

    #[test]
    fn attach_list_count_matches_coverage() {
        let mut w = TableBuilder::new();
        w.u16(1).u16(0).u16(0);
        let attach_list = w.placeholder16();
        w.u16(0).u16(0);
        w.link16(attach_list, 0);
        let attach_list_base = w.len();
        let coverage = w.placeholder16();
        w.u16(1);
        let attach_point = w.placeholder16();
        w.link16(coverage, attach_list_base);
        w.bytes(&coverage_format1(&[4, 5]));
        w.link16(attach_point, attach_list_base);
        w.u16(2).u16s(&[0, 3]);
        let data = w.into_inner();
        let scope = ReadScope::new(&data);
        assert!(GdefTable::validate(scope, &validator(ValidationLevel::None)).is_ok());
        assert_eq!(
            GdefTable::validate(scope, &validator(ValidationLevel::Default)).err(),
            Some(ValidationError::InvalidData)
        );
    }

    fn lig_caret_list(caret_format: u16) -> Vec<u8> {
        let mut w = TableBuilder::new();
        w.u16(1).u16(0).u16(0).u16(0);
        let lig_caret_list = w.placeholder16();
        w.u16(0);
        w.link16(lig_caret_list, 0);
        let list_base = w.len();
        let coverage = w.placeholder16();
        w.u16(1);
        let lig_glyph = w.placeholder16();
        w.link16(coverage, list_base);
        w.bytes(&coverage_format1(&[8]));
        w.link16(lig_glyph, list_base);
        let lig_glyph_base = w.len();
        w.u16(1);
        let caret = w.placeholder16();
        w.link16(caret, lig_glyph_base);
        w.u16(caret_format).i16(250).u16(0);
        w.into_inner()
    }

    #[test]
    fn caret_value_formats() {
        let valid = validator(ValidationLevel::Paranoid);
        for format in 1..=3 {
            let data = lig_caret_list(format);
            assert!(GdefTable::validate(ReadScope::new(&data), &valid).is_ok());
        }
        let data = lig_caret_list(4);
        assert_eq!(
            GdefTable::validate(ReadScope::new(&data), &valid).err(),
            Some(ValidationError::InvalidData)
        );
    }

    #[test]
    fn mark_glyph_sets() {
        let mut w = TableBuilder::new();
        w.u16(1).u16(2);
        let class_def = w.placeholder16();
        w.u16(0).u16(0).u16(0);
        let sets = w.placeholder16();
        w.link16(class_def, 0);
        w.u16(1).u16(20).u16(2).u16s(&[3, 3]);
        w.link16(sets, 0);
        let sets_base = w.len();
        w.u16(1).u16(2);
        let first = w.placeholder32();
        let second = w.placeholder32();
        w.link32(first, sets_base);
        w.bytes(&coverage_format1(&[20]));
        w.link32(second, sets_base);
        w.bytes(&coverage_format1(&[21]));
        let data = w.into_inner();

        let gdef =
            GdefTable::validate(ReadScope::new(&data), &validator(ValidationLevel::Paranoid))
                .unwrap();
        assert_eq!(gdef.mark_glyph_set_count(), 2);
        assert!(gdef.is_mark_in_set(20, 0));
        assert!(!gdef.is_mark_in_set(20, 1));
        assert!(gdef.is_mark_in_set(21, 1));
        assert!(!gdef.is_mark_in_set(21, 2));
    }
}
