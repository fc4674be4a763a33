//! Validation of the `BASE` table.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/base>

use itertools::Itertools;
use log::debug;

use crate::binary::read::{ReadArray, ReadScope};
use crate::binary::{U16Be, U32Be};
use crate::error::{ParseError, ValidationError};
use crate::layout::{optional_offset, optional_offset32, Device, TagOffsetRecord};
use crate::validate::Validator;

/// Baseline table
pub struct BaseTable<'a> {
    minor_version: u16,
    horiz_axis: Option<BaseAxis<'a>>,
    vert_axis: Option<BaseAxis<'a>>,
}

/// The baseline data for one text direction.
pub struct BaseAxis<'a> {
    scope: ReadScope<'a>,
    base_tags: Option<ReadArray<'a, U32Be>>,
    base_script_records: ReadArray<'a, TagOffsetRecord>,
}

pub struct BaseScript<'a> {
    scope: ReadScope<'a>,
    base_values_offset: u16,
    default_min_max_offset: u16,
    min_max_records: ReadArray<'a, TagOffsetRecord>,
}

pub struct BaseValues<'a> {
    scope: ReadScope<'a>,
    default_baseline_index: u16,
    base_coord_offsets: ReadArray<'a, U16Be>,
}

pub struct MinMax {
    pub min_coord: Option<BaseCoord>,
    pub max_coord: Option<BaseCoord>,
}

/// A baseline coordinate in design units.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BaseCoord {
    pub coordinate: i16,
    /// Glyph and contour point that refine the coordinate (format 2).
    pub reference_point: Option<(u16, u16)>,
}

impl<'a> BaseTable<'a> {
    pub fn validate(
        scope: ReadScope<'a>,
        valid: &Validator,
    ) -> Result<BaseTable<'a>, ValidationError> {
        let mut ctxt = scope.ctxt();
        let major_version = ctxt.read_u16be()?;
        let minor_version = ctxt.read_u16be()?;
        ctxt.check_version(major_version == 1 && minor_version <= 1)?;
        let horiz_axis_offset = ctxt.read_u16be()?;
        let vert_axis_offset = ctxt.read_u16be()?;
        let item_var_store_offset = match minor_version {
            1 => ctxt.read_u32be()?,
            _ => 0,
        };

        let horiz_axis = optional_offset(scope, horiz_axis_offset)
            .map(|axis_scope| BaseAxis::validate(axis_scope, valid))
            .transpose()?;
        let vert_axis = optional_offset(scope, vert_axis_offset)
            .map(|axis_scope| BaseAxis::validate(axis_scope, valid))
            .transpose()?;
        if let Some(store_scope) = optional_offset32(scope, item_var_store_offset)? {
            let mut store_ctxt = store_scope.ctxt();
            valid.check(store_ctxt.read_u16be()? == 1)?;
            store_ctxt.check_avail(6)?;
        }

        debug!(
            "BASE 1.{}: horizontal axis {}, vertical axis {}",
            minor_version,
            horiz_axis.is_some(),
            vert_axis.is_some()
        );
        Ok(BaseTable {
            minor_version,
            horiz_axis,
            vert_axis,
        })
    }

    pub fn minor_version(&self) -> u16 {
        self.minor_version
    }

    pub fn horiz_axis(&self) -> Option<&BaseAxis<'a>> {
        self.horiz_axis.as_ref()
    }

    pub fn vert_axis(&self) -> Option<&BaseAxis<'a>> {
        self.vert_axis.as_ref()
    }
}

impl<'a> BaseAxis<'a> {
    fn validate(
        scope: ReadScope<'a>,
        valid: &Validator,
    ) -> Result<BaseAxis<'a>, ValidationError> {
        let mut ctxt = scope.ctxt();
        let base_tag_list_offset = ctxt.read_u16be()?;
        let base_script_list_offset = usize::from(ctxt.read_u16be()?);

        let base_tags = match optional_offset(scope, base_tag_list_offset) {
            Some(tag_list_scope) => {
                let mut tag_list_ctxt = tag_list_scope.ctxt();
                let base_tag_count = usize::from(tag_list_ctxt.read_u16be()?);
                let base_tags = tag_list_ctxt.read_array::<U32Be>(base_tag_count)?;
                if valid.is_paranoid() {
                    valid.check(base_tags.iter().tuple_windows().all(|(a, b)| a < b))?;
                }
                Some(base_tags)
            }
            None => None,
        };
        let tag_count = base_tags.as_ref().map_or(0, |tags| tags.len());

        let script_list_scope = scope.offset(base_script_list_offset);
        let mut script_list_ctxt = script_list_scope.ctxt();
        let base_script_count = usize::from(script_list_ctxt.read_u16be()?);
        let base_script_records =
            script_list_ctxt.read_array::<TagOffsetRecord>(base_script_count)?;
        for record in &base_script_records {
            BaseScript::validate(
                script_list_scope.offset(usize::from(record.offset)),
                tag_count,
                valid,
            )?;
        }

        Ok(BaseAxis {
            scope: script_list_scope,
            base_tags,
            base_script_records,
        })
    }

    /// The baseline tags, in the order used to index each script's coordinates.
    pub fn base_tags(&self) -> impl Iterator<Item = u32> + 'a {
        self.base_tags
            .as_ref()
            .map(|base_tags| base_tags.iter())
            .into_iter()
            .flatten()
    }

    pub fn script_tags(&self) -> impl Iterator<Item = u32> + 'a {
        self.base_script_records.iter().map(|record| record.tag)
    }

    pub fn find_script(&self, script_tag: u32) -> Result<Option<BaseScript<'a>>, ParseError> {
        self.base_script_records
            .iter()
            .find(|record| record.tag == script_tag)
            .map(|record| BaseScript::read(self.scope.offset(usize::from(record.offset))))
            .transpose()
    }
}

impl<'a> BaseScript<'a> {
    fn read(scope: ReadScope<'a>) -> Result<BaseScript<'a>, ParseError> {
        let mut ctxt = scope.ctxt();
        let base_values_offset = ctxt.read_u16be()?;
        let default_min_max_offset = ctxt.read_u16be()?;
        let min_max_count = usize::from(ctxt.read_u16be()?);
        let min_max_records = ctxt.read_array::<TagOffsetRecord>(min_max_count)?;
        Ok(BaseScript {
            scope,
            base_values_offset,
            default_min_max_offset,
            min_max_records,
        })
    }

    fn validate(
        scope: ReadScope<'a>,
        tag_count: usize,
        valid: &Validator,
    ) -> Result<BaseScript<'a>, ValidationError> {
        let base_script = BaseScript::read(scope)?;
        if let Some(values_scope) = optional_offset(scope, base_script.base_values_offset) {
            BaseValues::validate(values_scope, tag_count, valid)?;
        }
        if let Some(min_max_scope) = optional_offset(scope, base_script.default_min_max_offset) {
            MinMax::validate(min_max_scope, valid)?;
        }
        for record in &base_script.min_max_records {
            MinMax::validate(scope.offset(usize::from(record.offset)), valid)?;
        }
        Ok(base_script)
    }

    pub fn base_values(&self) -> Result<Option<BaseValues<'a>>, ParseError> {
        optional_offset(self.scope, self.base_values_offset)
            .map(BaseValues::read)
            .transpose()
    }

    pub fn default_min_max(&self) -> Result<Option<MinMax>, ParseError> {
        optional_offset(self.scope, self.default_min_max_offset)
            .map(MinMax::read)
            .transpose()
    }

    /// The extents for the language system `lang_sys_tag`.
    pub fn find_min_max(&self, lang_sys_tag: u32) -> Result<Option<MinMax>, ParseError> {
        self.min_max_records
            .iter()
            .find(|record| record.tag == lang_sys_tag)
            .map(|record| MinMax::read(self.scope.offset(usize::from(record.offset))))
            .transpose()
    }
}

impl<'a> BaseValues<'a> {
    fn read(scope: ReadScope<'a>) -> Result<BaseValues<'a>, ParseError> {
        let mut ctxt = scope.ctxt();
        let default_baseline_index = ctxt.read_u16be()?;
        let base_coord_count = usize::from(ctxt.read_u16be()?);
        let base_coord_offsets = ctxt.read_array::<U16Be>(base_coord_count)?;
        Ok(BaseValues {
            scope,
            default_baseline_index,
            base_coord_offsets,
        })
    }

    fn validate(
        scope: ReadScope<'a>,
        tag_count: usize,
        valid: &Validator,
    ) -> Result<(), ValidationError> {
        let base_values = BaseValues::read(scope)?;
        let base_coord_count = base_values.base_coord_offsets.len();
        if valid.is_tight() {
            valid.check(usize::from(base_values.default_baseline_index) < base_coord_count)?;
        }
        if valid.is_paranoid() {
            valid.check(base_coord_count == tag_count)?;
        }
        for offset in &base_values.base_coord_offsets {
            validate_base_coord(scope.offset(usize::from(offset)), valid)?;
        }
        Ok(())
    }

    pub fn default_baseline_index(&self) -> u16 {
        self.default_baseline_index
    }

    pub fn len(&self) -> usize {
        self.base_coord_offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base_coord_offsets.is_empty()
    }

    /// The coordinate of the baseline at `index` in the axis tag list.
    pub fn coord(&self, index: usize) -> Result<BaseCoord, ParseError> {
        let offset = self.base_coord_offsets.read_item(index)?;
        read_base_coord(self.scope.offset(usize::from(offset)))
    }
}

impl MinMax {
    fn read(scope: ReadScope<'_>) -> Result<MinMax, ParseError> {
        let mut ctxt = scope.ctxt();
        let min_coord_offset = ctxt.read_u16be()?;
        let max_coord_offset = ctxt.read_u16be()?;
        Ok(MinMax {
            min_coord: optional_offset(scope, min_coord_offset)
                .map(read_base_coord)
                .transpose()?,
            max_coord: optional_offset(scope, max_coord_offset)
                .map(read_base_coord)
                .transpose()?,
        })
    }

    fn validate(scope: ReadScope<'_>, valid: &Validator) -> Result<(), ValidationError> {
        let mut ctxt = scope.ctxt();
        let min_coord_offset = ctxt.read_u16be()?;
        let max_coord_offset = ctxt.read_u16be()?;
        let feature_min_max_count = usize::from(ctxt.read_u16be()?);
        let feature_min_max_records =
            ctxt.read_array::<(U32Be, U16Be, U16Be)>(feature_min_max_count)?;

        for offset in [min_coord_offset, max_coord_offset] {
            if let Some(coord_scope) = optional_offset(scope, offset) {
                validate_base_coord(coord_scope, valid)?;
            }
        }
        for (_feature_tag, min_offset, max_offset) in &feature_min_max_records {
            for offset in [min_offset, max_offset] {
                if let Some(coord_scope) = optional_offset(scope, offset) {
                    validate_base_coord(coord_scope, valid)?;
                }
            }
        }
        Ok(())
    }
}

fn read_base_coord(scope: ReadScope<'_>) -> Result<BaseCoord, ParseError> {
    let mut ctxt = scope.ctxt();
    let format = ctxt.read_u16be()?;
    ctxt.check((1..=3).contains(&format))?;
    let coordinate = ctxt.read_i16be()?;
    let reference_point = match format {
        2 => Some((ctxt.read_u16be()?, ctxt.read_u16be()?)),
        _ => None,
    };
    Ok(BaseCoord {
        coordinate,
        reference_point,
    })
}

fn validate_base_coord(scope: ReadScope<'_>, valid: &Validator) -> Result<(), ValidationError> {
    let mut ctxt = scope.ctxt();
    match ctxt.read_u16be()? {
        1 => {
            let _coordinate = ctxt.read_i16be()?;
        }
        2 => {
            let _coordinate = ctxt.read_i16be()?;
            let reference_glyph = ctxt.read_u16be()?;
            let _base_coord_point = ctxt.read_u16be()?;
            valid.check_glyph(u32::from(reference_glyph))?;
        }
        3 => {
            let _coordinate = ctxt.read_i16be()?;
            let device_offset = ctxt.read_u16be()?;
            if let Some(device_scope) = optional_offset(scope, device_offset) {
                Device::validate(device_scope, valid)?;
            }
        }
        _ => return Err(ValidationError::InvalidData),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::TableBuilder;
    use crate::validate::ValidationLevel;

    /// A horizontal axis with tags `romn` and `ideo` and one `latn` script whose
    /// coordinates are written by `coords`.
    fn base_table(default_index: u16, coords: impl Fn(&mut TableBuilder)) -> Vec<u8> {
        let mut w = TableBuilder::new();
        w.u16(1).u16(0);
        let horiz_axis = w.placeholder16();
        w.u16(0);

        w.link16(horiz_axis, 0);
        let axis_base = w.len();
        let tag_list = w.placeholder16();
        let script_list = w.placeholder16();
        w.link16(tag_list, axis_base);
        w.u16(2).tag(b"ideo").tag(b"romn");
        w.link16(script_list, axis_base);
        let script_list_base = w.len();
        w.u16(1).tag(b"latn");
        let base_script = w.placeholder16();

        w.link16(base_script, script_list_base);
        let base_script_base = w.len();
        let base_values = w.placeholder16();
        w.u16(0).u16(0);
        w.link16(base_values, base_script_base);
        w.u16(default_index);
        coords(&mut w);
        w.into_inner()
    }

    /// Two coordinate offsets followed by format 1 coordinates.
    fn two_coords(w: &mut TableBuilder) {
        let values_base = w.len() - 2;
        w.u16(2);
        let first = w.placeholder16();
        let second = w.placeholder16();
        w.link16(first, values_base);
        w.u16(1).i16(-120);
        w.link16(second, values_base);
        w.u16(1).i16(0);
    }

    #[test]
    fn baseline_coordinates() {
        let data = base_table(1, two_coords);
        let valid = Validator::new(ValidationLevel::Paranoid, 10);
        let base = BaseTable::validate(ReadScope::new(&data), &valid).unwrap();
        assert!(base.vert_axis().is_none());
        let axis = base.horiz_axis().unwrap();
        assert_eq!(
            axis.base_tags().collect::<Vec<_>>(),
            vec![u32::from_be_bytes(*b"ideo"), u32::from_be_bytes(*b"romn")]
        );
        let script = axis
            .find_script(u32::from_be_bytes(*b"latn"))
            .unwrap()
            .unwrap();
        let values = script.base_values().unwrap().unwrap();
        assert_eq!(values.default_baseline_index(), 1);
        assert_eq!(values.coord(0).unwrap().coordinate, -120);
        assert!(script.default_min_max().unwrap().is_none());
    }

    #[test]
    fn default_baseline_index_is_tight() {
        let data = base_table(2, two_coords);
        let scope = ReadScope::new(&data);
        let default = Validator::new(ValidationLevel::Default, 10);
        assert!(BaseTable::validate(scope, &default).is_ok());
        let tight = Validator::new(ValidationLevel::Tight, 10);
        assert_eq!(
            BaseTable::validate(scope, &tight).err(),
            Some(ValidationError::InvalidData)
        );
    }

    #[test]
    fn coord_count_matches_tags_when_paranoid() {
        let data = base_table(0, |w| {
            let values_base = w.len() - 2;
            w.u16(1);
            let coord = w.placeholder16();
            w.link16(coord, values_base);
            w.u16(1).i16(0);
        });
        let scope = ReadScope::new(&data);
        let tight = Validator::new(ValidationLevel::Tight, 10);
        assert!(BaseTable::validate(scope, &tight).is_ok());
        let paranoid = Validator::new(ValidationLevel::Paranoid, 10);
        assert_eq!(
            BaseTable::validate(scope, &paranoid).err(),
            Some(ValidationError::InvalidData)
        );
    }

    #[test]
    fn coord_formats() {
        let coord_table = |format: u16, glyph: u16| {
            base_table(0, move |w| {
                let values_base = w.len() - 2;
                w.u16(2);
                let first = w.placeholder16();
                let second = w.placeholder16();
                w.link16(first, values_base);
                let coord_base = w.len();
                w.u16(format).i16(40);
                match format {
                    2 => {
                        w.u16(glyph).u16(3);
                    }
                    3 => {
                        let device = w.placeholder16();
                        w.link16(device, coord_base);
                        w.u16(10).u16(11).u16(1).u16(0x4000);
                    }
                    _ => {}
                }
                w.link16(second, values_base);
                w.u16(1).i16(0);
            })
        };
        let valid = Validator::new(ValidationLevel::Paranoid, 10);
        for format in 1..=3 {
            let data = coord_table(format, 9);
            assert!(BaseTable::validate(ReadScope::new(&data), &valid).is_ok());
        }
        let data = coord_table(2, 10);
        assert_eq!(
            BaseTable::validate(ReadScope::new(&data), &valid).err(),
            Some(ValidationError::InvalidGlyphId)
        );
        let data = coord_table(4, 0);
        assert_eq!(
            BaseTable::validate(ReadScope::new(&data), &valid).err(),
            Some(ValidationError::InvalidData)
        );
    }

    #[test]
    fn versions() {
        let valid = Validator::new(ValidationLevel::Default, 10);
        let mut w = TableBuilder::new();
        w.u16(1).u16(1).u16(0).u16(0).u32(0);
        let data = w.into_inner();
        let base = BaseTable::validate(ReadScope::new(&data), &valid).unwrap();
        assert_eq!(base.minor_version(), 1);
        assert_eq!(
            BaseTable::validate(ReadScope::new(&data[..10]), &valid).err(),
            Some(ValidationError::TooShort)
        );

        let mut w = TableBuilder::new();
        w.u16(1).u16(2).u16(0).u16(0).u32(0);
        let data = w.into_inner();
        assert_eq!(
            BaseTable::validate(ReadScope::new(&data), &valid).err(),
            Some(ValidationError::InvalidFormat)
        );
    }
}
