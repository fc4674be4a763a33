//! Validation of the layout tables and character maps of a whole font.
//!
//! The table directory, `maxp` and the `cmap` header are required. The layout tables are
//! optional: one that fails validation is dropped and the reason recorded, leaving the rest of
//! the font usable. `JSTF` is validated last since its lookup references are checked against
//! whichever of `GSUB` and `GPOS` survived.

use log::{debug, warn};

use crate::base::BaseTable;
use crate::binary::read::ReadScope;
use crate::error::{FontValidationError, ParseError, ValidationError};
use crate::gdef::GdefTable;
use crate::jstf::JstfTable;
use crate::layout::{LayoutTable, GPOS, GSUB};
use crate::tables::cmap::{CharMap, Cmap, CmapSubtable, EncodingId, EncodingRecord, PlatformId};
use crate::tables::{MaxpTable, OffsetTable};
use crate::tag::{self, DisplayTag};
use crate::validate::{ValidationLevel, Validator};

/// The character encoding of the chosen `cmap` subtable.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Encoding {
    Unicode = 1,
    Symbol = 2,
    AppleRoman = 3,
    Big5 = 4,
}

/// Encodings in order of preference. `None` matches any encoding of the platform.
const CMAP_PREFERENCES: [(PlatformId, Option<EncodingId>, Encoding); 7] = [
    // MS UNICODE, UCS-4 (32 bit)
    (
        PlatformId::WINDOWS,
        Some(EncodingId::WINDOWS_UNICODE_UCS4),
        Encoding::Unicode,
    ),
    // MS UNICODE, UCS-2 (16 bit)
    (
        PlatformId::WINDOWS,
        Some(EncodingId::WINDOWS_UNICODE_BMP_UCS2),
        Encoding::Unicode,
    ),
    // Apple UNICODE, UCS-4 (32 bit)
    (
        PlatformId::UNICODE,
        Some(EncodingId::MACINTOSH_UNICODE_UCS4),
        Encoding::Unicode,
    ),
    (PlatformId::UNICODE, None, Encoding::Unicode),
    (
        PlatformId::WINDOWS,
        Some(EncodingId::WINDOWS_SYMBOL),
        Encoding::Symbol,
    ),
    (
        PlatformId::MACINTOSH,
        Some(EncodingId::MACINTOSH_APPLE_ROMAN),
        Encoding::AppleRoman,
    ),
    (
        PlatformId::WINDOWS,
        Some(EncodingId::WINDOWS_BIG5),
        Encoding::Big5,
    ),
];

/// A font whose tables have been validated.
pub struct Font<'a> {
    num_glyphs: u16,
    validator: Validator,
    gdef: Option<GdefTable<'a>>,
    base: Option<BaseTable<'a>>,
    gsub: Option<LayoutTable<'a, GSUB>>,
    gpos: Option<LayoutTable<'a, GPOS>>,
    jstf: Option<JstfTable<'a>>,
    cmap_subtables: Vec<(EncodingRecord, CmapSubtable<'a>)>,
    cmap_subtable: Option<(Encoding, usize)>,
    rejected: Vec<(u32, ValidationError)>,
}

/// Validates the optional tables of a font, collecting the ones that are rejected.
struct OptionalTables<'a, 'b> {
    scope: ReadScope<'a>,
    offset_table: &'b OffsetTable<'a>,
    rejected: Vec<(u32, ValidationError)>,
}

impl<'a> Font<'a> {
    /// Validate the font in `scope` at `level`.
    pub fn validate(
        scope: ReadScope<'a>,
        level: ValidationLevel,
    ) -> Result<Font<'a>, FontValidationError> {
        let offset_table = scope.read::<OffsetTable<'_>>()?;
        let maxp = offset_table
            .read_table(&scope, tag::MAXP)?
            .ok_or(ParseError::MissingTable(tag::MAXP))?
            .read::<MaxpTable>()?;
        let valid = Validator::new(level, maxp.num_glyphs);

        let cmap_scope = offset_table
            .read_table(&scope, tag::CMAP)?
            .ok_or(ParseError::MissingTable(tag::CMAP))?;
        let cmap = Cmap::validate(cmap_scope, &valid).map_err(|error| {
            FontValidationError::Invalid {
                tag: tag::CMAP,
                error,
            }
        })?;
        let cmap_subtables = cmap.valid_subtables(&valid);
        let cmap_subtable = find_good_cmap_subtable(&cmap_subtables);

        let mut tables = OptionalTables {
            scope,
            offset_table: &offset_table,
            rejected: Vec::new(),
        };
        let gdef = tables.validate(tag::GDEF, |scope| GdefTable::validate(scope, &valid));
        let base = tables.validate(tag::BASE, |scope| BaseTable::validate(scope, &valid));
        let gsub = tables.validate(tag::GSUB, |scope| LayoutTable::<GSUB>::validate(scope, &valid));
        let gpos = tables.validate(tag::GPOS, |scope| LayoutTable::<GPOS>::validate(scope, &valid));
        let jstf = tables.validate(tag::JSTF, |scope| {
            JstfTable::validate(scope, gsub.as_ref(), gpos.as_ref(), &valid)
        });

        debug!(
            "validated font at {:?}: {} glyphs, {} cmap subtables, {} tables rejected",
            level,
            maxp.num_glyphs,
            cmap_subtables.len(),
            tables.rejected.len()
        );
        Ok(Font {
            num_glyphs: maxp.num_glyphs,
            validator: valid,
            gdef,
            base,
            gsub,
            gpos,
            jstf,
            cmap_subtables,
            cmap_subtable,
            rejected: tables.rejected,
        })
    }

    pub fn num_glyphs(&self) -> u16 {
        self.num_glyphs
    }

    /// The validator the font was checked with.
    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn gdef(&self) -> Option<&GdefTable<'a>> {
        self.gdef.as_ref()
    }

    pub fn base(&self) -> Option<&BaseTable<'a>> {
        self.base.as_ref()
    }

    pub fn gsub(&self) -> Option<&LayoutTable<'a, GSUB>> {
        self.gsub.as_ref()
    }

    pub fn gpos(&self) -> Option<&LayoutTable<'a, GPOS>> {
        self.gpos.as_ref()
    }

    pub fn jstf(&self) -> Option<&JstfTable<'a>> {
        self.jstf.as_ref()
    }

    /// Every `cmap` subtable that passed validation with its encoding record.
    pub fn cmap_subtables(&self) -> &[(EncodingRecord, CmapSubtable<'a>)] {
        &self.cmap_subtables
    }

    /// The most preferred valid `cmap` subtable and its encoding.
    pub fn cmap_subtable(&self) -> Option<(Encoding, &CmapSubtable<'a>)> {
        let (encoding, index) = self.cmap_subtable?;
        let (_, subtable) = self.cmap_subtables.get(index)?;
        Some((encoding, subtable))
    }

    /// The glyph for `char_code` in the encoding of the preferred `cmap` subtable.
    ///
    /// Returns 0, the missing glyph, if there is no usable subtable or the code is not mapped.
    pub fn glyph_index(&self, char_code: u32) -> u16 {
        self.cmap_subtable()
            .map_or(0, |(_, subtable)| subtable.char_index(char_code))
    }

    /// Tags of the optional tables that failed validation, with the reason.
    pub fn rejected(&self) -> &[(u32, ValidationError)] {
        &self.rejected
    }
}

impl<'a> OptionalTables<'a, '_> {
    /// Validate the table tagged `tag` with `validate`, if the font has one.
    fn validate<T>(
        &mut self,
        tag: u32,
        validate: impl FnOnce(ReadScope<'a>) -> Result<T, ValidationError>,
    ) -> Option<T> {
        let result = match self.offset_table.read_table(&self.scope, tag) {
            Ok(None) => return None,
            Ok(Some(table_scope)) => validate(table_scope),
            Err(err) => Err(ValidationError::from(err)),
        };
        match result {
            Ok(table) => Some(table),
            Err(err) => {
                warn!("'{}' table rejected: {}", DisplayTag(tag), err);
                self.rejected.push((tag, err));
                None
            }
        }
    }
}

/// Pick the subtable to map characters with, returning its encoding and index.
pub fn find_good_cmap_subtable(
    subtables: &[(EncodingRecord, CmapSubtable<'_>)],
) -> Option<(Encoding, usize)> {
    CMAP_PREFERENCES
        .iter()
        .find_map(|&(platform_id, encoding_id, encoding)| {
            subtables
                .iter()
                .position(|(record, _)| {
                    record.platform_id == platform_id.0
                        && encoding_id.map_or(true, |encoding_id| {
                            record.encoding_id == encoding_id.0
                        })
                })
                .map(|index| (encoding, index))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{
        cmap_format12, cmap_format4, cmap_with_subtable, font_directory, gpos_with_lookups,
        jstf_enabling_gpos_lookup, maxp, TableBuilder,
    };

    #[test]
    fn optional_tables_are_dropped() {
        let maxp = maxp(10);
        let cmap = cmap_with_subtable(&cmap_format4(&[(0x41, 0x43, -0x3F)]));
        let jstf = jstf_enabling_gpos_lookup(0);
        let gdef = [0, 1, 0, 7];
        let data = font_directory(&[
            (tag::GDEF, &gdef),
            (tag::JSTF, &jstf),
            (tag::CMAP, &cmap),
            (tag::MAXP, &maxp),
        ]);
        let font = Font::validate(ReadScope::new(&data), ValidationLevel::Default).unwrap();
        assert!(font.gdef().is_none());
        assert!(font.gpos().is_none());
        assert!(font.jstf().is_none());
        assert_eq!(
            font.rejected(),
            &[
                (tag::GDEF, ValidationError::InvalidFormat),
                (tag::JSTF, ValidationError::InvalidData),
            ]
        );
        assert_eq!(font.glyph_index(0x41), 2);
        assert_eq!(font.glyph_index(0x44), 0);
    }

    #[test]
    fn jstf_checked_against_surviving_gpos() {
        let maxp = maxp(10);
        let cmap = cmap_with_subtable(&cmap_format4(&[]));
        let jstf = jstf_enabling_gpos_lookup(0);
        let gpos = gpos_with_lookups(1);
        let data = font_directory(&[
            (tag::CMAP, &cmap),
            (tag::GPOS, &gpos),
            (tag::JSTF, &jstf),
            (tag::MAXP, &maxp),
        ]);
        let font = Font::validate(ReadScope::new(&data), ValidationLevel::Tight).unwrap();
        assert!(font.rejected().is_empty());
        assert_eq!(font.gpos().unwrap().lookup_count(), Ok(1));
        assert!(font.jstf().is_some());
        assert_eq!(font.validator().num_glyphs(), 10);
    }

    #[test]
    fn required_tables() {
        let cmap = cmap_with_subtable(&cmap_format4(&[]));
        let data = font_directory(&[(tag::CMAP, &cmap)]);
        assert_eq!(
            Font::validate(ReadScope::new(&data), ValidationLevel::Default).err(),
            Some(FontValidationError::Parse(ParseError::MissingTable(tag::MAXP)))
        );

        let maxp = maxp(10);
        let mut bad_cmap = cmap.clone();
        bad_cmap[1] = 1;
        let data = font_directory(&[(tag::CMAP, &bad_cmap), (tag::MAXP, &maxp)]);
        assert_eq!(
            Font::validate(ReadScope::new(&data), ValidationLevel::Default).err(),
            Some(FontValidationError::Invalid {
                tag: tag::CMAP,
                error: ValidationError::InvalidFormat
            })
        );
    }

    #[test]
    fn preferred_cmap_subtable() {
        let format4 = cmap_format4(&[(0x41, 0x41, -0x40)]);
        let format12 = cmap_format12(&[(0x41, 0x41, 2)]);
        let mut w = TableBuilder::new();
        w.u16(0).u16(2);
        w.u16(3).u16(1).u32(20);
        w.u16(3).u16(10).u32(20 + format4.len() as u32);
        w.bytes(&format4).bytes(&format12);
        let cmap = w.into_inner();
        let maxp_10 = maxp(10);
        let data = font_directory(&[(tag::CMAP, &cmap), (tag::MAXP, &maxp_10)]);

        let font = Font::validate(ReadScope::new(&data), ValidationLevel::Tight).unwrap();
        assert_eq!(font.cmap_subtables().len(), 2);
        let (encoding, subtable) = font.cmap_subtable().unwrap();
        assert_eq!(encoding, Encoding::Unicode);
        assert_eq!(subtable.format(), 12);
        assert_eq!(font.glyph_index(0x41), 2);

        // A subtable that fails validation is never chosen.
        let maxp_2 = maxp(2);
        let data = font_directory(&[(tag::CMAP, &cmap), (tag::MAXP, &maxp_2)]);
        let font = Font::validate(ReadScope::new(&data), ValidationLevel::Tight).unwrap();
        assert_eq!(font.cmap_subtables().len(), 1);
        assert_eq!(font.cmap_subtable().unwrap().1.format(), 4);
        assert_eq!(font.glyph_index(0x41), 1);
    }
}
