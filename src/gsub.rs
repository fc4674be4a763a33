//! Validation of the `GSUB` table.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/gsub>

use crate::binary::read::{ReadArray, ReadScope};
use crate::binary::U16Be;
use crate::error::{ParseError, ValidationError};
use crate::layout::{
    validate_chain_context, validate_context, validate_coverage_offsets, validate_extension,
    Coverage, LayoutTableType, SubtableValidator, GSUB,
};
use crate::tag;
use crate::validate::Validator;

impl LayoutTableType for GSUB {
    const TAG: u32 = tag::GSUB;

    const EXTENSION_LOOKUP_TYPE: u16 = 7;

    const SUBTABLE_VALIDATORS: &'static [SubtableValidator] = &[
        validate_single_subst,
        validate_multiple_subst,
        validate_alternate_subst,
        validate_ligature_subst,
        validate_context,
        validate_chain_context,
        validate_extension::<GSUB>,
        validate_reverse_chain_single_subst,
    ];
}

/// Lookup type 1 subtable.
pub enum SingleSubst<'a> {
    Format1 {
        coverage: Coverage<'a>,
        delta_glyph_index: i16,
    },
    Format2 {
        coverage: Coverage<'a>,
        substitute_glyph_array: ReadArray<'a, U16Be>,
    },
}

impl<'a> SingleSubst<'a> {
    pub fn validate(
        scope: ReadScope<'a>,
        valid: &Validator,
    ) -> Result<SingleSubst<'a>, ValidationError> {
        let mut ctxt = scope.ctxt();
        match ctxt.read_u16be()? {
            1 => {
                let coverage_offset = usize::from(ctxt.read_u16be()?);
                let delta_glyph_index = ctxt.read_i16be()?;
                let coverage = Coverage::validate(scope.offset(coverage_offset), valid)?;
                if valid.is_tight() {
                    // Addition of the delta is modulo 65536.
                    for glyph in coverage.glyphs() {
                        let substitute = glyph.wrapping_add(delta_glyph_index as u16);
                        valid.check_glyph(u32::from(substitute))?;
                    }
                }
                Ok(SingleSubst::Format1 {
                    coverage,
                    delta_glyph_index,
                })
            }
            2 => {
                let coverage_offset = usize::from(ctxt.read_u16be()?);
                let glyph_count = usize::from(ctxt.read_u16be()?);
                let substitute_glyph_array = ctxt.read_array::<U16Be>(glyph_count)?;
                let coverage = Coverage::validate(scope.offset(coverage_offset), valid)?;
                valid.check_glyphs(&substitute_glyph_array)?;
                if valid.is_paranoid() {
                    valid.check(glyph_count == coverage.count())?;
                }
                Ok(SingleSubst::Format2 {
                    coverage,
                    substitute_glyph_array,
                })
            }
            _ => Err(ValidationError::InvalidData),
        }
    }

    /// The replacement for `glyph`, `None` if the subtable does not cover it.
    pub fn apply_glyph(&self, glyph: u16) -> Option<u16> {
        match self {
            SingleSubst::Format1 {
                coverage,
                delta_glyph_index,
            } => {
                coverage.index(glyph)?;
                Some(glyph.wrapping_add(*delta_glyph_index as u16))
            }
            SingleSubst::Format2 {
                coverage,
                substitute_glyph_array,
            } => {
                let index = coverage.index(glyph)?;
                substitute_glyph_array.get_item(usize::from(index))
            }
        }
    }
}

/// Glyph sequences selected by coverage index, the shared shape of lookup types 2 and 3.
struct CoveredSequences<'a> {
    scope: ReadScope<'a>,
    coverage: Coverage<'a>,
    sequence_offsets: ReadArray<'a, U16Be>,
}

impl<'a> CoveredSequences<'a> {
    fn validate(
        scope: ReadScope<'a>,
        valid: &Validator,
    ) -> Result<CoveredSequences<'a>, ValidationError> {
        let mut ctxt = scope.ctxt();
        let format = ctxt.read_u16be()?;
        valid.check(format == 1)?;
        let coverage_offset = usize::from(ctxt.read_u16be()?);
        let sequence_count = usize::from(ctxt.read_u16be()?);
        let sequence_offsets = ctxt.read_array::<U16Be>(sequence_count)?;
        let coverage = Coverage::validate(scope.offset(coverage_offset), valid)?;
        if valid.is_paranoid() {
            valid.check(sequence_count == coverage.count())?;
        }
        for offset in &sequence_offsets {
            let mut sequence_ctxt = scope.offset(usize::from(offset)).ctxt();
            let glyph_count = usize::from(sequence_ctxt.read_u16be()?);
            let glyphs = sequence_ctxt.read_array::<U16Be>(glyph_count)?;
            valid.check_glyphs(&glyphs)?;
        }
        Ok(CoveredSequences {
            scope,
            coverage,
            sequence_offsets,
        })
    }

    fn sequence(&self, glyph: u16) -> Result<Option<ReadArray<'a, U16Be>>, ParseError> {
        let index = match self.coverage.index(glyph) {
            Some(index) => usize::from(index),
            None => return Ok(None),
        };
        let offset = self
            .sequence_offsets
            .get_item(index)
            .ok_or(ParseError::BadIndex)?;
        let mut ctxt = self.scope.offset(usize::from(offset)).ctxt();
        let glyph_count = usize::from(ctxt.read_u16be()?);
        Ok(Some(ctxt.read_array::<U16Be>(glyph_count)?))
    }
}

/// Lookup type 2 subtable: one glyph replaced by a sequence of glyphs.
pub struct MultipleSubst<'a>(CoveredSequences<'a>);

impl<'a> MultipleSubst<'a> {
    pub fn validate(
        scope: ReadScope<'a>,
        valid: &Validator,
    ) -> Result<MultipleSubst<'a>, ValidationError> {
        CoveredSequences::validate(scope, valid).map(MultipleSubst)
    }

    /// The replacement sequence for `glyph`, `None` if the subtable does not cover it.
    pub fn apply_glyph(&self, glyph: u16) -> Result<Option<ReadArray<'a, U16Be>>, ParseError> {
        self.0.sequence(glyph)
    }
}

/// Lookup type 3 subtable: one glyph replaced by one of a set of alternates.
pub struct AlternateSubst<'a>(CoveredSequences<'a>);

impl<'a> AlternateSubst<'a> {
    pub fn validate(
        scope: ReadScope<'a>,
        valid: &Validator,
    ) -> Result<AlternateSubst<'a>, ValidationError> {
        CoveredSequences::validate(scope, valid).map(AlternateSubst)
    }

    /// The alternates available for `glyph`, `None` if the subtable does not cover it.
    pub fn alternates(&self, glyph: u16) -> Result<Option<ReadArray<'a, U16Be>>, ParseError> {
        self.0.sequence(glyph)
    }

    /// Replace `glyph` with the alternate picked by `choose` from the alternate set.
    ///
    /// Returns `None` if the glyph is not covered or `choose` picks an index that is out of
    /// range.
    pub fn apply_glyph(
        &self,
        glyph: u16,
        choose: impl FnOnce(&ReadArray<'a, U16Be>) -> usize,
    ) -> Result<Option<u16>, ParseError> {
        Ok(self
            .alternates(glyph)?
            .and_then(|alternates| alternates.get_item(choose(&alternates))))
    }
}

/// Lookup type 4 subtable.
pub struct LigatureSubst<'a> {
    scope: ReadScope<'a>,
    coverage: Coverage<'a>,
    ligature_set_offsets: ReadArray<'a, U16Be>,
}

impl<'a> LigatureSubst<'a> {
    pub fn validate(
        scope: ReadScope<'a>,
        valid: &Validator,
    ) -> Result<LigatureSubst<'a>, ValidationError> {
        let mut ctxt = scope.ctxt();
        let format = ctxt.read_u16be()?;
        valid.check(format == 1)?;
        let coverage_offset = usize::from(ctxt.read_u16be()?);
        let ligature_set_count = usize::from(ctxt.read_u16be()?);
        let ligature_set_offsets = ctxt.read_array::<U16Be>(ligature_set_count)?;
        let coverage = Coverage::validate(scope.offset(coverage_offset), valid)?;
        if valid.is_paranoid() {
            valid.check(ligature_set_count == coverage.count())?;
        }
        for set_offset in &ligature_set_offsets {
            let set_scope = scope.offset(usize::from(set_offset));
            let mut set_ctxt = set_scope.ctxt();
            let ligature_count = usize::from(set_ctxt.read_u16be()?);
            let ligature_offsets = set_ctxt.read_array::<U16Be>(ligature_count)?;
            for ligature_offset in &ligature_offsets {
                let mut ligature_ctxt = set_scope.offset(usize::from(ligature_offset)).ctxt();
                let ligature_glyph = ligature_ctxt.read_u16be()?;
                let component_count = usize::from(ligature_ctxt.read_u16be()?);
                valid.check(component_count > 0)?;
                let components = ligature_ctxt.read_array::<U16Be>(component_count - 1)?;
                valid.check_glyph(u32::from(ligature_glyph))?;
                valid.check_glyphs(&components)?;
            }
        }
        Ok(LigatureSubst {
            scope,
            coverage,
            ligature_set_offsets,
        })
    }

    /// Find the first ligature that starts at `glyphs[0]` and matches the glyphs after it.
    ///
    /// Returns the ligature glyph and the number of input glyphs it replaces.
    pub fn apply(&self, glyphs: &[u16]) -> Result<Option<(u16, usize)>, ParseError> {
        let first = match glyphs.first() {
            Some(&first) => first,
            None => return Ok(None),
        };
        let index = match self.coverage.index(first) {
            Some(index) => usize::from(index),
            None => return Ok(None),
        };
        let set_offset = self
            .ligature_set_offsets
            .get_item(index)
            .ok_or(ParseError::BadIndex)?;
        let set_scope = self.scope.offset(usize::from(set_offset));
        let mut set_ctxt = set_scope.ctxt();
        let ligature_count = usize::from(set_ctxt.read_u16be()?);
        let ligature_offsets = set_ctxt.read_array::<U16Be>(ligature_count)?;
        for ligature_offset in &ligature_offsets {
            let mut ctxt = set_scope.offset(usize::from(ligature_offset)).ctxt();
            let ligature_glyph = ctxt.read_u16be()?;
            let component_count = usize::from(ctxt.read_u16be()?);
            if component_count == 0 || component_count > glyphs.len() {
                continue;
            }
            let components = ctxt.read_array::<U16Be>(component_count - 1)?;
            if components.iter().eq(glyphs[1..component_count].iter().copied()) {
                return Ok(Some((ligature_glyph, component_count)));
            }
        }
        Ok(None)
    }
}

/// Lookup type 8 subtable.
pub struct ReverseChainSingleSubst<'a> {
    coverage: Coverage<'a>,
    substitute_glyph_array: ReadArray<'a, U16Be>,
}

impl<'a> ReverseChainSingleSubst<'a> {
    pub fn validate(
        scope: ReadScope<'a>,
        valid: &Validator,
    ) -> Result<ReverseChainSingleSubst<'a>, ValidationError> {
        let mut ctxt = scope.ctxt();
        let format = ctxt.read_u16be()?;
        valid.check(format == 1)?;
        let coverage_offset = usize::from(ctxt.read_u16be()?);
        let coverage = Coverage::validate(scope.offset(coverage_offset), valid)?;
        let backtrack_count = usize::from(ctxt.read_u16be()?);
        validate_coverage_offsets(&mut ctxt, scope, backtrack_count, valid)?;
        let lookahead_count = usize::from(ctxt.read_u16be()?);
        validate_coverage_offsets(&mut ctxt, scope, lookahead_count, valid)?;
        let glyph_count = usize::from(ctxt.read_u16be()?);
        let substitute_glyph_array = ctxt.read_array::<U16Be>(glyph_count)?;
        // Substitutes are selected by coverage index.
        if valid.is_default() {
            valid.check(glyph_count == coverage.count())?;
        }
        valid.check_glyphs(&substitute_glyph_array)?;
        Ok(ReverseChainSingleSubst {
            coverage,
            substitute_glyph_array,
        })
    }

    /// The replacement for `glyph` when the context matches.
    pub fn apply_glyph(&self, glyph: u16) -> Option<u16> {
        let index = self.coverage.index(glyph)?;
        self.substitute_glyph_array.get_item(usize::from(index))
    }
}

fn validate_single_subst(
    scope: ReadScope<'_>,
    _lookup_count: usize,
    valid: &Validator,
) -> Result<(), ValidationError> {
    SingleSubst::validate(scope, valid).map(drop)
}

fn validate_multiple_subst(
    scope: ReadScope<'_>,
    _lookup_count: usize,
    valid: &Validator,
) -> Result<(), ValidationError> {
    MultipleSubst::validate(scope, valid).map(drop)
}

fn validate_alternate_subst(
    scope: ReadScope<'_>,
    _lookup_count: usize,
    valid: &Validator,
) -> Result<(), ValidationError> {
    AlternateSubst::validate(scope, valid).map(drop)
}

fn validate_ligature_subst(
    scope: ReadScope<'_>,
    _lookup_count: usize,
    valid: &Validator,
) -> Result<(), ValidationError> {
    LigatureSubst::validate(scope, valid).map(drop)
}

fn validate_reverse_chain_single_subst(
    scope: ReadScope<'_>,
    _lookup_count: usize,
    valid: &Validator,
) -> Result<(), ValidationError> {
    ReverseChainSingleSubst::validate(scope, valid).map(drop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LayoutTable, Lookup};
    use crate::tests::{coverage_format1, coverage_format2, TableBuilder};
    use crate::validate::ValidationLevel;

    fn single_subst_format2(coverage: &[u16], substitutes: &[u16]) -> Vec<u8> {
        let mut w = TableBuilder::new();
        w.u16(2);
        let coverage_offset = w.placeholder16();
        w.u16(substitutes.len() as u16).u16s(substitutes);
        w.link16(coverage_offset, 0);
        w.bytes(&coverage_format1(coverage));
        w.into_inner()
    }

    #[test]
    fn single_subst_glyph_id_range() {
        let data = single_subst_format2(&[10], &[99]);
        let scope = ReadScope::new(&data);
        let subst = SingleSubst::validate(scope, &Validator::new(ValidationLevel::Tight, 100))
            .unwrap();
        assert_eq!(subst.apply_glyph(10), Some(99));
        assert_eq!(subst.apply_glyph(11), None);
        assert_eq!(
            SingleSubst::validate(scope, &Validator::new(ValidationLevel::Tight, 99)).err(),
            Some(ValidationError::InvalidGlyphId)
        );
        let default = Validator::new(ValidationLevel::Default, 99);
        assert!(SingleSubst::validate(scope, &default).is_ok());
    }

    fn single_subst_format1(coverage: &[u8], delta: i16) -> Vec<u8> {
        let mut w = TableBuilder::new();
        w.u16(1);
        let coverage_offset = w.placeholder16();
        w.i16(delta);
        w.link16(coverage_offset, 0);
        w.bytes(coverage);
        w.into_inner()
    }

    #[test]
    fn single_subst_delta() {
        let data = single_subst_format1(&coverage_format2(&[(5, 9)]), -5);
        let subst = SingleSubst::validate(
            ReadScope::new(&data),
            &Validator::new(ValidationLevel::Tight, 10),
        )
        .unwrap();
        assert_eq!(subst.apply_glyph(5), Some(0));
        assert_eq!(subst.apply_glyph(9), Some(4));
        assert_eq!(subst.apply_glyph(10), None);

        let data = single_subst_format1(&coverage_format2(&[(5, 9)]), 3);
        assert_eq!(
            SingleSubst::validate(
                ReadScope::new(&data),
                &Validator::new(ValidationLevel::Tight, 10)
            )
            .err(),
            Some(ValidationError::InvalidGlyphId)
        );
    }

    #[test]
    fn single_subst_delta_wraps() {
        let data = single_subst_format1(&coverage_format1(&[0, 1]), -1);
        let scope = ReadScope::new(&data);
        let subst =
            SingleSubst::validate(scope, &Validator::new(ValidationLevel::Default, 10)).unwrap();
        assert_eq!(subst.apply_glyph(0), Some(0xFFFF));
        assert_eq!(subst.apply_glyph(1), Some(0));
        assert_eq!(
            SingleSubst::validate(scope, &Validator::new(ValidationLevel::Tight, 10)).err(),
            Some(ValidationError::InvalidGlyphId)
        );
    }

    #[test]
    fn multiple_subst_sequence() {
        let mut w = TableBuilder::new();
        w.u16(1);
        let coverage_offset = w.placeholder16();
        w.u16(1);
        let sequence_offset = w.placeholder16();
        w.link16(coverage_offset, 0);
        w.bytes(&coverage_format1(&[4]));
        w.link16(sequence_offset, 0);
        w.u16(3).u16s(&[7, 8, 9]);
        let data = w.into_inner();
        let subst = MultipleSubst::validate(
            ReadScope::new(&data),
            &Validator::new(ValidationLevel::Paranoid, 10),
        )
        .unwrap();
        assert_eq!(subst.apply_glyph(4).unwrap().unwrap().to_vec(), vec![7, 8, 9]);
        assert!(subst.apply_glyph(5).unwrap().is_none());
    }

    #[test]
    fn alternate_subst_choice() {
        let mut w = TableBuilder::new();
        w.u16(1);
        let coverage_offset = w.placeholder16();
        w.u16(1);
        let set_offset = w.placeholder16();
        w.link16(coverage_offset, 0);
        w.bytes(&coverage_format1(&[4]));
        w.link16(set_offset, 0);
        w.u16(2).u16s(&[20, 21]);
        let data = w.into_inner();
        let subst = AlternateSubst::validate(
            ReadScope::new(&data),
            &Validator::new(ValidationLevel::Default, 10),
        )
        .unwrap();
        assert_eq!(subst.apply_glyph(4, |_| 1).unwrap(), Some(21));
        assert_eq!(subst.apply_glyph(4, |_| 2).unwrap(), None);
        assert_eq!(
            subst.apply_glyph(4, |alternates| alternates.len() - 2).unwrap(),
            Some(20)
        );
    }

    fn ligature_subst(ligature_glyph: u16) -> Vec<u8> {
        let mut w = TableBuilder::new();
        w.u16(1);
        let coverage_offset = w.placeholder16();
        w.u16(1);
        let set_offset = w.placeholder16();
        w.link16(coverage_offset, 0);
        w.bytes(&coverage_format1(&[1]));
        w.link16(set_offset, 0);
        let set_base = w.len();
        w.u16(1);
        let ligature_offset = w.placeholder16();
        w.link16(ligature_offset, set_base);
        w.u16(ligature_glyph).u16(3).u16s(&[2, 3]);
        w.into_inner()
    }

    #[test]
    fn ligature_subst_apply() {
        let data = ligature_subst(50);
        let subst = LigatureSubst::validate(
            ReadScope::new(&data),
            &Validator::new(ValidationLevel::Paranoid, 60),
        )
        .unwrap();
        assert_eq!(subst.apply(&[1, 2, 3, 4]).unwrap(), Some((50, 3)));
        assert_eq!(subst.apply(&[1, 2]).unwrap(), None);
        assert_eq!(subst.apply(&[1, 3, 2]).unwrap(), None);
        assert_eq!(subst.apply(&[]).unwrap(), None);
    }

    #[test]
    fn ligature_glyph_checked_when_tight() {
        let data = ligature_subst(500);
        let scope = ReadScope::new(&data);
        let default = Validator::new(ValidationLevel::Default, 60);
        assert!(LigatureSubst::validate(scope, &default).is_ok());
        assert_eq!(
            LigatureSubst::validate(scope, &Validator::new(ValidationLevel::Tight, 60)).err(),
            Some(ValidationError::InvalidGlyphId)
        );
    }

    #[test]
    fn reverse_chain_substitute_count() {
        let mut w = TableBuilder::new();
        w.u16(1);
        let coverage_offset = w.placeholder16();
        w.u16(0).u16(0).u16(1).u16(30);
        w.link16(coverage_offset, 0);
        w.bytes(&coverage_format1(&[5, 6]));
        let data = w.into_inner();
        assert_eq!(
            ReverseChainSingleSubst::validate(
                ReadScope::new(&data),
                &Validator::new(ValidationLevel::Default, 60)
            )
            .err(),
            Some(ValidationError::InvalidData)
        );
    }

    fn lookup(lookup_type: u16, subtable: &[u8]) -> Vec<u8> {
        let mut w = TableBuilder::new();
        w.u16(lookup_type).u16(0).u16(1);
        let subtable_offset = w.placeholder16();
        w.link16(subtable_offset, 0);
        w.bytes(subtable);
        w.into_inner()
    }

    #[test]
    fn lookup_type_out_of_range() {
        let subtable = single_subst_format2(&[1], &[2]);
        let valid = Validator::new(ValidationLevel::None, 10);
        for lookup_type in [0, 9] {
            let data = lookup(lookup_type, &subtable);
            assert_eq!(
                Lookup::validate::<GSUB>(ReadScope::new(&data), 1, &valid).err(),
                Some(ValidationError::InvalidData)
            );
        }
        let data = lookup(1, &subtable);
        let lookup = Lookup::validate::<GSUB>(ReadScope::new(&data), 1, &valid).unwrap();
        assert_eq!(lookup.lookup_type(), 1);
        assert_eq!(lookup.subtable_count(), 1);
    }

    fn extension(extension_lookup_type: u16, subtable: &[u8]) -> Vec<u8> {
        let mut w = TableBuilder::new();
        w.u16(1).u16(extension_lookup_type);
        let offset = w.placeholder32();
        w.link32(offset, 0);
        w.bytes(subtable);
        w.into_inner()
    }

    #[test]
    fn extension_dispatch() {
        let valid = Validator::new(ValidationLevel::Tight, 50);
        let data = extension(1, &single_subst_format2(&[1], &[2]));
        assert!(validate_extension::<GSUB>(ReadScope::new(&data), 0, &valid).is_ok());

        // The wrapped subtable is validated as the extension's lookup type
        let data = extension(1, &single_subst_format2(&[1], &[60]));
        assert_eq!(
            validate_extension::<GSUB>(ReadScope::new(&data), 0, &valid).err(),
            Some(ValidationError::InvalidGlyphId)
        );

        let nested = extension(1, &single_subst_format2(&[1], &[2]));
        for bad_type in [0, 7, 9] {
            let data = extension(bad_type, &nested);
            assert_eq!(
                validate_extension::<GSUB>(ReadScope::new(&data), 0, &valid).err(),
                Some(ValidationError::InvalidData)
            );
        }
    }

    #[test]
    fn context_rule_skips_input_glyphs() {
        // Format 1 with a rule of 3 input glyphs and a lookup record referring to lookup 0
        let mut w = TableBuilder::new();
        w.u16(1);
        let coverage_offset = w.placeholder16();
        w.u16(1);
        let set_offset = w.placeholder16();
        w.link16(coverage_offset, 0);
        w.bytes(&coverage_format1(&[1]));
        w.link16(set_offset, 0);
        let set_base = w.len();
        w.u16(1);
        let rule_offset = w.placeholder16();
        w.link16(rule_offset, set_base);
        w.u16(3).u16(1).u16s(&[2, 3]).u16(2).u16(0);
        let data = w.into_inner();
        let scope = ReadScope::new(&data);
        let valid = Validator::new(ValidationLevel::Tight, 10);
        assert!(validate_context(scope, 1, &valid).is_ok());
        // Lookup 0 does not exist in an empty lookup list
        assert_eq!(
            validate_context(scope, 0, &valid).err(),
            Some(ValidationError::InvalidData)
        );
        // Input glyphs are glyph ids
        assert_eq!(
            validate_context(scope, 1, &Validator::new(ValidationLevel::Tight, 3)).err(),
            Some(ValidationError::InvalidGlyphId)
        );
    }

    #[test]
    fn chain_context_format3_sequence_index() {
        let mut w = TableBuilder::new();
        w.u16(3).u16(0).u16(1);
        let input_coverage = w.placeholder16();
        w.u16(0).u16(1).u16(1).u16(0);
        w.link16(input_coverage, 0);
        w.bytes(&coverage_format1(&[1]));
        let data = w.into_inner();
        let valid = Validator::new(ValidationLevel::Default, 10);
        // Sequence index 1 is past the single input glyph
        assert_eq!(
            validate_chain_context(ReadScope::new(&data), 1, &valid).err(),
            Some(ValidationError::InvalidData)
        );
    }

    #[test]
    fn table_version() {
        let mut w = TableBuilder::new();
        w.u16(1).u16(0).u16(0).u16(0).u16(0);
        let data = w.into_inner();
        let valid = Validator::new(ValidationLevel::Paranoid, 10);
        let table = LayoutTable::<GSUB>::validate(ReadScope::new(&data), &valid).unwrap();
        assert_eq!(table.lookup_count().unwrap(), 0);

        let mut w = TableBuilder::new();
        w.u16(1).u16(2).u16(0).u16(0).u16(0);
        let data = w.into_inner();
        assert_eq!(
            LayoutTable::<GSUB>::validate(ReadScope::new(&data), &valid).err(),
            Some(ValidationError::InvalidFormat)
        );

        // Version 1.1 carries a 32-bit feature variations offset
        let mut w = TableBuilder::new();
        w.u16(1).u16(1).u16(0).u16(0).u16(0).u16(0);
        let data = w.into_inner();
        assert_eq!(
            LayoutTable::<GSUB>::validate(ReadScope::new(&data), &valid).err(),
            Some(ValidationError::TooShort)
        );
    }
}
