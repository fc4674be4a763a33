//! Validation of the `JSTF` table.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/jstf>
//!
//! Justification data refers to lookups in `GSUB` and `GPOS` by index, so those tables must be
//! validated first and passed in. An absent table has no lookups, which makes any reference to
//! it invalid.

use log::debug;

use crate::binary::read::{ReadArray, ReadCtxt, ReadScope};
use crate::binary::U16Be;
use crate::error::{ParseError, ValidationError};
use crate::layout::{self, optional_offset, LayoutTable, Lookup, TagOffsetRecord, GPOS, GSUB};
use crate::validate::Validator;

/// Justification table
pub struct JstfTable<'a> {
    scope: ReadScope<'a>,
    jstf_script_records: ReadArray<'a, TagOffsetRecord>,
}

pub struct JstfScript<'a> {
    scope: ReadScope<'a>,
    extender_glyphs: Option<ReadArray<'a, U16Be>>,
    default_lang_sys_offset: u16,
    lang_sys_records: ReadArray<'a, TagOffsetRecord>,
}

/// The justification priorities of a language system, most preferred first.
pub struct JstfLangSys<'a> {
    scope: ReadScope<'a>,
    priority_offsets: ReadArray<'a, U16Be>,
}

pub struct JstfPriority<'a> {
    pub shrinkage: JstfAdjustment<'a>,
    pub extension: JstfAdjustment<'a>,
}

/// Lookup changes that shrink or extend a line.
pub struct JstfAdjustment<'a> {
    pub enable_gsub: Option<ReadArray<'a, U16Be>>,
    pub disable_gsub: Option<ReadArray<'a, U16Be>>,
    pub enable_gpos: Option<ReadArray<'a, U16Be>>,
    pub disable_gpos: Option<ReadArray<'a, U16Be>>,
    pub jstf_max: Option<JstfMax<'a>>,
}

/// Positioning lookups private to the justification table.
pub struct JstfMax<'a> {
    scope: ReadScope<'a>,
    lookup_offsets: ReadArray<'a, U16Be>,
}

/// Lookup counts of the layout tables a `JSTF` table refers to.
#[derive(Copy, Clone)]
struct LookupCounts {
    gsub: usize,
    gpos: usize,
}

impl<'a> JstfTable<'a> {
    pub fn validate(
        scope: ReadScope<'a>,
        gsub: Option<&LayoutTable<'_, GSUB>>,
        gpos: Option<&LayoutTable<'_, GPOS>>,
        valid: &Validator,
    ) -> Result<JstfTable<'a>, ValidationError> {
        let mut ctxt = scope.ctxt();
        let major_version = ctxt.read_u16be()?;
        let minor_version = ctxt.read_u16be()?;
        ctxt.check_version(major_version == 1 && minor_version == 0)?;
        let jstf_script_count = usize::from(ctxt.read_u16be()?);
        let jstf_script_records = ctxt.read_array::<TagOffsetRecord>(jstf_script_count)?;

        let counts = LookupCounts {
            gsub: layout::lookup_count(gsub)?,
            gpos: layout::lookup_count(gpos)?,
        };
        for record in &jstf_script_records {
            JstfScript::validate(scope.offset(usize::from(record.offset)), counts, valid)?;
        }

        debug!(
            "JSTF: {} scripts against {} GSUB and {} GPOS lookups",
            jstf_script_count, counts.gsub, counts.gpos
        );
        Ok(JstfTable {
            scope,
            jstf_script_records,
        })
    }

    pub fn script_tags(&self) -> impl Iterator<Item = u32> + 'a {
        self.jstf_script_records.iter().map(|record| record.tag)
    }

    pub fn find_script(&self, script_tag: u32) -> Result<Option<JstfScript<'a>>, ParseError> {
        self.jstf_script_records
            .iter()
            .find(|record| record.tag == script_tag)
            .map(|record| JstfScript::read(self.scope.offset(usize::from(record.offset))))
            .transpose()
    }
}

impl<'a> JstfScript<'a> {
    fn read(scope: ReadScope<'a>) -> Result<JstfScript<'a>, ParseError> {
        let mut ctxt = scope.ctxt();
        let extender_glyph_offset = ctxt.read_u16be()?;
        let default_lang_sys_offset = ctxt.read_u16be()?;
        let lang_sys_count = usize::from(ctxt.read_u16be()?);
        let lang_sys_records = ctxt.read_array::<TagOffsetRecord>(lang_sys_count)?;
        let extender_glyphs = optional_offset(scope, extender_glyph_offset)
            .map(|extender_scope| {
                let mut extender_ctxt = extender_scope.ctxt();
                let glyph_count = usize::from(extender_ctxt.read_u16be()?);
                extender_ctxt.read_array::<U16Be>(glyph_count)
            })
            .transpose()?;
        Ok(JstfScript {
            scope,
            extender_glyphs,
            default_lang_sys_offset,
            lang_sys_records,
        })
    }

    fn validate(
        scope: ReadScope<'a>,
        counts: LookupCounts,
        valid: &Validator,
    ) -> Result<(), ValidationError> {
        let script = JstfScript::read(scope)?;
        if let Some(extender_glyphs) = &script.extender_glyphs {
            valid.check_glyphs(extender_glyphs)?;
        }
        if let Some(lang_sys_scope) = optional_offset(scope, script.default_lang_sys_offset) {
            JstfLangSys::validate(lang_sys_scope, counts, valid)?;
        }
        for record in &script.lang_sys_records {
            JstfLangSys::validate(scope.offset(usize::from(record.offset)), counts, valid)?;
        }
        Ok(())
    }

    /// Glyphs that may be inserted to extend a line.
    pub fn extender_glyphs(&self) -> Option<&ReadArray<'a, U16Be>> {
        self.extender_glyphs.as_ref()
    }

    pub fn default_lang_sys(&self) -> Result<Option<JstfLangSys<'a>>, ParseError> {
        optional_offset(self.scope, self.default_lang_sys_offset)
            .map(JstfLangSys::read)
            .transpose()
    }

    pub fn find_lang_sys(
        &self,
        lang_sys_tag: u32,
    ) -> Result<Option<JstfLangSys<'a>>, ParseError> {
        self.lang_sys_records
            .iter()
            .find(|record| record.tag == lang_sys_tag)
            .map(|record| JstfLangSys::read(self.scope.offset(usize::from(record.offset))))
            .transpose()
    }
}

impl<'a> JstfLangSys<'a> {
    fn read(scope: ReadScope<'a>) -> Result<JstfLangSys<'a>, ParseError> {
        let mut ctxt = scope.ctxt();
        let priority_count = usize::from(ctxt.read_u16be()?);
        let priority_offsets = ctxt.read_array::<U16Be>(priority_count)?;
        Ok(JstfLangSys {
            scope,
            priority_offsets,
        })
    }

    fn validate(
        scope: ReadScope<'a>,
        counts: LookupCounts,
        valid: &Validator,
    ) -> Result<(), ValidationError> {
        let lang_sys = JstfLangSys::read(scope)?;
        for offset in &lang_sys.priority_offsets {
            JstfPriority::validate(scope.offset(usize::from(offset)), counts, valid)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.priority_offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.priority_offsets.is_empty()
    }

    pub fn priority(&self, index: usize) -> Result<JstfPriority<'a>, ParseError> {
        let offset = self.priority_offsets.read_item(index)?;
        JstfPriority::read(self.scope.offset(usize::from(offset)))
    }
}

impl<'a> JstfPriority<'a> {
    fn read(scope: ReadScope<'a>) -> Result<JstfPriority<'a>, ParseError> {
        let mut ctxt = scope.ctxt();
        let shrinkage = JstfAdjustment::read(scope, &mut ctxt)?;
        let extension = JstfAdjustment::read(scope, &mut ctxt)?;
        Ok(JstfPriority {
            shrinkage,
            extension,
        })
    }

    fn validate(
        scope: ReadScope<'a>,
        counts: LookupCounts,
        valid: &Validator,
    ) -> Result<(), ValidationError> {
        let priority = JstfPriority::read(scope)?;
        priority.shrinkage.validate(counts, valid)?;
        priority.extension.validate(counts, valid)
    }
}

impl<'a> JstfAdjustment<'a> {
    /// Read the five offsets of an adjustment from `ctxt`, each relative to `scope`.
    fn read(scope: ReadScope<'a>, ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let enable_gsub_offset = ctxt.read_u16be()?;
        let disable_gsub_offset = ctxt.read_u16be()?;
        let enable_gpos_offset = ctxt.read_u16be()?;
        let disable_gpos_offset = ctxt.read_u16be()?;
        let jstf_max_offset = ctxt.read_u16be()?;
        Ok(JstfAdjustment {
            enable_gsub: read_mod_list(scope, enable_gsub_offset)?,
            disable_gsub: read_mod_list(scope, disable_gsub_offset)?,
            enable_gpos: read_mod_list(scope, enable_gpos_offset)?,
            disable_gpos: read_mod_list(scope, disable_gpos_offset)?,
            jstf_max: optional_offset(scope, jstf_max_offset)
                .map(JstfMax::read)
                .transpose()?,
        })
    }

    fn validate(&self, counts: LookupCounts, valid: &Validator) -> Result<(), ValidationError> {
        let mod_lists = [
            (&self.enable_gsub, counts.gsub),
            (&self.disable_gsub, counts.gsub),
            (&self.enable_gpos, counts.gpos),
            (&self.disable_gpos, counts.gpos),
        ];
        for (mod_list, lookup_count) in mod_lists {
            for lookup_index in mod_list.iter().flatten() {
                valid.check_index(lookup_index, lookup_count)?;
            }
        }
        if let Some(jstf_max) = &self.jstf_max {
            for offset in &jstf_max.lookup_offsets {
                Lookup::validate::<GPOS>(
                    jstf_max.scope.offset(usize::from(offset)),
                    counts.gpos,
                    valid,
                )?;
            }
        }
        Ok(())
    }
}

fn read_mod_list(
    scope: ReadScope<'_>,
    offset: u16,
) -> Result<Option<ReadArray<'_, U16Be>>, ParseError> {
    optional_offset(scope, offset)
        .map(|mod_list_scope| {
            let mut ctxt = mod_list_scope.ctxt();
            let lookup_count = usize::from(ctxt.read_u16be()?);
            ctxt.read_array::<U16Be>(lookup_count)
        })
        .transpose()
}

impl<'a> JstfMax<'a> {
    fn read(scope: ReadScope<'a>) -> Result<JstfMax<'a>, ParseError> {
        let mut ctxt = scope.ctxt();
        let lookup_count = usize::from(ctxt.read_u16be()?);
        let lookup_offsets = ctxt.read_array::<U16Be>(lookup_count)?;
        Ok(JstfMax {
            scope,
            lookup_offsets,
        })
    }

    pub fn len(&self) -> usize {
        self.lookup_offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup_offsets.is_empty()
    }

    pub fn lookup(&self, index: usize) -> Result<Lookup<'a>, ParseError> {
        let offset = self.lookup_offsets.read_item(index)?;
        self.scope.offset(usize::from(offset)).read::<Lookup<'_>>()
    }
}
