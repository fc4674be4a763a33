/// Builds big-endian table data for tests.
///
/// Offsets are usually unknown when a field is written, so `placeholder16`/`placeholder32`
/// reserve the field and `patch16`/`patch32` fill it in once the target has been written.
#[derive(Debug, Default)]
pub struct TableBuilder {
    data: Vec<u8>,
}

impl TableBuilder {
    pub fn new() -> Self {
        TableBuilder {
            data: Vec::with_capacity(256),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.data.push(value);
        self
    }

    pub fn u16(&mut self, value: u16) -> &mut Self {
        self.data.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn i16(&mut self, value: i16) -> &mut Self {
        self.data.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.data.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn u16s(&mut self, values: &[u16]) -> &mut Self {
        for &value in values {
            self.u16(value);
        }
        self
    }

    pub fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.data.extend_from_slice(bytes);
        self
    }

    pub fn tag(&mut self, tag: &[u8; 4]) -> &mut Self {
        self.bytes(tag)
    }

    /// Reserve a 16-bit field, returning its position.
    pub fn placeholder16(&mut self) -> usize {
        let pos = self.len();
        self.u16(0);
        pos
    }

    /// Reserve a 32-bit field, returning its position.
    pub fn placeholder32(&mut self) -> usize {
        let pos = self.len();
        self.u32(0);
        pos
    }

    pub fn patch16(&mut self, pos: usize, value: u16) {
        self.data[pos..pos + 2].copy_from_slice(&value.to_be_bytes());
    }

    pub fn patch32(&mut self, pos: usize, value: u32) {
        self.data[pos..pos + 4].copy_from_slice(&value.to_be_bytes());
    }

    /// Fill the 16-bit field at `pos` with the distance from `base` to the current end.
    pub fn link16(&mut self, pos: usize, base: usize) {
        let offset = u16::try_from(self.len() - base).expect("offset too large");
        self.patch16(pos, offset);
    }

    /// Fill the 32-bit field at `pos` with the distance from `base` to the current end.
    pub fn link32(&mut self, pos: usize, base: usize) {
        let offset = u32::try_from(self.len() - base).expect("offset too large");
        self.patch32(pos, offset);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

/// A format 1 coverage table listing `glyphs`.
pub fn coverage_format1(glyphs: &[u16]) -> Vec<u8> {
    let mut w = TableBuilder::new();
    w.u16(1).u16(glyphs.len() as u16).u16s(glyphs);
    w.into_inner()
}

/// A format 2 coverage table made of inclusive `(start, end)` ranges.
pub fn coverage_format2(ranges: &[(u16, u16)]) -> Vec<u8> {
    let mut w = TableBuilder::new();
    w.u16(2).u16(ranges.len() as u16);
    let mut index = 0;
    for &(start, end) in ranges {
        w.u16(start).u16(end).u16(index);
        index += end.wrapping_sub(start).wrapping_add(1);
    }
    w.into_inner()
}

/// A format 4 cmap subtable from `(start, end, delta)` segments with zero range offsets.
///
/// The 0xFFFF terminator segment is appended and the search fields are computed.
pub fn cmap_format4(segments: &[(u16, u16, i16)]) -> Vec<u8> {
    let mut segments = segments.to_vec();
    segments.push((0xFFFF, 0xFFFF, 1));
    let seg_count = segments.len() as u16;
    let mut search_range = 1u16;
    let mut entry_selector = 0u16;
    while search_range * 2 <= seg_count {
        search_range *= 2;
        entry_selector += 1;
    }
    let search_range = search_range * 2;
    let length = 16 + 8 * seg_count;

    let mut w = TableBuilder::new();
    w.u16(4)
        .u16(length)
        .u16(0)
        .u16(seg_count * 2)
        .u16(search_range)
        .u16(entry_selector)
        .u16(seg_count * 2 - search_range);
    for &(_, end, _) in &segments {
        w.u16(end);
    }
    w.u16(0);
    for &(start, _, _) in &segments {
        w.u16(start);
    }
    for &(_, _, delta) in &segments {
        w.i16(delta);
    }
    for _ in &segments {
        w.u16(0);
    }
    w.into_inner()
}

/// A format 12 cmap subtable from `(start, end, start_glyph)` groups.
pub fn cmap_format12(groups: &[(u32, u32, u32)]) -> Vec<u8> {
    let mut w = TableBuilder::new();
    w.u16(12)
        .u16(0)
        .u32(16 + 12 * groups.len() as u32)
        .u32(0)
        .u32(groups.len() as u32);
    for &(start, end, glyph) in groups {
        w.u32(start).u32(end).u32(glyph);
    }
    w.into_inner()
}

/// A `JSTF` table with one `latn` script whose default language system has one priority.
///
/// The priority's shrinkage enables GPOS lookup `gpos_lookup`.
pub fn jstf_enabling_gpos_lookup(gpos_lookup: u16) -> Vec<u8> {
    let mut w = TableBuilder::new();
    w.u16(1).u16(0).u16(1).tag(b"latn");
    let script = w.placeholder16();

    w.link16(script, 0);
    let script_base = w.len();
    let extender = w.placeholder16();
    let default_lang_sys = w.placeholder16();
    w.u16(0);
    w.link16(extender, script_base);
    w.u16(2).u16s(&[3, 4]);

    w.link16(default_lang_sys, script_base);
    let lang_sys_base = w.len();
    w.u16(1);
    let priority = w.placeholder16();

    w.link16(priority, lang_sys_base);
    let priority_base = w.len();
    w.u16(0).u16(0);
    let enable_gpos = w.placeholder16();
    w.u16s(&[0; 7]);
    w.link16(enable_gpos, priority_base);
    w.u16(1).u16(gpos_lookup);
    w.into_inner()
}

/// A `GPOS` table with `lookup_count` empty single adjustment lookups.
pub fn gpos_with_lookups(lookup_count: u16) -> Vec<u8> {
    let mut w = TableBuilder::new();
    w.u16(1).u16(0).u16(0).u16(0);
    let lookup_list = w.placeholder16();
    w.link16(lookup_list, 0);
    let lookup_list_base = w.len();
    w.u16(lookup_count);
    let lookups = (0..lookup_count)
        .map(|_| w.placeholder16())
        .collect::<Vec<_>>();
    for lookup in lookups {
        w.link16(lookup, lookup_list_base);
        w.u16(1).u16(0).u16(0);
    }
    w.into_inner()
}

/// An sfnt font with a table directory for `tables`, stored in order after the directory.
pub fn font_directory(tables: &[(u32, &[u8])]) -> Vec<u8> {
    let mut w = TableBuilder::new();
    w.u32(0x00010000).u16(tables.len() as u16).u16(0).u16(0).u16(0);
    let offsets = tables
        .iter()
        .map(|&(tag, data)| {
            w.u32(tag).u32(0);
            let offset = w.placeholder32();
            w.u32(data.len() as u32);
            offset
        })
        .collect::<Vec<_>>();
    for (&(_, data), pos) in tables.iter().zip(offsets) {
        w.link32(pos, 0);
        w.bytes(data);
    }
    w.into_inner()
}

/// A version 0.5 `maxp` table.
pub fn maxp(num_glyphs: u16) -> Vec<u8> {
    let mut w = TableBuilder::new();
    w.u32(0x00005000).u16(num_glyphs);
    w.into_inner()
}

/// A `cmap` table with a single Windows Unicode BMP subtable.
pub fn cmap_with_subtable(subtable: &[u8]) -> Vec<u8> {
    let mut w = TableBuilder::new();
    w.u16(0).u16(1).u16(3).u16(1).u32(12).bytes(subtable);
    w.into_inner()
}
