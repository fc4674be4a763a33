#[allow(dead_code)]
mod common;

use otvalid::binary::read::ReadScope;
use otvalid::error::ValidationError;
use otvalid::tables::cmap::{CharMap, CmapSubtable};
use otvalid::validate::{ValidationLevel, Validator};

use crate::common::{cmap_format12, cmap_format4, TableBuilder};

const LEVELS: [ValidationLevel; 4] = [
    ValidationLevel::None,
    ValidationLevel::Default,
    ValidationLevel::Tight,
    ValidationLevel::Paranoid,
];

/// One well formed subtable of each format, mapping into a font of 20 glyphs.
fn subtables() -> Vec<Vec<u8>> {
    let mut format0 = TableBuilder::new();
    let mut glyph_ids = [0; 256];
    glyph_ids[0x20] = 3;
    glyph_ids[0x7E] = 4;
    format0.u16(0).u16(262).u16(0).bytes(&glyph_ids);

    let mut format2 = TableBuilder::new();
    let mut keys = [0; 256];
    keys[0x88] = 8;
    format2.u16(2).u16(538).u16(0).u16s(&keys);
    format2.u16(0x41).u16(1).i16(0).u16(10);
    format2.u16(0x80).u16(1).i16(1).u16(4);
    format2.u16s(&[7, 8]);

    let mut format6 = TableBuilder::new();
    format6.u16(6).u16(16).u16(0).u16(0x30).u16(3).u16s(&[1, 0, 2]);

    let mut format8 = TableBuilder::new();
    let mut is32 = vec![0; 8192];
    is32[0xD800 >> 3] = 0x80;
    is32[0xDC00 >> 3] = 0x80;
    format8.u16(8).u16(0).u32(8208 + 24).u32(0).bytes(&is32).u32(2);
    format8.u32(0x41).u32(0x42).u32(5);
    format8.u32(0xD800_DC00).u32(0xD800_DC00).u32(9);

    let mut format10 = TableBuilder::new();
    format10.u16(10).u16(0).u32(24).u32(0).u32(0x10400).u32(2).u16s(&[11, 12]);

    vec![
        format0.into_inner(),
        format2.into_inner(),
        cmap_format4(&[(0x41, 0x43, -0x40), (0x61, 0x61, -0x5F)]),
        format6.into_inner(),
        format8.into_inner(),
        format10.into_inner(),
        cmap_format12(&[(0x20, 0x21, 1), (0x1F600, 0x1F603, 15)]),
    ]
}

#[test]
fn delta_segment_maps_codes_to_themselves() {
    let data = cmap_format4(&[(65, 70, 0)]);
    let valid = Validator::new(ValidationLevel::Default, 100);
    let subtable = CmapSubtable::validate(ReadScope::new(&data), &valid).unwrap();
    assert_eq!(subtable.char_index(65), 65);
    assert_eq!(subtable.char_index(70), 70);
    assert_eq!(subtable.char_index(64), 0);
    assert_eq!(subtable.char_index(71), 0);
}

#[test]
fn every_format_validates_at_every_level() {
    for data in subtables() {
        for level in LEVELS {
            let valid = Validator::new(level, 20);
            let result = CmapSubtable::validate(ReadScope::new(&data), &valid);
            assert!(result.is_ok(), "format {} at {:?}", data[1], level);
        }
    }
}

#[test]
fn char_next_enumerates_mapped_codes_once_in_order() {
    let valid = Validator::new(ValidationLevel::Paranoid, 20);
    let expected: [&[(u32, u16)]; 7] = [
        &[(0x20, 3), (0x7E, 4)],
        &[(0x41, 7), (0x8880, 9)],
        &[(0x41, 1), (0x42, 2), (0x43, 3), (0x61, 2)],
        &[(0x30, 1), (0x32, 2)],
        &[(0x41, 5), (0x42, 6), (0xD800_DC00, 9)],
        &[(0x10400, 11), (0x10401, 12)],
        &[
            (0x20, 1),
            (0x21, 2),
            (0x1F600, 15),
            (0x1F601, 16),
            (0x1F602, 17),
            (0x1F603, 18),
        ],
    ];
    for (data, expected) in subtables().iter().zip(expected) {
        let subtable = CmapSubtable::validate(ReadScope::new(data), &valid).unwrap();
        let mut mapped = Vec::new();
        let mut char_code = 0;
        while let Some((next, glyph)) = subtable.char_next(char_code) {
            assert!(next > char_code);
            assert_eq!(subtable.char_index(next), glyph);
            mapped.push((next, glyph));
            char_code = next;
        }
        assert_eq!(mapped, expected, "format {}", subtable.format());
        assert_eq!(subtable.mappings().collect::<Vec<_>>(), mapped);
    }
}

#[test]
fn truncation_is_too_short() {
    for data in subtables() {
        for level in LEVELS {
            let valid = Validator::new(level, 20);
            for len in 0..data.len() {
                assert_eq!(
                    CmapSubtable::validate(ReadScope::new(&data[..len]), &valid).err(),
                    Some(ValidationError::TooShort),
                    "format {} truncated to {} bytes at {:?}",
                    data[1],
                    len,
                    level
                );
            }
        }
    }
}

#[test]
fn strictness_is_monotonic() {
    // Each table is rejected from some level upwards, and accepted below it.
    let reserved_set = {
        let mut data = cmap_format12(&[(0x20, 0x21, 1)]);
        data[3] = 1;
        data
    };
    let glyph_out_of_range = cmap_format12(&[(0x20, 0x21, 19)]);
    let overlapping = cmap_format12(&[(0x20, 0x30, 1), (0x25, 0x26, 1)]);
    let unterminated = {
        let mut data = cmap_format4(&[(0x41, 0x42, 0)]);
        data[16..18].copy_from_slice(&[0xFF, 0xFE]);
        data[22..24].copy_from_slice(&[0xFF, 0xFE]);
        data
    };
    for data in [reserved_set, glyph_out_of_range, overlapping, unterminated] {
        let results = LEVELS
            .iter()
            .map(|&level| {
                let valid = Validator::new(level, 20);
                CmapSubtable::validate(ReadScope::new(&data), &valid).is_ok()
            })
            .collect::<Vec<_>>();
        let first_rejected = results.iter().position(|ok| !ok).unwrap();
        assert!(first_rejected > 0);
        assert!(results[..first_rejected].iter().all(|&ok| ok));
        assert!(results[first_rejected..].iter().all(|&ok| !ok));
    }
}

#[test]
fn format2_sub_header_in_key_region_is_rejected() {
    let mut w = TableBuilder::new();
    let mut keys = [0; 256];
    keys[0x88] = 8;
    w.u16(2).u16(538).u16(0).u16s(&keys);
    // A range offset of 2 points back into the sub-headers.
    w.u16(0x41).u16(1).i16(0).u16(2);
    w.u16(0x80).u16(1).i16(1).u16(4);
    w.u16s(&[7, 8]);
    let data = w.into_inner();
    let valid = Validator::new(ValidationLevel::None, 20);
    assert_eq!(
        CmapSubtable::validate(ReadScope::new(&data), &valid).err(),
        Some(ValidationError::InvalidData)
    );
}

#[test]
fn group_formats_reach_the_end_of_the_code_space() {
    let data = cmap_format12(&[(0x10, 0x10, 1), (0xFFFF_FFFF, 0xFFFF_FFFF, 2)]);
    let valid = Validator::new(ValidationLevel::Paranoid, 20);
    let subtable = CmapSubtable::validate(ReadScope::new(&data), &valid).unwrap();
    assert_eq!(subtable.char_next(0x10), Some((0xFFFF_FFFF, 2)));
    assert_eq!(subtable.char_next(0xFFFF_FFFF), None);
    assert_eq!(
        subtable.mappings().collect::<Vec<_>>(),
        vec![(0x10, 1), (0xFFFF_FFFF, 2)]
    );
}
