//! Decodes `vkCreateDescriptorUpdateTemplate` / `vkUpdateDescriptorSetWithTemplate` arguments out
//! of memory laid out the way a capture observes it.

use gapit_struct_decode::catalog;
use gapit_struct_decode::{
    decode, Architecture, ByteSource, CaptureMemory, DecodeError, ReadError, RecordArray, Schema,
};

const CREATE_INFO_ADDR: u64 = 0x7f3a_0000_1000;
const ENTRIES_ADDR: u64 = 0x7f3a_0000_2000;
const TEMPLATE_HANDLE_ADDR: u64 = 0x7f3a_0000_3000;

const CREATE_INFO_ADDR_32: u64 = 0x0804_1000;
const ENTRIES_ADDR_32: u64 = 0x0804_2000;

const STRUCTURE_TYPE: u64 = 0x2a;
const SET_LAYOUT: u64 = 0x0000_5555_0000_0011;

/// `(dstBinding, dstArrayElement, descriptorCount, descriptorType, offset, stride)`.
const ENTRIES: [(u64, u64, u64, u64, u64, u64); 4] = [
    (0, 0, 3, 3, 0, 24),
    (0, 5, 1, 3, 3 * 24, 24),
    (2, 1, 2, 6, 256, 24),
    (2, 0, 1, 6, 512, 24),
];

/// Serializes `values` at the offsets `schema` resolves to. Unnamed fields (padding) are left as
/// 0xcd so stray reads of padding show up.
fn encode(schema: &Schema, arch: &Architecture, values: &[(&str, u64)]) -> Vec<u8> {
    let layout = schema.layout(Some(arch)).unwrap();
    let mut out = vec![0xcd; layout.span as usize];
    for (name, value) in values {
        let id = schema.field_id(name).unwrap();
        let slot = layout.fields[id.index()];
        let start = slot.offset as usize;
        out[start..start + slot.width].copy_from_slice(&value.to_le_bytes()[..slot.width]);
    }
    out
}

fn capture(arch: &Architecture, create_info_addr: u64, entries_addr: u64) -> CaptureMemory {
    let mut mem = CaptureMemory::new();

    let create_info = encode(
        &catalog::descriptor_update_template_create_info(),
        arch,
        &[
            ("sType", STRUCTURE_TYPE),
            ("pNext", 0),
            ("flags", 0),
            ("descriptorUpdateEntryCount", ENTRIES.len() as u64),
            ("pDescriptorUpdateEntries", entries_addr),
            ("templateType", 0),
            ("descriptorSetLayout", SET_LAYOUT),
            ("pipelineBindPoint", 0),
            ("pipelineLayout", 0),
            ("set", 0),
        ],
    );
    mem.observe(create_info_addr, &create_info).unwrap();

    let entry_schema = catalog::descriptor_update_template_entry();
    let stride = entry_schema.stride(Some(arch)).unwrap();
    for (i, &(binding, element, count, ty, offset, stride_field)) in ENTRIES.iter().enumerate() {
        let bytes = encode(
            &entry_schema,
            arch,
            &[
                ("dstBinding", binding),
                ("dstArrayElement", element),
                ("descriptorCount", count),
                ("descriptorType", ty),
                ("offset", offset),
                ("stride", stride_field),
            ],
        );
        mem.observe(entries_addr + i as u64 * stride, &bytes).unwrap();
    }

    mem
}

fn check_template(arch: &Architecture, create_info_addr: u64, entries_addr: u64) {
    let mem = capture(arch, create_info_addr, entries_addr);

    let info = decode(
        Some(arch),
        &catalog::descriptor_update_template_create_info(),
        create_info_addr,
        &mem,
    )
    .unwrap();
    assert_eq!(info.uint("sType"), Some(STRUCTURE_TYPE));
    assert_eq!(info.uint("pNext"), Some(0));
    assert_eq!(info.uint("flags"), Some(0));
    assert_eq!(info.uint("descriptorUpdateEntryCount"), Some(4));
    assert_eq!(info.uint("pDescriptorUpdateEntries"), Some(entries_addr));
    assert_eq!(info.uint("templateType"), Some(0));
    assert_eq!(info.uint("descriptorSetLayout"), Some(SET_LAYOUT));
    assert_eq!(info.uint("pipelineBindPoint"), Some(0));
    assert_eq!(info.uint("pipelineLayout"), Some(0));
    assert_eq!(info.uint("set"), Some(0));

    let entries = RecordArray::from_header(
        &info,
        "descriptorUpdateEntryCount",
        "pDescriptorUpdateEntries",
        catalog::descriptor_update_template_entry(),
        Some(arch),
    )
    .unwrap();
    assert_eq!(entries.stride(), 16 + 2 * u64::from(arch.size_size));

    let decoded = entries.decode_all(&mem).unwrap();
    assert_eq!(decoded.len(), ENTRIES.len());
    for (entry, &(binding, element, count, ty, offset, stride)) in decoded.iter().zip(&ENTRIES) {
        assert_eq!(entry.uint("dstBinding"), Some(binding));
        assert_eq!(entry.uint("dstArrayElement"), Some(element));
        assert_eq!(entry.uint("descriptorCount"), Some(count));
        assert_eq!(entry.uint("descriptorType"), Some(ty));
        assert_eq!(entry.uint("offset"), Some(offset));
        assert_eq!(entry.uint("stride"), Some(stride));
    }
}

#[test]
fn multiple_entries_on_x86_64() {
    check_template(&Architecture::X86_64, CREATE_INFO_ADDR, ENTRIES_ADDR);
}

#[test]
fn multiple_entries_on_x86() {
    check_template(&Architecture::X86, CREATE_INFO_ADDR_32, ENTRIES_ADDR_32);
}

#[test]
fn entry_past_the_observed_array_is_unmapped() {
    let arch = Architecture::X86_64;
    let mem = capture(&arch, CREATE_INFO_ADDR, ENTRIES_ADDR);
    let entries = RecordArray::new(
        catalog::descriptor_update_template_entry(),
        Some(&arch),
        ENTRIES_ADDR,
        5,
    )
    .unwrap();

    let err = entries.decode(4, &mem).unwrap_err();
    assert_eq!(
        err,
        DecodeError::ReadFailure {
            field: "dstBinding".to_string(),
            offset: ENTRIES_ADDR + 4 * 32,
            width: 4,
            source: ReadError::Unmapped {
                offset: ENTRIES_ADDR + 4 * 32,
                len: 4
            },
        }
    );
    assert!(entries.decode_all(&mem).is_err());
}

#[test]
fn created_template_handle_is_read_from_write_observation() {
    let mut mem = CaptureMemory::new();
    mem.observe(TEMPLATE_HANDLE_ADDR, &0x0000_0042_0000_0007u64.to_le_bytes())
        .unwrap();
    let handle = mem
        .read_uint(TEMPLATE_HANDLE_ADDR, usize::from(Architecture::X86_64.handle_size))
        .unwrap();
    assert_ne!(handle, 0);
    assert_eq!(handle, 0x0000_0042_0000_0007);
}

#[test]
fn update_data_with_one_image_two_buffers_three_views() {
    let arch = Architecture::X86_64;
    let schema = catalog::descriptor_update_data_1_image_2_buffers_3_views();
    let values = [
        ("sampler", 0x11),
        ("imageView", 0x12),
        ("imageLayout", 1),
        ("buffer_0", 0x21),
        ("offset_0", 0),
        ("range_0", 1024),
        ("buffer_1", 0x22),
        ("offset_1", 256),
        ("range_1", 512),
        ("buffer_view_0", 0x31),
        ("buffer_view_1", 0x32),
        ("buffer_view_2", 0x33),
    ];
    let p_data = 0x5000_0000;
    let mut mem = CaptureMemory::new();
    mem.observe(p_data, &encode(&schema, &arch, &values)).unwrap();

    let data = decode(Some(&arch), &schema, p_data, &mem).unwrap();
    for (name, value) in values {
        assert_eq!(data.uint(name), Some(value), "field {name}");
    }
    assert_eq!(data.offset_of("buffer_0"), Some(p_data + 24));
    assert_eq!(data.offset_of("buffer_view_0"), Some(p_data + 72));
}
