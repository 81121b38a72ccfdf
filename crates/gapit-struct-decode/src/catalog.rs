//! Built-in schemas for Vulkan structures that show up in descriptor update template captures.
//!
//! Layouts carry explicit [`TypeTag::PointerPad`] fields wherever the C compiler inserts
//! alignment padding, so offsets match the x86 and x86_64 ABIs. (armv7a aligns 64-bit members to
//! 8 bytes and would need different padding after 32-bit fields that precede handles.)

use crate::schema::Schema;
use crate::types::TypeTag;

pub const DESCRIPTOR_UPDATE_TEMPLATE_CREATE_INFO: &str = "VkDescriptorUpdateTemplateCreateInfo";
pub const DESCRIPTOR_UPDATE_TEMPLATE_ENTRY: &str = "VkDescriptorUpdateTemplateEntry";
pub const DESCRIPTOR_IMAGE_INFO: &str = "VkDescriptorImageInfo";
pub const DESCRIPTOR_BUFFER_INFO: &str = "VkDescriptorBufferInfo";
pub const DESCRIPTOR_UPDATE_DATA_1_IMAGE_2_BUFFERS_3_VIEWS: &str =
    "DescriptorUpdateData_1Image2Buffers3Views";

const NAMES: &[&str] = &[
    DESCRIPTOR_UPDATE_TEMPLATE_CREATE_INFO,
    DESCRIPTOR_UPDATE_TEMPLATE_ENTRY,
    DESCRIPTOR_IMAGE_INFO,
    DESCRIPTOR_BUFFER_INFO,
    DESCRIPTOR_UPDATE_DATA_1_IMAGE_2_BUFFERS_3_VIEWS,
];

/// Names accepted by [`lookup`].
pub fn names() -> &'static [&'static str] {
    NAMES
}

pub fn lookup(name: &str) -> Option<Schema> {
    let schema = match name {
        DESCRIPTOR_UPDATE_TEMPLATE_CREATE_INFO => descriptor_update_template_create_info(),
        DESCRIPTOR_UPDATE_TEMPLATE_ENTRY => descriptor_update_template_entry(),
        DESCRIPTOR_IMAGE_INFO => descriptor_image_info(),
        DESCRIPTOR_BUFFER_INFO => descriptor_buffer_info(),
        DESCRIPTOR_UPDATE_DATA_1_IMAGE_2_BUFFERS_3_VIEWS => {
            descriptor_update_data_1_image_2_buffers_3_views()
        }
        _ => return None,
    };
    Some(schema)
}

fn builtin(name: &str, fields: &[(&str, TypeTag)]) -> Schema {
    Schema::new(name, fields.iter().copied()).expect("built-in schemas have unique field names")
}

pub fn descriptor_update_template_create_info() -> Schema {
    builtin(
        DESCRIPTOR_UPDATE_TEMPLATE_CREATE_INFO,
        &[
            ("sType", TypeTag::Uint32),
            ("_pad0", TypeTag::PointerPad),
            ("pNext", TypeTag::Pointer),
            ("flags", TypeTag::Uint32),
            ("descriptorUpdateEntryCount", TypeTag::Uint32),
            ("pDescriptorUpdateEntries", TypeTag::Pointer),
            ("templateType", TypeTag::Uint32),
            ("_pad1", TypeTag::PointerPad),
            ("descriptorSetLayout", TypeTag::Handle),
            ("pipelineBindPoint", TypeTag::Uint32),
            ("_pad2", TypeTag::PointerPad),
            ("pipelineLayout", TypeTag::Handle),
            ("set", TypeTag::Uint32),
        ],
    )
}

/// Four `uint32_t` followed by two `size_t`; 32 bytes on 64-bit, 24 on 32-bit, never padded.
pub fn descriptor_update_template_entry() -> Schema {
    builtin(
        DESCRIPTOR_UPDATE_TEMPLATE_ENTRY,
        &[
            ("dstBinding", TypeTag::Uint32),
            ("dstArrayElement", TypeTag::Uint32),
            ("descriptorCount", TypeTag::Uint32),
            ("descriptorType", TypeTag::Uint32),
            ("offset", TypeTag::SizeT),
            ("stride", TypeTag::SizeT),
        ],
    )
}

pub fn descriptor_image_info() -> Schema {
    builtin(
        DESCRIPTOR_IMAGE_INFO,
        &[
            ("sampler", TypeTag::Handle),
            ("imageView", TypeTag::Handle),
            ("imageLayout", TypeTag::Uint32),
            // Tail padding, so the span doubles as the array stride.
            ("_pad0", TypeTag::PointerPad),
        ],
    )
}

pub fn descriptor_buffer_info() -> Schema {
    builtin(
        DESCRIPTOR_BUFFER_INFO,
        &[
            ("buffer", TypeTag::Handle),
            ("offset", TypeTag::DeviceSize),
            ("range", TypeTag::DeviceSize),
        ],
    )
}

/// Raw update data passed to `vkUpdateDescriptorSetWithTemplate`: one image info, two buffer
/// infos and three buffer views, packed as a C struct would pack them.
pub fn descriptor_update_data_1_image_2_buffers_3_views() -> Schema {
    builtin(
        DESCRIPTOR_UPDATE_DATA_1_IMAGE_2_BUFFERS_3_VIEWS,
        &[
            ("sampler", TypeTag::Handle),
            ("imageView", TypeTag::Handle),
            ("imageLayout", TypeTag::Uint32),
            ("_pad0", TypeTag::PointerPad),
            ("buffer_0", TypeTag::Handle),
            ("offset_0", TypeTag::DeviceSize),
            ("range_0", TypeTag::DeviceSize),
            ("buffer_1", TypeTag::Handle),
            ("offset_1", TypeTag::DeviceSize),
            ("range_1", TypeTag::DeviceSize),
            ("buffer_view_0", TypeTag::Handle),
            ("buffer_view_1", TypeTag::Handle),
            ("buffer_view_2", TypeTag::Handle),
        ],
    )
}
