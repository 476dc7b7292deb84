use tracing::debug;

use crate::services::ResourceStore;

use super::error::SceneError;

pub const SCENE_DESCRIPTOR_LEN: usize = 16;
pub const RESOURCE_LIST_ENTRY_LEN: usize = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneDescriptor {
    pub reserved0: u16,
    pub resource_list: u16,
    pub end_slope: i16,
    pub begin_slope: i16,
    pub script_number: u16,
    pub scene_script_number: u16,
    pub start_script_number: u16,
    pub music: i16,
}

impl SceneDescriptor {
    pub fn from_bytes(raw: &[u8]) -> Result<Self, SceneError> {
        if raw.len() != SCENE_DESCRIPTOR_LEN {
            return Err(SceneError::format(
                "scene descriptor",
                format!(
                    "length {} does not match record size {SCENE_DESCRIPTOR_LEN}",
                    raw.len()
                ),
            ));
        }

        let mut cursor = 0usize;
        Ok(Self {
            reserved0: read_u16(raw, &mut cursor),
            resource_list: read_u16(raw, &mut cursor),
            end_slope: read_i16(raw, &mut cursor),
            begin_slope: read_i16(raw, &mut cursor),
            script_number: read_u16(raw, &mut cursor),
            scene_script_number: read_u16(raw, &mut cursor),
            start_script_number: read_u16(raw, &mut cursor),
            music: read_i16(raw, &mut cursor),
        })
    }

    pub fn to_bytes(&self) -> [u8; SCENE_DESCRIPTOR_LEN] {
        let mut out = [0u8; SCENE_DESCRIPTOR_LEN];
        let fields = [
            self.reserved0.to_le_bytes(),
            self.resource_list.to_le_bytes(),
            self.end_slope.to_le_bytes(),
            self.begin_slope.to_le_bytes(),
            self.script_number.to_le_bytes(),
            self.scene_script_number.to_le_bytes(),
            self.start_script_number.to_le_bytes(),
            self.music.to_le_bytes(),
        ];
        for (slot, field) in out.chunks_exact_mut(2).zip(fields) {
            slot.copy_from_slice(&field);
        }
        out
    }
}

/// What a resource list entry holds, keyed by its on-disk type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    BackgroundImage,
    BackgroundMask,
    ObjectNameList,
    ObjectMap,
    ActionMap,
    IsoTileset,
    IsoMetamap,
    IsoMetatileset,
    /// Sub-kinds 1 through 7.
    Animation(u8),
    PaletteCycle,
    Unknown(u16),
}

const ANIMATION_FIRST_CODE: u16 = 14;
const ANIMATION_LAST_CODE: u16 = 20;

impl ResourceKind {
    pub fn from_code(code: u16) -> Self {
        match code {
            2 => ResourceKind::BackgroundImage,
            3 => ResourceKind::BackgroundMask,
            5 => ResourceKind::ObjectNameList,
            6 => ResourceKind::ObjectMap,
            7 => ResourceKind::ActionMap,
            8 => ResourceKind::IsoTileset,
            9 => ResourceKind::IsoMetamap,
            10 => ResourceKind::IsoMetatileset,
            ANIMATION_FIRST_CODE..=ANIMATION_LAST_CODE => {
                ResourceKind::Animation((code - ANIMATION_FIRST_CODE + 1) as u8)
            }
            23 => ResourceKind::PaletteCycle,
            other => ResourceKind::Unknown(other),
        }
    }

    pub fn code(self) -> u16 {
        match self {
            ResourceKind::BackgroundImage => 2,
            ResourceKind::BackgroundMask => 3,
            ResourceKind::ObjectNameList => 5,
            ResourceKind::ObjectMap => 6,
            ResourceKind::ActionMap => 7,
            ResourceKind::IsoTileset => 8,
            ResourceKind::IsoMetamap => 9,
            ResourceKind::IsoMetatileset => 10,
            ResourceKind::Animation(sub_kind) => ANIMATION_FIRST_CODE + sub_kind as u16 - 1,
            ResourceKind::PaletteCycle => 23,
            ResourceKind::Unknown(code) => code,
        }
    }

    /// Name used in archive manifests.
    pub fn from_manifest_name(name: &str) -> Option<Self> {
        let kind = match name {
            "bg_image" => ResourceKind::BackgroundImage,
            "bg_mask" => ResourceKind::BackgroundMask,
            "object_names" => ResourceKind::ObjectNameList,
            "object_map" => ResourceKind::ObjectMap,
            "action_map" => ResourceKind::ActionMap,
            "iso_tileset" => ResourceKind::IsoTileset,
            "iso_metamap" => ResourceKind::IsoMetamap,
            "iso_metatileset" => ResourceKind::IsoMetatileset,
            "palette_cycle" => ResourceKind::PaletteCycle,
            other => {
                let sub_kind = other.strip_prefix("anim_")?.parse::<u8>().ok()?;
                if !(1..=7).contains(&sub_kind) {
                    return None;
                }
                ResourceKind::Animation(sub_kind)
            }
        };
        Some(kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceListEntry {
    pub resource_id: u16,
    pub resource_type: u16,
}

impl ResourceListEntry {
    pub fn new(resource_id: u16, kind: ResourceKind) -> Self {
        Self {
            resource_id,
            resource_type: kind.code(),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        ResourceKind::from_code(self.resource_type)
    }
}

/// Descriptor and resource list held by the caller rather than the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineScene {
    pub descriptor: SceneDescriptor,
    pub resources: Vec<ResourceListEntry>,
}

pub fn load_descriptor(
    store: &dyn ResourceStore,
    resource_id: u16,
) -> Result<SceneDescriptor, SceneError> {
    let raw = fetch(store, resource_id)?;
    SceneDescriptor::from_bytes(&raw)
}

pub fn parse_resource_list(raw: &[u8]) -> Result<Vec<ResourceListEntry>, SceneError> {
    if raw.len() % RESOURCE_LIST_ENTRY_LEN != 0 {
        return Err(SceneError::format(
            "scene resource list",
            format!(
                "length {} is not a multiple of {RESOURCE_LIST_ENTRY_LEN}",
                raw.len()
            ),
        ));
    }

    let count = raw.len() / RESOURCE_LIST_ENTRY_LEN;
    let mut entries = Vec::new();
    entries
        .try_reserve_exact(count)
        .map_err(|source| SceneError::Allocation {
            entries: count,
            source,
        })?;

    let mut cursor = 0usize;
    for _ in 0..count {
        entries.push(ResourceListEntry {
            resource_id: read_u16(raw, &mut cursor),
            resource_type: read_u16(raw, &mut cursor),
        });
    }
    Ok(entries)
}

pub fn load_resource_list(
    store: &dyn ResourceStore,
    resource_id: u16,
) -> Result<Vec<ResourceListEntry>, SceneError> {
    let raw = fetch(store, resource_id)?;
    let entries = parse_resource_list(&raw)?;
    debug!(
        resource = resource_id,
        entries = entries.len(),
        "scene_resource_list_loaded"
    );
    Ok(entries)
}

pub fn encode_resource_list(entries: &[ResourceListEntry]) -> Vec<u8> {
    let mut out = Vec::with_capacity(entries.len() * RESOURCE_LIST_ENTRY_LEN);
    for entry in entries {
        out.extend_from_slice(&entry.resource_id.to_le_bytes());
        out.extend_from_slice(&entry.resource_type.to_le_bytes());
    }
    out
}

fn fetch(store: &dyn ResourceStore, resource_id: u16) -> Result<Vec<u8>, SceneError> {
    store
        .fetch(resource_id)
        .map_err(|source| SceneError::ResourceFetch {
            resource: resource_id,
            source,
        })
}

// Callers check the total length up front.
fn read_u16(bytes: &[u8], cursor: &mut usize) -> u16 {
    let value = u16::from_le_bytes([bytes[*cursor], bytes[*cursor + 1]]);
    *cursor += 2;
    value
}

fn read_i16(bytes: &[u8], cursor: &mut usize) -> i16 {
    read_u16(bytes, cursor) as i16
}
