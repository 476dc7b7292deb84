use tracing::debug;

use crate::services::ResourceStore;

use super::error::SceneError;

const LUT_ENTRY_LEN: usize = 2;

/// Logical scene index to descriptor resource id.
///
/// Index 0 and the final slot are reserved, so only `1..=max-1` resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneLut {
    entries: Vec<u16>,
}

impl SceneLut {
    pub fn from_entries(entries: Vec<u16>) -> Result<Self, SceneError> {
        if entries.is_empty() {
            return Err(SceneError::format("scene lookup table", "table has no entries"));
        }
        Ok(Self { entries })
    }

    pub fn from_bytes(raw: &[u8]) -> Result<Self, SceneError> {
        if raw.len() % LUT_ENTRY_LEN != 0 {
            return Err(SceneError::format(
                "scene lookup table",
                format!("length {} is not a multiple of {LUT_ENTRY_LEN}", raw.len()),
            ));
        }
        let entries = raw
            .chunks_exact(LUT_ENTRY_LEN)
            .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
            .collect::<Vec<_>>();
        Self::from_entries(entries)
    }

    pub fn load(store: &dyn ResourceStore, resource_id: u16) -> Result<Self, SceneError> {
        let raw = store
            .fetch(resource_id)
            .map_err(|source| SceneError::ResourceFetch {
                resource: resource_id,
                source,
            })?;
        let lut = Self::from_bytes(&raw)?;
        debug!(resource = resource_id, entries = lut.count(), "scene_lut_loaded");
        Ok(lut)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.entries.len() * LUT_ENTRY_LEN);
        for entry in &self.entries {
            out.extend_from_slice(&entry.to_le_bytes());
        }
        out
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn max(&self) -> usize {
        self.entries.len() - 1
    }

    pub fn entries(&self) -> &[u16] {
        &self.entries
    }

    pub fn resolve(&self, index: u16) -> Result<u16, SceneError> {
        let max_valid = self.max().saturating_sub(1);
        if index == 0 || index as usize > max_valid {
            return Err(SceneError::Range { index, max_valid });
        }
        match self.entries[index as usize] {
            0 => Err(SceneError::ZeroEntry { index }),
            resource_id => Ok(resource_id),
        }
    }
}
