pub const PALETTE_ENTRIES: usize = 256;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaletteEntry {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

/// 256-colour palette attached to an indexed image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    entries: [PaletteEntry; PALETTE_ENTRIES],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            entries: [PaletteEntry::default(); PALETTE_ENTRIES],
        }
    }
}

impl Palette {
    pub const ENCODED_LEN: usize = PALETTE_ENTRIES * 3;

    /// Builds a palette from packed RGB triplets. Returns `None` unless exactly
    /// `ENCODED_LEN` bytes are supplied.
    pub fn from_rgb_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != Self::ENCODED_LEN {
            return None;
        }
        let mut palette = Self::default();
        for (entry, rgb) in palette.entries.iter_mut().zip(bytes.chunks_exact(3)) {
            *entry = PaletteEntry {
                red: rgb[0],
                green: rgb[1],
                blue: rgb[2],
            };
        }
        Some(palette)
    }

    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::ENCODED_LEN);
        for entry in &self.entries {
            out.extend_from_slice(&[entry.red, entry.green, entry.blue]);
        }
        out
    }

    pub fn entry(&self, index: u8) -> PaletteEntry {
        self.entries[index as usize]
    }

    pub fn set_entry(&mut self, index: u8, entry: PaletteEntry) {
        self.entries[index as usize] = entry;
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_bytes_must_cover_every_entry() {
        assert!(Palette::from_rgb_bytes(&[0u8; 12]).is_none());
        let mut raw = vec![0u8; Palette::ENCODED_LEN];
        raw[3..6].copy_from_slice(&[10, 20, 30]);
        let palette = Palette::from_rgb_bytes(&raw).expect("palette");
        assert_eq!(
            palette.entry(1),
            PaletteEntry {
                red: 10,
                green: 20,
                blue: 30
            }
        );
        assert_eq!(palette.to_rgb_bytes(), raw);
    }
}
