mod palette;
mod surface;

pub use palette::{Palette, PaletteEntry, PALETTE_ENTRIES};
pub use surface::Surface;
