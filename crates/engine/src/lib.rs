//! Scene lifecycle core for a narrative adventure engine: scene lookup,
//! descriptor and resource-list decoding, resource dispatch, the scene
//! transition queue, plus the archive tooling and debug console around it.

pub mod content;
pub mod rendering;
pub mod scene;
pub mod services;
pub mod tools;

pub use content::{
    compile_archive_file, read_archive, write_archive, ArchiveCompileError, ArchiveError,
    ArchiveErrorCode, ResourceArchive,
};
pub use rendering::{Palette, PaletteEntry, Surface};
pub use scene::{
    DisplayInfo, InlineScene, RenderMode, ResourceKind, SceneConfig, SceneEngine, SceneError,
    SceneProc, SceneQueueEntry, SceneSource,
};
pub use services::{Headless, SceneServices, ServiceError};
pub use tools::{ConsoleCommandProcessor, ConsoleState};
