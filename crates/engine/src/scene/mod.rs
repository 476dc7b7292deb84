//! Scene lifecycle: lookup table, descriptors, resource dispatch, the
//! transition queue and the controller that ties them together.

mod config;
mod descriptor;
mod dispatch;
mod engine;
mod error;
mod handler;
mod lut;
mod queue;
mod state;

pub use config::{DisplayInfo, SceneConfig, DEFAULT_LOGICAL_WIDTH, DEFAULT_SCENE_HEIGHT};
pub use descriptor::{
    encode_resource_list, load_descriptor, load_resource_list, parse_resource_list,
    InlineScene, ResourceKind, ResourceListEntry, SceneDescriptor, RESOURCE_LIST_ENTRY_LEN,
    SCENE_DESCRIPTOR_LEN,
};
pub use engine::SceneEngine;
pub use error::SceneError;
pub use handler::{
    SceneHandler, SceneProc, SceneProcContext, SceneSignal, PALETTE_FADE_DURATION_MS,
};
pub use lut::SceneLut;
pub use queue::{SceneQueue, SceneQueueEntry, SceneSource};
pub use state::{BackgroundInfo, MaskInfo, RenderMode, ZInfo};
