//! Collaborator interfaces the scene core calls into.
//!
//! The scene engine owns one [`SceneServices`] bundle and never reaches past
//! these traits: resource storage, image decoding, the map subsystems,
//! animation, palette cycling, scripts, the event list, text overlays and
//! sound are all supplied by the embedding game.

use thiserror::Error;

use crate::rendering::{Palette, Surface};

mod headless;

pub use headless::{
    encode_indexed_image, encode_map_records, Headless, HeadlessAnimation, HeadlessState,
    MemoryResourceStore, QueuedEvent,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ServiceError {
    message: String,
}

impl ServiceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u16,
    pub height: u16,
    pub pixels: Vec<u8>,
    pub palette: Palette,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnimationHandle(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteFade {
    ToBlack,
    FromBlack,
}

/// Effects a scene handler schedules for the game loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneEvent {
    BackgroundDisplay {
        set_palette: bool,
        time_ms: u32,
    },
    InterfaceActivate {
        time_ms: u32,
    },
    PaletteFade {
        fade: PaletteFade,
        target: Option<Box<Palette>>,
        time_ms: u32,
        duration_ms: u32,
    },
    PaletteCycleStart {
        time_ms: u32,
    },
}

pub trait ResourceStore {
    fn fetch(&self, resource_id: u16) -> Result<Vec<u8>, ServiceError>;
}

pub trait ImageDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, ServiceError>;
}

pub trait IsoMapRenderer {
    fn load_tileset(&mut self, bytes: &[u8]) -> Result<(), ServiceError>;
    fn load_metamap(&mut self, bytes: &[u8]) -> Result<(), ServiceError>;
    fn load_metatileset(&mut self, bytes: &[u8]) -> Result<(), ServiceError>;
    fn draw(&mut self, surface: &mut Surface) -> Result<(), ServiceError>;
    fn free(&mut self);
}

pub trait ObjectMapStore {
    fn load_names(&mut self, bytes: &[u8]) -> Result<(), ServiceError>;
    fn load_map(&mut self, bytes: &[u8]) -> Result<(), ServiceError>;
    fn free(&mut self);
}

pub trait ActionMapStore {
    fn load_map(&mut self, bytes: &[u8]) -> Result<(), ServiceError>;
    fn free(&mut self);
}

pub trait AnimationPlayer {
    fn load(&mut self, bytes: &[u8]) -> Result<AnimationHandle, ServiceError>;
    fn set_looping(&mut self, handle: AnimationHandle);
    fn play(&mut self, handle: AnimationHandle, delay_ms: u32) -> Result<(), ServiceError>;
    fn reset(&mut self);
}

pub trait PaletteCycler {
    fn load(&mut self, bytes: &[u8]) -> Result<(), ServiceError>;
    fn free(&mut self);
}

pub trait ScriptHost {
    fn load(&mut self, script_number: u16) -> Result<(), ServiceError>;
    fn free(&mut self);
}

pub trait EventQueue {
    fn queue(&mut self, event: SceneEvent);

    /// Schedules `event` to run after the previously queued one finishes.
    fn chain(&mut self, event: SceneEvent) {
        self.queue(event);
    }

    fn clear(&mut self);
}

pub trait TextOverlay {
    fn clear(&mut self);
}

pub trait SoundControl {
    fn stop_music(&mut self);
    fn stop_voice(&mut self);
}

pub struct SceneServices {
    pub resources: Box<dyn ResourceStore>,
    pub images: Box<dyn ImageDecoder>,
    pub iso_map: Box<dyn IsoMapRenderer>,
    pub object_map: Box<dyn ObjectMapStore>,
    pub action_map: Box<dyn ActionMapStore>,
    pub animations: Box<dyn AnimationPlayer>,
    pub palette_cycles: Box<dyn PaletteCycler>,
    pub scripts: Box<dyn ScriptHost>,
    pub events: Box<dyn EventQueue>,
    pub text: Box<dyn TextOverlay>,
    pub sound: Box<dyn SoundControl>,
}
