use std::cell::{Ref, RefCell, RefMut};
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use crate::rendering::{Palette, Surface};

use super::{
    ActionMapStore, AnimationHandle, AnimationPlayer, DecodedImage, EventQueue, ImageDecoder,
    IsoMapRenderer, ObjectMapStore, PaletteCycler, ResourceStore, SceneEvent, SceneServices,
    ScriptHost, ServiceError, SoundControl, TextOverlay,
};

const IMAGE_HEADER_LEN: usize = 4;
const MAP_RECORD_LEN: usize = 4;

/// Resource store backed by a plain map, for tests and tooling.
#[derive(Debug, Default, Clone)]
pub struct MemoryResourceStore {
    resources: HashMap<u16, Vec<u8>>,
}

impl MemoryResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, resource_id: u16, bytes: Vec<u8>) -> Option<Vec<u8>> {
        self.resources.insert(resource_id, bytes)
    }

    pub fn with(mut self, resource_id: u16, bytes: Vec<u8>) -> Self {
        self.insert(resource_id, bytes);
        self
    }
}

impl ResourceStore for MemoryResourceStore {
    fn fetch(&self, resource_id: u16) -> Result<Vec<u8>, ServiceError> {
        self.resources
            .get(&resource_id)
            .cloned()
            .ok_or_else(|| ServiceError::new(format!("resource {resource_id} not found")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessAnimation {
    pub handle: AnimationHandle,
    pub frame_bytes: usize,
    pub looping: bool,
    pub play_delay_ms: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueuedEvent {
    Queued(SceneEvent),
    Chained(SceneEvent),
}

impl QueuedEvent {
    pub fn event(&self) -> &SceneEvent {
        match self {
            QueuedEvent::Queued(event) | QueuedEvent::Chained(event) => event,
        }
    }
}

/// Everything the headless collaborators have been asked to hold.
#[derive(Debug, Default)]
pub struct HeadlessState {
    pub object_names: Vec<String>,
    pub object_map_records: Option<usize>,
    pub action_map_records: Option<usize>,
    pub iso_tileset: Option<Vec<u8>>,
    pub iso_metamap: Option<Vec<u8>>,
    pub iso_metatileset: Option<Vec<u8>>,
    pub animations: Vec<HeadlessAnimation>,
    pub palette_cycle: Option<Vec<u8>>,
    pub script: Option<u16>,
    /// When set, only these script numbers load successfully.
    pub available_scripts: Option<BTreeSet<u16>>,
    pub events: Vec<QueuedEvent>,
    pub event_clears: usize,
    pub text_clears: usize,
    pub music_stops: usize,
    pub voice_stops: usize,
}

/// In-memory stand-in for every engine subsystem the scene core drives.
///
/// Clones share one [`HeadlessState`], so a test or the runner keeps a handle
/// and inspects what the scene engine did through its boxed copies.
#[derive(Debug, Default, Clone)]
pub struct Headless {
    state: Rc<RefCell<HeadlessState>>,
}

impl Headless {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn services(&self, resources: Box<dyn ResourceStore>) -> SceneServices {
        SceneServices {
            resources,
            images: Box::new(self.clone()),
            iso_map: Box::new(self.clone()),
            object_map: Box::new(self.clone()),
            action_map: Box::new(self.clone()),
            animations: Box::new(self.clone()),
            palette_cycles: Box::new(self.clone()),
            scripts: Box::new(self.clone()),
            events: Box::new(self.clone()),
            text: Box::new(self.clone()),
            sound: Box::new(self.clone()),
        }
    }

    pub fn state(&self) -> Ref<'_, HeadlessState> {
        self.state.borrow()
    }

    pub fn state_mut(&self) -> RefMut<'_, HeadlessState> {
        self.state.borrow_mut()
    }
}

/// Encodes the indexed image layout the headless decoder reads: width and
/// height as little-endian u16, 768 palette bytes, then one byte per pixel.
pub fn encode_indexed_image(width: u16, height: u16, palette: &Palette, pixels: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(IMAGE_HEADER_LEN + Palette::ENCODED_LEN + pixels.len());
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out.extend_from_slice(&palette.to_rgb_bytes());
    out.extend_from_slice(pixels);
    out
}

/// Encodes a record table in the layout the headless object/action maps
/// accept: a u16 record count followed by 4-byte records.
pub fn encode_map_records(records: &[[u8; MAP_RECORD_LEN]]) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + records.len() * MAP_RECORD_LEN);
    out.extend_from_slice(&(records.len() as u16).to_le_bytes());
    for record in records {
        out.extend_from_slice(record);
    }
    out
}

fn parse_map_records(bytes: &[u8], what: &str) -> Result<usize, ServiceError> {
    let Some(header) = bytes.get(..2) else {
        return Err(ServiceError::new(format!("{what} is missing its record count")));
    };
    let count = u16::from_le_bytes([header[0], header[1]]) as usize;
    let expected = 2 + count * MAP_RECORD_LEN;
    if bytes.len() != expected {
        return Err(ServiceError::new(format!(
            "{what} declares {count} records but has {} bytes (expected {expected})",
            bytes.len()
        )));
    }
    Ok(count)
}

fn require_non_empty(bytes: &[u8], what: &str) -> Result<Vec<u8>, ServiceError> {
    if bytes.is_empty() {
        return Err(ServiceError::new(format!("{what} resource is empty")));
    }
    Ok(bytes.to_vec())
}

impl ImageDecoder for Headless {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, ServiceError> {
        if bytes.len() < IMAGE_HEADER_LEN + Palette::ENCODED_LEN {
            return Err(ServiceError::new("image too small to contain its header"));
        }
        let width = u16::from_le_bytes([bytes[0], bytes[1]]);
        let height = u16::from_le_bytes([bytes[2], bytes[3]]);
        let palette_end = IMAGE_HEADER_LEN + Palette::ENCODED_LEN;
        let palette = Palette::from_rgb_bytes(&bytes[IMAGE_HEADER_LEN..palette_end])
            .ok_or_else(|| ServiceError::new("image palette truncated"))?;
        let pixels = &bytes[palette_end..];
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(ServiceError::new(format!(
                "image is {width}x{height} but carries {} pixels (expected {expected})",
                pixels.len()
            )));
        }
        Ok(DecodedImage {
            width,
            height,
            pixels: pixels.to_vec(),
            palette,
        })
    }
}

impl IsoMapRenderer for Headless {
    fn load_tileset(&mut self, bytes: &[u8]) -> Result<(), ServiceError> {
        self.state_mut().iso_tileset = Some(require_non_empty(bytes, "isometric tileset")?);
        Ok(())
    }

    fn load_metamap(&mut self, bytes: &[u8]) -> Result<(), ServiceError> {
        self.state_mut().iso_metamap = Some(require_non_empty(bytes, "isometric metamap")?);
        Ok(())
    }

    fn load_metatileset(&mut self, bytes: &[u8]) -> Result<(), ServiceError> {
        self.state_mut().iso_metatileset =
            Some(require_non_empty(bytes, "isometric metatileset")?);
        Ok(())
    }

    fn draw(&mut self, surface: &mut Surface) -> Result<(), ServiceError> {
        let state = self.state();
        if state.iso_tileset.is_none() {
            return Err(ServiceError::new("no isometric tileset loaded"));
        }
        surface.fill(0);
        // Without real tile art the metamap bytes are laid out as tile indices.
        if let Some(metamap) = &state.iso_metamap {
            let pixels = surface.pixels_mut();
            let len = metamap.len().min(pixels.len());
            pixels[..len].copy_from_slice(&metamap[..len]);
        }
        Ok(())
    }

    fn free(&mut self) {
        let mut state = self.state_mut();
        state.iso_tileset = None;
        state.iso_metamap = None;
        state.iso_metatileset = None;
    }
}

impl ObjectMapStore for Headless {
    fn load_names(&mut self, bytes: &[u8]) -> Result<(), ServiceError> {
        let names = bytes
            .split(|byte| *byte == 0)
            .filter(|name| !name.is_empty())
            .map(|name| String::from_utf8_lossy(name).into_owned())
            .collect::<Vec<_>>();
        self.state_mut().object_names = names;
        Ok(())
    }

    fn load_map(&mut self, bytes: &[u8]) -> Result<(), ServiceError> {
        let count = parse_map_records(bytes, "object map")?;
        self.state_mut().object_map_records = Some(count);
        Ok(())
    }

    fn free(&mut self) {
        let mut state = self.state_mut();
        state.object_names.clear();
        state.object_map_records = None;
    }
}

impl ActionMapStore for Headless {
    fn load_map(&mut self, bytes: &[u8]) -> Result<(), ServiceError> {
        let count = parse_map_records(bytes, "action map")?;
        self.state_mut().action_map_records = Some(count);
        Ok(())
    }

    fn free(&mut self) {
        self.state_mut().action_map_records = None;
    }
}

impl AnimationPlayer for Headless {
    fn load(&mut self, bytes: &[u8]) -> Result<AnimationHandle, ServiceError> {
        require_non_empty(bytes, "animation")?;
        let mut state = self.state_mut();
        let handle = AnimationHandle(state.animations.len() as u16);
        state.animations.push(HeadlessAnimation {
            handle,
            frame_bytes: bytes.len(),
            looping: false,
            play_delay_ms: None,
        });
        Ok(handle)
    }

    fn set_looping(&mut self, handle: AnimationHandle) {
        if let Some(animation) = self.state_mut().animations.get_mut(handle.0 as usize) {
            animation.looping = true;
        }
    }

    fn play(&mut self, handle: AnimationHandle, delay_ms: u32) -> Result<(), ServiceError> {
        let mut state = self.state_mut();
        let animation = state
            .animations
            .get_mut(handle.0 as usize)
            .ok_or_else(|| ServiceError::new(format!("no animation with handle {}", handle.0)))?;
        animation.play_delay_ms = Some(delay_ms);
        Ok(())
    }

    fn reset(&mut self) {
        self.state_mut().animations.clear();
    }
}

impl PaletteCycler for Headless {
    fn load(&mut self, bytes: &[u8]) -> Result<(), ServiceError> {
        self.state_mut().palette_cycle = Some(require_non_empty(bytes, "palette cycle")?);
        Ok(())
    }

    fn free(&mut self) {
        self.state_mut().palette_cycle = None;
    }
}

impl ScriptHost for Headless {
    fn load(&mut self, script_number: u16) -> Result<(), ServiceError> {
        let mut state = self.state_mut();
        if let Some(available) = &state.available_scripts {
            if !available.contains(&script_number) {
                return Err(ServiceError::new(format!(
                    "script {script_number} is not available"
                )));
            }
        }
        state.script = Some(script_number);
        Ok(())
    }

    fn free(&mut self) {
        self.state_mut().script = None;
    }
}

impl EventQueue for Headless {
    fn queue(&mut self, event: SceneEvent) {
        self.state_mut().events.push(QueuedEvent::Queued(event));
    }

    fn chain(&mut self, event: SceneEvent) {
        self.state_mut().events.push(QueuedEvent::Chained(event));
    }

    fn clear(&mut self) {
        let mut state = self.state_mut();
        state.events.clear();
        state.event_clears += 1;
    }
}

impl TextOverlay for Headless {
    fn clear(&mut self) {
        self.state_mut().text_clears += 1;
    }
}

impl SoundControl for Headless {
    fn stop_music(&mut self) {
        self.state_mut().music_stops += 1;
    }

    fn stop_voice(&mut self) {
        self.state_mut().voice_stops += 1;
    }
}
