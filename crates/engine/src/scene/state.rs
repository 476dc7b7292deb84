use std::rc::Rc;

use crate::rendering::Palette;
use crate::services::{AnimationHandle, SceneServices};

use super::descriptor::{InlineScene, ResourceListEntry, SceneDescriptor};
use super::handler::SceneProc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenderMode {
    #[default]
    Unset,
    Normal,
    Isometric,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundImage {
    pub width: u16,
    pub height: u16,
    pub pixels: Vec<u8>,
    pub palette: Palette,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundMask {
    pub width: u16,
    pub height: u16,
    pub pixels: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneAnimation {
    pub handle: AnimationHandle,
    pub resource_id: u16,
}

/// Background buffer plus the offset that centres it in the scene area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackgroundInfo<'a> {
    pub pixels: &'a [u8],
    pub width: u16,
    pub height: u16,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskInfo<'a> {
    pub pixels: &'a [u8],
    pub width: u16,
    pub height: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZInfo {
    pub begin_slope: i16,
    pub end_slope: i16,
}

/// Buffers and subsystem state built up by the resource dispatcher.
#[derive(Debug, Default)]
pub(crate) struct SceneAssets {
    pub(crate) render_mode: RenderMode,
    pub(crate) background: Option<BackgroundImage>,
    pub(crate) mask: Option<BackgroundMask>,
    pub(crate) animations: Vec<SceneAnimation>,
    pub(crate) palette_cycle: bool,
}

impl SceneAssets {
    /// Hands every collaborator-side table back; owned buffers drop with `self`.
    pub(crate) fn release(self, services: &mut SceneServices) {
        services.animations.reset();
        services.palette_cycles.free();
        services.object_map.free();
        services.action_map.free();
        services.iso_map.free();
    }
}

#[derive(Debug)]
pub(crate) enum ResourceList {
    Fetched(Vec<ResourceListEntry>),
    Inline(Rc<InlineScene>),
}

impl ResourceList {
    pub(crate) fn entries(&self) -> &[ResourceListEntry] {
        match self {
            ResourceList::Fetched(entries) => entries,
            ResourceList::Inline(scene) => &scene.resources,
        }
    }
}

/// Everything owned by the currently loaded scene.
#[derive(Debug)]
pub(crate) struct ActiveScene {
    pub(crate) descriptor: SceneDescriptor,
    pub(crate) descriptor_resource: Option<u16>,
    pub(crate) resources: ResourceList,
    pub(crate) assets: SceneAssets,
    pub(crate) script_loaded: bool,
    pub(crate) handler: SceneProc,
}
