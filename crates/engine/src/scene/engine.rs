use tracing::{info, warn};

use crate::rendering::{Palette, Surface};
use crate::services::SceneServices;

use super::config::{DisplayInfo, SceneConfig};
use super::descriptor::{load_descriptor, load_resource_list, SceneDescriptor};
use super::dispatch::{dispatch_resources, LoadedResource};
use super::error::SceneError;
use super::handler::{SceneProc, SceneProcContext, SceneSignal};
use super::lut::SceneLut;
use super::queue::{SceneQueue, SceneSource};
use super::state::{
    ActiveScene, BackgroundInfo, MaskInfo, RenderMode, ResourceList, SceneAssets, ZInfo,
};

/// Owns the scene lookup table, the transition queue and whichever scene is
/// currently loaded.
///
/// A value only exists between [`SceneEngine::init`] and
/// [`SceneEngine::shutdown`]; within that window it is either idle or holds
/// exactly one loaded scene.
pub struct SceneEngine {
    config: SceneConfig,
    services: SceneServices,
    lut: SceneLut,
    queue: SceneQueue,
    active: Option<ActiveScene>,
    scene_number: Option<u16>,
}

impl SceneEngine {
    pub fn init(config: SceneConfig, services: SceneServices) -> Result<Self, SceneError> {
        let lut = SceneLut::load(services.resources.as_ref(), config.scene_lut_resource)?;
        info!(
            lut_resource = config.scene_lut_resource,
            scenes = lut.count(),
            first_scene = config.first_scene,
            "scene_engine_initialized"
        );
        Ok(Self {
            config,
            services,
            lut,
            queue: SceneQueue::default(),
            active: None,
            scene_number: None,
        })
    }

    /// Ends any loaded scene and hands the collaborators back.
    pub fn shutdown(mut self) -> SceneServices {
        if self.active.is_some() {
            if let Err(error) = self.end() {
                warn!(error = %error, "scene_end_on_shutdown_failed");
            }
        }
        self.queue.clear();
        info!("scene_engine_shutdown");
        self.services
    }

    pub fn load(&mut self, source: SceneSource, handler: SceneProc) -> Result<(), SceneError> {
        if self.active.is_some() {
            return Err(SceneError::AlreadyLoaded);
        }

        let result = self.load_scene(source, handler);
        if let Err(error) = &result {
            warn!(error = %error, "scene_load_failed");
        }
        result
    }

    /// Loads the head of the queue, if any, when a game session begins.
    pub fn start(&mut self) -> Result<(), SceneError> {
        if self.active.is_some() {
            return Err(SceneError::AlreadyLoaded);
        }
        self.load_queue_head()
    }

    pub fn next(&mut self) -> Result<(), SceneError> {
        self.require_loaded("advance to the next scene")?;
        self.end()?;
        self.queue.pop_head();
        self.load_queue_head()
    }

    /// Jumps to the first skip target queued after the current scene.
    pub fn skip(&mut self) -> Result<(), SceneError> {
        self.require_loaded("skip")?;
        if self.queue.is_empty() {
            return Err(SceneError::EmptyQueue);
        }
        let Some(position) = self.queue.find_first_skip_target() else {
            return Ok(());
        };

        info!(dropped = position, "scene_skip");
        self.queue.drop_before(position);
        self.end()?;
        self.load_queue_head()
    }

    /// Replaces the current scene with `scene_index`, bypassing the queue.
    pub fn change(&mut self, scene_index: u16) -> Result<(), SceneError> {
        self.require_loaded("change scene")?;
        self.lut.resolve(scene_index)?;
        self.end()?;
        self.load(SceneSource::Scene(scene_index), SceneProc::Default)
    }

    pub fn end(&mut self) -> Result<(), SceneError> {
        self.signal_active(SceneSignal::End, "end scene")?;
        let active = self.active.take().ok_or(SceneError::NotLoaded {
            operation: "end scene",
        })?;

        let ActiveScene {
            descriptor_resource,
            resources,
            assets,
            script_loaded,
            ..
        } = active;
        if script_loaded {
            self.services.scripts.free();
        }
        // Inline lists only drop the engine's reference.
        drop(resources);
        assets.release(&mut self.services);
        self.services.events.clear();
        self.services.text.clear();

        info!(
            scene = ?self.scene_number,
            descriptor = ?descriptor_resource,
            "scene_ended"
        );
        Ok(())
    }

    pub fn draw(&mut self, surface: &mut Surface) -> Result<(), SceneError> {
        let Some(active) = self.active.as_ref() else {
            return Err(SceneError::NotLoaded {
                operation: "draw scene",
            });
        };

        match active.assets.render_mode {
            RenderMode::Normal => {
                let info = background_info(active, self.config.display);
                if info.pixels.is_empty() {
                    return Err(SceneError::Render {
                        message: "scene has no background image".to_string(),
                    });
                }
                surface.blit(
                    info.pixels,
                    u32::from(info.width),
                    u32::from(info.height),
                    info.x,
                    info.y,
                );
                Ok(())
            }
            RenderMode::Isometric => {
                self.services
                    .iso_map
                    .draw(surface)
                    .map_err(|error| SceneError::Render {
                        message: error.to_string(),
                    })
            }
            RenderMode::Unset => Err(SceneError::Render {
                message: "scene loaded no background or isometric map".to_string(),
            }),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.active.is_some()
    }

    pub fn mode(&self) -> RenderMode {
        self.active
            .as_ref()
            .map(|active| active.assets.render_mode)
            .unwrap_or_default()
    }

    /// Empty when no background is loaded.
    pub fn background_info(&self) -> BackgroundInfo<'_> {
        self.active
            .as_ref()
            .map(|active| background_info(active, self.config.display))
            .unwrap_or_default()
    }

    pub fn background_palette(&self) -> Option<&Palette> {
        self.active
            .as_ref()
            .and_then(|active| active.assets.background.as_ref())
            .map(|background| &background.palette)
    }

    pub fn mask_info(&self) -> Option<MaskInfo<'_>> {
        let mask = self.active.as_ref()?.assets.mask.as_ref()?;
        Some(MaskInfo {
            pixels: &mask.pixels,
            width: mask.width,
            height: mask.height,
        })
    }

    pub fn is_mask_present(&self) -> bool {
        self.mask_info().is_some()
    }

    pub fn z_info(&self) -> ZInfo {
        self.active
            .as_ref()
            .map(|active| ZInfo {
                begin_slope: active.descriptor.begin_slope,
                end_slope: active.descriptor.end_slope,
            })
            .unwrap_or_default()
    }

    pub fn descriptor(&self) -> Option<&SceneDescriptor> {
        self.active.as_ref().map(|active| &active.descriptor)
    }

    /// Resource id of the loaded descriptor; `None` for inline scenes.
    pub fn descriptor_resource(&self) -> Option<u16> {
        self.active.as_ref()?.descriptor_resource
    }

    /// Lookup-table index of the most recent scene loaded by index.
    pub fn scene_number(&self) -> Option<u16> {
        self.scene_number
    }

    pub fn animation_count(&self) -> usize {
        self.active
            .as_ref()
            .map_or(0, |active| active.assets.animations.len())
    }

    pub fn first_scene(&self) -> u16 {
        self.config.first_scene
    }

    pub fn display(&self) -> DisplayInfo {
        self.config.display
    }

    pub fn lut(&self) -> &SceneLut {
        &self.lut
    }

    pub fn queue(&self) -> &SceneQueue {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut SceneQueue {
        &mut self.queue
    }

    pub fn clear_queue(&mut self) {
        self.queue.clear();
    }

    fn require_loaded(&self, operation: &'static str) -> Result<(), SceneError> {
        if self.active.is_none() {
            return Err(SceneError::NotLoaded { operation });
        }
        Ok(())
    }

    fn load_queue_head(&mut self) -> Result<(), SceneError> {
        let Some(entry) = self.queue.head().cloned() else {
            info!("scene_queue_empty");
            return Ok(());
        };
        self.load(entry.source, entry.handler)
    }

    fn load_scene(&mut self, source: SceneSource, handler: SceneProc) -> Result<(), SceneError> {
        let store = self.services.resources.as_ref();
        let (descriptor, resources, descriptor_resource, scene_number) = match source {
            SceneSource::Resource(resource_id) => {
                let descriptor = load_descriptor(store, resource_id)?;
                let entries = load_resource_list(store, descriptor.resource_list)?;
                (
                    descriptor,
                    ResourceList::Fetched(entries),
                    Some(resource_id),
                    None,
                )
            }
            SceneSource::Scene(scene_index) => {
                let resource_id = self.lut.resolve(scene_index)?;
                let descriptor = load_descriptor(store, resource_id)?;
                let entries = load_resource_list(store, descriptor.resource_list)?;
                (
                    descriptor,
                    ResourceList::Fetched(entries),
                    Some(resource_id),
                    Some(scene_index),
                )
            }
            SceneSource::Descriptor(inline) => {
                (inline.descriptor, ResourceList::Inline(inline), None, None)
            }
        };

        let loaded = resources
            .entries()
            .iter()
            .map(|entry| {
                store
                    .fetch(entry.resource_id)
                    .map(|data| LoadedResource {
                        entry: *entry,
                        data,
                    })
                    .map_err(|source| SceneError::ResourceFetch {
                        resource: entry.resource_id,
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let resource_count = loaded.len();

        let mut assets = SceneAssets::default();
        if let Err(error) = dispatch_resources(loaded, &mut assets, &mut self.services) {
            assets.release(&mut self.services);
            return Err(error);
        }

        let script = descriptor.script_number;
        let script_loaded = script > 0;
        if script_loaded {
            if let Err(source) = self.services.scripts.load(script) {
                assets.release(&mut self.services);
                return Err(SceneError::Script { script, source });
            }
        }

        let render_mode = assets.render_mode;
        self.scene_number = scene_number;
        self.active = Some(ActiveScene {
            descriptor,
            descriptor_resource,
            resources,
            assets,
            script_loaded,
            handler,
        });
        info!(
            scene = ?scene_number,
            descriptor = ?descriptor_resource,
            resources = resource_count,
            mode = ?render_mode,
            script,
            "scene_loaded"
        );

        self.signal_active(SceneSignal::Begin, "begin scene")
    }

    fn signal_active(
        &mut self,
        signal: SceneSignal,
        operation: &'static str,
    ) -> Result<(), SceneError> {
        let Some(active) = self.active.as_ref() else {
            return Err(SceneError::NotLoaded { operation });
        };
        let services = &mut self.services;
        let mut ctx = SceneProcContext {
            events: services.events.as_mut(),
            animations: services.animations.as_mut(),
            sound: services.sound.as_mut(),
            background_palette: active
                .assets
                .background
                .as_ref()
                .map(|background| &background.palette),
        };
        active.handler.invoke(signal, &mut ctx);
        Ok(())
    }
}

fn background_info(active: &ActiveScene, display: DisplayInfo) -> BackgroundInfo<'_> {
    let Some(background) = active.assets.background.as_ref() else {
        return BackgroundInfo::default();
    };
    BackgroundInfo {
        pixels: &background.pixels,
        width: background.width,
        height: background.height,
        x: centred_offset(background.width, display.logical_width),
        y: centred_offset(background.height, display.scene_height),
    }
}

fn centred_offset(size: u16, area: u16) -> i32 {
    if size < area {
        i32::from((area - size) / 2)
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::BTreeSet;
    use std::rc::Rc;

    use super::*;
    use crate::rendering::PaletteEntry;
    use crate::scene::descriptor::{
        encode_resource_list, InlineScene, ResourceKind, ResourceListEntry,
    };
    use crate::scene::handler::SceneHandler;
    use crate::scene::queue::SceneQueueEntry;
    use crate::services::{
        encode_indexed_image, encode_map_records, Headless, MemoryResourceStore, QueuedEvent,
        SceneEvent,
    };

    const LUT_RESOURCE: u16 = 1;
    const BACKGROUND: u16 = 110;
    const MASK: u16 = 111;
    const OBJECT_MAP: u16 = 112;
    const ANIMATION: u16 = 113;
    const PALETTE_CYCLE: u16 = 114;
    const ISO_TILESET: u16 = 210;
    const ISO_METAMAP: u16 = 211;
    const ISO_METATILESET: u16 = 212;
    const ACTION_MAP: u16 = 213;

    fn descriptor(resource_list: u16, script_number: u16) -> SceneDescriptor {
        SceneDescriptor {
            resource_list,
            begin_slope: 10,
            end_slope: 20,
            script_number,
            ..SceneDescriptor::default()
        }
    }

    fn list(entries: &[(u16, ResourceKind)]) -> Vec<ResourceListEntry> {
        entries
            .iter()
            .map(|(id, kind)| ResourceListEntry::new(*id, *kind))
            .collect()
    }

    fn add_scene(
        store: &mut MemoryResourceStore,
        descriptor_id: u16,
        script_number: u16,
        entries: &[(u16, ResourceKind)],
    ) {
        let list_id = descriptor_id + 1;
        store.insert(
            descriptor_id,
            descriptor(list_id, script_number).to_bytes().to_vec(),
        );
        store.insert(list_id, encode_resource_list(&list(entries)));
    }

    // Scenes 1..=4 resolve through the table; index 5 is a zero entry.
    fn fixture_store() -> MemoryResourceStore {
        let lut = SceneLut::from_entries(vec![0, 100, 200, 300, 400, 0, 0]).expect("lut");
        let mut palette = Palette::default();
        palette.set_entry(
            5,
            PaletteEntry {
                red: 1,
                green: 2,
                blue: 3,
            },
        );

        let mut store = MemoryResourceStore::new()
            .with(LUT_RESOURCE, lut.to_bytes())
            .with(BACKGROUND, encode_indexed_image(8, 4, &palette, &[5; 32]))
            .with(MASK, encode_indexed_image(8, 4, &palette, &[1; 32]))
            .with(OBJECT_MAP, encode_map_records(&[[1, 2, 3, 4]]))
            .with(ANIMATION, vec![7; 12])
            .with(PALETTE_CYCLE, vec![1, 2, 3])
            .with(ISO_TILESET, vec![9; 4])
            .with(ISO_METAMAP, vec![3, 4])
            .with(ISO_METATILESET, vec![1])
            .with(ACTION_MAP, encode_map_records(&[[5, 6, 7, 8]]));

        add_scene(
            &mut store,
            100,
            0,
            &[
                (BACKGROUND, ResourceKind::BackgroundImage),
                (MASK, ResourceKind::BackgroundMask),
                (OBJECT_MAP, ResourceKind::ObjectMap),
                (ANIMATION, ResourceKind::Animation(1)),
                (PALETTE_CYCLE, ResourceKind::PaletteCycle),
            ],
        );
        add_scene(
            &mut store,
            200,
            7,
            &[
                (ISO_TILESET, ResourceKind::IsoTileset),
                (ISO_METAMAP, ResourceKind::IsoMetamap),
                (ISO_METATILESET, ResourceKind::IsoMetatileset),
                (ACTION_MAP, ResourceKind::ActionMap),
            ],
        );
        add_scene(
            &mut store,
            300,
            0,
            &[
                (OBJECT_MAP, ResourceKind::ObjectMap),
                (ANIMATION, ResourceKind::Animation(2)),
                (BACKGROUND, ResourceKind::BackgroundImage),
                (BACKGROUND, ResourceKind::BackgroundImage),
            ],
        );
        add_scene(
            &mut store,
            400,
            0,
            &[
                (BACKGROUND, ResourceKind::BackgroundImage),
                (ISO_TILESET, ResourceKind::IsoTileset),
            ],
        );
        add_scene(
            &mut store,
            500,
            0,
            &[
                (ISO_TILESET, ResourceKind::IsoTileset),
                (BACKGROUND, ResourceKind::BackgroundImage),
            ],
        );
        add_scene(&mut store, 600, 0, &[(ANIMATION, ResourceKind::Animation(3))]);
        add_scene(
            &mut store,
            700,
            9,
            &[
                (OBJECT_MAP, ResourceKind::ObjectMap),
                (PALETTE_CYCLE, ResourceKind::PaletteCycle),
            ],
        );
        store
    }

    fn engine() -> (SceneEngine, Headless) {
        let headless = Headless::new();
        headless.state_mut().available_scripts = Some(BTreeSet::from([7]));
        let services = headless.services(Box::new(fixture_store()));
        let engine = SceneEngine::init(SceneConfig::new(LUT_RESOURCE), services).expect("init");
        (engine, headless)
    }

    fn assert_released(engine: &SceneEngine, headless: &Headless) {
        assert!(!engine.is_loaded());
        assert_eq!(engine.mode(), RenderMode::Unset);
        assert!(engine.background_info().pixels.is_empty());
        assert_eq!(engine.background_info().width, 0);
        assert!(engine.background_palette().is_none());
        assert!(!engine.is_mask_present());
        assert_eq!(engine.animation_count(), 0);

        let state = headless.state();
        assert!(state.animations.is_empty());
        assert!(state.object_map_records.is_none());
        assert!(state.action_map_records.is_none());
        assert!(state.iso_tileset.is_none());
        assert!(state.palette_cycle.is_none());
        assert!(state.script.is_none());
    }

    fn scene_entry(index: u16) -> SceneQueueEntry {
        SceneQueueEntry::new(SceneSource::Scene(index))
    }

    #[derive(Default)]
    struct Recorder {
        signals: RefCell<Vec<(SceneSignal, bool)>>,
    }

    impl SceneHandler for Recorder {
        fn on_signal(&self, signal: SceneSignal, ctx: &mut SceneProcContext<'_>) {
            self.signals
                .borrow_mut()
                .push((signal, ctx.background_palette.is_some()));
        }
    }

    #[test]
    fn init_requires_the_lookup_table() {
        let services = Headless::new().services(Box::new(MemoryResourceStore::new()));
        assert!(matches!(
            SceneEngine::init(SceneConfig::new(LUT_RESOURCE), services),
            Err(SceneError::ResourceFetch {
                resource: LUT_RESOURCE,
                ..
            })
        ));
    }

    #[test]
    fn load_then_end_releases_every_buffer() {
        let (mut engine, headless) = engine();

        engine
            .load(SceneSource::Scene(1), SceneProc::Default)
            .expect("load");

        assert!(engine.is_loaded());
        assert_eq!(engine.mode(), RenderMode::Normal);
        assert_eq!(engine.scene_number(), Some(1));
        assert_eq!(engine.descriptor_resource(), Some(100));
        assert_eq!(engine.background_info().pixels.len(), 32);
        assert_eq!(
            engine.z_info(),
            ZInfo {
                begin_slope: 10,
                end_slope: 20
            }
        );
        let mask = engine.mask_info().expect("mask");
        assert_eq!((mask.width, mask.height), (8, 4));
        assert_eq!(engine.animation_count(), 1);
        {
            let state = headless.state();
            assert_eq!(state.object_map_records, Some(1));
            assert!(state.palette_cycle.is_some());
            assert_eq!(state.events.len(), 3);
        }

        engine.end().expect("end");

        assert_released(&engine, &headless);
        let state = headless.state();
        assert!(state.events.is_empty());
        assert_eq!(state.event_clears, 1);
        assert_eq!(state.text_clears, 1);
    }

    #[test]
    fn default_handler_queues_display_and_interface_events() {
        let (mut engine, headless) = engine();
        engine
            .load(SceneSource::Scene(1), SceneProc::Default)
            .expect("load");

        let events = headless
            .state()
            .events
            .iter()
            .map(|event| event.event().clone())
            .collect::<Vec<_>>();
        assert_eq!(
            events,
            vec![
                SceneEvent::BackgroundDisplay {
                    set_palette: true,
                    time_ms: 0
                },
                SceneEvent::InterfaceActivate { time_ms: 0 },
                SceneEvent::PaletteCycleStart { time_ms: 0 },
            ]
        );
    }

    #[test]
    fn end_signal_runs_while_resources_are_still_held() {
        let (mut engine, _) = engine();
        let recorder = Rc::new(Recorder::default());

        engine
            .load(SceneSource::Scene(1), SceneProc::Custom(recorder.clone()))
            .expect("load");
        engine.end().expect("end");

        assert_eq!(
            *recorder.signals.borrow(),
            vec![(SceneSignal::Begin, true), (SceneSignal::End, true)]
        );
    }

    #[test]
    fn second_load_is_rejected_while_loaded() {
        let (mut engine, _) = engine();
        engine
            .load(SceneSource::Scene(1), SceneProc::Default)
            .expect("load");

        assert!(matches!(
            engine.load(SceneSource::Scene(2), SceneProc::Default),
            Err(SceneError::AlreadyLoaded)
        ));
        assert_eq!(engine.scene_number(), Some(1));
    }

    #[test]
    fn operations_require_a_loaded_scene() {
        let (mut engine, _) = engine();
        let mut surface = Surface::new(8, 8);

        assert!(matches!(engine.end(), Err(SceneError::NotLoaded { .. })));
        assert!(matches!(engine.next(), Err(SceneError::NotLoaded { .. })));
        assert!(matches!(engine.skip(), Err(SceneError::NotLoaded { .. })));
        assert!(matches!(
            engine.change(1),
            Err(SceneError::NotLoaded { .. })
        ));
        assert!(matches!(
            engine.draw(&mut surface),
            Err(SceneError::NotLoaded { .. })
        ));
    }

    #[test]
    fn duplicate_background_fails_and_rolls_back() {
        let (mut engine, headless) = engine();

        assert!(matches!(
            engine.load(SceneSource::Scene(3), SceneProc::Default),
            Err(SceneError::DuplicateResource {
                resource: BACKGROUND,
                kind: ResourceKind::BackgroundImage
            })
        ));

        assert_released(&engine, &headless);
        assert_eq!(engine.scene_number(), None);
        assert!(headless.state().events.is_empty());
    }

    #[test]
    fn isometric_after_background_is_a_mode_conflict() {
        let (mut engine, headless) = engine();

        assert!(matches!(
            engine.load(SceneSource::Scene(4), SceneProc::Default),
            Err(SceneError::ModeConflict {
                resource: ISO_TILESET,
                mode: RenderMode::Normal,
                ..
            })
        ));
        assert_released(&engine, &headless);
    }

    #[test]
    fn background_after_isometric_is_a_mode_conflict() {
        let (mut engine, headless) = engine();

        assert!(matches!(
            engine.load(SceneSource::Resource(500), SceneProc::Default),
            Err(SceneError::ModeConflict {
                resource: BACKGROUND,
                mode: RenderMode::Isometric,
                ..
            })
        ));
        assert_released(&engine, &headless);
    }

    #[test]
    fn failed_script_load_rolls_back_the_scene() {
        let (mut engine, headless) = engine();

        assert!(matches!(
            engine.load(SceneSource::Resource(700), SceneProc::Default),
            Err(SceneError::Script { script: 9, .. })
        ));
        assert_released(&engine, &headless);

        engine
            .load(SceneSource::Scene(2), SceneProc::Default)
            .expect("retry with another scene");
        assert_eq!(headless.state().script, Some(7));
    }

    #[test]
    fn missing_resource_surfaces_as_fetch_error() {
        let (mut engine, headless) = engine();
        let inline = Rc::new(InlineScene {
            descriptor: descriptor(0, 0),
            resources: list(&[
                (OBJECT_MAP, ResourceKind::ObjectMap),
                (999, ResourceKind::ActionMap),
            ]),
        });

        assert!(matches!(
            engine.load(SceneSource::Descriptor(inline), SceneProc::Default),
            Err(SceneError::ResourceFetch { resource: 999, .. })
        ));
        assert_released(&engine, &headless);
    }

    #[test]
    fn inline_scene_stays_owned_by_the_caller() {
        let (mut engine, _) = engine();
        let inline = Rc::new(InlineScene {
            descriptor: descriptor(0, 0),
            resources: list(&[(BACKGROUND, ResourceKind::BackgroundImage)]),
        });

        engine
            .load(
                SceneSource::Descriptor(Rc::clone(&inline)),
                SceneProc::Default,
            )
            .expect("load");
        assert_eq!(Rc::strong_count(&inline), 2);
        assert_eq!(engine.descriptor_resource(), None);
        assert_eq!(engine.scene_number(), None);

        engine.end().expect("end");
        assert_eq!(Rc::strong_count(&inline), 1);
        assert_eq!(inline.resources.len(), 1);
    }

    #[test]
    fn next_on_single_entry_queue_leaves_engine_idle() {
        let (mut engine, headless) = engine();
        engine.queue_mut().enqueue(scene_entry(1));
        engine.start().expect("start");
        assert!(engine.is_loaded());

        engine.next().expect("next");

        assert!(engine.queue().is_empty());
        assert_released(&engine, &headless);
    }

    #[test]
    fn next_loads_the_following_entry() {
        let (mut engine, _) = engine();
        engine.queue_mut().enqueue(scene_entry(1));
        engine.queue_mut().enqueue(scene_entry(2));
        engine.start().expect("start");

        engine.next().expect("next");

        assert_eq!(engine.scene_number(), Some(2));
        assert_eq!(engine.mode(), RenderMode::Isometric);
        assert_eq!(engine.queue().len(), 1);
    }

    #[test]
    fn start_with_empty_queue_is_a_no_op() {
        let (mut engine, _) = engine();
        engine.start().expect("start");
        assert!(!engine.is_loaded());

        engine.queue_mut().enqueue(scene_entry(1));
        engine.start().expect("start");
        assert!(matches!(engine.start(), Err(SceneError::AlreadyLoaded)));
    }

    #[test]
    fn skip_drops_entries_before_the_target() {
        let (mut engine, _) = engine();
        engine.queue_mut().enqueue(scene_entry(1));
        engine.queue_mut().enqueue(scene_entry(2));
        engine
            .queue_mut()
            .enqueue(SceneQueueEntry::new(SceneSource::Resource(600)).as_skip_target());
        engine.queue_mut().enqueue(scene_entry(1));
        engine.start().expect("start");

        engine.skip().expect("skip");

        assert_eq!(engine.descriptor_resource(), Some(600));
        assert_eq!(engine.queue().len(), 2);
        assert!(engine.queue().head().expect("head").skip_target);
    }

    #[test]
    fn skip_loads_an_adjacent_target() {
        let (mut engine, _) = engine();
        engine.queue_mut().enqueue(scene_entry(1));
        engine.queue_mut().enqueue(scene_entry(2).as_skip_target());
        engine.queue_mut().enqueue(scene_entry(1));
        engine.start().expect("start");

        engine.skip().expect("skip");

        assert_eq!(engine.scene_number(), Some(2));
        assert_eq!(engine.queue().len(), 2);
    }

    #[test]
    fn skip_without_target_keeps_the_current_scene() {
        let (mut engine, _) = engine();
        engine.queue_mut().enqueue(scene_entry(1));
        engine.queue_mut().enqueue(scene_entry(2));
        engine.start().expect("start");

        engine.skip().expect("skip");

        assert_eq!(engine.scene_number(), Some(1));
        assert_eq!(engine.queue().len(), 2);
    }

    #[test]
    fn skip_with_empty_queue_is_an_error() {
        let (mut engine, _) = engine();
        engine
            .load(SceneSource::Scene(1), SceneProc::Default)
            .expect("load");

        assert!(matches!(engine.skip(), Err(SceneError::EmptyQueue)));
        assert!(engine.is_loaded());
    }

    #[test]
    fn change_validates_before_leaving_the_current_scene() {
        let (mut engine, _) = engine();
        engine
            .load(SceneSource::Scene(1), SceneProc::Default)
            .expect("load");

        assert!(matches!(engine.change(0), Err(SceneError::Range { .. })));
        assert!(matches!(engine.change(6), Err(SceneError::Range { .. })));
        assert!(matches!(
            engine.change(5),
            Err(SceneError::ZeroEntry { index: 5 })
        ));
        assert_eq!(engine.scene_number(), Some(1));
        assert!(engine.is_loaded());

        engine.change(2).expect("change");
        assert_eq!(engine.scene_number(), Some(2));
        assert_eq!(engine.descriptor_resource(), Some(200));
    }

    #[test]
    fn draw_centres_a_small_background() {
        let (mut engine, _) = engine();
        engine
            .load(SceneSource::Scene(1), SceneProc::Default)
            .expect("load");
        let info = engine.background_info();
        assert_eq!((info.x, info.y), (156, 66));

        let mut surface = Surface::new(320, 137);
        engine.draw(&mut surface).expect("draw");

        assert_eq!(surface.pixel(156, 66), Some(5));
        assert_eq!(surface.pixel(163, 69), Some(5));
        assert_eq!(surface.pixel(155, 66), Some(0));
        assert_eq!(surface.pixel(164, 70), Some(0));
    }

    #[test]
    fn draw_delegates_isometric_scenes() {
        let (mut engine, _) = engine();
        engine
            .load(SceneSource::Scene(2), SceneProc::Default)
            .expect("load");
        let mut surface = Surface::new(16, 16);
        surface.fill(9);

        engine.draw(&mut surface).expect("draw");

        assert_eq!(surface.pixel(0, 0), Some(3));
        assert_eq!(surface.pixel(1, 0), Some(4));
        assert_eq!(surface.pixel(2, 0), Some(0));
    }

    #[test]
    fn draw_without_terrain_is_a_render_error() {
        let (mut engine, _) = engine();
        engine
            .load(SceneSource::Resource(600), SceneProc::Default)
            .expect("load");

        assert!(matches!(
            engine.draw(&mut Surface::new(4, 4)),
            Err(SceneError::Render { .. })
        ));
    }

    #[test]
    fn initial_handler_plays_the_first_animation() {
        let (mut engine, headless) = engine();
        engine
            .load(SceneSource::Scene(1), SceneProc::Initial)
            .expect("load");

        let state = headless.state();
        assert_eq!(state.music_stops, 1);
        assert_eq!(state.animations[0].play_delay_ms, Some(1000));
        assert!(state.animations[0].looping);
        assert!(matches!(
            state.events.last(),
            Some(QueuedEvent::Chained(SceneEvent::PaletteCycleStart { .. }))
        ));
    }

    #[test]
    fn shutdown_ends_the_loaded_scene() {
        let (mut engine, headless) = engine();
        engine.queue_mut().enqueue(scene_entry(2));
        engine.start().expect("start");
        assert_eq!(headless.state().script, Some(7));

        let _services = engine.shutdown();

        let state = headless.state();
        assert!(state.script.is_none());
        assert!(state.iso_tileset.is_none());
        assert!(state.action_map_records.is_none());
    }
}
