use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::rendering::Palette;
use crate::services::{
    AnimationHandle, AnimationPlayer, EventQueue, PaletteFade, SceneEvent, SoundControl,
};

pub const PALETTE_FADE_DURATION_MS: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneSignal {
    Begin,
    End,
}

/// Collaborators a scene handler may schedule work on.
pub struct SceneProcContext<'a> {
    pub events: &'a mut dyn EventQueue,
    pub animations: &'a mut dyn AnimationPlayer,
    pub sound: &'a mut dyn SoundControl,
    pub background_palette: Option<&'a Palette>,
}

/// Caller-supplied begin/end behaviour for one scene.
pub trait SceneHandler {
    fn on_signal(&self, signal: SceneSignal, ctx: &mut SceneProcContext<'_>);
}

#[derive(Clone, Default)]
pub enum SceneProc {
    /// Shows the background, activates the interface and starts palette cycling.
    #[default]
    Default,
    /// Intro hand-off: fades the previous picture out and the first scene in.
    Initial,
    Custom(Rc<dyn SceneHandler>),
}

impl fmt::Debug for SceneProc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneProc::Default => f.write_str("Default"),
            SceneProc::Initial => f.write_str("Initial"),
            SceneProc::Custom(_) => f.write_str("Custom"),
        }
    }
}

impl SceneProc {
    pub(crate) fn invoke(&self, signal: SceneSignal, ctx: &mut SceneProcContext<'_>) {
        match self {
            SceneProc::Default => default_scene(signal, ctx),
            SceneProc::Initial => initial_scene(signal, ctx),
            SceneProc::Custom(handler) => handler.on_signal(signal, ctx),
        }
    }
}

fn default_scene(signal: SceneSignal, ctx: &mut SceneProcContext<'_>) {
    if signal == SceneSignal::End {
        return;
    }

    ctx.events.queue(SceneEvent::BackgroundDisplay {
        set_palette: true,
        time_ms: 0,
    });
    ctx.events.queue(SceneEvent::InterfaceActivate { time_ms: 0 });
    ctx.events.queue(SceneEvent::PaletteCycleStart { time_ms: 0 });
}

fn initial_scene(signal: SceneSignal, ctx: &mut SceneProcContext<'_>) {
    if signal == SceneSignal::End {
        return;
    }

    ctx.sound.stop_music();
    ctx.sound.stop_voice();

    let mut delay_ms = 0;
    ctx.events.queue(SceneEvent::PaletteFade {
        fade: PaletteFade::ToBlack,
        target: None,
        time_ms: 0,
        duration_ms: PALETTE_FADE_DURATION_MS,
    });
    delay_ms += PALETTE_FADE_DURATION_MS;

    ctx.events.chain(SceneEvent::InterfaceActivate { time_ms: 0 });
    // The new background goes up while the screen is black; its palette fades in next.
    ctx.events.chain(SceneEvent::BackgroundDisplay {
        set_palette: false,
        time_ms: 0,
    });
    ctx.events.chain(SceneEvent::PaletteFade {
        fade: PaletteFade::FromBlack,
        target: ctx.background_palette.cloned().map(Box::new),
        time_ms: delay_ms,
        duration_ms: PALETTE_FADE_DURATION_MS,
    });
    ctx.events.chain(SceneEvent::PaletteCycleStart { time_ms: 0 });

    let intro = AnimationHandle(0);
    ctx.animations.set_looping(intro);
    if let Err(error) = ctx.animations.play(intro, delay_ms) {
        warn!(error = %error, "initial_scene_animation_failed");
    }
    debug!("initial_scene_started");
}
