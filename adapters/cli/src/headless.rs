//! Windowless rendering backend that replays scripted input.

use std::{collections::BTreeMap, time::Duration};

use anyhow::Result;
use glam::Vec2;
use space_defense_rendering::{
    FrameControl, FrameInput, Presentation, RenderingBackend, Scene, VisualHandle, VisualKind,
    VisualSubstrate, VisualSync,
};
use tracing::{debug, info, trace};

/// Runs frames back to back without presenting anything.
#[derive(Debug)]
pub(crate) struct HeadlessBackend {
    frame: Duration,
    inputs: BTreeMap<u64, FrameInput>,
}

impl HeadlessBackend {
    /// Creates a backend stepping `frame` per frame and feeding `inputs`,
    /// keyed by frame index.
    pub(crate) fn new(frame: Duration, inputs: BTreeMap<u64, FrameInput>) -> Self {
        Self { frame, inputs }
    }
}

impl RenderingBackend for HeadlessBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) -> FrameControl + 'static,
    {
        let Self { frame, mut inputs } = self;
        let Presentation {
            window_title,
            clear_color,
            mut scene,
        } = presentation;
        info!(title = %window_title, ?clear_color, "headless backend started");

        let mut substrate = TracingSubstrate::default();
        let mut sync = VisualSync::new();
        sync.present(&scene, Duration::ZERO, &mut substrate);

        let mut frames = 0_u64;
        loop {
            let input = inputs.remove(&frames).unwrap_or_default();
            if !input.is_empty() {
                debug!(frame = frames, ?input, "replaying input");
            }
            let control = update_scene(frame, input, &mut scene);
            sync.present(&scene, frame, &mut substrate);
            frames += 1;
            if control == FrameControl::Exit {
                break;
            }
        }

        info!(
            frames,
            visuals = substrate.live.len(),
            effects = sync.active_effects(),
            spawned = substrate.next,
            "headless backend stopped"
        );
        Ok(())
    }
}

/// Substrate that records visuals and traces every call.
#[derive(Debug, Default)]
struct TracingSubstrate {
    next: u64,
    live: BTreeMap<VisualHandle, VisualKind>,
}

impl VisualSubstrate for TracingSubstrate {
    fn spawn_visual(&mut self, kind: VisualKind, position: Vec2) -> VisualHandle {
        let handle = VisualHandle::new(self.next);
        self.next += 1;
        let _ = self.live.insert(handle, kind);
        match kind {
            VisualKind::Effect(effect) => trace!(
                handle = handle.get(),
                ?effect,
                radius = effect.radius(),
                color = ?effect.color(),
                x = position.x,
                y = position.y,
                "effect spawned"
            ),
            _ => trace!(handle = handle.get(), ?kind, x = position.x, y = position.y, "visual spawned"),
        }
        handle
    }

    fn set_position(&mut self, handle: VisualHandle, position: Vec2) {
        trace!(handle = handle.get(), x = position.x, y = position.y, "visual moved");
    }

    fn set_scale(&mut self, handle: VisualHandle, scale: f32) {
        trace!(handle = handle.get(), scale, "visual scaled");
    }

    fn set_alpha(&mut self, handle: VisualHandle, alpha: f32) {
        trace!(handle = handle.get(), alpha, "visual faded");
    }

    fn destroy(&mut self, handle: VisualHandle) {
        if self.live.remove(&handle).is_some() {
            trace!(handle = handle.get(), "visual destroyed");
        }
    }
}
