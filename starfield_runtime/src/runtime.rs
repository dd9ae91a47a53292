use crate::FrameLoop;
use starfield_render_bridge::{RenderCommand, RenderEvent};
use starfield_scene::{Scene, SharedScene, lock_scene, shared_scene};

pub struct Timing {
    pub delta: f32,
    pub elapsed: f32,
}

/// Runtime-side render exchange state:
/// queued outgoing commands and a tally of what the renderer reported back.
#[derive(Default)]
struct RenderState {
    pending_commands: Vec<RenderCommand>,
    rejected_draws: u64,
    failures: u64,
}

impl RenderState {
    fn drain_commands(&mut self, out: &mut Vec<RenderCommand>) {
        out.append(&mut self.pending_commands);
    }

    fn apply_event(&mut self, event: RenderEvent) {
        match event {
            RenderEvent::DrawRejected { node, mesh, .. } => {
                self.rejected_draws += 1;
                log::warn!("renderer rejected draw of node {node} (mesh {mesh})");
            }
            RenderEvent::Failed { reason } => {
                self.failures += 1;
                log::warn!("renderer failure: {reason}");
            }
        }
    }
}

pub struct Runtime {
    pub scene: SharedScene,
    pub frames: FrameLoop,
    pub time: Timing,
    render: RenderState,
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_scene(shared_scene(Scene::new()))
    }

    pub fn with_scene(scene: SharedScene) -> Self {
        Self {
            scene,
            frames: FrameLoop::new(),
            time: Timing {
                delta: 0.0,
                elapsed: 0.0,
            },
            render: RenderState::default(),
        }
    }

    /// Advances time and runs every scheduled frame task once.
    pub fn update(&mut self, delta_time: f32) {
        self.time.delta = delta_time;
        self.time.elapsed += delta_time;
        self.frames.tick(delta_time);
    }

    pub fn extract_render_3d_commands(&mut self) {
        let mut scene = lock_scene(&self.scene);
        scene.extract_render_3d_commands();
        scene.drain_render_commands(&mut self.render.pending_commands);
    }

    pub fn drain_render_commands(&mut self, out: &mut Vec<RenderCommand>) {
        self.render.drain_commands(out);
    }

    pub fn apply_render_events<I>(&mut self, events: I)
    where
        I: IntoIterator<Item = RenderEvent>,
    {
        for event in events {
            self.render.apply_event(event);
        }
    }

    pub fn rejected_draws(&self) -> u64 {
        self.render.rejected_draws
    }

    pub fn render_failures(&self) -> u64 {
        self.render.failures
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::Runtime;
    use starfield_render_bridge::{Command3D, RenderCommand, RenderEvent};
    use starfield_scene::{ModelData, lock_scene, presets};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn update_advances_time_and_ticks_tasks() {
        let mut runtime = Runtime::new();
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        runtime.frames.schedule(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        runtime.update(0.5);
        runtime.update(0.25);
        assert_eq!(runtime.time.delta, 0.25);
        assert_eq!(runtime.time.elapsed, 0.75);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn extract_collects_uploads_and_draws() {
        let mut runtime = Runtime::new();
        {
            let mut scene = lock_scene(&runtime.scene);
            let model = ModelData::builtin(presets::CUBE).unwrap();
            let cube = scene.spawn_model(&model);
            let root = scene.root();
            scene.add_child(root, cube);
        }

        runtime.extract_render_3d_commands();
        let mut out = Vec::new();
        runtime.drain_render_commands(&mut out);
        assert!(matches!(out.first(), Some(RenderCommand::Resource(_))));
        assert!(
            out.iter()
                .any(|c| matches!(c, RenderCommand::ThreeD(Command3D::Draw { .. })))
        );
    }

    #[test]
    fn render_events_are_tallied() {
        let mut runtime = Runtime::new();
        runtime.apply_render_events([
            RenderEvent::Failed {
                reason: "boom".into(),
            },
            RenderEvent::DrawRejected {
                node: Default::default(),
                mesh: Default::default(),
                material: Default::default(),
            },
        ]);
        assert_eq!(runtime.render_failures(), 1);
        assert_eq!(runtime.rejected_draws(), 1);
    }
}
