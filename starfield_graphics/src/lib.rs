mod resources;
pub mod three_d;

pub use resources::ResourceStore;
pub use three_d::renderer::{Draw3DInstance, Renderer3D, Renderer3DStats};

use starfield_render_bridge::{
    Command3D, RenderBridge, RenderCommand, RenderEvent, ResourceCommand,
};

pub trait GraphicsBackend: RenderBridge {
    fn draw_frame(&mut self);
}

#[derive(Default)]
struct FrameState {
    pending_commands: Vec<RenderCommand>,
}

impl FrameState {
    fn queue(&mut self, command: RenderCommand) {
        self.pending_commands.push(command);
    }

    fn take_pending(&mut self) -> Vec<RenderCommand> {
        std::mem::take(&mut self.pending_commands)
    }
}

/// Headless backend: applies every command to its resource store and retained draw list
/// but never touches a GPU.
#[derive(Default)]
pub struct NullGraphics {
    frame: FrameState,
    resources: ResourceStore,
    renderer_3d: Renderer3D,
    events: Vec<RenderEvent>,
    last_stats: Renderer3DStats,
    frames_drawn: u64,
}

impl NullGraphics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resources(&self) -> &ResourceStore {
        &self.resources
    }

    pub fn renderer(&self) -> &Renderer3D {
        &self.renderer_3d
    }

    pub fn last_stats(&self) -> Renderer3DStats {
        self.last_stats
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    fn process_commands(&mut self, commands: Vec<RenderCommand>) {
        for command in commands {
            match command {
                RenderCommand::Resource(resource_cmd) => self.apply_resource(resource_cmd),
                RenderCommand::ThreeD(cmd_3d) => match cmd_3d {
                    Command3D::Draw {
                        node,
                        submesh,
                        mesh,
                        material,
                        model,
                    } => self.renderer_3d.queue_draw(Draw3DInstance {
                        node,
                        submesh,
                        mesh,
                        material,
                        model,
                    }),
                    Command3D::RemoveNode { node } => self.renderer_3d.remove_node(node),
                },
            }
        }
    }

    fn apply_resource(&mut self, command: ResourceCommand) {
        match command {
            ResourceCommand::UploadMesh { id, geometry } => {
                self.resources.upload_mesh(id, geometry);
            }
            ResourceCommand::UploadMaterial { id, material } => {
                self.resources.upload_material(id, material);
            }
            ResourceCommand::ReleaseMesh { id } => {
                if !self.resources.release_mesh(id) {
                    self.events.push(RenderEvent::Failed {
                        reason: format!("release of unknown mesh {id}"),
                    });
                }
            }
            ResourceCommand::ReleaseMaterial { id } => {
                if !self.resources.release_material(id) {
                    self.events.push(RenderEvent::Failed {
                        reason: format!("release of unknown material {id}"),
                    });
                }
            }
        }
    }
}

impl RenderBridge for NullGraphics {
    fn submit(&mut self, command: RenderCommand) {
        self.frame.queue(command);
    }

    fn submit_many<I>(&mut self, commands: I)
    where
        I: IntoIterator<Item = RenderCommand>,
    {
        self.frame.pending_commands.extend(commands);
    }

    fn drain_events(&mut self, out: &mut Vec<RenderEvent>) {
        out.append(&mut self.events);
    }
}

impl GraphicsBackend for NullGraphics {
    fn draw_frame(&mut self) {
        let commands = self.frame.take_pending();
        self.process_commands(commands);
        self.renderer_3d.forget_released(&self.resources);
        self.last_stats = self.renderer_3d.prepare_frame(&self.resources);
        for draw in self.renderer_3d.take_rejected() {
            log::warn!(
                "rejected draw for node {} (mesh {}, material {})",
                draw.node,
                draw.mesh,
                draw.material
            );
            self.events.push(RenderEvent::DrawRejected {
                node: draw.node,
                mesh: draw.mesh,
                material: draw.material,
            });
        }
        self.frames_drawn += 1;
    }
}
