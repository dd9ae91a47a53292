use starfield_ids::{MaterialID, MeshID, NodeID};
use std::sync::Arc;

/// Index range drawn with one material of a multi-material mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRange {
    pub start: u32,
    pub count: u32,
}

/// Vertex data shared read-only between the scene and the renderer.
/// Cloned meshes point at the same `Arc<Geometry>` but own their own `MeshID`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Geometry {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    /// Empty means the whole index buffer is one group.
    pub groups: Vec<IndexRange>,
}

impl Geometry {
    pub fn vertex_count(&self) -> u32 {
        self.positions.len() as u32
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

/// GPU-facing snapshot of a material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialState {
    pub base_color: [f32; 3],
    pub emissive: [f32; 3],
    pub emissive_intensity: f32,
    pub metallic: f32,
    pub roughness: f32,
}

impl Default for MaterialState {
    fn default() -> Self {
        Self {
            base_color: [1.0, 1.0, 1.0],
            emissive: [0.0, 0.0, 0.0],
            emissive_intensity: 1.0,
            metallic: 0.0,
            roughness: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ResourceCommand {
    UploadMesh {
        id: MeshID,
        geometry: Arc<Geometry>,
    },
    UploadMaterial {
        id: MaterialID,
        material: MaterialState,
    },
    ReleaseMesh {
        id: MeshID,
    },
    ReleaseMaterial {
        id: MaterialID,
    },
}

#[derive(Debug, Clone)]
pub enum Command3D {
    Draw {
        node: NodeID,
        submesh: u32,
        mesh: MeshID,
        material: MaterialID,
        model: [[f32; 4]; 4],
    },
    RemoveNode {
        node: NodeID,
    },
}

#[derive(Debug, Clone)]
pub enum RenderCommand {
    Resource(ResourceCommand),
    ThreeD(Command3D),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    DrawRejected {
        node: NodeID,
        mesh: MeshID,
        material: MaterialID,
    },
    Failed {
        reason: String,
    },
}

pub trait RenderBridge {
    fn submit(&mut self, command: RenderCommand);

    fn submit_many<I>(&mut self, commands: I)
    where
        I: IntoIterator<Item = RenderCommand>,
    {
        for command in commands {
            self.submit(command);
        }
    }

    fn drain_events(&mut self, out: &mut Vec<RenderEvent>);
}
