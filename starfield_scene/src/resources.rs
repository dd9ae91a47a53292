use crate::Material;
use starfield_ids::{MaterialID, MeshID, SlotAllocator};
use starfield_render_bridge::{Geometry, RenderCommand, ResourceCommand};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceStats {
    pub meshes_created: u64,
    pub meshes_released: u64,
    pub materials_created: u64,
    pub materials_released: u64,
}

/// Scene-side registry of GPU resources. Every create/update/release is mirrored as a
/// `ResourceCommand` for the renderer; releasing a stale id is a no-op.
#[derive(Default)]
pub struct ResourceStore {
    mesh_slots: SlotAllocator,
    meshes: Vec<Option<Arc<Geometry>>>,
    material_slots: SlotAllocator,
    materials: Vec<Option<Material>>,
    pending: Vec<ResourceCommand>,
    stats: ResourceStats,
}

fn store<T>(slots: &mut Vec<Option<T>>, index: u32, value: T) {
    let index = index as usize;
    if slots.len() <= index {
        slots.resize_with(index + 1, || None);
    }
    slots[index] = Some(value);
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_mesh(&mut self, geometry: Arc<Geometry>) -> MeshID {
        let (index, generation) = self.mesh_slots.alloc();
        let id = MeshID::from_parts(index, generation);
        store(&mut self.meshes, index, Arc::clone(&geometry));
        self.stats.meshes_created += 1;
        self.pending
            .push(ResourceCommand::UploadMesh { id, geometry });
        id
    }

    /// New mesh id over the same read-only geometry data.
    pub fn clone_mesh(&mut self, id: MeshID) -> Option<MeshID> {
        let geometry = Arc::clone(self.mesh(id)?);
        Some(self.create_mesh(geometry))
    }

    pub fn mesh(&self, id: MeshID) -> Option<&Arc<Geometry>> {
        if !self.has_mesh(id) {
            return None;
        }
        self.meshes.get(id.index() as usize)?.as_ref()
    }

    #[inline]
    pub fn has_mesh(&self, id: MeshID) -> bool {
        self.mesh_slots.is_live(id.index(), id.generation())
    }

    pub fn release_mesh(&mut self, id: MeshID) -> bool {
        if !self.mesh_slots.free(id.index(), id.generation()) {
            return false;
        }
        self.meshes[id.index() as usize] = None;
        self.stats.meshes_released += 1;
        self.pending.push(ResourceCommand::ReleaseMesh { id });
        true
    }

    pub fn create_material(&mut self, material: Material) -> MaterialID {
        let (index, generation) = self.material_slots.alloc();
        let id = MaterialID::from_parts(index, generation);
        self.pending.push(ResourceCommand::UploadMaterial {
            id,
            material: material.to_state(),
        });
        store(&mut self.materials, index, material);
        self.stats.materials_created += 1;
        id
    }

    pub fn clone_material(&mut self, id: MaterialID) -> Option<MaterialID> {
        let material = self.material(id)?.clone();
        Some(self.create_material(material))
    }

    pub fn material(&self, id: MaterialID) -> Option<&Material> {
        if !self.has_material(id) {
            return None;
        }
        self.materials.get(id.index() as usize)?.as_ref()
    }

    #[inline]
    pub fn has_material(&self, id: MaterialID) -> bool {
        self.material_slots.is_live(id.index(), id.generation())
    }

    /// Mutates a live material and re-uploads it. Returns false for stale ids.
    pub fn update_material<F>(&mut self, id: MaterialID, f: F) -> bool
    where
        F: FnOnce(&mut Material),
    {
        if !self.has_material(id) {
            return false;
        }
        let Some(material) = self
            .materials
            .get_mut(id.index() as usize)
            .and_then(Option::as_mut)
        else {
            return false;
        };
        f(material);
        let state = material.to_state();
        self.pending.push(ResourceCommand::UploadMaterial {
            id,
            material: state,
        });
        true
    }

    pub fn release_material(&mut self, id: MaterialID) -> bool {
        if !self.material_slots.free(id.index(), id.generation()) {
            return false;
        }
        self.materials[id.index() as usize] = None;
        self.stats.materials_released += 1;
        self.pending.push(ResourceCommand::ReleaseMaterial { id });
        true
    }

    pub fn live_meshes(&self) -> usize {
        self.mesh_slots.live_count()
    }

    pub fn live_materials(&self) -> usize {
        self.material_slots.live_count()
    }

    pub fn stats(&self) -> ResourceStats {
        self.stats
    }

    pub fn drain_commands(&mut self, out: &mut Vec<RenderCommand>) {
        out.extend(self.pending.drain(..).map(RenderCommand::Resource));
    }
}
