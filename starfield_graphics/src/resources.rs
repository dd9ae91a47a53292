use starfield_ids::{MaterialID, MeshID};
use starfield_render_bridge::{Geometry, MaterialState};
use ahash::AHashMap;
use std::sync::Arc;

/// Renderer-side view of which resources are uploaded and drawable.
#[derive(Default)]
pub struct ResourceStore {
    live_meshes: AHashMap<MeshID, Arc<Geometry>>,
    live_materials: AHashMap<MaterialID, MaterialState>,
    released_meshes: u64,
    released_materials: u64,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upload_mesh(&mut self, id: MeshID, geometry: Arc<Geometry>) {
        self.live_meshes.insert(id, geometry);
    }

    pub fn upload_material(&mut self, id: MaterialID, material: MaterialState) {
        self.live_materials.insert(id, material);
    }

    /// Returns false if the mesh was never uploaded or is already gone.
    pub fn release_mesh(&mut self, id: MeshID) -> bool {
        let released = self.live_meshes.remove(&id).is_some();
        if released {
            self.released_meshes += 1;
        }
        released
    }

    pub fn release_material(&mut self, id: MaterialID) -> bool {
        let released = self.live_materials.remove(&id).is_some();
        if released {
            self.released_materials += 1;
        }
        released
    }

    #[inline]
    pub fn has_mesh(&self, id: MeshID) -> bool {
        self.live_meshes.contains_key(&id)
    }

    #[inline]
    pub fn has_material(&self, id: MaterialID) -> bool {
        self.live_materials.contains_key(&id)
    }

    pub fn material(&self, id: MaterialID) -> Option<&MaterialState> {
        self.live_materials.get(&id)
    }

    pub fn live_mesh_count(&self) -> usize {
        self.live_meshes.len()
    }

    pub fn live_material_count(&self) -> usize {
        self.live_materials.len()
    }

    pub fn released_mesh_count(&self) -> u64 {
        self.released_meshes
    }

    pub fn released_material_count(&self) -> u64 {
        self.released_materials
    }
}
