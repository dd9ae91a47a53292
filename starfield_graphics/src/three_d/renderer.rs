use crate::resources::ResourceStore;
use starfield_ids::{MaterialID, MeshID, NodeID};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Draw3DInstance {
    pub node: NodeID,
    pub submesh: u32,
    pub mesh: MeshID,
    pub material: MaterialID,
    pub model: [[f32; 4]; 4],
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Renderer3DStats {
    pub accepted_draws: u32,
    pub rejected_draws: u32,
}

/// Retained draw list keyed by (node, submesh). Draws that reference resources the
/// store does not hold are rejected and drop any retained entry for that key.
#[derive(Default)]
pub struct Renderer3D {
    queued_draws: Vec<Draw3DInstance>,
    retained_draws: HashMap<(NodeID, u32), Draw3DInstance>,
    rejected: Vec<Draw3DInstance>,
}

impl Renderer3D {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_draw(&mut self, draw: Draw3DInstance) {
        self.queued_draws.push(draw);
    }

    pub fn remove_node(&mut self, node: NodeID) {
        self.retained_draws.retain(|(owner, _), _| *owner != node);
    }

    /// Drops retained draws whose mesh or material has since been released.
    pub fn forget_released(&mut self, resources: &ResourceStore) {
        self.retained_draws.retain(|_, draw| {
            resources.has_mesh(draw.mesh) && resources.has_material(draw.material)
        });
    }

    pub fn prepare_frame(&mut self, resources: &ResourceStore) -> Renderer3DStats {
        let mut stats = Renderer3DStats::default();
        for draw in self.queued_draws.drain(..) {
            let key = (draw.node, draw.submesh);
            if resources.has_mesh(draw.mesh) && resources.has_material(draw.material) {
                self.retained_draws.insert(key, draw);
                stats.accepted_draws = stats.accepted_draws.saturating_add(1);
            } else {
                self.retained_draws.remove(&key);
                self.rejected.push(draw);
                stats.rejected_draws = stats.rejected_draws.saturating_add(1);
            }
        }
        stats
    }

    pub fn take_rejected(&mut self) -> Vec<Draw3DInstance> {
        std::mem::take(&mut self.rejected)
    }

    pub fn retained_draw(&self, node: NodeID, submesh: u32) -> Option<Draw3DInstance> {
        self.retained_draws.get(&(node, submesh)).copied()
    }

    pub fn retained_draw_count(&self) -> usize {
        self.retained_draws.len()
    }

    pub fn retained_draws(&self) -> impl Iterator<Item = Draw3DInstance> + '_ {
        self.retained_draws.values().copied()
    }
}
