mod color;
mod material;
mod model;
mod node;
mod node_arena;
pub mod presets;
mod resources;
mod scene;
mod transform;

pub use color::{Color, ColorError};
pub use material::Material;
pub use model::{ModelData, ModelError, ModelNode, ModelPrimitive};
pub use node::{MaterialSlot, MeshNode, NodeKind, NodeTag, SceneNode};
pub use node_arena::NodeArena;
pub use resources::{ResourceStats, ResourceStore};
pub use scene::{DisposeStats, Scene};
pub use transform::Transform3D;

pub use glam;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Scene shared between the host loop, frame tasks, and async loaders.
pub type SharedScene = Arc<Mutex<Scene>>;

pub fn shared_scene(scene: Scene) -> SharedScene {
    Arc::new(Mutex::new(scene))
}

/// Locks the scene, recovering the guard if a previous holder panicked.
pub fn lock_scene(scene: &SharedScene) -> MutexGuard<'_, Scene> {
    scene.lock().unwrap_or_else(PoisonError::into_inner)
}
