use crate::{
    MaterialSlot, MeshNode, ModelData, NodeArena, NodeKind, NodeTag, ResourceStore, SceneNode,
    Transform3D,
};
use glam::Mat4;
use starfield_ids::NodeID;
use starfield_render_bridge::{Command3D, RenderCommand};

/// What a `dispose_subtree` call actually released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisposeStats {
    pub nodes: usize,
    pub meshes: usize,
    pub materials: usize,
}

/// Scene graph rooted at a single group node. Nodes spawned without a parent stay detached
/// (kept alive, never drawn) until added under the root.
pub struct Scene {
    nodes: NodeArena,
    root: NodeID,
    resources: ResourceStore,
    pending_3d: Vec<Command3D>,
    traversal: Vec<(NodeID, Mat4)>,
}

impl Scene {
    pub fn new() -> Self {
        let mut nodes = NodeArena::new();
        let root = nodes.insert(SceneNode::group().with_name("root"));
        Self {
            nodes,
            root,
            resources: ResourceStore::new(),
            pending_3d: Vec::new(),
            traversal: Vec::new(),
        }
    }

    #[inline]
    pub fn root(&self) -> NodeID {
        self.root
    }

    pub fn node(&self, id: NodeID) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeID) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id)
    }

    pub fn contains(&self, id: NodeID) -> bool {
        self.nodes.contains(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn resources(&self) -> &ResourceStore {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut ResourceStore {
        &mut self.resources
    }

    /// Insert a node without a parent.
    pub fn spawn(&mut self, mut node: SceneNode) -> NodeID {
        node.parent = NodeID::nil();
        node.children.clear();
        self.nodes.insert(node)
    }

    /// Re-parents `child` under `parent`. Refuses unknown ids, the root, and cycles.
    pub fn add_child(&mut self, parent: NodeID, child: NodeID) -> bool {
        if child == self.root
            || !self.nodes.contains(parent)
            || !self.nodes.contains(child)
            || self.is_ancestor_or_self(child, parent)
        {
            return false;
        }
        self.detach(child);
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = parent;
        }
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(child);
        }
        true
    }

    /// Unlinks `id` from its parent and tells the renderer to stop drawing its meshes.
    /// The subtree stays alive. Returns false if `id` had no parent.
    pub fn detach(&mut self, id: NodeID) -> bool {
        let Some(parent) = self.nodes.get(id).map(|n| n.parent) else {
            return false;
        };
        if parent.is_nil() {
            return false;
        }
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.retain(|c| *c != id);
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = NodeID::nil();
        }
        for node_id in self.descendants(id) {
            if matches!(
                self.nodes.get(node_id).map(|n| &n.kind),
                Some(NodeKind::Mesh(_))
            ) {
                self.pending_3d.push(Command3D::RemoveNode { node: node_id });
            }
        }
        true
    }

    fn is_ancestor_or_self(&self, ancestor: NodeID, mut id: NodeID) -> bool {
        while !id.is_nil() {
            if id == ancestor {
                return true;
            }
            id = self.nodes.get(id).map_or(NodeID::nil(), |n| n.parent);
        }
        false
    }

    /// True if `id` is reachable from the root.
    pub fn is_attached(&self, id: NodeID) -> bool {
        self.nodes.contains(id) && self.is_ancestor_or_self(self.root, id)
    }

    /// Pre-order list of `id` and everything below it. Empty for unknown ids.
    pub fn descendants(&self, id: NodeID) -> Vec<NodeID> {
        let mut out = Vec::new();
        if !self.nodes.contains(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            if let Some(node) = self.nodes.get(current) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    pub fn world_matrix(&self, id: NodeID) -> Option<Mat4> {
        let mut matrix = self.nodes.get(id)?.transform.to_mat4();
        let mut parent = self.nodes.get(id)?.parent;
        while let Some(node) = self.nodes.get(parent) {
            matrix = node.transform.to_mat4() * matrix;
            parent = node.parent;
        }
        Some(matrix)
    }

    /// Deep copy of a subtree. Every mesh gets a fresh mesh id over the same geometry and
    /// fresh copies of its materials, so the clone can be recolored and released on its own.
    /// The copy is detached. If any part cannot be copied, whatever was already copied is
    /// released and `None` is returned.
    pub fn clone_subtree(&mut self, source: NodeID) -> Option<NodeID> {
        let mut node = self.nodes.get(source)?.clone();
        let children = std::mem::take(&mut node.children);
        if let NodeKind::Mesh(mesh) = &mut node.kind {
            if !self.clone_mesh_resources(mesh) {
                log::debug!("clone of node {source} failed: stale mesh resources");
                return None;
            }
        }
        let copy = self.spawn(node);
        for child in children {
            match self.clone_subtree(child) {
                Some(child_copy) => {
                    self.add_child(copy, child_copy);
                }
                None => {
                    self.dispose_subtree(copy);
                    return None;
                }
            }
        }
        Some(copy)
    }

    fn clone_mesh_resources(&mut self, mesh: &mut MeshNode) -> bool {
        let Some(mesh_id) = self.resources.clone_mesh(mesh.mesh) else {
            return false;
        };
        let mut materials = Vec::with_capacity(mesh.materials.ids().len());
        for material in mesh.materials.ids() {
            match self.resources.clone_material(*material) {
                Some(copy) => materials.push(copy),
                None => {
                    self.resources.release_mesh(mesh_id);
                    for copy in materials {
                        self.resources.release_material(copy);
                    }
                    return false;
                }
            }
        }
        mesh.mesh = mesh_id;
        for (slot, copy) in mesh.materials.ids_mut().iter_mut().zip(materials) {
            *slot = copy;
        }
        true
    }

    /// Stamps `tag` on `id` and every descendant. Returns how many nodes were tagged.
    pub fn tag_subtree(&mut self, id: NodeID, tag: &NodeTag) -> usize {
        let ids = self.descendants(id);
        for node_id in &ids {
            if let Some(node) = self.nodes.get_mut(*node_id) {
                node.tag = Some(tag.clone());
            }
        }
        ids.len()
    }

    pub fn tag_of(&self, id: NodeID) -> Option<&NodeTag> {
        self.nodes.get(id)?.tag.as_ref()
    }

    /// Walks up from a picked node to the nearest tagged node.
    pub fn find_tagged_ancestor(&self, mut id: NodeID) -> Option<&NodeTag> {
        while let Some(node) = self.nodes.get(id) {
            if let Some(tag) = &node.tag {
                return Some(tag);
            }
            id = node.parent;
        }
        None
    }

    /// Detaches the subtree, then releases every mesh and material in it and removes its
    /// nodes. Calling it again with the same id releases nothing.
    pub fn dispose_subtree(&mut self, id: NodeID) -> DisposeStats {
        let mut stats = DisposeStats::default();
        if id == self.root || !self.nodes.contains(id) {
            return stats;
        }
        self.detach(id);
        for node_id in self.descendants(id) {
            let Some(node) = self.nodes.remove(node_id) else {
                continue;
            };
            stats.nodes += 1;
            if let NodeKind::Mesh(mesh) = node.kind {
                if self.resources.release_mesh(mesh.mesh) {
                    stats.meshes += 1;
                }
                for material in mesh.materials.ids() {
                    if self.resources.release_material(*material) {
                        stats.materials += 1;
                    }
                }
            }
        }
        log::debug!(
            "disposed subtree {id}: {} nodes, {} meshes, {} materials",
            stats.nodes,
            stats.meshes,
            stats.materials
        );
        stats
    }

    /// Builds nodes and uploads resources for a model. The returned group is detached.
    pub fn spawn_model(&mut self, model: &ModelData) -> NodeID {
        let root = self.spawn(SceneNode::group().with_name("model"));
        for &index in &model.roots {
            if let Some(child) = self.spawn_model_node(model, index) {
                self.add_child(root, child);
            }
        }
        log::debug!(
            "spawned model {root} ({} nodes, {} meshes)",
            model.nodes.len(),
            model.mesh_count()
        );
        root
    }

    fn spawn_model_node(&mut self, model: &ModelData, index: usize) -> Option<NodeID> {
        let source = model.nodes.get(index)?;
        let mut meshes = Vec::with_capacity(source.primitives.len());
        for primitive in &source.primitives {
            let mesh = self.resources.create_mesh(primitive.geometry.clone());
            let mut materials: Vec<_> = primitive
                .materials
                .iter()
                .map(|m| self.resources.create_material(m.clone()))
                .collect();
            let slot = if materials.len() == 1 {
                MaterialSlot::Single(materials.remove(0))
            } else {
                MaterialSlot::Multi(materials)
            };
            meshes.push(SceneNode::mesh(mesh, slot));
        }

        // A single primitive becomes the node itself; several become children of a group.
        let mut node = if meshes.len() == 1 {
            meshes.remove(0)
        } else {
            SceneNode::group()
        };
        node.name = source.name.clone();
        node.transform = source.transform;
        let id = self.spawn(node);
        for mesh in meshes {
            let mesh_id = self.spawn(mesh.with_transform(Transform3D::IDENTITY));
            self.add_child(id, mesh_id);
        }
        for &child in &source.children {
            if let Some(child_id) = self.spawn_model_node(model, child) {
                self.add_child(id, child_id);
            }
        }
        Some(id)
    }

    /// Queues a draw per (visible, attached) mesh group whose resources are still live.
    pub fn extract_render_3d_commands(&mut self) {
        let mut traversal = std::mem::take(&mut self.traversal);
        traversal.clear();
        traversal.push((self.root, Mat4::IDENTITY));

        while let Some((id, parent_matrix)) = traversal.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            if !node.visible {
                continue;
            }
            let world = parent_matrix * node.transform.to_mat4();
            if let NodeKind::Mesh(mesh) = &node.kind {
                if self.resources.has_mesh(mesh.mesh) {
                    let model = world.to_cols_array_2d();
                    for (submesh, material) in mesh.materials.ids().iter().enumerate() {
                        if !self.resources.has_material(*material) {
                            continue;
                        }
                        self.pending_3d.push(Command3D::Draw {
                            node: id,
                            submesh: submesh as u32,
                            mesh: mesh.mesh,
                            material: *material,
                            model,
                        });
                    }
                }
            }
            traversal.extend(node.children.iter().map(|c| (*c, world)));
        }

        traversal.clear();
        self.traversal = traversal;
    }

    /// Resource commands first, so uploads land before the draws that reference them.
    pub fn drain_render_commands(&mut self, out: &mut Vec<RenderCommand>) {
        self.resources.drain_commands(out);
        out.extend(self.pending_3d.drain(..).map(RenderCommand::ThreeD));
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, Material, presets};
    use glam::Vec3;
    use starfield_ids::MaterialID;
    use starfield_render_bridge::ResourceCommand;

    fn scene_with_star_prototype() -> (Scene, NodeID) {
        let mut scene = Scene::new();
        let model = ModelData::builtin(presets::STAR).expect("builtin star");
        let prototype = scene.spawn_model(&model);
        (scene, prototype)
    }

    fn draws(scene: &mut Scene) -> Vec<Command3D> {
        scene.extract_render_3d_commands();
        let mut out = Vec::new();
        scene.drain_render_commands(&mut out);
        out.into_iter()
            .filter_map(|c| match c {
                RenderCommand::ThreeD(cmd @ Command3D::Draw { .. }) => Some(cmd),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn detached_prototype_is_not_drawn() {
        let (mut scene, prototype) = scene_with_star_prototype();
        assert!(!scene.is_attached(prototype));
        assert!(draws(&mut scene).is_empty());
    }

    #[test]
    fn attached_multi_material_mesh_draws_each_group() {
        let (mut scene, prototype) = scene_with_star_prototype();
        let clone = scene.clone_subtree(prototype).unwrap();
        assert!(scene.add_child(scene.root(), clone));
        let commands = draws(&mut scene);
        assert_eq!(commands.len(), 2);
        assert!(matches!(commands[1], Command3D::Draw { submesh: 1, .. }));
    }

    #[test]
    fn clone_owns_fresh_resources() {
        let (mut scene, prototype) = scene_with_star_prototype();
        let before = scene.resources().stats();
        let clone = scene.clone_subtree(prototype).unwrap();
        let after = scene.resources().stats();
        assert_eq!(after.meshes_created - before.meshes_created, 1);
        assert_eq!(after.materials_created - before.materials_created, 2);

        let mesh_of = |scene: &Scene, root: NodeID| {
            scene
                .descendants(root)
                .into_iter()
                .find_map(|id| scene.node(id).and_then(|n| n.as_mesh().cloned()))
                .unwrap()
        };
        let original = mesh_of(&scene, prototype);
        let copied = mesh_of(&scene, clone);
        assert_ne!(original.mesh, copied.mesh);
        for (a, b) in original.materials.ids().iter().zip(copied.materials.ids()) {
            assert_ne!(a, b);
        }
    }

    #[test]
    fn dispose_releases_everything_once() {
        let (mut scene, prototype) = scene_with_star_prototype();
        let clone = scene.clone_subtree(prototype).unwrap();
        scene.add_child(scene.root(), clone);

        let stats = scene.dispose_subtree(clone);
        assert_eq!(stats.meshes, 1);
        assert_eq!(stats.materials, 2);
        assert!(!scene.contains(clone));
        assert_eq!(scene.node(scene.root()).unwrap().children().len(), 0);

        assert_eq!(scene.dispose_subtree(clone), DisposeStats::default());
        assert_eq!(scene.resources().stats().meshes_released, 1);
    }

    #[test]
    fn dispose_queues_removal_and_release() {
        let (mut scene, prototype) = scene_with_star_prototype();
        let clone = scene.clone_subtree(prototype).unwrap();
        scene.add_child(scene.root(), clone);
        let mut out = Vec::new();
        scene.drain_render_commands(&mut out);
        out.clear();

        scene.dispose_subtree(clone);
        scene.drain_render_commands(&mut out);
        assert!(out
            .iter()
            .any(|c| matches!(c, RenderCommand::ThreeD(Command3D::RemoveNode { .. }))));
        assert!(out.iter().any(|c| matches!(
            c,
            RenderCommand::Resource(ResourceCommand::ReleaseMesh { .. })
        )));
        assert!(draws(&mut scene).is_empty());
    }

    #[test]
    fn root_cannot_be_disposed_or_reparented() {
        let mut scene = Scene::new();
        let group = scene.spawn(SceneNode::group());
        let root = scene.root();
        assert!(!scene.add_child(group, root));
        assert_eq!(scene.dispose_subtree(root), DisposeStats::default());
        assert!(scene.contains(root));
    }

    #[test]
    fn add_child_rejects_cycles() {
        let mut scene = Scene::new();
        let a = scene.spawn(SceneNode::group());
        let b = scene.spawn(SceneNode::group());
        assert!(scene.add_child(a, b));
        assert!(!scene.add_child(b, a));
        assert!(!scene.add_child(a, a));
    }

    #[test]
    fn picking_walks_up_to_tag() {
        let (mut scene, prototype) = scene_with_star_prototype();
        let clone = scene.clone_subtree(prototype).unwrap();
        let tag = NodeTag {
            owner: "abc".into(),
            color: Some(Color::WHITE),
            emissive: None,
        };
        let tagged = scene.tag_subtree(clone, &tag);
        assert_eq!(tagged, scene.descendants(clone).len());

        let leaf = *scene.descendants(clone).last().unwrap();
        assert_eq!(scene.tag_of(leaf).map(|t| t.owner.as_str()), Some("abc"));

        let untagged_child = scene.spawn(SceneNode::group());
        scene.add_child(leaf, untagged_child);
        assert_eq!(
            scene.find_tagged_ancestor(untagged_child).map(|t| t.owner.as_str()),
            Some("abc")
        );
        assert!(scene.tag_of(prototype).is_none());
    }

    #[test]
    fn world_matrix_composes_parents() {
        let mut scene = Scene::new();
        let parent = scene.spawn(
            SceneNode::group().with_transform(Transform3D::from_position(Vec3::new(1.0, 0.0, 0.0))),
        );
        let mesh = scene
            .resources_mut()
            .create_mesh(std::sync::Arc::new(Default::default()));
        let material = scene.resources_mut().create_material(Material::default());
        let child = scene.spawn(
            SceneNode::mesh(mesh, MaterialSlot::Single(material))
                .with_transform(Transform3D::from_position(Vec3::new(0.0, 2.0, 0.0))),
        );
        scene.add_child(scene.root(), parent);
        scene.add_child(parent, child);

        let world = scene.world_matrix(child).unwrap();
        assert_eq!(world.w_axis.truncate(), Vec3::new(1.0, 2.0, 0.0));
    }

    fn mesh_node(scene: &mut Scene, materials: usize) -> (NodeID, Vec<MaterialID>) {
        let mesh = scene
            .resources_mut()
            .create_mesh(std::sync::Arc::new(Default::default()));
        let ids: Vec<_> = (0..materials)
            .map(|_| scene.resources_mut().create_material(Material::default()))
            .collect();
        let node = scene.spawn(SceneNode::mesh(mesh, MaterialSlot::Multi(ids.clone())));
        (node, ids)
    }

    #[test]
    fn failed_material_clone_releases_partial_copy() {
        let mut scene = Scene::new();
        let (node, materials) = mesh_node(&mut scene, 3);
        scene.resources_mut().release_material(materials[2]);
        let live = (
            scene.resources().live_meshes(),
            scene.resources().live_materials(),
        );
        let nodes = scene.node_count();

        assert_eq!(scene.clone_subtree(node), None);
        assert_eq!(
            (
                scene.resources().live_meshes(),
                scene.resources().live_materials()
            ),
            live
        );
        assert_eq!(scene.node_count(), nodes);
    }

    #[test]
    fn failed_child_clone_discards_whole_copy() {
        let mut scene = Scene::new();
        let group = scene.spawn(SceneNode::group());
        let (good, _) = mesh_node(&mut scene, 1);
        let (bad, bad_materials) = mesh_node(&mut scene, 1);
        scene.add_child(group, good);
        scene.add_child(group, bad);
        scene.resources_mut().release_material(bad_materials[0]);
        let live = (
            scene.resources().live_meshes(),
            scene.resources().live_materials(),
        );
        let nodes = scene.node_count();

        assert_eq!(scene.clone_subtree(group), None);
        assert_eq!(
            (
                scene.resources().live_meshes(),
                scene.resources().live_materials()
            ),
            live
        );
        assert_eq!(scene.node_count(), nodes);
    }

    #[test]
    fn hidden_subtree_is_skipped() {
        let (mut scene, prototype) = scene_with_star_prototype();
        let clone = scene.clone_subtree(prototype).unwrap();
        scene.add_child(scene.root(), clone);
        scene.node_mut(clone).unwrap().visible = false;
        assert!(draws(&mut scene).is_empty());
    }
}
