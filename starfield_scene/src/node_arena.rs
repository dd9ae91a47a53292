use crate::SceneNode;
use starfield_ids::NodeID;

pub struct NodeArena {
    nodes: Vec<Option<SceneNode>>,
    generations: Vec<u32>,
    free_indices: Vec<usize>,
}

impl NodeArena {
    pub fn new() -> Self {
        // Reserve index 0 as invalid/nil sentinel so first real node ID is 1.
        Self {
            nodes: vec![None],
            generations: vec![0],
            free_indices: Vec::new(),
        }
    }

    /// Insert a node, returns NodeID with index and generation
    pub fn insert(&mut self, node: SceneNode) -> NodeID {
        // Reuse a previously freed slot in O(1).
        if let Some(index) = self.free_indices.pop() {
            self.nodes[index] = Some(node);
            let generation = self.generations[index];
            return NodeID::from_parts(index as u32, generation);
        }

        let index = self.nodes.len();
        self.nodes.push(Some(node));
        self.generations.push(0);
        NodeID::from_parts(index as u32, 0)
    }

    #[inline]
    fn slot(&self, id: NodeID) -> Option<usize> {
        if id.is_nil()
            || id.index() >= self.nodes.len() as u32
            || self.generations[id.index() as usize] != id.generation()
        {
            return None;
        }
        Some(id.index() as usize)
    }

    /// Get a node by ID, returns None if generation doesn't match
    pub fn get(&self, id: NodeID) -> Option<&SceneNode> {
        self.slot(id).and_then(|index| self.nodes[index].as_ref())
    }

    pub fn get_mut(&mut self, id: NodeID) -> Option<&mut SceneNode> {
        self.slot(id).and_then(|index| self.nodes[index].as_mut())
    }

    /// Remove a node, bumping the generation counter
    pub fn remove(&mut self, id: NodeID) -> Option<SceneNode> {
        let index = self.slot(id)?;
        let removed = self.nodes[index].take();
        if removed.is_some() {
            self.generations[index] = self.generations[index].wrapping_add(1);
            self.free_indices.push(index);
        }
        removed
    }

    pub fn contains(&self, id: NodeID) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeID, &SceneNode)> {
        self.nodes
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(index, node)| {
                node.as_ref()
                    .map(|n| (NodeID::from_parts(index as u32, self.generations[index]), n))
            })
    }

    /// Number of active nodes
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.iter().all(|n| n.is_none())
    }
}

impl Default for NodeArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::NodeArena;
    use crate::SceneNode;

    #[test]
    fn first_node_gets_index_one() {
        let mut arena = NodeArena::new();
        let id = arena.insert(SceneNode::group());
        assert_eq!(id.index(), 1);
        assert_eq!(id.generation(), 0);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn removed_id_goes_stale_after_slot_reuse() {
        let mut arena = NodeArena::new();
        let first = arena.insert(SceneNode::group().with_name("first"));
        assert!(arena.remove(first).is_some());
        assert!(arena.remove(first).is_none());

        let second = arena.insert(SceneNode::group().with_name("second"));
        assert_eq!(second.index(), first.index());
        assert_ne!(second, first);
        assert!(arena.get(first).is_none());
        assert_eq!(
            arena.get(second).and_then(|n| n.name.as_deref()),
            Some("second")
        );
    }

    #[test]
    fn iter_skips_empty_slots() {
        let mut arena = NodeArena::new();
        let a = arena.insert(SceneNode::group());
        let b = arena.insert(SceneNode::group());
        arena.remove(a);
        let ids: Vec<_> = arena.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![b]);
        assert!(!arena.is_empty());
    }
}
