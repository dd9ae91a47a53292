pub mod ids;

pub use ids::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_nil() {
        let nil = NodeID::nil();
        assert!(nil.is_nil());
        assert_eq!(nil.index(), 0);
        assert_eq!(nil.generation(), 0);
    }

    #[test]
    fn node_id_parts() {
        let id = NodeID::from_parts(5, 2);
        assert_eq!(id.index(), 5);
        assert_eq!(id.generation(), 2);
        assert!(!id.is_nil());
        assert_eq!(NodeID::from_u64(id.as_u64()), id);
    }

    #[test]
    fn mesh_and_material_ids_are_distinct_types_with_same_layout() {
        let mesh = MeshID::from_parts(3, 1);
        let material = MaterialID::from_parts(3, 1);
        assert_eq!(mesh.as_u64(), material.as_u64());
        assert_eq!(format!("{mesh:?}"), "MeshID(3:1)");
        assert_eq!(format!("{material}"), "3:1");
    }

    #[test]
    fn slot_allocator_skips_nil_slot() {
        let mut slots = SlotAllocator::new();
        assert_eq!(slots.alloc(), (1, 0));
        assert_eq!(slots.alloc(), (2, 0));
        assert!(!slots.is_live(0, 0));
    }

    #[test]
    fn slot_allocator_reuse_bumps_generation() {
        let mut slots = SlotAllocator::new();
        let (index, generation) = slots.alloc();
        assert!(slots.free(index, generation));
        assert!(!slots.is_live(index, generation));

        let (reused, next_generation) = slots.alloc();
        assert_eq!(reused, index);
        assert_eq!(next_generation, generation + 1);
        assert_eq!(slots.live_count(), 1);
    }

    #[test]
    fn slot_allocator_double_free_is_rejected() {
        let mut slots = SlotAllocator::new();
        let (index, generation) = slots.alloc();
        assert!(slots.free(index, generation));
        assert!(!slots.free(index, generation));
        assert_eq!(slots.live_count(), 0);
    }
}
