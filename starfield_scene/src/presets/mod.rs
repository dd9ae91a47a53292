//! Procedural models addressable by `__name__`, usable wherever a GLB path is accepted.

use crate::{Color, Material, ModelData};
use std::sync::Arc;

mod common;
mod cube;
mod star;

pub const STAR: &str = "__star__";
pub const CUBE: &str = "__cube__";

pub fn is_builtin(path: &str) -> bool {
    let path = path.trim();
    path.starts_with("__") && path.ends_with("__")
}

pub fn builtin_model(name: &str) -> Option<ModelData> {
    match name.trim() {
        STAR => Some(ModelData::single_mesh(
            "Star",
            Arc::new(star::geometry(5, 0.5, 0.2, 0.12)),
            vec![
                Material::named("star_front").with_base_color(Color::WHITE),
                Material::named("star_back").with_base_color(Color::WHITE),
            ],
        )),
        CUBE => Some(ModelData::single_mesh(
            "Cube",
            Arc::new(cube::geometry()),
            vec![Material::named("cube").with_base_color(Color::WHITE)],
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_preset_has_one_group_per_material() {
        let model = builtin_model(STAR).expect("star preset");
        let primitive = &model.nodes[0].primitives[0];
        assert_eq!(primitive.geometry.groups.len(), primitive.materials.len());
        let covered: u32 = primitive.geometry.groups.iter().map(|g| g.count).sum();
        assert_eq!(covered, primitive.geometry.index_count());
    }

    #[test]
    fn cube_preset_is_closed_box() {
        let model = builtin_model(CUBE).expect("cube preset");
        let geometry = &model.nodes[0].primitives[0].geometry;
        assert_eq!(geometry.index_count(), 36);
        assert_eq!(geometry.positions.len(), geometry.normals.len());
    }

    #[test]
    fn unknown_builtin_is_none() {
        assert!(is_builtin("__sphere__"));
        assert!(builtin_model("__sphere__").is_none());
        assert!(!is_builtin("res/star.glb"));
    }
}
