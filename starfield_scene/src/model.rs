//! CPU-side model trees loaded from GLB bytes or built-in presets.
//! A `ModelData` is never rendered directly: `Scene::spawn_model` turns it into nodes and
//! GPU resources.

use crate::{Material, Transform3D, presets};
use glam::{Quat, Vec3};
use starfield_render_bridge::Geometry;
use std::borrow::Cow;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to parse glTF: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("GLB has no binary chunk")]
    MissingBinaryChunk,
    #[error("mesh {mesh} primitive {primitive} has no POSITION attribute")]
    MissingPositions { mesh: usize, primitive: usize },
    #[error("model contains no meshes")]
    NoMeshes,
    #[error("unknown built-in model `{0}`")]
    UnknownBuiltin(String),
}

/// One drawable piece: geometry plus one material per geometry group.
#[derive(Debug, Clone)]
pub struct ModelPrimitive {
    pub geometry: Arc<Geometry>,
    pub materials: Vec<Material>,
}

#[derive(Debug, Clone)]
pub struct ModelNode {
    pub name: Option<String>,
    pub transform: Transform3D,
    pub children: Vec<usize>,
    pub primitives: Vec<ModelPrimitive>,
}

#[derive(Debug, Clone, Default)]
pub struct ModelData {
    pub nodes: Vec<ModelNode>,
    pub roots: Vec<usize>,
}

impl ModelData {
    pub fn single_mesh(
        name: impl Into<String>,
        geometry: Arc<Geometry>,
        materials: Vec<Material>,
    ) -> Self {
        Self {
            nodes: vec![ModelNode {
                name: Some(name.into()),
                transform: Transform3D::IDENTITY,
                children: Vec::new(),
                primitives: vec![ModelPrimitive {
                    geometry,
                    materials,
                }],
            }],
            roots: vec![0],
        }
    }

    pub fn builtin(name: &str) -> Result<Self, ModelError> {
        presets::builtin_model(name).ok_or_else(|| ModelError::UnknownBuiltin(name.to_string()))
    }

    pub fn mesh_count(&self) -> usize {
        self.nodes.iter().map(|n| n.primitives.len()).sum()
    }

    /// Parse a binary glTF. Only the embedded BIN buffer is read; external URIs are ignored.
    pub fn from_glb(bytes: &[u8]) -> Result<Self, ModelError> {
        let gltf = gltf::Gltf::from_slice(bytes)?;
        let blob = gltf.blob.as_deref().ok_or(ModelError::MissingBinaryChunk)?;
        let document = &gltf.document;

        let mut model = ModelData::default();
        match document.default_scene().or_else(|| document.scenes().next()) {
            Some(scene) => {
                for node in scene.nodes() {
                    let index = push_gltf_node(&mut model, node, blob)?;
                    model.roots.push(index);
                }
            }
            None => {
                // Scene-less files: treat every root node as top level.
                let mut is_child = vec![false; document.nodes().len()];
                for node in document.nodes() {
                    for child in node.children() {
                        is_child[child.index()] = true;
                    }
                }
                for node in document.nodes().filter(|n| !is_child[n.index()]) {
                    let index = push_gltf_node(&mut model, node, blob)?;
                    model.roots.push(index);
                }
            }
        }

        if model.mesh_count() == 0 {
            return Err(ModelError::NoMeshes);
        }
        Ok(model)
    }
}

fn push_gltf_node(
    model: &mut ModelData,
    node: gltf::Node<'_>,
    blob: &[u8],
) -> Result<usize, ModelError> {
    let (translation, rotation, scale) = node.transform().decomposed();
    let transform = Transform3D::new(
        Vec3::from(translation),
        Quat::from_array(rotation),
        Vec3::from(scale),
    );

    let mut primitives = Vec::new();
    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            primitives.push(read_primitive(&primitive, mesh.index(), blob)?);
        }
    }

    let index = model.nodes.len();
    model.nodes.push(ModelNode {
        name: node.name().map(String::from),
        transform,
        children: Vec::new(),
        primitives,
    });

    for child in node.children() {
        let child_index = push_gltf_node(model, child, blob)?;
        model.nodes[index].children.push(child_index);
    }
    Ok(index)
}

fn read_primitive(
    primitive: &gltf::Primitive<'_>,
    mesh: usize,
    blob: &[u8],
) -> Result<ModelPrimitive, ModelError> {
    let reader = primitive.reader(|buffer| match buffer.source() {
        gltf::buffer::Source::Bin => Some(blob),
        gltf::buffer::Source::Uri(_) => None,
    });

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .ok_or(ModelError::MissingPositions {
            mesh,
            primitive: primitive.index(),
        })?
        .collect();
    let normals = reader
        .read_normals()
        .map(|normals| normals.collect())
        .unwrap_or_else(|| vec![[0.0, 1.0, 0.0]; positions.len()]);
    let indices = reader
        .read_indices()
        .map(|indices| indices.into_u32().collect())
        .unwrap_or_else(|| (0..positions.len() as u32).collect());

    Ok(ModelPrimitive {
        geometry: Arc::new(Geometry {
            positions,
            normals,
            indices,
            groups: Vec::new(),
        }),
        materials: vec![material_from_gltf(&primitive.material())],
    })
}

fn material_from_gltf(material: &gltf::Material<'_>) -> Material {
    let pbr = material.pbr_metallic_roughness();
    let [r, g, b, _] = pbr.base_color_factor();
    Material {
        base_color: [r, g, b],
        metallic: pbr.metallic_factor(),
        roughness: pbr.roughness_factor(),
        emissive: material.emissive_factor(),
        emissive_intensity: 1.0,
        name: material.name().map(|n| Cow::Owned(n.to_string())),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    const GLB_MAGIC: &[u8; 4] = b"glTF";
    const CHUNK_JSON: u32 = 0x4E4F_534A;
    const CHUNK_BIN: u32 = 0x004E_4942;

    fn pad(mut bytes: Vec<u8>, fill: u8) -> Vec<u8> {
        while bytes.len() % 4 != 0 {
            bytes.push(fill);
        }
        bytes
    }

    /// One red triangle with blue emission under a node translated by (0, 1, 0).
    pub(crate) fn triangle_glb() -> Vec<u8> {
        let mut bin = Vec::new();
        for v in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
            bin.extend_from_slice(&v.to_le_bytes());
        }
        for i in [0u16, 1, 2] {
            bin.extend_from_slice(&i.to_le_bytes());
        }
        let bin_len = bin.len();
        let bin = pad(bin, 0);

        let json = format!(
            r#"{{"asset":{{"version":"2.0"}},"scene":0,"scenes":[{{"nodes":[0]}}],
"nodes":[{{"name":"Star","mesh":0,"translation":[0.0,1.0,0.0]}}],
"meshes":[{{"primitives":[{{"attributes":{{"POSITION":0}},"indices":1,"material":0}}]}}],
"materials":[{{"name":"glow","pbrMetallicRoughness":{{"baseColorFactor":[1.0,0.0,0.0,1.0]}},"emissiveFactor":[0.0,0.0,1.0]}}],
"buffers":[{{"byteLength":{bin_len}}}],
"bufferViews":[{{"buffer":0,"byteOffset":0,"byteLength":36}},{{"buffer":0,"byteOffset":36,"byteLength":6}}],
"accessors":[{{"bufferView":0,"componentType":5126,"count":3,"type":"VEC3","min":[0.0,0.0,0.0],"max":[1.0,1.0,0.0]}},
{{"bufferView":1,"componentType":5123,"count":3,"type":"SCALAR"}}]}}"#
        );
        let json = pad(json.into_bytes(), b' ');

        let total = 12 + 8 + json.len() + 8 + bin.len();
        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(GLB_MAGIC);
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&(total as u32).to_le_bytes());
        out.extend_from_slice(&(json.len() as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
        out.extend_from_slice(&json);
        out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        out.extend_from_slice(&bin);
        out
    }

    #[test]
    fn glb_triangle_loads_geometry_and_material() {
        let model = ModelData::from_glb(&triangle_glb()).expect("valid glb");
        assert_eq!(model.roots, vec![0]);
        assert_eq!(model.mesh_count(), 1);

        let node = &model.nodes[0];
        assert_eq!(node.name.as_deref(), Some("Star"));
        assert_eq!(node.transform.position, Vec3::new(0.0, 1.0, 0.0));

        let primitive = &node.primitives[0];
        assert_eq!(primitive.geometry.positions.len(), 3);
        assert_eq!(primitive.geometry.indices, vec![0, 1, 2]);
        assert_eq!(primitive.geometry.normals.len(), 3);

        let material = &primitive.materials[0];
        assert_eq!(material.base_color, [1.0, 0.0, 0.0]);
        assert_eq!(material.emissive, [0.0, 0.0, 1.0]);
        assert_eq!(material.name.as_deref(), Some("glow"));
    }

    #[test]
    fn garbage_bytes_are_a_parse_error() {
        let err = ModelData::from_glb(b"definitely not a model").unwrap_err();
        assert!(matches!(err, ModelError::Gltf(_)));
    }

    #[test]
    fn builtin_lookup_reports_unknown_names() {
        assert!(ModelData::builtin("__star__").is_ok());
        assert!(matches!(
            ModelData::builtin("__teapot__"),
            Err(ModelError::UnknownBuiltin(name)) if name == "__teapot__"
        ));
    }
}
