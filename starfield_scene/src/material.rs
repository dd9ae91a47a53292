use starfield_render_bridge::MaterialState;
use std::borrow::Cow;
use std::fmt;

use crate::Color;

/// CPU-side PBR material (glTF metallic-roughness subset).
/// Converted to a `MaterialState` when uploaded to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Base surface color (albedo).
    pub base_color: [f32; 3],

    pub metallic: f32,
    pub roughness: f32,

    /// Emissive color (self-illumination), scaled by `emissive_intensity`.
    pub emissive: [f32; 3],
    pub emissive_intensity: f32,

    pub name: Option<Cow<'static, str>>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            base_color: [1.0, 1.0, 1.0],
            metallic: 0.0,
            roughness: 1.0,
            emissive: [0.0, 0.0, 0.0],
            emissive_intensity: 1.0,
            name: None,
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Material(base_color:[{},{},{}], emissive:[{},{},{}]x{}, metallic:{}, roughness:{})",
            self.base_color[0],
            self.base_color[1],
            self.base_color[2],
            self.emissive[0],
            self.emissive[1],
            self.emissive[2],
            self.emissive_intensity,
            self.metallic,
            self.roughness
        )
    }
}

impl Material {
    pub fn named(name: &'static str) -> Self {
        Self {
            name: Some(Cow::Borrowed(name)),
            ..Self::default()
        }
    }

    pub fn with_base_color(mut self, color: Color) -> Self {
        self.base_color = color.to_array();
        self
    }

    pub fn to_state(&self) -> MaterialState {
        MaterialState {
            base_color: self.base_color,
            emissive: self.emissive,
            emissive_intensity: self.emissive_intensity,
            metallic: self.metallic,
            roughness: self.roughness,
        }
    }
}
