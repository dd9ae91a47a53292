use starfield_scene::glam::Vec3;

/// Visual constants shared by every star a manager creates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarStyle {
    /// Uniform scale applied to the template clone.
    pub size: f32,
    /// Radians added to every star's spin per frame.
    pub spin_step: f32,
    pub spin_axis: Vec3,
    pub highlight_intensity: f32,
    pub ambient_intensity: f32,
}

impl Default for StarStyle {
    fn default() -> Self {
        Self {
            size: 3.0,
            spin_step: 0.008,
            spin_axis: Vec3::Z,
            highlight_intensity: 1.2,
            ambient_intensity: 0.3,
        }
    }
}

impl StarStyle {
    #[inline]
    pub fn emissive_intensity(&self, highlight: bool) -> f32 {
        if highlight {
            self.highlight_intensity
        } else {
            self.ambient_intensity
        }
    }
}
