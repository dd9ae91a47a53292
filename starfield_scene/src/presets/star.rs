use super::common::push_triangle;
use starfield_render_bridge::{Geometry, IndexRange};

/// Flat five-pointed star, extruded to a thin double pyramid.
/// Group 0 is the front face, group 1 the back face.
pub(super) fn geometry(points: u32, outer: f32, inner: f32, depth: f32) -> Geometry {
    let mut geometry = Geometry::default();
    let rim = rim(points, outer, inner);
    let front = [0.0, 0.0, depth];
    let back = [0.0, 0.0, -depth];

    for tip in [front, back] {
        let start = geometry.indices.len() as u32;
        for i in 0..rim.len() {
            let a = rim[i];
            let b = rim[(i + 1) % rim.len()];
            push_triangle(&mut geometry, tip, a, b);
        }
        let count = geometry.indices.len() as u32 - start;
        geometry.groups.push(IndexRange { start, count });
    }
    geometry
}

fn rim(points: u32, outer: f32, inner: f32) -> Vec<[f32; 3]> {
    let corners = points * 2;
    (0..corners)
        .map(|i| {
            let radius = if i % 2 == 0 { outer } else { inner };
            let angle = std::f32::consts::FRAC_PI_2
                + i as f32 * std::f32::consts::TAU / corners as f32;
            [radius * angle.cos(), radius * angle.sin(), 0.0]
        })
        .collect()
}
