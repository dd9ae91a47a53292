use glam::Vec3;
use starfield_render_bridge::Geometry;

pub(super) fn push_triangle(geometry: &mut Geometry, a: [f32; 3], b: [f32; 3], c: [f32; 3]) {
    let av = Vec3::from(a);
    let mut bv = Vec3::from(b);
    let mut cv = Vec3::from(c);
    let mut normal = (bv - av).cross(cv - av).normalize_or_zero();
    let centroid = (av + bv + cv) / 3.0;
    if normal.dot(centroid) < 0.0 {
        std::mem::swap(&mut bv, &mut cv);
        normal = (bv - av).cross(cv - av).normalize_or_zero();
    }
    let base = geometry.positions.len() as u32;
    geometry.positions.push(a);
    geometry.positions.push(bv.to_array());
    geometry.positions.push(cv.to_array());
    geometry.normals.extend([normal.to_array(); 3]);
    geometry.indices.extend_from_slice(&[base, base + 1, base + 2]);
}

pub(super) fn push_quad(
    geometry: &mut Geometry,
    a: [f32; 3],
    b: [f32; 3],
    c: [f32; 3],
    d: [f32; 3],
) {
    push_triangle(geometry, a, b, c);
    push_triangle(geometry, a, c, d);
}
