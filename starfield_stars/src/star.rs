use crate::error::StarError;
use crate::style::StarStyle;
use starfield_ids::{MaterialID, NodeID};
use starfield_scene::glam::{Quat, Vec3};
use starfield_scene::{Color, DisposeStats, NodeTag, Scene, SceneNode, Transform3D};
use std::f32::consts::TAU;

/// Everything needed to build or refresh one star.
#[derive(Debug, Clone, PartialEq)]
pub struct StarSpec {
    pub id: String,
    /// Display name; the root node is named after it when set.
    pub label: Option<String>,
    pub position: Option<Vec3>,
    pub color: Color,
    /// Defaults to `color` when unset.
    pub emissive: Option<Color>,
    pub highlight: bool,
    /// Overrides `StarStyle::size`.
    pub size: Option<f32>,
}

impl StarSpec {
    pub fn new(id: impl Into<String>, color: Color) -> Self {
        Self {
            id: id.into(),
            label: None,
            position: None,
            color,
            emissive: None,
            highlight: false,
            size: None,
        }
    }

    pub fn with_label(mut self, label: Option<String>) -> Self {
        self.label = label;
        self
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_emissive(mut self, emissive: Color) -> Self {
        self.emissive = Some(emissive);
        self
    }

    pub fn with_highlight(mut self, highlight: bool) -> Self {
        self.highlight = highlight;
        self
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.size = Some(size);
        self
    }

    #[inline]
    fn emissive_color(&self) -> Color {
        self.emissive.unwrap_or(self.color)
    }

    fn node_name(&self) -> String {
        format!("star:{}", self.label.as_deref().unwrap_or(&self.id))
    }
}

/// One visible star: a group node carrying position, scale and spin, with a private copy
/// of the template underneath. The copy owns its own meshes and materials.
#[derive(Debug)]
pub struct Star {
    id: String,
    label: Option<String>,
    root: NodeID,
    color: Color,
    emissive: Color,
    highlight: bool,
    size: f32,
    spin: f32,
    disposed: bool,
}

impl Star {
    /// Clones `prototype` into a new detached star. Call `attach` to make it visible.
    pub fn instantiate(
        scene: &mut Scene,
        prototype: NodeID,
        spec: &StarSpec,
        style: &StarStyle,
    ) -> Result<Self, StarError> {
        let visual = scene
            .clone_subtree(prototype)
            .ok_or(StarError::TemplateMissing(prototype))?;
        let size = spec.size.unwrap_or(style.size);
        let root = scene.spawn(
            SceneNode::group()
                .with_name(spec.node_name())
                .with_transform(Transform3D::new(
                    spec.position.unwrap_or(Vec3::ZERO),
                    Quat::IDENTITY,
                    Vec3::splat(size),
                )),
        );
        scene.add_child(root, visual);

        let star = Self {
            id: spec.id.clone(),
            label: spec.label.clone(),
            root,
            color: spec.color,
            emissive: spec.emissive_color(),
            highlight: spec.highlight,
            size,
            spin: 0.0,
            disposed: false,
        };
        star.apply_materials(scene, style);
        star.retag(scene);
        log::debug!("created star {} at {}", star.id, root);
        Ok(star)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn root(&self) -> NodeID {
        self.root
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn emissive(&self) -> Color {
        self.emissive
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlight
    }

    pub fn spin_angle(&self) -> f32 {
        self.spin
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Adds the star under the scene root.
    pub fn attach(&self, scene: &mut Scene) -> bool {
        if self.disposed {
            return false;
        }
        let root = scene.root();
        scene.add_child(root, self.root)
    }

    pub fn position(&self, scene: &Scene) -> Option<Vec3> {
        scene.node(self.root).map(|n| n.transform.position)
    }

    pub fn set_position(&self, scene: &mut Scene, position: Vec3) -> bool {
        match scene.node_mut(self.root) {
            Some(node) if !self.disposed => {
                node.transform.position = position;
                true
            }
            _ => false,
        }
    }

    /// Rewrites color, emission and highlight on this star's own materials.
    pub fn recolor(
        &mut self,
        scene: &mut Scene,
        color: Color,
        emissive: Option<Color>,
        highlight: bool,
        style: &StarStyle,
    ) -> bool {
        if self.disposed {
            return false;
        }
        self.color = color;
        self.emissive = emissive.unwrap_or(color);
        self.highlight = highlight;
        self.apply_materials(scene, style);
        self.retag(scene);
        true
    }

    /// Brings an existing star in line with `spec`. Returns whether anything changed.
    pub fn refresh(&mut self, scene: &mut Scene, spec: &StarSpec, style: &StarStyle) -> bool {
        if self.disposed {
            return false;
        }
        let mut changed = false;
        if spec.label != self.label {
            if let Some(node) = scene.node_mut(self.root) {
                node.name = Some(spec.node_name());
            }
            self.label = spec.label.clone();
            changed = true;
        }
        if let Some(position) = spec.position {
            if self.position(scene) != Some(position) {
                changed |= self.set_position(scene, position);
            }
        }
        let size = spec.size.unwrap_or(style.size);
        if size != self.size {
            if let Some(node) = scene.node_mut(self.root) {
                node.transform.scale = Vec3::splat(size);
                self.size = size;
                changed = true;
            }
        }
        if spec.color != self.color
            || spec.emissive_color() != self.emissive
            || spec.highlight != self.highlight
        {
            changed |= self.recolor(scene, spec.color, spec.emissive, spec.highlight, style);
        }
        changed
    }

    /// Advances the spin by `step` radians about `axis`. The angle stays in `[0, TAU)`.
    pub fn spin(&mut self, scene: &mut Scene, step: f32, axis: Vec3) {
        if self.disposed {
            return;
        }
        self.spin = (self.spin + step).rem_euclid(TAU);
        let axis = axis.try_normalize().unwrap_or(Vec3::Z);
        if let Some(node) = scene.node_mut(self.root) {
            node.transform.rotation = Quat::from_axis_angle(axis, self.spin);
        }
    }

    /// Materials owned by this star's template copy.
    pub fn material_ids(&self, scene: &Scene) -> Vec<MaterialID> {
        scene
            .descendants(self.root)
            .into_iter()
            .filter_map(|id| scene.node(id)?.as_mesh())
            .flat_map(|mesh| mesh.materials.ids().to_vec())
            .collect()
    }

    /// Removes the star from the scene and releases its meshes and materials. Only the
    /// first call releases anything.
    pub fn dispose(&mut self, scene: &mut Scene) -> DisposeStats {
        if self.disposed {
            return DisposeStats::default();
        }
        self.disposed = true;
        let stats = scene.dispose_subtree(self.root);
        log::debug!(
            "disposed star {} ({} nodes, {} meshes, {} materials)",
            self.id,
            stats.nodes,
            stats.meshes,
            stats.materials
        );
        stats
    }

    fn apply_materials(&self, scene: &mut Scene, style: &StarStyle) {
        let base = self.color.to_array();
        let emissive = self.emissive.to_array();
        let intensity = style.emissive_intensity(self.highlight);
        for material in self.material_ids(scene) {
            scene.resources_mut().update_material(material, |m| {
                m.base_color = base;
                m.emissive = emissive;
                m.emissive_intensity = intensity;
            });
        }
    }

    fn retag(&self, scene: &mut Scene) {
        let tag = NodeTag {
            owner: self.id.clone(),
            color: Some(self.color),
            emissive: Some(self.emissive),
        };
        scene.tag_subtree(self.root, &tag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use starfield_scene::ModelData;
    use starfield_scene::presets::STAR;

    fn scene_with_prototype() -> (Scene, NodeID) {
        let mut scene = Scene::new();
        let model = ModelData::builtin(STAR).expect("builtin star");
        let prototype = scene.spawn_model(&model);
        (scene, prototype)
    }

    #[test]
    fn instantiate_clones_and_styles() {
        let (mut scene, prototype) = scene_with_prototype();
        let style = StarStyle::default();
        let spec = StarSpec::new("s1", Color::rgb(255, 0, 0))
            .with_position(Vec3::new(1.0, 2.0, 3.0))
            .with_highlight(true);
        let star = Star::instantiate(&mut scene, prototype, &spec, &style).unwrap();

        assert!(!scene.is_attached(star.root()));
        assert!(star.attach(&mut scene));
        assert!(scene.is_attached(star.root()));
        assert_eq!(star.position(&scene), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(
            scene.node(star.root()).unwrap().transform.scale,
            Vec3::splat(3.0)
        );

        let materials = star.material_ids(&scene);
        assert!(!materials.is_empty());
        for id in materials {
            let m = scene.resources().material(id).unwrap();
            assert_eq!(m.base_color, [1.0, 0.0, 0.0]);
            assert_eq!(m.emissive, [1.0, 0.0, 0.0]);
            assert_eq!(m.emissive_intensity, 1.2);
        }
    }

    #[test]
    fn recolor_does_not_touch_siblings_or_template() {
        let (mut scene, prototype) = scene_with_prototype();
        let style = StarStyle::default();
        let template_materials: Vec<_> = scene
            .descendants(prototype)
            .into_iter()
            .filter_map(|id| scene.node(id)?.as_mesh())
            .flat_map(|m| m.materials.ids().to_vec())
            .collect();
        let before: Vec<_> = template_materials
            .iter()
            .map(|id| scene.resources().material(*id).cloned())
            .collect();

        let mut a = Star::instantiate(
            &mut scene,
            prototype,
            &StarSpec::new("a", Color::WHITE),
            &style,
        )
        .unwrap();
        let b = Star::instantiate(
            &mut scene,
            prototype,
            &StarSpec::new("b", Color::WHITE),
            &style,
        )
        .unwrap();

        assert!(a.recolor(&mut scene, Color::rgb(0, 0, 255), None, false, &style));
        for id in a.material_ids(&scene) {
            assert_eq!(
                scene.resources().material(id).unwrap().base_color,
                [0.0, 0.0, 1.0]
            );
        }
        for id in b.material_ids(&scene) {
            assert_eq!(
                scene.resources().material(id).unwrap().base_color,
                [1.0, 1.0, 1.0]
            );
        }
        let after: Vec<_> = template_materials
            .iter()
            .map(|id| scene.resources().material(*id).cloned())
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn spin_accumulates_fixed_steps() {
        let (mut scene, prototype) = scene_with_prototype();
        let style = StarStyle::default();
        let mut star = Star::instantiate(
            &mut scene,
            prototype,
            &StarSpec::new("s", Color::WHITE),
            &style,
        )
        .unwrap();
        for _ in 0..10 {
            star.spin(&mut scene, style.spin_step, style.spin_axis);
        }
        assert!((star.spin_angle() - 0.08).abs() < 1e-6);
        let rotation = scene.node(star.root()).unwrap().transform.rotation;
        let (axis, angle) = rotation.to_axis_angle();
        assert!((angle - 0.08).abs() < 1e-5);
        assert!(axis.abs_diff_eq(Vec3::Z, 1e-4));
    }

    #[test]
    fn label_names_the_root_and_follows_refresh() {
        let (mut scene, prototype) = scene_with_prototype();
        let style = StarStyle::default();
        let spec = StarSpec::new("id7", Color::WHITE);
        let mut star = Star::instantiate(&mut scene, prototype, &spec, &style).unwrap();
        assert_eq!(star.label(), None);
        assert_eq!(
            scene.node(star.root()).unwrap().name.as_deref(),
            Some("star:id7")
        );

        let named = spec.with_label(Some("Oma".to_string()));
        assert!(star.refresh(&mut scene, &named, &style));
        assert_eq!(star.label(), Some("Oma"));
        assert_eq!(
            scene.node(star.root()).unwrap().name.as_deref(),
            Some("star:Oma")
        );
        assert!(!star.refresh(&mut scene, &named, &style));
    }

    #[test]
    fn spin_keeps_full_speed_after_long_runs() {
        let (mut scene, prototype) = scene_with_prototype();
        let style = StarStyle::default();
        let mut star = Star::instantiate(
            &mut scene,
            prototype,
            &StarSpec::new("s", Color::WHITE),
            &style,
        )
        .unwrap();

        for _ in 0..10_000 {
            star.spin(&mut scene, 7.3, style.spin_axis);
            assert!((0.0..TAU).contains(&star.spin_angle()));
        }

        star.spin = TAU - 0.004;
        let mut previous = star.spin_angle();
        let mut rotation = scene.node(star.root()).unwrap().transform.rotation;
        for _ in 0..1000 {
            star.spin(&mut scene, style.spin_step, style.spin_axis);
            let advance = (star.spin_angle() - previous).rem_euclid(TAU);
            assert!((advance - style.spin_step).abs() < 1e-5, "advance {advance}");
            let next = scene.node(star.root()).unwrap().transform.rotation;
            assert!(!next.abs_diff_eq(rotation, 1e-7));
            previous = star.spin_angle();
            rotation = next;
        }
    }

    #[test]
    fn dispose_releases_once() {
        let (mut scene, prototype) = scene_with_prototype();
        let style = StarStyle::default();
        let mut star = Star::instantiate(
            &mut scene,
            prototype,
            &StarSpec::new("s", Color::WHITE),
            &style,
        )
        .unwrap();
        star.attach(&mut scene);
        let materials = star.material_ids(&scene);
        let live_before = scene.resources().live_materials();

        let first = star.dispose(&mut scene);
        assert!(first.nodes >= 2);
        assert_eq!(first.materials, materials.len());
        assert_eq!(
            scene.resources().live_materials(),
            live_before - materials.len()
        );
        assert!(!scene.contains(star.root()));

        assert_eq!(star.dispose(&mut scene), DisposeStats::default());
        assert!(star.is_disposed());
        assert!(!star.attach(&mut scene));
    }

    #[test]
    fn tags_lead_back_to_owner() {
        let (mut scene, prototype) = scene_with_prototype();
        let star = Star::instantiate(
            &mut scene,
            prototype,
            &StarSpec::new("picked", Color::rgb(0, 255, 0)),
            &StarStyle::default(),
        )
        .unwrap();
        let leaf = *scene.descendants(star.root()).last().unwrap();
        let tag = scene.find_tagged_ancestor(leaf).unwrap();
        assert_eq!(tag.owner, "picked");
        assert_eq!(tag.color, Some(Color::rgb(0, 255, 0)));
    }

    #[test]
    fn missing_prototype_is_an_error() {
        let (mut scene, prototype) = scene_with_prototype();
        scene.dispose_subtree(prototype);
        let err = Star::instantiate(
            &mut scene,
            prototype,
            &StarSpec::new("x", Color::WHITE),
            &StarStyle::default(),
        )
        .unwrap_err();
        assert_eq!(err, StarError::TemplateMissing(prototype));
    }
}
