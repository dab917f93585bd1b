//! Scene graph: a tree of tagged nodes plus an explicit light registry.
//!
//! Nodes are [`NodeKind::Group`], [`NodeKind::Mesh`] or [`NodeKind::Light`].
//! Lights live in the registry and are referenced from the tree by
//! [`LightId`], so shading code reads them without traversing. Every
//! mutation bumps a revision counter; GPU-side caches compare revisions to
//! decide when to rebuild.

pub mod loader;
mod node;

use glam::{Mat4, Vec3};
pub use loader::{AssetError, LoadOutcome};
pub use node::{Light, Mesh, Node, NodeKind};

use crate::options::LightingOptions;

/// Index of a light in the scene's registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LightId(usize);

#[derive(Debug, Clone)]
struct RegisteredLight {
    light: Light,
    visible: bool,
}

/// A mesh flattened into world space, as consumed by the scene pass.
#[derive(Debug, Clone, Copy)]
pub struct WorldMesh<'a> {
    /// Local geometry.
    pub mesh: &'a Mesh,
    /// Accumulated node transform.
    pub transform: Mat4,
}

/// The scene rendered by the first pass of the chain.
#[derive(Debug, Clone)]
pub struct Scene {
    nodes: Vec<Node>,
    lights: Vec<RegisteredLight>,
    clear_color: [f32; 3],
    revision: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Empty scene with a black background.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            lights: Vec::new(),
            clear_color: [0.0; 3],
            revision: 0,
        }
    }

    fn invalidate(&mut self) {
        self.revision += 1;
    }

    /// Monotonic mutation counter.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Background color (linear RGB).
    #[must_use]
    pub fn clear_color(&self) -> [f32; 3] {
        self.clear_color
    }

    /// Set the background color.
    pub fn set_clear_color(&mut self, color: [f32; 3]) {
        self.clear_color = color;
        self.invalidate();
    }

    /// Top-level nodes in insertion order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Attach a subtree at the root.
    pub fn add_node(&mut self, node: Node) {
        self.nodes.push(node);
        self.invalidate();
    }

    /// Register a light and attach a node referencing it. Lights start
    /// visible.
    pub fn add_light(&mut self, light: Light) -> LightId {
        let id = LightId(self.lights.len());
        self.lights.push(RegisteredLight {
            light,
            visible: true,
        });
        self.nodes.push(Node::new(NodeKind::Light(id)));
        self.invalidate();
        id
    }

    /// Register the ambient and key lights described by `options`.
    pub fn seed_lights(&mut self, options: &LightingOptions) -> [LightId; 2] {
        let ambient = self.add_light(Light::Ambient {
            color: options.ambient_color,
            intensity: options.ambient_intensity,
        });
        let key = self.add_light(Light::Directional {
            color: options.key_color,
            intensity: options.key_intensity,
            position: Vec3::from_array(options.key_position),
        });
        [ambient, key]
    }

    /// Registered light, visible or not.
    #[must_use]
    pub fn light(&self, id: LightId) -> Option<&Light> {
        self.lights.get(id.0).map(|entry| &entry.light)
    }

    /// Number of registered lights.
    #[must_use]
    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    /// Show or hide one light. Returns `false` for an unknown id.
    pub fn set_light_visible(&mut self, id: LightId, visible: bool) -> bool {
        let Some(entry) = self.lights.get_mut(id.0) else {
            return false;
        };
        entry.visible = visible;
        self.invalidate();
        true
    }

    /// Make every registered light visible.
    pub fn show_all_lights(&mut self) {
        for entry in &mut self.lights {
            entry.visible = true;
        }
        self.invalidate();
    }

    /// Visible lights in registration order.
    pub fn visible_lights(&self) -> impl Iterator<Item = &Light> {
        self.lights
            .iter()
            .filter(|entry| entry.visible)
            .map(|entry| &entry.light)
    }

    /// Every visible mesh with its world transform, depth first.
    #[must_use]
    pub fn world_meshes(&self) -> Vec<WorldMesh<'_>> {
        let mut out = Vec::new();
        for node in &self.nodes {
            collect_meshes(node, Mat4::IDENTITY, &mut out);
        }
        out
    }
}

fn collect_meshes<'a>(node: &'a Node, parent: Mat4, out: &mut Vec<WorldMesh<'a>>) {
    if !node.visible {
        return;
    }
    let transform = parent * node.transform;
    if let NodeKind::Mesh(mesh) = &node.kind {
        out.push(WorldMesh { mesh, transform });
    }
    for child in &node.children {
        collect_meshes(child, transform, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Mesh {
        Mesh::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            None,
            vec![0, 1, 2],
            [1.0; 4],
        )
    }

    #[test]
    fn mutations_bump_revision() {
        let mut scene = Scene::new();
        let r0 = scene.revision();
        scene.add_node(Node::group(Vec::new()));
        let r1 = scene.revision();
        assert!(r1 > r0);
        let id = scene.add_light(Light::Ambient {
            color: [1.0; 3],
            intensity: 0.3,
        });
        assert!(scene.revision() > r1);
        let r2 = scene.revision();
        assert!(scene.set_light_visible(id, false));
        assert!(scene.revision() > r2);
    }

    #[test]
    fn seeded_lights_are_registered_and_visible() {
        let mut scene = Scene::new();
        let [ambient, key] = scene.seed_lights(&LightingOptions::default());
        assert_eq!(scene.light_count(), 2);
        assert!(matches!(scene.light(ambient), Some(Light::Ambient { intensity, .. }) if *intensity == 0.3));
        assert!(matches!(scene.light(key), Some(Light::Directional { intensity, .. }) if *intensity == 2.5));
        assert_eq!(scene.visible_lights().count(), 2);
        let light_nodes = scene
            .nodes()
            .iter()
            .filter(|n| matches!(n.kind, NodeKind::Light(_)))
            .count();
        assert_eq!(light_nodes, 2);
    }

    #[test]
    fn hidden_lights_are_skipped_until_shown() {
        let mut scene = Scene::new();
        let [ambient, _] = scene.seed_lights(&LightingOptions::default());
        let _ = scene.set_light_visible(ambient, false);
        assert_eq!(scene.visible_lights().count(), 1);
        scene.show_all_lights();
        assert_eq!(scene.visible_lights().count(), 2);
        assert!(!scene.set_light_visible(LightId(7), true));
    }

    #[test]
    fn world_meshes_accumulate_transforms() {
        let mut scene = Scene::new();
        let child = Node::mesh(triangle())
            .with_transform(Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)));
        let mut hidden = Node::mesh(triangle());
        hidden.visible = false;
        scene.add_node(Node::group(vec![child, hidden]).scaled(2.0));

        let meshes = scene.world_meshes();
        assert_eq!(meshes.len(), 1);
        let origin = meshes[0].transform.transform_point3(Vec3::ZERO);
        assert_eq!(origin, Vec3::new(2.0, 0.0, 0.0));
    }
}
