use glam::{Mat4, Vec3};

use super::LightId;

/// Indexed triangle geometry with a flat base color.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// Vertex positions in node space.
    pub positions: Vec<[f32; 3]>,
    /// Per-vertex normals, same length as `positions`.
    pub normals: Vec<[f32; 3]>,
    /// Triangle list indices.
    pub indices: Vec<u32>,
    /// Linear RGBA base color.
    pub color: [f32; 4],
}

impl Mesh {
    /// Build a mesh; missing normals are computed from the triangles.
    #[must_use]
    pub fn new(
        positions: Vec<[f32; 3]>,
        normals: Option<Vec<[f32; 3]>>,
        indices: Vec<u32>,
        color: [f32; 4],
    ) -> Self {
        let normals = match normals {
            Some(n) if n.len() == positions.len() => n,
            _ => smooth_normals(&positions, &indices),
        };
        Self {
            positions,
            normals,
            indices,
            color,
        }
    }

    /// Number of complete triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Area-weighted vertex normals.
fn smooth_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut acc = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let (pa, pb, pc) = (
            Vec3::from_array(positions[a]),
            Vec3::from_array(positions[b]),
            Vec3::from_array(positions[c]),
        );
        let face = (pb - pa).cross(pc - pa);
        acc[a] += face;
        acc[b] += face;
        acc[c] += face;
    }
    acc.into_iter()
        .map(|n| n.normalize_or(Vec3::Y).to_array())
        .collect()
}

/// A light source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    /// Uniform light from every direction.
    Ambient {
        /// Linear RGB color.
        color: [f32; 3],
        /// Intensity multiplier.
        intensity: f32,
    },
    /// Parallel light shining from `position` toward the origin.
    Directional {
        /// Linear RGB color.
        color: [f32; 3],
        /// Intensity multiplier.
        intensity: f32,
        /// Where the light shines from.
        position: Vec3,
    },
}

/// What a scene node carries.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Pure transform container.
    Group,
    /// Renderable geometry.
    Mesh(Mesh),
    /// Reference into the scene's light registry.
    Light(LightId),
}

/// A node in the scene tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Optional name carried over from the asset.
    pub name: Option<String>,
    /// Transform relative to the parent.
    pub transform: Mat4,
    /// Hidden nodes and their subtrees are not rendered.
    pub visible: bool,
    /// Payload.
    pub kind: NodeKind,
    /// Child nodes.
    pub children: Vec<Node>,
}

impl Node {
    /// Visible node with identity transform and no children.
    #[must_use]
    pub fn new(kind: NodeKind) -> Self {
        Self {
            name: None,
            transform: Mat4::IDENTITY,
            visible: true,
            kind,
            children: Vec::new(),
        }
    }

    /// Group node owning `children`.
    #[must_use]
    pub fn group(children: Vec<Node>) -> Self {
        Self {
            children,
            ..Self::new(NodeKind::Group)
        }
    }

    /// Leaf mesh node.
    #[must_use]
    pub fn mesh(mesh: Mesh) -> Self {
        Self::new(NodeKind::Mesh(mesh))
    }

    /// Replace the local transform.
    #[must_use]
    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    /// Set the node name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Apply a uniform scale on top of the local transform.
    #[must_use]
    pub fn scaled(mut self, factor: f32) -> Self {
        self.transform = Mat4::from_scale(Vec3::splat(factor)) * self.transform;
        self
    }

    /// Total number of nodes in this subtree, including `self`.
    #[must_use]
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Self::subtree_len).sum::<usize>()
    }
}
