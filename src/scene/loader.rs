//! glTF / GLB scene import.
//!
//! Loading produces a [`LoadOutcome`]: either the asset's node tree or the
//! reason it could not be read. Callers decide what a failure means; the
//! pipeline logs it and keeps rendering without the asset.

use std::fmt;
use std::path::Path;

use glam::Mat4;

use super::node::{Mesh, Node, NodeKind};

/// Result of loading a scene asset.
pub type LoadOutcome = Result<Node, AssetError>;

/// Why a scene asset could not be loaded.
#[derive(Debug)]
pub enum AssetError {
    /// The glTF importer rejected the file or its buffers.
    Import(gltf::Error),
    /// The document parsed but contains no scene.
    NoScene,
    /// The bytes could not be fetched (network or host failure).
    Fetch(String),
    /// No worker was available to deliver the outcome.
    Disconnected,
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Import(e) => write!(f, "glTF import failed: {e}"),
            Self::NoScene => write!(f, "glTF document contains no scene"),
            Self::Fetch(msg) => write!(f, "fetch failed: {msg}"),
            Self::Disconnected => {
                write!(f, "asset loader exited without a result")
            }
        }
    }
}

impl std::error::Error for AssetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Import(e) => Some(e),
            _ => None,
        }
    }
}

impl From<gltf::Error> for AssetError {
    fn from(e: gltf::Error) -> Self {
        Self::Import(e)
    }
}

/// Load a `.glb` / `.gltf` file (external buffers resolved relative to it).
///
/// # Errors
///
/// [`AssetError::Import`] if the file cannot be read or decoded,
/// [`AssetError::NoScene`] if it holds no scene.
pub fn load_path(path: impl AsRef<Path>) -> LoadOutcome {
    let path = path.as_ref();
    log::info!("loading scene asset {}", path.display());
    let (document, buffers, _images) = gltf::import(path)?;
    build_tree(&document, &buffers)
}

/// Load a `.glb` or self-contained `.gltf` from memory.
///
/// # Errors
///
/// Same as [`load_path`].
pub fn load_slice(bytes: &[u8]) -> LoadOutcome {
    let (document, buffers, _images) = gltf::import_slice(bytes)?;
    build_tree(&document, &buffers)
}

/// Load `path` on a worker thread. The receiver yields exactly one outcome.
///
/// # Errors
///
/// [`std::io::Error`] if the thread cannot be spawned.
#[cfg(not(target_arch = "wasm32"))]
pub fn spawn_load(
    path: std::path::PathBuf,
) -> Result<std::sync::mpsc::Receiver<LoadOutcome>, std::io::Error> {
    let (tx, rx) = std::sync::mpsc::channel();
    let _handle = std::thread::Builder::new()
        .name("asset-loader".into())
        .spawn(move || {
            let _ = tx.send(load_path(&path));
        })?;
    Ok(rx)
}

fn build_tree(document: &gltf::Document, buffers: &[gltf::buffer::Data]) -> LoadOutcome {
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or(AssetError::NoScene)?;

    let children: Vec<Node> = scene.nodes().map(|n| convert_node(&n, buffers)).collect();
    let mut root = Node::group(children);
    root.name = scene.name().map(str::to_owned);

    let triangles: usize = count_triangles(&root);
    log::info!(
        "scene asset: {} nodes, {triangles} triangles",
        root.subtree_len()
    );
    Ok(root)
}

fn count_triangles(node: &Node) -> usize {
    let own = match &node.kind {
        NodeKind::Mesh(mesh) => mesh.triangle_count(),
        _ => 0,
    };
    own + node.children.iter().map(count_triangles).sum::<usize>()
}

fn convert_node(node: &gltf::Node<'_>, buffers: &[gltf::buffer::Data]) -> Node {
    let mut children: Vec<Node> = Vec::new();
    if let Some(mesh) = node.mesh() {
        children.extend(
            mesh.primitives()
                .filter_map(|p| convert_primitive(&p, buffers).map(Node::mesh)),
        );
    }
    children.extend(node.children().map(|c| convert_node(&c, buffers)));

    let transform = Mat4::from_cols_array_2d(&node.transform().matrix());
    let mut out = match children.len() {
        // A mesh node with a single primitive and no children collapses
        // into one leaf.
        1 if node.children().next().is_none() && node.mesh().is_some() => {
            children.remove(0)
        }
        _ => Node::group(children),
    };
    out.transform = transform;
    out.name = node.name().map(str::to_owned);
    out
}

fn convert_primitive(
    primitive: &gltf::Primitive<'_>,
    buffers: &[gltf::buffer::Data],
) -> Option<Mesh> {
    if primitive.mode() != gltf::mesh::Mode::Triangles {
        log::debug!("skipping non-triangle primitive ({:?})", primitive.mode());
        return None;
    }
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| d.0.as_slice()));

    let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();
    if positions.is_empty() {
        return None;
    }
    let normals = reader.read_normals().map(Iterator::collect);
    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };
    let color = primitive
        .material()
        .pbr_metallic_roughness()
        .base_color_factor();

    Some(Mesh::new(positions, normals, indices, color))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "name": "Room", "nodes": [0] }],
        "nodes": [{ "name": "Tri", "mesh": 0, "translation": [1.0, 2.0, 3.0] }],
        "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 }, "material": 0 }] }],
        "materials": [{ "pbrMetallicRoughness": { "baseColorFactor": [0.5, 0.25, 1.0, 1.0] } }],
        "buffers": [{
            "byteLength": 36,
            "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAA"
        }],
        "bufferViews": [{ "buffer": 0, "byteLength": 36 }],
        "accessors": [{
            "bufferView": 0,
            "componentType": 5126,
            "count": 3,
            "type": "VEC3",
            "min": [0.0, 0.0, 0.0],
            "max": [1.0, 1.0, 0.0]
        }]
    }"#;

    #[test]
    fn load_slice_builds_mesh_tree() {
        let root = load_slice(TRIANGLE_GLTF.as_bytes()).unwrap();
        assert_eq!(root.name.as_deref(), Some("Room"));
        assert_eq!(root.children.len(), 1);

        let leaf = &root.children[0];
        assert_eq!(leaf.name.as_deref(), Some("Tri"));
        assert_eq!(
            leaf.transform.transform_point3(glam::Vec3::ZERO),
            glam::Vec3::new(1.0, 2.0, 3.0)
        );
        let NodeKind::Mesh(mesh) = &leaf.kind else {
            panic!("expected a mesh leaf, got {:?}", leaf.kind);
        };
        assert_eq!(mesh.positions.len(), 3);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.color, [0.5, 0.25, 1.0, 1.0]);
        assert_eq!(mesh.normals[0], [0.0, 0.0, 1.0]);
    }

    #[test]
    fn garbage_bytes_are_an_import_error() {
        let err = load_slice(b"definitely not gltf").unwrap_err();
        assert!(matches!(err, AssetError::Import(_)));
    }

    #[test]
    fn missing_file_is_an_import_error() {
        let err = load_path("/nonexistent/orbitfx/room.glb").unwrap_err();
        assert!(matches!(err, AssetError::Import(_)));
        assert!(err.to_string().starts_with("glTF import failed"));
    }

    #[test]
    fn spawned_load_reports_over_channel() {
        let rx = spawn_load("/nonexistent/orbitfx/room.glb".into()).unwrap();
        let outcome = rx.recv().unwrap();
        assert!(outcome.is_err());
    }
}
