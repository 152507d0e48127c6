use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use glam::{EulerRot, Mat4, Quat, Vec3};
use log::debug;
use roxmltree::{Document, Node as XmlNode};
use serde::{Deserialize, Serialize};

use crate::error::SceneError;
use crate::geometry::{Aabb, Triangle};
use crate::obj::{load_obj_from_str, TriangleMesh};

/// Index of a node inside a [`SceneGraph`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct NodeId(usize);

/// Scene node as described by the authoring tools.
///
/// Children are owned top-down through the graph's arena; `parent` is a
/// lookup-only back reference.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub object_type: String,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub visible: bool,
    pub mesh: Option<Arc<TriangleMesh>>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            object_type: "group".to_string(),
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            visible: true,
            mesh: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_mesh(mut self, mesh: TriangleMesh) -> Self {
        self.object_type = "mesh".to_string();
        self.mesh = Some(Arc::new(mesh));
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// Arena backed scene tree.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
    roots: Vec<NodeId>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `node` under `parent` (or as a root) and returns its id.
    pub fn add(&mut self, parent: Option<NodeId>, mut node: SceneNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = parent;
        node.children.clear();
        self.nodes.push(node);
        match parent {
            Some(parent) => self.nodes[parent.0].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> &SceneNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut SceneNode {
        &mut self.nodes[id.0]
    }

    /// Every node id in depth-first pre-order.
    pub fn traverse(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        for root in &self.roots {
            self.collect_subtree(*root, &mut out);
        }
        out
    }

    /// `id` followed by all of its descendants, depth-first.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_subtree(id, &mut out);
        out
    }

    fn collect_subtree(&self, id: NodeId, out: &mut Vec<NodeId>) {
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.nodes[next.0].children.iter().rev().copied());
        }
    }

    /// Walks from `id` up to its root, `id` first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            graph: self,
            next: Some(id),
        }
    }

    /// First node named `name` in traversal order.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.traverse()
            .into_iter()
            .find(|id| self.nodes[id.0].name == name)
    }

    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        self.ancestors(id)
            .fold(Mat4::IDENTITY, |acc, ancestor| {
                self.nodes[ancestor.0].local_matrix() * acc
            })
    }

    pub fn world_position(&self, id: NodeId) -> Vec3 {
        self.world_matrix(id).transform_point3(Vec3::ZERO)
    }

    /// World-space triangles of `id` and every descendant carrying a mesh,
    /// each tagged with the node that owns it.
    pub fn subtree_triangles(&self, id: NodeId) -> Vec<(NodeId, Triangle)> {
        let mut out = Vec::new();
        for node_id in self.descendants(id) {
            let Some(mesh) = &self.nodes[node_id.0].mesh else {
                continue;
            };
            let transform = self.world_matrix(node_id);
            out.extend(mesh.world_triangles(&transform).map(|tri| (node_id, tri)));
        }
        out
    }

    /// World bounds of every mesh under `id`; empty when there is none.
    pub fn subtree_bounds(&self, id: NodeId) -> Aabb {
        let mut bounds = Aabb::EMPTY;
        for node_id in self.descendants(id) {
            if let Some(mesh) = &self.nodes[node_id.0].mesh {
                bounds = bounds.union(&mesh.world_bounds(&self.world_matrix(node_id)));
            }
        }
        bounds
    }

    /// Hides `id` and its whole subtree from rendering.
    pub fn hide_subtree(&mut self, id: NodeId) {
        for node_id in self.descendants(id) {
            self.nodes[node_id.0].visible = false;
        }
    }

    /// Parses a scene file from disk, resolving mesh paths against its
    /// directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let xml = fs::read_to_string(path).map_err(|source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::from_xml(&xml, &base)
    }

    /// Parses the nested `<object>` scene XML produced by the authoring tools.
    pub fn from_xml(xml: &str, mesh_dir: &Path) -> Result<Self, SceneError> {
        let document = Document::parse(xml)?;
        let mut graph = SceneGraph::new();
        let root = document.root_element();
        for element in root.children().filter(|n| n.has_tag_name("object")) {
            graph.add_xml_object(None, element, mesh_dir)?;
        }
        debug!("parsed scene with {} nodes", graph.len());
        Ok(graph)
    }

    fn add_xml_object(
        &mut self,
        parent: Option<NodeId>,
        element: XmlNode<'_, '_>,
        mesh_dir: &Path,
    ) -> Result<NodeId, SceneError> {
        let name = optional_text(&element, "name").ok_or(SceneError::MissingTag("name"))?;
        let mut node = SceneNode::new(name);
        let mesh = optional_text(&element, "mesh");
        let inferred_type = if mesh.is_some() { "mesh" } else { "group" };
        node.object_type =
            optional_text(&element, "type").unwrap_or_else(|| inferred_type.to_string());
        node.position = parse_vec3(optional_text(&element, "position"), node.position)?;
        let degrees = parse_vec3(optional_text(&element, "rotation"), Vec3::ZERO)?;
        node.rotation = Quat::from_euler(
            EulerRot::XYZ,
            degrees.x.to_radians(),
            degrees.y.to_radians(),
            degrees.z.to_radians(),
        );
        node.scale = parse_vec3(optional_text(&element, "scale"), node.scale)?;
        node.visible = match optional_text(&element, "visible").as_deref() {
            None => true,
            Some("true" | "1") => true,
            Some("false" | "0") => false,
            Some(other) => return Err(SceneError::InvalidBool(other.to_string())),
        };
        if let Some(mesh) = mesh {
            node.mesh = Some(Arc::new(resolve_mesh(&mesh, mesh_dir)?));
        }

        let id = self.add(parent, node);
        for child in element.children().filter(|n| n.has_tag_name("object")) {
            self.add_xml_object(Some(id), child, mesh_dir)?;
        }
        Ok(id)
    }
}

/// Iterator returned by [`SceneGraph::ancestors`].
pub struct Ancestors<'a> {
    graph: &'a SceneGraph,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.graph.nodes[current.0].parent;
        Some(current)
    }
}

fn resolve_mesh(reference: &str, mesh_dir: &Path) -> Result<TriangleMesh, SceneError> {
    match reference {
        "cube" => Ok(TriangleMesh::unit_cube()),
        "plane" => Ok(TriangleMesh::unit_plane()),
        file => {
            let path: PathBuf = mesh_dir.join(file);
            let data = fs::read_to_string(&path).map_err(|source| SceneError::Io {
                path: path.clone(),
                source,
            })?;
            load_obj_from_str(&data).map_err(|err| SceneError::Mesh {
                path,
                message: format!("{err:#}"),
            })
        }
    }
}

fn optional_text(node: &XmlNode<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_vec3(value: Option<String>, default: Vec3) -> Result<Vec3, SceneError> {
    let Some(value) = value else {
        return Ok(default);
    };
    let components = value
        .split_whitespace()
        .map(|component| {
            component
                .parse::<f32>()
                .map_err(|_| SceneError::InvalidNumber(component.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    match components.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(SceneError::InvalidVector(value)),
    }
}
