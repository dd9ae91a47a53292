use crate::{Color, Transform3D};
use starfield_ids::{MaterialID, MeshID, NodeID};

/// Materials bound to a mesh leaf: one for the whole mesh, or one per geometry group.
#[derive(Clone, Debug, PartialEq)]
pub enum MaterialSlot {
    Single(MaterialID),
    Multi(Vec<MaterialID>),
}

impl MaterialSlot {
    pub fn ids(&self) -> &[MaterialID] {
        match self {
            Self::Single(id) => std::slice::from_ref(id),
            Self::Multi(ids) => ids,
        }
    }

    pub fn ids_mut(&mut self) -> &mut [MaterialID] {
        match self {
            Self::Single(id) => std::slice::from_mut(id),
            Self::Multi(ids) => ids,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MeshNode {
    pub mesh: MeshID,
    pub materials: MaterialSlot,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Group,
    Mesh(MeshNode),
}

/// Identity stamped onto nodes so a scene-graph hit can be traced back to its owner.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeTag {
    pub owner: String,
    pub color: Option<Color>,
    pub emissive: Option<Color>,
}

impl NodeTag {
    pub fn owner(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            color: None,
            emissive: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SceneNode {
    pub name: Option<String>,
    pub transform: Transform3D,
    pub visible: bool,
    pub kind: NodeKind,
    pub tag: Option<NodeTag>,
    pub(crate) parent: NodeID,
    pub(crate) children: Vec<NodeID>,
}

impl SceneNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            name: None,
            transform: Transform3D::IDENTITY,
            visible: true,
            kind,
            tag: None,
            parent: NodeID::nil(),
            children: Vec::new(),
        }
    }

    pub fn group() -> Self {
        Self::new(NodeKind::Group)
    }

    pub fn mesh(mesh: MeshID, materials: MaterialSlot) -> Self {
        Self::new(NodeKind::Mesh(MeshNode { mesh, materials }))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_transform(mut self, transform: Transform3D) -> Self {
        self.transform = transform;
        self
    }

    #[inline]
    pub fn parent(&self) -> NodeID {
        self.parent
    }

    #[inline]
    pub fn children(&self) -> &[NodeID] {
        &self.children
    }

    pub fn as_mesh(&self) -> Option<&MeshNode> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            NodeKind::Group => None,
        }
    }
}
