//! Skeletons and bone nodes.

use serde::Serialize;

use crate::animation::Action;

/// Bone flags written when none were read.
pub const DEFAULT_BONE_FLAGS: u16 = 0x18;

/// Pivot data of a pivot-transform node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PivotSet {
    /// Authored pivots, expanded into correction translations when composed.
    Authored {
        scale_pivot: [f32; 3],
        scale_pivot_translation: [f32; 3],
        rotate_pivot: [f32; 3],
        rotate_pivot_translation: [f32; 3],
    },
    /// Correction translations stored directly.
    Precomputed {
        t1: [f32; 3],
        t2: [f32; 3],
        t3: [f32; 3],
    },
}

impl PivotSet {
    /// The correction translations `(T1, T2, T3)` of the composition
    /// `T * T3 * R * T2 * S * T1`.
    #[must_use]
    pub fn corrections(&self) -> ([f32; 3], [f32; 3], [f32; 3]) {
        match *self {
            Self::Authored {
                scale_pivot: sp,
                scale_pivot_translation: spt,
                rotate_pivot: rp,
                rotate_pivot_translation: rpt,
            } => (
                [-sp[0], -sp[1], -sp[2]],
                [sp[0] + spt[0] - rp[0], sp[1] + spt[1] - rp[1], sp[2] + spt[2] - rp[2]],
                [rp[0] + rpt[0], rp[1] + rpt[1], rp[2] + rpt[2]],
            ),
            Self::Precomputed { t1, t2, t3 } => (t1, t2, t3),
        }
    }
}

/// Nodes that only take part in the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PlaceholderKind {
    Null,
    Camera,
    Light,
    /// A tag outside the recognized set, kept for re-serialization.
    Unknown(u32),
}

/// What a bone node is, with the data only that kind carries.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Plain transform node with optional pivots (tag 0).
    Transform { pivots: Option<PivotSet> },
    /// Skinning joint with bind data (tag 2).
    RigidJoint {
        /// Inverse bind matrix, row-major 3x4.
        inverse_bind: [[f32; 4]; 3],
        /// Euler XYZ bind orientation, pre-multiplied onto the animated rotation.
        bind_rotation: [f32; 3],
    },
    /// Node that draws a mesh (tag 3).
    Skin {
        /// Index into [`Model::meshes`](super::Model::meshes).
        mesh: Option<usize>,
    },
    /// Null, camera, light or unknown node (tags 1, 4, 5, other).
    Placeholder(PlaceholderKind),
}

impl NodeKind {
    /// The on-disk node tag.
    #[must_use]
    pub const fn tag(&self) -> u32 {
        match self {
            Self::Transform { .. } => 0,
            Self::RigidJoint { .. } => 2,
            Self::Skin { .. } => 3,
            Self::Placeholder(PlaceholderKind::Null) => 1,
            Self::Placeholder(PlaceholderKind::Camera) => 4,
            Self::Placeholder(PlaceholderKind::Light) => 5,
            Self::Placeholder(PlaceholderKind::Unknown(tag)) => *tag,
        }
    }

    /// Short name for listings.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Transform { .. } => "transform",
            Self::RigidJoint { .. } => "joint",
            Self::Skin { .. } => "skin",
            Self::Placeholder(PlaceholderKind::Null) => "null",
            Self::Placeholder(PlaceholderKind::Camera) => "camera",
            Self::Placeholder(PlaceholderKind::Light) => "light",
            Self::Placeholder(PlaceholderKind::Unknown(_)) => "unknown",
        }
    }
}

/// Identity inverse bind matrix.
pub const IDENTITY_3X4: [[f32; 4]; 3] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
];

/// One node of a skeleton's hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub name: String,
    pub kind: NodeKind,
    pub flags: u16,
    pub translation: [f32; 3],
    /// Euler XYZ in radians.
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
    pub view_distance: f32,
    /// Index of the parent bone, `None` only for the root.
    pub parent: Option<usize>,
    /// Children in sibling order.
    pub children: Vec<usize>,
}

impl Bone {
    /// A bone with an identity local transform.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            flags: DEFAULT_BONE_FLAGS,
            translation: [0.0; 3],
            rotation: [0.0; 3],
            scale: [1.0; 3],
            view_distance: 0.0,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// A bone hierarchy with its animation clips.
///
/// Bone 0 is the root; every other bone has exactly one parent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Skeleton {
    pub name: String,
    pub bones: Vec<Bone>,
    pub actions: Vec<Action>,
}

impl Skeleton {
    /// A skeleton holding only a root bone.
    #[must_use]
    pub fn new(name: impl Into<String>, root: Bone) -> Self {
        Self {
            name: name.into(),
            bones: vec![root],
            actions: Vec::new(),
        }
    }

    /// Append `bone` under `parent`, returning its index.
    pub fn add_bone(&mut self, parent: usize, mut bone: Bone) -> usize {
        let index = self.bones.len();
        bone.parent = Some(parent);
        self.bones.push(bone);
        if let Some(parent) = self.bones.get_mut(parent) {
            parent.children.push(index);
        }
        index
    }

    /// Look up a bone index by name.
    #[must_use]
    pub fn find_bone(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    /// Bone indices in depth-first order, children before siblings.
    ///
    /// Each bone is listed once; child indices that are out of range or
    /// already visited are skipped, so a malformed hierarchy still terminates.
    #[must_use]
    pub fn depth_first(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.bones.len());
        if self.bones.is_empty() {
            return order;
        }
        let mut visited = vec![false; self.bones.len()];
        let mut stack = vec![0usize];
        while let Some(index) = stack.pop() {
            if visited[index] {
                continue;
            }
            visited[index] = true;
            order.push(index);
            let children = &self.bones[index].children;
            stack.extend(children.iter().rev().filter(|&&c| c < self.bones.len() && !visited[c]));
        }
        order
    }
}
