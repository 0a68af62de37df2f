//! Skeleton, action and bone tree parsing.

use std::collections::{HashMap, HashSet};

use super::ParseContext;
use crate::animation::{Action, BoneTrack};
use crate::error::{Error, Result, Warning};
use crate::model::{Bone, NodeKind, PivotSet, PlaceholderKind, Skeleton};
use crate::sdr::constants::{
    ACT_ATTACK_WINDOW, ACT_DURATION, ACT_FLAGS, ACT_NAME, ACT_STAGE_OFFSET, ACTION_RECORD_SIZE,
    BONE_BIND_ROTATION, BONE_CHILD, BONE_CURVES, BONE_FLAGS, BONE_INDEX, BONE_INVERSE_BIND,
    BONE_MESH, BONE_NAME, BONE_PIVOTS, BONE_ROTATION, BONE_SCALE, BONE_SIBLING, BONE_TAG,
    BONE_TRANSLATION, BONE_VIEW_DISTANCE, SKEL_ACTION_COUNT, SKEL_ACTIONS, SKEL_BONE_COUNT,
    SKEL_NAME, SKEL_ROOT, TAG_CAMERA, TAG_LIGHT, TAG_NULL, TAG_RIGID_JOINT, TAG_SKIN,
    TAG_TRANSFORM,
};
use crate::sdr::header::{SkeletonSlot, Variant};

/// A bone as read, plus the links still to follow.
struct BoneRecord {
    index: usize,
    bone: Bone,
    child: Option<usize>,
    sibling: Option<usize>,
    curves: Option<usize>,
    /// Mesh address of a skin node, read once the tree is complete.
    mesh: Option<usize>,
}

impl ParseContext<'_> {
    pub(super) fn read_skeleton_table(&mut self, variant: Variant) -> Result<Vec<Skeleton>> {
        let addresses = match variant.skeleton_slot() {
            SkeletonSlot::List { pointer, count } => {
                let count: u16 = self.reader.read_at(count)?;
                match self.reader.read_ptr(0, pointer)? {
                    Some(list) => self.read_pointer_list(list, usize::from(count))?,
                    None => Vec::new(),
                }
            }
            SkeletonSlot::Single { pointer } => vec![self.reader.read_ptr(0, pointer)?],
        };

        addresses
            .into_iter()
            .flatten()
            .map(|address| self.read_skeleton(address))
            .collect()
    }

    fn read_skeleton(&mut self, address: usize) -> Result<Skeleton> {
        let name = self.read_name(address, SKEL_NAME)?;
        let bone_count: u16 = self.reader.read_field(address, SKEL_BONE_COUNT)?;
        let action_count: u16 = self.reader.read_field(address, SKEL_ACTION_COUNT)?;

        let mut actions = match self.reader.read_ptr(address, SKEL_ACTIONS)? {
            Some(list) => (0..usize::from(action_count))
                .map(|i| self.read_action(list + i * ACTION_RECORD_SIZE))
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        let bones = match self.reader.read_ptr(address, SKEL_ROOT)? {
            Some(root) => self.read_bone_tree(address, root, usize::from(bone_count), &mut actions)?,
            None => Vec::new(),
        };

        tracing::debug!(
            "Skeleton '{name}' at {address:#x}: {} bones, {} actions",
            bones.len(),
            actions.len()
        );
        Ok(Skeleton { name, bones, actions })
    }

    fn read_action(&mut self, record: usize) -> Result<Action> {
        let name = self.read_name(record, ACT_NAME)?;
        let mut flags = [0u8; 3];
        flags.copy_from_slice(self.reader.read_chunk(record + ACT_FLAGS, 3)?);
        Ok(Action {
            name,
            attack_window: self.reader.read_field(record, ACT_ATTACK_WINDOW)?,
            stage_offset: self.reader.read_field(record, ACT_STAGE_OFFSET)?,
            duration: self.reader.read_field(record, ACT_DURATION)?,
            flags,
            tracks: Vec::new(),
        })
    }

    /// Walk the bone tree depth-first, children before siblings.
    ///
    /// The walk keeps its own stack so deep hierarchies cannot overflow the
    /// call stack. Each bone's index comes from its header; the tree must
    /// reach every index below `bone_count` exactly once. Skin meshes are
    /// read afterwards, each after every mesh below it in the tree.
    fn read_bone_tree(
        &mut self,
        skeleton: usize,
        root: usize,
        bone_count: usize,
        actions: &mut [Action],
    ) -> Result<Vec<Bone>> {
        let mut slots: Vec<Option<Bone>> = (0..bone_count).map(|_| None).collect();
        let mut visited = HashSet::new();
        let mut names: HashMap<String, usize> = HashMap::new();
        let mut meshes: HashMap<usize, usize> = HashMap::new();
        let mut stack = vec![(root, None::<usize>)];

        while let Some((address, parent)) = stack.pop() {
            let malformed = |message: String| Error::MalformedSkeleton { address, message };
            if !visited.insert(address) {
                return Err(malformed("bone reached twice".to_string()));
            }

            let BoneRecord {
                index,
                mut bone,
                child,
                sibling,
                curves,
                mesh,
            } = self.read_bone(address)?;

            if index >= bone_count {
                return Err(malformed(format!("bone index {index} exceeds bone count {bone_count}")));
            }
            if slots[index].is_some() {
                return Err(malformed(format!("bone index {index} used twice")));
            }
            if parent.is_none() && index != 0 {
                return Err(malformed(format!("root bone has index {index}")));
            }

            bone.name = unique_name(&mut names, bone.name);
            bone.parent = parent;
            if let Some(parent) = parent.and_then(|p| slots[p].as_mut()) {
                parent.children.push(index);
            }

            if let Some(first) = curves {
                for (action, length, curves) in self.read_curve_chain(first, Some(actions.len()))? {
                    let target = actions.get_mut(action).ok_or(Error::DanglingReference {
                        kind: "action",
                        address: first,
                        target: action,
                    })?;
                    target.tracks.push(BoneTrack {
                        bone: index,
                        length,
                        curves,
                    });
                }
            }

            if let Some(mesh) = mesh {
                meshes.insert(index, mesh);
            }
            slots[index] = Some(bone);

            // the root has no siblings
            if parent.is_some()
                && let Some(sibling) = sibling
            {
                stack.push((sibling, parent));
            }
            if let Some(child) = child {
                stack.push((child, Some(index)));
            }
        }

        let mut bones = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| Error::MalformedSkeleton {
                    address: skeleton,
                    message: format!("bone index {index} is not reachable from the root"),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        for index in children_first(&bones) {
            if let Some(&address) = meshes.get(&index) {
                bones[index].kind = NodeKind::Skin {
                    mesh: Some(self.read_mesh(address)?),
                };
            }
        }
        Ok(bones)
    }

    fn read_bone(&mut self, address: usize) -> Result<BoneRecord> {
        let tag: u32 = self.reader.read_field(address, BONE_TAG)?;
        let index: u16 = self.reader.read_field(address, BONE_INDEX)?;
        let name = self.read_name(address, BONE_NAME)?;

        let kind = match tag {
            TAG_TRANSFORM => NodeKind::Transform {
                pivots: match self.reader.read_ptr(address, BONE_PIVOTS)? {
                    Some(block) => self.read_pivots(address, block)?,
                    None => None,
                },
            },
            TAG_NULL => NodeKind::Placeholder(PlaceholderKind::Null),
            TAG_RIGID_JOINT => {
                let bind_rotation = self.reader.read_vec3(address + BONE_BIND_ROTATION)?;
                let mut inverse_bind = [[0.0f32; 4]; 3];
                for (r, row) in inverse_bind.iter_mut().enumerate() {
                    for (c, value) in row.iter_mut().enumerate() {
                        *value = self.reader.read_field(address, BONE_INVERSE_BIND + (r * 4 + c) * 4)?;
                    }
                }
                NodeKind::RigidJoint {
                    inverse_bind,
                    bind_rotation,
                }
            }
            TAG_SKIN => NodeKind::Skin { mesh: None },
            TAG_CAMERA => NodeKind::Placeholder(PlaceholderKind::Camera),
            TAG_LIGHT => NodeKind::Placeholder(PlaceholderKind::Light),
            other => {
                self.warn(Warning::UnknownNodeType { address, tag: other });
                NodeKind::Placeholder(PlaceholderKind::Unknown(other))
            }
        };

        let mut bone = Bone::new(name, kind);
        bone.flags = self.reader.read_field(address, BONE_FLAGS)?;
        bone.view_distance = self.reader.read_field(address, BONE_VIEW_DISTANCE)?;

        // unknown nodes keep an identity transform
        if !matches!(bone.kind, NodeKind::Placeholder(PlaceholderKind::Unknown(_))) {
            if let Some(t) = self.reader.read_ptr(address, BONE_TRANSLATION)? {
                bone.translation = self.reader.read_vec3(t)?;
            }
            if let Some(r) = self.reader.read_ptr(address, BONE_ROTATION)? {
                bone.rotation = self.reader.read_vec3(r)?;
            }
            if let Some(s) = self.reader.read_ptr(address, BONE_SCALE)? {
                bone.scale = self.reader.read_vec3(s)?;
            }
        }

        tracing::debug!("Bone {index} '{}' ({}) at {address:#x}", bone.name, bone.kind.label());

        Ok(BoneRecord {
            index: usize::from(index),
            bone,
            child: self.reader.read_ptr(address, BONE_CHILD)?,
            sibling: self.reader.read_ptr(address, BONE_SIBLING)?,
            curves: self.reader.read_ptr(address, BONE_CURVES)?,
            mesh: match tag {
                TAG_SKIN => self.reader.read_ptr(address, BONE_MESH)?,
                _ => None,
            },
        })
    }

    /// Read a pivot block.
    ///
    /// A scale-pivot translation of all `+inf` marks the precomputed form.
    /// Any other infinite or NaN pattern is reported and the pivots dropped.
    fn read_pivots(&mut self, bone: usize, block: usize) -> Result<Option<PivotSet>> {
        let scale_pivot = self.reader.read_vec3(block)?;
        let scale_pivot_translation = self.reader.read_vec3(block + 0x0C)?;
        let rotate_pivot = self.reader.read_vec3(block + 0x18)?;
        let rotate_pivot_translation = self.reader.read_vec3(block + 0x24)?;

        let sentinels = scale_pivot_translation.iter().filter(|v| **v == f32::INFINITY).count();
        let all = [scale_pivot, scale_pivot_translation, rotate_pivot, rotate_pivot_translation];
        let nan = all.iter().flatten().any(|v| v.is_nan());

        if nan || (sentinels != 0 && sentinels != 3) {
            self.warn(Warning::UnrecognizedPivotSentinel { address: bone });
            return Ok(None);
        }

        Ok(Some(if sentinels == 3 {
            PivotSet::Precomputed {
                t1: scale_pivot,
                t2: rotate_pivot,
                t3: rotate_pivot_translation,
            }
        } else {
            PivotSet::Authored {
                scale_pivot,
                scale_pivot_translation,
                rotate_pivot,
                rotate_pivot_translation,
            }
        }))
    }
}

/// Bone indices with every bone after all of its descendants, siblings in
/// list order.
fn children_first(bones: &[Bone]) -> Vec<usize> {
    let mut order = Vec::with_capacity(bones.len());
    if bones.is_empty() {
        return order;
    }
    let mut stack = vec![(0usize, false)];
    while let Some((index, expanded)) = stack.pop() {
        if expanded {
            order.push(index);
            continue;
        }
        stack.push((index, true));
        stack.extend(bones[index].children.iter().rev().map(|&child| (child, false)));
    }
    order
}

/// Suffix `name` with `.001`, `.002`, ... until it is unused in this skeleton.
fn unique_name(names: &mut HashMap<String, usize>, name: String) -> String {
    let Some(&used) = names.get(&name) else {
        names.insert(name.clone(), 0);
        return name;
    };
    let mut suffix = used;
    loop {
        suffix += 1;
        let candidate = format!("{name}.{suffix:03}");
        if !names.contains_key(&candidate) {
            names.insert(candidate.clone(), 0);
            names.insert(name, suffix);
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_first_order() {
        let null = || Bone::new("n", NodeKind::Placeholder(PlaceholderKind::Null));
        let mut skeleton = Skeleton::new("rig", null());
        let a = skeleton.add_bone(0, null());
        let b = skeleton.add_bone(0, null());
        let a1 = skeleton.add_bone(a, null());
        assert_eq!(children_first(&skeleton.bones), vec![a1, a, b, 0]);
    }

    #[test]
    fn test_unique_name_suffixes() {
        let mut names = HashMap::new();
        assert_eq!(unique_name(&mut names, "arm".to_string()), "arm");
        assert_eq!(unique_name(&mut names, "arm".to_string()), "arm.001");
        assert_eq!(unique_name(&mut names, "arm".to_string()), "arm.002");
        assert_eq!(unique_name(&mut names, "arm.001".to_string()), "arm.001.001");
    }
}
