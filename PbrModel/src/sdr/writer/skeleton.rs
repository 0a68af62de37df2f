//! Action, skeleton and bone tree layout.

use std::collections::HashMap;

use super::curve::ChainTrack;
use super::{SerializeContext, count_u16};
use crate::animation::{Action, MIN_DURATION};
use crate::binary::align_up;
use crate::error::Result;
use crate::model::{Bone, NodeKind, PivotSet, Skeleton};
use crate::sdr::constants::{
    ACT_ATTACK_WINDOW, ACT_DURATION, ACT_FLAGS, ACT_NAME, ACT_STAGE_OFFSET, ACTION_RECORD_SIZE,
    BONE_BIND_ROTATION, BONE_CHILD, BONE_CURVES, BONE_FLAGS, BONE_HEADER_SIZE, BONE_INDEX,
    BONE_INVERSE_BIND, BONE_NAME, BONE_PIVOTS, BONE_ROTATION, BONE_SCALE, BONE_SIBLING, BONE_TAG,
    BONE_TRANSLATION, BONE_VIEW_DISTANCE, JOINT_HEADER_SIZE, PIVOT_BLOCK_SIZE, SKEL_ACTION_COUNT,
    SKEL_ACTIONS, SKEL_BONE_COUNT, SKEL_NAME, SKEL_ROOT, SKELETON_HEADER_SIZE, SKIN_HEADER_SIZE,
};
use crate::sdr::header::{SkeletonSlot, Variant};

impl SerializeContext<'_> {
    /// Write every skeleton's actions, the skeleton table, then each skeleton
    /// with its bones. Returns the header address of every bone, per skeleton.
    pub(super) fn write_skeletons(&mut self, variant: Variant) -> Result<Vec<Vec<usize>>> {
        let model = self.model;

        let action_lists: Vec<Option<usize>> = model
            .skeletons
            .iter()
            .map(|skeleton| self.write_actions(&skeleton.actions))
            .collect::<Result<_>>()?;

        let slot = match variant.skeleton_slot() {
            SkeletonSlot::List { pointer, count } => {
                let list = self.allocate(model.skeletons.len() * 4, 4);
                self.cursor = align_up(self.cursor, 0x10);
                self.out.reserve_to(self.cursor);
                self.out.write_ptr(0, pointer, list);
                self.out.write_at(count, count_u16(model.skeletons.len(), "skeletons")?);
                (list, 4)
            }
            SkeletonSlot::Single { pointer } => (pointer, 0),
        };

        let mut addresses = Vec::with_capacity(model.skeletons.len());
        for (i, (skeleton, actions)) in model.skeletons.iter().zip(action_lists).enumerate() {
            let header = self.allocate(SKELETON_HEADER_SIZE, 4);
            self.out.write_ptr(slot.0, i * slot.1, header);
            addresses.push(self.write_skeleton(header, skeleton, actions)?);
        }
        Ok(addresses)
    }

    /// Action records, then their names. Returns the record list address.
    fn write_actions(&mut self, actions: &[Action]) -> Result<Option<usize>> {
        if actions.is_empty() {
            return Ok(None);
        }
        let list = self.allocate(actions.len() * ACTION_RECORD_SIZE, 4);
        for (i, action) in actions.iter().enumerate() {
            let record = list + i * ACTION_RECORD_SIZE;
            self.out.write_field(record, ACT_ATTACK_WINDOW, action.attack_window);
            self.out.write_field(record, ACT_STAGE_OFFSET, action.stage_offset);
            self.out.write_field(record, ACT_DURATION, action.duration.max(MIN_DURATION));
            self.out.write_chunk(record + ACT_FLAGS, &action.flags);
        }
        for (i, action) in actions.iter().enumerate() {
            self.write_name(list + i * ACTION_RECORD_SIZE, ACT_NAME, &action.name);
        }
        Ok(Some(list))
    }

    fn write_skeleton(&mut self, header: usize, skeleton: &Skeleton, actions: Option<usize>) -> Result<Vec<usize>> {
        self.out.write_field(header, SKEL_BONE_COUNT, count_u16(skeleton.bones.len(), "bones")?);
        self.out.write_field(header, SKEL_ACTION_COUNT, count_u16(skeleton.actions.len(), "actions")?);
        if let Some(list) = actions {
            self.out.write_ptr(header, SKEL_ACTIONS, list);
        }
        self.write_name(header, SKEL_NAME, &skeleton.name);

        // per bone: (action index, length, curves), in action order
        let mut tracks: HashMap<usize, Vec<ChainTrack<'_>>> = HashMap::new();
        for (a, action) in skeleton.actions.iter().enumerate() {
            for track in &action.tracks {
                tracks
                    .entry(track.bone)
                    .or_default()
                    .push((a, track.length, track.curves.as_slice()));
            }
        }

        let addresses = self.write_bone_tree(skeleton, header + SKEL_ROOT, &tracks)?;
        tracing::debug!(
            "Wrote skeleton '{}' ({} bones), cursor at {:#x}",
            skeleton.name,
            skeleton.bones.len(),
            self.cursor
        );
        Ok(addresses)
    }

    /// Lay bones out depth-first, children before siblings.
    ///
    /// Each stack entry carries the pointer field to patch with the bone's
    /// address: the skeleton's root field, a parent's child field or an
    /// elder sibling's sibling field.
    fn write_bone_tree(
        &mut self,
        skeleton: &Skeleton,
        root_field: usize,
        tracks: &HashMap<usize, Vec<ChainTrack<'_>>>,
    ) -> Result<Vec<usize>> {
        let mut addresses = vec![0usize; skeleton.bones.len()];
        if skeleton.bones.is_empty() {
            return Ok(addresses);
        }

        let mut stack = vec![(0usize, root_field)];
        while let Some((index, field)) = stack.pop() {
            let bone = &skeleton.bones[index];
            let address = self.write_bone(index, bone, tracks.get(&index).map(Vec::as_slice))?;
            self.out.write_at(field, address as u32);
            addresses[index] = address;

            let younger = bone.parent.and_then(|parent| {
                let siblings = &skeleton.bones[parent].children;
                let position = siblings.iter().position(|&c| c == index)?;
                siblings.get(position + 1).copied()
            });
            if let Some(sibling) = younger {
                stack.push((sibling, address + BONE_SIBLING));
            }
            if let Some(&child) = bone.children.first() {
                stack.push((child, address + BONE_CHILD));
            }
        }
        Ok(addresses)
    }

    /// Header, transform blocks, pivots, name, then curves.
    fn write_bone(&mut self, index: usize, bone: &Bone, tracks: Option<&[ChainTrack<'_>]>) -> Result<usize> {
        let size = match bone.kind {
            NodeKind::Skin { .. } => SKIN_HEADER_SIZE,
            NodeKind::RigidJoint { .. } => JOINT_HEADER_SIZE,
            _ => BONE_HEADER_SIZE,
        };
        let address = self.allocate(size, 4);

        self.out.write_field(address, BONE_TAG, bone.kind.tag());
        self.out.write_field(address, BONE_INDEX, count_u16(index, "bones")?);
        self.out.write_field(address, BONE_FLAGS, bone.flags);
        self.out.write_field(address, BONE_VIEW_DISTANCE, bone.view_distance);

        if let NodeKind::RigidJoint {
            inverse_bind,
            bind_rotation,
        } = &bone.kind
        {
            self.out.write_vec3(address + BONE_BIND_ROTATION, *bind_rotation);
            for (r, row) in inverse_bind.iter().enumerate() {
                for (c, value) in row.iter().enumerate() {
                    self.out.write_field(address, BONE_INVERSE_BIND + (r * 4 + c) * 4, *value);
                }
            }
        }

        // only non-default components get a block
        for (field, value, rest) in [
            (BONE_TRANSLATION, bone.translation, [0.0; 3]),
            (BONE_ROTATION, bone.rotation, [0.0; 3]),
            (BONE_SCALE, bone.scale, [1.0; 3]),
        ] {
            if value != rest {
                let block = self.allocate(12, 4);
                self.out.write_vec3(block, value);
                self.out.write_ptr(address, field, block);
            }
        }

        if let NodeKind::Transform { pivots: Some(pivots) } = &bone.kind {
            let block = self.allocate(PIVOT_BLOCK_SIZE, 4);
            let slots = match *pivots {
                PivotSet::Authored {
                    scale_pivot,
                    scale_pivot_translation,
                    rotate_pivot,
                    rotate_pivot_translation,
                } => [scale_pivot, scale_pivot_translation, rotate_pivot, rotate_pivot_translation],
                PivotSet::Precomputed { t1, t2, t3 } => [t1, [f32::INFINITY; 3], t2, t3],
            };
            for (i, slot) in slots.into_iter().enumerate() {
                self.out.write_vec3(block + i * 0x0C, slot);
            }
            self.out.write_ptr(address, BONE_PIVOTS, block);
        }

        self.write_name(address, BONE_NAME, &bone.name);

        if let Some(tracks) = tracks
            && let Some(first) = self.write_curve_chain(tracks)?
        {
            self.out.write_ptr(address, BONE_CURVES, first);
        }

        Ok(address)
    }
}
