//! Local and global bone transforms.

use glam::{Mat4, Vec3};

use crate::animation::{Action, CurveComponent};
use crate::model::{Bone, NodeKind, PlaceholderKind, Skeleton};

/// Rotation from Euler XYZ radians, applied X first: `Rz * Ry * Rx`.
#[must_use]
pub fn euler_rotation(rotation: [f32; 3]) -> Mat4 {
    Mat4::from_rotation_z(rotation[2]) * Mat4::from_rotation_y(rotation[1]) * Mat4::from_rotation_x(rotation[0])
}

/// Expand a row-major 3x4 matrix into a full affine matrix.
#[must_use]
pub fn matrix_from_rows(rows: &[[f32; 4]; 3]) -> Mat4 {
    Mat4::from_cols_array_2d(&[rows[0], rows[1], rows[2], [0.0, 0.0, 0.0, 1.0]]).transpose()
}

/// The bone's transform relative to its parent.
///
/// - rigid joints: `T * (Rbind * R) * S`
/// - transform nodes with pivots: `T * T3 * R * T2 * S * T1`
/// - unknown node types: identity
/// - everything else: `T * R * S`
#[must_use]
pub fn local_transform(bone: &Bone) -> Mat4 {
    let t = Mat4::from_translation(Vec3::from_array(bone.translation));
    let r = euler_rotation(bone.rotation);
    let s = Mat4::from_scale(Vec3::from_array(bone.scale));

    match &bone.kind {
        NodeKind::RigidJoint { bind_rotation, .. } => t * (euler_rotation(*bind_rotation) * r) * s,
        NodeKind::Transform { pivots: Some(pivots) } => {
            let (t1, t2, t3) = pivots.corrections();
            let [t1, t2, t3] = [t1, t2, t3].map(|v| Mat4::from_translation(Vec3::from_array(v)));
            t * t3 * r * t2 * s * t1
        }
        NodeKind::Placeholder(PlaceholderKind::Unknown(_)) => Mat4::IDENTITY,
        _ => t * r * s,
    }
}

/// Global transforms of every bone, composed top-down from an identity root
/// parent.
#[must_use]
pub fn global_transforms(skeleton: &Skeleton) -> Vec<Mat4> {
    compose(&skeleton.bones, skeleton.depth_first())
}

fn compose(bones: &[Bone], order: Vec<usize>) -> Vec<Mat4> {
    let mut globals = vec![Mat4::IDENTITY; bones.len()];
    for index in order {
        let Some(bone) = bones.get(index) else {
            continue;
        };
        let parent = bone.parent.and_then(|p| globals.get(p).copied()).unwrap_or(Mat4::IDENTITY);
        globals[index] = parent * local_transform(bone);
    }
    globals
}

/// Inverse bind matrices: the stored matrix of rigid joints, the inverse of
/// the rest-pose global transform for every other node.
#[must_use]
pub fn inverse_bind_matrices(skeleton: &Skeleton) -> Vec<Mat4> {
    global_transforms(skeleton)
        .into_iter()
        .zip(&skeleton.bones)
        .map(|(global, bone)| match &bone.kind {
            NodeKind::RigidJoint { inverse_bind, .. } => matrix_from_rows(inverse_bind),
            _ => global.inverse(),
        })
        .collect()
}

/// Global transforms with the bone curves of `action` sampled at `time`.
///
/// Channels without a curve keep the rest value of the bone.
#[must_use]
pub fn posed_transforms(skeleton: &Skeleton, action: &Action, time: f32) -> Vec<Mat4> {
    let mut bones = skeleton.bones.clone();
    for track in &action.tracks {
        let Some(bone) = bones.get_mut(track.bone) else {
            continue;
        };
        for curve in &track.curves {
            let channel = match curve.component {
                CurveComponent::Translation => &mut bone.translation,
                CurveComponent::Rotation => &mut bone.rotation,
                CurveComponent::Scale => &mut bone.scale,
                CurveComponent::UvTranslation | CurveComponent::UvScale => continue,
            };
            if let Some(slot) = channel.get_mut(usize::from(curve.axis)) {
                *slot = curve.evaluate(time);
            }
        }
    }
    compose(&bones, skeleton.depth_first())
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;
    use crate::animation::{BoneTrack, FCurve, Interpolation, Keyframe};
    use crate::model::{IDENTITY_3X4, PivotSet};

    fn transform(name: &str) -> Bone {
        Bone::new(name, NodeKind::Transform { pivots: None })
    }

    fn assert_vec3_near(actual: Vec3, expected: Vec3) {
        assert!(actual.abs_diff_eq(expected, 1e-5), "{actual:?} != {expected:?}");
    }

    #[test]
    fn test_euler_applies_x_first() {
        // X then Z: +Y goes to +Z under X, +Z stays under Z
        let m = euler_rotation([FRAC_PI_2, 0.0, FRAC_PI_2]);
        assert_vec3_near(m.transform_vector3(Vec3::Y), Vec3::Z);
    }

    #[test]
    fn test_globals_compose_parent_first() {
        let mut root = transform("root");
        root.translation = [1.0, 0.0, 0.0];
        let mut skeleton = Skeleton::new("rig", root);
        let mut child = transform("child");
        child.translation = [0.0, 2.0, 0.0];
        let child = skeleton.add_bone(0, child);

        let globals = global_transforms(&skeleton);
        assert_vec3_near(globals[child].transform_point3(Vec3::ZERO), Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_globals_terminate_on_cycle() {
        let mut skeleton = Skeleton::new("rig", transform("root"));
        let mut child = transform("a");
        child.translation = [0.0, 1.0, 0.0];
        let a = skeleton.add_bone(0, child);
        skeleton.bones[a].children.push(0);
        skeleton.bones[a].parent = Some(42);

        let globals = global_transforms(&skeleton);
        assert_eq!(globals.len(), 2);
        assert_vec3_near(globals[a].transform_point3(Vec3::ZERO), Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_pivot_rotation_about_rotate_pivot() {
        let mut bone = Bone::new(
            "pivoted",
            NodeKind::Transform {
                pivots: Some(PivotSet::Authored {
                    scale_pivot: [0.0; 3],
                    scale_pivot_translation: [0.0; 3],
                    rotate_pivot: [1.0, 0.0, 0.0],
                    rotate_pivot_translation: [0.0; 3],
                }),
            },
        );
        bone.rotation = [0.0, 0.0, FRAC_PI_2];
        // the pivot itself stays put
        assert_vec3_near(local_transform(&bone).transform_point3(Vec3::X), Vec3::X);
    }

    #[test]
    fn test_unknown_node_is_identity() {
        let mut bone = Bone::new("odd", NodeKind::Placeholder(PlaceholderKind::Unknown(9)));
        bone.translation = [5.0, 5.0, 5.0];
        assert_eq!(local_transform(&bone), Mat4::IDENTITY);
    }

    #[test]
    fn test_joint_inverse_bind_from_rows() {
        let mut rows = IDENTITY_3X4;
        rows[1][3] = -3.0;
        let mut skeleton = Skeleton::new("rig", transform("root"));
        skeleton.add_bone(
            0,
            Bone::new(
                "joint",
                NodeKind::RigidJoint {
                    inverse_bind: rows,
                    bind_rotation: [0.0; 3],
                },
            ),
        );
        let inverse = inverse_bind_matrices(&skeleton);
        assert_vec3_near(inverse[1].transform_point3(Vec3::ZERO), Vec3::new(0.0, -3.0, 0.0));
        assert_eq!(inverse[0], Mat4::IDENTITY);
    }

    #[test]
    fn test_posed_transforms_sample_curves() {
        let mut skeleton = Skeleton::new("rig", transform("root"));
        let mut curve = FCurve::new(CurveComponent::Translation, 0);
        curve.keyframes = vec![
            Keyframe::new(0.0, 0.0, Interpolation::Linear),
            Keyframe::new(1.0, 4.0, Interpolation::Linear),
        ];
        let mut action = Action::new("walk", 1.0);
        action.tracks.push(BoneTrack {
            bone: 0,
            length: 1.0,
            curves: vec![curve],
        });
        skeleton.actions.push(action);

        let posed = posed_transforms(&skeleton, &skeleton.actions[0], 0.5);
        assert_vec3_near(posed[0].transform_point3(Vec3::ZERO), Vec3::new(2.0, 0.0, 0.0));
    }
}
