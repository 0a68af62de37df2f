use pbrmodel::animation::MIN_DURATION;
use pbrmodel::prelude::*;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn root() -> Bone {
    Bone::new("root", NodeKind::Transform { pivots: None })
}

/// One root, one skin node drawing a single triangle with one material.
fn single_triangle_model() -> Model {
    let mut model = Model::new(Variant::Sdr);
    model.materials.push(Material::new("body"));
    model.meshes.push(Mesh {
        positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        normals: vec![[0.0, 0.0, 1.0]; 3],
        parts: vec![MeshPart {
            material: 0,
            faces: vec![Face::shared([0, 1, 2], false)],
        }],
        ..Mesh::default()
    });
    let mut skeleton = Skeleton::new("pm0025", root());
    skeleton.add_bone(0, Bone::new("skin", NodeKind::Skin { mesh: Some(0) }));
    model.skeletons.push(skeleton);
    model
}

fn round_trip(model: &Model) -> ParsedModel {
    let bytes = serialize_to_bytes(model, WriteOptions::default()).unwrap();
    parse_bytes(&bytes).unwrap()
}

#[test]
fn test_single_triangle_round_trip() {
    let model = single_triangle_model();
    let first = serialize_to_bytes(&model, WriteOptions::default()).unwrap();
    let parsed = parse_bytes(&first).unwrap();

    assert!(parsed.warnings.is_empty());
    let skeleton = &parsed.model.skeletons[0];
    assert_eq!(skeleton.bones.len(), 2);
    assert_eq!(skeleton.bones[1].parent, Some(0));
    assert_eq!(parsed.model.meshes.len(), 1);
    assert_eq!(parsed.model.meshes[0].parts.len(), 1);
    assert_eq!(parsed.model.meshes[0].parts[0].faces, vec![Face::shared([0, 1, 2], false)]);
    assert_eq!(parsed.model, model);

    let second = serialize_to_bytes(&parsed.model, WriteOptions::default()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_legacy_revision_round_trip() {
    let model = single_triangle_model();
    let options = WriteOptions::default().with_revision(Revision::Legacy);
    let first = serialize_to_bytes(&model, options).unwrap();
    let parsed = parse_bytes(&first).unwrap();
    assert_eq!(serialize_to_bytes(&parsed.model, options).unwrap(), first);
}

#[test]
fn test_zero_weight_partner_survives() {
    let mut model = single_triangle_model();
    model.meshes[0].weights = Some(vec![
        VertexWeights::from([(3, 1.0), (7, 0.0)]),
        VertexWeights::from([(3, 1.0), (7, 0.0)]),
        VertexWeights::from([(3, 1.0), (7, 0.0)]),
    ]);

    let parsed = round_trip(&model);
    let weights = parsed.model.meshes[0].weights.as_ref().unwrap();
    assert_eq!(weights[0].len(), 2);
    assert_eq!(weights[0][&3], 1.0);
    assert_eq!(weights[0][&7], 0.0);
}

#[test]
fn test_mixed_weight_tables() {
    let mut model = single_triangle_model();
    model.meshes[0].weights = Some(vec![
        VertexWeights::from([(1, 1.0)]),
        VertexWeights::from([(0, 0.25), (1, 0.75)]),
        VertexWeights::from([(0, 0.3), (1, 0.3), (2, 0.2), (3, 0.2)]),
    ]);

    let parsed = round_trip(&model);
    assert!(parsed.warnings.is_empty(), "{:?}", parsed.warnings);
    let weights = parsed.model.meshes[0].weights.as_ref().unwrap();
    assert_eq!(weights[0], VertexWeights::from([(1, 1.0)]));
    assert!((weights[1][&0] - 0.25).abs() < 1e-4);
    for (bone, expected) in [(0u16, 0.3f32), (1, 0.3), (2, 0.2), (3, 0.2)] {
        assert!((weights[2][&bone] - expected).abs() < 1e-3, "bone {bone}: {}", weights[2][&bone]);
    }
}

#[test]
fn test_degenerate_face_dropped() {
    let mut model = single_triangle_model();
    model.meshes[0].parts[0].faces.push(Face::shared([0, 0, 1], false));

    let parsed = round_trip(&model);
    assert_eq!(parsed.model.meshes[0].face_count(), 1);
}

#[test]
fn test_uvs_flip_and_return() {
    let mut model = single_triangle_model();
    model.meshes[0].uvs = Some(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
    model.meshes[0].parts[0].faces = vec![Face::shared([0, 1, 2], true)];

    let parsed = round_trip(&model);
    let mesh = &parsed.model.meshes[0];
    assert_eq!(mesh.uvs, Some(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]));
    assert_eq!(mesh.parts[0].faces[0].uvs, Some([0, 1, 2]));
}

#[test]
fn test_bounds_round_trip() {
    let mut model = single_triangle_model();
    model.meshes[0].bounds = Bounds::enclosing(&model.meshes[0].positions);

    let parsed = round_trip(&model);
    assert_eq!(parsed.model.meshes[0].bounds, model.meshes[0].bounds);
}

#[test]
fn test_bone_kinds_round_trip() {
    let mut model = single_triangle_model();
    let skeleton = &mut model.skeletons[0];

    let mut joint = Bone::new(
        "joint",
        NodeKind::RigidJoint {
            inverse_bind: [[1.0, 0.0, 0.0, -1.0], [0.0, 1.0, 0.0, 0.0], [0.0, 0.0, 1.0, 0.5]],
            bind_rotation: [0.0, 0.5, 0.0],
        },
    );
    joint.translation = [1.0, 0.0, -0.5];
    joint.view_distance = 120.0;
    let joint = skeleton.add_bone(0, joint);

    let mut pivoted = Bone::new(
        "pivoted",
        NodeKind::Transform {
            pivots: Some(PivotSet::Precomputed {
                t1: [1.0, 2.0, 3.0],
                t2: [0.0, -1.0, 0.0],
                t3: [0.5, 0.5, 0.5],
            }),
        },
    );
    pivoted.scale = [2.0, 2.0, 2.0];
    skeleton.add_bone(joint, pivoted);
    skeleton.add_bone(joint, Bone::new("eye", NodeKind::Placeholder(PlaceholderKind::Camera)));

    let parsed = round_trip(&model);
    assert!(parsed.warnings.is_empty(), "{:?}", parsed.warnings);
    assert_eq!(parsed.model.skeletons, model.skeletons);
}

#[test]
fn test_duplicate_bone_names_suffixed() {
    let mut model = single_triangle_model();
    model.skeletons[0].add_bone(0, Bone::new("skin", NodeKind::Placeholder(PlaceholderKind::Null)));

    let parsed = round_trip(&model);
    let names: Vec<&str> = parsed.model.skeletons[0].bones.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["root", "skin", "skin.001"]);
}

#[test]
fn test_animation_round_trip() {
    let mut model = single_triangle_model();
    let mut curve = FCurve::new(CurveComponent::Rotation, 2);
    curve.keyframes = vec![
        Keyframe::new(0.0, 0.0, Interpolation::Hermite),
        Keyframe::new(0.5, 1.5, Interpolation::Hermite),
        Keyframe::new(1.0, -0.25, Interpolation::Linear),
    ];
    let mut action = Action::new("idle", 0.0);
    action.attack_window = 0.25;
    action.flags = [1, 0, 1];
    action.tracks.push(BoneTrack {
        bone: 1,
        length: 1.0,
        curves: vec![curve],
    });
    model.skeletons[0].actions.push(action);

    let parsed = round_trip(&model);
    let action = &parsed.model.skeletons[0].actions[0];
    assert_eq!(action.name, "idle");
    assert_eq!(action.duration, MIN_DURATION);
    assert_eq!(action.flags, [1, 0, 1]);
    assert_eq!(action.tracks.len(), 1);

    let track = &action.tracks[0];
    assert_eq!(track.bone, 1);
    let curve = &track.curves[0];
    assert_eq!(curve.component, CurveComponent::Rotation);
    assert_eq!(curve.axis, 2);
    assert_eq!(curve.format, ValueFormat::Fixed16);
    let values: Vec<f32> = curve.keyframes.iter().map(|k| k.value).collect();
    assert_eq!(values, vec![0.0, 1.5, -0.25]);

    // handles restore the slope towards each neighbour
    let first = curve.keyframes[0];
    assert!((first.out_slope - 3.0).abs() < 1e-5);
    let middle = curve.keyframes[1];
    assert!((middle.in_slope - 3.0).abs() < 1e-5);
    assert!((middle.out_slope + 3.5).abs() < 1e-5);
}

fn single_curve_model(curve: FCurve) -> Model {
    let mut model = single_triangle_model();
    let mut action = Action::new("idle", 1.0);
    action.tracks.push(BoneTrack {
        bone: 1,
        length: 1.0,
        curves: vec![curve],
    });
    model.skeletons[0].actions.push(action);
    model
}

#[test]
fn test_coarse_exponent_rewritten_finest() {
    let mut curve = FCurve::new(CurveComponent::Rotation, 0);
    curve.format = ValueFormat::Fixed16;
    curve.exponent = Some(2);
    curve.keyframes = vec![
        Keyframe::new(0.0, 1.0, Interpolation::Linear),
        Keyframe::new(1.0, 3.5, Interpolation::Linear),
    ];

    let parsed = round_trip(&single_curve_model(curve));
    let curve = &parsed.model.skeletons[0].actions[0].tracks[0].curves[0];
    // 3.5 * 2^13 is the largest scale below 2^15
    assert_eq!(curve.exponent, Some(13));
    let values: Vec<f32> = curve.keyframes.iter().map(|k| k.value).collect();
    assert_eq!(values, vec![1.0, 3.5]);
}

#[test]
fn test_duplicate_keyframe_times_collapse() {
    let mut curve = FCurve::new(CurveComponent::Translation, 1);
    curve.keyframes = vec![
        Keyframe::new(0.0, 1.0, Interpolation::Linear),
        Keyframe::new(0.5, 2.0, Interpolation::Linear),
        Keyframe::new(0.5, 4.0, Interpolation::Linear),
    ];

    let parsed = round_trip(&single_curve_model(curve));
    assert!(parsed.warnings.is_empty());
    let curve = &parsed.model.skeletons[0].actions[0].tracks[0].curves[0];
    let keys: Vec<(f32, f32)> = curve.keyframes.iter().map(|k| (k.time, k.value)).collect();
    assert_eq!(keys, vec![(0.0, 1.0), (0.5, 4.0)]);
}

#[test]
fn test_texture_round_trip() {
    let mut model = single_triangle_model();
    let pixels: Vec<u8> = (0..16u8).flat_map(|i| [i * 16, 255 - i, i, 0xFF]).collect();
    model.images.push(Image::new(4, 4, pixels, TexelEncoding::Rgba32).unwrap());
    model.textures.push(Texture {
        image: 0,
        wrap_s: WrapMode::Repeat,
        wrap_t: WrapMode::Mirror,
    });
    model.materials[0].texture = Some(0);

    let parsed = round_trip(&model);
    assert_eq!(parsed.model.images, model.images);
    assert_eq!(parsed.model.textures, model.textures);
    assert_eq!(parsed.model.materials[0].texture, Some(0));
}

#[test]
fn test_shared_image_written_once() {
    let mut model = single_triangle_model();
    model.images.push(Image::new(4, 4, vec![0x80; 64], TexelEncoding::I8).unwrap());
    for wrap in [WrapMode::Clamp, WrapMode::Repeat] {
        model.textures.push(Texture {
            image: 0,
            wrap_s: wrap,
            wrap_t: wrap,
        });
    }

    let parsed = round_trip(&model);
    assert_eq!(parsed.model.images.len(), 1);
    assert_eq!(parsed.model.textures.len(), 2);
    assert!(parsed.model.textures.iter().all(|t| t.image == 0));
}

#[test]
fn test_odr_requires_one_skeleton() {
    let mut model = single_triangle_model();
    model.variant = Variant::Odr;
    model.skeletons.push(Skeleton::new("extra", root()));
    assert!(matches!(
        serialize_to_bytes(&model, WriteOptions::default()),
        Err(Error::InvalidModel(_))
    ));

    model.skeletons.pop();
    let parsed = round_trip(&model);
    assert_eq!(parsed.model.variant, Variant::Odr);
    assert_eq!(parsed.model.skeletons.len(), 1);
}

#[test]
fn test_mdr_with_two_skeletons() {
    let mut model = single_triangle_model();
    let mut second = Skeleton::new("stage", root());
    second.add_bone(0, Bone::new("floor", NodeKind::Skin { mesh: Some(0) }));
    model.skeletons.push(second);
    let options = WriteOptions::default().with_variant(Variant::Mdr);

    let bytes = serialize_to_bytes(&model, options).unwrap();
    let parsed = parse_bytes(&bytes).unwrap();
    assert_eq!(parsed.model.variant, Variant::Mdr);
    assert_eq!(parsed.model.skeletons.len(), 2);
    // both skin nodes share one mesh
    assert_eq!(parsed.model.meshes.len(), 1);
}

#[test]
fn test_nested_skin_meshes_read_deepest_first() {
    let mut model = single_triangle_model();
    let mut inner = model.meshes[0].clone();
    inner.positions[2] = [0.0, 2.0, 0.0];
    model.meshes.push(inner.clone());
    let outer = 1;
    model.skeletons[0].add_bone(outer, Bone::new("inner", NodeKind::Skin { mesh: Some(1) }));

    let parsed = round_trip(&model);
    let bones = &parsed.model.skeletons[0].bones;
    assert_eq!(parsed.model.meshes.len(), 2);
    // the inner skin's mesh is read before its parent's
    assert_eq!(bones[2].kind, NodeKind::Skin { mesh: Some(0) });
    assert_eq!(bones[outer].kind, NodeKind::Skin { mesh: Some(1) });
    assert_eq!(parsed.model.meshes[0].positions, inner.positions);
}

#[test]
fn test_cyclic_skeleton_rejected() {
    let mut model = single_triangle_model();
    let skin = 1;
    model.skeletons[0].bones[skin].children.push(0);
    assert!(matches!(
        serialize_to_bytes(&model, WriteOptions::default()),
        Err(Error::InvalidModel(_))
    ));
}

#[test]
fn test_truncated_file_is_out_of_bounds() {
    let bytes = serialize_to_bytes(&single_triangle_model(), WriteOptions::default()).unwrap();
    let result = parse_bytes(&bytes[..0x40]);
    assert!(matches!(
        result,
        Err(Error::OutOfBounds { .. } | Error::InvalidString { .. })
    ));
}

#[test]
fn test_write_and_read_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pm0025_00.sdr");
    let model = single_triangle_model();

    write_model(&path, &model, WriteOptions::default()).unwrap();
    let parsed = read_model(&path).unwrap();
    assert_eq!(parsed.model, model);

    let info = inspect_model(&path).unwrap();
    assert_eq!(info.face_count(), 1);
    assert_eq!(info.skeletons[0].bones[1].kind, "skin");
}

#[test]
fn test_skinning_at_bind_pose() {
    let mut model = single_triangle_model();
    model.skeletons[0].bones[0].translation = [0.0, 3.0, 0.0];
    model.meshes[0].weights = Some(vec![VertexWeights::from([(1, 1.0)]); 3]);

    let skeleton = &model.skeletons[0];
    let globals = global_transforms(skeleton);
    let inverse = inverse_bind_matrices(skeleton);
    let skinned = skin_mesh(&model.meshes[0], &globals, &inverse).unwrap();
    for (skinned, original) in skinned.positions.iter().zip(&model.meshes[0].positions) {
        for axis in 0..3 {
            assert!((skinned[axis] - original[axis]).abs() < 1e-5);
        }
    }
}
