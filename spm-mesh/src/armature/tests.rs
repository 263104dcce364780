//! Armature decoding and pose evaluation tests

use super::*;
use crate::error::SpmError;
use crate::reader::ByteReader;
use glam::{Mat4, Quat, Vec3};

const EPSILON: f32 = 1e-5;

fn lrs(translation: Vec3) -> LocRotScale {
    LocRotScale {
        translation,
        ..LocRotScale::IDENTITY
    }
}

/// Joint `i` parented to `i - 1`, every joint offset by +1 on X
fn chain(depth: usize, keyframes: Vec<Keyframe>) -> Armature {
    Armature {
        joint_used: depth as u16,
        joint_names: (0..depth).map(|i| format!("bone{}", i)).collect(),
        bind_matrices: vec![Mat4::IDENTITY; depth],
        parents: (0..depth as i16).map(|i| i - 1).collect(),
        keyframes,
    }
}

fn single_joint(frames: &[(u16, Vec3)]) -> Armature {
    chain(
        1,
        frames
            .iter()
            .map(|&(frame, t)| Keyframe {
                frame,
                pose: vec![lrs(t)],
            })
            .collect(),
    )
}

fn push_lrs(out: &mut Vec<u8>, t: [f32; 3], q: [f32; 4], s: [f32; 3]) {
    for v in t.iter().chain(q.iter()).chain(s.iter()) {
        out.extend_from_slice(&v.to_le_bytes());
    }
}

/// Serialized armature with identity transforms and one pose per frame
fn armature_bytes(joint_used: u16, parents: &[i16], frames: &[u16]) -> Vec<u8> {
    let identity = ([0.0; 3], [0.0, 0.0, 0.0, 1.0], [1.0; 3]);
    let mut data = Vec::new();
    data.extend_from_slice(&joint_used.to_le_bytes());
    data.extend_from_slice(&(parents.len() as u16).to_le_bytes());
    for i in 0..parents.len() {
        let name = format!("j{}", i);
        data.push(name.len() as u8);
        data.extend_from_slice(name.as_bytes());
    }
    for _ in parents {
        push_lrs(&mut data, identity.0, identity.1, identity.2);
    }
    for p in parents {
        data.extend_from_slice(&p.to_le_bytes());
    }
    data.extend_from_slice(&(frames.len() as u16).to_le_bytes());
    for frame in frames {
        data.extend_from_slice(&frame.to_le_bytes());
        for _ in parents {
            push_lrs(&mut data, identity.0, identity.1, identity.2);
        }
    }
    data
}

fn assert_mat_eq(a: Mat4, b: Mat4) {
    assert!(a.abs_diff_eq(b, EPSILON), "{:?} != {:?}", a, b);
}

// ============================================================================
// Keyframe sampling
// ============================================================================

#[test]
fn test_clamps_before_first_and_after_last() {
    let armature = single_joint(&[(0, Vec3::ZERO), (30, Vec3::new(3.0, 0.0, 0.0))]);

    assert_eq!(armature.local_pose(-5.0), armature.local_pose(0.0));
    assert_eq!(armature.local_pose(1000.0), armature.local_pose(30.0));
    assert_mat_eq(
        armature.local_pose(1000.0)[0],
        Mat4::from_translation(Vec3::new(3.0, 0.0, 0.0)),
    );
}

#[test]
fn test_clamps_to_first_keyframe_not_zero() {
    let armature = single_joint(&[(10, Vec3::X), (20, Vec3::Y)]);
    assert_mat_eq(armature.local_pose(3.0)[0], Mat4::from_translation(Vec3::X));
}

#[test]
fn test_midpoint_interpolation() {
    let armature = single_joint(&[(0, Vec3::ZERO), (10, Vec3::new(10.0, 0.0, 0.0))]);
    let pose = armature.local_pose(5.0);
    assert_mat_eq(pose[0], Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0)));
}

#[test]
fn test_brackets_inner_keyframes() {
    let armature = single_joint(&[
        (0, Vec3::ZERO),
        (10, Vec3::new(0.0, 10.0, 0.0)),
        (20, Vec3::new(0.0, 10.0, 10.0)),
    ]);
    let pose = armature.local_pose(15.0);
    assert_mat_eq(pose[0], Mat4::from_translation(Vec3::new(0.0, 10.0, 5.0)));
}

#[test]
fn test_rotation_slerp() {
    let mut armature = single_joint(&[(0, Vec3::ZERO), (10, Vec3::ZERO)]);
    armature.keyframes[1].pose[0].rotation = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);

    let half = armature.local_pose(5.0)[0];
    let expected =
        Mat4::from_quat(Quat::from_rotation_z(std::f32::consts::FRAC_PI_4)).transpose();
    assert_mat_eq(half, expected);
}

#[test]
fn test_no_keyframes_is_identity() {
    let armature = chain(3, Vec::new());
    assert_eq!(armature.local_pose(7.0), vec![Mat4::IDENTITY; 3]);
}

// ============================================================================
// World matrices
// ============================================================================

#[test]
fn test_world_composes_parent_first() {
    let depth = 4;
    let armature = chain(
        depth,
        vec![Keyframe {
            frame: 0,
            pose: vec![lrs(Vec3::X); depth],
        }],
    );
    let mut arena = PoseArena::new();
    let world = armature.world_pose(0.0, &mut arena);
    for (i, m) in world.iter().enumerate() {
        let expected = Vec3::new((i + 1) as f32, 0.0, 0.0);
        assert!(m.transform_point3(Vec3::ZERO).abs_diff_eq(expected, EPSILON));
    }
}

#[test]
fn test_world_cache_hit() {
    let depth = 6;
    let armature = chain(
        depth,
        vec![Keyframe {
            frame: 0,
            pose: vec![lrs(Vec3::new(0.5, 1.0, 0.0)); depth],
        }],
    );
    let locals = armature.local_pose(0.0);
    let mut arena = PoseArena::new();
    arena.begin(depth);

    let deepest = depth - 1;
    let first = arena.world_matrix(deepest, &armature.parents, &locals);
    assert_eq!(arena.computed(), depth);
    assert!((0..depth).all(|j| arena.is_resolved(j)));

    let second = arena.world_matrix(deepest, &armature.parents, &locals);
    assert_eq!(arena.computed(), depth);
    assert_eq!(first.to_cols_array(), second.to_cols_array());

    // Ancestors come from the cache too
    arena.world_matrix(2, &armature.parents, &locals);
    assert_eq!(arena.computed(), depth);
}

#[test]
#[should_panic]
fn test_world_matrix_without_begin_panics() {
    let armature = chain(
        2,
        vec![Keyframe {
            frame: 0,
            pose: vec![lrs(Vec3::X); 2],
        }],
    );
    let locals = armature.local_pose(0.0);
    let mut arena = PoseArena::new();
    arena.world_matrix(1, &armature.parents, &locals);
}

#[test]
fn test_begin_resets_cache() {
    let armature = single_joint(&[(0, Vec3::ZERO), (10, Vec3::new(10.0, 0.0, 0.0))]);
    let mut arena = PoseArena::new();

    let at_start = armature.world_pose(0.0, &mut arena);
    let at_end = armature.world_pose(10.0, &mut arena);
    assert_eq!(arena.computed(), 1);
    assert_ne!(at_start, at_end);
    assert_mat_eq(at_end[0], Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)));
}

#[test]
fn test_skinning_pose_uses_bind_and_used_joints() {
    let mut armature = chain(
        3,
        vec![Keyframe {
            frame: 0,
            pose: vec![lrs(Vec3::X); 3],
        }],
    );
    armature.joint_used = 2;
    armature.bind_matrices[1] = Mat4::from_translation(Vec3::new(-2.0, 0.0, 0.0));

    let mut arena = PoseArena::new();
    let skinning = armature.skinning_pose(0.0, &mut arena);
    assert_eq!(skinning.len(), 2);
    assert_mat_eq(skinning[0], Mat4::from_translation(Vec3::X));
    // world(1) = +2 X, bind(1) = -2 X
    assert_mat_eq(skinning[1], Mat4::IDENTITY);
}

// ============================================================================
// Decoding
// ============================================================================

#[test]
fn test_read_armature() {
    let data = armature_bytes(2, &[-1, 0, 1], &[0, 5, 12]);
    let mut r = ByteReader::new(&data);
    let armature = Armature::read(&mut r, 0).unwrap();

    assert_eq!(r.remaining(), 0);
    assert_eq!(armature.joint_count(), 3);
    assert_eq!(armature.joint_used(), 2);
    assert_eq!(armature.root(), Some(0));
    assert_eq!(armature.parent(2), Some(1));
    assert_eq!(armature.joint_index("j2"), Some(2));
    assert_eq!(armature.frame_range(), Some((0, 12)));
}

#[test]
fn test_quaternion_negated_on_read() {
    let half = std::f32::consts::FRAC_PI_4;
    let mut data = Vec::new();
    push_lrs(&mut data, [1.0, 2.0, 3.0], [0.0, 0.0, half.sin(), half.cos()], [1.0; 3]);

    let lrs = LocRotScale::read(&mut ByteReader::new(&data)).unwrap();
    assert_eq!(lrs.translation, Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(lrs.rotation.z, -half.sin());
    assert_eq!(lrs.rotation.w, half.cos());

    // Negation plus transpose applies the stored rotation: +90° about Z
    let rotated = lrs.to_matrix().transform_vector3(Vec3::X);
    assert!(rotated.abs_diff_eq(Vec3::Y, EPSILON));
}

#[test]
fn test_two_roots_rejected() {
    let data = armature_bytes(2, &[-1, -1], &[0]);
    assert!(matches!(
        Armature::read(&mut ByteReader::new(&data), 3),
        Err(SpmError::MissingRootBone {
            armature: 3,
            roots: 2
        })
    ));
}

#[test]
fn test_rootless_cycle_rejected() {
    let data = armature_bytes(2, &[-1, 2, 1], &[0]);
    assert!(matches!(
        Armature::read(&mut ByteReader::new(&data), 0),
        Err(SpmError::CyclicJointHierarchy { armature: 0, .. })
    ));
}

#[test]
fn test_parent_out_of_range() {
    let data = armature_bytes(1, &[-1, 5], &[0]);
    assert!(matches!(
        Armature::read(&mut ByteReader::new(&data), 0),
        Err(SpmError::JointIndexOutOfRange { index: 5, count: 2 })
    ));
}

#[test]
fn test_joint_used_exceeds_total() {
    let data = armature_bytes(4, &[-1, 0], &[0]);
    assert!(matches!(
        Armature::read(&mut ByteReader::new(&data), 0),
        Err(SpmError::JointIndexOutOfRange { index: 4, count: 2 })
    ));
}

#[test]
fn test_missing_keyframes() {
    let data = armature_bytes(1, &[-1], &[]);
    assert!(matches!(
        Armature::read(&mut ByteReader::new(&data), 1),
        Err(SpmError::MissingKeyframes { armature: 1 })
    ));
}

#[test]
fn test_unordered_keyframes() {
    let data = armature_bytes(1, &[-1], &[0, 10, 10]);
    assert!(matches!(
        Armature::read(&mut ByteReader::new(&data), 0),
        Err(SpmError::UnorderedKeyframes {
            frame: 10,
            previous: 10,
            ..
        })
    ));
}

#[test]
fn test_truncated_armature() {
    let data = armature_bytes(2, &[-1, 0], &[0, 4]);
    for len in 0..data.len() {
        assert!(
            matches!(
                Armature::read(&mut ByteReader::new(&data[..len]), 0),
                Err(SpmError::TruncatedInput { .. })
            ),
            "prefix of {} bytes",
            len
        );
    }
}
