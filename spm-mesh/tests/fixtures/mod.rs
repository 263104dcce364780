//! Programmatic SPM generation for integration tests.
//!
//! - Unit cube without normals (static)
//! - Two-armature skinned quad strip (3 of 4 and 5 of 5 joints used)

#![allow(dead_code)]

use glam::Vec3;
use spm_mesh::{
    ArmatureDesc, LocRotScale, MeshKind, SpmWriter, SubBlockDesc, VertexDesc, attr_flags,
};

/// Root translation of the first armature at the bind frame
pub const FIRST_ROOT_OFFSET: Vec3 = Vec3::new(1.0, 0.0, 0.0);
/// Root translation of the second armature at the bind frame
pub const SECOND_ROOT_OFFSET: Vec3 = Vec3::new(0.0, 2.0, 0.0);
/// Slot of joint 4 of the second armature
pub const SECOND_LAST_SLOT: i16 = 7;

/// 8 corners, 12 triangles, no stored normals
pub fn cube() -> SpmWriter {
    let corners: Vec<VertexDesc> = (0..8)
        .map(|i| {
            VertexDesc::new([
                (i & 1) as f32 - 0.5,
                ((i >> 1) & 1) as f32 - 0.5,
                ((i >> 2) & 1) as f32 - 0.5,
            ])
        })
        .collect();

    #[rustfmt::skip]
    let indices = vec![
        0, 2, 1, 1, 2, 3, // -z
        4, 5, 6, 5, 7, 6, // +z
        0, 1, 4, 1, 5, 4, // -y
        2, 6, 3, 3, 6, 7, // +y
        0, 4, 2, 2, 4, 6, // -x
        1, 3, 5, 3, 7, 5, // +x
    ];

    let mut writer = SpmWriter::new(MeshKind::Static, 0);
    writer.header.bounds = [-0.5, -0.5, -0.5, 0.5, 0.5, 0.5];
    writer.materials.push([String::new(), String::new()]);
    writer.blocks.push(vec![SubBlockDesc {
        material_id: 0,
        vertices: corners,
        indices,
    }]);
    writer
}

fn translated(translation: Vec3) -> LocRotScale {
    LocRotScale {
        translation,
        ..LocRotScale::IDENTITY
    }
}

/// Parent chain 0 ← 1 ← 2 ← ... with identity binds
pub fn chain_armature(prefix: &str, used: u16, total: usize, root: Vec3) -> ArmatureDesc {
    let mut pose = vec![LocRotScale::IDENTITY; total];
    pose[0] = translated(root);
    ArmatureDesc {
        joint_used: used,
        joint_names: (0..total).map(|i| format!("{}_{}", prefix, i)).collect(),
        bind: vec![LocRotScale::IDENTITY; total],
        parents: (0..total as i16).map(|i| i - 1).collect(),
        keyframes: vec![(0, pose.clone()), (10, pose)],
    }
}

fn quad(material_id: u16, joint: i16, z: f32) -> SubBlockDesc {
    let skin = |v: VertexDesc| v.with_skin([joint, -1, -1, -1], [1.0, 0.0, 0.0, 0.0]);
    SubBlockDesc {
        material_id,
        vertices: vec![
            skin(VertexDesc::new([0.0, 0.0, z])),
            skin(VertexDesc::new([1.0, 0.0, z])),
            skin(VertexDesc::new([1.0, 1.0, z])),
            VertexDesc::new([0.0, 1.0, z]),
        ],
        indices: vec![0, 1, 2, 0, 2, 3],
    }
}

/// Two blocks of two quads; the last vertex of every quad is unbound
pub fn skinned() -> SpmWriter {
    let mut writer = SpmWriter::new(
        MeshKind::Skinned,
        attr_flags::NORMAL | attr_flags::VERTEX_COLOR | attr_flags::TANGENT,
    );
    writer.materials.push(["body.png".to_string(), String::new()]);
    writer.materials.push([String::new(), String::new()]);
    writer.blocks.push(vec![quad(0, 1, 0.0), quad(1, SECOND_LAST_SLOT, 1.0)]);
    writer.blocks.push(vec![quad(0, 0, 2.0), quad(1, 3, 3.0)]);
    writer.bind_frame = 0;
    writer.armatures.push(chain_armature("a", 3, 4, FIRST_ROOT_OFFSET));
    writer.armatures.push(chain_armature("b", 5, 5, SECOND_ROOT_OFFSET));
    writer
}
