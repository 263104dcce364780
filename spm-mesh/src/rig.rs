//! Rig: every armature of a file behind one flattened joint space
//!
//! Skin influences address "slots": the used joints of each armature,
//! concatenated in armature order. Joints past an armature's `joint_used`
//! count have no slot but remain part of the hierarchy.

use glam::{Mat4, Vec3};

use crate::armature::{Armature, PoseArena};
use crate::error::{Result, SpmError};
use crate::mesh::{MeshBuffer, SkinBinding};

/// One joint of the combined hierarchy
#[derive(Debug, Clone, PartialEq)]
pub struct RigJoint {
    pub name: String,
    pub armature: usize,
    /// Index within its armature
    pub local_index: usize,
    /// Global index of the parent joint
    pub parent: Option<usize>,
    /// Flattened skin slot, None for hierarchy-only joints
    pub slot: Option<usize>,
    /// Rest transform relative to the parent
    pub rest_local: Mat4,
}

/// Armatures, bind pose and the flattened joint space of one mesh
#[derive(Debug, Clone)]
pub struct Rig {
    armatures: Vec<Armature>,
    bind_frame: u16,
    /// Per slot: inverse skinning matrix at the bind frame
    inverse_bind: Vec<Mat4>,
    /// Per armature: first slot
    slot_offsets: Vec<usize>,
    /// Per armature: first global joint
    joint_offsets: Vec<usize>,
    joints: Vec<RigJoint>,
    /// Per slot: global joint
    slot_joints: Vec<usize>,
}

impl Rig {
    /// Evaluate the bind frame and invert every skinning matrix
    ///
    /// Fails with [`SpmError::SingularBindMatrix`] on the first joint whose
    /// matrix cannot be inverted.
    pub fn build(armatures: Vec<Armature>, bind_frame: u16) -> Result<Self> {
        let mut arena = PoseArena::new();
        let mut inverse_bind = Vec::new();
        let mut slot_offsets = Vec::with_capacity(armatures.len());
        let mut joint_offsets = Vec::with_capacity(armatures.len());
        let mut joints = Vec::new();
        let mut slot_joints = Vec::new();

        for (index, armature) in armatures.iter().enumerate() {
            let slot_offset = inverse_bind.len();
            let joint_offset = joints.len();
            slot_offsets.push(slot_offset);
            joint_offsets.push(joint_offset);

            let skinning = armature.skinning_pose(bind_frame as f32, &mut arena);
            for (joint, matrix) in skinning.iter().enumerate() {
                let Some(inverse) = invert(matrix) else {
                    return Err(SpmError::SingularBindMatrix {
                        armature: index,
                        joint,
                    });
                };
                inverse_bind.push(inverse);
                slot_joints.push(joint_offset + joint);
            }

            for local in 0..armature.joint_count() {
                let parent = armature.parent(local);
                let rest_local = rest_local(armature, local, parent, index);
                joints.push(RigJoint {
                    name: armature.joint_names[local].clone(),
                    armature: index,
                    local_index: local,
                    parent: parent.map(|p| joint_offset + p),
                    slot: (local < armature.joint_used()).then_some(slot_offset + local),
                    rest_local,
                });
            }
        }

        tracing::debug!(
            "rig: {} armatures, {} joints, {} skin slots, bind frame {}",
            armatures.len(),
            joints.len(),
            inverse_bind.len(),
            bind_frame
        );

        Ok(Self {
            armatures,
            bind_frame,
            inverse_bind,
            slot_offsets,
            joint_offsets,
            joints,
            slot_joints,
        })
    }

    pub fn armatures(&self) -> &[Armature] {
        &self.armatures
    }

    pub fn bind_frame(&self) -> u16 {
        self.bind_frame
    }

    /// Inverse bind matrix per slot
    pub fn inverse_bind(&self) -> &[Mat4] {
        &self.inverse_bind
    }

    pub fn slot_count(&self) -> usize {
        self.inverse_bind.len()
    }

    /// Every joint of every armature, in armature order
    pub fn joints(&self) -> &[RigJoint] {
        &self.joints
    }

    /// Number of playable frames (last keyframe included)
    pub fn frame_count(&self) -> u32 {
        self.armatures
            .iter()
            .filter_map(|a| a.frame_range())
            .map(|(_, last)| last as u32 + 1)
            .max()
            .unwrap_or(0)
    }

    /// Slot of joint `local` of `armature`, None if that joint has no slot
    pub fn flatten(&self, armature: usize, local: usize) -> Option<usize> {
        let a = self.armatures.get(armature)?;
        (local < a.joint_used()).then(|| self.slot_offsets[armature] + local)
    }

    /// `(armature, local joint)` of a slot
    pub fn locate(&self, slot: usize) -> Option<(usize, usize)> {
        let joint = *self.slot_joints.get(slot)?;
        let j = &self.joints[joint];
        Some((j.armature, j.local_index))
    }

    /// Global joint index of a slot
    pub fn slot_joint(&self, slot: usize) -> Option<usize> {
        self.slot_joints.get(slot).copied()
    }

    /// Global joint index of joint `local` of `armature`
    pub fn joint(&self, armature: usize, local: usize) -> Option<usize> {
        let a = self.armatures.get(armature)?;
        (local < a.joint_count()).then(|| self.joint_offsets[armature] + local)
    }

    /// Skinning matrices of every slot at `frame`
    pub fn pose(&self, frame: f32, arena: &mut PoseArena) -> Vec<Mat4> {
        let mut matrices = Vec::with_capacity(self.slot_count());
        for armature in &self.armatures {
            matrices.extend(armature.skinning_pose(frame, arena));
        }
        matrices
    }

    /// Every used influence must address an existing slot
    pub fn validate_binding(&self, skin: &SkinBinding) -> Result<()> {
        let count = self.slot_count();
        for influences in &skin.influences {
            for (joint, _) in influences.active() {
                if joint < 0 || joint as usize >= count {
                    return Err(SpmError::JointIndexOutOfRange {
                        index: joint as i32,
                        count,
                    });
                }
            }
        }
        Ok(())
    }

    /// Move skinned vertices into bind-pose space
    ///
    /// Position and normal become the weighted blend of the influencing
    /// slots' inverse bind matrices applied to the authored values. Static
    /// vertices are left as they are. Every binding is validated before any
    /// vertex is touched.
    pub fn apply_bind_pose(
        &self,
        buffers: &mut [MeshBuffer],
        skins: &[SkinBinding],
    ) -> Result<()> {
        if buffers.len() != skins.len() {
            return Err(SpmError::CorruptVertexData(format!(
                "{} skin bindings for {} buffers",
                skins.len(),
                buffers.len()
            )));
        }
        for (buffer, skin) in buffers.iter().zip(skins) {
            if buffer.vertices.len() != skin.len() {
                return Err(SpmError::CorruptVertexData(format!(
                    "{} skin influences for {} vertices",
                    skin.len(),
                    buffer.vertices.len()
                )));
            }
            self.validate_binding(skin)?;
        }

        for (buffer, skin) in buffers.iter_mut().zip(skins) {
            for (vertex, influences) in buffer.vertices.iter_mut().zip(&skin.influences) {
                if influences.is_static() {
                    continue;
                }
                let position = vertex.position();
                let normal = vertex.normal();
                let mut blended_position = Vec3::ZERO;
                let mut blended_normal = Vec3::ZERO;
                for (joint, weight) in influences.active() {
                    let inverse = self.inverse_bind[joint as usize];
                    blended_position += inverse.transform_point3(position) * weight;
                    blended_normal += inverse.transform_vector3(normal) * weight;
                }
                vertex.position = blended_position.to_array();
                vertex.normal = blended_normal.to_array();
            }
        }
        Ok(())
    }
}

/// Inverse of `m`, or `None` when the determinant is zero, subnormal or not finite
fn invert(m: &Mat4) -> Option<Mat4> {
    let det = m.determinant();
    (det.is_finite() && det.abs() >= f32::MIN_POSITIVE).then(|| m.inverse())
}

/// `bind(parent) * bind(joint)^-1`, the root uses `bind(joint)^-1`
fn rest_local(armature: &Armature, joint: usize, parent: Option<usize>, index: usize) -> Mat4 {
    let Some(inverse) = invert(&armature.bind_matrices[joint]) else {
        tracing::warn!(
            "armature {}: bind matrix of joint '{}' is singular, rest pose left at identity",
            index,
            armature.joint_names[joint]
        );
        return Mat4::IDENTITY;
    };
    match parent {
        Some(p) => armature.bind_matrices[p] * inverse,
        None => inverse,
    }
}
