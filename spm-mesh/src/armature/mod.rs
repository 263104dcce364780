//! Armatures: joint hierarchy, bind matrices and keyframe tracks
//!
//! # Layout (per armature)
//! ```text
//! joint_used u16
//! joint_total u16
//! joint_total × (u8 len + name)
//! joint_total × LocRotScale (10 × f32: loc xyz, quat xyzw, scale xyz)
//! joint_total × parent i16 (-1 = root)
//! frame_count u16
//! frame_count × (frame_index u16, joint_total × LocRotScale)
//! ```

mod pose;
mod world;

#[cfg(test)]
mod tests;

pub use world::PoseArena;

use glam::{Mat4, Quat, Vec3};

use crate::error::{Result, SpmError};
use crate::reader::ByteReader;

/// Translation, rotation and scale of one joint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocRotScale {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for LocRotScale {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl LocRotScale {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Size on disk (10 × f32)
    pub const SIZE: usize = 40;

    /// Read a stored transform
    ///
    /// The quaternion is stored as (x, y, z, w); x, y and z are negated on
    /// load. Together with the transposed rotation in [`Self::to_matrix`]
    /// this fixes the handedness every armature in the format relies on.
    pub fn read(r: &mut ByteReader<'_>) -> Result<Self> {
        let [tx, ty, tz] = r.read_f32_array::<3>()?;
        let [qx, qy, qz, qw] = r.read_f32_array::<4>()?;
        let [sx, sy, sz] = r.read_f32_array::<3>()?;
        Ok(Self {
            translation: Vec3::new(tx, ty, tz),
            rotation: Quat::from_xyzw(-qx, -qy, -qz, qw),
            scale: Vec3::new(sx, sy, sz),
        })
    }

    /// Local matrix `Translation * RotationTranspose * Scale`
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.translation)
            * Mat4::from_quat(self.rotation).transpose()
            * Mat4::from_scale(self.scale)
    }

    /// Lerp translation and scale, slerp rotation
    pub fn interpolate(&self, other: &Self, t: f32) -> Self {
        Self {
            translation: self.translation.lerp(other.translation, t),
            rotation: self.rotation.slerp(other.rotation, t),
            scale: self.scale.lerp(other.scale, t),
        }
    }
}

/// One keyframe: a frame index and a transform per joint
#[derive(Debug, Clone, PartialEq)]
pub struct Keyframe {
    pub frame: u16,
    pub pose: Vec<LocRotScale>,
}

/// One skeleton
#[derive(Debug, Clone, PartialEq)]
pub struct Armature {
    /// Leading joints that can be skin influences; the rest only anchor hierarchy
    pub joint_used: u16,
    pub joint_names: Vec<String>,
    /// Per-joint bind matrix (inverse rest transform) built from its LocRotScale
    pub bind_matrices: Vec<Mat4>,
    /// Parent joint per joint, -1 for the root
    pub parents: Vec<i16>,
    /// Strictly increasing frame indices
    pub keyframes: Vec<Keyframe>,
}

impl Armature {
    pub fn joint_count(&self) -> usize {
        self.joint_names.len()
    }

    pub fn joint_used(&self) -> usize {
        self.joint_used as usize
    }

    pub fn parent(&self, joint: usize) -> Option<usize> {
        parent_of(&self.parents, joint)
    }

    pub fn root(&self) -> Option<usize> {
        self.parents.iter().position(|&p| p == -1)
    }

    pub fn joint_index(&self, name: &str) -> Option<usize> {
        self.joint_names.iter().position(|n| n == name)
    }

    /// First and last keyframe index
    pub fn frame_range(&self) -> Option<(u16, u16)> {
        Some((self.keyframes.first()?.frame, self.keyframes.last()?.frame))
    }

    /// Read armature number `index` of the file
    pub fn read(r: &mut ByteReader<'_>, index: usize) -> Result<Self> {
        let joint_used = r.read_u16()?;
        let joint_total = r.read_u16()? as usize;
        if joint_used as usize > joint_total {
            return Err(SpmError::JointIndexOutOfRange {
                index: joint_used as i32,
                count: joint_total,
            });
        }

        let joint_names = (0..joint_total)
            .map(|_| r.read_string())
            .collect::<Result<Vec<_>>>()?;

        let bind_matrices = (0..joint_total)
            .map(|_| LocRotScale::read(r).map(|lrs| lrs.to_matrix()))
            .collect::<Result<Vec<_>>>()?;

        let parents = (0..joint_total)
            .map(|_| r.read_i16())
            .collect::<Result<Vec<_>>>()?;
        validate_hierarchy(&parents, index)?;

        let frame_count = r.read_u16()?;
        if frame_count == 0 {
            return Err(SpmError::MissingKeyframes { armature: index });
        }

        let mut keyframes: Vec<Keyframe> = Vec::with_capacity(frame_count as usize);
        for _ in 0..frame_count {
            let frame = r.read_u16()?;
            match keyframes.last() {
                Some(previous) if frame <= previous.frame => {
                    return Err(SpmError::UnorderedKeyframes {
                        armature: index,
                        frame,
                        previous: previous.frame,
                    });
                }
                _ => {}
            }
            let pose = (0..joint_total)
                .map(|_| LocRotScale::read(r))
                .collect::<Result<Vec<_>>>()?;
            keyframes.push(Keyframe { frame, pose });
        }

        tracing::debug!(
            "armature {}: {} joints ({} used), {} keyframes",
            index,
            joint_total,
            joint_used,
            keyframes.len()
        );

        Ok(Self {
            joint_used,
            joint_names,
            bind_matrices,
            parents,
            keyframes,
        })
    }
}

fn parent_of(parents: &[i16], joint: usize) -> Option<usize> {
    let parent = *parents.get(joint)?;
    (parent >= 0).then_some(parent as usize)
}

/// Exactly one root, in-range parents, and every chain ends at the root
fn validate_hierarchy(parents: &[i16], armature: usize) -> Result<()> {
    let count = parents.len();
    let mut roots = 0;
    for &parent in parents {
        if parent == -1 {
            roots += 1;
        } else if parent < 0 || parent as usize >= count {
            return Err(SpmError::JointIndexOutOfRange {
                index: parent as i32,
                count,
            });
        }
    }
    if roots != 1 {
        return Err(SpmError::MissingRootBone { armature, roots });
    }

    for joint in 0..count {
        let mut current = joint;
        let mut steps = 0;
        while let Some(parent) = parent_of(parents, current) {
            steps += 1;
            if steps > count {
                return Err(SpmError::CyclicJointHierarchy { armature, joint });
            }
            current = parent;
        }
    }
    Ok(())
}
