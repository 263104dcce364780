//! Keyframe interpolation and pose evaluation

use glam::Mat4;

use super::{Armature, PoseArena};

impl Armature {
    /// Local joint matrices at `frame`
    ///
    /// Frames before the first keyframe use the first pose, frames at or
    /// after the last keyframe use the last pose. In between, the bracketing
    /// pair is found by a linear scan and blended per joint.
    pub fn local_pose(&self, frame: f32) -> Vec<Mat4> {
        let joint_count = self.joint_count();
        let (Some(first), Some(last)) = (self.keyframes.first(), self.keyframes.last()) else {
            return vec![Mat4::IDENTITY; joint_count];
        };

        let clamped = if frame < first.frame as f32 {
            Some(first)
        } else if frame >= last.frame as f32 {
            Some(last)
        } else {
            None
        };
        if let Some(keyframe) = clamped {
            return keyframe.pose.iter().map(|lrs| lrs.to_matrix()).collect();
        }

        let bracket = self
            .keyframes
            .windows(2)
            .find(|pair| frame >= pair[0].frame as f32 && frame < pair[1].frame as f32);
        let Some([from, to]) = bracket else {
            return last.pose.iter().map(|lrs| lrs.to_matrix()).collect();
        };

        let t = (frame - from.frame as f32) / (to.frame as f32 - from.frame as f32);
        from.pose
            .iter()
            .zip(to.pose.iter())
            .map(|(a, b)| a.interpolate(b, t).to_matrix())
            .collect()
    }

    /// World matrices of every joint at `frame`
    pub fn world_pose(&self, frame: f32, arena: &mut PoseArena) -> Vec<Mat4> {
        let locals = self.local_pose(frame);
        arena.begin(locals.len());
        (0..locals.len())
            .map(|joint| arena.world_matrix(joint, &self.parents, &locals))
            .collect()
    }

    /// Skinning matrices of the used joints at `frame`
    ///
    /// `world(joint) * bind(joint)`: maps a bind-space vertex to its posed
    /// position. Hierarchy-only joints are resolved as ancestors but not
    /// returned.
    pub fn skinning_pose(&self, frame: f32, arena: &mut PoseArena) -> Vec<Mat4> {
        let locals = self.local_pose(frame);
        arena.begin(locals.len());
        (0..self.joint_used().min(locals.len()))
            .map(|joint| {
                let bind = self
                    .bind_matrices
                    .get(joint)
                    .copied()
                    .unwrap_or(Mat4::IDENTITY);
                arena.world_matrix(joint, &self.parents, &locals) * bind
            })
            .collect()
    }
}
