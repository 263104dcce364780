//! World matrix resolution with a per-evaluation cache

use glam::Mat4;

use super::parent_of;

/// Scratch space for one pose evaluation
///
/// Holds one world matrix per joint plus a parallel "resolved" flag. The
/// cache is keyed by joint only, so [`PoseArena::begin`] must run before
/// every evaluation; matrices from a previous frame are never reused.
#[derive(Debug, Default)]
pub struct PoseArena {
    world: Vec<Mat4>,
    resolved: Vec<bool>,
    computed: usize,
    chain: Vec<usize>,
}

impl PoseArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new evaluation over `joint_count` joints
    pub fn begin(&mut self, joint_count: usize) {
        self.world.clear();
        self.world.resize(joint_count, Mat4::IDENTITY);
        self.resolved.clear();
        self.resolved.resize(joint_count, false);
        self.computed = 0;
    }

    /// Number of world matrices computed since [`PoseArena::begin`]
    pub fn computed(&self) -> usize {
        self.computed
    }

    pub fn is_resolved(&self, joint: usize) -> bool {
        self.resolved.get(joint).copied().unwrap_or(false)
    }

    /// `world(joint) = world(parent) * local(joint)`, root: `local(joint)`
    ///
    /// Walks up to the nearest resolved ancestor (or the root) and fills the
    /// chain top-down, so each joint is computed at most once per
    /// evaluation. Hierarchies are validated on read; a malformed chain is
    /// cut after `parents.len()` steps instead of looping.
    ///
    /// # Panics
    ///
    /// Panics if `joint` is outside the range given to the last
    /// [`PoseArena::begin`], or if `locals` is shorter than that range.
    pub fn world_matrix(&mut self, joint: usize, parents: &[i16], locals: &[Mat4]) -> Mat4 {
        debug_assert!(
            joint < self.resolved.len(),
            "joint {} outside arena of {} (missing begin?)",
            joint,
            self.resolved.len()
        );
        debug_assert!(locals.len() >= self.resolved.len());
        if self.resolved[joint] {
            return self.world[joint];
        }

        let count = self.resolved.len();
        let parent_in_range = |j: usize| parent_of(parents, j).filter(|&p| p < count);

        self.chain.clear();
        let mut current = joint;
        loop {
            self.chain.push(current);
            match parent_in_range(current) {
                Some(parent) if !self.resolved[parent] && self.chain.len() <= parents.len() => {
                    current = parent;
                }
                _ => break,
            }
        }

        for i in (0..self.chain.len()).rev() {
            let j = self.chain[i];
            let local = locals[j];
            let world = match parent_in_range(j) {
                Some(parent) if self.resolved[parent] => self.world[parent] * local,
                _ => local,
            };
            self.world[j] = world;
            self.resolved[j] = true;
            self.computed += 1;
        }

        self.world[joint]
    }
}
