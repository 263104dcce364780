//! Error type for SPM decoding
//!
//! Every variant is fatal to the current parse: the partially built mesh is
//! discarded and the error is returned to the caller.

/// Result alias used throughout the crate
pub type Result<T, E = SpmError> = std::result::Result<T, E>;

/// Failure while decoding an SPM stream
#[derive(Debug, thiserror::Error)]
pub enum SpmError {
    /// The decoder only runs on little-endian hosts
    #[error("host is not little endian")]
    UnsupportedEndianness,

    #[error("bad magic {0:?} (expected \"SP\")")]
    BadMagic([u8; 2]),

    #[error("unsupported version {found} (expected {expected})")]
    UnsupportedVersion { found: u8, expected: u8 },

    /// Space-partitioned or otherwise reserved mesh kind
    #[error("unsupported mesh kind {0}")]
    UnsupportedMeshKind(u8),

    #[error("truncated input: needed {needed} bytes at offset {offset}, {remaining} remaining")]
    TruncatedInput {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    #[error("corrupt vertex data: {0}")]
    CorruptVertexData(String),

    /// Sub-block too large for 16-bit indices
    #[error("vertex count {0} exceeds the 16-bit index range")]
    IndexWidthUnsupported(u32),

    #[error("armature {armature} has {roots} root joints (expected exactly 1)")]
    MissingRootBone { armature: usize, roots: usize },

    #[error("bind matrix of joint {joint} in armature {armature} is not invertible")]
    SingularBindMatrix { armature: usize, joint: usize },

    #[error("joint index {index} out of range ({count} joints)")]
    JointIndexOutOfRange { index: i32, count: usize },

    #[error("material id {id} out of range ({count} materials)")]
    MaterialOutOfRange { id: u16, count: usize },

    #[error("triangle index {index} out of range ({vertex_count} vertices)")]
    IndexOutOfRange { index: u16, vertex_count: u32 },

    #[error("armature {armature} has no keyframes")]
    MissingKeyframes { armature: usize },

    #[error("keyframe {frame} of armature {armature} does not follow frame {previous}")]
    UnorderedKeyframes {
        armature: usize,
        frame: u16,
        previous: u16,
    },

    #[error("joint {joint} of armature {armature} never reaches the root")]
    CyclicJointHierarchy { armature: usize, joint: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
