//! SPM binary format definitions
//!
//! # Layout
//! ```text
//! 0x00: magic "SP" (2 bytes)
//! 0x02: version_kind u8      - (version << 3) | kind
//! 0x03: attr_flags u8        - see [`attr_flags`]
//! 0x04: bounds 6 × f32       - min xyz, max xyz
//! 0x1C: material_count u16
//!       per material: u8 len + first texture name, u8 len + second texture name
//!       block_count u16
//!       per block: sub_block_count u16
//!         per sub-block: vertex_count u32, index_count u32, material_id u16,
//!                        vertices, indices (u8 if vertex_count <= 255, else u16)
//! skinned kind only:
//!       armature_count u8, bind_frame u16, armatures
//! ```
//!
//! All multi-byte fields are little-endian.

mod header;
mod writer;

pub use header::{MeshKind, SpmHeader};
pub use writer::{ArmatureDesc, SpmWriter, SubBlockDesc, VertexDesc};

/// File magic
pub const SPM_MAGIC: [u8; 2] = *b"SP";

/// The only supported format version
pub const SPM_VERSION: u8 = 1;

/// File extension (without dot)
pub const SPM_EXT: &str = "spm";

/// Largest vertex count that still fits 8-bit indices
pub const MAX_U8_INDEXED_VERTICES: u32 = u8::MAX as u32;

/// Largest vertex count supported at all (16-bit indices)
pub const MAX_VERTICES_PER_SUB_BLOCK: u32 = u16::MAX as u32;

/// Influence slots per skinned vertex
pub const MAX_INFLUENCES: usize = 4;

/// File-level vertex attribute flags
pub mod attr_flags {
    /// Vertices carry a packed 10:10:10:2 normal
    pub const NORMAL: u8 = 0b0000_0001;
    /// Vertices carry a color identifier (and RGB unless white)
    pub const VERTEX_COLOR: u8 = 0b0000_0010;
    /// Vertices with UVs carry 4 tangent bytes (skipped on load)
    pub const TANGENT: u8 = 0b0000_0100;
}
