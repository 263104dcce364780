//! Decoder for SPM meshes
//!
//! SPM is a compact binary mesh format: material table, geometry blocks with
//! compressed vertices and, for skinned meshes, one or more armatures with
//! keyframed joint tracks. Decoding produces a [`SkeletalMesh`] whose skinned
//! vertices are already moved into bind-pose space, plus a [`Rig`] exposing
//! every armature behind one flattened joint space.
//!
//! # Modules
//!
//! - [`formats`] - Header, layout constants and the [`SpmWriter`] encoder
//! - [`reader`] - Bounds-checked little-endian byte reader
//! - [`packing`] - Half floats and packed 10:10:10:2 normals
//! - [`mesh`] - Materials, vertex decoding and mesh buffers
//! - [`armature`] - Joint hierarchy, keyframes and pose evaluation
//! - [`rig`] - Bind pose and flattened joint space across armatures
//! - [`loader`] - [`parse_spm`] / [`load_spm`]
//! - [`texture`] - Texture name resolution
//! - [`config`] - Loader configuration (TOML)

pub mod armature;
pub mod config;
pub mod error;
pub mod formats;
pub mod loader;
pub mod mesh;
pub mod packing;
pub mod reader;
pub mod rig;
pub mod texture;

pub use armature::{Armature, Keyframe, LocRotScale, PoseArena};
pub use config::{ConfigError, LoaderConfig, TextureConfig};
pub use error::{Result, SpmError};
pub use formats::{
    ArmatureDesc, MeshKind, SPM_EXT, SPM_MAGIC, SPM_VERSION, SpmHeader, SpmWriter, SubBlockDesc,
    VertexDesc, attr_flags,
};
pub use loader::{SkeletalMesh, load_spm, parse_spm};
pub use mesh::{Aabb, Material, MeshBuffer, SkinBinding, SkinInfluences, Vertex, VertexLayout};
pub use rig::{Rig, RigJoint};
pub use texture::{NoTextures, TextureCache, TextureHandle, TextureSource};
