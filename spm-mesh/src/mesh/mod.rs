//! Geometry decoding: materials, vertices and mesh buffers

mod buffer;
mod material;
mod vertex;

pub(crate) use buffer::read_sub_block;
pub use buffer::MeshBuffer;
pub use material::Material;
pub use vertex::{SkinInfluences, Vertex, VertexLayout, read_vertex};

use glam::Vec3;

/// Per-vertex skin influences of one mesh buffer (parallel to its vertices)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkinBinding {
    pub influences: Vec<SkinInfluences>,
}

impl SkinBinding {
    pub fn len(&self) -> usize {
        self.influences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.influences.is_empty()
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Box from the six floats stored in the file header
    pub fn from_array(bounds: [f32; 6]) -> Self {
        Self {
            min: Vec3::new(bounds[0], bounds[1], bounds[2]),
            max: Vec3::new(bounds[3], bounds[4], bounds[5]),
        }
    }

    /// Smallest box around all vertex positions, or None without vertices
    pub fn from_buffers(buffers: &[MeshBuffer]) -> Option<Self> {
        let mut positions = buffers
            .iter()
            .flat_map(|b| b.vertices.iter())
            .map(Vertex::position);
        let first = positions.next()?;
        Some(positions.fold(
            Self {
                min: first,
                max: first,
            },
            |acc, p| Self {
                min: acc.min.min(p),
                max: acc.max.max(p),
            },
        ))
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}
