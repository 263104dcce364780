//! Vertex decompression
//!
//! Per-vertex layout on disk (in order): position → normal → color →
//! UV one → UV two → tangent → skinning. Which fields are present depends on
//! the file-level attribute flags and the material's texture slots.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use super::Material;
use crate::error::{Result, SpmError};
use crate::formats::{MAX_INFLUENCES, MeshKind, SpmHeader};
use crate::packing::{COLOR_WHITE, COLOR_WHITE_MARKER, decompress_normal};
use crate::reader::ByteReader;

/// Decoded vertex
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Vertex {
    pub position: [f32; 3],
    /// Unit normal (zero until synthesized when the file stores none)
    pub normal: [f32; 3],
    /// RGBA, opaque white when the file stores no colors
    pub color: [u8; 4],
    pub uv: [f32; 2],
    pub uv2: [f32; 2],
}

impl Vertex {
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn normal(&self) -> Vec3 {
        Vec3::from_array(self.normal)
    }
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            normal: [0.0; 3],
            color: COLOR_WHITE,
            uv: [0.0; 2],
            uv2: [0.0; 2],
        }
    }
}

/// Skin influences of one vertex
///
/// Joint indices address the rig's flattened slot space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkinInfluences {
    pub joints: [i16; MAX_INFLUENCES],
    pub weights: [f32; MAX_INFLUENCES],
}

impl SkinInfluences {
    /// Joint index marking an unused slot
    pub const SENTINEL: i16 = -1;

    /// Vertex is authored in bind pose and not bound to any joint
    pub fn is_static(&self) -> bool {
        self.joints[0] == Self::SENTINEL || self.weights[0] == 0.0
    }

    /// Used (joint, weight) pairs, up to the first empty slot
    pub fn active(&self) -> impl Iterator<Item = (i16, f32)> + '_ {
        self.joints
            .iter()
            .copied()
            .zip(self.weights.iter().copied())
            .take_while(|&(joint, weight)| joint != Self::SENTINEL && weight != 0.0)
    }
}

/// Which optional fields a sub-block's vertices carry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VertexLayout {
    pub normal: bool,
    pub color: bool,
    pub tangent: bool,
    pub uv_one: bool,
    pub uv_two: bool,
    pub skinned: bool,
}

impl VertexLayout {
    pub fn new(header: &SpmHeader, material: &Material) -> Self {
        let uv_one = material.has_uv_one();
        Self {
            normal: header.has_normal(),
            color: header.has_vertex_color(),
            // Tangents are only written for textured vertices
            tangent: uv_one && header.has_tangent(),
            uv_one,
            uv_two: material.has_uv_two(),
            skinned: header.kind == MeshKind::Skinned,
        }
    }

    /// Size in bytes of one vertex on disk, excluding the variable color bytes
    pub fn min_stride(&self) -> usize {
        let mut stride = 12;
        if self.normal {
            stride += 4;
        }
        if self.color {
            stride += 1;
        }
        if self.uv_one {
            stride += 4;
        }
        if self.uv_two {
            stride += 4;
        }
        if self.tangent {
            stride += 4;
        }
        if self.skinned {
            stride += 16;
        }
        stride
    }
}

fn read_half_checked(r: &mut ByteReader<'_>, what: &str) -> Result<f32> {
    let offset = r.position();
    let value = r.read_f16()?;
    if value.is_nan() {
        return Err(SpmError::CorruptVertexData(format!(
            "{} at offset {} is NaN",
            what, offset
        )));
    }
    Ok(value)
}

/// Decode one vertex and, for skinned layouts, its influences
pub fn read_vertex(
    r: &mut ByteReader<'_>,
    layout: &VertexLayout,
) -> Result<(Vertex, Option<SkinInfluences>)> {
    let mut vertex = Vertex {
        position: r.read_f32_array::<3>()?,
        ..Vertex::default()
    };

    if layout.normal {
        vertex.normal = decompress_normal(r.read_u32()?).to_array();
    }

    if layout.color {
        let identifier = r.read_u8()?;
        if identifier != COLOR_WHITE_MARKER {
            let [red, green, blue] = r.read_array::<3>()?;
            vertex.color = [red, green, blue, 255];
        }
    }

    if layout.uv_one {
        vertex.uv = [read_half_checked(r, "uv")?, read_half_checked(r, "uv")?];
        if layout.uv_two {
            vertex.uv2 = [read_half_checked(r, "uv2")?, read_half_checked(r, "uv2")?];
        }
        if layout.tangent {
            // Recomputed downstream
            r.skip(4)?;
        }
    }

    let skin = if layout.skinned {
        let mut joints = [0i16; MAX_INFLUENCES];
        for joint in joints.iter_mut() {
            *joint = r.read_i16()?;
        }
        let mut weights = [0.0f32; MAX_INFLUENCES];
        for weight in weights.iter_mut() {
            *weight = read_half_checked(r, "joint weight")?;
        }
        Some(SkinInfluences { joints, weights })
    } else {
        None
    };

    Ok((vertex, skin))
}
