//! Mesh buffer construction from geometry sub-blocks

use glam::Vec3;

use super::vertex::{SkinInfluences, Vertex, VertexLayout, read_vertex};
use super::{Material, SkinBinding};
use crate::error::{Result, SpmError};
use crate::formats::{MAX_U8_INDEXED_VERTICES, MAX_VERTICES_PER_SUB_BLOCK, SpmHeader};
use crate::reader::ByteReader;
use crate::texture::TextureHandle;

/// Decoded geometry for one sub-block
#[derive(Debug, Clone, PartialEq)]
pub struct MeshBuffer {
    pub vertices: Vec<Vertex>,
    /// Triangle list, always widened to u16
    pub indices: Vec<u16>,
    pub material_id: u16,
    pub textures: [Option<TextureHandle>; 2],
    pub layout: VertexLayout,
}

impl MeshBuffer {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Raw vertex bytes for upload
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Smooth normals from face normals
    ///
    /// Each triangle's unit face normal is summed into its three vertices
    /// (no area or angle weighting), then every vertex normal is normalized.
    pub fn synthesize_normals(&mut self) {
        let mut accumulated = vec![Vec3::ZERO; self.vertices.len()];

        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let pa = self.vertices[a].position();
            let pb = self.vertices[b].position();
            let pc = self.vertices[c].position();
            let face = (pb - pa).cross(pc - pa).normalize_or_zero();
            accumulated[a] += face;
            accumulated[b] += face;
            accumulated[c] += face;
        }

        for (vertex, normal) in self.vertices.iter_mut().zip(accumulated) {
            vertex.normal = normal.normalize_or_zero().to_array();
        }
    }
}

/// Read one sub-block: counts, material id, vertices and indices
///
/// Returns the buffer and, for skinned layouts, the per-vertex influences.
pub(crate) fn read_sub_block(
    r: &mut ByteReader<'_>,
    header: &SpmHeader,
    materials: &[Material],
) -> Result<(MeshBuffer, Option<SkinBinding>)> {
    let vertex_count = r.read_u32()?;
    if vertex_count > MAX_VERTICES_PER_SUB_BLOCK {
        return Err(SpmError::IndexWidthUnsupported(vertex_count));
    }
    let index_count = r.read_u32()?;
    let material_id = r.read_u16()?;

    if vertex_count == 0 {
        return Err(SpmError::CorruptVertexData(
            "sub-block has no vertices".to_string(),
        ));
    }
    if index_count == 0 {
        return Err(SpmError::CorruptVertexData(
            "sub-block has no indices".to_string(),
        ));
    }
    if index_count % 3 != 0 {
        return Err(SpmError::CorruptVertexData(format!(
            "index count {} is not a multiple of 3",
            index_count
        )));
    }

    let material = materials
        .get(material_id as usize)
        .ok_or(SpmError::MaterialOutOfRange {
            id: material_id,
            count: materials.len(),
        })?;
    let layout = VertexLayout::new(header, material);

    // Never trust a count beyond what the stream could hold
    let capacity = (vertex_count as usize).min(r.remaining() / layout.min_stride());
    let mut vertices = Vec::with_capacity(capacity);
    let mut skin: Vec<SkinInfluences> = Vec::new();
    if layout.skinned {
        skin.reserve(capacity);
    }

    for _ in 0..vertex_count {
        let (vertex, influences) = read_vertex(r, &layout)?;
        vertices.push(vertex);
        if let Some(influences) = influences {
            skin.push(influences);
        }
    }

    let indices = read_indices(r, vertex_count, index_count)?;

    let mut buffer = MeshBuffer {
        vertices,
        indices,
        material_id,
        textures: material.textures,
        layout,
    };
    if !layout.normal {
        buffer.synthesize_normals();
    }

    let skin = layout.skinned.then_some(SkinBinding { influences: skin });
    Ok((buffer, skin))
}

fn read_indices(r: &mut ByteReader<'_>, vertex_count: u32, index_count: u32) -> Result<Vec<u16>> {
    let wide = vertex_count > MAX_U8_INDEXED_VERTICES;
    let width = if wide { 2 } else { 1 };
    let bytes = r.read_bytes(index_count as usize * width)?;

    let indices: Vec<u16> = if wide {
        bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect()
    } else {
        bytes.iter().map(|&i| i as u16).collect()
    };

    if let Some(&index) = indices.iter().find(|&&i| i as u32 >= vertex_count) {
        return Err(SpmError::IndexOutOfRange {
            index,
            vertex_count,
        });
    }
    Ok(indices)
}
