//! SPM mesh loader
//!
//! Decodes one SPM stream in a single forward pass:
//! materials → geometry → armatures → bind-frame pose → bind-pose correction.
//! Any failure aborts the whole parse; no partial mesh is returned.

use std::path::Path;

use crate::armature::Armature;
use crate::error::{Result, SpmError};
use crate::formats::{MeshKind, SpmHeader};
use crate::mesh::{Aabb, Material, MeshBuffer, SkinBinding, read_sub_block};
use crate::reader::ByteReader;
use crate::rig::Rig;
use crate::texture::TextureSource;

/// A decoded SPM file
#[derive(Debug, Clone)]
pub struct SkeletalMesh {
    pub kind: MeshKind,
    /// File-level attribute flags, see [`crate::formats::attr_flags`]
    pub flags: u8,
    pub materials: Vec<Material>,
    /// One buffer per geometry sub-block, in file order; skinned vertices are
    /// already in bind-pose space
    pub buffers: Vec<MeshBuffer>,
    /// Parallel to `buffers` for skinned meshes, empty for static ones
    pub skins: Vec<SkinBinding>,
    pub rig: Option<Rig>,
    /// Box around the decoded positions (before bind-pose correction)
    pub bounds: Option<Aabb>,
    /// Box stored in the header
    pub declared_bounds: Aabb,
}

impl SkeletalMesh {
    pub fn vertex_count(&self) -> usize {
        self.buffers.iter().map(MeshBuffer::vertex_count).sum()
    }

    pub fn index_count(&self) -> usize {
        self.buffers.iter().map(MeshBuffer::index_count).sum()
    }

    pub fn is_skinned(&self) -> bool {
        self.kind == MeshKind::Skinned
    }
}

/// Decode an SPM stream already in memory
///
/// Texture names are resolved through `textures` without a mesh directory.
pub fn parse_spm<T: TextureSource + ?Sized>(
    data: &[u8],
    textures: &mut T,
) -> Result<SkeletalMesh> {
    parse(data, textures, None)
}

/// Read and decode an SPM file
///
/// Texture names may resolve relative to the file's directory. Failures are
/// logged with the file path before being returned.
pub fn load_spm<T: TextureSource + ?Sized>(
    path: &Path,
    textures: &mut T,
) -> Result<SkeletalMesh> {
    let result = std::fs::read(path)
        .map_err(SpmError::from)
        .and_then(|data| parse(&data, textures, path.parent()));

    match &result {
        Ok(mesh) => tracing::debug!(
            "loaded {}: {} buffers, {} vertices",
            path.display(),
            mesh.buffers.len(),
            mesh.vertex_count()
        ),
        Err(e) => tracing::error!("failed to load mesh {}: {}", path.display(), e),
    }
    result
}

fn parse<T: TextureSource + ?Sized>(
    data: &[u8],
    textures: &mut T,
    mesh_dir: Option<&Path>,
) -> Result<SkeletalMesh> {
    if cfg!(target_endian = "big") {
        return Err(SpmError::UnsupportedEndianness);
    }

    let mut r = ByteReader::new(data);
    let header = SpmHeader::read(&mut r)?;

    // 1. Materials
    let materials = read_materials(&mut r, textures, mesh_dir)?;

    // 2. Geometry
    let (mut buffers, skins) = read_geometry(&mut r, &header, &materials)?;
    let bounds = Aabb::from_buffers(&buffers);

    // 3-5. Armatures, bind-frame pose, bind-pose correction
    let rig = match header.kind {
        MeshKind::Static => None,
        MeshKind::Skinned => {
            let armature_count = r.read_u8()? as usize;
            let bind_frame = r.read_u16()?;
            let armatures = (0..armature_count)
                .map(|index| Armature::read(&mut r, index))
                .collect::<Result<Vec<_>>>()?;

            let rig = Rig::build(armatures, bind_frame)?;
            rig.apply_bind_pose(&mut buffers, &skins)?;
            Some(rig)
        }
    };

    if r.remaining() > 0 {
        tracing::debug!("ignoring {} trailing bytes", r.remaining());
    }

    Ok(SkeletalMesh {
        kind: header.kind,
        flags: header.flags,
        materials,
        buffers,
        skins,
        rig,
        bounds,
        declared_bounds: Aabb::from_array(header.bounds),
    })
}

fn read_materials<T: TextureSource + ?Sized>(
    r: &mut ByteReader<'_>,
    textures: &mut T,
    mesh_dir: Option<&Path>,
) -> Result<Vec<Material>> {
    let count = r.read_u16()?;
    let mut materials = Vec::with_capacity((count as usize).min(r.remaining() / 2));
    for id in 0..count {
        materials.push(Material::read(r, id, textures, mesh_dir)?);
    }
    tracing::debug!("{} materials", materials.len());
    Ok(materials)
}

fn read_geometry(
    r: &mut ByteReader<'_>,
    header: &SpmHeader,
    materials: &[Material],
) -> Result<(Vec<MeshBuffer>, Vec<SkinBinding>)> {
    let block_count = r.read_u16()?;
    let mut buffers = Vec::new();
    let mut skins = Vec::new();

    for _ in 0..block_count {
        let sub_block_count = r.read_u16()?;
        for _ in 0..sub_block_count {
            let (buffer, skin) = read_sub_block(r, header, materials)?;
            buffers.push(buffer);
            if let Some(skin) = skin {
                skins.push(skin);
            }
        }
    }

    tracing::debug!(
        "{} geometry blocks, {} buffers, {} vertices",
        block_count,
        buffers.len(),
        buffers.iter().map(MeshBuffer::vertex_count).sum::<usize>()
    );
    Ok((buffers, skins))
}
