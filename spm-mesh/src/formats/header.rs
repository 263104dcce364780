//! SPM file header

use super::{SPM_MAGIC, SPM_VERSION, attr_flags};
use crate::error::{Result, SpmError};
use crate::reader::ByteReader;

/// Geometry kind encoded in the low 3 bits of the version byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshKind {
    /// Geometry only (kind bits = 0)
    Static,
    /// Geometry plus armatures (kind bits = 1)
    Skinned,
}

impl MeshKind {
    /// Kind bits of the reserved space-partitioned layout
    pub const SPACE_PARTITIONED_BITS: u8 = 2;

    pub fn from_bits(bits: u8) -> Result<Self> {
        match bits {
            0 => Ok(Self::Static),
            1 => Ok(Self::Skinned),
            other => Err(SpmError::UnsupportedMeshKind(other)),
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            Self::Static => 0,
            Self::Skinned => 1,
        }
    }
}

/// SPM header (28 bytes)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpmHeader {
    pub kind: MeshKind,
    pub flags: u8,
    /// min xyz, max xyz as stored by the exporter
    pub bounds: [f32; 6],
}

impl SpmHeader {
    pub const SIZE: usize = 28;

    pub fn new(kind: MeshKind, flags: u8) -> Self {
        Self {
            kind,
            flags,
            bounds: [0.0; 6],
        }
    }

    pub fn has_normal(&self) -> bool {
        self.flags & attr_flags::NORMAL != 0
    }

    pub fn has_vertex_color(&self) -> bool {
        self.flags & attr_flags::VERTEX_COLOR != 0
    }

    pub fn has_tangent(&self) -> bool {
        self.flags & attr_flags::TANGENT != 0
    }

    /// Read and validate the header
    ///
    /// Checks run in stream order: magic, version, then kind.
    pub fn read(r: &mut ByteReader<'_>) -> Result<Self> {
        let magic = r.read_array::<2>()?;
        if magic != SPM_MAGIC {
            return Err(SpmError::BadMagic(magic));
        }

        let version_kind = r.read_u8()?;
        let version = version_kind >> 3;
        if version != SPM_VERSION {
            return Err(SpmError::UnsupportedVersion {
                found: version,
                expected: SPM_VERSION,
            });
        }
        let kind = MeshKind::from_bits(version_kind & 0x07)?;

        let flags = r.read_u8()?;
        let bounds = r.read_f32_array::<6>()?;

        Ok(Self {
            kind,
            flags,
            bounds,
        })
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..2].copy_from_slice(&SPM_MAGIC);
        bytes[2] = (SPM_VERSION << 3) | self.kind.bits();
        bytes[3] = self.flags;
        for (i, f) in self.bounds.iter().enumerate() {
            bytes[4 + i * 4..8 + i * 4].copy_from_slice(&f.to_le_bytes());
        }
        bytes
    }
}
