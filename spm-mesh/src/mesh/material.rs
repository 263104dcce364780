//! Material table entries

use std::path::Path;

use crate::error::Result;
use crate::reader::ByteReader;
use crate::texture::{TextureHandle, TextureSource};

/// One material table entry, cached by its sequential id
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub id: u16,
    /// Texture names as stored (empty = absent)
    pub texture_names: [String; 2],
    /// Handles resolved by the [`TextureSource`] (None if absent or unresolved)
    pub textures: [Option<TextureHandle>; 2],
}

impl Material {
    /// Vertices using this material carry a first UV set
    pub fn has_uv_one(&self) -> bool {
        !self.texture_names[0].is_empty()
    }

    /// Vertices using this material carry a second UV set
    ///
    /// Only meaningful together with the first set; a lone second texture
    /// does not add UV data to the stream.
    pub fn has_uv_two(&self) -> bool {
        self.has_uv_one() && !self.texture_names[1].is_empty()
    }

    pub(crate) fn read<T: TextureSource + ?Sized>(
        r: &mut ByteReader<'_>,
        id: u16,
        textures: &mut T,
        mesh_dir: Option<&Path>,
    ) -> Result<Self> {
        let texture_names = [r.read_string()?, r.read_string()?];

        let mut resolved = [None, None];
        for (slot, name) in resolved.iter_mut().zip(texture_names.iter()) {
            if name.is_empty() {
                continue;
            }
            *slot = textures.texture(name, mesh_dir);
            if slot.is_none() {
                tracing::warn!("material {}: texture '{}' not found", id, name);
            }
        }

        Ok(Self {
            id,
            texture_names,
            textures: resolved,
        })
    }
}
