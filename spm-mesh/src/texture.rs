//! Texture lookup by name
//!
//! The decoder never loads images. Material texture names are handed to a
//! caller-supplied [`TextureSource`], which returns opaque handles for the
//! rendering side to interpret.

use hashbrown::HashMap;
use std::path::{Path, PathBuf};

use crate::config::LoaderConfig;

/// Opaque texture handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Resolves texture names referenced by a mesh's material table
pub trait TextureSource {
    /// Look up `name`; `mesh_dir` is the directory of the mesh file when known
    fn texture(&mut self, name: &str, mesh_dir: Option<&Path>) -> Option<TextureHandle>;
}

/// Source that resolves nothing (geometry-only loads)
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTextures;

impl TextureSource for NoTextures {
    fn texture(&mut self, _name: &str, _mesh_dir: Option<&Path>) -> Option<TextureHandle> {
        None
    }
}

/// Caller-owned texture registry
///
/// Resolves names against the mesh directory and the configured search
/// directories, in that order. The same file referenced from several meshes
/// gets the same handle.
#[derive(Debug, Default)]
pub struct TextureCache {
    search_dirs: Vec<PathBuf>,
    relative_to_mesh: bool,
    handles: HashMap<PathBuf, TextureHandle>,
    paths: Vec<PathBuf>,
}

impl TextureCache {
    pub fn new(config: &LoaderConfig) -> Self {
        Self {
            search_dirs: config.textures.search_dirs.clone(),
            relative_to_mesh: config.textures.relative_to_mesh,
            handles: HashMap::new(),
            paths: Vec::new(),
        }
    }

    /// Resolved file path of a handle
    pub fn path(&self, handle: TextureHandle) -> Option<&Path> {
        self.paths.get(handle.0 as usize).map(PathBuf::as_path)
    }

    /// Number of distinct textures registered so far
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    fn resolve(&self, name: &str, mesh_dir: Option<&Path>) -> Option<PathBuf> {
        let mesh_dir = mesh_dir.filter(|_| self.relative_to_mesh);
        mesh_dir
            .into_iter()
            .chain(self.search_dirs.iter().map(PathBuf::as_path))
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.is_file())
    }
}

impl TextureSource for TextureCache {
    fn texture(&mut self, name: &str, mesh_dir: Option<&Path>) -> Option<TextureHandle> {
        let path = self.resolve(name, mesh_dir)?;
        if let Some(&handle) = self.handles.get(&path) {
            return Some(handle);
        }

        let handle = TextureHandle(self.paths.len() as u32);
        tracing::debug!("registered texture {:?} as {:?}", path, handle);
        self.paths.push(path.clone());
        self.handles.insert(path, handle);
        Some(handle)
    }
}
