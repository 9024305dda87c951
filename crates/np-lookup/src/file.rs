//! JSON container of named lookup surfaces.

use crate::error::{Result, SurfaceError};
use crate::surface::Surface2d;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Deserialize)]
struct SurfaceFileRaw {
    surfaces: HashMap<String, Surface2d>,
}

/// A set of named scale-factor surfaces loaded from one JSON file.
///
/// The whole file is read and validated eagerly; a job that cannot load its
/// calibration input must not start.
#[derive(Debug)]
pub struct SurfaceFile {
    path: PathBuf,
    surfaces: HashMap<String, Surface2d>,
}

impl SurfaceFile {
    /// Open a surface file, validating every table in it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let bytes = std::fs::read(&path)
            .map_err(|source| SurfaceError::Io { path: path.clone(), source })?;
        let raw: SurfaceFileRaw = serde_json::from_slice(&bytes)
            .map_err(|source| SurfaceError::Json { path: path.clone(), source })?;
        for (name, surface) in &raw.surfaces {
            surface.validate().map_err(|reason| SurfaceError::Invalid {
                name: name.clone(),
                reason,
            })?;
        }
        Ok(Self { path, surfaces: raw.surfaces })
    }

    /// Look up a surface by name.
    pub fn surface(&self, name: &str) -> Result<&Surface2d> {
        self.surfaces.get(name).ok_or_else(|| SurfaceError::SurfaceNotFound {
            name: name.to_string(),
            path: self.path.clone(),
        })
    }

    /// Path this file was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of the surfaces in this file, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.surfaces.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
