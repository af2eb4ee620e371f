//! Shader source text loading.

use std::fs;
use std::path::{Path, PathBuf};

use corelib::{CoreError, CoreResult};

/// Vertex stage file name under the shader directory.
pub const VERTEX_SHADER_FILE: &str = "water.vert.wgsl";
/// Fragment stage file name under the shader directory.
pub const FRAGMENT_SHADER_FILE: &str = "water.frag.wgsl";

/// Source text of one shader stage, kept with its origin for diagnostics.
#[derive(Clone, Debug)]
pub struct ShaderText {
    pub path: PathBuf,
    pub source: String,
}

impl ShaderText {
    /// Read a shader file. A missing or unreadable file is a
    /// [`CoreError::ShaderSource`], which callers treat as fatal.
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| CoreError::ShaderSource {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded shader {:?} ({} bytes)", path, source.len());
        Ok(Self {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_source(path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
        }
    }
}

/// Vertex + fragment texts of the water program.
#[derive(Clone, Debug)]
pub struct ShaderPair {
    pub vertex: ShaderText,
    pub fragment: ShaderText,
}

impl ShaderPair {
    pub fn load(dir: impl AsRef<Path>) -> CoreResult<Self> {
        let dir = dir.as_ref();
        Ok(Self {
            vertex: ShaderText::load(dir.join(VERTEX_SHADER_FILE))?,
            fragment: ShaderText::load(dir.join(FRAGMENT_SHADER_FILE))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shader_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/shaders")
    }

    #[test]
    fn bundled_shaders_load() {
        let pair = ShaderPair::load(shader_dir()).expect("bundled shaders");
        assert!(pair.vertex.source.contains("vPosition"));
        assert!(pair.fragment.source.contains("SkyboxTexture"));
    }

    #[test]
    fn missing_shader_is_fatal_error() {
        let err = ShaderPair::load("no/such/dir").unwrap_err();
        assert!(matches!(err, CoreError::ShaderSource { .. }));
        assert_eq!(err.exit_code(), corelib::SHADER_MISSING_EXIT_CODE);
    }
}
