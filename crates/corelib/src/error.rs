//! Typed failures shared by the asset loaders and the renderer.

use std::path::PathBuf;

use thiserror::Error;

/// Process status used when a shader source file can't be read.
pub const SHADER_MISSING_EXIT_CODE: i32 = 77;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("couldn't load shader {}: {source}", path.display())]
    ShaderSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{stage} shader failed to compile:\n{log}")]
    ShaderCompile { stage: &'static str, log: String },

    #[error("shader program failed to link: {0}")]
    ShaderLink(String),

    #[error("vertex attribute `{0}` not found in shader")]
    MissingAttribute(String),

    #[error("failed to decode image {}: {reason}", path.display())]
    ImageDecode { path: PathBuf, reason: String },
}

impl CoreError {
    /// Exit status the binary should terminate with for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            CoreError::ShaderSource { .. } => SHADER_MISSING_EXIT_CODE,
            _ => 1,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
