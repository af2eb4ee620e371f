//! Asset loading (meshes, textures, shaders).
//! Procedural grid mesh, RGBA8 textures and cube maps, shader source text.

pub mod grid;
pub mod mesh;
pub mod shader;
pub mod texture;

pub use grid::{
    DEFAULT_GRID_SCALE, DEFAULT_GRID_SIZE, MAX_GRID_SIZE, generate_grid, grid_index_bytes,
};
pub use mesh::{MeshData, MeshVertex};
pub use shader::{ShaderPair, ShaderText};
pub use texture::{CubeFace, CubeMapData, TextureData};

/// File name of the wave/bump texture under the asset root.
pub const BUMP_MAP_FILE: &str = "waves.png";
/// Prefix of the six skybox face files under the asset root.
pub const SKYBOX_PREFIX: &str = "cloudyhills";
/// Shader directory under the asset root.
pub const SHADER_DIR: &str = "shaders";
