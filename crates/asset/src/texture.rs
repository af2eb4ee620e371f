//! Texture loading and data structures.
//! RGBA8 textures from PNG files, plus six-face cube maps.

use std::path::{Path, PathBuf};

use corelib::CoreError;

/// Texture data in CPU-friendly format before GPU upload.
#[derive(Clone, Debug)]
pub struct TextureData {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

/// Supported texture formats.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TextureFormat {
    Rgba8,
}

/// Side length of the checkerboard used when an image can't be loaded.
pub const PLACEHOLDER_SIZE: u32 = 64;

impl TextureData {
    /// Create a new texture with given dimensions and RGBA8 format.
    pub fn new_rgba8(width: u32, height: u32, data: Vec<u8>) -> Self {
        assert_eq!(
            data.len(),
            (width * height * 4) as usize,
            "Data size doesn't match RGBA8 format"
        );
        Self {
            data,
            width,
            height,
            format: TextureFormat::Rgba8,
        }
    }

    /// Load texture from PNG file. Alpha is forced to fully opaque.
    pub fn load_png<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        log::info!("Loading texture from {:?}", path);

        let img = image::open(path).map_err(|e| CoreError::ImageDecode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let texture = Self::from_image(img);

        log::info!(
            "Loaded texture {}x{} with {} bytes",
            texture.width,
            texture.height,
            texture.data.len()
        );
        Ok(texture)
    }

    /// Decode an in-memory PNG. Alpha is forced to fully opaque.
    pub fn decode_png(bytes: &[u8]) -> anyhow::Result<Self> {
        let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Png).map_err(
            |e| CoreError::ImageDecode {
                path: PathBuf::from("<memory>"),
                reason: e.to_string(),
            },
        )?;
        Ok(Self::from_image(img))
    }

    /// Like [`TextureData::load_png`], but logs the failure and falls back
    /// to a checkerboard so rendering can go on.
    pub fn load_or_placeholder<P: AsRef<Path>>(path: P) -> Self {
        match Self::load_png(&path) {
            Ok(texture) => texture,
            Err(e) => {
                log::error!("{e}; using placeholder");
                Self::create_test_texture(PLACEHOLDER_SIZE)
            }
        }
    }

    fn from_image(img: image::DynamicImage) -> Self {
        let color = img.color();
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let mut data = rgba.into_raw();
        force_opaque(&mut data);
        log::debug!("decoded {width}x{height}, source color {color:?}");
        Self::new_rgba8(width, height, data)
    }

    /// Create a simple test texture (checkerboard pattern).
    pub fn create_test_texture(size: u32) -> Self {
        let mut data = Vec::with_capacity((size * size * 4) as usize);

        for y in 0..size {
            for x in 0..size {
                let checker = ((x / 8) + (y / 8)) % 2;
                if checker == 0 {
                    data.extend_from_slice(&[255, 255, 255, 255]);
                } else {
                    data.extend_from_slice(&[128, 128, 128, 255]);
                }
            }
        }

        Self::new_rgba8(size, size, data)
    }

    /// Get the number of bytes per pixel for the format.
    pub fn bytes_per_pixel(&self) -> u32 {
        match self.format {
            TextureFormat::Rgba8 => 4,
        }
    }

    /// Check if the texture data is valid.
    pub fn is_valid(&self) -> bool {
        let expected_size = (self.width * self.height * self.bytes_per_pixel()) as usize;
        self.data.len() == expected_size && self.width > 0 && self.height > 0
    }
}

/// Set every alpha byte of an RGBA8 buffer to 0xFF.
pub fn force_opaque(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        px[3] = 0xFF;
    }
}

/// Cube map faces in GPU layer order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    /// File name suffix, e.g. `cloudyhills_posx.png`.
    pub fn suffix(self) -> &'static str {
        match self {
            CubeFace::PositiveX => "posx",
            CubeFace::NegativeX => "negx",
            CubeFace::PositiveY => "posy",
            CubeFace::NegativeY => "negy",
            CubeFace::PositiveZ => "posz",
            CubeFace::NegativeZ => "negz",
        }
    }

    /// Array layer of this face in a cube texture.
    pub fn layer(self) -> u32 {
        self as u32
    }

    pub fn file_name(self, prefix: &str) -> String {
        format!("{prefix}_{}.png", self.suffix())
    }
}

/// Six same-sized square faces, indexed by [`CubeFace::layer`].
#[derive(Clone, Debug)]
pub struct CubeMapData {
    pub faces: [TextureData; 6],
}

impl CubeMapData {
    /// Load `<dir>/<prefix>_<face>.png` for every face.
    ///
    /// Faces that fail to decode, or whose size differs from the first good
    /// face, are replaced by a checkerboard of the common size.
    pub fn load(dir: impl AsRef<Path>, prefix: &str) -> Self {
        let dir = dir.as_ref();
        let loaded: Vec<Option<TextureData>> = CubeFace::ALL
            .iter()
            .map(|face| {
                let path = dir.join(face.file_name(prefix));
                match TextureData::load_png(&path) {
                    Ok(texture) => Some(texture),
                    Err(e) => {
                        log::error!("cube face {:?}: {e}", face);
                        None
                    }
                }
            })
            .collect();
        Self::from_faces(loaded)
    }

    /// Assemble a cube map from possibly missing faces.
    pub fn from_faces(faces: Vec<Option<TextureData>>) -> Self {
        let size = faces
            .iter()
            .flatten()
            .find(|t| t.width == t.height)
            .map(|t| t.width)
            .unwrap_or(PLACEHOLDER_SIZE);

        let mut faces = faces.into_iter();
        let faces = CubeFace::ALL.map(|face| match faces.next().flatten() {
            Some(t) if t.width == size && t.height == size => t,
            Some(t) => {
                log::error!(
                    "cube face {:?} is {}x{}, expected {size}x{size}; using placeholder",
                    face,
                    t.width,
                    t.height
                );
                TextureData::create_test_texture(size)
            }
            None => TextureData::create_test_texture(size),
        });

        Self { faces }
    }

    /// Edge length shared by all faces.
    pub fn size(&self) -> u32 {
        self.faces[0].width
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode_png(img: image::DynamicImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png)
            .expect("encode png");
        out.into_inner()
    }

    #[test]
    fn translucent_pixels_become_opaque() {
        let img = image::RgbaImage::from_pixel(4, 2, image::Rgba([10, 20, 30, 0]));
        let bytes = encode_png(image::DynamicImage::ImageRgba8(img));

        let tex = TextureData::decode_png(&bytes).expect("decode");
        assert_eq!((tex.width, tex.height), (4, 2));
        assert!(tex.is_valid());
        assert!(tex.data.chunks_exact(4).all(|px| px == [10, 20, 30, 255]));
    }

    #[test]
    fn rgb_source_is_expanded_to_rgba() {
        let img = image::RgbImage::from_pixel(3, 3, image::Rgb([1, 2, 3]));
        let bytes = encode_png(image::DynamicImage::ImageRgb8(img));

        let tex = TextureData::decode_png(&bytes).expect("decode");
        assert_eq!(tex.data.len(), 3 * 3 * 4);
        assert!(tex.data.chunks_exact(4).all(|px| px == [1, 2, 3, 255]));
    }

    #[test]
    fn garbage_bytes_report_an_error() {
        let err = TextureData::decode_png(b"not a png").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::ImageDecode { .. })
        ));
    }

    #[test]
    fn missing_file_falls_back_to_placeholder() {
        let tex = TextureData::load_or_placeholder("definitely/not/here.png");
        assert_eq!(tex.width, PLACEHOLDER_SIZE);
        assert!(tex.is_valid());
    }

    #[test]
    fn cube_map_fills_missing_and_mismatched_faces() {
        let good = TextureData::create_test_texture(16);
        let odd = TextureData::create_test_texture(8);
        let cube = CubeMapData::from_faces(vec![
            None,
            Some(good.clone()),
            Some(odd),
            Some(good.clone()),
            None,
            Some(good),
        ]);

        assert_eq!(cube.size(), 16);
        assert!(
            cube.faces
                .iter()
                .all(|f| f.width == 16 && f.height == 16 && f.is_valid())
        );
    }

    #[test]
    fn cube_map_from_missing_directory() {
        let cube = CubeMapData::load("no/such/dir", "cloudyhills");
        assert_eq!(cube.size(), PLACEHOLDER_SIZE);
    }

    #[test]
    fn face_names_and_layers() {
        assert_eq!(
            CubeFace::NegativeZ.file_name("cloudyhills"),
            "cloudyhills_negz.png"
        );
        let layers: Vec<u32> = CubeFace::ALL.iter().map(|f| f.layer()).collect();
        assert_eq!(layers, vec![0, 1, 2, 3, 4, 5]);
    }
}
