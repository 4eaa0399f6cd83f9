//! Built-in reflection environment map
//!
//! Metalness-workflow materials receive a fixed environment cube map made of
//! six identical faces. The face image is built once per process and shared
//! by every material; it never changes after initialization.

use std::sync::OnceLock;

use crate::image_loader::ImageData;

/// Environment-map intensity applied to every metalness material
pub const ENV_MAP_INTENSITY: f32 = 1.0;

/// Reflectivity applied to every metalness material
pub const ENV_MAP_REFLECTIVITY: f32 = 0.8;

const FACE_SIZE: u32 = 16;
const FACE_TOP: [u8; 4] = [96, 128, 176, 255];
const FACE_BOTTOM: [u8; 4] = [214, 220, 228, 255];

/// Cube map whose six faces are the same image
#[derive(Debug)]
pub struct CubeTexture {
    face: ImageData,
}

impl CubeTexture {
    fn new(face: ImageData) -> Self {
        Self { face }
    }

    /// The shared face image
    pub fn face(&self) -> &ImageData {
        &self.face
    }

    /// All six faces, in +x, -x, +y, -y, +z, -z order
    pub fn faces(&self) -> [&ImageData; 6] {
        [&self.face; 6]
    }
}

static SHARED_ENV_MAP: OnceLock<CubeTexture> = OnceLock::new();

/// The process-wide reflection environment map, built on first use
pub fn shared_env_map() -> &'static CubeTexture {
    SHARED_ENV_MAP.get_or_init(|| {
        log::debug!("Building shared reflection environment map");
        CubeTexture::new(ImageData::vertical_gradient(
            FACE_SIZE, FACE_SIZE, FACE_TOP, FACE_BOTTOM,
        ))
    })
}
