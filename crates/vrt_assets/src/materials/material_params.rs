//! Renderer-native material descriptors
//!
//! The material creator turns raw MTL records into these parameter sets.
//! Two workflows exist: the legacy specular/shininess parameterization and
//! the metalness/roughness parameterization selected when a `metalness`
//! property is present.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::env_map::CubeTexture;
use super::texture::{Texture, TextureSlot};
use crate::math::Vec3;

/// Render-face culling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Render front faces only (default)
    #[default]
    Front,
    /// Render back faces only
    Back,
    /// Render both faces
    Double,
}

/// Compressed-texture pipeline selector.
///
/// When set, diffuse texture URLs ending in `.png` are rewritten to `.jpg`
/// before resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressedTextureType {
    /// JPEG-substitution pipeline
    Jpeg,
}

/// Parameters of a legacy specular-workflow material
#[derive(Debug, Clone)]
pub struct SpecularParams {
    /// Diffuse color (`kd`), linear
    pub diffuse: Vec3,
    /// Specular color (`ks`), linear
    pub specular: Vec3,
    /// Emissive color (`ke`), linear
    pub emissive: Vec3,
    /// Specular shininess exponent (`ns`)
    pub shininess: f32,
}

impl Default for SpecularParams {
    fn default() -> Self {
        Self {
            diffuse: Vec3::new(1.0, 1.0, 1.0),
            specular: Vec3::new(0.0667, 0.0667, 0.0667),
            emissive: Vec3::new(0.0, 0.0, 0.0),
            shininess: 30.0,
        }
    }
}

/// Parameters of a metalness/roughness-workflow material
#[derive(Debug, Clone)]
pub struct MetalnessParams {
    /// Diffuse color (`kd`), linear
    pub diffuse: Vec3,
    /// Emissive color (`ke`), linear
    pub emissive: Vec3,
    /// Metalness scalar
    pub metalness: f32,
    /// Roughness scalar
    pub roughness: f32,
    /// Fixed reflection environment attached to every metalness material
    pub env_map: &'static CubeTexture,
    /// Environment-map intensity (fixed)
    pub env_map_intensity: f32,
    /// Reflectivity (fixed)
    pub reflectivity: f32,
}

/// Workflow-specific material parameters
#[derive(Debug, Clone)]
pub enum MaterialKind {
    /// Legacy specular/shininess workflow
    Specular(SpecularParams),
    /// Physically-based metalness/roughness workflow
    Metalness(MetalnessParams),
}

/// Texture bindings of one material, one optional handle per slot
#[derive(Debug, Clone, Default)]
pub struct MaterialTextures {
    /// Diffuse/base color map
    pub diffuse: Option<Texture>,
    /// Ambient occlusion map
    pub ambient_occlusion: Option<Texture>,
    /// Light map
    pub light: Option<Texture>,
    /// Specular map
    pub specular: Option<Texture>,
    /// Emissive map
    pub emissive: Option<Texture>,
    /// Normal/bump map
    pub normal: Option<Texture>,
    /// Alpha map
    pub alpha: Option<Texture>,
}

impl MaterialTextures {
    /// The texture bound to `slot`, if any
    pub fn get(&self, slot: TextureSlot) -> Option<&Texture> {
        match slot {
            TextureSlot::Diffuse => self.diffuse.as_ref(),
            TextureSlot::AmbientOcclusion => self.ambient_occlusion.as_ref(),
            TextureSlot::Light => self.light.as_ref(),
            TextureSlot::Specular => self.specular.as_ref(),
            TextureSlot::Emissive => self.emissive.as_ref(),
            TextureSlot::Normal => self.normal.as_ref(),
            TextureSlot::Alpha => self.alpha.as_ref(),
        }
    }

    pub(crate) fn slot_mut(&mut self, slot: TextureSlot) -> &mut Option<Texture> {
        match slot {
            TextureSlot::Diffuse => &mut self.diffuse,
            TextureSlot::AmbientOcclusion => &mut self.ambient_occlusion,
            TextureSlot::Light => &mut self.light,
            TextureSlot::Specular => &mut self.specular,
            TextureSlot::Emissive => &mut self.emissive,
            TextureSlot::Normal => &mut self.normal,
            TextureSlot::Alpha => &mut self.alpha,
        }
    }

    /// Iterate over every bound texture
    pub fn iter(&self) -> impl Iterator<Item = &Texture> {
        [
            self.diffuse.as_ref(),
            self.ambient_occlusion.as_ref(),
            self.light.as_ref(),
            self.specular.as_ref(),
            self.emissive.as_ref(),
            self.normal.as_ref(),
            self.alpha.as_ref(),
        ]
        .into_iter()
        .flatten()
    }

    /// Number of bound textures
    pub fn count(&self) -> usize {
        self.iter().count()
    }
}

/// A renderer-ready material produced by the creator
#[derive(Debug, Clone)]
pub struct Material {
    /// Material name from the `newmtl` declaration
    pub name: String,
    /// Workflow-specific parameters
    pub kind: MaterialKind,
    /// Face culling mode from the creator options
    pub side: Side,
    /// Alpha blending requested (`d`, `tr`, or `map_d`)
    pub transparent: bool,
    /// Opacity in `[0, 1]`
    pub opacity: f32,
    /// Texture bindings
    pub textures: MaterialTextures,
}

impl Material {
    /// True for metalness/roughness-workflow materials
    pub fn is_metalness_workflow(&self) -> bool {
        matches!(self.kind, MaterialKind::Metalness(_))
    }
}

/// Shared material handle, as handed to completion callbacks and cached by
/// the creator
pub type SharedMaterial = Rc<Material>;

/// Convert one gamma-encoded sRGB channel to linear
fn srgb_channel_to_linear(c: f32) -> f32 {
    if c < 0.04045 {
        c * (1.0 / 12.92)
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Gamma-decode an sRGB color to linear, component-wise
pub fn srgb_to_linear(color: Vec3) -> Vec3 {
    color.map(srgb_channel_to_linear)
}
