//! Shared texture handles
//!
//! A [`Texture`] is a cheaply clonable handle to one requested texture:
//! the resolved URL, sampling parameters extracted from the MTL declaration,
//! and — once the fetch completes — the decoded pixels. Handles are shared
//! between materials that resolved to the same URL.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::image_loader::ImageData;
use crate::math::Vec2;

/// Material slot a texture is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    /// Diffuse/base color map (`map_kd`)
    Diffuse,
    /// Ambient occlusion map (`map_ao`)
    AmbientOcclusion,
    /// Light map (`map_ka`)
    Light,
    /// Specular map (`map_ks`)
    Specular,
    /// Emissive map (`map_ke`)
    Emissive,
    /// Normal/bump map (`norm`, `map_bump`, `bump`)
    Normal,
    /// Alpha map (`map_d`)
    Alpha,
}

/// Texture wrapping mode applied by the host sampler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextureWrap {
    /// Repeat (default)
    #[default]
    Repeat,
    /// Clamp to edge
    Clamp,
    /// Mirrored repeat
    Mirror,
}

/// Sampling color space the host should decode with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// Gamma-encoded; diffuse and emissive slots
    Srgb,
    /// Linear data (normals, masks, AO)
    Linear,
}

/// Load state of a texture handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureStatus {
    /// Fetch issued, pixels not yet available
    Pending,
    /// Pixels decoded and available
    Loaded,
    /// Fetch or decode failed, or the handle was invalidated
    Failed,
}

#[derive(Debug)]
struct TextureInner {
    url: String,
    slot: TextureSlot,
    wrap: TextureWrap,
    color_space: ColorSpace,
    repeat: Vec2,
    offset: Vec2,
    bump_scale: Option<f32>,
    image: Option<ImageData>,
    status: TextureStatus,
}

/// Shared handle to one requested texture
#[derive(Debug, Clone)]
pub struct Texture {
    inner: Rc<RefCell<TextureInner>>,
}

impl Texture {
    pub(crate) fn new(
        url: String,
        slot: TextureSlot,
        wrap: TextureWrap,
        color_space: ColorSpace,
        repeat: Vec2,
        offset: Vec2,
        bump_scale: Option<f32>,
    ) -> Self {
        Self {
            inner: Rc::new(RefCell::new(TextureInner {
                url,
                slot,
                wrap,
                color_space,
                repeat,
                offset,
                bump_scale,
                image: None,
                status: TextureStatus::Pending,
            })),
        }
    }

    /// Resolved URL this handle was requested for
    pub fn url(&self) -> String {
        self.inner.borrow().url.clone()
    }

    /// Slot the first requester bound this texture to
    pub fn slot(&self) -> TextureSlot {
        self.inner.borrow().slot
    }

    /// Wrap mode for both axes
    pub fn wrap(&self) -> TextureWrap {
        self.inner.borrow().wrap
    }

    /// Color space the host should sample in
    pub fn color_space(&self) -> ColorSpace {
        self.inner.borrow().color_space
    }

    /// Repeat scale from a `-s` modifier (defaults to 1,1)
    pub fn repeat(&self) -> Vec2 {
        self.inner.borrow().repeat
    }

    /// Offset from a `-o` modifier (defaults to 0,0)
    pub fn offset(&self) -> Vec2 {
        self.inner.borrow().offset
    }

    /// Bump scale from a `-bm` modifier
    pub fn bump_scale(&self) -> Option<f32> {
        self.inner.borrow().bump_scale
    }

    /// Current load state
    pub fn status(&self) -> TextureStatus {
        self.inner.borrow().status
    }

    /// True once pixels are available
    pub fn is_loaded(&self) -> bool {
        self.status() == TextureStatus::Loaded
    }

    /// Borrow the decoded image, if present
    pub fn with_image<R>(&self, f: impl FnOnce(&ImageData) -> R) -> Option<R> {
        self.inner.borrow().image.as_ref().map(f)
    }

    /// Clear the image source and mark the handle invalid.
    ///
    /// A completion callback for an already-issued fetch may still arrive
    /// afterwards; callers tolerate that rather than relying on suppression.
    pub fn invalidate(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.image = None;
        inner.status = TextureStatus::Failed;
    }

    /// True if both handles refer to the same underlying texture
    pub fn same_handle(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn mark_loaded(&self, image: ImageData) {
        let mut inner = self.inner.borrow_mut();
        inner.image = Some(image);
        inner.status = TextureStatus::Loaded;
    }

    pub(crate) fn mark_failed(&self) {
        self.inner.borrow_mut().status = TextureStatus::Failed;
    }
}
