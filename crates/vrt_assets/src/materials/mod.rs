//! Material pipeline
//!
//! Turns `.mtl` text into renderer-ready materials in three stages:
//! [`MtlParser`] produces raw, order-preserving property records;
//! [`MaterialCreator`] decodes those records into [`Material`]s and requests
//! their textures; [`TextureCache`] de-duplicates concurrent requests for the
//! same URL. [`MtlLoader`] wires the stages together behind one call.

pub mod env_map;
pub mod material_creator;
pub mod material_params;
pub mod mtl_loader;
pub mod mtl_parser;
pub mod texture;
pub mod texture_cache;

pub use env_map::{shared_env_map, CubeTexture, ENV_MAP_INTENSITY, ENV_MAP_REFLECTIVITY};
pub use material_creator::{
    CompletionCallback, CreatorOptions, LoadTracker, MaterialCreator, ProgressCallback,
    TextureDeclaration,
};
pub use material_params::{
    srgb_to_linear, CompressedTextureType, Material, MaterialKind, MaterialTextures,
    MetalnessParams, SharedMaterial, Side, SpecularParams,
};
pub use mtl_loader::{base_url_of, MtlLoader};
pub use mtl_parser::{MaterialLibrary, MtlParser, MtlValue, RawMaterial};
pub use texture::{ColorSpace, Texture, TextureSlot, TextureStatus, TextureWrap};
pub use texture_cache::{TextureCache, TextureObserver};
