//! Asset loading for VRT meshes and Wavefront material libraries.
//!
//! The crate covers the asset path of a renderer: [`vrt_loader`] parses the
//! binary `.vrt` mesh container into per-object geometry and material
//! assignments, [`materials`] turns `.mtl` libraries into renderer-ready
//! materials with de-duplicated asynchronous texture loads, and [`fetch`]
//! abstracts where the bytes come from so the same pipeline serves disk,
//! network, or tests.
//!
//! Everything runs on the caller's thread; completion is delivered through
//! callbacks rather than futures, so hosts with their own event loop can
//! drive loading without an executor.

pub mod error;
pub mod fetch;
pub mod image_loader;
pub mod materials;
pub mod math;
pub mod model;
pub mod shaders;
pub mod vrt_loader;

pub use error::AssetError;
pub use fetch::{FetchCallback, FileFetcher, FsFetcher, MemoryFetcher};
pub use image_loader::ImageData;
pub use materials::{
    CreatorOptions, Material, MaterialCreator, MtlLoader, MtlParser, SharedMaterial, Texture,
    TextureCache,
};
pub use model::{
    Declaration, GeometrySlices, MaterialAssignment, ModelBuilder, ParsedModel, ParsedObject,
};
pub use vrt_loader::{VrtLoader, VrtModel};
