//! Material creation from raw MTL records
//!
//! [`MaterialCreator`] converts the raw property records of one material
//! library into renderer-ready [`Material`]s, resolving texture URLs through
//! the injected [`TextureCache`] and [`FileFetcher`]. Texture loads complete
//! asynchronously; the creator counts requested vs. processed textures and
//! fires a progress callback per texture plus a single completion callback
//! once every request has been answered, successfully or not.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::env_map::{shared_env_map, ENV_MAP_INTENSITY, ENV_MAP_REFLECTIVITY};
use super::material_params::{
    srgb_to_linear, CompressedTextureType, Material, MaterialKind, MaterialTextures,
    MetalnessParams, SharedMaterial, Side, SpecularParams,
};
use super::mtl_parser::{MaterialLibrary, MtlValue};
use super::texture::{ColorSpace, Texture, TextureSlot, TextureWrap};
use super::texture_cache::{TextureCache, TextureObserver};
use crate::fetch::FileFetcher;
use crate::image_loader::ImageData;
use crate::math::{Vec2, Vec3};

/// Options controlling material creation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatorOptions {
    /// Face culling mode for produced materials
    pub side: Side,
    /// Wrap mode applied to every resolved texture
    pub wrap: TextureWrap,
    /// Treat color channels as 0–255 and divide by 255 before decoding
    pub normalize_rgb: bool,
    /// Skip colors that are exactly (0, 0, 0)
    pub ignore_zero_rgbs: bool,
    /// Invert `tr` values before computing opacity
    pub invert_tr_property: bool,
    /// Rewrite diffuse `.png` URLs for a compressed-texture pipeline
    pub compressed_texture_type: Option<CompressedTextureType>,
}

/// Per-texture progress callback: `(percent_complete, had_error, texture)`
pub type ProgressCallback = Box<dyn FnMut(f32, bool, Option<&Texture>)>;

/// Fired exactly once with the aggregate error flag
pub type CompletionCallback = Box<dyn FnOnce(bool)>;

/// Texture modifiers and URL extracted from one map declaration value
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDeclaration {
    /// Repeat scale from `-s u v` (default 1,1)
    pub repeat: Vec2,
    /// Offset from `-o u v` (default 0,0)
    pub offset: Vec2,
    /// Bump scale from `-bm s`
    pub bump_scale: Option<f32>,
    /// Remaining tokens joined back into the texture URL
    pub url: String,
}

impl TextureDeclaration {
    /// Split a raw map value into modifiers and URL.
    ///
    /// `-s` and `-o` take a `u v` pair; a third numeric component (the
    /// `u v w` form) is consumed and ignored. Unparseable components become
    /// NaN rather than errors.
    pub fn parse(value: &str) -> Self {
        let mut items: Vec<&str> = value.split_whitespace().collect();

        let bump_scale = extract_scalar(&mut items, "-bm");
        let repeat = extract_vec2(&mut items, "-s").unwrap_or_else(|| Vec2::new(1.0, 1.0));
        let offset = extract_vec2(&mut items, "-o").unwrap_or_else(|| Vec2::new(0.0, 0.0));

        Self {
            repeat,
            offset,
            bump_scale,
            url: items.join(" ").trim().to_string(),
        }
    }
}

fn parse_float(token: &str) -> f32 {
    token.parse().unwrap_or(f32::NAN)
}

fn extract_scalar(items: &mut Vec<&str>, flag: &str) -> Option<f32> {
    let pos = items.iter().position(|t| *t == flag)?;
    let value = items.get(pos + 1).map_or(f32::NAN, |t| parse_float(t));
    let end = (pos + 2).min(items.len());
    items.drain(pos..end);
    Some(value)
}

fn extract_vec2(items: &mut Vec<&str>, flag: &str) -> Option<Vec2> {
    let pos = items.iter().position(|t| *t == flag)?;
    let u = items.get(pos + 1).map_or(f32::NAN, |t| parse_float(t));
    let v = items.get(pos + 2).map_or(f32::NAN, |t| parse_float(t));
    let mut end = (pos + 3).min(items.len());
    if items.get(pos + 3).is_some_and(|t| t.parse::<f32>().is_ok()) {
        end += 1;
    }
    items.drain(pos..end);
    Some(Vec2::new(u, v))
}

/// Requested/processed texture counters with progress and completion hooks
pub struct LoadTracker {
    requested: Cell<usize>,
    processed: Cell<usize>,
    had_error: Cell<bool>,
    completed: Cell<bool>,
    on_progress: RefCell<Option<ProgressCallback>>,
    on_complete: RefCell<Option<CompletionCallback>>,
}

impl LoadTracker {
    fn new() -> Rc<Self> {
        Rc::new(Self {
            requested: Cell::new(0),
            processed: Cell::new(0),
            had_error: Cell::new(false),
            completed: Cell::new(false),
            on_progress: RefCell::new(None),
            on_complete: RefCell::new(None),
        })
    }

    /// Textures requested so far
    pub fn requested(&self) -> usize {
        self.requested.get()
    }

    /// Textures completed so far, successes and failures
    pub fn processed(&self) -> usize {
        self.processed.get()
    }

    /// True if any texture load failed
    pub fn had_error(&self) -> bool {
        self.had_error.get()
    }

    fn request(&self) {
        self.requested.set(self.requested.get() + 1);
    }

    fn finish(&self, failed: bool, texture: Option<&Texture>) {
        self.processed.set(self.processed.get() + 1);
        if failed {
            self.had_error.set(true);
        }

        let requested = self.requested.get().max(1);
        let percent = (self.processed.get() as f32 / requested as f32) * 100.0;
        if let Some(cb) = self.on_progress.borrow_mut().as_mut() {
            cb(percent, failed, texture);
        }

        self.try_complete();
    }

    // Synchronous completion path for materials without texture references.
    fn settle(&self) {
        if self.completed.get() {
            return;
        }
        if self.requested.get() == 0 {
            if let Some(cb) = self.on_progress.borrow_mut().as_mut() {
                cb(100.0, false, None);
            }
        }
        self.try_complete();
    }

    fn try_complete(&self) {
        if self.completed.get() || self.processed.get() < self.requested.get() {
            return;
        }
        self.completed.set(true);
        if let Some(cb) = self.on_complete.borrow_mut().take() {
            cb(self.had_error.get());
        }
    }
}

impl TextureObserver for LoadTracker {
    fn texture_loaded(&self, texture: &Texture) {
        self.finish(false, Some(texture));
    }

    fn texture_not_loaded(&self, texture: &Texture) {
        self.finish(true, Some(texture));
    }
}

/// Builds renderer-native materials from one parsed material library
pub struct MaterialCreator {
    base_url: String,
    options: CreatorOptions,
    library: MaterialLibrary,
    materials: RefCell<HashMap<String, SharedMaterial>>,
    tracker: Rc<LoadTracker>,
    cache: Rc<TextureCache>,
    fetcher: Rc<dyn FileFetcher>,
    // Loads are queued during material assembly and issued afterwards so
    // that a synchronously-delivering fetcher cannot complete the tracker
    // while requests are still being counted.
    queued_loads: RefCell<Vec<(String, Texture)>>,
    issued: RefCell<Vec<Texture>>,
}

impl MaterialCreator {
    /// Create a creator over `library`, resolving relative texture URLs
    /// against `base_url`
    pub fn new(
        library: MaterialLibrary,
        base_url: impl Into<String>,
        options: CreatorOptions,
        cache: Rc<TextureCache>,
        fetcher: Rc<dyn FileFetcher>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            options,
            library,
            materials: RefCell::new(HashMap::new()),
            tracker: LoadTracker::new(),
            cache,
            fetcher,
            queued_loads: RefCell::new(Vec::new()),
            issued: RefCell::new(Vec::new()),
        }
    }

    /// Base URL relative texture paths resolve against
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Options this creator was configured with
    pub fn options(&self) -> &CreatorOptions {
        &self.options
    }

    /// The raw library backing this creator
    pub fn library(&self) -> &MaterialLibrary {
        &self.library
    }

    /// Texture counters shared with the cache observer protocol
    pub fn tracker(&self) -> &LoadTracker {
        &self.tracker
    }

    /// Set the per-texture progress callback
    pub fn on_progress(&self, cb: impl FnMut(f32, bool, Option<&Texture>) + 'static) {
        *self.tracker.on_progress.borrow_mut() = Some(Box::new(cb));
    }

    /// Set the completion callback; fires exactly once with the aggregate
    /// error flag
    pub fn on_complete(&self, cb: impl FnOnce(bool) + 'static) {
        *self.tracker.on_complete.borrow_mut() = Some(Box::new(cb));
    }

    /// Create (or return the memoized) material for `name`
    pub fn create(&self, name: &str) -> Option<SharedMaterial> {
        if let Some(existing) = self.materials.borrow().get(name) {
            return Some(Rc::clone(existing));
        }

        let raw = self.library.get(name)?;
        let material = Rc::new(self.build(name, raw));
        self.materials
            .borrow_mut()
            .insert(name.to_string(), Rc::clone(&material));

        self.issue_queued_loads();
        self.tracker.settle();
        Some(material)
    }

    /// Create every material in the library, in declaration order
    pub fn preload(&self) -> Vec<SharedMaterial> {
        let names: Vec<String> = self.library.names().map(str::to_string).collect();
        let mut created = Vec::with_capacity(names.len());

        for name in &names {
            if let Some(existing) = self.materials.borrow().get(name) {
                created.push(Rc::clone(existing));
                continue;
            }
            let Some(raw) = self.library.get(name) else {
                continue;
            };
            let material = Rc::new(self.build(name, raw));
            self.materials
                .borrow_mut()
                .insert(name.clone(), Rc::clone(&material));
            created.push(material);
        }

        self.issue_queued_loads();
        self.tracker.settle();
        created
    }

    /// Invalidate in-flight texture loads issued by this creator.
    ///
    /// Completion callbacks for fetches already handed to the host are not
    /// suppressed; a late callback may still reference an aborted load.
    pub fn cancel(&self) {
        let mut cancelled = 0;
        for texture in self.issued.borrow().iter() {
            if !texture.is_loaded() {
                texture.invalidate();
                cancelled += 1;
            }
        }
        if cancelled > 0 {
            log::debug!("Invalidated {} in-flight texture load(s)", cancelled);
        }
    }

    fn build(&self, name: &str, raw: &super::mtl_parser::RawMaterial) -> Material {
        let mut diffuse = None;
        let mut specular = None;
        let mut emissive = None;
        let mut shininess = None;
        let mut metalness = None;
        let mut roughness = None;
        let mut opacity = 1.0;
        let mut transparent = false;
        let mut textures = MaterialTextures::default();

        for (key, value) in raw.iter() {
            match (key, value) {
                ("kd", MtlValue::Color(c)) => diffuse = self.decode_color(*c).or(diffuse),
                ("ks", MtlValue::Color(c)) => specular = self.decode_color(*c).or(specular),
                ("ke", MtlValue::Color(c)) => emissive = self.decode_color(*c).or(emissive),

                ("map_kd", MtlValue::Text(v)) => {
                    self.set_map_for_slot(&mut textures, TextureSlot::Diffuse, v);
                }
                ("map_ao", MtlValue::Text(v)) => {
                    self.set_map_for_slot(&mut textures, TextureSlot::AmbientOcclusion, v);
                }
                ("map_ka", MtlValue::Text(v)) => {
                    self.set_map_for_slot(&mut textures, TextureSlot::Light, v);
                }
                ("map_ks", MtlValue::Text(v)) => {
                    self.set_map_for_slot(&mut textures, TextureSlot::Specular, v);
                }
                ("map_ke", MtlValue::Text(v)) => {
                    self.set_map_for_slot(&mut textures, TextureSlot::Emissive, v);
                }
                ("norm" | "map_bump" | "bump", MtlValue::Text(v)) => {
                    self.set_map_for_slot(&mut textures, TextureSlot::Normal, v);
                }
                ("map_d", MtlValue::Text(v)) => {
                    self.set_map_for_slot(&mut textures, TextureSlot::Alpha, v);
                    transparent = true;
                }

                ("ns", MtlValue::Text(v)) => shininess = Some(parse_float(v)),
                ("d", MtlValue::Text(v)) => {
                    let n = parse_float(v);
                    if n < 1.0 {
                        opacity = n;
                        transparent = true;
                    }
                }
                ("tr", MtlValue::Text(v)) => {
                    let mut n = parse_float(v);
                    if self.options.invert_tr_property {
                        n = 1.0 - n;
                    }
                    if n > 0.0 {
                        opacity = 1.0 - n;
                        transparent = true;
                    }
                }
                ("metalness", MtlValue::Text(v)) => metalness = Some(parse_float(v)),
                ("roughness", MtlValue::Text(v)) => roughness = Some(parse_float(v)),

                _ => {}
            }
        }

        let kind = if let Some(metalness) = metalness {
            // Shininess and specular color do not exist in this workflow.
            let defaults = SpecularParams::default();
            MaterialKind::Metalness(MetalnessParams {
                diffuse: diffuse.unwrap_or(defaults.diffuse),
                emissive: emissive.unwrap_or(defaults.emissive),
                metalness,
                roughness: roughness.unwrap_or(1.0),
                env_map: shared_env_map(),
                env_map_intensity: ENV_MAP_INTENSITY,
                reflectivity: ENV_MAP_REFLECTIVITY,
            })
        } else {
            let defaults = SpecularParams::default();
            MaterialKind::Specular(SpecularParams {
                diffuse: diffuse.unwrap_or(defaults.diffuse),
                specular: specular.unwrap_or(defaults.specular),
                emissive: emissive.unwrap_or(defaults.emissive),
                shininess: shininess.unwrap_or(defaults.shininess),
            })
        };

        log::debug!(
            "Built material {:?} ({} texture reference(s))",
            name,
            textures.count()
        );

        Material {
            name: name.to_string(),
            kind,
            side: self.options.side,
            transparent,
            opacity,
            textures,
        }
    }

    fn decode_color(&self, mut color: Vec3) -> Option<Vec3> {
        if self.options.normalize_rgb {
            color /= 255.0;
        }
        if self.options.ignore_zero_rgbs && color == Vec3::new(0.0, 0.0, 0.0) {
            return None;
        }
        Some(srgb_to_linear(color))
    }

    fn set_map_for_slot(&self, textures: &mut MaterialTextures, slot: TextureSlot, value: &str) {
        // First occurrence wins per slot.
        if textures.get(slot).is_some() {
            return;
        }

        let declaration = TextureDeclaration::parse(value);
        let mut url = declaration.url.clone();
        if slot == TextureSlot::Diffuse && self.options.compressed_texture_type.is_some() {
            url = rewrite_png_to_jpg(&url);
        }
        let resolved = self.resolve_url(&url);

        let color_space = match slot {
            TextureSlot::Diffuse | TextureSlot::Emissive => ColorSpace::Srgb,
            _ => ColorSpace::Linear,
        };

        let texture = self.resolve_texture(resolved, slot, color_space, &declaration);
        *textures.slot_mut(slot) = Some(texture);
    }

    fn resolve_url(&self, url: &str) -> String {
        let lower = url.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}{}", self.base_url, url)
        }
    }

    fn resolve_texture(
        &self,
        url: String,
        slot: TextureSlot,
        color_space: ColorSpace,
        declaration: &TextureDeclaration,
    ) -> Texture {
        if let Some(existing) = self.cache.get(&url) {
            if existing.is_loaded() {
                log::trace!("Texture cache hit (already loaded): {}", url);
                return existing;
            }
            // Pending load in flight: share the handle and wait on it.
            log::trace!("Texture cache hit (pending): {}", url);
            self.tracker.request();
            self.cache
                .add_observer(&url, Rc::clone(&self.tracker) as Rc<dyn TextureObserver>);
            return existing;
        }

        let texture = Texture::new(
            url.clone(),
            slot,
            self.options.wrap,
            color_space,
            declaration.repeat,
            declaration.offset,
            declaration.bump_scale,
        );

        self.tracker.request();
        self.cache.add(&url, texture.clone());
        self.cache
            .add_observer(&url, Rc::clone(&self.tracker) as Rc<dyn TextureObserver>);
        self.queued_loads
            .borrow_mut()
            .push((url, texture.clone()));

        texture
    }

    fn issue_queued_loads(&self) {
        let queued: Vec<_> = self.queued_loads.borrow_mut().drain(..).collect();
        for (url, texture) in queued {
            self.issued.borrow_mut().push(texture.clone());
            self.begin_load(url, texture);
        }
    }

    fn begin_load(&self, url: String, texture: Texture) {
        log::debug!("Requesting texture {}", url);

        let cache = Rc::clone(&self.cache);
        let tracker = Rc::clone(&self.tracker);
        // With the cache disabled there is no observer list, so completion
        // must notify this creator's tracker directly.
        let notify_direct = !cache.is_enabled();
        let completion_url = url.clone();

        self.fetcher.fetch(
            &url,
            Box::new(move |result| {
                match result.and_then(|bytes| ImageData::from_bytes(&bytes)) {
                    Ok(image) => {
                        texture.mark_loaded(image);
                        if notify_direct {
                            tracker.texture_loaded(&texture);
                        } else {
                            cache.loaded(&completion_url);
                        }
                    }
                    Err(err) => {
                        log::warn!("Texture load failed for {}: {}", completion_url, err);
                        texture.mark_failed();
                        if notify_direct {
                            tracker.texture_not_loaded(&texture);
                        } else {
                            cache.not_loaded(&completion_url);
                        }
                    }
                }
            }),
        );
    }
}

fn rewrite_png_to_jpg(url: &str) -> String {
    let lower = url.to_ascii_lowercase();
    lower.strip_suffix(".png").map_or_else(
        || url.to_string(),
        |_| format!("{}.jpg", &url[..url.len() - 4]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MemoryFetcher;
    use crate::materials::mtl_parser::MtlParser;
    use approx::assert_relative_eq;

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(1, 1, image::Rgba([128, 64, 32, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn creator_for(
        mtl: &str,
        options: CreatorOptions,
        cache: &Rc<TextureCache>,
        fetcher: &Rc<MemoryFetcher>,
    ) -> MaterialCreator {
        let library = MtlParser::parse(mtl);
        let dyn_fetcher: Rc<dyn FileFetcher> = Rc::clone(fetcher) as Rc<dyn FileFetcher>;
        MaterialCreator::new(library, "models/", options, Rc::clone(cache), dyn_fetcher)
    }

    #[test]
    fn test_modifier_extraction() {
        let decl = TextureDeclaration::parse("-s 2 2 -o 0.5 0 wall.jpg");
        assert_eq!(decl.repeat, Vec2::new(2.0, 2.0));
        assert_eq!(decl.offset, Vec2::new(0.5, 0.0));
        assert_eq!(decl.bump_scale, None);
        assert_eq!(decl.url, "wall.jpg");
    }

    #[test]
    fn test_modifier_extraction_bump_and_triple() {
        let decl = TextureDeclaration::parse("-bm 0.4 -s 1 2 3 bumpy rock.png");
        assert_eq!(decl.bump_scale, Some(0.4));
        assert_eq!(decl.repeat, Vec2::new(1.0, 2.0));
        // The third numeric component is consumed; spaces in the URL are
        // preserved.
        assert_eq!(decl.url, "bumpy rock.png");
    }

    #[test]
    fn test_plain_url_has_default_modifiers() {
        let decl = TextureDeclaration::parse("wall.png");
        assert_eq!(decl.repeat, Vec2::new(1.0, 1.0));
        assert_eq!(decl.offset, Vec2::new(0.0, 0.0));
        assert_eq!(decl.url, "wall.png");
    }

    #[test]
    fn test_colors_gamma_decoded() {
        let cache = Rc::new(TextureCache::new());
        let fetcher = MemoryFetcher::new();
        let creator = creator_for(
            "newmtl m\nKd 0.5 0.5 0.5\n",
            CreatorOptions::default(),
            &cache,
            &fetcher,
        );

        let material = creator.create("m").unwrap();
        let MaterialKind::Specular(params) = &material.kind else {
            panic!("expected specular workflow");
        };
        assert_relative_eq!(params.diffuse.x, 0.2140, epsilon = 1e-3);
    }

    #[test]
    fn test_normalize_and_ignore_zero_rgb_options() {
        let cache = Rc::new(TextureCache::new());
        let fetcher = MemoryFetcher::new();
        let options = CreatorOptions {
            normalize_rgb: true,
            ignore_zero_rgbs: true,
            ..CreatorOptions::default()
        };
        let creator = creator_for(
            "newmtl m\nKd 255 255 255\nKs 0 0 0\n",
            options,
            &cache,
            &fetcher,
        );

        let material = creator.create("m").unwrap();
        let MaterialKind::Specular(params) = &material.kind else {
            panic!("expected specular workflow");
        };
        assert_relative_eq!(params.diffuse.x, 1.0, epsilon = 1e-6);
        // The zero specular color was ignored; the default survives.
        assert_relative_eq!(params.specular.x, SpecularParams::default().specular.x);
    }

    #[test]
    fn test_opacity_from_d_and_transparency() {
        let cache = Rc::new(TextureCache::new());
        let fetcher = MemoryFetcher::new();
        let creator = creator_for(
            "newmtl m\nd 0.25\n",
            CreatorOptions::default(),
            &cache,
            &fetcher,
        );

        let material = creator.create("m").unwrap();
        assert_relative_eq!(material.opacity, 0.25);
        assert!(material.transparent);
    }

    #[test]
    fn test_opacity_from_tr_with_inversion() {
        let cache = Rc::new(TextureCache::new());
        let fetcher = MemoryFetcher::new();

        let creator = creator_for(
            "newmtl m\nTr 0.3\n",
            CreatorOptions::default(),
            &cache,
            &fetcher,
        );
        let material = creator.create("m").unwrap();
        assert_relative_eq!(material.opacity, 0.7);
        assert!(material.transparent);

        let inverted = creator_for(
            "newmtl m\nTr 0.3\n",
            CreatorOptions {
                invert_tr_property: true,
                ..CreatorOptions::default()
            },
            &cache,
            &fetcher,
        );
        let material = inverted.create("m").unwrap();
        assert_relative_eq!(material.opacity, 0.3, epsilon = 1e-6);
    }

    #[test]
    fn test_tr_zero_stays_opaque() {
        let cache = Rc::new(TextureCache::new());
        let fetcher = MemoryFetcher::new();
        let creator = creator_for(
            "newmtl m\nTr 0\n",
            CreatorOptions::default(),
            &cache,
            &fetcher,
        );

        let material = creator.create("m").unwrap();
        assert_relative_eq!(material.opacity, 1.0);
        assert!(!material.transparent);
    }

    #[test]
    fn test_metalness_workflow_selection() {
        let cache = Rc::new(TextureCache::new());
        let fetcher = MemoryFetcher::new();
        let creator = creator_for(
            "newmtl m\nKd 1 0 0\nKs 1 1 1\nNs 500\nmetalness 0.4\nroughness 0.2\n",
            CreatorOptions::default(),
            &cache,
            &fetcher,
        );

        let material = creator.create("m").unwrap();
        assert!(material.is_metalness_workflow());
        let MaterialKind::Metalness(params) = &material.kind else {
            panic!("expected metalness workflow");
        };
        assert_relative_eq!(params.metalness, 0.4);
        assert_relative_eq!(params.roughness, 0.2);
        assert_relative_eq!(params.env_map_intensity, 1.0);
        assert_relative_eq!(params.reflectivity, 0.8);
        assert!(std::ptr::eq(params.env_map, shared_env_map()));
    }

    #[test]
    fn test_relative_and_absolute_url_resolution() {
        let cache = Rc::new(TextureCache::new());
        let fetcher = MemoryFetcher::new();
        let creator = creator_for(
            "newmtl m\nmap_Kd wall.png\nmap_Ke https://cdn.example.com/glow.png\n",
            CreatorOptions::default(),
            &cache,
            &fetcher,
        );

        let material = creator.create("m").unwrap();
        assert_eq!(material.textures.diffuse.as_ref().unwrap().url(), "models/wall.png");
        assert_eq!(
            material.textures.emissive.as_ref().unwrap().url(),
            "https://cdn.example.com/glow.png"
        );
    }

    #[test]
    fn test_compressed_pipeline_rewrites_diffuse_png() {
        let cache = Rc::new(TextureCache::new());
        let fetcher = MemoryFetcher::new();
        let creator = creator_for(
            "newmtl m\nmap_Kd wall.png\nnorm bumps.png\n",
            CreatorOptions {
                compressed_texture_type: Some(CompressedTextureType::Jpeg),
                ..CreatorOptions::default()
            },
            &cache,
            &fetcher,
        );

        let material = creator.create("m").unwrap();
        assert_eq!(material.textures.diffuse.as_ref().unwrap().url(), "models/wall.jpg");
        // Only the diffuse slot is rewritten.
        assert_eq!(material.textures.normal.as_ref().unwrap().url(), "models/bumps.png");
    }

    #[test]
    fn test_first_texture_occurrence_wins_per_slot() {
        let cache = Rc::new(TextureCache::new());
        let fetcher = MemoryFetcher::new();
        let creator = creator_for(
            "newmtl m\nnorm first.png\nmap_Bump second.png\n",
            CreatorOptions::default(),
            &cache,
            &fetcher,
        );

        let material = creator.create("m").unwrap();
        assert_eq!(material.textures.normal.as_ref().unwrap().url(), "models/first.png");
    }

    #[test]
    fn test_map_d_forces_transparency() {
        let cache = Rc::new(TextureCache::new());
        let fetcher = MemoryFetcher::new();
        let creator = creator_for(
            "newmtl m\nmap_d cutout.png\n",
            CreatorOptions::default(),
            &cache,
            &fetcher,
        );

        let material = creator.create("m").unwrap();
        assert!(material.transparent);
        assert!(material.textures.alpha.is_some());
    }

    #[test]
    fn test_color_space_tagging() {
        let cache = Rc::new(TextureCache::new());
        let fetcher = MemoryFetcher::new();
        let creator = creator_for(
            "newmtl m\nmap_Kd d.png\nmap_Ke e.png\nmap_Ks s.png\n",
            CreatorOptions::default(),
            &cache,
            &fetcher,
        );

        let material = creator.create("m").unwrap();
        let textures = &material.textures;
        assert_eq!(textures.diffuse.as_ref().unwrap().color_space(), ColorSpace::Srgb);
        assert_eq!(textures.emissive.as_ref().unwrap().color_space(), ColorSpace::Srgb);
        assert_eq!(textures.specular.as_ref().unwrap().color_space(), ColorSpace::Linear);
    }

    #[test]
    fn test_zero_texture_material_completes_synchronously() {
        let cache = Rc::new(TextureCache::new());
        let fetcher = MemoryFetcher::new();
        let creator = creator_for(
            "newmtl m\nKd 1 1 1\n",
            CreatorOptions::default(),
            &cache,
            &fetcher,
        );

        let progress = Rc::new(RefCell::new(Vec::new()));
        let complete = Rc::new(Cell::new(None));
        {
            let sink = Rc::clone(&progress);
            creator.on_progress(move |pct, err, _| sink.borrow_mut().push((pct, err)));
            let flag = Rc::clone(&complete);
            creator.on_complete(move |had_error| flag.set(Some(had_error)));
        }

        creator.create("m").unwrap();
        assert_eq!(*progress.borrow(), vec![(100.0, false)]);
        assert_eq!(complete.get(), Some(false));
    }

    #[test]
    fn test_texture_loads_drive_completion() {
        let cache = Rc::new(TextureCache::new());
        let fetcher = MemoryFetcher::new();
        fetcher.insert("models/wall.png", png_bytes());
        // glow.png is intentionally absent: one success, one failure.
        fetcher.set_deferred(true);

        let creator = creator_for(
            "newmtl m\nmap_Kd wall.png\nmap_Ke glow.png\n",
            CreatorOptions::default(),
            &cache,
            &fetcher,
        );

        let complete = Rc::new(Cell::new(None));
        let flag = Rc::clone(&complete);
        creator.on_complete(move |had_error| flag.set(Some(had_error)));

        let material = creator.create("m").unwrap();
        assert_eq!(creator.tracker().requested(), 2);
        assert_eq!(creator.tracker().processed(), 0);
        assert_eq!(complete.get(), None);

        fetcher.pump();
        assert_eq!(creator.tracker().processed(), 2);
        assert_eq!(complete.get(), Some(true));
        assert!(creator.tracker().had_error());
        assert!(material.textures.diffuse.as_ref().unwrap().is_loaded());
        assert!(!material.textures.emissive.as_ref().unwrap().is_loaded());
    }

    #[test]
    fn test_shared_cache_deduplicates_concurrent_loads() {
        let cache = Rc::new(TextureCache::new());
        let fetcher = MemoryFetcher::new();
        fetcher.insert("models/wall.png", png_bytes());
        fetcher.set_deferred(true);

        let first = creator_for(
            "newmtl a\nmap_Kd wall.png\n",
            CreatorOptions::default(),
            &cache,
            &fetcher,
        );
        let second = creator_for(
            "newmtl b\nmap_Kd wall.png\n",
            CreatorOptions::default(),
            &cache,
            &fetcher,
        );

        let done_first = Rc::new(Cell::new(false));
        let done_second = Rc::new(Cell::new(false));
        {
            let flag = Rc::clone(&done_first);
            first.on_complete(move |_| flag.set(true));
            let flag = Rc::clone(&done_second);
            second.on_complete(move |_| flag.set(true));
        }

        let mat_a = first.create("a").unwrap();
        let mat_b = second.create("b").unwrap();

        // Only one fetch was issued for the shared URL.
        assert_eq!(fetcher.pending_count(), 1);
        assert!(mat_a
            .textures
            .diffuse
            .as_ref()
            .unwrap()
            .same_handle(mat_b.textures.diffuse.as_ref().unwrap()));

        fetcher.pump();
        assert!(done_first.get());
        assert!(done_second.get());

        // The entry was removed after notification; a later request starts
        // a fresh load.
        assert!(cache.is_empty());
        let third = creator_for(
            "newmtl c\nmap_Kd wall.png\n",
            CreatorOptions::default(),
            &cache,
            &fetcher,
        );
        third.create("c").unwrap();
        assert_eq!(fetcher.pending_count(), 1);
    }

    #[test]
    fn test_disabled_cache_loads_fresh_every_time() {
        let cache = Rc::new(TextureCache::new());
        cache.set_enabled(false);
        let fetcher = MemoryFetcher::new();
        fetcher.insert("models/wall.png", png_bytes());
        fetcher.set_deferred(true);

        let first = creator_for(
            "newmtl a\nmap_Kd wall.png\n",
            CreatorOptions::default(),
            &cache,
            &fetcher,
        );
        let second = creator_for(
            "newmtl b\nmap_Kd wall.png\n",
            CreatorOptions::default(),
            &cache,
            &fetcher,
        );

        let done = Rc::new(Cell::new(0));
        {
            let counter = Rc::clone(&done);
            first.on_complete(move |_| counter.set(counter.get() + 1));
        }
        {
            let counter = Rc::clone(&done);
            second.on_complete(move |_| counter.set(counter.get() + 1));
        }

        first.create("a").unwrap();
        second.create("b").unwrap();
        assert_eq!(fetcher.pending_count(), 2);

        fetcher.pump();
        assert_eq!(done.get(), 2);
    }

    #[test]
    fn test_create_is_memoized() {
        let cache = Rc::new(TextureCache::new());
        let fetcher = MemoryFetcher::new();
        let creator = creator_for(
            "newmtl m\nKd 1 1 1\n",
            CreatorOptions::default(),
            &cache,
            &fetcher,
        );

        let a = creator.create("m").unwrap();
        let b = creator.create("m").unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert!(creator.create("missing").is_none());
    }

    #[test]
    fn test_preload_returns_declaration_order() {
        let cache = Rc::new(TextureCache::new());
        let fetcher = MemoryFetcher::new();
        let creator = creator_for(
            "newmtl z\nKd 1 0 0\nnewmtl a\nKd 0 1 0\n",
            CreatorOptions::default(),
            &cache,
            &fetcher,
        );

        let materials = creator.preload();
        let names: Vec<_> = materials.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["z", "a"]);
    }

    #[test]
    fn test_cancel_invalidates_pending_textures() {
        let cache = Rc::new(TextureCache::new());
        let fetcher = MemoryFetcher::new();
        fetcher.insert("models/wall.png", png_bytes());
        fetcher.set_deferred(true);

        let creator = creator_for(
            "newmtl m\nmap_Kd wall.png\n",
            CreatorOptions::default(),
            &cache,
            &fetcher,
        );
        let material = creator.create("m").unwrap();

        creator.cancel();
        let texture = material.textures.diffuse.as_ref().unwrap();
        assert_eq!(texture.status(), crate::materials::texture::TextureStatus::Failed);

        // The already-issued fetch still completes; late callbacks are
        // tolerated rather than suppressed.
        fetcher.pump();
        assert_eq!(creator.tracker().processed(), 1);
    }

    #[test]
    fn test_png_rewrite_helper() {
        assert_eq!(rewrite_png_to_jpg("wall.png"), "wall.jpg");
        assert_eq!(rewrite_png_to_jpg("Wall.PNG"), "Wall.jpg");
        assert_eq!(rewrite_png_to_jpg("wall.jpg"), "wall.jpg");
        assert_eq!(rewrite_png_to_jpg("noext"), "noext");
    }
}
