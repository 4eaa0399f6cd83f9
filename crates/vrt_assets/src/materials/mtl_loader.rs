//! Material library loading façade
//!
//! Bundles the parser, a [`TextureCache`], and a [`FileFetcher`] so callers
//! can go from an `.mtl` URL (or already-fetched text) to a configured
//! [`MaterialCreator`] in one call.

use std::rc::Rc;

use super::material_creator::{CreatorOptions, MaterialCreator};
use super::mtl_parser::MtlParser;
use super::texture_cache::TextureCache;
use crate::error::AssetError;
use crate::fetch::FileFetcher;

/// Everything up to and including the last `/`, or empty for bare names
pub fn base_url_of(url: &str) -> &str {
    url.rfind('/').map_or("", |pos| &url[..=pos])
}

/// Builds [`MaterialCreator`]s from `.mtl` sources
pub struct MtlLoader {
    options: CreatorOptions,
    cache: Rc<TextureCache>,
    fetcher: Rc<dyn FileFetcher>,
}

impl MtlLoader {
    /// Create a loader sharing `cache` and `fetcher` across every library
    /// it loads
    pub fn new(
        options: CreatorOptions,
        cache: Rc<TextureCache>,
        fetcher: Rc<dyn FileFetcher>,
    ) -> Self {
        Self {
            options,
            cache,
            fetcher,
        }
    }

    /// Options handed to every creator this loader builds
    pub fn options(&self) -> &CreatorOptions {
        &self.options
    }

    /// Parse already-fetched MTL text into a creator resolving textures
    /// against `base_url`
    pub fn parse(&self, text: &str, base_url: &str) -> MaterialCreator {
        let library = MtlParser::parse(text);
        log::debug!(
            "Parsed material library with {} record(s), base {:?}",
            library.len(),
            base_url
        );
        MaterialCreator::new(
            library,
            base_url,
            self.options.clone(),
            Rc::clone(&self.cache),
            Rc::clone(&self.fetcher),
        )
    }

    /// Fetch `url`, parse it, and hand the creator to `on_done`.
    ///
    /// Texture URLs in the library resolve against the directory portion
    /// of `url`.
    pub fn load(&self, url: &str, on_done: impl FnOnce(Result<MaterialCreator, AssetError>) + 'static) {
        let base_url = base_url_of(url).to_string();
        let options = self.options.clone();
        let cache = Rc::clone(&self.cache);
        let fetcher = Rc::clone(&self.fetcher);
        let for_log = url.to_string();

        self.fetcher.fetch(
            url,
            Box::new(move |result| match result {
                Ok(bytes) => {
                    let text = String::from_utf8_lossy(&bytes);
                    let library = MtlParser::parse(&text);
                    log::debug!(
                        "Loaded material library {:?} ({} record(s))",
                        for_log,
                        library.len()
                    );
                    on_done(Ok(MaterialCreator::new(
                        library, base_url, options, cache, fetcher,
                    )));
                }
                Err(err) => {
                    log::warn!("Failed to load material library {:?}: {}", for_log, err);
                    on_done(Err(err));
                }
            }),
        );
    }
}
