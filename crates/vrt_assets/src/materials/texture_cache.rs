//! Texture de-duplication cache
//!
//! An explicit service object, injected into each material creator, that
//! de-duplicates concurrent requests for the same resolved URL. Entries are
//! one-shot: while a load is pending the entry collects observers; on
//! completion every observer is notified, the entry is removed, and a later
//! request for the same URL starts a fresh load.
//!
//! Single-threaded by contract: all mutation happens on the host's event
//! loop, so interior mutability suffices and no locking is used.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use super::texture::Texture;

/// Receives completion notifications for a cached texture load
pub trait TextureObserver {
    /// Called when the load behind `texture` succeeded
    fn texture_loaded(&self, texture: &Texture);
    /// Called when the load behind `texture` failed
    fn texture_not_loaded(&self, texture: &Texture);
}

struct CacheEntry {
    texture: Texture,
    observers: Vec<Rc<dyn TextureObserver>>,
}

/// One-shot pending-load cache keyed by resolved URL
pub struct TextureCache {
    enabled: Cell<bool>,
    entries: RefCell<HashMap<String, CacheEntry>>,
}

impl TextureCache {
    /// Create an enabled, empty cache
    pub fn new() -> Self {
        Self {
            enabled: Cell::new(true),
            entries: RefCell::new(HashMap::new()),
        }
    }

    /// Globally enable or disable the cache.
    ///
    /// While disabled, [`add`](Self::add) and [`get`](Self::get) are no-ops
    /// and every texture request triggers a fresh load.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }

    /// Whether the cache currently stores and serves entries
    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Insert a pending entry for `url` with an empty observer list
    pub fn add(&self, url: &str, texture: Texture) {
        if !self.enabled.get() {
            return;
        }
        log::trace!("Texture cache: pending entry for {}", url);
        self.entries.borrow_mut().insert(
            url.to_string(),
            CacheEntry {
                texture,
                observers: Vec::new(),
            },
        );
    }

    /// Look up the shared handle for `url`, if an entry exists
    pub fn get(&self, url: &str) -> Option<Texture> {
        if !self.enabled.get() {
            return None;
        }
        self.entries.borrow().get(url).map(|e| e.texture.clone())
    }

    /// Register an observer on the pending entry for `url`
    pub fn add_observer(&self, url: &str, observer: Rc<dyn TextureObserver>) {
        if let Some(entry) = self.entries.borrow_mut().get_mut(url) {
            entry.observers.push(observer);
        }
    }

    /// Notify and deregister all observers for `url` after a successful load
    pub fn loaded(&self, url: &str) {
        if let Some(entry) = self.remove(url) {
            log::trace!(
                "Texture cache: {} loaded, notifying {} observer(s)",
                url,
                entry.observers.len()
            );
            for observer in &entry.observers {
                observer.texture_loaded(&entry.texture);
            }
        }
    }

    /// Notify and deregister all observers for `url` after a failed load
    pub fn not_loaded(&self, url: &str) {
        if let Some(entry) = self.remove(url) {
            log::trace!(
                "Texture cache: {} failed, notifying {} observer(s)",
                url,
                entry.observers.len()
            );
            for observer in &entry.observers {
                observer.texture_not_loaded(&entry.texture);
            }
        }
    }

    /// Number of pending entries
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// True when no entries are pending
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all pending entries without notifying observers
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    // Entries are removed before observers run so that an observer issuing
    // a new request for the same URL starts a fresh load.
    fn remove(&self, url: &str) -> Option<CacheEntry> {
        self.entries.borrow_mut().remove(url)
    }
}

impl Default for TextureCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::texture::{ColorSpace, TextureSlot, TextureWrap};
    use crate::math::Vec2;

    fn make_texture(url: &str) -> Texture {
        Texture::new(
            url.to_string(),
            TextureSlot::Diffuse,
            TextureWrap::Repeat,
            ColorSpace::Srgb,
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 0.0),
            None,
        )
    }

    struct CountingObserver {
        loaded: Cell<usize>,
        failed: Cell<usize>,
    }

    impl CountingObserver {
        fn new() -> Rc<Self> {
            Rc::new(Self {
                loaded: Cell::new(0),
                failed: Cell::new(0),
            })
        }
    }

    impl TextureObserver for CountingObserver {
        fn texture_loaded(&self, _texture: &Texture) {
            self.loaded.set(self.loaded.get() + 1);
        }
        fn texture_not_loaded(&self, _texture: &Texture) {
            self.failed.set(self.failed.get() + 1);
        }
    }

    #[test]
    fn test_entry_is_one_shot() {
        let cache = TextureCache::new();
        let texture = make_texture("u");
        cache.add("u", texture.clone());

        let obs_a = CountingObserver::new();
        let obs_b = CountingObserver::new();
        cache.add_observer("u", obs_a.clone());
        cache.add_observer("u", obs_b.clone());

        cache.loaded("u");
        assert_eq!(obs_a.loaded.get(), 1);
        assert_eq!(obs_b.loaded.get(), 1);
        assert!(cache.is_empty());

        // After notification the entry is gone; nothing fires twice.
        cache.loaded("u");
        assert_eq!(obs_a.loaded.get(), 1);
    }

    #[test]
    fn test_failure_notifies_and_removes() {
        let cache = TextureCache::new();
        cache.add("u", make_texture("u"));
        let obs = CountingObserver::new();
        cache.add_observer("u", obs.clone());

        cache.not_loaded("u");
        assert_eq!(obs.failed.get(), 1);
        assert_eq!(obs.loaded.get(), 0);
        assert!(cache.get("u").is_none());
    }

    #[test]
    fn test_shared_handle_returned() {
        let cache = TextureCache::new();
        let texture = make_texture("shared");
        cache.add("shared", texture.clone());

        let hit = cache.get("shared").unwrap();
        assert!(hit.same_handle(&texture));
    }

    #[test]
    fn test_disabled_cache_is_noop() {
        let cache = TextureCache::new();
        cache.set_enabled(false);

        cache.add("u", make_texture("u"));
        assert!(cache.get("u").is_none());
        assert!(cache.is_empty());
    }
}
