//! Host file-fetch capability
//!
//! The loaders never touch the network or the filesystem directly; they ask
//! an injected [`FileFetcher`] for URL contents and get the result through a
//! completion callback. Completion may be delivered immediately or on a later
//! turn of the host's event loop — callers must not assume either.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::rc::Rc;

use crate::error::AssetError;

/// Completion callback for a single fetch
pub type FetchCallback = Box<dyn FnOnce(Result<Vec<u8>, AssetError>)>;

/// URL → bytes fetch capability supplied by the host
pub trait FileFetcher {
    /// Begin fetching `url`; `on_done` fires with the contents or an error
    fn fetch(&self, url: &str, on_done: FetchCallback);
}

/// Fetcher that resolves URLs against a root directory on disk
///
/// Delivery is synchronous: the callback fires before `fetch` returns.
pub struct FsFetcher {
    root: PathBuf,
}

impl FsFetcher {
    /// Create a fetcher rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, url: &str) -> PathBuf {
        self.root.join(url)
    }
}

impl FileFetcher for FsFetcher {
    fn fetch(&self, url: &str, on_done: FetchCallback) {
        let path = self.resolve(url);
        log::debug!("Fetching {:?}", path);
        let result = std::fs::read(&path).map_err(|e| AssetError::FetchFailed {
            url: url.to_string(),
            reason: e.to_string(),
        });
        on_done(result);
    }
}

/// Fetcher backed by a pre-populated in-memory file table
///
/// Doubles as the host-side file cache keyed by filename and, in deferred
/// mode, as a stand-in for the event loop: requests queue up until the host
/// calls [`MemoryFetcher::pump`], which delivers completions in request
/// order.
#[derive(Default)]
pub struct MemoryFetcher {
    files: RefCell<HashMap<String, Vec<u8>>>,
    pending: RefCell<VecDeque<(String, FetchCallback)>>,
    deferred: Cell<bool>,
}

impl MemoryFetcher {
    /// Create an empty fetcher with immediate delivery
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Register file contents under a URL
    pub fn insert(&self, url: impl Into<String>, bytes: Vec<u8>) {
        self.files.borrow_mut().insert(url.into(), bytes);
    }

    /// Switch between deferred (queued) and immediate delivery
    pub fn set_deferred(&self, deferred: bool) {
        self.deferred.set(deferred);
    }

    /// Number of fetches waiting for delivery
    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Deliver all queued completions; returns how many fired
    pub fn pump(&self) -> usize {
        let mut delivered = 0;
        // Callbacks may issue new fetches, so drain one at a time.
        loop {
            let next = self.pending.borrow_mut().pop_front();
            let Some((url, on_done)) = next else { break };
            on_done(self.lookup(&url));
            delivered += 1;
        }
        delivered
    }

    fn lookup(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        self.files
            .borrow()
            .get(url)
            .cloned()
            .ok_or_else(|| AssetError::FetchFailed {
                url: url.to_string(),
                reason: "not in file table".to_string(),
            })
    }
}

impl FileFetcher for MemoryFetcher {
    fn fetch(&self, url: &str, on_done: FetchCallback) {
        if self.deferred.get() {
            log::trace!("Queued fetch of {}", url);
            self.pending
                .borrow_mut()
                .push_back((url.to_string(), on_done));
        } else {
            on_done(self.lookup(url));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_fs_fetcher_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("data.bin")).unwrap();
        file.write_all(b"payload").unwrap();

        let fetcher = FsFetcher::new(dir.path());
        let got = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&got);
        fetcher.fetch(
            "data.bin",
            Box::new(move |r| {
                sink.replace(Some(r));
            }),
        );
        let result = got.borrow_mut().take().unwrap();
        assert_eq!(result.unwrap(), b"payload");
    }

    #[test]
    fn test_fs_fetcher_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FsFetcher::new(dir.path());
        let got = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&got);
        fetcher.fetch(
            "nope.bin",
            Box::new(move |r| {
                sink.replace(Some(r));
            }),
        );
        let result = got.borrow_mut().take().unwrap();
        assert!(matches!(result, Err(AssetError::FetchFailed { .. })));
    }

    #[test]
    fn test_memory_fetcher_deferred_pump() {
        let fetcher = MemoryFetcher::new();
        fetcher.insert("a.txt", b"aa".to_vec());
        fetcher.set_deferred(true);

        let got = Rc::new(RefCell::new(Vec::new()));
        for url in ["a.txt", "missing.txt"] {
            let sink = Rc::clone(&got);
            fetcher.fetch(
                url,
                Box::new(move |r| {
                    sink.borrow_mut().push(r.is_ok());
                }),
            );
        }

        assert_eq!(fetcher.pending_count(), 2);
        assert!(got.borrow().is_empty());

        assert_eq!(fetcher.pump(), 2);
        assert_eq!(*got.borrow(), vec![true, false]);
        assert_eq!(fetcher.pending_count(), 0);
    }
}
