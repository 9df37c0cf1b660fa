//! Key-value string storage backends
//!
//! - `MemoryStorage`: in-process map (tests, fallback when nothing else works)
//! - `FileStorage`: one JSON file per key (native)
//! - `LocalStorage`: browser LocalStorage (wasm32)

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::persistence::{Result, StoreError};

/// Minimal string store, shaped like LocalStorage
pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-memory storage.
///
/// Clones share the same backing map, so a clone kept outside the engine
/// sees every write (like two tabs on one LocalStorage).
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Rc<RefCell<HashMap<String, String>>>,
    failing: Rc<Cell<bool>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with `StoreError::Backend`
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    fn check(&self) -> Result<()> {
        if self.failing.get() {
            Err(StoreError::Backend("injected failure".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.check()?;
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.check()?;
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.check()?;
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

/// A backend that may have failed to open, with in-memory fallback.
///
/// Gameplay keeps working without persistence; nothing survives a reload.
#[derive(Debug)]
pub enum Fallback<S> {
    Primary(S),
    Memory(MemoryStorage),
}

impl<S: Storage> Fallback<S> {
    pub fn or_memory(opened: Result<S>) -> Self {
        match opened {
            Ok(storage) => Fallback::Primary(storage),
            Err(e) => {
                log::warn!("Storage unavailable ({e}), progress will not be saved");
                Fallback::Memory(MemoryStorage::new())
            }
        }
    }

    pub fn is_persistent(&self) -> bool {
        matches!(self, Fallback::Primary(_))
    }
}

impl<S: Storage> Storage for Fallback<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match self {
            Fallback::Primary(s) => s.get(key),
            Fallback::Memory(s) => s.get(key),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match self {
            Fallback::Primary(s) => s.set(key, value),
            Fallback::Memory(s) => s.set(key, value),
        }
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match self {
            Fallback::Primary(s) => s.remove(key),
            Fallback::Memory(s) => s.remove(key),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use std::fs;
    use std::io::ErrorKind;
    use std::path::{Path, PathBuf};

    use super::Storage;
    use crate::persistence::Result;

    /// Directory-backed storage: `<dir>/<key>.json`
    #[derive(Debug, Clone)]
    pub struct FileStorage {
        dir: PathBuf,
    }

    impl FileStorage {
        /// Open (and create if needed) a storage directory
        pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
            let dir = dir.into();
            fs::create_dir_all(&dir)?;
            Ok(Self { dir })
        }

        pub fn dir(&self) -> &Path {
            &self.dir
        }

        fn path(&self, key: &str) -> PathBuf {
            self.dir.join(format!("{key}.json"))
        }
    }

    impl Storage for FileStorage {
        fn get(&self, key: &str) -> Result<Option<String>> {
            match fs::read_to_string(self.path(key)) {
                Ok(text) => Ok(Some(text)),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e.into()),
            }
        }

        fn set(&mut self, key: &str, value: &str) -> Result<()> {
            // Write to a temp file then rename so a crash never leaves half a save
            let path = self.path(key);
            let tmp = path.with_extension("json.tmp");
            fs::write(&tmp, value)?;
            fs::rename(&tmp, &path)?;
            Ok(())
        }

        fn remove(&mut self, key: &str) -> Result<()> {
            match fs::remove_file(self.path(key)) {
                Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::LocalStorage;

#[cfg(target_arch = "wasm32")]
mod web {
    use super::Storage;
    use crate::persistence::{Result, StoreError};

    /// Browser LocalStorage
    pub struct LocalStorage {
        storage: web_sys::Storage,
    }

    impl LocalStorage {
        /// Fails when LocalStorage is disabled (private mode, sandboxed iframe)
        pub fn open() -> Result<Self> {
            let storage = web_sys::window()
                .and_then(|w| w.local_storage().ok())
                .flatten()
                .ok_or(StoreError::Unavailable)?;
            Ok(Self { storage })
        }
    }

    fn js_err(err: wasm_bindgen::JsValue) -> StoreError {
        StoreError::Backend(format!("{:?}", err))
    }

    impl Storage for LocalStorage {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.storage.get_item(key).map_err(js_err)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<()> {
            self.storage.set_item(key, value).map_err(js_err)
        }

        fn remove(&mut self, key: &str) -> Result<()> {
            self.storage.remove_item(key).map_err(js_err)
        }
    }
}
