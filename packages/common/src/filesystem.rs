use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Artifact output abstraction. Generation layers write through this so
/// tests can assemble into memory instead of a tempdir.
pub trait FileSystem {
    fn exists(&self, path: &Path) -> bool;

    /// Write a file, creating missing parent directories
    fn write(&self, path: &Path, contents: &str) -> std::io::Result<()>;
}

impl<T: FileSystem + ?Sized> FileSystem for std::sync::Arc<T> {
    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }

    fn write(&self, path: &Path, contents: &str) -> std::io::Result<()> {
        (**self).write(path, contents)
    }
}

pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn write(&self, path: &Path, contents: &str) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)
    }
}

/// In-memory file map for tests
#[derive(Default)]
pub struct MemoryFileSystem {
    files: Mutex<HashMap<PathBuf, String>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self, path: &Path) -> Option<String> {
        self.files.lock().expect("fs lock poisoned").get(path).cloned()
    }

    pub fn remove(&self, path: &Path) -> Option<String> {
        self.files.lock().expect("fs lock poisoned").remove(path)
    }

    pub fn len(&self) -> usize {
        self.files.lock().expect("fs lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FileSystem for MemoryFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.files.lock().expect("fs lock poisoned").contains_key(path)
    }

    fn write(&self, path: &Path, contents: &str) -> std::io::Result<()> {
        self.files
            .lock()
            .expect("fs lock poisoned")
            .insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }
}
