//! Shared infrastructure for the pagecraft workspace: the filesystem
//! abstraction the artifact-writing layers are written against.

mod filesystem;

pub use filesystem::{FileSystem, MemoryFileSystem, RealFileSystem};
