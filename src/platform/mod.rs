// Platform-specific code module

pub mod fs;
pub mod gpu;
pub mod procfs;

// Re-exports for shorter imports
pub use fs::{FileSystem, MockFs, RealFs};
pub use procfs::ProcfsParams;
