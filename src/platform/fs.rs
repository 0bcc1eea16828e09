//! Read-only filesystem access for `/proc` and `/sys` collectors.
//!
//! Collectors hold an `Arc<dyn FileSystem>` so they can run against the real
//! pseudo-filesystems or against [`MockFs`] fixtures in tests.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

/// Abstraction over the filesystem operations the collectors need.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Checks if a path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Lists the direct children of a directory.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}

/// Real filesystem implementation that delegates to `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    pub fn new() -> Self {
        Self
    }

    /// Shared handle, the form every collector takes.
    pub fn shared() -> Arc<dyn FileSystem> {
        Arc::new(Self)
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(path)? {
            paths.push(entry?.path());
        }
        Ok(paths)
    }
}

/// In-memory filesystem for fixtures.
///
/// Files can be added, replaced and removed through `&self`, so a test can
/// keep a handle while a collector reads through its own `Arc`.
#[derive(Debug, Default)]
pub struct MockFs {
    inner: RwLock<MockTree>,
}

#[derive(Debug, Default)]
struct MockTree {
    files: BTreeMap<PathBuf, String>,
    directories: BTreeSet<PathBuf>,
}

impl MockTree {
    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }
    }
}

impl MockFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a file. Parent directories are created implicitly.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref().to_path_buf();
        let mut tree = self.inner.write();
        tree.add_parents(&path);
        tree.files.insert(path, content.into());
    }

    /// Adds an empty directory.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        let mut tree = self.inner.write();
        tree.add_parents(&path);
        tree.directories.insert(path);
    }

    /// Removes a file or a whole directory subtree.
    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut tree = self.inner.write();
        tree.files.retain(|p, _| !p.starts_with(path));
        tree.directories.retain(|p| !p.starts_with(path));
    }

    /// Adds `/proc/<pid>/stat` and `/proc/<pid>/statm` under `proc_root`.
    ///
    /// `ticks` is split into utime/stime so tests can reason about the sum.
    pub fn add_process(
        &self,
        proc_root: impl AsRef<Path>,
        pid: u32,
        name: &str,
        ticks: u64,
        rss_pages: u64,
        shared_pages: u64,
    ) {
        let base = proc_root.as_ref().join(pid.to_string());
        let utime = ticks / 2;
        let stime = ticks - utime;
        let stat = format!(
            "{pid} ({name}) S 1 {pid} {pid} 0 -1 4194560 100 0 0 0 {utime} {stime} 0 0 20 0 1 0 100 1000000 {rss_pages} 18446744073709551615 1 1 0 0 0 0 0 0 0 0 0 0 17 0 0 0 0 0 0"
        );
        let statm = format!("1000 {rss_pages} {shared_pages} 10 0 200 0");
        self.add_file(base.join("stat"), stat);
        self.add_file(base.join("statm"), statm);
    }
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.inner.read().files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })
    }

    fn exists(&self, path: &Path) -> bool {
        let tree = self.inner.read();
        tree.files.contains_key(path) || tree.directories.contains(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let tree = self.inner.read();
        if !tree.directories.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory not found: {:?}", path),
            ));
        }

        let children: BTreeSet<PathBuf> = tree
            .files
            .keys()
            .chain(tree.directories.iter())
            .filter(|p| p.parent() == Some(path))
            .cloned()
            .collect();

        Ok(children.into_iter().collect())
    }
}
