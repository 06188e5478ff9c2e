//! Common test utilities for distlink scenario and CLI tests.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Isolated test tree: a temp dir with `src/` and an `out/` destination path.
pub struct TestEnv {
    pub tmp: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        let env = Self {
            tmp: tempfile::tempdir().expect("create temp dir"),
        };
        fs::create_dir_all(env.src()).expect("create src dir");
        env
    }

    pub fn src(&self) -> PathBuf {
        self.tmp.path().join("src")
    }

    pub fn out(&self) -> PathBuf {
        self.tmp.path().join("out")
    }

    /// Write a file under `src/`, creating parents.
    pub fn write_src(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.src().join(rel);
        write_file(&path, content);
        path
    }
}

pub fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(path, content).expect("write file");
}

#[cfg(unix)]
pub fn inode(path: &Path) -> u64 {
    use std::os::unix::fs::MetadataExt;
    fs::metadata(path).expect("stat").ino()
}
