use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;

use crate::foundation::error::{ScreenError, ScreenResult};

/// Opaque provider of encoded bytes addressed by a reference string.
///
/// Template textures and layer images both come through this seam, so a deployment can back
/// them with a directory, an in-memory bundle, or a network client.
pub trait ByteSource: Send + Sync {
    /// Fetch the bytes behind `reference`.
    fn read(&self, reference: &str) -> anyhow::Result<Vec<u8>>;
}

/// Reads references as relative paths under a root directory.
#[derive(Clone, Debug)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ByteSource for DirSource {
    fn read(&self, reference: &str) -> anyhow::Result<Vec<u8>> {
        let rel = normalize_rel_path(reference)?;
        let path = self.root.join(Path::new(&rel));
        std::fs::read(&path).with_context(|| format!("read '{}'", path.display()))
    }
}

/// In-memory byte bundle keyed by reference.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    entries: HashMap<String, Arc<Vec<u8>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reference: impl Into<String>, bytes: Vec<u8>) {
        self.entries.insert(reference.into(), Arc::new(bytes));
    }

    pub fn with(mut self, reference: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(reference, bytes);
        self
    }
}

impl ByteSource for MemorySource {
    fn read(&self, reference: &str) -> anyhow::Result<Vec<u8>> {
        self.entries
            .get(reference)
            .map(|b| b.as_ref().clone())
            .ok_or_else(|| anyhow::anyhow!("no entry for '{reference}'"))
    }
}

/// Normalize and validate a root-relative asset path.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub fn normalize_rel_path(source: &str) -> ScreenResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(ScreenError::validation("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(ScreenError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(ScreenError::validation("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(ScreenError::validation(
            "asset path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/source.rs"]
mod tests;
