//! Local content tree: preflight checks and file enumeration

use crate::error::{Error, Result};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// A local directory about to be published
#[derive(Debug, Clone)]
pub struct ContentRoot {
    root: PathBuf,
    entry_document: String,
}

/// One local file and the key it is stored under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub path: PathBuf,
    pub key: String,
}

impl ContentRoot {
    pub fn new(root: impl Into<PathBuf>, entry_document: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            entry_document: entry_document.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entry_document(&self) -> &str {
        &self.entry_document
    }

    /// Check the tree exists and holds the entry document
    ///
    /// Touches only the local filesystem.
    pub fn preflight(&self) -> Result<()> {
        if !self.root.is_dir() {
            return Err(Error::Preflight(format!(
                "Missing folder: {}",
                shown(&self.root)
            )));
        }

        if !self.root.join(&self.entry_document).is_file() {
            return Err(Error::Preflight(format!(
                "Missing file: {}",
                shown(&self.root.join(&self.entry_document))
            )));
        }

        Ok(())
    }

    /// Lazily walk every file under the root
    ///
    /// Each call starts a fresh walk. Entries are sorted by file name at
    /// every level so two walks of an unchanged tree agree.
    pub fn files(&self) -> impl Iterator<Item = Result<LocalFile>> + '_ {
        WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(move |entry| {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => return Some(Err(Error::Walk(e))),
                };

                // Symlinked files count, symlinked directories are not followed
                if entry.file_type().is_dir() || !entry.path().is_file() {
                    return None;
                }

                Some(storage_key(&self.root, entry.path()).map(|key| LocalFile {
                    path: entry.path().to_path_buf(),
                    key,
                }))
            })
    }

    /// Walk the whole tree and check every key before anything is sent
    ///
    /// Fails on the first unreadable entry, non-UTF-8 file name or key
    /// shared by two files.
    pub fn plan(&self) -> Result<Vec<LocalFile>> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();

        for file in self.files() {
            let file = file?;
            if !seen.insert(file.key.clone()) {
                return Err(Error::InvalidInput(format!(
                    "Two files map to the same key '{}'",
                    file.key
                )));
            }
            files.push(file);
        }

        Ok(files)
    }
}

/// `./sites` for relative paths, absolute ones as they are
fn shown(path: &Path) -> String {
    if path.is_relative() {
        format!("./{}", path.display())
    } else {
        path.display().to_string()
    }
}

/// Key for `path` relative to `root`, separators normalized to `/`
pub fn storage_key(root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).map_err(|_| {
        Error::InvalidInput(format!(
            "{} is not under {}",
            path.display(),
            root.display()
        ))
    })?;

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => match part.to_str() {
                Some(part) => parts.push(part.to_string()),
                None => {
                    return Err(Error::InvalidInput(format!(
                        "File name is not valid UTF-8: {}",
                        path.display()
                    )))
                }
            },
            Component::CurDir => {}
            _ => {
                return Err(Error::InvalidInput(format!(
                    "Unexpected path component in {}",
                    relative.display()
                )))
            }
        }
    }

    if parts.is_empty() {
        return Err(Error::InvalidInput(format!(
            "{} is the content root itself",
            path.display()
        )));
    }

    Ok(parts.join("/"))
}
