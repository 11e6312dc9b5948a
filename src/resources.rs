use std::error::Error;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::ROOT_DOCUMENT;

#[derive(Debug)]
pub enum ResourceError {
    NotFound { path: PathBuf, source: io::Error },
    OutsideRoot { path: String },
}

impl ResourceError {
    pub fn path(&self) -> String {
        match self {
            ResourceError::NotFound { path, .. } => path.display().to_string(),
            ResourceError::OutsideRoot { path } => path.clone(),
        }
    }
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::NotFound { path, source } => {
                write!(f, "could not open {}: {}", path.display(), source)
            }
            ResourceError::OutsideRoot { path } => {
                write!(f, "refusing to open {}: path escapes the public root", path)
            }
        }
    }
}

impl Error for ResourceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ResourceError::NotFound { source, .. } => Some(source),
            ResourceError::OutsideRoot { .. } => None,
        }
    }
}

// Target relative to the public root, without query or fragment.
// None when a `..` would climb above the root; empty means the root document.
pub fn normalize_target(target: &str) -> Option<String> {
    let target = target.split('?').next().unwrap_or(target);
    let target = target.split('#').next().unwrap_or(target);

    let mut stack = Vec::new();
    for part in target.split('/') {
        match part {
            "" | "." => continue,
            ".." => {
                stack.pop()?;
            }
            _ => stack.push(part),
        }
    }

    Some(stack.join("/"))
}

#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, target: &str) -> Result<PathBuf, ResourceError> {
        match normalize_target(target) {
            Some(relative) if relative.is_empty() => Ok(self.root.join(ROOT_DOCUMENT)),
            Some(relative) => Ok(self.root.join(relative)),
            None => Err(ResourceError::OutsideRoot {
                path: format!("{}{}", self.root.display(), target),
            }),
        }
    }

    // Whole-file read of a path already produced by `resolve`
    pub async fn load(&self, path: PathBuf) -> Result<String, ResourceError> {
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(contents),
            Err(source) => Err(ResourceError::NotFound { path, source }),
        }
    }
}
