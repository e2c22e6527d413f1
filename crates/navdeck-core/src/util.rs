//! Path and digest helpers

use sha2::{Digest, Sha256};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Errors related to path validation
#[derive(Error, Debug)]
pub enum PathError {
    #[error("Path traversal attempt detected: {0}")]
    TraversalAttempt(String),

    #[error("Invalid path component: {0}")]
    InvalidComponent(String),

    #[error("Empty path")]
    Empty,
}

/// Join a relative, `/`-separated key onto `root`.
///
/// The key must not climb out of `root` with `..` and must not be absolute.
///
/// # Errors
/// Returns an error if the key is empty, absolute, or escapes the root
pub fn safe_join(root: &Path, key: &str) -> Result<PathBuf, PathError> {
    let normalized = normalize_key(key)?;
    Ok(root.join(normalized))
}

fn normalize_key(key: &str) -> Result<PathBuf, PathError> {
    if key.contains('\0') {
        return Err(PathError::InvalidComponent("Null byte in path".to_string()));
    }

    let mut normalized = PathBuf::new();
    let mut depth: usize = 0;

    for component in Path::new(key).components() {
        match component {
            Component::Normal(c) => {
                normalized.push(c);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return Err(PathError::TraversalAttempt(key.to_string()));
                }
                normalized.pop();
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(PathError::InvalidComponent(
                    "Absolute path not allowed".to_string(),
                ));
            }
        }
    }

    if depth == 0 {
        return Err(PathError::Empty);
    }

    Ok(normalized)
}

/// Hex-encoded SHA256 of `content`
#[must_use]
pub fn sha256_hex(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_join_nested() {
        let root = PathBuf::from("/srv/blobs");
        let result = safe_join(&root, "favicon/site/7").unwrap();
        assert_eq!(result, PathBuf::from("/srv/blobs/favicon/site/7"));
    }

    #[test]
    fn test_safe_join_collapses_inner_parent() {
        let root = PathBuf::from("/srv/blobs");
        let result = safe_join(&root, "favicon/./site/../system").unwrap();
        assert_eq!(result, PathBuf::from("/srv/blobs/favicon/system"));
    }

    #[test]
    fn test_safe_join_rejects_traversal() {
        let root = PathBuf::from("/srv/blobs");
        assert!(safe_join(&root, "../etc/passwd").is_err());
        assert!(safe_join(&root, "favicon/../../etc").is_err());
    }

    #[test]
    fn test_safe_join_rejects_absolute_and_empty() {
        let root = PathBuf::from("/srv/blobs");
        assert!(safe_join(&root, "/etc/passwd").is_err());
        assert!(matches!(safe_join(&root, ""), Err(PathError::Empty)));
        assert!(matches!(safe_join(&root, "."), Err(PathError::Empty)));
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
