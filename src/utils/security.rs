//! Security utilities for input validation

use anyhow::Result;
use std::path::{Component, Path};
use tracing::warn;

/// Longest document name accepted (common filesystem limit)
const MAX_NAME_LENGTH: usize = 255;

/// Validate a caller-supplied document name.
///
/// Names are flat file basenames: no separators, no parent-directory
/// sequences, no NUL or control characters. The name is not rewritten, so
/// what is stored is what `list` later returns.
pub fn validate_document_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(anyhow::anyhow!("Filename cannot be empty"));
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(anyhow::anyhow!("Filename too long (max {} bytes)", MAX_NAME_LENGTH));
    }

    if name.contains('\0') {
        return Err(anyhow::anyhow!("Filename contains null bytes"));
    }

    if name.contains("..") {
        warn!("Path traversal attempt detected: {}", name);
        return Err(anyhow::anyhow!("Path traversal not allowed"));
    }

    if name.contains('/') || name.contains('\\') {
        return Err(anyhow::anyhow!("Filename cannot contain path separators"));
    }

    if name == "." {
        return Err(anyhow::anyhow!("Filename cannot be '.'"));
    }

    if name.chars().any(|ch| ch.is_control()) {
        return Err(anyhow::anyhow!("Filename contains control characters"));
    }

    Ok(())
}

/// Lexically check that `path` is a single file directly below `base`.
///
/// Only the part after `base` is inspected; `base` itself may contain `..`.
pub fn is_within_base(path: &Path, base: &Path) -> bool {
    match path.strip_prefix(base) {
        Ok(rest) => {
            let mut components = rest.components();
            matches!(
                (components.next(), components.next()),
                (Some(Component::Normal(_)), None)
            )
        }
        Err(_) => false,
    }
}

/// Compare two secrets without short-circuiting on the first differing byte
pub fn secrets_match(supplied: &str, expected: &str) -> bool {
    let supplied = supplied.as_bytes();
    let expected = expected.as_bytes();
    if supplied.len() != expected.len() {
        return false;
    }
    supplied
        .iter()
        .zip(expected.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
