//! Dotted version comparison used by the update check.

use std::cmp::Ordering;

use crate::error::CoreError;

/// Parse a dotted numeric version such as `3.1.20` (a leading `v` is allowed).
///
/// Pre-release suffixes after `-` are ignored for ordering purposes.
pub fn parse_version(raw: &str) -> Result<Vec<u64>, CoreError> {
    let trimmed = raw.trim().trim_start_matches('v');
    let core = trimmed.split('-').next().unwrap_or_default();
    if core.is_empty() {
        return Err(CoreError::Validation(format!("Invalid version '{raw}'")));
    }
    core.split('.')
        .map(|part| {
            part.parse::<u64>()
                .map_err(|_| CoreError::Validation(format!("Invalid version '{raw}'")))
        })
        .collect()
}

/// Compare two dotted versions; missing trailing components count as zero.
pub fn compare_versions(a: &str, b: &str) -> Result<Ordering, CoreError> {
    let a = parse_version(a)?;
    let b = parse_version(b)?;
    let len = a.len().max(b.len());
    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => continue,
            other => return Ok(other),
        }
    }
    Ok(Ordering::Equal)
}
