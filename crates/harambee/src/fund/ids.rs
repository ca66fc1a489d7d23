//! Sequential, human-readable identifier arithmetic.
//!
//! Pure functions over the set of identifiers already in storage; callers
//! re-check for collisions before inserting and rely on the storage layer's
//! uniqueness constraint to arbitrate races.

/// Prefix and zero-padding width for member identifiers (`HMB-0001`).
pub const MEMBER_ID_PREFIX: &str = "HMB-";
pub const MEMBER_ID_WIDTH: usize = 4;

/// Prefix and zero-padding width for case identifiers (`CASE-001`).
pub const CASE_ID_PREFIX: &str = "CASE-";
pub const CASE_ID_WIDTH: usize = 3;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdError {
    #[error("identifier '{0}' does not match the expected <prefix><number> layout")]
    Malformed(String),
}

/// Parse the numeric suffix of `id`, which must carry `prefix`.
///
/// A matching-prefix identifier with an unparseable suffix is corrupt data;
/// the sequence must not silently restart, so this is an error.
pub fn sequence_value(prefix: &str, id: &str) -> Result<u64, IdError> {
    let suffix = id
        .strip_prefix(prefix)
        .ok_or_else(|| IdError::Malformed(id.to_string()))?;
    suffix
        .parse::<u64>()
        .map_err(|_| IdError::Malformed(id.to_string()))
}

/// Render `value` as `prefix` + zero-padded suffix. Values wider than
/// `width` keep all their digits.
pub fn format_id(prefix: &str, width: usize, value: u64) -> String {
    format!("{prefix}{value:0width$}")
}

/// Compute the next identifier in the sequence: highest existing suffix
/// plus one, or 1 when no identifier carries the prefix yet.
pub fn next_id<'a, I>(prefix: &str, width: usize, existing: I) -> Result<String, IdError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut highest = 0u64;
    for id in existing {
        if !id.starts_with(prefix) {
            continue;
        }
        highest = highest.max(sequence_value(prefix, id)?);
    }

    Ok(format_id(prefix, width, highest + 1))
}
