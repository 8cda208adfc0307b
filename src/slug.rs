//! Slug generation and validation
//!
//! Generated slugs are drawn uniformly from a base62 alphabet. Uniqueness is
//! not checked here; the store's UNIQUE constraint decides, and callers retry
//! with a fresh slug on conflict.

use rand::RngExt;
use thiserror::Error;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

pub const MAX_SLUG_LENGTH: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("Slug cannot be empty")]
    Empty,
    #[error("Slug must be at most {MAX_SLUG_LENGTH} characters")]
    TooLong,
    #[error("Slug may only contain letters, digits, '-' and '_'")]
    InvalidCharacter,
}

/// Generate a random base62 slug of the given length
pub fn generate_slug(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Check that a caller-supplied slug is safe to use as a single path segment
pub fn validate_slug(slug: &str) -> Result<(), SlugError> {
    if slug.is_empty() {
        return Err(SlugError::Empty);
    }
    if slug.len() > MAX_SLUG_LENGTH {
        return Err(SlugError::TooLong);
    }
    if !slug
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        return Err(SlugError::InvalidCharacter);
    }
    Ok(())
}
