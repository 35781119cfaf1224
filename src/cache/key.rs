//! Composite Key Module
//!
//! Builds and parses the `group:subKey` storage keys.

use std::fmt;

use crate::error::{CacheError, Result};

/// Separator between group and sub-key in a storage key.
pub const KEY_DELIMITER: char = ':';

/// Separator used by configuration property paths.
pub const PROPERTY_SEPARATOR: char = '.';

// == Composite Key ==
/// A validated storage key made of a group and an optional sub-key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeKey {
    key: String,
    /// Byte offset of the delimiter, None for group-only keys
    split: Option<usize>,
}

impl CompositeKey {
    /// Builds `group:sub_key`.
    ///
    /// Both parts must be non-empty and free of the delimiter.
    pub fn new(group: &str, sub_key: &str) -> Result<Self> {
        validate_part("group", group)?;
        validate_part("sub-key", sub_key)?;

        let mut key = String::with_capacity(group.len() + 1 + sub_key.len());
        key.push_str(group);
        key.push(KEY_DELIMITER);
        key.push_str(sub_key);

        Ok(Self {
            key,
            split: Some(group.len()),
        })
    }

    /// Builds a group-only key; the group is used verbatim.
    pub fn group(group: &str) -> Result<Self> {
        validate_part("group", group)?;
        Ok(Self {
            key: group.to_string(),
            split: None,
        })
    }

    /// Parses a stored key back into its parts.
    ///
    /// Splits on the first delimiter; a key without one is group-only.
    pub fn parse(key: &str) -> Result<Self> {
        match key.split_once(KEY_DELIMITER) {
            Some((group, sub_key)) => Self::new(group, sub_key),
            None => Self::group(key),
        }
    }

    /// The group portion, or the whole key for group-only keys.
    pub fn group_part(&self) -> &str {
        match self.split {
            Some(index) => &self.key[..index],
            None => &self.key,
        }
    }

    /// The sub-key portion, if any.
    pub fn sub_key(&self) -> Option<&str> {
        self.split.map(|index| &self.key[index + 1..])
    }

    /// The storage key as stored in the cache.
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Consumes the key, returning the storage string.
    pub fn into_string(self) -> String {
        self.key
    }

    /// The key in configuration property form (`group.subKey`).
    pub fn property_path(&self) -> String {
        to_property_path(&self.key)
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

impl AsRef<str> for CompositeKey {
    fn as_ref(&self) -> &str {
        &self.key
    }
}

/// Replaces every key delimiter with the property separator.
pub fn to_property_path(key: &str) -> String {
    key.replace(KEY_DELIMITER, &PROPERTY_SEPARATOR.to_string())
}

fn validate_part(name: &str, part: &str) -> Result<()> {
    if part.is_empty() {
        return Err(CacheError::InvalidKey(format!("{} must not be empty", name)));
    }
    if part.contains(KEY_DELIMITER) {
        return Err(CacheError::InvalidKey(format!(
            "{} '{}' must not contain '{}'",
            name, part, KEY_DELIMITER
        )));
    }
    Ok(())
}
