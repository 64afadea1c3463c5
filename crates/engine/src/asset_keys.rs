use thiserror::Error;

/// Keys name files under a fixed directory (sprites, save slots), so they
/// are restricted to a portable, traversal-free subset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetKeyError {
    #[error("key must not be empty")]
    Empty,
    #[error("key must not start or end with '/'")]
    EdgeSlash,
    #[error("key must not contain '..'")]
    ParentTraversal,
    #[error("key contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

pub(crate) fn validate_asset_key(key: &str) -> Result<(), AssetKeyError> {
    if key.is_empty() {
        return Err(AssetKeyError::Empty);
    }
    if key.starts_with('/') || key.ends_with('/') {
        return Err(AssetKeyError::EdgeSlash);
    }
    if key.contains("..") {
        return Err(AssetKeyError::ParentTraversal);
    }
    match key
        .chars()
        .find(|ch| !(ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '/' | '-')))
    {
        Some(character) => Err(AssetKeyError::InvalidCharacter { character }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_nested_lowercase_keys() {
        for key in ["inventory", "icons/brass_key", "cg/ending-1"] {
            assert_eq!(validate_asset_key(key), Ok(()), "key={key}");
        }
    }

    #[test]
    fn rejects_traversal_and_odd_characters() {
        assert_eq!(validate_asset_key(""), Err(AssetKeyError::Empty));
        assert_eq!(validate_asset_key("/etc"), Err(AssetKeyError::EdgeSlash));
        assert_eq!(validate_asset_key("icons/"), Err(AssetKeyError::EdgeSlash));
        assert_eq!(validate_asset_key("a/../b"), Err(AssetKeyError::ParentTraversal));
        assert_eq!(
            validate_asset_key("Save.json"),
            Err(AssetKeyError::InvalidCharacter { character: 'S' })
        );
        assert_eq!(
            validate_asset_key(r"a\b"),
            Err(AssetKeyError::InvalidCharacter { character: '\\' })
        );
    }
}
