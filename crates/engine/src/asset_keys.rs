use thiserror::Error;

/// Logical asset keys are relative, slash-separated paths such as
/// `entities/player/idle` or `tiles/grass`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetKeyError {
    #[error("asset key must not be empty")]
    Empty,
    #[error("asset key must not start with '/'")]
    LeadingSlash,
    #[error("asset key must not end with '/'")]
    TrailingSlash,
    #[error("asset key must not contain '\\\\'")]
    Backslash,
    #[error("asset key must not contain '..'")]
    ParentTraversal,
    #[error("asset key contains an empty path segment")]
    EmptySegment,
    #[error("asset key contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

pub fn validate_asset_key(key: &str) -> Result<(), AssetKeyError> {
    if key.is_empty() {
        return Err(AssetKeyError::Empty);
    }
    if key.starts_with('/') {
        return Err(AssetKeyError::LeadingSlash);
    }
    if key.ends_with('/') {
        return Err(AssetKeyError::TrailingSlash);
    }
    if key.contains('\\') {
        return Err(AssetKeyError::Backslash);
    }
    if key.contains("..") {
        return Err(AssetKeyError::ParentTraversal);
    }
    if key.split('/').any(str::is_empty) {
        return Err(AssetKeyError::EmptySegment);
    }
    for ch in key.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '/' | '-' | '.') {
            continue;
        }
        return Err(AssetKeyError::InvalidCharacter { character: ch });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_image_and_directory_keys() {
        for key in [
            "background.png",
            "tiles/large_decor",
            "entities/enemy/run",
            "particles/leaf",
        ] {
            assert!(validate_asset_key(key).is_ok(), "key={key}");
        }
    }

    #[test]
    fn rejects_escaping_or_malformed_keys() {
        assert_eq!(validate_asset_key(""), Err(AssetKeyError::Empty));
        assert_eq!(validate_asset_key("/tiles"), Err(AssetKeyError::LeadingSlash));
        assert_eq!(validate_asset_key("tiles/"), Err(AssetKeyError::TrailingSlash));
        assert_eq!(
            validate_asset_key("tiles/../secret"),
            Err(AssetKeyError::ParentTraversal)
        );
        assert_eq!(validate_asset_key("tiles//grass"), Err(AssetKeyError::EmptySegment));
        assert_eq!(validate_asset_key(r"tiles\grass"), Err(AssetKeyError::Backslash));
        assert_eq!(
            validate_asset_key("Tiles"),
            Err(AssetKeyError::InvalidCharacter { character: 'T' })
        );
    }
}
