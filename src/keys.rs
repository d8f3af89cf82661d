use chrono::{DateTime, Utc};

/// Prefix isolating anonymous uploads; backend lifecycle rules expire
/// objects under it.
pub const TEMP_PREFIX: &str = "temp/";

/// Derive the storage key for an upload.
///
/// A client-supplied slug is used verbatim (no sanitization, no collision
/// check — re-uploading a key overwrites it). Without a slug the key is the
/// integer Unix timestamp, so two slugless uploads in the same second land
/// on the same key. Anonymous uploads are always namespaced under `temp/`.
pub fn derive_key(slug: Option<&str>, now: DateTime<Utc>, anonymous: bool) -> String {
    let slug = match slug {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => now.timestamp().to_string(),
    };

    if anonymous {
        format!("{TEMP_PREFIX}{slug}")
    } else {
        slug
    }
}

/// Canonical internal URL a key's edge-cached response is stored under.
///
/// The host is synthetic; it only has to be stable between the retrieval
/// path that fills the cache and the deletion path that evicts it.
pub fn canonical_cache_url(key: &str) -> String {
    format!("https://blob-origin/{key}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    #[test]
    fn slug_is_used_verbatim() {
        assert_eq!(derive_key(Some("cat.png"), at(100), false), "cat.png");
        // No sanitization: embedded slashes pass through.
        assert_eq!(derive_key(Some("a/b"), at(100), false), "a/b");
    }

    #[test]
    fn missing_slug_falls_back_to_timestamp() {
        assert_eq!(derive_key(None, at(1719009115), false), "1719009115");
        assert_eq!(derive_key(Some(""), at(1719009115), false), "1719009115");
    }

    #[test]
    fn anonymous_keys_are_temp_prefixed() {
        assert_eq!(derive_key(Some("cat.png"), at(100), true), "temp/cat.png");
        assert_eq!(derive_key(None, at(42), true), "temp/42");
    }

    #[test]
    fn derivation_is_deterministic() {
        // Same second, no slug: same key. Overwrite-on-collision is the
        // documented behavior.
        assert_eq!(derive_key(None, at(7), true), derive_key(None, at(7), true));
    }

    #[test]
    fn cache_url_includes_full_key() {
        assert_eq!(
            canonical_cache_url("temp/123"),
            "https://blob-origin/temp/123"
        );
    }
}
