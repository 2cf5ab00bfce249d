//! Key-glob matching for bulk invalidation.
//!
//! A deliberately small matcher: `*` matches any run of characters, every
//! other character matches itself. No character classes, no regex
//! conversion. Patterns like `user:*`, `*:profile` and `list:*:page:*`
//! cover the invalidation shapes the cache manager needs.

/// Match `key` against a glob `pattern` where `*` matches any substring.
pub fn matches(pattern: &str, key: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == key;
    }

    let segments: Vec<&str> = pattern.split('*').collect();
    let (first, rest) = segments.split_first().expect("split always yields one");

    if !key.starts_with(first) {
        return false;
    }
    let mut pos = first.len();

    for (i, segment) in rest.iter().enumerate() {
        let is_last = i == rest.len() - 1;
        if segment.is_empty() {
            // Trailing '*' (or '**'): anything goes from here.
            continue;
        }
        if is_last {
            // Final literal must anchor at the end, after everything
            // matched so far.
            return key.len() >= pos + segment.len() && key.ends_with(segment);
        }
        match key[pos..].find(segment) {
            Some(idx) => pos += idx + segment.len(),
            None => return false,
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_without_wildcard() {
        assert!(matches("user:42", "user:42"));
        assert!(!matches("user:42", "user:43"));
    }

    #[test]
    fn test_prefix_and_suffix() {
        assert!(matches("user:*", "user:42"));
        assert!(matches("user:*", "user:"));
        assert!(!matches("user:*", "session:42"));

        assert!(matches("*:profile", "user:42:profile"));
        assert!(!matches("*:profile", "user:42:settings"));
    }

    #[test]
    fn test_infix_wildcard() {
        assert!(matches("user:*:profile", "user:42:profile"));
        assert!(!matches("user:*:profile", "user:42:settings"));
        // The suffix literal must sit after the prefix, not overlap it.
        assert!(!matches("abc*bc", "abc"));
        assert!(matches("abc*bc", "abcxbc"));
    }

    #[test]
    fn test_multiple_wildcards() {
        assert!(matches("list:*:page:*", "list:users:page:3"));
        assert!(matches("a*b*c", "aXbYc"));
        assert!(!matches("a*b*c", "aXcYb"));
    }

    #[test]
    fn test_bare_star_matches_everything() {
        assert!(matches("*", ""));
        assert!(matches("*", "anything:at:all"));
    }
}
