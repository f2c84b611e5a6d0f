//! Path helpers.

/// Turn an opaque identifier into a safe single path component.
///
/// ASCII alphanumerics, `-`, `_` and `.` are kept; everything else becomes
/// `_`. Identifiers that would resolve to the current or parent directory
/// are replaced entirely.
pub fn sanitize_file_stem(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "_".repeat(cleaned.len().max(1))
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_like_ids_pass_through() {
        let id = "3f2b8c1e-9d4a-4b6e-8f00-1a2b3c4d5e6f";
        assert_eq!(sanitize_file_stem(id), id);
    }

    #[test]
    fn test_separators_are_replaced() {
        assert_eq!(sanitize_file_stem("../etc/passwd"), ".._etc_passwd");
        assert_eq!(sanitize_file_stem("a\\b c"), "a_b_c");
    }

    #[test]
    fn test_dot_only_names() {
        assert_eq!(sanitize_file_stem(""), "_");
        assert_eq!(sanitize_file_stem("."), "_");
        assert_eq!(sanitize_file_stem(".."), "__");
    }
}
