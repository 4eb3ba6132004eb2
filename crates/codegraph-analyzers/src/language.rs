//! Extension-to-language mapping (spec §2 "Language detector").

/// Best-effort language tag for a file extension. `None` leaves the file
/// untagged — it still gets a file node, just no `language`.
pub fn detect(extension: &str) -> Option<&'static str> {
    Some(match extension {
        "rs" => "rust",
        "ts" | "tsx" => "typescript",
        "js" | "jsx" | "mjs" | "cjs" => "javascript",
        "py" => "python",
        "go" => "go",
        "java" => "java",
        "rb" => "ruby",
        "c" | "h" => "c",
        "cc" | "cpp" | "cxx" | "hpp" => "cpp",
        "cs" => "csharp",
        "php" => "php",
        "kt" | "kts" => "kotlin",
        "swift" => "swift",
        "scala" => "scala",
        "sh" | "bash" => "shell",
        "toml" => "toml",
        "yaml" | "yml" => "yaml",
        "json" => "json",
        "md" => "markdown",
        _ => return None,
    })
}

/// Naive test-file heuristic used by the file-tree builder's `includeTests`
/// option (spec §6).
pub fn looks_like_test(file_name: &str) -> bool {
    let stem = file_name.rsplit_once('.').map(|(s, _)| s).unwrap_or(file_name);
    stem.ends_with("_test")
        || stem.ends_with(".test")
        || stem.ends_with("_spec")
        || stem.ends_with(".spec")
        || stem.starts_with("test_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_common_extensions() {
        assert_eq!(detect("rs"), Some("rust"));
        assert_eq!(detect("py"), Some("python"));
        assert_eq!(detect("unknown-ext"), None);
    }

    #[test]
    fn test_file_heuristic_matches_common_suffixes() {
        assert!(looks_like_test("user_test.go"));
        assert!(looks_like_test("user.test.ts"));
        assert!(looks_like_test("test_user.py"));
        assert!(!looks_like_test("user.py"));
    }
}
