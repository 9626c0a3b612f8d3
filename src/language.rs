//! Language label handling.
//!
//! Submission pages label the language loosely ("Python3", "C++", a styled
//! dropdown button), so detection is a lower-cased substring match against
//! known keywords. The canonical identifier then picks the file extension
//! for the synced solution.

/// Canonical identifier for a page language label, when recognized.
///
/// Longer keywords are checked before their prefixes so "javascript" does
/// not land on "java".
pub fn canonical(label: &str) -> Option<&'static str> {
    let lower = label.to_lowercase();
    if lower.contains("javascript") {
        Some("javascript")
    } else if lower.contains("typescript") {
        Some("typescript")
    } else if lower.contains("python") {
        Some("python")
    } else if lower.contains("java") {
        Some("java")
    } else if lower.contains("c++") {
        Some("cpp")
    } else if lower.contains("golang") || lower.contains("go") {
        Some("go")
    } else if lower.contains("rust") {
        Some("rust")
    } else {
        None
    }
}

/// File extension for a canonical (or free-form) language identifier.
pub fn extension_for(language: &str) -> &'static str {
    match language.to_lowercase().as_str() {
        "python" | "python3" => "py",
        "java" => "java",
        "cpp" | "c++" => "cpp",
        "javascript" => "js",
        "typescript" => "ts",
        "go" | "golang" => "go",
        "rust" => "rs",
        "c" => "c",
        "csharp" | "c#" => "cs",
        "kotlin" => "kt",
        "swift" => "swift",
        "ruby" => "rb",
        _ => "txt",
    }
}
