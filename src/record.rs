use serde::{Deserialize, Serialize};

/// One solved-problem attempt as captured from a submission page.
///
/// Every field has a non-null default; extraction degrades to the
/// placeholders below instead of failing. Records are never mutated after
/// creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmissionRecord {
    pub problem_title: String,
    pub problem_slug: String,
    pub problem_id: String,
    pub difficulty: Difficulty,
    pub language: String,
    pub code: String,
    pub status: String,
    pub runtime: String,
    pub memory: String,
    /// RFC 3339 creation instant.
    pub timestamp: String,
    /// Source page address.
    pub url: String,
}

impl Default for SubmissionRecord {
    fn default() -> Self {
        SubmissionRecord {
            problem_title: "Unknown Problem".to_string(),
            problem_slug: "unknown".to_string(),
            problem_id: "0".to_string(),
            difficulty: Difficulty::Medium,
            language: "javascript".to_string(),
            code: String::new(),
            status: "Unknown".to_string(),
            runtime: "N/A".to_string(),
            memory: "N/A".to_string(),
            timestamp: String::new(),
            url: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn display_name(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    /// Directory name used by the by-difficulty file layout.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Substring-match a difficulty keyword in page text, e.g. a
    /// "Medium" pill or a "text-difficulty-hard" label.
    pub fn from_keyword(text: &str) -> Option<Difficulty> {
        let lower = text.to_lowercase();
        if lower.contains("easy") {
            Some(Difficulty::Easy)
        } else if lower.contains("medium") {
            Some(Difficulty::Medium)
        } else if lower.contains("hard") {
            Some(Difficulty::Hard)
        } else {
            None
        }
    }
}
