//! Page classification, submission extraction, and navigation watching.
//!
//! The content script captures the current address and markup and ships them
//! over the relay; everything here operates on those snapshots, so the same
//! code runs against fixture documents in tests.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::dom::{Document, Probe};
use crate::language;
use crate::record::{Difficulty, SubmissionRecord};

/// How long client-side navigation gets to finish rendering before a changed
/// page is re-classified.
pub const SETTLE_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PageKind {
    Submission,
    Problem,
    Other,
}

/// A captured page: current address plus the document markup at capture time.
#[derive(Debug, Clone, Deserialize)]
pub struct PageSnapshot {
    pub url: String,
    #[serde(default)]
    pub html: String,
}

/// Classify an address: submission-detail pages, problem-slug-only pages,
/// everything else.
pub fn classify(url: &str) -> PageKind {
    if url.contains("/submissions/detail/") {
        PageKind::Submission
    } else if is_problem_url(url) {
        PageKind::Problem
    } else {
        PageKind::Other
    }
}

/// `leetcode.com/problems/<slug>` with at most one trailing slash and no
/// query or fragment.
fn is_problem_url(url: &str) -> bool {
    let rest = match url.split_once("leetcode.com/problems/") {
        Some((_, rest)) => rest,
        None => return false,
    };
    if rest.contains('?') || rest.contains('#') {
        return false;
    }
    let rest = rest.strip_suffix('/').unwrap_or(rest);
    !rest.is_empty() && !rest.contains('/')
}

const TITLE_PROBES: &[Probe] = &[
    Probe::AttrEquals("data-cy", "question-title"),
    Probe::TagAttrContains("a", "href", "/problems/"),
    Probe::HasClass("text-title-large"),
];

const DIFFICULTY_PROBES: &[Probe] = &[
    Probe::AttrContains("class", "diff"),
    Probe::HasClass("text-difficulty-easy"),
    Probe::HasClass("text-difficulty-medium"),
    Probe::HasClass("text-difficulty-hard"),
];

const CODE_PROBES: &[Probe] = &[
    Probe::TagAttrContains("code", "class", "language"),
    Probe::Tag("pre"),
    Probe::AttrContains("class", "monaco-editor"),
];

const LANGUAGE_PROBES: &[Probe] = &[
    Probe::AttrContains("class", "lang"),
    Probe::TagAttrContains("button", "id", "lang"),
];

const STATUS_PROBES: &[Probe] = &[
    Probe::AttrContains("class", "accepted"),
    Probe::HasClass("text-green-500"),
];

const RUNTIME_PROBE: Probe = Probe::AttrContains("class", "runtime");
const MEMORY_PROBE: Probe = Probe::AttrContains("class", "memory");

/// Extract a submission record from a captured page.
///
/// Best-effort with no failure mode: each field falls through an ordered
/// probe chain and lands on its documented placeholder when nothing matches.
pub fn extract(url: &str, doc: &Document) -> SubmissionRecord {
    let defaults = SubmissionRecord::default();

    let problem_slug = slug_from_url(url).unwrap_or(defaults.problem_slug);
    let problem_id = submission_id_from_url(url).unwrap_or(defaults.problem_id);

    let problem_title = doc
        .first_text(TITLE_PROBES)
        .map(|t| strip_ordinal(&t))
        .unwrap_or(defaults.problem_title);

    let difficulty = doc
        .first_text(DIFFICULTY_PROBES)
        .and_then(|t| Difficulty::from_keyword(&t))
        .unwrap_or(defaults.difficulty);

    let code = CODE_PROBES
        .iter()
        .find_map(|p| doc.select_raw_text(p))
        .unwrap_or(defaults.code);

    let language = doc
        .first_text(LANGUAGE_PROBES)
        .and_then(|t| language::canonical(&t).map(str::to_string))
        .unwrap_or(defaults.language);

    let status = if STATUS_PROBES.iter().any(|p| doc.exists(p)) {
        "Accepted".to_string()
    } else {
        defaults.status
    };

    let runtime = doc.select_text(&RUNTIME_PROBE).unwrap_or(defaults.runtime);
    let memory = doc.select_text(&MEMORY_PROBE).unwrap_or(defaults.memory);

    SubmissionRecord {
        problem_title,
        problem_slug,
        problem_id,
        difficulty,
        language,
        code,
        status,
        runtime,
        memory,
        timestamp: Utc::now().to_rfc3339(),
        url: url.to_string(),
    }
}

/// Problem slug from the address: the segment after `/problems/`.
fn slug_from_url(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("/problems/")?;
    let slug: String = rest
        .chars()
        .take_while(|c| !matches!(c, '/' | '?' | '#'))
        .collect();
    if slug.is_empty() {
        None
    } else {
        Some(slug)
    }
}

/// Numeric id from a `/submissions/<digits>` address segment.
fn submission_id_from_url(url: &str) -> Option<String> {
    let mut rest = url;
    while let Some((_, tail)) = rest.split_once("/submissions/") {
        let id: String = tail.chars().take_while(|c| c.is_ascii_digit()).collect();
        if !id.is_empty() {
            return Some(id);
        }
        rest = tail;
    }
    None
}

/// Drop a leading ordinal prefix: "1. Two Sum" becomes "Two Sum".
fn strip_ordinal(title: &str) -> String {
    let trimmed = title.trim_start();
    let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        if let Some(rest) = trimmed[digits..].strip_prefix('.') {
            return rest.trim_start().to_string();
        }
    }
    title.to_string()
}

/// One notification per DOM mutation batch, carrying the address at the time
/// of the mutation. `None` ends the watch (page unload). The browser-side
/// observer is out of reach here, so the feed is the seam tests script.
pub trait MutationFeed {
    fn next_mutation(&mut self) -> Option<String>;
}

/// Tracks the last observed address across mutation notifications and
/// re-classifies after navigation settles.
pub struct PageWatcher {
    last_url: Option<String>,
    settle: Duration,
}

impl PageWatcher {
    pub fn new(settle: Duration) -> PageWatcher {
        PageWatcher {
            last_url: None,
            settle,
        }
    }

    /// Feed one mutation notification. Returns the re-classified page when
    /// the address changed since the last notification, after waiting out
    /// the settle delay; `None` when the address is unchanged.
    pub fn on_mutation(&mut self, url: &str) -> Option<PageKind> {
        if self.last_url.as_deref() == Some(url) {
            return None;
        }
        if let Some(last) = &self.last_url {
            log::info!("Page navigation detected: {} -> {}", last, url);
        }
        self.last_url = Some(url.to_string());
        if !self.settle.is_zero() {
            std::thread::sleep(self.settle);
        }
        Some(classify(url))
    }
}

/// Watch a mutation feed until it ends, reporting each settled navigation.
pub fn watch<F>(mut feed: F, mut on_page: impl FnMut(&str, PageKind))
where
    F: MutationFeed,
{
    let mut watcher = PageWatcher::new(SETTLE_DELAY);
    while let Some(url) = feed.next_mutation() {
        if let Some(kind) = watcher.on_mutation(&url) {
            on_page(&url, kind);
        }
    }
}
