//! GitHub contents-API client: connection probe, existence check, and the
//! create-or-update write for synced submissions.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::SyncError;
use crate::language;
use crate::record::SubmissionRecord;
use crate::settings::{FileNaming, FileStructure, SyncSettings};

pub const GITHUB_API: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("leetsync-host/", env!("CARGO_PKG_VERSION"));

/// Repository metadata returned by the connection probe.
#[derive(Debug, Deserialize)]
pub struct RepoInfo {
    pub full_name: String,
    pub private: bool,
}

/// A file that already exists in the target repository. The revision
/// identifier must be echoed back on update and left out on create.
#[derive(Debug, Deserialize)]
pub struct RemoteFile {
    pub sha: String,
    #[serde(default)]
    pub path: String,
}

pub struct GithubClient {
    http: reqwest::blocking::Client,
    api_base: String,
    token: String,
    owner: String,
    repo: String,
    branch: String,
}

impl GithubClient {
    /// Build a client from the settings record, failing with an actionable
    /// config error before any network call when a required field is empty.
    pub fn from_settings(settings: &SyncSettings) -> Result<GithubClient, SyncError> {
        if settings.github_token.trim().is_empty() {
            return Err(SyncError::Config(
                "Missing GitHub token - configure it in the extension options".to_string(),
            ));
        }
        if settings.github_owner.trim().is_empty() {
            return Err(SyncError::Config(
                "Missing GitHub owner - configure it in the extension options".to_string(),
            ));
        }
        if settings.github_repo.trim().is_empty() {
            return Err(SyncError::Config(
                "Missing GitHub repository - configure it in the extension options".to_string(),
            ));
        }
        let branch = if settings.github_branch.trim().is_empty() {
            "main".to_string()
        } else {
            settings.github_branch.trim().to_string()
        };
        Ok(GithubClient {
            http: reqwest::blocking::Client::new(),
            api_base: GITHUB_API.to_string(),
            token: settings.github_token.trim().to_string(),
            owner: settings.github_owner.trim().to_string(),
            repo: settings.github_repo.trim().to_string(),
            branch,
        })
    }

    /// Point the client at a different API root (GitHub Enterprise, or a
    /// local stand-in under test).
    pub fn with_api_base(mut self, base: &str) -> GithubClient {
        self.api_base = base.trim_end_matches('/').to_string();
        self
    }

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response, SyncError> {
        Ok(self.request(self.http.get(url)).send()?)
    }

    fn request(&self, builder: reqwest::blocking::RequestBuilder) -> reqwest::blocking::RequestBuilder {
        builder
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .header("User-Agent", USER_AGENT)
    }

    fn repo_url(&self) -> String {
        format!(
            "{}/repos/{}/{}",
            self.api_base,
            urlencoding::encode(&self.owner),
            urlencoding::encode(&self.repo)
        )
    }

    fn contents_url(&self, path: &str) -> String {
        format!("{}/contents/{}", self.repo_url(), encode_path(path))
    }

    /// One read of the repository metadata, proving the token, owner, and
    /// repository line up.
    pub fn test_connection(&self) -> Result<RepoInfo, SyncError> {
        let response = self.get(&self.repo_url())?;
        let status = response.status();
        if !status.is_success() {
            return Err(remote_error(status.as_u16(), &response.text()?));
        }
        let info: RepoInfo = response.json()?;
        log::info!("Connection test successful: {}", info.full_name);
        Ok(info)
    }

    /// Look up a file on the sync branch. A 404 means the file does not
    /// exist yet; anything else non-success propagates.
    pub fn get_file(&self, path: &str) -> Result<Option<RemoteFile>, SyncError> {
        let url = format!("{}?ref={}", self.contents_url(path), self.branch);
        let response = self.get(&url)?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(remote_error(status.as_u16(), &response.text()?));
        }
        Ok(Some(response.json()?))
    }

    /// Create or update a file. `sha` distinguishes the two: absent on
    /// create, required on update.
    pub fn put_file(
        &self,
        path: &str,
        message: &str,
        content_b64: &str,
        sha: Option<&str>,
    ) -> Result<Value, SyncError> {
        let body = write_body(message, content_b64, &self.branch, sha);
        let response = self
            .request(self.http.put(&self.contents_url(path)))
            .json(&body)
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(remote_error(status.as_u16(), &response.text()?));
        }
        Ok(response.json()?)
    }

    /// The whole sync handshake: derive the target path, check whether the
    /// file already exists, then write it with or without the revision
    /// identifier. Returns the remote response verbatim.
    pub fn sync_submission(
        &self,
        record: &SubmissionRecord,
        structure: FileStructure,
        naming: FileNaming,
    ) -> Result<Value, SyncError> {
        let path = target_path(record, structure, naming);
        let existing = self.get_file(&path)?;
        let message = commit_message(record, existing.is_some());
        let content = BASE64.encode(record.code.as_bytes());
        let sha = existing.as_ref().map(|f| f.sha.as_str());
        log::info!(
            "Syncing {} to {}/{}:{} ({})",
            path,
            self.owner,
            self.repo,
            self.branch,
            if sha.is_some() { "update" } else { "create" }
        );
        self.put_file(&path, &message, &content, sha)
    }
}

/// Target path for a record under the configured layout policies.
pub fn target_path(
    record: &SubmissionRecord,
    structure: FileStructure,
    naming: FileNaming,
) -> String {
    let slug = sanitize_stem(&record.problem_slug);
    let stem = match naming {
        FileNaming::ProblemName => slug,
        FileNaming::IdAndName => format!("{}-{}", sanitize_stem(&record.problem_id), slug),
    };
    let file = format!("{}.{}", stem, language::extension_for(&record.language));
    match structure {
        FileStructure::ByDifficulty => format!("{}/{}", record.difficulty.dir_name(), file),
        FileStructure::ByLanguage => {
            let dir = language::canonical(&record.language)
                .map(str::to_string)
                .unwrap_or_else(|| sanitize_stem(&record.language.to_lowercase()));
            format!("{}/{}", dir, file)
        }
        FileStructure::Flat => file,
    }
}

/// Commit message for a synced record.
pub fn commit_message(record: &SubmissionRecord, update: bool) -> String {
    format!(
        "{} {} ({})",
        if update { "Update" } else { "Add" },
        record.problem_title,
        record.difficulty.display_name()
    )
}

/// JSON body for a contents write. The revision identifier is present only
/// when updating an existing file.
pub fn write_body(message: &str, content_b64: &str, branch: &str, sha: Option<&str>) -> Value {
    let mut body = json!({
        "message": message,
        "content": content_b64,
        "branch": branch,
    });
    if let Some(sha) = sha {
        body["sha"] = json!(sha);
    }
    body
}

/// Keep path stems to a safe character set; everything else becomes a dash.
fn sanitize_stem(s: &str) -> String {
    let cleaned: String = s
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('-').to_string();
    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}

/// Percent-encode each path segment, keeping the separators.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|seg| urlencoding::encode(seg).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Convert a non-success response into a remote error, preferring the
/// remote-supplied message when the body parses.
fn remote_error(status: u16, body: &str) -> SyncError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| format!("request failed with status {}", status));
    SyncError::Remote { status, message }
}
