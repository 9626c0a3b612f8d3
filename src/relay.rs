//! The message relay: a single-hop request/response switch keyed by the
//! envelope's type tag.
//!
//! Every request gets exactly one reply. Handler failures of any kind are
//! converted to the uniform `{success: false, error}` shape at this
//! boundary; nothing a handler does can take the relay down.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::dom::Document;
use crate::error::SyncError;
use crate::github::GithubClient;
use crate::page::{self, PageSnapshot, PageWatcher};
use crate::record::SubmissionRecord;
use crate::settings::{self, SyncSettings};

/// A request envelope from the page context or a control surface.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(default)]
    pub data: Value,
}

/// The single reply delivered per request.
#[derive(Debug, Serialize)]
pub struct Reply {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Reply {
    pub fn ok(result: Value) -> Reply {
        Reply {
            success: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Reply {
        Reply {
            success: false,
            result: None,
            error: Some(message.into()),
        }
    }
}

pub struct Relay {
    settings_path: PathBuf,
    api_base: Option<String>,
    watcher: PageWatcher,
}

impl Relay {
    pub fn new() -> Relay {
        Relay {
            settings_path: settings::settings_path(),
            api_base: None,
            watcher: PageWatcher::new(page::SETTLE_DELAY),
        }
    }

    /// Use a different settings file (tests point this at a temp dir).
    pub fn with_settings_path(mut self, path: PathBuf) -> Relay {
        self.settings_path = path;
        self
    }

    /// Route GitHub calls at a different API root.
    pub fn with_api_base(mut self, base: &str) -> Relay {
        self.api_base = Some(base.to_string());
        self
    }

    /// Shorten the navigation settle delay (tests use zero).
    pub fn with_settle(mut self, settle: Duration) -> Relay {
        self.watcher = PageWatcher::new(settle);
        self
    }

    /// Route one envelope to its handler and produce the single reply.
    /// Unknown tags fail immediately with no work started.
    pub fn dispatch(&mut self, envelope: &Envelope) -> Reply {
        log::info!("Received message: {}", envelope.message_type);
        let outcome = match envelope.message_type.as_str() {
            "SYNC_SUBMISSION" => self.sync_submission(&envelope.data),
            "TEST_GITHUB_CONNECTION" => self.test_connection(),
            "EXTRACT_SUBMISSION" => self.extract_submission(&envelope.data),
            "TRIGGER_SYNC" => self.trigger_sync(&envelope.data),
            "PAGE_MUTATION" => self.page_mutation(&envelope.data),
            "GET_SETTINGS" => self.get_settings(),
            "SAVE_SETTINGS" => self.save_settings(&envelope.data),
            "RESET_SETTINGS" => self.reset_settings(),
            other => {
                return Reply::err(format!("Unknown message type: {}", other));
            }
        };
        match outcome {
            Ok(result) => Reply::ok(result),
            Err(e) => {
                log::error!("{} failed: {}", envelope.message_type, e);
                Reply::err(e.to_string())
            }
        }
    }

    fn load_settings(&self) -> Result<SyncSettings, SyncError> {
        settings::load_from(&self.settings_path)
    }

    fn client(&self, loaded: &SyncSettings) -> Result<GithubClient, SyncError> {
        let client = GithubClient::from_settings(loaded)?;
        Ok(match &self.api_base {
            Some(base) => client.with_api_base(base),
            None => client,
        })
    }

    fn sync_submission(&self, data: &Value) -> Result<Value, SyncError> {
        let record: SubmissionRecord = serde_json::from_value(data.clone())?;
        self.sync_record(&record)
    }

    fn sync_record(&self, record: &SubmissionRecord) -> Result<Value, SyncError> {
        let loaded = self.load_settings()?;
        let client = self.client(&loaded)?;
        client.sync_submission(record, loaded.file_structure, loaded.file_naming)
    }

    fn test_connection(&self) -> Result<Value, SyncError> {
        let loaded = self.load_settings()?;
        let info = self.client(&loaded)?.test_connection()?;
        Ok(json!({
            "repositoryFullName": info.full_name,
            "isPrivate": info.private,
        }))
    }

    fn extract_submission(&self, data: &Value) -> Result<Value, SyncError> {
        let snapshot: PageSnapshot = serde_json::from_value(data.clone())?;
        let kind = page::classify(&snapshot.url);
        log::info!("Extracting from {:?} page: {}", kind, snapshot.url);
        let doc = Document::parse(&snapshot.html);
        let record = page::extract(&snapshot.url, &doc);
        Ok(serde_json::to_value(record)?)
    }

    fn trigger_sync(&self, data: &Value) -> Result<Value, SyncError> {
        let snapshot: PageSnapshot = serde_json::from_value(data.clone())?;
        let doc = Document::parse(&snapshot.html);
        let record = page::extract(&snapshot.url, &doc);
        let result = self.sync_record(&record)?;
        Ok(json!({
            "message": "Sync completed",
            "result": result,
        }))
    }

    fn page_mutation(&mut self, data: &Value) -> Result<Value, SyncError> {
        let snapshot: PageSnapshot = serde_json::from_value(data.clone())?;
        Ok(match self.watcher.on_mutation(&snapshot.url) {
            Some(kind) => json!({ "navigated": true, "page": kind }),
            None => json!({ "navigated": false }),
        })
    }

    fn get_settings(&self) -> Result<Value, SyncError> {
        Ok(serde_json::to_value(self.load_settings()?)?)
    }

    fn save_settings(&self, data: &Value) -> Result<Value, SyncError> {
        let incoming: SyncSettings = serde_json::from_value(data.clone())?;
        settings::save_to(&self.settings_path, &incoming)?;
        log::info!("Settings updated");
        Ok(json!({ "saved": true }))
    }

    fn reset_settings(&self) -> Result<Value, SyncError> {
        settings::clear_at(&self.settings_path)?;
        settings::seed_defaults(&self.settings_path)?;
        log::info!("Settings reset to defaults");
        Ok(serde_json::to_value(SyncSettings::default())?)
    }
}

impl Default for Relay {
    fn default() -> Self {
        Relay::new()
    }
}
