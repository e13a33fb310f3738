//! Durable submission session.
//!
//! The browser original kept its last churn result, last published id, and
//! live match buffer in free-floating page globals. Here that state is an
//! explicit [`Session`] value owned by the application and persisted between
//! invocations, so `publish`, `open`, and `live` can refer back to an
//! earlier `churn`.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tempfile::NamedTempFile;

use crate::{ChurnError, ChurnResult, IdeaDraft, LiveBuffer, Result};

/// State carried from one invocation to the next
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// The draft behind the last successful submission
    pub draft: Option<IdeaDraft>,
    /// The last successful churn result
    pub last: Option<ChurnResult>,
    /// Identifier of the last published copy, server-assigned when available
    pub published_id: Option<String>,
    /// Recent matches across submissions, newest first
    pub live: LiveBuffer,
    pub saved_at: DateTime<Utc>,
}

impl Default for Session {
    fn default() -> Self {
        Session {
            draft: None,
            last: None,
            published_id: None,
            live: LiveBuffer::default(),
            saved_at: Utc::now(),
        }
    }
}

impl Session {
    /// Records a successful submission: the draft and result replace any
    /// prior ones, the published id is invalidated, and the result's matches
    /// feed the live buffer.
    pub fn record_churn(&mut self, draft: IdeaDraft, result: ChurnResult) {
        self.live.push(&result.matches);
        self.draft = Some(draft);
        self.last = Some(result);
        self.published_id = None;
    }

    /// Whether a publish is currently possible
    pub fn can_publish(&self) -> bool {
        self.draft.is_some()
            && self
                .last
                .as_ref()
                .map(|r| !r.idea_id.is_empty())
                .unwrap_or(false)
    }

    /// Builds the publish request body, refusing when no prior submission
    /// with a non-empty idea id exists. No network activity happens here.
    pub fn publish_body(&self) -> Result<Value> {
        let (draft, result) = match (&self.draft, &self.last) {
            (Some(d), Some(r)) => (d, r),
            _ => {
                return Err(ChurnError::precondition(
                    "Nothing to publish yet. Submit an idea with `churchen churn` first.",
                ))
            }
        };
        if result.idea_id.is_empty() {
            return Err(ChurnError::precondition(
                "The last submission carried no idea id; nothing to publish.",
            ));
        }
        Ok(json!({
            "ideaId": result.idea_id,
            "text": draft.text,
            "tags": draft.tags,
            "abstract": draft.abstract_text(),
        }))
    }

    /// Resolves the idea id for the open flow: an explicit id, else the last
    /// published id, else the last submission's id.
    pub fn open_candidate_id(&self, explicit: Option<String>) -> Result<String> {
        explicit
            .filter(|s| !s.is_empty())
            .or_else(|| self.published_id.clone())
            .or_else(|| {
                self.last
                    .as_ref()
                    .map(|r| r.idea_id.clone())
                    .filter(|s| !s.is_empty())
            })
            .ok_or_else(|| {
                ChurnError::precondition("No idea id known. Pass one or submit an idea first.")
            })
    }

    /// Synthesizes a local JSON document from known session fields when no
    /// server copy could be fetched. Carries an explicit marker so it cannot
    /// be mistaken for a genuine server record.
    pub fn local_fallback_doc(&self, id: &str) -> Value {
        json!({
            "source": "local-fallback",
            "note": "synthesized from local session state; not a server record",
            "idea": {
                "id": id,
                "text": self.draft.as_ref().map(|d| d.text.clone()),
                "tags": self.draft.as_ref().map(|d| d.tags.clone()),
                "abstract": self.draft.as_ref().map(|d| d.abstract_text()),
                "hash": self.last.as_ref().and_then(|r| r.hash.clone()),
            },
            "savedAt": self.saved_at.to_rfc3339(),
        })
    }
}

/// Loads and saves the session file
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Self {
        SessionStore { path }
    }

    /// Loads the stored session. A missing file yields a fresh session; a
    /// corrupt one is logged and discarded rather than failing the command.
    pub fn load(&self) -> Session {
        match fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(session) => session,
                Err(e) => {
                    warn!(
                        "Session file {} is corrupt ({}), starting fresh",
                        self.path.display(),
                        e
                    );
                    Session::default()
                }
            },
            Err(_) => {
                debug!("No session file at {}", self.path.display());
                Session::default()
            }
        }
    }

    /// Saves the session atomically, stamping `saved_at`.
    pub fn save(&self, session: &mut Session) -> Result<()> {
        session.saved_at = Utc::now();

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|_| ChurnError::DirectoryError {
                path: dir.to_path_buf(),
            })?;
        }

        let mut temp_file = NamedTempFile::new_in(dir)?;
        let json = serde_json::to_string_pretty(session)?;
        temp_file.write_all(json.as_bytes())?;
        temp_file
            .persist(&self.path)
            .map_err(|e| ChurnError::Io(e.error))?;

        debug!("Session persisted to {}", self.path.display());
        Ok(())
    }

    /// Removes the stored session, if any.
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn session_with_result(idea_id: &str) -> Session {
        let mut session = Session::default();
        let draft = IdeaDraft::new("solar kites", Some("energy, kites".to_string())).unwrap();
        let result = ChurnResult::from_response(&json!({
            "ideaId": idea_id,
            "hash": "h1",
            "matches": [{ "who": "A", "title": "Kite power", "score": 0.8, "id": "m1" }]
        }))
        .unwrap();
        session.record_churn(draft, result);
        session
    }

    #[test]
    fn test_record_churn_enables_publish_and_feeds_live() {
        let session = session_with_result("id1");
        assert!(session.can_publish());
        assert_eq!(session.live.entries()[0].id.as_deref(), Some("m1"));
    }

    #[test]
    fn test_publish_body_matches_contract() {
        // Scenario: publishing the "solar kites" submission.
        let session = session_with_result("id1");
        let body = session.publish_body().unwrap();
        assert_eq!(
            body,
            json!({
                "ideaId": "id1",
                "text": "solar kites",
                "tags": ["energy", "kites"],
                "abstract": "solar kites",
            })
        );
    }

    #[test]
    fn test_publish_refused_without_prior_result() {
        let session = Session::default();
        assert!(!session.can_publish());
        let err = session.publish_body().unwrap_err();
        assert!(matches!(err, ChurnError::Precondition { .. }));
    }

    #[test]
    fn test_publish_refused_on_empty_idea_id() {
        let session = session_with_result("");
        assert!(!session.can_publish());
        let err = session.publish_body().unwrap_err();
        assert!(matches!(err, ChurnError::Precondition { .. }));
    }

    #[test]
    fn test_open_candidate_id_preference_order() {
        let mut session = session_with_result("id1");
        assert_eq!(session.open_candidate_id(None).unwrap(), "id1");

        session.published_id = Some("srv1".to_string());
        assert_eq!(session.open_candidate_id(None).unwrap(), "srv1");
        assert_eq!(
            session.open_candidate_id(Some("explicit".to_string())).unwrap(),
            "explicit"
        );

        let empty = Session::default();
        assert!(matches!(
            empty.open_candidate_id(None).unwrap_err(),
            ChurnError::Precondition { .. }
        ));
    }

    #[test]
    fn test_local_fallback_doc_is_labeled() {
        let session = session_with_result("id1");
        let doc = session.local_fallback_doc("id1");
        assert_eq!(doc["source"], "local-fallback");
        assert_eq!(doc["idea"]["id"], "id1");
        assert_eq!(doc["idea"]["text"], "solar kites");
    }

    #[test]
    fn test_store_roundtrip_and_missing_file() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));

        // Missing file loads a fresh session.
        assert!(store.load().last.is_none());

        let mut session = session_with_result("id1");
        store.save(&mut session).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.last.unwrap().idea_id, "id1");
        assert_eq!(loaded.live.len(), 1);

        store.clear().unwrap();
        assert!(store.load().last.is_none());
    }

    #[test]
    fn test_corrupt_store_starts_fresh() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{ not json").unwrap();
        let store = SessionStore::new(path);
        assert!(store.load().last.is_none());
    }
}
