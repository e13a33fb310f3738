//! Core data structures for the churchen client.
//!
//! This module contains the idea draft plus the decoded forms of every
//! backend response the client consumes. The backend is known to answer in
//! several near-equivalent shapes (`ai.answer` vs. `answer` vs. `ai.text`),
//! so all decoding funnels through constructors here that normalize those
//! variants into one canonical type and reject anything unrecognizable.

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{abstract_of, parse_tags, ChurnError, Result};

/// Number of characters of idea text sent as the publish abstract.
pub const ABSTRACT_CHARS: usize = 160;

/// An idea as entered by the user, before submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdeaDraft {
    /// Trimmed idea text
    pub text: String,
    /// Tags in entry order, duplicates kept
    pub tags: Vec<String>,
}

impl IdeaDraft {
    /// Creates a draft from raw form-style input.
    ///
    /// The text is trimmed and must be non-empty; tags are split on commas,
    /// trimmed, and empties dropped. Fails before any network activity.
    pub fn new(text: &str, tags: Option<String>) -> Result<Self> {
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(ChurnError::precondition("Please enter idea text."));
        }
        Ok(IdeaDraft {
            text,
            tags: parse_tags(tags),
        })
    }

    /// Request body for the churn endpoint
    pub fn churn_body(&self) -> Value {
        json!({ "text": self.text, "tags": self.tags })
    }

    /// First 160 characters of the text, sent as the publish abstract
    pub fn abstract_text(&self) -> String {
        abstract_of(&self.text, ABSTRACT_CHARS)
    }
}

/// A single similarity match returned by the churn endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Match {
    pub who: Option<String>,
    pub title: Option<String>,
    pub tags: Vec<String>,
    pub source: Option<String>,
    /// Similarity score in [0, 1] when the backend provides one
    pub score: Option<f64>,
    pub id: Option<String>,
}

/// AI usage metadata attached to a churn response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AiInfo {
    pub used: bool,
    pub model: Option<String>,
    pub text: Option<String>,
    pub answer: Option<String>,
    pub error: Option<String>,
}

/// Where a rendered answer came from.
///
/// The backend delivers the answer under several field names; the decoder
/// records which one actually supplied it instead of silently falling
/// through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerSource {
    /// `ai.answer`
    Ai,
    /// top-level `answer`
    TopLevel,
    /// `ai.text`
    AiText,
    /// No answer field at all; synthesized from the best match title
    TopMatch,
}

/// A normalized answer with its provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub source: AnswerSource,
}

/// A reference rendered alongside the answer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Reference {
    pub title: Option<String>,
    pub url: Option<String>,
    pub snippet: Option<String>,
}

impl Reference {
    fn from_value(v: &Value) -> Self {
        // Link field drifts across backend versions: url, href, or link.
        let url = ["url", "href", "link"]
            .iter()
            .find_map(|k| v[*k].as_str())
            .map(|s| s.to_string());
        Reference {
            title: v["title"].as_str().map(|s| s.to_string()),
            url,
            snippet: v["snippet"].as_str().map(|s| s.to_string()),
        }
    }
}

/// The decoded result of one idea submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChurnResult {
    /// Identifier assigned by the backend; may be empty, in which case
    /// publishing is refused
    pub idea_id: String,
    pub hash: Option<String>,
    pub matches: Vec<Match>,
    pub ai: Option<AiInfo>,
    pub answer: Option<Answer>,
    pub refs: Vec<Reference>,
}

impl ChurnResult {
    /// Decodes a churn response payload, normalizing the accepted shape
    /// variants into one canonical result.
    ///
    /// A payload that is not a JSON object, or an object carrying none of
    /// the known fields, is rejected as an unrecognized shape.
    pub fn from_response(data: &Value) -> Result<Self> {
        let obj = data
            .as_object()
            .ok_or_else(|| ChurnError::UnrecognizedResponse {
                message: "churn response is not a JSON object".to_string(),
            })?;

        if !["ideaId", "matches", "ai", "answer"]
            .iter()
            .any(|k| obj.contains_key(*k))
        {
            let keys = obj.keys().cloned().collect::<Vec<_>>().join(", ");
            return Err(ChurnError::UnrecognizedResponse {
                message: format!("churn response has no known fields (saw: {})", keys),
            });
        }

        let idea_id = data["ideaId"].as_str().unwrap_or("").to_string();
        let hash = data["hash"].as_str().map(|s| s.to_string());

        let matches: Vec<Match> = data["matches"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| match serde_json::from_value(item.clone()) {
                        Ok(m) => Some(m),
                        Err(e) => {
                            debug!("Skipping undecodable match entry: {}", e);
                            None
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        let ai: Option<AiInfo> = obj
            .get("ai")
            .filter(|v| v.is_object())
            .and_then(|v| serde_json::from_value(v.clone()).ok());

        let answer = Self::pick_answer(data, ai.as_ref(), &matches);

        // References drift too: refs, ai.refs, or just the matches
        let refs = data["refs"]
            .as_array()
            .or_else(|| data["ai"]["refs"].as_array())
            .map(|items| items.iter().map(Reference::from_value).collect())
            .unwrap_or_else(|| {
                matches
                    .iter()
                    .map(|m| Reference {
                        title: m.title.clone(),
                        url: None,
                        snippet: m.source.clone(),
                    })
                    .collect()
            });

        Ok(ChurnResult {
            idea_id,
            hash,
            matches,
            ai,
            answer,
            refs,
        })
    }

    /// Answer precedence: `ai.answer`, top-level `answer`, `ai.text`, then
    /// a synthesized line naming the best match.
    fn pick_answer(data: &Value, ai: Option<&AiInfo>, matches: &[Match]) -> Option<Answer> {
        if let Some(text) = ai.and_then(|a| a.answer.clone()).filter(|s| !s.is_empty()) {
            return Some(Answer {
                text,
                source: AnswerSource::Ai,
            });
        }
        if let Some(text) = data["answer"].as_str().filter(|s| !s.is_empty()) {
            return Some(Answer {
                text: text.to_string(),
                source: AnswerSource::TopLevel,
            });
        }
        if let Some(text) = ai.and_then(|a| a.text.clone()).filter(|s| !s.is_empty()) {
            return Some(Answer {
                text,
                source: AnswerSource::AiText,
            });
        }
        if let Some(title) = matches
            .first()
            .and_then(|m| m.title.clone())
            .filter(|s| !s.is_empty())
        {
            return Some(Answer {
                text: format!("No AI answer; closest match: {}", title),
                source: AnswerSource::TopMatch,
            });
        }
        None
    }

    /// Whether the backend reported spending an AI answer on this result
    pub fn ai_used(&self) -> bool {
        self.ai.as_ref().map(|a| a.used).unwrap_or(false)
    }
}

/// The decoded result of a publish call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishReceipt {
    pub ok: bool,
    /// Identifier the server assigned to the published copy, when returned
    pub id: Option<String>,
}

impl PublishReceipt {
    pub fn from_response(data: &Value) -> Self {
        PublishReceipt {
            ok: data["ok"].as_bool().unwrap_or(false),
            id: data["idea"]["id"].as_str().map(|s| s.to_string()),
        }
    }
}

/// One published idea as listed by the feed endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: String,
    /// Idea text or server-side abstract, whichever the feed carries
    pub text: String,
    pub tags: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl FeedItem {
    fn from_value(v: &Value) -> Self {
        let text = v["text"]
            .as_str()
            .or_else(|| v["abstract"].as_str())
            .unwrap_or("")
            .to_string();
        let tags = v["tags"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|t| t.as_str().map(|s| s.to_string()))
                    .collect()
            })
            .unwrap_or_default();
        let created_at = v["createdAt"]
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));
        FeedItem {
            id: v["id"].as_str().unwrap_or("").to_string(),
            text,
            tags,
            created_at,
        }
    }

    /// Decodes a feed response: `{items: [...]}` or a bare array.
    pub fn list_from_response(data: &Value) -> Result<Vec<FeedItem>> {
        let items = data["items"]
            .as_array()
            .or_else(|| data.as_array())
            .ok_or_else(|| ChurnError::UnrecognizedResponse {
                message: "feed response has no items array".to_string(),
            })?;
        Ok(items.iter().map(FeedItem::from_value).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_trims_text_and_parses_tags() {
        let draft = IdeaDraft::new("  solar kites ", Some("energy, kites".to_string())).unwrap();
        assert_eq!(draft.text, "solar kites");
        assert_eq!(draft.tags, vec!["energy", "kites"]);
        assert_eq!(
            draft.churn_body(),
            json!({ "text": "solar kites", "tags": ["energy", "kites"] })
        );
    }

    #[test]
    fn test_draft_refuses_empty_text() {
        let err = IdeaDraft::new("   ", None).unwrap_err();
        assert!(matches!(err, ChurnError::Precondition { .. }));
    }

    #[test]
    fn test_draft_abstract_is_first_160_chars() {
        let short = IdeaDraft::new("solar kites", None).unwrap();
        assert_eq!(short.abstract_text(), "solar kites");

        let long = IdeaDraft::new(&"x".repeat(300), None).unwrap();
        assert_eq!(long.abstract_text().len(), ABSTRACT_CHARS);
    }

    #[test]
    fn test_churn_result_fallback_answer_references_top_match() {
        // Scenario: churn succeeds with a match but no AI answer fields.
        let data = json!({
            "ideaId": "id1",
            "hash": "h1",
            "matches": [{ "who": "A", "title": "Kite power", "score": 0.8, "id": "m1" }]
        });
        let result = ChurnResult::from_response(&data).unwrap();
        assert_eq!(result.idea_id, "id1");
        assert_eq!(result.hash.as_deref(), Some("h1"));
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].id.as_deref(), Some("m1"));

        let answer = result.answer.unwrap();
        assert_eq!(answer.source, AnswerSource::TopMatch);
        assert!(answer.text.contains("Kite power"));

        // No refs field: matches stand in as references.
        assert_eq!(result.refs.len(), 1);
        assert_eq!(result.refs[0].title.as_deref(), Some("Kite power"));
    }

    #[test]
    fn test_answer_precedence_prefers_ai_answer() {
        let data = json!({
            "ideaId": "id1",
            "answer": "top",
            "ai": { "used": true, "answer": "from ai", "text": "ai text" },
            "matches": [{ "title": "t" }]
        });
        let result = ChurnResult::from_response(&data).unwrap();
        let answer = result.answer.as_ref().unwrap();
        assert_eq!(answer.source, AnswerSource::Ai);
        assert_eq!(answer.text, "from ai");
        assert!(result.ai_used());
    }

    #[test]
    fn test_answer_precedence_top_level_then_ai_text() {
        let data = json!({ "ideaId": "x", "answer": "top", "ai": { "text": "ai text" } });
        let answer = ChurnResult::from_response(&data).unwrap().answer.unwrap();
        assert_eq!(answer.source, AnswerSource::TopLevel);
        assert_eq!(answer.text, "top");

        let data = json!({ "ideaId": "x", "ai": { "text": "ai text" } });
        let answer = ChurnResult::from_response(&data).unwrap().answer.unwrap();
        assert_eq!(answer.source, AnswerSource::AiText);
        assert_eq!(answer.text, "ai text");
    }

    #[test]
    fn test_churn_result_without_answer_or_matches_has_none() {
        let result = ChurnResult::from_response(&json!({ "ideaId": "id1" })).unwrap();
        assert!(result.answer.is_none());
        assert!(result.matches.is_empty());
        assert!(!result.ai_used());
    }

    #[test]
    fn test_unrecognized_shapes_are_rejected() {
        let err = ChurnResult::from_response(&json!("just a string")).unwrap_err();
        assert!(matches!(err, ChurnError::UnrecognizedResponse { .. }));

        let err = ChurnResult::from_response(&json!({ "something": 1 })).unwrap_err();
        assert!(matches!(err, ChurnError::UnrecognizedResponse { .. }));
    }

    #[test]
    fn test_refs_decode_link_field_variants() {
        let data = json!({
            "ideaId": "x",
            "refs": [
                { "title": "a", "url": "http://a" },
                { "title": "b", "href": "http://b" },
                { "title": "c", "link": "http://c", "snippet": "s" }
            ]
        });
        let result = ChurnResult::from_response(&data).unwrap();
        let urls: Vec<_> = result.refs.iter().filter_map(|r| r.url.as_deref()).collect();
        assert_eq!(urls, vec!["http://a", "http://b", "http://c"]);
        assert_eq!(result.refs[2].snippet.as_deref(), Some("s"));
    }

    #[test]
    fn test_publish_receipt_decoding() {
        let receipt = PublishReceipt::from_response(&json!({ "ok": true, "idea": { "id": "id1" } }));
        assert!(receipt.ok);
        assert_eq!(receipt.id.as_deref(), Some("id1"));

        let receipt = PublishReceipt::from_response(&json!({ "error": "nope" }));
        assert!(!receipt.ok);
        assert!(receipt.id.is_none());
    }

    #[test]
    fn test_feed_items_tolerate_missing_fields() {
        let data = json!({
            "items": [
                { "id": "a", "text": "full text", "tags": ["x"], "createdAt": "2024-01-02T03:04:05Z" },
                { "id": "b", "abstract": "only abstract" },
                {}
            ]
        });
        let items = FeedItem::list_from_response(&data).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].id, "a");
        assert!(items[0].created_at.is_some());
        assert_eq!(items[1].text, "only abstract");
        assert!(items[2].created_at.is_none());

        let err = FeedItem::list_from_response(&json!({ "count": 0 })).unwrap_err();
        assert!(matches!(err, ChurnError::UnrecognizedResponse { .. }));
    }
}
