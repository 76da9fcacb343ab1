//! Knowledge base: task payloads stored as JSON documents on disk.
//!
//! Layout: `<root>/<domain_id>/<key>.json`, where the key is the first run
//! of at least [`MIN_KEY_DIGITS`] digits in the user input (an invoice
//! number, a SKU). Input without a key, or a key without a document, yields
//! no payload.

use async_trait::async_trait;
use attune_core::error::TaskDataError;
use attune_core::task::TaskDataSource;
use std::path::PathBuf;
use tracing::debug;

pub const MIN_KEY_DIGITS: usize = 3;

pub struct KnowledgeBase {
    root: PathBuf,
}

impl KnowledgeBase {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// First run of ASCII digits long enough to be a document key.
    pub fn extract_key(user_input: &str) -> Option<&str> {
        let bytes = user_input.as_bytes();
        let mut start = None;
        for (i, b) in bytes.iter().enumerate() {
            match (b.is_ascii_digit(), start) {
                (true, None) => start = Some(i),
                (false, Some(s)) => {
                    if i - s >= MIN_KEY_DIGITS {
                        return Some(&user_input[s..i]);
                    }
                    start = None;
                }
                _ => {}
            }
        }
        start
            .filter(|s| bytes.len() - s >= MIN_KEY_DIGITS)
            .map(|s| &user_input[s..])
    }

    fn is_safe_segment(domain_id: &str) -> bool {
        !domain_id.is_empty()
            && domain_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    }
}

#[async_trait]
impl TaskDataSource for KnowledgeBase {
    async fn load(
        &self,
        domain_id: &str,
        user_input: &str,
    ) -> Result<Option<serde_json::Value>, TaskDataError> {
        if !Self::is_safe_segment(domain_id) {
            return Ok(None);
        }
        let Some(key) = Self::extract_key(user_input) else {
            return Ok(None);
        };

        let path = self.root.join(domain_id).join(format!("{key}.json"));
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No task payload for key");
                return Ok(None);
            }
            Err(e) => {
                return Err(TaskDataError::ReadFailed {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                });
            }
        };

        let value = serde_json::from_str(&content).map_err(|e| TaskDataError::Malformed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        debug!(path = %path.display(), "Task payload loaded");
        Ok(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_long_digit_run() {
        assert_eq!(KnowledgeBase::extract_key("check invoice 999"), Some("999"));
        assert_eq!(KnowledgeBase::extract_key("nfe 78910."), Some("78910"));
        assert_eq!(KnowledgeBase::extract_key("item 12 of order 4455"), Some("4455"));
        assert_eq!(KnowledgeBase::extract_key("only 42 here"), None);
        assert_eq!(KnowledgeBase::extract_key("no digits"), None);
    }

    #[tokio::test]
    async fn loads_document_by_domain_and_key() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("fiscal")).unwrap();
        std::fs::write(
            tmp.path().join("fiscal").join("999.json"),
            r#"{"number": "999", "total": 150.0}"#,
        )
        .unwrap();

        let kb = KnowledgeBase::new(tmp.path());
        let payload = kb.load("fiscal", "check invoice 999").await.unwrap().unwrap();
        assert_eq!(payload["total"], 150.0);

        assert!(kb.load("fiscal", "check invoice 1000").await.unwrap().is_none());
        assert!(kb.load("fiscal", "no key").await.unwrap().is_none());
        assert!(kb.load("../etc", "file 999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn malformed_document_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("fiscal")).unwrap();
        std::fs::write(tmp.path().join("fiscal").join("123.json"), "{not json").unwrap();

        let kb = KnowledgeBase::new(tmp.path());
        let err = kb.load("fiscal", "invoice 123").await.unwrap_err();
        assert!(matches!(err, TaskDataError::Malformed { .. }));
    }
}
