use std::path::PathBuf;
use std::time::SystemTime;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};
use tras_models::SourceDocument;

use crate::config::DocumentsConfig;
use crate::error::SourceError;
use crate::sources::DocumentSource;

const TOP_TRENDS: usize = 20;
const TOP_NEWS: usize = 20;
const TOP_CORRELATIONS: usize = 15;
const NEWS_TITLE_CHARS: usize = 60;

/// Reads the newest commentary files from a local (or synced) folder.
pub struct DirectorySource {
    config: DocumentsConfig,
}

impl DirectorySource {
    pub fn new(config: DocumentsConfig) -> Self {
        Self { config }
    }

    /// Newest files whose names contain `pattern`, newest first.
    async fn matching(&self, pattern: &str) -> Result<Vec<PathBuf>, SourceError> {
        let pattern = pattern.to_lowercase();
        let mut found: Vec<(SystemTime, PathBuf)> = Vec::new();

        let mut entries = tokio::fs::read_dir(&self.config.folder).await?;
        while let Some(entry) = entries.next_entry().await? {
            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_lowercase();
            if !name.contains(&pattern) {
                continue;
            }
            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            found.push((modified, entry.path()));
        }

        found.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        Ok(found
            .into_iter()
            .take(self.config.max_files)
            .map(|(_, path)| path)
            .collect())
    }
}

#[async_trait]
impl DocumentSource for DirectorySource {
    fn name(&self) -> &str {
        "directory"
    }

    async fn fetch_latest(&self) -> Result<Vec<SourceDocument>, SourceError> {
        let mut paths = self.matching(&self.config.primary_pattern).await?;
        if paths.is_empty() {
            warn!(
                pattern = %self.config.primary_pattern,
                fallback = %self.config.fallback_pattern,
                "No primary documents, trying fallback pattern"
            );
            paths = self.matching(&self.config.fallback_pattern).await?;
        }
        if paths.is_empty() {
            return Err(SourceError::NoDocuments(self.config.primary_pattern.clone()));
        }

        let mut documents = Vec::with_capacity(paths.len());
        let mut last_error = None;
        for path in paths {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            match tokio::fs::read_to_string(&path).await {
                Ok(raw) => documents.push(SourceDocument {
                    content: format_document(&name, &raw, self.config.max_chars),
                    name,
                }),
                Err(e) => {
                    warn!(file = %name, error = %e, "Skipping unreadable document");
                    last_error = Some(SourceError::Unreadable {
                        name,
                        detail: e.to_string(),
                    });
                }
            }
        }

        if documents.is_empty() {
            if let Some(e) = last_error {
                return Err(e);
            }
        }
        info!(
            folder = %self.config.folder,
            documents = documents.len(),
            "Loaded source documents"
        );
        Ok(documents)
    }
}

/// JSON files with tracker sections are condensed; everything else is
/// treated as text.
pub fn format_document(name: &str, raw: &str, max_chars: usize) -> String {
    if name.to_lowercase().ends_with(".json") {
        if let Ok(value) = serde_json::from_str::<Value>(raw) {
            return format_json(&value);
        }
    }
    format_text(raw, max_chars)
}

pub fn format_text(raw: &str, max_chars: usize) -> String {
    let cleaned = raw.trim();
    match cleaned.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}... (truncated)", &cleaned[..cut]),
        None => cleaned.to_string(),
    }
}

pub fn format_json(data: &Value) -> String {
    let mut out: Vec<String> = Vec::new();

    if let Some(trends) = data.get("trends").and_then(Value::as_array) {
        out.push("TRENDING CURRENCIES:".to_string());
        for trend in trends.iter().take(TOP_TRENDS) {
            out.push(format!(
                "  {}: {:.2}% ({})",
                str_field(trend, "pair"),
                num_field(trend, "change_pct"),
                trend
                    .get("direction")
                    .and_then(Value::as_str)
                    .unwrap_or("neutral"),
            ));
        }
    }

    if let Some(news) = data.get("news").and_then(Value::as_array) {
        out.push("\nRELATED NEWS:".to_string());
        for item in news.iter().take(TOP_NEWS) {
            out.push(format!(
                "  - {} (Source: {})",
                str_field(item, "title"),
                str_field(item, "source"),
            ));
        }
    }

    if let Some(correlations) = data.get("correlations").and_then(Value::as_array) {
        out.push("\nNEWS-CURRENCY CORRELATIONS:".to_string());
        for corr in correlations.iter().take(TOP_CORRELATIONS) {
            let title: String = str_field(corr, "news_title")
                .chars()
                .take(NEWS_TITLE_CHARS)
                .collect();
            out.push(format!(
                "  {}: {}... (Score: {:.2})",
                str_field(corr, "currency_pair"),
                title,
                num_field(corr, "correlation_score"),
            ));
        }
    }

    if out.is_empty() {
        data.to_string()
    } else {
        out.join("\n")
    }
}

fn str_field<'v>(item: &'v Value, key: &str) -> &'v str {
    item.get(key).and_then(Value::as_str).unwrap_or("N/A")
}

fn num_field(item: &Value, key: &str) -> f64 {
    item.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    fn config(dir: &std::path::Path) -> DocumentsConfig {
        DocumentsConfig {
            folder: dir.to_string_lossy().into_owned(),
            primary_pattern: "summary".into(),
            fallback_pattern: "report".into(),
            max_files: 2,
            max_chars: 20,
        }
    }

    #[test]
    fn text_is_trimmed_and_truncated() {
        assert_eq!(format_text("  short  ", 20), "short");
        assert_eq!(format_text("abcdefghij", 4), "abcd... (truncated)");
        assert_eq!(format_text("ééééé", 3), "ééé... (truncated)");
    }

    #[test]
    fn tracker_json_is_condensed() {
        let data = json!({
            "trends": [{"pair": "EUR/USD", "change_pct": 0.456, "direction": "up"}],
            "news": [{"title": "ECB holds", "source": "Reuters"}],
            "correlations": [{
                "currency_pair": "EUR/USD",
                "news_title": "x".repeat(80),
                "correlation_score": 0.8
            }]
        });
        let text = format_json(&data);
        assert!(text.starts_with("TRENDING CURRENCIES:\n  EUR/USD: 0.46% (up)"));
        assert!(text.contains("RELATED NEWS:\n  - ECB holds (Source: Reuters)"));
        assert!(text.contains(&format!("  EUR/USD: {}... (Score: 0.80)", "x".repeat(60))));
    }

    #[test]
    fn sections_are_capped() {
        let trends: Vec<Value> = (0..30).map(|i| json!({"pair": format!("P{i}")})).collect();
        let text = format_json(&json!({ "trends": trends }));
        assert_eq!(text.lines().count(), 1 + TOP_TRENDS);
        assert!(text.contains("P0: 0.00% (neutral)"));
    }

    #[test]
    fn json_without_sections_is_passed_through() {
        assert_eq!(format_json(&json!({"a": 1})), r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn prefers_primary_pattern() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("fx_summary.txt"), "EUR strength").unwrap();
        fs::write(dir.path().join("daily_report.txt"), "ignored").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let docs = DirectorySource::new(config(dir.path()))
            .fetch_latest()
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].name, "fx_summary.txt");
        assert_eq!(docs[0].content, "EUR strength");
    }

    #[tokio::test]
    async fn falls_back_and_caps_file_count() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..3 {
            fs::write(dir.path().join(format!("Report_{i}.txt")), "x".repeat(50)).unwrap();
        }
        let docs = DirectorySource::new(config(dir.path()))
            .fetch_latest()
            .await
            .unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs[0].content.ends_with("... (truncated)"));
    }

    #[tokio::test]
    async fn empty_folder_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DirectorySource::new(config(dir.path()))
            .fetch_latest()
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::NoDocuments(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn missing_folder_is_permanent() {
        let err = DirectorySource::new(config(std::path::Path::new("/nonexistent/tras")))
            .fetch_latest()
            .await
            .unwrap_err();
        assert!(!err.is_retryable());
    }
}
