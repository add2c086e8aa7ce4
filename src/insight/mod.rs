// src/insight/mod.rs
//! Insight generator
//!
//! Wraps the text-insight service with cache-aside lookups and converts every
//! failure into a safe default. Nothing in this module errors towards its
//! caller: a missing tag list or analysis block degrades the entry, it never
//! fails the request that triggered enrichment.

use std::sync::Arc;

use log::{debug, warn};
use serde::Deserialize;

use crate::cache::ResultCache;
use crate::config::InsightConfig;
use crate::repository::AiAnalysis;
use crate::services::traits::TextInsightService;

const TAGS_NAMESPACE: &str = "tags:";
const ANALYSIS_NAMESPACE: &str = "analysis:";

const NEUTRAL_SENTIMENT: i32 = 3;
const MAX_TOPICS: usize = 3;
const MAX_INSIGHTS: usize = 3;

/// Cached tag and content-analysis generation over an LLM service
pub struct InsightGenerator {
    service: Arc<dyn TextInsightService>,
    cache: ResultCache,
    config: InsightConfig,
}

/// Loosely-shaped analysis payload as the model returns it, before clamping
#[derive(Debug, Deserialize)]
struct RawAnalysis {
    sentiment: Option<f64>,
    #[serde(default)]
    topics: Vec<String>,
    #[serde(default)]
    insights: Vec<String>,
}

impl InsightGenerator {
    pub fn new(
        service: Arc<dyn TextInsightService>,
        cache: ResultCache,
        config: InsightConfig,
    ) -> Self {
        Self {
            service,
            cache,
            config,
        }
    }

    /// Generate topical tags for a transcript. Returns an empty list for
    /// blank input and on any service or parse failure.
    pub async fn generate_tags(&self, transcript: &str) -> Vec<String> {
        if transcript.trim().is_empty() {
            return Vec::new();
        }

        let key = self.cache.key(TAGS_NAMESPACE, transcript);
        if let Some(cached) = self.cache.get(&key) {
            if let Ok(tags) = serde_json::from_str::<Vec<String>>(&cached) {
                debug!("tag cache hit");
                return tags;
            }
        }

        let prompt = self.tags_prompt(transcript);
        let response = match self.service.generate(&prompt).await {
            Ok(response) => response,
            Err(e) => {
                warn!("tag generation failed: {:#}", e);
                return Vec::new();
            }
        };

        let json = extract_json(&response).unwrap_or(response.as_str());
        match serde_json::from_str::<Vec<String>>(json) {
            Ok(raw) => {
                let tags = self.sanitize_tags(raw);
                if let Ok(encoded) = serde_json::to_string(&tags) {
                    self.cache.insert(key, encoded);
                }
                tags
            }
            Err(e) => {
                warn!("tag response was not a JSON string array: {}", e);
                Vec::new()
            }
        }
    }

    /// Analyze a transcript into sentiment, topics and insights. Returns
    /// `None` for blank input and on any service or parse failure, leaving
    /// the entry's analysis block unset.
    pub async fn analyze_content(&self, transcript: &str) -> Option<AiAnalysis> {
        if transcript.trim().is_empty() {
            return None;
        }

        let key = self.cache.key(ANALYSIS_NAMESPACE, transcript);
        if let Some(cached) = self.cache.get(&key) {
            if let Ok(analysis) = serde_json::from_str::<AiAnalysis>(&cached) {
                debug!("analysis cache hit");
                return Some(analysis);
            }
        }

        let prompt = self.analysis_prompt(transcript);
        let response = match self.service.generate(&prompt).await {
            Ok(response) => response,
            Err(e) => {
                warn!("content analysis failed: {:#}", e);
                return None;
            }
        };

        let json = extract_json(&response).unwrap_or(response.as_str());
        match serde_json::from_str::<RawAnalysis>(json) {
            Ok(raw) => {
                let analysis = validate_analysis(raw);
                if let Ok(encoded) = serde_json::to_string(&analysis) {
                    self.cache.insert(key, encoded);
                }
                Some(analysis)
            }
            Err(e) => {
                warn!("analysis response was not valid JSON: {}", e);
                None
            }
        }
    }

    fn truncated<'a>(&self, transcript: &'a str) -> &'a str {
        match transcript.char_indices().nth(self.config.max_content_length) {
            Some((idx, _)) => &transcript[..idx],
            None => transcript,
        }
    }

    fn tags_prompt(&self, transcript: &str) -> String {
        format!(
            r#"You are a journaling assistant. Read the journal transcript below and produce between 1 and {} short lowercase topical tags describing it.

Transcript:
{}

Respond with a JSON array of strings only, no additional text. Example: ["work", "family"]"#,
            self.config.max_tags,
            self.truncated(transcript)
        )
    }

    fn analysis_prompt(&self, transcript: &str) -> String {
        format!(
            r#"You are a journaling assistant. Analyze the journal transcript below.

Transcript:
{}

Respond with valid JSON only, no additional text, in this exact shape:
{{
  "sentiment": 3,
  "topics": ["up to three short topics"],
  "insights": ["up to three short observations about the author's day"]
}}

"sentiment" is an integer from 1 (very negative) to 5 (very positive)."#,
            self.truncated(transcript)
        )
    }

    fn sanitize_tags(&self, raw: Vec<String>) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        for tag in raw {
            let tag = tag.trim().to_lowercase();
            if tag.is_empty() || tags.contains(&tag) {
                continue;
            }
            tags.push(tag);
            if tags.len() >= self.config.max_tags {
                break;
            }
        }
        tags
    }
}

/// Clamp and bound a raw model payload into a well-formed analysis block
fn validate_analysis(raw: RawAnalysis) -> AiAnalysis {
    let sentiment = raw
        .sentiment
        .map(|s| s.round() as i32)
        .unwrap_or(NEUTRAL_SENTIMENT)
        .clamp(1, 5);

    AiAnalysis {
        sentiment,
        topics: bounded_list(raw.topics, MAX_TOPICS),
        insights: bounded_list(raw.insights, MAX_INSIGHTS),
    }
}

fn bounded_list(raw: Vec<String>, max: usize) -> Vec<String> {
    raw.into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .take(max)
        .collect()
}

/// Extract JSON content from a response that might contain additional text
fn extract_json(response: &str) -> Option<&str> {
    // Look for JSON object boundaries
    if let Some(start) = response.find('{') {
        if let Some(end) = response.rfind('}') {
            if end > start {
                return Some(&response[start..=end]);
            }
        }
    }

    // Look for JSON array boundaries
    if let Some(start) = response.find('[') {
        if let Some(end) = response.rfind(']') {
            if end > start {
                return Some(&response[start..=end]);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct StubInsightService {
        response: String,
        fail: bool,
        calls: AtomicUsize,
    }

    impl StubInsightService {
        fn returning(response: &str) -> Arc<Self> {
            Arc::new(Self {
                response: response.to_string(),
                fail: false,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                response: String::new(),
                fail: true,
                calls: AtomicUsize::new(0),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextInsightService for StubInsightService {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("model offline");
            }
            Ok(self.response.clone())
        }
    }

    fn generator(service: Arc<StubInsightService>) -> InsightGenerator {
        let cache = ResultCache::new(Duration::from_secs(3600), 100, 100);
        InsightGenerator::new(service, cache, InsightConfig::default())
    }

    #[tokio::test]
    async fn blank_transcript_short_circuits() {
        let service = StubInsightService::returning("[]");
        let insights = generator(service.clone());

        assert!(insights.generate_tags("   ").await.is_empty());
        assert!(insights.analyze_content("").await.is_none());
        assert_eq!(service.call_count(), 0);
    }

    #[tokio::test]
    async fn identical_transcripts_hit_the_service_once() {
        let service = StubInsightService::returning(r#"["focus", "work"]"#);
        let insights = generator(service.clone());

        let first = insights.generate_tags("deep work session today").await;
        let second = insights.generate_tags("deep work session today").await;
        assert_eq!(first, second);
        assert_eq!(service.call_count(), 1);
    }

    #[tokio::test]
    async fn tags_are_deduped_and_bounded() {
        let service = StubInsightService::returning(
            r#"["Work", "work", "  ", "family", "health", "sleep", "food", "travel"]"#,
        );
        let insights = generator(service);

        let tags = insights.generate_tags("busy day").await;
        assert_eq!(tags, vec!["work", "family", "health", "sleep", "food"]);
    }

    #[tokio::test]
    async fn service_failure_degrades_to_defaults() {
        let service = StubInsightService::failing();
        let insights = generator(service.clone());

        assert!(insights.generate_tags("anything").await.is_empty());
        assert!(insights.analyze_content("anything").await.is_none());
        assert_eq!(service.call_count(), 2);
    }

    #[tokio::test]
    async fn malformed_output_degrades_and_is_not_cached() {
        let service = StubInsightService::returning("I had trouble with that request.");
        let insights = generator(service.clone());

        assert!(insights.analyze_content("rough day").await.is_none());
        assert!(insights.analyze_content("rough day").await.is_none());
        // No cache entry was written, so both calls reached the service.
        assert_eq!(service.call_count(), 2);
    }

    #[tokio::test]
    async fn analysis_is_clamped_and_bounded() {
        let service = StubInsightService::returning(
            r#"Here you go:
{"sentiment": 9, "topics": ["a", "b", "c", "d"], "insights": []}"#,
        );
        let insights = generator(service);

        let analysis = insights.analyze_content("great day").await.unwrap();
        assert_eq!(analysis.sentiment, 5);
        assert_eq!(analysis.topics.len(), 3);
        assert!(analysis.insights.is_empty());
    }

    #[tokio::test]
    async fn missing_sentiment_defaults_to_neutral() {
        let service = StubInsightService::returning(r#"{"topics": ["errands"]}"#);
        let insights = generator(service);

        let analysis = insights.analyze_content("ran errands").await.unwrap();
        assert_eq!(analysis.sentiment, NEUTRAL_SENTIMENT);
        assert_eq!(analysis.topics, vec!["errands"]);
    }

    #[test]
    fn extract_json_finds_embedded_payloads() {
        assert_eq!(extract_json(r#"sure: {"a": 1} done"#), Some(r#"{"a": 1}"#));
        assert_eq!(extract_json(r#"tags: ["x"] ok"#), Some(r#"["x"]"#));
        assert_eq!(extract_json("no json here"), None);
    }
}
