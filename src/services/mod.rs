// src/services/mod.rs
//! Service layer module
//!
//! Wires the processing core together: repositories, external service
//! clients, the shared result cache, the ingestion pipeline, the achievement
//! engine and the pattern analyzer. The embedding application constructs one
//! `ServiceManager` and routes requests through its accessors.

pub mod ollama;
pub mod traits;
pub mod whisper;

// Re-export commonly used types and traits
pub use traits::*;

use std::sync::Arc;

use crate::achievements::AchievementEngine;
use crate::analytics::PatternAnalyzer;
use crate::cache::ResultCache;
use crate::config::Config;
use crate::insight::InsightGenerator;
use crate::pipeline::IngestionPipeline;
use crate::repository::RepositoryManager;

/// Service manager that provides access to the processing core
pub struct ServiceManager<R: RepositoryManager> {
    repos: Arc<R>,
    pipeline: IngestionPipeline<R>,
    achievements: AchievementEngine<R>,
    analyzer: PatternAnalyzer<R>,
    insights: Arc<InsightGenerator>,
}

impl<R: RepositoryManager + 'static> ServiceManager<R> {
    /// Create a service manager with the production HTTP clients
    pub fn new(repos: Arc<R>, config: &Config) -> Self {
        let speech: Arc<dyn SpeechToTextService> =
            Arc::new(whisper::WhisperApiClient::new(&config.speech));
        let insight_service: Arc<dyn TextInsightService> =
            Arc::new(ollama::OllamaClient::new(&config.insight));
        Self::with_services(repos, speech, insight_service, config)
    }

    /// Create a service manager with explicit service implementations.
    /// Production wiring goes through [`new`](Self::new); tests plug in
    /// stubs here.
    pub fn with_services(
        repos: Arc<R>,
        speech: Arc<dyn SpeechToTextService>,
        insight_service: Arc<dyn TextInsightService>,
        config: &Config,
    ) -> Self {
        let cache = ResultCache::from_config(&config.cache);
        let insights = Arc::new(InsightGenerator::new(
            insight_service,
            cache,
            config.insight.clone(),
        ));
        let achievements = AchievementEngine::new(Arc::clone(&repos));
        let pipeline = IngestionPipeline::new(
            Arc::clone(&repos),
            speech,
            Arc::clone(&insights),
            achievements.clone(),
            config.ingestion.clone(),
        );
        let analyzer = PatternAnalyzer::new(Arc::clone(&repos), config.analytics.clone());

        Self {
            repos,
            pipeline,
            achievements,
            analyzer,
            insights,
        }
    }

    /// Get the ingestion pipeline
    pub fn ingestion(&self) -> &IngestionPipeline<R> {
        &self.pipeline
    }

    /// Get the achievement engine
    pub fn achievements(&self) -> &AchievementEngine<R> {
        &self.achievements
    }

    /// Get the pattern analyzer
    pub fn patterns(&self) -> &PatternAnalyzer<R> {
        &self.analyzer
    }

    /// Get the insight generator
    pub fn insights(&self) -> &InsightGenerator {
        &self.insights
    }

    /// Get the repository manager
    pub fn repositories(&self) -> &R {
        &self.repos
    }
}
