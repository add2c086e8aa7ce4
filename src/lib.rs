// src/lib.rs
//! Entry ingestion and insight engine for a voice journaling application.
//!
//! The crate covers the processing core that sits between the HTTP/UI layer
//! and the relational store: the ingestion pipeline (validate, transcribe,
//! persist, enrich), the cached insight generator, the achievement engine and
//! the pattern analytics aggregator. Routing, auth and the concrete database
//! adapters are owned by the embedding application and reach this crate
//! through [`services::ServiceManager`].

pub mod achievements;
pub mod analytics;
pub mod cache;
pub mod config;
pub mod error;
pub mod insight;
pub mod pipeline;
pub mod repository;
pub mod services;

pub use achievements::{AchievementEngine, TriggerAction};
pub use analytics::{PatternAnalysis, PatternAnalyzer};
pub use cache::ResultCache;
pub use config::Config;
pub use error::{IngestionError, TranscriptionError, ValidationError};
pub use insight::InsightGenerator;
pub use pipeline::{AudioSubmission, IngestionPipeline};
pub use repository::{
    AchievementCriteria, AchievementDefinition, AiAnalysis, Entry, EntryUpdate, NewEntry,
    RepositoryManager, UserAchievementProgress,
};
pub use services::ServiceManager;
