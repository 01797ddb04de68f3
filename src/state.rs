// src/state.rs

use std::sync::Arc;

use sqlx::MySqlPool;

use crate::{
    config::Config,
    store::{
        QuestionStore, SubmissionSink, ViolationSink, http::HttpBackend, memory::MemoryStore,
        mysql::MySqlQuestionStore,
    },
};

/// Collaborators shared by every attempt.
#[derive(Clone)]
pub struct AppState {
    pub questions: Arc<dyn QuestionStore>,
    pub violations: Arc<dyn ViolationSink>,
    pub submissions: Arc<dyn SubmissionSink>,
    pub config: Config,
}

impl AppState {
    /// Everything goes through the REST backend.
    pub fn http(config: Config) -> Self {
        let backend = Arc::new(HttpBackend::new(config.api_base_url.clone()));
        Self {
            questions: backend.clone(),
            violations: backend.clone(),
            submissions: backend,
            config,
        }
    }

    /// Papers are read straight from MySQL; writes still go through the backend.
    pub fn mysql(config: Config, pool: MySqlPool) -> Self {
        let mut state = Self::http(config);
        state.questions = Arc::new(MySqlQuestionStore::new(pool));
        state
    }

    pub fn in_memory(config: Config, store: Arc<MemoryStore>) -> Self {
        Self {
            questions: store.clone(),
            violations: store.clone(),
            submissions: store,
            config,
        }
    }
}
