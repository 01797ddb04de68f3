// src/store/http.rs

use async_trait::async_trait;
use reqwest::StatusCode;
use url::Url;

use crate::{
    error::AppError,
    models::{attempt::Attempt, paper::Paper, violation::ViolationRecord},
    store::{QuestionStore, SubmissionSink, ViolationSink},
};

/// Client for the LabQMS REST backend.
///
/// * `GET  /api/papers`, `GET /api/papers/{id}`
/// * `POST /api/violations`, `GET /api/violations/paper/{paperId}`
/// * `POST /api/tests`, `GET /api/tests?studentId=`
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base: Url,
}

impl HttpBackend {
    pub fn new(base: Url) -> Self {
        Self::with_client(reqwest::Client::new(), base)
    }

    pub fn with_client(client: reqwest::Client, mut base: Url) -> Self {
        // Url::join drops the last path segment unless it ends with '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Self { client, base }
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Builds `<base>/<segments...>` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, AppError> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| AppError::Config(format!("'{}' cannot be a base URL", self.base)))?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }
}

#[async_trait]
impl QuestionStore for HttpBackend {
    async fn paper(&self, paper_id: &str) -> Result<Option<Paper>, AppError> {
        let url = self.endpoint(&["api", "papers", paper_id])?;
        let response = self.client.get(url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let paper = response.error_for_status()?.json::<Paper>().await.map_err(|e| {
            tracing::error!("Failed to decode paper {}: {:?}", paper_id, e);
            AppError::from(e)
        })?;
        Ok(Some(paper))
    }

    /// The backend has no lookup by code; papers are listed and matched locally.
    async fn paper_by_access_code(&self, access_code: &str) -> Result<Option<Paper>, AppError> {
        let url = self.endpoint(&["api", "papers"])?;
        let papers: Vec<Paper> = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(papers.into_iter().find(|p| p.accepts_code(access_code)))
    }
}

#[async_trait]
impl ViolationSink for HttpBackend {
    async fn record(&self, record: &ViolationRecord) -> Result<(), AppError> {
        let url = self.endpoint(&["api", "violations"])?;
        self.client
            .post(url)
            .json(record)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn violations_for_paper(&self, paper_id: &str) -> Result<Vec<ViolationRecord>, AppError> {
        let url = self.endpoint(&["api", "violations", "paper", paper_id])?;
        let violations = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(violations)
    }
}

#[async_trait]
impl SubmissionSink for HttpBackend {
    async fn submit(&self, attempt: &Attempt) -> Result<Attempt, AppError> {
        let url = self.endpoint(&["api", "tests"])?;
        let saved = self
            .client
            .post(url)
            .json(attempt)
            .send()
            .await?
            .error_for_status()?
            .json::<Attempt>()
            .await
            .map_err(|e| {
                tracing::error!("Failed to decode saved attempt: {:?}", e);
                AppError::from(e)
            })?;
        Ok(saved)
    }

    async fn attempts_for_student(&self, student_id: &str) -> Result<Vec<Attempt>, AppError> {
        let mut url = self.endpoint(&["api", "tests"])?;
        url.query_pairs_mut().append_pair("studentId", student_id);
        let attempts = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(attempts)
    }
}
