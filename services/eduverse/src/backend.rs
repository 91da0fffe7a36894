//! EduVerse backend client

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::BackendConfig;
use crate::io::{HttpClient, HttpResponse};
use crate::model::{
    CreateOutcome, HealthStatus, Institution, NewBatch, NewInstitution, NewUser, Student,
};

/// Operations the dashboard needs from the backend
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait BackendApi: Send + Sync {
    /// `GET /test`
    async fn health(&self) -> crate::Result<HealthStatus>;

    /// `GET /institutions`
    async fn list_institutions(&self) -> crate::Result<Vec<Institution>>;

    /// `POST /institutions`
    async fn create_institution(&self, institution: &NewInstitution)
        -> crate::Result<CreateOutcome>;

    /// `POST /users`; the response body is ignored
    async fn create_user(&self, user: &NewUser) -> crate::Result<()>;

    /// `POST /batches`; the response body is ignored
    async fn create_batch(&self, batch: &NewBatch) -> crate::Result<()>;

    /// `GET /students?institution_id=ID`
    async fn list_students(&self, institution_id: &str) -> crate::Result<Vec<Student>>;
}

/// Backend reached over HTTP with JSON bodies
pub struct HttpBackend {
    base_url: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl HttpBackend {
    pub fn new(config: &BackendConfig, http: Arc<dyn HttpClient>) -> Self {
        let base_url = config.normalized_base_url().to_string();
        tracing::debug!("Created HttpBackend at {}", base_url);
        Self { base_url, http }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> crate::Result<T> {
        let response = check_status(self.http.get(url).await?)?;
        Ok(serde_json::from_str(&response.body)?)
    }

    async fn post<B: Serialize + Sync>(&self, path: &str, body: &B) -> crate::Result<HttpResponse> {
        let body = serde_json::to_value(body)?;
        check_status(self.http.post_json(&self.url(path), &body).await?)
    }
}

fn check_status(response: HttpResponse) -> crate::Result<HttpResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(crate::EduverseError::Status {
            status: response.status,
            body: response.body,
        })
    }
}

#[async_trait]
impl BackendApi for HttpBackend {
    async fn health(&self) -> crate::Result<HealthStatus> {
        self.get_json(&self.url("/test")).await
    }

    async fn list_institutions(&self) -> crate::Result<Vec<Institution>> {
        let records: Vec<serde_json::Value> = self.get_json(&self.url("/institutions")).await?;
        Ok(records
            .into_iter()
            .filter_map(|record| match serde_json::from_value(record) {
                Ok(institution) => Some(institution),
                Err(e) => {
                    tracing::warn!("Skipping unreadable institution record: {}", e);
                    None
                }
            })
            .collect())
    }

    async fn create_institution(
        &self,
        institution: &NewInstitution,
    ) -> crate::Result<CreateOutcome> {
        let response = self.post("/institutions", institution).await?;
        CreateOutcome::from_body(&response.body)
    }

    async fn create_user(&self, user: &NewUser) -> crate::Result<()> {
        self.post("/users", user).await?;
        Ok(())
    }

    async fn create_batch(&self, batch: &NewBatch) -> crate::Result<()> {
        self.post("/batches", batch).await?;
        Ok(())
    }

    async fn list_students(&self, institution_id: &str) -> crate::Result<Vec<Student>> {
        let url = reqwest::Url::parse_with_params(
            &self.url("/students"),
            &[("institution_id", institution_id)],
        )
        .map_err(|e| crate::EduverseError::Config(format!("Invalid backend URL: {}", e)))?;
        self.get_json(url.as_str()).await
    }
}
