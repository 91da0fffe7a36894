//! Error types for the EduVerse dashboard

use std::fmt;

use serde::Serialize;

/// A step of the demo-data workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DemoStep {
    CreateTeacher,
    CreateBatch,
    FetchStudents,
}

impl fmt::Display for DemoStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemoStep::CreateTeacher => write!(f, "create_teacher"),
            DemoStep::CreateBatch => write!(f, "create_batch"),
            DemoStep::FetchStudents => write!(f, "fetch_students"),
        }
    }
}

/// Errors that can occur in the dashboard or its backend client
#[derive(Debug, thiserror::Error)]
pub enum EduverseError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Create an institution first")]
    NoInstitutions,

    #[error("Demo setup failed at step {step}: {source}")]
    DemoSetup {
        step: DemoStep,
        #[source]
        source: Box<EduverseError>,
    },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Dashboard error: {0}")]
    Dashboard(String),
}

impl EduverseError {
    /// Wrap an error as the failure of a demo-setup step
    pub fn at_step(step: DemoStep, source: EduverseError) -> Self {
        EduverseError::DemoSetup {
            step,
            source: Box::new(source),
        }
    }
}

/// Result type alias for EduVerse operations
pub type Result<T> = std::result::Result<T, EduverseError>;
