//! Data types exchanged with the EduVerse backend
//!
//! Records are normalised at the deserialisation boundary: the backend may
//! name its identifier `_id` or `id` and may send it as a string, a number or
//! an `{"$oid": ...}` object. Every type here exposes a single canonical `id`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fallback used in the demo teacher email when an institution has no subdomain
pub const DEMO_EMAIL_FALLBACK: &str = "demo";

/// Identifier value as the backend may send it
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
    Object {
        #[serde(rename = "$oid")]
        oid: String,
    },
}

impl RawId {
    fn into_id(self) -> Option<String> {
        match self {
            RawId::Text(s) | RawId::Object { oid: s } if s.is_empty() => None,
            RawId::Text(s) | RawId::Object { oid: s } => Some(s),
            RawId::Number(n) => Some(n.to_string()),
        }
    }
}

/// Pick `_id` when present and non-empty, otherwise `id`
fn canonical_id(underscore_id: Option<RawId>, id: Option<RawId>) -> Option<String> {
    underscore_id
        .and_then(RawId::into_id)
        .or_else(|| id.and_then(RawId::into_id))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Response of the backend health check (`GET /test`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub backend: String,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub collections: Vec<String>,
}

/// Subscription plan of an institution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Basic,
    Premium,
    Enterprise,
}

impl Plan {
    pub const ALL: [Plan; 4] = [Plan::Free, Plan::Basic, Plan::Premium, Plan::Enterprise];

    pub fn display_name(&self) -> &'static str {
        match self {
            Plan::Free => "Free",
            Plan::Basic => "Basic",
            Plan::Premium => "Premium",
            Plan::Enterprise => "Enterprise",
        }
    }

    /// Monthly price as shown on the pricing table
    pub fn monthly_price(&self) -> &'static str {
        match self {
            Plan::Free => "₹0",
            Plan::Basic => "₹999",
            Plan::Premium => "₹2,499",
            Plan::Enterprise => "₹4,999",
        }
    }

    pub fn note(&self) -> Option<&'static str> {
        match self {
            Plan::Free => Some("Trial"),
            _ => None,
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Plan::Free => write!(f, "free"),
            Plan::Basic => write!(f, "basic"),
            Plan::Premium => write!(f, "premium"),
            Plan::Enterprise => write!(f, "enterprise"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawInstitution {
    #[serde(rename = "_id", default)]
    underscore_id: Option<RawId>,
    #[serde(default)]
    id: Option<RawId>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    subdomain: Option<String>,
    #[serde(default)]
    plan: Option<Plan>,
}

/// A tenant organisation (coaching centre)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawInstitution")]
pub struct Institution {
    pub id: String,
    pub name: String,
    pub subdomain: Option<String>,
    pub plan: Plan,
}

impl TryFrom<RawInstitution> for Institution {
    type Error = String;

    fn try_from(raw: RawInstitution) -> Result<Self, Self::Error> {
        let name = raw.name.unwrap_or_default();
        let id = canonical_id(raw.underscore_id, raw.id)
            .ok_or_else(|| format!("institution '{}' has no identifier", name))?;
        Ok(Self {
            id,
            name,
            subdomain: non_empty(raw.subdomain),
            plan: raw.plan.unwrap_or_default(),
        })
    }
}

/// A student record exactly as the backend returned it
///
/// The object is stored and serialised untouched; identifiers are read
/// through [`Student::id`] and [`Student::institution_id`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Student {
    fields: Map<String, Value>,
}

impl Student {
    /// `_id` when usable, otherwise `id`
    pub fn id(&self) -> Option<String> {
        canonical_id(self.raw_id("_id"), self.raw_id("id"))
    }

    pub fn institution_id(&self) -> Option<String> {
        self.raw_id("institution_id").and_then(RawId::into_id)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    fn raw_id(&self, field: &str) -> Option<RawId> {
        let value = self.fields.get(field)?.clone();
        serde_json::from_value(value).ok()
    }
}

/// Body of `POST /institutions`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewInstitution {
    pub name: String,
    pub subdomain: String,
    pub plan: Plan,
}

impl NewInstitution {
    /// New institutions always start on the free plan
    pub fn free(name: impl Into<String>, subdomain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subdomain: subdomain.into(),
            plan: Plan::Free,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Teacher,
}

/// Body of `POST /users`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewUser {
    pub institution_id: String,
    pub role: Role,
    pub name: String,
    pub email: String,
}

impl NewUser {
    /// The scripted teacher created by demo setup
    pub fn demo_teacher(institution: &Institution) -> Self {
        Self {
            institution_id: institution.id.clone(),
            role: Role::Teacher,
            name: "Demo Teacher".to_string(),
            email: teacher_email(institution.subdomain.as_deref()),
        }
    }
}

/// `teacher@<subdomain>.com`, falling back to `teacher@demo.com`
pub fn teacher_email(subdomain: Option<&str>) -> String {
    let domain = subdomain
        .filter(|s| !s.is_empty())
        .unwrap_or(DEMO_EMAIL_FALLBACK);
    format!("teacher@{}.com", domain)
}

/// Body of `POST /batches`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewBatch {
    pub institution_id: String,
    pub name: String,
    pub subject: String,
}

impl NewBatch {
    /// The scripted batch created by demo setup
    pub fn demo(institution: &Institution) -> Self {
        Self {
            institution_id: institution.id.clone(),
            name: "Batch A".to_string(),
            subject: "Math".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreatedRecord {
    #[serde(rename = "_id", default)]
    underscore_id: Option<RawId>,
    #[serde(default)]
    id: Option<RawId>,
}

/// What the backend answered to an institution creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CreateOutcome {
    Created { id: String },
    MissingIdentifier,
}

impl CreateOutcome {
    /// Inspect a creation response body for an identifier
    pub fn from_body(body: &str) -> crate::Result<Self> {
        let value: Value = serde_json::from_str(body)?;
        if !value.is_object() {
            return Ok(CreateOutcome::MissingIdentifier);
        }
        let record: CreatedRecord = serde_json::from_value(value)?;
        Ok(match canonical_id(record.underscore_id, record.id) {
            Some(id) => CreateOutcome::Created { id },
            None => CreateOutcome::MissingIdentifier,
        })
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            CreateOutcome::Created { id } => Some(id),
            CreateOutcome::MissingIdentifier => None,
        }
    }
}
