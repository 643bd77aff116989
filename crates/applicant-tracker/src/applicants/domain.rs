use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned identifier for an applicant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicantId(pub i64);

impl fmt::Display for ApplicantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hiring pipeline stage tracked for every applicant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicantStatus {
    #[default]
    Pending,
    Reviewed,
    Interviewed,
    Hired,
    Rejected,
}

impl ApplicantStatus {
    pub const ALL: [ApplicantStatus; 5] = [
        ApplicantStatus::Pending,
        ApplicantStatus::Reviewed,
        ApplicantStatus::Interviewed,
        ApplicantStatus::Hired,
        ApplicantStatus::Rejected,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ApplicantStatus::Pending => "pending",
            ApplicantStatus::Reviewed => "reviewed",
            ApplicantStatus::Interviewed => "interviewed",
            ApplicantStatus::Hired => "hired",
            ApplicantStatus::Rejected => "rejected",
        }
    }

    /// Exact, case-sensitive match against the stored labels.
    pub fn from_label(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.label() == raw)
    }
}

impl fmt::Display for ApplicantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Persisted applicant record as returned to API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Applicant {
    pub id: ApplicantId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    pub name: String,
    pub email: String,
    pub position: String,
    pub status: ApplicantStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Raw create payload. Every field is optional on the wire so missing values
/// surface as validation errors rather than body-parse failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicantSubmission {
    pub name: String,
    pub email: String,
    pub position: String,
    pub status: Option<String>,
    pub phone: Option<String>,
    pub resume: Option<String>,
    pub notes: Option<String>,
}

/// Sanitized submission that passed validation and is ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApplicant {
    pub name: String,
    pub email: String,
    pub position: String,
    pub status: ApplicantStatus,
    pub phone: Option<String>,
    pub resume: Option<String>,
    pub notes: Option<String>,
}

/// Raw update payload; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicantPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub position: Option<String>,
    pub status: Option<String>,
    pub phone: Option<String>,
    pub resume: Option<String>,
    pub notes: Option<String>,
}

/// Typed set of column changes handed to the repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicantChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub position: Option<String>,
    pub status: Option<ApplicantStatus>,
    pub phone: Option<String>,
    pub resume: Option<String>,
    pub notes: Option<String>,
}

impl ApplicantChanges {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Merge the supplied fields into `applicant`, leaving the rest unchanged.
    pub fn apply_to(&self, applicant: &mut Applicant) {
        if let Some(name) = &self.name {
            applicant.name = name.clone();
        }
        if let Some(email) = &self.email {
            applicant.email = email.clone();
        }
        if let Some(position) = &self.position {
            applicant.position = position.clone();
        }
        if let Some(status) = self.status {
            applicant.status = status;
        }
        if let Some(phone) = &self.phone {
            applicant.phone = Some(phone.clone());
        }
        if let Some(resume) = &self.resume {
            applicant.resume = Some(resume.clone());
        }
        if let Some(notes) = &self.notes {
            applicant.notes = Some(notes.clone());
        }
    }
}

/// Pagination window for listings. Both values are 1-based and positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub const DEFAULT_PAGE: u32 = 1;
    pub const DEFAULT_LIMIT: u32 = 10;

    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: if page == 0 { Self::DEFAULT_PAGE } else { page },
            limit: if limit == 0 { Self::DEFAULT_LIMIT } else { limit },
        }
    }

    /// Parse raw query values. Absent, non-numeric, zero or negative values
    /// fall back to the defaults. `limit` has no upper bound.
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        let parse = |raw: Option<&str>| {
            raw.and_then(|value| value.trim().parse::<u32>().ok())
                .unwrap_or(0)
        };
        Self::new(parse(page), parse(limit))
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PAGE, Self::DEFAULT_LIMIT)
    }
}

/// Listing response body: the page of records plus the window echoed back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantPage {
    pub data: Vec<Applicant>,
    pub page: u32,
    pub limit: u32,
}
