use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Applicant,
    Interested,
    InReview,
    Interviewing,
    Interviewed,
    OfferExtended,
    Accepted,
    Rejected,
    Waitlisted,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Applicant => "applicant",
            ApplicationStatus::Interested => "interested",
            ApplicationStatus::InReview => "in_review",
            ApplicationStatus::Interviewing => "interviewing",
            ApplicationStatus::Interviewed => "interviewed",
            ApplicationStatus::OfferExtended => "offer_extended",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Waitlisted => "waitlisted",
        }
    }

    // Workflow position, used for display ordering only.
    pub fn stage(&self) -> u8 {
        match self {
            ApplicationStatus::Applicant => 0,
            ApplicationStatus::Interested => 1,
            ApplicationStatus::InReview => 2,
            ApplicationStatus::Interviewing => 3,
            ApplicationStatus::Interviewed => 4,
            ApplicationStatus::OfferExtended => 5,
            ApplicationStatus::Accepted => 6,
            ApplicationStatus::Rejected => 7,
            ApplicationStatus::Waitlisted => 8,
        }
    }

    // Any distinct status may follow any other; stage order is not enforced.
    pub fn permits_transition(from: ApplicationStatus, to: ApplicationStatus) -> bool {
        from != to
    }
}

impl std::str::FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "applicant" => Ok(ApplicationStatus::Applicant),
            "interested" => Ok(ApplicationStatus::Interested),
            "in_review" => Ok(ApplicationStatus::InReview),
            "interviewing" => Ok(ApplicationStatus::Interviewing),
            "interviewed" => Ok(ApplicationStatus::Interviewed),
            "offer_extended" => Ok(ApplicationStatus::OfferExtended),
            "accepted" => Ok(ApplicationStatus::Accepted),
            "rejected" => Ok(ApplicationStatus::Rejected),
            "waitlisted" => Ok(ApplicationStatus::Waitlisted),
            other => Err(format!("unknown application status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub seeker_id: Uuid,
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationsDoc {
    pub applications: Vec<Application>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub id: Uuid,
    pub application_id: Uuid,
    pub old_status: ApplicationStatus,
    pub new_status: ApplicationStatus,
    pub changed_at: DateTime<Utc>,
    pub changed_by: Option<Uuid>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusHistoryDoc {
    pub entries: Vec<StatusHistoryEntry>,
}
