use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Lifecycle of an exchange request:
/// `Pending -> Accepted | Rejected`, `Accepted -> Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "request_status")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "Pending",
            RequestStatus::Accepted => "Accepted",
            RequestStatus::Rejected => "Rejected",
            RequestStatus::Completed => "Completed",
        }
    }

    /// Lowercase form used in user-facing messages.
    pub fn label(self) -> String {
        self.as_str().to_lowercase()
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RequestStatus::Rejected | RequestStatus::Completed)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(RequestStatus::Pending),
            "Accepted" => Ok(RequestStatus::Accepted),
            "Rejected" => Ok(RequestStatus::Rejected),
            "Completed" => Ok(RequestStatus::Completed),
            _ => Err(()),
        }
    }
}

/// Exchange request record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct ExchangeRequest {
    pub id: Uuid,
    pub skill_id: Uuid,
    pub from_user_id: Uuid, // requester
    pub to_user_id: Uuid,   // skill owner at creation time
    pub message: String,
    pub status: RequestStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewExchangeRequest {
    pub id: Uuid,
    pub skill_id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub message: String,
}

/// Which side of a request the listing user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Sent,
    Received,
    Either,
}

impl Party {
    /// `sent` and `received` select one side; anything else selects both.
    pub fn from_query(raw: Option<&str>) -> Self {
        match raw {
            Some("sent") => Party::Sent,
            Some("received") => Party::Received,
            _ => Party::Either,
        }
    }

    pub fn includes_sent(self) -> bool {
        matches!(self, Party::Sent | Party::Either)
    }

    pub fn includes_received(self) -> bool {
        matches!(self, Party::Received | Party::Either)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RequestFilter {
    pub user_id: Uuid,
    pub party: Party,
    pub status: Option<RequestStatus>,
}
