use rocket_db_pools::sqlx::FromRow;
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};

// ===== Stored Rows =====

/// Active mailing-list entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, JsonSchema)]
pub struct Recipient {
    pub id: i32,
    pub name: String,
    pub email: String,
}

/// Recipient that unsubscribed and must never be mailed again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, JsonSchema)]
pub struct ExcludedRecipient {
    pub id: i32,
    pub name: String,
    pub email: String,
}

/// One row of the send history. Counters are written once and never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CampaignRecord {
    pub id: i32,
    pub campaign_name: String,
    pub opens_count: i32,
    pub clicks_count: i32,
}

// ===== Input Rows =====

/// Name/email pair read from an uploaded file or written to an export.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub email: String,
}

impl Contact {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

impl From<ExcludedRecipient> for Contact {
    fn from(row: ExcludedRecipient) -> Self {
        Self {
            name: row.name,
            email: row.email,
        }
    }
}

impl From<Recipient> for Contact {
    fn from(row: Recipient) -> Self {
        Self {
            name: row.name,
            email: row.email,
        }
    }
}

// ===== Response Wrappers =====

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DataResponse<T> {
    pub data: T,
}
