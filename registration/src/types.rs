//! Domain types for running event registration.
//!
//! A [`RunningEvent`] owns its [`Participant`]s. Participants are created once by
//! the registration workflow and never modified afterwards; the waiting-list
//! flag is fixed at creation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a running event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random `EventId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `EventId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a participant
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantId(Uuid);

impl ParticipantId {
    /// Creates a new random `ParticipantId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `ParticipantId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ParticipantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Value Objects
// ============================================================================

/// T-shirt size chosen at registration
///
/// [`TShirtSize::None`] means the participant already owns an event shirt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TShirtSize {
    /// Extra small
    #[serde(rename = "XS")]
    Xs,
    /// Small
    S,
    /// Medium
    M,
    /// Large
    L,
    /// Extra large
    #[serde(rename = "XL")]
    Xl,
    /// Double extra large
    #[serde(rename = "XXL")]
    Xxl,
    /// No shirt needed
    #[serde(rename = "NO")]
    None,
}

impl TShirtSize {
    /// All sizes in display order
    pub const ALL: [Self; 7] = [
        Self::Xs,
        Self::S,
        Self::M,
        Self::L,
        Self::Xl,
        Self::Xxl,
        Self::None,
    ];

    /// Stored code (`XS` .. `XXL`, `NO`)
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Xs => "XS",
            Self::S => "S",
            Self::M => "M",
            Self::L => "L",
            Self::Xl => "XL",
            Self::Xxl => "XXL",
            Self::None => "NO",
        }
    }

    /// Human readable label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Xs => "Extra Small",
            Self::S => "Small",
            Self::M => "Medium",
            Self::L => "Large",
            Self::Xl => "Extra Large",
            Self::Xxl => "Double Extra Large",
            Self::None => "I already have a t-shirt",
        }
    }
}

impl fmt::Display for TShirtSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error for an unknown t-shirt size code
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown t-shirt size: {0}")]
pub struct UnknownTShirtSize(pub String);

impl FromStr for TShirtSize {
    type Err = UnknownTShirtSize;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|size| size.code() == s)
            .ok_or_else(|| UnknownTShirtSize(s.to_string()))
    }
}

/// Natural duplicate key of a participant within one event
///
/// Comparison is exact and case-sensitive.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DuplicateKey {
    /// Full name
    pub name: String,
    /// Department
    pub department: String,
    /// Year of birth
    pub year_of_birth: i32,
}

// ============================================================================
// Entities
// ============================================================================

/// A running event participants can register for
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningEvent {
    /// Event ID
    pub id: EventId,
    /// Event name
    pub name: String,
    /// Day of the run
    pub date: NaiveDate,
    /// Where the run takes place
    pub location: String,
    /// Free text description
    pub description: String,
    /// Last day registration is accepted (inclusive); `None` keeps it open
    pub registration_deadline: Option<NaiveDate>,
    /// Capacity; `None` means unlimited
    pub max_participants: Option<NonZeroU32>,
    /// When the event was created
    pub created_at: DateTime<Utc>,
}

/// Fields of an event to be created by an administrator
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    /// Event name
    pub name: String,
    /// Day of the run
    pub date: NaiveDate,
    /// Where the run takes place
    pub location: String,
    /// Free text description
    pub description: String,
    /// Last day registration is accepted
    pub registration_deadline: Option<NaiveDate>,
    /// Capacity
    pub max_participants: Option<NonZeroU32>,
}

/// A registered participant
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Participant ID
    pub id: ParticipantId,
    /// Owning event
    pub event_id: EventId,
    /// Full name
    pub name: String,
    /// Department
    pub department: String,
    /// Year of birth
    pub year_of_birth: i32,
    /// Chosen t-shirt size
    pub tshirt_size: TShirtSize,
    /// Contact email
    pub email: String,
    /// Accepted after capacity was reached
    pub on_waiting_list: bool,
    /// Registration time, set once
    pub registered_at: DateTime<Utc>,
}

impl Participant {
    /// The (name, department, year of birth) triple
    #[must_use]
    pub fn duplicate_key(&self) -> DuplicateKey {
        DuplicateKey {
            name: self.name.clone(),
            department: self.department.clone(),
            year_of_birth: self.year_of_birth,
        }
    }
}

/// Raw registration form input
///
/// Every field is optional and accepts any JSON scalar, so that missing or
/// mistyped fields surface as per-field validation messages rather than
/// deserialization failures.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Applicant {
    /// Full name
    #[serde(default, deserialize_with = "form_text")]
    pub name: Option<String>,
    /// Department
    #[serde(default, deserialize_with = "form_text")]
    pub department: Option<String>,
    /// Year of birth, as submitted (number or numeric string)
    #[serde(default)]
    pub year_of_birth: Option<serde_json::Value>,
    /// T-shirt size code
    #[serde(default, deserialize_with = "form_text")]
    pub tshirt_size: Option<String>,
    /// Contact email
    #[serde(default, deserialize_with = "form_text")]
    pub email: Option<String>,
}

/// Text form field: strings as-is, other values in their JSON notation
fn form_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}

/// Applicant data that passed field validation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidApplicant {
    /// Full name (trimmed)
    pub name: String,
    /// Department (trimmed)
    pub department: String,
    /// Year of birth
    pub year_of_birth: i32,
    /// T-shirt size
    pub tshirt_size: TShirtSize,
    /// Contact email (trimmed)
    pub email: String,
}

impl ValidApplicant {
    /// The (name, department, year of birth) triple
    #[must_use]
    pub fn duplicate_key(&self) -> DuplicateKey {
        DuplicateKey {
            name: self.name.clone(),
            department: self.department.clone(),
            year_of_birth: self.year_of_birth,
        }
    }
}

/// A participant record to be inserted
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewParticipant {
    /// Owning event
    pub event_id: EventId,
    /// Validated applicant data
    pub applicant: ValidApplicant,
    /// Placement decided by the workflow
    pub on_waiting_list: bool,
    /// Registration time
    pub registered_at: DateTime<Utc>,
}

impl NewParticipant {
    /// Materialize the participant with a fresh ID
    #[must_use]
    pub fn into_participant(self, on_waiting_list: bool) -> Participant {
        Participant {
            id: ParticipantId::new(),
            event_id: self.event_id,
            name: self.applicant.name,
            department: self.applicant.department,
            year_of_birth: self.applicant.year_of_birth,
            tshirt_size: self.applicant.tshirt_size,
            email: self.applicant.email,
            on_waiting_list,
            registered_at: self.registered_at,
        }
    }
}
