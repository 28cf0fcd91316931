use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Backend identifiers arrive as integers or strings depending on the
/// endpoint; both forms compare by value. Numeric strings are stored as
/// `Int`, so `7` and `"7"` are the same id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Text(String),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(n) => RecordId::Int(n),
            Raw::Text(s) => RecordId::from(s.as_str()),
        })
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(n) => write!(f, "{n}"),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId::Int(n)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        match s.parse::<i64>() {
            Ok(n) => RecordId::Int(n),
            Err(_) => RecordId::Text(s.to_string()),
        }
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId::from(s.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "entrepreneur")]
    Entrepreneur,
    #[serde(rename = "investor")]
    Investor,
    #[serde(rename = "ONG-Association")]
    Association,
    #[serde(rename = "admin")]
    Admin,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Entrepreneur, Role::Investor, Role::Association, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Entrepreneur => "entrepreneur",
            Role::Investor => "investor",
            Role::Association => "ONG-Association",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "entrepreneur" => Ok(Role::Entrepreneur),
            "investor" | "investors" => Ok(Role::Investor),
            "ong-association" | "association" | "ong" => Ok(Role::Association),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Unknown role: {s}")),
        }
    }
}

/// Money as the backend sends it: a JSON number or a numeric string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(f64),
    Text(String),
}

impl Amount {
    /// Returns the value only when it is a finite number.
    pub fn parse(&self) -> Option<f64> {
        let value = match self {
            Amount::Number(n) => *n,
            Amount::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for Amount {
    fn from(n: f64) -> Self {
        Amount::Number(n)
    }
}

impl From<&str> for Amount {
    fn from(s: &str) -> Self {
        Amount::Text(s.to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollaborationType {
    Financial,
    Technical,
}

impl CollaborationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollaborationType::Financial => "financial",
            CollaborationType::Technical => "technical",
        }
    }
}

impl fmt::Display for CollaborationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollaborationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "financial" => Ok(CollaborationType::Financial),
            "technical" => Ok(CollaborationType::Technical),
            _ => Err(format!("Unknown collaboration type: {s}")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntrepreneurDetails {
    pub id: RecordId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContractDetails {
    pub id: RecordId,
    #[serde(default)]
    pub investment_amount: Option<Amount>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CollaborationRecord {
    pub id: RecordId,
    pub entrepreneur_details: EntrepreneurDetails,
    pub project_name: String,
    pub collaboration_type: CollaborationType,
    #[serde(default)]
    pub contract_details: Option<ContractDetails>,
    #[serde(default)]
    pub start_date: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Pending,
    Approved,
    Rejected,
}

impl ProjectStatus {
    /// Only a pending project can be decided, and only once.
    pub fn can_transition_to(self, next: ProjectStatus) -> bool {
        matches!(
            (self, next),
            (ProjectStatus::Pending, ProjectStatus::Approved)
                | (ProjectStatus::Pending, ProjectStatus::Rejected)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Pending => "pending",
            ProjectStatus::Approved => "approved",
            ProjectStatus::Rejected => "rejected",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub funding_goal: Option<Amount>,
    pub status: ProjectStatus,
    #[serde(default)]
    pub document: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub funding_goal: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HelpRequest {
    pub id: RecordId,
    pub project: RecordId,
    pub request_type: CollaborationType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub amount_requested: Option<Amount>,
    #[serde(default)]
    pub expertise_needed: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    Pending,
    Accepted,
    Refused,
}

impl ProposalStatus {
    pub fn can_transition_to(self, next: ProposalStatus) -> bool {
        matches!(
            (self, next),
            (ProposalStatus::Pending, ProposalStatus::Accepted)
                | (ProposalStatus::Pending, ProposalStatus::Refused)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Pending => "pending",
            ProposalStatus::Accepted => "accepted",
            ProposalStatus::Refused => "refused",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProposalTerms {
    Financial {
        investment_amount: Amount,
        payment_schedule: String,
        expected_return: String,
    },
    Technical {
        expertise: String,
        support_duration: String,
        proposed_approach: String,
    },
}

impl ProposalTerms {
    pub fn kind(&self) -> CollaborationType {
        match self {
            ProposalTerms::Financial { .. } => CollaborationType::Financial,
            ProposalTerms::Technical { .. } => CollaborationType::Technical,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: RecordId,
    pub help_request: RecordId,
    #[serde(default)]
    pub investor: Option<RecordId>,
    pub status: ProposalStatus,
    #[serde(flatten)]
    pub terms: ProposalTerms,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: RecordId,
    #[serde(default)]
    pub collaboration: Option<RecordId>,
    #[serde(default)]
    pub investment_amount: Option<Amount>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Raw bytes returned by the contract view/download endpoints.
#[derive(Clone, Debug, PartialEq)]
pub struct Blob {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PublicationStatus {
    #[default]
    Draft,
    Published,
}

impl PublicationStatus {
    /// Publication is one way.
    pub fn can_transition_to(self, next: PublicationStatus) -> bool {
        self == next || (self == PublicationStatus::Draft && next == PublicationStatus::Published)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PublicationStatus::Draft => "draft",
            PublicationStatus::Published => "published",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: RecordId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub status: PublicationStatus,
}

/// Full event body, used for creation and `PUT`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub location: String,
    pub start_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub status: PublicationStatus,
}

impl From<&Event> for EventDraft {
    fn from(event: &Event) -> Self {
        Self {
            title: event.title.clone(),
            description: event.description.clone(),
            location: event.location.clone(),
            start_date: event.start_date.clone(),
            end_date: event.end_date.clone(),
            status: event.status,
        }
    }
}

/// Partial event body for `PATCH`; absent fields are left untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct EventPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PublicationStatus>,
}

impl EventPatch {
    pub fn publish() -> Self {
        Self {
            status: Some(PublicationStatus::Published),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: RecordId,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub status: PublicationStatus,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnnouncementDraft {
    pub title: String,
    pub content: String,
    pub status: PublicationStatus,
    pub image: Option<Attachment>,
}

/// A file picked by the user for a multipart upload.
#[derive(Clone, Debug, PartialEq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: RecordId,
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub date_joined: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct UserStats {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub entrepreneurs: u64,
    #[serde(default)]
    pub investors: u64,
    #[serde(default)]
    pub associations: u64,
    #[serde(default)]
    pub admins: u64,
    #[serde(default)]
    pub active: u64,
}

/// Fields specific to each role's profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role")]
pub enum RoleProfile {
    #[serde(rename = "entrepreneur")]
    Entrepreneur {
        company_name: String,
        sector: String,
    },
    #[serde(rename = "investor")]
    Investor {
        investment_capacity: Amount,
        #[serde(default)]
        preferred_sectors: Vec<String>,
    },
    #[serde(rename = "ONG-Association")]
    Association {
        organization_name: String,
        mission: String,
    },
    #[serde(rename = "admin")]
    Admin {},
}

impl RoleProfile {
    pub fn role(&self) -> Role {
        match self {
            RoleProfile::Entrepreneur { .. } => Role::Entrepreneur,
            RoleProfile::Investor { .. } => Role::Investor,
            RoleProfile::Association { .. } => Role::Association,
            RoleProfile::Admin {} => Role::Admin,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(flatten)]
    pub details: RoleProfile,
}
