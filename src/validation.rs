//! Client-side form validation.
//!
//! Every draft is checked here before it reaches the network. Errors are
//! field-scoped so a form can point at the offending input.

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

use crate::types::{
    Amount, AnnouncementDraft, CollaborationType, EventDraft, EventPatch, NewProject, NewUser,
    Profile, ProposalTerms, RoleProfile, UserPatch,
};

const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Default)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn for_field(&self, field: &str) -> Vec<&str> {
        self.errors
            .iter()
            .filter(|e| e.field == field)
            .map(|e| e.message.as_str())
            .collect()
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    fn required(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, "This field is required.");
        }
    }

    fn positive_amount(&mut self, field: &str, amount: &Amount) {
        match amount.parse() {
            Some(v) if v > 0.0 => {}
            Some(_) => self.add(field, "Amount must be greater than zero."),
            None => self.add(field, "Amount must be a number."),
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "invalid input ({})", parts.join("; "))
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
    })
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email.trim())
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

pub fn validate_new_user(user: &NewUser) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.required("username", &user.username);
    if !is_valid_email(&user.email) {
        errors.add("email", "Enter a valid e-mail address.");
    }
    if user.password.chars().count() < 8 {
        errors.add("password", "Password must be at least 8 characters.");
    }
    errors.into_result()
}

pub fn validate_user_patch(patch: &UserPatch) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if patch == &UserPatch::default() {
        errors.add("user", "Nothing to update.");
    }
    if let Some(username) = &patch.username {
        errors.required("username", username);
    }
    if let Some(email) = &patch.email
        && !is_valid_email(email)
    {
        errors.add("email", "Enter a valid e-mail address.");
    }
    errors.into_result()
}

pub fn validate_new_project(project: &NewProject) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.required("name", &project.name);
    errors.required("description", &project.description);
    if let Some(goal) = project.funding_goal
        && (!goal.is_finite() || goal <= 0.0)
    {
        errors.add("funding_goal", "Amount must be greater than zero.");
    }
    errors.into_result()
}

pub fn validate_upload(field: &str, file_name: &str, bytes: &[u8]) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.required(field, file_name);
    if bytes.is_empty() {
        errors.add(field, "File is empty.");
    } else if bytes.len() > MAX_UPLOAD_BYTES {
        errors.add(field, "File exceeds the 10 MB limit.");
    }
    errors.into_result()
}

/// Steps of the help request form, validated one at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HelpRequestStep {
    Project,
    Details,
    Review,
}

impl HelpRequestStep {
    pub fn next(self) -> Option<HelpRequestStep> {
        match self {
            HelpRequestStep::Project => Some(HelpRequestStep::Details),
            HelpRequestStep::Details => Some(HelpRequestStep::Review),
            HelpRequestStep::Review => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Default, Serialize)]
pub struct HelpRequestDraft {
    pub project: Option<crate::types::RecordId>,
    pub request_type: Option<CollaborationType>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_requested: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expertise_needed: Option<String>,
}

pub fn validate_help_request_step(
    draft: &HelpRequestDraft,
    step: HelpRequestStep,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    match step {
        HelpRequestStep::Project => {
            if draft.project.is_none() {
                errors.add("project", "Select a project.");
            }
            if draft.request_type.is_none() {
                errors.add("request_type", "Choose financial or technical support.");
            }
        }
        HelpRequestStep::Details => {
            errors.required("description", &draft.description);
            match draft.request_type {
                Some(CollaborationType::Financial) => match &draft.amount_requested {
                    Some(amount) => errors.positive_amount("amount_requested", amount),
                    None => errors.add("amount_requested", "This field is required."),
                },
                Some(CollaborationType::Technical) => {
                    errors.required(
                        "expertise_needed",
                        draft.expertise_needed.as_deref().unwrap_or(""),
                    );
                }
                None => {}
            }
        }
        HelpRequestStep::Review => {}
    }
    errors.into_result()
}

/// Runs every step in order; the first failing step stops the walk.
pub fn validate_help_request(draft: &HelpRequestDraft) -> Result<(), ValidationErrors> {
    let mut step = Some(HelpRequestStep::Project);
    while let Some(current) = step {
        validate_help_request_step(draft, current)?;
        step = current.next();
    }
    Ok(())
}

pub fn validate_proposal(terms: &ProposalTerms) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    match terms {
        ProposalTerms::Financial {
            investment_amount,
            payment_schedule,
            expected_return,
        } => {
            errors.positive_amount("investment_amount", investment_amount);
            errors.required("payment_schedule", payment_schedule);
            errors.required("expected_return", expected_return);
        }
        ProposalTerms::Technical {
            expertise,
            support_duration,
            proposed_approach,
        } => {
            errors.required("expertise", expertise);
            errors.required("support_duration", support_duration);
            errors.required("proposed_approach", proposed_approach);
        }
    }
    errors.into_result()
}

fn check_event_dates(errors: &mut ValidationErrors, start: Option<&str>, end: Option<&str>) {
    let start_date = start.map(|s| (s, parse_date(s)));
    let end_date = end.map(|s| (s, parse_date(s)));
    if let Some((_, None)) = start_date {
        errors.add("start_date", "Use the YYYY-MM-DD format.");
    }
    if let Some((_, None)) = end_date {
        errors.add("end_date", "Use the YYYY-MM-DD format.");
    }
    if let (Some((_, Some(s))), Some((_, Some(e)))) = (start_date, end_date)
        && e < s
    {
        errors.add("end_date", "End date cannot be before the start date.");
    }
}

pub fn validate_event(draft: &EventDraft) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.required("title", &draft.title);
    errors.required("location", &draft.location);
    if draft.start_date.trim().is_empty() {
        errors.add("start_date", "This field is required.");
    } else {
        check_event_dates(&mut errors, Some(&draft.start_date), draft.end_date.as_deref());
    }
    errors.into_result()
}

pub fn validate_event_patch(patch: &EventPatch) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if patch.is_empty() {
        errors.add("event", "Nothing to update.");
    }
    if let Some(title) = &patch.title {
        errors.required("title", title);
    }
    if let Some(location) = &patch.location {
        errors.required("location", location);
    }
    check_event_dates(&mut errors, patch.start_date.as_deref(), patch.end_date.as_deref());
    errors.into_result()
}

pub fn validate_announcement(draft: &AnnouncementDraft) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.required("title", &draft.title);
    errors.required("content", &draft.content);
    if let Some(image) = &draft.image {
        if !image.content_type.starts_with("image/") {
            errors.add("image", "Only image files can be attached.");
        }
        if let Err(upload) = validate_upload("image", &image.file_name, &image.bytes) {
            errors.errors.extend(upload.errors);
        }
    }
    errors.into_result()
}

pub fn validate_profile(profile: &Profile) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.required("first_name", &profile.first_name);
    errors.required("last_name", &profile.last_name);
    if let Some(phone) = &profile.phone
        && !phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')'))
    {
        errors.add("phone", "Phone number contains invalid characters.");
    }
    match &profile.details {
        RoleProfile::Entrepreneur {
            company_name,
            sector,
        } => {
            errors.required("company_name", company_name);
            errors.required("sector", sector);
        }
        RoleProfile::Investor {
            investment_capacity,
            ..
        } => errors.positive_amount("investment_capacity", investment_capacity),
        RoleProfile::Association {
            organization_name,
            mission,
        } => {
            errors.required("organization_name", organization_name);
            errors.required("mission", mission);
        }
        RoleProfile::Admin {} => {}
    }
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Attachment, PublicationStatus, RecordId, Role};

    fn event() -> EventDraft {
        EventDraft {
            title: "Forum".into(),
            description: String::new(),
            location: "Tunis".into(),
            start_date: "2026-05-10".into(),
            end_date: Some("2026-05-12".into()),
            status: PublicationStatus::Draft,
        }
    }

    #[test]
    fn new_user_rules() {
        let user = NewUser {
            username: " ".into(),
            email: "not-an-email".into(),
            password: "short".into(),
            role: Role::Investor,
        };
        let errors = validate_new_user(&user).unwrap_err();
        assert!(errors.has("username"));
        assert!(errors.has("email"));
        assert!(errors.has("password"));
    }

    #[test]
    fn help_request_steps_stop_at_first_failure() {
        let mut draft = HelpRequestDraft::default();
        let errors = validate_help_request(&draft).unwrap_err();
        assert!(errors.has("project"));
        assert!(!errors.has("description"));

        draft.project = Some(RecordId::Int(3));
        draft.request_type = Some(CollaborationType::Financial);
        draft.description = "Need seed money".into();
        draft.amount_requested = Some(Amount::from("-5"));
        let errors = validate_help_request(&draft).unwrap_err();
        assert_eq!(
            errors.for_field("amount_requested"),
            vec!["Amount must be greater than zero."]
        );

        draft.amount_requested = Some(Amount::from("2500"));
        assert!(validate_help_request(&draft).is_ok());
    }

    #[test]
    fn technical_help_request_needs_expertise() {
        let draft = HelpRequestDraft {
            project: Some(RecordId::Int(1)),
            request_type: Some(CollaborationType::Technical),
            description: "Mobile app".into(),
            ..Default::default()
        };
        let errors = validate_help_request_step(&draft, HelpRequestStep::Details).unwrap_err();
        assert!(errors.has("expertise_needed"));
    }

    #[test]
    fn proposal_variants() {
        let bad = ProposalTerms::Financial {
            investment_amount: Amount::from("abc"),
            payment_schedule: "monthly".into(),
            expected_return: "".into(),
        };
        let errors = validate_proposal(&bad).unwrap_err();
        assert_eq!(errors.for_field("investment_amount"), vec!["Amount must be a number."]);
        assert!(errors.has("expected_return"));

        let good = ProposalTerms::Technical {
            expertise: "Rust".into(),
            support_duration: "6 weeks".into(),
            proposed_approach: "Code review".into(),
        };
        assert!(validate_proposal(&good).is_ok());
    }

    #[test]
    fn event_dates_must_be_ordered() {
        assert!(validate_event(&event()).is_ok());
        let mut draft = event();
        draft.end_date = Some("2026-05-01".into());
        assert!(validate_event(&draft).unwrap_err().has("end_date"));
        draft.start_date = "10/05/2026".into();
        assert!(validate_event(&draft).unwrap_err().has("start_date"));
    }

    #[test]
    fn empty_event_patch_is_rejected() {
        assert!(validate_event_patch(&EventPatch::default()).is_err());
        assert!(validate_event_patch(&EventPatch::publish()).is_ok());
    }

    #[test]
    fn announcement_image_must_be_an_image() {
        let draft = AnnouncementDraft {
            title: "Call for volunteers".into(),
            content: "Join us".into(),
            status: PublicationStatus::Draft,
            image: Some(Attachment {
                file_name: "notes.txt".into(),
                content_type: "text/plain".into(),
                bytes: b"hello".to_vec(),
            }),
        };
        assert!(validate_announcement(&draft).unwrap_err().has("image"));
    }

    #[test]
    fn investor_profile_needs_capacity() {
        let profile = Profile {
            first_name: "Sami".into(),
            last_name: "K".into(),
            phone: Some("+216 22 333 444".into()),
            bio: None,
            details: RoleProfile::Investor {
                investment_capacity: Amount::from("0"),
                preferred_sectors: vec![],
            },
        };
        let errors = validate_profile(&profile).unwrap_err();
        assert!(errors.has("investment_capacity"));
        assert!(!errors.has("phone"));
    }
}
