use crate::api::client::{ApiClient, Body, Method};
use crate::error::ServiceResult;
use crate::types::{HelpRequest, RecordId};
use crate::validation::{HelpRequestDraft, validate_help_request};

impl ApiClient {
    pub fn get_help_request(&self, id: &RecordId) -> ServiceResult<HelpRequest> {
        self.request_as(Method::Get, &format!("/help-requests/{id}/"), None)
    }

    pub fn create_help_request(&self, draft: &HelpRequestDraft) -> ServiceResult<HelpRequest> {
        validate_help_request(draft)?;
        self.request_as(Method::Post, "/help-requests/", Some(Body::json(draft)?))
    }
}
