use serde::Serialize;
use serde_json::json;

use crate::api::client::{ApiClient, Body, Method};
use crate::error::ServiceResult;
use crate::types::{CollaborationType, Proposal, ProposalStatus, ProposalTerms, RecordId};
use crate::validation::{ValidationErrors, validate_proposal};

/// Body of `POST /proposals/<type>/`.
#[derive(Debug, Serialize)]
struct NewProposal<'a> {
    help_request: &'a RecordId,
    #[serde(flatten)]
    terms: &'a ProposalTerms,
}

fn collection_path(kind: CollaborationType) -> String {
    format!("/proposals/{}/", kind.as_str())
}

fn item_path(kind: CollaborationType, id: &RecordId) -> String {
    format!("/proposals/{}/{id}/", kind.as_str())
}

impl ApiClient {
    pub fn list_proposals(&self, kind: CollaborationType) -> ServiceResult<Vec<Proposal>> {
        self.get_list(&collection_path(kind))
    }

    pub fn get_proposal(&self, kind: CollaborationType, id: &RecordId) -> ServiceResult<Proposal> {
        self.request_as(Method::Get, &item_path(kind, id), None)
    }

    pub fn submit_proposal(
        &self,
        help_request: &RecordId,
        terms: &ProposalTerms,
    ) -> ServiceResult<Proposal> {
        validate_proposal(terms)?;
        let body = NewProposal {
            help_request,
            terms,
        };
        self.request_as(
            Method::Post,
            &collection_path(terms.kind()),
            Some(Body::json(&body)?),
        )
    }

    /// Entrepreneur's answer to a pending proposal.
    pub fn respond_to_proposal(
        &self,
        proposal: &Proposal,
        decision: ProposalStatus,
    ) -> ServiceResult<Proposal> {
        if !proposal.status.can_transition_to(decision) {
            let mut errors = ValidationErrors::new();
            errors.add(
                "status",
                format!(
                    "A {} proposal cannot become {}.",
                    proposal.status.as_str(),
                    decision.as_str()
                ),
            );
            return Err(errors.into());
        }
        self.request_as(
            Method::Post,
            &item_path(proposal.terms.kind(), &proposal.id),
            Some(Body::Json(json!({ "status": decision }))),
        )
    }

    pub fn delete_proposal(&self, kind: CollaborationType, id: &RecordId) -> ServiceResult<()> {
        self.request(Method::Delete, &item_path(kind, id), None)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{blocking, client_for};
    use crate::error::ServiceError;
    use crate::types::{Amount, CollaborationType, ProposalStatus, ProposalTerms, RecordId, Role};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn financial(status: &str) -> serde_json::Value {
        json!({
            "id": 8, "help_request": 40, "status": status, "type": "financial",
            "investment_amount": "5000", "payment_schedule": "quarterly",
            "expected_return": "8%"
        })
    }

    #[tokio::test]
    async fn submit_routes_by_type() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/proposals/financial/"))
            .and(body_json(json!({
                "help_request": 40, "type": "financial",
                "investment_amount": "5000", "payment_schedule": "quarterly",
                "expected_return": "8%"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(financial("pending")))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _) = client_for(&server.uri(), Role::Investor);
        let proposal = blocking(move || {
            client.submit_proposal(
                &RecordId::Int(40),
                &ProposalTerms::Financial {
                    investment_amount: Amount::from("5000"),
                    payment_schedule: "quarterly".into(),
                    expected_return: "8%".into(),
                },
            )
        })
        .await
        .unwrap();
        assert_eq!(proposal.terms.kind(), CollaborationType::Financial);
    }

    #[tokio::test]
    async fn accept_then_refuse_is_blocked() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/proposals/financial/8/"))
            .and(body_json(json!({"status": "accepted"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(financial("accepted")))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _) = client_for(&server.uri(), Role::Entrepreneur);
        let pending: crate::types::Proposal = serde_json::from_value(financial("pending")).unwrap();
        let (accepted, again) = blocking(move || {
            let accepted = client
                .respond_to_proposal(&pending, ProposalStatus::Accepted)
                .unwrap();
            let again = client.respond_to_proposal(&accepted, ProposalStatus::Refused);
            (accepted, again)
        })
        .await;
        assert_eq!(accepted.status, ProposalStatus::Accepted);
        assert!(matches!(again, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn delete_uses_item_path() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/proposals/technical/3/"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _) = client_for(&server.uri(), Role::Investor);
        let result =
            blocking(move || client.delete_proposal(CollaborationType::Technical, &RecordId::Int(3)))
                .await;
        assert!(result.is_ok());
    }
}
