use crate::api::client::{ApiClient, Body, Method};
use crate::error::ServiceResult;
use crate::types::{Event, EventDraft, EventPatch, PublicationStatus, RecordId};
use crate::validation::{ValidationErrors, validate_event, validate_event_patch};

fn event_path(id: &RecordId) -> String {
    format!("/events/{id}/")
}

impl ApiClient {
    pub fn list_events(&self) -> ServiceResult<Vec<Event>> {
        self.get_list("/events/")
    }

    pub fn create_event(&self, draft: &EventDraft) -> ServiceResult<Event> {
        validate_event(draft)?;
        self.request_as(Method::Post, "/events/", Some(Body::json(draft)?))
    }

    /// Partial update; `current` guards the one-way publication status.
    pub fn patch_event(&self, current: &Event, patch: &EventPatch) -> ServiceResult<Event> {
        validate_event_patch(patch)?;
        check_status(current.status, patch.status)?;
        self.request_as(Method::Patch, &event_path(&current.id), Some(Body::json(patch)?))
    }

    /// Full replacement of the event.
    pub fn replace_event(&self, current: &Event, draft: &EventDraft) -> ServiceResult<Event> {
        validate_event(draft)?;
        check_status(current.status, Some(draft.status))?;
        self.request_as(Method::Put, &event_path(&current.id), Some(Body::json(draft)?))
    }

    pub fn publish_event(&self, current: &Event) -> ServiceResult<Event> {
        self.patch_event(current, &EventPatch::publish())
    }

    pub fn delete_event(&self, id: &RecordId) -> ServiceResult<()> {
        self.request(Method::Delete, &event_path(id), None)?;
        Ok(())
    }
}

fn check_status(
    current: PublicationStatus,
    next: Option<PublicationStatus>,
) -> Result<(), ValidationErrors> {
    match next {
        Some(next) if !current.can_transition_to(next) => {
            let mut errors = ValidationErrors::new();
            errors.add("status", "A published event cannot go back to draft.");
            Err(errors)
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{blocking, client_for};
    use crate::error::ServiceError;
    use crate::types::{Event, EventDraft, EventPatch, PublicationStatus, Role};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn event_json(status: &str) -> serde_json::Value {
        json!({
            "id": 6, "title": "Hackathon", "description": "", "location": "Sfax",
            "start_date": "2026-11-02", "end_date": null, "status": status
        })
    }

    #[tokio::test]
    async fn publish_is_a_patch() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/events/6/"))
            .and(body_json(json!({"status": "published"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(event_json("published")))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _) = client_for(&server.uri(), Role::Association);
        let draft: Event = serde_json::from_value(event_json("draft")).unwrap();
        let published = blocking(move || client.publish_event(&draft)).await.unwrap();
        assert_eq!(published.status, PublicationStatus::Published);
    }

    #[tokio::test]
    async fn put_sends_the_whole_event() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/events/6/"))
            .and(body_json(json!({
                "title": "Hackathon 2026", "description": "", "location": "Sfax",
                "start_date": "2026-11-02", "status": "draft"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(event_json("draft")))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _) = client_for(&server.uri(), Role::Association);
        let current: Event = serde_json::from_value(event_json("draft")).unwrap();
        let result = blocking(move || {
            let mut draft = EventDraft::from(&current);
            draft.title = "Hackathon 2026".into();
            client.replace_event(&current, &draft)
        })
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn unpublish_is_refused_locally() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let (client, _) = client_for(&server.uri(), Role::Association);
        let published: Event = serde_json::from_value(event_json("published")).unwrap();
        let err = blocking(move || {
            client.patch_event(
                &published,
                &EventPatch {
                    status: Some(PublicationStatus::Draft),
                    ..Default::default()
                },
            )
        })
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref v) if v.has("status")));
    }
}
