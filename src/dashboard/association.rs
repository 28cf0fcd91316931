use crate::dashboard::{Loadable, Navigation, ViewScope};
use crate::error::{ServiceError, ServiceResult};
use crate::types::{
    Announcement, AnnouncementDraft, Event, EventDraft, EventPatch, PublicationStatus, RecordId,
    Role,
};

pub struct AssociationDashboard {
    scope: ViewScope,
    pub events: Loadable<Vec<Event>>,
    pub announcements: Loadable<Vec<Announcement>>,
}

impl AssociationDashboard {
    pub const ROUTE: &'static str = "/association/dashboard";
    pub const ROLES: &'static [Role] = &[Role::Association];

    pub fn new(scope: ViewScope) -> Self {
        Self {
            scope,
            events: Loadable::default(),
            announcements: Loadable::default(),
        }
    }

    pub async fn mount(&mut self) -> Navigation {
        self.events.begin();
        self.announcements.begin();
        let (events, announcements) = tokio::join!(
            self.scope.fetch(|c| c.list_events()),
            self.scope.fetch(|c| c.list_announcements()),
        );
        self.events
            .apply(events)
            .merge(self.announcements.apply(announcements))
    }

    fn find_event(&self, id: &RecordId) -> ServiceResult<Event> {
        self.events
            .require("Events")?
            .iter()
            .find(|e| &e.id == id)
            .cloned()
            .ok_or_else(|| ServiceError::Other(format!("Event {id} is not in the list")))
    }

    fn store_event(&mut self, updated: &Event) {
        if let Some(slot) = self
            .events
            .data
            .as_mut()
            .and_then(|list| list.iter_mut().find(|e| e.id == updated.id))
        {
            *slot = updated.clone();
        }
    }

    pub fn drafts(&self) -> Vec<&Event> {
        self.events
            .data
            .iter()
            .flatten()
            .filter(|e| e.status == PublicationStatus::Draft)
            .collect()
    }

    pub async fn create_event(&mut self, draft: EventDraft) -> ServiceResult<Event> {
        let created = self.scope.fetch(move |c| c.create_event(&draft)).await?;
        if let Some(events) = self.events.data.as_mut() {
            events.push(created.clone());
        }
        Ok(created)
    }

    pub async fn patch_event(&mut self, id: RecordId, patch: EventPatch) -> ServiceResult<Event> {
        let current = self.find_event(&id)?;
        let updated = self
            .scope
            .fetch(move |c| c.patch_event(&current, &patch))
            .await?;
        self.store_event(&updated);
        Ok(updated)
    }

    pub async fn replace_event(&mut self, id: RecordId, draft: EventDraft) -> ServiceResult<Event> {
        let current = self.find_event(&id)?;
        let updated = self
            .scope
            .fetch(move |c| c.replace_event(&current, &draft))
            .await?;
        self.store_event(&updated);
        Ok(updated)
    }

    pub async fn publish_event(&mut self, id: RecordId) -> ServiceResult<Event> {
        let current = self.find_event(&id)?;
        if current.status == PublicationStatus::Published {
            return Ok(current);
        }
        let updated = self.scope.fetch(move |c| c.publish_event(&current)).await?;
        self.store_event(&updated);
        Ok(updated)
    }

    pub async fn delete_event(&mut self, id: RecordId) -> ServiceResult<()> {
        let target = id.clone();
        self.scope.fetch(move |c| c.delete_event(&target)).await?;
        if let Some(events) = self.events.data.as_mut() {
            events.retain(|e| e.id != id);
        }
        Ok(())
    }

    /// Newest announcement goes first, matching the backend's ordering.
    pub async fn create_announcement(
        &mut self,
        draft: AnnouncementDraft,
    ) -> ServiceResult<Announcement> {
        let created = self
            .scope
            .fetch(move |c| c.create_announcement(&draft))
            .await?;
        if let Some(list) = self.announcements.data.as_mut() {
            list.insert(0, created.clone());
        }
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::client_for;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mounted() -> (MockServer, AssociationDashboard) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/events/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "title": "Clean-up day", "location": "Beach", "start_date": "2026-06-01", "status": "draft"},
                {"id": 2, "title": "Gala", "location": "Hall", "start_date": "2026-07-01", "status": "published"}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/announcements/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        let (client, _) = client_for(&server.uri(), Role::Association);
        let mut dash = AssociationDashboard::new(ViewScope::new(client));
        assert_eq!(dash.mount().await, Navigation::Stay);
        (server, dash)
    }

    #[tokio::test]
    async fn publish_moves_event_out_of_drafts() {
        let (server, mut dash) = mounted().await;
        Mock::given(method("PATCH"))
            .and(path("/events/1/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 1, "title": "Clean-up day", "location": "Beach",
                "start_date": "2026-06-01", "status": "published"
            })))
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(dash.drafts().len(), 1);
        dash.publish_event(RecordId::Int(1)).await.unwrap();
        assert!(dash.drafts().is_empty());

        // already published: no request
        dash.publish_event(RecordId::Int(2)).await.unwrap();
    }

    #[tokio::test]
    async fn failed_delete_keeps_the_event() {
        let (server, mut dash) = mounted().await;
        Mock::given(method("DELETE"))
            .and(path("/events/2/"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({"detail": "Event has registrations"})))
            .mount(&server)
            .await;

        let err = dash.delete_event(RecordId::Int(2)).await.unwrap_err();
        assert_eq!(err.user_message(), "HTTP 409: Event has registrations");
        assert_eq!(dash.events.data.as_ref().map(Vec::len), Some(2));
    }
}
