use crate::api::client::{ApiClient, Body, Method};
use crate::api::multipart::Multipart;
use crate::error::ServiceResult;
use crate::types::{Announcement, AnnouncementDraft};
use crate::validation::validate_announcement;

impl ApiClient {
    pub fn list_announcements(&self) -> ServiceResult<Vec<Announcement>> {
        self.get_list("/announcements/")
    }

    /// Always sent as multipart since the backend accepts an optional image.
    pub fn create_announcement(&self, draft: &AnnouncementDraft) -> ServiceResult<Announcement> {
        validate_announcement(draft)?;
        let mut form = Multipart::new()
            .text("title", draft.title.trim())
            .text("content", draft.content.as_str())
            .text("status", draft.status.as_str());
        if let Some(image) = &draft.image {
            form = form.file("image", image.clone());
        }
        self.request_as(Method::Post, "/announcements/", Some(Body::Multipart(form)))
    }
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{blocking, client_for};
    use crate::types::{AnnouncementDraft, Attachment, PublicationStatus, Role};
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn image_goes_in_the_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/announcements/"))
            .and(body_string_contains("name=\"image\"; filename=\"poster.png\""))
            .and(body_string_contains("Collecte de fonds"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 3, "title": "Collecte de fonds", "content": "Samedi",
                "image": "/media/poster.png", "status": "published"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _) = client_for(&server.uri(), Role::Association);
        let created = blocking(move || {
            client.create_announcement(&AnnouncementDraft {
                title: "Collecte de fonds".into(),
                content: "Samedi".into(),
                status: PublicationStatus::Published,
                image: Some(Attachment {
                    file_name: "poster.png".into(),
                    content_type: "image/png".into(),
                    bytes: b"PNGDATA".to_vec(),
                }),
            })
        })
        .await
        .unwrap();
        assert_eq!(created.image.as_deref(), Some("/media/poster.png"));
    }
}
