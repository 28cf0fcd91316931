use crate::dashboard::{Loadable, Navigation, ViewScope};
use crate::error::{ServiceError, ServiceResult};
use crate::types::{Profile, RecordId, Role};

/// Profile page, shared by every role. A missing profile (404) is a normal
/// state, not an error.
pub struct ProfileView {
    scope: ViewScope,
    user_id: RecordId,
    role: Role,
    pub profile: Loadable<Option<Profile>>,
}

impl ProfileView {
    pub fn new(scope: ViewScope, user_id: RecordId, role: Role) -> Self {
        Self {
            scope,
            user_id,
            role,
            profile: Loadable::default(),
        }
    }

    pub async fn mount(&mut self) -> Navigation {
        self.profile.begin();
        let user_id = self.user_id.clone();
        let result = self
            .scope
            .fetch(move |c| match c.get_profile(&user_id) {
                Ok(profile) => Ok(Some(profile)),
                Err(ServiceError::Api { status: 404, .. }) => Ok(None),
                Err(e) => Err(e),
            })
            .await;
        self.profile.apply(result)
    }

    /// Creates the profile when none exists yet, otherwise patches it.
    pub async fn save(&mut self, profile: Profile) -> ServiceResult<Profile> {
        let exists = matches!(self.profile.data, Some(Some(_)));
        let user_id = self.user_id.clone();
        let role = self.role;
        let saved = self
            .scope
            .fetch(move |c| {
                if exists {
                    c.update_profile(&user_id, role, &profile)
                } else {
                    c.create_profile(&user_id, role, &profile)
                }
            })
            .await?;
        self.profile.data = Some(Some(saved.clone()));
        Ok(saved)
    }

    pub async fn delete(&mut self) -> ServiceResult<()> {
        let user_id = self.user_id.clone();
        self.scope.fetch(move |c| c.delete_profile(&user_id)).await?;
        self.profile.data = Some(None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::client_for;
    use crate::types::RoleProfile;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn missing_profile_is_created_on_save() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/7/profile/"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not found."})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/users/7/profile/"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "first_name": "Rim", "last_name": "H", "role": "admin"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _) = client_for(&server.uri(), Role::Admin);
        let mut view = ProfileView::new(ViewScope::new(client), RecordId::Int(7), Role::Admin);
        assert_eq!(view.mount().await, Navigation::Stay);
        assert_eq!(view.profile.data, Some(None));
        assert!(view.profile.error.is_none());

        let saved = view
            .save(Profile {
                first_name: "Rim".into(),
                last_name: "H".into(),
                phone: None,
                bio: None,
                details: RoleProfile::Admin {},
            })
            .await
            .unwrap();
        assert_eq!(saved.details.role(), Role::Admin);
        assert!(matches!(view.profile.data, Some(Some(_))));
    }
}
