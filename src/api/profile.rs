use crate::api::client::{ApiClient, Body, Method};
use crate::error::ServiceResult;
use crate::types::{Profile, RecordId, Role};
use crate::validation::{ValidationErrors, validate_profile};

fn profile_path(user_id: &RecordId) -> String {
    format!("/users/{user_id}/profile/")
}

/// The role-specific part of a profile must match the account's role.
fn check_role(profile: &Profile, role: Role) -> ServiceResult<()> {
    validate_profile(profile)?;
    if profile.details.role() != role {
        let mut errors = ValidationErrors::new();
        errors.add(
            "role",
            format!("Profile fields are for {}, account is {}.", profile.details.role(), role),
        );
        return Err(errors.into());
    }
    Ok(())
}

impl ApiClient {
    pub fn get_profile(&self, user_id: &RecordId) -> ServiceResult<Profile> {
        self.request_as(Method::Get, &profile_path(user_id), None)
    }

    pub fn create_profile(
        &self,
        user_id: &RecordId,
        role: Role,
        profile: &Profile,
    ) -> ServiceResult<Profile> {
        check_role(profile, role)?;
        self.request_as(Method::Post, &profile_path(user_id), Some(Body::json(profile)?))
    }

    pub fn update_profile(
        &self,
        user_id: &RecordId,
        role: Role,
        profile: &Profile,
    ) -> ServiceResult<Profile> {
        check_role(profile, role)?;
        self.request_as(Method::Patch, &profile_path(user_id), Some(Body::json(profile)?))
    }

    pub fn delete_profile(&self, user_id: &RecordId) -> ServiceResult<()> {
        self.request(Method::Delete, &profile_path(user_id), None)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{blocking, client_for};
    use crate::error::ServiceError;
    use crate::types::{Profile, RecordId, Role, RoleProfile};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn entrepreneur_profile() -> Profile {
        Profile {
            first_name: "Youssef".into(),
            last_name: "Trabelsi".into(),
            phone: None,
            bio: Some("Baker".into()),
            details: RoleProfile::Entrepreneur {
                company_name: "Pain d'Or".into(),
                sector: "Food".into(),
            },
        }
    }

    #[tokio::test]
    async fn patch_sends_flat_role_fields() {
        let server = MockServer::start().await;
        let body = json!({
            "first_name": "Youssef", "last_name": "Trabelsi", "bio": "Baker",
            "role": "entrepreneur", "company_name": "Pain d'Or", "sector": "Food"
        });
        Mock::given(method("PATCH"))
            .and(path("/users/7/profile/"))
            .and(body_json(body.clone()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _) = client_for(&server.uri(), Role::Entrepreneur);
        let updated = blocking(move || {
            client.update_profile(&RecordId::Int(7), Role::Entrepreneur, &entrepreneur_profile())
        })
        .await
        .unwrap();
        assert_eq!(updated, entrepreneur_profile());
    }

    #[tokio::test]
    async fn mismatched_role_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let (client, _) = client_for(&server.uri(), Role::Investor);
        let err = blocking(move || {
            client.create_profile(&RecordId::Int(7), Role::Investor, &entrepreneur_profile())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref v) if v.has("role")));
    }
}
