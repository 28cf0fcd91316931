use crate::api::client::{ApiClient, Body, Method};
use crate::error::ServiceResult;
use crate::types::{NewUser, RecordId, User, UserPatch, UserStats};
use crate::validation::{validate_new_user, validate_user_patch};

impl ApiClient {
    pub fn list_users(&self) -> ServiceResult<Vec<User>> {
        self.get_list("/admin/users")
    }

    pub fn user_stats(&self) -> ServiceResult<UserStats> {
        self.request_as(Method::Get, "/admin/users/stats", None)
    }

    pub fn create_user(&self, user: &NewUser) -> ServiceResult<User> {
        validate_new_user(user)?;
        self.request_as(Method::Post, "/admin/users", Some(Body::json(user)?))
    }

    pub fn update_user(&self, id: &RecordId, patch: &UserPatch) -> ServiceResult<User> {
        validate_user_patch(patch)?;
        self.request_as(
            Method::Patch,
            &format!("/admin/users/{id}"),
            Some(Body::json(patch)?),
        )
    }

    pub fn delete_user(&self, id: &RecordId) -> ServiceResult<()> {
        self.request(Method::Delete, &format!("/admin/users/{id}"), None)?;
        Ok(())
    }
}
