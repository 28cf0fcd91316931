use crate::dashboard::{Loadable, Navigation, ViewScope};
use crate::error::{ServiceError, ServiceResult};
use crate::types::{NewUser, Project, ProjectStatus, RecordId, Role, User, UserPatch, UserStats};

pub struct AdminDashboard {
    scope: ViewScope,
    pub users: Loadable<Vec<User>>,
    pub stats: Loadable<UserStats>,
    pub projects: Loadable<Vec<Project>>,
}

impl AdminDashboard {
    pub const ROUTE: &'static str = "/admin/dashboard";
    pub const ROLES: &'static [Role] = &[Role::Admin];

    pub fn new(scope: ViewScope) -> Self {
        Self {
            scope,
            users: Loadable::default(),
            stats: Loadable::default(),
            projects: Loadable::default(),
        }
    }

    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    pub async fn mount(&mut self) -> Navigation {
        self.users.begin();
        self.stats.begin();
        self.projects.begin();
        let (users, stats, projects) = tokio::join!(
            self.scope.fetch(|c| c.list_users()),
            self.scope.fetch(|c| c.user_stats()),
            self.scope.fetch(|c| c.list_projects()),
        );
        self.users
            .apply(users)
            .merge(self.stats.apply(stats))
            .merge(self.projects.apply(projects))
    }

    pub async fn refresh_stats(&mut self) -> Navigation {
        self.stats.begin();
        let stats = self.scope.fetch(|c| c.user_stats()).await;
        self.stats.apply(stats)
    }

    pub async fn create_user(&mut self, user: NewUser) -> ServiceResult<User> {
        let created = self.scope.fetch(move |c| c.create_user(&user)).await?;
        if let Some(users) = self.users.data.as_mut() {
            users.push(created.clone());
        }
        self.refresh_stats().await;
        Ok(created)
    }

    pub async fn update_user(&mut self, id: RecordId, patch: UserPatch) -> ServiceResult<User> {
        let updated = self.scope.fetch(move |c| c.update_user(&id, &patch)).await?;
        if let Some(users) = self.users.data.as_mut()
            && let Some(slot) = users.iter_mut().find(|u| u.id == updated.id)
        {
            *slot = updated.clone();
        }
        Ok(updated)
    }

    pub async fn delete_user(&mut self, id: RecordId) -> ServiceResult<()> {
        let target = id.clone();
        self.scope.fetch(move |c| c.delete_user(&target)).await?;
        if let Some(users) = self.users.data.as_mut() {
            users.retain(|u| u.id != id);
        }
        self.refresh_stats().await;
        Ok(())
    }

    /// Approves or rejects a project from the loaded list.
    pub async fn decide_project(&mut self, id: RecordId, next: ProjectStatus) -> ServiceResult<Project> {
        let current = self
            .projects
            .require("Projects")?
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.status)
            .ok_or_else(|| ServiceError::Other(format!("Project {id} is not in the list")))?;
        let updated = self
            .scope
            .fetch(move |c| c.update_project_status(&id, current, next))
            .await?;
        if let Some(slot) = self
            .projects
            .data
            .as_mut()
            .and_then(|list| list.iter_mut().find(|p| p.id == updated.id))
        {
            *slot = updated.clone();
        }
        Ok(updated)
    }

    pub fn pending_projects(&self) -> Vec<&Project> {
        self.projects
            .data
            .iter()
            .flatten()
            .filter(|p| p.status == ProjectStatus::Pending)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::client_for;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn server_with_users() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "username": "root", "email": "root@example.org", "role": "admin"},
                {"id": 2, "username": "sara", "email": "sara@example.org", "role": "investor"}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/projects/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 9, "name": "Olive press", "status": "pending"},
                {"id": 10, "name": "Fish farm", "status": "approved"}
            ])))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn stats_failure_does_not_block_users() {
        let server = server_with_users().await;
        Mock::given(method("GET"))
            .and(path("/admin/users/stats"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "stats offline"})))
            .mount(&server)
            .await;

        let (client, _) = client_for(&server.uri(), Role::Admin);
        let mut dash = AdminDashboard::new(ViewScope::new(client));
        assert_eq!(dash.mount().await, Navigation::Stay);

        assert_eq!(dash.users.data.as_ref().map(Vec::len), Some(2));
        assert!(dash.stats.data.is_none());
        assert_eq!(dash.stats.error.as_deref(), Some("HTTP 500: stats offline"));
        assert_eq!(dash.pending_projects().len(), 1);
    }

    #[tokio::test]
    async fn deciding_without_a_project_list_reports_why() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects/"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let (client, _) = client_for(&server.uri(), Role::Admin);
        let mut dash = AdminDashboard::new(ViewScope::new(client));
        dash.mount().await;

        let err = dash
            .decide_project(RecordId::from("9"), ProjectStatus::Approved)
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "HTTP 502: bad gateway");
    }

    #[tokio::test]
    async fn expired_session_redirects_to_login() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let (client, store) = client_for(&server.uri(), Role::Admin);
        let mut dash = AdminDashboard::new(ViewScope::new(client));
        assert_eq!(dash.mount().await, Navigation::Login);
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn delete_and_decide_patch_local_state() {
        let server = server_with_users().await;
        Mock::given(method("GET"))
            .and(path("/admin/users/stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 2, "admins": 1, "investors": 1})))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/admin/users/2"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/projects/9/update-status/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"id": 9, "name": "Olive press", "status": "rejected"}),
            ))
            .mount(&server)
            .await;

        let (client, _) = client_for(&server.uri(), Role::Admin);
        let mut dash = AdminDashboard::new(ViewScope::new(client));
        dash.mount().await;

        dash.delete_user(RecordId::Int(2)).await.unwrap();
        assert_eq!(dash.users.data.as_ref().map(Vec::len), Some(1));

        let decided = dash
            .decide_project(RecordId::Int(9), ProjectStatus::Rejected)
            .await
            .unwrap();
        assert_eq!(decided.status, ProjectStatus::Rejected);
        assert!(dash.pending_projects().is_empty());

        let again = dash
            .decide_project(RecordId::Int(10), ProjectStatus::Rejected)
            .await;
        assert!(matches!(again, Err(ServiceError::Validation(_))));
    }
}
