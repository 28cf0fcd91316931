use serde_json::json;

use crate::api::client::{ApiClient, Body, Method};
use crate::api::multipart::Multipart;
use crate::error::ServiceResult;
use crate::types::{Attachment, NewProject, Project, ProjectStatus, RecordId};
use crate::validation::{ValidationErrors, validate_new_project, validate_upload};

impl ApiClient {
    pub fn list_projects(&self) -> ServiceResult<Vec<Project>> {
        self.get_list("/projects/")
    }

    pub fn create_project(&self, project: &NewProject) -> ServiceResult<Project> {
        validate_new_project(project)?;
        self.request_as(Method::Post, "/projects/", Some(Body::json(project)?))
    }

    pub fn upload_project_document(
        &self,
        id: &RecordId,
        document: Attachment,
    ) -> ServiceResult<Project> {
        validate_upload("document", &document.file_name, &document.bytes)?;
        let form = Multipart::new().file("document", document);
        self.request_as(
            Method::Post,
            &format!("/projects/{id}/upload-document/"),
            Some(Body::Multipart(form)),
        )
    }

    /// Admin decision on a project. `current` is the status the caller last
    /// saw; decided projects cannot be decided again.
    pub fn update_project_status(
        &self,
        id: &RecordId,
        current: ProjectStatus,
        next: ProjectStatus,
    ) -> ServiceResult<Project> {
        if !current.can_transition_to(next) {
            let mut errors = ValidationErrors::new();
            errors.add(
                "status",
                format!(
                    "A {} project cannot become {}.",
                    current.as_str(),
                    next.as_str()
                ),
            );
            return Err(errors.into());
        }
        self.request_as(
            Method::Post,
            &format!("/projects/{id}/update-status/"),
            Some(Body::Json(json!({ "status": next }))),
        )
    }
}
