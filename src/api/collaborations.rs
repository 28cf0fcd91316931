use crate::api::client::ApiClient;
use crate::error::ServiceResult;
use crate::types::{Blob, CollaborationRecord, Contract, RecordId};

impl ApiClient {
    pub fn list_collaborations(&self) -> ServiceResult<Vec<CollaborationRecord>> {
        self.get_list("/collaborations/")
    }

    pub fn list_contracts(&self) -> ServiceResult<Vec<Contract>> {
        self.get_list("/contracts/")
    }

    /// Inline rendition of the contract (usually a PDF).
    pub fn view_contract(&self, id: &RecordId) -> ServiceResult<Blob> {
        self.get_blob(&format!("/contracts/{id}/view/"))
    }

    pub fn download_contract(&self, id: &RecordId) -> ServiceResult<Blob> {
        self.get_blob(&format!("/contracts/{id}/download/"))
    }
}
