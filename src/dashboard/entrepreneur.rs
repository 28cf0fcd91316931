use crate::dashboard::{Loadable, Navigation, ViewScope};
use crate::error::{ServiceError, ServiceResult};
use crate::types::{
    Attachment, CollaborationType, HelpRequest, NewProject, Project, Proposal, ProposalStatus,
    RecordId, Role,
};
use crate::validation::HelpRequestDraft;

pub struct EntrepreneurDashboard {
    scope: ViewScope,
    pub projects: Loadable<Vec<Project>>,
    pub financial_proposals: Loadable<Vec<Proposal>>,
    pub technical_proposals: Loadable<Vec<Proposal>>,
}

impl EntrepreneurDashboard {
    pub const ROUTE: &'static str = "/entrepreneur/dashboard";
    pub const ROLES: &'static [Role] = &[Role::Entrepreneur];

    pub fn new(scope: ViewScope) -> Self {
        Self {
            scope,
            projects: Loadable::default(),
            financial_proposals: Loadable::default(),
            technical_proposals: Loadable::default(),
        }
    }

    pub async fn mount(&mut self) -> Navigation {
        self.projects.begin();
        self.financial_proposals.begin();
        self.technical_proposals.begin();
        let (projects, financial, technical) = tokio::join!(
            self.scope.fetch(|c| c.list_projects()),
            self.scope.fetch(|c| c.list_proposals(CollaborationType::Financial)),
            self.scope.fetch(|c| c.list_proposals(CollaborationType::Technical)),
        );
        self.projects
            .apply(projects)
            .merge(self.financial_proposals.apply(financial))
            .merge(self.technical_proposals.apply(technical))
    }

    fn proposals_mut(&mut self, kind: CollaborationType) -> &mut Loadable<Vec<Proposal>> {
        match kind {
            CollaborationType::Financial => &mut self.financial_proposals,
            CollaborationType::Technical => &mut self.technical_proposals,
        }
    }

    pub fn pending_proposals(&self) -> Vec<&Proposal> {
        self.financial_proposals
            .data
            .iter()
            .chain(self.technical_proposals.data.iter())
            .flatten()
            .filter(|p| p.status == ProposalStatus::Pending)
            .collect()
    }

    pub async fn create_project(&mut self, project: NewProject) -> ServiceResult<Project> {
        let created = self.scope.fetch(move |c| c.create_project(&project)).await?;
        if let Some(projects) = self.projects.data.as_mut() {
            projects.push(created.clone());
        }
        Ok(created)
    }

    pub async fn upload_document(
        &mut self,
        id: RecordId,
        document: Attachment,
    ) -> ServiceResult<Project> {
        let updated = self
            .scope
            .fetch(move |c| c.upload_project_document(&id, document))
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

    pub async fn create_help_request(&self, draft: HelpRequestDraft) -> ServiceResult<HelpRequest> {
        self.scope.fetch(move |c| c.create_help_request(&draft)).await
    }

    /// Accepts or refuses a proposal from the loaded lists.
    pub async fn respond(
        &mut self,
        kind: CollaborationType,
        id: RecordId,
        decision: ProposalStatus,
    ) -> ServiceResult<Proposal> {
        let proposal = self
            .proposals_mut(kind)
            .require("Proposals")?
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| ServiceError::Other(format!("Proposal {id} is not in the list")))?;
        let updated = self
            .scope
            .fetch(move |c| c.respond_to_proposal(&proposal, decision))
            .await?;
        if let Some(slot) = self
            .proposals_mut(kind)
            .data
            .as_mut()
            .and_then(|list| list.iter_mut().find(|p| p.id == updated.id))
        {
            *slot = updated.clone();
        }
        Ok(updated)
    }
}
