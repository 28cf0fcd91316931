use crate::aggregate::{CollaborationGroups, group_by_counterparty};
use crate::dashboard::{Loadable, Navigation, ViewScope};
use crate::error::ServiceResult;
use crate::types::{
    Blob, CollaborationType, Contract, HelpRequest, Proposal, ProposalTerms, RecordId, Role,
};

pub struct InvestorDashboard {
    scope: ViewScope,
    pub collaborations: Loadable<CollaborationGroups>,
    pub contracts: Loadable<Vec<Contract>>,
    pub financial_proposals: Loadable<Vec<Proposal>>,
    pub technical_proposals: Loadable<Vec<Proposal>>,
}

impl InvestorDashboard {
    pub const ROUTE: &'static str = "/investors/dashboard";
    pub const ROLES: &'static [Role] = &[Role::Investor];

    pub fn new(scope: ViewScope) -> Self {
        Self {
            scope,
            collaborations: Loadable::default(),
            contracts: Loadable::default(),
            financial_proposals: Loadable::default(),
            technical_proposals: Loadable::default(),
        }
    }

    pub async fn mount(&mut self) -> Navigation {
        self.collaborations.begin();
        self.contracts.begin();
        self.financial_proposals.begin();
        self.technical_proposals.begin();
        let (collaborations, contracts, financial, technical) = tokio::join!(
            self.scope
                .fetch(|c| c.list_collaborations().map(|records| group_by_counterparty(&records))),
            self.scope.fetch(|c| c.list_contracts()),
            self.scope.fetch(|c| c.list_proposals(CollaborationType::Financial)),
            self.scope.fetch(|c| c.list_proposals(CollaborationType::Technical)),
        );
        self.collaborations
            .apply(collaborations)
            .merge(self.contracts.apply(contracts))
            .merge(self.financial_proposals.apply(financial))
            .merge(self.technical_proposals.apply(technical))
    }

    /// Re-fetches and regroups collaborations from scratch.
    pub async fn reload_collaborations(&mut self) -> Navigation {
        self.collaborations.begin();
        let result = self
            .scope
            .fetch(|c| c.list_collaborations().map(|records| group_by_counterparty(&records)))
            .await;
        self.collaborations.apply(result)
    }

    fn proposals_mut(&mut self, kind: CollaborationType) -> &mut Loadable<Vec<Proposal>> {
        match kind {
            CollaborationType::Financial => &mut self.financial_proposals,
            CollaborationType::Technical => &mut self.technical_proposals,
        }
    }

    pub async fn help_request(&self, id: RecordId) -> ServiceResult<HelpRequest> {
        self.scope.fetch(move |c| c.get_help_request(&id)).await
    }

    pub async fn submit_proposal(
        &mut self,
        help_request: RecordId,
        terms: ProposalTerms,
    ) -> ServiceResult<Proposal> {
        let kind = terms.kind();
        let created = self
            .scope
            .fetch(move |c| c.submit_proposal(&help_request, &terms))
            .await?;
        if let Some(list) = self.proposals_mut(kind).data.as_mut() {
            list.push(created.clone());
        }
        Ok(created)
    }

    pub async fn withdraw_proposal(
        &mut self,
        kind: CollaborationType,
        id: RecordId,
    ) -> ServiceResult<()> {
        let target = id.clone();
        self.scope
            .fetch(move |c| c.delete_proposal(kind, &target))
            .await?;
        if let Some(list) = self.proposals_mut(kind).data.as_mut() {
            list.retain(|p| p.id != id);
        }
        Ok(())
    }

    /// Fetches a contract document, either the inline view or the download.
    pub async fn contract_document(&self, id: RecordId, download: bool) -> ServiceResult<Blob> {
        self.scope
            .fetch(move |c| {
                if download {
                    c.download_contract(&id)
                } else {
                    c.view_contract(&id)
                }
            })
            .await
    }
}
