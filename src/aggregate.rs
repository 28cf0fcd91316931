//! Grouping of collaboration records by counterparty.
//!
//! Pure functions only: the same input always yields the same output.

use std::collections::{BTreeSet, HashMap};

use crate::types::{CollaborationRecord, CollaborationType, EntrepreneurDetails, RecordId};

#[derive(Clone, Debug, PartialEq)]
pub struct GroupedCollaboration {
    pub entrepreneur: EntrepreneurDetails,
    pub collaborations: Vec<CollaborationRecord>,
    /// Distinct project names. Two projects sharing a name collapse here.
    pub projects: BTreeSet<String>,
    pub contracts: BTreeSet<RecordId>,
    pub total_investment: f64,
    /// Financial records whose amount could not be read as a finite number.
    pub malformed_amounts: usize,
}

impl GroupedCollaboration {
    fn new(entrepreneur: EntrepreneurDetails) -> Self {
        Self {
            entrepreneur,
            collaborations: Vec::new(),
            projects: BTreeSet::new(),
            contracts: BTreeSet::new(),
            total_investment: 0.0,
            malformed_amounts: 0,
        }
    }

    pub fn count_of(&self, kind: CollaborationType) -> usize {
        self.collaborations
            .iter()
            .filter(|c| c.collaboration_type == kind)
            .count()
    }
}

/// Groups in order of the first record seen for each entrepreneur.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct CollaborationGroups {
    groups: Vec<GroupedCollaboration>,
    index: HashMap<RecordId, usize>,
}

impl CollaborationGroups {
    pub fn get(&self, id: &RecordId) -> Option<&GroupedCollaboration> {
        self.index.get(id).map(|&i| &self.groups[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &GroupedCollaboration> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn total_investment(&self) -> f64 {
        self.groups.iter().map(|g| g.total_investment).sum()
    }

    pub fn malformed_amounts(&self) -> usize {
        self.groups.iter().map(|g| g.malformed_amounts).sum()
    }

    pub fn collaboration_count(&self) -> usize {
        self.groups.iter().map(|g| g.collaborations.len()).sum()
    }
}

impl<'a> IntoIterator for &'a CollaborationGroups {
    type Item = &'a GroupedCollaboration;
    type IntoIter = std::slice::Iter<'a, GroupedCollaboration>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

pub fn group_by_counterparty(records: &[CollaborationRecord]) -> CollaborationGroups {
    let mut out = CollaborationGroups::default();

    for record in records {
        let key = &record.entrepreneur_details.id;
        let slot = match out.index.get(key) {
            Some(&i) => i,
            None => {
                out.groups
                    .push(GroupedCollaboration::new(record.entrepreneur_details.clone()));
                out.index.insert(key.clone(), out.groups.len() - 1);
                out.groups.len() - 1
            }
        };
        let group = &mut out.groups[slot];

        group.collaborations.push(record.clone());
        group.projects.insert(record.project_name.clone());

        let Some(contract) = &record.contract_details else {
            continue;
        };
        group.contracts.insert(contract.id.clone());

        if record.collaboration_type != CollaborationType::Financial {
            continue;
        }
        if let Some(amount) = &contract.investment_amount {
            match amount.parse() {
                Some(value) => group.total_investment += value,
                None => {
                    group.malformed_amounts += 1;
                    tracing::warn!(
                        collaboration = %record.id,
                        "skipping malformed investment amount {amount:?}"
                    );
                }
            }
        }
    }

    out
}
