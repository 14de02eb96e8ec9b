// crates/sim/src/store.rs
//! In-memory collections and memberships.

use std::collections::{BTreeMap, HashMap, HashSet};

use bulkadd_types::{Collection, CollectionId, CollectionPage, Company, CompanyId};

/// Companies of one collection, in insertion order.
#[derive(Debug, Default)]
struct Members {
    order: Vec<CompanyId>,
    set: HashSet<CompanyId>,
}

impl Members {
    fn insert(&mut self, id: CompanyId) -> bool {
        if !self.set.insert(id) {
            return false;
        }
        self.order.push(id);
        true
    }
}

#[derive(Debug, Default)]
pub struct Store {
    collections: Vec<Collection>,
    companies: BTreeMap<CompanyId, String>,
    members: HashMap<CollectionId, Members>,
    liked: Option<CollectionId>,
    next_company: CompanyId,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_company(&mut self, name: impl Into<String>) -> CompanyId {
        self.next_company += 1;
        self.companies.insert(self.next_company, name.into());
        self.next_company
    }

    pub fn add_collection(&mut self, name: impl Into<String>) -> CollectionId {
        let id = CollectionId::new(uuid::Uuid::new_v4().to_string());
        self.collections.push(Collection {
            id: id.clone(),
            collection_name: name.into(),
        });
        self.members.insert(id.clone(), Members::default());
        id
    }

    /// Membership in this collection marks a company as liked.
    pub fn set_liked_collection(&mut self, id: CollectionId) {
        self.liked = Some(id);
    }

    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    pub fn find_collection(&self, name: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.collection_name == name)
    }

    pub fn has_collection(&self, id: &CollectionId) -> bool {
        self.members.contains_key(id)
    }

    pub fn has_company(&self, id: CompanyId) -> bool {
        self.companies.contains_key(&id)
    }

    pub fn contains(&self, collection: &CollectionId, company: CompanyId) -> bool {
        self.members
            .get(collection)
            .is_some_and(|m| m.set.contains(&company))
    }

    pub fn members(&self, collection: &CollectionId) -> &[CompanyId] {
        self.members
            .get(collection)
            .map(|m| m.order.as_slice())
            .unwrap_or_default()
    }

    /// Returns false if the company was already in the collection or the
    /// collection does not exist.
    pub fn insert(&mut self, collection: &CollectionId, company: CompanyId) -> bool {
        self.members
            .get_mut(collection)
            .is_some_and(|m| m.insert(company))
    }

    pub fn page(&self, id: &CollectionId, offset: u64, limit: u64) -> Option<CollectionPage> {
        let collection = self.collections.iter().find(|c| &c.id == id)?.clone();
        let members = self.members(id);
        let companies = members
            .iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .map(|&company_id| Company {
                id: company_id,
                company_name: self.companies.get(&company_id).cloned().unwrap_or_default(),
                liked: self
                    .liked
                    .as_ref()
                    .is_some_and(|liked| self.contains(liked, company_id)),
            })
            .collect();
        Some(CollectionPage {
            collection,
            companies,
            total: members.len() as u64,
        })
    }
}
