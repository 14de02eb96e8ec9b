// crates/types/src/request.rs
//! The "add companies to a collection" request.

use std::collections::BTreeSet;

use crate::collection::{CollectionId, CompanyId};

/// A bulk-add request: either a whole source collection or an explicit set
/// of companies, always into one target collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionRequest {
    WholeCollection {
        target: CollectionId,
        source: CollectionId,
    },
    Selected {
        target: CollectionId,
        company_ids: BTreeSet<CompanyId>,
    },
}

impl SubmissionRequest {
    pub fn whole_collection(target: impl Into<CollectionId>, source: impl Into<CollectionId>) -> Self {
        Self::WholeCollection {
            target: target.into(),
            source: source.into(),
        }
    }

    /// Duplicate ids collapse into one.
    pub fn selected(
        target: impl Into<CollectionId>,
        company_ids: impl IntoIterator<Item = CompanyId>,
    ) -> Self {
        Self::Selected {
            target: target.into(),
            company_ids: company_ids.into_iter().collect(),
        }
    }

    pub fn target(&self) -> &CollectionId {
        match self {
            Self::WholeCollection { target, .. } | Self::Selected { target, .. } => target,
        }
    }

    /// Short description for logs and prompts, e.g. "all" or "3 selected".
    pub fn describe(&self) -> String {
        match self {
            Self::WholeCollection { .. } => "all".to_string(),
            Self::Selected { company_ids, .. } => format!("{} selected", company_ids.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selected_dedupes_ids() {
        let req = SubmissionRequest::selected("X", [3, 1, 2, 3]);
        match &req {
            SubmissionRequest::Selected { company_ids, .. } => {
                assert_eq!(company_ids.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
            }
            other => panic!("unexpected request: {other:?}"),
        }
        assert_eq!(req.describe(), "3 selected");
    }

    #[test]
    fn test_target_for_both_variants() {
        let whole = SubmissionRequest::whole_collection("dst", "src");
        assert_eq!(whole.target().as_str(), "dst");
        assert_eq!(whole.describe(), "all");
        let selected = SubmissionRequest::selected("dst", [1]);
        assert_eq!(selected.target().as_str(), "dst");
    }
}
