// crates/core/src/targets.rs
//! Destination collection choices for a bulk add.

use bulkadd_types::{Collection, CollectionId};

/// Collections a source's companies may be added to: every collection but
/// the source itself, in listing order.
pub fn target_choices<'a>(collections: &'a [Collection], source: &CollectionId) -> Vec<&'a Collection> {
    collections.iter().filter(|c| &c.id != source).collect()
}

/// The preselected destination.
pub fn default_target<'a>(collections: &'a [Collection], source: &CollectionId) -> Option<&'a Collection> {
    collections.iter().find(|c| &c.id != source)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(id: &str, name: &str) -> Collection {
        Collection {
            id: id.into(),
            collection_name: name.to_string(),
        }
    }

    #[test]
    fn test_source_is_excluded() {
        let all = vec![
            collection("a", "My List"),
            collection("b", "Liked Companies"),
            collection("c", "Companies to Ignore"),
        ];
        let names: Vec<_> = target_choices(&all, &"b".into())
            .into_iter()
            .map(|c| c.collection_name.as_str())
            .collect();
        assert_eq!(names, vec!["My List", "Companies to Ignore"]);
        assert_eq!(default_target(&all, &"a".into()).map(|c| c.id.as_str()), Some("b"));
    }

    #[test]
    fn test_no_choices_when_only_source_exists() {
        let all = vec![collection("a", "My List")];
        assert!(target_choices(&all, &"a".into()).is_empty());
        assert!(default_target(&all, &"a".into()).is_none());
    }
}
