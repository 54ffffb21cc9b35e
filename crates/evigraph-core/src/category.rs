//! Node categorization from raw type tags.
//!
//! Every catalog record carries one or more type tags (bare names like
//! `"Dataset"`, prefixed names like `"evi:Dataset"`, or full IRIs like
//! `"https://w3id.org/EVI#Dataset"`). [`NodeCategory::classify`] maps a tag
//! list to exactly one category; the mapping is total, so unrecognized tags
//! land in [`NodeCategory::Other`] instead of failing the build.

use serde::{Deserialize, Serialize};

/// Marker substring identifying a container record (an RO-Crate).
const CONTAINER_MARKER: &str = "ROCrate";

/// Local type names that classify a record as entity-like.
const ENTITY_TYPES: [&str; 5] = ["Dataset", "Sample", "Instrument", "Software", "MLModel"];

/// Local type names that classify a record as activity-like.
const ACTIVITY_TYPES: [&str; 2] = ["Computation", "Experiment"];

/// The provenance category of a catalog record.
///
/// A record's category is a pure function of its type tags and determines
/// which relation fields contribute edges to the evidence graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCategory {
    /// A data/material artifact (dataset, sample, instrument, software,
    /// model) that may record the activity that generated it.
    Entity,
    /// A process (computation, experiment) that records the entities it
    /// used.
    Activity,
    /// A bundling artifact (RO-Crate) that declares a set of outputs but
    /// does not itself participate in provenance edges.
    Container,
    /// Anything else. Contributes no edges.
    #[default]
    Other,
}

impl NodeCategory {
    /// Classifies a list of type tags into exactly one category.
    ///
    /// The container marker takes precedence over every other tag, so a
    /// record typed both `"Dataset"` and `"https://w3id.org/EVI#ROCrate"`
    /// is a container. Entity tags are checked before activity tags.
    /// Never fails: anything unrecognized is [`NodeCategory::Other`].
    pub fn classify<S: AsRef<str>>(types: &[S]) -> NodeCategory {
        if types
            .iter()
            .any(|t| t.as_ref().contains(CONTAINER_MARKER))
        {
            return NodeCategory::Container;
        }
        if types
            .iter()
            .any(|t| ENTITY_TYPES.contains(&local_name(t.as_ref())))
        {
            return NodeCategory::Entity;
        }
        if types
            .iter()
            .any(|t| ACTIVITY_TYPES.contains(&local_name(t.as_ref())))
        {
            return NodeCategory::Activity;
        }
        NodeCategory::Other
    }

    /// Returns `true` for container records.
    pub fn is_container(self) -> bool {
        matches!(self, NodeCategory::Container)
    }
}

/// Strips an IRI or CURIE prefix, leaving the local type name.
///
/// `"https://w3id.org/EVI#Dataset"`, `"evi:Dataset"`, and `"Dataset"` all
/// yield `"Dataset"`.
fn local_name(tag: &str) -> &str {
    tag.rsplit(['#', '/', ':']).next().unwrap_or(tag)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn classifies_entity_tags() {
        for tag in ["Dataset", "Sample", "Instrument", "Software", "MLModel"] {
            assert_eq!(NodeCategory::classify(&[tag]), NodeCategory::Entity);
        }
    }

    #[test]
    fn classifies_activity_tags() {
        assert_eq!(
            NodeCategory::classify(&["Computation"]),
            NodeCategory::Activity
        );
        assert_eq!(
            NodeCategory::classify(&["Experiment"]),
            NodeCategory::Activity
        );
    }

    #[test]
    fn strips_iri_and_curie_prefixes() {
        assert_eq!(
            NodeCategory::classify(&["https://w3id.org/EVI#Dataset"]),
            NodeCategory::Entity
        );
        assert_eq!(
            NodeCategory::classify(&["evi:Computation"]),
            NodeCategory::Activity
        );
    }

    #[test]
    fn container_marker_wins_over_other_tags() {
        assert_eq!(
            NodeCategory::classify(&["Dataset", "https://w3id.org/EVI#ROCrate"]),
            NodeCategory::Container
        );
        assert_eq!(
            NodeCategory::classify(&["ROCrate", "Computation"]),
            NodeCategory::Container
        );
    }

    #[test]
    fn unknown_tags_fall_back_to_other() {
        assert_eq!(NodeCategory::classify(&["Person"]), NodeCategory::Other);
        assert_eq!(
            NodeCategory::classify(&[] as &[&str]),
            NodeCategory::Other
        );
    }

    #[test]
    fn entity_checked_before_activity() {
        // A record tagged with both resolves to Entity.
        assert_eq!(
            NodeCategory::classify(&["Computation", "Dataset"]),
            NodeCategory::Entity
        );
    }

    proptest! {
        /// Classification is total: any tag list yields a category, and the
        /// container marker always takes precedence when present.
        #[test]
        fn classification_is_total(tags in proptest::collection::vec(".*", 0..6)) {
            let category = NodeCategory::classify(&tags);
            if tags.iter().any(|t| t.contains("ROCrate")) {
                prop_assert_eq!(category, NodeCategory::Container);
            }
        }
    }
}
