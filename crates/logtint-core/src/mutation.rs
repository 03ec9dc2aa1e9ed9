use logtint_types::Severity;

use crate::stylesheet::{PROJECTION_CLASS, UNIT_CLASS};

/// Node flavor in a change notification
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Text,
    Element,
}

/// Description of a node touched by a mutation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeInfo {
    pub kind: NodeKind,
    pub classes: Vec<String>,
    pub has_text: bool,
}

impl NodeInfo {
    /// Host text content
    pub fn text() -> Self {
        Self {
            kind: NodeKind::Text,
            classes: Vec::new(),
            has_text: true,
        }
    }

    /// The surface element itself
    pub fn host() -> Self {
        Self::element(&[], true)
    }

    pub fn element(classes: &[&str], has_text: bool) -> Self {
        Self {
            kind: NodeKind::Element,
            classes: classes.iter().map(|c| c.to_string()).collect(),
            has_text,
        }
    }

    /// The projection root element
    pub fn projection_root() -> Self {
        Self::element(&[PROJECTION_CLASS], false)
    }

    /// A rendered unit element
    pub fn unit(severity: Severity) -> Self {
        Self::element(&[UNIT_CLASS, severity.as_str()], true)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn is_projection_root(&self) -> bool {
        self.kind == NodeKind::Element && self.has_class(PROJECTION_CLASS)
    }

    /// Root or unit written by the reconciler itself
    pub fn is_projection_owned(&self) -> bool {
        self.kind == NodeKind::Element
            && (self.has_class(PROJECTION_CLASS) || self.has_class(UNIT_CLASS))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationKind {
    /// Nodes were added or removed under the target
    ChildList,
    /// Text of the target changed in place
    CharacterData,
}

/// One change notification from the observed surface
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutationRecord {
    pub kind: MutationKind,
    pub target: NodeInfo,
    pub added: Vec<NodeInfo>,
    pub removed: Vec<NodeInfo>,
}

/// What a record means to the change-trigger gate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Relevance {
    /// Host content changed
    Content,
    /// The mounted projection was taken away
    ProjectionRemoved,
    /// Only the projection's own writes
    SelfCaused,
    /// Nothing worth a pass
    Irrelevant,
}

impl MutationRecord {
    pub fn child_list(target: NodeInfo, added: Vec<NodeInfo>, removed: Vec<NodeInfo>) -> Self {
        Self {
            kind: MutationKind::ChildList,
            target,
            added,
            removed,
        }
    }

    pub fn character_data(target: NodeInfo) -> Self {
        Self {
            kind: MutationKind::CharacterData,
            target,
            added: Vec::new(),
            removed: Vec::new(),
        }
    }

    /// Classify this record for change detection
    pub fn relevance(&self) -> Relevance {
        match self.kind {
            MutationKind::CharacterData => {
                if self.target.is_projection_owned() {
                    Relevance::SelfCaused
                } else {
                    Relevance::Content
                }
            }
            MutationKind::ChildList => {
                let root_removed = self.removed.iter().any(NodeInfo::is_projection_root);
                let root_added = self.added.iter().any(NodeInfo::is_projection_root);
                if root_removed && !root_added {
                    return Relevance::ProjectionRemoved;
                }

                let foreign_added = self
                    .added
                    .iter()
                    .any(|n| !n.is_projection_owned() && (n.has_text || n.kind == NodeKind::Text));
                let foreign_removed = self.removed.iter().any(|n| !n.is_projection_owned());
                if foreign_added || foreign_removed {
                    return Relevance::Content;
                }

                let mut touched = self.added.iter().chain(self.removed.iter()).peekable();
                if touched.peek().is_some() && touched.all(NodeInfo::is_projection_owned) {
                    Relevance::SelfCaused
                } else {
                    Relevance::Irrelevant
                }
            }
        }
    }

    pub fn is_relevant(&self) -> bool {
        matches!(
            self.relevance(),
            Relevance::Content | Relevance::ProjectionRemoved
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_appends_are_self_caused() {
        let record = MutationRecord::child_list(
            NodeInfo::projection_root(),
            vec![NodeInfo::unit(Severity::Info), NodeInfo::unit(Severity::Failed)],
            Vec::new(),
        );
        assert_eq!(record.relevance(), Relevance::SelfCaused);
        assert!(!record.is_relevant());
    }

    #[test]
    fn test_projection_swap_is_self_caused() {
        let record = MutationRecord::child_list(
            NodeInfo::text(),
            vec![NodeInfo::projection_root()],
            vec![NodeInfo::projection_root()],
        );
        assert_eq!(record.relevance(), Relevance::SelfCaused);
    }

    #[test]
    fn test_projection_removal_is_relevant() {
        let record = MutationRecord::child_list(
            NodeInfo::text(),
            vec![NodeInfo::text()],
            vec![NodeInfo::projection_root()],
        );
        assert_eq!(record.relevance(), Relevance::ProjectionRemoved);
    }

    #[test]
    fn test_host_text_changes_are_relevant() {
        assert_eq!(
            MutationRecord::character_data(NodeInfo::text()).relevance(),
            Relevance::Content
        );
        let record = MutationRecord::child_list(NodeInfo::text(), vec![NodeInfo::text()], Vec::new());
        assert!(record.is_relevant());
    }

    #[test]
    fn test_empty_element_is_irrelevant() {
        let record = MutationRecord::child_list(
            NodeInfo::text(),
            vec![NodeInfo::element(&["spinner"], false)],
            Vec::new(),
        );
        assert_eq!(record.relevance(), Relevance::Irrelevant);
    }
}
