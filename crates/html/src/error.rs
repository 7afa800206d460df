use crate::types::NodeId;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("node {0:?} does not exist or was removed")]
    MissingNode(NodeId),
    #[error("node {0:?} cannot have children")]
    InvalidParent(NodeId),
    #[error("inserting {child:?} under {parent:?} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },
    #[error("node {before:?} is not a child of {parent:?}")]
    InvalidSibling { parent: NodeId, before: NodeId },
    #[error("node {0:?} has no parent")]
    Detached(NodeId),
    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),
    #[error("the document root cannot be moved or removed")]
    RootImmutable,
    #[error("unsupported insertion method `{0}`")]
    UnknownInsertMethod(String),
    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },
}
