//! Minimal DOM for the lazy-views client: a mutable node arena, a forgiving
//! fragment parser, a CSS selector subset and jQuery-style insertion methods.

pub mod document;
pub mod insertion;
pub mod selector;
pub mod serialize;

mod dom_builder;
mod entities;
mod error;
mod tokenizer;
mod types;

pub use crate::document::{Descendants, Document};
pub use crate::error::DomError;
pub use crate::insertion::InsertMethod;
pub use crate::selector::Selector;
pub use crate::tokenizer::tokenize;
pub use crate::types::{NodeId, NodeKind, Token};
