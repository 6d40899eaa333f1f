//! Import decision chain.
//!
//! A candidate is approved only if every registered
//! [`ImportSpecification`] approves it. Each rule sees the candidate and an
//! [`EvaluationContext`] (catalog + cancellation), never another rule's
//! verdict.

mod maker;
pub mod rules;
mod specification;
mod types;

pub use maker::DecisionMaker;
pub use specification::{EvaluationContext, ImportSpecification};
pub use types::{ImportDecision, ImportRejection, RejectionReason};
