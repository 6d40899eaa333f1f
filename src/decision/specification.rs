//! The rule contract.

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::types::ImportRejection;
use crate::catalog::Catalog;
use crate::import::CandidateFile;

/// What a rule may consult besides the candidate itself.
#[derive(Clone)]
pub struct EvaluationContext {
    pub catalog: Arc<dyn Catalog>,
    pub cancel: CancellationToken,
}

impl EvaluationContext {
    pub fn new(catalog: Arc<dyn Catalog>, cancel: CancellationToken) -> Self {
        Self { catalog, cancel }
    }
}

/// One approve/reject predicate in the decision chain.
///
/// Rules are independent: none sees another's verdict.
#[async_trait]
pub trait ImportSpecification: Send + Sync {
    fn name(&self) -> &'static str;

    /// `None` approves; `Some` rejects with a reason.
    async fn evaluate(
        &self,
        candidate: &CandidateFile,
        ctx: &EvaluationContext,
    ) -> Option<ImportRejection>;
}
