//! The tutoring agents: one per pipeline stage.
//!
//! Each agent wraps a single kind of external call and owns its fallback:
//!
//! 1. **Classifier**: keyword fast path, then a one-label completion call
//! 2. **Assessor**: topic lookup, level scoring, gaps and next step
//! 3. **Retriever**: query rewrite, level-filtered search, level adaptation
//! 4. **Tutor**: strategy dispatch plus an optional practice exercise
//!
//! None of them return errors. A failed call degrades to a documented
//! default and is reported in the output's `degraded` list so the caller
//! can log or publish it. The [`ProgressTracker`] holds the cross-turn
//! level history the orchestrator folds each assessment into.

pub mod assessor;
pub mod catalog;
pub mod classifier;
pub mod llm;
pub mod progress;
pub mod retriever;
pub mod text;
pub mod tutor;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use assessor::{Assessor, AssessorOutput};
pub use catalog::Catalog;
pub use classifier::{Classifier, ClassifierOutput};
pub use llm::AgentLlm;
pub use progress::{ProgressSnapshot, ProgressTracker};
pub use retriever::{NOTHING_FOUND, RetrievalOutput, Retriever};
pub use tutor::{
    APOLOGY, ExerciseGate, FixedGate, RandomGate, Strategy, Tutor, TutorOutput, TutorRequest,
    apology,
};
