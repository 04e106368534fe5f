//! VectorMentor tutoring pipeline.
//!
//! A [`Session`] owns one conversation's turn history and progress. The
//! [`Orchestrator`] runs a single turn through classifier, assessor,
//! retriever, tutor and synthesizer. The [`SessionManager`] keys sessions
//! by id and guarantees one in-flight turn per session.

pub mod error;
pub mod local;
pub mod manager;
pub mod orchestrator;
pub mod session;

pub use error::{Result, WorkflowError};
pub use local::{is_algebra_related, local_response};
pub use manager::{RuntimeInfo, SessionManager};
pub use orchestrator::{Orchestrator, Responder, Routing, TurnOutcome};
pub use session::{Session, SessionStats};
