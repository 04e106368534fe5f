//! # VectorMentor Core
//!
//! Domain types, service traits, and error definitions for the VectorMentor
//! tutoring pipeline. Nothing here talks to the network: the text-completion
//! service and the retrieval service are traits, implemented in their own crates.
//!
//! ## Layout
//!
//! - [`tutoring`]: closed vocabularies (`InteractionType`, `TopicId`), the
//!   bounded `Level`, `Assessment`, `Turn` and `Trend`.
//! - [`provider`]: the text-completion boundary.
//! - [`retrieval`]: the document retrieval boundary.
//! - [`history`]: fixed-capacity sliding window shared by session and agent histories.
//! - [`text`]: accent folding for keyword matching.

pub mod error;
pub mod event;
pub mod history;
pub mod message;
pub mod provider;
pub mod retrieval;
pub mod text;
pub mod tutoring;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result, RetrievalError};
pub use event::{DomainEvent, EventBus};
pub use history::BoundedHistory;
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use retrieval::{RetrievalService, RetrievalStats, RetrievedDocument};
pub use tutoring::{Assessment, InteractionType, Level, TopicId, Trend, Turn};
