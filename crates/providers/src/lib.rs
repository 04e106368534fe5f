//! Text-completion provider implementations for VectorMentor.
//!
//! All providers implement the `vectormentor_core::Provider` trait.
//! The router selects the correct provider based on configuration.

pub mod offline;
pub mod openai_compat;
pub mod router;

pub use offline::OfflineProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use router::{ProviderRouter, build_from_config};
