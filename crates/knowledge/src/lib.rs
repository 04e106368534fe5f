//! Retrieval service implementations for VectorMentor.

pub mod corpus;
pub mod empty;
pub mod keyword;

pub use corpus::{load_corpus, seed_documents};
pub use empty::EmptyStore;
pub use keyword::KeywordStore;
