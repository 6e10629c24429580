//! Trait seams to the external collaborators.

pub mod reasoner;
pub mod searcher;
pub mod tools;

pub use reasoner::{Reasoner, StageRequest};
pub use searcher::{JobSearcher, MockJobSearcher, SearxngJobSearcher};
pub use tools::{
    FetchedPage, HttpToolSession, HttpToolSessionFactory, MockToolSession,
    MockToolSessionFactory, ProbeResult, ToolSession, ToolSessionFactory,
};
