//! End-to-end test support for exegete
//!
//! - `harness`: isolated stores (memory or on-disk local-index) with retriever wiring
//! - `mocks`: deterministic embedding providers and fixture documents

pub mod harness;
pub mod mocks;
