//! Analysis and monitoring engine.
//!
//! Contains the cache-then-LLM dispatcher shared by every analysis
//! endpoint, the two analysis pipelines and the harness that runs them side
//! by side, and the interest-profile checker.

pub mod dispatcher;
pub mod monitoring;
pub mod parallel;
pub mod pipeline;
