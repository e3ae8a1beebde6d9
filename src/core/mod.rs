//! Core data types for chain classification.
//!
//! - [`Candidate`]: one chain pulled from the structural database
//! - [`CandidateQuery`]: the length window applied when pulling candidates
//! - [`Tier`]: confidence bucket a classified chain is routed into
//! - [`ConstructType`]: how a sequence was interpreted from its length
//! - [`MatchResult`]: the persisted outcome of one classification
//!
//! ## Tiers
//!
//! | Tier        | Decided by                                       |
//! |-------------|--------------------------------------------------|
//! | `exact`     | similarity of exactly 1.0                        |
//! | `excellent` | similarity >= 0.9                                |
//! | `good`      | similarity > 0.5                                 |
//! | `possible`  | low similarity, structural alignment inconclusive |
//! | `poor`      | low similarity and low structural coverage       |

pub mod candidate;
pub mod types;

pub use candidate::{Candidate, CandidateQuery};
pub use types::{ConstructType, MatchResult, Tier};
