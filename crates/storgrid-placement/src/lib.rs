//! StorGrid placement engine: constrained replica selection.
//!
//! Given scored storage pools across cluster nodes, chooses where new
//! replicas of a resource go. It does NOT score pools or deploy anything;
//! it only selects, and the orchestrator executes the result.
//!
//! # Components
//!
//! - **`ranking`**: Scoring adapter and best-first ordering
//! - **`scanner`**: What a resource already occupies
//! - **`tracker`**: Incremental constraint state for one search
//! - **`selector`**: Backtracking search with branch-and-bound pruning
//! - **`deselect`**: Victim choice when shrinking replica count

pub mod deselect;
pub mod error;
pub mod ranking;
pub mod scanner;
pub mod selector;
pub mod tracker;

pub use deselect::deselect;
pub use error::{PlacementError, PlacementResult};
pub use ranking::{by_score_desc, rank_candidates, score_pools};
pub use scanner::{DeploymentContext, scan};
pub use selector::{Selection, Selector, resolve_replica_count};
pub use tracker::ConstraintTracker;
