//! Narrative insight support
//!
//! - **Ranker** - orders a week's recommendations for presentation
//! - **Regeneration** - cancellable "regenerate insight" state machine
//!
//! Narrative records themselves live in the [`crate::repository::InsightRepository`].

pub mod ranker;
pub mod regeneration;

pub use ranker::{InsertionOrderRanker, RecommendationRanker};
pub use regeneration::{InsightRegenerationController, RegenerationConfig, RegenerationState};
