//! Pure, synchronous lead-generation stages: pattern inference, candidate
//! generation, deduplication and scoring.

pub mod candidates;
pub mod dedupe;
pub mod patterns;
pub mod score;

pub use candidates::{generate_candidates, matches_target_role, split_name};
pub use dedupe::{dedupe_by, dedupe_people, token_set_similarity, LeadIdentity, DEFAULT_FUZZY_THRESHOLD};
pub use patterns::infer_patterns;
pub use score::{role_weight, score_leads};
