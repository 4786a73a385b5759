//! Gamification badges: the fixed requirement table, per-user counters and
//! their evaluation.

mod evaluator;
mod progress;
mod requirements;

pub use evaluator::{evaluate, evaluate_requirement, BadgeStatus, BadgeSummary};
pub use progress::BadgeProgress;
pub use requirements::{find_requirement, BadgeRequirement, BadgeType, BADGE_REQUIREMENTS};
