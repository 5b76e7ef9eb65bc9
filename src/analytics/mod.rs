//! Pure analytics over period and mood history. Nothing in here touches
//! storage or the clock; callers pass `today` explicitly.

pub mod achievements;
pub mod cycle;
pub mod date_math;
pub mod mood;
pub mod patterns;
pub mod streak;
