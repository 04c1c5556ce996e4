//! Mentoring Match - compatibility scoring and matching service for the
//! university mentoring program
//!
//! Mentors and mentees each fill in a survey. The core scores a mentee's
//! response against a mentor's response with a fixed rubric of survey
//! questions and ranks mentors as suitors for unmatched mentees. The
//! service around it tracks the match lifecycle (engage, marry, complete).

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{AnswerLookup, Matcher, ScoringError, calculate_match_score};
pub use models::{MatchScore, ResponseAnswers, Rubric, ScoringWeights, Suitor};
