// Core algorithm exports
pub mod error;
pub mod lookup;
pub mod matcher;
pub mod pairing;
pub mod report;
pub mod rubric;
pub mod scoring;

pub use error::ScoringError;
pub use lookup::{Answer, AnswerLookup};
pub use matcher::{Matcher, SuitorResult, DEFAULT_SUITOR_LIMIT};
pub use pairing::{group_by_mentor, MatchFilter};
pub use report::group_report_rows;
pub use rubric::{field_of_study_agreement, gender_agreement, shared_interests, Agreement};
pub use scoring::calculate_match_score;
