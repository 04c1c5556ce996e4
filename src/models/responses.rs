use serde::{Deserialize, Serialize};
use crate::models::domain::{
    Match, MatchScore, MentorMatches, Participant, ReportEntry, ScoreMatrix, Suitor,
};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub cache_entries: u64,
    pub redis_enabled: bool,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Score of a single mentee-mentor pair
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResponse {
    pub mentee_response_id: i64,
    pub mentor_response_id: i64,
    pub score: MatchScore,
}

/// Ranked suitors for one mentee
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuitorsResponse {
    pub mentee_id: i64,
    pub suitors: Vec<Suitor>,
    pub total_candidates: usize,
}

/// An unmatched mentee and the mentors proposed for them
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmatchedMentee {
    pub mentee: Participant,
    pub suitors: Vec<Suitor>,
}

/// Everything the matching console shows
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchBoardResponse {
    pub scores: ScoreMatrix,
    pub unmatched_mentees: Vec<UnmatchedMentee>,
    pub engagements: Vec<MentorMatches>,
    pub marriages: Vec<MentorMatches>,
    pub mentors: Vec<Participant>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionsResponse {
    pub completed: Vec<MentorMatches>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantsResponse {
    pub mentors: Vec<Participant>,
    pub mentees: Vec<Participant>,
}

/// Result of a lifecycle action on a pair
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairActionResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pairing: Option<Match>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponseResponse {
    pub response_id: i64,
    pub user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub response_id: i64,
    pub questions: Vec<ReportEntry>,
}
