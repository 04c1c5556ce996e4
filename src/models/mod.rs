// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    AnswerRow, Match, MatchRow, MatchScore, MatchStatus, MatchedMentee, MentorCandidate,
    MentorMatches, Participant, QuestionId, QuestionType, ReportEntry, ReportRow,
    ResponseAnswers, Role, Rubric, ScoreCell, ScoreMatrix, ScoreRow, ScoringWeights, Suitor,
};
pub use requests::{AnswerSubmission, PairRequest, RemoveRequest, ScoreRequest, SubmitResponseRequest, SuitorsQuery};
pub use responses::{
    CompletionsResponse, ErrorResponse, HealthResponse, MatchBoardResponse, PairActionResponse,
    ParticipantsResponse, ReportResponse, ScoreResponse, SubmitResponseResponse, SuitorsResponse,
    UnmatchedMentee,
};
