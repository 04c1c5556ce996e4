use thiserror::Error;
use crate::models::QuestionId;

/// Errors raised while scoring a mentee-mentor pair
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    #[error("Both responses belong to survey {0}; a mentee response must be scored against a mentor response")]
    SameSurvey(i64),

    #[error("No answer to question {0}")]
    MissingAnswer(QuestionId),

    #[error("Answer to question {question_id} is not a number: {value:?}")]
    InvalidNumber { question_id: QuestionId, value: String },

    #[error("Answer to question {question_id} does not name a question: {value:?}")]
    InvalidQuestionId { question_id: QuestionId, value: String },
}
