use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request naming a mentor-mentee pair (engage, marry, complete, ...)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PairRequest {
    #[validate(range(min = 1))]
    #[serde(alias = "mentor_id", rename = "mentorId")]
    pub mentor_id: i64,
    #[validate(range(min = 1))]
    #[serde(alias = "mentee_id", rename = "menteeId")]
    pub mentee_id: i64,
}

/// Request to score two responses against each other
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScoreRequest {
    #[validate(range(min = 1))]
    #[serde(alias = "mentee_response_id", rename = "menteeResponseId")]
    pub mentee_response_id: i64,
    #[validate(range(min = 1))]
    #[serde(alias = "mentor_response_id", rename = "mentorResponseId")]
    pub mentor_response_id: i64,
}

/// Request to remove a mentor or mentee
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RemoveRequest {
    #[validate(range(min = 1))]
    pub id: i64,
}

/// Query parameters for the suitors endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct SuitorsQuery {
    pub limit: Option<usize>,
}

/// Survey submission
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitResponseRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[serde(default, alias = "first_name", rename = "firstName")]
    pub first_name: String,
    #[serde(default, alias = "last_name", rename = "lastName")]
    pub last_name: String,
    #[validate(length(min = 1))]
    pub answers: Vec<AnswerSubmission>,
}

/// One submitted answer; either a picked choice, a typed value, or both for
/// choices that carry a textbox
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerSubmission {
    #[serde(alias = "question_id", rename = "questionId")]
    pub question_id: i64,
    #[serde(default, alias = "choice_id", rename = "choiceId")]
    pub choice_id: Option<i64>,
    #[serde(default)]
    pub value: Option<String>,
}

impl AnswerSubmission {
    pub fn is_empty(&self) -> bool {
        self.choice_id.is_none() && self.value.as_deref().map_or(true, str::is_empty)
    }
}
