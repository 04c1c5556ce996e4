use serde::{Deserialize, Serialize};

/// Survey question identifier
pub type QuestionId = i64;

/// Survey question types, stored by their numeric code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Textbox,
    Checkbox,
    Radio,
    Select,
    Likert,
    Heading,
    Textarea,
    SelectMultiple,
}

impl QuestionType {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Textbox),
            2 => Some(Self::Checkbox),
            4 => Some(Self::Radio),
            8 => Some(Self::Select),
            16 => Some(Self::Likert),
            32 => Some(Self::Heading),
            64 => Some(Self::Textarea),
            128 => Some(Self::SelectMultiple),
            _ => None,
        }
    }

    #[cfg(test)]
    fn code(self) -> i32 {
        match self {
            Self::Textbox => 1,
            Self::Checkbox => 2,
            Self::Radio => 4,
            Self::Select => 8,
            Self::Likert => 16,
            Self::Heading => 32,
            Self::Textarea => 64,
            Self::SelectMultiple => 128,
        }
    }

    /// Questions that store one answer row per selected choice
    pub fn is_multi_valued(self) -> bool {
        matches!(self, Self::Checkbox | Self::SelectMultiple)
    }

    pub fn has_choices(self) -> bool {
        !matches!(
            self,
            Self::Heading | Self::Textbox | Self::Textarea | Self::Likert
        )
    }

    pub fn could_have_subquestion(self) -> bool {
        matches!(self, Self::Checkbox | Self::Radio)
    }
}

/// One stored answer of a response
///
/// `value` is already resolved: the chosen choice's value when a choice was
/// picked, otherwise the free-text value the respondent typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRow {
    pub question_id: QuestionId,
    pub question_type: QuestionType,
    pub value: String,
}

/// Key-value view of one survey response, as handed over by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseAnswers {
    pub response_id: i64,
    pub survey_id: i64,
    pub answers: Vec<AnswerRow>,
}

/// Participant role in the program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Mentor,
    Mentee,
}

impl Role {
    /// Collection name used in admin URLs
    pub fn collection(self) -> &'static str {
        match self {
            Role::Mentor => "mentors",
            Role::Mentee => "mentees",
        }
    }

    pub fn from_collection(name: &str) -> Option<Self> {
        match name {
            "mentors" => Some(Role::Mentor),
            "mentees" => Some(Role::Mentee),
            _ => None,
        }
    }

    pub(crate) fn table(self) -> &'static str {
        match self {
            Role::Mentor => "mentors",
            Role::Mentee => "mentees",
        }
    }

    pub(crate) fn id_column(self) -> &'static str {
        match self {
            Role::Mentor => "mentor_id",
            Role::Mentee => "mentee_id",
        }
    }
}

/// A registered mentor or mentee together with their user record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: i64,
    pub role: Role,
    pub user_id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub response_id: i64,
    pub date_joined: chrono::DateTime<chrono::Utc>,
}


/// Mentor considered as a suitor for a mentee
#[derive(Debug, Clone)]
pub struct MentorCandidate {
    pub mentor_id: i64,
    pub response: ResponseAnswers,
    /// Number of mentees this mentor is already matched with
    pub mentee_count: i64,
}

/// Ranked suitor result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suitor {
    pub mentor_id: i64,
    pub score: f64,
    pub mentee_count: i64,
}

/// Stored mentor-mentee pairing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub match_id: i64,
    pub mentor_id: i64,
    pub mentee_id: i64,
    pub matched_on: chrono::DateTime<chrono::Utc>,
    pub notified_on: Option<chrono::DateTime<chrono::Utc>>,
    pub completed_on: Option<chrono::DateTime<chrono::Utc>>,
}

/// Lifecycle stage of a match, derived from its timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Engaged,
    Married,
    Completed,
}

/// Active match joined with both participants' usernames
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRow {
    #[serde(flatten)]
    pub pairing: Match,
    pub mentor_username: String,
    pub mentee_username: String,
}

/// Matches grouped under their mentor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentorMatches {
    pub mentor_id: i64,
    pub mentor_username: String,
    pub mentees: Vec<MatchedMentee>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedMentee {
    pub match_id: i64,
    pub mentee_id: i64,
    pub mentee_username: String,
    pub status: MatchStatus,
    pub matched_on: chrono::DateTime<chrono::Utc>,
    pub notified_on: Option<chrono::DateTime<chrono::Utc>>,
    pub completed_on: Option<chrono::DateTime<chrono::Utc>>,
}

/// Compatibility score of one mentee-mentor pair, with its breakdown
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchScore {
    pub total: f64,
    pub field_of_study: f64,
    pub gender: f64,
    pub availability: f64,
    pub skills: f64,
    pub interests: f64,
    pub shared_interests: Vec<String>,
}

/// Scores of every mentee response against every mentor response
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreMatrix {
    pub mentor_response_ids: Vec<i64>,
    pub rows: Vec<ScoreRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRow {
    pub mentee_response_id: i64,
    pub cells: Vec<ScoreCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreCell {
    pub mentor_response_id: i64,
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Question identifiers the compatibility rubric reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Rubric {
    pub mentor_field_of_study: QuestionId,
    pub mentee_field_of_study: QuestionId,
    pub mentor_field_preference: QuestionId,
    pub mentee_field_preference: QuestionId,
    pub mentor_gender: QuestionId,
    pub mentee_gender: QuestionId,
    pub mentor_gender_preference: QuestionId,
    pub mentee_gender_preference: QuestionId,
    pub mentor_availability: QuestionId,
    pub mentee_availability: QuestionId,
    /// Checkbox whose values are ids of the mentor's Likert skill questions
    pub mentee_skill_requests: QuestionId,
    pub mentor_interests: QuestionId,
    pub mentee_interests: QuestionId,
    /// Minimum Likert self-rating for a mentor skill to count
    pub skill_threshold: i64,
}

impl Default for Rubric {
    fn default() -> Self {
        Self {
            mentor_field_of_study: 17,
            mentee_field_of_study: 49,
            mentor_field_preference: 19,
            mentee_field_preference: 51,
            mentor_gender: 13,
            mentee_gender: 45,
            mentor_gender_preference: 20,
            mentee_gender_preference: 52,
            mentor_availability: 21,
            mentee_availability: 53,
            mentee_skill_requests: 55,
            mentor_interests: 30,
            mentee_interests: 57,
            skill_threshold: 3,
        }
    }
}

/// Points awarded per rubric criterion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub field_of_study_mutual: f64,
    pub field_of_study_partial: f64,
    pub gender_mutual: f64,
    pub gender_partial: f64,
    pub availability: f64,
    pub skill: f64,
    pub shared_interests: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            field_of_study_mutual: 2.0,
            field_of_study_partial: 1.0,
            gender_mutual: 2.0,
            gender_partial: 1.0,
            availability: 1.0,
            skill: 1.0,
            shared_interests: 1.0,
        }
    }
}

/// One row of a response report, in survey order
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub question_id: QuestionId,
    pub question_type: QuestionType,
    pub body: String,
    pub hide_label: bool,
    pub layout: i32,
    /// Choice body, or the typed value for free-text answers and textbox choices
    pub display_value: Option<String>,
}

/// One question of a response report with its answer(s)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    pub question_id: QuestionId,
    pub question_type: QuestionType,
    pub body: String,
    pub hide_label: bool,
    pub layout: i32,
    pub values: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_type_codes() {
        for code in [1, 2, 4, 8, 16, 32, 64, 128] {
            let question_type = QuestionType::from_code(code).unwrap();
            assert_eq!(question_type.code(), code);
        }
        assert_eq!(QuestionType::from_code(3), None);
    }

    #[test]
    fn test_multi_valued_types() {
        assert!(QuestionType::Checkbox.is_multi_valued());
        assert!(QuestionType::SelectMultiple.is_multi_valued());
        assert!(!QuestionType::Radio.is_multi_valued());
        assert!(!QuestionType::Likert.has_choices());
        assert!(QuestionType::Radio.could_have_subquestion());
    }

    #[test]
    fn test_role_collection() {
        assert_eq!(Role::from_collection("mentors"), Some(Role::Mentor));
        assert_eq!(Role::from_collection("mentees"), Some(Role::Mentee));
        assert_eq!(Role::from_collection("matches"), None);
        assert_eq!(Role::Mentee.collection(), "mentees");
    }
}
