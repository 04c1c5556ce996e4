use std::collections::HashMap;
use crate::core::error::ScoringError;
use crate::models::{QuestionId, ResponseAnswers};

/// Answer to one question, merged from all its stored rows
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Single(String),
    Multiple(Vec<String>),
}

/// Lookup table of two responses' answers keyed by question id
///
/// Mentor and mentee surveys use disjoint question ids, so merging both
/// responses into one table lets the rubric address any question directly.
#[derive(Debug, Clone, Default)]
pub struct AnswerLookup {
    answers: HashMap<QuestionId, Answer>,
}

impl AnswerLookup {
    /// Merge the answers of two responses from different surveys
    pub fn build(a: &ResponseAnswers, b: &ResponseAnswers) -> Result<Self, ScoringError> {
        if a.survey_id == b.survey_id {
            return Err(ScoringError::SameSurvey(a.survey_id));
        }

        let mut answers: HashMap<QuestionId, Answer> = HashMap::new();

        for row in a.answers.iter().chain(b.answers.iter()) {
            match answers.get_mut(&row.question_id) {
                None => {
                    let answer = if row.question_type.is_multi_valued() {
                        Answer::Multiple(vec![row.value.clone()])
                    } else {
                        Answer::Single(row.value.clone())
                    };
                    answers.insert(row.question_id, answer);
                }
                Some(Answer::Multiple(values)) => values.push(row.value.clone()),
                // First row wins for single-valued questions
                Some(Answer::Single(_)) => {
                    tracing::trace!("Ignoring extra answer row for question {}", row.question_id);
                }
            }
        }

        Ok(Self { answers })
    }

    pub fn get(&self, question_id: QuestionId) -> Option<&Answer> {
        self.answers.get(&question_id)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.answers.len()
    }

    /// Single value of a question
    pub fn value(&self, question_id: QuestionId) -> Result<&str, ScoringError> {
        match self.get(question_id) {
            Some(Answer::Single(value)) => Ok(value.as_str()),
            Some(Answer::Multiple(values)) => values
                .first()
                .map(String::as_str)
                .ok_or(ScoringError::MissingAnswer(question_id)),
            None => Err(ScoringError::MissingAnswer(question_id)),
        }
    }

    /// All values of a question; empty when nothing was selected
    pub fn values(&self, question_id: QuestionId) -> &[String] {
        match self.get(question_id) {
            Some(Answer::Multiple(values)) => values,
            Some(Answer::Single(value)) => std::slice::from_ref(value),
            None => &[],
        }
    }

    /// Single value of a question parsed as an integer
    pub fn integer(&self, question_id: QuestionId) -> Result<i64, ScoringError> {
        let value = self.value(question_id)?;
        value
            .trim()
            .parse::<i64>()
            .map_err(|_| ScoringError::InvalidNumber {
                question_id,
                value: value.to_string(),
            })
    }
}
