use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use crate::core::{error::ScoringError, lookup::AnswerLookup, scoring::calculate_match_score};
use crate::models::{
    MatchScore, MentorCandidate, ResponseAnswers, Rubric, ScoreCell, ScoreMatrix, ScoreRow,
    ScoringWeights, Suitor,
};

/// Default number of suitors proposed per unmatched mentee
pub const DEFAULT_SUITOR_LIMIT: usize = 3;

/// Result of ranking mentors for one mentee
#[derive(Debug)]
pub struct SuitorResult {
    pub suitors: Vec<Suitor>,
    pub total_candidates: usize,
}

/// Matching orchestrator
///
/// Scores mentee-mentor pairs against the rubric and ranks mentors for a
/// mentee. Pure: callers fetch responses and participants from the store.
#[derive(Debug, Clone)]
pub struct Matcher {
    weights: ScoringWeights,
    rubric: Rubric,
}

impl Matcher {
    pub fn new(weights: ScoringWeights, rubric: Rubric) -> Self {
        Self { weights, rubric }
    }

    pub fn with_default_weights() -> Self {
        Self {
            weights: ScoringWeights::default(),
            rubric: Rubric::default(),
        }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn rubric(&self) -> &Rubric {
        &self.rubric
    }

    /// Fingerprint of the rubric and weights, for keying cached scores
    pub fn scoring_version(&self) -> String {
        let mut hasher = DefaultHasher::new();
        self.rubric.hash(&mut hasher);

        let w = &self.weights;
        for weight in [
            w.field_of_study_mutual,
            w.field_of_study_partial,
            w.gender_mutual,
            w.gender_partial,
            w.availability,
            w.skill,
            w.shared_interests,
        ] {
            weight.to_bits().hash(&mut hasher);
        }

        format!("{:016x}", hasher.finish())
    }

    /// Score a mentee response against a mentor response
    pub fn score(
        &self,
        mentee: &ResponseAnswers,
        mentor: &ResponseAnswers,
    ) -> Result<MatchScore, ScoringError> {
        let lookup = AnswerLookup::build(mentee, mentor)?;
        calculate_match_score(&lookup, &self.rubric, &self.weights)
    }

    /// Score every mentee response against every mentor response
    ///
    /// Rows follow `mentees`, cells follow `mentors`. A pair that cannot be
    /// scored gets an empty cell carrying the reason.
    pub fn score_matrix(
        &self,
        mentees: &[ResponseAnswers],
        mentors: &[ResponseAnswers],
    ) -> ScoreMatrix {
        let rows = mentees
            .iter()
            .map(|mentee| ScoreRow {
                mentee_response_id: mentee.response_id,
                cells: mentors
                    .iter()
                    .map(|mentor| match self.score(mentee, mentor) {
                        Ok(score) => ScoreCell {
                            mentor_response_id: mentor.response_id,
                            score: Some(score.total),
                            error: None,
                        },
                        Err(e) => {
                            tracing::warn!(
                                "Cannot score mentee response {} against mentor response {}: {}",
                                mentee.response_id,
                                mentor.response_id,
                                e
                            );
                            ScoreCell {
                                mentor_response_id: mentor.response_id,
                                score: None,
                                error: Some(e.to_string()),
                            }
                        }
                    })
                    .collect(),
            })
            .collect();

        ScoreMatrix {
            mentor_response_ids: mentors.iter().map(|m| m.response_id).collect(),
            rows,
        }
    }

    /// Rank mentors for a mentee
    ///
    /// Highest score first; among equal scores the mentor with fewer mentees
    /// is preferred, then the earlier candidate.
    pub fn find_suitors(
        &self,
        mentee: &ResponseAnswers,
        candidates: &[MentorCandidate],
        limit: usize,
    ) -> SuitorResult {
        let total_candidates = candidates.len();

        let mut suitors: Vec<Suitor> = candidates
            .iter()
            .filter_map(|candidate| match self.score(mentee, &candidate.response) {
                Ok(score) => Some(Suitor {
                    mentor_id: candidate.mentor_id,
                    score: score.total,
                    mentee_count: candidate.mentee_count,
                }),
                Err(e) => {
                    tracing::warn!(
                        "Skipping mentor {} as suitor for mentee response {}: {}",
                        candidate.mentor_id,
                        mentee.response_id,
                        e
                    );
                    None
                }
            })
            .collect();

        // Stable sort keeps candidate order for full ties
        suitors.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.mentee_count.cmp(&b.mentee_count))
        });

        suitors.truncate(limit);

        SuitorResult {
            suitors,
            total_candidates,
        }
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_weights()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnswerRow, QuestionType};

    fn answer(question_id: i64, value: &str) -> AnswerRow {
        let question_type = if matches!(question_id, 30 | 55 | 57) {
            QuestionType::Checkbox
        } else {
            QuestionType::Radio
        };
        AnswerRow {
            question_id,
            question_type,
            value: value.to_string(),
        }
    }

    /// Mentor whose availability decides the score against `create_mentee`
    fn create_mentor(response_id: i64, hours: &str) -> ResponseAnswers {
        ResponseAnswers {
            response_id,
            survey_id: 1,
            answers: vec![
                answer(13, "female"),
                answer(17, "Biology"),
                answer(19, "-1"),
                answer(20, "-1"),
                answer(21, hours),
            ],
        }
    }

    fn create_mentee() -> ResponseAnswers {
        ResponseAnswers {
            response_id: 100,
            survey_id: 2,
            answers: vec![
                answer(45, "male"),
                answer(49, "Biology"),
                answer(51, "-1"),
                answer(52, "-1"),
                answer(53, "2"),
            ],
        }
    }

    fn candidate(mentor_id: i64, hours: &str, mentee_count: i64) -> MentorCandidate {
        MentorCandidate {
            mentor_id,
            response: create_mentor(mentor_id * 10, hours),
            mentee_count,
        }
    }

    #[test]
    fn test_score_pair() {
        let matcher = Matcher::with_default_weights();

        let score = matcher.score(&create_mentee(), &create_mentor(1, "2")).unwrap();

        // field partial + gender partial + availability
        assert_eq!(score.total, 3.0);
    }

    #[test]
    fn test_suitors_ranked_by_score_then_load() {
        let matcher = Matcher::with_default_weights();
        let candidates = vec![
            candidate(1, "1", 0), // not available enough
            candidate(2, "3", 4),
            candidate(3, "3", 1),
            candidate(4, "5", 1),
        ];

        let result = matcher.find_suitors(&create_mentee(), &candidates, 3);

        let ids: Vec<i64> = result.suitors.iter().map(|s| s.mentor_id).collect();
        assert_eq!(ids, vec![3, 4, 2]);
        assert_eq!(result.total_candidates, 4);
    }

    #[test]
    fn test_suitor_ties_keep_candidate_order() {
        let matcher = Matcher::with_default_weights();
        let candidates = vec![candidate(7, "3", 2), candidate(5, "3", 2)];

        let result = matcher.find_suitors(&create_mentee(), &candidates, DEFAULT_SUITOR_LIMIT);

        assert_eq!(result.suitors[0].mentor_id, 7);
        assert_eq!(result.suitors[1].mentor_id, 5);
    }

    #[test]
    fn test_unscorable_suitor_skipped() {
        let matcher = Matcher::with_default_weights();
        let mut broken = candidate(9, "3", 0);
        broken.response.answers.retain(|a| a.question_id != 13);
        let candidates = vec![broken, candidate(2, "3", 0)];

        let result = matcher.find_suitors(&create_mentee(), &candidates, 3);

        assert_eq!(result.suitors.len(), 1);
        assert_eq!(result.suitors[0].mentor_id, 2);
    }

    #[test]
    fn test_score_matrix_shape() {
        let matcher = Matcher::with_default_weights();
        let mentors = vec![create_mentor(1, "2"), create_mentor(2, "1")];
        let mut other_mentee = create_mentee();
        other_mentee.response_id = 101;
        other_mentee.answers.retain(|a| a.question_id != 53);
        let mentees = vec![create_mentee(), other_mentee];

        let matrix = matcher.score_matrix(&mentees, &mentors);

        assert_eq!(matrix.mentor_response_ids, vec![1, 2]);
        assert_eq!(matrix.rows.len(), 2);
        assert_eq!(matrix.rows[0].cells[0].score, Some(3.0));
        assert_eq!(matrix.rows[0].cells[1].score, Some(2.0));
        assert_eq!(matrix.rows[1].mentee_response_id, 101);
        assert!(matrix.rows[1].cells.iter().all(|c| c.score.is_none() && c.error.is_some()));
    }

    #[test]
    fn test_scoring_version_tracks_settings() {
        let base = Matcher::with_default_weights();
        assert_eq!(base.scoring_version(), Matcher::default().scoring_version());

        let reweighted = Matcher::new(
            ScoringWeights {
                skill: 2.0,
                ..ScoringWeights::default()
            },
            Rubric::default(),
        );
        let remapped = Matcher::new(
            ScoringWeights::default(),
            Rubric {
                skill_threshold: 4,
                ..Rubric::default()
            },
        );

        assert_ne!(base.scoring_version(), reweighted.scoring_version());
        assert_ne!(base.scoring_version(), remapped.scoring_version());
        assert_eq!(base.scoring_version().len(), 16);
    }
}
