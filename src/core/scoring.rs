use crate::core::error::ScoringError;
use crate::core::lookup::AnswerLookup;
use crate::core::rubric::{
    availability_satisfied, field_of_study_agreement, gender_agreement, shared_interests,
    skill_qualifies, Agreement,
};
use crate::models::{MatchScore, QuestionId, Rubric, ScoringWeights};

/// Calculate the compatibility score of a mentee-mentor pair
///
/// Scoring formula:
/// score = (
///     field_of_study +     # mutual 2, partial 1
///     gender +             # mutual 2, partial 1
///     availability +       # mentor hours >= mentee hours
///     skills +             # one point per requested skill the mentor rates >= 3
///     interests            # one point when any interest is shared
/// )
/// with the points taken from `weights`.
pub fn calculate_match_score(
    lookup: &AnswerLookup,
    rubric: &Rubric,
    weights: &ScoringWeights,
) -> Result<MatchScore, ScoringError> {
    let field_of_study = field_of_study_points(lookup, rubric, weights)?;
    let gender = gender_points(lookup, rubric, weights)?;
    let availability = availability_points(lookup, rubric, weights)?;
    let skills = skill_points(lookup, rubric, weights)?;

    let shared = shared_interests(
        lookup.values(rubric.mentee_interests),
        lookup.values(rubric.mentor_interests),
    );
    // One point for any overlap; interests shouldn't outweigh the other criteria
    let interests = if shared.is_empty() { 0.0 } else { weights.shared_interests };

    Ok(MatchScore {
        total: field_of_study + gender + availability + skills + interests,
        field_of_study,
        gender,
        availability,
        skills,
        interests,
        shared_interests: shared,
    })
}

#[inline]
fn agreement_points(agreement: Agreement, mutual: f64, partial: f64) -> f64 {
    match agreement {
        Agreement::Mutual => mutual,
        Agreement::Partial => partial,
        Agreement::None => 0.0,
    }
}

fn field_of_study_points(
    lookup: &AnswerLookup,
    rubric: &Rubric,
    weights: &ScoringWeights,
) -> Result<f64, ScoringError> {
    let mentee_pref = lookup.value(rubric.mentee_field_preference)?;
    let mentor_pref = lookup.value(rubric.mentor_field_preference)?;
    let same_field =
        lookup.value(rubric.mentor_field_of_study)? == lookup.value(rubric.mentee_field_of_study)?;

    Ok(agreement_points(
        field_of_study_agreement(mentee_pref, mentor_pref, same_field),
        weights.field_of_study_mutual,
        weights.field_of_study_partial,
    ))
}

fn gender_points(
    lookup: &AnswerLookup,
    rubric: &Rubric,
    weights: &ScoringWeights,
) -> Result<f64, ScoringError> {
    let agreement = gender_agreement(
        lookup.value(rubric.mentee_gender_preference)?,
        lookup.value(rubric.mentor_gender_preference)?,
        lookup.value(rubric.mentee_gender)?,
        lookup.value(rubric.mentor_gender)?,
    );

    Ok(agreement_points(agreement, weights.gender_mutual, weights.gender_partial))
}

fn availability_points(
    lookup: &AnswerLookup,
    rubric: &Rubric,
    weights: &ScoringWeights,
) -> Result<f64, ScoringError> {
    let mentee = lookup.integer(rubric.mentee_availability)?;
    let mentor = lookup.integer(rubric.mentor_availability)?;

    Ok(if availability_satisfied(mentee, mentor) {
        weights.availability
    } else {
        0.0
    })
}

/// Each requested skill names the mentor's Likert question rating that skill
fn skill_points(
    lookup: &AnswerLookup,
    rubric: &Rubric,
    weights: &ScoringWeights,
) -> Result<f64, ScoringError> {
    let mut points = 0.0;

    for requested in lookup.values(rubric.mentee_skill_requests) {
        let skill_question: QuestionId =
            requested
                .trim()
                .parse()
                .map_err(|_| ScoringError::InvalidQuestionId {
                    question_id: rubric.mentee_skill_requests,
                    value: requested.clone(),
                })?;

        if skill_qualifies(lookup.integer(skill_question)?, rubric.skill_threshold) {
            points += weights.skill;
        }
    }

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnswerRow, QuestionType, ResponseAnswers};

    fn answer(question_id: QuestionId, question_type: QuestionType, value: &str) -> AnswerRow {
        AnswerRow {
            question_id,
            question_type,
            value: value.to_string(),
        }
    }

    fn mentor_response(gender: &str, field: &str, field_pref: &str, hours: &str) -> ResponseAnswers {
        ResponseAnswers {
            response_id: 10,
            survey_id: 1,
            answers: vec![
                answer(13, QuestionType::Radio, gender),
                answer(17, QuestionType::Select, field),
                answer(19, QuestionType::Radio, field_pref),
                answer(20, QuestionType::Radio, "-1"),
                answer(21, QuestionType::Select, hours),
                answer(30, QuestionType::Checkbox, "hiking"),
                answer(30, QuestionType::Checkbox, "chess"),
                answer(24, QuestionType::Likert, "4"),
                answer(25, QuestionType::Likert, "2"),
            ],
        }
    }

    fn mentee_response(gender: &str, field: &str, field_pref: &str, hours: &str) -> ResponseAnswers {
        ResponseAnswers {
            response_id: 20,
            survey_id: 2,
            answers: vec![
                answer(45, QuestionType::Radio, gender),
                answer(49, QuestionType::Select, field),
                answer(51, QuestionType::Radio, field_pref),
                answer(52, QuestionType::Radio, "-1"),
                answer(53, QuestionType::Select, hours),
                answer(55, QuestionType::Checkbox, "24"),
                answer(55, QuestionType::Checkbox, "25"),
                answer(57, QuestionType::Checkbox, "chess"),
            ],
        }
    }

    fn score(mentee: &ResponseAnswers, mentor: &ResponseAnswers) -> Result<MatchScore, ScoringError> {
        let lookup = AnswerLookup::build(mentee, mentor)?;
        calculate_match_score(&lookup, &Rubric::default(), &ScoringWeights::default())
    }

    #[test]
    fn test_calculate_match_score() {
        let mentor = mentor_response("female", "Physics", "within", "3");
        let mentee = mentee_response("male", "Physics", "within", "2");

        let result = score(&mentee, &mentor).unwrap();

        assert_eq!(result.field_of_study, 2.0);
        assert_eq!(result.gender, 1.0);
        assert_eq!(result.availability, 1.0);
        assert_eq!(result.skills, 1.0);
        assert_eq!(result.interests, 1.0);
        assert_eq!(result.total, 6.0);
        assert_eq!(result.shared_interests, vec!["chess"]);
    }

    #[test]
    fn test_score_is_symmetric_in_lookup_order() {
        let mentor = mentor_response("female", "Physics", "-1", "1");
        let mentee = mentee_response("female", "History", "outside", "4");

        let a = score(&mentee, &mentor).unwrap();
        let b = score(&mentor, &mentee).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.field_of_study, 1.0);
        assert_eq!(a.availability, 0.0);
    }

    #[test]
    fn test_unticked_checkboxes_score_nothing() {
        let mentor = mentor_response("male", "Physics", "within", "3");
        let mut mentee = mentee_response("male", "History", "within", "2");
        mentee.answers.retain(|a| a.question_id != 55 && a.question_id != 57);

        let result = score(&mentee, &mentor).unwrap();

        assert_eq!(result.skills, 0.0);
        assert_eq!(result.interests, 0.0);
        assert!(result.shared_interests.is_empty());
    }

    #[test]
    fn test_weights_applied() {
        let mentor = mentor_response("female", "Physics", "within", "3");
        let mentee = mentee_response("male", "Physics", "within", "2");
        let lookup = AnswerLookup::build(&mentee, &mentor).unwrap();
        let weights = ScoringWeights {
            field_of_study_mutual: 10.0,
            skill: 0.5,
            ..ScoringWeights::default()
        };

        let result = calculate_match_score(&lookup, &Rubric::default(), &weights).unwrap();

        assert_eq!(result.field_of_study, 10.0);
        assert_eq!(result.skills, 0.5);
        assert_eq!(result.total, 13.5);
    }

    #[test]
    fn test_missing_required_answer() {
        let mut mentor = mentor_response("female", "Physics", "within", "3");
        mentor.answers.retain(|a| a.question_id != 21);
        let mentee = mentee_response("male", "Physics", "within", "2");

        assert_eq!(score(&mentee, &mentor).unwrap_err(), ScoringError::MissingAnswer(21));
    }

    #[test]
    fn test_invalid_skill_reference() {
        let mentor = mentor_response("female", "Physics", "within", "3");
        let mut mentee = mentee_response("male", "Physics", "within", "2");
        mentee.answers.push(answer(55, QuestionType::Checkbox, "leadership"));

        assert!(matches!(
            score(&mentee, &mentor),
            Err(ScoringError::InvalidQuestionId { question_id: 55, .. })
        ));
    }
}
