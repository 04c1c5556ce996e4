use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use std::collections::HashMap;
use validator::Validate;
use crate::core::{group_by_mentor, MatchFilter};
use crate::models::{
    CompletionsResponse, MatchBoardResponse, Participant, ParticipantsResponse, RemoveRequest,
    ResponseAnswers, Role, ScoreMatrix, UnmatchedMentee,
};
use crate::routes::{error_response, matches::mentor_candidates, store_error, AppState};
use crate::services::CacheKey;

/// Configure admin console routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/manage/match", web::get().to(match_board))
        .route("/manage/completions", web::get().to(completions))
        .route("/manage/ments", web::get().to(participants))
        .route("/{collection}/delete", web::post().to(remove_participant));
}

const EMAIL_WARNING: &str = "Email notifications are turned on!";

/// Score matrix of every mentee against every mentor, cached until
/// responses or participants change
async fn score_matrix(
    state: &AppState,
    mentees: &[Participant],
    mentors: &[Participant],
) -> Result<ScoreMatrix, crate::services::PostgresError> {
    let key = CacheKey::score_matrix(&state.matcher.scoring_version());
    let epoch = state.cache.score_epoch();
    if let Ok(matrix) = state.cache.get::<ScoreMatrix>(&key).await {
        return Ok(matrix);
    }

    let ids: Vec<i64> = mentees
        .iter()
        .chain(mentors.iter())
        .map(|p| p.response_id)
        .collect();
    let mut responses: HashMap<i64, ResponseAnswers> = state
        .postgres
        .get_responses(&ids)
        .await?
        .into_iter()
        .map(|r| (r.response_id, r))
        .collect();

    let mut take = |people: &[Participant]| -> Vec<ResponseAnswers> {
        people
            .iter()
            .filter_map(|p| responses.remove(&p.response_id))
            .collect()
    };
    let mentee_responses = take(mentees);
    let mentor_responses = take(mentors);

    let matrix = state.matcher.score_matrix(&mentee_responses, &mentor_responses);

    if let Err(e) = state.cache.set_score(&key, &matrix, epoch).await {
        tracing::warn!("Failed to cache score matrix: {}", e);
    }

    Ok(matrix)
}

/// Matching console
///
/// GET /api/v1/manage/match
async fn match_board(state: web::Data<AppState>) -> impl Responder {
    let mentors = match state.postgres.list_participants(Role::Mentor).await {
        Ok(mentors) => mentors,
        Err(e) => return store_error("Failed to fetch mentors", e),
    };
    let mentees = match state.postgres.list_participants(Role::Mentee).await {
        Ok(mentees) => mentees,
        Err(e) => return store_error("Failed to fetch mentees", e),
    };

    let scores = match score_matrix(&state, &mentees, &mentors).await {
        Ok(matrix) => matrix,
        Err(e) => return store_error("Failed to fetch responses", e),
    };

    let unmatched = match state.postgres.unmatched_mentees().await {
        Ok(unmatched) => unmatched,
        Err(e) => return store_error("Failed to fetch unmatched mentees", e),
    };
    let candidates = match mentor_candidates(&state, &mentors).await {
        Ok(candidates) => candidates,
        Err(e) => return store_error("Failed to fetch mentor responses", e),
    };
    let unmatched_ids: Vec<i64> = unmatched.iter().map(|m| m.response_id).collect();
    let mut unmatched_responses: HashMap<i64, ResponseAnswers> =
        match state.postgres.get_responses(&unmatched_ids).await {
            Ok(responses) => responses.into_iter().map(|r| (r.response_id, r)).collect(),
            Err(e) => return store_error("Failed to fetch mentee responses", e),
        };

    let unmatched_mentees: Vec<UnmatchedMentee> = unmatched
        .into_iter()
        .map(|mentee| {
            let suitors = match unmatched_responses.remove(&mentee.response_id) {
                Some(response) => {
                    state
                        .matcher
                        .find_suitors(&response, &candidates, state.matching.suitor_limit)
                        .suitors
                }
                None => {
                    tracing::warn!("Mentee {} has no stored response", mentee.id);
                    Vec::new()
                }
            };
            UnmatchedMentee { mentee, suitors }
        })
        .collect();

    let matches = match state.postgres.active_matches().await {
        Ok(rows) => rows,
        Err(e) => return store_error("Failed to fetch matches", e),
    };

    let mut mentors_by_name = mentors;
    mentors_by_name.sort_by(|a, b| {
        a.last_name
            .cmp(&b.last_name)
            .then_with(|| a.first_name.cmp(&b.first_name))
    });

    let mut warnings = Vec::new();
    if state.notifications.send_email {
        warnings.push(EMAIL_WARNING.to_string());
    }

    tracing::info!(
        "Match board: {} mentees x {} mentors, {} unmatched, {} active matches",
        scores.rows.len(),
        scores.mentor_response_ids.len(),
        unmatched_mentees.len(),
        matches.len()
    );

    HttpResponse::Ok().json(MatchBoardResponse {
        scores,
        unmatched_mentees,
        engagements: group_by_mentor(&matches, MatchFilter::ENGAGEMENTS),
        marriages: group_by_mentor(&matches, MatchFilter::MARRIAGES),
        mentors: mentors_by_name,
        warnings,
    })
}

/// Finished pairings
///
/// GET /api/v1/manage/completions
async fn completions(state: web::Data<AppState>) -> impl Responder {
    match state.postgres.active_matches().await {
        Ok(rows) => HttpResponse::Ok().json(CompletionsResponse {
            completed: group_by_mentor(&rows, MatchFilter::COMPLETIONS),
        }),
        Err(e) => store_error("Failed to fetch matches", e),
    }
}

/// All mentors and mentees
///
/// GET /api/v1/manage/ments
async fn participants(state: web::Data<AppState>) -> impl Responder {
    let mentors = match state.postgres.list_participants(Role::Mentor).await {
        Ok(mentors) => mentors,
        Err(e) => return store_error("Failed to fetch mentors", e),
    };
    let mentees = match state.postgres.list_participants(Role::Mentee).await {
        Ok(mentees) => mentees,
        Err(e) => return store_error("Failed to fetch mentees", e),
    };

    HttpResponse::Ok().json(ParticipantsResponse { mentors, mentees })
}

/// Remove a mentor or mentee with their response and matches
///
/// POST /api/v1/{mentors|mentees}/delete
///
/// Request body:
/// ```json
/// { "id": 5 }
/// ```
async fn remove_participant(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<RemoveRequest>,
) -> impl Responder {
    let collection = path.into_inner();
    let Some(role) = Role::from_collection(&collection) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Invalid collection",
            format!("{} is not 'mentors' or 'mentees'", collection),
        );
    };

    if let Err(errors) = req.validate() {
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors);
    }

    match state.postgres.remove_participant(role, req.id).await {
        Ok(true) => {
            state.cache.invalidate_scores().await;
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "message": "Object deleted",
            }))
        }
        Ok(false) => error_response(
            StatusCode::NOT_FOUND,
            "Not found",
            format!("No {} entry with id {}", role.collection(), req.id),
        ),
        Err(e) => store_error("Failed to remove participant", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_request_validation() {
        assert!(RemoveRequest { id: 3 }.validate().is_ok());
        assert!(RemoveRequest { id: 0 }.validate().is_err());
    }
}
