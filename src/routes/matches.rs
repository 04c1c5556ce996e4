use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use std::collections::HashMap;
use validator::Validate;
use crate::models::{
    HealthResponse, MatchScore, MentorCandidate, PairActionResponse, PairRequest, Participant,
    ResponseAnswers, Role, ScoreRequest, ScoreResponse, SuitorsQuery, SuitorsResponse,
};
use crate::routes::{error_response, store_error, AppState};
use crate::services::{CacheKey, PostgresError};

/// Configure match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/matches/score", web::post().to(score_pair))
        .route("/matches/engage", web::post().to(engage))
        .route("/matches/breakup", web::post().to(breakup))
        .route("/matches/marry", web::post().to(marry))
        .route("/matches/divorce", web::post().to(divorce))
        .route("/matches/complete", web::post().to(complete))
        .route("/mentees/{mentee_id}/suitors", web::get().to(find_suitors));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let pg_healthy = state.postgres.health_check().await.unwrap_or(false);

    let status = if pg_healthy { "healthy" } else { "degraded" };
    let cache = state.cache.stats();

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        cache_entries: cache.l1_size,
        redis_enabled: cache.redis_enabled,
    })
}

/// Score a mentee response against a mentor response
///
/// POST /api/v1/matches/score
///
/// Request body:
/// ```json
/// {
///   "menteeResponseId": 12,
///   "mentorResponseId": 4
/// }
/// ```
async fn score_pair(
    state: web::Data<AppState>,
    req: web::Json<ScoreRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors);
    }

    let cache_key = CacheKey::pair_score(
        &state.matcher.scoring_version(),
        req.mentee_response_id,
        req.mentor_response_id,
    );
    let epoch = state.cache.score_epoch();
    if let Ok(score) = state.cache.get::<MatchScore>(&cache_key).await {
        return HttpResponse::Ok().json(ScoreResponse {
            mentee_response_id: req.mentee_response_id,
            mentor_response_id: req.mentor_response_id,
            score,
        });
    }

    let mentee = match state.postgres.get_response(req.mentee_response_id).await {
        Ok(response) => response,
        Err(e) => return store_error("Failed to fetch mentee response", e),
    };
    let mentor = match state.postgres.get_response(req.mentor_response_id).await {
        Ok(response) => response,
        Err(e) => return store_error("Failed to fetch mentor response", e),
    };

    let score = match state.matcher.score(&mentee, &mentor) {
        Ok(score) => score,
        Err(e) => {
            tracing::info!(
                "Cannot score responses {} and {}: {}",
                mentee.response_id,
                mentor.response_id,
                e
            );
            return error_response(StatusCode::UNPROCESSABLE_ENTITY, "Responses cannot be scored", e);
        }
    };

    if let Err(e) = state.cache.set_score(&cache_key, &score, epoch).await {
        tracing::warn!("Failed to cache pair score: {}", e);
    }

    HttpResponse::Ok().json(ScoreResponse {
        mentee_response_id: mentee.response_id,
        mentor_response_id: mentor.response_id,
        score,
    })
}

/// Build suitor candidates out of mentors, with their responses and loads
pub(crate) async fn mentor_candidates(
    state: &AppState,
    mentors: &[Participant],
) -> Result<Vec<MentorCandidate>, PostgresError> {
    let counts = state.postgres.mentee_counts().await?;
    let response_ids: Vec<i64> = mentors.iter().map(|m| m.response_id).collect();
    let mut responses: HashMap<i64, ResponseAnswers> = state
        .postgres
        .get_responses(&response_ids)
        .await?
        .into_iter()
        .map(|r| (r.response_id, r))
        .collect();

    Ok(mentors
        .iter()
        .filter_map(|mentor| {
            let response = responses.remove(&mentor.response_id)?;
            Some(MentorCandidate {
                mentor_id: mentor.id,
                response,
                mentee_count: counts.get(&mentor.id).copied().unwrap_or(0),
            })
        })
        .collect())
}

/// Rank mentors for one mentee
///
/// GET /api/v1/mentees/{mentee_id}/suitors?limit=3
async fn find_suitors(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    query: web::Query<SuitorsQuery>,
) -> impl Responder {
    let mentee_id = path.into_inner();
    let limit = state.matching.effective_suitor_limit(query.limit);

    let mentee = match state.postgres.get_participant(Role::Mentee, mentee_id).await {
        Ok(mentee) => mentee,
        Err(e) => return store_error("Failed to fetch mentee", e),
    };
    let response = match state.postgres.get_response(mentee.response_id).await {
        Ok(response) => response,
        Err(e) => return store_error("Failed to fetch mentee response", e),
    };

    let mentors = match state.postgres.list_participants(Role::Mentor).await {
        Ok(mentors) => mentors,
        Err(e) => return store_error("Failed to fetch mentors", e),
    };
    let candidates = match mentor_candidates(&state, &mentors).await {
        Ok(candidates) => candidates,
        Err(e) => return store_error("Failed to fetch mentor responses", e),
    };

    let result = state.matcher.find_suitors(&response, &candidates, limit);

    tracing::debug!(
        "Ranked {} suitors for mentee {} (from {} candidates)",
        result.suitors.len(),
        mentee_id,
        result.total_candidates
    );

    HttpResponse::Ok().json(SuitorsResponse {
        mentee_id,
        suitors: result.suitors,
        total_candidates: result.total_candidates,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PairAction {
    Engage,
    Breakup,
    Marry,
    Divorce,
    Complete,
}

impl PairAction {
    fn done_message(self) -> &'static str {
        match self {
            PairAction::Engage => "Pair engaged",
            PairAction::Breakup => "Pair broken up",
            PairAction::Marry => "Pair married",
            PairAction::Divorce => "Pair divorced",
            PairAction::Complete => "Pair completed",
        }
    }
}

async fn apply_pair_action(
    state: web::Data<AppState>,
    req: web::Json<PairRequest>,
    action: PairAction,
) -> HttpResponse {
    if let Err(errors) = req.validate() {
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors);
    }

    let (mentor_id, mentee_id) = (req.mentor_id, req.mentee_id);
    let postgres = &state.postgres;

    let result = match action {
        PairAction::Engage => postgres.engage(mentor_id, mentee_id).await.map(Some),
        PairAction::Breakup => postgres.breakup(mentor_id, mentee_id).await.map(|_| None),
        PairAction::Marry => postgres.marry(mentor_id, mentee_id).await.map(Some),
        PairAction::Divorce => postgres.divorce(mentor_id, mentee_id).await.map(|_| None),
        PairAction::Complete => postgres.complete(mentor_id, mentee_id).await.map(Some),
    };

    match result {
        Ok(pairing) => {
            if action == PairAction::Marry && state.notifications.send_email {
                tracing::info!(
                    "Pair finalized with e-mail notifications on: mentor {}, mentee {}",
                    mentor_id,
                    mentee_id
                );
            }
            HttpResponse::Ok().json(PairActionResponse {
                success: true,
                message: action.done_message().to_string(),
                pairing,
            })
        }
        Err(e) => store_error("Failed to update match", e),
    }
}

/// POST /api/v1/matches/engage
///
/// Request body:
/// ```json
/// {
///   "mentorId": 3,
///   "menteeId": 8
/// }
/// ```
async fn engage(state: web::Data<AppState>, req: web::Json<PairRequest>) -> impl Responder {
    apply_pair_action(state, req, PairAction::Engage).await
}

/// POST /api/v1/matches/breakup
async fn breakup(state: web::Data<AppState>, req: web::Json<PairRequest>) -> impl Responder {
    apply_pair_action(state, req, PairAction::Breakup).await
}

/// POST /api/v1/matches/marry
async fn marry(state: web::Data<AppState>, req: web::Json<PairRequest>) -> impl Responder {
    apply_pair_action(state, req, PairAction::Marry).await
}

/// POST /api/v1/matches/divorce
async fn divorce(state: web::Data<AppState>, req: web::Json<PairRequest>) -> impl Responder {
    apply_pair_action(state, req, PairAction::Divorce).await
}

/// POST /api/v1/matches/complete
async fn complete(state: web::Data<AppState>, req: web::Json<PairRequest>) -> impl Responder {
    apply_pair_action(state, req, PairAction::Complete).await
}
