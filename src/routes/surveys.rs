use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use validator::Validate;
use crate::core::group_report_rows;
use crate::models::{ReportResponse, SubmitResponseRequest, SubmitResponseResponse};
use crate::routes::{error_response, store_error, AppState};

/// Configure survey routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/surveys/{survey_id}/responses", web::post().to(submit_response))
        .route("/responses/{response_id}/report", web::get().to(response_report));
}

/// Store a survey submission
///
/// POST /api/v1/surveys/{survey_id}/responses
///
/// Request body:
/// ```json
/// {
///   "username": "jdoe",
///   "firstName": "Jane",
///   "lastName": "Doe",
///   "answers": [
///     { "questionId": 45, "choiceId": 120 },
///     { "questionId": 53, "value": "2" }
///   ]
/// }
/// ```
async fn submit_response(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    req: web::Json<SubmitResponseRequest>,
) -> impl Responder {
    let survey_id = path.into_inner();

    if let Err(errors) = req.validate() {
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors);
    }

    let role = state.matching.role_for_survey(survey_id);

    match state.postgres.submit_response(survey_id, &req, role).await {
        Ok(submitted) => {
            if role.is_some() {
                state.cache.invalidate_scores().await;
            }
            HttpResponse::Created().json(SubmitResponseResponse {
                response_id: submitted.response_id,
                user_id: submitted.user_id,
                participant_id: submitted.participant_id,
            })
        }
        Err(e) => store_error("Failed to store response", e),
    }
}

/// Human-readable answers of one response, in survey order
///
/// GET /api/v1/responses/{response_id}/report
async fn response_report(state: web::Data<AppState>, path: web::Path<i64>) -> impl Responder {
    let response_id = path.into_inner();

    match state.postgres.response_report(response_id).await {
        Ok(rows) => HttpResponse::Ok().json(ReportResponse {
            response_id,
            questions: group_report_rows(rows),
        }),
        Err(e) => store_error("Failed to build response report", e),
    }
}
