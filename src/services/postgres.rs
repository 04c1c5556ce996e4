use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use thiserror::Error;
use crate::models::{
    AnswerRow, Match, MatchRow, Participant, QuestionType, ReportRow, ResponseAnswers, Role,
    SubmitResponseRequest,
};

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Identifiers created by a survey submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedResponse {
    pub response_id: i64,
    pub user_id: i64,
    pub participant_id: Option<i64>,
}

/// PostgreSQL store for surveys, responses, participants and matches
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Fetch responses with their resolved answers, in the order requested
    ///
    /// Answer values come from the picked choice when there is one, else
    /// from the typed value. Unknown ids are skipped.
    pub async fn get_responses(&self, ids: &[i64]) -> Result<Vec<ResponseAnswers>, PostgresError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let headers = sqlx::query(
            r#"
            SELECT response_id, survey_id
            FROM responses
            WHERE response_id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut responses: HashMap<i64, ResponseAnswers> = HashMap::with_capacity(headers.len());
        for row in &headers {
            let response_id: i64 = row.try_get("response_id")?;
            responses.insert(
                response_id,
                ResponseAnswers {
                    response_id,
                    survey_id: row.try_get("survey_id")?,
                    answers: Vec::new(),
                },
            );
        }

        let answers = sqlx::query(
            r#"
            SELECT
                ra.response_id,
                ra.question_id,
                q.question_type,
                COALESCE(c.value, ra.value) AS value
            FROM response_answers ra
            INNER JOIN questions q ON q.question_id = ra.question_id
            LEFT JOIN choices c ON c.choice_id = ra.choice_id
            WHERE ra.response_id = ANY($1)
            ORDER BY ra.response_answer_id
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        for row in &answers {
            let response_id: i64 = row.try_get("response_id")?;
            let question_id: i64 = row.try_get("question_id")?;
            let code: i32 = row.try_get("question_type")?;

            let Some(question_type) = QuestionType::from_code(code) else {
                tracing::warn!("Question {} has unknown type code {}, ignoring its answer", question_id, code);
                continue;
            };

            if let Some(response) = responses.get_mut(&response_id) {
                response.answers.push(AnswerRow {
                    question_id,
                    question_type,
                    value: row.try_get("value")?,
                });
            }
        }

        let ordered: Vec<ResponseAnswers> = ids.iter().filter_map(|id| responses.remove(id)).collect();

        if ordered.len() < ids.len() {
            tracing::debug!("Found {} of {} requested responses", ordered.len(), ids.len());
        }

        Ok(ordered)
    }

    /// Fetch a single response with its answers
    pub async fn get_response(&self, response_id: i64) -> Result<ResponseAnswers, PostgresError> {
        self.get_responses(&[response_id])
            .await?
            .pop()
            .ok_or_else(|| PostgresError::NotFound(format!("Response {} not found", response_id)))
    }

    fn participant_query(role: Role, condition: &str) -> String {
        format!(
            r#"
            SELECT
                p.{id} AS id,
                p.user_id,
                p.response_id,
                u.username,
                u.first_name,
                u.last_name,
                u.date_joined
            FROM {table} p
            INNER JOIN users u ON u.user_id = p.user_id
            WHERE NOT p.is_deleted {condition}
            ORDER BY u.date_joined, p.{id}
            "#,
            id = role.id_column(),
            table = role.table(),
            condition = condition,
        )
    }

    fn participant_from_row(role: Role, row: &PgRow) -> Result<Participant, sqlx::Error> {
        Ok(Participant {
            id: row.try_get("id")?,
            role,
            user_id: row.try_get("user_id")?,
            username: row.try_get("username")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            response_id: row.try_get("response_id")?,
            date_joined: row.try_get("date_joined")?,
        })
    }

    /// All active mentors or mentees, oldest account first
    pub async fn list_participants(&self, role: Role) -> Result<Vec<Participant>, PostgresError> {
        let rows = sqlx::query(&Self::participant_query(role, ""))
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| Self::participant_from_row(role, row).map_err(PostgresError::from))
            .collect()
    }

    pub async fn get_participant(&self, role: Role, id: i64) -> Result<Participant, PostgresError> {
        let condition = format!("AND p.{} = $1", role.id_column());
        let row = sqlx::query(&Self::participant_query(role, &condition))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PostgresError::NotFound(format!("{:?} {} not found", role, id)))?;

        Ok(Self::participant_from_row(role, &row)?)
    }

    /// Active mentees without any match
    pub async fn unmatched_mentees(&self) -> Result<Vec<Participant>, PostgresError> {
        let condition = r#"
            AND NOT EXISTS (
                SELECT 1 FROM matches x
                WHERE x.mentee_id = p.mentee_id AND NOT x.is_deleted
            )
        "#;
        let rows = sqlx::query(&Self::participant_query(Role::Mentee, condition))
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| Self::participant_from_row(Role::Mentee, row).map_err(PostgresError::from))
            .collect()
    }

    /// Number of active mentees each active mentor is matched with
    pub async fn mentee_counts(&self) -> Result<HashMap<i64, i64>, PostgresError> {
        let rows = sqlx::query(
            r#"
            SELECT m.mentor_id, COUNT(e.mentee_id) AS mentee_count
            FROM mentors m
            LEFT JOIN matches x ON x.mentor_id = m.mentor_id AND NOT x.is_deleted
            LEFT JOIN mentees e ON e.mentee_id = x.mentee_id AND NOT e.is_deleted
            WHERE NOT m.is_deleted
            GROUP BY m.mentor_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<(i64, i64), PostgresError> {
                Ok((row.try_get("mentor_id")?, row.try_get("mentee_count")?))
            })
            .collect()
    }

    /// Active matches between active participants, oldest first
    pub async fn active_matches(&self) -> Result<Vec<MatchRow>, PostgresError> {
        let rows = sqlx::query(
            r#"
            SELECT
                x.match_id,
                x.mentor_id,
                x.mentee_id,
                x.matched_on,
                x.notified_on,
                x.completed_on,
                mu.username AS mentor_username,
                eu.username AS mentee_username
            FROM matches x
            INNER JOIN mentors m ON m.mentor_id = x.mentor_id
            INNER JOIN mentees e ON e.mentee_id = x.mentee_id
            INNER JOIN users mu ON mu.user_id = m.user_id
            INNER JOIN users eu ON eu.user_id = e.user_id
            WHERE NOT x.is_deleted AND NOT m.is_deleted AND NOT e.is_deleted
            ORDER BY x.match_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<MatchRow, PostgresError> {
                Ok(MatchRow {
                    pairing: match_from_row(row)?,
                    mentor_username: row.try_get("mentor_username")?,
                    mentee_username: row.try_get("mentee_username")?,
                })
            })
            .collect()
    }

    /// Propose a pairing
    pub async fn engage(&self, mentor_id: i64, mentee_id: i64) -> Result<Match, PostgresError> {
        self.get_participant(Role::Mentor, mentor_id).await?;
        self.get_participant(Role::Mentee, mentee_id).await?;

        let row = sqlx::query(
            r#"
            INSERT INTO matches (mentor_id, mentee_id, matched_on)
            VALUES ($1, $2, NOW())
            ON CONFLICT (mentor_id, mentee_id) WHERE NOT is_deleted DO NOTHING
            RETURNING match_id, mentor_id, mentee_id, matched_on, notified_on, completed_on
            "#,
        )
        .bind(mentor_id)
        .bind(mentee_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            PostgresError::Conflict(format!(
                "Mentor {} and mentee {} are already matched",
                mentor_id, mentee_id
            ))
        })?;

        tracing::info!("Engaged mentor {} with mentee {}", mentor_id, mentee_id);
        Ok(match_from_row(&row)?)
    }

    /// Undo an unfinalized pairing
    pub async fn breakup(&self, mentor_id: i64, mentee_id: i64) -> Result<(), PostgresError> {
        self.delete_match(mentor_id, mentee_id).await
    }

    /// Undo a finalized pairing
    pub async fn divorce(&self, mentor_id: i64, mentee_id: i64) -> Result<(), PostgresError> {
        self.delete_match(mentor_id, mentee_id).await
    }

    async fn delete_match(&self, mentor_id: i64, mentee_id: i64) -> Result<(), PostgresError> {
        let result = sqlx::query(
            r#"
            DELETE FROM matches
            WHERE mentor_id = $1 AND mentee_id = $2 AND NOT is_deleted
            "#,
        )
        .bind(mentor_id)
        .bind(mentee_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(no_match(mentor_id, mentee_id));
        }

        tracing::info!("Removed match between mentor {} and mentee {}", mentor_id, mentee_id);
        Ok(())
    }

    /// Finalize a pairing; the notification timestamp flags it as married
    pub async fn marry(&self, mentor_id: i64, mentee_id: i64) -> Result<Match, PostgresError> {
        self.stamp_match("notified_on", mentor_id, mentee_id).await
    }

    /// Flag a pairing as completed
    pub async fn complete(&self, mentor_id: i64, mentee_id: i64) -> Result<Match, PostgresError> {
        self.stamp_match("completed_on", mentor_id, mentee_id).await
    }

    async fn stamp_match(
        &self,
        column: &'static str,
        mentor_id: i64,
        mentee_id: i64,
    ) -> Result<Match, PostgresError> {
        let query = format!(
            r#"
            UPDATE matches SET {column} = NOW()
            WHERE mentor_id = $1 AND mentee_id = $2 AND NOT is_deleted
            RETURNING match_id, mentor_id, mentee_id, matched_on, notified_on, completed_on
            "#,
            column = column,
        );

        let row = sqlx::query(&query)
            .bind(mentor_id)
            .bind(mentee_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| no_match(mentor_id, mentee_id))?;

        tracing::info!("Set {} on match between mentor {} and mentee {}", column, mentor_id, mentee_id);
        Ok(match_from_row(&row)?)
    }

    /// Remove a mentor or mentee together with their response and matches
    ///
    /// Returns false when there was no such active participant.
    pub async fn remove_participant(&self, role: Role, id: i64) -> Result<bool, PostgresError> {
        let mut tx = self.pool.begin().await?;

        let select = format!(
            "SELECT response_id FROM {} WHERE {} = $1 AND NOT is_deleted FOR UPDATE",
            role.table(),
            role.id_column()
        );
        let Some(row) = sqlx::query(&select).bind(id).fetch_optional(&mut *tx).await? else {
            return Ok(false);
        };
        let response_id: i64 = row.try_get("response_id")?;

        sqlx::query(&format!("DELETE FROM matches WHERE {} = $1", role.id_column()))
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(&format!("DELETE FROM {} WHERE {} = $1", role.table(), role.id_column()))
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM response_answers WHERE response_id = $1")
            .bind(response_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM responses WHERE response_id = $1")
            .bind(response_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!("Removed {:?} {} and response {}", role, id, response_id);
        Ok(true)
    }

    /// Store a survey submission
    ///
    /// The user is created on first submission. Submissions to the mentor or
    /// mentee survey also register the user in that role.
    pub async fn submit_response(
        &self,
        survey_id: i64,
        submission: &SubmitResponseRequest,
        role: Option<Role>,
    ) -> Result<SubmittedResponse, PostgresError> {
        let mut tx = self.pool.begin().await?;

        let survey_exists = sqlx::query("SELECT 1 FROM surveys WHERE survey_id = $1")
            .bind(survey_id)
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
        if !survey_exists {
            return Err(PostgresError::NotFound(format!("Survey {} not found", survey_id)));
        }

        let question_ids: HashSet<i64> = sqlx::query("SELECT question_id FROM questions WHERE survey_id = $1")
            .bind(survey_id)
            .fetch_all(&mut *tx)
            .await?
            .iter()
            .map(|row| row.try_get::<i64, _>("question_id"))
            .collect::<Result<_, _>>()?;

        let choice_questions: HashMap<i64, i64> = sqlx::query(
            r#"
            SELECT c.choice_id, c.question_id
            FROM choices c
            INNER JOIN questions q ON q.question_id = c.question_id
            WHERE q.survey_id = $1
            "#,
        )
        .bind(survey_id)
        .fetch_all(&mut *tx)
        .await?
        .iter()
        .map(|row| -> Result<(i64, i64), sqlx::Error> {
            Ok((row.try_get("choice_id")?, row.try_get("question_id")?))
        })
        .collect::<Result<_, _>>()?;

        for answer in &submission.answers {
            if !question_ids.contains(&answer.question_id) {
                return Err(PostgresError::InvalidInput(format!(
                    "Question {} is not part of survey {}",
                    answer.question_id, survey_id
                )));
            }
            if let Some(choice_id) = answer.choice_id {
                if choice_questions.get(&choice_id) != Some(&answer.question_id) {
                    return Err(PostgresError::InvalidInput(format!(
                        "Choice {} does not belong to question {}",
                        choice_id, answer.question_id
                    )));
                }
            }
        }

        let user_id: i64 = sqlx::query(
            r#"
            INSERT INTO users (username, first_name, last_name)
            VALUES ($1, $2, $3)
            ON CONFLICT (username) DO UPDATE SET username = EXCLUDED.username
            RETURNING user_id
            "#,
        )
        .bind(&submission.username)
        .bind(&submission.first_name)
        .bind(&submission.last_name)
        .fetch_one(&mut *tx)
        .await?
        .try_get("user_id")?;

        if let Some(role) = role {
            let existing = format!(
                "SELECT 1 FROM {} WHERE user_id = $1 AND NOT is_deleted",
                role.table()
            );
            if sqlx::query(&existing).bind(user_id).fetch_optional(&mut *tx).await?.is_some() {
                return Err(PostgresError::Conflict(format!(
                    "{} is already registered as a {:?}",
                    submission.username, role
                )));
            }
        }

        let response_id: i64 = sqlx::query(
            r#"
            INSERT INTO responses (user_id, survey_id, created_on)
            VALUES ($1, $2, NOW())
            RETURNING response_id
            "#,
        )
        .bind(user_id)
        .bind(survey_id)
        .fetch_one(&mut *tx)
        .await?
        .try_get("response_id")?;

        for answer in submission.answers.iter().filter(|a| !a.is_empty()) {
            sqlx::query(
                r#"
                INSERT INTO response_answers (response_id, question_id, choice_id, value)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(response_id)
            .bind(answer.question_id)
            .bind(answer.choice_id)
            .bind(answer.value.clone().unwrap_or_default())
            .execute(&mut *tx)
            .await?;
        }

        let participant_id = match role {
            Some(role) => {
                let insert = format!(
                    "INSERT INTO {} (user_id, response_id) VALUES ($1, $2) RETURNING {}",
                    role.table(),
                    role.id_column()
                );
                // A concurrent registration can pass the check above and
                // still trip the active-user unique index
                let row = sqlx::query(&insert)
                    .bind(user_id)
                    .bind(response_id)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(|e| {
                        conflict_on_unique(
                            e,
                            format!("{} is already registered as a {:?}", submission.username, role),
                        )
                    })?;
                Some(row.try_get::<i64, _>(role.id_column())?)
            }
            None => None,
        };

        tx.commit().await?;

        tracing::info!(
            "Stored response {} for {} on survey {}",
            response_id,
            submission.username,
            survey_id
        );

        Ok(SubmittedResponse {
            response_id,
            user_id,
            participant_id,
        })
    }

    /// Report rows for a response, in survey order
    pub async fn response_report(&self, response_id: i64) -> Result<Vec<ReportRow>, PostgresError> {
        let exists = sqlx::query("SELECT 1 FROM responses WHERE response_id = $1")
            .bind(response_id)
            .fetch_optional(&self.pool)
            .await?
            .is_some();
        if !exists {
            return Err(PostgresError::NotFound(format!("Response {} not found", response_id)));
        }

        let rows = sqlx::query(
            r#"
            SELECT
                q.question_id,
                q.question_type,
                q.body,
                q.hide_label,
                q.layout,
                CASE
                    WHEN c.choice_id IS NULL OR c.has_textbox THEN ra.value
                    ELSE c.body
                END AS display_value
            FROM questions q
            LEFT JOIN response_answers ra
                ON ra.question_id = q.question_id AND ra.response_id = $1
            LEFT JOIN choices c ON c.choice_id = ra.choice_id
            WHERE q.survey_id = (SELECT survey_id FROM responses WHERE response_id = $1)
            ORDER BY q.rank, q.question_id, c.rank
            "#,
        )
        .bind(response_id)
        .fetch_all(&self.pool)
        .await?;

        let mut report = Vec::with_capacity(rows.len());
        for row in &rows {
            let question_id: i64 = row.try_get("question_id")?;
            let code: i32 = row.try_get("question_type")?;
            let question_type = QuestionType::from_code(code).ok_or_else(|| {
                PostgresError::InvalidInput(format!(
                    "Question {} has unknown type code {}",
                    question_id, code
                ))
            })?;

            report.push(ReportRow {
                question_id,
                question_type,
                body: row.try_get("body")?,
                hide_label: row.try_get("hide_label")?,
                layout: row.try_get("layout")?,
                display_value: row.try_get("display_value")?,
            });
        }

        Ok(report)
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

fn match_from_row(row: &PgRow) -> Result<Match, sqlx::Error> {
    Ok(Match {
        match_id: row.try_get("match_id")?,
        mentor_id: row.try_get("mentor_id")?,
        mentee_id: row.try_get("mentee_id")?,
        matched_on: row.try_get("matched_on")?,
        notified_on: row.try_get("notified_on")?,
        completed_on: row.try_get("completed_on")?,
    })
}

/// SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// Report a unique-index violation as a conflict, anything else as is
fn conflict_on_unique(e: sqlx::Error, message: String) -> PostgresError {
    let unique = matches!(
        &e,
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION)
    );

    if unique {
        PostgresError::Conflict(message)
    } else {
        PostgresError::SqlxError(e)
    }
}

fn no_match(mentor_id: i64, mentee_id: i64) -> PostgresError {
    PostgresError::NotFound(format!(
        "No match between mentor {} and mentee {}",
        mentor_id, mentee_id
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_query_targets_role_table() {
        let query = PostgresClient::participant_query(Role::Mentor, "AND p.mentor_id = $1");

        assert!(query.contains("FROM mentors p"));
        assert!(query.contains("p.mentor_id AS id"));
        assert!(query.contains("AND p.mentor_id = $1"));
    }

    #[derive(Debug)]
    struct FakeDbError {
        code: &'static str,
    }

    impl std::fmt::Display for FakeDbError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "database error {}", self.code)
        }
    }

    impl std::error::Error for FakeDbError {}

    impl sqlx::error::DatabaseError for FakeDbError {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn code(&self) -> Option<std::borrow::Cow<'_, str>> {
            Some(std::borrow::Cow::Borrowed(self.code))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            if self.code == UNIQUE_VIOLATION {
                sqlx::error::ErrorKind::UniqueViolation
            } else {
                sqlx::error::ErrorKind::Other
            }
        }
    }

    fn db_error(code: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(FakeDbError { code }))
    }

    #[test]
    fn test_unique_violation_becomes_conflict() {
        let err = conflict_on_unique(db_error("23505"), "jdoe is already registered".into());
        assert!(matches!(err, PostgresError::Conflict(ref m) if m == "jdoe is already registered"));
    }

    #[test]
    fn test_other_errors_pass_through() {
        let fk = conflict_on_unique(db_error("23503"), "unused".into());
        assert!(matches!(fk, PostgresError::SqlxError(sqlx::Error::Database(_))));

        let missing = conflict_on_unique(sqlx::Error::RowNotFound, "unused".into());
        assert!(matches!(missing, PostgresError::SqlxError(sqlx::Error::RowNotFound)));
    }

    #[test]
    fn test_no_match_error() {
        let err = no_match(3, 4);
        assert!(matches!(err, PostgresError::NotFound(_)));
        assert_eq!(err.to_string(), "Not found: No match between mentor 3 and mentee 4");
    }
}
