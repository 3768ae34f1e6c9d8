use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::json;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info};

use super::{RegistrationFilter, RegistrationStore, Result, StoreError};
use crate::models::registration::{
    AnswerRow, NewAnswer, NewRegistration, RegistrationAggregate, RegistrationPatch,
    RegistrationRow,
};

const REGISTRATION_ID_UNIQUE: &str = "interview_registrations_registration_id_key";
const ANSWER_REGISTRATION_FK: &str = "question_answers_registration_id_fkey";

/// PostgreSQL-backed registration store.
#[derive(Clone)]
pub struct PgRegistrationStore {
    pool: PgPool,
}

impl PgRegistrationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    /// Loads answers for a batch of registrations with one query.
    async fn attach_answers(
        conn: &mut PgConnection,
        registrations: Vec<RegistrationRow>,
    ) -> Result<Vec<RegistrationAggregate>> {
        if registrations.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = registrations.iter().map(|r| r.id).collect();
        let answers = sqlx::query_as::<_, AnswerRow>(
            r#"
            SELECT * FROM question_answers
            WHERE registration_id = ANY($1)
            ORDER BY registration_id, question_order, id
            "#,
        )
        .bind(&ids)
        .fetch_all(&mut *conn)
        .await?;

        let mut by_owner: HashMap<i32, Vec<AnswerRow>> = HashMap::new();
        for answer in answers {
            by_owner.entry(answer.registration_pk).or_default().push(answer);
        }

        Ok(registrations
            .into_iter()
            .map(|r| {
                let answers = by_owner.remove(&r.id).unwrap_or_default();
                RegistrationAggregate::new(r, answers)
            })
            .collect())
    }

    async fn fetch_one_in(
        conn: &mut PgConnection,
        id: i32,
    ) -> Result<Option<RegistrationAggregate>> {
        let row = sqlx::query_as::<_, RegistrationRow>(
            "SELECT * FROM interview_registrations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        match row {
            Some(row) => Ok(Self::attach_answers(conn, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }
}

fn map_constraint(e: sqlx::Error, registration_id: &str, registration_pk: i32) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e {
        match db_err.constraint() {
            Some(REGISTRATION_ID_UNIQUE) => {
                return StoreError::DuplicateRegistrationId(registration_id.to_string())
            }
            Some(ANSWER_REGISTRATION_FK) => return StoreError::RegistrationMissing(registration_pk),
            _ => {}
        }
    }
    StoreError::Database(e)
}

#[async_trait]
impl RegistrationStore for PgRegistrationStore {
    async fn create(&self, new: NewRegistration) -> Result<RegistrationAggregate> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, RegistrationRow>(
            r#"
            INSERT INTO interview_registrations
                (registration_id, session_token, name, email,
                 resume_extracted_text, resume_summary,
                 work_experience_summary, position_type, school_type,
                 upk_eligible, teacher_eligible, substitute_eligible,
                 shift_available, diaper_comfortable,
                 submitted_at, resume_comparison)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    COALESCE($15, NOW()), $16)
            RETURNING *
            "#,
        )
        .bind(&new.registration_id)
        .bind(&new.session_token)
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.resume_extracted_text)
        .bind(&new.resume_summary)
        .bind(&new.work_experience_summary)
        .bind(&new.position_type)
        .bind(&new.school_type)
        .bind(new.eligibility.upk_eligible)
        .bind(new.eligibility.teacher_eligible)
        .bind(new.eligibility.substitute_eligible)
        .bind(new.eligibility.shift_available)
        .bind(new.eligibility.diaper_comfortable)
        .bind(new.submitted_at)
        .bind(new.resume_comparison.unwrap_or_else(|| json!({})))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_constraint(e, &new.registration_id, 0))?;

        tx.commit().await?;

        info!("Created registration {} (id {})", row.registration_id, row.id);
        Ok(RegistrationAggregate::new(row, Vec::new()))
    }

    async fn append_answer(&self, registration_pk: i32, answer: NewAnswer) -> Result<AnswerRow> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, AnswerRow>(
            r#"
            INSERT INTO question_answers
                (registration_id, question_text, answer_text, is_answered, question_order)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(registration_pk)
        .bind(&answer.question_text)
        .bind(&answer.answer_text)
        .bind(answer.is_answered)
        .bind(answer.question_order)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_constraint(e, "", registration_pk))?;

        sqlx::query(
            r#"
            UPDATE interview_registrations
            SET updated_at = GREATEST(NOW(), updated_at + INTERVAL '1 microsecond')
            WHERE id = $1
            "#,
        )
        .bind(registration_pk)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(
            "Appended answer {} (order {}) to registration {registration_pk}",
            row.id, row.question_order
        );
        Ok(row)
    }

    async fn fetch_by_id(&self, id: i32) -> Result<Option<RegistrationAggregate>> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch_one_in(&mut conn, id).await
    }

    async fn fetch_by_registration_id(
        &self,
        registration_id: &str,
    ) -> Result<Option<RegistrationAggregate>> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query_as::<_, RegistrationRow>(
            "SELECT * FROM interview_registrations WHERE registration_id = $1",
        )
        .bind(registration_id)
        .fetch_optional(&mut *conn)
        .await?;

        match row {
            Some(row) => Ok(Self::attach_answers(&mut conn, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn fetch_all(&self) -> Result<Vec<RegistrationAggregate>> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query_as::<_, RegistrationRow>(
            r#"
            SELECT * FROM interview_registrations
            ORDER BY submitted_at DESC NULLS LAST, id DESC
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        let aggregates = Self::attach_answers(&mut tx, rows).await?;
        tx.commit().await?;

        debug!("Loaded {} registrations", aggregates.len());
        Ok(aggregates)
    }

    async fn count(&self, filter: RegistrationFilter) -> Result<i64> {
        let count: i64 = match filter {
            RegistrationFilter::All => {
                sqlx::query_scalar("SELECT COUNT(*) FROM interview_registrations")
                    .fetch_one(&self.pool)
                    .await?
            }
            RegistrationFilter::Status(status) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM interview_registrations WHERE status = $1")
                    .bind(status)
                    .fetch_one(&self.pool)
                    .await?
            }
            RegistrationFilter::UpkEligible => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM interview_registrations WHERE upk_eligible",
                )
                .fetch_one(&self.pool)
                .await?
            }
            RegistrationFilter::TeacherEligible => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM interview_registrations WHERE teacher_eligible",
                )
                .fetch_one(&self.pool)
                .await?
            }
            RegistrationFilter::SubstituteEligible => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM interview_registrations WHERE substitute_eligible",
                )
                .fetch_one(&self.pool)
                .await?
            }
        };
        Ok(count)
    }

    async fn apply_patch(
        &self,
        registration_id: &str,
        patch: &RegistrationPatch,
    ) -> Result<Option<RegistrationAggregate>> {
        let mut tx = self.pool.begin().await?;

        // COALESCE skips absent fields; feedback may be cleared, so it carries its own flag.
        let updated: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE interview_registrations SET
                feedback          = CASE WHEN $2 THEN $3 ELSE feedback END,
                position_type     = COALESCE($4, position_type),
                school_type       = COALESCE($5, school_type),
                status            = COALESCE($6, status),
                hr_review         = COALESCE($7, hr_review),
                hr_answer_to_user = COALESCE($8, hr_answer_to_user),
                updated_at        = GREATEST(NOW(), updated_at + INTERVAL '1 microsecond')
            WHERE registration_id = $1
            RETURNING id
            "#,
        )
        .bind(registration_id)
        .bind(patch.feedback.is_some())
        .bind(patch.feedback.clone().flatten())
        .bind(&patch.position_type)
        .bind(&patch.school_type)
        .bind(&patch.status)
        .bind(&patch.hr_review)
        .bind(&patch.hr_answer_to_user)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(id) = updated else {
            tx.rollback().await?;
            return Ok(None);
        };

        let aggregate = Self::fetch_one_in(&mut tx, id).await?;
        tx.commit().await?;
        Ok(aggregate)
    }

    async fn registration_ids(&self) -> Result<Vec<String>> {
        Ok(sqlx::query_scalar(
            "SELECT registration_id FROM interview_registrations ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?)
    }
}
