use crate::errors::AppError;
use crate::models::{borrower_types, Address, BankAccount, Contact, Guarantor, Job, Subject};
use crate::resolver::RecordLookup;
use sqlx::PgPool;

/// Relational access to the record collections.
///
/// Every lookup is a plain read: equality filters, `ILIKE` substring
/// filters, `= ANY($1)` set-membership filters, and count-only variants.
/// Nothing here ever writes.
pub struct RecordStore {
    pool: PgPool,
}

impl RecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn count_by_fiscal_code(&self, table: &str, code: &str) -> Result<i64, AppError> {
        // Table names come from the fixed call sites below, never from input.
        let sql = format!("SELECT COUNT(*) FROM {} WHERE fiscal_code = $1", table);
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(code)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

impl RecordLookup for RecordStore {
    async fn subjects_by_fiscal_code(&self, code: &str) -> Result<Vec<Subject>, AppError> {
        let subjects = sqlx::query_as::<_, Subject>(
            "SELECT * FROM entities WHERE fiscal_code = $1 ORDER BY name",
        )
        .bind(code)
        .fetch_all(&self.pool)
        .await?;

        Ok(subjects)
    }

    async fn subjects_by_fiscal_code_fragment(
        &self,
        fragment: &str,
    ) -> Result<Vec<Subject>, AppError> {
        let subjects = sqlx::query_as::<_, Subject>(
            "SELECT * FROM entities WHERE fiscal_code ILIKE $1 ORDER BY name",
        )
        .bind(format!("%{}%", fragment))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Database error in fragment search for '{}': {:?}", fragment, e);
            AppError::DatabaseError(e)
        })?;

        Ok(subjects)
    }

    async fn guarantors_by_loan_keys(&self, keys: &[String]) -> Result<Vec<Guarantor>, AppError> {
        let guarantors = sqlx::query_as::<_, Guarantor>(
            "SELECT * FROM guarantors WHERE record_id = ANY($1)",
        )
        .bind(keys)
        .fetch_all(&self.pool)
        .await?;

        Ok(guarantors)
    }

    async fn joint_subjects_by_loan_keys(
        &self,
        keys: &[String],
    ) -> Result<Vec<Subject>, AppError> {
        let joints = sqlx::query_as::<_, Subject>(
            "SELECT * FROM entities
             WHERE record_id = ANY($1) AND borrower_type_id = $2
             ORDER BY name",
        )
        .bind(keys)
        .bind(borrower_types::JOINT)
        .fetch_all(&self.pool)
        .await?;

        Ok(joints)
    }

    async fn contacts_by_fiscal_codes(&self, codes: &[String]) -> Result<Vec<Contact>, AppError> {
        let contacts = sqlx::query_as::<_, Contact>(
            "SELECT * FROM contacts WHERE fiscal_code = ANY($1)",
        )
        .bind(codes)
        .fetch_all(&self.pool)
        .await?;

        Ok(contacts)
    }

    async fn addresses_by_fiscal_codes(
        &self,
        codes: &[String],
    ) -> Result<Vec<Address>, AppError> {
        let addresses = sqlx::query_as::<_, Address>(
            "SELECT * FROM addresses WHERE fiscal_code = ANY($1)",
        )
        .bind(codes)
        .fetch_all(&self.pool)
        .await?;

        Ok(addresses)
    }

    async fn banks_by_fiscal_codes(
        &self,
        codes: &[String],
    ) -> Result<Vec<BankAccount>, AppError> {
        let banks =
            sqlx::query_as::<_, BankAccount>("SELECT * FROM banks WHERE fiscal_code = ANY($1)")
                .bind(codes)
                .fetch_all(&self.pool)
                .await?;

        Ok(banks)
    }

    async fn jobs_by_fiscal_codes(&self, codes: &[String]) -> Result<Vec<Job>, AppError> {
        let jobs = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE fiscal_code = ANY($1)")
            .bind(codes)
            .fetch_all(&self.pool)
            .await?;

        Ok(jobs)
    }

    async fn count_guarantors_by_loan_keys(&self, keys: &[String]) -> Result<i64, AppError> {
        // Counted on the natural key so the summary matches the deduplicated
        // list the bundle returns.
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT fiscal_code) FROM guarantors WHERE record_id = ANY($1)",
        )
        .bind(keys)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn count_contacts_by_fiscal_code(&self, code: &str) -> Result<i64, AppError> {
        self.count_by_fiscal_code("contacts", code).await
    }

    async fn count_addresses_by_fiscal_code(&self, code: &str) -> Result<i64, AppError> {
        self.count_by_fiscal_code("addresses", code).await
    }

    async fn count_banks_by_fiscal_code(&self, code: &str) -> Result<i64, AppError> {
        self.count_by_fiscal_code("banks", code).await
    }

    async fn count_jobs_by_fiscal_code(&self, code: &str) -> Result<i64, AppError> {
        self.count_by_fiscal_code("jobs", code).await
    }
}
