//! Record linkage resolution.
//!
//! Produces a deduplicated, categorized bundle of all records related to a
//! fiscal code, bridging the two join strategies used by the underlying
//! collections:
//!
//! 1. Contacts, addresses, bank accounts and jobs are joined directly on the
//!    fiscal code of the matched subjects.
//! 2. Guarantors and joint parties are only reachable through the loan
//!    linkage keys (`record_id`) extracted from the matched subjects.
//!
//! The two stages are explicit: the primary subject lookup must complete
//! before the loan-keyed lookups can be issued, then all remaining lookups
//! fan out concurrently.

use crate::errors::AppError;
use crate::fiscal_code;
use crate::models::{CategorySummary, Contact, Guarantor, ResultBundle, Subject};
use crate::models::{Address, BankAccount, Job};
use std::collections::HashSet;
use std::future::Future;
use std::hash::Hash;

/// How the primary subject lookup interprets the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Input must be a structurally valid fiscal code; exact match.
    Strict,
    /// Input is a cleaned fragment of at least 3 characters; substring match.
    Partial,
}

/// Read access to the record collections, one method per lookup the resolver
/// issues. The production implementation is the sqlx-backed
/// [`RecordStore`](crate::services::RecordStore); tests substitute a mock to
/// assert which lookups were (not) issued.
///
/// Methods return `impl Future + Send` rather than using `async fn` so the
/// resolver stays usable from multi-threaded handlers.
pub trait RecordLookup {
    fn subjects_by_fiscal_code(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<Vec<Subject>, AppError>> + Send;

    fn subjects_by_fiscal_code_fragment(
        &self,
        fragment: &str,
    ) -> impl Future<Output = Result<Vec<Subject>, AppError>> + Send;

    fn guarantors_by_loan_keys(
        &self,
        keys: &[String],
    ) -> impl Future<Output = Result<Vec<Guarantor>, AppError>> + Send;

    fn joint_subjects_by_loan_keys(
        &self,
        keys: &[String],
    ) -> impl Future<Output = Result<Vec<Subject>, AppError>> + Send;

    fn contacts_by_fiscal_codes(
        &self,
        codes: &[String],
    ) -> impl Future<Output = Result<Vec<Contact>, AppError>> + Send;

    fn addresses_by_fiscal_codes(
        &self,
        codes: &[String],
    ) -> impl Future<Output = Result<Vec<Address>, AppError>> + Send;

    fn banks_by_fiscal_codes(
        &self,
        codes: &[String],
    ) -> impl Future<Output = Result<Vec<BankAccount>, AppError>> + Send;

    fn jobs_by_fiscal_codes(
        &self,
        codes: &[String],
    ) -> impl Future<Output = Result<Vec<Job>, AppError>> + Send;

    fn count_guarantors_by_loan_keys(
        &self,
        keys: &[String],
    ) -> impl Future<Output = Result<i64, AppError>> + Send;

    fn count_contacts_by_fiscal_code(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<i64, AppError>> + Send;

    fn count_addresses_by_fiscal_code(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<i64, AppError>> + Send;

    fn count_banks_by_fiscal_code(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<i64, AppError>> + Send;

    fn count_jobs_by_fiscal_code(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<i64, AppError>> + Send;
}

/// Two-stage linkage resolver over a [`RecordLookup`] store.
pub struct LinkageResolver<S> {
    store: S,
}

impl<S: RecordLookup> LinkageResolver<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The backing store, mainly for inspection in tests.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolves the full result bundle for a fiscal code.
    ///
    /// Zero matched subjects, or subjects without loan keys, are normal
    /// terminal states that short-circuit the affected lookups. Any failed
    /// lookup aborts the whole bundle; this operation never returns partial
    /// data.
    pub async fn resolve_bundle(
        &self,
        raw: &str,
        mode: SearchMode,
    ) -> Result<ResultBundle, AppError> {
        let normalized = match mode {
            SearchMode::Strict => fiscal_code::validate(raw)?,
            SearchMode::Partial => {
                if !fiscal_code::is_searchable(raw) {
                    return Err(AppError::BadRequest(
                        "Search term must be at least 3 letters or digits".to_string(),
                    ));
                }
                fiscal_code::clean(raw)
            }
        };

        tracing::info!("Resolving record bundle for {} ({:?})", normalized, mode);

        let subjects = match mode {
            SearchMode::Strict => self.store.subjects_by_fiscal_code(&normalized).await?,
            SearchMode::Partial => {
                self.store
                    .subjects_by_fiscal_code_fragment(&normalized)
                    .await?
            }
        };

        // Nothing to derive linkage keys from; secondary lookups are skipped
        // entirely.
        if subjects.is_empty() {
            tracing::info!("No subjects matched {}; returning empty bundle", normalized);
            return Ok(ResultBundle::empty(normalized));
        }

        let loan_keys = derive_loan_keys(&subjects);
        let subject_codes = distinct_fiscal_codes(&subjects);

        tracing::debug!(
            "Matched {} subject(s), {} loan key(s)",
            subjects.len(),
            loan_keys.len()
        );

        let (raw_guarantors, raw_joints, contacts, addresses, banks, jobs) = tokio::try_join!(
            async {
                if loan_keys.is_empty() {
                    Ok(Vec::new())
                } else {
                    self.store.guarantors_by_loan_keys(&loan_keys).await
                }
            },
            async {
                if loan_keys.is_empty() {
                    Ok(Vec::new())
                } else {
                    self.store.joint_subjects_by_loan_keys(&loan_keys).await
                }
            },
            self.store.contacts_by_fiscal_codes(&subject_codes),
            self.store.addresses_by_fiscal_codes(&subject_codes),
            self.store.banks_by_fiscal_codes(&subject_codes),
            self.store.jobs_by_fiscal_codes(&subject_codes),
        )?;

        // The same guarantor can hang off several loan keys; first
        // occurrence wins. Joint parties additionally drop the matched
        // subjects themselves.
        let guarantors = dedupe_by_key(raw_guarantors, |g| g.fiscal_code.clone());
        let matched: HashSet<&str> = subject_codes.iter().map(String::as_str).collect();
        let joints = dedupe_by_key(
            raw_joints
                .into_iter()
                .filter(|j| !matched.contains(j.fiscal_code.as_str()))
                .collect(),
            |j: &Subject| j.fiscal_code.clone(),
        );

        let summary = CategorySummary {
            guarantors_count: guarantors.len() as i64,
            contacts_count: contacts.len() as i64,
            addresses_count: addresses.len() as i64,
            banks_count: banks.len() as i64,
            jobs_count: jobs.len() as i64,
        };

        Ok(ResultBundle {
            query: normalized,
            subjects,
            guarantors,
            joints,
            contacts,
            addresses,
            banks,
            jobs,
            summary,
        })
    }

    /// Per-category counts for a fiscal code.
    ///
    /// Unlike [`resolve_bundle`](Self::resolve_bundle), a failed count for
    /// one category degrades to zero instead of aborting, so the summary
    /// stays usable while one backing collection is unavailable. Only the
    /// primary subject lookup is strict.
    pub async fn category_summary(&self, raw: &str) -> Result<CategorySummary, AppError> {
        let code = fiscal_code::validate(raw)?;

        tracing::info!("Computing category summary for {}", code);

        let subjects = self.store.subjects_by_fiscal_code(&code).await?;
        let loan_keys = derive_loan_keys(&subjects);

        let (guarantors, contacts, addresses, banks, jobs) = tokio::join!(
            async {
                if loan_keys.is_empty() {
                    Ok(0)
                } else {
                    self.store.count_guarantors_by_loan_keys(&loan_keys).await
                }
            },
            self.store.count_contacts_by_fiscal_code(&code),
            self.store.count_addresses_by_fiscal_code(&code),
            self.store.count_banks_by_fiscal_code(&code),
            self.store.count_jobs_by_fiscal_code(&code),
        );

        Ok(CategorySummary {
            guarantors_count: degrade("guarantors", guarantors),
            contacts_count: degrade("contacts", contacts),
            addresses_count: degrade("addresses", addresses),
            banks_count: degrade("banks", banks),
            jobs_count: degrade("jobs", jobs),
        })
    }
}

/// Distinct, non-empty loan linkage keys across the matched subjects, in
/// first-seen order.
pub fn derive_loan_keys(subjects: &[Subject]) -> Vec<String> {
    let mut seen = HashSet::new();
    subjects
        .iter()
        .filter_map(|s| s.record_id.clone())
        .filter(|k| !k.is_empty())
        .filter(|k| seen.insert(k.clone()))
        .collect()
}

/// Distinct fiscal codes across the matched subjects, in first-seen order.
pub fn distinct_fiscal_codes(subjects: &[Subject]) -> Vec<String> {
    let mut seen = HashSet::new();
    subjects
        .iter()
        .map(|s| s.fiscal_code.clone())
        .filter(|c| seen.insert(c.clone()))
        .collect()
}

/// Removes duplicates by a caller-supplied natural key, keeping the first
/// occurrence. Running it twice yields the same result.
pub fn dedupe_by_key<T, K, F>(items: Vec<T>, key_fn: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(key_fn(item)))
        .collect()
}

fn degrade(category: &str, result: Result<i64, AppError>) -> i64 {
    match result {
        Ok(count) => count,
        Err(e) => {
            tracing::warn!("Count for {} unavailable, reporting zero: {}", category, e);
            0
        }
    }
}
