use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============ Record Models ============

/// Provenance fields shared by every record collection.
///
/// Records are read-only projections of externally stored data; these fields
/// say which source system a row came from and when it moved through the
/// pipeline. Flattened into each record type at both the SQL and JSON layer.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Provenance {
    /// Source system the record was extracted from.
    pub source_system: String,
    /// Free-text detail about the source batch.
    pub source_details: Option<String>,
    /// Timestamp of creation in the source system.
    pub created_date: DateTime<Utc>,
    /// Timestamp of last modification in the source system.
    pub modified_date: DateTime<Utc>,
    /// Timestamp of extraction into the lookup collections.
    pub extracted_date: DateTime<Utc>,
}

/// A person or company identified by a fiscal code.
///
/// This is the primary record matched by a search. The optional `record_id`
/// is the loan linkage key: all parties of one loan share it, and it is the
/// only way to reach guarantor and joint-party records.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Subject {
    /// Unique identifier in the entity collection.
    pub entity_id: String,
    /// Display name (person or company).
    pub name: String,
    /// Canonical 16-character fiscal code.
    pub fiscal_code: String,
    /// Loan linkage key shared by all parties of the same loan.
    pub record_id: Option<String>,
    /// Borrower identifier in the source system.
    pub borrower_id: Option<i64>,
    /// Role of this party on the loan (see [`borrower_types`]).
    pub borrower_type_id: Option<i32>,
    /// Whether the subject is a company rather than an individual.
    pub is_company: bool,
    /// Whether the subject is deceased.
    pub is_deceased: bool,
    /// Gender (e.g., "M", "F"); absent for companies.
    pub gender: Option<String>,
    /// Date of birth.
    pub date_of_birth: Option<NaiveDate>,
    /// Date of death, when applicable.
    pub date_of_death: Option<NaiveDate>,
    /// Country of birth.
    pub country_of_birth: Option<String>,
    /// Region of birth.
    pub region_of_birth: Option<String>,
    /// Province of birth.
    pub province_of_birth: Option<String>,
    /// City of birth.
    pub city_of_birth: Option<String>,
    /// Composed birth-place string, filled by the display helpers.
    #[sqlx(default)]
    pub place_of_birth: Option<String>,
    /// Free-text notes attached to the entity.
    pub entity_notes: Option<String>,
    /// Shared provenance fields.
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub provenance: Provenance,
}

/// A guarantor attached to a loan.
///
/// Guarantor rows are keyed by the loan linkage key, not by the searched
/// fiscal code; the same guarantor can appear under several loans.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Guarantor {
    /// Loan linkage key this guarantee belongs to.
    pub record_id: String,
    /// Fiscal code of the guarantor (natural key for deduplication).
    pub fiscal_code: String,
    /// Display name of the guarantor.
    pub name: Option<String>,
    /// Borrower identifier in the source system.
    pub borrower_id: Option<i64>,
    /// Shared provenance fields.
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub provenance: Provenance,
}

/// A contact method (phone, email, PEC) for a subject.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Contact {
    /// Fiscal code of the owning subject.
    pub fiscal_code: String,
    /// Entity the contact was extracted for.
    pub entity_id: Option<String>,
    /// Phone number, as stored by the source system.
    pub phone_number: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Whether the email is a certified (PEC) address.
    pub is_pec: Option<bool>,
    /// Whether the contact has been verified.
    pub is_verified: Option<bool>,
    /// Shared provenance fields.
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub provenance: Provenance,
}

/// A postal address for a subject.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Address {
    /// Fiscal code of the owning subject.
    pub fiscal_code: String,
    /// Entity the address was extracted for.
    pub entity_id: Option<String>,
    /// Kind of address (residence, domicile, registered office).
    pub address_type: Option<String>,
    pub street: Option<String>,
    pub locality: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub postcode: Option<String>,
    /// Pre-composed single-line address, when the source provides one.
    pub full_address: Option<String>,
    /// Free-text notes.
    pub address_notes: Option<String>,
    /// Shared provenance fields.
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub provenance: Provenance,
}

/// A bank account association for a subject.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BankAccount {
    /// Fiscal code of the owning subject.
    pub fiscal_code: String,
    /// Entity the account was extracted for.
    pub entity_id: Option<String>,
    /// Name of the bank.
    pub bank_name: Option<String>,
    /// IBAN, when known.
    pub iban: Option<String>,
    /// Branch city.
    pub branch_city: Option<String>,
    /// Free-text notes.
    pub account_notes: Option<String>,
    /// Shared provenance fields.
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub provenance: Provenance,
}

/// Employment information for a subject.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Job {
    /// Fiscal code of the owning subject.
    pub fiscal_code: String,
    /// Entity the job was extracted for.
    pub entity_id: Option<String>,
    /// Employer name.
    pub employer_name: Option<String>,
    /// Employer tax code.
    pub employer_tax_code: Option<String>,
    /// Employer phone number.
    pub employer_phone: Option<String>,
    /// Monthly income, when reported.
    pub monthly_income: Option<f64>,
    /// Income range label from the source system.
    pub income_range: Option<String>,
    /// Pension category, for retired subjects.
    pub pension_category: Option<String>,
    /// Employment start date.
    pub start_date: Option<NaiveDate>,
    /// Employment end date.
    pub end_date: Option<NaiveDate>,
    /// Employer city.
    pub employer_city: Option<String>,
    /// Employer province.
    pub employer_province: Option<String>,
    /// Free-text notes about the work activity.
    pub work_notes: Option<String>,
    /// Shared provenance fields.
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub provenance: Provenance,
}

/// Tagged union over the related-record categories.
///
/// Used where the display layer wants one flat, category-tagged list instead
/// of per-category arrays.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "category", content = "record", rename_all = "snake_case")]
pub enum RelatedRecord {
    Guarantor(Guarantor),
    Contact(Contact),
    Address(Address),
    Bank(BankAccount),
    Job(Job),
}

impl RelatedRecord {
    /// Natural key used for deduplication, when the category has one.
    ///
    /// Guarantors deduplicate by fiscal code; direct-lookup categories are
    /// already unique per their backing collection and have no natural key.
    pub fn natural_key(&self) -> Option<&str> {
        match self {
            RelatedRecord::Guarantor(g) => Some(&g.fiscal_code),
            _ => None,
        }
    }

    /// Shared provenance fields of the wrapped record.
    pub fn provenance(&self) -> &Provenance {
        match self {
            RelatedRecord::Guarantor(g) => &g.provenance,
            RelatedRecord::Contact(c) => &c.provenance,
            RelatedRecord::Address(a) => &a.provenance,
            RelatedRecord::Bank(b) => &b.provenance,
            RelatedRecord::Job(j) => &j.provenance,
        }
    }
}

/// Known borrower roles on a loan.
///
/// The entity collection tags every loan party with a `borrower_type_id`;
/// these are the role ids used by the source systems.
pub mod borrower_types {
    /// Principal borrower.
    pub const BORROWER: i32 = 1;
    /// Joint party on the same loan.
    pub const JOINT: i32 = 2;
    /// Guarantor.
    pub const GUARANTOR: i32 = 5;
    /// Heir of a deceased borrower.
    pub const HEIR: i32 = 6;
}

// ============ Result Bundle ============

/// Per-category counts exposed to the display layer.
///
/// The display layer uses these to decide which tabs to enable before
/// fetching any detail rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategorySummary {
    pub guarantors_count: i64,
    pub contacts_count: i64,
    pub addresses_count: i64,
    pub banks_count: i64,
    pub jobs_count: i64,
}

/// Aggregate returned by the linkage resolver for one search.
#[derive(Debug, Clone, Serialize)]
pub struct ResultBundle {
    /// The normalized query the bundle was resolved for.
    pub query: String,
    /// Subjects matching the fiscal code.
    pub subjects: Vec<Subject>,
    /// Guarantors reached via the loan linkage keys, deduplicated.
    pub guarantors: Vec<Guarantor>,
    /// Joint parties reached via the loan linkage keys, deduplicated.
    pub joints: Vec<Subject>,
    /// Contacts joined directly on fiscal code.
    pub contacts: Vec<Contact>,
    /// Addresses joined directly on fiscal code.
    pub addresses: Vec<Address>,
    /// Bank accounts joined directly on fiscal code.
    pub banks: Vec<BankAccount>,
    /// Jobs joined directly on fiscal code.
    pub jobs: Vec<Job>,
    /// Per-category counts.
    pub summary: CategorySummary,
}

impl ResultBundle {
    /// An empty bundle: the terminal state when no subject matched.
    pub fn empty(query: String) -> Self {
        Self {
            query,
            subjects: Vec::new(),
            guarantors: Vec::new(),
            joints: Vec::new(),
            contacts: Vec::new(),
            addresses: Vec::new(),
            banks: Vec::new(),
            jobs: Vec::new(),
            summary: CategorySummary::default(),
        }
    }

    /// Flattens the per-category lists into one tagged list.
    pub fn related_records(&self) -> Vec<RelatedRecord> {
        let mut records = Vec::with_capacity(
            self.guarantors.len()
                + self.contacts.len()
                + self.addresses.len()
                + self.banks.len()
                + self.jobs.len(),
        );
        records.extend(self.guarantors.iter().cloned().map(RelatedRecord::Guarantor));
        records.extend(self.contacts.iter().cloned().map(RelatedRecord::Contact));
        records.extend(self.addresses.iter().cloned().map(RelatedRecord::Address));
        records.extend(self.banks.iter().cloned().map(RelatedRecord::Bank));
        records.extend(self.jobs.iter().cloned().map(RelatedRecord::Job));
        records
    }
}

// ============ Search Index Models ============

/// Typed filters for the entity search, ANDed together.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilters {
    pub is_company: Option<bool>,
    pub gender: Option<String>,
    pub is_deceased: Option<bool>,
    pub source_system: Option<String>,
    pub borrower_type_id: Option<i32>,
    pub country_of_birth: Option<String>,
    pub region_of_birth: Option<String>,
    pub province_of_birth: Option<String>,
}

impl SearchFilters {
    pub fn is_empty(&self) -> bool {
        self.is_company.is_none()
            && self.gender.is_none()
            && self.is_deceased.is_none()
            && self.source_system.is_none()
            && self.borrower_type_id.is_none()
            && self.country_of_birth.is_none()
            && self.region_of_birth.is_none()
            && self.province_of_birth.is_none()
    }
}

/// Options for a free-text subject search against the search index.
#[derive(Debug, Clone)]
pub struct SubjectSearchOptions {
    /// Free-text query; `*` matches everything.
    pub query: String,
    /// Typed filters, ANDed into the filter expression.
    pub filters: SearchFilters,
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub per_page: u32,
    /// `field:direction` sort expression; defaults to `borrower_id:desc`.
    pub sort_by: Option<String>,
}

impl Default for SubjectSearchOptions {
    fn default() -> Self {
        Self {
            query: "*".to_string(),
            filters: SearchFilters::default(),
            page: 1,
            per_page: 20,
            sort_by: None,
        }
    }
}

/// Query for loan-party views: all subjects on one loan in a given role.
#[derive(Debug, Clone, Deserialize)]
pub struct LoanPartyQuery {
    /// Source system the loan belongs to.
    pub source_system: String,
    /// Loan linkage key.
    pub record_id: String,
    /// Borrower role to select (see [`borrower_types`]).
    pub borrower_type_id: i32,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub sort_by: Option<String>,
}

/// One facet bucket returned by the search index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacetValue {
    pub value: String,
    pub count: i64,
}

/// Facet counts for one field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacetCount {
    pub field_name: String,
    pub counts: Vec<FacetValue>,
}

/// One page of search results.
#[derive(Debug, Clone, Serialize)]
pub struct SearchPage<T> {
    pub results: Vec<T>,
    /// Total number of matching documents.
    pub found: i64,
    pub page: u32,
    pub total_pages: u32,
    pub facets: Vec<FacetCount>,
}

/// Lightweight suggestion item for the search-as-you-type dropdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutocompleteItem {
    pub entity_id: String,
    pub name: String,
    pub fiscal_code: Option<String>,
}

// ============ HTTP Query Models ============

/// Query parameters for `GET /api/v1/entities/search`.
///
/// Filter fields are spelled out instead of flattening [`SearchFilters`];
/// `serde(flatten)` does not mix with the urlencoded query deserializer for
/// non-string fields.
#[derive(Debug, Deserialize)]
pub struct EntitySearchParams {
    pub q: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub sort_by: Option<String>,
    pub is_company: Option<bool>,
    pub gender: Option<String>,
    pub is_deceased: Option<bool>,
    pub source_system: Option<String>,
    pub borrower_type_id: Option<i32>,
    pub country_of_birth: Option<String>,
    pub region_of_birth: Option<String>,
    pub province_of_birth: Option<String>,
}

impl EntitySearchParams {
    pub fn filters(&self) -> SearchFilters {
        SearchFilters {
            is_company: self.is_company,
            gender: self.gender.clone(),
            is_deceased: self.is_deceased,
            source_system: self.source_system.clone(),
            borrower_type_id: self.borrower_type_id,
            country_of_birth: self.country_of_birth.clone(),
            region_of_birth: self.region_of_birth.clone(),
            province_of_birth: self.province_of_birth.clone(),
        }
    }
}

/// Query parameters for `GET /api/v1/entities/autocomplete`.
#[derive(Debug, Deserialize)]
pub struct AutocompleteParams {
    pub q: String,
    pub limit: Option<usize>,
}

/// Query parameters for the full-bundle endpoint.
#[derive(Debug, Deserialize)]
pub struct BundleParams {
    /// When true, the primary lookup is a substring match instead of the
    /// strict canonical-code match.
    pub partial: Option<bool>,
}

/// Outcome of a fiscal code validation, as exposed to the display layer.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationOutcome {
    pub is_valid: bool,
    /// Validation message when invalid, shown inline next to the input.
    pub error: Option<String>,
    /// Canonical uppercase form when valid.
    pub formatted: Option<String>,
    /// Human-readable grouped rendering when valid.
    pub display: Option<String>,
}
