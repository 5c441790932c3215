//! Bulk registration pipeline: validate spreadsheet rows one by one,
//! generate a QR code and persist each valid row, and report every row's
//! fate back to the caller. A failing row never aborts the batch.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use contracts::domain::a001_student::{
    ImportOutcome, ImportReport, ImportRow, Student, REQUIRED_IMPORT_FIELDS,
};
use std::path::PathBuf;
use thiserror::Error;

use super::repository;
use crate::shared::qr;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];

/// Upper bound on each downstream call so one hung collaborator cannot
/// stall the whole batch.
const ROW_STEP_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

// ============================================================================
// Error taxonomy
// ============================================================================

/// Per-row validation failure; the row is skipped, the batch continues.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Every absent or blank required column, in fixed field order
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("Invalid value for {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },
}

/// Persistence failure; recoverable at batch level.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Duplicate PRN number: {0}")]
    DuplicatePrn(String),
    #[error("{0}")]
    Backend(String),
}

/// QR rendering/storage failure; recoverable at batch level.
#[derive(Debug, Error)]
#[error("QR generation failed: {0}")]
pub struct GenError(pub String);

/// Reference to a generated QR image artifact (e.g. "/uploads/qr_P1.png")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrReference(pub String);

// ============================================================================
// Collaborator contracts
// ============================================================================

#[async_trait]
pub trait StudentStore {
    /// Persist the record; must reject a PRN that already exists.
    async fn save(&self, student: Student) -> Result<Student, StoreError>;
}

#[async_trait]
pub trait QrGenerator {
    /// Deterministic mapping from payload string to an image artifact.
    async fn generate(&self, payload: &str) -> Result<QrReference, GenError>;
}

/// QR payload embedding the student's PRN.
pub fn qr_payload(base_url: &str, prn: &str) -> String {
    format!("{}/students/{}", base_url.trim_end_matches('/'), prn)
}

// ============================================================================
// Record validator
// ============================================================================

/// Check one raw row and build a normalized student record from it.
///
/// All absent required fields are reported at once; type coercion
/// (year to integer, date of birth to a date) happens only after the
/// presence check passes. No side effects; PRN uniqueness is left to
/// the store.
pub fn validate_row(row: &ImportRow) -> Result<Student, ValidationError> {
    let missing: Vec<&'static str> = REQUIRED_IMPORT_FIELDS
        .iter()
        .copied()
        .filter(|field| row.get(field).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingFields(missing));
    }

    let year_raw = row.get("yearOfJoining").unwrap_or_default();
    let year_of_joining: i32 =
        year_raw
            .parse()
            .map_err(|_| ValidationError::InvalidField {
                field: "yearOfJoining",
                reason: format!("'{}' is not a whole number", year_raw),
            })?;

    let dob_raw = row.get("dateOfBirth").unwrap_or_default();
    let date_of_birth = parse_date(dob_raw).ok_or_else(|| ValidationError::InvalidField {
        field: "dateOfBirth",
        reason: format!("'{}' is not a recognized date", dob_raw),
    })?;

    let mobile_number = row.get("mobileNumber").unwrap_or_default().to_string();
    if mobile_number.len() != 10 || !mobile_number.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidField {
            field: "mobileNumber",
            reason: "must be exactly 10 digits".into(),
        });
    }

    let mut student = Student::new_for_insert(
        row.get("fullName").unwrap_or_default().to_string(),
        row.get("address").unwrap_or_default().to_string(),
        date_of_birth,
        mobile_number,
        row.get("prnNumber").unwrap_or_default().to_string(),
        row.get("rollNumber").unwrap_or_default().to_string(),
        year_of_joining,
        row.get("courseName").unwrap_or_default().to_string(),
    );
    student.photo_url = row.get("photoUrl").map(str::to_string);

    Ok(student)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

// ============================================================================
// Batch importer
// ============================================================================

/// Run the whole batch: rows are processed strictly in input order, each
/// resolving to exactly one outcome. Every successfully validated row is
/// stamped with the same `import_instant` so one batch yields one card
/// validity date.
pub async fn import_batch<S, Q>(
    rows: Vec<ImportRow>,
    store: &S,
    qr_gen: &Q,
    qr_base_url: &str,
    import_instant: DateTime<Utc>,
) -> ImportReport
where
    S: StudentStore,
    Q: QrGenerator,
{
    let mut outcomes = Vec::with_capacity(rows.len());
    for row in rows {
        let outcome = process_row(row, store, qr_gen, qr_base_url, import_instant).await;
        outcomes.push(outcome);
    }
    ImportReport::build(outcomes)
}

async fn process_row<S, Q>(
    row: ImportRow,
    store: &S,
    qr_gen: &Q,
    qr_base_url: &str,
    import_instant: DateTime<Utc>,
) -> ImportOutcome
where
    S: StudentStore,
    Q: QrGenerator,
{
    let mut student = match validate_row(&row) {
        Ok(student) => student,
        Err(e) => return ImportOutcome::rejected(row, e.to_string()),
    };
    student.stamp_card_validity(import_instant);

    let payload = qr_payload(qr_base_url, &student.prn_number);
    match tokio::time::timeout(ROW_STEP_TIMEOUT, qr_gen.generate(&payload)).await {
        Ok(Ok(qr_ref)) => student.qr_code = Some(qr_ref.0),
        Ok(Err(e)) => return ImportOutcome::rejected(row, e.to_string()),
        Err(_) => {
            return ImportOutcome::rejected(
                row,
                GenError(format!("timed out after {}s", ROW_STEP_TIMEOUT.as_secs())).to_string(),
            )
        }
    }

    match tokio::time::timeout(ROW_STEP_TIMEOUT, store.save(student)).await {
        Ok(Ok(_)) => ImportOutcome::accepted(row),
        Ok(Err(e)) => ImportOutcome::rejected(row, e.to_string()),
        Err(_) => ImportOutcome::rejected(
            row,
            StoreError::Backend(format!("timed out after {}s", ROW_STEP_TIMEOUT.as_secs()))
                .to_string(),
        ),
    }
}

// ============================================================================
// Spreadsheet parsing (upstream of the importer)
// ============================================================================

/// Parse the uploaded CSV into import rows.
///
/// A malformed file is the one batch-fatal condition and must be signalled
/// to the caller before `import_batch` runs. Fully blank lines are skipped;
/// blank cells are simply absent from the row.
pub fn parse_csv_rows(csv_text: &str) -> anyhow::Result<Vec<ImportRow>> {
    // Strip UTF-8 BOM if present
    let text = csv_text.trim_start_matches('\u{FEFF}');

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| anyhow::anyhow!("Failed to read CSV headers: {}", e))?
        .clone();

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result.map_err(|e| anyhow::anyhow!("Unparseable CSV record: {}", e))?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        // A row wider than the header would silently drop cells
        if record.len() > headers.len() {
            anyhow::bail!(
                "Unparseable CSV record: row {} has {} cells but the header declares {}",
                index + 2,
                record.len(),
                headers.len()
            );
        }
        let mut row = ImportRow::new();
        for (i, header) in headers.iter().enumerate() {
            if let Some(value) = record.get(i) {
                let value = value.trim();
                if !value.is_empty() {
                    row.set(header.trim(), value);
                }
            }
        }
        rows.push(row);
    }
    Ok(rows)
}

// ============================================================================
// Production collaborators
// ============================================================================

/// sea-orm backed store; the unique index on prn_number backs up the
/// application-level duplicate check.
pub struct SqlStudentStore;

#[async_trait]
impl StudentStore for SqlStudentStore {
    async fn save(&self, student: Student) -> Result<Student, StoreError> {
        let existing = repository::find_by_prn(&student.prn_number)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        if existing.is_some() {
            return Err(StoreError::DuplicatePrn(student.prn_number.clone()));
        }

        repository::insert(&student).await.map_err(|e| {
            let msg = e.to_string();
            if msg.contains("UNIQUE constraint failed") {
                StoreError::DuplicatePrn(student.prn_number.clone())
            } else {
                StoreError::Backend(msg)
            }
        })?;
        Ok(student)
    }
}

/// Writes `qr_{prn}.png` under the uploads directory.
pub struct FileQrGenerator {
    uploads_dir: PathBuf,
}

impl FileQrGenerator {
    pub fn new(uploads_dir: PathBuf) -> Self {
        Self { uploads_dir }
    }
}

#[async_trait]
impl QrGenerator for FileQrGenerator {
    async fn generate(&self, payload: &str) -> Result<QrReference, GenError> {
        // The payload ends with the PRN; use it as the artifact name
        let slug = payload.rsplit('/').next().unwrap_or("code");
        let file_name = format!("qr_{}.png", slug);
        let path = self.uploads_dir.join(&file_name);
        qr::write_png(payload, &path).map_err(|e| GenError(e.to_string()))?;
        Ok(QrReference(format!("/uploads/{}", file_name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct MemoryStore {
        prns: Mutex<HashSet<String>>,
        saved: Mutex<Vec<Student>>,
        calls: AtomicUsize,
    }

    impl MemoryStore {
        fn new() -> Self {
            Self {
                prns: Mutex::new(HashSet::new()),
                saved: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl StudentStore for MemoryStore {
        async fn save(&self, student: Student) -> Result<Student, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut prns = self.prns.lock().unwrap();
            if !prns.insert(student.prn_number.clone()) {
                return Err(StoreError::DuplicatePrn(student.prn_number.clone()));
            }
            self.saved.lock().unwrap().push(student.clone());
            Ok(student)
        }
    }

    struct StubQr {
        calls: AtomicUsize,
        fail: bool,
    }

    impl StubQr {
        fn ok() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl QrGenerator for StubQr {
        async fn generate(&self, payload: &str) -> Result<QrReference, GenError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(GenError("disk full".into()));
            }
            let slug = payload.rsplit('/').next().unwrap();
            Ok(QrReference(format!("/uploads/qr_{}.png", slug)))
        }
    }

    const BASE_URL: &str = "http://medical-college.edu";

    fn valid_row(prn: &str) -> ImportRow {
        ImportRow::from_pairs([
            ("fullName", "A"),
            ("address", "X"),
            ("dateOfBirth", "2000-01-01"),
            ("mobileNumber", "9000000000"),
            ("prnNumber", prn),
            ("rollNumber", "R1"),
            ("yearOfJoining", "2023"),
            ("courseName", "MBBS"),
        ])
    }

    #[test]
    fn validator_accepts_complete_row() {
        let student = validate_row(&valid_row("P1")).unwrap();
        assert_eq!(student.full_name, "A");
        assert_eq!(student.prn_number, "P1");
        assert_eq!(student.year_of_joining, 2023);
        assert_eq!(
            student.date_of_birth,
            NaiveDate::from_ymd_opt(2000, 1, 1).unwrap()
        );
    }

    #[test]
    fn validator_reports_every_missing_field_in_fixed_order() {
        let row = ImportRow::from_pairs([("fullName", "A")]);
        let err = validate_row(&row).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required fields: address, dateOfBirth, mobileNumber, prnNumber, \
             rollNumber, yearOfJoining, courseName"
        );
    }

    #[test]
    fn validator_treats_blank_cells_as_missing() {
        let mut row = valid_row("P1");
        row.set("address", "   ");
        let err = validate_row(&row).unwrap_err();
        assert!(err.to_string().contains("address"));
    }

    #[test]
    fn validator_rejects_non_numeric_year() {
        let mut row = valid_row("P1");
        row.set("yearOfJoining", "twenty23");
        let err = validate_row(&row).unwrap_err();
        assert!(err.to_string().contains("yearOfJoining"));
    }

    #[test]
    fn validator_rejects_unrecognized_date() {
        let mut row = valid_row("P1");
        row.set("dateOfBirth", "01.13.2000");
        let err = validate_row(&row).unwrap_err();
        assert!(err.to_string().contains("dateOfBirth"));
    }

    #[test]
    fn validator_accepts_alternate_date_format() {
        let mut row = valid_row("P1");
        row.set("dateOfBirth", "15/08/2001");
        let student = validate_row(&row).unwrap();
        assert_eq!(
            student.date_of_birth,
            NaiveDate::from_ymd_opt(2001, 8, 15).unwrap()
        );
    }

    #[test]
    fn validator_rejects_short_mobile_number() {
        let mut row = valid_row("P1");
        row.set("mobileNumber", "12345");
        let err = validate_row(&row).unwrap_err();
        assert!(err.to_string().contains("mobileNumber"));
    }

    #[test]
    fn qr_payload_embeds_prn() {
        assert_eq!(
            qr_payload(BASE_URL, "PRN2025001"),
            "http://medical-college.edu/students/PRN2025001"
        );
        // Trailing slash on the base URL does not double up
        assert_eq!(
            qr_payload("http://medical-college.edu/", "P1"),
            "http://medical-college.edu/students/P1"
        );
    }

    #[tokio::test]
    async fn single_valid_row_is_accepted() {
        let store = MemoryStore::new();
        let qr = StubQr::ok();
        let report = import_batch(vec![valid_row("P1")], &store, &qr, BASE_URL, Utc::now()).await;

        assert_eq!(report.total, 1);
        assert_eq!(report.success, 1);
        assert_eq!(report.errors, 0);
        assert!(report.records[0].success);
        assert!(report.records[0].error.is_none());

        let saved = store.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].qr_code.as_deref(), Some("/uploads/qr_P1.png"));
    }

    #[tokio::test]
    async fn missing_fields_row_skips_qr_and_store() {
        let store = MemoryStore::new();
        let qr = StubQr::ok();
        let row = ImportRow::from_pairs([("fullName", "A")]);
        let report = import_batch(vec![row], &store, &qr, BASE_URL, Utc::now()).await;

        assert_eq!(report.total, 1);
        assert_eq!(report.success, 0);
        assert_eq!(report.errors, 1);
        assert_eq!(
            report.records[0].error.as_deref(),
            Some(
                "Missing required fields: address, dateOfBirth, mobileNumber, prnNumber, \
                 rollNumber, yearOfJoining, courseName"
            )
        );
        // Validator failure must not touch the collaborators
        assert_eq!(qr.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn duplicate_prn_fails_second_row_only() {
        let store = MemoryStore::new();
        let qr = StubQr::ok();
        let report = import_batch(
            vec![valid_row("P1"), valid_row("P1")],
            &store,
            &qr,
            BASE_URL,
            Utc::now(),
        )
        .await;

        assert_eq!(report.total, 2);
        assert_eq!(report.success, 1);
        assert_eq!(report.errors, 1);
        assert!(report.records[0].success);
        assert!(!report.records[1].success);
        assert!(report.records[1]
            .error
            .as_deref()
            .unwrap()
            .contains("Duplicate PRN"));
    }

    #[tokio::test]
    async fn rerunning_a_successful_batch_fails_every_row() {
        let store = MemoryStore::new();
        let qr = StubQr::ok();
        let rows = vec![valid_row("P1"), valid_row("P2")];

        let first = import_batch(rows.clone(), &store, &qr, BASE_URL, Utc::now()).await;
        assert_eq!(first.success, 2);

        let second = import_batch(rows, &store, &qr, BASE_URL, Utc::now()).await;
        assert_eq!(second.success, 0);
        assert_eq!(second.errors, second.total);
    }

    #[tokio::test]
    async fn qr_failure_marks_row_failed_without_persisting() {
        let store = MemoryStore::new();
        let qr = StubQr::failing();
        let report = import_batch(vec![valid_row("P1")], &store, &qr, BASE_URL, Utc::now()).await;

        assert_eq!(report.errors, 1);
        assert!(report.records[0]
            .error
            .as_deref()
            .unwrap()
            .contains("QR generation failed"));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn outcome_order_matches_input_order() {
        let store = MemoryStore::new();
        let qr = StubQr::ok();
        let rows = vec![
            valid_row("P1"),
            ImportRow::from_pairs([("fullName", "B")]),
            valid_row("P3"),
        ];
        let report = import_batch(rows, &store, &qr, BASE_URL, Utc::now()).await;

        assert_eq!(report.total, 3);
        assert_eq!(report.total, report.success + report.errors);
        let flags: Vec<bool> = report.records.iter().map(|o| o.success).collect();
        assert_eq!(flags, [true, false, true]);
        assert_eq!(report.records[0].fields["prnNumber"], "P1");
        assert_eq!(report.records[2].fields["prnNumber"], "P3");
    }

    #[tokio::test]
    async fn whole_batch_shares_one_card_validity_date() {
        let store = MemoryStore::new();
        let qr = StubQr::ok();
        let instant = chrono::DateTime::parse_from_rfc3339("2025-06-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        import_batch(
            vec![valid_row("P1"), valid_row("P2"), valid_row("P3")],
            &store,
            &qr,
            BASE_URL,
            instant,
        )
        .await;

        let saved = store.saved.lock().unwrap();
        let expected = NaiveDate::from_ymd_opt(2026, 6, 1);
        assert_eq!(saved.len(), 3);
        assert!(saved.iter().all(|s| s.card_validity == expected));
    }

    struct HungStore;

    #[async_trait]
    impl StudentStore for HungStore {
        async fn save(&self, student: Student) -> Result<Student, StoreError> {
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
            Ok(student)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn hung_store_times_out_instead_of_stalling_the_batch() {
        let qr = StubQr::ok();
        let report = import_batch(
            vec![valid_row("P1"), valid_row("P2")],
            &HungStore,
            &qr,
            BASE_URL,
            Utc::now(),
        )
        .await;

        assert_eq!(report.total, 2);
        assert_eq!(report.errors, 2);
        assert!(report.records[0]
            .error
            .as_deref()
            .unwrap()
            .contains("timed out"));
    }

    #[tokio::test]
    async fn empty_batch_yields_empty_report() {
        let store = MemoryStore::new();
        let qr = StubQr::ok();
        let report = import_batch(vec![], &store, &qr, BASE_URL, Utc::now()).await;
        assert_eq!(report.total, 0);
        assert_eq!(report.success, 0);
        assert_eq!(report.errors, 0);
        assert!(report.records.is_empty());
    }

    #[test]
    fn csv_parsing_builds_rows_from_headers() {
        let csv = "\u{FEFF}fullName,address,prnNumber\nA,X,P1\n,,\nB,,P2\n";
        let rows = parse_csv_rows(csv).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("fullName"), Some("A"));
        assert_eq!(rows[0].get("prnNumber"), Some("P1"));
        // Blank cell is absent, not empty
        assert_eq!(rows[1].get("address"), None);
        assert_eq!(rows[1].get("prnNumber"), Some("P2"));
    }

    #[test]
    fn csv_parsing_rejects_rows_wider_than_the_header() {
        let csv = "fullName,prnNumber\nA,P1,2023\n";
        let err = parse_csv_rows(csv).unwrap_err();
        assert!(err.to_string().contains("Unparseable CSV record"));
    }

    #[test]
    fn csv_parsing_trims_cells_and_headers() {
        let csv = " fullName , prnNumber \n  A  ,  P1  \n";
        let rows = parse_csv_rows(csv).unwrap();
        assert_eq!(rows[0].get("fullName"), Some("A"));
        assert_eq!(rows[0].get("prnNumber"), Some("P1"));
    }
}
