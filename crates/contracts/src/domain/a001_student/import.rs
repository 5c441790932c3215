use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Required spreadsheet columns, in the order they are reported when missing.
pub const REQUIRED_IMPORT_FIELDS: [&str; 8] = [
    "fullName",
    "address",
    "dateOfBirth",
    "mobileNumber",
    "prnNumber",
    "rollNumber",
    "yearOfJoining",
    "courseName",
];

/// One raw spreadsheet row: column name -> cell value.
///
/// Carries no type or presence guarantees; blank cells count as absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportRow {
    #[serde(flatten)]
    pub fields: HashMap<String, String>,
}

impl ImportRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Trimmed cell value; `None` when the column is absent or blank.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// Terminal result for one imported row. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOutcome {
    /// The original row fields, echoed back to the caller
    #[serde(flatten)]
    pub fields: HashMap<String, String>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ImportOutcome {
    pub fn accepted(row: ImportRow) -> Self {
        Self {
            fields: row.fields,
            success: true,
            error: None,
        }
    }

    pub fn rejected(row: ImportRow, error: impl Into<String>) -> Self {
        Self {
            fields: row.fields,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Aggregate summary returned from a full batch import call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub total: usize,
    pub success: usize,
    pub errors: usize,
    pub records: Vec<ImportOutcome>,
}

impl ImportReport {
    /// Pure aggregation over the per-row outcomes.
    ///
    /// Guarantees `total == success + errors` and that record order equals
    /// input row order; no reordering, no deduplication.
    pub fn build(outcomes: Vec<ImportOutcome>) -> Self {
        let total = outcomes.len();
        let success = outcomes.iter().filter(|o| o.success).count();
        Self {
            total,
            success,
            errors: total - success,
            records: outcomes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_missing_cells_are_absent() {
        let row = ImportRow::from_pairs([("fullName", "A"), ("address", "   ")]);
        assert_eq!(row.get("fullName"), Some("A"));
        assert_eq!(row.get("address"), None);
        assert_eq!(row.get("courseName"), None);
    }

    #[test]
    fn get_trims_cell_values() {
        let row = ImportRow::from_pairs([("prnNumber", "  P1  ")]);
        assert_eq!(row.get("prnNumber"), Some("P1"));
    }

    #[test]
    fn report_totals_add_up_and_order_is_preserved() {
        let outcomes = vec![
            ImportOutcome::accepted(ImportRow::from_pairs([("prnNumber", "P1")])),
            ImportOutcome::rejected(ImportRow::from_pairs([("prnNumber", "P2")]), "boom"),
            ImportOutcome::accepted(ImportRow::from_pairs([("prnNumber", "P3")])),
        ];
        let report = ImportReport::build(outcomes);
        assert_eq!(report.total, 3);
        assert_eq!(report.success, 2);
        assert_eq!(report.errors, 1);
        assert_eq!(report.total, report.success + report.errors);
        let prns: Vec<_> = report
            .records
            .iter()
            .map(|o| o.fields["prnNumber"].as_str())
            .collect();
        assert_eq!(prns, ["P1", "P2", "P3"]);
    }

    #[test]
    fn outcome_serializes_row_fields_inline() {
        let outcome = ImportOutcome::rejected(
            ImportRow::from_pairs([("fullName", "A")]),
            "Missing required fields: address",
        );
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["fullName"], "A");
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Missing required fields: address");

        let ok = ImportOutcome::accepted(ImportRow::from_pairs([("fullName", "B")]));
        let json = serde_json::to_value(&ok).unwrap();
        assert!(json.get("error").is_none());
    }
}
