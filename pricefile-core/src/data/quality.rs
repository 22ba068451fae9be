//! Data quality report for an ingested table.
//!
//! Read-only: the table is never modified and nothing is rejected. Each issue
//! carries a count and a severity so callers can decide what to do with it.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::domain::{Cell, FieldRole, OhlcvTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Timestamp equal to an earlier row's.
    DuplicateTimestamp,
    /// Timestamp earlier than the previous row's.
    OutOfOrder,
    /// All four prices present but high < low, or open/close outside the range.
    InconsistentBar,
    MissingValues,
    ZeroVolume,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IssueKind::DuplicateTimestamp => "duplicate timestamp",
            IssueKind::OutOfOrder => "out of order",
            IssueKind::InconsistentBar => "inconsistent bar",
            IssueKind::MissingValues => "missing values",
            IssueKind::ZeroVolume => "zero volume",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => f.write_str("info"),
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityIssue {
    pub kind: IssueKind,
    /// Field the issue is about, for per-field issues.
    pub field: Option<String>,
    pub count: usize,
    pub severity: Severity,
    /// 0-based table position of the first affected row.
    pub first_row: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityReport {
    pub rows: usize,
    pub issues: Vec<QualityIssue>,
}

/// Running count plus first position.
#[derive(Default)]
struct Tally {
    count: usize,
    first: Option<usize>,
}

impl Tally {
    fn hit(&mut self, row: usize) {
        self.count += 1;
        if self.first.is_none() {
            self.first = Some(row);
        }
    }

    fn into_issue(
        self,
        kind: IssueKind,
        field: Option<String>,
        severity: Severity,
    ) -> Option<QualityIssue> {
        let first_row = self.first?;
        Some(QualityIssue {
            kind,
            field,
            count: self.count,
            severity,
            first_row,
        })
    }
}

impl QualityReport {
    pub fn inspect(table: &OhlcvTable) -> Self {
        let schema = table.schema();
        let rows = table.rows();

        let mut duplicates = Tally::default();
        let mut out_of_order = Tally::default();
        let mut inconsistent = Tally::default();
        let mut zero_volume = Tally::default();
        let mut seen = HashSet::with_capacity(rows.len());

        for (i, row) in rows.iter().enumerate() {
            if !seen.insert(row.timestamp) {
                duplicates.hit(i);
            }
            if i > 0 && row.timestamp < rows[i - 1].timestamp {
                out_of_order.hit(i);
            }
            if row.is_consistent() == Some(false) {
                inconsistent.hit(i);
            }
            if row.volume == Cell::Value(0) {
                zero_volume.hit(i);
            }
        }

        let mut issues: Vec<QualityIssue> = [
            duplicates.into_issue(IssueKind::DuplicateTimestamp, None, Severity::Warning),
            out_of_order.into_issue(IssueKind::OutOfOrder, None, Severity::Warning),
            inconsistent.into_issue(IssueKind::InconsistentBar, None, Severity::Error),
            zero_volume.into_issue(IssueKind::ZeroVolume, None, Severity::Warning),
        ]
        .into_iter()
        .flatten()
        .collect();

        // Missing cells, one issue per field in schema order.
        let mut extra_pos = 0;
        for field in schema.fields() {
            let mut missing = Tally::default();
            match field.role {
                FieldRole::Volume => {
                    for (i, row) in rows.iter().enumerate() {
                        if row.volume.is_missing() {
                            missing.hit(i);
                        }
                    }
                }
                FieldRole::Extra => {
                    for (i, row) in rows.iter().enumerate() {
                        if row.extra.get(extra_pos).map_or(true, |c| c.is_missing()) {
                            missing.hit(i);
                        }
                    }
                    extra_pos += 1;
                }
                role => {
                    for (i, row) in rows.iter().enumerate() {
                        if row.price(role).map_or(true, |c| c.is_missing()) {
                            missing.hit(i);
                        }
                    }
                }
            }
            issues.extend(missing.into_issue(
                IssueKind::MissingValues,
                Some(field.name.clone()),
                Severity::Info,
            ));
        }

        tracing::debug!(rows = rows.len(), issues = issues.len(), "quality report");
        Self {
            rows: rows.len(),
            issues,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Total affected rows for `kind`, summed over fields.
    pub fn count(&self, kind: IssueKind) -> usize {
        self.issues
            .iter()
            .filter(|i| i.kind == kind)
            .map(|i| i.count)
            .sum()
    }

    pub fn worst(&self) -> Option<Severity> {
        self.issues.iter().map(|i| i.severity).max()
    }
}
