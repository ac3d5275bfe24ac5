//! PV reconciliation against book values.
//!
//! This module compares the model's baseline present value per balance-sheet
//! line with the book-equity value of the same line from the ledger snapshot.

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::models::{AuditStep, CheckStatus, LineValue, ReasonCode, ReconciliationRecord};
use crate::numeric::{absolute_difference, relative_difference, within_tolerance};

/// The result of a PV reconciliation, including the records and audit step.
#[derive(Debug, Clone)]
pub struct ReconciliationResult {
    /// One record per balance-sheet line, in input order.
    pub records: Vec<ReconciliationRecord>,
    /// The audit step recording this check.
    pub audit_step: AuditStep,
}

/// Reconciles model baseline PVs against book values line by line.
///
/// Each line present in both sources passes when its relative difference
/// (against the book value) is within `tolerance`. A line present in only one
/// source fails with reason [`ReasonCode::MissingLine`]. A line whose
/// difference exceeds the `Decimal` range fails with
/// [`ReasonCode::OutOfRange`].
///
/// # Arguments
///
/// * `model_pv` - Baseline PV per line from the model, in reporting order
/// * `book_values` - Book value per line from the ledger snapshot
/// * `tolerance` - Relative tolerance as a fraction (0.02 = 2%)
/// * `step_number` - The step number for audit trail sequencing
///
/// # Returns
///
/// Records ordered as the model lines, followed by lines found only in the
/// book values, in their input order.
///
/// # Examples
///
/// ```
/// use irrbb_validation::checks::reconcile_present_values;
/// use irrbb_validation::models::{CheckStatus, LineValue};
/// use rust_decimal::Decimal;
///
/// let result = reconcile_present_values(
///     &[LineValue::new("Loans", Decimal::from(100))],
///     &[LineValue::new("Loans", Decimal::from(102))],
///     Decimal::new(2, 2),
///     1,
/// );
/// assert_eq!(result.records[0].status, CheckStatus::Pass);
/// ```
pub fn reconcile_present_values(
    model_pv: &[LineValue],
    book_values: &[LineValue],
    tolerance: Decimal,
    step_number: u32,
) -> ReconciliationResult {
    let find = |lines: &[LineValue], name: &str| {
        lines
            .iter()
            .find(|l| l.balance_sheet_line == name)
            .map(|l| l.amount)
    };

    let mut records = Vec::with_capacity(model_pv.len().max(book_values.len()));

    for line in model_pv {
        let book = find(book_values, &line.balance_sheet_line);
        records.push(reconcile_line(
            &line.balance_sheet_line,
            Some(line.amount),
            book,
            tolerance,
        ));
    }

    for line in book_values {
        if find(model_pv, &line.balance_sheet_line).is_none() {
            records.push(reconcile_line(
                &line.balance_sheet_line,
                None,
                Some(line.amount),
                tolerance,
            ));
        }
    }

    let passed = records
        .iter()
        .filter(|r| r.status == CheckStatus::Pass)
        .count();
    let missing = records
        .iter()
        .filter(|r| r.reason == Some(ReasonCode::MissingLine))
        .count();
    let failed = records.len() - passed;

    debug!(lines = records.len(), passed, failed, missing, "PV reconciliation complete");

    let audit_step = AuditStep {
        step_number,
        rule_id: "pv_reconciliation".to_string(),
        rule_name: "PV Reconciliation".to_string(),
        input: serde_json::json!({
            "model_lines": model_pv.len(),
            "book_lines": book_values.len(),
            "tolerance": tolerance.normalize().to_string()
        }),
        output: serde_json::json!({
            "lines": records.len(),
            "passed": passed,
            "failed": failed,
            "missing_lines": missing
        }),
        reasoning: format!(
            "{} of {} balance-sheet lines within {}% of book value ({} missing from one source)",
            passed,
            records.len(),
            (tolerance * Decimal::ONE_HUNDRED).normalize(),
            missing
        ),
    };

    ReconciliationResult {
        records,
        audit_step,
    }
}

fn reconcile_line(
    line: &str,
    model_pv: Option<Decimal>,
    book_value: Option<Decimal>,
    tolerance: Decimal,
) -> ReconciliationRecord {
    let record = |absolute_diff, relative_diff, status, reason| ReconciliationRecord {
        balance_sheet_line: line.to_string(),
        model_pv,
        book_value,
        absolute_diff,
        relative_diff,
        tolerance,
        status,
        reason,
    };

    match (model_pv, book_value) {
        (Some(model), Some(book)) => match relative_difference(model, book) {
            Some(relative) => {
                let status = if within_tolerance(relative, tolerance) {
                    CheckStatus::Pass
                } else {
                    CheckStatus::Fail
                };
                record(absolute_difference(model, book), Some(relative), status, None)
            }
            None => {
                warn!(
                    line,
                    model_pv = %model,
                    book_value = %book,
                    "PV difference outside Decimal range"
                );
                record(
                    absolute_difference(model, book),
                    None,
                    CheckStatus::Fail,
                    Some(ReasonCode::OutOfRange),
                )
            }
        },
        _ => record(None, None, CheckStatus::Fail, Some(ReasonCode::MissingLine)),
    }
}
