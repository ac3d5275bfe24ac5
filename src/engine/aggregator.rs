//! Aggregation of checker outcomes into the governance verdict.
//!
//! The only computed field is the overall status. Every record that
//! contributes to it is recorded as a [`Finding`] so the verdict can be
//! traced back to its causes.

use crate::models::{
    AuditStep, BacktestResult, CheckStatus, Finding, LimitClassification, LimitEvaluation,
    OverallStatus, ReasonCode, ReconciliationRecord, Severity, UnavailableCheck, UnitTestRecord,
};

/// Finding code for a failed reconciliation line.
pub const RECONCILIATION_FAIL: &str = "reconciliation_fail";
/// Finding code for a failed instrument unit test.
pub const UNIT_TEST_FAIL: &str = "unit_test_fail";
/// Finding code for a failed backtest.
pub const BACKTEST_FAIL: &str = "backtest_fail";
/// Finding code for a backtest with an off-band slope.
pub const BACKTEST_WARNING: &str = "backtest_warning";
/// Finding code for a limit breach.
pub const LIMIT_BREACH: &str = "limit_breach";
/// Finding code for a limit warning.
pub const LIMIT_WARNING: &str = "limit_warning";
/// Finding code for a checker contribution that could not be computed.
pub const CHECK_UNAVAILABLE: &str = "check_unavailable";

/// Borrowed view of every checker contribution of a run.
#[derive(Debug, Clone, Copy)]
pub struct CheckOutcomes<'a> {
    /// PV reconciliation records.
    pub reconciliation: &'a [ReconciliationRecord],
    /// Instrument unit-test records.
    pub unit_tests: &'a [UnitTestRecord],
    /// Completed backtests.
    pub backtests: &'a [BacktestResult],
    /// Limit evaluations.
    pub limit_evaluations: &'a [LimitEvaluation],
    /// Aborted checker contributions.
    pub unavailable: &'a [UnavailableCheck],
}

/// The verdict of a run and the findings behind it.
#[derive(Debug, Clone)]
pub struct AggregateResult {
    /// The governance verdict.
    pub overall_status: OverallStatus,
    /// Findings in checker order.
    pub findings: Vec<Finding>,
    /// The audit step recording the aggregation.
    pub audit_step: AuditStep,
}

/// Derives the overall status from a set of findings.
///
/// Any fail finding fails the run, even alongside hundreds of passing
/// records; otherwise any warning downgrades it to pass-with-warnings.
pub fn overall_status(findings: &[Finding]) -> OverallStatus {
    if findings.iter().any(|f| f.severity == Severity::Fail) {
        OverallStatus::Fail
    } else if findings.is_empty() {
        OverallStatus::Pass
    } else {
        OverallStatus::PassWithWarnings
    }
}

/// Lists every record that is not a clean pass, in checker order.
pub fn collect_findings(outcomes: &CheckOutcomes<'_>) -> Vec<Finding> {
    let mut findings = Vec::new();

    for record in outcomes.reconciliation {
        if record.status == CheckStatus::Fail {
            let message = match (record.relative_diff, record.reason) {
                (Some(diff), _) => format!(
                    "Line '{}' differs from book value by {} (tolerance {})",
                    record.balance_sheet_line,
                    diff.round_dp(6).normalize(),
                    record.tolerance.normalize()
                ),
                (None, Some(ReasonCode::OutOfRange)) => format!(
                    "Line '{}' differs from book value by more than can be represented",
                    record.balance_sheet_line
                ),
                (None, _) => format!(
                    "Line '{}' is missing from one of the two sources",
                    record.balance_sheet_line
                ),
            };
            findings.push(finding(RECONCILIATION_FAIL, Severity::Fail, message));
        }
    }

    for record in outcomes.unit_tests {
        if record.status == CheckStatus::Fail {
            let message = match (record.absolute_diff, record.reason) {
                (Some(diff), _) => format!(
                    "Instrument '{}' under '{}' deviates from model ΔPV by {} (tolerance {})",
                    record.instrument_id,
                    record.scenario_name,
                    diff.round_dp(6).normalize(),
                    record.tolerance.normalize()
                ),
                (None, Some(reason)) => format!(
                    "Instrument '{}' under '{}' could not be compared: {:?}",
                    record.instrument_id, record.scenario_name, reason
                ),
                (None, None) => format!(
                    "Instrument '{}' under '{}' failed",
                    record.instrument_id, record.scenario_name
                ),
            };
            findings.push(finding(UNIT_TEST_FAIL, Severity::Fail, message));
        }
    }

    for result in outcomes.backtests {
        let message = format!(
            "{} backtest: R² {}, slope {} over {} periods",
            result.metric,
            result.r_squared.round_dp(4).normalize(),
            result.slope.round_dp(4).normalize(),
            result.sample_size
        );
        match result.status {
            CheckStatus::Fail => findings.push(finding(BACKTEST_FAIL, Severity::Fail, message)),
            CheckStatus::Warning => {
                findings.push(finding(BACKTEST_WARNING, Severity::Warning, message))
            }
            CheckStatus::Pass => {}
        }
    }

    for evaluation in outcomes.limit_evaluations {
        let (code, severity) = match evaluation.classification {
            LimitClassification::Breach => (LIMIT_BREACH, Severity::Fail),
            LimitClassification::Warning => (LIMIT_WARNING, Severity::Warning),
            LimitClassification::Ok => continue,
        };
        findings.push(finding(
            code,
            severity,
            format!(
                "{} on {} is {} against threshold {}",
                evaluation.metric_name,
                evaluation.period,
                evaluation.value.normalize(),
                evaluation.threshold_used.normalize()
            ),
        ));
    }

    for unavailable in outcomes.unavailable {
        let message = match &unavailable.subject {
            Some(subject) => format!(
                "{:?} ({}) unavailable: {}",
                unavailable.check, subject, unavailable.reason
            ),
            None => format!("{:?} unavailable: {}", unavailable.check, unavailable.reason),
        };
        findings.push(finding(CHECK_UNAVAILABLE, Severity::Fail, message));
    }

    findings
}

/// Aggregates every checker contribution into the run verdict.
pub fn aggregate(outcomes: &CheckOutcomes<'_>, step_number: u32) -> AggregateResult {
    let findings = collect_findings(outcomes);
    let overall_status = overall_status(&findings);

    let count = |code: &str| findings.iter().filter(|f| f.code == code).count();
    let failures = findings
        .iter()
        .filter(|f| f.severity == Severity::Fail)
        .count();

    let audit_step = AuditStep {
        step_number,
        rule_id: "overall_status".to_string(),
        rule_name: "Overall Status".to_string(),
        input: serde_json::json!({
            "reconciliation_records": outcomes.reconciliation.len(),
            "unit_test_records": outcomes.unit_tests.len(),
            "backtests": outcomes.backtests.len(),
            "limit_evaluations": outcomes.limit_evaluations.len(),
            "unavailable_checks": outcomes.unavailable.len()
        }),
        output: serde_json::json!({
            "overall_status": overall_status,
            "reconciliation_fail": count(RECONCILIATION_FAIL),
            "unit_test_fail": count(UNIT_TEST_FAIL),
            "backtest_fail": count(BACKTEST_FAIL),
            "backtest_warning": count(BACKTEST_WARNING),
            "limit_breach": count(LIMIT_BREACH),
            "limit_warning": count(LIMIT_WARNING),
            "check_unavailable": count(CHECK_UNAVAILABLE)
        }),
        reasoning: format!(
            "{} failing and {} warning findings",
            failures,
            findings.len() - failures
        ),
    };

    AggregateResult {
        overall_status,
        findings,
        audit_step,
    }
}

fn finding(code: &str, severity: Severity, message: String) -> Finding {
    Finding {
        code: code.to_string(),
        severity,
        message,
    }
}
