//! Cash-flow and instrument models.
//!
//! Cash flows are produced by the upstream cash-flow engine and are read-only
//! to the validation engine.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single projected cash flow of an instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlow {
    /// The instrument this cash flow belongs to.
    pub instrument_id: String,
    /// The period index at which the flow occurs (0 = valuation date).
    pub period: u32,
    /// The signed amount of the flow.
    pub amount: Decimal,
    /// ISO currency code of the amount.
    pub currency: String,
}

/// An ordered, immutable sequence of cash flows.
///
/// # Example
///
/// ```
/// use irrbb_validation::models::{CashFlow, CashFlowSeries};
/// use rust_decimal::Decimal;
///
/// let series = CashFlowSeries::new(vec![CashFlow {
///     instrument_id: "loan_001".to_string(),
///     period: 1,
///     amount: Decimal::new(100, 0),
///     currency: "EUR".to_string(),
/// }]);
/// assert_eq!(series.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CashFlowSeries {
    flows: Vec<CashFlow>,
}

impl CashFlowSeries {
    /// Creates a series from flows in the order the upstream model produced them.
    pub fn new(flows: Vec<CashFlow>) -> Self {
        Self { flows }
    }

    /// Returns the flows in order.
    pub fn flows(&self) -> &[CashFlow] {
        &self.flows
    }

    /// Iterates over the flows in order.
    pub fn iter(&self) -> impl Iterator<Item = &CashFlow> {
        self.flows.iter()
    }

    /// Returns the number of flows.
    pub fn len(&self) -> usize {
        self.flows.len()
    }

    /// Returns true if the series has no flows.
    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}

impl From<Vec<CashFlow>> for CashFlowSeries {
    fn from(flows: Vec<CashFlow>) -> Self {
        Self::new(flows)
    }
}

/// An instrument drawn into the unit-test sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampledInstrument {
    /// Unique identifier of the instrument.
    pub instrument_id: String,
    /// Notional used to scale the unit-test tolerance.
    pub notional: Decimal,
    /// Projected cash flows of the instrument.
    pub cash_flows: CashFlowSeries,
    /// Names of the shock scenarios to test, in test order.
    pub scenarios: Vec<String>,
}

/// The upstream model's reported change in PV for one instrument and scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDeltaPv {
    /// The instrument the figure refers to.
    pub instrument_id: String,
    /// The scenario the figure refers to.
    pub scenario_name: String,
    /// Shocked PV minus baseline PV as reported by the model.
    pub delta_pv: Decimal,
}

/// A present value attributed to a balance-sheet line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineValue {
    /// The balance-sheet line (e.g., "Loans", "Deposits").
    pub balance_sheet_line: String,
    /// The value attributed to the line.
    pub amount: Decimal,
}

impl LineValue {
    /// Creates a new line value.
    pub fn new(balance_sheet_line: impl Into<String>, amount: Decimal) -> Self {
        Self {
            balance_sheet_line: balance_sheet_line.into(),
            amount,
        }
    }
}
