pub mod carry_forward;
pub mod rates;
pub mod tax;

use serde::{Deserialize, Serialize};

use crate::types::YesNo;

pub use carry_forward::{
    apply_carry_forward, calculate_taxable_income, theoretical_taxable_income, CarryForwardQueue,
    LossEntry, TaxableIncome, TaxableIncomeInput,
};
pub use rates::{DatedRate, TaxRateSchedule};
pub use tax::{income_tax, IncomeTax};

/// Income tax section of the general options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeTaxOptions {
    /// Apply the 15% statutory depletion floor
    #[serde(default)]
    pub fifteen_depletion: YesNo,
    /// Carry net operating losses forward
    #[serde(default)]
    pub carry_forward: YesNo,
    #[serde(default)]
    pub state_income_tax: TaxRateSchedule,
    #[serde(default)]
    pub federal_income_tax: TaxRateSchedule,
}
