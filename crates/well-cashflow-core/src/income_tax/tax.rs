use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::types::{Money, Rate, Series};
use crate::EngineResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeTax {
    pub state_income_tax: Series,
    pub federal_income_tax: Series,
}

/// State tax on taxable income, then federal tax on what is left after state
/// tax. No rounding and no floor.
pub fn income_tax(
    taxable_income: &[Money],
    state_rate: &[Rate],
    federal_rate: &[Rate],
) -> EngineResult<IncomeTax> {
    for (name, rates) in [("state_tax_rate", state_rate), ("federal_tax_rate", federal_rate)] {
        if rates.len() != taxable_income.len() {
            return Err(EngineError::LengthMismatch {
                series: name.to_string(),
                expected: taxable_income.len(),
                actual: rates.len(),
            });
        }
    }

    let state_income_tax: Series = taxable_income
        .iter()
        .zip(state_rate)
        .map(|(ti, rate)| ti * rate)
        .collect();
    let federal_income_tax: Series = taxable_income
        .iter()
        .zip(&state_income_tax)
        .zip(federal_rate)
        .map(|((ti, state), rate)| (ti - state) * rate)
        .collect();

    Ok(IncomeTax {
        state_income_tax,
        federal_income_tax,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_federal_applies_after_state() {
        let tax = income_tax(&[dec!(1000), dec!(0)], &[dec!(0.05); 2], &[dec!(0.21); 2]).unwrap();
        assert_eq!(tax.state_income_tax, vec![dec!(50), dec!(0)]);
        assert_eq!(tax.federal_income_tax, vec![dec!(199.5), dec!(0)]);
    }

    #[test]
    fn test_negative_income_is_not_floored() {
        let tax = income_tax(&[dec!(-100)], &[dec!(0.1)], &[dec!(0.2)]).unwrap();
        assert_eq!(tax.state_income_tax, vec![dec!(-10)]);
        assert_eq!(tax.federal_income_tax, vec![dec!(-18)]);
    }

    #[test]
    fn test_rate_length_mismatch() {
        assert!(income_tax(&[dec!(1), dec!(2)], &[dec!(0.1)], &[dec!(0.1); 2]).is_err());
    }
}
