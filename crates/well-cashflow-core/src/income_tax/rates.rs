use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::time_axis::{first_of_month, TimeAxis};
use crate::types::{Rate, Series};
use crate::EngineResult;

/// Rate effective from the month of `start_date` until the next row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatedRate {
    pub start_date: NaiveDate,
    pub rate: Rate,
}

/// How a state or federal income tax rate is stated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaxRateSchedule {
    /// Same rate for the whole well life
    Flat { rate: Rate },
    /// Step schedule by calendar date; months before the first row are untaxed
    Dated { rows: Vec<DatedRate> },
    /// Already resolved monthly series
    Monthly { rates: Series },
}

impl Default for TaxRateSchedule {
    fn default() -> Self {
        TaxRateSchedule::Flat {
            rate: Decimal::ZERO,
        }
    }
}

impl TaxRateSchedule {
    /// One rate per axis month.
    pub fn resolve(&self, field: &str, axis: &TimeAxis, as_of_date: NaiveDate) -> EngineResult<Series> {
        let rates = match self {
            TaxRateSchedule::Flat { rate } => vec![*rate; axis.len()],
            TaxRateSchedule::Monthly { rates } => {
                axis.check_len(field, rates)?;
                rates.clone()
            }
            TaxRateSchedule::Dated { rows } => {
                let mut rows: Vec<&DatedRate> = rows.iter().collect();
                rows.sort_by_key(|r| r.start_date);
                (0..axis.len())
                    .map(|i| {
                        let month = axis.date_at(as_of_date, i)?;
                        Ok(rows
                            .iter()
                            .rev()
                            .find(|r| first_of_month(r.start_date) <= month)
                            .map(|r| r.rate)
                            .unwrap_or(Decimal::ZERO))
                    })
                    .collect::<EngineResult<Series>>()?
            }
        };

        if let Some(bad) = rates.iter().find(|r| **r < Decimal::ZERO || **r > Decimal::ONE) {
            return Err(EngineError::InvalidInput {
                field: field.to_string(),
                reason: format!("Rate {bad} must be between 0 and 1"),
            });
        }
        Ok(rates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_flat_schedule() {
        let axis = TimeAxis::new(0, 2).unwrap();
        let rates = TaxRateSchedule::Flat { rate: dec!(0.21) }
            .resolve("federal", &axis, date(2020, 1, 1))
            .unwrap();
        assert_eq!(rates, vec![dec!(0.21); 3]);
    }

    #[test]
    fn test_dated_schedule_steps_by_month() {
        let axis = TimeAxis::new(0, 3).unwrap();
        let schedule = TaxRateSchedule::Dated {
            rows: vec![
                DatedRate { start_date: date(2017, 12, 15), rate: dec!(0.21) },
                DatedRate { start_date: date(2017, 11, 1), rate: dec!(0.35) },
            ],
        };
        let rates = schedule.resolve("federal", &axis, date(2017, 10, 20)).unwrap();
        assert_eq!(rates, vec![dec!(0), dec!(0.35), dec!(0.21), dec!(0.21)]);
    }

    #[test]
    fn test_monthly_schedule_length_checked() {
        let axis = TimeAxis::new(0, 3).unwrap();
        let schedule = TaxRateSchedule::Monthly { rates: vec![dec!(0.05); 2] };
        assert!(matches!(
            schedule.resolve("state", &axis, date(2020, 1, 1)),
            Err(EngineError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_rate_outside_unit_interval_rejected() {
        let axis = TimeAxis::new(0, 0).unwrap();
        let schedule = TaxRateSchedule::Flat { rate: dec!(21) };
        assert!(matches!(
            schedule.resolve("federal", &axis, date(2020, 1, 1)),
            Err(EngineError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_parse_schedule() {
        let schedule: TaxRateSchedule =
            serde_json::from_str(r#"{"type": "flat", "rate": "0.046"}"#).unwrap();
        assert_eq!(schedule, TaxRateSchedule::Flat { rate: dec!(0.046) });
    }
}
