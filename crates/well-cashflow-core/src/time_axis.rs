use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::types::{Money, Series};
use crate::EngineResult;

// ---------------------------------------------------------------------------
// Time axis
// ---------------------------------------------------------------------------

/// Shared monthly index for every series in a calculation.
///
/// Offsets are whole months relative to the as-of month (offset 0 = as-of
/// date) and increase by exactly one between neighbours. The axis is never
/// empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<i64>", into = "Vec<i64>")]
pub struct TimeAxis {
    t_all: Vec<i64>,
}

#[allow(clippy::len_without_is_empty)]
impl TimeAxis {
    /// Inclusive range of month offsets `start..=end`.
    pub fn new(start: i64, end: i64) -> EngineResult<Self> {
        if end < start {
            return Err(EngineError::InvalidInput {
                field: "time_axis".into(),
                reason: format!("end offset {end} precedes start offset {start}"),
            });
        }
        Ok(Self {
            t_all: (start..=end).collect(),
        })
    }

    /// Axis spanning the cash-flow window, expressed relative to the as-of month.
    pub fn from_dates(
        as_of_date: NaiveDate,
        cf_start_date: NaiveDate,
        cf_end_date: NaiveDate,
    ) -> EngineResult<Self> {
        Self::new(
            months_between(as_of_date, cf_start_date),
            months_between(as_of_date, cf_end_date),
        )
    }

    /// Validate an externally built offset vector.
    pub fn try_from_offsets(t_all: Vec<i64>) -> EngineResult<Self> {
        if t_all.is_empty() {
            return Err(EngineError::InvalidInput {
                field: "time_axis".into(),
                reason: "time axis must contain at least one month".into(),
            });
        }
        if let Some(w) = t_all.windows(2).find(|w| w[1] - w[0] != 1) {
            return Err(EngineError::InvalidInput {
                field: "time_axis".into(),
                reason: format!("offsets must increase by one month, found {} -> {}", w[0], w[1]),
            });
        }
        Ok(Self { t_all })
    }

    pub fn offsets(&self) -> &[i64] {
        &self.t_all
    }

    pub fn len(&self) -> usize {
        self.t_all.len()
    }

    pub fn start(&self) -> i64 {
        self.t_all[0]
    }

    pub fn last(&self) -> i64 {
        self.t_all[self.t_all.len() - 1]
    }

    /// Index of a month offset, if it falls on the axis.
    pub fn index_of(&self, offset: i64) -> Option<usize> {
        if offset < self.start() || offset > self.last() {
            None
        } else {
            Some((offset - self.start()) as usize)
        }
    }

    /// Index of a month offset, clamped to the first/last axis month.
    pub fn clamped_index(&self, offset: i64) -> usize {
        let clamped = offset.clamp(self.start(), self.last());
        (clamped - self.start()) as usize
    }

    pub fn zeros(&self) -> Series {
        vec![Decimal::ZERO; self.len()]
    }

    /// Calendar date (first of month) of the axis month at `index`.
    pub fn date_at(&self, as_of_date: NaiveDate, index: usize) -> EngineResult<NaiveDate> {
        let offset = self.t_all.get(index).copied().ok_or_else(|| {
            EngineError::InvalidInput {
                field: "time_axis".into(),
                reason: format!("index {index} is beyond the last month"),
            }
        })?;
        add_months(first_of_month(as_of_date), offset)
    }

    /// Reject a series that is not exactly one value per axis month.
    pub fn check_len(&self, series_name: &str, series: &[Decimal]) -> EngineResult<()> {
        if series.len() != self.len() {
            return Err(EngineError::LengthMismatch {
                series: series_name.to_string(),
                expected: self.len(),
                actual: series.len(),
            });
        }
        Ok(())
    }
}

impl TryFrom<Vec<i64>> for TimeAxis {
    type Error = EngineError;

    fn try_from(t_all: Vec<i64>) -> Result<Self, Self::Error> {
        Self::try_from_offsets(t_all)
    }
}

impl From<TimeAxis> for Vec<i64> {
    fn from(axis: TimeAxis) -> Self {
        axis.t_all
    }
}

/// Key dates of a calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateContext {
    /// Offset 0 of the time axis
    pub as_of_date: NaiveDate,
    pub cf_start_date: NaiveDate,
    pub cf_end_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_production_date: Option<NaiveDate>,
}

impl DateContext {
    pub fn time_axis(&self) -> EngineResult<TimeAxis> {
        TimeAxis::from_dates(self.as_of_date, self.cf_start_date, self.cf_end_date)
    }
}

// ---------------------------------------------------------------------------
// Alignment
// ---------------------------------------------------------------------------

/// Place a per-investment series that begins at month `series_start` onto the
/// axis.
///
/// Months before the axis start are dropped. Months past the axis end are
/// summed into the final axis month. The result always has `axis.len()`
/// entries.
pub fn align_to_axis(series: &[Money], series_start: i64, axis: &TimeAxis) -> Series {
    let mut aligned = axis.zeros();
    let last = aligned.len() - 1;
    for (k, value) in series.iter().enumerate() {
        let offset = series_start + k as i64;
        if offset < axis.start() {
            continue;
        }
        let idx = ((offset - axis.start()) as usize).min(last);
        aligned[idx] += *value;
    }
    aligned
}

/// A single amount at month `offset`, zero elsewhere.
pub fn place_at(amount: Money, offset: i64, axis: &TimeAxis) -> Series {
    align_to_axis(&[amount], offset, axis)
}

// ---------------------------------------------------------------------------
// Arithmetic helpers
// ---------------------------------------------------------------------------

/// Division returning `fallback` when the denominator is zero.
pub fn safe_divide(numerator: Decimal, denominator: Decimal, fallback: Decimal) -> Decimal {
    if denominator.is_zero() {
        fallback
    } else {
        numerator / denominator
    }
}

pub fn add_series(a: &[Decimal], b: &[Decimal]) -> Series {
    a.iter().zip(b).map(|(x, y)| x + y).collect()
}

pub fn sub_series(a: &[Decimal], b: &[Decimal]) -> Series {
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}

pub fn max_series(a: &[Decimal], b: &[Decimal]) -> Series {
    a.iter().zip(b).map(|(x, y)| (*x).max(*y)).collect()
}

/// Sum any number of equally long series; `len` zeros when none are given.
pub fn sum_series<'a, I>(len: usize, series: I) -> Series
where
    I: IntoIterator<Item = &'a [Decimal]>,
{
    let mut total = vec![Decimal::ZERO; len];
    for s in series {
        for (t, v) in total.iter_mut().zip(s) {
            *t += *v;
        }
    }
    total
}

// ---------------------------------------------------------------------------
// Calendar helpers
// ---------------------------------------------------------------------------

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Shift a date by a signed number of calendar months.
pub fn add_months(date: NaiveDate, months: i64) -> EngineResult<NaiveDate> {
    let magnitude = u32::try_from(months.unsigned_abs())
        .map_err(|_| EngineError::DateError(format!("month shift {months} out of range")))?;
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(magnitude))
    } else {
        date.checked_sub_months(Months::new(magnitude))
    };
    shifted.ok_or_else(|| EngineError::DateError(format!("{date} shifted by {months} months")))
}

/// Whole calendar months from `from` to `to` (days ignored).
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to.year() as i64 - from.year() as i64) * 12 + to.month() as i64 - from.month() as i64
}
