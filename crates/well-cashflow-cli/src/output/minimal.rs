use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use super::{frames, result_of, scalar};

/// Series whose total is the headline answer, in order of priority.
const PRIORITY_SERIES: [&str; 5] = [
    "afit_cf",
    "bfit_cf",
    "taxable_income",
    "total_deductions",
    "federal_income_tax",
];

/// Print the undiscounted total of the headline series.
pub fn print_minimal(value: &Value) {
    let result = result_of(value);
    let frames = frames(result);

    for key in PRIORITY_SERIES {
        for frame in &frames {
            if let Some((_, series)) = frame.columns.iter().find(|(k, _)| *k == key) {
                match total(series) {
                    Some(sum) => println!("{}: {}", key, sum.normalize()),
                    None => println!("{}: {}", key, scalar(&Value::Array(series.to_vec()))),
                }
                return;
            }
        }
    }

    println!("{}", scalar(result));
}

/// Sum of a decimal series serialized as strings or numbers.
fn total(series: &[Value]) -> Option<Decimal> {
    series
        .iter()
        .map(|v| match v {
            Value::String(s) => Decimal::from_str(s).ok(),
            Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
            _ => None,
        })
        .sum()
}
