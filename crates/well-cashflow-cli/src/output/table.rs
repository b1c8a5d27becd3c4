use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::{frames, result_of, scalar};

/// One row per month for every cash-flow frame, then warnings and methodology.
pub fn print_table(value: &Value) {
    let result = result_of(value);
    let frames = frames(result);

    if frames.is_empty() {
        print_flat_object(result);
    }
    for frame in &frames {
        if let Some(name) = frame.name {
            println!("\n{}", name);
        }
        let mut builder = Builder::default();
        builder.push_record(frame.headers());
        for i in 0..frame.rows() {
            builder.push_record(frame.row(i));
        }
        println!("{}", Table::from(builder));
    }

    let Value::Object(envelope) = value else {
        return;
    };
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }
    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_flat_object(value: &Value) {
    match value {
        Value::Object(map) => {
            let mut builder = Builder::default();
            builder.push_record(["Field", "Value"]);
            for (key, val) in map {
                builder.push_record([key.as_str(), &format_value(val)]);
            }
            println!("{}", Table::from(builder));
        }
        _ => println!("{}", value),
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Array(arr) => arr.iter().map(format_value).collect::<Vec<_>>().join(", "),
        Value::Null => "null".to_string(),
        _ => scalar(value),
    }
}
