pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};
use std::io::{self, Write};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

fn print_json(value: &Value) {
    let mut out = io::stdout().lock();
    let written = serde_json::to_writer_pretty(&mut out, value)
        .map_err(io::Error::from)
        .and_then(|_| writeln!(out));
    if let Err(e) = written {
        eprintln!("JSON serialization error: {}", e);
    }
}

/// A block of equally long monthly columns, e.g. a `bfit_cf_dict`.
pub struct Frame<'a> {
    pub name: Option<&'a str>,
    pub columns: Vec<(&'a str, &'a [Value])>,
}

impl Frame<'_> {
    pub fn rows(&self) -> usize {
        self.columns.iter().map(|(_, v)| v.len()).max().unwrap_or(0)
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|(k, _)| *k).collect()
    }

    pub fn row(&self, i: usize) -> Vec<String> {
        self.columns
            .iter()
            .map(|(_, v)| v.get(i).map(scalar).unwrap_or_default())
            .collect()
    }
}

/// The `result` object of a computation envelope, or the value itself.
pub fn result_of(value: &Value) -> &Value {
    value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value)
}

/// Columnar frames in a result: the result itself when every field is a
/// series, otherwise each nested object that is.
pub fn frames(result: &Value) -> Vec<Frame<'_>> {
    let Value::Object(map) = result else {
        return Vec::new();
    };
    if let Some(frame) = as_frame(None, map) {
        return vec![frame];
    }
    map.iter()
        .filter_map(|(key, v)| v.as_object().and_then(|m| as_frame(Some(key.as_str()), m)))
        .collect()
}

fn as_frame<'a>(name: Option<&'a str>, map: &'a Map<String, Value>) -> Option<Frame<'a>> {
    if map.is_empty() {
        return None;
    }
    let columns: Option<Vec<(&str, &[Value])>> = map
        .iter()
        .map(|(k, v)| v.as_array().map(|a| (k.as_str(), a.as_slice())))
        .collect();
    let mut columns = columns?;
    // Month offsets lead when present.
    columns.sort_by_key(|(k, _)| *k != "time");
    Some(Frame { name, columns })
}

pub fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
