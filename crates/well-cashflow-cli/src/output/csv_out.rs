use serde_json::Value;
use std::io;

use super::{frames, result_of, scalar};

/// Write monthly rows as CSV to stdout.
///
/// When the result holds several frames (BFIT and AFIT), a leading `frame`
/// column names the one each row belongs to.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = result_of(value);
    let frames = frames(result);

    if frames.is_empty() {
        let _ = wtr.write_record(["field", "value"]);
        if let Value::Object(map) = result {
            for (key, val) in map {
                let _ = wtr.write_record([key.as_str(), &scalar(val)]);
            }
        }
    } else if frames.len() == 1 {
        let frame = &frames[0];
        let _ = wtr.write_record(frame.headers());
        for i in 0..frame.rows() {
            let _ = wtr.write_record(frame.row(i));
        }
    } else {
        for (n, frame) in frames.iter().enumerate() {
            let name = frame.name.unwrap_or_default();
            // Frames have different columns, so each gets its own header row.
            if n > 0 {
                let _ = wtr.flush();
                println!();
            }
            let mut header = vec!["frame"];
            header.extend(frame.headers());
            let _ = wtr.write_record(&header);
            for i in 0..frame.rows() {
                let mut row = vec![name.to_string()];
                row.extend(frame.row(i));
                let _ = wtr.write_record(&row);
            }
        }
    }

    let _ = wtr.flush();
}
