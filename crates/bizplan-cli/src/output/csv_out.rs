use serde_json::{Map, Value};
use std::io;

use super::{flatten, format_scalar, is_record_array, result_of};

/// Write output as CSV to stdout.
///
/// The first record list in the result (monthly rows, sweep points,
/// trials) becomes the CSV body; otherwise a two-column field/value dump.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match result_of(value) {
        Value::Object(map) => {
            let records = map.values().find(|v| is_record_array(v));
            if let Some(Value::Array(arr)) = records {
                write_array_csv(&mut wtr, arr);
            } else {
                write_pairs(&mut wtr, map);
            }
        }
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        other => {
            let _ = wtr.write_record([&format_scalar(other)]);
        }
    }

    let _ = wtr.flush();
}

fn write_pairs(wtr: &mut csv::Writer<io::StdoutLock<'_>>, map: &Map<String, Value>) {
    let mut rows = Vec::new();
    flatten("", map, &mut rows);
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in rows {
        let _ = wtr.write_record([key.as_str(), &format_scalar(&val)]);
    }
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            let _ = wtr.write_record([&format_scalar(item)]);
        }
        return;
    };

    let mut first_rows = Vec::new();
    flatten("", first, &mut first_rows);
    let headers: Vec<String> = first_rows.into_iter().map(|(k, _)| k).collect();
    let _ = wtr.write_record(&headers);

    for item in arr {
        if let Value::Object(map) = item {
            let mut cells = Vec::new();
            flatten("", map, &mut cells);
            let row: Vec<String> = headers
                .iter()
                .map(|h| {
                    cells
                        .iter()
                        .find(|(k, _)| k == h)
                        .map(|(_, v)| format_scalar(v))
                        .unwrap_or_default()
                })
                .collect();
            let _ = wtr.write_record(&row);
        }
    }
}
