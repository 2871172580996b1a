use serde_json::Value;
use std::io;

/// Write output as CSV to stdout.
///
/// Row lists are preferred: a bare array, or the result's `cash_flows`,
/// `quotes` or point list. Otherwise the result's scalar fields are written
/// as `field,value` pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = super::result_of(value);

    match result {
        Value::Array(rows) => write_rows(&mut wtr, rows),
        Value::Object(map) => {
            let rows = ["cash_flows", "quotes", "years"]
                .iter()
                .find_map(|k| map.get(*k).and_then(Value::as_array));
            match rows {
                Some(rows) => write_rows(&mut wtr, rows),
                None => {
                    let _ = wtr.write_record(["field", "value"]);
                    for (key, val) in map.iter().filter(|(_, v)| !v.is_object()) {
                        let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
                    }
                }
            }
        }
        _ => {
            let _ = wtr.write_record([&format_csv_value(result)]);
        }
    }

    let _ = wtr.flush();
}

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
        return;
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    let _ = wtr.write_record(&headers);
    for map in arr.iter().filter_map(Value::as_object) {
        let row: Vec<String> = headers
            .iter()
            .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
            .collect();
        let _ = wtr.write_record(&row);
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
