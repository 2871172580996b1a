use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Format output as tables: scalar fields first, then one table per nested
/// section or row list (cash flows, IRR targets, sensitivity points).
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(result) => print_envelope(result, map),
            None => print_sections(None, map),
        },
        Value::Array(arr) => print_rows(arr),
        _ => println!("{}", value),
    }
}

fn print_envelope(result: &Value, envelope: &Map<String, Value>) {
    match result {
        Value::Object(res_map) => print_sections(None, res_map),
        Value::Array(rows) => print_rows(rows),
        other => println!("{}", format_value(other)),
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_sections(title: Option<&str>, map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut scalars = 0;
    let mut nested: Vec<(&str, &Value)> = Vec::new();
    for (key, val) in map {
        if is_section(val) {
            nested.push((key.as_str(), val));
        } else {
            builder.push_record([key.as_str(), &format_value(val)]);
            scalars += 1;
        }
    }

    if let Some(t) = title {
        println!("\n{}", t);
    }
    if scalars > 0 {
        println!("{}", Table::from(builder));
    }

    for (key, val) in nested {
        let name = match title {
            Some(t) => format!("{t}.{key}"),
            None => key.to_string(),
        };
        match val {
            Value::Object(sub) => print_sections(Some(&name), sub),
            Value::Array(rows) => {
                println!("\n{}", name);
                print_rows(rows);
            }
            _ => {}
        }
    }
}

/// Objects and arrays of objects get their own table.
fn is_section(value: &Value) -> bool {
    match value {
        Value::Object(_) => true,
        Value::Array(arr) => arr.first().is_some_and(Value::is_object),
        _ => false,
    }
}

fn print_rows(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for map in arr.iter().filter_map(Value::as_object) {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                .collect();
            builder.push_record(row);
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => arr.iter().map(format_value).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
