use serde_json::Value;

/// Key answers in priority order. Nested sections are searched after the
/// top level, so `recommendation.recommended_investment` is found for a deal
/// analysis.
const PRIORITY_KEYS: &[&str] = &[
    "recommended_investment",
    "max_investment",
    "irr",
    "npv",
    "moic",
    "final_multiplier",
    "ranking",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    let result_obj = super::result_of(value);

    if let Some(answer) = find_answer(result_obj) {
        println!("{}", format_minimal(answer));
        return;
    }

    if let Value::Object(map) = result_obj {
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn find_answer(value: &Value) -> Option<&Value> {
    let map = value.as_object()?;
    for key in PRIORITY_KEYS {
        if let Some(val) = map.get(*key).filter(|v| !v.is_null()) {
            return Some(val);
        }
    }
    map.values().filter(|v| v.is_object()).find_map(find_answer)
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => arr.iter().map(format_minimal).collect::<Vec<_>>().join(","),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
