//! Renderers for command results. Every command hands back the JSON form of
//! a `ComputationOutput` envelope (or a bare value for `version`-like output);
//! the formatters only ever see `serde_json::Value`.

pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Render `value` to stdout in the requested format.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// `result` of an envelope, or the value itself when it is not one.
pub(crate) fn result_of(value: &Value) -> &Value {
    value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_of_unwraps_envelope() {
        let env = json!({ "result": { "recommended_investment": "1" }, "warnings": [] });
        assert_eq!(result_of(&env), &json!({ "recommended_investment": "1" }));
        let bare = json!([1, 2]);
        assert_eq!(result_of(&bare), &bare);
    }
}
