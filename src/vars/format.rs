// src/vars/format.rs

//! Rendering of [`Value`] trees into the tool's literal syntax.
//!
//! Formatting is total: every value has a rendering, and the output is a pure
//! function of the input tree.

use std::collections::HashMap;

use super::Value;

/// Flag that precedes each `name=literal` pair on the command line.
pub const VAR_FLAG: &str = "-var";

/// Convert a variable map into `["-var", "a=1", "-var", "b=\"x\""]`.
///
/// Keys are visited in sorted order so the argument vector is identical for
/// identical maps, whatever their native iteration order.
pub fn format_var_args(vars: &HashMap<String, Value>) -> Vec<String> {
    let mut keys: Vec<&String> = vars.keys().collect();
    keys.sort();

    let mut args = Vec::with_capacity(keys.len() * 2);
    for key in keys {
        args.push(VAR_FLAG.to_string());
        args.push(format!("{}={}", key, to_literal(&vars[key])));
    }
    args
}

/// Render a single value.
pub fn to_literal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::UInt(u) => u.to_string(),
        Value::Float(f) => format_float(*f),
        Value::String(s) => quote(s),
        Value::List(items) => format_list(items),
        Value::Map(map) => format_map(map),
        Value::Opaque(text) => quote(text),
    }
}

/// Quote a string, escaping backslash, double quote, newline and tab.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

// `Display` for f64 is the shortest round-trip decimal and never uses
// exponent notation, so 1.50 prints as "1.5" and 1.0 as "1".
// NaN and the infinities have no literal form and are quoted.
fn format_float(f: f64) -> String {
    if f.is_finite() {
        format!("{f}")
    } else {
        quote(&f.to_string())
    }
}

fn format_list(items: &[Value]) -> String {
    let elements: Vec<String> = items.iter().map(to_literal).collect();
    format!("[{}]", elements.join(", "))
}

fn format_map(map: &HashMap<String, Value>) -> String {
    if map.is_empty() {
        return "{}".to_string();
    }

    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();

    let pairs: Vec<String> = keys
        .into_iter()
        .map(|k| format!("{} = {}", k, to_literal(&map[k])))
        .collect();
    format!("{{{}}}", pairs.join(", "))
}
