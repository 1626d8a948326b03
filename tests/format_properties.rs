use std::collections::HashMap;

use proptest::prelude::*;
use tfrunner::vars::{Value, format_var_args, quote, render_tfvars, to_literal};

// Undo `quote`: strip the outer quotes and resolve the four escapes.
fn unquote(quoted: &str) -> Option<String> {
    let inner = quoted.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            _ => return None,
        }
    }
    Some(out)
}

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        any::<u64>().prop_map(Value::UInt),
        any::<f64>().prop_map(Value::Float),
        ".*".prop_map(Value::String),
    ]
}

fn value() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
            proptest::collection::hash_map("[a-z_]{1,6}", inner, 0..4).prop_map(Value::Map),
        ]
    })
}

fn var_map() -> impl Strategy<Value = HashMap<String, Value>> {
    proptest::collection::hash_map("[a-z][a-z0-9_]{0,8}", value(), 0..6)
}

proptest! {
    #[test]
    fn quote_round_trips(s in ".*") {
        let quoted = quote(&s);
        prop_assert!(!quoted.contains('\n'));
        prop_assert_eq!(unquote(&quoted), Some(s));
    }

    #[test]
    fn var_args_do_not_depend_on_insertion_order(vars in var_map()) {
        let mut entries: Vec<(String, Value)> = vars.clone().into_iter().collect();
        entries.reverse();
        let rebuilt: HashMap<String, Value> = entries.into_iter().collect();

        prop_assert_eq!(format_var_args(&vars), format_var_args(&rebuilt));
    }

    #[test]
    fn var_args_are_flag_pairs_in_key_order(vars in var_map()) {
        let args = format_var_args(&vars);
        prop_assert_eq!(args.len(), vars.len() * 2);

        let names: Vec<&str> = args
            .chunks(2)
            .map(|pair| {
                assert_eq!(pair[0], "-var");
                pair[1].split_once('=').map(|(name, _)| name).unwrap_or("")
            })
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        prop_assert_eq!(names, sorted);
    }

    #[test]
    fn map_literal_lists_keys_sorted(map in proptest::collection::hash_map("[a-z]{1,6}", any::<i64>(), 1..8)) {
        let literal = to_literal(&Value::from(map.clone()));

        let mut keys: Vec<&String> = map.keys().collect();
        keys.sort();
        let expected: Vec<String> = keys.iter().map(|k| format!("{} = {}", k, map[*k])).collect();
        prop_assert_eq!(literal, format!("{{{}}}", expected.join(", ")));
    }

    #[test]
    fn finite_floats_never_use_exponents(f in any::<f64>().prop_filter("finite", |f| f.is_finite())) {
        let literal = to_literal(&Value::Float(f));
        prop_assert!(!literal.contains('e'), "{}", literal);
        prop_assert_eq!(literal.parse::<f64>().ok(), Some(f));
    }

    #[test]
    fn tfvars_has_one_line_per_variable(vars in var_map()) {
        let rendered = render_tfvars(&vars);
        prop_assert_eq!(rendered.lines().count(), vars.len());
    }
}
