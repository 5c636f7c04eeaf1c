use serde_json::Value;

use super::plain;

/// Key answer fields in order of priority, as dotted paths into the result.
const PRIORITY_PATHS: &[&str] = &[
    "display.total_payment",
    "extra_down_payment_delta.return_on_extra_capital",
    "cheapest",
    "total_paid",
    "base_case_value",
    "tier",
];

/// Print just the key answer value from the output.
///
/// Looks up well-known result fields in order of priority, then falls back
/// to the first field in the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    for path in PRIORITY_PATHS {
        if let Some(val) = lookup(result_obj, path) {
            if !val.is_null() {
                println!("{}", plain(val));
                return;
            }
        }
    }

    if let Value::Object(map) = result_obj {
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, plain(val));
            return;
        }
    }

    println!("{}", plain(result_obj));
}

fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |v, key| v.get(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_dotted_path() {
        let v = json!({ "display": { "total_payment": "1693" } });
        assert_eq!(lookup(&v, "display.total_payment"), Some(&json!("1693")));
        assert_eq!(lookup(&v, "display.missing"), None);
    }
}
