//! Variable references inside selectors and resource argument templates.
//!
//! A reference is `$name` or `${name}`, where `name` is made of ASCII
//! letters, digits and underscores.

use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::OnceLock;

fn variable_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z0-9_]+)\}|\$([A-Za-z0-9_]+)").expect("variable regex is valid")
    })
}

fn captured_name<'t>(caps: &Captures<'t>) -> &'t str {
    caps.get(1)
        .or_else(|| caps.get(2))
        .map_or("", |m| m.as_str())
}

/// Returns the variable names referenced by `template`, first occurrence
/// first, without duplicates.
#[must_use]
pub fn extract_variables(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in variable_regex().captures_iter(template) {
        let name = captured_name(&caps);
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Returns true if `template` contains at least one variable reference.
#[must_use]
pub fn has_variables(template: &str) -> bool {
    variable_regex().is_match(template)
}

/// Replaces every variable reference in `template` with the text returned
/// by `resolve`. Stops at the first resolution failure.
///
/// # Errors
///
/// Returns the first error produced by `resolve`.
pub fn substitute<E, F>(template: &str, mut resolve: F) -> Result<String, E>
where
    F: FnMut(&str) -> Result<String, E>,
{
    let re = variable_regex();
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for caps in re.captures_iter(template) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&template[last..whole.start()]);
        out.push_str(&resolve(captured_name(&caps))?);
        last = whole.end();
    }
    out.push_str(&template[last..]);

    Ok(out)
}

/// Renders a value the way it is spliced into a template: strings verbatim,
/// `null` as nothing, everything else as compact JSON.
#[must_use]
pub fn value_as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_extract_both_forms() {
        assert_eq!(extract_variables("$id"), vec!["id"]);
        assert_eq!(extract_variables("${id}-x"), vec!["id"]);
        assert_eq!(
            extract_variables("div[data-id=\"$id\"] .${kind}_label $id"),
            vec!["id", "kind"]
        );
    }

    #[test]
    fn test_extract_none() {
        assert!(extract_variables(".titleColumn a").is_empty());
        assert!(extract_variables("price in $").is_empty());
        assert!(!has_variables("a[href$='.pdf']"));
        assert!(has_variables("tr:nth-child($row)"));
    }

    #[test]
    fn test_substitute() {
        let values: HashMap<&str, &str> = [("id", "tt001"), ("lang", "en")].into_iter().collect();

        let out: Result<String, String> = substitute("/title/$id?hl=${lang}", |name| {
            values
                .get(name)
                .map(|v| (*v).to_string())
                .ok_or_else(|| name.to_string())
        });

        assert_eq!(out.unwrap(), "/title/tt001?hl=en");
    }

    #[test]
    fn test_substitute_propagates_error() {
        let out: Result<String, String> = substitute("$known-$missing", |name| {
            if name == "known" {
                Ok("k".to_string())
            } else {
                Err(name.to_string())
            }
        });

        assert_eq!(out.unwrap_err(), "missing");
    }

    #[test]
    fn test_value_as_text() {
        assert_eq!(value_as_text(&Value::String("tt001".into())), "tt001");
        assert_eq!(value_as_text(&Value::Null), "");
        assert_eq!(value_as_text(&serde_json::json!(42)), "42");
        assert_eq!(value_as_text(&serde_json::json!(true)), "true");
    }
}
