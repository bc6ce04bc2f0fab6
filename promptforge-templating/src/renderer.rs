//! Template rendering with default fallback
//!
//! Rendering substitutes `{{name}}` placeholders in a single pass over the
//! original content. Each placeholder resolves against the prompt's variable
//! set: a supplied non-empty value wins, then a non-empty default, and
//! otherwise the placeholder is preserved literally so the reader can see
//! what is still missing. Names that are not part of the variable set are
//! never touched, even when a value was supplied for them.
//!
//! Because substitution happens in one pass, inserted values are never
//! re-scanned. A value of `{{other}}` lands in the output as those exact
//! characters regardless of whether `other` is a defined variable.

use crate::extractor::NamePolicy;
use std::collections::HashMap;

/// The renderer's view of one variable definition
///
/// Carries exactly what resolution needs: the name and an optional default.
/// Richer variable metadata (kind, help text, validation pattern) lives with
/// the owning prompt and does not participate in rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateVariable {
    /// Placeholder name as it appears between braces
    pub name: String,
    /// Fallback used when no value is supplied
    pub default_value: Option<String>,
}

impl TemplateVariable {
    /// A variable with no default
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_value: None,
        }
    }

    /// Attach a default value
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default_value = Some(default.into());
        self
    }
}

/// Render content by substituting placeholders for the given variables
///
/// Resolution order per placeholder: supplied non-empty value, then
/// non-empty default, then the literal placeholder unchanged.
///
/// # Examples
///
/// ```rust
/// use promptforge_templating::{render, TemplateVariable};
/// use std::collections::HashMap;
///
/// let variables = vec![
///     TemplateVariable::new("name"),
///     TemplateVariable::new("age").with_default("30"),
/// ];
/// let mut values = HashMap::new();
/// values.insert("name".to_string(), "Ada".to_string());
///
/// let out = render("Hi {{name}}, you are {{age}}", &variables, &values);
/// assert_eq!(out, "Hi Ada, you are 30");
/// ```
pub fn render(
    content: &str,
    variables: &[TemplateVariable],
    values: &HashMap<String, String>,
) -> String {
    if content.is_empty() {
        return String::new();
    }

    let by_name: HashMap<&str, &TemplateVariable> =
        variables.iter().map(|v| (v.name.as_str(), v)).collect();

    // Scan with the relaxed charset so hyphenated names resolve too; the
    // variable set decides what actually gets substituted.
    NamePolicy::Relaxed
        .placeholder_regex()
        .replace_all(content, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            match by_name.get(name) {
                Some(variable) => resolve(caps[0].to_string(), variable, values.get(name)),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn resolve(
    placeholder: String,
    variable: &TemplateVariable,
    supplied: Option<&String>,
) -> String {
    if let Some(value) = supplied {
        if !value.is_empty() {
            return value.clone();
        }
    }
    if let Some(default) = &variable.default_value {
        if !default.is_empty() {
            return default.clone();
        }
    }
    placeholder
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_supplied_value_wins() {
        let vars = vec![TemplateVariable::new("name").with_default("stranger")];
        let out = render("Hello {{name}}!", &vars, &values(&[("name", "Ada")]));
        assert_eq!(out, "Hello Ada!");
    }

    #[test]
    fn test_default_used_when_value_missing() {
        let vars = vec![TemplateVariable::new("name").with_default("stranger")];
        let out = render("Hello {{name}}!", &vars, &HashMap::new());
        assert_eq!(out, "Hello stranger!");
    }

    #[test]
    fn test_empty_value_falls_back_to_default() {
        let vars = vec![TemplateVariable::new("name").with_default("stranger")];
        let out = render("Hello {{name}}!", &vars, &values(&[("name", "")]));
        assert_eq!(out, "Hello stranger!");
    }

    #[test]
    fn test_placeholder_preserved_when_nothing_resolves() {
        let vars = vec![TemplateVariable::new("name")];
        let out = render("Hello {{name}}!", &vars, &HashMap::new());
        assert_eq!(out, "Hello {{name}}!");
    }

    #[test]
    fn test_empty_default_does_not_resolve() {
        let vars = vec![TemplateVariable::new("name").with_default("")];
        let out = render("Hello {{name}}!", &vars, &HashMap::new());
        assert_eq!(out, "Hello {{name}}!");
    }

    #[test]
    fn test_undefined_names_stay_literal_even_with_value() {
        // A value without a variable definition does nothing
        let out = render("{{mystery}}", &[], &values(&[("mystery", "spoiled")]));
        assert_eq!(out, "{{mystery}}");
    }

    #[test]
    fn test_all_occurrences_replaced() {
        let vars = vec![TemplateVariable::new("x")];
        let out = render("{{x}} {{x}} {{x}}", &vars, &values(&[("x", "7")]));
        assert_eq!(out, "7 7 7");
    }

    #[test]
    fn test_no_recursive_expansion() {
        let vars = vec![
            TemplateVariable::new("outer"),
            TemplateVariable::new("inner").with_default("INNER"),
        ];
        let out = render(
            "{{outer}} and {{inner}}",
            &vars,
            &values(&[("outer", "{{inner}}")]),
        );
        assert_eq!(out, "{{inner}} and INNER");
    }

    #[test]
    fn test_dollar_signs_in_values_are_literal() {
        let vars = vec![TemplateVariable::new("amount")];
        let out = render("Pay {{amount}}", &vars, &values(&[("amount", "$100 or $1")]));
        assert_eq!(out, "Pay $100 or $1");
    }

    #[test]
    fn test_hyphenated_names_resolve() {
        let vars = vec![TemplateVariable::new("user-name")];
        let out = render("Hi {{user-name}}", &vars, &values(&[("user-name", "Ada")]));
        assert_eq!(out, "Hi Ada");
    }

    #[test]
    fn test_empty_content_renders_empty() {
        let vars = vec![TemplateVariable::new("name")];
        assert_eq!(render("", &vars, &HashMap::new()), "");
    }

    #[test]
    fn test_mixed_resolution_in_one_pass() {
        let vars = vec![
            TemplateVariable::new("a"),
            TemplateVariable::new("b").with_default("B"),
            TemplateVariable::new("c"),
        ];
        let out = render("{{a}}-{{b}}-{{c}}-{{d}}", &vars, &values(&[("a", "A")]));
        assert_eq!(out, "A-B-{{c}}-{{d}}");
    }

    #[test]
    fn test_content_without_placeholders_unchanged() {
        let vars = vec![TemplateVariable::new("name")];
        let content = "No placeholders here, just braces { } and {{ spaced }}.";
        assert_eq!(render(content, &vars, &HashMap::new()), content);
    }
}
