//! Variable extraction from prompt content
//!
//! Prompt content references variables as `{{name}}` placeholders. This
//! module scans content and returns the distinct variable names in order of
//! first appearance. Extraction is pure: the same content always yields the
//! same names, and scanning never modifies or caches anything.
//!
//! The placeholder grammar is deliberately rigid. Braces must hug the name
//! with no interior whitespace, and a name consisting only of digits is not
//! a variable at all. Text that fails to match is left alone rather than
//! reported as an error; `{{}}`, `{{ name }}`, and `{{not valid}}` are all
//! just literal text.

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches `{{name}}` where name uses the standard variable charset
static STRICT_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([A-Za-z0-9_]+)\}\}").unwrap());

/// Matches `{{name}}` where name may also contain hyphens
///
/// AI-suggested variable names frequently arrive hyphenated, so rendering
/// and suggestion intake scan with this wider charset.
static RELAXED_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([A-Za-z0-9_-]+)\}\}").unwrap());

static STRICT_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+$").unwrap());
static RELAXED_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Which variable-name charset applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamePolicy {
    /// Letters, digits, underscores
    #[default]
    Strict,
    /// Letters, digits, underscores, hyphens
    Relaxed,
}

impl NamePolicy {
    pub(crate) fn placeholder_regex(&self) -> &'static Regex {
        match self {
            NamePolicy::Strict => &STRICT_PLACEHOLDER,
            NamePolicy::Relaxed => &RELAXED_PLACEHOLDER,
        }
    }

    fn name_regex(&self) -> &'static Regex {
        match self {
            NamePolicy::Strict => &STRICT_NAME,
            NamePolicy::Relaxed => &RELAXED_NAME,
        }
    }
}

/// True if `name` is a legal variable name under the policy
///
/// Digits-only names are rejected under every policy: `123` is literal
/// text, not a variable, no matter where it appears.
pub fn is_valid_variable_name(name: &str, policy: NamePolicy) -> bool {
    policy.name_regex().is_match(name) && !is_digits_only(name)
}

fn is_digits_only(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_digit())
}

/// Extract distinct variable names from content, in order of first appearance
///
/// # Examples
///
/// ```rust
/// use promptforge_templating::extract_variables;
///
/// let names = extract_variables("Hi {{name}}, you are {{age}}. Bye {{name}}!");
/// assert_eq!(names, vec!["name", "age"]);
/// ```
pub fn extract_variables(content: &str) -> Vec<String> {
    extract_with(content, NamePolicy::Strict)
}

/// Extract distinct variable names, also accepting hyphenated names
pub fn extract_variables_relaxed(content: &str) -> Vec<String> {
    extract_with(content, NamePolicy::Relaxed)
}

fn extract_with(content: &str, policy: NamePolicy) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut names = Vec::new();

    for cap in policy.placeholder_regex().captures_iter(content) {
        let name = &cap[1];
        if is_digits_only(name) {
            continue;
        }
        if seen.insert(name.to_string()) {
            names.push(name.to_string());
        }
    }

    names
}
