//! Immutable configuration snapshots.

use std::collections::BTreeMap;

/// An immutable snapshot of contextualization variables.
///
/// The derivation core never reads the process environment directly;
/// callers capture a snapshot once and pass it into each operation, so
/// every computation works from one consistent view of the configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Env {
    vars: BTreeMap<String, String>,
}

impl Env {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures a snapshot of the current process environment.
    pub fn capture() -> Self {
        std::env::vars().collect()
    }

    /// Gets the value of a variable, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Gets the value of a variable, returning the default if not present.
    pub fn get_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get(name).unwrap_or(default)
    }

    /// Checks if a variable exists.
    pub fn has(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Interprets a variable as a boolean toggle.
    ///
    /// `YES`, `TRUE` and `1` (case-insensitive) are true; anything else,
    /// including an absent variable, is false.
    pub fn get_bool(&self, name: &str) -> bool {
        matches!(
            self.get(name).map(str::trim),
            Some(v) if v.eq_ignore_ascii_case("YES")
                || v.eq_ignore_ascii_case("TRUE")
                || v == "1"
        )
    }

    /// Iterates over all variables in lexicographic name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the number of variables in the snapshot.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Returns true if the snapshot holds no variables.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl From<BTreeMap<String, String>> for Env {
    fn from(vars: BTreeMap<String, String>) -> Self {
        Env { vars }
    }
}

impl FromIterator<(String, String)> for Env {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Env {
            vars: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for Env {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        Env {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_get_and_default() {
        let env: Env = [("ETH0_IP", "10.0.0.1"), ("ETH0_MASK", "")].into_iter().collect();

        assert_eq!(env.get("ETH0_IP"), Some("10.0.0.1"));
        assert_eq!(env.get("ETH0_MASK"), Some(""));
        assert_eq!(env.get("ETH1_IP"), None);
        assert_eq!(env.get_or("ETH1_IP", "fallback"), "fallback");
        assert!(env.has("ETH0_MASK"));
        assert!(!env.has("ETH1_MASK"));
    }

    #[test]
    fn test_get_bool() {
        let env: Env = [
            ("A", "YES"),
            ("B", "yes"),
            ("C", "TRUE"),
            ("D", "1"),
            ("E", "NO"),
            ("F", ""),
        ]
        .into_iter()
        .collect();

        assert!(env.get_bool("A"));
        assert!(env.get_bool("B"));
        assert!(env.get_bool("C"));
        assert!(env.get_bool("D"));
        assert!(!env.get_bool("E"));
        assert!(!env.get_bool("F"));
        assert!(!env.get_bool("MISSING"));
    }

    #[test]
    fn test_iter_is_sorted() {
        let env: Env = [("B", "2"), ("A", "1")].into_iter().collect();
        let names: Vec<&str> = env.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["A", "B"]);
    }
}
