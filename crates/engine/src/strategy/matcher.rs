use crate::error::{ToggleError, ToggleErrorExt};
use regex::Regex;

/// Key/value pattern pair, each anchored to match the whole input.
#[derive(Debug, Clone)]
pub struct PropertyMatcher {
    key: Regex,
    value: Regex,
}

impl PropertyMatcher {
    /// Compiles both patterns.
    ///
    /// # Errors
    /// Returns [`ToggleError::Pattern`] when either pattern is not a valid regular expression.
    pub fn new(key: &str, value: &str) -> Result<Self, ToggleError> {
        Ok(Self {
            key: anchored(key).context(format!("property_key '{key}'"))?,
            value: anchored(value).context(format!("property_value '{value}'"))?,
        })
    }

    /// Builds a matcher only when both patterns are present and non-empty.
    pub(crate) fn optional(
        key: Option<&str>,
        value: Option<&str>,
    ) -> Result<Option<Self>, ToggleError> {
        match (key.filter(|k| !k.is_empty()), value.filter(|v| !v.is_empty())) {
            (Some(key), Some(value)) => Self::new(key, value).map(Some),
            _ => Ok(None),
        }
    }

    pub fn matches(&self, key: &str, value: &str) -> bool {
        self.key.is_match(key) && self.value.is_match(value)
    }

    /// The patterns as configured, without the anchors.
    pub fn patterns(&self) -> (&str, &str) {
        (strip(self.key.as_str()), strip(self.value.as_str()))
    }
}

fn anchored(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{pattern})$"))
}

fn strip(anchored: &str) -> &str {
    anchored.strip_prefix("^(?:").and_then(|p| p.strip_suffix(")$")).unwrap_or(anchored)
}

#[cfg(test)]
mod tests {
    use super::PropertyMatcher;
    use crate::error::ToggleError;

    #[test]
    fn matches_whole_input_only() {
        let matcher = PropertyMatcher::new(r"feature\.flag", "true").unwrap();
        assert!(matcher.matches("feature.flag", "true"));
        assert!(!matcher.matches("my.feature.flag", "true"));
        assert!(!matcher.matches("feature.flag", "true!"));
        assert!(!matcher.matches("featureXflag", "true"));
    }

    #[test]
    fn alternation_stays_anchored() {
        let matcher = PropertyMatcher::new("a|b", "on|yes").unwrap();
        assert!(matcher.matches("a", "yes"));
        assert!(!matcher.matches("ab", "yes"));
        assert!(!matcher.matches("b", "only"));
        assert_eq!(matcher.patterns(), ("a|b", "on|yes"));
    }

    #[test]
    fn invalid_pattern_is_reported_at_construction() {
        let err = PropertyMatcher::new("(", "x").unwrap_err();
        assert!(matches!(err, ToggleError::Pattern { .. }));
        assert!(err.to_string().contains("property_key"));
    }

    #[test]
    fn missing_or_empty_pattern_yields_none() {
        assert!(PropertyMatcher::optional(None, Some("x")).unwrap().is_none());
        assert!(PropertyMatcher::optional(Some("x"), Some("")).unwrap().is_none());
        assert!(PropertyMatcher::optional(Some("k"), Some("v")).unwrap().is_some());
    }
}
