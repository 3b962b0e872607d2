//! Target module - the domains compared in one analysis run

use crate::DomainError;
use std::collections::BTreeSet;
use std::fmt;

/// Maximum number of targets (own site + competitors) in a single analysis run
pub const MAX_TARGETS: usize = 5;

/// A normalized domain taking part in an analysis run
///
/// Targets are ordered by their domain text so that every map keyed by `Target`
/// iterates the same way regardless of the order the user typed them in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Target(String);

impl Target {
    /// Parse and normalize a user-supplied domain
    ///
    /// Strips the scheme, a leading `www.`, anything after the host, and a trailing dot,
    /// then lowercases the rest.
    ///
    /// # Examples
    ///
    /// ```
    /// use rivalscope_domain::Target;
    ///
    /// let target = Target::parse("https://www.Nike.com/fr/running").unwrap();
    /// assert_eq!(target.as_str(), "nike.com");
    /// ```
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let mut host = input.trim().to_lowercase();

        for scheme in ["https://", "http://"] {
            if let Some(rest) = host.strip_prefix(scheme) {
                host = rest.to_string();
                break;
            }
        }

        if let Some(end) = host.find(['/', '?', '#']) {
            host.truncate(end);
        }

        if let Some(rest) = host.strip_prefix("www.") {
            host = rest.to_string();
        }

        let host = host.trim_end_matches('.');

        if host.is_empty() || host.contains(char::is_whitespace) || !host.contains('.') {
            return Err(DomainError::InvalidTarget(input.to_string()));
        }

        Ok(Self(host.to_string()))
    }

    /// Parse a full target list, enforcing the size limit and uniqueness
    pub fn parse_all<S: AsRef<str>>(inputs: &[S]) -> Result<Vec<Self>, DomainError> {
        if inputs.len() > MAX_TARGETS {
            return Err(DomainError::TooManyTargets {
                given: inputs.len(),
                max: MAX_TARGETS,
            });
        }

        let mut seen = BTreeSet::new();
        let mut targets = Vec::with_capacity(inputs.len());
        for input in inputs {
            let target = Self::parse(input.as_ref())?;
            if !seen.insert(target.clone()) {
                return Err(DomainError::DuplicateTarget(target.0));
            }
            targets.push(target);
        }

        Ok(targets)
    }

    /// Get the domain as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_domain() {
        let target = Target::parse("nike.com").unwrap();
        assert_eq!(target.as_str(), "nike.com");
    }

    #[test]
    fn test_parse_strips_scheme_www_and_path() {
        let target = Target::parse("  HTTPS://www.Adidas.com/running?ref=1 ").unwrap();
        assert_eq!(target.as_str(), "adidas.com");
    }

    #[test]
    fn test_parse_keeps_subdomains() {
        let target = Target::parse("http://blog.asics.com.").unwrap();
        assert_eq!(target.as_str(), "blog.asics.com");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Target::parse("").is_err());
        assert!(Target::parse("https://").is_err());
        assert!(Target::parse("not a domain").is_err());
        assert!(Target::parse("localhost").is_err());
    }

    #[test]
    fn test_parse_all_limits() {
        let too_many = ["a.com", "b.com", "c.com", "d.com", "e.com", "f.com"];
        assert_eq!(
            Target::parse_all(&too_many),
            Err(DomainError::TooManyTargets { given: 6, max: 5 })
        );
    }

    #[test]
    fn test_parse_all_rejects_duplicates_after_normalization() {
        let result = Target::parse_all(&["nike.com", "https://www.nike.com/"]);
        assert_eq!(result, Err(DomainError::DuplicateTarget("nike.com".to_string())));
    }

    #[test]
    fn test_targets_order_by_domain() {
        let mut targets = Target::parse_all(&["nike.com", "asics.com", "adidas.com"]).unwrap();
        targets.sort();
        let names: Vec<_> = targets.iter().map(Target::as_str).collect();
        assert_eq!(names, vec!["adidas.com", "asics.com", "nike.com"]);
    }
}
