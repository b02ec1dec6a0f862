use std::cmp::Ordering;
use std::fmt;

const LEGACY_PREFIX: &str = "job_";

/// Stable identifier of a job posting: a non-empty run of ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    /// Accepts a plain numeric id, trimming surrounding whitespace.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(trimmed.to_string()))
        } else {
            None
        }
    }

    /// Like [`JobId::parse`], but also accepts the legacy `job_` prefixed form.
    pub fn from_legacy(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        Self::parse(trimmed.strip_prefix(LEGACY_PREFIX).unwrap_or(trimmed))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Numeric order for digit strings: shorter is smaller, equal lengths compare lexically.
impl Ord for JobId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for JobId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::JobId;

    #[test]
    fn parse_rejects_non_numeric() {
        assert_eq!(JobId::parse(" 123456 ").unwrap().as_str(), "123456");
        assert!(JobId::parse("").is_none());
        assert!(JobId::parse("abc").is_none());
        assert!(JobId::parse("12a4").is_none());
        assert!(JobId::parse("job_43566").is_none());
    }

    #[test]
    fn legacy_prefix_is_stripped() {
        assert_eq!(JobId::from_legacy("job_43566").unwrap().as_str(), "43566");
        assert_eq!(JobId::from_legacy("43566").unwrap().as_str(), "43566");
        assert!(JobId::from_legacy("job_").is_none());
        assert!(JobId::from_legacy("job_x1").is_none());
    }

    #[test]
    fn ordering_is_numeric() {
        let small = JobId::parse("43566").unwrap();
        let large = JobId::parse("123456").unwrap();
        assert!(small < large);
    }
}
