//! Critical red-flag classification.
//!
//! A critical flag blocks a HIRE on its own. The predicate is pluggable so the
//! HIRE/MAYBE boundary can be exercised without any model call; closures work
//! as policies too.

/// Flags starting with this marker are always critical (interviewers are
/// prompted to use it).
pub const CRITICAL_PREFIX: &str = "critical:";

/// Default keyword stems. Matched case-insensitively as substrings.
pub const DEFAULT_CRITICAL_KEYWORDS: &[&str] = &[
    "dishonest",
    "fabricat",
    "plagiar",
    "falsif",
    "fraud",
    "lied about",
    "lying",
    "harass",
    "discriminat",
    "unethical",
    "violen",
    "misconduct",
    "confidential",
];

pub trait CriticalFlagPolicy: Send + Sync {
    fn is_critical(&self, flag: &str) -> bool;
}

impl<F> CriticalFlagPolicy for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_critical(&self, flag: &str) -> bool {
        self(flag)
    }
}

/// Keyword-stem policy: a flag is critical if it carries the explicit prefix
/// or contains any configured stem.
#[derive(Debug, Clone)]
pub struct KeywordCriticalPolicy {
    keywords: Vec<String>,
}

impl KeywordCriticalPolicy {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }
}

impl Default for KeywordCriticalPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_CRITICAL_KEYWORDS.iter().copied())
    }
}

impl CriticalFlagPolicy for KeywordCriticalPolicy {
    fn is_critical(&self, flag: &str) -> bool {
        let flag = flag.trim().to_lowercase();
        flag.starts_with(CRITICAL_PREFIX) || self.keywords.iter().any(|k| flag.contains(k.as_str()))
    }
}
