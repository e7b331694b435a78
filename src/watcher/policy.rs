//! Disallowed-extension policy.

use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;

/// Set of suffixes whose files are removed on arrival.
///
/// Matching is an ASCII case-insensitive suffix comparison on the raw file
/// name. Suffixes are used exactly as configured: `".tmp"` and `"tmp"` are
/// different rules.
#[derive(Debug, Clone, Default)]
pub struct ExtensionPolicy {
    suffixes: Vec<Vec<u8>>,
}

impl ExtensionPolicy {
    /// Build a policy from configured suffixes. Blank entries are ignored.
    #[must_use]
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let suffixes = suffixes
            .into_iter()
            .map(|s| s.as_ref().trim().to_ascii_lowercase().into_bytes())
            .filter(|s| !s.is_empty())
            .collect();
        Self { suffixes }
    }

    /// Parse a comma-separated suffix list such as `".tmp,.exe"`.
    #[must_use]
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(','))
    }

    /// Whether any rule is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.suffixes.is_empty()
    }

    /// Whether a newly arrived child called `name` must be deleted.
    #[must_use]
    pub fn should_reject(&self, name: &OsStr) -> bool {
        let name = name.as_bytes();
        self.suffixes.iter().any(|suffix| {
            name.len() >= suffix.len()
                && name[name.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reject(policy: &ExtensionPolicy, name: &str) -> bool {
        policy.should_reject(OsStr::new(name))
    }

    #[test]
    fn test_exact_suffix() {
        let policy = ExtensionPolicy::parse(".tmp");
        assert!(reject(&policy, "x.tmp"));
        assert!(!reject(&policy, "x.tmpx"));
        assert!(!reject(&policy, "tmp"));
    }

    #[test]
    fn test_case_insensitive() {
        let policy = ExtensionPolicy::parse(".TmP");
        assert!(reject(&policy, "x.TMP"));
        assert!(reject(&policy, "x.tmp"));
    }

    #[test]
    fn test_no_dot_normalization() {
        let policy = ExtensionPolicy::parse("tmp");
        assert!(reject(&policy, "x.tmp"));
        assert!(reject(&policy, "xtmp"));

        let dotted = ExtensionPolicy::parse(".tmp");
        assert!(!reject(&dotted, "xtmp"));
    }

    #[test]
    fn test_list_parsing() {
        let policy = ExtensionPolicy::parse(".exe, .bat,,  ");
        assert!(reject(&policy, "setup.EXE"));
        assert!(reject(&policy, "run.bat"));
        assert!(!reject(&policy, "notes.txt"));
    }

    #[test]
    fn test_empty_policy_rejects_nothing() {
        let policy = ExtensionPolicy::parse("");
        assert!(policy.is_empty());
        assert!(!reject(&policy, "anything.tmp"));
        assert!(!reject(&policy, ""));
    }

    #[test]
    fn test_non_utf8_name() {
        let policy = ExtensionPolicy::parse(".bin");
        let name = OsStr::from_bytes(b"\xff\xfe.BIN");
        assert!(policy.should_reject(name));
    }
}
