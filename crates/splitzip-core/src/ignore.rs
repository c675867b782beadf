//! Ignore-list handling
//!
//! A source root may carry a plain-text `.ignore` file, one pattern per line.
//! Blank lines and `#` comments are skipped; leading/trailing whitespace is
//! trimmed. A relative path is excluded when any rule matches; rules are an
//! unordered set, there is no negation and no glob syntax beyond a single
//! leading or trailing `*`.

use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Name of the ignore-list file expected at the source root.
pub const IGNORE_FILE_NAME: &str = ".ignore";

/// Parsed set of ignore patterns for one archiving run.
#[derive(Debug, Clone, Default)]
pub struct IgnoreList {
    patterns: Vec<String>,
}

impl IgnoreList {
    /// Load patterns from `{source_root}/.ignore`.
    ///
    /// A missing or unreadable ignore file is not an error: it yields an
    /// empty rule set (the run proceeds with nothing ignored).
    pub fn load<P: AsRef<Path>>(source_root: P) -> Self {
        let ignore_path = source_root.as_ref().join(IGNORE_FILE_NAME);

        if !ignore_path.exists() {
            debug!("No {} file found, nothing will be ignored", IGNORE_FILE_NAME);
            return Self::default();
        }

        match fs::read_to_string(&ignore_path) {
            Ok(contents) => {
                let list = Self::parse(&contents);
                debug!(
                    "Loaded {} ignore patterns from {:?}",
                    list.patterns.len(),
                    ignore_path
                );
                list
            }
            Err(e) => {
                warn!(
                    "Could not read ignore file {:?}: {} (continuing with no rules)",
                    ignore_path, e
                );
                Self::default()
            }
        }
    }

    /// Parse patterns from ignore-file contents.
    pub fn parse(contents: &str) -> Self {
        let patterns = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect();

        Self { patterns }
    }

    /// Number of loaded patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether the rule set is empty.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Check whether a relative path (forward-slash separated) is excluded.
    ///
    /// The empty path never matches. The ignore file itself is always
    /// excluded regardless of rules.
    pub fn matches(&self, relative_path: &str) -> bool {
        if relative_path.is_empty() {
            return false;
        }

        // The ignore-list file is never archived.
        if Path::new(relative_path)
            .file_name()
            .is_some_and(|n| n == IGNORE_FILE_NAME)
        {
            return true;
        }

        self.patterns.iter().any(|p| rule_matches(p, relative_path))
    }
}

fn rule_matches(pattern: &str, path: &str) -> bool {
    if let Some(anchored) = pattern.strip_prefix('/') {
        // Root-anchored path: exact match or directory prefix.
        return path == anchored || path.starts_with(&format!("{}/", anchored));
    }
    if let Some(prefix) = pattern.strip_suffix('*') {
        return path.starts_with(prefix);
    }
    if let Some(suffix) = pattern.strip_prefix('*') {
        // Extension-style patterns ("*.tmp").
        return path.ends_with(suffix);
    }
    // Exact match, or a file inside the named directory.
    path == pattern || path.starts_with(&format!("{}/", pattern))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(patterns: &[&str]) -> IgnoreList {
        IgnoreList {
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn test_empty_path_never_matches() {
        let list = rules(&["*"]);
        assert!(!list.matches(""));
    }

    #[test]
    fn test_root_anchored_pattern() {
        let list = rules(&["/secrets"]);
        assert!(list.matches("secrets"));
        assert!(list.matches("secrets/a.txt"));
        assert!(!list.matches("nested/secrets/a.txt"));
        assert!(!list.matches("secrets2/a.txt"));
    }

    #[test]
    fn test_trailing_wildcard_is_prefix_match() {
        let list = rules(&["build*"]);
        assert!(list.matches("build"));
        assert!(list.matches("build-output/x.o"));
        assert!(!list.matches("src/build.rs"));
    }

    #[test]
    fn test_leading_wildcard_is_suffix_match() {
        let list = rules(&["*.tmp"]);
        assert!(list.matches("x.tmp"));
        assert!(list.matches("nested/cache.tmp"));
        assert!(!list.matches("x.tmp.bak"));
    }

    #[test]
    fn test_exact_and_directory_prefix() {
        let list = rules(&["logs"]);
        assert!(list.matches("logs"));
        assert!(list.matches("logs/y.log"));
        assert!(!list.matches("logs2/y.log"));
    }

    #[test]
    fn test_combined_rule_set() {
        let list = rules(&["/secrets", "*.tmp", "logs"]);
        assert!(list.matches("secrets/a.txt"));
        assert!(list.matches("x.tmp"));
        assert!(list.matches("logs/y.log"));
        assert!(!list.matches("keep/me.txt"));
    }

    #[test]
    fn test_ignore_file_always_excluded() {
        let list = rules(&[]);
        assert!(list.matches(".ignore"));
        assert!(list.matches("subdir/.ignore"));
    }

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let list = IgnoreList::parse("# comment\n\n  /secrets  \nlogs\n");
        assert_eq!(list.len(), 2);
        assert!(list.matches("secrets/a"));
        assert!(list.matches("logs/b"));
    }
}
