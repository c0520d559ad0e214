//! Gitignore-style exclusion patterns.
//!
//! Supports the subset of gitwildmatch that project ignore files use in
//! practice: comments, negation, directory-only patterns, anchoring and `**`.

use crate::error::ConfigError;
use glob::{MatchOptions, Pattern};
use std::path::Path;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
struct Rule {
    pattern: Pattern,
    negated: bool,
    dir_only: bool,
    /// Anchored rules match the whole relative path, others the last component.
    anchored: bool,
}

impl Rule {
    fn matches(&self, rel: &str, name: &str, is_dir: bool) -> bool {
        if self.dir_only && !is_dir {
            return false;
        }
        let candidate = if self.anchored { rel } else { name };
        self.pattern.matches_with(candidate, MATCH_OPTIONS)
    }
}

/// Compiled, ordered ignore patterns. Later patterns override earlier ones.
#[derive(Debug, Clone, Default)]
pub struct IgnoreSpec {
    rules: Vec<Rule>,
}

impl IgnoreSpec {
    /// An ignore spec that matches nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads `path`; a missing file yields an empty spec.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read(path) {
            Ok(bytes) => Self::parse(&String::from_utf8_lossy(&bytes), path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No ignore file at {}", path.display());
                Ok(Self::empty())
            }
            Err(source) => Err(ConfigError::IgnoreFile {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Parses ignore file contents. `origin` is only used in error messages.
    pub fn parse(contents: &str, origin: &Path) -> Result<Self, ConfigError> {
        let mut rules = Vec::new();

        for (idx, raw) in contents.lines().enumerate() {
            let Some(rule) = parse_line(raw).map_err(|reason| ConfigError::IgnorePattern {
                path: origin.to_path_buf(),
                line: idx + 1,
                pattern: raw.to_string(),
                reason,
            })?
            else {
                continue;
            };
            rules.push(rule);
        }

        Ok(Self { rules })
    }

    /// Number of active patterns.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the spec has no patterns.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether `rel` (root-relative, `/`-separated) is ignored.
    ///
    /// A path is ignored when any of its ancestor directories is ignored, so a
    /// negated pattern cannot re-include something below an ignored directory.
    pub fn is_ignored(&self, rel: &str, is_dir: bool) -> bool {
        if self.rules.is_empty() {
            return false;
        }
        let rel = rel.trim_matches('/');
        let mut end = 0;
        for (idx, ch) in rel.char_indices() {
            if ch == '/' {
                if self.matches_exact(&rel[..idx], &rel[end..idx], true) {
                    return true;
                }
                end = idx + 1;
            }
        }
        self.matches_exact(rel, &rel[end..], is_dir)
    }

    /// Applies the rules to one path without looking at its ancestors.
    fn matches_exact(&self, rel: &str, name: &str, is_dir: bool) -> bool {
        self.rules
            .iter()
            .rev()
            .find(|rule| rule.matches(rel, name, is_dir))
            .is_some_and(|rule| !rule.negated)
    }
}

/// Returns `Ok(None)` for blank lines and comments.
fn parse_line(raw: &str) -> Result<Option<Rule>, String> {
    let mut line = trim_trailing_spaces(raw);
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut negated = false;
    if let Some(rest) = line.strip_prefix('!') {
        negated = true;
        line = rest;
    } else if let Some(rest) = line.strip_prefix('\\') {
        if rest.starts_with('#') || rest.starts_with('!') {
            line = rest;
        }
    }

    let mut dir_only = false;
    if let Some(rest) = line.strip_suffix('/') {
        dir_only = true;
        line = rest;
    }

    let anchored = line.contains('/');
    let line = line.trim_start_matches('/');
    if line.is_empty() {
        return Ok(None);
    }

    let pattern = Pattern::new(line).map_err(|e| e.msg.to_string())?;
    Ok(Some(Rule {
        pattern,
        negated,
        dir_only,
        anchored,
    }))
}

/// Trailing spaces are insignificant unless escaped with a backslash.
fn trim_trailing_spaces(line: &str) -> &str {
    let trimmed = line.trim_end_matches(['\r', '\n']);
    let mut end = trimmed.len();
    while end > 0 && trimmed.as_bytes()[end - 1] == b' ' {
        if end >= 2 && trimmed.as_bytes()[end - 2] == b'\\' {
            break;
        }
        end -= 1;
    }
    &trimmed[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(contents: &str) -> IgnoreSpec {
        IgnoreSpec::parse(contents, Path::new(".gitignore")).unwrap()
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let spec = spec("# comment\n\n   \n*.log\n");
        assert_eq!(spec.len(), 1);
        assert!(spec.is_ignored("server.log", false));
    }

    #[test]
    fn unanchored_patterns_match_at_any_depth() {
        let spec = spec("cache\n*.tmp\n");
        assert!(spec.is_ignored("cache", true));
        assert!(spec.is_ignored("pkg/deep/cache", true));
        assert!(spec.is_ignored("a/b/c.tmp", false));
        assert!(!spec.is_ignored("cached", true));
    }

    #[test]
    fn anchored_patterns_only_match_from_root() {
        let spec = spec("/output\nsrc/generated\n");
        assert!(spec.is_ignored("output", true));
        assert!(!spec.is_ignored("pkg/output", true));
        assert!(spec.is_ignored("src/generated", true));
        assert!(!spec.is_ignored("lib/src/generated", true));
    }

    #[test]
    fn directory_only_patterns_skip_files() {
        let spec = spec("logs/\n");
        assert!(spec.is_ignored("logs", true));
        assert!(!spec.is_ignored("logs", false));
        assert!(spec.is_ignored("logs/today.txt", false));
    }

    #[test]
    fn last_match_wins_for_negation() {
        let spec = spec("*.txt\n!keep.txt\n");
        assert!(spec.is_ignored("drop.txt", false));
        assert!(!spec.is_ignored("keep.txt", false));
    }

    #[test]
    fn negation_cannot_reinclude_below_ignored_directory() {
        let spec = spec("secret/\n!secret/keep.txt\n");
        assert!(spec.is_ignored("secret/keep.txt", false));
        assert!(spec.is_ignored("secret/nested/deeper", true));
    }

    #[test]
    fn double_star_spans_directories() {
        let spec = spec("assets/**/*.psd\n");
        assert!(spec.is_ignored("assets/a/b/c.psd", false));
        assert!(spec.is_ignored("assets/c.psd", false));
        assert!(!spec.is_ignored("assets/c.png", false));
    }

    #[test]
    fn escaped_hash_is_a_literal() {
        let spec = spec("\\#notes\n");
        assert!(spec.is_ignored("#notes", false));
    }

    #[test]
    fn invalid_pattern_reports_line() {
        let err = IgnoreSpec::parse("ok\n[unclosed\n", Path::new("proj/.gitignore")).unwrap_err();
        match err {
            ConfigError::IgnorePattern { line, pattern, .. } => {
                assert_eq!(line, 2);
                assert_eq!(pattern, "[unclosed");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_is_empty_spec() {
        let dir = tempfile::tempdir().unwrap();
        let spec = IgnoreSpec::load(&dir.path().join(".gitignore")).unwrap();
        assert!(spec.is_empty());
        assert!(!spec.is_ignored("anything", true));
    }
}
