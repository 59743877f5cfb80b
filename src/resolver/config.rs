//! `vibefun.json` (spec §6 "Configuration file"), deserialized with `serde`,
//! the same way the teacher derives `Serialize`/`Deserialize` on its AST and
//! token types rather than hand-writing a parser for its own config.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::resolver::error::{ResolveError, ResolveResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompilerOptions {
    #[serde(default)]
    pub paths: HashMap<String, Vec<String>>,
    /// Unknown keys are preserved rather than rejected, per spec §6 "must
    /// not cause failure".
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default, rename = "compilerOptions")]
    pub compiler_options: CompilerOptions,
}

/// The discovered project root plus whatever config was found there. A
/// `vibefun.json`-less project (one with only a `package.json`, or
/// neither) still has a root — just no path mappings.
#[derive(Debug, Clone, Default)]
pub struct ResolvedConfig {
    pub root: PathBuf,
    pub config: ProjectConfig,
}

/// Walks upward from `start_dir` looking for `vibefun.json`, then
/// `package.json`, then settles for the filesystem root (spec §4.5
/// "Project-root discovery").
pub fn discover_project(start_dir: &Path) -> ResolveResult<ResolvedConfig> {
    debug!("discovering project root from '{}'", start_dir.display());
    let mut dir = start_dir.to_path_buf();
    loop {
        let vibefun_json = dir.join("vibefun.json");
        if vibefun_json.is_file() {
            trace!("found vibefun.json at '{}'", vibefun_json.display());
            let contents = std::fs::read_to_string(&vibefun_json).map_err(|e| ResolveError::InvalidConfig {
                path: vibefun_json.clone(),
                reason: e.to_string(),
            })?;
            let config: ProjectConfig = serde_json::from_str(&contents).map_err(|e| ResolveError::InvalidConfig {
                path: vibefun_json,
                reason: e.to_string(),
            })?;
            return Ok(ResolvedConfig { root: dir, config });
        }
        let package_json = dir.join("package.json");
        if package_json.is_file() {
            trace!("falling back to package.json at '{}'", package_json.display());
            return Ok(ResolvedConfig {
                root: dir,
                config: ProjectConfig::default(),
            });
        }
        match dir.parent() {
            Some(parent) => dir = parent.to_path_buf(),
            None => {
                return Ok(ResolvedConfig {
                    root: dir,
                    config: ProjectConfig::default(),
                })
            }
        }
    }
}

/// Matches `specifier` against a `paths` pattern containing at most one `*`
/// wildcard, returning the substituted target when it matches (spec §6
/// "`*` wildcard matches any path segment sequence").
pub fn match_path_pattern(pattern: &str, target: &str, specifier: &str) -> Option<String> {
    match pattern.split_once('*') {
        None => (pattern == specifier).then(|| target.to_string()),
        Some((prefix, suffix)) => {
            let rest = specifier.strip_prefix(prefix)?.strip_suffix(suffix)?;
            Some(target.replacen('*', rest, 1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_pattern_matches_only_itself() {
        assert_eq!(match_path_pattern("foo", "./vendor/foo", "foo"), Some("./vendor/foo".to_string()));
        assert_eq!(match_path_pattern("foo", "./vendor/foo", "bar"), None);
    }

    #[test]
    fn wildcard_pattern_substitutes_matched_segment() {
        assert_eq!(
            match_path_pattern("@/*", "./src/*", "@/utils/list"),
            Some("./src/utils/list".to_string())
        );
    }

    #[test]
    fn unknown_compiler_option_keys_round_trip() {
        let json = r#"{"compilerOptions": {"paths": {}, "strict": true}}"#;
        let config: ProjectConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.compiler_options.other.get("strict").and_then(|v| v.as_bool()), Some(true));
    }
}
