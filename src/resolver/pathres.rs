//! Import-specifier resolution (spec §4.5 "Resolution algorithm").

use std::path::{Path, PathBuf};

use log::trace;

use crate::resolver::config::{match_path_pattern, ResolvedConfig};
use crate::resolver::error::{ResolveError, ResolveWarning};
use crate::span::Span;

pub const SOURCE_EXT: &str = "vf";

/// Resolves `specifier`, written inside `importer` (whose directory is
/// `importer_dir`), to a canonical file path plus an optional
/// case-mismatch warning (spec §4.5 steps 1-6).
pub fn resolve_import(
    specifier: &str,
    importer: &Path,
    importer_dir: &Path,
    config: &ResolvedConfig,
    span: &Span,
) -> Result<(PathBuf, Option<ResolveWarning>), ResolveError> {
    let candidate = resolve_candidate(specifier, importer_dir, config);
    let candidate = candidate.ok_or_else(|| ResolveError::ModuleNotFound {
        specifier: specifier.to_string(),
        importer: importer.to_path_buf(),
        span: span.clone(),
    })?;

    let resolved = find_on_disk(&candidate).ok_or_else(|| ResolveError::ModuleNotFound {
        specifier: specifier.to_string(),
        importer: importer.to_path_buf(),
        span: span.clone(),
    })?;

    let canonical = resolved.canonicalize().unwrap_or(resolved.clone());
    let warning = case_mismatch_warning(&resolved, &canonical, specifier, span);
    Ok((canonical, warning))
}

/// Step 1 (path mappings) and step 2/3 (relative / `node_modules`), each
/// producing a single best candidate path with no extension decided yet.
fn resolve_candidate(specifier: &str, importer_dir: &Path, config: &ResolvedConfig) -> Option<PathBuf> {
    for (pattern, targets) in &config.config.compiler_options.paths {
        for target in targets {
            if let Some(substituted) = match_path_pattern(pattern, target, specifier) {
                trace!("path mapping '{pattern}' -> '{substituted}' for specifier '{specifier}'");
                let candidate = config.root.join(&substituted);
                if find_on_disk(&candidate).is_some() {
                    return Some(candidate);
                }
            }
        }
    }

    if specifier.starts_with("./") || specifier.starts_with("../") {
        return Some(importer_dir.join(specifier));
    }

    let mut dir = importer_dir.to_path_buf();
    loop {
        let candidate = dir.join("node_modules").join(specifier);
        if find_on_disk(&candidate).is_some() {
            return Some(candidate);
        }
        match dir.parent() {
            Some(parent) => dir = parent.to_path_buf(),
            None => return Some(importer_dir.join(specifier)),
        }
    }
}

/// Step 4: file-vs-directory resolution. A trailing slash forces directory
/// form (`<path>/index.vf`); otherwise a literal `.vf` suffix is used
/// verbatim, else the extension is appended, else `index.vf` is tried
/// inside the path treated as a directory.
fn find_on_disk(candidate: &Path) -> Option<PathBuf> {
    let raw = candidate.to_string_lossy();
    if raw.ends_with('/') {
        let indexed = candidate.join(format!("index.{SOURCE_EXT}"));
        return indexed.is_file().then_some(indexed);
    }
    if candidate.extension().map(|e| e == SOURCE_EXT).unwrap_or(false) && candidate.is_file() {
        return Some(candidate.to_path_buf());
    }
    let with_ext = candidate.with_extension(SOURCE_EXT);
    if with_ext.is_file() {
        return Some(with_ext);
    }
    let indexed = candidate.join(format!("index.{SOURCE_EXT}"));
    if indexed.is_file() {
        return Some(indexed);
    }
    None
}

/// Step 6: a resolved path that only differs from what the specifier
/// literally names by letter case still returns the real on-disk path, but
/// the mismatch itself is reported as a warning.
fn case_mismatch_warning(resolved: &Path, canonical: &Path, specifier: &str, span: &Span) -> Option<ResolveWarning> {
    let expected_stem = Path::new(specifier).file_stem()?.to_string_lossy().to_string();
    let actual_stem = canonical.file_stem()?.to_string_lossy().to_string();
    if expected_stem != actual_stem && expected_stem.eq_ignore_ascii_case(&actual_stem) {
        Some(ResolveWarning::CaseMismatch {
            specifier: specifier.to_string(),
            resolved: resolved.to_path_buf(),
            span: span.clone(),
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::config::ProjectConfig;
    use std::fs;

    fn write(dir: &Path, rel: &str, contents: &str) -> PathBuf {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn resolves_relative_sibling_file() {
        let tmp = std::env::temp_dir().join(format!("vibefun-resolver-test-{}", std::process::id()));
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        let importer = write(&tmp, "main.vf", "");
        write(&tmp, "util.vf", "");
        let config = crate::resolver::config::ResolvedConfig {
            root: tmp.clone(),
            config: ProjectConfig::default(),
        };
        let (resolved, warning) = resolve_import("./util", &importer, &tmp, &config, &Span::dummy()).unwrap();
        assert!(resolved.ends_with("util.vf"));
        assert!(warning.is_none());
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_module_is_reported() {
        let tmp = std::env::temp_dir().join(format!("vibefun-resolver-test-missing-{}", std::process::id()));
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        let importer = write(&tmp, "main.vf", "");
        let config = crate::resolver::config::ResolvedConfig {
            root: tmp.clone(),
            config: ProjectConfig::default(),
        };
        assert!(resolve_import("./nope", &importer, &tmp, &config, &Span::dummy()).is_err());
        let _ = fs::remove_dir_all(&tmp);
    }
}
