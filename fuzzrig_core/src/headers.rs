use globset::GlobBuilder;
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;
use walkdir::WalkDir;

/// Errors raised while applying header-discovery rules.
#[derive(Error, Debug)]
pub enum HeaderScanError {
    /// A rule's glob pattern does not compile.
    #[error("invalid header glob pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    /// An I/O failure while resolving a matched path.
    #[error("header scan I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for HeaderScanError {
    fn from(err: std::io::Error) -> Self {
        HeaderScanError::Io(err.to_string())
    }
}

/// Applies prefix→glob discovery rules to the filesystem.
///
/// Each rule walks the files under its prefix and matches their
/// prefix-relative paths against the glob (`*` does not cross directory
/// separators; use `**` for recursive patterns). The result maps each
/// discovered file to the prefix that found it; when several prefixes find
/// the same file the most specific (longest) one wins. Prefixes that do not
/// exist contribute nothing.
pub fn discover_headers(
    rules: &BTreeMap<String, String>,
) -> Result<BTreeMap<PathBuf, PathBuf>, HeaderScanError> {
    let mut files: BTreeMap<PathBuf, PathBuf> = BTreeMap::new();

    for (prefix, pattern) in rules {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| HeaderScanError::Pattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
        let matcher = glob.compile_matcher();

        let prefix_path = PathBuf::from(prefix);
        if !prefix_path.is_dir() {
            continue;
        }
        let abs_prefix = std::fs::canonicalize(&prefix_path)?;

        for entry in WalkDir::new(&prefix_path) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(prefix = %prefix_path.display(), error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = match entry.path().strip_prefix(&prefix_path) {
                Ok(rel) => rel,
                Err(_) => continue,
            };
            if !matcher.is_match(relative) {
                continue;
            }

            let abs_file = std::fs::canonicalize(entry.path())?;
            // When several rules find the same file, the most specific
            // prefix wins.
            let more_specific = match files.get(&abs_file) {
                Some(existing) => existing.as_os_str().len() < abs_prefix.as_os_str().len(),
                None => true,
            };
            if more_specific {
                files.insert(abs_file, abs_prefix.clone());
            }
        }
    }

    Ok(files)
}
