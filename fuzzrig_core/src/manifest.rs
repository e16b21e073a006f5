use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

fn default_image_name() -> String {
    "fuzzbuntu".to_string()
}

/// Raw per-target configuration, as parsed from the build manifest.
///
/// Field names are the external schema and must not change. The `language`
/// string is validated against the supported kinds at resolution time, not
/// here.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TargetSpec {
    pub language: String,
    #[serde(default)]
    pub compile: Vec<String>,
    #[serde(default)]
    pub compile_cpp: Option<Vec<String>>,
    #[serde(default)]
    pub build: Option<String>,
    #[serde(default)]
    pub build_cpp: Option<String>,
    #[serde(default)]
    pub run: Option<String>,
    #[serde(default)]
    pub apiblocklist: BTreeSet<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub binaries: Vec<String>,
    #[serde(default = "default_image_name")]
    pub imagename: String,
    #[serde(default)]
    pub precode: String,
    #[serde(default)]
    pub known_drivers: Vec<String>,
    #[serde(default)]
    pub autoinclude: Option<bool>,
}

impl Default for TargetSpec {
    fn default() -> Self {
        Self {
            language: String::new(),
            compile: Vec::new(),
            compile_cpp: None,
            build: None,
            build_cpp: None,
            run: None,
            apiblocklist: BTreeSet::new(),
            headers: BTreeMap::new(),
            binaries: Vec::new(),
            imagename: default_image_name(),
            precode: String::new(),
            known_drivers: Vec::new(),
            autoinclude: None,
        }
    }
}

/// The already-parsed external configuration handle: one spec per target.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct BuildManifest {
    #[serde(default)]
    pub targets: BTreeMap<String, TargetSpec>,
}

impl BuildManifest {
    pub fn load_from_file(path: &PathBuf) -> Result<Self, anyhow::Error> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read manifest file at {:?}: {}", path, e))?;

        let manifest: BuildManifest = toml::from_str(&content).map_err(|e| {
            anyhow::anyhow!("Failed to parse TOML from manifest file {:?}: {}", path, e)
        })?;

        Ok(manifest)
    }

    pub fn get(&self, target: &str) -> Option<&TargetSpec> {
        self.targets.get(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST_TOML: &str = r#"
[targets.libfoo]
language = "c"
compile = ["-I/src/libfoo/include", "-fsanitize=fuzzer"]
build = "clang COMPBASE OUTFILE -o OUTEXE"
run = "OUTEXE ARTIFACTDIR SEEDDIR"
apiblocklist = ["foo_internal_reset"]
binaries = ["libfoo.a"]

[targets.jsonkit]
language = "python"
run = "python3 OUTFILE"
precode = "import sys\\n"
known_drivers = ["fuzz_parse.py"]

[targets.jsonkit.headers]
"/src/jsonkit/include" = "**/*.h"
"#;

    #[test]
    fn manifest_parses_targets_with_defaults() {
        let manifest: BuildManifest = toml::from_str(MANIFEST_TOML).unwrap();
        assert_eq!(manifest.targets.len(), 2);

        let libfoo = manifest.get("libfoo").unwrap();
        assert_eq!(libfoo.language, "c");
        assert_eq!(libfoo.compile.len(), 2);
        assert_eq!(
            libfoo.build.as_deref(),
            Some("clang COMPBASE OUTFILE -o OUTEXE")
        );
        assert!(libfoo.apiblocklist.contains("foo_internal_reset"));
        assert_eq!(libfoo.imagename, "fuzzbuntu");
        assert_eq!(libfoo.autoinclude, None);

        let jsonkit = manifest.get("jsonkit").unwrap();
        assert!(jsonkit.build.is_none());
        assert_eq!(jsonkit.headers.get("/src/jsonkit/include").unwrap(), "**/*.h");
        assert_eq!(jsonkit.known_drivers, vec!["fuzz_parse.py".to_string()]);
    }

    #[test]
    fn manifest_rejects_unknown_keys() {
        let bad = r#"
[targets.libfoo]
language = "c"
buidl = "typo"
"#;
        let err = toml::from_str::<BuildManifest>(bad);
        assert!(err.is_err());
    }

    #[test]
    fn missing_target_lookup_returns_none() {
        let manifest: BuildManifest = toml::from_str(MANIFEST_TOML).unwrap();
        assert!(manifest.get("nonexistent").is_none());
    }

    #[test]
    fn load_from_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("targets.toml");
        std::fs::write(&path, MANIFEST_TOML).unwrap();
        let manifest = BuildManifest::load_from_file(&path).unwrap();
        assert!(manifest.get("libfoo").is_some());
        dir.close().unwrap();
    }

    #[test]
    fn load_from_file_missing_path_errors() {
        let path = PathBuf::from("/definitely/not/here/targets.toml");
        let err = BuildManifest::load_from_file(&path);
        assert!(err.is_err());
    }
}
