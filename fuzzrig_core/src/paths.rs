use crate::language::LanguageKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Workdir segment used when no parallel task index is given.
const SOLO_SEGMENT: &str = "solo";
/// Prefix of the workdir segment for parallel attempts, `para-<index>`.
const PARA_PREFIX: &str = "para-";
/// Cache directory name, shared by every task index of a target/language.
const CACHE_SEGMENT: &str = "cache";

/// Derives the isolated working directory for one resolution attempt.
///
/// The layout is `<base>/targets/<target>/<language>/<segment>` where the
/// segment is `para-<index>` for a parallel attempt and `solo` otherwise.
/// Distinct (target, language, task index) triples always map to distinct
/// directories; this is the only collision-avoidance mechanism between
/// concurrent attempts.
pub fn workdir_for(
    basedir: &Path,
    target: &str,
    language: LanguageKind,
    task_idx: Option<u32>,
) -> PathBuf {
    let segment = match task_idx {
        Some(idx) => format!("{PARA_PREFIX}{idx}"),
        None => SOLO_SEGMENT.to_string(),
    };
    basedir
        .join("targets")
        .join(target)
        .join(language.as_str())
        .join(segment)
}

/// Derives the cache directory, independent of the task index.
pub fn cachedir_for(basedir: &Path, target: &str, language: LanguageKind) -> PathBuf {
    basedir
        .join("targets")
        .join(target)
        .join(language.as_str())
        .join(CACHE_SEGMENT)
}

/// Every artifact location of a resolved target, as fixed names joined
/// under the workdir (or the cache directory for the two usage caches).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    pub driver_source: PathBuf,
    pub driver_exe: PathBuf,
    pub test_source: PathBuf,
    pub test_exe: PathBuf,
    pub testcase: PathBuf,
    pub status_file: PathBuf,
    pub build_log: PathBuf,
    pub fuzz_log: PathBuf,
    pub test_log: PathBuf,
    pub artifact_dir: PathBuf,
    pub seed_dir: PathBuf,
    pub config_snapshot: PathBuf,
    pub header_cache: PathBuf,
    pub header_param_cache: PathBuf,
    pub analysis_result: PathBuf,
    pub api_usage_cache: PathBuf,
    pub graph_usage_cache: PathBuf,
}

impl ArtifactPaths {
    pub fn resolve(workdir: &Path, cachedir: &Path, language: LanguageKind) -> Self {
        let policy = language.policy();
        Self {
            driver_source: workdir.join(policy.driver_filename),
            driver_exe: workdir.join("dummyfuzzer"),
            test_source: workdir.join(policy.test_filename),
            test_exe: workdir.join("dummytester"),
            testcase: workdir.join("testcase"),
            status_file: workdir.join("status.txt"),
            build_log: workdir.join("build.log"),
            fuzz_log: workdir.join("fuzz.log"),
            test_log: workdir.join("test.log"),
            artifact_dir: workdir.join("artifact"),
            seed_dir: workdir.join("seeds"),
            config_snapshot: workdir.join("config.bin"),
            header_cache: workdir.join("headers.bin"),
            header_param_cache: workdir.join("headerparams.bin"),
            analysis_result: workdir.join("project_analysis.json"),
            api_usage_cache: cachedir.join("apiusages.json"),
            graph_usage_cache: cachedir.join("graphusage.json"),
        }
    }
}
