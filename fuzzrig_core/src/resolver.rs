use crate::command;
use crate::headers::{self, HeaderScanError};
use crate::language::LanguageKind;
use crate::manifest::{BuildManifest, TargetSpec};
use crate::paths::{self, ArtifactPaths};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors that make a resolution attempt fail.
///
/// All of these are fatal and raised at resolution time; the core never
/// retries or recovers internally.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Exactly one of an inline spec or a manifest handle must be supplied;
    /// the caller provided both or neither.
    #[error("exactly one of an inline spec or a manifest must be supplied")]
    AmbiguousSource,

    /// No target name was given. The name is a path component, so it is
    /// required for both construction variants.
    #[error("a target name is required for resolution")]
    MissingTarget,

    /// The named target does not exist in the supplied manifest.
    #[error("target '{0}' not present in manifest")]
    UnknownTarget(String),

    /// The spec declares a language outside the supported kinds.
    #[error("unsupported language '{language}' for target '{target}'")]
    UnsupportedLanguage { target: String, language: String },

    /// A command template required for the target's language is missing
    /// from the raw configuration.
    #[error("target '{target}' is missing required template '{key}'")]
    MissingTemplate { target: String, key: &'static str },

    #[error("config I/O error: {0}")]
    Io(String),

    /// A shared cache file exists but does not hold valid JSON.
    #[error("cache deserialization error: {0}")]
    CacheDecode(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}
impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::CacheDecode(format!("JSON operation error: {}", err))
    }
}

/// Seam for the external image-provisioning collaborator.
///
/// The core never calls this itself beyond holding a handle for its caller;
/// the handle is transient and is cleared by the snapshot mechanism.
pub trait Provisioner: Send + Sync + std::fmt::Debug {
    fn provision(&self, target: &str, language: LanguageKind) -> Result<(), anyhow::Error>;
}

/// Construction arguments for [`TargetConfig::resolve`].
///
/// Exactly one of `spec` and `manifest` must be set. `workdir` overrides the
/// derived working directory verbatim; `task_idx` selects the `para-<idx>`
/// workdir segment for parallel attempts.
#[derive(Debug, Default)]
pub struct ResolveRequest<'a> {
    pub basedir: PathBuf,
    pub target: Option<String>,
    pub spec: Option<TargetSpec>,
    pub manifest: Option<&'a BuildManifest>,
    pub task_idx: Option<u32>,
    pub workdir: Option<PathBuf>,
}

impl<'a> ResolveRequest<'a> {
    pub fn from_manifest(
        basedir: impl Into<PathBuf>,
        manifest: &'a BuildManifest,
        target: impl Into<String>,
    ) -> Self {
        Self {
            basedir: basedir.into(),
            target: Some(target.into()),
            spec: None,
            manifest: Some(manifest),
            task_idx: None,
            workdir: None,
        }
    }

    pub fn inline(
        basedir: impl Into<PathBuf>,
        spec: TargetSpec,
        target: impl Into<String>,
    ) -> Self {
        Self {
            basedir: basedir.into(),
            target: Some(target.into()),
            spec: Some(spec),
            manifest: None,
            task_idx: None,
            workdir: None,
        }
    }

    pub fn task_idx(mut self, idx: u32) -> Self {
        self.task_idx = Some(idx);
        self
    }

    pub fn workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }
}

/// The immutable configuration snapshot for one (target, language, task)
/// resolution: every artifact path and every command string, fully derived.
///
/// Constructed once via [`TargetConfig::resolve`] and never mutated. The
/// `provisioner` handle is the only transient field; it is skipped during
/// serialization so a restored config never carries a live resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    pub target: String,
    pub language: LanguageKind,
    pub basedir: PathBuf,
    pub workdir: PathBuf,
    pub cachedir: PathBuf,
    pub paths: ArtifactPaths,
    pub compile_opts: Vec<String>,
    pub compile_opts_cpp: Option<Vec<String>>,
    pub build_cmd: String,
    pub build_cmd_cpp: Option<String>,
    pub test_build_cmd: String,
    pub run_cmd: String,
    pub precode: String,
    pub autoinclude: bool,
    pub spec: TargetSpec,
    #[serde(skip)]
    pub provisioner: Option<Arc<dyn Provisioner>>,
}

impl TargetConfig {
    /// Resolves a request into a full configuration.
    ///
    /// Validates the construction arguments, selects and validates the
    /// language, derives every path, and renders every command template.
    /// Resolution is deterministic: the same request always yields the same
    /// paths and commands.
    pub fn resolve(request: ResolveRequest<'_>) -> Result<Self, ConfigError> {
        let ResolveRequest {
            basedir,
            target,
            spec,
            manifest,
            task_idx,
            workdir,
        } = request;

        let target = target.ok_or(ConfigError::MissingTarget)?;
        let spec = match (spec, manifest) {
            (Some(_), Some(_)) | (None, None) => return Err(ConfigError::AmbiguousSource),
            (Some(spec), None) => spec,
            (None, Some(manifest)) => manifest
                .get(&target)
                .cloned()
                .ok_or_else(|| ConfigError::UnknownTarget(target.clone()))?,
        };

        let language =
            LanguageKind::parse(&spec.language).ok_or_else(|| ConfigError::UnsupportedLanguage {
                target: target.clone(),
                language: spec.language.clone(),
            })?;

        let basedir = std::path::absolute(&basedir)?;
        let workdir = match workdir {
            Some(dir) => dir,
            None => paths::workdir_for(&basedir, &target, language, task_idx),
        };
        let cachedir = paths::cachedir_for(&basedir, &target, language);
        let paths = ArtifactPaths::resolve(&workdir, &cachedir, language);

        let (compile_opts, build_cmd, test_build_cmd) = if language.is_interpreted() {
            (Vec::new(), String::new(), String::new())
        } else {
            let template = spec.build.as_deref().ok_or_else(|| ConfigError::MissingTemplate {
                target: target.clone(),
                key: "build",
            })?;
            let opts = command::with_warning_suppression(&spec.compile);
            let build_cmd =
                command::render_build_command(template, &opts, &paths.driver_source, &paths.driver_exe);
            let test_build_cmd = command::render_test_build_command(
                template,
                &opts,
                &paths.test_source,
                &paths.test_exe,
            );
            (opts, build_cmd, test_build_cmd)
        };

        // The C++-specific variants exist only when the raw configuration
        // supplies both halves.
        let (compile_opts_cpp, build_cmd_cpp) = match (&spec.compile_cpp, &spec.build_cpp) {
            (Some(raw_opts), Some(template)) if !language.is_interpreted() => {
                let opts = command::with_warning_suppression(raw_opts);
                let rendered = command::render_build_command(
                    template,
                    &opts,
                    &paths.driver_source,
                    &paths.driver_exe,
                );
                (Some(opts), Some(rendered))
            }
            _ => (None, None),
        };

        let run_cmd = command::render_run_command(
            spec.run.as_deref().unwrap_or(""),
            &paths.driver_exe,
            &paths.artifact_dir,
            &paths.seed_dir,
        );

        let precode = expand_precode(&spec.precode);
        let autoinclude = !language.is_interpreted() && spec.autoinclude.unwrap_or(true);

        debug!(
            target_name = %target,
            language = language.as_str(),
            workdir = %workdir.display(),
            "resolved target configuration"
        );

        Ok(Self {
            target,
            language,
            basedir,
            workdir,
            cachedir,
            paths,
            compile_opts,
            compile_opts_cpp,
            build_cmd,
            build_cmd_cpp,
            test_build_cmd,
            run_cmd,
            precode,
            autoinclude,
            spec,
            provisioner: None,
        })
    }

    /// Renders the primary build command against an out-of-tree destination
    /// pair. Empty for interpreted languages, which have no build step.
    pub fn out_of_tree_build_command(
        &self,
        outfile: &Path,
        outexe: &Path,
    ) -> Result<String, ConfigError> {
        if self.language.is_interpreted() {
            return Ok(String::new());
        }
        let template = self.spec.build.as_deref().ok_or_else(|| ConfigError::MissingTemplate {
            target: self.target.clone(),
            key: "build",
        })?;
        Ok(command::render_build_command(
            template,
            &self.compile_opts,
            outfile,
            outexe,
        ))
    }

    /// Same as [`Self::out_of_tree_build_command`] for the C++-specific
    /// template; fails when the raw configuration does not declare one.
    pub fn out_of_tree_build_command_cpp(
        &self,
        outfile: &Path,
        outexe: &Path,
    ) -> Result<String, ConfigError> {
        if self.language.is_interpreted() {
            return Ok(String::new());
        }
        let template = self.spec.build_cpp.as_deref().ok_or_else(|| ConfigError::MissingTemplate {
            target: self.target.clone(),
            key: "build_cpp",
        })?;
        let opts = self
            .compile_opts_cpp
            .as_deref()
            .ok_or_else(|| ConfigError::MissingTemplate {
                target: self.target.clone(),
                key: "compile_cpp",
            })?;
        Ok(command::render_build_command(template, opts, outfile, outexe))
    }

    /// Applies the spec's header-discovery rules to the filesystem.
    ///
    /// Returns a map from header file to the most specific rule prefix that
    /// matched it.
    pub fn header_files(&self) -> Result<BTreeMap<PathBuf, PathBuf>, HeaderScanError> {
        headers::discover_headers(&self.spec.headers)
    }

    /// Installs the transient collaborator handle. Never survives a
    /// snapshot/restore round trip.
    pub fn attach_provisioner(&mut self, provisioner: Arc<dyn Provisioner>) {
        self.provisioner = Some(provisioner);
    }

    /// Reads the shared API-usage cache, if the static-analysis collaborator
    /// has populated it yet. The cache lives in the task-independent cache
    /// directory and is read-mostly; writer discipline is the caller's
    /// responsibility.
    pub fn api_usages(&self) -> Result<Option<serde_json::Value>, ConfigError> {
        read_json_cache(&self.paths.api_usage_cache)
    }

    /// Reads the shared static-graph usage cache, if present.
    pub fn graph_usages(&self) -> Result<Option<serde_json::Value>, ConfigError> {
        read_json_cache(&self.paths.graph_usage_cache)
    }
}

fn read_json_cache(path: &Path) -> Result<Option<serde_json::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    let value = serde_json::from_str(&content)?;
    Ok(Some(value))
}

/// Expands the precode template with a closed escape set: `\n`, `\t` and
/// `\\`. Unrecognized escapes are kept verbatim. Configuration text is never
/// evaluated as code.
fn expand_precode(raw: &str) -> String {
    let mut expanded = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            expanded.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => expanded.push('\n'),
            Some('t') => expanded.push('\t'),
            Some('\\') => expanded.push('\\'),
            Some(other) => {
                expanded.push('\\');
                expanded.push(other);
            }
            None => expanded.push('\\'),
        }
    }
    expanded
}
