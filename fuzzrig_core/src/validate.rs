use crate::resolver::TargetConfig;
use std::fs;
use std::process::Command;
use thiserror::Error;
use tracing::debug;

/// Content of the placeholder seed written into a fresh seed directory.
const PLACEHOLDER_SEED: &str = "fuzzing";

/// Errors while staging the workdir for validation.
///
/// Everything a corrected driver could fix is reported inside
/// [`ValidationOutcome`] instead; only environmental filesystem failures
/// (directory creation, driver write) surface here.
#[derive(Error, Debug)]
pub enum ValidateError {
    #[error("driver validation I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ValidateError {
    fn from(err: std::io::Error) -> Self {
        ValidateError::Io(err.to_string())
    }
}

/// Why a driver was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The language's external syntax checker rejected the file (or could
    /// not be spawned).
    Syntax,
    /// A required scaffolding token is missing from the driver text.
    MissingScaffolding,
    /// The build command exited nonzero (or could not be spawned).
    CompileFailed,
}

/// Result of one validation attempt: an acceptance flag plus a
/// human-readable diagnostic. Returned synchronously, never persisted;
/// callers retry with a corrected driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    accepted: bool,
    diagnostic: String,
    failure: Option<FailureKind>,
}

impl ValidationOutcome {
    fn accepted() -> Self {
        Self {
            accepted: true,
            diagnostic: String::new(),
            failure: None,
        }
    }

    fn rejected(failure: FailureKind, diagnostic: String) -> Self {
        Self {
            accepted: false,
            diagnostic,
            failure: Some(failure),
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    pub fn diagnostic(&self) -> &str {
        &self.diagnostic
    }

    pub fn failure(&self) -> Option<FailureKind> {
        self.failure
    }
}

impl TargetConfig {
    /// Writes a candidate driver into the workdir and decides whether it is
    /// acceptable.
    ///
    /// Always stages the workdir first: creates it (and a seed directory
    /// with one placeholder seed) if missing, then writes `driver` to the
    /// resolved driver-source path, overwriting prior content. Staging is
    /// idempotent and confined to the workdir.
    ///
    /// With `check_compile` false the driver is accepted once written,
    /// regardless of content. Otherwise interpreted drivers go through the
    /// language's syntax checker and a scaffolding-token scan, and native
    /// drivers through the resolved build command; both run as blocking
    /// subprocesses with no timeout. Rejections, including checker or
    /// compiler spawn failures, are carried in the returned outcome.
    pub fn validate_driver(
        &self,
        driver: &str,
        check_compile: bool,
    ) -> Result<ValidationOutcome, ValidateError> {
        fs::create_dir_all(&self.workdir)?;
        fs::write(&self.paths.driver_source, driver)?;

        if !self.paths.seed_dir.exists() {
            fs::create_dir_all(&self.paths.seed_dir)?;
            fs::write(self.paths.seed_dir.join("seed1"), PLACEHOLDER_SEED)?;
        }

        if !check_compile {
            return Ok(ValidationOutcome::accepted());
        }

        if self.language.is_interpreted() {
            self.validate_interpreted(driver)
        } else {
            self.validate_native()
        }
    }

    fn validate_interpreted(&self, driver: &str) -> Result<ValidationOutcome, ValidateError> {
        let policy = self.language.policy();

        let argv = policy.syntax_check;
        debug!(command = ?argv, file = %self.paths.driver_source.display(), "running syntax check");
        let output = Command::new(argv[0])
            .args(&argv[1..])
            .arg(&self.paths.driver_source)
            .output();
        match output {
            Ok(output) if !output.status.success() => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Ok(ValidationOutcome::rejected(
                    FailureKind::Syntax,
                    format!(
                        "{} syntax validation failed: {}",
                        self.language.as_str(),
                        stderr.trim()
                    ),
                ));
            }
            Ok(_) => {}
            Err(e) => {
                return Ok(ValidationOutcome::rejected(
                    FailureKind::Syntax,
                    format!(
                        "{} syntax checker '{}' could not be run: {}",
                        self.language.as_str(),
                        argv[0],
                        e
                    ),
                ));
            }
        }

        for token in policy.scaffold_tokens {
            if !driver.contains(token) {
                return Ok(ValidationOutcome::rejected(
                    FailureKind::MissingScaffolding,
                    format!("missing required scaffolding token '{token}'"),
                ));
            }
        }

        Ok(ValidationOutcome::accepted())
    }

    fn validate_native(&self) -> Result<ValidationOutcome, ValidateError> {
        fs::create_dir_all(&self.paths.artifact_dir)?;

        // C++ targets build with the C++-specific command when the
        // configuration declares one.
        let build_cmd = match (&self.build_cmd_cpp, self.language) {
            (Some(cpp_cmd), crate::language::LanguageKind::Cpp) => cpp_cmd.as_str(),
            _ => self.build_cmd.as_str(),
        };

        debug!(command = build_cmd, "running validation build");
        let output = Command::new("sh").arg("-c").arg(build_cmd).output();
        let output = match output {
            Ok(output) => output,
            Err(e) => {
                return Ok(ValidationOutcome::rejected(
                    FailureKind::CompileFailed,
                    format!("build command could not be run: {e}"),
                ));
            }
        };

        let mut log = output.stdout;
        log.extend_from_slice(&output.stderr);
        fs::write(&self.paths.build_log, &log)?;

        if !output.status.success() {
            return Ok(ValidationOutcome::rejected(
                FailureKind::CompileFailed,
                format!("build failed: {}", String::from_utf8_lossy(&log)),
            ));
        }

        Ok(ValidationOutcome::accepted())
    }
}
