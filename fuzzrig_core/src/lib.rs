pub mod command;
pub mod headers;
pub mod language;
pub mod manifest;
pub mod paths;
pub mod resolver;
pub mod snapshot;
pub mod validate;

pub use headers::HeaderScanError;
pub use language::{LanguageKind, LanguagePolicy};
pub use manifest::{BuildManifest, TargetSpec};
pub use paths::ArtifactPaths;
pub use resolver::{ConfigError, Provisioner, ResolveRequest, TargetConfig};
pub use snapshot::{SnapshotError, restore, restore_from_file, snapshot, snapshot_to_file};
pub use validate::{FailureKind, ValidateError, ValidationOutcome};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reexports_resolve_end_to_end() {
        let spec = TargetSpec {
            language: "python".to_string(),
            ..TargetSpec::default()
        };
        let config = TargetConfig::resolve(ResolveRequest::inline("/base", spec, "foo")).unwrap();
        assert_eq!(config.language, LanguageKind::Python);
    }
}
