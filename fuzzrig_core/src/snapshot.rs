use crate::resolver::TargetConfig;
use bincode::config::{Configuration, Fixint, LittleEndian, NoLimit};
use bincode::error::{DecodeError, EncodeError};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors from snapshotting or restoring a resolved configuration.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("snapshot encoding error: {0}")]
    Encode(String),

    #[error("snapshot decoding error: {0}")]
    Decode(String),

    #[error("snapshot I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for SnapshotError {
    fn from(err: std::io::Error) -> Self {
        SnapshotError::Io(err.to_string())
    }
}
impl From<EncodeError> for SnapshotError {
    fn from(err: EncodeError) -> Self {
        SnapshotError::Encode(err.to_string())
    }
}
impl From<DecodeError> for SnapshotError {
    fn from(err: DecodeError) -> Self {
        SnapshotError::Decode(err.to_string())
    }
}

/// Encoding settings shared by `snapshot` and `restore`; both sides must
/// agree for a cross-process handoff to round-trip.
fn snapshot_bincode_config() -> Configuration<LittleEndian, Fixint, NoLimit> {
    bincode::config::standard()
        .with_little_endian()
        .with_fixed_int_encoding()
}

/// Serializes a resolved configuration for cross-process handoff.
///
/// The provisioner handle is transient and never enters the bytes; the
/// receiving process re-acquires its own collaborators. Every path and
/// command field round-trips exactly.
pub fn snapshot(config: &TargetConfig) -> Result<Vec<u8>, SnapshotError> {
    let bytes = bincode::serde::encode_to_vec(config, snapshot_bincode_config())?;
    Ok(bytes)
}

/// Rebuilds a configuration from `snapshot` bytes. The restored value is
/// fully owned and carries no live resource handle.
pub fn restore(bytes: &[u8]) -> Result<TargetConfig, SnapshotError> {
    let (config, _length): (TargetConfig, usize) =
        bincode::serde::decode_from_slice(bytes, snapshot_bincode_config())?;
    Ok(config)
}

/// Writes a snapshot to an arbitrary path (typically the config's own
/// `config_snapshot` artifact path).
pub fn snapshot_to_file(config: &TargetConfig, path: &Path) -> Result<(), SnapshotError> {
    let bytes = snapshot(config)?;
    fs::write(path, bytes)?;
    Ok(())
}

/// Reads a snapshot back from a file.
pub fn restore_from_file(path: &Path) -> Result<TargetConfig, SnapshotError> {
    let bytes = fs::read(path)?;
    restore(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::LanguageKind;
    use crate::manifest::TargetSpec;
    use crate::resolver::{Provisioner, ResolveRequest};
    use std::sync::Arc;
    use tempfile::tempdir;

    #[derive(Debug)]
    struct NoOpProvisioner;

    impl Provisioner for NoOpProvisioner {
        fn provision(&self, _target: &str, _language: LanguageKind) -> Result<(), anyhow::Error> {
            Ok(())
        }
    }

    fn resolved_config() -> TargetConfig {
        let spec = TargetSpec {
            language: "c".to_string(),
            compile: vec!["-I/inc".to_string()],
            build: Some("clang COMPBASE OUTFILE -o OUTEXE".to_string()),
            run: Some("OUTEXE ARTIFACTDIR SEEDDIR".to_string()),
            precode: r"#include <stdint.h>\n".to_string(),
            ..TargetSpec::default()
        };
        TargetConfig::resolve(ResolveRequest::inline("/base", spec, "foo").task_idx(4)).unwrap()
    }

    #[test]
    fn roundtrip_preserves_paths_and_commands() {
        let config = resolved_config();
        let restored = restore(&snapshot(&config).unwrap()).unwrap();

        assert_eq!(restored.target, config.target);
        assert_eq!(restored.language, config.language);
        assert_eq!(restored.basedir, config.basedir);
        assert_eq!(restored.workdir, config.workdir);
        assert_eq!(restored.cachedir, config.cachedir);
        assert_eq!(restored.paths, config.paths);
        assert_eq!(restored.compile_opts, config.compile_opts);
        assert_eq!(restored.build_cmd, config.build_cmd);
        assert_eq!(restored.test_build_cmd, config.test_build_cmd);
        assert_eq!(restored.run_cmd, config.run_cmd);
        assert_eq!(restored.precode, config.precode);
        assert_eq!(restored.spec, config.spec);
    }

    #[test]
    fn live_handles_never_survive_a_roundtrip() {
        let mut config = resolved_config();
        config.attach_provisioner(Arc::new(NoOpProvisioner));
        assert!(config.provisioner.is_some());

        let restored = restore(&snapshot(&config).unwrap()).unwrap();
        assert!(restored.provisioner.is_none());
        // Snapshotting is non-destructive on the source.
        assert!(config.provisioner.is_some());
    }

    #[test]
    fn file_roundtrip_matches_the_in_memory_pair() {
        let config = resolved_config();
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.bin");

        snapshot_to_file(&config, &path).unwrap();
        let from_file = restore_from_file(&path).unwrap();
        let from_memory = restore(&snapshot(&config).unwrap()).unwrap();
        assert_eq!(from_file.paths, from_memory.paths);
        assert_eq!(from_file.build_cmd, from_memory.build_cmd);
        dir.close().unwrap();
    }

    #[test]
    fn garbage_bytes_fail_to_restore() {
        assert!(restore(&[0x00, 0x01, 0xFF]).is_err());
    }
}
