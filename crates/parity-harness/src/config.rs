//! Configuration for parity runs
//!
//! A run is described by one reference invocation and an ordered list of
//! candidate invocations, plus discovery and trace settings. It can be loaded
//! from YAML:
//!
//! ```yaml
//! reference:
//!   name: go reference
//!   command: go
//!   args: [test, -v, ./cmd/djictl/..., -run, TestConnectWiFiAndStartStreaming]
//!   working_dir: ../djictl
//! candidates:
//!   - command: ./tests/dji_tests
//!     working_dir: build
//!   - command: ctest
//!     args: [-R, tst_connect_flow, -V]
//!     working_dir: build
//! discovery:
//!   accept: marker_substring
//!   require_success: false
//! format: markers
//! timeout_secs: 600
//! ```
//!
//! Relative working directories resolve against the directory holding the
//! YAML file.

use crate::discovery::DiscoveryPolicy;
use crate::error::{ConfigError, ConfigResult};
use crate::runner::Invocation;
use parity_trace::TraceFormat;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Everything needed to run one parity comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Ground-truth implementation's test entry point
    pub reference: Invocation,
    /// Candidate invocations, highest priority first
    pub candidates: Vec<Invocation>,
    #[serde(default)]
    pub discovery: DiscoveryPolicy,
    #[serde(default)]
    pub format: TraceFormat,
    /// Per-invocation time limit; unlimited when absent
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for HarnessConfig {
    /// The Go reference client against the C++ build tree
    fn default() -> Self {
        Self {
            reference: Invocation::new("go")
                .named("go reference test")
                .args([
                    "test",
                    "-v",
                    "./cmd/djictl/...",
                    "-run",
                    "TestConnectWiFiAndStartStreaming",
                ])
                .working_dir("../../../djictl"),
            candidates: vec![
                Invocation::new("../build/tests/dji_tests")
                    .named("test binary from source root")
                    .working_dir("../"),
                Invocation::new("./tests/dji_tests")
                    .named("test binary from build dir")
                    .working_dir("../build"),
                Invocation::new("ctest")
                    .named("ctest connect flow")
                    .args(["-R", "tst_connect_flow", "-V"])
                    .working_dir("../build"),
            ],
            discovery: DiscoveryPolicy::default(),
            format: TraceFormat::default(),
            timeout_secs: None,
        }
    }
}

impl HarnessConfig {
    /// Parse YAML; working directories are left as written
    pub fn from_yaml_str(content: &str, origin: &Path) -> ConfigResult<Self> {
        let config: Self =
            serde_yaml::from_str(content).map_err(|source| ConfigError::ParseYaml {
                path: origin.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML file and resolve working directories against its directory
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        debug!("Loading parity config: {:?}", path);

        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;

        let base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let base_dir = absolute_dir(base_dir)?;
        Ok(Self::from_yaml_str(&content, path)?.with_base_dir(base_dir))
    }

    /// Load configuration from environment variables
    ///
    /// - `PARITY_CONFIG`: YAML file to load (built-in profile otherwise)
    /// - `PARITY_BASE_DIR`: base for relative working directories of the
    ///   built-in profile (current directory otherwise)
    /// - `PARITY_TIMEOUT_SECS`: overrides `timeout_secs`
    pub fn from_env() -> ConfigResult<Self> {
        let mut config = match env::var_os("PARITY_CONFIG") {
            Some(path) => Self::load(PathBuf::from(path))?,
            None => {
                let base_dir = match env::var_os("PARITY_BASE_DIR") {
                    Some(dir) => absolute_dir(Path::new(&dir))?,
                    None => {
                        env::current_dir().map_err(|source| ConfigError::CurrentDir { source })?
                    }
                };
                Self::default().with_base_dir(base_dir)
            }
        };

        if let Ok(value) = env::var("PARITY_TIMEOUT_SECS") {
            config.timeout_secs = Some(parse_timeout(&value)?);
        }

        Ok(config)
    }

    /// Resolve every relative working directory against `base_dir`
    pub fn with_base_dir(mut self, base_dir: impl AsRef<Path>) -> Self {
        let base_dir = base_dir.as_ref();
        for invocation in std::iter::once(&mut self.reference).chain(self.candidates.iter_mut()) {
            if invocation.working_dir.is_relative() {
                invocation.working_dir = base_dir.join(&invocation.working_dir);
            }
        }
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Reject configurations that cannot describe a run
    pub fn validate(&self) -> ConfigResult<()> {
        if self.reference.command.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "reference.command".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        for (i, candidate) in self.candidates.iter().enumerate() {
            if candidate.command.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: format!("candidates[{}].command", i),
                    reason: "must not be empty".to_string(),
                });
            }
        }

        if self.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

/// Anchor a relative directory at the current directory
fn absolute_dir(dir: &Path) -> ConfigResult<PathBuf> {
    if dir.is_absolute() {
        return Ok(dir.to_path_buf());
    }
    let cwd = env::current_dir().map_err(|source| ConfigError::CurrentDir { source })?;
    Ok(cwd.join(dir))
}

fn parse_timeout(value: &str) -> ConfigResult<u64> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::InvalidValue {
            key: "PARITY_TIMEOUT_SECS".to_string(),
            reason: format!("expected a positive number of seconds, got '{}'", value),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::AcceptPolicy;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_default_profile_order() {
        let config = HarnessConfig::default();
        assert_eq!(config.reference.command, "go");
        let commands: Vec<&str> = config
            .candidates
            .iter()
            .map(|c| c.command.as_str())
            .collect();
        assert_eq!(
            commands,
            vec!["../build/tests/dji_tests", "./tests/dji_tests", "ctest"]
        );
        assert_eq!(config.discovery, DiscoveryPolicy::default());
        assert_eq!(config.format, TraceFormat::Markers);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_yaml_resolves_working_dirs() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            dir.path(),
            "parity.yaml",
            r#"
reference:
  command: go
  args: [test, -run, TestFlow]
  working_dir: ref
candidates:
  - name: built binary
    command: ./dji_tests
    working_dir: /opt/build
  - command: ctest
discovery:
  accept: extracted_frames
  require_success: true
format: records
timeout_secs: 30
"#,
        );

        let config = HarnessConfig::load(&path).unwrap();
        assert_eq!(config.reference.args, vec!["test", "-run", "TestFlow"]);
        assert_eq!(config.reference.working_dir, dir.path().join("ref"));
        assert_eq!(config.candidates[0].name, "built binary");
        assert_eq!(config.candidates[0].working_dir, PathBuf::from("/opt/build"));
        assert_eq!(config.candidates[1].working_dir, dir.path().join("."));
        assert_eq!(config.discovery.accept, AcceptPolicy::ExtractedFrames);
        assert!(config.discovery.require_success);
        assert_eq!(config.format, TraceFormat::Records);
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_yaml_defaults() {
        let config = HarnessConfig::from_yaml_str(
            "reference: {command: go}\ncandidates: []\n",
            Path::new("inline"),
        )
        .unwrap();
        assert!(config.candidates.is_empty());
        assert_eq!(config.discovery.accept, AcceptPolicy::MarkerSubstring);
        assert!(!config.discovery.require_success);
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let empty_cmd = HarnessConfig::from_yaml_str(
            "reference: {command: ''}\ncandidates: []\n",
            Path::new("inline"),
        );
        assert!(matches!(
            empty_cmd,
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "reference.command"
        ));

        let bad_candidate = HarnessConfig::from_yaml_str(
            "reference: {command: go}\ncandidates: [{command: ' '}]\n",
            Path::new("inline"),
        );
        assert!(matches!(
            bad_candidate,
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "candidates[0].command"
        ));

        assert!(parse_timeout("0").is_err());
        assert!(parse_timeout("soon").is_err());
        assert_eq!(parse_timeout(" 45 ").unwrap(), 45);
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = HarnessConfig::from_yaml_str("reference: [", Path::new("broken.yaml"))
            .unwrap_err();
        assert!(err.to_string().contains("broken.yaml"));
    }

    #[test]
    fn test_load_through_relative_path_gives_absolute_dirs() {
        // Created under the current directory so it can be named relatively
        let dir = TempDir::new_in(".").unwrap();
        let rel_dir = PathBuf::from(dir.path().file_name().unwrap());
        let path = write_file(
            &rel_dir,
            "parity.yaml",
            "reference: {command: go}\ncandidates:\n  - {command: ./tests/dji_tests, working_dir: build}\n",
        );
        assert!(path.is_relative());

        let config = HarnessConfig::load(&path).unwrap();

        let expected = env::current_dir().unwrap().join(&rel_dir).join("build");
        assert!(config.candidates[0].working_dir.is_absolute());
        assert_eq!(config.candidates[0].working_dir, expected);
        assert!(config.reference.working_dir.is_absolute());
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = HarnessConfig::load(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }
}
