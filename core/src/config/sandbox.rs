//! Sandbox settings and the container spec derived from them

use super::scalar;
use crate::error::ConfigError;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_IMAGE: &str = "python:3.12-slim";
pub const DEFAULT_WORK_DIR: &str = "/workspace";
pub const DEFAULT_MEMORY_LIMIT: &str = "512m";
pub const DEFAULT_CPU_LIMIT: f64 = 1.0;
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// CFS scheduler period used to express the CPU limit as a quota
pub const CPU_PERIOD: i64 = 100_000;

/// Smallest quota the kernel accepts; zero would mean no limit at all
pub const MIN_CPU_QUOTA: i64 = 1_000;

const MEMORY_FIELD: &str = "sandbox.memory_limit";

/// Docker-style memory size such as `512m` or `1g`.
///
/// Units are binary multiples (`k` = 1024). The spelling from the file is kept for
/// display and serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryLimit {
    raw: String,
    bytes: u64,
}

impl MemoryLimit {
    pub fn from_bytes(bytes: u64) -> Result<Self, ConfigError> {
        if bytes == 0 {
            return Err(ConfigError::invalid(MEMORY_FIELD, "0 (must be positive)"));
        }
        Ok(Self {
            raw: bytes.to_string(),
            bytes,
        })
    }

    /// Size in bytes
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl Default for MemoryLimit {
    fn default() -> Self {
        Self {
            raw: DEFAULT_MEMORY_LIMIT.to_string(),
            bytes: 512 * 1024 * 1024,
        }
    }
}

impl FromStr for MemoryLimit {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lower = trimmed.to_ascii_lowercase();
        let split = lower
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(lower.len());
        let (number, unit) = lower.split_at(split);

        // `1g` and `1gb` are the same size
        let unit = match unit.strip_suffix('b') {
            Some(prefix) if !prefix.is_empty() => prefix,
            _ => unit,
        };
        let multiplier: u64 = match unit {
            "" | "b" => 1,
            "k" => 1 << 10,
            "m" => 1 << 20,
            "g" => 1 << 30,
            "t" => 1 << 40,
            _ => return Err(ConfigError::invalid(MEMORY_FIELD, s)),
        };

        let bytes = if number.contains('.') {
            number
                .parse::<f64>()
                .ok()
                .map(|n| n * multiplier as f64)
                .filter(|n| n.is_finite() && *n < u64::MAX as f64)
                .map(|n| n as u64)
        } else {
            number
                .parse::<u64>()
                .ok()
                .and_then(|n| n.checked_mul(multiplier))
        };

        let bytes = bytes
            .filter(|&n| n > 0)
            .ok_or_else(|| ConfigError::invalid(MEMORY_FIELD, s))?;

        Ok(Self {
            raw: trimmed.to_string(),
            bytes,
        })
    }
}

impl fmt::Display for MemoryLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for MemoryLimit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for MemoryLimit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MemoryLimitVisitor;

        impl<'de> Visitor<'de> for MemoryLimitVisitor {
            type Value = MemoryLimit;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a byte count or a size string like \"512m\"")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<MemoryLimit, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<MemoryLimit, E> {
                MemoryLimit::from_bytes(v).map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<MemoryLimit, E> {
                let bytes = u64::try_from(v)
                    .map_err(|_| E::custom(ConfigError::invalid(MEMORY_FIELD, v)))?;
                self.visit_u64(bytes)
            }
        }

        deserializer.deserialize_any(MemoryLimitVisitor)
    }
}

/// Settings for the container sandbox that runs model-generated code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxSettings {
    /// Whether tools should run inside the sandbox
    pub use_sandbox: bool,

    /// Container image reference
    #[serde(deserialize_with = "scalar::string")]
    pub image: String,

    /// Working directory inside the container
    #[serde(deserialize_with = "scalar::string")]
    pub work_dir: String,

    pub memory_limit: MemoryLimit,

    /// CPU limit in cores (fractional allowed)
    pub cpu_limit: f64,

    /// Command timeout in seconds
    pub timeout: u64,

    pub network_enabled: bool,
}

impl Default for SandboxSettings {
    fn default() -> Self {
        Self {
            use_sandbox: false,
            image: DEFAULT_IMAGE.to_string(),
            work_dir: DEFAULT_WORK_DIR.to_string(),
            memory_limit: MemoryLimit::default(),
            cpu_limit: DEFAULT_CPU_LIMIT,
            timeout: DEFAULT_TIMEOUT_SECS,
            network_enabled: false,
        }
    }
}

impl SandboxSettings {
    /// Validate the sandbox settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.image.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "sandbox.image".to_string(),
            });
        }

        if !self.work_dir.starts_with('/') {
            return Err(ConfigError::invalid(
                "sandbox.work_dir",
                format!("{} (must be an absolute container path)", self.work_dir),
            ));
        }

        if !(self.cpu_limit.is_finite() && self.cpu_limit > 0.0) {
            return Err(ConfigError::invalid(
                "sandbox.cpu_limit",
                format!("{} (must be positive)", self.cpu_limit),
            ));
        }

        if self.cpu_quota() < MIN_CPU_QUOTA {
            return Err(ConfigError::invalid(
                "sandbox.cpu_limit",
                format!(
                    "{} (must be at least {})",
                    self.cpu_limit,
                    MIN_CPU_QUOTA as f64 / CPU_PERIOD as f64
                ),
            ));
        }

        if self.timeout == 0 {
            return Err(ConfigError::invalid("sandbox.timeout", "0 (must be positive)"));
        }

        Ok(())
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Docker network mode for these settings
    pub fn network_mode(&self) -> &'static str {
        if self.network_enabled {
            "bridge"
        } else {
            "none"
        }
    }

    /// CPU quota per [`CPU_PERIOD`], truncated toward zero
    pub fn cpu_quota(&self) -> i64 {
        (CPU_PERIOD as f64 * self.cpu_limit) as i64
    }

    /// Resolve a container path against the working directory.
    ///
    /// Relative paths are joined onto `work_dir`; absolute paths are kept.
    /// Any `..` component is rejected.
    pub fn resolve_path(&self, path: &str) -> Result<String, ConfigError> {
        if path.split('/').any(|component| component == "..") {
            return Err(ConfigError::UnsafePath {
                path: path.to_string(),
            });
        }

        if path.starts_with('/') {
            Ok(path.to_string())
        } else {
            Ok(format!("{}/{}", self.work_dir.trim_end_matches('/'), path))
        }
    }

    /// Build the container spec a sandbox engine would create from these settings.
    ///
    /// `volume_bindings` maps host paths to container paths.
    pub fn container_spec(&self, volume_bindings: &BTreeMap<String, String>) -> ContainerSpec {
        let suffix = uuid::Uuid::new_v4().simple().to_string();

        let binds = volume_bindings
            .iter()
            .map(|(host, container)| {
                (
                    host.clone(),
                    BindMount {
                        bind: container.clone(),
                        mode: "rw".to_string(),
                    },
                )
            })
            .collect();

        ContainerSpec {
            name: format!("sandbox_{}", &suffix[..8]),
            image: self.image.clone(),
            command: "tail -f /dev/null".to_string(),
            hostname: "sandbox".to_string(),
            working_dir: self.work_dir.clone(),
            tty: true,
            host_config: HostConfig {
                mem_limit: self.memory_limit.bytes(),
                cpu_period: CPU_PERIOD,
                cpu_quota: self.cpu_quota(),
                network_mode: self.network_mode().to_string(),
                binds,
            },
        }
    }
}

/// Container creation parameters derived from [`SandboxSettings`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub command: String,
    pub hostname: String,
    pub working_dir: String,
    pub tty: bool,
    pub host_config: HostConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Memory limit in bytes
    pub mem_limit: u64,
    pub cpu_period: i64,
    pub cpu_quota: i64,
    pub network_mode: String,
    /// Host path -> mount
    pub binds: BTreeMap<String, BindMount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindMount {
    pub bind: String,
    pub mode: String,
}
