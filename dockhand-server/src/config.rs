//! Server configuration
//!
//! Everything that used to be ambient process state (working directory,
//! tool names, the identifier scheme) is configured here and passed to the
//! pipeline explicitly, so tests can run isolated servers side by side.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::collaborator::ContainerTimeouts;

/// How deployment identifiers are generated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdScheme {
    /// Random UUID v4 tokens
    Uuid,

    /// Counter resumed past the existing repository directories
    Sequential,
}

impl FromStr for IdScheme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uuid" => Ok(IdScheme::Uuid),
            "sequential" => Ok(IdScheme::Sequential),
            other => anyhow::bail!("unknown id scheme '{}' (expected uuid or sequential)", other),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server listens on
    pub bind_addr: String,

    /// Directory repositories are cloned into, one subdirectory per deployment
    pub repositories_root: PathBuf,

    /// Prefix of every image name built by the pipeline
    pub image_prefix: String,

    /// Built web front end served for all non-API paths
    pub static_dir: PathBuf,

    /// Version-control tool
    pub git_program: String,

    /// Container build tool and runtime (`docker` or `podman`)
    pub container_program: String,

    pub fetch_timeout: Duration,
    pub build_timeout: Duration,
    pub run_timeout: Duration,

    /// Timeout for `ps`, `stop`, `rm` and `rmi`
    pub command_timeout: Duration,

    /// Undo completed stages when a later stage fails
    pub rollback_on_failure: bool,

    pub id_scheme: IdScheme,
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Every variable is optional:
    /// - DOCKHAND_BIND_ADDR (default: 0.0.0.0:3322)
    /// - DOCKHAND_REPOSITORIES_ROOT (default: repositories)
    /// - DOCKHAND_IMAGE_PREFIX (default: repo_image_)
    /// - DOCKHAND_STATIC_DIR (default: frontend/react/dist)
    /// - DOCKHAND_GIT_PROGRAM (default: git)
    /// - DOCKHAND_CONTAINER_PROGRAM (default: docker)
    /// - DOCKHAND_FETCH_TIMEOUT (seconds, default: 300)
    /// - DOCKHAND_BUILD_TIMEOUT (seconds, default: 1800)
    /// - DOCKHAND_RUN_TIMEOUT (seconds, default: 120)
    /// - DOCKHAND_COMMAND_TIMEOUT (seconds, default: 60)
    /// - DOCKHAND_ROLLBACK_ON_FAILURE (true/false, default: false)
    /// - DOCKHAND_ID_SCHEME (uuid/sequential, default: uuid)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with a custom variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let string = |key: &str, default: String| lookup(key).unwrap_or(default);

        let seconds = |key: &str, default: Duration| {
            lookup(key)
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(default)
        };

        let rollback_on_failure = lookup("DOCKHAND_ROLLBACK_ON_FAILURE")
            .and_then(|s| match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Some(true),
                "0" | "false" | "no" | "off" => Some(false),
                _ => None,
            })
            .unwrap_or(defaults.rollback_on_failure);

        let id_scheme = match lookup("DOCKHAND_ID_SCHEME") {
            Some(s) => s.parse()?,
            None => defaults.id_scheme,
        };

        Ok(Self {
            bind_addr: string("DOCKHAND_BIND_ADDR", defaults.bind_addr),
            repositories_root: PathBuf::from(string(
                "DOCKHAND_REPOSITORIES_ROOT",
                defaults.repositories_root.display().to_string(),
            )),
            image_prefix: string("DOCKHAND_IMAGE_PREFIX", defaults.image_prefix),
            static_dir: PathBuf::from(string(
                "DOCKHAND_STATIC_DIR",
                defaults.static_dir.display().to_string(),
            )),
            git_program: string("DOCKHAND_GIT_PROGRAM", defaults.git_program),
            container_program: string("DOCKHAND_CONTAINER_PROGRAM", defaults.container_program),
            fetch_timeout: seconds("DOCKHAND_FETCH_TIMEOUT", defaults.fetch_timeout),
            build_timeout: seconds("DOCKHAND_BUILD_TIMEOUT", defaults.build_timeout),
            run_timeout: seconds("DOCKHAND_RUN_TIMEOUT", defaults.run_timeout),
            command_timeout: seconds("DOCKHAND_COMMAND_TIMEOUT", defaults.command_timeout),
            rollback_on_failure,
            id_scheme,
        })
    }

    pub fn container_timeouts(&self) -> ContainerTimeouts {
        ContainerTimeouts {
            build: self.build_timeout,
            run: self.run_timeout,
            command: self.command_timeout,
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_addr.trim().is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        if self.repositories_root.as_os_str().is_empty() {
            anyhow::bail!("repositories_root cannot be empty");
        }

        if self.git_program.trim().is_empty() {
            anyhow::bail!("git_program cannot be empty");
        }

        if self.container_program.trim().is_empty() {
            anyhow::bail!("container_program cannot be empty");
        }

        // Image references must be lowercase and start alphanumeric
        let prefix_ok = self
            .image_prefix
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            && self.image_prefix.chars().all(|c| {
                c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '-' | '.' | '/')
            });
        if !prefix_ok {
            anyhow::bail!(
                "image_prefix '{}' is not a valid lowercase image name prefix",
                self.image_prefix
            );
        }

        for (name, timeout) in [
            ("fetch_timeout", self.fetch_timeout),
            ("build_timeout", self.build_timeout),
            ("run_timeout", self.run_timeout),
            ("command_timeout", self.command_timeout),
        ] {
            if timeout.is_zero() {
                anyhow::bail!("{} must be greater than 0", name);
            }
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        let timeouts = ContainerTimeouts::default();
        Self {
            bind_addr: "0.0.0.0:3322".to_string(),
            repositories_root: PathBuf::from("repositories"),
            image_prefix: "repo_image_".to_string(),
            static_dir: PathBuf::from("frontend/react/dist"),
            git_program: "git".to_string(),
            container_program: "docker".to_string(),
            fetch_timeout: Duration::from_secs(300),
            build_timeout: timeouts.build,
            run_timeout: timeouts.run,
            command_timeout: timeouts.command,
            rollback_on_failure: false,
            id_scheme: IdScheme::Uuid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.bind_addr, "0.0.0.0:3322");
        assert_eq!(config.image_prefix, "repo_image_");
        assert_eq!(config.container_program, "docker");
        assert_eq!(config.fetch_timeout, Duration::from_secs(300));
        assert!(!config.rollback_on_failure);
        assert_eq!(config.id_scheme, IdScheme::Uuid);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_environment_gives_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        let defaults = Config::default();

        assert_eq!(config.bind_addr, defaults.bind_addr);
        assert_eq!(config.repositories_root, defaults.repositories_root);
        assert_eq!(config.build_timeout, defaults.build_timeout);
    }

    #[test]
    fn test_environment_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("DOCKHAND_BIND_ADDR", "127.0.0.1:9000"),
            ("DOCKHAND_CONTAINER_PROGRAM", "podman"),
            ("DOCKHAND_REPOSITORIES_ROOT", "/var/lib/dockhand"),
            ("DOCKHAND_BUILD_TIMEOUT", "60"),
            ("DOCKHAND_RUN_TIMEOUT", "not-a-number"),
            ("DOCKHAND_ROLLBACK_ON_FAILURE", "true"),
            ("DOCKHAND_ID_SCHEME", "Sequential"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.container_program, "podman");
        assert_eq!(config.repositories_root, PathBuf::from("/var/lib/dockhand"));
        assert_eq!(config.build_timeout, Duration::from_secs(60));
        // Unparseable values fall back to defaults
        assert_eq!(config.run_timeout, Duration::from_secs(120));
        assert!(config.rollback_on_failure);
        assert_eq!(config.id_scheme, IdScheme::Sequential);

        assert_eq!(config.container_timeouts().build, Duration::from_secs(60));
    }

    #[test]
    fn test_unknown_id_scheme_is_rejected() {
        assert!(Config::from_lookup(lookup(&[("DOCKHAND_ID_SCHEME", "random-int")])).is_err());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.image_prefix = "Repo_".to_string();
        assert!(config.validate().is_err());

        config.image_prefix = "_repo".to_string();
        assert!(config.validate().is_err());

        config.image_prefix = "registry.local/apps/repo-".to_string();
        assert!(config.validate().is_ok());

        config.container_program = String::new();
        assert!(config.validate().is_err());
        config.container_program = "podman".to_string();

        config.command_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }
}
