//! Configuration for the peer service
//!
//! Values come from built-in defaults, then an optional config file, then
//! `MEDDATA_PEER_*` environment variables. Command-line flags are applied on
//! top by the binary.

use std::net::SocketAddr;

use config::{Config, Environment, File};
use meddata_core::CoreConfig;
use serde::{Deserialize, Serialize};

use crate::error::{PeerError, Result};

/// Prefix of the environment variables read by the peer
pub const ENV_PREFIX: &str = "MEDDATA_PEER";

/// Peer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerConfig {
    /// Address the HTTP API listens on
    pub listen_addr: String,

    /// Name of the hosted channel
    pub channel: String,

    /// Name of the hosted chaincode
    pub chaincode: String,

    /// Log filter when `RUST_LOG` is unset; the core configuration's level otherwise
    pub log_level: Option<String>,

    /// Path of a JSON `CoreConfig`; built-in defaults when unset
    pub core_config: Option<String>,
}

impl Default for PeerConfig {
    fn default() -> Self {
        PeerConfig {
            listen_addr: "0.0.0.0:8080".to_string(),
            channel: "ttchannel".to_string(),
            chaincode: "ttdata".to_string(),
            log_level: None,
            core_config: None,
        }
    }
}

impl PeerConfig {
    /// Load the configuration, reading `path` when given
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path));
        }
        let config: PeerConfig = builder
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parsed listen address
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(self.listen_addr.parse()?)
    }

    /// Default log filter, used when `RUST_LOG` is unset
    pub fn log_filter(&self, core: &CoreConfig) -> String {
        match &self.log_level {
            Some(level) => level.clone(),
            None => core.log_level.clone(),
        }
    }

    /// Load the core configuration named by `core_config`, defaults when unset
    pub fn load_core_config(&self) -> Result<CoreConfig> {
        match &self.core_config {
            Some(path) => Ok(CoreConfig::from_file(path)?),
            None => Ok(CoreConfig::default()),
        }
    }

    /// Check the values the service relies on
    pub fn validate(&self) -> Result<()> {
        if self.channel.is_empty() {
            return Err(PeerError::Config("channel must not be empty".to_string()));
        }
        if self.chaincode.is_empty() {
            return Err(PeerError::Config("chaincode must not be empty".to_string()));
        }
        self.socket_addr()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = PeerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.socket_addr().unwrap().port(), 8080);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "listen_addr = \"127.0.0.1:9000\"").unwrap();
        writeln!(file, "chaincode = \"meddata\"").unwrap();

        let config = PeerConfig::load(file.path().to_str()).unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.chaincode, "meddata");
        // unset fields keep their defaults
        assert_eq!(config.channel, "ttchannel");
        assert_eq!(config.core_config, None);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let config = PeerConfig { listen_addr: "nowhere".to_string(), ..PeerConfig::default() };
        assert!(matches!(config.validate(), Err(PeerError::AddrParse(_))));

        let config = PeerConfig { channel: String::new(), ..PeerConfig::default() };
        assert!(matches!(config.validate(), Err(PeerError::Config(_))));
    }

    #[test]
    fn test_log_filter_falls_back_to_core_level() {
        let core = CoreConfig::development();
        let config = PeerConfig::default();
        assert_eq!(config.log_filter(&core), "debug");
        assert_eq!(config.log_filter(&CoreConfig::default()), "info");

        let config = PeerConfig { log_level: Some("warn,meddata_core=trace".to_string()), ..PeerConfig::default() };
        assert_eq!(config.log_filter(&core), "warn,meddata_core=trace");
    }

    #[test]
    fn test_core_config_file_drives_log_filter() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap().to_string();
        CoreConfig::development().to_file(&path).unwrap();

        let config = PeerConfig { core_config: Some(path), ..PeerConfig::default() };
        let core = config.load_core_config().unwrap();
        assert_eq!(config.log_filter(&core), "debug");
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(PeerConfig::load(path.to_str()).is_err());
    }
}
