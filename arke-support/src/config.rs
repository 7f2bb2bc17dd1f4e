//! Node configuration: TCP/WebSocket addresses, database connection, area/broker topology,
//! and the ambient logging and epoch settings, loaded from a TOML file.
use crate::logging::LoggingConfig;
use serde_derive::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_TCP_PORT: u16 = 28008;
pub const DEFAULT_WS_PORT: u16 = 28009;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub tcp_address: String,
    pub ws_address: Option<String>,
    pub max_clients: u16,
    pub worker_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub connection_string: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaConfig {
    pub area_id: Option<u64>,
    pub broker_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub area: AreaConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default = "crate::time::default_epoch_ms_field")]
    pub epoch_ms: u64,
}

impl Default for NodeConfig {
    fn default() -> NodeConfig {
        NodeConfig {
            server: ServerConfig {
                tcp_address: format!("0.0.0.0:{}", DEFAULT_TCP_PORT),
                ws_address: Some(format!("0.0.0.0:{}", DEFAULT_WS_PORT)),
                max_clients: 256,
                worker_count: 4,
            },
            database: DatabaseConfig {
                connection_string: "postgres://localhost/arke".to_owned(),
            },
            area: AreaConfig {
                area_id: None,
                broker_address: None,
            },
            logging: LoggingConfig::default(),
            epoch_ms: crate::time::DEFAULT_EPOCH_MS,
        }
    }
}

impl NodeConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<NodeConfig, serdeconv::Error> {
        serdeconv::from_toml_file(path)
    }

    pub fn is_processor(&self) -> bool {
        self.area.area_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_roundtrips_through_toml() {
        let cfg = NodeConfig::default();
        let toml = serdeconv::to_toml_string(&cfg).expect("serialize");

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(toml.as_bytes()).unwrap();

        let loaded = NodeConfig::load(file.path()).expect("load");
        assert_eq!(loaded.server.tcp_address, cfg.server.tcp_address);
        assert_eq!(loaded.server.worker_count, cfg.server.worker_count);
        assert!(!loaded.is_processor());
    }
}
