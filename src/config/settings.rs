use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use anyhow::{anyhow, Result};

/// Network transport used by the capture server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionType {
    Unicast,
    Multicast,
}

impl Default for ConnectionType {
    fn default() -> Self {
        ConnectionType::Multicast
    }
}

impl FromStr for ConnectionType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Unicast" => Ok(ConnectionType::Unicast),
            "Multicast" => Ok(ConnectionType::Multicast),
            _ => Err(anyhow!("Unknown connection type: {}", s)),
        }
    }
}

/// Joint naming scheme of the streamed skeletons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamingConvention {
    Motive,
    #[serde(rename = "FBX")]
    Fbx,
    #[serde(rename = "BVH")]
    Bvh,
    UnrealEngine,
}

impl NamingConvention {
    /// Key used for this convention in the joint mapping file
    pub fn as_str(&self) -> &'static str {
        match self {
            NamingConvention::Motive => "Motive",
            NamingConvention::Fbx => "FBX",
            NamingConvention::Bvh => "BVH",
            NamingConvention::UnrealEngine => "UnrealEngine",
        }
    }
}

impl Default for NamingConvention {
    fn default() -> Self {
        NamingConvention::Fbx
    }
}

impl fmt::Display for NamingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NamingConvention {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Motive" => Ok(NamingConvention::Motive),
            "FBX" => Ok(NamingConvention::Fbx),
            "BVH" => Ok(NamingConvention::Bvh),
            "UnrealEngine" => Ok(NamingConvention::UnrealEngine),
            _ => Err(anyhow!("Unknown naming convention: {}", s)),
        }
    }
}

/// Settings used to open a connection to the capture server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSettings {
    pub server_address: String,
    pub client_address: String,
    #[serde(default)]
    pub connection_type: ConnectionType,
    #[serde(default)]
    pub naming_convention: NamingConvention,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            server_address: "127.0.0.1".to_string(),
            client_address: "127.0.0.1".to_string(),
            connection_type: ConnectionType::Multicast,
            naming_convention: NamingConvention::Fbx,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = ConnectionSettings::default();
        assert_eq!(settings.server_address, "127.0.0.1");
        assert_eq!(settings.connection_type, ConnectionType::Multicast);
        assert_eq!(settings.naming_convention, NamingConvention::Fbx);
    }

    #[test]
    fn test_naming_convention_keys() {
        let json = serde_json::to_string(&NamingConvention::UnrealEngine).unwrap();
        assert_eq!(json, "\"UnrealEngine\"");

        let parsed: NamingConvention = serde_json::from_str("\"BVH\"").unwrap();
        assert_eq!(parsed, NamingConvention::Bvh);
        assert_eq!("FBX".parse::<NamingConvention>().unwrap(), NamingConvention::Fbx);
        assert!("fbx".parse::<NamingConvention>().is_err());
    }

    #[test]
    fn test_settings_partial_json() {
        let json = r#"{"serverAddress": "10.0.0.2", "clientAddress": "10.0.0.5", "connectionType": "Unicast"}"#;
        let settings: ConnectionSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.connection_type, ConnectionType::Unicast);
        assert_eq!(settings.naming_convention, NamingConvention::Fbx);
    }
}
