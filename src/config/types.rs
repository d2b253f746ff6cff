//! Configuration types

use crate::telemetry::LogConfig;
use serde::{Deserialize, Serialize};

/// Default idle timeout of installed rules, in seconds
pub const DEFAULT_IDLE_TIMEOUT: u16 = 5;
/// Default hard timeout of installed rules, in seconds
pub const DEFAULT_HARD_TIMEOUT: u16 = 15;

/// Controller configuration (config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub firewall: FirewallConfig,
    #[serde(default)]
    pub flow: FlowConfig,
    #[serde(default)]
    pub logging: LogConfig,
}

/// Address lists applied before learning
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct FirewallConfig {
    #[serde(default)]
    pub blacklist: Vec<String>,
    #[serde(default)]
    pub whitelist: Vec<String>,
}

impl FirewallConfig {
    /// Append comma-separated entries, as given on the command line
    pub fn extend_from_args(&mut self, blacklist: Option<&str>, whitelist: Option<&str>) {
        self.blacklist.extend(split_list(blacklist));
        self.whitelist.extend(split_list(whitelist));
    }
}

fn split_list(arg: Option<&str>) -> Vec<String> {
    arg.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

/// Timeouts attached to every rule installed on a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct FlowConfig {
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout: u16,
    #[serde(default = "default_hard_timeout")]
    pub hard_timeout: u16,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            hard_timeout: DEFAULT_HARD_TIMEOUT,
        }
    }
}

fn default_idle_timeout() -> u16 {
    DEFAULT_IDLE_TIMEOUT
}

fn default_hard_timeout() -> u16 {
    DEFAULT_HARD_TIMEOUT
}
