//! Configuration validation

use super::Config;
use crate::dataplane::IpPrefix;

#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    pub fn error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn print_diagnostics(&self) {
        for warning in &self.warnings {
            println!("[WARN] {}", warning);
        }
        for error in &self.errors {
            println!("[ERROR] {}", error);
        }
    }
}

/// Validate configuration and return warnings/errors
pub fn validate(config: &Config) -> ValidationResult {
    let mut result = ValidationResult::new();

    validate_firewall(config, &mut result);
    validate_flow(config, &mut result);
    validate_logging(config, &mut result);

    result
}

fn validate_firewall(config: &Config, result: &mut ValidationResult) {
    let fw = &config.firewall;

    for (list, entries) in [("blacklist", &fw.blacklist), ("whitelist", &fw.whitelist)] {
        for (i, entry) in entries.iter().enumerate() {
            if IpPrefix::parse(entry).is_none() {
                result.error(format!(
                    "firewall.{}[{}]: '{}' is not an IP address or prefix",
                    list, i, entry
                ));
            }
        }
    }

    for entry in &fw.blacklist {
        if fw.whitelist.iter().any(|w| w.trim() == entry.trim()) {
            result.warn(format!(
                "firewall: '{}' is in both lists, whitelist wins",
                entry
            ));
        }
    }

    if fw.blacklist.is_empty() && !fw.whitelist.is_empty() {
        result.warn("firewall.whitelist has no effect without a blacklist");
    }
}

fn validate_flow(config: &Config, result: &mut ValidationResult) {
    let flow = &config.flow;

    if flow.idle_timeout == 0 {
        result.warn("flow.idle_timeout is 0, rules never expire when idle");
    }
    if flow.hard_timeout == 0 {
        result.warn("flow.hard_timeout is 0, rules never expire unconditionally");
    }

    if flow.idle_timeout != 0 && flow.hard_timeout != 0 && flow.idle_timeout >= flow.hard_timeout
    {
        result.error(format!(
            "flow: idle_timeout ({}) must be shorter than hard_timeout ({})",
            flow.idle_timeout, flow.hard_timeout
        ));
    }
}

fn validate_logging(config: &Config, result: &mut ValidationResult) {
    let logging = &config.logging;

    if !["error", "warn", "info", "debug", "trace"].contains(&logging.level.to_lowercase().as_str())
    {
        result.warn(format!(
            "logging.level: unknown level '{}', using info",
            logging.level
        ));
    }

    if !["pretty", "compact", "json"].contains(&logging.format.as_str()) {
        result.warn(format!(
            "logging.format: unknown format '{}', using pretty",
            logging.format
        ));
    }
}
