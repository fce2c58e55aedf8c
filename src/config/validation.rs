//! Configuration validation.
//!
//! Serde handles syntax; this module checks values. Every problem is
//! reported, not just the first.

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::HitCounterConfig;
use crate::downstream::HandlerRef;

/// Bounds on `store.read_capacity`.
pub const MIN_READ_CAPACITY: usize = 5;
pub const MAX_READ_CAPACITY: usize = 20;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check every field with semantic constraints.
pub fn validate_config(config: &HitCounterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = config.downstream.target.parse::<HandlerRef>() {
        errors.push(ValidationError::new("downstream.target", e.to_string()));
    }
    if config.downstream.timeout_ms == 0 {
        errors.push(ValidationError::new("downstream.timeout_ms", "must be greater than 0"));
    }

    let table = &config.store.table;
    if table.is_empty() {
        errors.push(ValidationError::new("store.table", "must not be empty"));
    } else if !table
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        errors.push(ValidationError::new(
            "store.table",
            format!("'{}' may only contain letters, digits, '_', '-' and '.'", table),
        ));
    }
    if config.store.timeout_ms == 0 {
        errors.push(ValidationError::new("store.timeout_ms", "must be greater than 0"));
    }
    if !(MIN_READ_CAPACITY..=MAX_READ_CAPACITY).contains(&config.store.read_capacity) {
        errors.push(ValidationError::new(
            "store.read_capacity",
            format!(
                "read_capacity must be between {} and {}",
                MIN_READ_CAPACITY, MAX_READ_CAPACITY
            ),
        ));
    }
    if config.store.flush_interval_secs == 0 {
        errors.push(ValidationError::new("store.flush_interval_secs", "must be greater than 0"));
    }

    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::new("listener.request_timeout_secs", "must be greater than 0"));
    }
    check_addr(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.admin.enabled {
        check_addr(&mut errors, "admin.bind_address", &config.admin.bind_address);
    }
    if config.observability.metrics_enabled {
        check_addr(&mut errors, "observability.metrics_address", &config.observability.metrics_address);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_addr(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(field, format!("'{}' is not a socket address", value)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(validate_config(&HitCounterConfig::default()), Ok(()));
    }

    #[test]
    fn test_read_capacity_bounds() {
        let mut config = HitCounterConfig::default();
        for capacity in [5, 12, 20] {
            config.store.read_capacity = capacity;
            assert!(validate_config(&config).is_ok(), "capacity {} should be valid", capacity);
        }
        for capacity in [0, 4, 21] {
            config.store.read_capacity = capacity;
            let errors = validate_config(&config).unwrap_err();
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].field, "store.read_capacity");
            assert_eq!(errors[0].message, "read_capacity must be between 5 and 20");
        }
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = HitCounterConfig::default();
        config.downstream.target = "ftp://example.com".into();
        config.downstream.timeout_ms = 0;
        config.store.table = "hits/../etc".into();
        config.listener.bind_address = "not-an-address".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "downstream.target",
                "downstream.timeout_ms",
                "store.table",
                "listener.bind_address",
            ]
        );
    }

    #[test]
    fn test_disabled_admin_address_not_checked() {
        let mut config = HitCounterConfig::default();
        config.admin.enabled = false;
        config.admin.bind_address = "garbage".into();
        assert!(validate_config(&config).is_ok());
    }
}
