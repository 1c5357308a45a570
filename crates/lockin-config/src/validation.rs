//! Configuration validation

use crate::policy::MAX_DURATION_LIMIT_MINUTES;
use crate::schema::RawConfig;
use lockin_api::Domain;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("service.check_interval_minutes must be at least 1 (got {0})")]
    InvalidCheckInterval(u64),

    #[error(
        "lockdown.max_duration_minutes must be between 1 and {max} (got {0})",
        max = MAX_DURATION_LIMIT_MINUTES
    )]
    InvalidMaxDuration(i64),

    #[error("{field}: {message}")]
    InvalidDomain { field: String, message: String },

    #[error("aliases.groups[{index}] needs at least two domains")]
    AliasGroupTooSmall { index: usize },
}

/// Validate a raw configuration, collecting every error
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(interval) = config.service.check_interval_minutes
        && interval < 1
    {
        errors.push(ValidationError::InvalidCheckInterval(interval));
    }

    if let Some(max) = config.lockdown.max_duration_minutes
        && !(1..=MAX_DURATION_LIMIT_MINUTES).contains(&max)
    {
        errors.push(ValidationError::InvalidMaxDuration(max));
    }

    for (i, raw) in config.lockdown.default_allowlist.iter().enumerate() {
        if let Err(e) = Domain::parse(raw) {
            errors.push(ValidationError::InvalidDomain {
                field: format!("lockdown.default_allowlist[{}]", i),
                message: e.to_string(),
            });
        }
    }

    for (index, group) in config.aliases.groups.iter().enumerate() {
        if group.domains.len() < 2 {
            errors.push(ValidationError::AliasGroupTooSmall { index });
        }
        for (j, raw) in group.domains.iter().enumerate() {
            if let Err(e) = Domain::parse(raw) {
                errors.push(ValidationError::InvalidDomain {
                    field: format!("aliases.groups[{}].domains[{}]", index, j),
                    message: e.to_string(),
                });
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RawAliasGroup, RawAliases, RawLockdownConfig, RawServiceConfig};

    fn base() -> RawConfig {
        RawConfig {
            config_version: 1,
            service: RawServiceConfig::default(),
            lockdown: RawLockdownConfig::default(),
            aliases: RawAliases::default(),
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&base()).is_empty());
    }

    #[test]
    fn zero_interval_rejected() {
        let mut config = base();
        config.service.check_interval_minutes = Some(0);

        let errors = validate_config(&config);
        assert!(matches!(errors[..], [ValidationError::InvalidCheckInterval(0)]));
    }

    #[test]
    fn max_duration_bounded() {
        let mut config = base();

        config.lockdown.max_duration_minutes = Some(MAX_DURATION_LIMIT_MINUTES);
        assert!(validate_config(&config).is_empty());

        config.lockdown.max_duration_minutes = Some(MAX_DURATION_LIMIT_MINUTES + 1);
        let errors = validate_config(&config);
        assert!(matches!(
            errors[..],
            [ValidationError::InvalidMaxDuration(m)] if m == MAX_DURATION_LIMIT_MINUTES + 1
        ));

        config.lockdown.max_duration_minutes = Some(i64::MAX);
        assert_eq!(validate_config(&config).len(), 1);
    }

    #[test]
    fn collects_all_errors() {
        let mut config = base();
        config.lockdown.max_duration_minutes = Some(-5);
        config.lockdown.default_allowlist = vec!["github.com".into(), "bad host".into()];
        config.aliases.groups = vec![RawAliasGroup {
            domains: vec!["solo.example".into()],
        }];

        let errors = validate_config(&config);
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::InvalidDomain { field, .. } if field == "lockdown.default_allowlist[1]"
        )));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::AliasGroupTooSmall { index: 0 })));
    }
}
