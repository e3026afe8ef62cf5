//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check tunnel prefixes are well-formed and unique
//! - Validate upstream hosts and schemes
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use crate::config::schema::ProxyConfig;
use thiserror::Error;

/// A single semantic problem found in the configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("tunnel prefix {0:?} must start with '/'")]
    PrefixMissingSlash(String),

    #[error("tunnel prefix {0:?} must not end with '/'")]
    PrefixTrailingSlash(String),

    #[error("duplicate tunnel prefix {0:?}")]
    DuplicatePrefix(String),

    #[error("tunnel {0:?} has an empty default_host")]
    EmptyDefaultHost(String),

    #[error("tunnel {prefix:?} has unsupported upstream_scheme {scheme:?}")]
    BadScheme { prefix: String, scheme: String },
}

/// Check a loaded configuration for semantic problems.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for tunnel in &config.tunnels {
        if !tunnel.prefix.starts_with('/') {
            errors.push(ValidationError::PrefixMissingSlash(tunnel.prefix.clone()));
        }
        if tunnel.prefix.len() > 1 && tunnel.prefix.ends_with('/') {
            errors.push(ValidationError::PrefixTrailingSlash(tunnel.prefix.clone()));
        }
        if !seen.insert(tunnel.prefix.clone()) {
            errors.push(ValidationError::DuplicatePrefix(tunnel.prefix.clone()));
        }
        if tunnel.default_host.is_empty() {
            errors.push(ValidationError::EmptyDefaultHost(tunnel.prefix.clone()));
        }
        if tunnel.upstream_scheme != "http" && tunnel.upstream_scheme != "https" {
            errors.push(ValidationError::BadScheme {
                prefix: tunnel.prefix.clone(),
                scheme: tunnel.upstream_scheme.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
