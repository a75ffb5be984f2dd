//! Retry policy configuration from a JSON file and command-line overrides.

use anyhow::{Context, Result};
use log::debug;
use std::path::Path;
use std::time::Duration;

use crate::http::RetryPolicy;

/// Values given on the command line, each taking precedence over the file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PolicyOverrides {
    pub max_retries: Option<u32>,
    pub min_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
}

/// Reads a policy such as `{"max_retries": 2, "min_delay_ms": 500, "max_delay_ms": 5000}`.
/// Missing fields take their defaults.
pub fn load_policy(path: &Path) -> Result<RetryPolicy> {
    debug!("Loading retry policy from {:?}", path);

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read retry policy from {:?}", path))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse retry policy in {:?}", path))
}

/// Builds the effective policy: defaults, then the optional file, then `overrides`.
pub fn resolve_policy(path: Option<&Path>, overrides: PolicyOverrides) -> Result<RetryPolicy> {
    let base = match path {
        Some(path) => load_policy(path)?,
        None => RetryPolicy::default(),
    };

    let min_delay = overrides
        .min_delay_ms
        .map(Duration::from_millis)
        .unwrap_or(base.min_delay());
    let max_delay = overrides
        .max_delay_ms
        .map(Duration::from_millis)
        .unwrap_or(base.max_delay());
    let max_retries = overrides.max_retries.unwrap_or(base.max_retries());

    RetryPolicy::new(max_retries, min_delay, max_delay).context("Invalid retry policy")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_policy() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("policy.json");
        std::fs::write(
            &path,
            r#"{"max_retries": 4, "min_delay_ms": 100, "max_delay_ms": 800}"#,
        )
        .unwrap();

        let policy = load_policy(&path).unwrap();
        assert_eq!(policy.max_retries(), 4);
        assert_eq!(policy.min_delay(), Duration::from_millis(100));
        assert_eq!(policy.max_delay(), Duration::from_millis(800));
    }

    #[test]
    fn test_load_policy_missing_file() {
        let dir = tempdir().unwrap();
        let err = load_policy(&dir.path().join("missing.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read retry policy"));
    }

    #[test]
    fn test_load_policy_invalid_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("policy.json");
        std::fs::write(&path, "not json").unwrap();

        let err = load_policy(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse retry policy"));
    }

    #[test]
    fn test_resolve_policy_defaults() {
        let policy = resolve_policy(None, PolicyOverrides::default()).unwrap();
        assert_eq!(policy, RetryPolicy::default());
    }

    #[test]
    fn test_resolve_policy_overrides_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("policy.json");
        std::fs::write(&path, r#"{"max_retries": 4, "min_delay_ms": 100}"#).unwrap();

        let overrides = PolicyOverrides {
            max_retries: Some(1),
            max_delay_ms: Some(200),
            ..Default::default()
        };
        let policy = resolve_policy(Some(&path), overrides).unwrap();
        assert_eq!(policy.max_retries(), 1);
        assert_eq!(policy.min_delay(), Duration::from_millis(100));
        assert_eq!(policy.max_delay(), Duration::from_millis(200));
    }

    #[test]
    fn test_resolve_policy_rejects_inverted_overrides() {
        let overrides = PolicyOverrides {
            min_delay_ms: Some(10_000),
            ..Default::default()
        };
        let err = resolve_policy(None, overrides).unwrap_err();
        assert!(err.to_string().contains("Invalid retry policy"));
    }
}
