// src/config/validate.rs

use std::collections::HashMap;
use std::time::Duration;

use crate::config::model::{Options, RawConfigFile, RunnerConfig};
use crate::errors::{Result, TfrunnerError};
use crate::retry::RetryMatcher;
use crate::vars::Value;

impl TryFrom<RawConfigFile> for RunnerConfig {
    type Error = TfrunnerError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let section = raw.runner;

        let working_dir = match section.working_dir {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => {
                return Err(TfrunnerError::ConfigError(
                    "[runner].working_dir is required".to_string(),
                ));
            }
        };

        let time_between_retries = section
            .time_between_retries
            .as_deref()
            .map(|s| parse_field_duration("time_between_retries", s))
            .transpose()?
            .unwrap_or_default();

        let graceful_shutdown_timeout = match section.graceful_shutdown_timeout.as_deref() {
            Some(s) => {
                let d = parse_field_duration("graceful_shutdown_timeout", s)?;
                if d.is_zero() {
                    return Err(TfrunnerError::ConfigError(
                        "[runner].graceful_shutdown_timeout must be > 0".to_string(),
                    ));
                }
                d
            }
            None => Duration::ZERO,
        };

        if let Some(ws) = section.workspace.as_deref() {
            if ws.trim().is_empty() {
                return Err(TfrunnerError::ConfigError(
                    "[runner].workspace must not be empty".to_string(),
                ));
            }
        }

        let retry_patterns: HashMap<String, String> = raw.retry.into_iter().collect();
        // Fail at load time rather than at first use.
        RetryMatcher::new(&retry_patterns)?;

        let variables: HashMap<String, Value> = raw
            .vars
            .into_iter()
            .map(|(k, v)| (k, Value::from(v)))
            .collect();

        let options = Options {
            working_dir,
            binary: section.binary.unwrap_or_default(),
            variables,
            var_files: section.var_files,
            env: raw.env.into_iter().collect(),
            retry_patterns,
            max_retries: section.max_retries,
            time_between_retries,
            graceful_shutdown_timeout,
            disable_color: section.disable_color,
            stdout: None,
            stderr: None,
        };

        Ok(RunnerConfig {
            options,
            workspace: section.workspace,
            materialize_vars: section.materialize_vars,
        })
    }
}

fn parse_field_duration(field: &str, value: &str) -> Result<Duration> {
    parse_duration(value)
        .map_err(|e| TfrunnerError::ConfigError(format!("[runner].{field}: {e}")))
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => scaled_secs(value, 60),
        "h" => scaled_secs(value, 60 * 60),
        _ => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            unit
        )),
    }
}

fn scaled_secs(value: u64, factor: u64) -> std::result::Result<Duration, String> {
    value
        .checked_mul(factor)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration too large: {value} x {factor}s"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(toml_text: &str) -> RawConfigFile {
        toml::from_str(toml_text).unwrap()
    }

    #[test]
    fn durations() {
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration("3s"), Ok(Duration::from_secs(3)));
        assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
        assert_eq!(parse_duration(" 1h "), Ok(Duration::from_secs(3600)));
        assert!(parse_duration("").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("10d").is_err());
        assert!(parse_duration("s").is_err());
        assert!(parse_duration("99999999999999999h").is_err());
        assert!(parse_duration("999999999999999999m").is_err());
        assert_eq!(
            parse_duration("18446744073709551615s"),
            Ok(Duration::from_secs(u64::MAX))
        );
    }

    #[test]
    fn minimal_config() {
        let cfg = RunnerConfig::try_from(raw("[runner]\nworking_dir = \"infra\"\n")).unwrap();
        assert_eq!(cfg.options.working_dir, std::path::PathBuf::from("infra"));
        assert_eq!(cfg.options.max_retries, 0);
        assert!(cfg.workspace.is_none());
        assert!(!cfg.materialize_vars);
    }

    #[test]
    fn full_config() {
        let cfg = RunnerConfig::try_from(raw(
            r#"
            [runner]
            working_dir = "infra"
            binary = "/usr/local/bin/terraform"
            max_retries = 2
            time_between_retries = "500ms"
            graceful_shutdown_timeout = "30s"
            disable_color = true
            var_files = ["a.tfvars"]
            workspace = "e2e-test"

            [env]
            TF_IN_AUTOMATION = "1"

            [retry]
            "connection reset by peer" = "connection reset"

            [vars]
            count = 3
            "#,
        ))
        .unwrap();

        let o = &cfg.options;
        assert_eq!(o.max_retries, 2);
        assert_eq!(o.time_between_retries, Duration::from_millis(500));
        assert_eq!(o.graceful_shutdown_timeout, Duration::from_secs(30));
        assert!(o.disable_color);
        assert_eq!(o.env.get("TF_IN_AUTOMATION").map(String::as_str), Some("1"));
        assert_eq!(o.retry_patterns.len(), 1);
        assert_eq!(o.variables.get("count"), Some(&Value::Int(3)));
        assert_eq!(cfg.workspace.as_deref(), Some("e2e-test"));
    }

    #[test]
    fn missing_working_dir_is_rejected() {
        let err = RunnerConfig::try_from(raw("[runner]\nmax_retries = 1\n")).unwrap_err();
        assert!(matches!(err, TfrunnerError::ConfigError(_)));
    }

    #[test]
    fn zero_graceful_timeout_is_rejected() {
        let err = RunnerConfig::try_from(raw(
            "[runner]\nworking_dir = \"x\"\ngraceful_shutdown_timeout = \"0s\"\n",
        ))
        .unwrap_err();
        assert!(err.to_string().contains("graceful_shutdown_timeout"));
    }

    #[test]
    fn bad_retry_pattern_is_rejected() {
        let err = RunnerConfig::try_from(raw(
            "[runner]\nworking_dir = \"x\"\n[retry]\n\"[invalid\" = \"bad\"\n",
        ))
        .unwrap_err();
        assert!(matches!(err, TfrunnerError::InvalidRetryPattern { .. }));
    }
}
