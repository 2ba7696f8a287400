//! Command handlers
//!
//! Each handler builds configuration (environment first, flags on top),
//! invokes the library and maps the result to a process exit code so the
//! scheduled batch job can alert on failures.

use crate::cli::commands::{CheckArgs, ScanArgs};
use crate::config::{RunMode, ScanConfig};
use crate::pipeline::run_scan;
use crate::secrets::{resolve_credentials, SecretsManagerProvider};
use tracing::{debug, error, info};

const EXIT_OK: i32 = 0;
const EXIT_FAILURE: i32 = 1;
const EXIT_CONFIG: i32 = 2;

pub async fn handle_scan(args: &ScanArgs) -> i32 {
    let mut config = match ScanConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            return EXIT_CONFIG;
        }
    };
    apply_overrides(&mut config, args);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return EXIT_CONFIG;
    }

    debug!("{}", config);

    match run_scan(config).await {
        Ok(outcome) => {
            info!(
                "Inventoried {} repositories across {} pages -> {}",
                outcome.repositories, outcome.pages, outcome.destination
            );
            EXIT_OK
        }
        Err(e) => {
            error!("Scan failed in stage '{}': {}", e.stage(), e);
            EXIT_FAILURE
        }
    }
}

pub async fn handle_check(_args: &CheckArgs) -> i32 {
    let config = match ScanConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            return EXIT_CONFIG;
        }
    };

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return EXIT_CONFIG;
    }

    let provider = SecretsManagerProvider::from_env().await;
    match resolve_credentials(&provider, &config.client_id, &config.secret_name).await {
        Ok(credentials) => {
            info!(
                "Configuration OK | org: {} | destination: {} | token expires: {:?}",
                config.organization,
                config.destination(),
                credentials.expires_at
            );
            EXIT_OK
        }
        Err(e) => {
            error!("Credential check failed: {}", e);
            EXIT_FAILURE
        }
    }
}

fn apply_overrides(config: &mut ScanConfig, args: &ScanArgs) {
    if let Some(org) = &args.org {
        config.organization = org.clone();
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(max_retries) = args.max_retries {
        config.max_retries = max_retries;
    }
    if let Some(deadline) = args.deadline_secs {
        config.deadline_secs = Some(deadline);
    }
    if args.local || args.output.is_some() {
        config.run_mode = RunMode::Development;
    }
    if let Some(output) = &args.output {
        config.output_path = output.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn base_config() -> ScanConfig {
        ScanConfig {
            organization: "acme".to_string(),
            client_id: String::new(),
            secret_name: String::new(),
            batch_size: 30,
            max_retries: 5,
            run_mode: RunMode::Production,
            bucket: Some("bucket".to_string()),
            key: Some("key".to_string()),
            output_path: PathBuf::from("repositories.json"),
            request_timeout_secs: 30,
            deadline_secs: None,
            log_level: "info".to_string(),
        }
    }

    fn scan_args() -> ScanArgs {
        ScanArgs {
            org: None,
            batch_size: None,
            max_retries: None,
            local: false,
            output: None,
            deadline_secs: None,
        }
    }

    #[test]
    fn overrides_replace_env_values() {
        let mut config = base_config();
        let mut args = scan_args();
        args.org = Some("other-org".to_string());
        args.batch_size = Some(10);
        args.deadline_secs = Some(60);

        apply_overrides(&mut config, &args);

        assert_eq!(config.organization, "other-org");
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.deadline_secs, Some(60));
        assert_eq!(config.run_mode, RunMode::Production);
    }

    #[test]
    fn local_flag_forces_development_mode() {
        let mut config = base_config();
        let mut args = scan_args();
        args.local = true;

        apply_overrides(&mut config, &args);
        assert_eq!(config.run_mode, RunMode::Development);
    }

    #[test]
    fn output_path_implies_local() {
        let mut config = base_config();
        let mut args = scan_args();
        args.output = Some(PathBuf::from("/tmp/out.json"));

        apply_overrides(&mut config, &args);
        assert_eq!(config.run_mode, RunMode::Development);
        assert_eq!(config.output_path, PathBuf::from("/tmp/out.json"));
    }
}
