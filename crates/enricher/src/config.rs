//! Service configuration from flags and environment.

use clap::Parser;
use notify::channels::slack::ENV_SLACK_WEBHOOK_URL;

use crate::registry::ecr::DEFAULT_REGION;
use crate::registry::EcrConfig;

/// Alert enrichment webhook - enriches Alertmanager alerts and forwards them to Slack
#[derive(Debug, Clone, Parser)]
#[command(name = "enricher")]
#[command(version)]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "ENRICHER_ADDR", default_value = "0.0.0.0:5000")]
    pub addr: String,

    /// Slack incoming webhook URL
    #[arg(long, env = ENV_SLACK_WEBHOOK_URL)]
    pub slack_webhook_url: Option<String>,

    /// AWS region of the image registry
    #[arg(long, env = "AWS_REGION", default_value = DEFAULT_REGION)]
    pub aws_region: String,

    /// ECR API endpoint override
    #[arg(long, env = "ECR_ENDPOINT")]
    pub ecr_endpoint: Option<String>,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "text")]
    pub log_format: LogFormat,

    /// Timeout for outbound HTTP requests, in seconds
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value = "30")]
    pub http_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl Config {
    #[must_use]
    pub fn ecr(&self) -> EcrConfig {
        EcrConfig {
            region: self.aws_region.clone(),
            endpoint: self.ecr_endpoint.clone().filter(|e| !e.is_empty()),
            timeout_secs: self.http_timeout_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let config = Config::try_parse_from([
            "enricher",
            "--addr",
            "127.0.0.1:8080",
            "--slack-webhook-url",
            "https://hooks.slack.test/T/B/x",
            "--aws-region",
            "eu-west-1",
            "--ecr-endpoint",
            "http://localhost:4566",
            "--log-format",
            "json",
            "--http-timeout-secs",
            "5",
        ])
        .unwrap();

        assert_eq!(config.addr, "127.0.0.1:8080");
        assert_eq!(
            config.slack_webhook_url.as_deref(),
            Some("https://hooks.slack.test/T/B/x")
        );
        assert_eq!(config.log_format, LogFormat::Json);

        let ecr = config.ecr();
        assert_eq!(ecr.region, "eu-west-1");
        assert_eq!(ecr.endpoint.as_deref(), Some("http://localhost:4566"));
        assert_eq!(ecr.timeout_secs, 5);
    }

    #[test]
    fn test_rejects_unknown_log_format() {
        assert!(Config::try_parse_from(["enricher", "--log-format", "xml"]).is_err());
    }
}
