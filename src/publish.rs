use std::future::Future;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};

use crate::config::InfluxConfig;
use crate::format::{Point, encode_batch};

const WRITE_PATH: &str = "/api/v2/write";

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("failed to reach metrics endpoint")]
    Transport(#[from] reqwest::Error),
    #[error("metrics endpoint answered {status}: {body}")]
    Status { status: u16, body: String },
}

/// Destination for one cycle's worth of points.
pub trait Publish {
    fn publish(&self, points: &[Point]) -> impl Future<Output = Result<(), PublishError>> + Send;
}

/// Writes points to an InfluxDB v2 `/api/v2/write` endpoint.
pub struct InfluxPublisher {
    client: reqwest::Client,
    write_url: String,
    query: [(&'static str, String); 3],
    authorization: String,
}

impl InfluxPublisher {
    pub fn new(config: &InfluxConfig, token: &str) -> Result<Self, PublishError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            client,
            write_url: format!("{}{WRITE_PATH}", config.url.trim_end_matches('/')),
            query: [
                ("org", config.org.clone()),
                ("bucket", config.bucket.clone()),
                ("precision", config.precision.clone()),
            ],
            authorization: format!("{} {token}", config.auth_scheme),
        })
    }

    pub fn write_url(&self) -> &str {
        &self.write_url
    }
}

impl Publish for InfluxPublisher {
    async fn publish(&self, points: &[Point]) -> Result<(), PublishError> {
        let response = self
            .client
            .post(&self.write_url)
            .query(&self.query)
            .header(AUTHORIZATION, &self.authorization)
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(encode_batch(points))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(PublishError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

/// Logs the line-protocol body instead of sending it.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunPublisher;

impl Publish for DryRunPublisher {
    async fn publish(&self, points: &[Point]) -> Result<(), PublishError> {
        for point in points {
            tracing::info!(target: "cpuloads::dry_run", "{}", point.to_line());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_url_ignores_trailing_slash() {
        let config = InfluxConfig {
            url: "http://influx.local:8086/".to_string(),
            ..InfluxConfig::default()
        };
        let publisher = InfluxPublisher::new(&config, "t").unwrap();
        assert_eq!(
            publisher.write_url(),
            "http://influx.local:8086/api/v2/write"
        );
        assert_eq!(publisher.authorization, "Token t");
    }

    #[test]
    fn status_error_message_includes_body() {
        let err = PublishError::Status {
            status: 401,
            body: "unauthorized access".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "metrics endpoint answered 401: unauthorized access"
        );
    }
}
