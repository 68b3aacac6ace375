//! Slack deal notifications via `chat.postMessage`

use super::{Notifier, NotifyError};
use crate::config::NotifyConfig;
use crate::store::StoredSignal;
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

/// Slack Web API base URL
pub const SLACK_API_URL: &str = "https://slack.com/api";

/// "private_jet" -> "Private Jet"
pub fn display_asset_type(asset_type: &str) -> String {
    asset_type
        .replace('_', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Round a price to whole cents
pub fn round_cents(value: f64) -> Option<Decimal> {
    Decimal::from_f64(value)
        .map(|amount| amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// Dollar amount with thousands separators and cents, e.g. `$12,500.00`
pub fn format_money(value: f64) -> String {
    let Some(rounded) = round_cents(value) else {
        return format!("${:.2}", value);
    };
    let text = format!("{:.2}", rounded.abs());
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("${}{}.{}", sign, grouped, cents)
}

/// Fallback text shown in notifications and clients without block support
pub fn fallback_text(signal: &StoredSignal) -> String {
    format!("New Deal Signal: {}", signal.asset_type)
}

/// Block Kit blocks for a deal
pub fn format_deal_message(signal: &StoredSignal) -> Value {
    let asset_type = display_asset_type(&signal.asset_type);
    let z_score = signal
        .z_score
        .map(|z| format!("{:.2}", z))
        .unwrap_or_else(|| "N/A".to_string());
    let last_price = format_money(signal.last_price);
    let rolling_mean = format_money(signal.rolling_mean_30d);

    json!([
        {
            "type": "header",
            "text": {
                "type": "plain_text",
                "text": format!(":money_with_wings: New Deal Signal: {}", asset_type),
                "emoji": true
            }
        },
        {
            "type": "section",
            "fields": [
                {"type": "mrkdwn", "text": format!("*Asset Type:*\n{}", asset_type)},
                {"type": "mrkdwn", "text": format!("*Current Price:*\n{}", last_price)},
                {"type": "mrkdwn", "text": format!("*30-Day Avg Price:*\n{}", rolling_mean)},
                {"type": "mrkdwn", "text": format!("*Z-Score:*\n{}", z_score)}
            ]
        },
        {"type": "divider"}
    ])
}

#[derive(Debug, Deserialize)]
struct SlackResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Posts deal signals to a Slack channel
pub struct SlackNotifier {
    client: Client,
    api_url: String,
    token: String,
    channel: String,
}

impl SlackNotifier {
    /// Create a notifier with an explicit bot token
    pub fn new(config: &NotifyConfig, token: impl Into<String>) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: token.into(),
            channel: config.channel.clone(),
        })
    }

    /// Create a notifier reading the bot token from the configured environment variable
    pub fn from_env(config: &NotifyConfig) -> Result<Self, NotifyError> {
        let token = std::env::var(&config.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| NotifyError::MissingToken(config.token_env.clone()))?;
        Self::new(config, token)
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn notify(&self, signal: &StoredSignal) -> Result<(), NotifyError> {
        if !signal.is_deal {
            tracing::debug!(
                asset_type = %signal.asset_type,
                "Signal is not a deal, no notification sent"
            );
            return Ok(());
        }

        let url = format!("{}/chat.postMessage", self.api_url);
        let body = json!({
            "channel": self.channel,
            "text": fallback_text(signal),
            "blocks": format_deal_message(signal),
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Api(format!("{} - {}", status, body)));
        }

        let reply: SlackResponse = response.json().await?;
        if !reply.ok {
            return Err(NotifyError::Api(
                reply.error.unwrap_or_else(|| "unknown_error".to_string()),
            ));
        }

        tracing::info!(
            asset_type = %signal.asset_type,
            channel = %self.channel,
            "Deal notification posted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn deal(asset_type: &str, z_score: Option<f64>) -> StoredSignal {
        StoredSignal {
            asset_type: asset_type.to_string(),
            last_price: 7_250_000.0,
            rolling_mean_30d: 9_100_000.5,
            z_score,
            is_deal: true,
            updated_at: Utc::now(),
        }
    }

    /// Serve one canned JSON response and hand back the raw request
    async fn one_shot_server(body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\n\
                 Content-Type: application/json\r\n\
                 Content-Length: {}\r\n\
                 Connection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&request).to_string()
        });
        (format!("http://{}", addr), handle)
    }

    fn config(api_url: String) -> NotifyConfig {
        NotifyConfig {
            enabled: true,
            api_url,
            channel: "#deals".to_string(),
            ..NotifyConfig::default()
        }
    }

    #[test]
    fn test_display_asset_type() {
        assert_eq!(display_asset_type("private_jet"), "Private Jet");
        assert_eq!(display_asset_type("watch"), "Watch");
        assert_eq!(display_asset_type("WINE"), "Wine");
    }

    #[test]
    fn test_round_cents() {
        assert_eq!(round_cents(1234.567), Some(dec!(1234.57)));
        assert_eq!(round_cents(40.0), Some(dec!(40.00)));
        assert_eq!(round_cents(f64::NAN), None);
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(40.0), "$40.00");
        assert_eq!(format_money(1234.5), "$1,234.50");
        assert_eq!(format_money(9_100_000.5), "$9,100,000.50");
        assert_eq!(format_money(999.999), "$1,000.00");
        assert_eq!(format_money(-5.0), "$-5.00");
    }

    #[test]
    fn test_format_deal_message() {
        let blocks = format_deal_message(&deal("private_jet", Some(-2.345)));
        assert_eq!(blocks.as_array().unwrap().len(), 3);
        assert_eq!(
            blocks[0]["text"]["text"],
            ":money_with_wings: New Deal Signal: Private Jet"
        );
        let fields = blocks[1]["fields"].as_array().unwrap();
        assert_eq!(fields[0]["text"], "*Asset Type:*\nPrivate Jet");
        assert_eq!(fields[1]["text"], "*Current Price:*\n$7,250,000.00");
        assert_eq!(fields[2]["text"], "*30-Day Avg Price:*\n$9,100,000.50");
        assert_eq!(fields[3]["text"], "*Z-Score:*\n-2.35");
        assert_eq!(blocks[2]["type"], "divider");
    }

    #[test]
    fn test_format_without_z_score() {
        let blocks = format_deal_message(&deal("watch", None));
        assert_eq!(blocks[1]["fields"][3]["text"], "*Z-Score:*\nN/A");
    }

    #[test]
    fn test_from_env_requires_token() {
        let config = NotifyConfig {
            token_env: "DEAL_SIGNALS_TEST_UNSET_TOKEN".to_string(),
            ..NotifyConfig::default()
        };
        assert!(matches!(
            SlackNotifier::from_env(&config),
            Err(NotifyError::MissingToken(_))
        ));
    }

    #[tokio::test]
    async fn test_posts_deal() {
        let (url, server) = one_shot_server(r#"{"ok":true}"#).await;
        let notifier = SlackNotifier::new(&config(url), "xoxb-test").unwrap();

        notifier.notify(&deal("watch", Some(-3.1))).await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /chat.postMessage"));
        assert!(request.contains("Bearer xoxb-test"));
        assert!(request.contains("New Deal Signal: watch"));
        assert!(request.contains("#deals"));
    }

    #[tokio::test]
    async fn test_slack_error_surfaces() {
        let (url, server) = one_shot_server(r#"{"ok":false,"error":"channel_not_found"}"#).await;
        let notifier = SlackNotifier::new(&config(url), "xoxb-test").unwrap();

        let err = notifier.notify(&deal("wine", Some(-2.5))).await.unwrap_err();
        assert!(matches!(err, NotifyError::Api(ref e) if e == "channel_not_found"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_non_deal_is_not_posted() {
        let config = config("http://127.0.0.1:9".to_string());
        let notifier = SlackNotifier::new(&config, "xoxb-test").unwrap();
        let mut signal = deal("watch", Some(0.4));
        signal.is_deal = false;
        assert!(notifier.notify(&signal).await.is_ok());
    }
}
