//! Deals command implementation

use crate::config::Config;
use crate::notify::{display_asset_type, format_money};
use crate::store::{SignalStore, SqliteSignalStore, StoredSignal};
use clap::{Args, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Args, Debug)]
pub struct DealsArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

/// Render deals as an aligned text table
pub fn render_table(deals: &[StoredSignal]) -> String {
    let mut out = format!(
        "{:<16} {:>18} {:>18} {:>8}  {}\n",
        "ASSET TYPE", "PRICE", "30D AVG", "Z", "UPDATED"
    );
    for deal in deals {
        let z_score = deal
            .z_score
            .map(|z| format!("{:.2}", z))
            .unwrap_or_else(|| "N/A".to_string());
        out.push_str(&format!(
            "{:<16} {:>18} {:>18} {:>8}  {}\n",
            display_asset_type(&deal.asset_type),
            format_money(deal.last_price),
            format_money(deal.rolling_mean_30d),
            z_score,
            deal.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    out
}

impl DealsArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let path = &config.store.database_path;
        if !path.exists() {
            anyhow::bail!("Signal store not found: {}", path.display());
        }

        let store = SqliteSignalStore::open(path)?;
        let deals = store.deals().await?;
        tracing::debug!(count = deals.len(), "Loaded deals");

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&deals)?),
            OutputFormat::Table if deals.is_empty() => println!("No current deals"),
            OutputFormat::Table => print!("{}", render_table(&deals)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_render_table() {
        let deals = vec![StoredSignal {
            asset_type: "private_jet".to_string(),
            last_price: 7_250_000.0,
            rolling_mean_30d: 9_100_000.0,
            z_score: Some(-2.41),
            is_deal: true,
            updated_at: Utc.with_ymd_and_hms(2026, 3, 2, 8, 30, 0).unwrap(),
        }];

        let table = render_table(&deals);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("ASSET TYPE"));
        assert!(lines[1].starts_with("Private Jet"));
        assert!(lines[1].contains("$7,250,000.00"));
        assert!(lines[1].contains("-2.41"));
        assert!(lines[1].ends_with("2026-03-02 08:30:00 UTC"));
    }
}
