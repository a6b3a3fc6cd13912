use serde::Deserialize;

/// Chart dimensions accepted from the environment, in pixels.
const CHART_DIMENSION_RANGE: std::ops::RangeInclusive<u32> = 100..=4000;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub max_body_bytes: usize,
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,
    pub chart_width: u32,
    pub chart_height: u32,
}

fn positive<T>(name: &str, default: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    let raw = std::env::var(name).unwrap_or_else(|_| default.to_string());
    let value: T = raw
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("{} must be a valid positive number, got '{}'", name, raw))?;
    if value <= T::default() {
        anyhow::bail!("{} must be greater than zero", name);
    }
    Ok(value)
}

fn chart_dimension(name: &str, default: &str) -> anyhow::Result<u32> {
    let value: u32 = positive(name, default)?;
    if !CHART_DIMENSION_RANGE.contains(&value) {
        anyhow::bail!(
            "{} must be between {} and {}",
            name,
            CHART_DIMENSION_RANGE.start(),
            CHART_DIMENSION_RANGE.end()
        );
    }
    Ok(value)
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            host: std::env::var("HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string())
                .trim()
                .to_string(),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            max_body_bytes: positive("MAX_BODY_BYTES", "5242880")?,
            rate_limit_per_second: positive("RATE_LIMIT_PER_SECOND", "10")?,
            rate_limit_burst: positive("RATE_LIMIT_BURST", "20")?,
            chart_width: chart_dimension("CHART_WIDTH", "600")?,
            chart_height: chart_dimension("CHART_HEIGHT", "400")?,
        };

        if config.host.is_empty() {
            anyhow::bail!("HOST cannot be empty");
        }

        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Bind address: {}", config.bind_addr());
        tracing::debug!(
            "Body limit: {} bytes, rate limit: {}/s (burst {})",
            config.max_body_bytes,
            config.rate_limit_per_second,
            config.rate_limit_burst
        );
        tracing::debug!(
            "Chart size: {}x{}",
            config.chart_width,
            config.chart_height
        );

        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
