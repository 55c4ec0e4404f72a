//! API service configuration

use anyhow::{Context, Result, bail};
use common::models::DEFAULT_THUMBNAIL_SIZES;

/// Configuration for the API service
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Port the HTTP server binds to
    pub port: u16,
    /// Thumbnail widths requested for every uploaded image
    pub thumbnail_sizes: Vec<u32>,
}

impl ApiConfig {
    /// Create a new ApiConfig from environment variables
    ///
    /// # Environment Variables
    /// - `API_PORT`: HTTP port (default: 3001)
    /// - `THUMBNAIL_SIZES`: Comma separated widths (default: "500,250,100")
    pub fn from_env() -> Result<Self> {
        let port = std::env::var("API_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3001);

        let thumbnail_sizes = match std::env::var("THUMBNAIL_SIZES") {
            Ok(raw) => parse_sizes(&raw)?,
            Err(_) => DEFAULT_THUMBNAIL_SIZES.to_vec(),
        };

        Ok(Self {
            port,
            thumbnail_sizes,
        })
    }
}

fn parse_sizes(raw: &str) -> Result<Vec<u32>> {
    let sizes = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>()
                .with_context(|| format!("Invalid thumbnail size: {}", s))
        })
        .collect::<Result<Vec<_>>>()?;

    if sizes.is_empty() || sizes.contains(&0) {
        bail!("THUMBNAIL_SIZES must list positive widths, got {:?}", raw);
    }
    Ok(sizes)
}
