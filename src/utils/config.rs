use std::env;

pub const NDBC_BASE_URL: &str = "https://www.ndbc.noaa.gov/data/realtime2";
pub const NOMADS_BASE_URL: &str = "https://nomads.ncep.noaa.gov/dods/wave/gfswave";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub ndbc_base_url: String,
    pub nomads_base_url: String,
    /// Optional on-disk catalogue; the embedded one is used when unset.
    pub stations_file: Option<String>,
    pub is_production: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| "Invalid PORT value")?;

        let ndbc_base_url =
            env::var("NDBC_BASE_URL").unwrap_or_else(|_| NDBC_BASE_URL.to_string());

        let nomads_base_url =
            env::var("NOMADS_BASE_URL").unwrap_or_else(|_| NOMADS_BASE_URL.to_string());

        let stations_file = env::var("STATIONS_FILE").ok();

        let is_production = env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            == "production";

        Ok(Config {
            host,
            port,
            ndbc_base_url,
            nomads_base_url,
            stations_file,
            is_production,
        })
    }
}
