/// Constants shared by the extract, transform and load stages.

// Catalog site
pub const BASE_URL: &str = "https://fashion-studio.dicoding.dev/";
pub const SOURCE_NAME: &str = "fashion_studio";
pub const DEFAULT_USER_AGENT: &str = concat!("catalog_scraper/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_DELAY_MS: u64 = 1000;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

// Sentinel values the site uses in place of real data
pub const UNKNOWN_PRODUCT: &str = "Unknown Product";
pub const UNAVAILABLE_MARKER: &str = "unavailable";
pub const INVALID_RATING_MARKER: &str = "Invalid";

// USD -> IDR
pub const DEFAULT_EXCHANGE_RATE: u32 = 16_000;

// CLI / sink defaults
pub const DEFAULT_PAGES: u32 = 50;
pub const DEFAULT_OUTPUT: &str = "products.csv";
pub const DEFAULT_CREDENTIALS: &str = "google-sheets-api.json";
pub const DEFAULT_SHEET_RANGE: &str = "Sheet1!A1";
pub const DEFAULT_TABLE: &str = "products";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

// Environment variables
pub const ENV_SPREADSHEET_ID: &str = "SPREADSHEET_ID";
pub const ENV_CREDS_PATH: &str = "CREDS_PATH";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_METRICS_PORT: &str = "CATALOG_METRICS_PORT";

// Sink names, as they appear in logs and metrics labels
pub const CSV_SINK: &str = "csv";
pub const GOOGLE_SHEETS_SINK: &str = "google_sheets";
pub const POSTGRES_SINK: &str = "postgres";

/// URL of a catalog page. Page 1 is the site root, later pages live at `pageN`.
pub fn page_url(base_url: &str, page: u32) -> String {
    if page <= 1 {
        base_url.to_string()
    } else {
        let base = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        format!("{base}page{page}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_is_site_root() {
        assert_eq!(page_url(BASE_URL, 1), "https://fashion-studio.dicoding.dev/");
    }

    #[test]
    fn later_pages_use_page_suffix() {
        assert_eq!(page_url(BASE_URL, 7), "https://fashion-studio.dicoding.dev/page7");
        assert_eq!(page_url("http://localhost:8080", 2), "http://localhost:8080/page2");
    }
}
