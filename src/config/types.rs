use crate::url::NormalizedUrl;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File name of the hash database inside the output folder
pub const DEFAULT_DATABASE_NAME: &str = ".site-folio.db";

/// Main configuration structure for Site-Folio
///
/// Every section is optional in the TOML file; missing keys take their
/// defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Number of concurrent render workers
    pub workers: usize,

    /// Maximum number of URLs waiting in the frontier
    #[serde(rename = "queue-capacity")]
    pub queue_capacity: usize,

    /// Per-page render timeout (seconds)
    #[serde(rename = "render-timeout-secs")]
    pub render_timeout_secs: u64,

    /// Stop dispatching after this many pages (0 = unlimited)
    #[serde(rename = "max-pages")]
    pub max_pages: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            queue_capacity: 10_000,
            render_timeout_secs: 30,
            max_pages: 0,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Folder receiving the PDFs (default: `results/{host}-pdfs`)
    pub directory: Option<PathBuf>,

    /// Path to the SQLite hash database (default: inside the output folder)
    #[serde(rename = "database-path")]
    pub database_path: Option<PathBuf>,

    /// Whether to write `crawl-report.md` into the output folder
    pub report: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: None,
            database_path: None,
            report: true,
        }
    }
}

impl OutputConfig {
    /// Returns the output folder for a crawl of `seed`
    ///
    /// # Examples
    ///
    /// ```
    /// use site_folio::config::OutputConfig;
    /// use site_folio::normalize;
    ///
    /// let seed = normalize("https://docs.example.com/", None).unwrap();
    /// let dir = OutputConfig::default().resolve_directory(&seed);
    /// assert!(dir.ends_with("docs-example-com-pdfs"));
    /// ```
    pub fn resolve_directory(&self, seed: &NormalizedUrl) -> PathBuf {
        match &self.directory {
            Some(dir) => dir.clone(),
            None => {
                let folder = seed.host_key().replace(['.', ':'], "-");
                Path::new("results").join(format!("{}-pdfs", folder))
            }
        }
    }

    /// Returns the hash database path for an output folder
    pub fn resolve_database_path(&self, output_dir: &Path) -> PathBuf {
        match &self.database_path {
            Some(path) => path.clone(),
            None => output_dir.join(DEFAULT_DATABASE_NAME),
        }
    }
}

/// Render engine configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Chromium executable (default: `CHROMIUM_PATH` or auto-detection)
    #[serde(rename = "chrome-path")]
    pub chrome_path: Option<PathBuf>,

    /// Run without a visible window
    pub headless: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: true,
        }
    }
}
