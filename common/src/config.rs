use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub deck: DeckConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub compare: CompareConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeckConfig {
    /// Viewer page URL. Prompted for on stdin when left empty.
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_headless")]
    pub headless: bool,
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    #[serde(default = "default_window_height")]
    pub window_height: u32,
    #[serde(default = "default_page_load_wait")]
    pub page_load_wait_secs: u64,
    #[serde(default = "default_present_selector")]
    pub present_selector: String,
    #[serde(default = "default_click_attempts")]
    pub click_attempts: u32,
    #[serde(default = "default_post_entry_wait")]
    pub post_entry_wait_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    #[serde(default = "default_recheck_ms")]
    pub recheck_ms: u64,
    #[serde(default = "default_extra_settle_ms")]
    pub extra_settle_ms: u64,
    #[serde(default = "default_ready_timeout")]
    pub ready_timeout_secs: u64,
    #[serde(default = "default_advance_wait_ms")]
    pub advance_wait_ms: u64,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Consecutive identical captures that mark the end of the deck.
    #[serde(default = "default_max_stagnation")]
    pub max_stagnation: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompareConfig {
    /// `pixel` (luminance difference) or `ahash` (average hash).
    #[serde(default = "default_compare_method")]
    pub method: String,
    #[serde(default = "default_pixel_delta")]
    pub pixel_delta: u8,
    #[serde(default = "default_max_diff_fraction")]
    pub max_diff_fraction: f64,
    #[serde(default = "default_hash_size")]
    pub hash_size: u32,
    #[serde(default = "default_hash_threshold")]
    pub hash_threshold: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_folder")]
    pub folder: String,
    #[serde(default = "default_document_name")]
    pub document_name: String,
    #[serde(default = "default_resolution_dpi")]
    pub resolution_dpi: f64,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    #[serde(default = "default_true")]
    pub save_frames: bool,
    #[serde(default = "default_true")]
    pub dump_partial: bool,
    #[serde(default = "default_true")]
    pub write_manifest: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            window_width: default_window_width(),
            window_height: default_window_height(),
            page_load_wait_secs: default_page_load_wait(),
            present_selector: default_present_selector(),
            click_attempts: default_click_attempts(),
            post_entry_wait_secs: default_post_entry_wait(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            settle_ms: default_settle_ms(),
            recheck_ms: default_recheck_ms(),
            extra_settle_ms: default_extra_settle_ms(),
            ready_timeout_secs: default_ready_timeout(),
            advance_wait_ms: default_advance_wait_ms(),
            retry_attempts: default_retry_attempts(),
            max_stagnation: default_max_stagnation(),
        }
    }
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            method: default_compare_method(),
            pixel_delta: default_pixel_delta(),
            max_diff_fraction: default_max_diff_fraction(),
            hash_size: default_hash_size(),
            hash_threshold: default_hash_threshold(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            folder: default_output_folder(),
            document_name: default_document_name(),
            resolution_dpi: default_resolution_dpi(),
            jpeg_quality: default_jpeg_quality(),
            save_frames: true,
            dump_partial: true,
            write_manifest: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFile(path.display().to_string(), e))?;
        Self::parse(&content)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capture.max_stagnation == 0 {
            return Err(ConfigError::Invalid(
                "capture.max_stagnation must be at least 1".into(),
            ));
        }
        if !(self.output.resolution_dpi > 0.0) {
            return Err(ConfigError::Invalid(
                "output.resolution_dpi must be positive".into(),
            ));
        }
        if !(self.compare.max_diff_fraction > 0.0 && self.compare.max_diff_fraction <= 1.0) {
            return Err(ConfigError::Invalid(
                "compare.max_diff_fraction must be in (0, 1]".into(),
            ));
        }
        if self.compare.hash_size == 0 {
            return Err(ConfigError::Invalid(
                "compare.hash_size must be at least 1".into(),
            ));
        }
        match self.compare.method.as_str() {
            "pixel" | "ahash" => Ok(()),
            other => Err(ConfigError::Invalid(format!(
                "unknown compare.method '{other}', expected 'pixel' or 'ahash'"
            ))),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    ReadFile(String, std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// Default value functions
fn default_headless() -> bool {
    false
}
fn default_window_width() -> u32 {
    1920
}
fn default_window_height() -> u32 {
    1080
}
fn default_page_load_wait() -> u64 {
    5
}
fn default_present_selector() -> String {
    r#"[aria-label="Present"]"#.into()
}
fn default_click_attempts() -> u32 {
    3
}
fn default_post_entry_wait() -> u64 {
    3
}
fn default_settle_ms() -> u64 {
    2000
}
fn default_recheck_ms() -> u64 {
    500
}
fn default_extra_settle_ms() -> u64 {
    1500
}
fn default_ready_timeout() -> u64 {
    5
}
fn default_advance_wait_ms() -> u64 {
    2000
}
fn default_retry_attempts() -> u32 {
    3
}
fn default_max_stagnation() -> u32 {
    10
}
fn default_compare_method() -> String {
    "pixel".into()
}
fn default_pixel_delta() -> u8 {
    25
}
fn default_max_diff_fraction() -> f64 {
    0.02
}
fn default_hash_size() -> u32 {
    16
}
fn default_hash_threshold() -> u32 {
    4
}
fn default_output_folder() -> String {
    "slides".into()
}
fn default_document_name() -> String {
    "presentation.pdf".into()
}
fn default_resolution_dpi() -> f64 {
    100.0
}
fn default_jpeg_quality() -> u8 {
    90
}
fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "info".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.capture.max_stagnation, 10);
        assert_eq!(config.compare.pixel_delta, 25);
        assert!((config.compare.max_diff_fraction - 0.02).abs() < f64::EPSILON);
        assert_eq!(config.compare.method, "pixel");
        assert_eq!(config.output.folder, "slides");
        assert_eq!(config.output.document_name, "presentation.pdf");
        assert!((config.output.resolution_dpi - 100.0).abs() < f64::EPSILON);
        assert_eq!(config.browser.present_selector, r#"[aria-label="Present"]"#);
        assert!(config.deck.url.is_empty());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::parse(
            r#"
            [deck]
            url = "https://example.com/deck"

            [capture]
            max_stagnation = 4

            [compare]
            method = "ahash"
            "#,
        )
        .unwrap();
        assert_eq!(config.deck.url, "https://example.com/deck");
        assert_eq!(config.capture.max_stagnation, 4);
        assert_eq!(config.capture.settle_ms, 2000);
        assert_eq!(config.compare.method, "ahash");
        assert_eq!(config.compare.hash_size, 16);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn zero_stagnation_rejected() {
        let err = Config::parse("[capture]\nmax_stagnation = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unknown_method_rejected() {
        let err = Config::parse("[compare]\nmethod = \"ssim\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn out_of_range_fraction_rejected() {
        let err = Config::parse("[compare]\nmax_diff_fraction = 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = Config::parse("[capture\nmax_stagnation = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config =
            Config::load_or_default(Path::new("/nonexistent/slide-capture/config.toml")).unwrap();
        assert_eq!(config.capture.max_stagnation, 10);
    }
}
