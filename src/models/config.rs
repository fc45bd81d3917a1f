//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Upper bound for `crawler.timeout_secs`.
pub const MAX_TIMEOUT_SECS: u64 = 600;
/// Upper bound for `crawler.run_deadline_secs` (one day).
pub const MAX_RUN_DEADLINE_SECS: u64 = 86_400;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Output locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Merge behavior for re-crawls
    #[serde(default)]
    pub merge: MergeConfig,

    /// Crawl sources per target
    #[serde(default)]
    pub sources: SourcesConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(AppError::validation(format!(
                "crawler.timeout_secs must be <= {MAX_TIMEOUT_SECS}"
            )));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        if self.crawler.run_deadline_secs == Some(0) {
            return Err(AppError::validation(
                "crawler.run_deadline_secs must be > 0 when set",
            ));
        }
        if self
            .crawler
            .run_deadline_secs
            .is_some_and(|secs| secs > MAX_RUN_DEADLINE_SECS)
        {
            return Err(AppError::validation(format!(
                "crawler.run_deadline_secs must be <= {MAX_RUN_DEADLINE_SECS}"
            )));
        }
        for (name, source) in [
            ("creatures", &self.sources.creatures),
            ("tools", &self.sources.tools),
        ] {
            url::Url::parse(&source.base_url).map_err(|e| {
                AppError::validation(format!("sources.{name}.base_url is invalid: {e}"))
            })?;
            if !source.listing.starts_with('/') {
                return Err(AppError::validation(format!(
                    "sources.{name}.listing must start with '/'"
                )));
            }
            for section in &source.list_sections {
                scraper::Selector::parse(&section.selector)
                    .map_err(|e| AppError::selector(&section.selector, format!("{e:?}")))?;
            }
        }
        url::Url::parse(&self.sources.enchantments.url).map_err(|e| {
            AppError::validation(format!("sources.enchantments.url is invalid: {e}"))
        })?;
        if self.sources.enchantments.sections.is_empty() {
            return Err(AppError::validation("No enchantment sections defined"));
        }
        Ok(())
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Maximum concurrent requests
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Delay before each request in milliseconds
    #[serde(default)]
    pub request_delay_ms: u64,

    /// Log throughput every N completed pages
    #[serde(default = "defaults::progress_every")]
    pub progress_every: usize,

    /// Overall deadline for one batch of page fetches
    #[serde(default)]
    pub run_deadline_secs: Option<u64>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_concurrent: defaults::max_concurrent(),
            request_delay_ms: 0,
            progress_every: defaults::progress_every(),
            run_deadline_secs: None,
        }
    }
}

/// Output locations. Relative paths resolve against the storage directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "defaults::data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "defaults::log_dir")]
    pub log_dir: PathBuf,
}

impl PathsConfig {
    /// Resolve the data directory against a storage root.
    pub fn resolve_data_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.data_dir)
    }

    /// Resolve the log directory against a storage root.
    pub fn resolve_log_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.log_dir)
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: defaults::data_dir(),
            log_dir: defaults::log_dir(),
        }
    }
}

/// Merge behavior for re-crawls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Drop persisted Records whose keys the fresh crawl did not produce.
    /// Off by default: stale Records are carried forward.
    #[serde(default)]
    pub drop_stale: bool,
}

/// Crawl sources per target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "defaults::creatures_source")]
    pub creatures: PageSourceConfig,

    #[serde(default = "defaults::tools_source")]
    pub tools: PageSourceConfig,

    #[serde(default)]
    pub enchantments: TableSourceConfig,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            creatures: defaults::creatures_source(),
            tools: defaults::tools_source(),
            enchantments: TableSourceConfig::default(),
        }
    }
}

/// A site with one listing page and one page per entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSourceConfig {
    /// Site origin, e.g. `https://fischipedia.org`
    pub base_url: String,

    /// Path of the listing page, e.g. `/wiki/Fish`
    pub listing: String,

    /// Where on the listing page entity links are read from
    #[serde(default)]
    pub scope: ListingScope,

    /// Extra list fields read from outside the infobox
    #[serde(default)]
    pub list_sections: Vec<ListSection>,
}

impl PageSourceConfig {
    /// Full URL of the listing page.
    pub fn listing_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.listing)
    }

    /// Full URL of an entity page.
    pub fn page_url(&self, title: &str) -> String {
        format!(
            "{}/wiki/{}",
            self.base_url.trim_end_matches('/'),
            title.replace(' ', "_")
        )
    }
}

/// Which links on a listing page are entity links.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ListingScope {
    /// Every content link in the document
    #[default]
    All,

    /// Row links of tables whose header matches
    Tables {
        /// Header that must be present
        #[serde(default = "defaults::required_column")]
        required: String,

        /// At least one of these headers must be present
        #[serde(default = "defaults::any_of_columns")]
        any_of: Vec<String>,
    },
}

/// A list field read from containers outside the infobox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSection {
    /// CSS selector of the container
    pub selector: String,

    /// Field name to store the list under
    pub field: String,
}

/// The single-page, table-per-category enchantment source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSourceConfig {
    #[serde(default = "defaults::enchantments_url")]
    pub url: String,

    #[serde(default = "defaults::enchantment_sections")]
    pub sections: Vec<TableSection>,
}

impl Default for TableSourceConfig {
    fn default() -> Self {
        Self {
            url: defaults::enchantments_url(),
            sections: defaults::enchantment_sections(),
        }
    }
}

/// A heading on the enchantment page and the category key it maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSection {
    /// Text the section heading contains
    pub heading: String,

    /// Category key stored on each enchantment
    pub key: String,
}

mod defaults {
    use std::path::PathBuf;

    use super::{ListSection, ListingScope, PageSourceConfig, TableSection};

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
            .into()
    }
    pub fn timeout() -> u64 {
        20
    }
    pub fn max_concurrent() -> usize {
        50
    }
    pub fn progress_every() -> usize {
        25
    }

    // Path defaults
    pub fn data_dir() -> PathBuf {
        PathBuf::from("data")
    }
    pub fn log_dir() -> PathBuf {
        PathBuf::from("logs")
    }

    // Source defaults
    const FISCHIPEDIA: &str = "https://fischipedia.org";

    pub fn creatures_source() -> PageSourceConfig {
        PageSourceConfig {
            base_url: FISCHIPEDIA.into(),
            listing: "/wiki/Fish".into(),
            scope: ListingScope::All,
            list_sections: Vec::new(),
        }
    }

    pub fn tools_source() -> PageSourceConfig {
        PageSourceConfig {
            base_url: FISCHIPEDIA.into(),
            listing: "/wiki/Fishing_Rods".into(),
            scope: ListingScope::Tables {
                required: required_column(),
                any_of: any_of_columns(),
            },
            list_sections: vec![ListSection {
                selector: "div[class*='enchanting']".into(),
                field: "recommended_enchants".into(),
            }],
        }
    }

    pub fn required_column() -> String {
        "name".into()
    }
    pub fn any_of_columns() -> Vec<String> {
        vec!["cost".into(), "price".into(), "obtained from".into()]
    }

    pub fn enchantments_url() -> String {
        "https://fisch.fandom.com/wiki/Enchantments".into()
    }

    pub fn enchantment_sections() -> Vec<TableSection> {
        [
            ("Regular Enchantments", "regular"),
            ("Exalted Enchantments", "exalted"),
            ("Cosmic Enchantments", "cosmic"),
            ("Twisted Enchantments", "twisted"),
            ("Song of the Deep Enchantments", "song_of_the_deep"),
        ]
        .into_iter()
        .map(|(heading, key)| TableSection {
            heading: heading.into(),
            key: key.into(),
        })
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.crawler.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.crawler.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unbounded_timeouts() {
        let mut config = Config::default();
        config.crawler.timeout_secs = u64::MAX;
        assert!(matches!(config.validate(), Err(AppError::Validation(_))));

        let mut config = Config::default();
        config.crawler.run_deadline_secs = Some(u64::MAX);
        assert!(matches!(config.validate(), Err(AppError::Validation(_))));

        let mut config = Config::default();
        config.crawler.timeout_secs = MAX_TIMEOUT_SECS;
        config.crawler.run_deadline_secs = Some(MAX_RUN_DEADLINE_SECS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_list_selector() {
        let mut config = Config::default();
        config.sources.tools.list_sections[0].selector = "[[invalid".to_string();
        assert!(matches!(
            config.validate(),
            Err(AppError::Selector { .. })
        ));
    }

    #[test]
    fn defaults_match_source_site() {
        let config = Config::default();
        assert_eq!(config.crawler.max_concurrent, 50);
        assert_eq!(
            config.sources.creatures.listing_url(),
            "https://fischipedia.org/wiki/Fish"
        );
        assert_eq!(
            config.sources.creatures.page_url("Great White Shark"),
            "https://fischipedia.org/wiki/Great_White_Shark"
        );
        assert!(!config.merge.drop_stale);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml = r#"
            [crawler]
            max_concurrent = 8

            [merge]
            drop_stale = true

            [sources.tools]
            base_url = "https://wiki.example"
            listing = "/wiki/Rods"
            scope = { kind = "tables", required = "rod" }
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.crawler.max_concurrent, 8);
        assert_eq!(config.crawler.timeout_secs, 20);
        assert!(config.merge.drop_stale);
        assert_eq!(
            config.sources.tools.scope,
            ListingScope::Tables {
                required: "rod".to_string(),
                any_of: vec!["cost".into(), "price".into(), "obtained from".into()],
            }
        );
        assert!(config.sources.tools.list_sections.is_empty());
        assert_eq!(config.sources.creatures.listing, "/wiki/Fish");
        assert_eq!(config.sources.enchantments.sections.len(), 5);
    }
}
