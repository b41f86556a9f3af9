//! Application configuration for the harmonizer.
//!
//! User config lives at `~/.harmonizer/harmonizer.toml`.
//! CLI flags override config file values, which override defaults.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{HarmonizerError, Result};
use crate::types::record_stem;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "harmonizer.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".harmonizer";

// ---------------------------------------------------------------------------
// Config structs (matching harmonizer.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Corpus locations.
    #[serde(default)]
    pub corpus: CorpusConfig,

    /// Record-level data patches and policies.
    #[serde(default)]
    pub records: RecordsConfig,

    /// Markup cleanup settings.
    #[serde(default)]
    pub markup: MarkupConfig,

    /// Serialization settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// External schema validator.
    #[serde(default)]
    pub validation: ValidationConfig,
}

/// `[corpus]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Directory holding the primary (publisher) corpus.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_dir: Option<String>,

    /// Directories holding the secondary (archival) corpus.
    #[serde(default)]
    pub secondary_dirs: Vec<String>,

    /// Directory harmonized records are written to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,

    /// Optional key=value file mapping secondary file stems to primary stems.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias_table: Option<String>,
}

/// `[records]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordsConfig {
    /// Identities treated as dual-origin even when their source under-reports
    /// the number of publication blocks.
    #[serde(default)]
    pub dual_origin_overrides: Vec<String>,

    /// Identities excluded from the run as structurally broken.
    #[serde(default = "default_excluded")]
    pub excluded: Vec<String>,

    /// Phrases marking a publication block as a mere mention.
    #[serde(default = "default_mention_markers")]
    pub mention_markers: Vec<String>,

    /// Proceed with an empty overlay when a record has no overlay file.
    #[serde(default)]
    pub allow_missing_overlay: bool,

    /// Extension appended to a record's file name to locate its overlay.
    #[serde(default = "default_overlay_extension")]
    pub overlay_extension: String,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            dual_origin_overrides: Vec::new(),
            excluded: default_excluded(),
            mention_markers: default_mention_markers(),
            allow_missing_overlay: false,
            overlay_extension: default_overlay_extension(),
        }
    }
}

fn default_excluded() -> Vec<String> {
    vec![
        "Koeroesy-Szanto_Josef_1844_1906".into(),
        "Koszta_Jozsef_1861_1949".into(),
    ]
}
fn default_mention_markers() -> Vec<String> {
    vec!["mentioned-only".into()]
}
fn default_overlay_extension() -> String {
    "hmi".into()
}

/// `[markup]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkupConfig {
    /// Inline presentational tags flattened into surrounding text.
    #[serde(default = "default_presentational_tags")]
    pub presentational_tags: Vec<String>,
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            presentational_tags: default_presentational_tags(),
        }
    }
}

fn default_presentational_tags() -> Vec<String> {
    vec!["b".into(), "sup".into()]
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Schema location written into the `xml-model` processing instruction.
    #[serde(default = "default_schema_href")]
    pub schema_href: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            schema_href: default_schema_href(),
        }
    }
}

fn default_schema_href() -> String {
    "oebl_relax_ng_v1.rng".into()
}

/// `[validation]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Validator argv; the document is piped to stdin. Empty disables validation.
    #[serde(default)]
    pub command: Vec<String>,
}

// ---------------------------------------------------------------------------
// Record policy (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime record-handling policy used by the merge engine and orchestrator.
#[derive(Debug, Clone)]
pub struct RecordPolicy {
    /// Normalized identities forced to dual-origin treatment.
    pub dual_origin_overrides: HashSet<String>,
    /// Normalized identities never processed.
    pub excluded: HashSet<String>,
    /// Lowercased mention-only phrases.
    pub mention_markers: Vec<String>,
    /// Presentational tags to flatten.
    pub presentational_tags: Vec<String>,
    /// Whether a missing overlay file is tolerated.
    pub allow_missing_overlay: bool,
    /// Overlay file extension (without the dot).
    pub overlay_extension: String,
}

impl RecordPolicy {
    /// Whether the identity is on the dual-origin patch list.
    pub fn forces_dual_origin(&self, identity: &str) -> bool {
        self.dual_origin_overrides.contains(record_stem(identity))
    }

    /// Whether the identity is on the exclusion list.
    pub fn is_excluded(&self, identity: &str) -> bool {
        self.excluded.contains(record_stem(identity))
    }

    /// Whether a publication block's text marks the record as mention-only.
    pub fn is_mention_only(&self, block_text: &str) -> bool {
        let text = block_text.to_lowercase();
        self.mention_markers.iter().any(|m| text.contains(m.as_str()))
    }

    /// Rewrite the identity lists through the lookup-key normalizer so entries
    /// spelled either way match the normalized record identity.
    pub fn normalize_lists(&mut self, normalize: impl Fn(&str) -> String) {
        self.dual_origin_overrides = self.dual_origin_overrides.iter().map(|s| normalize(s)).collect();
        self.excluded = self.excluded.iter().map(|s| normalize(s)).collect();
    }

    /// Overlay path for a record file: `<file>.<overlay_extension>`.
    pub fn overlay_path(&self, record_path: &Path) -> PathBuf {
        let mut name = record_path.as_os_str().to_owned();
        name.push(".");
        name.push(&self.overlay_extension);
        PathBuf::from(name)
    }
}

impl From<&AppConfig> for RecordPolicy {
    fn from(config: &AppConfig) -> Self {
        let stems = |items: &[String]| -> HashSet<String> {
            items.iter().map(|s| record_stem(s.trim()).to_string()).collect()
        };
        Self {
            dual_origin_overrides: stems(&config.records.dual_origin_overrides),
            excluded: stems(&config.records.excluded),
            mention_markers: config
                .records
                .mention_markers
                .iter()
                .map(|m| m.to_lowercase())
                .collect(),
            presentational_tags: config.markup.presentational_tags.clone(),
            allow_missing_overlay: config.records.allow_missing_overlay,
            overlay_extension: config.records.overlay_extension.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.harmonizer/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| HarmonizerError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.harmonizer/harmonizer.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| HarmonizerError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        HarmonizerError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| HarmonizerError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| HarmonizerError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| HarmonizerError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
