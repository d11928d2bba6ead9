//! File configuration for run defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

/// Largest accepted `max_items` value.
const MAX_ITEMS_LIMIT: usize = 10_000_000;

/// `key = value` file configuration; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Root of all run artifacts.
    pub output_dir: Option<PathBuf>,
    /// Dataset corpus JSON file.
    pub corpus_path: Option<PathBuf>,
    /// Download program invoked per link.
    pub download_program: Option<String>,
    /// Cap on extracted items per category and file.
    pub max_items: Option<usize>,
    /// Files larger than this are not parsed.
    pub max_file_size_mb: Option<u64>,
    /// Files parsed per dataset.
    pub max_files_per_dataset: Option<usize>,
    /// Extract archives during parsing.
    pub decompress: Option<bool>,
}

impl FileConfig {
    /// Validates config values against runtime constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(max_items) = self.max_items
            && !(1..=MAX_ITEMS_LIMIT).contains(&max_items)
        {
            bail!(
                "Invalid config value for `max_items`: {max_items}. Expected range: 1..={MAX_ITEMS_LIMIT}"
            );
        }
        if let Some(size) = self.max_file_size_mb
            && !(1..=102_400).contains(&size)
        {
            bail!("Invalid config value for `max_file_size_mb`: {size}. Expected range: 1..=102400");
        }
        if let Some(files) = self.max_files_per_dataset
            && !(1..=100_000).contains(&files)
        {
            bail!(
                "Invalid config value for `max_files_per_dataset`: {files}. Expected range: 1..=100000"
            );
        }
        if let Some(program) = &self.download_program
            && program.trim().is_empty()
        {
            bail!("Invalid config value for `download_program`: must not be empty");
        }
        Ok(())
    }
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Config path that was considered, if any.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

impl LoadedConfig {
    /// The parsed config, or an empty one.
    #[must_use]
    pub fn file_config(&self) -> FileConfig {
        self.config.clone().unwrap_or_default()
    }
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/harvester/config.toml`
/// 2. `$HOME/.config/harvester/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("harvester")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("harvester")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from an explicit path, or from the default path if present.
///
/// An explicit path must exist; a missing default file is not an error.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        let config = load_file_config(path)?;
        return Ok(LoadedConfig {
            path: Some(path.to_path_buf()),
            config: Some(config),
        });
    }

    let path = resolve_default_config_path();
    let config = match path.as_deref() {
        Some(path_ref) if path_ref.exists() => Some(load_file_config(path_ref)?),
        _ => None,
    };
    Ok(LoadedConfig { path, config })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!(
                "Invalid config syntax on line {}: expected key = value",
                line_index + 1
            );
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let line_number = line_index + 1;

        match key {
            "output_dir" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `output_dir` value on line {line_number}"))?;
                cfg.output_dir = Some(PathBuf::from(parsed));
            }
            "corpus_path" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `corpus_path` value on line {line_number}"))?;
                cfg.corpus_path = Some(PathBuf::from(parsed));
            }
            "download_program" => {
                let parsed = parse_string_literal(value).with_context(|| {
                    format!("Invalid `download_program` value on line {line_number}")
                })?;
                cfg.download_program = Some(parsed);
            }
            "max_items" => {
                let parsed = parse_integer_usize(value)
                    .with_context(|| format!("Invalid `max_items` value on line {line_number}"))?;
                cfg.max_items = Some(parsed);
            }
            "max_file_size_mb" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `max_file_size_mb` value on line {line_number}")
                })?;
                cfg.max_file_size_mb = Some(parsed);
            }
            "max_files_per_dataset" => {
                let parsed = parse_integer_usize(value).with_context(|| {
                    format!("Invalid `max_files_per_dataset` value on line {line_number}")
                })?;
                cfg.max_files_per_dataset = Some(parsed);
            }
            "decompress" => {
                let parsed = parse_boolean(value)
                    .with_context(|| format!("Invalid `decompress` value on line {line_number}"))?;
                cfg.decompress = Some(parsed);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_number}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_integer_usize(raw_value: &str) -> Result<usize> {
    let value = parse_integer_u64(raw_value)?;
    usize::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for usize"))
}

fn parse_boolean(raw_value: &str) -> Result<bool> {
    match raw_value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => bail!("Expected 'true' or 'false'"),
    }
}
