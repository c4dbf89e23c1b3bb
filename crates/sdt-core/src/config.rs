//! Preferences: the flat configuration namespace, loaded from
//! `~/.config/sdt/config.toml`, with defaults written on first run.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::classify::FilterSettings;
use crate::command::{SynthesisConfig, Tool};
use crate::rules::RuleTable;

/// All user preferences. Every field has a documented default; unknown or
/// missing fields fall back to it so older config files keep loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Disable both observation channels entirely.
    pub disable_detection: bool,
    /// Output target for copy actions.
    pub tool: Tool,
    /// Inject user-agent/cookie/referer flags into commands.
    pub inject_headers: bool,
    /// Show the tab title as the source column in lists.
    pub display_title: bool,
    /// Prefer the tab title over the URL-derived output filename.
    pub tab_title_filename: bool,
    /// Append a timestamp to output filenames.
    pub timestamp_suffix: bool,

    /// Suppress subtitle detections.
    pub suppress_subtitles: bool,
    /// Suppress plain media-file detections (on by default; streams are the
    /// primary quarry).
    pub suppress_files: bool,
    /// Minimum size in MiB for file-like detections; `None` disables.
    pub min_file_size_mib: Option<u64>,
    /// Suppress stream-manifest detections.
    pub suppress_streams: bool,
    pub blacklist_enabled: bool,
    pub blacklist_entries: Vec<String>,

    pub custom_extensions_enabled: bool,
    pub custom_extensions: Vec<String>,
    pub custom_content_types_enabled: bool,
    pub custom_content_types: Vec<String>,

    /// Age-cap restored entries from previous sessions.
    pub cleanup_restore: bool,
    /// Restore window in days, applied when `cleanup_restore` is set.
    pub restore_max_age_days: u64,

    pub notify_on_detect: bool,
    pub notify_on_copy: bool,

    /// Hand file-like detections to the download collaborator instead of
    /// listing them.
    pub direct_download: bool,
    /// Do so without user interaction.
    pub auto_download: bool,

    /// Output container extension for tools that take one.
    pub output_extension: String,
    /// streamlink trailer mode: "file" writes `-o`, anything else doesn't.
    pub streamlink_output: String,
    pub external_downloader_enabled: bool,
    pub external_downloader: Option<String>,
    pub proxy_enabled: bool,
    pub proxy: Option<String>,
    pub custom_args_enabled: bool,
    /// Per-tool custom argument suffixes, keyed by tool slug.
    pub custom_args: BTreeMap<String, String>,
    pub user_template: Option<String>,
    pub template_replace_pattern: Option<String>,
    pub template_replace_with: Option<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            disable_detection: false,
            tool: Tool::Url,
            inject_headers: true,
            display_title: true,
            tab_title_filename: false,
            timestamp_suffix: false,
            suppress_subtitles: false,
            suppress_files: true,
            min_file_size_mib: None,
            suppress_streams: false,
            blacklist_enabled: false,
            blacklist_entries: Vec::new(),
            custom_extensions_enabled: false,
            custom_extensions: Vec::new(),
            custom_content_types_enabled: false,
            custom_content_types: Vec::new(),
            cleanup_restore: false,
            restore_max_age_days: 7,
            notify_on_detect: true,
            notify_on_copy: true,
            direct_download: false,
            auto_download: false,
            output_extension: "ts".to_string(),
            streamlink_output: "file".to_string(),
            external_downloader_enabled: false,
            external_downloader: None,
            proxy_enabled: false,
            proxy: None,
            custom_args_enabled: false,
            custom_args: BTreeMap::new(),
            user_template: None,
            template_replace_pattern: None,
            template_replace_with: None,
        }
    }
}

impl Preferences {
    /// Suppression filters for the classifier.
    pub fn filter_settings(&self) -> FilterSettings {
        FilterSettings {
            suppress_subtitles: self.suppress_subtitles,
            suppress_files: self.suppress_files,
            min_file_size_mib: self.min_file_size_mib,
            suppress_streams: self.suppress_streams,
            blacklist: if self.blacklist_enabled {
                self.blacklist_entries.clone()
            } else {
                Vec::new()
            },
        }
    }

    /// Rule table including the user rule, per the custom-rule preferences.
    pub fn rule_table(&self) -> RuleTable {
        RuleTable::new(
            self.custom_extensions.clone(),
            self.custom_content_types.clone(),
            self.custom_extensions_enabled,
            self.custom_content_types_enabled,
        )
    }

    /// Synthesis configuration, optionally overriding the configured tool.
    pub fn synthesis_config(&self, tool_override: Option<Tool>) -> SynthesisConfig {
        let tool = tool_override.unwrap_or(self.tool);
        SynthesisConfig {
            tool,
            inject_headers: self.inject_headers,
            proxy: self
                .proxy_enabled
                .then(|| self.proxy.clone())
                .flatten()
                .filter(|p| !p.is_empty()),
            custom_args: self
                .custom_args_enabled
                .then(|| self.custom_args.get(tool.slug()).cloned())
                .flatten()
                .filter(|a| !a.is_empty()),
            output_extension: self.output_extension.clone(),
            use_tab_title: self.tab_title_filename,
            timestamp_suffix: self.timestamp_suffix,
            display_title: self.display_title,
            streamlink_file_output: self.streamlink_output == "file",
            external_downloader: self
                .external_downloader_enabled
                .then(|| self.external_downloader.clone())
                .flatten()
                .filter(|d| !d.is_empty()),
            user_template: self.user_template.clone(),
            template_replace: match (&self.template_replace_pattern, &self.template_replace_with) {
                (Some(pattern), Some(replacement)) if !pattern.is_empty() => {
                    Some((pattern.clone(), replacement.clone()))
                }
                _ => None,
            },
        }
    }

    /// Restore-window length in milliseconds, when cleanup is enabled.
    pub fn restore_window_ms(&self) -> Option<i64> {
        self.cleanup_restore
            .then(|| self.restore_max_age_days as i64 * 24 * 60 * 60 * 1000)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("sdt")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load preferences from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<Preferences> {
    let path = config_path()?;
    if !path.exists() {
        let defaults = Preferences::default();
        write_config(&defaults)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(defaults);
    }

    let data = fs::read_to_string(&path)?;
    let prefs: Preferences = toml::from_str(&data)?;
    Ok(prefs)
}

/// Overwrite the config file (used by reset to reseed defaults).
pub fn write_config(prefs: &Preferences) -> Result<()> {
    let path = config_path()?;
    let toml = toml::to_string_pretty(prefs)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, toml)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let p = Preferences::default();
        assert!(!p.disable_detection);
        assert_eq!(p.tool, Tool::Url);
        assert!(p.inject_headers);
        assert!(p.suppress_files);
        assert!(!p.suppress_subtitles);
        assert_eq!(p.output_extension, "ts");
        assert_eq!(p.restore_max_age_days, 7);
    }

    #[test]
    fn toml_roundtrip() {
        let p = Preferences::default();
        let toml = toml::to_string_pretty(&p).unwrap();
        let back: Preferences = toml::from_str(&toml).unwrap();
        assert_eq!(back.tool, p.tool);
        assert_eq!(back.suppress_files, p.suppress_files);
        assert_eq!(back.output_extension, p.output_extension);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let p: Preferences = toml::from_str(
            r#"
            tool = "ffmpeg"
            suppress_files = false
            "#,
        )
        .unwrap();
        assert_eq!(p.tool, Tool::Ffmpeg);
        assert!(!p.suppress_files);
        assert!(p.inject_headers);
        assert_eq!(p.output_extension, "ts");
    }

    #[test]
    fn blacklist_disabled_means_empty_filter() {
        let mut p = Preferences::default();
        p.blacklist_entries = vec!["ads.example".to_string()];
        assert!(p.filter_settings().blacklist.is_empty());
        p.blacklist_enabled = true;
        assert_eq!(p.filter_settings().blacklist.len(), 1);
    }

    #[test]
    fn synthesis_config_resolves_per_tool_custom_args() {
        let mut p = Preferences::default();
        p.tool = Tool::Ffmpeg;
        p.custom_args
            .insert("ffmpeg".to_string(), "-loglevel warning".to_string());
        // disabled: no args
        assert!(p.synthesis_config(None).custom_args.is_none());
        p.custom_args_enabled = true;
        assert_eq!(
            p.synthesis_config(None).custom_args.as_deref(),
            Some("-loglevel warning")
        );
        // override to a tool with no configured args
        assert!(p.synthesis_config(Some(Tool::Hlsdl)).custom_args.is_none());
    }

    #[test]
    fn restore_window_requires_cleanup_flag() {
        let mut p = Preferences::default();
        assert_eq!(p.restore_window_ms(), None);
        p.cleanup_restore = true;
        assert_eq!(p.restore_window_ms(), Some(7 * 24 * 60 * 60 * 1000));
    }
}
