//! Classification rule table: built-in media types plus the user-defined rule.
//!
//! Extension patterns match by case-insensitive substring `"." + ext` against
//! the lower-cased URL path; built-in content-type patterns match by exact
//! (case-insensitive) equality, the user rule's content-type patterns by
//! substring. The table is immutable after load; the user rule is rebuilt
//! whenever preferences change.

use serde::{Deserialize, Serialize};

/// Coarse resource bucket used by filters, independent of the specific type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Stream,
    Subtitles,
    Files,
    Custom,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Stream => "stream",
            Category::Subtitles => "subtitles",
            Category::Files => "files",
            Category::Custom => "custom",
        }
    }

    /// File-like categories are eligible for the minimum-size filter and the
    /// direct-download hand-off.
    pub fn is_file_like(self) -> bool {
        matches!(self, Category::Files | Category::Custom)
    }
}

/// One classification rule: extension and content-type patterns resolving to
/// a typed, categorized resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationRule {
    pub extensions: Vec<String>,
    pub content_types: Vec<String>,
    pub resource_type: String,
    pub category: Category,
    /// Filename derivation uses the parent path segment for matching URLs
    /// (directory-style manifests such as `.../video.ism/manifest`).
    #[serde(default)]
    pub directory_manifest: bool,
}

impl ClassificationRule {
    fn builtin(
        extensions: &[&str],
        content_types: &[&str],
        resource_type: &str,
        category: Category,
    ) -> Self {
        Self {
            extensions: extensions.iter().map(|s| s.to_string()).collect(),
            content_types: content_types.iter().map(|s| s.to_string()).collect(),
            resource_type: resource_type.to_string(),
            category,
            directory_manifest: false,
        }
    }

    pub(crate) fn matches_extension(&self, path_lower: &str) -> bool {
        self.extensions
            .iter()
            .any(|ext| path_lower.contains(&format!(".{}", ext.to_lowercase())))
    }

    pub(crate) fn matches_content_type_exact(&self, value: &str) -> bool {
        self.content_types
            .iter()
            .any(|ct| ct.eq_ignore_ascii_case(value))
    }

    pub(crate) fn matches_content_type_substring(&self, value: &str) -> bool {
        let value = value.to_lowercase();
        self.content_types
            .iter()
            .any(|ct| value.contains(&ct.to_lowercase()))
    }
}

/// Built-in rules for the recognized stream manifest, subtitle, and media
/// container formats.
pub fn builtin_rules() -> Vec<ClassificationRule> {
    use Category::*;
    let mut rules = vec![
        ClassificationRule::builtin(
            &["m3u8"],
            &[
                "application/x-mpegurl",
                "application/vnd.apple.mpegurl",
                "audio/vnd.apple.mpegurl",
            ],
            "HLS",
            Stream,
        ),
        ClassificationRule::builtin(
            &["mpd", "json?base64_init=1"],
            &["application/dash+xml"],
            "DASH",
            Stream,
        ),
        ClassificationRule::builtin(&["f4m"], &["application/f4m"], "HDS", Stream),
        ClassificationRule::builtin(&["ism/manifest"], &[], "MSS", Stream),
        ClassificationRule::builtin(&["vtt"], &["text/vtt"], "VTT", Subtitles),
        ClassificationRule::builtin(&["srt"], &["application/x-subrip"], "SRT", Subtitles),
        ClassificationRule::builtin(
            &["ttml", "ttml2"],
            &["application/ttml+xml"],
            "TTML",
            Subtitles,
        ),
        ClassificationRule::builtin(&["dfxp"], &["application/ttaf+xml"], "DFXP", Subtitles),
        ClassificationRule::builtin(
            &["mp4", "m4v", "m4s"],
            &["video/x-m4v", "video/m4v", "video/mp4"],
            "MP4",
            Files,
        ),
        ClassificationRule::builtin(&["ts", "m2t"], &["video/mp2t"], "TS", Files),
        ClassificationRule::builtin(&["aac", "m4a"], &["audio/aac", "audio/m4a"], "AAC", Files),
        ClassificationRule::builtin(&["mp3"], &["audio/mpeg"], "MP3", Files),
        ClassificationRule::builtin(
            &["ogg", "ogv", "oga", "opus"],
            &["video/ogg", "audio/ogg", "audio/opus"],
            "OGG",
            Files,
        ),
        ClassificationRule::builtin(
            &["weba", "webm"],
            &["audio/webm", "video/webm"],
            "WEBM",
            Files,
        ),
    ];
    // MSS manifests live at `.../name.ism/manifest`; the parent segment is the
    // meaningful filename.
    for rule in &mut rules {
        if rule.resource_type == "MSS" {
            rule.directory_manifest = true;
        }
    }
    rules
}

/// The full rule table consulted by the classifier: built-ins plus the
/// optional user rule, with the user rule winning when enabled.
#[derive(Debug, Clone)]
pub struct RuleTable {
    builtin: Vec<ClassificationRule>,
    custom: ClassificationRule,
    custom_extensions_enabled: bool,
    custom_content_types_enabled: bool,
}

impl RuleTable {
    pub fn builtin_only() -> Self {
        Self::new(Vec::new(), Vec::new(), false, false)
    }

    pub fn new(
        custom_extensions: Vec<String>,
        custom_content_types: Vec<String>,
        extensions_enabled: bool,
        content_types_enabled: bool,
    ) -> Self {
        Self {
            builtin: builtin_rules(),
            custom: ClassificationRule {
                extensions: custom_extensions,
                content_types: custom_content_types,
                resource_type: "CUSTOM".to_string(),
                category: Category::Custom,
                directory_manifest: false,
            },
            custom_extensions_enabled: extensions_enabled,
            custom_content_types_enabled: content_types_enabled,
        }
    }

    /// Best extension match for a lower-cased URL path. The user rule wins
    /// over built-ins when enabled.
    pub(crate) fn match_extension(&self, path_lower: &str) -> Option<&ClassificationRule> {
        if self.custom_extensions_enabled && self.custom.matches_extension(path_lower) {
            return Some(&self.custom);
        }
        self.builtin.iter().find(|r| r.matches_extension(path_lower))
    }

    /// Best content-type match for a raw header value. The user rule wins
    /// over built-ins when enabled.
    pub(crate) fn match_content_type(&self, value: &str) -> Option<&ClassificationRule> {
        if self.custom_content_types_enabled && self.custom.matches_content_type_substring(value) {
            return Some(&self.custom);
        }
        self.builtin
            .iter()
            .find(|r| r.matches_content_type_exact(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_rules_are_well_formed() {
        for rule in builtin_rules() {
            assert!(!rule.resource_type.is_empty());
            assert!(!rule.extensions.is_empty() || !rule.content_types.is_empty());
        }
    }

    #[test]
    fn extension_match_is_substring_on_path() {
        let table = RuleTable::builtin_only();
        let rule = table.match_extension("/videos/abc/master.m3u8").unwrap();
        assert_eq!(rule.resource_type, "HLS");
        assert_eq!(rule.category, Category::Stream);

        let rule = table.match_extension("/stream/video.ism/manifest").unwrap();
        assert_eq!(rule.resource_type, "MSS");
        assert!(rule.directory_manifest);

        assert!(table.match_extension("/index.html").is_none());
    }

    #[test]
    fn content_type_match_is_exact_for_builtins() {
        let table = RuleTable::builtin_only();
        let rule = table.match_content_type("Application/X-MpegURL").unwrap();
        assert_eq!(rule.resource_type, "HLS");
        // substring-only is not enough for built-ins
        assert!(table.match_content_type("application/x-mpegurl; charset=utf-8").is_none());
    }

    #[test]
    fn custom_rule_wins_over_builtin() {
        let table = RuleTable::new(vec!["m3u8".to_string()], Vec::new(), true, false);
        let rule = table.match_extension("/live/master.m3u8").unwrap();
        assert_eq!(rule.resource_type, "CUSTOM");
        assert_eq!(rule.category, Category::Custom);
    }

    #[test]
    fn custom_content_type_matches_by_substring() {
        let table = RuleTable::new(Vec::new(), vec!["mpegurl".to_string()], false, true);
        let rule = table
            .match_content_type("application/x-mpegurl; charset=utf-8")
            .unwrap();
        assert_eq!(rule.resource_type, "CUSTOM");
    }

    #[test]
    fn disabled_custom_rule_is_ignored() {
        let table = RuleTable::new(vec!["m3u8".to_string()], Vec::new(), false, false);
        let rule = table.match_extension("/live/master.m3u8").unwrap();
        assert_eq!(rule.resource_type, "HLS");
    }
}
