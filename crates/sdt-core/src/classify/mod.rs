//! Resource classification: map one raw exchange to a typed, categorized
//! resource, or reject it.
//!
//! Pure over its inputs; safe to call from arbitrarily interleaved callbacks.

mod filters;

pub use filters::FilterSettings;

use crate::exchange::RawExchange;
use crate::rules::{Category, RuleTable};

/// A successful classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub resource_type: String,
    pub category: Category,
    /// Carried from the matched rule for filename derivation.
    pub directory_manifest: bool,
}

/// Classifies one exchange against the rule table, then applies the
/// suppression filters. Returns `None` on a miss; that is not an error.
///
/// A content-type match wins over an extension match when both are present.
/// Classification works from whichever header set the exchange carries;
/// an exchange observed on the request channel typically matches by
/// extension only, the response channel may add a content-type match.
pub fn classify(
    exchange: &RawExchange,
    rules: &RuleTable,
    filters: &FilterSettings,
) -> Option<Verdict> {
    let path_lower = url::Url::parse(&exchange.url)
        .ok()
        .map(|u| u.path().to_lowercase())?;

    let by_extension = rules.match_extension(&path_lower);
    let by_content_type = exchange
        .content_type()
        .and_then(|ct| rules.match_content_type(ct));

    let rule = by_content_type.or(by_extension)?;

    if !filters::passes_filters(exchange, rule, filters) {
        return None;
    }

    Some(Verdict {
        resource_type: rule.resource_type.clone(),
        category: rule.category,
        directory_manifest: rule.directory_manifest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::Header;

    fn exchange(url: &str, headers: Vec<Header>) -> RawExchange {
        RawExchange {
            url: url.to_string(),
            request_id: "r1".to_string(),
            tab_id: Some(1),
            headers,
            ..Default::default()
        }
    }

    #[test]
    fn classifies_hls_by_extension() {
        let x = exchange(
            "https://cdn.example.com/abc/master.m3u8",
            vec![Header::new("User-Agent", "UA1")],
        );
        let v = classify(&x, &RuleTable::builtin_only(), &FilterSettings::default()).unwrap();
        assert_eq!(v.resource_type, "HLS");
        assert_eq!(v.category, Category::Stream);
    }

    #[test]
    fn classifies_by_content_type_without_extension() {
        let x = exchange(
            "https://cdn.example.com/playlist",
            vec![Header::new("Content-Type", "application/vnd.apple.mpegurl")],
        );
        let v = classify(&x, &RuleTable::builtin_only(), &FilterSettings::default()).unwrap();
        assert_eq!(v.resource_type, "HLS");
    }

    #[test]
    fn content_type_wins_over_extension() {
        // a .ts URL served as a VTT subtitle
        let x = exchange(
            "https://cdn.example.com/seg/0001.ts",
            vec![Header::new("Content-Type", "text/vtt")],
        );
        let v = classify(&x, &RuleTable::builtin_only(), &FilterSettings::default()).unwrap();
        assert_eq!(v.resource_type, "VTT");
        assert_eq!(v.category, Category::Subtitles);
    }

    #[test]
    fn miss_returns_none() {
        let x = exchange("https://example.com/index.html", vec![]);
        assert!(classify(&x, &RuleTable::builtin_only(), &FilterSettings::default()).is_none());
    }

    #[test]
    fn deterministic_and_side_effect_free() {
        let x = exchange("https://cdn.example.com/abc/master.m3u8", vec![]);
        let rules = RuleTable::builtin_only();
        let filters = FilterSettings::default();
        let a = classify(&x, &rules, &filters);
        let b = classify(&x, &rules, &filters);
        assert_eq!(a, b);
    }

    #[test]
    fn blacklist_rejects_matching_document_url() {
        let mut x = exchange("https://cdn.example.com/abc/master.m3u8", vec![]);
        x.document_url = Some("https://adtracker.example/page".to_string());
        let filters = FilterSettings {
            blacklist: vec!["adtracker.example".to_string()],
            ..Default::default()
        };
        assert!(classify(&x, &RuleTable::builtin_only(), &filters).is_none());
    }

    #[test]
    fn mss_verdict_carries_directory_manifest() {
        let x = exchange("https://cdn.example.com/vod/movie.ism/Manifest", vec![]);
        let v = classify(&x, &RuleTable::builtin_only(), &FilterSettings::default()).unwrap();
        assert_eq!(v.resource_type, "MSS");
        assert!(v.directory_manifest);
    }
}
