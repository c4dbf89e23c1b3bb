//! Post-match suppression filters, applied in a fixed order with
//! reject-on-first-violation semantics.

use crate::exchange::RawExchange;
use crate::rules::{Category, ClassificationRule};

/// User-controlled suppression settings. Everything off by default; the
/// preference layer maps its flat namespace onto this.
#[derive(Debug, Clone, Default)]
pub struct FilterSettings {
    pub suppress_subtitles: bool,
    pub suppress_files: bool,
    /// Minimum size in MiB; `None` disables the filter.
    pub min_file_size_mib: Option<u64>,
    pub suppress_streams: bool,
    /// Case-insensitive substrings; empty disables the filter.
    pub blacklist: Vec<String>,
}

/// True when a candidate match survives every filter. Order matters and is
/// part of the contract: subtitles, files, minimum size, streams, blacklist.
pub(crate) fn passes_filters(
    exchange: &RawExchange,
    rule: &ClassificationRule,
    filters: &FilterSettings,
) -> bool {
    if filters.suppress_subtitles && rule.category == Category::Subtitles {
        return false;
    }
    if filters.suppress_files && rule.category == Category::Files {
        return false;
    }
    if let Some(min_mib) = filters.min_file_size_mib {
        // Only meaningful for file-like resources that declare a size.
        if rule.category.is_file_like() {
            if let Some(len) = exchange.content_length() {
                if len / (1024 * 1024) < min_mib {
                    return false;
                }
            }
        }
    }
    if filters.suppress_streams && rule.category == Category::Stream {
        return false;
    }
    if !filters.blacklist.is_empty() && blacklisted(exchange, rule, &filters.blacklist) {
        return false;
    }
    true
}

/// An entry blacklists a detection when it appears (case-insensitively) in
/// the URL, the referring-context URL, the content-type value, or the
/// resolved type name.
fn blacklisted(exchange: &RawExchange, rule: &ClassificationRule, entries: &[String]) -> bool {
    let url = exchange.url.to_lowercase();
    let referrer = exchange.referring_context().map(|r| r.to_lowercase());
    let content_type = exchange.content_type().map(|ct| ct.to_lowercase());
    let type_name = rule.resource_type.to_lowercase();

    entries.iter().any(|entry| {
        let entry = entry.to_lowercase();
        url.contains(&entry)
            || referrer.as_deref().is_some_and(|r| r.contains(&entry))
            || content_type.as_deref().is_some_and(|ct| ct.contains(&entry))
            || type_name.contains(&entry)
    })
}
