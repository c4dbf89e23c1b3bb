//! Header resolution for command synthesis, with explicit fallback chains.
//!
//! The fallback orders are part of the contract: user-agent falls back to a
//! fixed default, the referring context falls through document URL → origin
//! URL → initiator → tab URL, and privileged/internal URLs are never
//! injected as referers.

use crate::descriptor::ResourceDescriptor;

/// Injected when no user-agent header was captured.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:115.0) Gecko/20100101 Firefox/115.0";

/// Referer values with these schemes are internal to the host and excluded.
pub const PRIVILEGED_SCHEMES: [&str; 2] = ["about:", "chrome:"];

type ContextExtractor = fn(&ResourceDescriptor) -> Option<&str>;

/// Ordered referring-context candidates, first-match-wins.
const CONTEXT_FALLBACK: [ContextExtractor; 4] = [
    |d| d.document_url.as_deref(),
    |d| d.origin_url.as_deref(),
    |d| d.initiator.as_deref(),
    |d| d.tab_context.url.as_deref(),
];

/// Header values as injected into a command, post-fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedHeaders {
    pub user_agent: String,
    pub cookie: Option<String>,
    pub referer: Option<String>,
}

/// First referring-context value in the contract order.
pub fn referring_context(descriptor: &ResourceDescriptor) -> Option<&str> {
    CONTEXT_FALLBACK.iter().find_map(|extract| extract(descriptor))
}

/// Captured user-agent, or the fixed default.
pub fn resolve_user_agent(descriptor: &ResourceDescriptor) -> String {
    descriptor
        .header("user-agent")
        .map(|v| v.to_string())
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string())
}

/// Captured cookie with embedded double quotes normalized to single quotes,
/// so the value survives the surrounding command quoting.
pub fn resolve_cookie(descriptor: &ResourceDescriptor) -> Option<String> {
    descriptor
        .header("cookie")
        .map(|v| v.replace('"', "'"))
}

/// Captured referer header, else the referring-context fallback chain;
/// privileged values are excluded entirely.
pub fn resolve_referer(descriptor: &ResourceDescriptor) -> Option<String> {
    let candidate = descriptor
        .header("referer")
        .or_else(|| referring_context(descriptor))?;
    if PRIVILEGED_SCHEMES
        .iter()
        .any(|scheme| candidate.starts_with(scheme))
    {
        return None;
    }
    Some(candidate.to_string())
}

pub fn resolve_headers(descriptor: &ResourceDescriptor) -> ResolvedHeaders {
    ResolvedHeaders {
        user_agent: resolve_user_agent(descriptor),
        cookie: resolve_cookie(descriptor),
        referer: resolve_referer(descriptor),
    }
}
