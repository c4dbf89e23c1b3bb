//! Per-tool command dialects.
//!
//! Each tool is one row: a record of small pure functions producing its base
//! invocation, proxy flag, header-injection flags, and trailer. Adding a
//! tool means adding a row here, nothing else.

use std::fmt;
use std::str::FromStr;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use super::headers::ResolvedHeaders;

/// The closed set of output targets a command can be synthesized for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tool {
    #[serde(rename = "url")]
    Url,
    #[serde(rename = "tableForm")]
    TableForm,
    #[serde(rename = "kodiUrl")]
    KodiUrl,
    #[serde(rename = "ffmpeg")]
    Ffmpeg,
    #[serde(rename = "streamlink")]
    Streamlink,
    #[serde(rename = "youtubedl")]
    YoutubeDl,
    #[serde(rename = "ytdlp")]
    YtDlp,
    #[serde(rename = "hlsdl")]
    Hlsdl,
    #[serde(rename = "nm3u8dl")]
    Nm3u8Dl,
    #[serde(rename = "user")]
    UserTemplate,
}

impl Tool {
    pub const ALL: [Tool; 10] = [
        Tool::Url,
        Tool::TableForm,
        Tool::KodiUrl,
        Tool::Ffmpeg,
        Tool::Streamlink,
        Tool::YoutubeDl,
        Tool::YtDlp,
        Tool::Hlsdl,
        Tool::Nm3u8Dl,
        Tool::UserTemplate,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Tool::Url => "url",
            Tool::TableForm => "tableForm",
            Tool::KodiUrl => "kodiUrl",
            Tool::Ffmpeg => "ffmpeg",
            Tool::Streamlink => "streamlink",
            Tool::YoutubeDl => "youtubedl",
            Tool::YtDlp => "ytdlp",
            Tool::Hlsdl => "hlsdl",
            Tool::Nm3u8Dl => "nm3u8dl",
            Tool::UserTemplate => "user",
        }
    }
}

impl Default for Tool {
    fn default() -> Self {
        Tool::Url
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Tool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tool::ALL
            .into_iter()
            .find(|t| t.slug().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown tool: {s}"))
    }
}

/// Inputs for a dialect's base invocation.
pub(crate) struct BaseCtx<'a> {
    pub url: &'a str,
    pub external_downloader: Option<&'a str>,
}

/// Inputs for a dialect's trailer.
pub(crate) struct TrailerCtx<'a> {
    pub url: &'a str,
    /// Sanitized output basename, extension already stripped.
    pub output_name: &'a str,
    /// Sanitized timestamp, present when the suffix preference is on.
    pub timestamp: Option<&'a str>,
    pub extension: &'a str,
    pub streamlink_file_output: bool,
    /// youtube-dl family: emit `--output` only when a tab-title filename or
    /// timestamp was requested.
    pub explicit_output: bool,
}

impl TrailerCtx<'_> {
    fn name_with_timestamp(&self) -> String {
        match self.timestamp {
            Some(ts) => format!("{} {}", self.output_name, ts),
            None => self.output_name.to_string(),
        }
    }
}

/// One tool's argument syntax as a record of pure functions.
pub(crate) struct Dialect {
    pub base: fn(&BaseCtx) -> String,
    pub proxy: Option<fn(&str) -> String>,
    pub headers: fn(&ResolvedHeaders) -> String,
    pub trailer: fn(&TrailerCtx) -> String,
}

/// The dialect table. Tools without a build pipeline (bare URL, table form,
/// user template) have no row.
pub(crate) fn dialect(tool: Tool) -> Option<&'static Dialect> {
    match tool {
        Tool::KodiUrl => Some(&KODI_URL),
        Tool::Ffmpeg => Some(&FFMPEG),
        Tool::Streamlink => Some(&STREAMLINK),
        Tool::YoutubeDl => Some(&YOUTUBE_DL),
        Tool::YtDlp => Some(&YT_DLP),
        Tool::Hlsdl => Some(&HLSDL),
        Tool::Nm3u8Dl => Some(&NM3U8DL),
        Tool::Url | Tool::TableForm | Tool::UserTemplate => None,
    }
}

/// `encodeURIComponent` equivalent: everything but `A-Za-z0-9 -_.!~*'()`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub(crate) fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

fn youtube_dl_family_base(binary: &str, ctx: &BaseCtx) -> String {
    let mut base = format!("{binary} --no-part --restrict-filenames");
    if let Some(downloader) = ctx.external_downloader {
        base.push_str(&format!(" --external-downloader \"{downloader}\""));
    }
    base
}

fn flag_headers(h: &ResolvedHeaders, ua: fn(&str) -> String, cookie: fn(&str) -> String, referer: fn(&str) -> String) -> String {
    let mut out = ua(&h.user_agent);
    if let Some(c) = &h.cookie {
        out.push_str(&cookie(c));
    }
    if let Some(r) = &h.referer {
        out.push_str(&referer(r));
    }
    out
}

static FFMPEG: Dialect = Dialect {
    base: |_| "ffmpeg".to_string(),
    proxy: Some(|p| format!(" -http_proxy \"{p}\"")),
    headers: |h| {
        flag_headers(
            h,
            |ua| format!(" -user_agent \"{ua}\""),
            |c| format!(" -headers \"Cookie: {c}\""),
            |r| format!(" -referer \"{r}\""),
        )
    },
    trailer: |t| {
        format!(
            " -i \"{}\" -c copy \"{}.{}\"",
            t.url,
            t.name_with_timestamp(),
            t.extension
        )
    },
};

static STREAMLINK: Dialect = Dialect {
    base: |_| "streamlink".to_string(),
    proxy: Some(|p| format!(" --http-proxy \"{p}\"")),
    headers: |h| {
        flag_headers(
            h,
            |ua| format!(" --http-header \"User-Agent={ua}\""),
            |c| format!(" --http-header \"Cookie={c}\""),
            |r| format!(" --http-header \"Referer={r}\""),
        )
    },
    trailer: |t| {
        let mut out = String::new();
        if t.streamlink_file_output {
            out.push_str(&format!(
                " -o \"{}.{}\"",
                t.name_with_timestamp(),
                t.extension
            ));
        }
        out.push_str(&format!(" \"{}\" best", t.url));
        out
    },
};

static YOUTUBE_DL: Dialect = Dialect {
    base: |ctx| youtube_dl_family_base("youtube-dl", ctx),
    proxy: Some(|p| format!(" --proxy \"{p}\"")),
    headers: |h| {
        flag_headers(
            h,
            |ua| format!(" --user-agent \"{ua}\""),
            |c| format!(" --add-header \"Cookie:{c}\""),
            |r| format!(" --referer \"{r}\""),
        )
    },
    trailer: youtube_dl_family_trailer,
};

static YT_DLP: Dialect = Dialect {
    base: |ctx| youtube_dl_family_base("yt-dlp", ctx),
    proxy: Some(|p| format!(" --proxy \"{p}\"")),
    headers: |h| {
        flag_headers(
            h,
            |ua| format!(" --user-agent \"{ua}\""),
            |c| format!(" --add-header \"Cookie:{c}\""),
            |r| format!(" --referer \"{r}\""),
        )
    },
    trailer: youtube_dl_family_trailer,
};

fn youtube_dl_family_trailer(t: &TrailerCtx) -> String {
    let mut out = String::new();
    if t.explicit_output {
        let epoch = if t.timestamp.is_some() { " %(epoch)s" } else { "" };
        out.push_str(&format!(" --output \"{}{}.%(ext)s\"", t.output_name, epoch));
    }
    out.push_str(&format!(" \"{}\"", t.url));
    out
}

static HLSDL: Dialect = Dialect {
    base: |_| "hlsdl -b -c".to_string(),
    proxy: Some(|p| format!(" -p \"{p}\"")),
    headers: |h| {
        flag_headers(
            h,
            |ua| format!(" -u \"{ua}\""),
            |c| format!(" -h \"Cookie:{c}\""),
            |r| format!(" -h \"Referer:{r}\""),
        )
    },
    trailer: |t| {
        format!(
            " -o \"{}.{}\" \"{}\"",
            t.name_with_timestamp(),
            t.extension,
            t.url
        )
    },
};

static NM3U8DL: Dialect = Dialect {
    base: |ctx| {
        format!(
            "N_m3u8DL-CLI \"{}\" --enableMuxFastStart --enableDelAfterDone",
            ctx.url
        )
    },
    proxy: Some(|p| format!(" --proxyAddress \"{p}\"")),
    headers: |h| {
        let mut parts = vec![format!("User-Agent:{}", encode_component(&h.user_agent))];
        if let Some(c) = &h.cookie {
            parts.push(format!("Cookie:{}", encode_component(c)));
        }
        if let Some(r) = &h.referer {
            parts.push(format!("Referer:{}", encode_component(r)));
        }
        format!(" --header \"{}\"", parts.join("|"))
    },
    trailer: |t| format!(" --saveName \"{}\"", t.name_with_timestamp()),
};

static KODI_URL: Dialect = Dialect {
    base: |ctx| ctx.url.to_string(),
    proxy: None,
    headers: |h| {
        let mut out = String::new();
        let mut sep = '|';
        for (name, value) in [
            ("User-Agent", Some(h.user_agent.as_str())),
            ("Cookie", h.cookie.as_deref()),
            ("Referer", h.referer.as_deref()),
        ] {
            if let Some(value) = value {
                out.push(sep);
                out.push_str(&format!("{}={}", name, encode_component(value)));
                sep = '&';
            }
        }
        out
    },
    trailer: |_| String::new(),
};
