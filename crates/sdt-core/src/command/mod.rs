//! Command synthesis: turn one resource descriptor plus user configuration
//! into a ready-to-run downloader invocation.
//!
//! Pure over its inputs. Incompatible tool/resource pairs degrade to the
//! bare URL and are flagged, never hidden.

mod dialect;
mod headers;
mod template;

pub use dialect::Tool;
pub use headers::{
    referring_context, resolve_cookie, resolve_headers, resolve_referer, resolve_user_agent,
    ResolvedHeaders, DEFAULT_USER_AGENT, PRIVILEGED_SCHEMES,
};
pub use template::PLACEHOLDERS;

use crate::descriptor::{sanitize_path_component, strip_extension, ResourceDescriptor};
use crate::rules::Category;

use dialect::{dialect, BaseCtx, TrailerCtx};
use template::TemplateValues;

/// User configuration consumed by one synthesis run. Built from the flat
/// preference namespace by the config layer.
#[derive(Debug, Clone, Default)]
pub struct SynthesisConfig {
    pub tool: Tool,
    /// Inject user-agent/cookie/referer flags.
    pub inject_headers: bool,
    pub proxy: Option<String>,
    /// User-defined suffix for the chosen tool, appended after the base.
    pub custom_args: Option<String>,
    pub output_extension: String,
    /// Prefer the tab title over the URL-derived filename.
    pub use_tab_title: bool,
    pub timestamp_suffix: bool,
    /// Table form: show the tab title as the source column when available.
    pub display_title: bool,
    pub streamlink_file_output: bool,
    pub external_downloader: Option<String>,
    pub user_template: Option<String>,
    /// Optional final regex replace over the substituted template.
    pub template_replace: Option<(String, String)>,
}

/// One synthesized command. `degraded` marks a fallback to the bare URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedCommand {
    pub text: String,
    pub degraded: bool,
}

/// Batch result for a "copy all" action.
#[derive(Debug, Clone)]
pub struct BatchSynthesis {
    pub commands: Vec<SynthesizedCommand>,
    pub filenames: Vec<String>,
    pub any_degraded: bool,
}

/// The fixed compatibility matrix: which resource types a tool can express.
pub fn compatible(resource_type: &str, category: Category, tool: Tool) -> bool {
    if matches!(tool, Tool::Url | Tool::UserTemplate) {
        return true;
    }
    if matches!(category, Category::Subtitles | Category::Custom) {
        return false;
    }
    match tool {
        Tool::Ffmpeg => resource_type != "HDS" && resource_type != "MSS",
        Tool::Streamlink | Tool::KodiUrl | Tool::TableForm => resource_type != "MSS",
        Tool::YoutubeDl | Tool::YtDlp => true,
        Tool::Hlsdl | Tool::Nm3u8Dl => resource_type == "HLS",
        Tool::Url | Tool::UserTemplate => true,
    }
}

/// Output basename for the synthesized command: the tab title when preferred
/// and available, otherwise the URL-derived filename with its extension
/// stripped; path-hostile characters sanitized either way.
pub fn output_basename(descriptor: &ResourceDescriptor, use_tab_title: bool) -> String {
    let name = match (&descriptor.tab_context.title, use_tab_title) {
        (Some(title), true) => title.clone(),
        _ => strip_extension(&descriptor.filename).to_string(),
    };
    sanitize_path_component(&name)
}

/// Epoch-milliseconds timestamp formatted for display (UTC).
pub fn format_timestamp(time_stamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(time_stamp_ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

fn sanitized_timestamp(time_stamp_ms: i64) -> String {
    sanitize_path_component(&format_timestamp(time_stamp_ms))
}

/// Synthesizes one command for a descriptor under the given configuration.
///
/// Compatibility is checked before any string building; an incompatible tool
/// or an empty user template degrades to the bare URL with `degraded=true`.
pub fn synthesize(descriptor: &ResourceDescriptor, config: &SynthesisConfig) -> SynthesizedCommand {
    let mut degraded = false;
    let mut tool = config.tool;

    if !compatible(&descriptor.resource_type, descriptor.category, tool) {
        tool = Tool::Url;
        degraded = true;
    }
    if tool == Tool::UserTemplate
        && config
            .user_template
            .as_deref()
            .map_or(true, |t| t.trim().is_empty())
    {
        tool = Tool::Url;
        degraded = true;
    }

    let text = match tool {
        Tool::Url => descriptor.url.clone(),
        Tool::TableForm => table_form(descriptor, config),
        Tool::UserTemplate => user_template(descriptor, config),
        _ => build_command(descriptor, config, tool),
    };

    SynthesizedCommand { text, degraded }
}

/// Synthesizes a batch (e.g. "copy all"), reporting whether any entry
/// degraded so the caller can surface it.
pub fn synthesize_batch(
    descriptors: &[ResourceDescriptor],
    config: &SynthesisConfig,
) -> BatchSynthesis {
    let commands: Vec<SynthesizedCommand> = descriptors
        .iter()
        .map(|d| synthesize(d, config))
        .collect();
    let filenames = descriptors.iter().map(|d| d.filename.clone()).collect();
    let any_degraded = commands.iter().any(|c| c.degraded);
    BatchSynthesis {
        commands,
        filenames,
        any_degraded,
    }
}

/// Construction order for pipeline tools: base, custom args, proxy, headers,
/// trailer.
fn build_command(descriptor: &ResourceDescriptor, config: &SynthesisConfig, tool: Tool) -> String {
    let Some(dl) = dialect(tool) else {
        return descriptor.url.clone();
    };

    let base_ctx = BaseCtx {
        url: &descriptor.url,
        external_downloader: match tool {
            Tool::YoutubeDl | Tool::YtDlp => config.external_downloader.as_deref(),
            _ => None,
        },
    };
    let mut code = (dl.base)(&base_ctx);

    if let Some(args) = &config.custom_args {
        code.push(' ');
        code.push_str(args);
    }

    if let (Some(proxy_flag), Some(proxy)) = (dl.proxy, config.proxy.as_deref()) {
        code.push_str(&proxy_flag(proxy));
    }

    if config.inject_headers {
        code.push_str(&(dl.headers)(&resolve_headers(descriptor)));
    }

    let timestamp = config
        .timestamp_suffix
        .then(|| sanitized_timestamp(descriptor.time_stamp));
    let output_name = output_basename(descriptor, config.use_tab_title);
    let trailer_ctx = TrailerCtx {
        url: &descriptor.url,
        output_name: &output_name,
        timestamp: timestamp.as_deref(),
        extension: &config.output_extension,
        streamlink_file_output: config.streamlink_file_output,
        explicit_output: (config.use_tab_title && descriptor.tab_context.title.is_some())
            || config.timestamp_suffix,
    };
    code.push_str(&(dl.trailer)(&trailer_ctx));
    code
}

/// `url | source | timestamp` row for pasting into a table.
fn table_form(descriptor: &ResourceDescriptor, config: &SynthesisConfig) -> String {
    let source = match &descriptor.tab_context.title {
        Some(title) if config.display_title && !descriptor.url.contains(title.as_str()) => {
            title.as_str()
        }
        _ => descriptor.hostname.as_str(),
    };
    format!(
        "{} | {} | {}",
        descriptor.url,
        source,
        format_timestamp(descriptor.time_stamp)
    )
}

fn user_template(descriptor: &ResourceDescriptor, config: &SynthesisConfig) -> String {
    let values = TemplateValues {
        url: descriptor.url.clone(),
        filename: descriptor.filename.clone(),
        user_agent: resolve_user_agent(descriptor),
        cookie: resolve_cookie(descriptor),
        referer: resolve_referer(descriptor),
        origin: referring_context(descriptor).map(|s| s.to_string()),
        tab_title: descriptor
            .tab_context
            .title
            .as_deref()
            .map(sanitize_path_component),
        proxy: config.proxy.clone(),
        timestamp: sanitized_timestamp(descriptor.time_stamp),
    };
    let out = template::substitute(
        config.user_template.as_deref().unwrap_or_default(),
        &values,
    );
    match &config.template_replace {
        Some((pattern, replacement)) => template::apply_replace(&out, pattern, replacement),
        None => out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::TabContext;
    use crate::exchange::Header;

    fn descriptor(
        url: &str,
        resource_type: &str,
        category: Category,
        headers: Vec<Header>,
    ) -> ResourceDescriptor {
        let filename = crate::descriptor::filename_from_url(url, false).unwrap();
        ResourceDescriptor {
            request_id: "r1".to_string(),
            url: url.to_string(),
            resource_type: resource_type.to_string(),
            category,
            filename,
            hostname: "cdn.example.com".to_string(),
            headers,
            tab_context: TabContext::default(),
            time_stamp: 1_704_103_200_000, // 2024-01-01 10:00:00 UTC
            tab_id: Some(1),
            document_url: None,
            origin_url: None,
            initiator: None,
        }
    }

    fn hls(headers: Vec<Header>) -> ResourceDescriptor {
        descriptor(
            "https://cdn.example.com/abc/clip.m3u8",
            "HLS",
            Category::Stream,
            headers,
        )
    }

    fn config(tool: Tool) -> SynthesisConfig {
        SynthesisConfig {
            tool,
            inject_headers: true,
            output_extension: "ts".to_string(),
            streamlink_file_output: true,
            ..Default::default()
        }
    }

    #[test]
    fn ffmpeg_command_shape() {
        let d = hls(vec![Header::new("Referer", "https://site.example")]);
        let cmd = synthesize(&d, &config(Tool::Ffmpeg));
        assert!(!cmd.degraded);
        assert!(cmd.text.starts_with("ffmpeg "));
        assert!(cmd.text.contains(" -referer \"https://site.example\""));
        assert!(cmd
            .text
            .ends_with(" -i \"https://cdn.example.com/abc/clip.m3u8\" -c copy \"clip.ts\""));
    }

    #[test]
    fn construction_order_is_base_args_proxy_headers_trailer() {
        let d = hls(vec![]);
        let mut cfg = config(Tool::Ffmpeg);
        cfg.custom_args = Some("-loglevel warning".to_string());
        cfg.proxy = Some("http://127.0.0.1:8080".to_string());
        let cmd = synthesize(&d, &cfg);
        assert_eq!(
            cmd.text,
            format!(
                "ffmpeg -loglevel warning -http_proxy \"http://127.0.0.1:8080\" \
                 -user_agent \"{DEFAULT_USER_AGENT}\" \
                 -i \"https://cdn.example.com/abc/clip.m3u8\" -c copy \"clip.ts\""
            )
        );
    }

    #[test]
    fn incompatible_pairs_degrade_to_bare_url() {
        let cases = [
            ("HDS", Category::Stream, Tool::Ffmpeg),
            ("MSS", Category::Stream, Tool::Streamlink),
            ("MSS", Category::Stream, Tool::Hlsdl),
            ("DASH", Category::Stream, Tool::Hlsdl),
            ("DASH", Category::Stream, Tool::Nm3u8Dl),
            ("VTT", Category::Subtitles, Tool::Ffmpeg),
            ("VTT", Category::Subtitles, Tool::KodiUrl),
            ("CUSTOM", Category::Custom, Tool::YtDlp),
        ];
        for (resource_type, category, tool) in cases {
            let d = descriptor(
                "https://cdn.example.com/r/file.bin",
                resource_type,
                category,
                vec![],
            );
            let cmd = synthesize(&d, &config(tool));
            assert!(cmd.degraded, "{resource_type}/{tool} should degrade");
            assert_eq!(cmd.text, d.url);
        }
    }

    #[test]
    fn compatible_pairs_do_not_degrade() {
        let cases = [
            ("MSS", Category::Stream, Tool::YoutubeDl),
            ("MSS", Category::Stream, Tool::YtDlp),
            ("HLS", Category::Stream, Tool::Hlsdl),
            ("VTT", Category::Subtitles, Tool::Url),
            ("HDS", Category::Stream, Tool::Streamlink),
        ];
        for (resource_type, category, tool) in cases {
            assert!(
                compatible(resource_type, category, tool),
                "{resource_type}/{tool} should be compatible"
            );
        }
    }

    #[test]
    fn empty_user_template_degrades() {
        let d = hls(vec![]);
        let mut cfg = config(Tool::UserTemplate);
        cfg.user_template = Some("   ".to_string());
        let cmd = synthesize(&d, &cfg);
        assert!(cmd.degraded);
        assert_eq!(cmd.text, d.url);
    }

    #[test]
    fn user_template_substitutes_with_default_user_agent() {
        let d = hls(vec![]);
        let mut cfg = config(Tool::UserTemplate);
        cfg.user_template = Some("dl %url% -ua %useragent%".to_string());
        let cmd = synthesize(&d, &cfg);
        assert!(!cmd.degraded);
        assert_eq!(
            cmd.text,
            format!("dl https://cdn.example.com/abc/clip.m3u8 -ua {DEFAULT_USER_AGENT}")
        );
        assert!(!cmd.text.contains("%useragent%"));
    }

    #[test]
    fn user_template_replace_pass_runs_last() {
        let d = hls(vec![]);
        let mut cfg = config(Tool::UserTemplate);
        cfg.user_template = Some("dl %url%".to_string());
        cfg.template_replace = Some(("https".to_string(), "hls".to_string()));
        let cmd = synthesize(&d, &cfg);
        assert_eq!(cmd.text, "dl hls://cdn.example.com/abc/clip.m3u8");
    }

    #[test]
    fn kodi_url_appends_encoded_header_suffix() {
        let d = hls(vec![
            Header::new("User-Agent", "UA 1"),
            Header::new("Referer", "https://r.example/p"),
        ]);
        let cmd = synthesize(&d, &config(Tool::KodiUrl));
        assert_eq!(
            cmd.text,
            "https://cdn.example.com/abc/clip.m3u8|User-Agent=UA%201&Referer=https%3A%2F%2Fr.example%2Fp"
        );
    }

    #[test]
    fn table_form_prefers_title_over_hostname() {
        let mut d = hls(vec![]);
        d.tab_context.title = Some("Great Video".to_string());
        let mut cfg = config(Tool::TableForm);
        cfg.display_title = true;
        let cmd = synthesize(&d, &cfg);
        assert_eq!(
            cmd.text,
            "https://cdn.example.com/abc/clip.m3u8 | Great Video | 2024-01-01 10:00:00"
        );

        cfg.display_title = false;
        let cmd = synthesize(&d, &cfg);
        assert!(cmd.text.contains(" | cdn.example.com | "));
    }

    #[test]
    fn timestamp_suffix_is_sanitized() {
        let d = hls(vec![]);
        let mut cfg = config(Tool::Hlsdl);
        cfg.inject_headers = false;
        cfg.timestamp_suffix = true;
        let cmd = synthesize(&d, &cfg);
        assert_eq!(
            cmd.text,
            "hlsdl -b -c -o \"clip 2024-01-01 10_00_00.ts\" \"https://cdn.example.com/abc/clip.m3u8\""
        );
    }

    #[test]
    fn tab_title_filename_wins_when_preferred() {
        let mut d = hls(vec![]);
        d.tab_context.title = Some("My: Show".to_string());
        assert_eq!(output_basename(&d, true), "My_ Show");
        assert_eq!(output_basename(&d, false), "clip");
    }

    #[test]
    fn batch_reports_any_degraded() {
        let ok = hls(vec![]);
        let bad = descriptor(
            "https://cdn.example.com/s.vtt",
            "VTT",
            Category::Subtitles,
            vec![],
        );
        let batch = synthesize_batch(&[ok, bad], &config(Tool::Ffmpeg));
        assert!(batch.any_degraded);
        assert_eq!(batch.commands.len(), 2);
        assert_eq!(batch.filenames, vec!["clip.m3u8", "s.vtt"]);
        assert!(!batch.commands[0].degraded);
        assert!(batch.commands[1].degraded);
    }
}
