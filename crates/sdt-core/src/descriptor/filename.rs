//! Filename derivation from URL paths.
//!
//! For directory-style manifests (e.g. `.../video.ism/manifest`) the literal
//! trailing segment is meaningless; the parent segment is used instead.

/// Extracts a filename hint from the URL path.
///
/// When `directory_manifest` is set (a rule property), the trailing path
/// segment is dropped first so the parent segment names the resource.
/// Returns `None` if the URL cannot be parsed or the path is empty/root.
pub fn filename_from_url(url: &str, directory_manifest: bool) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let mut path = parsed.path();
    if directory_manifest {
        if let Some(idx) = path.rfind('/') {
            path = &path[..idx];
        }
    }
    let segment = path.split('/').filter(|s| !s.is_empty()).last()?;
    if segment == "." || segment == ".." {
        return None;
    }
    Some(segment.to_string())
}

/// Hostname of the URL, for display and as a filename fallback.
pub fn hostname_from_url(url: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()?
        .host_str()
        .map(|h| h.to_string())
}

/// Replaces path-hostile characters with `_` so the value is safe inside a
/// quoted output filename.
pub fn sanitize_path_component(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | '?' | '%' | '*' | ':' | '|' | '"' | '<' | '>' => '_',
            c => c,
        })
        .collect()
}

/// Strips the final `.ext` from a filename. Names without an extension, or
/// with only a leading dot, are returned unchanged.
pub fn strip_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_path() {
        assert_eq!(
            filename_from_url("https://cdn.example.com/abc/master.m3u8", false).as_deref(),
            Some("master.m3u8")
        );
        assert_eq!(
            filename_from_url("https://example.com/single", false).as_deref(),
            Some("single")
        );
    }

    #[test]
    fn query_is_not_part_of_the_filename() {
        assert_eq!(
            filename_from_url("https://example.com/video.mp4?token=abc", false).as_deref(),
            Some("video.mp4")
        );
    }

    #[test]
    fn directory_manifest_uses_parent_segment() {
        assert_eq!(
            filename_from_url("https://cdn.example.com/vod/movie.ism/manifest", true).as_deref(),
            Some("movie.ism")
        );
    }

    #[test]
    fn root_or_invalid() {
        assert_eq!(filename_from_url("https://example.com/", false), None);
        assert_eq!(filename_from_url("not a url", false), None);
    }

    #[test]
    fn sanitize_replaces_hostile_characters() {
        assert_eq!(
            sanitize_path_component("a/b\\c?d%e*f:g|h\"i<j>k"),
            "a_b_c_d_e_f_g_h_i_j_k"
        );
        assert_eq!(sanitize_path_component("plain name"), "plain name");
    }

    #[test]
    fn strip_extension_cases() {
        assert_eq!(strip_extension("master.m3u8"), "master");
        assert_eq!(strip_extension("archive.tar.gz"), "archive.tar");
        assert_eq!(strip_extension("noext"), "noext");
        assert_eq!(strip_extension(".hidden"), ".hidden");
    }
}
