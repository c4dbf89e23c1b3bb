//! User-template substitution: `%placeholder%` tokens replaced against the
//! descriptor, absent values becoming empty strings, with an optional final
//! regex replace pass.

/// Every recognized placeholder token.
pub const PLACEHOLDERS: [&str; 9] = [
    "%url%",
    "%filename%",
    "%useragent%",
    "%cookie%",
    "%referer%",
    "%origin%",
    "%tabtitle%",
    "%proxy%",
    "%timestamp%",
];

/// Values for one substitution pass. `None` substitutes as empty.
#[derive(Debug, Default)]
pub(crate) struct TemplateValues {
    pub url: String,
    pub filename: String,
    pub user_agent: String,
    pub cookie: Option<String>,
    pub referer: Option<String>,
    pub origin: Option<String>,
    pub tab_title: Option<String>,
    pub proxy: Option<String>,
    pub timestamp: String,
}

pub(crate) fn substitute(template: &str, values: &TemplateValues) -> String {
    let pairs: [(&str, &str); 9] = [
        ("%url%", &values.url),
        ("%filename%", &values.filename),
        ("%useragent%", &values.user_agent),
        ("%cookie%", values.cookie.as_deref().unwrap_or("")),
        ("%referer%", values.referer.as_deref().unwrap_or("")),
        ("%origin%", values.origin.as_deref().unwrap_or("")),
        ("%tabtitle%", values.tab_title.as_deref().unwrap_or("")),
        ("%proxy%", values.proxy.as_deref().unwrap_or("")),
        ("%timestamp%", &values.timestamp),
    ];
    let mut out = template.to_string();
    for (token, value) in pairs {
        out = out.replace(token, value);
    }
    out
}

/// Final user-supplied replace pass. An invalid pattern is a configuration
/// inconsistency, not a failure: the text passes through unchanged.
pub(crate) fn apply_replace(text: &str, pattern: &str, replacement: &str) -> String {
    match regex::Regex::new(pattern) {
        Ok(re) => re.replace_all(text, replacement).into_owned(),
        Err(err) => {
            tracing::warn!(%pattern, %err, "invalid template replace pattern; skipping");
            text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_placeholder_substitutes_its_value() {
        let values = TemplateValues {
            url: "U".to_string(),
            filename: "F".to_string(),
            user_agent: "A".to_string(),
            cookie: Some("C".to_string()),
            referer: Some("R".to_string()),
            origin: Some("O".to_string()),
            tab_title: Some("T".to_string()),
            proxy: Some("P".to_string()),
            timestamp: "S".to_string(),
        };
        let template = PLACEHOLDERS.join(",");
        assert_eq!(substitute(&template, &values), "U,F,A,C,R,O,T,P,S");
    }

    #[test]
    fn absent_values_become_empty_not_literal_tokens() {
        let values = TemplateValues {
            url: "U".to_string(),
            ..Default::default()
        };
        let out = substitute("dl %url% -c '%cookie%' -r '%referer%'", &values);
        assert_eq!(out, "dl U -c '' -r ''");
        assert!(!out.contains('%'));
    }

    #[test]
    fn repeated_tokens_all_substitute() {
        let values = TemplateValues {
            url: "U".to_string(),
            ..Default::default()
        };
        assert_eq!(substitute("%url% %url%", &values), "U U");
    }

    #[test]
    fn replace_pass_applies_and_tolerates_bad_patterns() {
        assert_eq!(apply_replace("a b c", r"\s+", "_"), "a_b_c");
        assert_eq!(apply_replace("a b c", r"(", "_"), "a b c");
    }
}
