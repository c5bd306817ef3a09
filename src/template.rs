//! Request templating
//!
//! `{name}` tokens in URLs and header values are replaced from two sources, in order:
//! the request's own placeholder headers (`{id}: 42`), then the selected context.
//! Bodies are sent as written and never substituted.

use regex::{Captures, Regex};
use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use crate::constants::BACK_COLOR_NAME;
use crate::models::{HeaderMap, Request, ResolvedRequest, Url};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^{}]*\}").expect("placeholder pattern is valid"));

/// A source of `{name}` -> value bindings
pub trait Variables {
    fn lookup(&self, token: &str) -> Option<&str>;
}

impl Variables for HashMap<String, String> {
    fn lookup(&self, token: &str) -> Option<&str> {
        self.get(token).map(String::as_str)
    }
}

impl Variables for BTreeMap<String, String> {
    fn lookup(&self, token: &str) -> Option<&str> {
        self.get(token).map(String::as_str)
    }
}

/// `{...}` as a whole string
pub fn is_placeholder(value: &str) -> bool {
    value.len() >= 2 && value.starts_with('{') && value.ends_with('}')
}

/// Every `{name}` token in `text`, in order of appearance
pub fn placeholders(text: &str) -> Vec<String> {
    PLACEHOLDER
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Replace each known `{name}` token in a single left-to-right pass.
///
/// Unknown tokens stay verbatim. Replacement text is not rescanned.
pub fn substitute<V: Variables + ?Sized>(text: &str, variables: &V) -> String {
    PLACEHOLDER
        .replace_all(text, |caps: &Captures| {
            let token = &caps[0];
            variables.lookup(token).unwrap_or(token).to_string()
        })
        .into_owned()
}

/// Headers whose whole value is a known token take the bound value
pub fn apply_to_header_values<V: Variables + ?Sized>(headers: &HeaderMap, variables: &V) -> HeaderMap {
    headers
        .iter()
        .map(|(key, value)| {
            let value = variables.lookup(value).unwrap_or(value);
            (key.clone(), value.to_string())
        })
        .collect()
}

/// Literal headers to put on the wire.
///
/// Placeholder keys only declare request variables and are dropped. Placeholder
/// values are resolved against `context`; those still unresolved are dropped.
pub fn outbound_headers<V: Variables + ?Sized>(headers: &HeaderMap, context: &V) -> HeaderMap {
    let literal: HeaderMap = headers
        .iter()
        .filter(|(key, _)| !is_placeholder(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    apply_to_header_values(&literal, context)
        .into_iter()
        .filter(|(key, value)| {
            let unresolved = is_placeholder(value);
            if unresolved {
                tracing::debug!(header = %key, value = %value, "header dropped, no value for placeholder");
            }
            !unresolved
        })
        .collect()
}

/// Resolve a draft into what the transport sends
pub fn resolve<V: Variables + ?Sized>(draft: &Request, context: &V) -> ResolvedRequest {
    let url = substitute(&substitute(draft.url.as_str(), &draft.headers), context);
    let unresolved = placeholders(&url);
    if !unresolved.is_empty() {
        tracing::debug!(?unresolved, "unresolved placeholders left in url");
    }

    ResolvedRequest {
        method: draft.method.clone(),
        url: Url::new(url),
        content_type: draft.content_type.clone(),
        body: draft.body.as_bytes().to_vec(),
        headers: outbound_headers(&draft.headers, context),
    }
}

/// Render a tree label from a display pattern.
///
/// Tokens: `{m}`, `{url}`, `{u}`, `{a}|{u}`, `{a}|{url}`, `{color}`, `{backColor}`.
pub fn tree_label(request: &Request, pattern: &str) -> String {
    if pattern.is_empty() {
        return format!("{} {}", request.method.label(), request.url);
    }

    let alias_or = |fallback: String| {
        if request.alias.is_empty() {
            fallback
        } else {
            request.alias.clone()
        }
    };

    let mut value = pattern.replace("{m}", &request.method.label());
    if value.contains("{a}|{u}") {
        value = value.replace("{a}|{u}", &alias_or(request.url.base()));
    }
    if value.contains("{a}|{url}") {
        value = value.replace("{a}|{url}", &alias_or(request.url.to_string()));
    }
    value
        .replace("{color}", request.method.tree_color())
        .replace("{url}", request.url.as_str())
        .replace("{u}", &request.url.base())
        .replace("{backColor}", BACK_COLOR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_substitute_unknown_tokens_untouched() {
        assert_eq!(substitute("http://x/{id}", &vars(&[])), "http://x/{id}");
    }

    #[test]
    fn test_substitute_all_occurrences() {
        let v = vars(&[("{host}", "localhost:3000"), ("{id}", "7")]);
        assert_eq!(
            substitute("http://{host}/users/{id}/copy/{id}", &v),
            "http://localhost:3000/users/7/copy/7"
        );
    }

    #[test]
    fn test_substitute_does_not_rescan_replacements() {
        let v = vars(&[("{a}", "{b}"), ("{b}", "boom")]);
        assert_eq!(substitute("/{a}/{b}", &v), "/{b}/boom");
    }

    #[test]
    fn test_substitute_chained_header_then_context() {
        let headers: HeaderMap = [("{path}".to_string(), "{version}/users".to_string())].into();
        let context = vars(&[("{version}", "v2"), ("{host}", "api.local")]);

        let first = substitute("http://{host}/{path}", &headers);
        assert_eq!(first, "http://{host}/{version}/users");
        assert_eq!(substitute(&first, &context), "http://api.local/v2/users");
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders("http://{host}/x/{id}"), vec!["{host}", "{id}"]);
        assert!(placeholders("http://plain").is_empty());
    }

    #[test]
    fn test_outbound_headers_filtering() {
        let headers: HeaderMap = [
            ("{h}".to_string(), "ignored".to_string()),
            ("Accept".to_string(), "text/plain".to_string()),
            ("Authorization".to_string(), "{token}".to_string()),
            ("X-Trace".to_string(), "{missing}".to_string()),
        ]
        .into();
        let context = vars(&[("{token}", "Bearer abc")]);

        let out = outbound_headers(&headers, &context);

        assert_eq!(out.len(), 2);
        assert_eq!(out["Accept"], "text/plain");
        assert_eq!(out["Authorization"], "Bearer abc");
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_outbound_headers_logs_dropped_header() {
        let headers: HeaderMap = [("X-Trace".to_string(), "{missing}".to_string())].into();
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();

        let out = tracing::subscriber::with_default(subscriber, || {
            outbound_headers(&headers, &vars(&[]))
        });

        assert!(out.is_empty());
        let log = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(log.contains("header dropped"));
        assert!(log.contains("X-Trace"));
    }

    #[test]
    fn test_apply_to_header_values_exact_match_only() {
        let headers: HeaderMap = [
            ("A".to_string(), "{x}".to_string()),
            ("B".to_string(), "pre {x}".to_string()),
        ]
        .into();
        let out = apply_to_header_values(&headers, &vars(&[("{x}", "1")]));
        assert_eq!(out["A"], "1");
        assert_eq!(out["B"], "pre {x}");
    }

    #[test]
    fn test_resolve_leaves_body_alone() {
        let draft = Request::new("POST", "http://{host}/items")
            .with_body(r#"{"host":"{host}"}"#);
        let resolved = resolve(&draft, &vars(&[("{host}", "example.org")]));

        assert_eq!(resolved.url.as_str(), "http://example.org/items");
        assert_eq!(resolved.body, br#"{"host":"{host}"}"#.to_vec());
        assert_eq!(resolved.content_type, "application/json");
    }

    #[test]
    fn test_tree_label_empty_pattern() {
        let request = Request::new("GET", "http://x/users");
        assert_eq!(tree_label(&request, ""), "GET     http://x/users");
    }

    #[test]
    fn test_tree_label_alias_or_short_url() {
        let plain = Request::new("GET", "http://x/api/users");
        let aliased = plain.clone().with_alias("list users");

        assert_eq!(tree_label(&plain, "{a}|{u}"), "~/users");
        assert_eq!(tree_label(&aliased, "{a}|{u}"), "list users");
        assert_eq!(tree_label(&plain, "{a}|{url}"), "http://x/api/users");
        assert_eq!(tree_label(&aliased, "{a}|{url}"), "list users");
    }

    #[test]
    fn test_tree_label_all_tokens() {
        let request = Request::new("DELETE", "http://x/api/users/1");
        assert_eq!(
            tree_label(&request, "{color}{m}[white:{backColor}] {u} ({url})"),
            "[red:]DELETE [white:#2B2B2B] ~/1 (http://x/api/users/1)"
        );
    }
}
