//! Pure request assembly and response classification.
//!
//! Split out of the gateway so auth injection and classification are
//! testable without touching a socket.

use conductor_policy::AuthRule;
use conductor_primitives::{truncate_chars, OutcomeMeta, ToolOutcome};
use conductor_tools::HttpBinding;
use serde_json::{Map, Value};

use crate::error::{GatewayError, GatewayResult};

/// Placeholder the `PathToken` auth rule substitutes in the endpoint path.
const PATH_TOKEN: &str = "{api_key}";

/// Cap applied to error bodies echoed back in failure envelopes.
const ERROR_BODY_CHARS: usize = 500;

const TRUNCATION_MARKER: &str = "…";

/// Everything needed to issue one outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PreparedRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

/// Extracts the host component of a URL, without port.
pub(crate) fn host_of(url: &str) -> Option<String> {
    let uri: hyper::Uri = url.parse().ok()?;
    uri.host().map(str::to_owned)
}

/// Builds the final URL, headers, and body for a binding call, applying the
/// domain's auth rule when the binding names a credential.
pub(crate) fn prepare(
    binding: &HttpBinding,
    params: &Map<String, Value>,
    auth: Option<(&AuthRule, &str)>,
) -> GatewayResult<PreparedRequest> {
    let mut path = binding.endpoint().to_owned();
    let mut query: Vec<(String, String)> = Vec::new();
    let mut headers: Vec<(String, String)> = Vec::new();
    let mut body: Option<Vec<u8>> = None;

    match auth {
        Some((AuthRule::Bearer, secret)) => {
            headers.push(("authorization".to_owned(), format!("Bearer {secret}")));
        }
        Some((AuthRule::Header { name }, secret)) => {
            // hyper wants lowercase header names anyway; normalise here so
            // the prepared request is deterministic.
            headers.push((name.to_ascii_lowercase(), secret.to_owned()));
        }
        Some((AuthRule::Query { param }, secret)) => {
            query.push((param.clone(), secret.to_owned()));
        }
        Some((AuthRule::PathToken, secret)) => {
            if !path.contains(PATH_TOKEN) {
                return Err(GatewayError::configuration(format!(
                    "auth rule is path-token but the endpoint has no `{PATH_TOKEN}` placeholder"
                )));
            }
            path = path.replace(PATH_TOKEN, secret);
        }
        None => {}
    }

    if binding.method().sends_body() {
        headers.push(("content-type".to_owned(), "application/json".to_owned()));
        let encoded = serde_json::to_vec(&Value::Object(params.clone()))
            .map_err(|err| GatewayError::transport(format!("failed to encode body: {err}")))?;
        body = Some(encoded);
    } else {
        for (key, value) in params {
            query.push((key.clone(), render_query_value(value)));
        }
    }

    let mut url = format!("{}{}", binding.base_url(), path);
    if !query.is_empty() {
        let encoded: Vec<String> = query
            .iter()
            .map(|(key, value)| {
                format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
            })
            .collect();
        url.push('?');
        url.push_str(&encoded.join("&"));
    }

    Ok(PreparedRequest { url, headers, body })
}

/// Classifies an upstream response into the uniform envelope.
///
/// 2xx with a JSON body succeeds with that payload; 2xx otherwise succeeds
/// with the raw text and a content-type hint; anything else is a typed
/// status error carrying a truncated body.
pub(crate) fn classify(
    status: u16,
    content_type: Option<&str>,
    bytes: &[u8],
) -> GatewayResult<ToolOutcome> {
    if !(200..300).contains(&status) {
        let body = truncate_chars(
            String::from_utf8_lossy(bytes).trim(),
            ERROR_BODY_CHARS,
            TRUNCATION_MARKER,
        );
        return Err(GatewayError::Status { status, body });
    }

    let meta = OutcomeMeta::default()
        .with_status(status)
        .with_bytes(bytes.len());
    if let Ok(value) = serde_json::from_slice::<Value>(bytes) {
        return Ok(ToolOutcome::ok(value).with_metadata(meta));
    }

    let text = String::from_utf8_lossy(bytes).into_owned();
    let hint = content_type.unwrap_or("text/plain").to_owned();
    Ok(ToolOutcome::ok(Value::String(text)).with_metadata(meta.with_content_type(hint)))
}

fn render_query_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use conductor_tools::BindMethod;
    use serde_json::json;

    use super::*;

    fn params(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), value.clone()))
            .collect()
    }

    fn get_binding() -> HttpBinding {
        HttpBinding::new("https://api.example.com", "/v1/price", BindMethod::Get)
            .expect("binding")
    }

    #[test]
    fn host_extraction_strips_port_and_path() {
        assert_eq!(
            host_of("https://api.example.com:8443/v1/x?y=1"),
            Some("api.example.com".to_owned())
        );
        assert_eq!(host_of("http://127.0.0.1:9000/ping"), Some("127.0.0.1".to_owned()));
        assert_eq!(host_of("not a url"), None);
    }

    #[test]
    fn get_params_travel_in_the_query_string() {
        let prepared = prepare(
            &get_binding(),
            &params(&[("symbol", json!("ETH")), ("days", json!(7))]),
            None,
        )
        .expect("prepare");
        assert!(prepared.url.starts_with("https://api.example.com/v1/price?"));
        assert!(prepared.url.contains("symbol=ETH"));
        assert!(prepared.url.contains("days=7"));
        assert!(prepared.body.is_none());
    }

    #[test]
    fn post_params_travel_as_a_json_body() {
        let binding = HttpBinding::new("https://api.example.com", "/v1/orders", BindMethod::Post)
            .expect("binding");
        let prepared = prepare(&binding, &params(&[("symbol", json!("ETH"))]), None)
            .expect("prepare");
        assert_eq!(prepared.url, "https://api.example.com/v1/orders");
        assert!(prepared
            .headers
            .contains(&("content-type".to_owned(), "application/json".to_owned())));
        let body: Value =
            serde_json::from_slice(&prepared.body.expect("body")).expect("json body");
        assert_eq!(body, json!({"symbol": "ETH"}));
    }

    #[test]
    fn bearer_rule_sets_the_authorization_header() {
        let prepared = prepare(
            &get_binding(),
            &Map::new(),
            Some((&AuthRule::Bearer, "s3cret")),
        )
        .expect("prepare");
        assert!(prepared
            .headers
            .contains(&("authorization".to_owned(), "Bearer s3cret".to_owned())));
    }

    #[test]
    fn header_rule_lowercases_the_custom_name() {
        let rule = AuthRule::Header {
            name: "X-Api-Key".into(),
        };
        let prepared = prepare(&get_binding(), &Map::new(), Some((&rule, "s3cret")))
            .expect("prepare");
        assert!(prepared
            .headers
            .contains(&("x-api-key".to_owned(), "s3cret".to_owned())));
    }

    #[test]
    fn query_rule_appends_the_secret() {
        let prepared = prepare(
            &get_binding(),
            &params(&[("symbol", json!("ETH"))]),
            Some((
                &AuthRule::Query {
                    param: "apikey".into(),
                },
                "s3cret",
            )),
        )
        .expect("prepare");
        assert!(prepared.url.contains("apikey=s3cret"));
        assert!(prepared.url.contains("symbol=ETH"));
    }

    #[test]
    fn path_token_rule_substitutes_the_placeholder() {
        let binding =
            HttpBinding::new("https://api.example.com", "/v1/{api_key}/price", BindMethod::Get)
                .expect("binding");
        let prepared = prepare(&binding, &Map::new(), Some((&AuthRule::PathToken, "tok")))
            .expect("prepare");
        assert_eq!(prepared.url, "https://api.example.com/v1/tok/price");
    }

    #[test]
    fn path_token_without_placeholder_is_a_configuration_error() {
        let err = prepare(&get_binding(), &Map::new(), Some((&AuthRule::PathToken, "tok")))
            .expect_err("must fail");
        assert!(matches!(err, GatewayError::Configuration { .. }));
    }

    #[test]
    fn query_values_are_url_encoded() {
        let prepared = prepare(
            &get_binding(),
            &params(&[("q", json!("new york & co"))]),
            None,
        )
        .expect("prepare");
        assert!(prepared.url.contains("q=new%20york%20%26%20co"));
    }

    #[test]
    fn json_success_carries_the_parsed_payload() {
        let outcome = classify(200, Some("application/json"), br#"{"price": 42.5}"#)
            .expect("classified");
        assert!(outcome.success());
        assert_eq!(outcome.data(), Some(&json!({"price": 42.5})));
        assert_eq!(outcome.metadata().status(), Some(200));
        assert!(outcome.metadata().content_type().is_none());
    }

    #[test]
    fn non_json_success_keeps_raw_text_and_hint() {
        let outcome = classify(200, Some("text/csv"), b"a,b\n1,2").expect("classified");
        assert!(outcome.success());
        assert_eq!(outcome.data(), Some(&json!("a,b\n1,2")));
        assert_eq!(outcome.metadata().content_type(), Some("text/csv"));
    }

    #[test]
    fn error_status_is_typed_with_a_truncated_body() {
        let long_body = "x".repeat(2000);
        let err = classify(503, None, long_body.as_bytes()).expect_err("must fail");
        let GatewayError::Status { status, body } = err else {
            panic!("expected status error");
        };
        assert_eq!(status, 503);
        assert!(body.chars().count() <= ERROR_BODY_CHARS + 1);
        assert!(body.ends_with(TRUNCATION_MARKER));
    }
}
