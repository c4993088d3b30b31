#![forbid(unsafe_code)]

use crate::api::{ApiError, RegistryApi};
use crate::metrics;
use serde::Serialize;
use std::io::Read as _;
use tiny_http::{Header, Response, Server};
use tracing::{info, warn};

#[derive(Debug, Serialize)]
struct HealthResponse<'a> {
    status: &'a str,
}

pub fn serve(bind: &str, metrics_enabled: bool, api: RegistryApi) -> Result<(), String> {
    let server =
        Server::http(bind).map_err(|e| format!("failed to bind http server on {bind}: {e}"))?;
    info!(bind, "score-node http server started");

    for mut req in server.incoming_requests() {
        let url = req.url().to_string();
        let method = req.method().as_str().to_string();
        let (path, _query) = url.split_once('?').unwrap_or((&url, ""));
        let segments: Vec<String> = path
            .trim_matches('/')
            .split('/')
            .map(url_decode)
            .collect();
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

        let resp = match (method.as_str(), segments.as_slice()) {
            ("GET", ["healthz"]) => {
                let body = serde_json::to_string(&HealthResponse { status: "ok" })
                    .unwrap_or_else(|_| "{\"status\":\"ok\"}".to_string());
                let h = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap();
                Response::from_string(body)
                    .with_status_code(200)
                    .with_header(h)
            }
            ("GET", ["metrics"]) if metrics_enabled => {
                let body = metrics::gather_text();
                let h = Header::from_bytes(&b"Content-Type"[..], &b"text/plain; version=0.0.4"[..])
                    .unwrap();
                Response::from_string(body)
                    .with_status_code(200)
                    .with_header(h)
            }
            ("GET", ["metrics"]) => {
                Response::from_string("metrics disabled\n").with_status_code(404)
            }
            ("POST", ["badges"]) => {
                let mut body = Vec::new();
                if let Err(e) = req.as_reader().read_to_end(&mut body) {
                    return Err(format!("failed reading request body: {e}"));
                }
                match api.create_badge(&body) {
                    Ok(out) => json_response(200, &out),
                    Err(e) => api_error_response(e),
                }
            }
            ("GET", ["badges", badge_id]) => match api.get_badge(badge_id) {
                Ok(badge) => json_response(
                    200,
                    &serde_json::json!({"schema_version": 1, "badge": badge}),
                ),
                Err(e) => api_error_response(e),
            },
            ("POST", ["grants"]) => {
                let mut body = Vec::new();
                if let Err(e) = req.as_reader().read_to_end(&mut body) {
                    return Err(format!("failed reading request body: {e}"));
                }
                match api.register_grant(&body) {
                    Ok(out) => json_response(200, &out),
                    Err(e) => api_error_response(e),
                }
            }
            ("GET", ["grants", subject_id]) => match api.get_grant(subject_id) {
                Ok(grant) => json_response(
                    200,
                    &serde_json::json!({"schema_version": 1, "grant": grant}),
                ),
                Err(e) => api_error_response(e),
            },
            ("PUT", ["grants", subject_id]) => {
                let mut body = Vec::new();
                if let Err(e) = req.as_reader().read_to_end(&mut body) {
                    return Err(format!("failed reading request body: {e}"));
                }
                match api.update_grant(subject_id, &body) {
                    Ok(()) => json_response(200, &serde_json::json!({"schema_version": 1})),
                    Err(e) => api_error_response(e),
                }
            }
            ("DELETE", ["grants", subject_id]) => {
                let mut body = Vec::new();
                if let Err(e) = req.as_reader().read_to_end(&mut body) {
                    return Err(format!("failed reading request body: {e}"));
                }
                match api.remove_grant(subject_id, &body) {
                    Ok(()) => json_response(200, &serde_json::json!({"schema_version": 1})),
                    Err(e) => api_error_response(e),
                }
            }
            ("POST", ["grants", subject_id, "manager"]) => {
                let mut body = Vec::new();
                if let Err(e) = req.as_reader().read_to_end(&mut body) {
                    return Err(format!("failed reading request body: {e}"));
                }
                match api.transfer_grant_manager(subject_id, &body) {
                    Ok(()) => json_response(200, &serde_json::json!({"schema_version": 1})),
                    Err(e) => api_error_response(e),
                }
            }
            ("POST", ["scorers"]) => {
                let mut body = Vec::new();
                if let Err(e) = req.as_reader().read_to_end(&mut body) {
                    return Err(format!("failed reading request body: {e}"));
                }
                match api.register_scorer(&body) {
                    Ok(out) => json_response(200, &out),
                    Err(e) => api_error_response(e),
                }
            }
            ("POST", ["scorers", scorer_id, "badges"]) => {
                let mut body = Vec::new();
                if let Err(e) = req.as_reader().read_to_end(&mut body) {
                    return Err(format!("failed reading request body: {e}"));
                }
                match api.add_scorer_badge(scorer_id, &body) {
                    Ok(()) => json_response(200, &serde_json::json!({"schema_version": 1})),
                    Err(e) => api_error_response(e),
                }
            }
            ("DELETE", ["scorers", scorer_id, "badges", badge_id]) => {
                let mut body = Vec::new();
                if let Err(e) = req.as_reader().read_to_end(&mut body) {
                    return Err(format!("failed reading request body: {e}"));
                }
                match api.remove_scorer_badge(scorer_id, badge_id, &body) {
                    Ok(()) => json_response(200, &serde_json::json!({"schema_version": 1})),
                    Err(e) => api_error_response(e),
                }
            }
            ("POST", ["scorers", scorer_id, "accounts", account, "badges"]) => {
                let mut body = Vec::new();
                if let Err(e) = req.as_reader().read_to_end(&mut body) {
                    return Err(format!("failed reading request body: {e}"));
                }
                match api.grant_account_badge(scorer_id, account, &body) {
                    Ok(()) => json_response(200, &serde_json::json!({"schema_version": 1})),
                    Err(e) => api_error_response(e),
                }
            }
            ("DELETE", ["scorers", scorer_id, "accounts", account, "badges"]) => {
                let mut body = Vec::new();
                if let Err(e) = req.as_reader().read_to_end(&mut body) {
                    return Err(format!("failed reading request body: {e}"));
                }
                match api.revoke_account_badge(scorer_id, account, &body) {
                    Ok(()) => json_response(200, &serde_json::json!({"schema_version": 1})),
                    Err(e) => api_error_response(e),
                }
            }
            ("GET", ["scorers", scorer_id, "accounts", account, "score"]) => {
                match api.legacy_score(scorer_id, account) {
                    Ok(score) => json_response(
                        200,
                        &serde_json::json!({"schema_version": 1, "score": score}),
                    ),
                    Err(e) => api_error_response(e),
                }
            }
            ("POST", ["reviews"]) => {
                let mut body = Vec::new();
                if let Err(e) = req.as_reader().read_to_end(&mut body) {
                    return Err(format!("failed reading request body: {e}"));
                }
                match api.submit_review(&body) {
                    Ok(out) => json_response(200, &out),
                    Err(e) => api_error_response(e),
                }
            }
            ("GET", ["subjects", subject_id, "stories"]) => match api.get_stories(subject_id) {
                Ok(stories) => json_response(
                    200,
                    &serde_json::json!({"schema_version": 1, "subject_id": subject_id, "stories": stories}),
                ),
                Err(e) => api_error_response(e),
            },
            ("GET", ["programs", program_key, "score"]) => match api.program_score(program_key) {
                Ok(out) => json_response(200, &out),
                Err(e) => api_error_response(e),
            },
            ("POST", ["score-of"]) => {
                let mut body = Vec::new();
                if let Err(e) = req.as_reader().read_to_end(&mut body) {
                    return Err(format!("failed reading request body: {e}"));
                }
                match api.score_of(&body) {
                    Ok(out) => json_response(200, &out),
                    Err(e) => api_error_response(e),
                }
            }
            _ => Response::from_string("not found\n").with_status_code(404),
        };

        if let Err(e) = req.respond(resp) {
            warn!(error = %e, "failed writing http response");
        }
    }
    Ok(())
}

fn json_response<T: Serialize>(code: u16, v: &T) -> Response<std::io::Cursor<Vec<u8>>> {
    let body = serde_json::to_vec(v).unwrap_or_else(|_| b"{\"error\":\"encode\"}".to_vec());
    let h = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap();
    Response::from_data(body)
        .with_status_code(code)
        .with_header(h)
}

fn api_error_response(e: ApiError) -> Response<std::io::Cursor<Vec<u8>>> {
    let code = e.status();
    json_response(
        code,
        &serde_json::json!({"schema_version": 1, "error": e.to_string()}),
    )
}

fn url_decode(s: &str) -> String {
    // Minimal path/query decoding: replace '+' with space and decode %XX.
    // Decoded bytes are collected first so percent-encoded multi-byte UTF-8
    // sequences come back out as the characters that went in.
    let s = s.replace('+', " ");
    let mut out = Vec::with_capacity(s.len());
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hi = bytes[i + 1];
            let lo = bytes[i + 2];
            if let (Some(hi), Some(lo)) = (from_hex(hi), from_hex(lo)) {
                out.push(hi * 16 + lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn from_hex(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::url_decode;

    #[test]
    fn decodes_plain_and_percent_escapes() {
        assert_eq!(url_decode("prog-a"), "prog-a");
        assert_eq!(url_decode("grant+phase%201"), "grant phase 1");
        // Malformed escapes pass through untouched.
        assert_eq!(url_decode("50%"), "50%");
        assert_eq!(url_decode("%zz"), "%zz");
    }

    #[test]
    fn decodes_percent_encoded_utf8_program_keys() {
        assert_eq!(url_decode("caf%C3%A9"), "café");
        assert_eq!(url_decode("%E7%A8%8B%E5%BA%8F"), "程序");
    }
}
