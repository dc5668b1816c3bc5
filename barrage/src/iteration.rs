//! Responses and the checks evaluated against them.
use barrage_core::CheckResult;
use serde_json::Value;
use std::fmt;
use std::sync::OnceLock;

/// A scenario's view of the response it received.
///
/// The body is kept as raw bytes; JSON parsing happens on first access and is cached for the rest
/// of the iteration.
#[derive(Clone)]
pub struct Response {
    status: u16,
    body: Vec<u8>,
    json: OnceLock<Option<Value>>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
            json: OnceLock::new(),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Parsed JSON body, or `None` if the body is not valid JSON.
    pub fn json(&self) -> Option<&Value> {
        self.json
            .get_or_init(|| serde_json::from_slice(&self.body).ok())
            .as_ref()
    }

    /// Look up a dotted path such as `data.discountAmount` or `items.0.id` in the JSON body.
    ///
    /// Returns `None` if the body is not JSON, any segment is missing, or the value is `null`.
    pub fn json_path(&self, path: &str) -> Option<&Value> {
        let mut value = self.json()?;
        for segment in path.split('.').filter(|s| !s.is_empty()) {
            value = match value {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }

        if value.is_null() {
            None
        } else {
            Some(value)
        }
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("body_len", &self.body.len())
            .finish()
    }
}

/// The result of one scenario invocation: the response and the checks run against it.
///
/// ```
/// # use barrage::{Iteration, Response};
/// let response = Response::new(200, r#"{"data":{"discountAmount":20000}}"#);
/// let iteration = Iteration::new(response)
///     .check("status is 200", |r| r.status() == 200)
///     .check("discount amount exists", |r| r.json_path("data.discountAmount").is_some());
///
/// assert!(iteration.checks().iter().all(|c| c.passed));
/// ```
#[derive(Clone, Debug)]
pub struct Iteration {
    response: Response,
    checks: Vec<CheckResult>,
}

impl Iteration {
    pub fn new(response: Response) -> Self {
        Self {
            response,
            checks: vec![],
        }
    }

    /// Evaluate `predicate` against the response now and record the outcome under `name`.
    pub fn check<P>(mut self, name: impl Into<String>, predicate: P) -> Self
    where
        P: FnOnce(&Response) -> bool,
    {
        let passed = predicate(&self.response);
        self.checks.push(CheckResult::new(name, passed));
        self
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn checks(&self) -> &[CheckResult] {
        &self.checks
    }

    pub fn into_parts(self) -> (Response, Vec<CheckResult>) {
        (self.response, self.checks)
    }
}

impl From<Response> for Iteration {
    fn from(response: Response) -> Self {
        Iteration::new(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const APPLY_BODY: &str = r#"{
        "message": "Coupon applied",
        "success": true,
        "data": { "discountAmount": 20000, "coupon": { "code": "COUP838" }, "tags": ["a", "b"] }
    }"#;

    #[test]
    fn json_path_lookups() {
        let res = Response::new(200, APPLY_BODY);
        assert_eq!(
            res.json_path("data.discountAmount").and_then(Value::as_u64),
            Some(20000)
        );
        assert_eq!(
            res.json_path("data.coupon.code").and_then(Value::as_str),
            Some("COUP838")
        );
        assert_eq!(
            res.json_path("data.tags.1").and_then(Value::as_str),
            Some("b")
        );
        assert!(res.json_path("data.missing").is_none());
        assert!(res.json_path("data.tags.9").is_none());
        assert!(res.json_path("message.nested").is_none());
    }

    #[test]
    fn null_counts_as_missing() {
        let res = Response::new(404, r#"{"message":"not found","success":false,"data":null}"#);
        assert!(res.json_path("data").is_none());
        assert!(res.json_path("message").is_some());
    }

    #[test]
    fn non_json_body() {
        let res = Response::new(502, "Bad Gateway");
        assert!(res.json().is_none());
        assert!(res.json_path("data").is_none());
        assert_eq!(res.text(), "Bad Gateway");
    }

    #[test]
    fn checks_keep_order_and_outcome() {
        let iteration = Iteration::new(Response::new(500, "{}"))
            .check("status is 200", |r| r.status() == 200)
            .check("is json", |r| r.json().is_some());

        let (response, checks) = iteration.into_parts();
        assert_eq!(response.status(), 500);
        assert_eq!(
            checks,
            vec![
                CheckResult::new("status is 200", false),
                CheckResult::new("is json", true),
            ]
        );
    }
}
