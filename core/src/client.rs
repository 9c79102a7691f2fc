//! Synchronous client for the Mapbox HTTP API.
//!
//! # Design
//! `MapboxClient` performs one HTTP round trip per call: build the absolute
//! URL, merge the `access_token` query parameter, execute through the
//! injected transport, and classify the status. Responses in [200, 399]
//! come back with the body unread for the caller to decode and close;
//! anything else is drained internally and converted into an [`ApiError`].
//! The client never retries and never swallows a failure.

use std::fmt;
use std::io::Read;

use tracing::debug;
use ureq::http::{header, Method, Request};
use url::Url;

use crate::error::{ApiError, ClientError};
use crate::http::{default_agent, HttpResponse, HttpTransport};

/// Origin all endpoint paths are appended to unless overridden.
pub const MAPBOX_ENDPOINT: &str = "https://api.mapbox.com/";

const APPLICATION_JSON: &str = "application/json";

/// Synchronous Mapbox API client.
///
/// Holds no mutable state between calls; all methods take `&self` and the
/// transport is `Send + Sync`, so one client can serve many threads.
pub struct MapboxClient {
    base_url: String,
    access_token: Option<String>,
    transport: Box<dyn HttpTransport>,
}

impl MapboxClient {
    /// Client against the production origin with a fresh default transport.
    pub fn new(access_token: Option<&str>) -> Self {
        Self::with_base_url(MAPBOX_ENDPOINT, access_token)
    }

    /// Client with its access token resolved from `MAPBOX_ACCESS_TOKEN`.
    pub fn from_env() -> Self {
        Self::new(std::env::var("MAPBOX_ACCESS_TOKEN").ok().as_deref())
    }

    /// Client against an alternate origin, e.g. a local mock server.
    ///
    /// The base URL and endpoint paths are concatenated verbatim (no
    /// slashes are added or removed), so the base URL must end exactly
    /// where the endpoint paths expect it to.
    pub fn with_base_url(base_url: &str, access_token: Option<&str>) -> Self {
        Self::with_transport(base_url, access_token, Box::new(default_agent()))
    }

    /// Client with an injected transport. The transport must hand non-2xx
    /// statuses back as responses rather than errors; see
    /// [`HttpTransport`].
    pub fn with_transport(
        base_url: &str,
        access_token: Option<&str>,
        transport: Box<dyn HttpTransport>,
    ) -> Self {
        Self {
            base_url: base_url.to_string(),
            access_token: access_token.map(str::to_string),
            transport,
        }
    }

    pub fn get(&self, endpoint: &str) -> Result<HttpResponse, ClientError> {
        self.request(Method::GET, endpoint, None, Some(APPLICATION_JSON))
    }

    pub fn post(&self, endpoint: &str, body: &[u8]) -> Result<HttpResponse, ClientError> {
        self.request(Method::POST, endpoint, Some(body), Some(APPLICATION_JSON))
    }

    pub fn patch(&self, endpoint: &str, body: &[u8]) -> Result<HttpResponse, ClientError> {
        self.request(Method::PATCH, endpoint, Some(body), Some(APPLICATION_JSON))
    }

    pub fn put(&self, endpoint: &str, body: &[u8]) -> Result<HttpResponse, ClientError> {
        self.request(Method::PUT, endpoint, Some(body), Some(APPLICATION_JSON))
    }

    /// PUT with no body and therefore no content-type header.
    pub fn put_only(&self, endpoint: &str) -> Result<HttpResponse, ClientError> {
        self.request(Method::PUT, endpoint, None, Some(APPLICATION_JSON))
    }

    pub fn delete(&self, endpoint: &str) -> Result<HttpResponse, ClientError> {
        self.request(Method::DELETE, endpoint, None, Some(APPLICATION_JSON))
    }

    /// Generic dispatch behind the verb helpers.
    ///
    /// The content-type header is set only when a body is present and a
    /// content-type was given. A single attempt is made; transport
    /// failures and non-success statuses are returned, never retried.
    pub fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&[u8]>,
        content_type: Option<&str>,
    ) -> Result<HttpResponse, ClientError> {
        let url = self.build_url(endpoint)?;
        debug!(%method, %url, "dispatching request");

        let mut builder = Request::builder().method(method.clone()).uri(url.as_str());
        if body.is_some() {
            if let Some(content_type) = content_type {
                builder = builder.header(header::CONTENT_TYPE, content_type);
            }
        }
        let request = builder.body(body.map(<[u8]>::to_vec))?;

        let response = self
            .transport
            .execute(request)
            .map_err(ClientError::Transport)?;
        let Some(response) = response else {
            return Err(ClientError::NoResponse {
                method,
                url: url.to_string(),
            });
        };

        check_api_error(response, endpoint)
    }

    fn build_url(&self, endpoint: &str) -> Result<Url, ClientError> {
        // Joined verbatim; the caller supplies the slash between the two.
        let mut url = Url::parse(&format!("{}{}", self.base_url, endpoint))?;
        if let Some(token) = &self.access_token {
            url.query_pairs_mut().append_pair("access_token", token);
        }
        Ok(url)
    }
}

impl fmt::Debug for MapboxClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapboxClient")
            .field("base_url", &self.base_url)
            .field("access_token", &self.access_token.as_deref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

/// Statuses in [200, 399] pass through with the body untouched. Anything
/// else is drained (closing the connection) and converted into an
/// [`ApiError`] carrying the status and endpoint.
fn check_api_error(response: HttpResponse, endpoint: &str) -> Result<HttpResponse, ClientError> {
    let status = response.status().as_u16();
    if (200..400).contains(&status) {
        return Ok(response);
    }

    let mut body = Vec::new();
    response
        .into_body()
        .read_to_end(&mut body)
        .map_err(ClientError::ReadErrorBody)?;

    Err(ApiError::from_response(status, endpoint, &body).into())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::http::{BodyReader, TransportError};
    use ureq::http::Response;

    /// Copy of the last request a transport double was handed.
    #[derive(Debug, Clone)]
    struct Captured {
        method: String,
        url: String,
        content_type: Option<String>,
        body: Option<Vec<u8>>,
    }

    /// Transport double returning a canned status/body and recording the
    /// request it executed.
    #[derive(Clone)]
    struct CannedTransport {
        status: u16,
        body: &'static str,
        captured: Arc<Mutex<Option<Captured>>>,
    }

    impl CannedTransport {
        fn new(status: u16, body: &'static str) -> Self {
            Self {
                status,
                body,
                captured: Arc::new(Mutex::new(None)),
            }
        }

        fn captured(&self) -> Captured {
            self.captured.lock().unwrap().clone().expect("no request executed")
        }
    }

    impl HttpTransport for CannedTransport {
        fn execute(
            &self,
            request: Request<Option<Vec<u8>>>,
        ) -> Result<Option<HttpResponse>, TransportError> {
            let content_type = request
                .headers()
                .get(header::CONTENT_TYPE)
                .map(|v| v.to_str().unwrap().to_string());
            *self.captured.lock().unwrap() = Some(Captured {
                method: request.method().to_string(),
                url: request.uri().to_string(),
                content_type,
                body: request.body().clone(),
            });
            let reader: BodyReader = Box::new(std::io::Cursor::new(self.body.as_bytes().to_vec()));
            Ok(Some(Response::builder().status(self.status).body(reader).unwrap()))
        }
    }

    /// Transport double that fails the round trip.
    struct FailingTransport;

    impl HttpTransport for FailingTransport {
        fn execute(
            &self,
            _request: Request<Option<Vec<u8>>>,
        ) -> Result<Option<HttpResponse>, TransportError> {
            Err("connection refused".into())
        }
    }

    /// Malformed transport double: neither a response nor an error.
    struct SilentTransport;

    impl HttpTransport for SilentTransport {
        fn execute(
            &self,
            _request: Request<Option<Vec<u8>>>,
        ) -> Result<Option<HttpResponse>, TransportError> {
            Ok(None)
        }
    }

    fn client_with(transport: &CannedTransport) -> MapboxClient {
        MapboxClient::with_transport(MAPBOX_ENDPOINT, Some("tok"), Box::new(transport.clone()))
    }

    #[test]
    fn get_appends_access_token() {
        let transport = CannedTransport::new(200, "[]");
        let client = client_with(&transport);
        client.get("tokens/v2/testuser").unwrap();

        let captured = transport.captured();
        assert_eq!(captured.method, "GET");
        assert_eq!(
            captured.url,
            "https://api.mapbox.com/tokens/v2/testuser?access_token=tok"
        );
        assert!(captured.body.is_none());
    }

    #[test]
    fn access_token_merges_with_existing_query() {
        let transport = CannedTransport::new(200, "[]");
        let client = client_with(&transport);
        client.get("tokens/v2/testuser?limit=10").unwrap();

        assert_eq!(
            transport.captured().url,
            "https://api.mapbox.com/tokens/v2/testuser?limit=10&access_token=tok"
        );
    }

    #[test]
    fn no_token_sends_no_query_parameter() {
        let transport = CannedTransport::new(200, "[]");
        let client =
            MapboxClient::with_transport(MAPBOX_ENDPOINT, None, Box::new(transport.clone()));
        client.get("tokens/v2/testuser").unwrap();

        assert_eq!(transport.captured().url, "https://api.mapbox.com/tokens/v2/testuser");
    }

    #[test]
    fn post_sets_content_type_and_body() {
        let transport = CannedTransport::new(200, "{}");
        let client = client_with(&transport);
        client.post("tokens/v2/testuser", br#"{"note":"n"}"#).unwrap();

        let captured = transport.captured();
        assert_eq!(captured.method, "POST");
        assert_eq!(captured.content_type.as_deref(), Some("application/json"));
        assert_eq!(captured.body.as_deref(), Some(br#"{"note":"n"}"#.as_slice()));
    }

    #[test]
    fn put_only_sends_no_body_and_no_content_type() {
        let transport = CannedTransport::new(200, "{}");
        let client = client_with(&transport);
        client.put_only("tokens/v2/testuser/abc").unwrap();

        let captured = transport.captured();
        assert_eq!(captured.method, "PUT");
        assert!(captured.body.is_none());
        assert!(captured.content_type.is_none());
    }

    #[test]
    fn delete_sends_no_body() {
        let transport = CannedTransport::new(204, "");
        let client = client_with(&transport);
        client.delete("tokens/v2/testuser/abc").unwrap();

        let captured = transport.captured();
        assert_eq!(captured.method, "DELETE");
        assert!(captured.body.is_none());
    }

    #[test]
    fn success_body_is_left_for_the_caller() {
        let transport = CannedTransport::new(200, r#"[{"note":"n"}]"#);
        let client = client_with(&transport);

        let response = client.get("tokens/v2/testuser").unwrap();
        assert_eq!(response.status(), 200);
        let mut body = String::new();
        response.into_body().read_to_string(&mut body).unwrap();
        assert_eq!(body, r#"[{"note":"n"}]"#);
    }

    #[test]
    fn redirect_statuses_are_success() {
        let transport = CannedTransport::new(399, "");
        let client = client_with(&transport);
        assert!(client.get("tokens/v2/testuser").is_ok());
    }

    #[test]
    fn informational_status_is_an_api_error() {
        let transport = CannedTransport::new(199, "");
        let client = client_with(&transport);
        let err = client.get("tokens/v2/testuser").err().unwrap();
        assert!(matches!(err, ClientError::Api(_)));
    }

    #[test]
    fn api_error_carries_status_and_endpoint() {
        let transport = CannedTransport::new(404, "");
        let client = client_with(&transport);

        let err = client.get("tokens/v2/testuser/abc").err().unwrap();
        match err {
            ClientError::Api(api) => {
                assert_eq!(api.status_code, 404);
                assert_eq!(api.endpoint, "tokens/v2/testuser/abc");
            }
            other => panic!("expected API error, got {other}"),
        }
    }

    #[test]
    fn error_envelope_is_decoded() {
        let transport =
            CannedTransport::new(422, r#"{"error":{"message":"bad scope"},"type":"invalid_request"}"#);
        let client = client_with(&transport);

        let err = client.post("tokens/v2/testuser", b"{}").err().unwrap();
        match err {
            ClientError::Api(api) => {
                assert_eq!(api.message, "bad scope");
                assert_eq!(api.error_type.as_deref(), Some("invalid_request"));
            }
            other => panic!("expected API error, got {other}"),
        }
    }

    #[test]
    fn non_json_error_body_is_kept_verbatim() {
        let transport = CannedTransport::new(500, "oops");
        let client = client_with(&transport);

        let err = client.get("tokens/v2/testuser").err().unwrap();
        match err {
            ClientError::Api(api) => assert_eq!(api.message, "oops"),
            other => panic!("expected API error, got {other}"),
        }
    }

    #[test]
    fn transport_failure_is_not_an_api_error() {
        let client =
            MapboxClient::with_transport(MAPBOX_ENDPOINT, Some("tok"), Box::new(FailingTransport));

        let err = client.get("tokens/v2/testuser").err().unwrap();
        assert!(matches!(err, ClientError::Transport(_)));
        assert!(err.to_string().starts_with("execute request"));
    }

    #[test]
    fn missing_response_hits_the_guard() {
        let client =
            MapboxClient::with_transport(MAPBOX_ENDPOINT, Some("tok"), Box::new(SilentTransport));

        let err = client.put_only("tokens/v2/testuser/abc").err().unwrap();
        match err {
            ClientError::NoResponse { ref method, ref url } => {
                assert_eq!(method, &Method::PUT);
                assert!(url.contains("tokens/v2/testuser/abc"), "{url}");
            }
            other => panic!("expected no-response error, got {other}"),
        }
    }

    #[test]
    fn slash_mismatch_is_preserved() {
        // The base URL and endpoint are joined verbatim; a doubled slash is
        // the caller's to fix, not ours to hide.
        let transport = CannedTransport::new(200, "");
        let client =
            MapboxClient::with_transport("https://api.mapbox.com/", None, Box::new(transport.clone()));
        client.get("/tokens/v2/testuser").unwrap();

        assert_eq!(
            transport.captured().url,
            "https://api.mapbox.com//tokens/v2/testuser"
        );
    }

    #[test]
    fn debug_redacts_the_access_token() {
        let client = MapboxClient::new(Some("sk.secret"));
        let rendered = format!("{client:?}");
        assert!(!rendered.contains("sk.secret"));
    }
}
