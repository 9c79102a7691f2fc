//! Transport seam between the client and the HTTP stack.
//!
//! # Design
//! [`HttpTransport`] names the one capability the client needs: execute a
//! prepared request and hand back the response with its body unconsumed.
//! `ureq::Agent` is the production implementation; tests substitute canned
//! doubles. The success position is an `Option` because an implementation
//! has the latitude to produce neither a response nor an error; the client
//! guards against that case rather than trusting every implementation.
//!
//! Request bodies are `Option<Vec<u8>>` so "no body" and "empty body" stay
//! distinguishable on the wire.

use std::io::Read;

use ureq::http::{Request, Response};
use ureq::Agent;

/// Error produced by a transport implementation.
pub type TransportError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Streaming handle over a response body. Reading it to completion or
/// dropping it releases the underlying connection.
pub type BodyReader = Box<dyn Read + Send + 'static>;

/// A response whose body has not been consumed yet.
pub type HttpResponse = Response<BodyReader>;

/// Executes one prepared HTTP request.
///
/// Implementations must return non-2xx statuses as responses, not errors
/// (for `ureq`, configure `http_status_as_error(false)`); status
/// classification belongs to the client.
pub trait HttpTransport: Send + Sync {
    fn execute(
        &self,
        request: Request<Option<Vec<u8>>>,
    ) -> Result<Option<HttpResponse>, TransportError>;
}

impl HttpTransport for Agent {
    fn execute(
        &self,
        request: Request<Option<Vec<u8>>>,
    ) -> Result<Option<HttpResponse>, TransportError> {
        let (parts, body) = request.into_parts();
        let response = match body {
            Some(bytes) => self.run(Request::from_parts(parts, bytes))?,
            None => self.run(Request::from_parts(parts, ()))?,
        };
        let (parts, body) = response.into_parts();
        let reader: BodyReader = Box::new(body.into_reader());
        Ok(Some(Response::from_parts(parts, reader)))
    }
}

/// Fresh agent with the configuration the client relies on: non-2xx
/// statuses come back as data, and no idle connections are kept between
/// calls (close-after-response semantics).
pub fn default_agent() -> Agent {
    Agent::config_builder()
        .http_status_as_error(false)
        .max_idle_connections(0)
        .build()
        .new_agent()
}
