//! # Request handling
//!
//! One call per request: decode, run the handler, validate, encode, send.
//!
//! ## Invariants
//! - Exactly one buffer is handed to the transport per `handle` call, unless
//!   even the fallback response cannot be encoded.
//! - A request that fails to decode gets a `400`; a handler response that fails
//!   validation gets a `500` with an empty body.

use fdpack::Limits;
use fdpack::Message;
use fdpack::ResponseMessage;
use fdpack::ValidationError;
use tracing::debug;
use tracing::warn;

use crate::config::Config;
use crate::request::Request;
use crate::response::ResponseWriter;
use crate::transport;
use crate::transport::Transport;

#[derive(Debug)]
pub enum Error {
    /// Even the fallback response failed validation (limits set too low).
    Validation(ValidationError),
    Transport(transport::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(e) => write!(f, "Validation error: {}", e),
            Self::Transport(e) => write!(f, "Transport error: {}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<transport::Error> for Error {
    fn from(e: transport::Error) -> Self {
        Self::Transport(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// User code that serves one request.
pub trait Handler {
    fn serve(&self, req: &Request, resp: &mut ResponseWriter);
}

impl<F> Handler for F
where
    F: Fn(&Request, &mut ResponseWriter),
{
    fn serve(&self, req: &Request, resp: &mut ResponseWriter) {
        self(req, resp)
    }
}

/// What was sent for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sent {
    pub status: i32,
    pub bytes: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Sdk {
    config: Config,
}

impl Sdk {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Serves the request encoded in `input` and sends the response.
    pub fn handle<H, T>(&self, input: &[u8], handler: &H, transport: &mut T) -> Result<Sent>
    where
        H: Handler + ?Sized,
        T: Transport + ?Sized,
    {
        let req = match Request::decode(input) {
            Ok(req) => req,
            Err(e) => {
                warn!(error = %e, len = input.len(), "failed to decode request");
                return self.send(ResponseMessage::new(400), transport);
            }
        };
        debug!(method = req.method(), uri = req.uri(), "handling request");

        let mut writer = ResponseWriter::new(self.config.default_status);
        handler.serve(&req, &mut writer);
        let resp = writer.into_message();

        match resp.validate(&self.config.limits) {
            Ok(valid) => self.send_validated(valid, transport),
            Err(e) => {
                warn!(error = %e, "handler response rejected");
                self.send(ResponseMessage::new(500), transport)
            }
        }
    }

    fn send<T: Transport + ?Sized>(&self, msg: ResponseMessage, transport: &mut T) -> Result<Sent> {
        let valid = msg.validate(&self.config.limits)?;
        self.send_validated(valid, transport)
    }

    fn send_validated<T: Transport + ?Sized>(
        &self,
        msg: fdpack::Validated<ResponseMessage>,
        transport: &mut T,
    ) -> Result<Sent> {
        let buf = fdpack::encode(&msg);
        if let Err(e) = transport.send(&buf) {
            warn!(error = %e, len = buf.len(), "failed to send response");
            return Err(e.into());
        }
        debug!(status = msg.status_code, len = buf.len(), "response sent");
        Ok(Sent { status: msg.status_code, bytes: buf.len() })
    }
}

/// Encodes `resp` and sends it, with no request in the loop.
///
/// For guests that build a response directly instead of serving a request.
pub fn respond<T: Transport + ?Sized>(resp: ResponseMessage, limits: &Limits, transport: &mut T) -> Result<Sent> {
    let valid = resp.validate(limits)?;
    Sdk::new(Config::default().with_limits(*limits)).send_validated(valid, transport)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_handlers() {
        let h = |_: &Request, w: &mut ResponseWriter| w.write_header(204);
        let req = Request::from(fdpack::RequestMessage::new("GET", "/"));
        let mut w = ResponseWriter::new(200);
        h.serve(&req, &mut w);
        assert_eq!(w.status(), 204);
    }

    #[test]
    fn error_display() {
        let e = Error::Transport(transport::Error::Closed);
        assert_eq!(e.to_string(), "Transport error: Transport closed");
    }
}
