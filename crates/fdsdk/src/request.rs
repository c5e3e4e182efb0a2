//! The inbound request, as the handler sees it.

use fdpack::HeaderMap;
use fdpack::Message;
use fdpack::RequestMessage;

/// A decoded request from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    inner: RequestMessage,
}

impl Request {
    /// Decodes the host's request buffer.
    pub fn decode(buf: &[u8]) -> fdpack::Result<Self> {
        Ok(Self { inner: RequestMessage::decode(buf)? })
    }

    pub fn method(&self) -> &str {
        &self.inner.method
    }

    /// The raw request target, e.g. `/user/3?verbose=1`.
    pub fn uri(&self) -> &str {
        &self.inner.request_uri
    }

    /// `uri` up to the first `?`.
    pub fn path(&self) -> &str {
        match self.inner.request_uri.split_once('?') {
            Some((path, _)) => path,
            None => &self.inner.request_uri,
        }
    }

    /// `uri` after the first `?`, if present.
    pub fn query(&self) -> Option<&str> {
        self.inner.request_uri.split_once('?').map(|(_, q)| q)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.inner.header
    }

    /// First value of header `name`. Names match exactly as sent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.header.get_first(name)
    }

    pub fn body(&self) -> &[u8] {
        &self.inner.body
    }

    pub fn content_length(&self) -> i64 {
        self.inner.content_length
    }

    pub fn transfer_encoding(&self) -> &[String] {
        self.inner
            .transfer_encoding
            .as_ref()
            .map(|te| te.fields.as_slice())
            .unwrap_or(&[])
    }

    pub fn host(&self) -> &str {
        &self.inner.host
    }

    pub fn remote_addr(&self) -> &str {
        &self.inner.remote_addr
    }

    /// The route pattern the host matched, if it reports one.
    pub fn pattern(&self) -> &str {
        &self.inner.pattern
    }

    pub fn into_message(self) -> RequestMessage {
        self.inner
    }
}

impl From<RequestMessage> for Request {
    fn from(inner: RequestMessage) -> Self {
        Self { inner }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_and_query_split() {
        let req = Request::from(RequestMessage::new("GET", "/user/3?verbose=1&x=2"));
        assert_eq!(req.path(), "/user/3");
        assert_eq!(req.query(), Some("verbose=1&x=2"));

        let req = Request::from(RequestMessage::new("GET", "/user"));
        assert_eq!(req.path(), "/user");
        assert_eq!(req.query(), None);
    }

    #[test]
    fn missing_transfer_encoding_is_empty() {
        let req = Request::from(RequestMessage::new("GET", "/"));
        assert!(req.transfer_encoding().is_empty());
    }
}
