//! The response a handler fills in.

use fdpack::HeaderMap;
use fdpack::ResponseMessage;

/// Accumulates status, headers and body while a handler runs.
///
/// Nothing is sent until the handler returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseWriter {
    status: i32,
    header: HeaderMap,
    body: Vec<u8>,
}

impl ResponseWriter {
    pub fn new(default_status: i32) -> Self {
        Self { status: default_status, header: HeaderMap::new(), body: Vec::new() }
    }

    pub fn header(&self) -> &HeaderMap {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut HeaderMap {
        &mut self.header
    }

    /// Sets the status. The last call wins.
    pub fn write_header(&mut self, status: i32) {
        self.status = status;
    }

    /// Appends to the body.
    pub fn write(&mut self, bytes: &[u8]) -> usize {
        self.body.extend_from_slice(bytes);
        bytes.len()
    }

    pub fn write_str(&mut self, s: &str) -> usize {
        self.write(s.as_bytes())
    }

    pub fn status(&self) -> i32 {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Converts into a wire message, setting `length` to the body size.
    ///
    /// A body too large for `i32` gets `i32::MAX`; validation rejects it anyway.
    pub fn into_message(self) -> ResponseMessage {
        let length = i32::try_from(self.body.len()).unwrap_or(i32::MAX);
        ResponseMessage { body: self.body, status_code: self.status, length, header: self.header }
    }
}

impl std::io::Write for ResponseWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        Ok(ResponseWriter::write(self, buf))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn length_follows_body() {
        let mut w = ResponseWriter::new(200);
        w.write_str("hello ");
        w.write(b"world");
        let msg = w.into_message();
        assert_eq!(msg.body, b"hello world");
        assert_eq!(msg.length, 11);
        assert_eq!(msg.status_code, 200);
    }

    #[test]
    fn last_write_header_wins() {
        let mut w = ResponseWriter::new(200);
        w.write_header(404);
        w.write_header(201);
        assert_eq!(w.status(), 201);
    }

    #[test]
    fn io_write_appends() -> std::io::Result<()> {
        let mut w = ResponseWriter::new(200);
        write!(w, "{}-{}", 1, 2)?;
        assert_eq!(w.body(), b"1-2");
        Ok(())
    }

    #[test]
    fn headers_are_kept() {
        let mut w = ResponseWriter::new(200);
        w.header_mut().append("set-cookie", "a=1");
        w.header_mut().append("set-cookie", "b=2");
        w.header_mut().set("content-type", "text/plain");
        let msg = w.into_message();
        assert_eq!(msg.header.get("set-cookie").unwrap().fields, ["a=1", "b=2"]);
        assert_eq!(msg.header.get_first("content-type"), Some("text/plain"));
    }
}
