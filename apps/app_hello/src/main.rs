//! A guest that answers `/` and `/user/:id` with small JSON documents.
//!
//! The host pipes the encoded request to stdin and reads the response from
//! stdout.

use fdsdk::Request;
use fdsdk::ResponseWriter;
use serde_json::json;

fn serve(req: &Request, w: &mut ResponseWriter) {
    w.header_mut().set("content-type", "application/json");

    let body = match req.path().trim_end_matches('/').split('/').collect::<Vec<_>>().as_slice() {
        [""] => json!({ "message": "hello from fdsdk" }),
        ["", "user", id] if !id.is_empty() => json!({ "id": id, "method": req.method() }),
        _ => {
            w.write_header(404);
            json!({ "error": format!("no route for {}", req.path()) })
        }
    };
    w.write_str(&body.to_string());
}

fn main() -> anyhow::Result<()> {
    fdsdk::init_tracing();
    fdsdk::serve_stdio(&serve)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fdsdk::fdpack::RequestMessage;
    use serde_json::Value;

    fn call(method: &str, uri: &str) -> anyhow::Result<(i32, Value)> {
        let mut w = ResponseWriter::new(200);
        serve(&Request::from(RequestMessage::new(method, uri)), &mut w);
        Ok((w.status(), serde_json::from_slice(w.body())?))
    }

    #[test]
    fn root_greets() -> anyhow::Result<()> {
        let (status, body) = call("GET", "/")?;
        assert_eq!(status, 200);
        assert_eq!(body["message"], "hello from fdsdk");
        Ok(())
    }

    #[test]
    fn user_route_echoes_id() -> anyhow::Result<()> {
        let (status, body) = call("POST", "/user/42?x=1")?;
        assert_eq!(status, 200);
        assert_eq!(body, json!({ "id": "42", "method": "POST" }));
        Ok(())
    }

    #[test]
    fn control_characters_stay_valid_json() -> anyhow::Result<()> {
        let mut w = ResponseWriter::new(200);
        serve(&Request::from(RequestMessage::new("GET", "/a\nb\t\"c")), &mut w);
        assert_eq!(w.status(), 404);
        assert!(!w.body().contains(&b'\n'));

        let body: Value = serde_json::from_slice(w.body())?;
        assert_eq!(body["error"], "no route for /a\nb\t\"c");
        Ok(())
    }
}
