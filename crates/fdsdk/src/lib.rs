//! # fdsdk
//!
//! Guest-side SDK: read a request from the host, serve it, hand the encoded
//! response back through a [`Transport`].
//!
//! ```no_run
//! use fdsdk::{Request, ResponseWriter};
//!
//! fn main() -> anyhow::Result<()> {
//!     fdsdk::init_tracing();
//!     fdsdk::serve_stdio(&|req: &Request, w: &mut ResponseWriter| {
//!         w.header_mut().set("content-type", "text/plain");
//!         w.write_str(&format!("you asked for {}", req.path()));
//!     })
//! }
//! ```

pub mod config;
pub mod request;
pub mod response;
pub mod sdk;
pub mod transport;

use std::io::Read;

use anyhow::Context;

pub use config::Config;
pub use request::Request;
pub use response::ResponseWriter;
pub use sdk::Handler;
pub use sdk::Sdk;
pub use sdk::Sent;
pub use sdk::respond;
pub use transport::FnTransport;
pub use transport::MemoryTransport;
pub use transport::StdoutTransport;
pub use transport::Transport;
pub use transport::WriterTransport;

pub use fdpack;

/// Installs a `tracing` subscriber writing to stderr, filtered by `RUST_LOG`.
///
/// Stdout is the response channel, so logs must never go there. Calling this
/// more than once is harmless.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Reads the request from stdin, serves it with `handler`, writes the
/// response to stdout. Configuration comes from the environment.
pub fn serve_stdio<H: Handler + ?Sized>(handler: &H) -> anyhow::Result<()> {
    let mut input = Vec::new();
    std::io::stdin()
        .read_to_end(&mut input)
        .context("failed to read request from stdin")?;

    let sdk = Sdk::new(Config::from_env());
    sdk.handle(&input, handler, &mut StdoutTransport::stdout())
        .context("failed to deliver response")?;
    Ok(())
}
