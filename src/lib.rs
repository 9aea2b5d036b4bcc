// Library root
// -----------
// This crate exposes the SeeSaw gateway client used by the `seesaw` binary.
//
// Module responsibilities:
// - `session`: bearer-token session with login exchange and one-shot re-login.
// - `store`: the single-slot token cache the session reads and writes.
// - `transport`: blocking HTTP seam (reqwest in production, scripted in tests).
// - `api`: one method per gateway endpoint, plus the presigned upload flow.
// - `params`: per-call parameter structs and their wire defaults.
// - `cli`: clap subcommands mapped 1:1 onto `api` methods.
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod params;
pub mod session;
pub mod store;
pub mod transport;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use api::ApiClient;
pub use error::{ClientError, Result};
