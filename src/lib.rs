//! Core of a GitHub REST API client and webhook receiver.
//!
//! On the outbound side, [Client] builds authenticated requests, enforces and records rate limits
//! per category, maps error responses to typed [Error] values and resolves the polymorphic
//! responses of the contents and download endpoints. On the inbound side, [webhook] verifies
//! signed deliveries and [events] decodes them into typed payloads.

pub mod actions;
pub mod client;
#[doc(hidden)]
mod config;
pub mod contents;
#[doc(hidden)]
mod context;
#[doc(hidden)]
mod error;
pub mod events;
pub mod git;
pub mod models;
pub mod query;
pub mod rate_limit;
#[doc(hidden)]
mod redirect;
pub mod repos;
#[doc(hidden)]
mod response;
pub mod stringify;
pub mod webhook;

pub use client::Client;
pub use config::Config;
pub use context::RequestContext;
pub use error::{Error, ErrorKind};
pub use response::{ErrorBlock, ErrorBody, ErrorDetail, ErrorResponse, Response, ResponseBody};
