//! HTTP gateways onto the Google Slides and Drive REST APIs.
//!
//! Both gateways authenticate with an OAuth bearer token supplied through
//! configuration and hold only transport settings, so one instance of each
//! is shared by every generation request.

mod client;
pub mod drive;
pub mod slides;

#[cfg(test)]
mod fake;

pub use drive::GoogleDriveGateway;
pub use slides::GoogleSlidesGateway;
