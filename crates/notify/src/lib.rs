//! Chat notification channels for alert delivery.
//!
//! This crate delivers alert groups to messaging platforms. Unlike a
//! fire-and-forget notifier, every delivery reports back: each alert is
//! posted individually and failures are gathered into a single
//! [`DeliveryError`] so callers can account for the whole group.
//!
//! # Usage
//!
//! ```no_run
//! use notify::{AlertMessage, NotifyChannel, SlackChannel};
//!
//! # async fn run() -> Result<(), notify::DeliveryError> {
//! let channel = SlackChannel::from_env();
//!
//! channel
//!     .deliver(&[AlertMessage {
//!         status: "firing".to_string(),
//!         priority: "P1".to_string(),
//!         pod: "api-7d9f".to_string(),
//!         namespace: "shop".to_string(),
//!         description: "Back-off pulling image".to_string(),
//!         enriched_data: String::new(),
//!     }])
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! - `SLACK_WEBHOOK_URL`: Slack incoming webhook URL (enables the Slack channel)

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod channels;
pub mod error;
pub mod message;

pub use channels::slack::SlackChannel;
pub use channels::NotifyChannel;
pub use error::{DeliveryError, DeliveryFailure};
pub use message::{AlertMessage, NOT_AVAILABLE};
