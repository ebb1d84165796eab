//! Slack notifications for billable calls.
//!
//! Delivery is best-effort: the pipeline logs a failed notification and
//! moves on. The webhook carries its own timeout so a slow Slack cannot hold
//! a response past that bound.

pub mod client;
pub mod message;

pub use client::{NotifyError, SlackNotifier};
pub use message::{build_message, Block, SlackMessage, TextObject};
