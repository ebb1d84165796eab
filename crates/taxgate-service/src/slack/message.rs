//! Block Kit payload for a billable call.

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

use taxgate_core::TaxQuery;

/// IST is UTC+05:30.
const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Incoming-webhook payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlackMessage {
    /// Fallback text shown in notifications.
    pub text: String,
    /// Rich layout.
    pub blocks: Vec<Block>,
}

/// A Block Kit section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    /// Block type, always `section`.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Single text body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<TextObject>,
    /// Two-column fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<TextObject>>,
}

/// A `mrkdwn` text object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextObject {
    /// Text type, always `mrkdwn`.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Markdown content.
    pub text: String,
}

impl TextObject {
    fn mrkdwn(text: impl Into<String>) -> Self {
        Self {
            kind: "mrkdwn",
            text: text.into(),
        }
    }
}

impl Block {
    fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "section",
            text: Some(TextObject::mrkdwn(text)),
            fields: None,
        }
    }

    fn fields(fields: Vec<TextObject>) -> Self {
        Self {
            kind: "section",
            text: None,
            fields: Some(fields),
        }
    }
}

/// Build the notification for invocation `invocation` of the month, with
/// the month's running `total_cost`, stamped at `at`.
#[must_use]
pub fn build_message(
    query: &TaxQuery,
    invocation: u64,
    total_cost: f64,
    at: DateTime<Utc>,
) -> SlackMessage {
    let total = format!("₹{total_cost:.2}");

    SlackMessage {
        text: format!("Tax API Invocation #{invocation} - Total Cost: {total}"),
        blocks: vec![
            Block::text(format!(
                "💰 *Tax Calculator API - Invocation #{invocation}*\n\n*Query Details:*\n{}",
                query_details(query)
            )),
            Block::fields(vec![
                TextObject::mrkdwn(format!("*📊 Invocation Number*\n#{invocation}")),
                TextObject::mrkdwn(format!("*💵 Total Cost This Month*\n{total}")),
            ]),
            Block::text(format!("🕐 {} IST", format_ist(at))),
        ],
    }
}

fn query_details(query: &TaxQuery) -> String {
    let lines: Vec<String> = [
        ("🌍 *Country:*", Some(query.country.as_str()).filter(|c| !c.is_empty())),
        ("📮 *ZIP Code:*", query.zip.as_deref()),
        ("🏙️ *City:*", query.city.as_deref()),
        ("📍 *Street:*", query.street.as_deref()),
    ]
    .into_iter()
    .filter_map(|(label, value)| value.map(|v| format!("{label} {v}")))
    .collect();

    if lines.is_empty() {
        "No query parameters provided".to_string()
    } else {
        lines.join("\n")
    }
}

fn format_ist(at: DateTime<Utc>) -> String {
    match FixedOffset::east_opt(IST_OFFSET_SECS) {
        Some(ist) => at.with_timezone(&ist).format("%b %-d, %Y, %-I:%M %p").to_string(),
        None => at.format("%b %-d, %Y, %-I:%M %p").to_string(),
    }
}
