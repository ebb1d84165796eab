//! Admin dashboard statistics and rendering.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use taxgate_core::{ApiKeyTier, MonthKey, MonthlyCostLog, MonthlyQueryLog, TaxQuery};

/// Number of recent queries listed on the dashboard.
pub const RECENT_QUERY_LIMIT: usize = 50;

/// Query counts for one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthQueries {
    /// Month.
    pub month: MonthKey,
    /// All queries.
    pub total: usize,
    /// Prod-key queries.
    pub prod: usize,
    /// Test-key queries.
    pub test: usize,
}

/// Billing for one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthCost {
    /// Month.
    pub month: MonthKey,
    /// Total billed.
    pub cost: f64,
    /// Billed calls.
    pub invocations: u64,
}

/// One row of the recent-queries table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentQuery {
    /// When the call was made.
    pub timestamp: DateTime<Utc>,
    /// Key tier.
    pub tier: ApiKeyTier,
    /// Parameters sent.
    pub query: TaxQuery,
    /// Status returned to the caller.
    pub status_code: u16,
    /// Combined rate or error text.
    pub summary: String,
}

/// Aggregates shown on the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    /// Queries across all months.
    pub total_queries: usize,
    /// Prod-key queries across all months.
    pub prod_queries: usize,
    /// Test-key queries across all months.
    pub test_queries: usize,
    /// Billed amount across all months.
    pub total_cost: f64,
    /// Per-month query counts, newest month first.
    pub monthly_queries: Vec<MonthQueries>,
    /// Per-month billing, newest month first.
    pub monthly_costs: Vec<MonthCost>,
    /// Most recent queries, newest first.
    pub recent_queries: Vec<RecentQuery>,
}

impl DashboardStats {
    /// Aggregate every month's query log and cost ledger.
    #[must_use]
    pub fn compute(logs: &[MonthlyQueryLog], costs: &[MonthlyCostLog]) -> Self {
        let monthly_queries: Vec<MonthQueries> = logs
            .iter()
            .map(|log| MonthQueries {
                month: log.month.clone(),
                total: log.queries.len(),
                prod: log.count_for(ApiKeyTier::Prod),
                test: log.count_for(ApiKeyTier::Test),
            })
            .collect();

        let monthly_costs: Vec<MonthCost> = costs
            .iter()
            .map(|ledger| MonthCost {
                month: ledger.month.clone(),
                cost: ledger.total_cost,
                invocations: ledger.total_invocations,
            })
            .collect();

        let mut recent_queries: Vec<RecentQuery> = logs
            .iter()
            .flat_map(|log| log.queries.iter())
            .map(|entry| RecentQuery {
                timestamp: entry.timestamp,
                tier: entry.api_key_type,
                query: entry.query.clone(),
                status_code: entry.status_code,
                summary: summarize(entry.status_code, &entry.response),
            })
            .collect();
        recent_queries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        recent_queries.truncate(RECENT_QUERY_LIMIT);

        Self {
            total_queries: monthly_queries.iter().map(|m| m.total).sum(),
            prod_queries: monthly_queries.iter().map(|m| m.prod).sum(),
            test_queries: monthly_queries.iter().map(|m| m.test).sum(),
            total_cost: monthly_costs.iter().map(|m| m.cost).sum(),
            monthly_queries,
            monthly_costs,
            recent_queries,
        }
    }
}

fn summarize(status_code: u16, response: &Value) -> String {
    if status_code == 200 {
        let rate = response
            .get("rate")
            .and_then(|rate| rate.get("combined_rate"))
            .map_or_else(|| "N/A".to_string(), value_text);
        format!("Rate: {rate}")
    } else {
        response
            .get("error")
            .map_or_else(|| "Error".to_string(), value_text)
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Escape text for inclusion in HTML.
#[must_use]
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn query_string(query: &TaxQuery) -> String {
    query
        .upstream_params()
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Render the dashboard page.
#[must_use]
pub fn render(stats: &DashboardStats) -> String {
    let mut months = String::new();
    for m in &stats.monthly_queries {
        let _ = write!(
            months,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(m.month.as_str()),
            m.total,
            m.prod,
            m.test
        );
    }

    let mut costs = String::new();
    for c in &stats.monthly_costs {
        let _ = write!(
            costs,
            "<tr><td>{}</td><td>{}</td><td>₹{:.2}</td></tr>",
            escape_html(c.month.as_str()),
            c.invocations,
            c.cost
        );
    }

    let mut recent = String::new();
    for q in &stats.recent_queries {
        let status_class = if q.status_code == 200 { "success" } else { "error" };
        let _ = write!(
            recent,
            "<tr><td>{}</td><td><span class=\"badge {tier}\">{tier_upper}</span></td>\
             <td><span class=\"query-url\">?{}</span></td>\
             <td><span class=\"badge {status_class}\">{}</span></td><td>{}</td></tr>",
            q.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            escape_html(&query_string(&q.query)),
            q.status_code,
            escape_html(&q.summary),
            tier = q.tier.as_str(),
            tier_upper = q.tier.as_str().to_uppercase(),
        );
    }

    DASHBOARD_TEMPLATE
        .replace("{{total_queries}}", &stats.total_queries.to_string())
        .replace("{{prod_queries}}", &stats.prod_queries.to_string())
        .replace("{{test_queries}}", &stats.test_queries.to_string())
        .replace("{{total_cost}}", &format!("{:.2}", stats.total_cost))
        .replace("{{monthly_query_rows}}", &months)
        .replace("{{monthly_cost_rows}}", &costs)
        .replace("{{recent_query_rows}}", &recent)
}

const DASHBOARD_TEMPLATE: &str = include_str!("../assets/dashboard.html");
