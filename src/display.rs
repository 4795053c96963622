//! Output Formatting and Display Management
//!
//! Renders analysis results either as colored terminal reports or as JSON
//! for programmatic consumption.
//!
//! ## Report Types
//!
//! - **Summaries**: per category type, per tariff description or per macro
//!   bucket, one row per group with calls, duration and cost
//! - **Callers**: per caller number with a category breakdown
//! - **Monthly**: calendar month totals
//! - **Clients**: revenue, cost and margin per billing client
//! - **Prefixes**: the active tariff table
//!
//! ## JSON Output
//!
//! With `json_output` every report prints a single object keyed by the
//! report name, e.g.:
//!
//! ```json
//! {
//!   "summary": [
//!     {
//!       "category": "mobile",
//!       "count": 2,
//!       "totalSeconds": 645,
//!       "totalMinutes": 10.75,
//!       "totalHours": 0.18,
//!       "formattedDuration": "00:10:45",
//!       "cost": 1.65
//!     }
//!   ],
//!   "totalCost": 1.65
//! }
//! ```

use crate::duration::format_duration;
use crate::models::*;
use crate::prefix_table::PrefixTable;
use crate::reconciler::Reconciliation;
use colored::Colorize;
use rust_decimal::Decimal;
use serde::Serialize;

pub struct DisplayManager {
    json_pretty: bool,
}

impl Default for DisplayManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayManager {
    pub fn new() -> Self {
        Self { json_pretty: true }
    }

    pub fn with_json_pretty(json_pretty: bool) -> Self {
        Self { json_pretty }
    }

    pub fn display_summary(
        &self,
        key: &str,
        title: &str,
        summaries: &[CallSummary],
        limit: Option<usize>,
        json_output: bool,
    ) {
        let total_cost: Decimal = summaries.iter().map(|s| s.cost).sum();

        if json_output {
            let shown = first_n(summaries, limit);
            self.print_json(&serde_json::json!({ key: shown, "totalCost": total_cost }));
            return;
        }

        self.print_header(title);
        let total_calls: u64 = summaries.iter().map(|s| s.count).sum();
        let total_seconds = summaries
            .iter()
            .fold(0u64, |acc, s| acc.saturating_add(s.total_seconds));
        println!(
            "\n{} {} calls • {} • {} total\n",
            "📊".bright_yellow(),
            total_calls.to_string().bright_white().bold(),
            format_duration(total_seconds).bright_white(),
            format_money(total_cost).bright_green().bold()
        );

        for summary in first_n(summaries, limit) {
            let share = percentage(summary.cost, total_cost);
            println!(
                "   {}: {} ({} calls, {}, {}%)",
                summary.category.bright_cyan(),
                format_money(summary.cost).bright_green(),
                summary.count.to_string().bright_white(),
                summary.formatted_duration,
                format!("{:.0}", share).bright_yellow()
            );
        }
        if let Some(limit) = limit {
            if summaries.len() > limit {
                println!("   ... {} more", summaries.len() - limit);
            }
        }
        println!();
    }

    pub fn display_callers(&self, callers: &[CallerAnalysis], limit: Option<usize>, json_output: bool) {
        if json_output {
            self.print_json(&serde_json::json!({ "callers": first_n(callers, limit) }));
            return;
        }

        self.print_header("Call Report - By Caller");
        println!(
            "\n{} {} callers\n",
            "📞".bright_yellow(),
            callers.len().to_string().bright_white().bold()
        );

        for caller in first_n(callers, limit) {
            println!(
                "{} {} - {} ({} calls, {})",
                "👤".bright_blue(),
                caller.caller_number.bright_white().bold(),
                format_money(caller.total_cost()).bright_green().bold(),
                caller.total_calls.to_string().bright_white(),
                caller.formatted_total_duration
            );
            for category in &caller.categories {
                println!(
                    "   {}: {} ({} calls, {})",
                    category.category.bright_cyan(),
                    format_money(category.cost).bright_green(),
                    category.count,
                    category.formatted_duration
                );
            }
            println!();
        }
    }

    pub fn display_monthly(&self, months: &[MonthlySummary], limit: Option<usize>, json_output: bool) {
        if json_output {
            self.print_json(&serde_json::json!({ "monthly": last_n(months, limit) }));
            return;
        }

        self.print_header("Call Report - Monthly");
        let total_cost: Decimal = months.iter().map(|m| m.cost).sum();
        println!("\n{} Total Usage Summary:", "📊".bright_yellow());
        println!("   Months: {}", months.len().to_string().bright_white().bold());
        println!("   Total Cost: {}", format_money(total_cost).bright_green().bold());
        println!();

        // Most recent months, printed oldest first.
        for month in last_n(months, limit) {
            println!(
                "   {}: {} ({} calls, {})",
                month.month.bright_white().bold(),
                format_money(month.cost).bright_green(),
                month.total_calls.to_string().bright_white(),
                month.formatted_duration
            );
        }
    }

    pub fn display_reconciliation(&self, result: &Reconciliation, limit: Option<usize>, json_output: bool) {
        if json_output {
            self.print_json(&serde_json::json!({
                "clients": first_n(&result.clients, limit),
                "totals": result.totals,
            }));
            return;
        }

        self.print_header("Client Reconciliation");
        let totals = &result.totals;
        println!(
            "\n{} revenue {} • cost {} • margin {} ({}%)\n",
            "💶".bright_yellow(),
            format_money(totals.revenue).bright_green().bold(),
            format_money(totals.total_cost).bright_white(),
            colored_margin(totals.margin),
            format!("{:.2}", totals.margin_pct).bright_yellow()
        );

        for client in first_n(&result.clients, limit) {
            println!(
                "{} {} - revenue {} • cost {} • margin {} ({}%)",
                "🏢".bright_blue(),
                client.client_name.bright_white().bold(),
                format_money(client.revenue).bright_green(),
                format_money(client.total_cost),
                colored_margin(client.margin),
                format!("{:.2}", client.margin_pct).bright_yellow()
            );
            let minutes = &client.billed_minutes;
            println!(
                "   {} numbers, {} calls, billed min: mobile {} / landline {} / international {} / special {}",
                client.numbers_count,
                client.total_calls,
                minutes.mobile,
                minutes.landline,
                minutes.international,
                minutes.special
            );
            if !client.flat_fee.is_zero() {
                println!("   flat fee {}", format_money(client.flat_fee).bright_green());
            }
        }
        println!();
    }

    pub fn display_prefixes(&self, table: &PrefixTable, json_output: bool) {
        if json_output {
            self.print_json(&serde_json::json!({ "prefixes": table.rules() }));
            return;
        }

        self.print_header("Prefix Table");
        println!(
            "\n{} {} rules\n",
            "📋".bright_yellow(),
            table.len().to_string().bright_white().bold()
        );
        for rule in table.rules() {
            println!(
                "   {:<8} {:<14} {:<36} {}/min",
                rule.prefix.bright_white().bold(),
                rule.category.as_str().bright_cyan(),
                rule.description,
                format_money(rule.cost_per_minute).bright_green()
            );
        }
        println!();
    }

    pub fn display_classifications(&self, results: &[(String, Classification)], json_output: bool) {
        if json_output {
            let entries: Vec<_> = results
                .iter()
                .map(|(number, c)| {
                    serde_json::json!({
                        "number": number,
                        "category": c.category,
                        "costPerMinute": c.cost_per_minute,
                        "matchedPrefix": c.matched_prefix,
                    })
                })
                .collect();
            self.print_json(&serde_json::json!({ "classifications": entries }));
            return;
        }

        for (number, classification) in results {
            let matched = classification
                .matched_prefix
                .as_deref()
                .map(|p| format!("prefix {}", p))
                .unwrap_or_else(|| "no match".to_string());
            println!(
                "{} -> {} / {} at {}/min ({})",
                number.bright_white().bold(),
                classification.category.category_type.as_str().bright_cyan(),
                classification.category.description,
                format_money(classification.cost_per_minute).bright_green(),
                matched.dimmed()
            );
        }
    }

    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) {
        let rendered = if self.json_pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        match rendered {
            Ok(json_str) => println!("{}", json_str),
            Err(e) => eprintln!("Error serializing report to JSON: {}", e),
        }
    }

    fn print_header(&self, title: &str) {
        println!("\n{}", "=".repeat(80).bright_cyan());
        println!("{}", title.bright_white().bold());
        println!("{}", "=".repeat(80).bright_cyan());
    }
}

fn first_n<T>(items: &[T], limit: Option<usize>) -> &[T] {
    &items[..limit.unwrap_or(items.len()).min(items.len())]
}

fn last_n<T>(items: &[T], limit: Option<usize>) -> &[T] {
    &items[items.len().saturating_sub(limit.unwrap_or(items.len()))..]
}

fn format_money(value: Decimal) -> String {
    format!("€{}", value.round_dp(2))
}

fn colored_margin(margin: Decimal) -> colored::ColoredString {
    if margin.is_sign_negative() && !margin.is_zero() {
        format_money(margin).bright_red()
    } else {
        format_money(margin).bright_green()
    }
}

fn percentage(part: Decimal, total: Decimal) -> Decimal {
    if total.is_zero() {
        Decimal::ZERO
    } else {
        part / total * Decimal::ONE_HUNDRED
    }
}
