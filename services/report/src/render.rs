//! Plain-text report layout

use chrono::NaiveDateTime;
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt::Write;

use crate::snapshot::ReportSnapshot;

const RULE: &str = "==============================";

/// Render `snapshot` as the report artifact. `generated_at` is local time.
pub fn render(snapshot: &ReportSnapshot, generated_at: NaiveDateTime) -> String {
    let mut out = String::new();

    // Writing into a String cannot fail
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "FIX Message Analysis Report");
    let _ = writeln!(out, "Generated: {}", generated_at.format("%Y-%m-%dT%H:%M:%S%.f"));
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out);

    let _ = writeln!(out, "Total FIX messages: {}", snapshot.total);
    let _ = writeln!(out, "Unique Symbols: {}", snapshot.unique_symbols);
    let _ = writeln!(out);

    let _ = writeln!(out, "Top Symbols by Trade Volume:");
    for (rank, entry) in snapshot.top_symbols.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. {} — {} shares — Avg Price: {:.2}",
            rank + 1,
            entry.symbol,
            group_thousands(entry.volume),
            entry.avg_price
        );
    }
    let _ = writeln!(out);

    let sides = &snapshot.sides;
    let _ = writeln!(out, "Side Breakdown:");
    let _ = writeln!(out, "- BUY : {}%", one_place(sides.buy_pct()));
    let _ = writeln!(out, "- SELL : {}%", one_place(sides.sell_pct()));
    let _ = writeln!(out, "- MISSING : {}%", one_place(sides.missing_pct()));
    let _ = writeln!(out);

    let _ = writeln!(out, "Message Types:");
    for entry in &snapshot.message_types {
        let _ = writeln!(out, "- {} : {}", entry.msg_type, entry.count);
    }

    out
}

fn one_place(value: Decimal) -> String {
    format!(
        "{:.1}",
        value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
    )
}

/// `1234567.50` renders as `1,234,567.5`.
pub(crate) fn group_thousands(value: Decimal) -> String {
    let value = value.normalize();
    let negative = value.is_sign_negative() && !value.is_zero();
    let text = value.abs().to_string();
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 + 2);
    if negative {
        grouped.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}
