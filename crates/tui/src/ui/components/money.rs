use api_types::transaction::TransactionKind;
use ratatui::{
    style::{Modifier, Style},
    text::Span,
};

use crate::ui::theme::Theme;

/// Formats an amount as rupees with Indian digit grouping, e.g.
/// `₹12,34,567.50`.
#[must_use]
pub fn format_inr(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    format!("₹{sign}{}.{fraction}", group_indian(whole))
}

fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{},{tail}", groups.join(","))
}

/// Signed amount for a list row: `+₹` for income, `-₹` for expense.
#[must_use]
pub fn styled_amount(amount: f64, kind: TransactionKind, theme: &Theme) -> Span<'static> {
    let (prefix, color) = match kind {
        TransactionKind::Income => ("+", theme.positive),
        TransactionKind::Expense => ("-", theme.negative),
    };
    Span::styled(
        format!("{prefix}{}", format_inr(amount.abs())),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )
}
