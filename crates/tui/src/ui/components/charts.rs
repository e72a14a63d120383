use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Paragraph},
};

use crate::ui::{components::card::Card, theme::Theme};

/// Vertical bars, one colour per bar. Values are rounded to whole rupees.
pub fn render_bar_chart(
    frame: &mut Frame<'_>,
    area: Rect,
    title: &str,
    data: &[(&str, f64, Color)],
    theme: &Theme,
) {
    let card = Card::new(title, theme);
    let inner = card.inner(area);
    card.render_frame(frame, area);

    if data.is_empty() {
        render_empty(frame, inner, theme);
        return;
    }

    let bars: Vec<Bar<'_>> = data
        .iter()
        .map(|(label, value, color)| {
            Bar::default()
                .label(Line::from(*label))
                .value(value.round() as u64)
                .style(Style::default().fg(*color))
        })
        .collect();
    let width = (inner.width / data.len().max(1) as u16).saturating_sub(2).clamp(3, 12);

    let chart = BarChart::default()
        .data(BarGroup::default().bars(&bars))
        .bar_width(width)
        .bar_gap(2)
        .value_style(Style::default().fg(theme.text).add_modifier(Modifier::BOLD))
        .label_style(Style::default().fg(theme.dim));
    frame.render_widget(chart, inner);
}

/// Horizontal label/bar/value rows, for category breakdowns.
pub fn render_breakdown(
    frame: &mut Frame<'_>,
    area: Rect,
    title: &str,
    data: &[(String, f64)],
    theme: &Theme,
) {
    let card = Card::new(title, theme);
    let inner = card.inner(area);
    card.render_frame(frame, area);

    if data.is_empty() {
        render_empty(frame, inner, theme);
        return;
    }

    let max = data.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);
    let label_width = data.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    let bar_width = (inner.width as usize).saturating_sub(label_width + 12).max(4);

    let lines: Vec<Line<'_>> = data
        .iter()
        .map(|(label, value)| {
            Line::from(vec![
                Span::styled(
                    format!("{label:<label_width$} "),
                    Style::default().fg(theme.text_muted),
                ),
                Span::styled(ascii_bar(*value, max, bar_width), Style::default().fg(theme.accent)),
                Span::styled(format!(" ₹{value:.0}"), Style::default().fg(theme.text)),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_empty(frame: &mut Frame<'_>, area: Rect, theme: &Theme) {
    frame.render_widget(
        Paragraph::new(Span::styled("No data", Style::default().fg(theme.dim))),
        area,
    );
}

/// Returns a string like `████████░░░░` representing `value / max`.
#[must_use]
pub fn ascii_bar(value: f64, max: f64, width: usize) -> String {
    if max <= 0.0 {
        return "░".repeat(width);
    }

    let ratio = (value / max).clamp(0.0, 1.0);
    let filled = ((ratio * width as f64).round() as usize).min(width);
    let empty = width.saturating_sub(filled);

    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}
