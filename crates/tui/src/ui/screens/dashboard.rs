use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, ListState, Paragraph},
};

use crate::{
    app::AppState,
    cache::QueryKey,
    dashboard::{Focus, FormField, category_bars, income_expense_bars},
    ui::{
        components::{
            card::{Card, StatCard},
            charts,
            money::{format_inr, styled_amount},
        },
        screens::login::centered_box,
        theme::Theme,
    },
};
use api_types::transaction::TransactionKind;

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let theme = Theme::default();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(10),
            Constraint::Min(8),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(frame, layout[0], state, &theme);
    render_stats(frame, layout[1], state, &theme);

    let charts_row = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(layout[2]);
    render_charts(frame, charts_row[0], charts_row[1], state, &theme);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(42), Constraint::Min(0)])
        .split(layout[3]);
    render_form(frame, body[0], state, &theme);
    render_transactions(frame, body[1], state, &theme);

    render_hints(frame, layout[4], state, &theme);

    if state.dashboard.delete_confirm.is_some() {
        render_delete_modal(frame, area, state, &theme);
    }
}

fn render_header(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let period = state.dashboard.period;
    let busy = [QueryKey::summary(period), QueryKey::transactions(period)]
        .into_iter()
        .any(|key| state.cache.is_pending(key));

    let mut spans = vec![
        Span::styled(
            "Tally",
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("   "),
        Span::styled("‹ ", Style::default().fg(theme.dim)),
        Span::styled(period.label(), Style::default().fg(theme.text)),
        Span::styled(" ›", Style::default().fg(theme.dim)),
        Span::styled(format!("  ({period})"), Style::default().fg(theme.dim)),
    ];
    if busy {
        spans.push(Span::styled("  syncing…", Style::default().fg(theme.warning)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_stats(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let period = state.dashboard.period;
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    let Some(summary) = state.cache.summary(period) else {
        let text = match state.cache.error(QueryKey::summary(period)) {
            Some(err) => err.to_string(),
            None => "Loading…".to_string(),
        };
        for (col, title) in cols.iter().zip(["Balance", "Income", "Expense"]) {
            StatCard::new(title, text.clone(), theme)
                .color(theme.dim)
                .render(frame, *col);
        }
        return;
    };

    let balance_color = if summary.balance >= 0.0 {
        theme.positive
    } else {
        theme.negative
    };
    StatCard::new("Balance", format_inr(summary.balance), theme)
        .color(balance_color)
        .render(frame, cols[0]);
    StatCard::new("Income", format_inr(summary.total_income), theme)
        .color(theme.positive)
        .render(frame, cols[1]);
    StatCard::new("Expense", format_inr(summary.total_expense), theme)
        .color(theme.negative)
        .render(frame, cols[2]);
}

fn render_charts(
    frame: &mut Frame<'_>,
    left: Rect,
    right: Rect,
    state: &AppState,
    theme: &Theme,
) {
    let Some(summary) = state.cache.summary(state.dashboard.period) else {
        charts::render_bar_chart(frame, left, "Income vs Expense", &[], theme);
        charts::render_breakdown(frame, right, "By category", &[], theme);
        return;
    };

    let bars: Vec<_> = income_expense_bars(summary)
        .into_iter()
        .map(|(label, value)| {
            let color = if label == "Income" {
                theme.positive
            } else {
                theme.negative
            };
            (label, value, color)
        })
        .collect();
    charts::render_bar_chart(frame, left, "Income vs Expense", &bars, theme);
    charts::render_breakdown(frame, right, "By category", &category_bars(summary), theme);
}

fn render_form(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let dashboard = &state.dashboard;
    let focused = dashboard.focus == Focus::Form && dashboard.delete_confirm.is_none();
    let card = Card::new(dashboard.form.title(), theme).focused(focused);

    let draft = &dashboard.form;
    let mut lines = Vec::new();
    for field in FormField::ALL {
        let active = focused && dashboard.field == field;
        let value = match field {
            FormField::Kind => match draft.kind {
                TransactionKind::Income => "‹ Income ›".to_string(),
                TransactionKind::Expense => "‹ Expense ›".to_string(),
            },
            FormField::Amount => draft.amount.clone(),
            FormField::Category => format!("‹ {} ›", draft.category),
            FormField::Description => draft.description.clone(),
            FormField::Date => draft.date.clone(),
        };
        let marker = if active { "› " } else { "  " };
        let cursor = if active && !matches!(field, FormField::Kind | FormField::Category) {
            "│"
        } else {
            ""
        };
        let value_style = if active {
            Style::default().fg(theme.accent)
        } else {
            Style::default().fg(theme.text)
        };
        lines.push(Line::from(vec![
            Span::styled(marker, Style::default().fg(theme.accent)),
            Span::styled(
                format!("{:<13}", field.label()),
                Style::default().fg(theme.text_muted),
            ),
            Span::styled(format!("{value}{cursor}"), value_style),
        ]));
    }

    lines.push(Line::default());
    let submit = if dashboard.saving {
        "Saving...".to_string()
    } else {
        format!("[ {} ]", draft.submit_label())
    };
    lines.push(Line::from(Span::styled(
        submit,
        Style::default()
            .fg(theme.accent)
            .add_modifier(Modifier::BOLD),
    )));
    if let Some(err) = &dashboard.form_error {
        lines.push(Line::from(Span::styled(
            err.as_str(),
            Style::default().fg(theme.error),
        )));
    }

    card.render_with(frame, area, Paragraph::new(lines));
}

fn render_transactions(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let dashboard = &state.dashboard;
    let focused = dashboard.focus == Focus::List && dashboard.delete_confirm.is_none();
    let card = Card::new("Transactions", theme).focused(focused);
    let inner = card.inner(area);
    card.render_frame(frame, area);

    let key = QueryKey::transactions(dashboard.period);
    let Some(items) = state.cache.transactions(dashboard.period) else {
        let text = state.cache.error(key).unwrap_or("Loading…");
        frame.render_widget(
            Paragraph::new(Span::styled(text, Style::default().fg(theme.dim))),
            inner,
        );
        return;
    };
    if items.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "No transactions this month",
                Style::default().fg(theme.dim),
            ))
            .alignment(Alignment::Center),
            inner,
        );
        return;
    }

    let list_items: Vec<ListItem<'_>> = items
        .iter()
        .map(|tx| {
            let day: String = tx.date.chars().take(10).collect();
            let description = tx.description.as_deref().unwrap_or("");
            ListItem::new(Line::from(vec![
                Span::styled(format!("{day}  "), Style::default().fg(theme.dim)),
                Span::styled(
                    format!("{:<14}", tx.category),
                    Style::default().fg(theme.text),
                ),
                Span::styled(
                    format!("{description:<20} "),
                    Style::default().fg(theme.text_muted),
                ),
                styled_amount(tx.amount, tx.kind, theme),
            ]))
        })
        .collect();

    let list = List::new(list_items)
        .highlight_style(Style::default().bg(theme.border))
        .highlight_symbol("› ");
    let mut list_state = ListState::default().with_selected(Some(dashboard.selected));
    frame.render_stateful_widget(list, inner, &mut list_state);
}

fn render_hints(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let dashboard = &state.dashboard;
    let hints: &[(&str, &str)] = if dashboard.delete_confirm.is_some() {
        &[("y", "delete"), ("n", "cancel")]
    } else if dashboard.focus == Focus::Form {
        &[
            ("Tab", "next field"),
            ("←/→", "change"),
            ("Enter", "save"),
            ("Esc", "back"),
        ]
    } else {
        &[
            ("[ ]", "month"),
            ("↑/↓", "select"),
            ("a", "add"),
            ("e", "edit"),
            ("d", "delete"),
            ("r", "refresh"),
            ("x", "logout"),
            ("q", "quit"),
        ]
    };

    let mut parts = Vec::new();
    for (i, (key, label)) in hints.iter().enumerate() {
        if i > 0 {
            parts.push(Span::styled("  │  ", Style::default().fg(theme.border)));
        }
        parts.push(Span::styled(*key, Style::default().fg(theme.accent)));
        parts.push(Span::raw(format!(" {label}")));
    }
    frame.render_widget(Paragraph::new(Line::from(parts)), area);
}

fn render_delete_modal(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let rect = centered_box(40, 5, area);
    frame.render_widget(Clear, rect);

    let block = Block::default()
        .title(Span::styled(" Delete transaction ", Style::default().fg(theme.error)))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.error));
    let text = if state.dashboard.deleting {
        "Deleting..."
    } else {
        "Delete this transaction? (y/n)"
    };
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(text, Style::default().fg(theme.text))))
            .alignment(Alignment::Center)
            .block(block),
        rect,
    );
}
