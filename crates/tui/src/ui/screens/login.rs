use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};

use crate::{app::AppState, login::LoginField, ui::theme::Theme};

const BOX_WIDTH: u16 = 44;

pub(crate) fn centered_box(width: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(width),
            Constraint::Min(0),
        ])
        .split(vertical[1]);

    horizontal[1]
}

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let theme = Theme::default();
    let login = &state.login;
    let fields = login.fields();

    // label + input per field, then submit and toggle hint
    let box_height = fields.len() as u16 * 2 + 6;
    let card_area = centered_box(BOX_WIDTH, box_height, area);
    frame.render_widget(Clear, card_area);

    let block = Block::default()
        .title(Span::styled(
            format!(" {} ", login.title()),
            Style::default().fg(theme.accent),
        ))
        .title_bottom(Line::from(Span::styled(
            format!(" {} ", state.api_url),
            Style::default().fg(theme.dim),
        )))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.border));
    let inner = block.inner(card_area);
    frame.render_widget(block, card_area);

    let mut lines = Vec::new();
    for field in fields {
        let focused = login.focus() == *field;
        lines.push(Line::from(Span::styled(
            field.label(),
            Style::default().fg(theme.text_muted),
        )));
        lines.push(render_input(login.value(*field), *field, focused, &theme));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        format!("[ {} ]", login.submit_label()),
        Style::default()
            .fg(theme.accent)
            .add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(vec![
        Span::styled(login.toggle_hint(), Style::default().fg(theme.dim)),
        Span::styled("  Ctrl+T", Style::default().fg(theme.accent)),
    ]));

    frame.render_widget(
        Paragraph::new(lines).block(Block::default().padding(ratatui::widgets::Padding::horizontal(1))),
        inner,
    );

    if let Some(message) = &login.error {
        let error_area = Rect {
            x: card_area.x,
            y: card_area.y + card_area.height,
            width: card_area.width,
            height: 1,
        }
        .intersection(area);
        frame.render_widget(
            Paragraph::new(Span::styled(
                message.as_str(),
                Style::default().fg(theme.error),
            ))
            .alignment(Alignment::Center),
            error_area,
        );
    }
}

fn render_input(value: &str, field: LoginField, focused: bool, theme: &Theme) -> Line<'static> {
    let cursor = if focused { "│" } else { "" };
    let shown = if field.is_secret() {
        "•".repeat(value.chars().count())
    } else {
        value.to_string()
    };
    let style = if focused {
        Style::default().fg(theme.accent)
    } else {
        Style::default().fg(theme.text)
    };
    Line::from(Span::styled(format!("{shown}{cursor}"), style))
}
