pub mod components;
pub mod keymap;
pub mod screens;

mod terminal;
mod theme;

use ratatui::{Frame, style::Style, widgets::Block};

use crate::{app::AppState, router::Route};

pub use terminal::{AppTerminal as Terminal, restore_terminal, setup_terminal};
pub use theme::Theme;

pub fn render(frame: &mut Frame<'_>, state: &AppState) {
    let area = frame.area();
    let theme = Theme::default();
    frame.render_widget(
        Block::default().style(Style::default().bg(theme.background)),
        area,
    );

    match state.route {
        Route::Login => screens::login::render(frame, area, state),
        Route::Dashboard => screens::dashboard::render(frame, area, state),
    }
    components::toast::render(frame, area, state.toast.as_ref());
}
