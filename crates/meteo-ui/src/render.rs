//! Draws a `View` onto a ratatui frame using the root's palette.

use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Tabs, Wrap};
use ratatui::Frame;

use crate::theme::{Palette, ThemeRoot};
use crate::view::{
    CurrentPanel, Dashboard, ForecastCard, NavBar, View, ABOUT_TEXT, ABOUT_TITLE, CONTACT_LINES,
    COPYRIGHT, DISCLAIMER, FOOTER_LINKS,
};

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

const KEY_HINTS: &str = "←/→ ville · 1-3 choisir · t thème · q quitter";

pub fn draw(frame: &mut Frame, view: &View, root: &ThemeRoot) {
    let palette = root.palette();
    let area = frame.size();

    frame.render_widget(
        Block::default().style(Style::new().bg(palette.background).fg(palette.text)),
        area,
    );

    match view {
        View::Loading { frame: tick } => draw_spinner(frame, area, *tick, &palette),
        View::Error { nav, message } => {
            let [nav_area, body] =
                Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).areas(area);
            draw_nav(frame, nav_area, nav, &palette);
            draw_error(frame, body, message, &palette);
        }
        View::Dashboard(dashboard) => draw_dashboard(frame, area, dashboard, &palette),
    }
}

fn draw_spinner(frame: &mut Frame, area: Rect, tick: usize, palette: &Palette) {
    let [_, middle, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(1),
        Constraint::Fill(1),
    ])
    .areas(area);

    let spinner = Paragraph::new(SPINNER_FRAMES[tick % SPINNER_FRAMES.len()])
        .alignment(Alignment::Center)
        .style(Style::new().fg(palette.accent).add_modifier(Modifier::BOLD));
    frame.render_widget(spinner, middle);
}

fn panel<'a>(title: &'a str, palette: &Palette) -> Block<'a> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::new().fg(palette.accent))
        .style(Style::new().bg(palette.surface).fg(palette.text))
}

fn draw_nav(frame: &mut Frame, area: Rect, nav: &NavBar, palette: &Palette) {
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::new().fg(palette.muted));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [title_area, tabs_area, toggle_area] = Layout::horizontal([
        Constraint::Length(32),
        Constraint::Min(20),
        Constraint::Length(4),
    ])
    .areas(inner);

    let title = Paragraph::new(Line::from(vec![
        Span::styled("⌖ ", Style::new().fg(palette.accent)),
        Span::styled(nav.title, Style::new().add_modifier(Modifier::BOLD)),
    ]));
    frame.render_widget(title, title_area);

    let tabs = Tabs::new(nav.locations.iter().map(|name| Line::from(*name)))
        .select(nav.selected)
        .style(Style::new().fg(palette.muted))
        .highlight_style(
            Style::new()
                .fg(palette.surface)
                .bg(palette.accent)
                .add_modifier(Modifier::BOLD),
        )
        .divider("|");
    frame.render_widget(tabs, tabs_area);

    let icon = if nav.dark_mode { "☀" } else { "☾" };
    frame.render_widget(
        Paragraph::new(icon).alignment(Alignment::Right),
        toggle_area,
    );
}

fn draw_error(frame: &mut Frame, area: Rect, message: &str, palette: &Palette) {
    let [_, middle, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(5),
        Constraint::Fill(1),
    ])
    .areas(area);
    let [_, panel_area, _] = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Max(70),
        Constraint::Fill(1),
    ])
    .areas(middle);

    let block = panel("Erreur", palette)
        .title_style(Style::new().fg(palette.error).add_modifier(Modifier::BOLD))
        .border_style(Style::new().fg(palette.error));
    let body = Paragraph::new(message)
        .wrap(Wrap { trim: true })
        .block(block);
    frame.render_widget(body, panel_area);
}

fn draw_dashboard(frame: &mut Frame, area: Rect, dashboard: &Dashboard, palette: &Palette) {
    let [nav_area, current_area, forecast_area, about_area, footer_area, hints_area] =
        Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(6),
            Constraint::Length(5),
            Constraint::Length(5),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .areas(area);

    draw_nav(frame, nav_area, &dashboard.nav, palette);
    draw_current(frame, current_area, &dashboard.current, palette);
    draw_forecast(frame, forecast_area, &dashboard.forecast, palette);
    draw_about(frame, about_area, palette);
    draw_footer(frame, footer_area, palette);

    frame.render_widget(
        Paragraph::new(KEY_HINTS)
            .alignment(Alignment::Center)
            .style(Style::new().fg(palette.muted)),
        hints_area,
    );
}

fn draw_current(frame: &mut Frame, area: Rect, current: &CurrentPanel, palette: &Palette) {
    let lines = vec![
        Line::styled(
            current.temperature.as_str(),
            Style::new().add_modifier(Modifier::BOLD),
        ),
        Line::styled(current.description.as_str(), Style::new().fg(palette.muted)),
        Line::from(vec![
            Span::styled("≋ ", Style::new().fg(palette.accent)),
            Span::raw(current.wind.as_str()),
        ]),
        Line::from(vec![
            Span::styled("≈ ", Style::new().fg(palette.accent)),
            Span::raw(current.humidity.as_str()),
        ]),
    ];

    frame.render_widget(
        Paragraph::new(lines).block(panel("Maintenant", palette)),
        area,
    );
}

fn draw_forecast(frame: &mut Frame, area: Rect, cards: &[ForecastCard], palette: &Palette) {
    if cards.is_empty() {
        return;
    }

    let columns = Layout::horizontal(vec![Constraint::Fill(1); cards.len()]).split(area);

    for (card, column) in cards.iter().zip(columns.iter()) {
        let lines = vec![
            Line::styled(card.time.as_str(), Style::new().fg(palette.muted)),
            Line::styled(
                card.temperature.as_str(),
                Style::new().add_modifier(Modifier::BOLD),
            ),
            Line::styled(card.description.as_str(), Style::new().fg(palette.muted)),
        ];
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::new().fg(palette.muted))
            .style(Style::new().bg(palette.surface).fg(palette.text));
        frame.render_widget(
            Paragraph::new(lines)
                .alignment(Alignment::Center)
                .block(block),
            *column,
        );
    }
}

fn draw_about(frame: &mut Frame, area: Rect, palette: &Palette) {
    frame.render_widget(
        Paragraph::new(ABOUT_TEXT)
            .wrap(Wrap { trim: true })
            .block(panel(ABOUT_TITLE, palette)),
        area,
    );
}

fn draw_footer(frame: &mut Frame, area: Rect, palette: &Palette) {
    let footer_style = Style::new().bg(palette.footer_bg).fg(palette.footer_text);
    let heading = Style::new().add_modifier(Modifier::BOLD);

    let block = Block::default().style(footer_style);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [columns_area, copyright_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(inner);
    let [links_area, contact_area, disclaimer_area] =
        Layout::horizontal([Constraint::Fill(1); 3]).areas(columns_area);

    let mut links = vec![Line::styled("Liens utiles", heading)];
    links.extend(
        FOOTER_LINKS
            .iter()
            .map(|link| Line::from(format!("↗ {} ({})", link.label, link.url))),
    );
    frame.render_widget(Paragraph::new(links).wrap(Wrap { trim: true }), links_area);

    let mut contact = vec![Line::styled("Contact", heading)];
    contact.extend(CONTACT_LINES.iter().map(|l| Line::from(*l)));
    frame.render_widget(Paragraph::new(contact), contact_area);

    frame.render_widget(
        Paragraph::new(vec![
            Line::styled("Avertissement", heading),
            Line::from(DISCLAIMER),
        ])
        .wrap(Wrap { trim: true }),
        disclaimer_area,
    );

    frame.render_widget(
        Paragraph::new(COPYRIGHT).alignment(Alignment::Center),
        copyright_area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::ThemeClass;
    use crate::view::{CurrentPanel, NavBar, TITLE};
    use ratatui::backend::TestBackend;
    use ratatui::buffer::Buffer;
    use ratatui::Terminal;

    fn nav() -> NavBar {
        NavBar {
            title: TITLE,
            locations: vec!["Béni Mellal", "Fkih Ben Salah", "Khouribga"],
            selected: 0,
            dark_mode: false,
        }
    }

    fn render(view: &View, root: &ThemeRoot) -> Buffer {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| draw(f, view, root)).unwrap();
        terminal.backend().buffer().clone()
    }

    fn text_of(buffer: &Buffer) -> String {
        buffer.content.iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn test_loading_renders_spinner_only() {
        let buffer = render(&View::Loading { frame: 0 }, &ThemeRoot::default());
        let text = text_of(&buffer);

        assert!(text.contains(SPINNER_FRAMES[0]));
        assert!(!text.contains(TITLE));
        assert!(!text.contains("Erreur"));
    }

    #[test]
    fn test_error_renders_message_and_nav() {
        let view = View::Error {
            nav: nav(),
            message: "Erreur du service météo.",
        };
        let text = text_of(&render(&view, &ThemeRoot::default()));

        assert!(text.contains("Erreur du service météo."));
        assert!(text.contains("Khouribga"));
        assert!(!text.contains(ABOUT_TITLE));
    }

    #[test]
    fn test_dashboard_renders_all_sections() {
        let view = View::Dashboard(Dashboard {
            nav: nav(),
            current: CurrentPanel {
                temperature: "22°C".to_string(),
                description: "ciel dégagé".to_string(),
                wind: "Vent: 12.6 km/h".to_string(),
                humidity: "Humidité: 40%".to_string(),
            },
            forecast: vec![ForecastCard {
                time: "23:00".to_string(),
                temperature: "12°C".to_string(),
                description: "pluie".to_string(),
            }],
        });
        let text = text_of(&render(&view, &ThemeRoot::default()));

        for expected in [
            TITLE,
            "22°C",
            "ciel dégagé",
            "Vent: 12.6 km/h",
            "Humidité: 40%",
            "23:00",
            "pluie",
            ABOUT_TITLE,
            "Liens utiles",
            "Avertissement",
        ] {
            assert!(text.contains(expected), "missing {expected:?}");
        }
    }

    #[test]
    fn test_background_follows_theme_root() {
        let mut root = ThemeRoot::default();
        let light = render(&View::Loading { frame: 0 }, &root);

        root.apply(ThemeClass::Dark);
        let dark = render(&View::Loading { frame: 0 }, &root);

        assert_eq!(light.content[0].bg, ThemeClass::Light.palette().background);
        assert_eq!(dark.content[0].bg, ThemeClass::Dark.palette().background);
    }
}
