use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use prime_breathing::prime::RequiredState;
use prime_breathing::session::{SessionState, Snapshot};

const VERTICAL_MARGIN: u16 = 1;

/// Status display for one frame
pub struct StatusView<'a> {
    pub snapshot: &'a Snapshot,
    pub toggle: bool,
}

impl StatusView<'_> {
    fn lives_line(&self) -> Line<'static> {
        let heart = Style::default().fg(Color::Red).add_modifier(Modifier::BOLD);
        let spent = Style::default().add_modifier(Modifier::DIM);
        let spans: Vec<Span> = (0..prime_breathing::session::STARTING_LIVES)
            .map(|i| {
                if i < self.snapshot.lives {
                    Span::styled("♥ ", heart)
                } else {
                    Span::styled("♡ ", spent)
                }
            })
            .collect();
        Line::from(spans)
    }

    fn prompt_line(&self) -> Line<'static> {
        let snap = self.snapshot;
        if snap.state != SessionState::Running || !snap.show_prompt {
            return Line::default();
        }
        let style = Style::default().add_modifier(Modifier::BOLD);
        match snap.required {
            RequiredState::Hold => Line::styled("HOLD", style.fg(Color::Cyan)),
            RequiredState::Release => Line::styled("RELEASE", style.fg(Color::Yellow)),
        }
    }

    fn state_line(&self) -> Line<'static> {
        let italic = Style::default().add_modifier(Modifier::ITALIC);
        match self.snapshot.state {
            SessionState::Stopped => Line::styled("press s to start", italic),
            SessionState::Running => {
                let (label, color) = if self.snapshot.raw_input {
                    ("holding", Color::Green)
                } else {
                    ("released", Color::Magenta)
                };
                Line::styled(label, Style::default().fg(color))
            }
            SessionState::GameOver => Line::styled(
                "game over - s to play again",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
        }
    }

    fn help_line(&self) -> Line<'static> {
        let space = if self.toggle {
            "space toggle"
        } else {
            "space hold"
        };
        Line::styled(
            format!("{space} / s start / x stop / r reset / esc quit"),
            Style::default().add_modifier(Modifier::DIM),
        )
    }
}

impl Widget for StatusView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let body_height = 5;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Fill(1),
                Constraint::Length(body_height),
                Constraint::Fill(1),
                Constraint::Length(1),
            ])
            .split(area);

        let counter = Line::styled(
            self.snapshot.counter.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        );
        let body = Paragraph::new(vec![
            counter,
            self.prompt_line(),
            self.lives_line(),
            Line::default(),
            self.state_line(),
        ])
        .alignment(Alignment::Center);
        body.render(chunks[1], buf);

        Paragraph::new(self.help_line())
            .alignment(Alignment::Center)
            .render(chunks[3], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prime_breathing::config::GameConfig;
    use prime_breathing::session::Session;

    fn render_text(snapshot: &Snapshot) -> String {
        let area = Rect::new(0, 0, 60, 14);
        let mut buf = Buffer::empty(area);
        StatusView {
            snapshot,
            toggle: false,
        }
        .render(area, &mut buf);
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn running_session_shows_prompt() {
        let mut session = Session::default();
        session.start();
        let text = render_text(&session.snapshot());
        assert!(text.contains("HOLD"));
        assert!(text.contains("released"));
    }

    #[test]
    fn hard_mode_hides_prompt() {
        let mut session = Session::new(GameConfig::default().with_hard_mode(true));
        session.start();
        let text = render_text(&session.snapshot());
        assert!(!text.contains("HOLD"));
        assert!(!text.contains("RELEASE"));
    }

    #[test]
    fn stopped_session_asks_to_start() {
        let session = Session::default();
        let text = render_text(&session.snapshot());
        assert!(text.contains("press s to start"));
    }
}
