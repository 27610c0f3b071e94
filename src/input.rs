use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEventKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Jump,
    ToggleMute,
    Quit,
    /// New terminal size in cells.
    Resize(u16, u16),
}

/// Space, Up, Enter and a left click all mean jump. Nothing is debounced.
pub fn intent_for(event: &Event) -> Option<Intent> {
    match event {
        Event::Key(key) => key_intent(key),
        Event::Mouse(mouse) => match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => Some(Intent::Jump),
            _ => None,
        },
        Event::Resize(cols, rows) => Some(Intent::Resize(*cols, *rows)),
        _ => None,
    }
}

fn key_intent(key: &KeyEvent) -> Option<Intent> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    match key.code {
        KeyCode::Char(' ') | KeyCode::Up | KeyCode::Enter => Some(Intent::Jump),
        KeyCode::Char('m') | KeyCode::Char('M') => Some(Intent::ToggleMute),
        KeyCode::Char('q') | KeyCode::Esc => Some(Intent::Quit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, KeyModifiers, MouseEvent};

    fn key(code: KeyCode, kind: KeyEventKind) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        })
    }

    fn mouse(kind: MouseEventKind) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column: 10,
            row: 5,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn test_jump_sources() {
        for code in [KeyCode::Char(' '), KeyCode::Up, KeyCode::Enter] {
            assert_eq!(intent_for(&key(code, KeyEventKind::Press)), Some(Intent::Jump));
        }
        assert_eq!(
            intent_for(&mouse(MouseEventKind::Down(MouseButton::Left))),
            Some(Intent::Jump)
        );
    }

    #[test]
    fn test_release_and_other_buttons_ignored() {
        assert_eq!(intent_for(&key(KeyCode::Char(' '), KeyEventKind::Release)), None);
        assert_eq!(intent_for(&mouse(MouseEventKind::Up(MouseButton::Left))), None);
        assert_eq!(intent_for(&mouse(MouseEventKind::Down(MouseButton::Right))), None);
        assert_eq!(intent_for(&key(KeyCode::Char('x'), KeyEventKind::Press)), None);
    }

    #[test]
    fn test_repeat_still_jumps() {
        assert_eq!(
            intent_for(&key(KeyCode::Char(' '), KeyEventKind::Repeat)),
            Some(Intent::Jump)
        );
    }

    #[test]
    fn test_control_keys() {
        assert_eq!(
            intent_for(&key(KeyCode::Char('m'), KeyEventKind::Press)),
            Some(Intent::ToggleMute)
        );
        assert_eq!(intent_for(&key(KeyCode::Esc, KeyEventKind::Press)), Some(Intent::Quit));
        assert_eq!(intent_for(&Event::Resize(120, 40)), Some(Intent::Resize(120, 40)));
    }
}
