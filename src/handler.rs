use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::{App, FocusPane};
use crate::tui::AppEvent;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key).await?,
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
        AppEvent::AskFinished(result) => {
            app.finish_ask(result);
        }
        AppEvent::UploadFinished(result) => app.finish_upload(result),
    }
    Ok(())
}

async fn handle_key(app: &mut App, key: KeyEvent) -> Result<()> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Global keys that work in any mode
    if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q')) {
        app.should_quit = true;
        return Ok(());
    }

    // An open notice swallows the next key
    if app.notice.is_some() {
        app.notice = None;
        return Ok(());
    }

    if ctrl && key.code == KeyCode::Char('u') {
        app.start_upload();
        return Ok(());
    }

    match key.code {
        KeyCode::Tab => {
            app.cycle_focus(true);
            return Ok(());
        }
        KeyCode::BackTab => {
            app.cycle_focus(false);
            return Ok(());
        }
        _ => {}
    }

    match app.focus {
        FocusPane::Chat => handle_chat_key(app, key),
        FocusPane::Platform => handle_platform_key(app, key),
        FocusPane::Upload => handle_upload_key(app, key).await,
    }

    Ok(())
}

fn handle_chat_key(app: &mut App, key: KeyEvent) {
    // Scrolling works while a question is in flight
    match key.code {
        KeyCode::PageUp => return app.scroll_chat_up(app.chat_height.max(2) / 2),
        KeyCode::PageDown => return app.scroll_chat_down(app.chat_height.max(2) / 2),
        KeyCode::Up => return app.scroll_chat_up(1),
        KeyCode::Down => return app.scroll_chat_down(1),
        _ => {}
    }

    // Input and submit are disabled for the duration of an ask cycle
    if !app.controls_enabled() {
        return;
    }

    match key.code {
        KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => app.input.insert('\n'),
        KeyCode::Enter => app.submit_question(),
        KeyCode::Backspace => app.input.backspace(),
        KeyCode::Delete => app.input.delete(),
        KeyCode::Left => app.input.left(),
        KeyCode::Right => app.input.right(),
        KeyCode::Home => app.input.home(),
        KeyCode::End => app.input.end(),
        KeyCode::Char(c) if is_text_input(&key) => app.input.insert(c),
        _ => {}
    }
}

fn handle_platform_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Down | KeyCode::Right | KeyCode::Char('j') => app.next_platform(),
        KeyCode::Up | KeyCode::Left | KeyCode::Char('k') => app.prev_platform(),
        KeyCode::Esc => app.focus = FocusPane::Chat,
        _ => {}
    }
}

async fn handle_upload_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.apply_upload_path().await,
        KeyCode::Esc => {
            app.upload.path_input.clear();
            app.apply_upload_path().await;
        }
        KeyCode::Backspace => app.upload.path_input.backspace(),
        KeyCode::Delete => app.upload.path_input.delete(),
        KeyCode::Left => app.upload.path_input.left(),
        KeyCode::Right => app.upload.path_input.right(),
        KeyCode::Home => app.upload.path_input.home(),
        KeyCode::End => app.upload.path_input.end(),
        KeyCode::Char(c) if is_text_input(&key) => app.upload.path_input.insert(c),
        _ => {}
    }
}

/// Characters typed with Ctrl or Alt are shortcuts, not text.
fn is_text_input(key: &KeyEvent) -> bool {
    !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_chat_down(3),
        MouseEventKind::ScrollUp => app.scroll_chat_up(3),
        _ => {}
    }
}
