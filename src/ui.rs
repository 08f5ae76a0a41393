use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use crate::app::{App, FocusPane};
use crate::chat::{literal_text, ChatMessage, Sender};
use crate::upload::UploadState;

/// Lines for one chat message. Text is always emitted as raw spans, one per
/// line, so nothing in a message is ever interpreted.
fn message_lines(msg: &ChatMessage, animation_frame: Option<u8>) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    let header = match msg.sender {
        Sender::User => Span::styled(
            "You:",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Sender::Assistant => Span::styled(
            "KMS:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
    };
    lines.push(Line::from(header));

    let body_style = if msg.is_error {
        Style::default().fg(Color::Red)
    } else if animation_frame.is_some() {
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC)
    } else {
        Style::default()
    };

    let mut text = literal_text(&msg.text);
    if let Some(frame) = animation_frame {
        // Placeholder: animated ellipsis cycles through ".", "..", "..."
        text = text.trim_end_matches('.').to_string();
        text.push_str(&".".repeat(usize::from(frame) + 1));
    }

    for (i, line) in text.lines().enumerate() {
        if i == 0 && msg.is_error && msg.sender == Sender::Assistant {
            lines.push(Line::from(vec![
                Span::styled("⚠ ", Style::default().fg(Color::Red).bold()),
                Span::styled(line.to_string(), body_style),
            ]));
        } else {
            lines.push(Line::from(Span::styled(line.to_string(), body_style)));
        }
    }
    if text.is_empty() {
        lines.push(Line::default());
    }

    lines.push(Line::default());
    lines
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    let [chat_column, sidebar] = Layout::horizontal([
        Constraint::Percentage(70),
        Constraint::Percentage(30),
    ])
    .areas(body_area);

    render_chat(app, frame, chat_column);
    render_sidebar(app, frame, sidebar);
    render_footer(app, frame, footer_area);

    if app.notice.is_some() {
        render_notice(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" KMS TENESA ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(app.client.base_url().to_string(), Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let (mode_text, mode_style) = if app.controls_enabled() {
        (" READY ", Style::default().bg(Color::Blue).fg(Color::White))
    } else {
        (" WAITING ", Style::default().bg(Color::Yellow).fg(Color::Black))
    };

    let mut hints = match app.focus {
        FocusPane::Chat => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" S-Enter ", key_style),
            Span::styled(" newline ", label_style),
            Span::styled(" PgUp/PgDn ", key_style),
            Span::styled(" scroll ", label_style),
        ],
        FocusPane::Platform => vec![
            Span::styled(" j/k ", key_style),
            Span::styled(" platform ", label_style),
        ],
        FocusPane::Upload => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" select file ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" clear ", label_style),
        ],
    };
    hints.extend(vec![
        Span::styled(" C-u ", key_style),
        Span::styled(" upload ", label_style),
        Span::styled(" Tab ", key_style),
        Span::styled(" focus ", label_style),
        Span::styled(" C-q ", key_style),
        Span::styled(" quit ", label_style),
    ]);

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    // Store chat area for mouse hit-testing and its inner size for scrolling
    app.chat_area = Some(chat_area);
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    let chat_text = if app.log.is_empty() {
        Text::from(Span::styled(
            "Ask a question about the knowledge base...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let placeholder = app.ask.placeholder();
        let lines: Vec<Line> = app
            .log
            .messages()
            .iter()
            .flat_map(|msg| {
                let animation = (Some(msg.id) == placeholder).then_some(app.animation_frame);
                message_lines(msg, animation)
            })
            .collect();
        Text::from(lines)
    };

    // Count with the same wrapping the paragraph uses so the tail is reachable
    let wrapped_lines = Paragraph::new(chat_text.clone())
        .wrap(Wrap { trim: false })
        .line_count(app.chat_width);
    app.log.set_rendered_lines(u16::try_from(wrapped_lines).unwrap_or(u16::MAX));
    app.follow_tail();

    let chat_focused = app.focus == FocusPane::Chat;
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if chat_focused { Color::Cyan } else { Color::DarkGray }))
        .title(format!(" Chat ({}) ", app.platform_id()));

    let chat = Paragraph::new(chat_text)
        .block(chat_block)
        .wrap(Wrap { trim: false })
        .scroll((app.log.scroll, 0));

    frame.render_widget(chat, chat_area);

    // Input box: dimmed and titled differently while disabled
    let enabled = app.controls_enabled();
    let input_border_color = if !enabled {
        Color::DarkGray
    } else if chat_focused {
        Color::Yellow
    } else {
        Color::Gray
    };
    let input_title = if enabled { " Ask (Enter to send) " } else { " Waiting for answer... " };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(input_border_color))
        .title(input_title);

    let inner_width = input_area.width.saturating_sub(2) as usize;
    let (visible_text, cursor_col) = app.input.visible(inner_width);

    let input_style = if enabled {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let input = Paragraph::new(literal_text(&visible_text))
        .style(input_style)
        .block(input_block);

    frame.render_widget(input, input_area);

    if enabled && chat_focused && app.notice.is_none() {
        frame.set_cursor_position((
            input_area.x + cursor_col as u16 + 1,
            input_area.y + 1,
        ));
    }
}

fn render_sidebar(app: &mut App, frame: &mut Frame, area: Rect) {
    let platform_height = app
        .platform
        .as_ref()
        .map(|p| p.options().len() as u16 + 2)
        .unwrap_or(0);

    let [platform_area, upload_area] = Layout::vertical([
        Constraint::Length(platform_height),
        Constraint::Min(0),
    ])
    .areas(area);

    if platform_height > 0 {
        render_platform_selector(app, frame, platform_area);
    }
    render_upload_panel(app, frame, upload_area);
}

fn render_platform_selector(app: &App, frame: &mut Frame, area: Rect) {
    let Some(selector) = &app.platform else {
        return;
    };

    let focused = app.focus == FocusPane::Platform;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused { Color::Cyan } else { Color::DarkGray }))
        .title(" AI Platform ");

    let items: Vec<ListItem> = selector
        .options()
        .iter()
        .map(|p| ListItem::new(format!(" {} ", literal_text(p))))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(Some(selector.selected_index()));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_upload_panel(app: &App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Upload;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused { Color::Cyan } else { Color::DarkGray }))
        .title(" Upload PDF ");

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [label_area, path_area, status_area, button_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(inner);

    frame.render_widget(
        Paragraph::new("File path:").style(Style::default().fg(Color::Gray)),
        label_area,
    );

    let path_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused { Color::Yellow } else { Color::DarkGray }));
    let field_width = path_area.width.saturating_sub(2) as usize;
    let (visible_path, cursor_col) = app.upload.path_input.visible(field_width);
    frame.render_widget(
        Paragraph::new(literal_text(&visible_path)).block(path_block),
        path_area,
    );

    let has_file = app.upload.selection().is_some();
    let status = Paragraph::new(literal_text(app.upload.file_label()))
        .style(if has_file { Style::default().fg(Color::Green) } else { Style::default().fg(Color::DarkGray) })
        .wrap(Wrap { trim: true });
    frame.render_widget(status, status_area);

    let button_style = match app.upload.state() {
        UploadState::Idle => Style::default().bg(Color::Blue).fg(Color::White).bold(),
        UploadState::Uploading => Style::default().bg(Color::DarkGray).fg(Color::Gray).italic(),
    };
    frame.render_widget(
        Paragraph::new(format!(" {} (Ctrl+U) ", app.upload.button_label())).style(button_style),
        button_area,
    );

    if focused && app.notice.is_none() {
        frame.set_cursor_position((path_area.x + cursor_col as u16 + 1, path_area.y + 1));
    }
}

fn render_notice(app: &App, frame: &mut Frame, area: Rect) {
    let Some(notice) = &app.notice else {
        return;
    };

    // Calculate popup size and position (centered)
    let popup_width = 60.min(area.width.saturating_sub(4));
    let popup_height = 7.min(area.height.saturating_sub(2));

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let color = if notice.is_error { Color::Red } else { Color::Green };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(format!(" {} ", notice.title));

    let mut lines: Vec<Line> = literal_text(&notice.body)
        .lines()
        .map(|l| Line::from(l.to_string()))
        .collect();
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "Press any key to continue",
        Style::default().fg(Color::DarkGray),
    )));
    let text = Text::from(lines);

    let popup = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    frame.render_widget(popup, popup_area);
}
