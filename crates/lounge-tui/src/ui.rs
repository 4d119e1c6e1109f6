use chrono::Local;
use lounge_core::ai::gemini::GEMINI_MODEL;
use lounge_core::shortcuts::{AMENITIES, SAMPLE_QUESTIONS};
use lounge_core::ChatRole;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};
use crate::app::{App, FocusPane, InputMode};

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            // Consume the second *
            chars.next();

            // Push any accumulated plain text
            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

            // Find closing **
            let mut bold_text = String::new();
            let mut found_close = false;

            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'*') {
                    chars.next(); // consume second *
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                spans.push(Span::styled(
                    bold_text,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else {
            current_text.push(c);
        }
    }

    // Push any remaining text
    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

/// Headings and bullets on top of inline bold
fn render_markdown_line(text: &str) -> Line<'static> {
    let trimmed = text.trim_start();

    if trimmed.starts_with('#') {
        let heading = trimmed.trim_start_matches('#').trim().replace("**", "");
        return Line::from(Span::styled(
            heading,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));
    }

    let bullet = trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "));
    if let Some(rest) = bullet {
        let indent = " ".repeat(text.len() - trimmed.len());
        let mut spans = vec![Span::raw(format!("{}  • ", indent))];
        spans.extend(parse_markdown_line(rest).spans);
        return Line::from(spans);
    }

    parse_markdown_line(text)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let [header_area, amenity_area, chat_area, samples_area, input_area, footer_area] =
        Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(SAMPLE_QUESTIONS.len() as u16 + 2),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .areas(area);

    render_header(frame, header_area);
    render_amenities(app, frame, amenity_area);
    render_chat(app, frame, chat_area);
    render_samples(app, frame, samples_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);

    if app.toast.is_some() {
        render_toast(app, frame, area);
    }
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" ✈ Lounge Finder ", Style::default().fg(Color::Cyan).bold()),
        Span::styled("AI-powered lounge recommendations", Style::default().fg(Color::White)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_amenities(app: &App, frame: &mut Frame, area: Rect) {
    let busy = app.is_busy();
    let mut spans = Vec::new();

    for (i, label) in AMENITIES.iter().enumerate() {
        let style = if Some(i) == app.selected_amenity {
            Style::default().bg(Color::Magenta).fg(Color::White).bold()
        } else if busy {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::styled(format!(" {} ", i + 1), Style::default().bg(Color::DarkGray).fg(Color::White)));
        spans.push(Span::styled(format!(" {} ", label), style));
        spans.push(Span::raw(" "));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Amenities ");

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store area for mouse hit-testing and inner size for scroll calculations
    app.chat_area = Some(area);
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let border_color = if app.focus == FocusPane::Chat { Color::Cyan } else { Color::DarkGray };
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" Lounge Finder: {} ", GEMINI_MODEL));

    let mut lines: Vec<Line> = Vec::new();

    for msg in app.session.messages() {
        let time = msg.timestamp.with_timezone(&Local).format("%H:%M").to_string();
        let time_span = Span::styled(format!(" {}", time), Style::default().fg(Color::DarkGray));

        match msg.role {
            ChatRole::User => {
                lines.push(Line::from(vec![
                    Span::styled("You:", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
                    time_span,
                ]));
                lines.push(Line::from(msg.content.clone()));
            }
            ChatRole::Assistant => {
                lines.push(Line::from(vec![
                    Span::styled("AI:", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
                    time_span,
                ]));
                // Split response into lines and parse markdown
                for line in msg.content.lines() {
                    lines.push(render_markdown_line(line));
                }
            }
        }
        lines.push(Line::default());
    }

    if app.is_busy() {
        lines.push(Line::from(Span::styled(
            "AI:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_samples(app: &mut App, frame: &mut Frame, area: Rect) {
    app.samples_area = Some(area);

    let focused = app.focus == FocusPane::Samples;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };
    let item_style = if app.is_busy() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Try asking (Tab to focus, Enter to send) ");

    let items: Vec<ListItem> = SAMPLE_QUESTIONS
        .iter()
        .map(|q| ListItem::new(format!(" {} ", q)).style(item_style))
        .collect();

    let mut list = List::new(items).block(block);
    if focused {
        list = list
            .highlight_style(
                Style::default()
                    .bg(Color::Magenta)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
    }

    frame.render_stateful_widget(list, area, &mut app.sample_state);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let busy = app.is_busy();
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if busy {
        Color::DarkGray
    } else if editing || app.focus == FocusPane::Input {
        Color::Yellow
    } else {
        Color::DarkGray
    };

    let title = if busy {
        " Waiting for answer... "
    } else {
        " Ask about airport lounges... "
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Calculate visible portion of input with horizontal scrolling
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.query_cursor;

    // Calculate scroll offset to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .query_input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let text_color = if busy { Color::DarkGray } else { Color::Cyan };
    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(text_color))
        .block(input_block);

    frame.render_widget(input, area);

    // Show cursor when editing
    if editing && !busy {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Editing => " INSERT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    let hints: &[(&str, &str)] = match app.input_mode {
        InputMode::Editing => &[(" Enter ", " send "), (" Esc ", " normal "), (" Ctrl-C ", " quit ")],
        InputMode::Normal => &[
            (" i ", " ask "),
            (" 1-5 ", " amenity "),
            (" l ", " nearby "),
            (" Tab ", " focus "),
            (" j/k ", " scroll "),
            (" q ", " quit "),
        ],
    };
    for (key, label) in hints {
        spans.push(Span::styled(*key, key_style));
        spans.push(Span::styled(*label, label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_toast(app: &App, frame: &mut Frame, area: Rect) {
    let Some(toast) = &app.toast else {
        return;
    };

    let width = area.width.min(50);
    let popup = Rect {
        x: area.x + area.width - width,
        y: area.y + 1,
        width,
        height: area.height.min(4),
    };

    let color = if toast.is_error { Color::Red } else { Color::Green };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(Span::styled(format!(" {} ", toast.title), Style::default().fg(color).bold()));

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(toast.message.as_str())
            .block(block)
            .wrap(Wrap { trim: true }),
        popup,
    );
}
