use crate::app::{App, Command, Tab};
use crate::composer::Phase;
use crate::models::{DraftStatus, EmailDraft, EmailType, GenerateRequest, Tone};
use crate::settings::{SettingsField, SettingsForm, SettingsSection};
use crate::stats;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Clear, Dataset, GraphType, List,
        ListItem, ListState, Paragraph, Tabs, Wrap,
    },
};
use tui_textarea::TextArea;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum ComposeField {
    Type,
    #[default]
    Recipient,
    Tone,
    Prompt,
    Body,
}

impl ComposeField {
    const ORDER: [ComposeField; 5] = [
        ComposeField::Type,
        ComposeField::Recipient,
        ComposeField::Tone,
        ComposeField::Prompt,
        ComposeField::Body,
    ];

    fn step(self, forward: bool, has_draft: bool) -> Self {
        // Body only exists once something has been generated
        let order = Self::ORDER;
        let fields = if has_draft { &order[..] } else { &order[..4] };
        let len = fields.len();
        let i = fields.iter().position(|f| *f == self).unwrap_or(0);
        let next = if forward { (i + 1) % len } else { (i + len - 1) % len };
        fields[next]
    }
}

pub struct ComposeState {
    pub recipient: TextArea<'static>,
    pub prompt: TextArea<'static>,
    pub body: TextArea<'static>,
    pub tone: Tone,
    pub email_type: EmailType,
    pub focused_field: ComposeField,
}

impl ComposeState {
    pub fn new(default_tone: Tone) -> Self {
        let mut recipient = TextArea::default();
        recipient.set_placeholder_text("recipient@example.com");
        let mut state = Self {
            recipient,
            prompt: TextArea::default(),
            body: TextArea::default(),
            tone: default_tone,
            email_type: EmailType::General,
            focused_field: ComposeField::default(),
        };
        state.refresh_placeholder();
        state
    }

    pub fn refresh_placeholder(&mut self) {
        let hint = match self.email_type {
            EmailType::Meeting => {
                "Describe the meeting purpose, suggested times, and any relevant details..."
            }
            EmailType::General => "Describe what your email should be about...",
        };
        self.prompt.set_placeholder_text(hint);
    }

    pub fn request(&self) -> GenerateRequest {
        GenerateRequest {
            prompt: self.prompt.lines().join("\n"),
            recipient: self.recipient.lines().join("").trim().to_string(),
            tone: self.tone,
            email_type: self.email_type,
        }
    }

    pub fn body_text(&self) -> String {
        self.body.lines().join("\n")
    }

    pub fn set_body(&mut self, content: &str) {
        let mut body = TextArea::from(content.lines());
        body.set_placeholder_text("Edit the generated email before sending...");
        self.body = body;
    }

    pub fn next_field(&mut self, has_draft: bool) {
        self.focused_field = self.focused_field.step(true, has_draft);
    }

    pub fn prev_field(&mut self, has_draft: bool) {
        self.focused_field = self.focused_field.step(false, has_draft);
    }

    /// Moves focus off the body once there is no draft to edit.
    pub fn clamp_focus(&mut self, has_draft: bool) {
        if !has_draft && self.focused_field == ComposeField::Body {
            self.focused_field = ComposeField::Prompt;
        }
    }
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    }
}

fn status_style(status: DraftStatus) -> Style {
    match status {
        DraftStatus::Sent => Style::default().fg(Color::Green),
        DraftStatus::Failed => Style::default().fg(Color::Red),
        DraftStatus::Draft => Style::default().fg(Color::Yellow),
    }
}

fn tone_color(tone: Option<Tone>) -> Color {
    match tone {
        Some(Tone::Formal) => Color::Gray,
        Some(Tone::Casual) => Color::Green,
        Some(Tone::Friendly) => Color::Yellow,
        Some(Tone::Apologetic) => Color::LightRed,
        Some(Tone::Persuasive) => Color::Magenta,
        Some(Tone::Urgent) => Color::Red,
        None => Color::DarkGray,
    }
}

pub fn render(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tabs
            Constraint::Min(10),   // Active view
            Constraint::Length(1), // Status line
        ])
        .split(f.area());

    let titles: Vec<Line> = Tab::ALL
        .iter()
        .enumerate()
        .map(|(i, t)| Line::from(format!(" F{} {} ", i + 1, t.title())))
        .collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" AI Email Assistant "),
        )
        .select(app.tab.index())
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(tabs, chunks[0]);

    match app.tab {
        Tab::Compose => render_compose(f, app, chunks[1]),
        Tab::History => render_history(f, app, chunks[1]),
        Tab::Stats => render_stats(f, app, chunks[1]),
        Tab::Settings => render_settings(f, &app.settings, chunks[1]),
    }

    let status = if let Some(pending) = app.pending {
        Span::styled(pending, Style::default().fg(Color::Cyan))
    } else if let Some(ref message) = app.status_message {
        Span::styled(message.as_str(), Style::default().fg(Color::White))
    } else {
        Span::styled(
            "Ctrl-N/Ctrl-P switch tabs · Ctrl-Q quit",
            Style::default().fg(Color::DarkGray),
        )
    };
    f.render_widget(Paragraph::new(Line::from(status)), chunks[2]);
}

fn render_compose(f: &mut Frame, app: &mut App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let form = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Type
            Constraint::Length(3), // Recipient
            Constraint::Length(3), // Tone
            Constraint::Min(5),    // Prompt
            Constraint::Length(3), // Generate hint
        ])
        .split(columns[0]);

    let cs = &mut app.compose;
    let focused = cs.focused_field;

    let type_line = Line::from(
        [EmailType::General, EmailType::Meeting]
            .iter()
            .map(|t| {
                let label = if *t == EmailType::General {
                    " General Email "
                } else {
                    " Meeting Request "
                };
                if *t == cs.email_type {
                    Span::styled(
                        label,
                        Style::default()
                            .fg(Color::Black)
                            .bg(Color::Green)
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    Span::raw(label)
                }
            })
            .collect::<Vec<_>>(),
    );
    f.render_widget(
        Paragraph::new(type_line).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Email Type ")
                .border_style(focus_style(focused == ComposeField::Type)),
        ),
        form[0],
    );

    let text_areas = [
        (&mut cs.recipient, ComposeField::Recipient, " Recipient Email ", form[1]),
        (&mut cs.prompt, ComposeField::Prompt, " Email Context ", form[3]),
    ];
    for (textarea, field, title, rect) in text_areas {
        let is_focused = focused == field;
        textarea.set_cursor_line_style(Style::default());
        textarea.set_cursor_style(if is_focused {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        });
        textarea.set_block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(focus_style(is_focused)),
        );
        f.render_widget(&*textarea, rect);
    }

    let tone_line = Line::from(
        Tone::ALL
            .iter()
            .map(|t| {
                let label = format!(" {} ", t.label());
                if *t == cs.tone {
                    Span::styled(
                        label,
                        Style::default()
                            .fg(Color::Black)
                            .bg(tone_color(Some(*t)))
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    Span::styled(label, Style::default().fg(tone_color(Some(*t))))
                }
            })
            .collect::<Vec<_>>(),
    );
    f.render_widget(
        Paragraph::new(tone_line).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Tone ")
                .border_style(focus_style(focused == ComposeField::Tone)),
        ),
        form[2],
    );

    let request = cs.request();
    let in_flight = app.pending;
    let hint = match in_flight {
        Some(label) if label == Command::Generate.pending_label() => {
            Span::styled("Generating...", Style::default().fg(Color::Cyan))
        }
        _ if crate::composer::Composer::can_generate(&request) => Span::styled(
            "Ctrl-G Generate Email",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        _ => Span::styled(
            "Fill in recipient and context to generate",
            Style::default().fg(Color::DarkGray),
        ),
    };
    f.render_widget(
        Paragraph::new(Line::from(hint)).block(Block::default().borders(Borders::ALL)),
        form[4],
    );

    // Generated email
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(3)])
        .split(columns[1]);

    if app.composer.current.is_some() {
        let is_focused = focused == ComposeField::Body;
        let title = match app.composer.current_id() {
            Some(id) => format!(" Generated Email (draft #{}) [Ctrl-S Send, Ctrl-D Discard] ", id),
            None => " Generated Email ".to_string(),
        };
        cs.body.set_cursor_line_style(Style::default());
        cs.body.set_cursor_style(if is_focused {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        });
        cs.body.set_block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(focus_style(is_focused)),
        );
        f.render_widget(&cs.body, right[0]);
    } else {
        let placeholder = Paragraph::new(
            "Your generated email will appear here.\n\nPick a type and tone, describe the email, then press Ctrl-G.",
        )
        .style(Style::default().fg(Color::DarkGray))
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Generated Email "),
        );
        f.render_widget(placeholder, right[0]);
    }

    let sending = in_flight == Some(Command::Send.pending_label());
    let (message, style) = match (app.composer.phase, app.composer.message.as_deref()) {
        _ if sending => ("Sending...", Style::default().fg(Color::Cyan)),
        (Phase::Sent, Some(m)) => (m, Style::default().fg(Color::Green)),
        (_, Some(m)) => (m, Style::default().fg(Color::Red)),
        (_, None) => ("", Style::default()),
    };
    f.render_widget(
        Paragraph::new(message)
            .style(style)
            .block(Block::default().borders(Borders::ALL)),
        right[1],
    );
}

fn render_history(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5)])
        .split(area);

    let emails = &app.store.emails;
    let view = &app.history;
    let visible = view.visible(emails);

    let search_style = if view.editing_search {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let search_text = if view.filter.search.is_empty() && !view.editing_search {
        Span::styled("Search emails... (/)", Style::default().fg(Color::DarkGray))
    } else {
        Span::styled(format!("{}▏", view.filter.search), search_style)
    };
    let filters = Line::from(vec![
        search_text,
        Span::raw("   "),
        Span::styled(
            format!("[s] status: {}", view.filter.status.label()),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw("  "),
        Span::styled(
            format!("[t] tone: {}", view.filter.tone.label()),
            Style::default().fg(Color::Magenta),
        ),
    ]);
    f.render_widget(
        Paragraph::new(filters).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Email History ")
                .title_bottom(format!(" {} of {} emails ", visible.len(), emails.len())),
        ),
        chunks[0],
    );

    let list_block = Block::default()
        .borders(Borders::ALL)
        .title(" Enter view · d delete · r refresh · Esc clear filters ");

    if visible.is_empty() {
        let text = if emails.is_empty() {
            "No emails yet. Generate one from the Compose tab."
        } else {
            "No emails match the current filters."
        };
        f.render_widget(
            Paragraph::new(text)
                .style(Style::default().fg(Color::DarkGray))
                .block(list_block),
            chunks[1],
        );
    } else {
        let width = chunks[1].width.saturating_sub(4) as usize;
        let items: Vec<ListItem> = visible
            .iter()
            .enumerate()
            .map(|(i, email)| history_item(email, i == view.selected, width))
            .collect();
        let mut state = ListState::default();
        state.select(Some(view.selected));
        f.render_stateful_widget(List::new(items).block(list_block), chunks[1], &mut state);
    }

    let viewing = view.viewing.and_then(|id| app.store.get(id)).cloned();
    if let Some(email) = viewing {
        render_email_modal(f, &email);
    }
}

fn history_item(email: &EmailDraft, selected: bool, width: usize) -> ListItem<'static> {
    let indicator = if selected { "█ " } else { "  " };
    let mut header = vec![
        Span::raw(indicator),
        Span::styled(format!("{:<7}", email.status.as_str()), status_style(email.status)),
        Span::styled(
            format!("{:<11}", email.tone),
            Style::default().fg(tone_color(email.known_tone())),
        ),
    ];
    if email.email_type == EmailType::Meeting {
        header.push(Span::styled("Meeting ", Style::default().fg(Color::Blue)));
    }
    header.push(Span::styled(
        format!("To: {}", email.recipient),
        if selected {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        },
    ));

    let mut dates = format!("  Created {}", email.created_display());
    if let Some(sent) = email.sent_display() {
        dates.push_str(&format!(" · Sent {}", sent));
    }
    let preview = truncate(&format!("  {}", email.prompt.replace('\n', " ")), width);

    ListItem::new(vec![
        Line::from(header),
        Line::styled(dates, Style::default().fg(Color::DarkGray)),
        Line::from(preview),
    ])
}

fn truncate(s: &str, len: usize) -> String {
    if s.chars().count() > len {
        let truncated: String = s.chars().take(len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    } else {
        s.to_string()
    }
}

fn render_email_modal(f: &mut Frame, email: &EmailDraft) {
    let area = centered_rect(80, 80, f.area());
    f.render_widget(Clear, area);

    let label = Style::default().fg(Color::DarkGray);
    let mut lines = vec![
        Line::from(vec![
            Span::styled("To:       ", label),
            Span::raw(email.recipient.clone()),
        ]),
    ];
    if let Some(subject) = &email.subject {
        lines.push(Line::from(vec![
            Span::styled("Subject:  ", label),
            Span::raw(subject.clone()),
        ]));
    }
    lines.push(Line::from(vec![
        Span::styled("Status:   ", label),
        Span::styled(email.status.as_str(), status_style(email.status)),
        Span::styled("   Tone: ", label),
        Span::styled(
            email.tone_label(),
            Style::default().fg(tone_color(email.known_tone())),
        ),
        Span::styled("   Type: ", label),
        Span::raw(email.email_type.as_str()),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Created:  ", label),
        Span::raw(email.created_display()),
    ]));
    if let Some(sent) = email.sent_display() {
        lines.push(Line::from(vec![
            Span::styled("Sent:     ", label),
            Span::raw(sent),
        ]));
    }
    lines.push(Line::raw(""));
    lines.push(Line::styled("Original Prompt", label.add_modifier(Modifier::BOLD)));
    for l in clean_body(&email.prompt).lines() {
        lines.push(Line::raw(l.to_string()));
    }
    lines.push(Line::raw(""));
    lines.push(Line::styled("Content", label.add_modifier(Modifier::BOLD)));
    for l in clean_body(&email.content).lines() {
        lines.push(Line::raw(l.to_string()));
    }

    let block = Block::default()
        .title(format!(" Email #{} [Esc to close] ", email.id))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    f.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn render_stats(f: &mut Frame, app: &App, area: Rect) {
    let data = &app.store.stats;
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),  // Cards
            Constraint::Min(8),     // Monthly + tones
            Constraint::Length(10), // Trend
            Constraint::Length(5),  // Insights
        ])
        .split(area);

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(25); 4])
        .split(rows[0]);
    let card_data = [
        ("Total Sent", data.total_sent.to_string(), "Emails delivered", Color::Green),
        ("Total Drafts", data.total_drafts.to_string(), "Emails generated", Color::Magenta),
        ("Success Rate", stats::success_label(data), "Delivery success", Color::Cyan),
        ("Recent Activity", data.recent_activity.to_string(), "Last 7 days", Color::Yellow),
    ];
    for ((title, value, subtitle, color), rect) in card_data.into_iter().zip(cards.iter()) {
        let card = Paragraph::new(vec![
            Line::styled(value, Style::default().fg(color).add_modifier(Modifier::BOLD)),
            Line::styled(subtitle, Style::default().fg(Color::DarkGray)),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", title)),
        );
        f.render_widget(card, *rect);
    }

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(rows[1]);

    let mut monthly = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Monthly Activity (sent / drafts) "),
        )
        .bar_width(3)
        .bar_gap(1)
        .group_gap(3);
    for m in &data.monthly_stats {
        let bars = [
            Bar::default()
                .value(m.sent)
                .style(Style::default().fg(Color::Magenta)),
            Bar::default()
                .value(m.drafts)
                .style(Style::default().fg(Color::Cyan)),
        ];
        monthly = monthly.data(
            BarGroup::default()
                .label(Line::from(m.month.clone()))
                .bars(&bars),
        );
    }
    f.render_widget(monthly, middle[0]);

    let shares = stats::tone_breakdown(data);
    let bar_room = middle[1].width.saturating_sub(20) as f64;
    let tone_lines: Vec<Line> = if shares.is_empty() {
        vec![Line::styled("No data available", Style::default().fg(Color::DarkGray))]
    } else {
        shares
            .iter()
            .map(|share| {
                let filled = (bar_room * share.percent / 100.0).round() as usize;
                Line::from(vec![
                    Span::raw(format!("{:<11}", share.name)),
                    Span::styled("█".repeat(filled), Style::default().fg(Color::Magenta)),
                    Span::raw(format!(" {:.0}%", share.percent)),
                ])
            })
            .collect()
    };
    f.render_widget(
        Paragraph::new(tone_lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Popular Tones "),
        ),
        middle[1],
    );

    let sent: Vec<(f64, f64)> = data
        .monthly_stats
        .iter()
        .enumerate()
        .map(|(i, m)| (i as f64, m.sent as f64))
        .collect();
    let drafts: Vec<(f64, f64)> = data
        .monthly_stats
        .iter()
        .enumerate()
        .map(|(i, m)| (i as f64, m.drafts as f64))
        .collect();
    let peak = stats::monthly_peak(data).max(1) as f64;
    let last = data.monthly_stats.len().saturating_sub(1).max(1) as f64;
    let x_labels: Vec<Span> = match (data.monthly_stats.first(), data.monthly_stats.last()) {
        (Some(first), Some(last_month)) => vec![
            Span::raw(first.month.clone()),
            Span::raw(last_month.month.clone()),
        ],
        _ => vec![],
    };
    let datasets = vec![
        Dataset::default()
            .name("Sent Emails")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Magenta))
            .data(&sent),
        Dataset::default()
            .name("Generated Drafts")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Cyan))
            .data(&drafts),
    ];
    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Trend Analysis "),
        )
        .x_axis(Axis::default().bounds([0.0, last]).labels(x_labels))
        .y_axis(
            Axis::default()
                .bounds([0.0, peak])
                .labels(vec![Span::raw("0"), Span::raw(format!("{}", peak as u64))]),
        );
    f.render_widget(chart, rows[2]);

    let activity = stats::ActivityLevel::from_recent(data.recent_activity);
    let insights = vec![
        Line::from(vec![
            Span::styled("Most Popular Tone  ", Style::default().fg(Color::DarkGray)),
            Span::raw(stats::top_tone_summary(data)),
        ]),
        Line::from(vec![
            Span::styled("Delivery Rate      ", Style::default().fg(Color::DarkGray)),
            Span::raw(format!(
                "{} of emails successfully delivered",
                stats::success_label(data)
            )),
        ]),
        Line::from(vec![
            Span::styled("Activity Level     ", Style::default().fg(Color::DarkGray)),
            Span::raw(format!("{} activity in recent days", activity.label())),
        ]),
    ];
    f.render_widget(
        Paragraph::new(insights).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Insights [r refresh] "),
        ),
        rows[3],
    );
}

fn settings_field_lines(form: &SettingsForm, field: SettingsField) -> Vec<Line<'static>> {
    let s = &form.draft;
    let focused = form.field == field;
    let marker = if focused { "▶" } else { " " };

    if field.is_toggle() {
        let n = &s.notification_preferences;
        let on = match field {
            SettingsField::AutoSave => s.auto_save_drafts,
            SettingsField::NotifySent => n.email_sent,
            SettingsField::NotifyDraftSaved => n.draft_saved,
            _ => n.generation_complete,
        };
        return vec![Line::from(vec![
            Span::styled(format!("{} ", marker), focus_style(focused)),
            Span::raw(if on { "[x] " } else { "[ ] " }),
            Span::styled(field.label(), focus_style(focused)),
        ])];
    }

    let value = match field {
        SettingsField::SmtpHost => s.smtp_host.clone(),
        SettingsField::SmtpPort => s.smtp_port.to_string(),
        SettingsField::SmtpUsername => s.smtp_username.clone(),
        SettingsField::SmtpPassword => "•".repeat(s.smtp_password.chars().count()),
        SettingsField::DefaultTone => format!("◀ {} ▶", s.default_tone.label()),
        _ => String::new(),
    };
    let head = |value: String| {
        Line::from(vec![
            Span::styled(format!("{} {:<10}", marker, field.label()), focus_style(focused)),
            Span::raw(value),
        ])
    };

    if field != SettingsField::Signature {
        return vec![head(value)];
    }
    // Continuation lines line up under the first
    let mut signature = s.email_signature.lines();
    let mut lines = vec![head(signature.next().unwrap_or("").to_string())];
    lines.extend(signature.map(|line| Line::raw(format!("{:13}{}", "", line))));
    lines
}

fn render_settings(f: &mut Frame, form: &SettingsForm, area: Rect) {
    let sections: Vec<(SettingsSection, Vec<Line>)> = SettingsSection::ALL
        .into_iter()
        .map(|section| {
            let lines = section
                .fields()
                .flat_map(|field| settings_field_lines(form, field))
                .collect();
            (section, lines)
        })
        .collect();

    let mut constraints: Vec<Constraint> = sections
        .iter()
        .map(|(_, lines)| Constraint::Length(lines.len() as u16 + 2))
        .collect();
    constraints.push(Constraint::Min(4)); // Security
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, (section, lines)) in sections.into_iter().enumerate() {
        f.render_widget(
            Paragraph::new(lines).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(section.title()),
            ),
            rows[i],
        );
    }

    let footer = if form.is_dirty() {
        "Unsaved changes · Ctrl-S Save Settings · Esc revert"
    } else {
        "Ctrl-S Save Settings · Tab/arrows move"
    };
    f.render_widget(
        Paragraph::new(vec![
            Line::raw(
                "The SMTP password is kept in the system keyring, never in settings.toml. Prefer app-specific passwords.",
            ),
            Line::styled(footer, Style::default().fg(Color::DarkGray)),
        ])
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" Security ")),
        rows[SettingsSection::ALL.len()],
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Normalizes line endings, trims trailing whitespace and collapses runs of
/// blank lines to one. Generated bodies arrive with all of these.
fn clean_body(body: &str) -> String {
    let normalized = body.replace("\r\n", "\n").replace('\r', "\n");
    let mut result = String::with_capacity(normalized.len());
    let mut blank_run = 0;

    for line in normalized.split('\n') {
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            blank_run += 1;
            continue;
        }
        if !result.is_empty() {
            let newlines = std::cmp::min(blank_run + 1, 2);
            for _ in 0..newlines {
                result.push('\n');
            }
        }
        result.push_str(trimmed);
        blank_run = 0;
    }

    result
}
