use std::{
    path::PathBuf,
    time::{
        Duration,
        Instant,
    },
};

use crossterm::event::{
    Event,
    KeyCode,
    KeyEventKind,
};
use dircap::{
    FolderSnapshot,
    QuotaKeeper,
};
use ratatui::{
    buffer::Buffer,
    layout::{
        Alignment,
        Constraint,
        Layout,
        Rect,
    },
    style::Stylize,
    text::{
        Line,
        Span,
        Text,
    },
    widgets::{
        Cell,
        Paragraph,
        Row,
        Table,
        Widget,
    },
};

use crate::utils::{
    format_duration,
    format_file_size,
};

/// How often the snapshots behind the table are re-fetched.
const REFRESH_INTERVAL: Duration = Duration::from_secs(1);

struct FolderRow {
    location: PathBuf,
    snapshot: Option<FolderSnapshot>,
    error: Option<String>,
}

pub struct FolderTable {
    rows: Vec<FolderRow>,
    cursor: usize,

    time_started: Instant,
    last_refresh: Option<Instant>,
}

impl FolderTable {
    pub fn new(locations: Vec<PathBuf>) -> Self {
        Self {
            rows: locations
                .into_iter()
                .map(|location| FolderRow {
                    location,
                    snapshot: None,
                    error: None,
                })
                .collect(),
            cursor: 0,

            time_started: Instant::now(),
            last_refresh: None,
        }
    }

    pub fn poll(&mut self, keeper: &QuotaKeeper) {
        if self
            .last_refresh
            .map_or(false, |at| at.elapsed() < REFRESH_INTERVAL)
        {
            return;
        }
        self.last_refresh = Some(Instant::now());

        for row in &mut self.rows {
            match keeper.get_folder(&row.location) {
                Ok(snapshot) => {
                    row.snapshot = Some(snapshot);
                    row.error = None;
                }
                Err(err) => {
                    row.error = Some(err.to_string());
                }
            }
        }
    }

    pub fn handle_event(&mut self, event: &Event, keeper: &QuotaKeeper) {
        let Event::Key(key) = event else { return };

        if key.code == KeyCode::Down
            && matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat)
            && self.cursor + 1 < self.rows.len()
        {
            self.cursor += 1;
        }

        if key.code == KeyCode::Up
            && matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat)
            && self.cursor > 0
        {
            self.cursor -= 1;
        }

        if key.code == KeyCode::Char('r') && key.kind == KeyEventKind::Press {
            if let Some(row) = self.rows.get(self.cursor) {
                log::info!("rechecking {}", row.location.display());
                if let Err(err) = keeper.recheck_folder(&row.location) {
                    log::warn!("recheck of {} failed: {}", row.location.display(), err);
                }
                self.last_refresh = None;
            }
        }
    }
}

impl Widget for &FolderTable {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        let layout = Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).split(area);

        let rows = self
            .rows
            .iter()
            .enumerate()
            .map(|(index, folder)| {
                let (used, quota, state) = match (&folder.snapshot, &folder.error) {
                    (_, Some(error)) => ("-".to_string(), "-".to_string(), error.clone()),
                    (Some(snapshot), None) => (
                        format_file_size(snapshot.current_size),
                        if snapshot.max_size == 0 {
                            "unlimited".to_string()
                        } else {
                            format_file_size(snapshot.max_size)
                        },
                        "watching".to_string(),
                    ),
                    (None, None) => ("waiting".to_string(), String::new(), String::new()),
                };

                let row = Row::new(vec![
                    Cell::new(format!("{}", folder.location.display())),
                    Cell::new(Text::from(used).alignment(Alignment::Right)),
                    Cell::new(Text::from(quota).alignment(Alignment::Right)),
                    Cell::new(state),
                ]);
                if index == self.cursor {
                    row.on_gray()
                } else {
                    row
                }
            })
            .collect::<Vec<_>>();

        let table = Table::new(
            rows,
            &[
                Constraint::Fill(1),
                Constraint::Length(12),
                Constraint::Length(12),
                Constraint::Length(28),
            ],
        )
        .header(Row::new(vec![
            Cell::new("Folder"),
            Cell::new(Text::from("Used").alignment(Alignment::Right)),
            Cell::new(Text::from("Quota").alignment(Alignment::Right)),
            Cell::new("State"),
        ]));

        let footer = {
            let size_total = self
                .rows
                .iter()
                .filter_map(|row| row.snapshot.as_ref())
                .map(|snapshot| snapshot.current_size)
                .sum::<u64>();

            Paragraph::new(Line::from_iter([
                Span::raw(format_duration(&self.time_started.elapsed())),
                Span::raw(format!(
                    " | {} folders, {} managed",
                    self.rows.len(),
                    format_file_size(size_total),
                )),
                Span::raw(" | [r] recheck  [q] quit").italic(),
            ]))
        };

        table.render(layout[0], buf);
        footer.render(layout[1], buf);
    }
}
