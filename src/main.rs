use std::{
    io::stdout,
    time::Duration,
};

use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{
        self,
        Event,
        KeyCode,
        KeyEventKind,
    },
    terminal::{
        disable_raw_mode,
        enable_raw_mode,
        EnterAlternateScreen,
        LeaveAlternateScreen,
    },
    ExecutableCommand,
};
use dircap::{
    FileRecord,
    FolderSnapshot,
    KeeperOptions,
    QuotaKeeper,
    RemovalObserver,
};
use ratatui::{
    self,
    backend::CrosstermBackend,
    layout::{
        Constraint,
        Layout,
    },
    Terminal,
};
use tui_logger::Drain;
use ui::{
    AppLoggerWidget,
    FolderTable,
};

use crate::args::Args;

mod args;
mod ui;
mod utils;

/// Feeds each eviction into the application log stream, where either
/// stderr or the TUI log pane picks it up.
struct LogRemovalObserver;

impl RemovalObserver for LogRemovalObserver {
    fn on_removed(&mut self, folder: &FolderSnapshot, removed: &[FileRecord]) {
        for file in removed {
            log::info!(
                "evicted {} ({}) from {}",
                file.name,
                utils::format_file_size(file.size),
                folder.location.display()
            );
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.ui_logger {
        let tui_log_drain = Drain::new();
        env_logger::builder()
            .format(move |_buf, record| Ok(tui_log_drain.log(record)))
            .init();
    } else {
        env_logger::init();
    }

    if args.folder.is_empty() {
        eprintln!("No folders given. Pass --folder <path>=<max size> at least once.");
        return Ok(());
    }

    let mut folders = Vec::with_capacity(args.folder.len());
    for spec in &args.folder {
        let location = match dunce::canonicalize(&spec.location) {
            Ok(path) => path,
            Err(err) => {
                eprintln!("Invalid folder {}: {:#}", spec.location.display(), err);
                return Ok(());
            }
        };
        folders.push((location, spec.max_size));
    }

    let keeper = QuotaKeeper::new(
        Duration::from_secs(args.interval),
        KeeperOptions {
            strategy: args.strategy.create(),
            removal_observer: Box::new(LogRemovalObserver),
            extensions: if args.ext.is_empty() {
                None
            } else {
                Some(args.ext.clone())
            },
            ..Default::default()
        },
    );
    keeper.start().context("failed to start the folder keeper")?;

    for (location, max_size) in &folders {
        match keeper.add_folder(location, *max_size) {
            Ok(()) => log::debug!(
                "managing {} (max {})",
                location.display(),
                if *max_size == 0 {
                    "unlimited".to_string()
                } else {
                    utils::format_file_size(*max_size)
                }
            ),
            Err(err) => log::warn!("cannot manage {}: {}", location.display(), err),
        }
    }

    stdout().execute(EnterAlternateScreen)?;
    enable_raw_mode()?;

    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.clear()?;

    let mut view = FolderTable::new(
        folders
            .iter()
            .map(|(location, _)| location.clone())
            .collect(),
    );

    loop {
        terminal.draw(|frame| {
            if args.ui_logger {
                let layout =
                    Layout::horizontal(&[Constraint::Percentage(50), Constraint::Percentage(50)])
                        .split(frame.size());

                frame.render_widget(&view, layout[0]);
                frame.render_widget(AppLoggerWidget, layout[1]);
            } else {
                frame.render_widget(&view, frame.size());
            }
        })?;

        view.poll(&keeper);

        if event::poll(std::time::Duration::from_millis(16))? {
            let event = event::read()?;
            view.handle_event(&event, &keeper);
            if let Event::Key(key) = event {
                if key.kind == KeyEventKind::Press && key.code == KeyCode::Char('q') {
                    break;
                }
            }
        }
    }

    stdout().execute(LeaveAlternateScreen)?;
    disable_raw_mode()?;

    keeper.stop().context("failed to stop the folder keeper")?;
    Ok(())
}
