//! Main TUI application state and event loop
//!
//! The loop never blocks on the network. Refreshes and operations run as
//! local tasks on the same thread and make progress while the loop sleeps
//! between frames; their outcomes arrive through the message channel and
//! the sync controller's snapshot.

use super::command::{parse_command, Command};
use super::panes::{self, StatusLine};
use crate::authority::Authority;
use crate::dispatch::Dispatcher;
use crate::message::{MessageChannel, Severity};
use crate::sync::SyncController;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};

const FRAME_INTERVAL: Duration = Duration::from_millis(50);

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Blocks,
    Messages,
}

impl FocusedPane {
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Blocks => FocusedPane::Messages,
            FocusedPane::Messages => FocusedPane::Blocks,
        }
    }
}

/// The main application state
pub struct App<A> {
    sync: SyncController<A>,
    dispatcher: Dispatcher<A>,
    channel: MessageChannel,

    /// Background refresh interval, `None` to refresh only on demand
    poll_interval: Option<Duration>,
    last_poll: Instant,

    pub focused_pane: FocusedPane,
    pub table_scroll: usize,
    pub message_scroll: usize,

    /// Command line buffer while in input mode
    pub input: Option<String>,

    /// Whether the app should quit
    pub should_quit: bool,
}

impl<A: Authority + 'static> App<A> {
    pub fn new(sync: SyncController<A>, poll_interval: Option<Duration>) -> Self {
        let dispatcher = Dispatcher::new(sync.clone());
        let channel = sync.channel().clone();
        App {
            sync,
            dispatcher,
            channel,
            poll_interval,
            last_poll: Instant::now(),
            focused_pane: FocusedPane::Blocks,
            table_scroll: 0,
            message_scroll: usize::MAX,
            input: None,
            should_quit: false,
        }
    }

    /// Run the TUI application
    ///
    /// Must be awaited inside a [`tokio::task::LocalSet`].
    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        self.spawn_refresh();

        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if let Some(interval) = self.poll_interval {
                if self.last_poll.elapsed() >= interval {
                    self.spawn_refresh();
                }
            }

            // Zero timeout keeps local tasks running between frames
            while event::poll(Duration::ZERO)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }

            tokio::time::sleep(FRAME_INTERVAL).await;
        }

        Ok(())
    }

    /// Render the UI
    fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        // Bar on top, table and side column in the middle, status bar at bottom
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(7),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(size);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(main_chunks[1]);

        let right_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(6), Constraint::Min(0)])
            .split(columns[1]);

        let visual = self.sync.frame();
        let messages = self.channel.history();

        panes::render_bar_pane(frame, main_chunks[0], &visual);
        panes::render_table_pane(
            frame,
            columns[0],
            &visual,
            self.focused_pane == FocusedPane::Blocks,
            &mut self.table_scroll,
        );
        panes::render_usage_pane(frame, right_rows[0], &visual);
        panes::render_messages_pane(
            frame,
            right_rows[1],
            &messages,
            self.focused_pane == FocusedPane::Messages,
            &mut self.message_scroll,
        );

        panes::render_status_bar(
            frame,
            main_chunks[2],
            StatusLine {
                latest: messages.last(),
                input: self.input.as_deref(),
                generation: self.sync.generation(),
                refreshing: self.sync.is_refreshing(),
                pending: self.dispatcher.pending().map(|k| k.name()),
            },
        );
    }

    /// Handle keyboard events
    fn handle_key_event(&mut self, key: KeyEvent) {
        if self.input.is_some() {
            self.handle_input_key(key);
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            KeyCode::Char(':') | KeyCode::Char('i') => {
                self.input = Some(String::new());
            }
            KeyCode::Char('c') => {
                self.input = Some("cr ".to_string());
            }
            KeyCode::Char('d') => {
                self.input = Some("dl ".to_string());
            }
            KeyCode::Char('v') => {
                self.input = Some("cv ".to_string());
            }
            KeyCode::Char('r') => {
                self.spawn_refresh();
            }
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::Up => match self.focused_pane {
                FocusedPane::Blocks => {
                    self.table_scroll = self.table_scroll.saturating_sub(1);
                }
                FocusedPane::Messages => {
                    self.message_scroll = self.message_scroll.saturating_sub(1);
                }
            },
            KeyCode::Down => match self.focused_pane {
                FocusedPane::Blocks => {
                    self.table_scroll = self.table_scroll.saturating_add(1);
                }
                FocusedPane::Messages => {
                    self.message_scroll = self.message_scroll.saturating_add(1);
                }
            },
            _ => {}
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.input = None;
            }
            KeyCode::Enter => {
                if let Some(line) = self.input.take() {
                    self.execute_line(&line);
                }
            }
            KeyCode::Backspace => {
                if let Some(input) = self.input.as_mut() {
                    input.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(input) = self.input.as_mut() {
                    input.push(c);
                }
            }
            _ => {}
        }
    }

    fn execute_line(&mut self, line: &str) {
        match parse_command(line) {
            Ok(command) => self.execute(command),
            Err(e) => self.channel.report(e.to_string(), Severity::Error),
        }
    }

    fn execute(&mut self, command: Command) {
        // New outcomes should be visible
        self.message_scroll = usize::MAX;

        match command {
            Command::Create {
                pid,
                size,
                strategy,
            } => {
                let dispatcher = self.dispatcher.clone();
                tokio::task::spawn_local(async move {
                    let _ = dispatcher.create(pid, size, strategy).await;
                });
            }
            Command::Delete { pid } => {
                let dispatcher = self.dispatcher.clone();
                tokio::task::spawn_local(async move {
                    let _ = dispatcher.delete(pid).await;
                });
            }
            Command::Convert { scheme } => {
                let dispatcher = self.dispatcher.clone();
                tokio::task::spawn_local(async move {
                    let _ = dispatcher.convert(scheme).await;
                });
            }
            Command::Translate { pid, address } => {
                match self.sync.snapshot().translate(pid, address) {
                    Ok(physical) => self.channel.report(
                        format!(
                            "PID {}: virtual {} -> physical address {}",
                            pid, address, physical
                        ),
                        Severity::Info,
                    ),
                    Err(e) => self.channel.report(e.to_string(), Severity::Error),
                }
            }
            Command::Refresh => self.spawn_refresh(),
            Command::Quit => self.should_quit = true,
        }
    }

    /// Start a refresh in the background; failures are reported by the controller
    fn spawn_refresh(&mut self) {
        self.last_poll = Instant::now();
        let sync = self.sync.clone();
        tokio::task::spawn_local(async move {
            let _ = sync.refresh().await;
        });
    }
}
