// memtty: terminal view of a remote memory allocation simulator

use std::fs::File;
use std::io::{self, IsTerminal};
use std::rc::Rc;

use clap::Parser;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use memtty::authority::HttpAuthority;
use memtty::config::Config;
use memtty::message::MessageChannel;
use memtty::sync::SyncController;
use memtty::ui::App;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();

    if !io::stdout().is_terminal() {
        eprintln!("Error: memtty requires a real terminal");
        std::process::exit(1);
    }

    init_logging(&config)?;
    log::info!(
        "connecting to {} (timeout {:?}, polling {:?})",
        config.url,
        config.timeout(),
        config.poll_interval()
    );

    // Single-threaded: refreshes and operations interleave only at awaits
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let local = tokio::task::LocalSet::new();

    let channel = MessageChannel::new(config.history);
    let authority = Rc::new(HttpAuthority::new(config.url.as_str(), config.timeout()));
    let sync = SyncController::new(
        authority,
        channel,
        config.render_options(),
        config.timeout(),
    );
    let mut app = App::new(sync, config.poll_interval());

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = local.block_on(&runtime, app.run(&mut terminal));

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        log::error!("event loop failed: {}", err);
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

/// Send log output to the configured file; the TUI owns stdout and stderr
fn init_logging(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::create(&config.log_file)?;
    let mut builder = pretty_env_logger::formatted_builder();
    builder
        .target(env_logger::Target::Pipe(Box::new(file)))
        .write_style(env_logger::WriteStyle::Never);
    match std::env::var("RUST_LOG") {
        Ok(filters) => {
            builder.parse_filters(&filters);
        }
        Err(_) => {
            builder.filter_level(log::LevelFilter::Info);
        }
    }
    builder.try_init()?;
    Ok(())
}
