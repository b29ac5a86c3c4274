mod app;
mod ui;

use std::io;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use noxo::{DEFAULT_HOST, DEFAULT_PORT, Session};

use app::App;

#[derive(Parser)]
#[command(name = "noxo")]
#[command(about = "Recursive noughts and crosses")]
struct Args {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Two players sharing this terminal
    Local,
    /// Host a game and wait for one opponent
    Host {
        #[arg(short, long, default_value = DEFAULT_HOST)]
        bind: String,

        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },
    /// Join a hosted game
    Join {
        #[arg(short, long, default_value = DEFAULT_HOST)]
        addr: String,

        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error")).init();
    let args = Args::parse();

    let session = match &args.mode {
        Mode::Local => None,
        Mode::Host { bind, port } => Some(Session::host((bind.as_str(), *port))?),
        Mode::Join { addr, port } => Some(Session::join((addr.as_str(), *port))?),
    };

    let mut app = App::new(session);
    run_tui(&mut app)?;
    Ok(())
}

fn run_tui(app: &mut App) -> io::Result<()> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    while !app.should_quit() {
        app.drain_session();

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key.code);
                }
            }
        }

        terminal.draw(|frame| ui::render(frame, app))?;
    }

    app.close_session();

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)?;
    Ok(())
}
