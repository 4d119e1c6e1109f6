mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use lounge_core::{
    ChatSession, Config, FixedLocator, GeminiClient, GeoShortcut, IpLocator, Locator,
    ReverseGeocoder, SendOutcome,
};

use app::App;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "lounge-finder")]
#[command(version, about = "Ask questions about airport lounges, answered by Gemini")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask one question and print the answer
    Ask {
        /// Your question
        question: String,
    },
    /// Find lounges near your current location
    Nearby,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().context("Failed to load config")?;
    let log_path = logging::init_tracing(config.log_level())?;
    tracing::info!(log = %log_path.display(), "starting lounge-finder");

    let api_key = config.api_key()?;
    let session = ChatSession::new(Arc::new(GeminiClient::new(&api_key)));

    let locator: Box<dyn Locator> = match config.location {
        Some(coords) => Box::new(FixedLocator(coords)),
        None => Box::new(IpLocator::new()),
    };
    let geo = GeoShortcut::new(locator, ReverseGeocoder::new());

    match cli.command {
        None => run_tui(session, geo).await,
        Some(Commands::Ask { question }) => ask(&session, &question).await,
        Some(Commands::Nearby) => {
            let nearby = geo.resolve().await?;
            eprintln!("Searching for lounges near {}", nearby.place);
            ask(&session, &nearby.question).await
        }
    }
}

async fn ask(session: &ChatSession, question: &str) -> Result<()> {
    match session.send_user_message(question).await {
        SendOutcome::Answered => {}
        SendOutcome::Empty => bail!("Question is empty"),
        SendOutcome::Busy => bail!("Another question is still being answered"),
    }

    if let Some(answer) = session.messages().last() {
        println!("{}", answer.content);
    }
    Ok(())
}

async fn run_tui(session: ChatSession, geo: GeoShortcut) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let mut events = EventHandler::new(session.subscribe());
    let mut app = App::new(session, Arc::new(geo), events.sender());

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;

            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event)?,
                None => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    result
}
