use clap::{Parser, Subcommand};
use stage::content;
use stage::remote::{RemoteCommand, SOCKET_PATH};
use std::io::Write;
use std::os::unix::net::UnixStream;

#[derive(Parser, Debug)]
#[command(name = "stage", version, about = "Remote control for a running podium", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Advance one page
    Next,
    /// Go back one page
    Prev,
    /// Jump to the first page
    First,
    /// Jump to the last page
    Last,
    /// Jump to a page (1-based)
    Goto {
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        page: u64,
    },
    /// Close the open detail panel
    Close,
    /// Write the built-in deck to the data directory for editing
    InitDeck,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let cmd = match cli.command {
        Commands::Next => RemoteCommand::Next,
        Commands::Prev => RemoteCommand::Prev,
        Commands::First => RemoteCommand::First,
        Commands::Last => RemoteCommand::Last,
        Commands::Goto { page } => RemoteCommand::Goto(page as usize),
        Commands::Close => RemoteCommand::Close,
        Commands::InitDeck => {
            let path = content::write_default_deck()?;
            println!("{}", path.display());
            return Ok(());
        }
    };
    send_command(cmd)
}

fn send_command(cmd: RemoteCommand) -> anyhow::Result<()> {
    let mut stream = UnixStream::connect(SOCKET_PATH).map_err(|e| {
        anyhow::anyhow!(
            "Failed to connect to podium at {}: {}. Is podium running?",
            SOCKET_PATH,
            e
        )
    })?;

    log::debug!("sending '{}'", cmd);
    writeln!(stream, "{}", cmd)?;
    Ok(())
}
