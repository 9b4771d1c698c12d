use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

mod archive;
mod receive;
mod send;
mod tempfiles;
mod transport;

#[derive(Parser, Debug)]
#[command(name = "portal")]
#[command(about = "send and receive files peer-to-peer with a one-time word-code password", long_about = None)]
struct Cli {
    /// rendezvous server to use for pairing
    #[arg(long, global = true, default_value = "ws://127.0.0.1:8080")]
    rendezvous: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// send one or more files
    Send {
        /// paths to send
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// receive files using a password printed by `portal send`
    Receive {
        /// the id-word-word-word password
        password: String,

        /// directory to write received files into
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "portal=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Send { paths } => send::run(paths, &cli.rendezvous).await,
        Command::Receive { password, output } => receive::run(&password, &cli.rendezvous, &output).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
