use clap::Parser;

use crate::api::TodoClient;

mod api;
mod due;
mod logging;
mod state;
mod ui;

#[derive(Parser, Debug)]
#[command(name = "todo", version, about = "Terminal client for the todo list")]
struct Args {
    /// Base URL of the todo server
    #[arg(long, env = "TODO_SERVER", default_value = "http://localhost:5555")]
    server: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let log_file = logging::setup()?;
    tracing::info!(server = %args.server, log = %log_file.display(), "starting");

    let client = TodoClient::new(&args.server);
    ui::run_app(client).await?;

    Ok(())
}
