use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use todo_core::Database;

mod logging;

#[derive(Parser, Debug)]
#[command(name = "todo-server", version, about = "HTTP API for the todo list")]
struct Args {
    /// SQLite file to store todos in. Defaults to the user's state directory.
    #[arg(long, env = "TODO_DATABASE")]
    database: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, env = "TODO_BIND", default_value = "127.0.0.1:5555")]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::setup()?;
    let args = Args::parse();

    let db = match &args.database {
        Some(path) => Database::open(path).await?,
        None => Database::connect().await?,
    };

    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    tracing::info!("Server running on http://{}", listener.local_addr()?);

    axum::serve(listener, todo_server::router(db.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    tracing::info!("store closed, bye");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
