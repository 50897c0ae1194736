use std::{collections::HashMap, net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context as _;
use blitz_session::{Hub, ServerMessage, SessionRegistry, StaticTokenVerifier, StubVerifier};
use clap::builder::BoolishValueParser;
use tokio::{
    io::{AsyncBufReadExt as _, AsyncWriteExt as _, BufReader},
    net::{TcpListener, TcpStream, tcp::OwnedWriteHalf},
    sync::mpsc,
};

use crate::{command::MatchConfigArg, util};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ServeArg {
    /// Address to listen on
    #[arg(long, env = "BLITZ_ADDR", default_value = "127.0.0.1:8765")]
    addr: SocketAddr,
    /// Accept any non-empty token as the `test-user` identity
    #[arg(long, env = "BLITZ_AUTH_DISABLED", value_parser = BoolishValueParser::new())]
    auth_disabled: bool,
    /// JSON file mapping tokens to user ids
    #[arg(long, env = "BLITZ_TOKENS")]
    tokens: Option<PathBuf>,
    /// Seed for room codes and matches
    #[arg(long, env = "BLITZ_SEED")]
    seed: Option<u64>,
    #[clap(flatten)]
    match_config: MatchConfigArg,
}

pub(crate) fn run(arg: &ServeArg) -> anyhow::Result<()> {
    let config = arg.match_config.to_config()?;
    let registry = match arg.seed {
        Some(seed) => SessionRegistry::with_seed(config, seed),
        None => SessionRegistry::new(config),
    };
    let hub = if arg.auth_disabled {
        tracing::warn!("authentication disabled, every token maps to the test identity");
        Hub::new(registry, StubVerifier)
    } else {
        let path = arg
            .tokens
            .as_deref()
            .context("--tokens is required unless --auth-disabled is set")?;
        let tokens: HashMap<String, String> = util::read_json_file("token", path)?;
        let verifier = StaticTokenVerifier::new(tokens);
        tracing::info!(tokens = verifier.len(), "token table loaded");
        Hub::new(registry, verifier)
    };

    let runtime = tokio::runtime::Runtime::new().context("Failed to start the async runtime")?;
    runtime.block_on(serve(Arc::new(hub), arg.addr))
}

async fn serve(hub: Arc<Hub>, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, "listening");

    loop {
        let (stream, peer) = listener.accept().await.context("Failed to accept")?;
        let hub = Arc::clone(&hub);
        tokio::spawn(async move {
            if let Err(err) = handle_connection(&hub, stream).await {
                tracing::warn!(%peer, error = %err, "connection closed with error");
            }
        });
    }
}

/// Runs one connection: a reader loop feeding the hub and a writer task
/// draining the connection's outbox.
async fn handle_connection(hub: &Hub, stream: TcpStream) -> anyhow::Result<()> {
    let (reader, writer) = stream.into_split();
    let (outbox, inbox) = mpsc::unbounded_channel();
    let mut conn = hub.connect(outbox);
    let writer = tokio::spawn(write_messages(writer, inbox));

    let mut lines = BufReader::new(reader).lines();
    let result = async {
        while let Some(line) = lines.next_line().await.context("Failed to read")? {
            if line.trim().is_empty() {
                continue;
            }
            hub.handle_line(&mut conn, &line).await?;
        }
        anyhow::Ok(())
    }
    .await;

    hub.disconnect(&mut conn).await?;
    // The writer stops once every sender, including the room's copy, is gone.
    drop(conn);
    writer.await.context("Writer task panicked")??;
    result
}

async fn write_messages(
    mut writer: OwnedWriteHalf,
    mut inbox: mpsc::UnboundedReceiver<ServerMessage>,
) -> anyhow::Result<()> {
    while let Some(message) = inbox.recv().await {
        let mut line = message.to_json()?;
        line.push('\n');
        writer
            .write_all(line.as_bytes())
            .await
            .context("Failed to write")?;
    }
    Ok(())
}
