use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use powchain_core::{validate_chain, ChainSnapshot, Transaction};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "powchain-cli")]
#[command(about = "CLI client for the powchain node")]
struct Cli {
    /// Node base URL (e.g. http://127.0.0.1:5000)
    #[arg(long, global = true, default_value = "http://127.0.0.1:5000")]
    node: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a transaction
    Submit {
        /// Sender
        #[arg(long)]
        sender: String,
        /// Recipient
        #[arg(long)]
        recipient: String,
        /// Amount
        #[arg(long)]
        amount: u64,
    },
    /// Print the node's chain and check it locally
    Chain,
    /// Ask the node to mine a block
    Mine,
    /// Register peers with the node
    Register {
        /// Peer addresses, e.g. http://10.0.0.2:5000
        #[arg(required = true)]
        nodes: Vec<String>,
    },
    /// List the node's peers
    Peers,
    /// Run consensus on the node
    Resolve,
}

#[derive(Serialize)]
struct Nodes {
    nodes: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let node = cli.node.trim_end_matches('/').to_string();
    let client = reqwest::Client::new();

    let res = match cli.cmd {
        Command::Submit {
            sender,
            recipient,
            amount,
        } => {
            let tx = Transaction::new(sender, recipient, amount);
            client
                .post(format!("{node}/transactions/new"))
                .json(&tx)
                .send()
                .await?
        }
        Command::Chain => {
            let snapshot: ChainSnapshot = client
                .get(format!("{node}/chain"))
                .send()
                .await?
                .error_for_status()?
                .json()
                .await
                .context("decoding chain")?;
            debug!(length = snapshot.length, "fetched chain");
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            println!("valid: {}", validate_chain(&snapshot.chain));
            return Ok(());
        }
        Command::Mine => client.get(format!("{node}/mine")).send().await?,
        Command::Register { nodes } => {
            client
                .post(format!("{node}/nodes/register"))
                .json(&Nodes { nodes })
                .send()
                .await?
        }
        Command::Peers => client.get(format!("{node}/nodes")).send().await?,
        Command::Resolve => client.get(format!("{node}/nodes/resolve")).send().await?,
    };

    let status = res.status();
    let body = res.text().await?;
    println!("status: {}", status);
    println!("{body}");
    Ok(())
}
