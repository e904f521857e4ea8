use anyhow::Result;
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::info;

use llama_agent_server::agent::{build_agent, ConversationAgent};
use llama_agent_server::config::Settings;
use llama_agent_server::logging;

#[derive(Parser, Debug)]
#[command(
    name = "llama-agent",
    version,
    about = "Stock analysis assistant over a local llama-server"
)]
struct Args {
    /// Settings file (defaults to config/settings.* when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// System message seeded into the conversation
    #[arg(long)]
    system_message: Option<String>,

    /// Answer stock questions with the model instead of the quote API
    #[arg(long)]
    no_quotes: bool,

    /// Disable live web search
    #[arg(long)]
    no_web: bool,

    /// Disable document retrieval
    #[arg(long)]
    no_retrieval: bool,
}

impl Args {
    fn apply(&self, settings: &mut Settings) {
        if let Some(message) = &self.system_message {
            settings.agent.system_prompt = message.clone();
        }
        if self.no_quotes {
            settings.quotes.enabled = false;
        }
        if self.no_web {
            settings.web_search.enabled = false;
        }
        if self.no_retrieval {
            settings.retrieval.enabled = false;
        }
    }
}

/// Read lines until `exit` or end of input, answering each one
async fn chat_loop<R, W>(agent: &ConversationAgent, input: R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "Welcome to the Stock Analysis Assistant!")?;
    writeln!(out, "Type 'exit' to end the chat.")?;
    writeln!(out)?;

    let mut lines = input.lines();
    loop {
        write!(out, "You: ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };
        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") {
            break;
        }
        if message.is_empty() {
            continue;
        }

        let reply = agent.handle_message(message).await;
        writeln!(out, "Assistant: {}", reply)?;
    }

    writeln!(out, "Goodbye!")?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load_from(args.config.as_deref())?;
    args.apply(&mut settings);

    logging::init_stderr(&settings.logging);
    info!("Starting llama-agent CLI");

    let agent = build_agent(&settings)?;
    info!("Agent routes: {:?}", agent.router().routes());

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    chat_loop(&agent, stdin, &mut stdout).await
}
