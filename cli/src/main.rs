mod api;
mod session;

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use uuid::Uuid;

use api::{CliError, HubClient, RetryPolicy};
use session::{ChatSession, Speaker};

#[derive(Parser, Debug)]
#[command(name = "hub-cli", about = "Creative hub chat, image, and history CLI")]
struct Cli {
    #[arg(long, env = "HUB_BASE_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    #[arg(long, env = "HUB_CHAT_URL", help = "Chat endpoint; defaults to <base-url>/chat-with-ai")]
    chat_url: Option<String>,

    #[arg(long, env = "HUB_USER_ID")]
    user_id: Option<Uuid>,

    #[arg(long, env = "HUB_CHAT_ATTEMPTS", default_value_t = api::DEFAULT_CHAT_ATTEMPTS)]
    attempts: u32,

    #[arg(long, env = "HUB_CHAT_RETRY_DELAY_MS", default_value_t = api::DEFAULT_CHAT_RETRY_DELAY_MS)]
    retry_delay_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Ping,
    Conversation(ConversationCommand),
    /// Send one message, or start an interactive session when no message is given.
    Chat {
        #[arg(long)]
        conversation: Option<Uuid>,
        message: Vec<String>,
    },
    Image {
        prompt: Vec<String>,
        #[arg(long, help = "Also save the image bytes to this path")]
        out: Option<PathBuf>,
    },
    /// List generated images, newest first.
    History,
    Download {
        image_id: Uuid,
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Args, Debug)]
struct ConversationCommand {
    #[command(subcommand)]
    command: ConversationSubcommand,
}

#[derive(Subcommand, Debug)]
enum ConversationSubcommand {
    New {
        #[arg(long)]
        title: Option<String>,
    },
    List,
    Show {
        id: Uuid,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let retry = RetryPolicy { attempts: cli.attempts, delay: Duration::from_millis(cli.retry_delay_ms) };
    let client = HubClient::new(&cli.base_url, cli.chat_url.as_deref(), retry)?;
    let user_id = cli.user_id;

    match cli.command {
        Command::Ping => {
            client.ping().await?;
            println!("ok");
            Ok(())
        }
        Command::Conversation(conversation) => run_conversation(&client, user_id, conversation).await,
        Command::Chat { conversation, message } => run_chat(&client, user_id, conversation, &message.join(" ")).await,
        Command::Image { prompt, out } => {
            let user_id = user_id.ok_or(CliError::MissingUserId)?;
            let json = client.generate_image(user_id, &prompt.join(" ")).await?;
            if let Some(path) = out {
                let id = json
                    .get("id")
                    .and_then(Value::as_str)
                    .and_then(|value| Uuid::parse_str(value).ok())
                    .ok_or(CliError::MissingField("id"))?;
                save_image(&client, id, &path).await?;
            }
            print_json(&json)
        }
        Command::History => {
            let user_id = user_id.ok_or(CliError::MissingUserId)?;
            let json = client.list_images(user_id).await?;
            print_json(&json)
        }
        Command::Download { image_id, out } => save_image(&client, image_id, &out).await,
    }
}

async fn run_conversation(
    client: &HubClient,
    user_id: Option<Uuid>,
    conversation: ConversationCommand,
) -> Result<(), CliError> {
    match conversation.command {
        ConversationSubcommand::New { title } => {
            let user_id = user_id.ok_or(CliError::MissingUserId)?;
            let created = client
                .create_conversation(user_id, title.as_deref())
                .await?;
            println!("{}\t{}", created.id, created.title);
            Ok(())
        }
        ConversationSubcommand::List => {
            let user_id = user_id.ok_or(CliError::MissingUserId)?;
            let json = client.list_conversations(user_id).await?;
            print_json(&json)
        }
        ConversationSubcommand::Show { id } => {
            let thread = client.load_conversation(id).await?;
            let session = ChatSession::reopen(thread);
            if let Some(conv) = session.conversation() {
                println!("# {}", conv.title);
                for turn in &conv.turns {
                    println!("{}", render_turn(turn.speaker, &turn.content));
                }
            }
            Ok(())
        }
    }
}

async fn run_chat(
    client: &HubClient,
    user_id: Option<Uuid>,
    conversation: Option<Uuid>,
    message: &str,
) -> Result<(), CliError> {
    let user_id = user_id.ok_or(CliError::MissingUserId)?;
    let mut session = match conversation {
        Some(id) => ChatSession::reopen(client.load_conversation(id).await?),
        None => ChatSession::new(),
    };

    if !message.trim().is_empty() {
        if let Some(reply) = session.send(client, user_id, message).await? {
            println!("{reply}");
        }
        return Ok(());
    }

    eprintln!("chatting via {} (ctrl-d to quit)", client.chat_url());
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match session.send(client, user_id, &line).await {
            Ok(Some(reply)) => println!("{}", render_turn(Speaker::Assistant, &reply)),
            Ok(None) => {}
            Err(error) => eprintln!("error: {error}"),
        }
    }

    if let Some(conv) = session.conversation() {
        eprintln!("conversation: {}", conv.id);
    }
    Ok(())
}

async fn save_image(client: &HubClient, id: Uuid, path: &Path) -> Result<(), CliError> {
    let bytes = client.download_image(id).await?;
    tokio::fs::write(path, &bytes).await?;
    eprintln!("saved {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

fn render_turn(speaker: Speaker, content: &str) -> String {
    match speaker {
        Speaker::User => format!("you: {content}"),
        Speaker::Assistant => format!("ai: {content}"),
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
