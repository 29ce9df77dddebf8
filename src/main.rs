use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use genstudio_lib::client::StudioClient;
use genstudio_lib::generation::{AspectRatio, ImageParams};
use genstudio_lib::settings::Settings;
use genstudio_lib::workflow::{Studio, WorkflowState};

#[derive(Parser)]
#[command(name = "genstudio", version, about = "Image-then-video generation studio")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (API + static site).
    Serve,
    /// Generate an image, then animate it, against a running server.
    Generate(GenerateArgs),
    /// Manage the server's in-memory todo list.
    Todo {
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        server: String,
        #[command(subcommand)]
        action: TodoAction,
    },
}

#[derive(clap::Args)]
struct GenerateArgs {
    #[arg(long, default_value = "http://127.0.0.1:3000")]
    server: String,
    #[arg(long)]
    prompt: String,
    #[arg(long)]
    negative_prompt: Option<String>,
    /// One of 1:1, 16:9, 9:16.
    #[arg(long, value_parser = parse_aspect_ratio)]
    aspect_ratio: Option<AspectRatio>,
    #[arg(long)]
    seed: Option<i64>,
    /// Motion description for the video step.
    #[arg(long)]
    motion: Option<String>,
    /// Stop after the image step.
    #[arg(long)]
    image_only: bool,
}

#[derive(Subcommand)]
enum TodoAction {
    List,
    Add { text: String },
    Toggle { id: String },
    Delete { id: String },
}

fn parse_aspect_ratio(s: &str) -> Result<AspectRatio, String> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|_| format!("expected 1:1, 16:9 or 9:16, got \"{s}\""))
}

#[tokio::main]
async fn main() -> Result<()> {
    // JSON results go to stdout; keep logs on stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve => {
            let settings = Settings::load()?;
            genstudio_lib::run(settings).await
        }
        Command::Generate(args) => generate(args).await,
        Command::Todo { server, action } => todo(&server, action).await,
    }
}

async fn generate(args: GenerateArgs) -> Result<()> {
    let mut studio = Studio::new(StudioClient::new(args.server));
    let params = ImageParams {
        prompt: args.prompt,
        negative_prompt: args.negative_prompt,
        aspect_ratio: args.aspect_ratio,
        seed: args.seed,
    };

    let state = studio.generate_image(params).await?;
    let image = match state {
        WorkflowState::ImageSuccess(image) => image.clone(),
        other => bail!("{}", other.error().unwrap_or("image generation failed")),
    };
    info!(image_url = %image.image_url, "image ready");
    if args.image_only {
        return print_json(&image);
    }

    match studio.generate_video(args.motion).await? {
        WorkflowState::VideoSuccess(image, video) => {
            print_json(&serde_json::json!({ "image": image, "video": video }))
        }
        other => bail!("{}", other.error().unwrap_or("video generation failed")),
    }
}

async fn todo(server: &str, action: TodoAction) -> Result<()> {
    let client = StudioClient::new(server);
    match action {
        TodoAction::List => print_json(&client.list_todos().await?),
        TodoAction::Add { text } => print_json(&client.create_todo(&text).await?),
        TodoAction::Toggle { id } => print_json(&client.toggle_todo(&id).await?),
        TodoAction::Delete { id } => print_json(&client.delete_todo(&id).await?),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
