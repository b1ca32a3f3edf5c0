use clap::Parser;
use std::io::Write;
use std::time::Duration;
use yt_api::YouTubeClient;
use yt_oauth::{CredentialStore, YOUTUBE_FORCE_SSL_SCOPE};

mod comments;
mod discovery;
mod dispatcher;

/// Posts randomly selected comments on popular videos matching a topic
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the OAuth client secrets file (Google "installed app" format)
    #[arg(long, default_value = "client_secrets.json")]
    client_secrets: String,

    /// Path to the cached credential file
    #[arg(long, default_value = "token.json")]
    token_file: String,

    /// Path to the comment templates file, one comment per line
    #[arg(long, default_value = "comments.txt")]
    comments_file: String,

    /// Maximum number of candidate videos to collect from search
    #[arg(long, default_value = "500")]
    max_results: usize,
}

fn prompt(label: &str) -> Result<String, Box<dyn std::error::Error>> {
    print!("{}", label);
    std::io::stdout().flush()?;
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let store = CredentialStore::new(
        &args.client_secrets,
        &args.token_file,
        vec![YOUTUBE_FORCE_SSL_SCOPE.to_string()],
    );
    let credential = store.acquire().await?;
    let client = YouTubeClient::new(&credential.access_token);

    let query = prompt("Enter video topic (e.g., CS2): ")?;
    let region = prompt("Enter region code (e.g., US, PL): ")?;
    let count: u32 = prompt("How many comments do you want to post? ")?
        .parse()
        .map_err(|e| format!("Invalid comment count: {}", e))?;
    let delay_secs: f64 = prompt("Enter delay between comments (in seconds): ")?
        .parse()
        .map_err(|e| format!("Invalid delay: {}", e))?;
    if !delay_secs.is_finite() || delay_secs < 0.0 {
        return Err("Delay must be a non-negative number of seconds".into());
    }

    let comments = comments::load_comments(&args.comments_file)?;
    if comments.is_empty() {
        println!("No comments to load. Exiting script.");
        return Ok(());
    }

    let videos = discovery::find_popular(&client, &query, &region, args.max_results).await?;
    eprintln!("Collected {} candidate videos", videos.len());

    dispatcher::run(
        &client,
        &videos,
        &comments,
        count,
        Duration::from_secs_f64(delay_secs),
        &mut rand::thread_rng(),
    )
    .await;

    Ok(())
}
