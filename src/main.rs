use std::io::Read;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use recipe_feed_client::api::models::{CreatePostRequest, Post};
use recipe_feed_client::api::ApiClient;
use recipe_feed_client::config::Config;
use recipe_feed_client::posts::{
    is_owner, HideCoordinator, MutationCoordinator, VisibilityOverlay,
};
use recipe_feed_client::recipe;
use recipe_feed_client::session::{AuthStatus, CredentialStore, SessionManager};
use recipe_feed_client::storage::{FileStore, KeyValueStore};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&config.state_path));
    let api = ApiClient::new(&config).context("Invalid API URL")?;
    let credentials = CredentialStore::new(store.clone());
    let session = SessionManager::new(credentials.clone(), api.clone());

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("help");

    match command {
        "login" => {
            let [username, password] = two_args(&args, "login <username> <password>")?;
            session.login(&username, &password).await?;
            println!("Logged in as {username}");
        }
        "logout" => {
            session.logout();
            println!("Logged out");
        }
        "status" => {
            let status = session.check_status().await;
            match status {
                AuthStatus::Authenticated => {
                    let identity = credentials
                        .identity()
                        .map_or_else(|| "<unknown identity>".to_string(), |i| i.to_string());
                    println!("Authenticated as {identity}");
                }
                _ => println!("Not authenticated ({status:?})"),
            }
        }
        "feed" | "explore" => {
            let token = session.bearer_token().await?;
            let posts = if command == "feed" {
                api.feed(&token).await?
            } else {
                api.explore(&token).await?
            };
            let identity = credentials.identity();
            let overlay = VisibilityOverlay::new(store.clone(), identity.as_ref());
            let visible = overlay.filter(posts);
            info!(count = visible.len(), "Fetched posts");
            for post in &visible {
                print_post(post, is_owner(post, identity.as_ref()));
            }
        }
        "post" => {
            let token = session.bearer_token().await?;
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read recipe from stdin")?;
            let parsed = recipe::decode(&raw);
            if !parsed.is_structured() {
                bail!("stdin did not contain a structured recipe (JSON with ingredients)");
            }
            parsed
                .validate()
                .map_err(|msg| anyhow::anyhow!("invalid recipe: {msg}"))?;
            let request = CreatePostRequest {
                caption: recipe::encode(&parsed),
                image: std::env::var("POST_IMAGE").ok(),
            };
            let created = api.create_post(&token, &request).await?;
            println!("Posted recipe '{}' as post {}", parsed.title, created.id);
        }
        "like" => {
            let [id] = one_arg(&args, "like <post-id>")?;
            let post_id: i64 = id.parse().context("post id must be a number")?;
            let token = session.bearer_token().await?;
            let mut post = find_post(&api, &token, post_id).await?;
            MutationCoordinator::new(api.clone())
                .toggle_like(&token, &mut post)
                .await?;
            println!(
                "{} post {} ({} likes)",
                if post.liked_by_user { "Liked" } else { "Unliked" },
                post.id,
                post.likes_count
            );
        }
        "comment" => {
            if args.len() < 3 {
                bail!("usage: comment <post-id> <text>");
            }
            let post_id: i64 = args[1].parse().context("post id must be a number")?;
            let text = args[2..].join(" ");
            let token = session.bearer_token().await?;
            let identity = credentials.identity();
            let mut post = find_post(&api, &token, post_id).await?;
            MutationCoordinator::new(api.clone())
                .submit_comment(&token, &mut post, &text, identity.as_ref())
                .await?;
            println!("Commented on post {} ({} comments)", post.id, post.comments_count);
        }
        "hide" => {
            let [id] = one_arg(&args, "hide <post-id>")?;
            let post_id: i64 = id.parse().context("post id must be a number")?;
            let token = session.bearer_token().await?;
            let identity = credentials.identity();
            let overlay = VisibilityOverlay::new(store.clone(), identity.as_ref());
            let outcome = HideCoordinator::new(api.clone(), overlay)
                .request_hide(&token, post_id)
                .await?;
            if outcome.used_fallback {
                println!("Post {post_id} hidden from your view (no server-side delete available)");
            } else {
                println!("Post {post_id} deleted");
            }
        }
        "follow" => {
            let [username] = one_arg(&args, "follow <username>")?;
            let token = session.bearer_token().await?;
            let response = api.toggle_follow(&token, &username).await?;
            println!(
                "{} {username}",
                if response.following { "Now following" } else { "Unfollowed" }
            );
        }
        "search" => {
            let [query] = one_arg(&args, "search <query>")?;
            let token = session.bearer_token().await?;
            let users = api.search_users(&token, &query).await?;
            let recipes = api.search_recipes(&token, &query).await?;
            println!("Users:");
            for user in users {
                println!("  {}", user.username);
            }
            println!("Recipes:");
            for post in recipes {
                let decoded = recipe::decode(&post.caption);
                let title = if decoded.title.is_empty() {
                    "(untitled)".to_string()
                } else {
                    decoded.title
                };
                println!("  [{}] {title}", post.id);
            }
        }
        _ => {
            println!(
                "usage: recipe-feed-client <command>\n\n\
                 commands:\n\
                 \x20 login <username> <password>\n\
                 \x20 logout\n\
                 \x20 status\n\
                 \x20 feed | explore\n\
                 \x20 post              (reads a recipe JSON document from stdin)\n\
                 \x20 like <post-id>\n\
                 \x20 comment <post-id> <text>\n\
                 \x20 hide <post-id>\n\
                 \x20 follow <username>\n\
                 \x20 search <query>"
            );
        }
    }

    Ok(())
}

/// Find a post by id in the feed, falling back to the explore list.
async fn find_post(api: &ApiClient, token: &str, post_id: i64) -> Result<Post> {
    let mut posts = api.feed(token).await?;
    if !posts.iter().any(|p| p.id == post_id) {
        posts = api.explore(token).await?;
    }
    posts
        .into_iter()
        .find(|p| p.id == post_id)
        .with_context(|| format!("post {post_id} not found"))
}

fn print_post(post: &Post, owned: bool) {
    let owner = post.username.as_deref().unwrap_or("<unknown>");
    let marker = if owned { " (yours)" } else { "" };
    println!("#{} by {owner}{marker} - {} likes", post.id, post.likes_count);

    let decoded = recipe::decode(&post.caption);
    if decoded.is_structured() {
        let title = if decoded.title.is_empty() {
            "Untitled Recipe"
        } else {
            decoded.title.as_str()
        };
        println!("  {title}");
        for line in decoded.display_ingredients() {
            println!("    - {line}");
        }
        if !decoded.instructions.is_empty() {
            println!("  {}", decoded.instructions.replace('\n', "\n  "));
        }
    } else if !decoded.instructions.is_empty() {
        println!("  {}", decoded.instructions);
    }

    if post.comments_count > 0 {
        println!("  {} comments", post.comments_count);
    }
}

fn one_arg(args: &[String], usage: &str) -> Result<[String; 1]> {
    match args {
        [_, a] => Ok([a.clone()]),
        _ => bail!("usage: {usage}"),
    }
}

fn two_args(args: &[String], usage: &str) -> Result<[String; 2]> {
    match args {
        [_, a, b] => Ok([a.clone(), b.clone()]),
        _ => bail!("usage: {usage}"),
    }
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,recipe_feed_client=info"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}
