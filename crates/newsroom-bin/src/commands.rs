//! Command handlers.

use crate::app::App;
use anyhow::Context;
use chrono::Utc;
use newsroom_state::{AuthAction, Comment, Headline};
use std::time::Duration;

const FEED_WAIT: Duration = Duration::from_secs(10);

fn print_headline_row(headline: &Headline) {
    println!("{:<48} {} ({})", headline.slug, headline.title, headline.source.name);
}

async fn find_headline(
    app: &App,
    slug: &str,
    country: Option<String>,
    category: Option<String>,
) -> anyhow::Result<Headline> {
    let url = app.headlines_url(country, category)?;
    app.store.load_headlines(&url).await?;
    app.store
        .select_headline(slug)
        .with_context(|| format!("no headline `{slug}` in the current list"))
}

async fn load_saved(app: &App, slug: &str) -> anyhow::Result<Headline> {
    app.store
        .load_headline(slug)
        .await?
        .with_context(|| format!("headline `{slug}` is not saved; run `newsroom save {slug}`"))
}

pub async fn headlines(
    app: &App,
    country: Option<String>,
    category: Option<String>,
) -> anyhow::Result<()> {
    let url = app.headlines_url(country, category)?;
    let headlines = app.store.load_headlines(&url).await?;
    if headlines.is_empty() {
        println!("No headlines.");
    }
    for headline in &headlines {
        print_headline_row(headline);
    }
    Ok(())
}

pub async fn show(app: &App, slug: &str) -> anyhow::Result<()> {
    app.restore()?;
    let headline = load_saved(app, slug).await?;

    println!("{}", headline.title);
    println!("{} | {}", headline.source.name, headline.published_at);
    println!("{}", headline.url);
    if let Some(description) = &headline.description {
        println!();
        println!("{description}");
    }
    println!();
    match &headline.comments {
        Some(comments) => {
            for comment in comments {
                println!(
                    "[{:>3}] {} - {} ({})",
                    comment.likes, comment.body, comment.author_ref, comment.id
                );
            }
        }
        None => println!("No comments yet."),
    }
    Ok(())
}

pub async fn save(
    app: &App,
    slug: &str,
    country: Option<String>,
    category: Option<String>,
) -> anyhow::Result<()> {
    app.restore()?;
    let headline = find_headline(app, slug, country, category).await?;
    if app.store.save_headline(&headline).await? {
        println!("Saved `{}`.", headline.slug);
    } else {
        println!("`{}` was already saved.", headline.slug);
    }
    Ok(())
}

pub async fn authenticate(
    app: &App,
    action: AuthAction,
    email: &str,
    password: &str,
) -> anyhow::Result<()> {
    app.restore()?;
    let user = app
        .store
        .authenticate_user(action, email, password)
        .await
        .with_context(|| format!("{action} failed"))?;
    app.sync_token();

    let expires_at = app.store.state().expires_at;
    println!("Signed in as {}", user.email);
    if let Some(expires_at) = expires_at {
        println!("Session valid until {}", expires_at.to_rfc3339());
    }
    Ok(())
}

pub fn logout(app: &App) -> anyhow::Result<()> {
    app.restore()?;
    app.store.logout_user()?;
    println!("Signed out.");
    Ok(())
}

pub fn status(app: &App) -> anyhow::Result<()> {
    app.restore()?;
    let state = app.store.state();
    match (&state.user, state.expires_at) {
        (Some(user), Some(expires_at)) if app.store.is_authenticated() => {
            let remaining = expires_at - Utc::now();
            println!("Signed in as {} ({})", user.email, app.store.auth_state());
            println!("Avatar: {}", user.avatar);
            println!("Session expires in {} minutes", remaining.num_minutes());
        }
        _ => println!("Not signed in."),
    }
    Ok(())
}

pub async fn feed_list(app: &App) -> anyhow::Result<()> {
    app.require_session()?;
    let mut rx = app.store.subscribe_state();
    rx.mark_unchanged();
    app.store.load_user_feed().await?;

    tokio::time::timeout(FEED_WAIT, rx.changed())
        .await
        .context("timed out waiting for the feed")??;

    let feed = app.store.state().feed;
    if feed.is_empty() {
        println!("Your feed is empty.");
    }
    for entry in &feed {
        print_headline_row(&entry.headline);
    }
    Ok(())
}

pub async fn feed_add(
    app: &App,
    slug: &str,
    country: Option<String>,
    category: Option<String>,
) -> anyhow::Result<()> {
    app.require_session()?;
    let headline = find_headline(app, slug, country, category).await?;
    app.store.add_headline_to_feed(&headline).await?;
    println!("Added `{}` to your feed.", headline.title);
    Ok(())
}

pub async fn feed_remove(app: &App, title: &str) -> anyhow::Result<()> {
    app.require_session()?;
    app.store.remove_headline_from_feed(title).await?;
    println!("Removed `{title}` from your feed.");
    Ok(())
}

pub async fn comment(app: &App, slug: &str, body: &str, id: Option<String>) -> anyhow::Result<()> {
    app.require_session()?;
    let author = app
        .store
        .state()
        .user
        .context("session has no user")?;
    load_saved(app, slug).await?;

    let comment = Comment {
        published_at: Some(Utc::now().to_rfc3339()),
        ..Comment::new(
            id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            body,
            author.email,
        )
    };
    let thread = app.store.send_comment(&comment).await?;
    println!("Comment `{}` posted; {} on this headline.", comment.id, thread.len());
    Ok(())
}

pub async fn like(app: &App, slug: &str, comment_id: &str) -> anyhow::Result<()> {
    app.require_session()?;
    load_saved(app, slug).await?;
    match app.store.like_comment(comment_id).await? {
        Some(likes) => println!("`{comment_id}` now has {likes} likes."),
        None => println!("No comment `{comment_id}` on `{slug}`."),
    }
    app.store.close_headline();
    Ok(())
}
