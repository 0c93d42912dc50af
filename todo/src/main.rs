//! Scripted to-do session.
//!
//! Signs in, fetches the list, submits an item, completes it, deletes it and
//! signs out, printing the read model after each step.
//!
//! With `TODO_BACKEND_URL` unset the list lives in memory; otherwise
//! `TODO_CREDENTIAL` and `TODO_USER_ID` must be set too.
//!
//! Run with: `cargo run --bin todo-list`

use anyhow::{Context, bail};
use std::time::Duration;
use todo_list::{
    AuthSession, Config, Credential, HttpPersistence, InMemoryPersistence, TodoClient,
    TodoError, TodoPersistence, TodoView, UserId,
};
use todo_store_runtime::metrics::MetricsServer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let config = Config::from_env();
    info!(
        backend = config.backend.url.as_deref().unwrap_or("in-memory"),
        "Starting to-do session"
    );

    let mut metrics = MetricsServer::new();
    if config.metrics_enabled {
        metrics.start().context("Failed to start metrics")?;
    }

    match config.backend.url.clone() {
        Some(url) => {
            let Some((credential, user_id)) = config.identity() else {
                bail!("TODO_CREDENTIAL and TODO_USER_ID are required with TODO_BACKEND_URL");
            };
            let persistence =
                HttpPersistence::new(url, config.request_timeout(), config.retry_policy())
                    .context("Failed to build HTTP client")?;
            run(persistence, &config, credential, user_id).await?;
        },
        None => {
            let (credential, user_id) = config
                .identity()
                .unwrap_or_else(|| (Credential::new("demo-token"), UserId::new("demo-user")));
            let persistence = InMemoryPersistence::new().with_latency(Duration::from_millis(50));
            persistence.grant(&user_id, &credential)?;
            run(persistence, &config, credential, user_id).await?;
        },
    }

    if let Some(rendered) = metrics.render() {
        println!("\n{rendered}");
    }

    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_list=info,todo_store_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("Failed to initialize tracing")
}

async fn run<P>(
    persistence: P,
    config: &Config,
    credential: Credential,
    user_id: UserId,
) -> anyhow::Result<()>
where
    P: TodoPersistence + Clone + 'static,
{
    let session = AuthSession::signed_in(credential, user_id);
    let client = TodoClient::new(
        persistence,
        session,
        config.submission_policy(),
        config.operation_timeout(),
    );

    client.fetch_todos().await?;
    print_view("fetched", &client.view().await);

    match client.submit_todo("Write the weekly report").await {
        Ok(()) => {},
        Err(TodoError::Rejected(rejection)) => warn!(%rejection, "Submission rejected"),
        Err(error) => return Err(error.into()),
    }
    print_view("submitted", &client.view().await);

    let last = client.view().await.todos.len().saturating_sub(1);
    client.mark_as_completed(last).await?;
    print_view("completed", &client.view().await);

    client.delete_todo(last).await?;
    print_view("deleted", &client.view().await);

    if let Err(error) = client.sign_out().await {
        warn!(error = %error, "Local list was not cleared after sign-out");
    }
    print_view("signed out", &client.view().await);

    client.store().shutdown(None).await?;
    Ok(())
}

fn print_view(step: &str, view: &TodoView) {
    println!("== {step} ==");
    for (todo, endpoint) in view.todos.iter().zip(&view.endpoints_arr) {
        let mark = if todo.completed { 'x' } else { ' ' };
        println!("  [{mark}] {} ({endpoint})", todo.text);
    }
    if view.todos.is_empty() {
        println!("  (empty)");
    }
    if !view.fetch_todo_error.is_empty() {
        println!("  fetch error: {}", view.fetch_todo_error);
    }
    if !view.submit_complete_delete_todo_error.is_empty() {
        println!("  error: {}", view.submit_complete_delete_todo_error);
    }
    println!(
        "  loading={} success={} user={}",
        view.loading,
        view.submit_todo_success,
        view.user_id.as_ref().map_or("-", UserId::as_str)
    );
}
