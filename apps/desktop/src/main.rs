use std::{process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{builder::NonEmptyStringValueParser, Parser, Subcommand};
use client_core::{
    load_settings,
    view::{EMPTY_ROSTER_NOTICE, LOADING_NOTICE},
    ActionOutcome, ActivitiesController, ActivityListView, AutoConfirm, ConfirmPrompt, ListArea,
    RefreshOutcome, Roster, StatusKind, StatusMessage,
};
use dialoguer::Confirm;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "activities", about = "Browse activities and manage signups")]
struct Args {
    /// Overrides the server url from activities.toml and the environment.
    #[arg(long, global = true)]
    server_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show every activity with its participants.
    List {
        /// Print the HTML fragments instead of plain text.
        #[arg(long)]
        html: bool,
    },
    /// Sign a participant up for an activity.
    Signup {
        #[arg(long, value_parser = NonEmptyStringValueParser::new())]
        email: String,
        #[arg(long, value_parser = NonEmptyStringValueParser::new())]
        activity: String,
    },
    /// Remove a participant from an activity.
    Unregister {
        #[arg(long, value_parser = NonEmptyStringValueParser::new())]
        email: String,
        #[arg(long, value_parser = NonEmptyStringValueParser::new())]
        activity: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

struct TerminalConfirm;

#[async_trait]
impl ConfirmPrompt for TerminalConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        let prompt = prompt.to_string();
        let answer = tokio::task::spawn_blocking(move || {
            Confirm::new().with_prompt(prompt).default(false).interact()
        })
        .await;
        match answer {
            Ok(Ok(answer)) => answer,
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "confirmation prompt failed; treating as no");
                false
            }
            Err(err) => {
                tracing::warn!(error = %err, "confirmation prompt task failed; treating as no");
                false
            }
        }
    }
}

fn print_list(view: &ActivityListView) {
    let cards = match &view.area {
        ListArea::Loading => {
            println!("{LOADING_NOTICE}");
            return;
        }
        ListArea::Unavailable(notice) => {
            println!("{notice}");
            return;
        }
        ListArea::Cards(cards) => cards,
    };

    for card in cards {
        println!("{}", card.name);
        println!("  Description: {}", card.description);
        println!("  Schedule: {}", card.schedule);
        if let Some(spots) = card.spots_left {
            println!("  Availability: {spots} spots left");
        }
        match &card.roster {
            Roster::Empty => println!("  {EMPTY_ROSTER_NOTICE}"),
            Roster::Participants(rows) => {
                println!("  Participants:");
                for row in rows {
                    println!("    - {}", row.participant);
                }
            }
        }
        println!();
    }
}

fn print_status(status: &StatusMessage) {
    if !status.visible {
        return;
    }
    let label = match status.kind {
        StatusKind::Success => "ok",
        StatusKind::Error => "error",
    };
    println!("[{label}] {}", status.text);
}

async fn report(controller: &ActivitiesController, outcome: &ActionOutcome) -> bool {
    if *outcome == ActionOutcome::Declined {
        println!("Cancelled.");
        return false;
    }
    print_status(&controller.status().await);
    if outcome.is_success() {
        println!();
        print_list(&controller.list_view().await);
    }
    outcome.is_success()
}

/// `RUST_LOG` when it parses, `info` otherwise.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(server_url) = &args.server_url {
        settings = settings.with_server_url(server_url);
    }

    let confirm: Arc<dyn ConfirmPrompt> = match &args.command {
        Command::Unregister { yes: true, .. } => Arc::new(AutoConfirm(true)),
        _ => Arc::new(TerminalConfirm),
    };
    let controller = ActivitiesController::from_settings(&settings, confirm)
        .with_context(|| format!("cannot talk to server at {}", settings.server_url))?;

    let succeeded = match args.command {
        Command::List { html } => {
            let outcome = controller.refresh().await;
            let view = controller.list_view().await;
            if html {
                print!("{}", view.to_html()?);
            } else {
                print_list(&view);
            }
            matches!(outcome, RefreshOutcome::Loaded { .. })
        }
        Command::Signup { email, activity } => {
            let outcome = controller.submit(&email, &activity).await;
            report(&controller, &outcome).await
        }
        Command::Unregister {
            email, activity, ..
        } => {
            let outcome = controller.remove(&email, &activity).await;
            report(&controller, &outcome).await
        }
    };

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
