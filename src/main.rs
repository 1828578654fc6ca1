//! User roster: a cached, validated view over a remote user collection.
//!
//! Reads come from the configured HTTP endpoint through a cache actor that
//! dedupes concurrent fetches and keeps results fresh for a few minutes.
//! Writes are confirmed by a simulated adapter and patched into the cache,
//! each outcome surfacing as a notification.

mod adapters;
mod app_system;
mod cache_framework;
mod clients;
mod config;
mod debounce;
mod domain;
mod error;
mod notify;
mod search;
mod stats;
mod user_actor;
mod validation;
mod view;

#[cfg(test)]
mod mock_framework;

use clap::{Parser, Subcommand};
use tokio::sync::broadcast;
use tracing::{info, warn, Instrument};

use crate::app_system::{setup_tracing, RosterSystem};
use crate::cache_framework::{MutationKind, MutationStatus};
use crate::clients::UserClient;
use crate::config::{RosterConfig, ENDPOINT_DEFAULT};
use crate::debounce::Debouncer;
use crate::domain::UserId;
use crate::notify::{Level, Notification, NotificationCenter};
use crate::stats::UserStats;
use crate::user_actor::UserError;
use crate::validation::{Field, FieldErrors, UserDraft, UserForm};
use crate::view::ListView;

// =============================================================================
// CLI
// =============================================================================

#[derive(Parser, Debug)]
#[command(name = "user_roster")]
#[command(about = "Browse and manage a remote user list")]
#[command(version)]
struct Cli {
    /// Endpoint serving the user collection as a JSON array
    #[arg(long, env = "USER_ROSTER_ENDPOINT", default_value = ENDPOINT_DEFAULT)]
    endpoint: String,

    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the user list
    List {
        /// Filter by name, email or city
        #[arg(long)]
        search: Option<String>,
        /// Fetch again even if the loaded list is still fresh
        #[arg(long)]
        refresh: bool,
    },
    /// Show totals and the most common cities
    Stats,
    /// Add a user
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        city: Option<String>,
    },
    /// Edit a user; omitting --name keeps the current one
    Update {
        #[arg(long)]
        id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: String,
        #[arg(long)]
        city: Option<String>,
    },
    /// Remove a user
    Delete {
        #[arg(long)]
        id: u64,
    },
    /// Walk through a full create, edit, search and remove session
    Demo,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let config = RosterConfig::default().with_endpoint(cli.endpoint);
    info!(endpoint = %config.endpoint, "Starting user roster session");

    let system = RosterSystem::new(config)?;
    let mut session = Session::new(&system);

    let span = tracing::info_span!("session", command = ?cli.command);
    async {
        // The list is always loaded first; a failed load is shown, not fatal.
        if let Err(e) = system.user_client.list_users().await {
            warn!(error = %e, "Initial load failed");
        }

        match cli.command {
            Commands::List { search, refresh } => {
                if refresh {
                    if let Err(e) = system.user_client.refetch_users().await {
                        warn!(error = %e, "Refresh failed");
                    }
                }
                session.print_list(search.as_deref().unwrap_or(""))
            }
            Commands::Stats => session.print_stats(),
            Commands::Create { name, email, city } => {
                let draft = UserDraft::new(name, email).with_city(city.unwrap_or_default());
                let result = system.user_client.create_user(&draft).await.map(|_| ());
                session.report(result);
                session.print_list("");
            }
            Commands::Update {
                id,
                name,
                email,
                city,
            } => {
                let draft =
                    UserDraft::new(name.unwrap_or_default(), email).with_city(city.unwrap_or_default());
                let result = system
                    .user_client
                    .update_user(UserId(id), &draft)
                    .await
                    .map(|_| ());
                session.report(result);
                session.print_list("");
            }
            Commands::Delete { id } => {
                let result = system.user_client.delete_user(UserId(id)).await.map(|_| ());
                session.report(result);
                session.print_list("");
            }
            Commands::Demo => run_demo(&system.user_client, &mut session).await,
        }
    }
    .instrument(span)
    .await;

    system.shutdown().await.map_err(anyhow::Error::msg)?;
    Ok(())
}

// =============================================================================
// Session output
// =============================================================================

struct Session {
    client: UserClient,
    notifications: broadcast::Receiver<Notification>,
    center: NotificationCenter,
    search_debounce: std::time::Duration,
}

impl Session {
    fn new(system: &RosterSystem) -> Self {
        Self {
            client: system.user_client.clone(),
            notifications: system.user_client.notifications(),
            center: NotificationCenter::new(system.config.notification_ttl),
            search_debounce: system.config.search_debounce,
        }
    }

    fn print_list(&mut self, term: &str) {
        let snapshot = self.client.snapshot();
        let view = ListView::derive(&snapshot.query, term);
        println!("{}", view);
        self.print_notifications();
    }

    fn print_stats(&mut self) {
        let snapshot = self.client.snapshot();
        match snapshot.query.data {
            Some(users) => println!("{}", UserStats::compute(&users)),
            None => println!("{}", ListView::derive(&snapshot.query, "")),
        }
    }

    /// Validation problems are printed per field; other failures already
    /// arrive as notifications.
    fn report(&mut self, result: Result<(), UserError>) {
        match result {
            Ok(()) => {}
            Err(UserError::Validation(errors)) => print_field_errors(&errors),
            Err(UserError::NotFound(id)) => println!("No user with id {}", id),
            Err(e) => warn!(error = %e, "Operation failed"),
        }
    }

    /// Each notification is printed once, then dismissed.
    fn print_notifications(&mut self) {
        self.center.drain(&mut self.notifications);
        let mut shown = Vec::new();
        for active in self.center.active() {
            let marker = match active.notification.level {
                Level::Success => "[ok]",
                Level::Error => "[error]",
            };
            match &active.notification.description {
                Some(description) => println!(
                    "{} {} {}: {}",
                    active.id, marker, active.notification.title, description
                ),
                None => println!("{} {} {}", active.id, marker, active.notification.title),
            }
            shown.push(active.id);
        }
        for id in shown {
            self.center.dismiss(id);
        }
    }
}

fn print_field_errors(errors: &FieldErrors) {
    println!("Please fix the following:");
    for (field, message) in errors.iter() {
        println!("  {}: {}", field, message);
    }
}

// =============================================================================
// Demo
// =============================================================================

async fn run_demo(client: &UserClient, session: &mut Session) {
    session.print_list("");

    // A rejected submission keeps the form's errors until it is reset.
    let mut form = UserForm::for_create();
    form.set_field(Field::Name, "Maria 5ilva");
    if !form.is_valid() {
        if let Some(message) = form.error(Field::Name) {
            println!("name: {}", message);
        }
    }
    form.set_field(Field::Email, "maria@example");
    if form.submit().is_err() {
        print_field_errors(form.errors());
        form.reset();
    }

    form.set_field(Field::Name, "Maria Silva");
    form.set_field(Field::Email, "maria@example.com");
    form.set_field(Field::City, "Lisboa");
    if let Err(errors) = form.submit() {
        print_field_errors(&errors);
        return;
    }
    let mut state = client.subscribe();
    let creating = client.create_user(form.values());
    tokio::pin!(creating);
    let created = loop {
        tokio::select! {
            result = &mut creating => break result,
            Ok(()) = state.changed() => {
                if state.borrow_and_update().mutations.create == MutationStatus::Pending {
                    println!("Saving...");
                }
            }
        }
    };
    let created = match created {
        Ok(user) => user,
        Err(e) => {
            session.report(Err(e));
            return;
        }
    };
    session.print_list("");
    // The form is closed, so its outcome no longer needs to show.
    if let Err(e) = client.reset_mutation(MutationKind::Create).await {
        warn!(error = %e, "Could not reset create status");
    }

    let mut form = UserForm::for_edit(&created);
    form.set_field(Field::City, "Porto");
    if form.is_dirty() {
        match form.submit() {
            Ok(_) => {
                let result = client.update_user(created.id, form.values()).await.map(|_| ());
                session.report(result);
            }
            Err(errors) => print_field_errors(&errors),
        }
    }

    // Keystrokes arrive faster than the quiet period; only "mar" is applied.
    let (search, _handle) = Debouncer::spawn(String::new(), session.search_debounce);
    let mut settled = search.settled();
    for term in ["m", "ma", "mar"] {
        if let Err(e) = search.schedule(term.to_string()).await {
            warn!(error = %e, "Search debouncer unavailable");
        }
    }
    if settled.changed().await.is_ok() {
        let term = settled.borrow_and_update().clone();
        session.print_list(&term);
    }

    // Clearing the search applies at once.
    if let Err(e) = search.flush(String::new()).await {
        warn!(error = %e, "Search debouncer unavailable");
    }
    if settled.changed().await.is_ok() {
        session.print_list(&search.current());
    }

    let result = client.delete_user(created.id).await.map(|_| ());
    session.report(result);
    session.print_list("");
    session.print_stats();
}
