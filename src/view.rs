use std::fmt;

use crate::cache_framework::{QueryState, QueryStatus};
use crate::domain::User;
use crate::search::filter_users;

/// What the user list shows for a given query state and search term.
#[derive(Debug, Clone, PartialEq)]
pub enum ListView<'a> {
    Loading,
    Error {
        message: String,
    },
    /// No records to show. `term` is set when a search filtered everything out.
    Empty {
        term: Option<String>,
    },
    Users {
        shown: Vec<&'a User>,
        total: usize,
        refreshing: bool,
    },
}

impl<'a> ListView<'a> {
    pub fn derive(query: &'a QueryState<User>, term: &str) -> Self {
        if query.is_loading() || query.status == QueryStatus::Idle {
            return ListView::Loading;
        }
        if query.status == QueryStatus::Error {
            let message = query
                .error
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "Unknown error".to_string());
            return ListView::Error { message };
        }

        let users: &[User] = query.data.as_deref().map(Vec::as_slice).unwrap_or(&[]);
        let shown = filter_users(users, term);
        if shown.is_empty() {
            let term = Some(term.trim())
                .filter(|t| !t.is_empty())
                .map(str::to_string);
            return ListView::Empty { term };
        }
        ListView::Users {
            shown,
            total: users.len(),
            refreshing: query.is_refetching(),
        }
    }
}

impl fmt::Display for ListView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListView::Loading => writeln!(f, "Loading users..."),
            ListView::Error { message } => {
                writeln!(f, "Failed to load users: {}", message)?;
                writeln!(f, "Run the command again to retry.")
            }
            ListView::Empty { term: Some(term) } => {
                writeln!(f, "No users found matching \"{}\". Try other terms.", term)
            }
            ListView::Empty { term: None } => {
                writeln!(f, "No users registered yet. Start by adding the first user.")
            }
            ListView::Users {
                shown,
                total,
                refreshing,
            } => {
                if shown.len() == *total {
                    write!(f, "{} users total", total)?;
                } else {
                    write!(f, "{} of {} users", shown.len(), total)?;
                }
                if *refreshing {
                    write!(f, " (refreshing)")?;
                }
                writeln!(f)?;
                for user in shown {
                    writeln!(
                        f,
                        "  #{:<14} {:<28} {:<32} {}",
                        user.id,
                        user.name,
                        user.email,
                        user.address.city.as_deref().unwrap_or("-")
                    )?;
                }
                Ok(())
            }
        }
    }
}
