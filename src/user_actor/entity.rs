use crate::cache_framework::{Entity, MutationKind};
use crate::domain::{User, UserId, UserInput};
use crate::error::MutationError;
use crate::notify::Notification;

const UNEXPECTED_ERROR: &str = "An unexpected error occurred.";

impl Entity for User {
    type Id = UserId;
    type Input = UserInput;

    fn id(&self) -> &UserId {
        &self.id
    }

    /// Announces the new record by name.
    fn on_created(&self) -> Notification {
        Notification::success("User created successfully")
            .with_description(format!("{} was added to the user list.", self.name))
    }

    fn on_updated(&self) -> Notification {
        Notification::success("User updated successfully")
            .with_description(format!("{}'s details were updated.", self.name))
    }

    fn on_deleted(_id: &UserId) -> Notification {
        Notification::success("User removed successfully")
    }

    /// Carries the failure message, falling back to a generic one when the
    /// error has nothing to say.
    fn on_failed(kind: MutationKind, error: &MutationError) -> Notification {
        let title = match kind {
            MutationKind::Create => "Failed to create user",
            MutationKind::Update => "Failed to update user",
            MutationKind::Delete => "Failed to remove user",
        };
        let message = error.to_string();
        let description = if message.trim().is_empty() {
            UNEXPECTED_ERROR.to_string()
        } else {
            message
        };
        Notification::error(title).with_description(description)
    }
}
