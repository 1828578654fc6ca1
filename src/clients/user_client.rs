use tracing::{debug, instrument, warn};

use crate::cache_framework::CacheClient;
use crate::domain::{User, UserId};
use crate::user_actor::UserError;
use crate::validation::{validate, Mode, UserDraft};

/// Client for the user cache actor.
///
/// Drafts are validated here, so invalid input never reaches the actor or the
/// write adapter.
#[derive(Clone)]
pub struct UserClient {
    inner: CacheClient<User>,
}

impl_cache_client!(UserClient, User, UserError, user);

impl UserClient {
    #[instrument(skip(self, draft), fields(user_name = %draft.name))]
    pub async fn create_user(&self, draft: &UserDraft) -> Result<User, UserError> {
        let input = validate(Mode::Create, draft).inspect_err(|errors| {
            warn!(%errors, "Create blocked by validation");
        })?;
        debug!("Sending request");
        Ok(self.inner.create(input).await?)
    }

    /// A blank name keeps the name currently cached for `id`.
    #[instrument(skip(self, draft))]
    pub async fn update_user(&self, id: UserId, draft: &UserDraft) -> Result<User, UserError> {
        let mut input = validate(Mode::Update, draft).inspect_err(|errors| {
            warn!(%errors, "Update blocked by validation");
        })?;
        if input.name.is_none() {
            let current = self.cached(id).ok_or(UserError::NotFound(id))?;
            input.name = Some(current.name);
        }
        debug!("Sending request");
        Ok(self.inner.update(id, input).await?)
    }

    /// Looks a record up in the last published collection.
    pub fn cached(&self, id: UserId) -> Option<User> {
        self.inner
            .snapshot()
            .query
            .data
            .and_then(|users| users.iter().find(|user| user.id == id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_framework::{create_mock_client, expect_create, expect_delete, expect_update};
    use crate::validation::Field;

    #[tokio::test]
    async fn test_invalid_draft_never_reaches_actor() {
        let (inner, mut receiver) = create_mock_client::<User>(10);
        let client = UserClient::new(inner);

        let err = client
            .create_user(&UserDraft::new("John123", "not-an-email"))
            .await
            .unwrap_err();
        match err {
            UserError::Validation(errors) => {
                assert!(errors.get(Field::Name).is_some());
                assert!(errors.get(Field::Email).is_some());
            }
            other => panic!("Unexpected error: {:?}", other),
        }
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_blank_create_name_never_reaches_actor() {
        let (inner, mut receiver) = create_mock_client::<User>(10);
        let client = UserClient::new(inner);

        let err = client
            .create_user(&UserDraft::new("   ", "a@b.com"))
            .await
            .unwrap_err();
        match err {
            UserError::Validation(errors) => {
                assert_eq!(errors.get(Field::Name), Some("Name is required"));
            }
            other => panic!("Unexpected error: {:?}", other),
        }
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_create_sends_normalized_input() {
        let (inner, mut receiver) = create_mock_client::<User>(10);
        let client = UserClient::new(inner);

        let task = tokio::spawn(async move {
            client
                .create_user(&UserDraft::new("John Doe", "a@b.com").with_city(""))
                .await
        });

        let (input, responder) = expect_create(&mut receiver).await.expect("Expected Create request");
        assert_eq!(input.name.as_deref(), Some("John Doe"));
        assert_eq!(input.city, None);
        let user = User::new(UserId(42), "John Doe", "a@b.com");
        responder.send(Ok(user.clone())).unwrap();

        assert_eq!(task.await.unwrap(), Ok(user));
    }

    #[tokio::test]
    async fn test_update_with_name_skips_cache_lookup() {
        let (inner, mut receiver) = create_mock_client::<User>(10);
        let client = UserClient::new(inner);

        let task = tokio::spawn(async move {
            client
                .update_user(UserId(3), &UserDraft::new("Clementine", "c@x.com"))
                .await
        });

        let (id, input, responder) = expect_update(&mut receiver).await.expect("Expected Update request");
        assert_eq!(id, UserId(3));
        assert_eq!(input.email, "c@x.com");
        responder
            .send(Ok(User::new(UserId(3), "Clementine", "c@x.com")))
            .unwrap();
        assert!(task.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_update_blank_name_needs_cached_record() {
        let (inner, mut receiver) = create_mock_client::<User>(10);
        let client = UserClient::new(inner);

        let err = client
            .update_user(UserId(9), &UserDraft::new("", "c@x.com"))
            .await
            .unwrap_err();
        assert_eq!(err, UserError::NotFound(UserId(9)));
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_delete_forwards_id() {
        let (inner, mut receiver) = create_mock_client::<User>(10);
        let client = UserClient::new(inner);

        let task = tokio::spawn(async move { client.delete_user(UserId(5)).await });
        let (id, responder) = expect_delete(&mut receiver).await.expect("Expected Delete request");
        assert_eq!(id, UserId(5));
        responder.send(Ok(id)).unwrap();
        assert_eq!(task.await.unwrap(), Ok(UserId(5)));
    }
}
