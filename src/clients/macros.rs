/// Generates the delegating methods every cache-backed client shares, mapping
/// framework errors into the client's own error type.
#[macro_export]
macro_rules! impl_cache_client {
    ($client_name:ident, $entity:ty, $error:ty, $entity_name_snake:ident) => {
        paste::paste! {
            impl $client_name {
                pub fn new(inner: $crate::cache_framework::CacheClient<$entity>) -> Self {
                    Self { inner }
                }

                #[tracing::instrument(skip(self))]
                pub async fn [<list_ $entity_name_snake s>](
                    &self,
                ) -> Result<$crate::cache_framework::Collection<$entity>, $error> {
                    tracing::debug!("Sending request");
                    self.inner.list().await.map_err(<$error>::from)
                }

                #[tracing::instrument(skip(self))]
                pub async fn [<refetch_ $entity_name_snake s>](
                    &self,
                ) -> Result<$crate::cache_framework::Collection<$entity>, $error> {
                    tracing::debug!("Sending request");
                    self.inner.refetch().await.map_err(<$error>::from)
                }

                #[tracing::instrument(skip(self))]
                pub async fn [<delete_ $entity_name_snake>](
                    &self,
                    id: <$entity as $crate::cache_framework::Entity>::Id,
                ) -> Result<<$entity as $crate::cache_framework::Entity>::Id, $error> {
                    tracing::debug!("Sending request");
                    self.inner.delete(id).await.map_err(<$error>::from)
                }

                pub async fn reset_mutation(
                    &self,
                    kind: $crate::cache_framework::MutationKind,
                ) -> Result<(), $error> {
                    self.inner.reset_mutation(kind).await.map_err(<$error>::from)
                }

                pub async fn shutdown(&self) -> Result<(), $error> {
                    self.inner.shutdown().await.map_err(<$error>::from)
                }

                pub fn snapshot(&self) -> $crate::cache_framework::CacheSnapshot<$entity> {
                    self.inner.snapshot()
                }

                pub fn subscribe(
                    &self,
                ) -> tokio::sync::watch::Receiver<$crate::cache_framework::CacheSnapshot<$entity>> {
                    self.inner.subscribe()
                }

                pub fn notifications(
                    &self,
                ) -> tokio::sync::broadcast::Receiver<$crate::notify::Notification> {
                    self.inner.notifications()
                }
            }
        }
    };
}
