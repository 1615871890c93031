use async_trait::async_trait;

#[async_trait]
pub trait Connectivity: Send + Sync {
    async fn is_online(&self) -> bool;
}
