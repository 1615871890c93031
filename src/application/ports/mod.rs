pub mod connectivity;
pub mod key_value_store;
pub mod remote_gateway;
pub mod sync_events;

pub use connectivity::Connectivity;
pub use key_value_store::KeyValueStore;
pub use remote_gateway::RemoteGateway;
pub use sync_events::SyncEventEmitter;
