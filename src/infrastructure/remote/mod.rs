pub mod memory_gateway;

pub use memory_gateway::InMemoryRemoteGateway;
