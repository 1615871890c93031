pub mod network_state;

pub use network_state::NetworkState;
