pub mod handlers;
pub mod ports;
pub mod services;
