pub mod errors;
pub mod events;
pub mod message;
pub mod session;
pub mod settings;
pub mod tab;
