pub mod chat;
pub mod onboard;
pub mod relay;
pub mod status;
