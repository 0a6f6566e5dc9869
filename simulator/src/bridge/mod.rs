pub mod board;
pub mod server;
