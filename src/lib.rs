pub mod api;
pub mod client;
pub mod config;
pub mod models;
pub mod qr;
pub mod redirect;
pub mod server;
pub mod slug;
pub mod storage;
pub mod url_validator;
