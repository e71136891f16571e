pub mod dns;
pub mod port;
pub mod web;
