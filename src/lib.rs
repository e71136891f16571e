pub mod app;
pub mod error;
pub mod output;
pub mod probes;
pub mod record;
pub mod report;
pub mod utils;
pub mod wordlist;
