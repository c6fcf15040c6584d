pub mod config;
pub mod history;
pub mod run;
pub mod splits;
pub mod stats;
