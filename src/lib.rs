pub mod config;
pub mod decode;
pub mod extract;
pub mod golden;
pub mod history;
pub mod lookup;
pub mod output;
pub mod period;
pub mod programs;
pub mod record;
pub mod report;
pub mod runner;

#[cfg(test)]
mod testutil;
