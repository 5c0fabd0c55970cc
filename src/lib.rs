pub mod aggregate;
pub mod analysis;
pub mod app;
pub mod blame;
pub mod cli;
pub mod config;
pub mod error;
pub mod fileset;
pub mod git;
pub mod identity;
pub mod issue;
pub mod process;
pub mod provider;
pub mod report;
pub mod watch;

#[cfg(test)]
pub mod test_helpers;
