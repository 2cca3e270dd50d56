mod cli;
mod config;
mod entry;
mod handlers;
mod state;

pub use entry::run;

pub(crate) const MAX_SEMANTIC_TOKENS: usize = 8000;
