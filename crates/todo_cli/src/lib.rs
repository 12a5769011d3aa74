pub mod backend;
pub mod cli;
pub mod output;
pub mod session;
