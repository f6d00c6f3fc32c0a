pub mod cli;
pub mod error;
pub mod io;
pub mod process;
pub mod report;
