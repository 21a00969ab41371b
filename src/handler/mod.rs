mod file_handler;

pub use file_handler::{configure, FileHandler};
