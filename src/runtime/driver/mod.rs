pub mod terminal;

pub use terminal::{DriverResult, TerminalDriver, TerminalDriverError, TerminalPointer};
