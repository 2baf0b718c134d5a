pub mod console;
pub mod migrate;

pub use console::ConsoleSink;
pub use migrate::MigrateCommand;
