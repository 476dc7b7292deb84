mod console;
mod console_commands;

pub use console::ConsoleState;
pub use console_commands::{
    apply_debug_commands, CommandParseError, ConsoleCommandProcessor, ConsoleCommandRegistry,
    DebugCommand, LocalAction, ParsedCommand,
};
