use std::collections::{HashMap, VecDeque};

use tracing::{info, warn};

use crate::scene::SceneEngine;

use super::ConsoleState;

const MAX_PENDING_DEBUG_COMMANDS: usize = 128;
const INFO_LABEL_WIDTH: usize = 20;

/// Commands that need the scene engine and run once the processor is handed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebugCommand {
    ChangeScene { scene: u16 },
    SceneInfo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalAction {
    Help,
    Clear,
    Echo { text: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedCommand {
    Local(LocalAction),
    Queueable(DebugCommand),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandParseError {
    reason: String,
    usage: String,
}

impl CommandParseError {
    pub fn new(reason: impl Into<String>, usage: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            usage: usage.into(),
        }
    }
}

type ParseFn = dyn Fn(&[String]) -> Result<ParsedCommand, CommandParseError> + Send + Sync;
type BuiltinParse = fn(&[String]) -> Result<ParsedCommand, CommandParseError>;

struct CommandSpec {
    name: String,
    help: String,
    arg_schema: String,
    parse: Box<ParseFn>,
}

pub struct ConsoleCommandRegistry {
    specs: Vec<CommandSpec>,
    lookup_by_lower_name: HashMap<String, usize>,
}

impl Default for ConsoleCommandRegistry {
    fn default() -> Self {
        Self::with_scene_builtins()
    }
}

impl ConsoleCommandRegistry {
    pub fn empty() -> Self {
        Self {
            specs: Vec::new(),
            lookup_by_lower_name: HashMap::new(),
        }
    }

    pub fn with_scene_builtins() -> Self {
        let builtins: [(&str, &str, &str, BuiltinParse); 5] = [
            ("help", "List commands", "", parse_help_command),
            ("clear", "Clear console output", "", parse_clear_command),
            ("echo", "Print text to console", "<text...>", parse_echo_command),
            (
                "scene_change",
                "Jump to a scene by lookup table index",
                "<scene:u16>",
                parse_scene_change_command,
            ),
            (
                "scene_info",
                "Show the loaded scene descriptor",
                "",
                parse_scene_info_command,
            ),
        ];

        let mut registry = Self::empty();
        for (name, help, arg_schema, parse) in builtins {
            registry.insert_spec(CommandSpec {
                name: name.to_string(),
                help: help.to_string(),
                arg_schema: arg_schema.to_string(),
                parse: Box::new(parse),
            });
        }
        registry
    }

    pub fn register<F>(
        &mut self,
        name: impl Into<String>,
        help: impl Into<String>,
        arg_schema: impl Into<String>,
        parse: F,
    ) -> Result<(), String>
    where
        F: Fn(&[String]) -> Result<ParsedCommand, CommandParseError> + Send + Sync + 'static,
    {
        let name = name.into();
        if name.trim().is_empty() {
            return Err("command name cannot be empty".to_string());
        }
        if self.lookup(&name).is_some() {
            return Err(format!("duplicate command registration: {name}"));
        }

        self.insert_spec(CommandSpec {
            name,
            help: help.into(),
            arg_schema: arg_schema.into(),
            parse: Box::new(parse),
        });
        Ok(())
    }

    fn insert_spec(&mut self, spec: CommandSpec) {
        self.lookup_by_lower_name
            .insert(spec.name.to_ascii_lowercase(), self.specs.len());
        self.specs.push(spec);
    }

    fn lookup(&self, input_name: &str) -> Option<&CommandSpec> {
        let index = self
            .lookup_by_lower_name
            .get(&input_name.to_ascii_lowercase())?;
        self.specs.get(*index)
    }

    pub fn iter_specs_in_order(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.specs.iter().map(|spec| {
            (
                spec.name.as_str(),
                spec.help.as_str(),
                spec.arg_schema.as_str(),
            )
        })
    }
}

/// Parses console lines and holds the scene commands they produce until the
/// engine is available to run them.
#[derive(Default)]
pub struct ConsoleCommandProcessor {
    registry: ConsoleCommandRegistry,
    pending_debug_commands: VecDeque<DebugCommand>,
}

impl ConsoleCommandProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry_mut(&mut self) -> &mut ConsoleCommandRegistry {
        &mut self.registry
    }

    pub fn process_pending_lines(&mut self, console: &mut ConsoleState) {
        let mut lines = Vec::new();
        console.drain_pending_lines_into(&mut lines);

        for raw_line in lines {
            self.process_line(console, &raw_line);
        }
    }

    pub fn drain_pending_debug_commands_into(&mut self, out: &mut Vec<DebugCommand>) {
        out.extend(self.pending_debug_commands.drain(..));
    }

    /// Parses pending lines, then runs every queued scene command.
    pub fn run_pending(&mut self, console: &mut ConsoleState, engine: &mut SceneEngine) {
        self.process_pending_lines(console);
        let mut commands = Vec::new();
        self.drain_pending_debug_commands_into(&mut commands);
        apply_debug_commands(commands, console, engine);
    }

    fn process_line(&mut self, console: &mut ConsoleState, raw_line: &str) {
        let trimmed = raw_line.trim();
        if trimmed.is_empty() {
            return;
        }

        let tokens = match tokenize_line(trimmed) {
            Ok(tokens) => tokens,
            Err(reason) => {
                console.append_output_line(format!("error: {reason}. usage: help"));
                return;
            }
        };
        let Some((command_name, args)) = tokens.split_first() else {
            return;
        };
        let Some(spec) = self.registry.lookup(command_name) else {
            console.append_output_line(format!(
                "error: unknown command '{command_name}'. try: help"
            ));
            return;
        };

        match (spec.parse)(args) {
            Ok(ParsedCommand::Local(action)) => self.apply_local_action(console, action),
            Ok(ParsedCommand::Queueable(command)) => self.push_queueable(command),
            Err(error) => {
                console
                    .append_output_line(format!("error: {}. usage: {}", error.reason, error.usage));
            }
        }
    }

    fn apply_local_action(&self, console: &mut ConsoleState, action: LocalAction) {
        match action {
            LocalAction::Help => {
                for (name, help, arg_schema) in self.registry.iter_specs_in_order() {
                    let line = if arg_schema.is_empty() {
                        format!("{name} - {help}")
                    } else {
                        format!("{name} {arg_schema} - {help}")
                    };
                    console.append_output_line(line);
                }
            }
            LocalAction::Clear => console.clear_output_lines(),
            LocalAction::Echo { text } => console.append_output_line(text),
        }
    }

    fn push_queueable(&mut self, command: DebugCommand) {
        if self.pending_debug_commands.len() == MAX_PENDING_DEBUG_COMMANDS {
            self.pending_debug_commands.pop_front();
        }
        self.pending_debug_commands.push_back(command);
    }
}

pub fn apply_debug_commands(
    commands: Vec<DebugCommand>,
    console: &mut ConsoleState,
    engine: &mut SceneEngine,
) {
    for command in commands {
        match command {
            DebugCommand::ChangeScene { scene } => change_scene(console, engine, scene),
            DebugCommand::SceneInfo => {
                for line in scene_info_lines(engine) {
                    console.append_output_line(line);
                }
            }
        }
    }
}

fn change_scene(console: &mut ConsoleState, engine: &mut SceneEngine, scene: u16) {
    let max = engine.lut().max();
    if scene < 1 || usize::from(scene) > max {
        console.append_output_line("Invalid scene number.");
        return;
    }

    engine.clear_queue();
    match engine.change(scene) {
        Ok(()) => {
            info!(scene, "console_scene_changed");
            console.append_output_line("Scene changed.");
        }
        Err(error) => {
            warn!(scene, error = %error, "console_scene_change_failed");
            console.append_output_line("Couldn't change scene!");
        }
    }
}

fn scene_info_lines(engine: &SceneEngine) -> Vec<String> {
    let Some(descriptor) = engine.descriptor() else {
        return vec!["No scene loaded.".to_string()];
    };
    let optional = |value: Option<u16>| value.map_or_else(|| "-".to_string(), |v| v.to_string());

    [
        ("Scene number:", optional(engine.scene_number())),
        ("Descriptor R#:", optional(engine.descriptor_resource())),
        ("Unknown:", descriptor.reserved0.to_string()),
        ("Resource list R#:", descriptor.resource_list.to_string()),
        ("End slope:", descriptor.end_slope.to_string()),
        ("Begin slope:", descriptor.begin_slope.to_string()),
        ("Script resource:", descriptor.script_number.to_string()),
        ("Scene script:", descriptor.scene_script_number.to_string()),
        ("Start script:", descriptor.start_script_number.to_string()),
        ("Music R#:", descriptor.music.to_string()),
    ]
    .into_iter()
    .map(|(label, value)| format!("{label:<INFO_LABEL_WIDTH$} {value}"))
    .collect()
}

fn tokenize_line(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut pending_token = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                pending_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if pending_token {
                    tokens.push(std::mem::take(&mut current));
                    pending_token = false;
                }
            }
            _ => {
                current.push(ch);
                pending_token = true;
            }
        }
    }

    if in_quotes {
        return Err("unterminated quoted string".to_string());
    }
    if pending_token {
        tokens.push(current);
    }
    Ok(tokens)
}

fn parse_help_command(args: &[String]) -> Result<ParsedCommand, CommandParseError> {
    require_no_args(args, "help")?;
    Ok(ParsedCommand::Local(LocalAction::Help))
}

fn parse_clear_command(args: &[String]) -> Result<ParsedCommand, CommandParseError> {
    require_no_args(args, "clear")?;
    Ok(ParsedCommand::Local(LocalAction::Clear))
}

fn parse_echo_command(args: &[String]) -> Result<ParsedCommand, CommandParseError> {
    if args.is_empty() {
        return Err(CommandParseError::new(
            "missing required argument <text...>",
            "echo <text...>",
        ));
    }
    Ok(ParsedCommand::Local(LocalAction::Echo {
        text: args.join(" "),
    }))
}

fn parse_scene_change_command(args: &[String]) -> Result<ParsedCommand, CommandParseError> {
    let [scene] = args else {
        return Err(CommandParseError::new(
            "expected exactly one argument <scene>",
            "scene_change <scene>",
        ));
    };
    let scene = scene.parse::<u16>().map_err(|_| {
        CommandParseError::new(
            format!("invalid scene number '{scene}' (expected u16)"),
            "scene_change <scene>",
        )
    })?;
    Ok(ParsedCommand::Queueable(DebugCommand::ChangeScene { scene }))
}

fn parse_scene_info_command(args: &[String]) -> Result<ParsedCommand, CommandParseError> {
    require_no_args(args, "scene_info")?;
    Ok(ParsedCommand::Queueable(DebugCommand::SceneInfo))
}

fn require_no_args(args: &[String], usage: &str) -> Result<(), CommandParseError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(CommandParseError::new("unexpected extra arguments", usage))
    }
}
