mod app;

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

enum CommandKind {
    Pack { manifest: PathBuf, out: PathBuf },
    Play { config: PathBuf },
}

fn main() -> ExitCode {
    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::from(1)
        }
    }
}

fn run_cli() -> Result<(), String> {
    let args = env::args().skip(1).collect::<Vec<_>>();
    if args.is_empty() {
        return Err(usage_text());
    }
    if args[0] == "-h" || args[0] == "--help" {
        print_usage();
        return Ok(());
    }

    let command_args = &args[1..];
    let kind = match args[0].as_str() {
        "pack" => match command_args {
            [manifest, out] => CommandKind::Pack {
                manifest: PathBuf::from(manifest),
                out: PathBuf::from(out),
            },
            _ => return Err("pack requires <manifest.xml> <out.rsca>".to_string()),
        },
        "play" => match command_args {
            [config] => CommandKind::Play {
                config: PathBuf::from(config),
            },
            _ => return Err("play requires <config.json>".to_string()),
        },
        other => return Err(format!("unknown subcommand '{other}'\n{}", usage_text())),
    };

    let result = match kind {
        CommandKind::Pack { manifest, out } => app::run_pack(&manifest, &out),
        CommandKind::Play { config } => app::run_play(&config),
    };
    result.map_err(|error| error.to_string())
}

fn print_usage() {
    println!("{}", usage_text());
}

fn usage_text() -> String {
    [
        "usage: scene_runner <command>",
        "",
        "commands:",
        "  pack <manifest.xml> <out.rsca>   compile an XML manifest into a resource archive",
        "  play <config.json>               run a headless scene session",
        "",
        "RUST_LOG controls log verbosity (default: info).",
    ]
    .join("\n")
}
