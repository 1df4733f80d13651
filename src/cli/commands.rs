use std::io::{self, BufRead, Read};
use std::path::Path;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use itertools::Itertools;
use tracing::{debug, info, instrument};

use crate::application::services::{Outcome, Session};
use crate::application::HELP;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, Settings};

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Run { script, keep_going }) => _run(cli, script, *keep_going),
        Some(Commands::Shell) => _shell(cli),
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Show => _config_show(cli),
            ConfigCommands::Path => _config_path(),
        },
        Some(Commands::Completion { shell }) => {
            _completion(*shell);
            Ok(())
        }
        None => Err(CliError::Usage("no command given, try --help".to_string())),
    }
}

fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let settings = Settings::load(cli.config.as_deref())?;
    debug!("settings: {:?}", settings);
    Ok(settings)
}

#[instrument(skip(cli))]
fn _run(cli: &Cli, script: &Path, keep_going: bool) -> CliResult<()> {
    let settings = load_settings(cli)?;
    let content = read_script(script)?;
    let mut session = Session::new(&settings);
    let precision = session.precision();
    let executed = run_script(&mut session, &content, keep_going, |outcome| {
        print_outcome(outcome, precision)
    })?;
    info!("executed {} commands", executed);
    Ok(())
}

fn read_script(script: &Path) -> CliResult<String> {
    if script == Path::new("-") {
        let mut content = String::new();
        io::stdin()
            .read_to_string(&mut content)
            .map_err(|e| CliError::io("read script from stdin", e))?;
        Ok(content)
    } else {
        std::fs::read_to_string(script)
            .map_err(|e| CliError::io(format!("read script {}", script.display()), e))
    }
}

/// Execute every line of `script` against `session`, handing each outcome
/// to `emit`. Returns the number of commands executed successfully.
///
/// Stops at the first failing line unless `keep_going` is set, in which case
/// failures are reported and counted and the run fails at the end.
pub fn run_script<F>(
    session: &mut Session,
    script: &str,
    keep_going: bool,
    mut emit: F,
) -> CliResult<usize>
where
    F: FnMut(&Outcome),
{
    let mut executed = 0;
    let mut failed = 0;

    for (number, line) in script.lines().enumerate() {
        match session.execute_line(line) {
            Ok(Some(outcome)) => {
                executed += 1;
                emit(&outcome);
            }
            Ok(None) => {}
            Err(source) if keep_going => {
                failed += 1;
                output::error(&format!("line {}: {}", number + 1, source));
            }
            Err(source) => {
                return Err(CliError::Script {
                    line: number + 1,
                    source,
                })
            }
        }
    }

    if failed > 0 {
        return Err(CliError::ScriptFailures { failed });
    }
    Ok(executed)
}

#[instrument(skip(cli))]
fn _shell(cli: &Cli) -> CliResult<()> {
    let settings = load_settings(cli)?;
    let mut session = Session::new(&settings);
    let stdin = io::stdin();
    let mut input = stdin.lock();
    output::header("dectree shell ('help' for commands, 'quit' to leave)");

    loop {
        output::prompt("dectree>");
        let mut line = String::new();
        let read = input
            .read_line(&mut line)
            .map_err(|e| CliError::io("read command", e))?;
        if read == 0 {
            break;
        }
        let trimmed = line.trim();
        if trimmed == "quit" || trimmed == "exit" {
            break;
        }
        match session.execute_line(trimmed) {
            Ok(Some(outcome)) => print_outcome(&outcome, session.precision()),
            Ok(None) => {}
            Err(e) => output::error(&e),
        }
    }
    Ok(())
}

fn _config_show(cli: &Cli) -> CliResult<()> {
    let settings = load_settings(cli)?;
    output::info(settings.to_toml()?.trim_end());
    Ok(())
}

fn _config_path() -> CliResult<()> {
    match global_config_path() {
        Some(path) => output::info(&path.display()),
        None => output::detail("no config directory available on this platform"),
    }
    Ok(())
}

fn _completion(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}

pub fn print_outcome(outcome: &Outcome, precision: usize) {
    match outcome {
        Outcome::Selected(target) => output::action("selected", target),
        Outcome::KindChosen(kind) => output::action("kind", kind),
        Outcome::Created { id, kind, parent } => {
            let parent = parent
                .as_ref()
                .map(|p| p.to_string())
                .unwrap_or_else(|| "root".to_string());
            output::success(&format!("added {} {} under {}", kind, id, parent));
        }
        Outcome::Updated(id) => output::success(&format!("updated {}", id)),
        Outcome::Removed { target, count } => match (target, count) {
            (Some(target), n) if *n > 0 => {
                output::success(&format!("removed {} ({} nodes)", target, n))
            }
            _ => output::detail("nothing removed"),
        },
        Outcome::Node(line) => output::info(line),
        Outcome::Listing(lines) if lines.is_empty() => output::detail("(empty)"),
        Outcome::Listing(lines) => output::info(&lines.iter().join("\n")),
        Outcome::Tree(rendered) => output::info(rendered.trim_end()),
        Outcome::Value { id, value } => output::info(&format!("{}: {:.*}", id, precision, value)),
        Outcome::Chances(values) => {
            output::header("Chance nodes");
            for value in values {
                output::info(&format!(
                    "ID: {}, Expected Value: {:.*}",
                    value.id, precision, value.expected_value
                ));
            }
        }
        Outcome::Help => output::info(HELP),
    }
}
