mod disassemble;
mod interrupt;
mod logging;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use saveanytime::{
    is_affirmative,
    locator::DEFAULT_STEAM_DIR,
    patcher,
    patches::{Direction, PatchSite, SAVE_ANYWHERE},
    LocatorConfig, Outcome, Target,
};

const USAGE: &str = "Usage: saveanytime [--unpatch] [path]";

#[derive(Parser)]
#[command(name = "saveanytime")]
#[command(version = env!("SAVEANYTIME_VERSION"))]
#[command(about = "Patch Cyberpunk 2077 to allow saving at any time", long_about = None)]
struct Cli {
    /// Unpatch the game (restore original save restrictions)
    #[arg(long)]
    unpatch: bool,

    /// Path to Cyberpunk 2077 directory or executable
    path: Option<PathBuf>,

    /// Locate the bytes to change and show them, but do not modify the executable
    #[arg(long)]
    dry_run: bool,

    /// Show debug logging and disassembly of the patched instructions
    #[arg(short, long)]
    verbose: bool,

    /// Install directory probed when no path is given
    #[arg(long, hide = true, default_value = DEFAULT_STEAM_DIR)]
    default_dir: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = logging::setup_logging(cli.verbose) {
        eprintln!("failed to initialize logging: {err}");
    }

    if let Err(err) = interrupt::install() {
        tracing::warn!("failed to install Ctrl-C handler: {err}");
    }

    let outcome = run(&cli);
    tracing::debug!("finished with {outcome:?}");

    pause();

    std::process::exit(outcome.exit_code());
}

/// Keep the window open when launched outside a terminal. After Ctrl-C the prompt is already on
/// screen and may already have been answered.
fn pause() {
    if interrupt::acknowledged() {
        return;
    }
    let message = if interrupt::interrupted() {
        ""
    } else {
        interrupt::EXIT_PROMPT
    };
    if let Err(err) = prompt(message) {
        tracing::debug!("exit prompt failed: {err}");
    }
}

fn run(cli: &Cli) -> Outcome {
    let config = LocatorConfig::default().default_install_dir(&cli.default_dir);

    let exe_path = match locate(&config, cli.path.as_deref()) {
        Ok(exe_path) => exe_path,
        Err(outcome) => return outcome,
    };

    let direction = Direction::new(cli.unpatch);
    match patch_exe(&exe_path, &SAVE_ANYWHERE, direction, cli) {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::debug!("{err:#}");
            eprintln!("{}", format!("Error: {err:?}").red());
            Outcome::Failed
        }
    }
}

/// Resolve the executable, asking before using the default install. Reports why there is
/// nothing to patch on failure.
fn locate(config: &LocatorConfig, path: Option<&Path>) -> Result<PathBuf, Outcome> {
    let outcome = match config.target(path) {
        Ok(Target::Exe(exe_path)) => return Ok(exe_path),
        Ok(Target::ConfirmDefault(exe_path)) => {
            println!("Found Cyberpunk 2077 at: {}", exe_path.display());
            match prompt("Use this executable? (y/n): ") {
                Ok(answer) if is_affirmative(&answer) => return Ok(exe_path),
                Ok(_) => {}
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {
                    return Err(Outcome::Interrupted);
                }
                Err(err) => tracing::warn!("failed to read answer: {err}"),
            }
            Outcome::Declined
        }
        Ok(Target::NoDefault) => {
            println!("Could not find Cyberpunk 2077 in Steam directory.");
            Outcome::NoInstallFound
        }
        Err(err) => {
            println!("{}", format!("Error: {err}").red());
            println!("{USAGE}");
            return Err(Outcome::ExeNotFound);
        }
    };
    println!("Please rerun and specify the path manually.");
    Err(outcome)
}

fn patch_exe(
    exe_path: &Path,
    site: &PatchSite,
    direction: Direction,
    cli: &Cli,
) -> Result<Outcome> {
    let action = direction.action();
    tracing::debug!("{}: {}", site.name, site.description);
    println!("{action}: {}", exe_path.display());
    println!("{action} binary...");

    let offset = patcher::locate(exe_path, site, direction)?;
    tracing::info!("found {} at offset {offset:#x}", site.name);

    if interrupt::interrupted() {
        return Ok(Outcome::Interrupted);
    }

    if cli.verbose || cli.dry_run {
        let current = patcher::read_bytes(exe_path, offset, site.len())
            .with_context(|| format!("failed to read back {}", exe_path.display()))?;
        println!("current:\n{}", disassemble::disassemble(offset, &current, None));
        println!(
            "{}:\n{}",
            direction.target_state(),
            disassemble::disassemble(offset, site.replace(direction), Some(current.as_slice()))
        );
    }

    if cli.dry_run {
        println!(
            "Dry run: would write {} bytes at offset {offset:#x}.",
            site.len()
        );
        return Ok(Outcome::DryRun { offset });
    }

    if interrupt::interrupted() {
        return Ok(Outcome::Interrupted);
    }
    patcher::write_site(exe_path, offset, site, direction)?;
    println!(
        "{}",
        format!("{action} complete (offset {offset:#x}).").green()
    );
    Ok(Outcome::Applied { offset })
}

/// Print `message` and read one line. EOF reads as an empty answer. A line read after Ctrl-C
/// answers the exit prompt instead and is reported as `ErrorKind::Interrupted`.
fn prompt(message: &str) -> io::Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{message}")?;
    stdout.flush()?;

    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    if interrupt::interrupted() {
        interrupt::acknowledge();
        return Err(io::ErrorKind::Interrupted.into());
    }
    Ok(answer)
}
