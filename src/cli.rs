//! Command-line interface and REPL

use crate::annotation::{DisplayEvent, Region, RegionId};
use crate::app::{App, Navigation};
use anyhow::{anyhow, bail, Context, Result};
use colored::*;
use rustyline::DefaultEditor;
use std::path::{Path, PathBuf};
use tracing::warn;

/// One REPL command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Folder(PathBuf),
    Ready,
    Created { id: String, region: Region },
    Updated { id: String, region: Region },
    Exited { id: String },
    Play,
    Accept,
    Skip,
    Prev,
    Status,
    LabelsDir,
    Help,
    Quit,
}

const HELP: &str = "\
folder <path>               select a folder of audio files
ready                       display finished loading the current file
created <id> <start> <end>  a region was drawn on the waveform
updated <id> <start> <end>  a region was moved or resized
exited <id>                 playback left a region
play                        play from the entire region (point muted)
accept | next               save the annotation and go to the next file
skip                        skip the current file
prev                        return to the last decided file
status                      show the current file and phase
labels-dir                  print the label output directory
quit | exit                 leave";

fn parse_region(args: &[&str]) -> Result<(String, Region)> {
    let [id, start, end] = args else {
        bail!("expected <id> <start> <end>");
    };
    let start: f64 = start
        .parse()
        .with_context(|| format!("invalid start time '{}'", start))?;
    let end: f64 = end
        .parse()
        .with_context(|| format!("invalid end time '{}'", end))?;
    Ok((id.to_string(), Region::new(start, end)))
}

/// Parse one input line; blank lines yield `None`
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    let Some((verb, rest)) = line
        .split_once(char::is_whitespace)
        .map(|(v, r)| (v, r.trim()))
        .or_else(|| (!line.is_empty()).then_some((line, "")))
    else {
        return Ok(None);
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    let command = match verb.to_lowercase().as_str() {
        "folder" | "open" => {
            if rest.is_empty() {
                bail!("usage: folder <path>");
            }
            Command::Folder(PathBuf::from(rest))
        }
        "ready" => Command::Ready,
        "created" => {
            let (id, region) = parse_region(&args)?;
            Command::Created { id, region }
        }
        "updated" => {
            let (id, region) = parse_region(&args)?;
            Command::Updated { id, region }
        }
        "exited" => match args.as_slice() {
            [id] => Command::Exited { id: id.to_string() },
            _ => bail!("usage: exited <id>"),
        }
        "play" | "space" => Command::Play,
        "accept" | "next" => Command::Accept,
        "skip" => Command::Skip,
        "prev" | "back" => Command::Prev,
        "status" => Command::Status,
        "labels-dir" => Command::LabelsDir,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(anyhow!("unknown command '{}' (try 'help')", other)),
    };
    Ok(Some(command))
}

/// Report a navigation outcome; the console transport has nothing to decode,
/// so a freshly loaded file is immediately ready
fn navigated(app: &mut App, nav: Navigation) -> Result<()> {
    print_navigation(&nav);
    if matches!(nav, Navigation::Loaded(_)) {
        app.handle_event(DisplayEvent::Ready)?;
    }
    Ok(())
}

fn print_navigation(nav: &Navigation) {
    match nav {
        Navigation::Loaded(file) => println!("{} {}", "▶".green(), file.bold()),
        Navigation::Exhausted => println!("{}", "All files handled.".green()),
        Navigation::NoHistory => println!("{}", "No processed file to go back to.".yellow()),
        Navigation::Idle => println!("{}", "No file selected.".yellow()),
    }
}

fn print_status(app: &App) {
    let status = app.status();
    let folder = status
        .folder
        .as_ref()
        .map(|f| f.display().to_string())
        .unwrap_or_else(|| "(none)".to_string());

    println!("  {:<10} {}", "Path".bold(), folder);
    println!("  {:<10} {}", "Remaining".bold(), status.remaining.to_string().cyan());
    println!(
        "  {:<10} {}",
        "File".bold(),
        status.file.as_deref().unwrap_or("(none)")
    );
    println!("  {:<10} {} ({})", "Phase".bold(), status.phase.label().cyan(), status.phase);
    println!("  {:<10} {:.2}s", "Position".bold(), status.position);

    let regions = app.annotator().regions();
    if let Some(entire) = regions.entire() {
        println!(
            "  {:<10} [{}] {:.2} - {:.2}",
            "Entire".bold(),
            entire.id,
            entire.region.start,
            entire.region.end
        );
    }
    if let Some(point) = regions.point() {
        println!(
            "  {:<10} [{}] {:.2} - {:.2}",
            "Point".bold(),
            point.id,
            point.region.start,
            point.region.end
        );
    }
}

/// Execute one command; returns `false` when the REPL should stop
pub async fn execute(app: &mut App, command: Command, labels_dir: &Path) -> Result<bool> {
    match command {
        Command::Folder(path) => {
            let nav = app.select_folder(&path).await?;
            navigated(app, nav)?
        }
        Command::Ready => app.handle_event(DisplayEvent::Ready)?,
        Command::Created { id, region } => app.handle_event(DisplayEvent::RegionCreated {
            id: RegionId::new(id),
            region,
        })?,
        Command::Updated { id, region } => app.handle_event(DisplayEvent::RegionUpdated {
            id: RegionId::new(id),
            region,
        })?,
        Command::Exited { id } => app.handle_event(DisplayEvent::RegionExited {
            id: RegionId::new(id),
        })?,
        Command::Play => {
            let schedule = app.play()?;
            for point in schedule.points() {
                println!("  gain {:.0} at clock {:.3}s", point.gain, point.at);
            }
        }
        Command::Accept => {
            let nav = app.accept().await?;
            navigated(app, nav)?
        }
        Command::Skip => {
            let nav = app.skip().await?;
            navigated(app, nav)?
        }
        Command::Prev => {
            let nav = app.prev().await?;
            navigated(app, nav)?
        }
        Command::Status => print_status(app),
        Command::LabelsDir => println!("{}", labels_dir.display()),
        Command::Help => println!("{}", HELP),
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

pub async fn run_repl(app: &mut App, labels_dir: &Path) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    loop {
        let readline = rl.readline("annotate> ");
        match readline {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());
                let command = match parse_command(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(e) => {
                        println!("{} {}", "✗".red(), e);
                        continue;
                    }
                };
                match execute(app, command, labels_dir).await {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => {
                        warn!("Command failed: {:#}", e);
                        println!("{} {:#}", "✗".red(), e);
                    }
                }
            }
            Err(_) => break,
        }
    }

    Ok(())
}
