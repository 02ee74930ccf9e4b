mod error;
mod models;
mod services;

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use services::board_render;
use services::command_parser::{self, Command};
use services::config_loader::{self, CryoliteConfig};
use services::scoreboard::Scoreboard;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// ICPC scoreboard engine with freeze/scroll reveal semantics.
#[derive(Parser, Debug)]
#[command(name = "cryolite")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Command stream to replay; reads stdin when omitted
    input: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_tracing(default_level: &str) -> Option<WorkerGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // Scoreboard output owns stdout; logs go to stderr and the log file.
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    let _ = fs::create_dir_all("logs");
    let file_appender = tracing_appender::rolling::daily("logs", "cryolite.log");
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(file_writer)
        .with_target(true);

    let init_result = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    if let Err(err) = init_result {
        eprintln!("tracing init failed: {err}");
        return None;
    }

    Some(file_guard)
}

/// Executes one command and writes its acknowledgement lines. Returns false
/// once END has been processed.
fn run_command(
    board: &mut Scoreboard,
    config: &CryoliteConfig,
    command: Command,
    out: &mut impl Write,
) -> Result<bool> {
    match command {
        Command::AddTeam { name } => match board.add_team(&name) {
            Ok(()) => writeln!(out, "[Info]Add successfully.")?,
            Err(err) => writeln!(out, "[Error]Add failed: {err}.")?,
        },
        Command::Start {
            duration_minutes,
            problem_count,
        } => match board.start(duration_minutes, problem_count) {
            Ok(()) => writeln!(out, "[Info]Competition starts.")?,
            Err(err) => writeln!(out, "[Error]Start failed: {err}.")?,
        },
        Command::Submit {
            problem,
            team,
            verdict,
            minute,
        } => {
            if let Err(err) = board.submit(&problem, &team, verdict, minute) {
                warn!("Rejected submission for {team} on {problem}: {err}");
            }
        }
        Command::Flush => {
            board.flush();
            writeln!(out, "[Info]Flush scoreboard.")?;
        }
        Command::Freeze => match board.freeze() {
            Ok(()) => writeln!(out, "[Info]Freeze scoreboard.")?,
            Err(err) => writeln!(out, "[Error]Freeze failed: {err}.")?,
        },
        Command::Scroll => match board.scroll() {
            Ok(report) => {
                writeln!(out, "[Info]Scroll scoreboard.")?;
                for row in &report.opening {
                    writeln!(out, "{}", board_render::format_row(row))?;
                }
                for change in &report.reveals {
                    writeln!(out, "{}", board_render::format_rank_change(change))?;
                }
                for row in &report.closing {
                    writeln!(out, "{}", board_render::format_row(row))?;
                }
            }
            Err(err) => writeln!(out, "[Error]Scroll failed: {err}.")?,
        },
        Command::QueryRanking { team } => match board.query_ranking(&team) {
            Ok((rank, frozen)) => {
                writeln!(out, "[Info]Complete query ranking.")?;
                if frozen {
                    writeln!(
                        out,
                        "[Warning]Scoreboard is frozen. The ranking may be inaccurate until it were scrolled."
                    )?;
                }
                writeln!(out, "{team} NOW AT RANKING {rank}")?;
            }
            Err(err) => writeln!(out, "[Error]Query ranking failed: {err}.")?,
        },
        Command::QuerySubmission {
            team,
            problem,
            verdict,
        } => match board.query_submission(&team, &problem, verdict) {
            Ok(Some(sub)) => {
                writeln!(out, "[Info]Complete query submission.")?;
                writeln!(
                    out,
                    "{team} {} {} {}",
                    sub.problem,
                    sub.verdict.label(),
                    sub.minute
                )?;
            }
            Ok(None) => {
                writeln!(out, "[Info]Complete query submission.")?;
                writeln!(out, "Cannot find any submission.")?;
            }
            Err(err) => writeln!(out, "[Error]Query submission failed: {err}.")?,
        },
        Command::End => {
            writeln!(out, "[Info]Competition ends.")?;
            if let Some(path) = &config.export_standings {
                board_render::export_standings(Path::new(path), &board.snapshot())?;
            }
            return Ok(false);
        }
    }
    Ok(true)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_tracing(&cli.log_level);
    info!("Starting cryolite");

    let config_dir = cli
        .input
        .as_deref()
        .and_then(Path::parent)
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let config = config_loader::load_config(config_dir).map_err(anyhow::Error::msg)?;

    let reader: Box<dyn BufRead> = match &cli.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut board = Scoreboard::new(config.penalty_minutes);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let mut line_no: u64 = 0;
    for line_result in reader.lines() {
        let line = line_result.context("reading command stream")?;
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }

        match command_parser::parse_command(&line) {
            Ok(command) => {
                if !run_command(&mut board, &config, command, &mut out)? {
                    break;
                }
            }
            Err(message) => error!("Line {line_no}: {message}"),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_script(script: &str) -> String {
        let config = CryoliteConfig::default();
        let mut board = Scoreboard::new(config.penalty_minutes);
        let mut out = Vec::new();
        for line in script.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let command = command_parser::parse_command(line).expect("valid script line");
            if !run_command(&mut board, &config, command, &mut out).expect("command runs") {
                break;
            }
        }
        String::from_utf8(out).expect("utf8 output")
    }

    #[test]
    fn full_session_transcript_is_reproduced() {
        let output = run_script(
            "ADDTEAM team_a\n\
             ADDTEAM team_b\n\
             START DURATION 300 PROBLEM 2\n\
             SUBMIT A BY team_a WITH Accepted AT 10\n\
             SUBMIT A BY team_b WITH Wrong_Answer AT 12\n\
             FLUSH\n\
             FREEZE\n\
             SUBMIT B BY team_b WITH Accepted AT 200\n\
             SCROLL\n\
             QUERY_RANKING team_b\n\
             END\n",
        );

        let expected = "\
            [Info]Add successfully.\n\
            [Info]Add successfully.\n\
            [Info]Competition starts.\n\
            [Info]Flush scoreboard.\n\
            [Info]Freeze scoreboard.\n\
            [Info]Scroll scoreboard.\n\
            team_a 1 1 10 + .\n\
            team_b 2 0 0 -1 0/1\n\
            team_a 1 1 10 + .\n\
            team_b 2 1 200 -1 +\n\
            [Info]Complete query ranking.\n\
            team_b NOW AT RANKING 2\n\
            [Info]Competition ends.\n";
        assert_eq!(output, expected);
    }

    #[test]
    fn scroll_transcript_reports_rank_changes() {
        let output = run_script(
            "ADDTEAM alpha\n\
             ADDTEAM beta\n\
             START DURATION 300 PROBLEM 2\n\
             SUBMIT A BY alpha WITH Accepted AT 10\n\
             FREEZE\n\
             SUBMIT A BY beta WITH Accepted AT 20\n\
             SUBMIT B BY beta WITH Accepted AT 30\n\
             SCROLL\n\
             END\n",
        );

        let expected = "\
            [Info]Add successfully.\n\
            [Info]Add successfully.\n\
            [Info]Competition starts.\n\
            [Info]Freeze scoreboard.\n\
            [Info]Scroll scoreboard.\n\
            alpha 1 1 10 + .\n\
            beta 2 0 0 0/1 0/1\n\
            beta alpha 2 50\n\
            beta 1 2 50 + +\n\
            alpha 2 1 10 + .\n\
            [Info]Competition ends.\n";
        assert_eq!(output, expected);
    }

    #[test]
    fn stateful_errors_are_reported_and_processing_continues() {
        let output = run_script(
            "ADDTEAM alpha\n\
             ADDTEAM alpha\n\
             START DURATION 120 PROBLEM 1\n\
             ADDTEAM beta\n\
             SCROLL\n\
             FREEZE\n\
             FREEZE\n\
             QUERY_RANKING beta\n\
             END\n",
        );

        let expected = "\
            [Info]Add successfully.\n\
            [Error]Add failed: duplicated team name.\n\
            [Info]Competition starts.\n\
            [Error]Add failed: competition has started.\n\
            [Error]Scroll failed: scoreboard has not been frozen.\n\
            [Info]Freeze scoreboard.\n\
            [Error]Freeze failed: scoreboard has been frozen.\n\
            [Error]Query ranking failed: cannot find the team.\n\
            [Info]Competition ends.\n";
        assert_eq!(output, expected);
    }
}
