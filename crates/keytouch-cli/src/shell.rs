use crate::Commands;
use anyhow::Result;
use clap::Parser;
use std::io::{BufRead, Write};

#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_help_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: Commands,
}

pub enum Line {
    Run(Commands),
    Help,
    Exit,
    Empty,
    Invalid(String),
}

pub fn parse_line(line: &str) -> Line {
    let words: Vec<&str> = line.split_whitespace().collect();
    match words.first().copied() {
        None => Line::Empty,
        Some("help") => Line::Help,
        Some("exit") | Some("quit") => Line::Exit,
        Some("shell") => Line::Invalid("already in the shell".into()),
        Some(_) => match ShellLine::try_parse_from(words.iter().copied()) {
            Ok(parsed) => Line::Run(parsed.command),
            Err(e) => Line::Invalid(e.to_string()),
        },
    }
}

const HELP: &str = "\
commands:
  list                      list mapping files
  show <name>               print a mapping with its pointer ids
  start <name> [--target <app>] [--focus-gating] [--keepalive-ms N] [--quit-hotkey KEYS]
  qs                        repeat the last start
  create <name>             record a new mapping
  help                      this text
  exit                      leave the shell";

/// Read commands until `exit` or end of input. A failing command is
/// reported and the prompt continues.
pub fn run<R, W, F>(input: &mut R, out: &mut W, mut exec: F) -> Result<()>
where
    R: BufRead,
    W: Write,
    F: FnMut(Commands) -> Result<()>,
{
    writeln!(out, "keytouch shell. Type 'help' for commands.")?;
    loop {
        write!(out, "> ")?;
        out.flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        match parse_line(&line) {
            Line::Empty => {}
            Line::Help => writeln!(out, "{}", HELP)?,
            Line::Exit => break,
            Line::Invalid(message) => writeln!(out, "{}", message.trim_end())?,
            Line::Run(command) => {
                if let Err(e) = exec(command) {
                    writeln!(out, "error: {:#}", e)?;
                }
            }
        }
    }
    Ok(())
}
