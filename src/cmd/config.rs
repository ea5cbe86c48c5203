use std::io::{self, BufRead, Write};

use clap::{Args, Subcommand};

use crate::config::{StoredConfig, config_file_path};
use crate::error::AppResult;

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Run the interactive configuration wizard.
    Init,
    /// Show the stored configuration (secrets masked).
    Show,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Text,
    Secret,
    Flag,
    Seconds,
}

impl Format {
    /// Checks an answer before it is stored; `Err` holds the hint shown on retry.
    fn check(self, value: &str) -> Result<(), &'static str> {
        match self {
            Format::Text | Format::Secret => Ok(()),
            Format::Flag => match value.to_lowercase().as_str() {
                "true" | "false" | "yes" | "no" | "on" | "off" | "1" | "0" => Ok(()),
                _ => Err("answer true or false"),
            },
            Format::Seconds => match value.parse::<u64>() {
                Ok(secs) if secs > 0 => Ok(()),
                _ => Err("expected a positive number of seconds"),
            },
        }
    }
}

struct Setting {
    label: &'static str,
    format: Format,
    slot: fn(&mut StoredConfig) -> &mut Option<String>,
}

static SETTINGS: [Setting; 11] = [
    Setting {
        label: "Ticket API URL",
        format: Format::Text,
        slot: |cfg| &mut cfg.api_url,
    },
    Setting {
        label: "Ticket API token",
        format: Format::Secret,
        slot: |cfg| &mut cfg.api_token,
    },
    Setting {
        label: "Ticket API user",
        format: Format::Text,
        slot: |cfg| &mut cfg.api_user,
    },
    Setting {
        label: "Ticket API password",
        format: Format::Secret,
        slot: |cfg| &mut cfg.api_password,
    },
    Setting {
        label: "DBS reader URL",
        format: Format::Text,
        slot: |cfg| &mut cfg.dbs_url,
    },
    Setting {
        label: "Grid certificate (PEM)",
        format: Format::Text,
        slot: |cfg| &mut cfg.grid_cert,
    },
    Setting {
        label: "Grid key (PEM)",
        format: Format::Text,
        slot: |cfg| &mut cfg.grid_key,
    },
    Setting {
        label: "GitHub API URL",
        format: Format::Text,
        slot: |cfg| &mut cfg.github_url,
    },
    Setting {
        label: "Check CMSSW releases",
        format: Format::Flag,
        slot: |cfg| &mut cfg.check_release,
    },
    Setting {
        label: "HTTP timeout (seconds)",
        format: Format::Seconds,
        slot: |cfg| &mut cfg.http_timeout_secs,
    },
    Setting {
        label: "Session user",
        format: Format::Text,
        slot: |cfg| &mut cfg.user,
    },
];

pub fn run(command: ConfigCommand) -> AppResult<()> {
    match command {
        ConfigCommand::Init => run_init(),
        ConfigCommand::Show => run_show(),
    }
}

fn run_init() -> AppResult<()> {
    let mut cfg = StoredConfig::load()?;

    println!("Configuring relval.");
    println!("Press Enter to keep the current value, '-' to clear it.");
    println!("Secrets are stored in plain text in the config file.");
    println!();

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    for setting in SETTINGS.iter() {
        let slot = (setting.slot)(&mut cfg);
        match ask(&mut input, &mut output, setting, slot.as_deref())? {
            Answer::Keep => {}
            Answer::Clear => *slot = None,
            Answer::Set(value) => *slot = Some(value),
        }
    }

    cfg.save()?;
    println!("\nConfiguration saved to {}", config_file_path()?.display());
    Ok(())
}

fn run_show() -> AppResult<()> {
    let mut cfg = StoredConfig::load()?;

    println!("Configuration file: {}", config_file_path()?.display());
    for setting in SETTINGS.iter() {
        let value = (setting.slot)(&mut cfg).as_deref();
        println!("{}: {}", setting.label, show_value(setting.format, value));
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Answer {
    Keep,
    Clear,
    Set(String),
}

/// Prompts until the answer fits the setting's format. End of input keeps
/// the current value.
fn ask(
    input: &mut impl BufRead,
    output: &mut impl Write,
    setting: &Setting,
    current: Option<&str>,
) -> AppResult<Answer> {
    loop {
        match current {
            Some(_) if setting.format == Format::Secret => {
                write!(output, "{} [****]: ", setting.label)?
            }
            Some(value) => write!(output, "{} [{value}]: ", setting.label)?,
            None => write!(output, "{}: ", setting.label)?,
        }
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(Answer::Keep);
        }
        let answer = match line.trim() {
            "" => Answer::Keep,
            "-" => Answer::Clear,
            value => match setting.format.check(value) {
                Ok(()) => Answer::Set(value.to_string()),
                Err(hint) => {
                    writeln!(output, "  {hint}")?;
                    continue;
                }
            },
        };
        return Ok(answer);
    }
}

fn show_value(format: Format, value: Option<&str>) -> String {
    match value.filter(|value| !value.is_empty()) {
        None => "<not set>".to_string(),
        Some(secret) if format == Format::Secret => mask_secret(secret),
        Some(value) => value.to_string(),
    }
}

fn mask_secret(secret: &str) -> String {
    let chars = secret.chars().collect::<Vec<_>>();
    if chars.len() <= 6 {
        return "***".to_string();
    }
    let head = chars[..3].iter().collect::<String>();
    let tail = chars[chars.len() - 3..].iter().collect::<String>();
    format!("{head}***{tail}")
}
