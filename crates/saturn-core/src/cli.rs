use std::io::IsTerminal;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::anyhow;
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::range::SelectionMode;
use crate::view::{CalendarView, Key, KeyPress};

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = crate::config::parse_override(s)?;
        Ok(Self { key, value })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "saturn",
    version,
    about = "Saturn: date and date-range picker engine",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Config file; defaults to $SATURN_CONFIG, ./saturn.toml, then the user config dir.
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Config override such as `picker.rtl=on`.
    #[arg(
        long = "set",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub overrides: Vec<KeyVal>,

    /// Machine-readable output.
    #[arg(long = "json", global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Render the calendar grid.
    Month {
        /// ISO 8601 date to open at; defaults to today.
        date: Option<String>,
        #[arg(long = "view", value_parser = parse_view)]
        view: Option<CalendarView>,
        #[arg(long = "mode", value_parser = parse_mode)]
        mode: Option<SelectionMode>,
        /// Value to show as selected, typed as in the input.
        #[arg(long = "select")]
        select: Option<String>,
    },
    /// Replay input, calendar and keyboard steps against a picker.
    Pick {
        #[arg(long = "mode", value_parser = parse_mode)]
        mode: Option<SelectionMode>,
        /// Steps such as `open`, `click:5`, `key:alt+down`, `type:2024-01-05`.
        #[arg(required = true)]
        steps: Vec<Step>,
    },
    /// Parse and validate input text.
    Parse {
        text: String,
        #[arg(long = "mode", value_parser = parse_mode)]
        mode: Option<SelectionMode>,
    },
    /// Print the effective configuration.
    Config,
}

fn parse_mode(s: &str) -> anyhow::Result<SelectionMode> {
    s.parse()
}

fn parse_view(s: &str) -> anyhow::Result<CalendarView> {
    s.parse()
}

/// One scripted interaction for `saturn pick`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Open,
    Close,
    Toggle,
    Click(u32),
    Hover(u32),
    Key(KeyPress),
    Type(String),
    Commit,
    Blur,
    Previous,
    Next,
    Period,
    Shortcut(String),
    Mode(SelectionMode),
}

impl FromStr for Step {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, arg) = match s.split_once(':') {
            Some((name, arg)) => (name.trim(), Some(arg)),
            None => (s.trim(), None),
        };
        let cell = |arg: Option<&str>| -> anyhow::Result<u32> {
            let raw = arg.ok_or_else(|| anyhow!("step `{s}` needs a cell value"))?;
            raw.trim()
                .parse::<u32>()
                .map_err(|e| anyhow!("invalid cell value in `{s}`: {e}"))
        };

        match (name.to_ascii_lowercase().as_str(), arg) {
            ("open", None) => Ok(Self::Open),
            ("close", None) => Ok(Self::Close),
            ("toggle", None) => Ok(Self::Toggle),
            ("commit", None) => Ok(Self::Commit),
            ("blur", None) => Ok(Self::Blur),
            ("prev" | "previous", None) => Ok(Self::Previous),
            ("next", None) => Ok(Self::Next),
            ("period", None) => Ok(Self::Period),
            ("click", arg) => Ok(Self::Click(cell(arg)?)),
            ("hover", arg) => Ok(Self::Hover(cell(arg)?)),
            ("key", Some(arg)) => Ok(Self::Key(parse_key(arg)?)),
            ("type", Some(arg)) => Ok(Self::Type(arg.to_string())),
            ("shortcut", Some(arg)) => Ok(Self::Shortcut(arg.trim().to_string())),
            ("mode", Some(arg)) => Ok(Self::Mode(arg.parse()?)),
            _ => Err(anyhow!("unknown step `{s}`")),
        }
    }
}

fn parse_key(raw: &str) -> anyhow::Result<KeyPress> {
    let raw = raw.trim();
    let (alt, name) = match raw.to_ascii_lowercase().strip_prefix("alt+") {
        Some(rest) => (true, rest.to_string()),
        None => (false, raw.to_string()),
    };
    let key = Key::from_name(&name);
    if key == Key::Other {
        return Err(anyhow!("unknown key `{raw}`"));
    }
    Ok(if alt {
        KeyPress::alt(key)
    } else {
        KeyPress::plain(key)
    })
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Command, GlobalCli, Step};
    use crate::range::SelectionMode;
    use crate::view::{Key, KeyPress};

    #[test]
    fn steps_parse() {
        assert_eq!("open".parse::<Step>().expect("step"), Step::Open);
        assert_eq!("click:20".parse::<Step>().expect("step"), Step::Click(20));
        assert_eq!(
            "key:Alt+ArrowDown".parse::<Step>().expect("step"),
            Step::Key(KeyPress::alt(Key::Down))
        );
        assert_eq!(
            "type:2024-01-05 - 2024-01-20".parse::<Step>().expect("step"),
            Step::Type("2024-01-05 - 2024-01-20".to_string())
        );
        assert_eq!(
            "mode:since".parse::<Step>().expect("step"),
            Step::Mode(SelectionMode::Since)
        );
        assert!("click".parse::<Step>().is_err());
        assert!("key:f13".parse::<Step>().is_err());
        assert!("dance".parse::<Step>().is_err());
    }

    #[test]
    fn global_flags_after_the_subcommand() {
        let cli = GlobalCli::parse_from([
            "saturn",
            "pick",
            "--mode",
            "range",
            "open",
            "click:5",
            "--set",
            "picker.rtl=on",
            "--json",
            "-vv",
        ]);
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.overrides[0].key, "picker.rtl");
        match cli.command {
            Command::Pick { mode, steps } => {
                assert_eq!(mode, Some(SelectionMode::Range));
                assert_eq!(steps, vec![Step::Open, Step::Click(5)]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
