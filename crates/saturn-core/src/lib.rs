pub mod adapter;
pub mod body;
pub mod calendar;
pub mod cell;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datepicker;
pub mod error;
pub mod events;
pub mod focus;
pub mod input;
pub mod month_view;
pub mod multi_year_view;
pub mod panels;
pub mod range;
pub mod render;
pub mod scheduler;
pub mod validate;
pub mod view;
pub mod year_view;

use std::ffi::OsString;

use clap::Parser;
use tracing::{
  debug,
  info
};

pub use adapter::{
  DateAdapter,
  NativeDateAdapter
};
pub use config::PickerConfig;
pub use datepicker::{
  Datepicker,
  PickerOptions
};
pub use error::{
  DateError,
  PickerError
};
pub use range::{
  PickerValue,
  RangeValue,
  SelectionMode
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli = cli::GlobalCli::parse_from(raw_args);

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting saturn CLI"
  );

  let mut cfg = config::PickerConfig::load(
    cli.config.as_deref()
  )?;
  cfg.apply_overrides(
    cli
      .overrides
      .into_iter()
      .map(|kv| (kv.key, kv.value))
  )?;
  debug!(?cfg, "effective config");

  let renderer =
    render::Renderer::for_stdout();
  commands::dispatch(
    &cfg,
    &renderer,
    cli.command,
    cli.json
  )?;

  info!("done");
  Ok(())
}
