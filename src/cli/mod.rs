//! Command-line integration.
//!
//! Maps parsed command-line arguments onto task instances and assembles
//! hierarchical subcommand trees from a declarative configuration.

use anyhow::Result;
use clap::Command;

use crate::error::ConfigError;
use crate::state::MergeSource;
use crate::task::{short_type_name, Task};

mod tree;
pub mod utils;

pub use tree::{dispatch, gen_cli_parser, run_tree, CommandNode, CommandSpec};

/// A task that can be instantiated from the command line.
///
/// The command surface is declared as associated constants; argument
/// definitions are contributed through [`CliTask::configure_parser`]. The
/// parsed argument bag is merged into a default-constructed instance
/// before the run, so every declared field named after an argument picks
/// up its value.
pub trait CliTask: Task + Default {
    /// Name of the CLI command.
    const COMMAND: &'static str;

    /// Aliases of the CLI command.
    const ALIASES: &'static [&'static str] = &[];

    /// Human-readable description of the CLI command.
    const DESCRIPTION: &'static str;

    /// Add this command's argument definitions to its parser.
    fn configure_parser(parser: Command) -> Command {
        parser
    }

    /// Generate this task's own command parser.
    ///
    /// Fails when the command name or description is empty; that is a
    /// configuration error and always surfaces.
    fn command_parser() -> Result<Command, ConfigError> {
        if Self::COMMAND.is_empty() || Self::DESCRIPTION.is_empty() {
            return Err(ConfigError::MissingCommandMetadata { task: short_type_name::<Self>() });
        }
        Ok(Self::configure_parser(Command::new(Self::COMMAND).about(Self::DESCRIPTION)))
    }

    /// Parse `argv` and run the task, returning its result.
    ///
    /// Falls back to the process arguments when `argv` is `None`. With
    /// `known_args`, unrecognized arguments are tolerated instead of
    /// failing the parse.
    fn run_command(argv: Option<&[&str]>, known_args: bool) -> Result<Self::Result>
    where
        Self: 'static,
    {
        let mut parser = Self::command_parser()?;
        if known_args {
            parser = parser.ignore_errors(true);
        }
        let matches = match argv {
            Some(args) => parser
                .try_get_matches_from(std::iter::once(Self::COMMAND).chain(args.iter().copied()))?,
            None => parser.try_get_matches()?,
        };
        Self::default().merge(MergeSource::Args(&matches)).run()
    }
}
