//! Parser introspection and composition helpers.
//!
//! Small utilities over `clap::Command` for code that assembles subcommand
//! hierarchies by hand instead of through a command tree.

use clap::Command;

/// Check whether `parser` has any subcommands defined.
pub fn has_subcommands(parser: &Command) -> bool {
    parser.get_subcommands().next().is_some()
}

/// Check whether `parser` defines `name` as a subcommand or alias.
pub fn has_subcommand(parser: &Command, name: &str) -> bool {
    parser.find_subcommand(name).is_some()
}

/// Retrieve a subcommand parser by name or alias.
pub fn get_subcommand<'a>(parser: &'a Command, name: &str) -> Option<&'a Command> {
    parser.find_subcommand(name)
}

/// Add a subcommand with a description, reusing it when already defined.
///
/// An existing subcommand keeps its configuration; its description is only
/// filled in when missing.
pub fn add_subcommand(parser: Command, name: &'static str, about: &'static str) -> Command {
    if parser.find_subcommand(name).is_some() {
        return parser.mut_subcommand(name, |sub| {
            if sub.get_about().is_none() {
                sub.about(about)
            } else {
                sub
            }
        });
    }
    parser.subcommand(Command::new(name).about(about))
}

/// Create or reuse each `(label, about)` segment in order, then attach
/// `leaf` under the last segment.
pub fn attach_at_path(
    parser: Command,
    path: &[(&'static str, &'static str)],
    leaf: Command,
) -> Command {
    match path.split_first() {
        None => parser.subcommand(leaf),
        Some(((label, about), rest)) => {
            let parser = add_subcommand(parser, label, about);
            parser.mut_subcommand(*label, |sub| attach_at_path(sub, rest, leaf))
        }
    }
}
