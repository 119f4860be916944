//! Command tree assembly and dispatch.
//!
//! A command tree is a rose tree of nodes: grouping labels with children,
//! and task types bound to leaf subcommands. [`gen_cli_parser`] translates
//! the tree into a `clap` subcommand hierarchy; [`dispatch`] walks a parsed
//! invocation back down the tree and runs the bound task.

use anyhow::Result;
use clap::{ArgMatches, Command};

use crate::cli::CliTask;
use crate::error::ConfigError;
use crate::state::MergeSource;
use crate::task::{short_type_name, Task, TaskResult};

type ConfigureFn = fn(Command) -> Command;
type DispatchFn = fn(&ArgMatches) -> Result<Box<dyn TaskResult>>;

/// Command metadata and dispatch binding captured from one task type.
pub struct CommandSpec {
    command: &'static str,
    aliases: &'static [&'static str],
    description: &'static str,
    type_name: &'static str,
    configure: ConfigureFn,
    dispatch: DispatchFn,
}

impl CommandSpec {
    /// Capture the command surface of a task type.
    pub fn of<T>() -> Self
    where
        T: CliTask + 'static,
        T::Result: 'static,
    {
        CommandSpec {
            command: T::COMMAND,
            aliases: T::ALIASES,
            description: T::DESCRIPTION,
            type_name: short_type_name::<T>(),
            configure: T::configure_parser,
            dispatch: dispatch_task::<T>,
        }
    }

    pub fn command(&self) -> &'static str {
        self.command
    }
}

/// Instantiate the task, merge the parsed arguments in, and run it.
///
/// The binding is a plain function pointer held next to the command
/// metadata, so no dispatch-function field ever appears in the merged
/// state.
fn dispatch_task<T>(matches: &ArgMatches) -> Result<Box<dyn TaskResult>>
where
    T: CliTask + 'static,
    T::Result: 'static,
{
    let result = T::default().merge(MergeSource::Args(matches)).run()?;
    Ok(Box::new(result))
}

/// One node of a command tree.
pub enum CommandNode {
    /// A named group of children with no bound task.
    Group {
        label: &'static str,
        aliases: &'static [&'static str],
        about: &'static str,
        children: Vec<CommandNode>,
    },
    /// A task type bound to a subcommand.
    Task { spec: CommandSpec, children: Vec<CommandNode> },
}

impl CommandNode {
    /// A grouping node.
    pub fn group(label: &'static str, about: &'static str) -> Self {
        Self::group_with_aliases(label, &[], about)
    }

    /// A grouping node reachable under aliases as well.
    pub fn group_with_aliases(
        label: &'static str,
        aliases: &'static [&'static str],
        about: &'static str,
    ) -> Self {
        CommandNode::Group { label, aliases, about, children: Vec::new() }
    }

    /// A node bound to a task type.
    pub fn task<T>() -> Self
    where
        T: CliTask + 'static,
        T::Result: 'static,
    {
        CommandNode::Task { spec: CommandSpec::of::<T>(), children: Vec::new() }
    }

    /// Append a child node.
    pub fn child(mut self, node: CommandNode) -> Self {
        match &mut self {
            CommandNode::Group { children, .. } | CommandNode::Task { children, .. } => {
                children.push(node);
            }
        }
        self
    }

    fn name(&self) -> &'static str {
        match self {
            CommandNode::Group { label, .. } => label,
            CommandNode::Task { spec, .. } => spec.command,
        }
    }

    fn children(&self) -> &[CommandNode] {
        match self {
            CommandNode::Group { children, .. } | CommandNode::Task { children, .. } => children,
        }
    }
}

/// Recursively translate a command tree into a subcommand hierarchy.
///
/// An empty node list returns `root` unchanged. Nodes are registered in
/// declaration order under their primary label and visible aliases; task
/// nodes also contribute their own argument definitions. The invoked
/// label at each level surfaces as the reserved `subcommand` field of the
/// parsed bag.
pub fn gen_cli_parser(mut root: Command, nodes: &[CommandNode]) -> Result<Command, ConfigError> {
    for node in nodes {
        let sub = match node {
            CommandNode::Group { label, aliases, about, .. } => {
                if label.is_empty() || about.is_empty() {
                    return Err(ConfigError::MissingGroupMetadata {
                        label: (*label).to_string(),
                    });
                }
                Command::new(*label).visible_aliases(aliases.iter().copied()).about(*about)
            }
            CommandNode::Task { spec, .. } => {
                if spec.command.is_empty() || spec.description.is_empty() {
                    return Err(ConfigError::MissingCommandMetadata { task: spec.type_name });
                }
                let sub = Command::new(spec.command)
                    .visible_aliases(spec.aliases.iter().copied())
                    .about(spec.description);
                (spec.configure)(sub)
            }
        };
        root = root.subcommand(gen_cli_parser(sub, node.children())?);
    }
    Ok(root)
}

/// Dispatch a parsed invocation against the command tree.
///
/// Walks the invoked subcommand chain to the deepest node with a bound
/// task, then hands that task the full flattened argument bag. Stopping on
/// a grouping node is a usage error carrying the offending command path.
pub fn dispatch(nodes: &[CommandNode], matches: &ArgMatches) -> Result<Box<dyn TaskResult>> {
    let mut nodes = nodes;
    let mut current = matches;
    let mut bound: Option<&CommandSpec> = None;
    let mut path: Vec<&str> = Vec::new();

    while let Some((name, nested)) = current.subcommand() {
        path.push(name);
        let Some(node) = nodes.iter().find(|node| node.name() == name) else {
            anyhow::bail!("unknown command `{}`", path.join(" "));
        };
        if let CommandNode::Task { spec, .. } = node {
            bound = Some(spec);
        }
        nodes = node.children();
        current = nested;
    }

    match bound {
        Some(spec) => {
            tracing::debug!(command = spec.command, "dispatching command");
            (spec.dispatch)(matches)
        }
        None if path.is_empty() => anyhow::bail!("no command given"),
        None => anyhow::bail!("no runnable task bound to command path `{}`", path.join(" ")),
    }
}

/// Build the parser for `nodes`, parse `argv`, and dispatch.
///
/// Falls back to the process arguments when `argv` is `None`.
pub fn run_tree(
    root: Command,
    nodes: &[CommandNode],
    argv: Option<&[&str]>,
) -> Result<Box<dyn TaskResult>> {
    let parser = gen_cli_parser(root, nodes)?;
    let matches = match argv {
        Some(args) => {
            let name = parser.get_name().to_string();
            parser.try_get_matches_from(std::iter::once(name.as_str()).chain(args.iter().copied()))?
        }
        None => parser.try_get_matches()?,
    };
    dispatch(nodes, &matches)
}
