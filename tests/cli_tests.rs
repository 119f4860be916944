//! Scenario tests for the command tree builder and dispatch.

use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use serde_json::json;
use taskpipe::cli::{gen_cli_parser, run_tree, CliTask, CommandNode};
use taskpipe::{mergeable, task_result, Fields, Task};

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_test_writer())
        .with(EnvFilter::from_default_env())
        .try_init();
}

#[derive(Debug, Default)]
struct SightingResult {
    err: Option<anyhow::Error>,
    genus: String,
    species: String,
    subcommand: String,
    log_level: String,
}
task_result!(SightingResult { genus, species, subcommand, log_level });

#[derive(Debug, Default)]
struct WormsTask {
    genus: String,
    species: String,
    subcommand: String,
    log_level: String,
    result: SightingResult,
}
mergeable!(WormsTask { genus, species, subcommand, log_level });

impl Task for WormsTask {
    type Result = SightingResult;

    fn result(&self) -> &SightingResult {
        &self.result
    }

    fn result_mut(&mut self) -> &mut SightingResult {
        &mut self.result
    }

    fn into_result(self) -> SightingResult {
        self.result
    }

    fn perform(&mut self) -> Result<()> {
        self.result.genus = self.genus.clone();
        self.result.species = self.species.clone();
        self.result.subcommand = self.subcommand.clone();
        self.result.log_level = self.log_level.clone();
        Ok(())
    }
}

impl CliTask for WormsTask {
    const COMMAND: &'static str = "worms";
    const ALIASES: &'static [&'static str] = &["w"];
    const DESCRIPTION: &'static str = "Report a worm sighting";

    fn configure_parser(parser: Command) -> Command {
        parser
            .arg(Arg::new("genus").required(true))
            .arg(Arg::new("species").required(true))
    }
}

#[derive(Debug, Default)]
struct ArthropodsTask {
    genus: String,
    species: String,
    subcommand: String,
    result: SightingResult,
}
mergeable!(ArthropodsTask { genus, species, subcommand });

impl Task for ArthropodsTask {
    type Result = SightingResult;

    fn result(&self) -> &SightingResult {
        &self.result
    }

    fn result_mut(&mut self) -> &mut SightingResult {
        &mut self.result
    }

    fn into_result(self) -> SightingResult {
        self.result
    }

    fn perform(&mut self) -> Result<()> {
        self.result.genus = self.genus.clone();
        self.result.species = self.species.clone();
        self.result.subcommand = self.subcommand.clone();
        Ok(())
    }
}

impl CliTask for ArthropodsTask {
    const COMMAND: &'static str = "arthropods";
    const DESCRIPTION: &'static str = "Report an arthropod sighting";

    fn configure_parser(parser: Command) -> Command {
        parser
            .arg(Arg::new("genus").required(true))
            .arg(Arg::new("species").required(true))
    }
}

#[derive(Debug, Default)]
struct CatchResult {
    err: Option<anyhow::Error>,
    region: String,
    fresh_water: bool,
    subcommand: String,
}
task_result!(CatchResult { region, fresh_water, subcommand });

#[derive(Debug, Default)]
struct FishTask {
    region: String,
    fresh_water: bool,
    subcommand: String,
    result: CatchResult,
}
mergeable!(FishTask { region, fresh_water, subcommand });

impl Task for FishTask {
    type Result = CatchResult;

    fn result(&self) -> &CatchResult {
        &self.result
    }

    fn result_mut(&mut self) -> &mut CatchResult {
        &mut self.result
    }

    fn into_result(self) -> CatchResult {
        self.result
    }

    fn perform(&mut self) -> Result<()> {
        self.result.region = self.region.clone();
        self.result.fresh_water = self.fresh_water;
        self.result.subcommand = self.subcommand.clone();
        Ok(())
    }
}

impl CliTask for FishTask {
    const COMMAND: &'static str = "fish";
    const ALIASES: &'static [&'static str] = &["f"];
    const DESCRIPTION: &'static str = "Report a fish catch";

    fn configure_parser(parser: Command) -> Command {
        parser.arg(Arg::new("region").required(true)).arg(
            Arg::new("fresh_water")
                .long("fresh-water")
                .action(ArgAction::SetTrue),
        )
    }
}

fn animals_root() -> Command {
    Command::new("animals").about("CLI for animals").arg(
        Arg::new("log_level")
            .long("level")
            .default_value("INFO")
            .help("Logging level"),
    )
}

fn animals_config() -> Vec<CommandNode> {
    vec![
        CommandNode::group_with_aliases("invertebrates", &["i"], "Invertebrate animals")
            .child(CommandNode::task::<WormsTask>())
            .child(CommandNode::task::<ArthropodsTask>()),
        CommandNode::group_with_aliases("vertebrates", &["v"], "Vertebrate animals")
            .child(CommandNode::task::<FishTask>()),
    ]
}

#[test]
fn single_subcommand_depth_one() {
    init_tracing();
    let config = vec![CommandNode::task::<WormsTask>()];
    let result = run_tree(animals_root(), &config, Some(&["worms", "Lumbricus", "terrestris"]))
        .expect("dispatches");
    assert_eq!(result.field("genus"), Some(json!("Lumbricus")));
    assert_eq!(result.field("species"), Some(json!("terrestris")));
    assert_eq!(result.field("subcommand"), Some(json!("worms")));
    assert_eq!(result.field("log_level"), Some(json!("INFO")));
}

#[test]
fn alias_invocation_resolves_to_the_primary_label() {
    let config = vec![CommandNode::task::<WormsTask>()];
    let result = run_tree(animals_root(), &config, Some(&["w", "Lumbricus", "terrestris"]))
        .expect("dispatches");
    assert_eq!(result.field("genus"), Some(json!("Lumbricus")));
    assert_eq!(result.field("subcommand"), Some(json!("worms")));
}

#[test]
fn root_arguments_flow_into_the_task() {
    let config = vec![CommandNode::task::<WormsTask>()];
    let result = run_tree(
        animals_root(),
        &config,
        Some(&["--level", "WARNING", "worms", "Lumbricus", "terrestris"]),
    )
    .expect("dispatches");
    assert_eq!(result.field("log_level"), Some(json!("WARNING")));
}

#[test]
fn grouped_subcommand_depth_two_with_alias() {
    init_tracing();
    let config = vec![CommandNode::group_with_aliases("invertebrates", &["i"], "Invertebrate animals")
        .child(CommandNode::task::<ArthropodsTask>())];
    let result =
        run_tree(animals_root(), &config, Some(&["i", "arthropods", "Neotibicen", "linnei"]))
            .expect("dispatches");
    assert_eq!(result.field("genus"), Some(json!("Neotibicen")));
    assert_eq!(result.field("species"), Some(json!("linnei")));
    assert_eq!(result.field("subcommand"), Some(json!("arthropods")));
}

#[test]
fn sibling_groups_route_to_the_right_task() {
    let result = run_tree(
        animals_root(),
        &animals_config(),
        Some(&["invertebrates", "worms", "Lumbricus", "terrestris"]),
    )
    .expect("dispatches");
    assert_eq!(result.field("genus"), Some(json!("Lumbricus")));
    assert_eq!(result.field("subcommand"), Some(json!("worms")));

    let result = run_tree(
        animals_root(),
        &animals_config(),
        Some(&["v", "f", "Canada", "--fresh-water"]),
    )
    .expect("dispatches");
    assert_eq!(result.field("region"), Some(json!("Canada")));
    assert_eq!(result.field("fresh_water"), Some(json!(true)));
    assert_eq!(result.field("subcommand"), Some(json!("fish")));
}

#[test]
fn flags_default_to_false_when_absent() {
    let result = run_tree(
        animals_root(),
        &animals_config(),
        Some(&["vertebrates", "fish", "Canada"]),
    )
    .expect("dispatches");
    assert_eq!(result.field("fresh_water"), Some(json!(false)));
}

#[test]
fn stopping_on_a_group_is_a_usage_error() {
    let err = run_tree(animals_root(), &animals_config(), Some(&["invertebrates"]))
        .expect_err("group has no bound task");
    assert!(err.to_string().contains("invertebrates"));
}

#[test]
fn missing_subcommand_is_a_usage_error() {
    let err = run_tree(animals_root(), &animals_config(), Some(&["--level", "DEBUG"]))
        .expect_err("nothing to run");
    assert!(err.to_string().contains("no command"));
}

#[test]
fn parser_structure_matches_the_config() {
    use taskpipe::cli::utils::{get_subcommand, has_subcommand};

    let parser = gen_cli_parser(animals_root(), &animals_config()).expect("parser");
    assert!(has_subcommand(&parser, "invertebrates"));
    assert!(has_subcommand(&parser, "i"));
    let group = get_subcommand(&parser, "invertebrates").expect("group");
    assert!(has_subcommand(group, "worms"));
    assert!(has_subcommand(group, "w"));
    assert!(has_subcommand(group, "arthropods"));
}

#[test]
fn run_command_parses_and_runs_a_single_task() {
    let result = WormsTask::run_command(Some(&["Lumbricus", "terrestris"]), false)
        .expect("parses and runs");
    assert_eq!(result.genus, "Lumbricus");
    assert_eq!(result.species, "terrestris");
}

#[test]
fn run_command_rejects_missing_arguments() {
    let err = WormsTask::run_command(Some(&["Lumbricus"]), false).expect_err("species missing");
    assert!(err.to_string().contains("species"));
}

#[test]
fn run_command_with_known_args_tolerates_unknown_flags() {
    let result = WormsTask::run_command(Some(&["Lumbricus", "terrestris", "--dry-run"]), true)
        .expect("unknown flag tolerated");
    assert_eq!(result.genus, "Lumbricus");
    assert_eq!(result.species, "terrestris");
}
