use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use similar::{ChangeTag, TextDiff};

use altair_core::differ::create_plan;
use altair_core::effect::Effect;
use altair_core::graph::ResourceGraph;
use altair_core::interpreter::{Interpreter, InterpreterConfig};
use altair_core::plan::Plan;
use altair_core::provider::{BoxFuture, Provider, ProviderError, ProviderResult};
use altair_core::resource::{Resource, ResourceId, State};
use altair_state::state::value_to_json;
use altair_state::{BackendConfig, ResourceState, create_backend};
use altair_stack::EnvironmentStack;

#[derive(Parser)]
#[command(name = "altair")]
#[command(about = "Declarative stack definition for the RAG runtime environment", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize the resource graph and print it
    Synth {
        /// Print the engine-facing JSON document instead of a summary
        #[arg(long)]
        json: bool,

        /// Write the JSON document to a file
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Validate the synthesized graph against the AWS schemas
    Validate,
    /// Diff the declaration against the last snapshot
    Plan {
        /// Snapshot location (file path or s3://bucket/key)
        #[arg(long, default_value = BackendConfig::DEFAULT_STATE_FILE)]
        state: String,

        /// AWS region for an S3 snapshot location
        #[arg(long, default_value = "us-east-1")]
        region: String,
    },
    /// Show the dependency edges of the synthesized graph
    Graph,
    /// Record the synthesized graph as the new snapshot
    Snapshot {
        /// Snapshot location (file path or s3://bucket/key)
        #[arg(long, default_value = BackendConfig::DEFAULT_STATE_FILE)]
        state: String,

        /// AWS region for an S3 snapshot location
        #[arg(long, default_value = "us-east-1")]
        region: String,
    },
    /// Walk the plan through the interpreter (dry-run only; provisioning
    /// is performed by an external engine)
    Apply {
        /// Skip all side effects and report what would run
        #[arg(long)]
        dry_run: bool,

        /// Snapshot location (file path or s3://bucket/key)
        #[arg(long, default_value = BackendConfig::DEFAULT_STATE_FILE)]
        state: String,

        /// AWS region for an S3 snapshot location
        #[arg(long, default_value = "us-east-1")]
        region: String,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Synth { json, out } => run_synth(json, out),
        Commands::Validate => run_validate(),
        Commands::Plan { state, region } => run_plan(&state, &region).await,
        Commands::Graph => run_graph(),
        Commands::Snapshot { state, region } => run_snapshot(&state, &region).await,
        Commands::Apply {
            dry_run,
            state,
            region,
        } => run_apply(dry_run, &state, &region).await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// Synthesize the stack and validate it against the schemas
fn synthesize() -> Result<ResourceGraph, String> {
    let graph = EnvironmentStack::default()
        .synthesize()
        .map_err(|e| format!("Synthesis failed: {}", e))?;

    log::debug!("synthesized {} resources", graph.len());

    altair_stack::stack::validate(&graph).map_err(|errors| errors.join("\n"))?;

    Ok(graph)
}

/// The engine-facing JSON document for a synthesized graph
fn graph_document(graph: &ResourceGraph) -> serde_json::Value {
    let resources: Vec<serde_json::Value> = graph
        .iter()
        .map(|entry| {
            let state =
                ResourceState::from_resource(&entry.binding, &entry.resource, altair_provider_aws::PROVIDER_NAME);
            serde_json::json!({
                "binding": state.binding,
                "type": state.resource_type,
                "name": state.name,
                "read_only": state.read_only,
                "attributes": state.attributes,
            })
        })
        .collect();

    serde_json::json!({
        "provider": altair_provider_aws::PROVIDER_NAME,
        "fingerprint": format!("{:016x}", graph.fingerprint()),
        "resources": resources,
    })
}

fn run_synth(json: bool, out: Option<PathBuf>) -> Result<(), String> {
    let graph = synthesize()?;
    let document = graph_document(&graph);

    if let Some(path) = out {
        let content = serde_json::to_string_pretty(&document)
            .map_err(|e| format!("Failed to serialize graph: {}", e))?;
        fs::write(&path, content)
            .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
        println!(
            "Wrote {} resources to {}",
            graph.len().to_string().bold(),
            path.display()
        );
        return Ok(());
    }

    if json {
        let content = serde_json::to_string_pretty(&document)
            .map_err(|e| format!("Failed to serialize graph: {}", e))?;
        println!("{}", content);
        return Ok(());
    }

    println!("{}", "Synthesized resources:".bold());
    for entry in graph.iter() {
        let marker = if entry.resource.is_data_source() {
            "?".cyan()
        } else {
            "+".green()
        };
        println!(
            "  {} {} {}",
            marker,
            entry.resource.id,
            format!("({})", entry.binding).dimmed()
        );
    }
    println!();
    println!(
        "{} resources, fingerprint {}",
        graph.len().to_string().bold(),
        format!("{:016x}", graph.fingerprint()).dimmed()
    );

    Ok(())
}

fn run_validate() -> Result<(), String> {
    let graph = synthesize()?;
    println!(
        "{} {} resources validate against {} schemas",
        "OK:".green().bold(),
        graph.len(),
        altair_provider_aws::all_schemas().len()
    );
    Ok(())
}

/// Build the plan against the snapshot at the given location
async fn plan_against_snapshot(
    graph: &ResourceGraph,
    state_location: &str,
    region: &str,
) -> Result<Plan, String> {
    let config =
        BackendConfig::parse(state_location, region).map_err(|e| e.to_string())?;
    let backend = create_backend(&config).await.map_err(|e| e.to_string())?;

    let current_states = match backend.read_state().await.map_err(|e| e.to_string())? {
        Some(snapshot) => {
            log::debug!(
                "loaded snapshot serial {} ({} resources)",
                snapshot.serial,
                snapshot.resources.len()
            );
            snapshot.to_current_states()
        }
        None => HashMap::new(),
    };

    let desired = graph.resources();
    Ok(create_plan(&desired, &current_states))
}

fn format_effect_brief(effect: &Effect) -> String {
    match effect {
        Effect::Create(r) => format!("{} {}", "+".green(), r.id),
        Effect::Update { id, .. } => format!("{} {}", "~".yellow(), id),
        Effect::Delete(id) => format!("{} {}", "-".red(), id),
        Effect::Read(id) => format!("{} {}", "?".cyan(), id),
    }
}

/// Render an attribute-level diff for an update effect
fn print_update_diff(from: &State, to: &Resource) {
    let from_json = attributes_json(&from.attributes);
    let to_json = attributes_json(&to.attributes);

    let diff = TextDiff::from_lines(&from_json, &to_json);
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Delete => print!("      {}", format!("- {}", change).red()),
            ChangeTag::Insert => print!("      {}", format!("+ {}", change).green()),
            ChangeTag::Equal => {}
        }
    }
}

fn attributes_json(attributes: &HashMap<String, altair_core::resource::Value>) -> String {
    let mut object = serde_json::Map::new();
    let mut keys: Vec<&String> = attributes.keys().collect();
    keys.sort();
    for key in keys {
        object.insert(key.clone(), value_to_json(&attributes[key]));
    }
    serde_json::to_string_pretty(&serde_json::Value::Object(object)).unwrap_or_default()
}

async fn run_plan(state_location: &str, region: &str) -> Result<(), String> {
    let graph = synthesize()?;
    let plan = plan_against_snapshot(&graph, state_location, region).await?;

    if plan.mutation_count() == 0 {
        println!("{}", "No changes. The snapshot matches the declaration.".green());
        return Ok(());
    }

    println!("{}", "Execution plan:".bold());
    for effect in plan.effects() {
        println!("  {}", format_effect_brief(effect));
        if let Effect::Update { from, to, .. } = effect {
            print_update_diff(from, to);
        }
    }
    println!();
    println!("{}", plan.summary());

    Ok(())
}

fn run_graph() -> Result<(), String> {
    let graph = synthesize()?;
    let deps = graph.dependency_graph();

    for entry in graph.iter() {
        println!("{} {}", entry.binding.bold(), format!("[{}]", entry.resource.id).dimmed());
        for dep in deps.dependencies_of(&entry.binding) {
            println!(
                "  └─ {} {}",
                format!("{}.{}", dep.target, dep.attribute),
                format!("(via {})", dep.used_in).dimmed()
            );
        }
    }

    Ok(())
}

async fn run_snapshot(state_location: &str, region: &str) -> Result<(), String> {
    let graph = synthesize()?;

    let config =
        BackendConfig::parse(state_location, region).map_err(|e| e.to_string())?;
    let backend = create_backend(&config).await.map_err(|e| e.to_string())?;

    let lock = backend
        .acquire_lock("snapshot")
        .await
        .map_err(|e| e.to_string())?;

    let result = async {
        let mut snapshot = backend
            .read_state()
            .await
            .map_err(|e| e.to_string())?
            .unwrap_or_default();

        snapshot.record_graph(&graph, altair_provider_aws::PROVIDER_NAME);
        snapshot.increment_serial();

        backend
            .write_state(&snapshot)
            .await
            .map_err(|e| e.to_string())?;

        Ok::<u64, String>(snapshot.serial)
    }
    .await;

    backend.release_lock(&lock).await.map_err(|e| e.to_string())?;

    let serial = result?;
    println!(
        "{} snapshot serial {} ({} resources)",
        "Recorded".green().bold(),
        serial,
        graph.len()
    );

    Ok(())
}

/// Stand-in engine: provisioning happens outside this repository, so any
/// non-dry execution is refused at the seam
struct ExternalEngine;

impl Provider for ExternalEngine {
    fn name(&self) -> &'static str {
        "external"
    }

    fn read(
        &self,
        id: &ResourceId,
        _identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        Box::pin(async move {
            Err(ProviderError::new("no provisioning engine configured").for_resource(id))
        })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let id = resource.id.clone();
        Box::pin(async move {
            Err(ProviderError::new("no provisioning engine configured").for_resource(id))
        })
    }

    fn update(
        &self,
        id: &ResourceId,
        _identifier: &str,
        _from: &State,
        _to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        Box::pin(async move {
            Err(ProviderError::new("no provisioning engine configured").for_resource(id))
        })
    }

    fn delete(&self, id: &ResourceId, _identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        Box::pin(async move {
            Err(ProviderError::new("no provisioning engine configured").for_resource(id))
        })
    }
}

async fn run_apply(dry_run: bool, state_location: &str, region: &str) -> Result<(), String> {
    if !dry_run {
        return Err(
            "provisioning is performed by an external engine; run with --dry-run to walk the plan"
                .to_string(),
        );
    }

    let graph = synthesize()?;
    let plan = plan_against_snapshot(&graph, state_location, region).await?;

    let interpreter = Interpreter::new(ExternalEngine).with_config(InterpreterConfig {
        dry_run: true,
        ..Default::default()
    });
    let result = interpreter.apply(&plan).await;

    for (effect, outcome) in plan.effects().iter().zip(result.outcomes.iter()) {
        match outcome {
            Ok(_) => println!("  {} {}", format_effect_brief(effect), "(skipped)".dimmed()),
            Err(e) => println!("  {} {}", format_effect_brief(effect), e.to_string().red()),
        }
    }
    println!();
    println!(
        "Dry run complete: {} effects walked, {} would mutate",
        result.success_count,
        plan.mutation_count()
    );

    Ok(())
}
