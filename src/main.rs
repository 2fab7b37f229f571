use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{info, warn};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use pulse::common;
use pulse::config::{resolve_relative, ExportFormat, MappingPlan};
use pulse::data_set::{CsvDatasetProvider, InMemoryDatasetProvider};
use pulse::export::{self, SvgRenderConfig};
use pulse::mapping::{positions_for_layout, HemicicloLayout, Mapping, MappingFilter};
use pulse::services::{CreateHemicycle, JsonFileMappingStore, MappingService};

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    #[clap(short, long, global = true)]
    log_level: Option<String>,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a sample plan
    Init {
        #[clap(short, long)]
        plan: String,
    },
    /// Create or load the plan's mapping and auto-assign it from its datasets
    Assign {
        #[clap(short, long)]
        plan: String,
    },
    Render {
        #[clap(short, long)]
        store: String,
        #[clap(short, long)]
        mapping: String,
        #[clap(short, long)]
        output: String,
        #[clap(short, long, default_value = "svg")]
        format: ExportFormat,
        #[clap(long)]
        title: Option<String>,
        #[clap(long)]
        no_legend: bool,
    },
    /// Print the default layout and seat positions for a seat count
    Positions {
        #[clap(short, long)]
        seats: u32,
    },
    List {
        #[clap(short, long)]
        store: String,
        #[clap(short, long)]
        project: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    setup_logging(&args.log_level);

    match args.command {
        Commands::Init { plan } => {
            info!("Initializing plan: {}", plan);
            let serialized_plan = MappingPlan::default().to_yaml()?;
            common::write_string_to_file(&plan, &serialized_plan)?;
        }
        Commands::Assign { plan } => {
            info!("Running plan: {}", plan);
            run_assign(&plan).await?;
        }
        Commands::Render {
            store,
            mapping,
            output,
            format,
            title,
            no_legend,
        } => {
            let mapping = open_store(&store)
                .get(&mapping)
                .await
                .context("Failed to load mapping")?;
            let svg_config = SvgRenderConfig {
                show_legend: !no_legend,
                title: title.or_else(|| Some(mapping.name.clone())),
                ..Default::default()
            };
            write_output(&mapping, format, &svg_config, &output)?;
        }
        Commands::Positions { seats } => {
            let layout = HemicicloLayout::for_seat_count(seats)?;
            let positions = positions_for_layout(&layout);
            let res = serde_json::json!({
                "layout": layout,
                "positions": positions,
            });
            println!("{}", serde_json::to_string_pretty(&res)?);
        }
        Commands::List { store, project } => {
            let filter = MappingFilter {
                project_id: project,
                ..Default::default()
            };
            let mappings = open_store(&store).list(&filter).await?;
            for mapping in mappings {
                println!(
                    "{}\t{}\t{}/{} seats assigned\t{}",
                    mapping.id,
                    mapping.name,
                    mapping.data.assigned_seat_count(),
                    mapping.config.layout.total_seats,
                    mapping.updated_at.to_rfc3339()
                );
            }
        }
    }

    Ok(())
}

/// Service over a mapping store alone, for commands that never load datasets.
fn open_store(store_dir: &str) -> MappingService {
    MappingService::new(
        Arc::new(JsonFileMappingStore::new(store_dir)),
        Arc::new(InMemoryDatasetProvider::new()),
    )
}

async fn run_assign(plan_path: &str) -> Result<()> {
    let plan = MappingPlan::load(plan_path)?;
    let service = MappingService::new(
        Arc::new(JsonFileMappingStore::new(resolve_relative(
            plan_path,
            &plan.store_dir,
        ))),
        Arc::new(CsvDatasetProvider::new(
            resolve_relative(plan_path, &plan.data_dir),
            plan.project_id.clone(),
        )),
    );

    let mapping = match &plan.mapping.id {
        Some(id) => {
            let existing = service.get(id).await?;
            if existing.config.layout.total_seats != plan.mapping.seats {
                service.resize(id, plan.mapping.seats).await?
            } else {
                existing
            }
        }
        None => {
            service
                .create_hemicycle(CreateHemicycle {
                    project_id: plan.project_id.clone(),
                    user_id: plan.user_id.clone(),
                    name: plan.mapping.name.clone(),
                    description: plan.mapping.description.clone(),
                    seats: plan.mapping.seats,
                })
                .await?
        }
    };

    service
        .set_data_source(&mapping.id, Some(plan.data_source.clone()))
        .await?;
    let (mapping, outcome) = service.auto_assign(&mapping.id).await?;

    if outcome.skipped {
        warn!("No actor column mapped, seats left unchanged");
    }
    for field in outcome.fields.iter().filter(|f| f.is_failed()) {
        warn!("Custom field {} could not be resolved", field.field_id());
    }
    info!(
        "Mapping {}: {} seats assigned, {} empty, {} rows skipped, {} rows dropped",
        mapping.id,
        outcome.assigned_rows,
        outcome.empty_seats,
        outcome.skipped_rows,
        outcome.dropped_rows
    );

    if let Some(output) = &plan.output {
        let svg_config = SvgRenderConfig {
            title: Some(mapping.name.clone()),
            ..Default::default()
        };
        let filename = resolve_relative(plan_path, &output.filename);
        write_output(&mapping, output.format, &svg_config, filename)?;
    }
    println!("{}", mapping.id);
    Ok(())
}

fn write_output(
    mapping: &Mapping,
    format: ExportFormat,
    svg_config: &SvgRenderConfig,
    filename: impl AsRef<std::path::Path>,
) -> Result<()> {
    let filename = filename.as_ref();
    let rendered = export::render_mapping(mapping, format, svg_config)
        .map_err(|e| anyhow!("Failed to render {}: {}", format, e))?;
    common::write_string_to_file(filename, &rendered)?;
    info!("Wrote {} output to {}", format, filename.display());
    Ok(())
}

fn setup_logging(log_level: &Option<String>) {
    let log_level = match log_level
        .as_ref()
        .unwrap_or(&"info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!("handlebars=off,{}", log_level)))
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}
