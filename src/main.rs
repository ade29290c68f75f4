use anyhow::{bail, Context};
use cgramap::config::ConfigManager;
use cgramap::engines::optimization::{ConsoleProgress, MappingOptimizer, RunResult};
use cgramap::model::{Application, ArrayModel, SimParams};
use std::path::PathBuf;

struct CliArgs {
    config_path: PathBuf,
    app_path: PathBuf,
    output_path: Option<PathBuf>,
    workers: Option<usize>,
}

fn parse_args() -> anyhow::Result<CliArgs> {
    let mut positional = Vec::new();
    let mut workers = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--workers" => {
                let value = args.next().context("--workers needs a value")?;
                workers = Some(value.parse().context("--workers must be a number")?);
            }
            _ => positional.push(PathBuf::from(arg)),
        }
    }

    if positional.len() < 2 || positional.len() > 3 {
        bail!("usage: cgramap <config.toml> <app.json> [result.json] [--workers N]");
    }

    let mut positional = positional.into_iter();
    Ok(CliArgs {
        config_path: positional.next().context("missing config path")?,
        app_path: positional.next().context("missing application path")?,
        output_path: positional.next(),
        workers,
    })
}

fn result_to_json(app: &Application, result: &RunResult) -> serde_json::Value {
    let front: Vec<serde_json::Value> = result
        .pareto_front
        .iter()
        .map(|individual| {
            let mapping: serde_json::Map<String, serde_json::Value> = individual
                .mapping()
                .iter()
                .map(|(node, cell)| {
                    (
                        app.node(*node).name.clone(),
                        serde_json::json!([cell.x, cell.y]),
                    )
                })
                .collect();
            serde_json::json!({
                "mapping": mapping,
                "fitness": individual.fitness(),
                "routing_cost": individual.routing_cost(),
                "preg": individual.preg(),
            })
        })
        .collect();

    serde_json::json!({
        "application": app.name(),
        "generations": result.generations,
        "stall": result.stall,
        "finished_at": result.finished_at,
        "pareto_front": front,
        "hypervolume_log": result.hypervolume_log,
    })
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = parse_args()?;

    let manager = ConfigManager::new();
    manager
        .load_from_file(&cli.config_path)
        .with_context(|| format!("loading {}", cli.config_path.display()))?;
    let config = manager.get();

    let app = Application::from_json_file(&cli.app_path)
        .with_context(|| format!("loading {}", cli.app_path.display()))?;
    let model = ArrayModel::new(config.array.width, config.array.height, config.array.preg_count)?;
    let sim = SimParams {
        alu_delay: config.array.alu_delay,
        se_delay: config.array.se_delay,
    };

    let mut optimizer = MappingOptimizer::from_config(&config)?;
    let bound = optimizer.setup(model, app.clone(), sim, config.placement, cli.workers)?;
    if !bound {
        bail!(
            "no feasible initial placement for '{}' on a {}x{} array",
            app.name(),
            config.array.width,
            config.array.height
        );
    }

    let result = optimizer.run(&mut ConsoleProgress)?;

    println!(
        "Found {} non-dominated mappings in {} generations.",
        result.pareto_front.len(),
        result.generations
    );

    let summary = result_to_json(&app, &result);
    match &cli.output_path {
        Some(path) => {
            std::fs::write(path, serde_json::to_string_pretty(&summary)?)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Result written to {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&summary)?),
    }

    Ok(())
}
