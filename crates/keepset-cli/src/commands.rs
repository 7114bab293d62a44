use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use colored::Colorize;
use serde_json::json;

use keepset_engine::{JobConfig, JobReport, Pruner, RunMode};
use keepset_store::{Dataset, InMemoryRowStore};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Prune(args) => cmd_prune(args, cli.format),
        Command::Mark(args) => cmd_mark(args, cli.format),
        Command::CheckConfig(args) => cmd_check_config(args, cli.format),
        Command::Stats(args) => cmd_stats(args, cli.format),
    }
}

fn load_store(path: &Path) -> anyhow::Result<InMemoryRowStore> {
    let dataset = Dataset::load(path).with_context(|| format!("loading {}", path.display()))?;
    InMemoryRowStore::from_dataset(dataset)
        .with_context(|| format!("invalid dataset {}", path.display()))
}

fn load_config(path: Option<&Path>) -> anyhow::Result<JobConfig> {
    match path {
        Some(path) => JobConfig::load(path).context("loading job file"),
        None => Ok(JobConfig::default()),
    }
}

fn run_job(job: &JobArgs, store: &InMemoryRowStore, mode: RunMode) -> anyhow::Result<JobReport> {
    let config = load_config(job.config.as_deref())?;
    let now = job.now.unwrap_or_else(Utc::now);
    let pruner = Pruner::new(store, config, now)?;
    Ok(pruner.run(mode)?)
}

fn cmd_prune(args: PruneArgs, format: OutputFormat) -> anyhow::Result<()> {
    let store = load_store(&args.job.data)?;
    let mode = if args.dry_run { RunMode::MarkOnly } else { RunMode::Full };
    let report = run_job(&args.job, &store, mode)?;

    if !args.dry_run {
        let output = args.output.as_deref().unwrap_or(&args.job.data);
        store
            .to_dataset()?
            .save(output)
            .with_context(|| format!("writing {}", output.display()))?;
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_report(&report),
    }
    Ok(())
}

fn cmd_mark(args: MarkArgs, format: OutputFormat) -> anyhow::Result<()> {
    let store = load_store(&args.job.data)?;
    let report = run_job(&args.job, &store, RunMode::MarkOnly)?;
    let retained = store.retained_ids()?;

    if let Some(output) = &args.output {
        store
            .to_dataset()?
            .save(output)
            .with_context(|| format!("writing {}", output.display()))?;
    }

    match format {
        OutputFormat::Json => {
            let body = json!({ "report": report, "retained": retained });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Text => {
            print_report(&report);
            let ids: Vec<String> = retained.iter().map(ToString::to_string).collect();
            println!("\nRetained ids: {}", ids.join(" ").dimmed());
        }
    }
    Ok(())
}

fn cmd_check_config(args: CheckConfigArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = JobConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    config.validate()?;
    let specs = config.strategy_specs()?;

    match format {
        OutputFormat::Json => {
            let names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
            println!("{}", json!({ "valid": true, "strategies": names }));
        }
        OutputFormat::Text => {
            println!("{} {} is valid", "✓".green().bold(), args.config.display());
            for spec in &specs {
                let backfill = if spec.skip_backfill { "no backfill" } else { "backfill" };
                println!("  {} ({})", spec.name.yellow(), backfill.dimmed());
            }
        }
    }
    Ok(())
}

fn cmd_stats(args: StatsArgs, format: OutputFormat) -> anyhow::Result<()> {
    let store = load_store(&args.data)?;
    let counts = store.counts()?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&counts)?),
        OutputFormat::Text => {
            println!("{}", args.data.display().to_string().bold());
            let rows = [
                ("objects", counts.objects),
                ("meta", counts.meta),
                ("term taxonomies", counts.term_taxonomies),
                ("term relationships", counts.term_relationships),
                ("comments", counts.comments),
                ("comment meta", counts.comment_meta),
                ("retained", counts.retained),
            ];
            for (label, count) in rows {
                println!("  {:<20} {}", label, count.to_string().cyan());
            }
        }
    }
    Ok(())
}

fn print_report(report: &JobReport) {
    println!("Run {}", report.run_id.to_string().dimmed());
    for mark in &report.marks {
        println!(
            "  {} {:<9} {} pages, {} roots, {} embedded, {} linked, {} ancestors, {} new",
            mark.strategy.yellow(),
            mark.pass.to_string(),
            mark.pages,
            mark.roots,
            mark.embedded,
            mark.linked,
            mark.ancestors,
            mark.inserted.to_string().green(),
        );
    }
    println!(
        "Retained {} objects; {} candidates for deletion",
        report.retained.to_string().green().bold(),
        report.candidates.to_string().red()
    );

    let Some(sweep) = &report.sweep else {
        println!("{} Dry run: nothing deleted.", "•".cyan());
        return;
    };
    let d = &sweep.deleted;
    println!(
        "Deleted {} objects and {} revisions in {} batches",
        d.objects.to_string().red().bold(),
        d.revisions,
        sweep.batches
    );
    println!(
        "  {} meta, {} comments, {} comment meta, {} term links; {} children re-parented",
        d.meta, d.comments, d.comment_meta, d.relationships, d.reparented
    );
    for pass in &report.post_passes {
        println!("  {} {}: {} rows", "↳".dimmed(), pass.name, pass.rows);
    }
    if report.is_complete() {
        println!("{} Prune complete.", "✓".green().bold());
    } else {
        println!(
            "{} Safety valve tripped after {} of {} expected batches; re-run to finish.",
            "!".yellow().bold(),
            sweep.batches,
            sweep.expected_batches
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keepset_store::fixtures::DatasetBuilder;
    use keepset_types::ObjectId;
    use std::io::Write;

    fn write_dataset(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("site.json");
        DatasetBuilder::new()
            .object(1, "nav_menu_item")
            .meta(1, "_menu_item_type", "post_type")
            .meta(1, "_menu_item_object_id", "2")
            .object(2, "page")
            .object(3, "page")
            .build()
            .save(&path)
            .unwrap();
        path
    }

    fn job(data: &Path) -> JobArgs {
        JobArgs {
            data: data.to_path_buf(),
            config: None,
            now: None,
        }
    }

    #[test]
    fn prune_writes_pruned_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let data = write_dataset(dir.path());
        let output = dir.path().join("out.json");

        cmd_prune(
            PruneArgs {
                job: job(&data),
                output: Some(output.clone()),
                dry_run: false,
            },
            OutputFormat::Json,
        )
        .unwrap();

        let pruned = Dataset::load(&output).unwrap();
        let ids: Vec<ObjectId> = pruned.objects.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![ObjectId::new(1), ObjectId::new(2)]);
        // The input is untouched when an output path is given.
        assert_eq!(Dataset::load(&data).unwrap().objects.len(), 3);
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let data = write_dataset(dir.path());
        cmd_prune(
            PruneArgs {
                job: job(&data),
                output: None,
                dry_run: true,
            },
            OutputFormat::Text,
        )
        .unwrap();
        assert_eq!(Dataset::load(&data).unwrap().objects.len(), 3);
    }

    #[test]
    fn check_config_reports_bad_files() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "use_presets = []\n[[strategies]]\nname = \"x\"").unwrap();
        let err = cmd_check_config(
            CheckConfigArgs {
                config: file.path().to_path_buf(),
            },
            OutputFormat::Text,
        )
        .unwrap_err();
        assert!(err.to_string().contains("types"));
    }

    #[test]
    fn stats_reads_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let data = write_dataset(dir.path());
        cmd_stats(StatsArgs { data }, OutputFormat::Text).unwrap();
    }
}
