//! Command handlers
//!
//! Each subcommand loads the settings document, does its work through the
//! library crates and prints a short report on stdout.

use crate::cli::{Cli, Commands, PaperCommand, SheetArgs, SizeArgs};
use anyhow::Context;
use penplot_camtools::{
    boundary_file_name, boundary_geometry, calibration_file_name, calibration_geometry, load_svg,
    BoundaryStyle, CalibrationPattern, LayoutPolicy, LayoutTransformer, OutputSpec, Pipeline,
    PipelineOptions, PipelineReport, TargetSize,
};
use penplot_core::{MeasurementSystem, SourceGeometry};
use penplot_settings::{Config, PaperSize, SettingsManager};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Runs the parsed command line.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let units = cli.units();
    let manager = SettingsManager::with_override(cli.config.as_deref())?;
    let mut config = manager.load_or_default()?;

    match cli.command {
        Commands::List => list_papers(&config, units),
        Commands::General => show_general(&config, units),
        Commands::Check { input, size } => check(&config, &input, &size, units)?,
        Commands::Process {
            input,
            size,
            output,
            pattern,
            layout,
            passes,
            workers,
            tolerance,
        } => {
            let target = target_size(&config, &size, units)?;
            let mut options = pipeline_options(&config);
            options.target = target;
            options.policy = layout.into();
            if let Some(passes) = passes {
                options.max_passes = passes;
            }
            if let Some(workers) = workers {
                options.workers = workers.max(1);
            }
            if let Some(tolerance) = tolerance {
                anyhow::ensure!(
                    tolerance.is_finite() && tolerance > 0.0,
                    "Tolerance must be positive (got {})",
                    tolerance
                );
                options.tolerance = tolerance;
            }

            let source = load_svg(&input)?;
            let name = input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "drawing".to_string());
            let directory = output.unwrap_or_else(|| input_directory(&input).join(&name));
            let destination = OutputSpec::new(directory, name).with_pattern(pattern);
            let report = run_pipeline(&config, options, source, &destination).await?;
            print_report(&report, units);
        }
        Commands::Paper { action } => {
            edit_papers(&mut config, action, units)?;
            manager
                .save(&config)
                .with_context(|| format!("Saving {}", manager.path().display()))?;
        }
        Commands::Boundary {
            sheet,
            outline,
            output,
        } => {
            let paper = sheet_size(&config, &sheet, units)?;
            let style = if outline {
                BoundaryStyle::Outline
            } else {
                BoundaryStyle::CornerMarks
            };
            let source = boundary_geometry(paper.width, paper.height, style);
            let destination = OutputSpec::new(output, paper.name.as_str())
                .with_pattern(boundary_file_name(paper.width, paper.height));
            let report =
                run_pipeline(&config, pipeline_options(&config), source, &destination).await?;
            print_report(&report, units);
        }
        Commands::Calibrate {
            sheet,
            pattern,
            output,
        } => {
            let paper = sheet_size(&config, &sheet, units)?;
            let pattern = CalibrationPattern::from(pattern);
            let source = calibration_geometry(paper.width, paper.height, pattern);
            let destination = OutputSpec::new(output, paper.name.as_str())
                .with_pattern(calibration_file_name(pattern, paper.width, paper.height));
            let report =
                run_pipeline(&config, pipeline_options(&config), source, &destination).await?;
            print_report(&report, units);
        }
    }

    Ok(())
}

fn input_directory(input: &Path) -> PathBuf {
    match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Sheet from a library paper name or a custom `--width`/`--height`.
fn sheet_size(
    config: &Config,
    sheet: &SheetArgs,
    units: MeasurementSystem,
) -> anyhow::Result<PaperSize> {
    if let Some(name) = &sheet.paper {
        return Ok(config.papers.require(name)?.clone());
    }
    match (sheet.width, sheet.height) {
        (Some(width), Some(height)) => {
            let (width, height) = (units.to_mm(width), units.to_mm(height));
            anyhow::ensure!(
                width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0,
                "Sheet size must be positive (got {} x {})",
                width,
                height
            );
            Ok(PaperSize::new(format!("{}x{}", width, height), width, height))
        }
        _ => anyhow::bail!("Give a paper name or both --width and --height"),
    }
}

/// Pipeline options from the `[optimizer]` settings section.
pub fn pipeline_options(config: &Config) -> PipelineOptions {
    let optimizer = &config.optimizer;
    let mut options = PipelineOptions {
        tolerance: optimizer.tolerance,
        max_passes: optimizer.two_opt_passes,
        time_budget: optimizer.time_budget(),
        policy: LayoutPolicy::Centered,
        ..PipelineOptions::default()
    };
    if let Some(workers) = optimizer.workers {
        options.workers = workers.max(1);
    }
    options
}

/// Target size from `--paper` or `--width`/`--height`, in millimetres.
pub fn target_size(
    config: &Config,
    size: &SizeArgs,
    units: MeasurementSystem,
) -> anyhow::Result<TargetSize> {
    let target = match &size.paper {
        Some(name) => {
            let paper = config.papers.require(name)?;
            TargetSize::Exact {
                width: paper.width,
                height: paper.height,
            }
        }
        None => TargetSize::from_dimensions(
            size.width.map(|w| units.to_mm(w)),
            size.height.map(|h| units.to_mm(h)),
        ),
    };
    target.validate()?;
    Ok(target)
}

/// Runs the pipeline, raising the cancellation flag on Ctrl-C.
async fn run_pipeline(
    config: &Config,
    options: PipelineOptions,
    source: SourceGeometry,
    destination: &OutputSpec,
) -> anyhow::Result<PipelineReport> {
    let pipeline = Pipeline::new(config.profile(), options);
    let cancel = pipeline.cancellation();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling run");
            cancel.cancel();
        }
    });

    let started = Instant::now();
    let result = pipeline.run(source, destination).await;
    watcher.abort();
    tracing::info!("Run finished in {:.2?}", started.elapsed());
    Ok(result?)
}

fn print_report(report: &PipelineReport, units: MeasurementSystem) {
    println!(
        "Plotted {} on the plotter area",
        units.format_size(report.width, report.height)
    );
    for layer in &report.layers {
        println!(
            "  {} -> {} ({} polylines, draw {}, travel {} -> {})",
            layer.layer,
            layer.path.display(),
            layer.polylines,
            units.format_length(layer.draw_length),
            units.format_length(layer.travel_before),
            units.format_length(layer.travel_after)
        );
    }
}

fn list_papers(config: &Config, units: MeasurementSystem) {
    if config.papers.is_empty() {
        println!("The paper library is empty");
        return;
    }
    println!("Paper sizes:");
    for paper in config.papers.iter() {
        println!(
            "  {:<12} {}",
            paper.name,
            units.format_size(paper.width, paper.height)
        );
    }
}

fn show_general(config: &Config, units: MeasurementSystem) {
    let general = &config.general;
    let optimizer = &config.optimizer;
    println!(
        "Plotter area:     {}",
        units.format_size(general.area_width, general.area_height)
    );
    println!(
        "Pen heights:      up {} / down {}",
        units.format_length(general.z_up),
        units.format_length(general.z_down)
    );
    println!(
        "Feed rates:       draw {:.0} / travel {:.0} / z {:.0} mm/min",
        general.feed_rate_draw, general.feed_rate_travel, general.feed_rate_z
    );
    println!("Invert Y:         {}", general.invert_y);
    println!("Tolerance:        {} mm", optimizer.tolerance);
    println!("2-opt passes:     {}", optimizer.two_opt_passes);
    match optimizer.time_budget_ms {
        Some(ms) => println!("2-opt time limit: {} ms", ms),
        None => println!("2-opt time limit: none"),
    }
    println!(
        "Workers:          {}",
        optimizer
            .workers
            .map_or_else(|| "auto".to_string(), |w| w.to_string())
    );
}

/// Reports papers matching the drawing's aspect ratio and whether the
/// requested size fits the plotter area.
pub fn check(
    config: &Config,
    input: &Path,
    size: &SizeArgs,
    units: MeasurementSystem,
) -> anyhow::Result<()> {
    let source = load_svg(input)?;
    let (width, height) = (source.width, source.height);
    println!("Drawing size: {}", units.format_size(width, height));

    let matching = config.papers.matching_aspect(width / height);
    if matching.is_empty() {
        println!("No paper in the library matches the drawing's aspect ratio");
    } else {
        println!("Papers with the same aspect ratio:");
        for paper in matching {
            println!(
                "  {:<12} {}",
                paper.name,
                units.format_size(paper.width, paper.height)
            );
        }
    }

    let target = target_size(config, size, units)?;
    let (target_width, target_height) = target.resolve(width, height);
    LayoutTransformer::new(config.area()).check_fits(target_width, target_height)?;
    println!(
        "{} fits the {} plotter area",
        units.format_size(target_width, target_height),
        units.format_size(config.general.area_width, config.general.area_height)
    );
    Ok(())
}

/// Applies a paper library change to `config`.
pub fn edit_papers(
    config: &mut Config,
    action: PaperCommand,
    units: MeasurementSystem,
) -> anyhow::Result<()> {
    match action {
        PaperCommand::Add {
            name,
            width,
            height,
        } => {
            config
                .papers
                .add(PaperSize::new(name.as_str(), units.to_mm(width), units.to_mm(height)))?;
            println!("Added paper size {}", name);
        }
        PaperCommand::Edit {
            name,
            width,
            height,
        } => {
            anyhow::ensure!(
                width.is_some() || height.is_some(),
                "Nothing to change: give --width and/or --height"
            );
            config.papers.edit(
                &name,
                width.map(|w| units.to_mm(w)),
                height.map(|h| units.to_mm(h)),
            )?;
            println!("Updated paper size {}", name);
        }
        PaperCommand::Remove { name } => {
            let removed = config.papers.remove(&name)?;
            println!("Removed paper size {}", removed.name);
        }
    }
    Ok(())
}
