//! Pipeline Coordinator
//!
//! Runs Merge -> Layout -> per-layer Tour Optimization -> G-code Emission and
//! writes one G-code file per layer.
//!
//! Per-layer work is CPU-bound and runs on blocking worker tasks, at most
//! `workers` at a time. Layer programs are written to temporary files in the
//! output directory and only moved into place once every layer succeeded; a
//! failed or cancelled run leaves nothing behind.

use crate::cancel::CancellationFlag;
use crate::gcode_gen::GcodeEmitter;
use crate::layout::{LayoutPolicy, LayoutTransformer, TargetSize};
use crate::merger::{merge_layer, page_frame};
use crate::optimizer::{OptimizerOptions, TourOptimizer};
use penplot_core::{
    Drawing, Error, InputError, Layer, PlotterProfile, ProcessingError, Result, SourceGeometry,
    Stage, DEFAULT_TOLERANCE,
};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinSet};

/// Placeholder for the input name in an output pattern.
pub const NAME_PLACEHOLDER: &str = "{name}";
/// Placeholder for the layer name in an output pattern.
pub const LAYER_PLACEHOLDER: &str = "{layer}";
/// Output pattern used when the caller gives none.
pub const DEFAULT_OUTPUT_PATTERN: &str = "{name}_{layer}.gcode";

/// Number of available processing units, at least one.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Pipeline settings
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Endpoint matching tolerance ε (mm)
    pub tolerance: f64,
    /// Requested size of the drawing's reference frame
    pub target: TargetSize,
    /// Placement inside the plotter area
    pub policy: LayoutPolicy,
    /// 2-opt pass cap per layer
    pub max_passes: usize,
    /// Optional 2-opt time budget per layer
    pub time_budget: Option<Duration>,
    /// Concurrent layer tasks
    pub workers: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            target: TargetSize::Natural,
            policy: LayoutPolicy::Centered,
            max_passes: OptimizerOptions::default().max_passes,
            time_budget: None,
            workers: default_workers(),
        }
    }
}

/// Where output files go and how they are named.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSpec {
    pub directory: PathBuf,
    /// File name pattern with `{name}` and `{layer}` placeholders
    pub pattern: String,
    /// Value substituted for `{name}`, usually the input file stem
    pub name: String,
}

impl OutputSpec {
    pub fn new(directory: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            pattern: DEFAULT_OUTPUT_PATTERN.to_string(),
            name: name.into(),
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }
}

/// Makes a layer attribute such as `#ff0000` safe for a file name.
pub fn sanitize_layer_name(layer: &str) -> String {
    let mapped: String = layer
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = mapped.trim_matches(|c| c == '_' || c == '.');
    if trimmed.is_empty() {
        "layer".to_string()
    } else {
        trimmed.to_string()
    }
}

fn with_suffix(file_name: &str, n: usize) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}-{}.{}", stem, n, ext),
        _ => format!("{}-{}", file_name, n),
    }
}

/// Output path for each layer, in order. Colliding names get `-2`, `-3`, ...
pub fn resolve_output_paths(output: &OutputSpec, layers: &[&str]) -> Vec<PathBuf> {
    let mut taken = HashSet::new();
    layers
        .iter()
        .map(|layer| {
            let base = output
                .pattern
                .replace(NAME_PLACEHOLDER, &output.name)
                .replace(LAYER_PLACEHOLDER, &sanitize_layer_name(layer));
            let mut file_name = base.clone();
            let mut n = 2;
            while !taken.insert(file_name.clone()) {
                file_name = with_suffix(&base, n);
                n += 1;
            }
            output.directory.join(file_name)
        })
        .collect()
}

/// Per-layer outcome of a run
#[derive(Debug, Clone, PartialEq)]
pub struct LayerReport {
    pub layer: String,
    pub path: PathBuf,
    pub polylines: usize,
    /// Pen-up travel after nearest-neighbor construction (mm)
    pub travel_before: f64,
    /// Pen-up travel after 2-opt (mm)
    pub travel_after: f64,
    /// Pen-down distance (mm)
    pub draw_length: f64,
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub layers: Vec<LayerReport>,
    /// Laid-out reference frame size (mm)
    pub width: f64,
    pub height: f64,
}

struct LayerOutput {
    report: LayerReport,
    file: NamedTempFile,
}

fn task_failed(layer: &str, err: tokio::task::JoinError) -> Error {
    ProcessingError::LayerFailed {
        layer: layer.to_string(),
        reason: err.to_string(),
    }
    .into()
}

/// Orchestrates one processing run.
#[derive(Debug, Clone)]
pub struct Pipeline {
    profile: PlotterProfile,
    options: PipelineOptions,
    cancel: CancellationFlag,
}

impl Pipeline {
    pub fn new(profile: PlotterProfile, options: PipelineOptions) -> Self {
        Self {
            profile,
            options,
            cancel: CancellationFlag::new(),
        }
    }

    /// Uses a caller-owned cancellation signal.
    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    fn semaphore(&self) -> Arc<Semaphore> {
        Arc::new(Semaphore::new(self.options.workers.max(1)))
    }

    /// Processes `source` and writes one program per non-empty layer.
    ///
    /// Fails on the first stage error, tagged with the stage; in that case no
    /// output file is left on disk.
    pub async fn run(&self, source: SourceGeometry, output: &OutputSpec) -> Result<PipelineReport> {
        // internal failures stop sibling tasks without touching the caller's flag
        let abort = self.cancel.child();

        let frame = page_frame(source.width, source.height);
        let layers = self
            .merge(source, &abort)
            .await
            .map_err(|e| e.at_stage(Stage::Merge))?;

        let (kept, empty): (Vec<Layer>, Vec<Layer>) =
            layers.into_iter().partition(|l| !l.is_empty());
        for layer in &empty {
            tracing::warn!("Layer '{}' has no drawable geometry, skipping", layer.name);
        }
        if kept.is_empty() {
            return Err(Error::from(InputError::Malformed {
                reason: "no drawable geometry".to_string(),
            })
            .at_stage(Stage::Input));
        }

        let mut drawing = Drawing::new(kept);
        if let Some(frame) = frame {
            drawing = drawing.with_frame(frame);
        }

        tracing::info!("Layout: fitting drawing into plotter area");
        let laid_out = LayoutTransformer::new(self.profile.area)
            .with_policy(self.options.policy)
            .layout(&drawing, self.options.target)
            .map_err(|e| e.at_stage(Stage::Layout))?;
        let frame = laid_out.reference_box();

        let outputs = self.optimize_and_emit(laid_out, output, &abort).await?;
        let layers = persist_all(outputs).map_err(|e| e.at_stage(Stage::Output))?;

        tracing::info!("Wrote {} G-code file(s)", layers.len());
        Ok(PipelineReport {
            layers,
            width: frame.width(),
            height: frame.height(),
        })
    }

    async fn merge(&self, source: SourceGeometry, abort: &CancellationFlag) -> Result<Vec<Layer>> {
        tracing::info!("Merge: {} layer(s)", source.layers.len());
        let semaphore = self.semaphore();
        let tolerance = self.options.tolerance;
        let count = source.layers.len();
        let mut names = HashMap::new();
        let mut tasks = JoinSet::new();

        for (index, layer) in source.layers.into_iter().enumerate() {
            abort.check()?;
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| ProcessingError::LayerFailed {
                    layer: layer.name.clone(),
                    reason: e.to_string(),
                })?;
            let name = layer.name.clone();
            let handle = tasks.spawn_blocking(move || {
                let _permit = permit;
                (index, merge_layer(&layer, tolerance))
            });
            names.insert(handle.id(), name);
        }

        let mut merged: Vec<Option<Layer>> = vec![None; count];
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((_, (index, layer))) => merged[index] = Some(layer),
                Err(err) => {
                    abort.cancel();
                    let name = layer_name(&names, err.id());
                    return Err(task_failed(&name, err));
                }
            }
        }
        Ok(merged.into_iter().flatten().collect())
    }

    async fn optimize_and_emit(
        &self,
        drawing: Drawing,
        output: &OutputSpec,
        abort: &CancellationFlag,
    ) -> Result<Vec<LayerOutput>> {
        let layers = drawing.into_layers();
        let names: Vec<&str> = layers.iter().map(|l| l.name.as_str()).collect();
        let paths = resolve_output_paths(output, &names);

        std::fs::create_dir_all(&output.directory).map_err(|e| {
            Error::from(ProcessingError::Output {
                path: output.directory.display().to_string(),
                reason: e.to_string(),
            })
            .at_stage(Stage::Output)
        })?;

        tracing::info!("Optimize: {} layer(s)", layers.len());
        let semaphore = self.semaphore();
        let optimizer = TourOptimizer::new(OptimizerOptions {
            tolerance: self.options.tolerance,
            max_passes: self.options.max_passes,
            time_budget: self.options.time_budget,
            ..OptimizerOptions::default()
        });
        let emitter = GcodeEmitter::new(self.profile);
        let count = layers.len();
        let mut names = HashMap::new();
        let mut tasks = JoinSet::new();

        let mut failure: Option<Error> = None;
        for (index, (layer, path)) in layers.into_iter().zip(paths).enumerate() {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    abort.cancel();
                    failure = Some(
                        Error::from(ProcessingError::LayerFailed {
                            layer: layer.name.clone(),
                            reason: e.to_string(),
                        })
                        .at_stage(Stage::Optimize),
                    );
                    break;
                }
            };
            // no new layer starts once the run is cancelled; tasks already
            // spawned are still drained below so their temp files are removed
            if let Err(e) = abort.check() {
                failure = Some(e.at_stage(Stage::Optimize));
                break;
            }
            let name = layer.name.clone();
            let optimizer = optimizer.clone();
            let emitter = emitter.clone();
            let cancel = abort.clone();
            let directory = output.directory.clone();
            let handle = tasks.spawn_blocking(move || {
                let _permit = permit;
                process_layer(&optimizer, &emitter, &cancel, layer, path, &directory)
                    .map(|out| (index, out))
            });
            names.insert(handle.id(), name);
        }

        let mut outputs: Vec<Option<LayerOutput>> = (0..count).map(|_| None).collect();
        while let Some(joined) = tasks.join_next_with_id().await {
            let result = match joined {
                Ok((_, result)) => result,
                Err(err) => {
                    let name = layer_name(&names, err.id());
                    Err(task_failed(&name, err).at_stage(Stage::Optimize))
                }
            };
            match result {
                Ok((index, out)) => outputs[index] = Some(out),
                Err(err) => {
                    abort.cancel();
                    // keep the first real failure rather than the cancellations it caused
                    let replace = match &failure {
                        None => true,
                        Some(existing) => existing.is_cancelled() && !err.is_cancelled(),
                    };
                    if replace {
                        failure = Some(err);
                    }
                }
            }
        }

        if let Some(err) = failure {
            // dropping the collected temp files deletes them
            return Err(err);
        }
        Ok(outputs.into_iter().flatten().collect())
    }
}

fn layer_name(names: &HashMap<Id, String>, id: Id) -> String {
    names
        .get(&id)
        .cloned()
        .unwrap_or_else(|| "<unknown>".to_string())
}

fn process_layer(
    optimizer: &TourOptimizer,
    emitter: &GcodeEmitter,
    cancel: &CancellationFlag,
    layer: Layer,
    path: PathBuf,
    directory: &Path,
) -> Result<LayerOutput> {
    let tour = optimizer
        .optimize_cancellable(&layer.polylines, cancel)
        .map_err(|e| e.at_stage(Stage::Optimize))?;
    tracing::debug!(
        "Layer '{}': {} polylines, travel {:.3} -> {:.3} mm",
        layer.name,
        tour.polylines.len(),
        tour.initial_travel,
        tour.final_travel
    );

    let ordered = Layer::new(layer.name, tour.polylines);
    let gcode = emitter.emit_layer(&ordered);

    let output_err = |e: std::io::Error| {
        Error::from(ProcessingError::Output {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
        .at_stage(Stage::Output)
    };
    cancel.check().map_err(|e| e.at_stage(Stage::Emit))?;
    let mut file = NamedTempFile::new_in(directory).map_err(output_err)?;
    file.write_all(gcode.as_bytes()).map_err(output_err)?;
    file.flush().map_err(output_err)?;

    Ok(LayerOutput {
        report: LayerReport {
            polylines: ordered.polylines.len(),
            draw_length: ordered.draw_length(),
            layer: ordered.name,
            path,
            travel_before: tour.initial_travel,
            travel_after: tour.final_travel,
        },
        file,
    })
}

/// Moves every temp file into place, undoing earlier moves if one fails.
fn persist_all(outputs: Vec<LayerOutput>) -> Result<Vec<LayerReport>> {
    let mut written: Vec<PathBuf> = Vec::new();
    let mut reports = Vec::with_capacity(outputs.len());
    for out in outputs {
        let path = out.report.path.clone();
        if let Err(e) = out.file.persist(&path) {
            for done in &written {
                if let Err(remove_err) = std::fs::remove_file(done) {
                    tracing::warn!("Failed to remove {}: {}", done.display(), remove_err);
                }
            }
            return Err(ProcessingError::Output {
                path: path.display().to_string(),
                reason: e.error.to_string(),
            }
            .into());
        }
        tracing::debug!("Wrote {}", path.display());
        written.push(path);
        reports.push(out.report);
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_layer_name() {
        assert_eq!(sanitize_layer_name("#ff0000"), "ff0000");
        assert_eq!(sanitize_layer_name("rgb(0, 0, 255)"), "rgb_0__0__255");
        assert_eq!(sanitize_layer_name("../../etc"), "etc");
        assert_eq!(sanitize_layer_name("///"), "layer");
        assert_eq!(sanitize_layer_name("black"), "black");
    }

    #[test]
    fn test_resolve_output_paths() {
        let output = OutputSpec::new("out", "art");
        let paths = resolve_output_paths(&output, &["red", "#red", "blue"]);
        assert_eq!(paths[0], Path::new("out").join("art_red.gcode"));
        assert_eq!(paths[1], Path::new("out").join("art_red-2.gcode"));
        assert_eq!(paths[2], Path::new("out").join("art_blue.gcode"));

        let output = OutputSpec::new("out", "art").with_pattern("plot.gcode");
        let paths = resolve_output_paths(&output, &["a", "b", "c"]);
        assert_eq!(paths[2], Path::new("out").join("plot-3.gcode"));
    }
}
