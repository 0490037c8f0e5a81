use super::VERSION;
use crate::error::RenderError;
use crate::figure::{AxisScale, Figure, Trace, OVERLAY_FILE_NAME, PER_FILE_SUFFIX};
use crate::utils::file_stem;
use crate::{ColumnPolicy, Dataset, IngestOptions, DEFAULT_COMMENT};
use clap::{value_parser, Arg, ArgAction, Command};
use log::{info, warn};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotMode {
    Overlay,
    PerFile,
    Both,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BodeConfig {
    pub dir: PathBuf,
    pub output: PathBuf,
    pub outdir: PathBuf,
    pub mode: PlotMode,
    pub x_scale: AxisScale,
    pub ingest: IngestOptions,
    pub verbose: bool,
}

/// Takes the CLI arguments that control the Bode plots.
/// No argument is required, by default all the csv files of the current directory
/// are overlaid in a single html.
pub fn parse_cli() -> BodeConfig {
    let arg_dir = Arg::new("dir")
        .help("directory with the csv files")
        .short('d')
        .long("dir")
        .num_args(1)
        .value_parser(value_parser!(PathBuf))
        .default_value(".");
    let arg_output = Arg::new("output")
        .help("name of the overlay html file, default bode_all.html in the csv directory")
        .short('o')
        .long("output")
        .num_args(1)
        .value_parser(value_parser!(PathBuf));
    let arg_outdir = Arg::new("outdir")
        .help("directory for the single-file html plots, default the csv directory")
        .long("outdir")
        .num_args(1)
        .value_parser(value_parser!(PathBuf));
    let arg_per_file = Arg::new("per_file")
        .help("one html plot per csv file instead of the overlay")
        .long("per-file")
        .action(ArgAction::SetTrue)
        .conflicts_with("both");
    let arg_both = Arg::new("both")
        .help("both the overlay and the single-file plots")
        .long("both")
        .action(ArgAction::SetTrue);
    let arg_linear_x = Arg::new("linear_x")
        .help("linear frequency axis instead of log")
        .long("linear-x")
        .action(ArgAction::SetTrue);
    let arg_strict = Arg::new("strict_columns")
        .help("reject files and rows with more than two columns instead of keeping the first two")
        .long("strict-columns")
        .action(ArgAction::SetTrue);
    let arg_comment = Arg::new("comment")
        .help("marker of the comment lines")
        .long("comment")
        .num_args(1)
        .value_parser(value_parser!(char))
        .default_value("#");
    let arg_verbose = Arg::new("verbose")
        .help("print verbose information")
        .short('v')
        .long("verbose")
        .action(ArgAction::SetTrue);
    let cli_args = Command::new("Bode_plot")
        .version(VERSION.unwrap_or("unknown"))
        .author("Luca Peruzzo")
        .about("cli app to plot the Bode magnitude of the csv files to html")
        .arg(arg_dir)
        .arg(arg_output)
        .arg(arg_outdir)
        .arg(arg_per_file)
        .arg(arg_both)
        .arg(arg_linear_x)
        .arg(arg_strict)
        .arg(arg_comment)
        .arg(arg_verbose)
        .get_matches();

    // dir and comment have a default, get_one always gives Some
    let dir: PathBuf = cli_args
        .get_one::<PathBuf>("dir")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."));
    // output and outdir do not have a default because they are based on the dir
    let output = match cli_args.get_one::<PathBuf>("output") {
        Some(p) => p.to_owned(),
        None => dir.join(OVERLAY_FILE_NAME),
    };
    let outdir = match cli_args.get_one::<PathBuf>("outdir") {
        Some(p) => p.to_owned(),
        None => dir.clone(),
    };
    let mode = if cli_args.get_flag("both") {
        PlotMode::Both
    } else if cli_args.get_flag("per_file") {
        PlotMode::PerFile
    } else {
        PlotMode::Overlay
    };
    let x_scale = if cli_args.get_flag("linear_x") {
        AxisScale::Linear
    } else {
        AxisScale::Log
    };
    let columns = if cli_args.get_flag("strict_columns") {
        ColumnPolicy::Strict
    } else {
        ColumnPolicy::Truncate
    };
    let comment = cli_args
        .get_one::<char>("comment")
        .copied()
        .unwrap_or(DEFAULT_COMMENT);

    BodeConfig {
        dir,
        output,
        outdir,
        mode,
        x_scale,
        ingest: IngestOptions { comment, columns },
        verbose: cli_args.get_flag("verbose"),
    }
}

/// Plot a single csv file to `<outdir>/<stem>_bode.html`.
pub fn plot_bode_for_file(
    csvin: &Path,
    outdir: &Path,
    x_scale: AxisScale,
    opts: &IngestOptions,
) -> anyhow::Result<PathBuf> {
    let ds = Dataset::from_csv(csvin, opts)?;
    let fout = outdir.join(format!("{}{}", file_stem(csvin), PER_FILE_SUFFIX));
    let written = Figure::bode(&ds, x_scale).write_html(fout)?;
    Ok(written)
}

/// Build the overlay figure with one trace per readable file.
/// The axis titles come from the first file that could be read.
/// Files that fail are reported and skipped.
pub fn overlay_figure(csvins: &[PathBuf], x_scale: AxisScale, opts: &IngestOptions) -> Figure {
    let mut fig = Figure::bode_overlay(x_scale);
    for csvin in csvins.iter() {
        match Dataset::from_csv(csvin, opts) {
            Ok(ds) => {
                if fig.x_title.is_none() {
                    fig.set_axis_titles(&ds.x_label, &ds.y_label);
                }
                info!("> add {} with {} rows", ds.name, ds.len());
                fig.add_trace(Trace::from(&ds));
            }
            Err(e) => warn!("skipping {}", e),
        }
    }
    fig
}

/// Overlay all the files in a single html, fails only when no file could be plotted.
pub fn plot_overlay(
    csvins: &[PathBuf],
    fout: &Path,
    x_scale: AxisScale,
    opts: &IngestOptions,
) -> Result<PathBuf, RenderError> {
    overlay_figure(csvins, x_scale, opts).write_html(fout)
}

/// Plot each file on its own, reporting and skipping the failures.
/// Return the written files.
pub fn plot_each(
    csvins: &[PathBuf],
    outdir: &Path,
    x_scale: AxisScale,
    opts: &IngestOptions,
) -> Vec<PathBuf> {
    let mut written = Vec::with_capacity(csvins.len());
    for csvin in csvins.iter() {
        match plot_bode_for_file(csvin, outdir, x_scale, opts) {
            Ok(p) => {
                info!("> {} -> {}", csvin.display(), p.display());
                written.push(p);
            }
            Err(e) => warn!("skipping {}", e),
        }
    }
    written
}
