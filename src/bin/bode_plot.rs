use anyhow::Context;
use bode_lpp::bode_plot::{parse_cli, plot_each, plot_overlay, PlotMode};
use bode_lpp::utils::{discover_csv, init_logger};
use log::{error, info};

fn main() -> anyhow::Result<()> {
    let cfg = parse_cli();
    init_logger(cfg.verbose);

    if cfg.verbose {
        info!("dir {:?}", cfg.dir);
        info!("output {:?}", cfg.output);
        info!("outdir {:?}", cfg.outdir);
        info!("mode {:?}", cfg.mode);
        info!("x_scale {:?}", cfg.x_scale);
        info!("ingest {:?}", cfg.ingest);
    }

    let csvins = discover_csv(&cfg.dir)
        .with_context(|| format!("could not list the csv files in {}", cfg.dir.display()))?;
    if csvins.is_empty() {
        println!("No CSV files found in {}.", cfg.dir.display());
        return Ok(());
    }
    println!("Found {} CSV file(s).", csvins.len());

    if matches!(cfg.mode, PlotMode::PerFile | PlotMode::Both) {
        println!("> plot each file to {}", cfg.outdir.display());
        let written = plot_each(&csvins, &cfg.outdir, cfg.x_scale, &cfg.ingest);
        println!("> plotted {} of {} file(s)", written.len(), csvins.len());
    }

    if matches!(cfg.mode, PlotMode::Overlay | PlotMode::Both) {
        println!("> generating combined plot");
        match plot_overlay(&csvins, &cfg.output, cfg.x_scale, &cfg.ingest) {
            Ok(p) => println!("> combined -> {}", p.display()),
            Err(e) => {
                error!("failed to create combined plot: {}", e);
                return Err(e.into());
            }
        }
    }
    Ok(())
}
