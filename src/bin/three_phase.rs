use anyhow::{ensure, Context};
use bode_lpp::three_phase::parse_cli;
use bode_lpp::utils::init_logger;
use log::info;

fn main() -> anyhow::Result<()> {
    let cfg = parse_cli();
    init_logger(cfg.verbose);
    let p = &cfg.params;
    ensure!(
        p.freq_hz > 0. && p.freq_hz.is_finite(),
        "frequency must be positive, got {}",
        p.freq_hz
    );

    if cfg.verbose {
        info!("params {:?}", p);
    }
    println!(
        "> synthesize {} samples of three phases at {} Hz",
        p.n_samples(),
        p.freq_hz
    );
    let fig = p.figure();
    let out = fig
        .write_html(&cfg.output)
        .context("could not write the three-phase plot")?;
    println!("> saved to {}", out.display());
    Ok(())
}
