use super::VERSION;
use crate::waveform::ThreePhase;
use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct ThreePhaseConfig {
    pub params: ThreePhase,
    pub output: PathBuf,
    pub verbose: bool,
}

/// Takes the CLI arguments of the three-phase example.
/// It is safe to unwrap get_one when a default is given,
/// clap always returns Some(T) in that case.
pub fn parse_cli() -> ThreePhaseConfig {
    let arg_freq = Arg::new("freq")
        .help("fundamental frequency, in Hz")
        .short('f')
        .long("freq")
        .num_args(1)
        .value_parser(value_parser!(f64))
        .default_value("50");
    let arg_amplitude = Arg::new("amplitude")
        .help("peak amplitude of each phase")
        .short('a')
        .long("amplitude")
        .num_args(1)
        .value_parser(value_parser!(f64))
        .default_value("1");
    let arg_cycles = Arg::new("cycles")
        .help("number of cycles to show")
        .short('c')
        .long("cycles")
        .num_args(1)
        .value_parser(value_parser!(u32).range(1..))
        .default_value("2");
    let arg_samples = Arg::new("samples_per_cycle")
        .help("time resolution, samples per cycle")
        .long("samples-per-cycle")
        .num_args(1)
        .value_parser(value_parser!(u32).range(1..))
        .default_value("400");
    let arg_third_harmonic = Arg::new("third_harmonic")
        .help("inject a third harmonic with this ratio to the fundamental")
        .long("third-harmonic")
        .num_args(0..=1)
        .value_parser(value_parser!(f64))
        // 1/6, the ratio that maximizes the modulation depth
        .default_missing_value("0.16666666666666666");
    let arg_line_to_line = Arg::new("line_to_line")
        .help("add the line-to-line voltages as dashed traces")
        .long("line-to-line")
        .action(ArgAction::SetTrue);
    let arg_output = Arg::new("output")
        .help("name of the output html file")
        .short('o')
        .long("output")
        .num_args(1)
        .value_parser(value_parser!(PathBuf))
        .default_value("three_phase_sine.html");
    let arg_verbose = Arg::new("verbose")
        .help("print verbose information")
        .short('v')
        .long("verbose")
        .action(ArgAction::SetTrue);
    let cli_args = Command::new("Three_phase")
        .version(VERSION.unwrap_or("unknown"))
        .author("Luca Peruzzo")
        .about("cli app to plot three-phase sine waves to html")
        .arg(arg_freq)
        .arg(arg_amplitude)
        .arg(arg_cycles)
        .arg(arg_samples)
        .arg(arg_third_harmonic)
        .arg(arg_line_to_line)
        .arg(arg_output)
        .arg(arg_verbose)
        .get_matches();

    let params = ThreePhase {
        freq_hz: *cli_args.get_one::<f64>("freq").unwrap(),
        amplitude: *cli_args.get_one::<f64>("amplitude").unwrap(),
        cycles: *cli_args.get_one::<u32>("cycles").unwrap(),
        samples_per_cycle: *cli_args.get_one::<u32>("samples_per_cycle").unwrap() as usize,
        third_harmonic: cli_args.get_one::<f64>("third_harmonic").copied(),
        line_to_line: cli_args.get_flag("line_to_line"),
    };
    ThreePhaseConfig {
        params,
        output: cli_args.get_one::<PathBuf>("output").unwrap().to_owned(),
        verbose: cli_args.get_flag("verbose"),
    }
}
