use crate::figure::{AxisScale, Figure, Trace};
use std::f64::consts::PI;

/// Phase names and offsets in degrees.
pub const PHASES: [(&str, f64); 3] = [("Phase A", 0.), ("Phase B", -120.), ("Phase C", 120.)];

/// Line-to-line voltages as (positive phase, negative phase, name).
pub const LINE_TO_LINE: [(usize, usize, &str); 3] = [(0, 1, "Vab"), (1, 2, "Vbc"), (2, 0, "Vca")];

/// Zero-sequence ratio that maximizes the modulation depth.
pub const OPTIMAL_THIRD_HARMONIC: f64 = 1. / 6.;

const PHASE_GROUP: &str = "Phase Voltages";
const LINE_GROUP: &str = "Line-to-Line Voltages";

/// Parameters of the three-phase example.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreePhase {
    pub freq_hz: f64,
    pub amplitude: f64,
    pub cycles: u32,
    pub samples_per_cycle: usize,
    pub third_harmonic: Option<f64>,
    pub line_to_line: bool,
}

impl Default for ThreePhase {
    fn default() -> Self {
        ThreePhase {
            freq_hz: 50.,
            amplitude: 1.,
            cycles: 2,
            samples_per_cycle: 400,
            third_harmonic: None,
            line_to_line: false,
        }
    }
}

/// The synthesized samples.
/// `scale` is the peak of the fundamental of each phase.
#[derive(Debug, Clone, PartialEq)]
pub struct Waves {
    pub t: Vec<f64>,
    pub phases: Vec<(String, Vec<f64>)>,
    pub line_to_line: Vec<(String, Vec<f64>)>,
    pub scale: f64,
}

impl ThreePhase {
    pub fn n_samples(&self) -> usize {
        self.cycles as usize * self.samples_per_cycle
    }

    /// Evenly spaced times over the cycles, end point excluded.
    pub fn time_base(&self) -> Vec<f64> {
        let n = self.n_samples();
        let span = self.cycles as f64 / self.freq_hz;
        (0..n).map(|i| span * i as f64 / n as f64).collect()
    }

    pub fn synthesize(&self) -> Waves {
        let t = self.time_base();
        let omega = 2. * PI * self.freq_hz;
        let fundamentals: Vec<Vec<f64>> = PHASES
            .iter()
            .map(|(_, deg)| {
                let phi = deg.to_radians();
                t.iter().map(|ti| (omega * ti + phi).sin()).collect()
            })
            .collect();

        let (combined, scale) = match self.third_harmonic {
            None => (fundamentals, self.amplitude),
            Some(ratio) => {
                let harmonic: Vec<f64> = t.iter().map(|ti| ratio * (3. * omega * ti).sin()).collect();
                let combined: Vec<Vec<f64>> = fundamentals
                    .iter()
                    .map(|f| f.iter().zip(harmonic.iter()).map(|(a, h)| a + h).collect())
                    .collect();
                // scale so the injected waveform still peaks at the amplitude
                let max_modulation = combined
                    .iter()
                    .flat_map(|w| w.iter())
                    .fold(0f64, |m, v| m.max(v.abs()));
                let scale = if max_modulation > 0. {
                    self.amplitude / max_modulation
                } else {
                    1.
                };
                (combined, scale)
            }
        };

        let phases: Vec<(String, Vec<f64>)> = PHASES
            .iter()
            .zip(combined)
            .map(|((name, _), w)| (name.to_string(), w.iter().map(|v| scale * v).collect()))
            .collect();

        let line_to_line: Vec<(String, Vec<f64>)> = if self.line_to_line {
            LINE_TO_LINE
                .iter()
                .map(|&(pos, neg, name)| {
                    let v: Vec<f64> = phases[pos]
                        .1
                        .iter()
                        .zip(phases[neg].1.iter())
                        .map(|(p, n)| p - n)
                        .collect();
                    (name.to_string(), v)
                })
                .collect()
        } else {
            Vec::new()
        };

        Waves {
            t,
            phases,
            line_to_line,
            scale,
        }
    }

    fn title(&self) -> String {
        match self.third_harmonic {
            None => format!(
                "Three-Phase Sine Waves | f={} Hz, A={}",
                self.freq_hz, self.amplitude
            ),
            Some(_) => format!(
                "Three-Phase Sine Waves with 3rd Harmonic Injection | f={} Hz, A={}",
                self.freq_hz, self.amplitude
            ),
        }
    }

    /// Fundamental metrics of the injected waveforms, one per line.
    pub fn metrics(&self, scale: f64) -> String {
        let line_to_line_peak = 3f64.sqrt() * scale;
        let line_to_line_rms = line_to_line_peak / 2f64.sqrt();
        let baseline_peak = 3f64.sqrt() * self.amplitude;
        let boost_percent = if baseline_peak != 0. {
            (line_to_line_peak / baseline_peak - 1.) * 100.
        } else {
            f64::NAN
        };
        format!(
            "Phase fundamental peak: {:.1} V<br>Line-line fundamental RMS: {:.1} V<br>Boost vs pure sinusoid: {:+.1}%",
            scale, line_to_line_rms, boost_percent
        )
    }

    /// Figure with the three phases and, if requested, the dashed line-to-line voltages.
    /// Each legend group is titled on its first trace and toggles as a whole.
    pub fn figure(&self) -> Figure {
        let waves = self.synthesize();
        let mut fig = Figure::new(&self.title());
        fig.x_scale = AxisScale::Linear;
        let (y_title, legend_title, phase_group_title) = match self.third_harmonic {
            None => ("Amplitude", "Phases", "Phases"),
            Some(_) => ("Voltage (V)", "Traces", "Phases w/ THI"),
        };
        fig.set_axis_titles("Time (s)", y_title);
        fig.legend_title = Some(legend_title.to_owned());
        fig.unified_hover = true;
        for (i, (name, y)) in waves.phases.iter().enumerate() {
            let mut trace = Trace::new(name, waves.t.clone(), y.clone()).in_group(PHASE_GROUP);
            if i == 0 {
                trace = trace.with_group_title(phase_group_title);
            }
            fig.add_trace(trace);
        }
        for (i, (name, y)) in waves.line_to_line.iter().enumerate() {
            let mut trace = Trace::new(name, waves.t.clone(), y.clone())
                .dashed()
                .in_group(LINE_GROUP);
            if i == 0 {
                trace = trace.with_group_title("Line-to-Line");
            }
            fig.add_trace(trace);
        }
        if self.third_harmonic.is_some() {
            fig.annotation = Some(self.metrics(waves.scale));
        }
        fig
    }
}
