//! Triaxial Vibration Simulation
//!
//! Generates synthetic accelerometer data for exercising the Vibrascope
//! collector. Each axis is a sum of sinusoids (shaft rotation and its
//! harmonics) plus Gaussian noise; `--fault` adds periodic impacts that ring
//! down at a structural resonance, the signature of a defective bearing.
//!
//! # Usage
//! ```bash
//! # Stream 30 s of 1600 Hz data into a running collector
//! ./simulation --addr 127.0.0.1:9090 --duration 30 --fault
//!
//! # Write 2048 samples to stdout as fast as possible
//! ./simulation --stdout --count 2048 --speed 0
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use rand::prelude::*;
use rand_distr::{Distribution, Normal};
use std::f64::consts::PI;
use std::io::{self, BufWriter, Write};
use std::net::TcpStream;
use std::time::{Duration, Instant};
use tracing::info;

use vibrascope::acquisition::encode;
use vibrascope::config::defaults;
use vibrascope::types::{SampleTimestamp, VibrationSample};

// ============================================================================
// Machine Constants
// ============================================================================

/// Shaft rotation frequency (Hz)
const SHAFT_HZ: f64 = 50.0;
/// Gravity seen by the vertical axis (g)
const GRAVITY: f64 = 1.0;
/// Structural resonance excited by bearing impacts (Hz)
const RESONANCE_HZ: f64 = 400.0;
/// Ring-down time constant of an impact (s)
const IMPACT_DECAY_SECS: f64 = 0.004;
/// Peak amplitude of an impact (g)
const IMPACT_AMPLITUDE: f64 = 2.5;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "simulation")]
#[command(about = "Triaxial vibration data generator for Vibrascope testing")]
#[command(version)]
struct Args {
    /// Collector ingestion address
    #[arg(long, default_value = "127.0.0.1:9090")]
    addr: String,

    /// Write samples to stdout instead of connecting to the collector
    #[arg(long)]
    stdout: bool,

    /// Sampling rate in Hz
    #[arg(long, default_value_t = defaults::SAMPLING_RATE_HZ)]
    rate: f64,

    /// Simulated duration in seconds
    #[arg(long, default_value_t = 10.0)]
    duration: f64,

    /// Number of samples to emit (overrides --duration)
    #[arg(long)]
    count: Option<u64>,

    /// Time compression factor (1 = real-time, 0 = no delay)
    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// Standard deviation of the additive noise (g)
    #[arg(long, default_value_t = 0.02)]
    noise: f64,

    /// Inject bearing-fault impacts
    #[arg(long)]
    fault: bool,

    /// Impact repetition rate when --fault is set (Hz)
    #[arg(long, default_value_t = 7.5)]
    fault_rate: f64,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,
}

// ============================================================================
// Signal Model
// ============================================================================

/// One sinusoidal component of an axis.
#[derive(Debug, Clone, Copy)]
struct Tone {
    freq: f64,
    amplitude: f64,
    phase: f64,
}

impl Tone {
    fn at(&self, t: f64) -> f64 {
        self.amplitude * (2.0 * PI * self.freq * t + self.phase).sin()
    }
}

struct SignalModel {
    rng: StdRng,
    noise: Normal<f64>,
    x: Vec<Tone>,
    y: Vec<Tone>,
    z: Vec<Tone>,
    /// Seconds between bearing impacts, if a fault is injected
    impact_period: Option<f64>,
}

impl SignalModel {
    fn new(seed: Option<u64>, noise_std: f64, fault_rate: Option<f64>) -> Result<Self> {
        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let noise = Normal::new(0.0, noise_std).context("Invalid noise level")?;

        let mut tone = |freq: f64, amplitude: f64| Tone {
            freq,
            amplitude,
            phase: rng.gen_range(0.0..2.0 * PI),
        };
        let x = vec![tone(SHAFT_HZ, 0.50), tone(2.0 * SHAFT_HZ, 0.15), tone(3.0 * SHAFT_HZ, 0.05)];
        let y = vec![tone(SHAFT_HZ, 0.40), tone(2.0 * SHAFT_HZ, 0.20)];
        let z = vec![tone(SHAFT_HZ / 2.0, 0.05), tone(SHAFT_HZ, 0.10)];

        Ok(Self {
            rng,
            noise,
            x,
            y,
            z,
            impact_period: fault_rate.filter(|r| *r > 0.0).map(|r| 1.0 / r),
        })
    }

    /// Ring-down of the most recent impact at time `t`.
    fn impact(&self, t: f64) -> f64 {
        let Some(period) = self.impact_period else {
            return 0.0;
        };
        let since = t % period;
        IMPACT_AMPLITUDE * (-since / IMPACT_DECAY_SECS).exp() * (2.0 * PI * RESONANCE_HZ * since).sin()
    }

    fn sample(&mut self, t: f64) -> VibrationSample {
        let impact = self.impact(t);
        let x = self.x.iter().map(|c| c.at(t)).sum::<f64>() + impact + self.noise.sample(&mut self.rng);
        let y = self.y.iter().map(|c| c.at(t)).sum::<f64>() + 0.5 * impact + self.noise.sample(&mut self.rng);
        let z = GRAVITY + self.z.iter().map(|c| c.at(t)).sum::<f64>() + self.noise.sample(&mut self.rng);
        VibrationSample::new(x, y, z)
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    if !(args.rate.is_finite() && args.rate > 0.0) {
        anyhow::bail!("--rate must be positive, got {}", args.rate);
    }

    let total_samples = args
        .count
        .unwrap_or_else(|| (args.duration.max(0.0) * args.rate).round() as u64);
    let mut model = SignalModel::new(args.seed, args.noise, args.fault.then_some(args.fault_rate))?;

    let mut out: Box<dyn Write> = if args.stdout {
        Box::new(BufWriter::new(io::stdout().lock()))
    } else {
        let stream = TcpStream::connect(&args.addr)
            .with_context(|| format!("Failed to connect to collector at {}", args.addr))?;
        stream.set_nodelay(true).ok();
        Box::new(BufWriter::new(stream))
    };

    info!(
        sink = if args.stdout { "stdout" } else { args.addr.as_str() },
        rate = args.rate,
        samples = total_samples,
        speed = args.speed,
        fault = args.fault,
        seed = ?args.seed,
        "Simulation starting"
    );

    let start_wall = Instant::now();
    let start_unix = chrono::Utc::now().timestamp_micros() as f64 / 1e6;

    for i in 0..total_samples {
        let t = i as f64 / args.rate;
        let sample = model
            .sample(t)
            .with_timestamp(SampleTimestamp::Unix(start_unix + t));
        writeln!(out, "{}", encode(&sample)).context("Failed to write sample")?;

        // Pace output against the compressed clock
        if args.speed > 0.0 {
            let due = Duration::from_secs_f64(t / args.speed);
            let elapsed = start_wall.elapsed();
            if due > elapsed + Duration::from_millis(2) {
                out.flush().context("Failed to flush samples")?;
                std::thread::sleep(due - elapsed);
            }
        }

        if i > 0 && i % (args.rate.max(1.0) as u64 * 10) == 0 {
            info!(sent = i, sim_secs = t, "Progress");
        }
    }

    out.flush().context("Failed to flush samples")?;

    info!(
        samples = total_samples,
        real_secs = start_wall.elapsed().as_secs_f64(),
        "Simulation complete"
    );
    Ok(())
}
