//! Phased-Array DAC Buffer Generator Command-Line Interface
//!
//! This CLI provides tools for:
//! - Filling multi-channel DAC buffers for a steering setting
//! - Exporting the sector, visible-region and signal plot series as JSON
//! - Converting between beam angles and inter-element phase steps
//! - Inspecting derived sampling and array values
//!
//! Settings come from the YAML configuration (see `beamdac config`); command
//! flags override individual values.

use anyhow::{Context, Result};
use beamdac_core::array_factor::ArrayFactorEngine;
use beamdac_core::beamformer::{channel_phases, Beamformer};
use beamdac_core::config::BeamdacConfig;
use beamdac_core::packer::PackingStrategy;
use beamdac_core::types::Sample;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "beamdac")]
#[command(author, version, about = "Phased-array DAC buffer generator", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file (defaults to the standard search path)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize and pack a buffer, written as little-endian i16
    Synth {
        /// Output file for the interleaved buffer
        #[arg(short, long, default_value = "beamdac_buffer.bin")]
        output: PathBuf,

        #[command(flatten)]
        steering: SteeringArgs,

        /// RF frequency in MHz
        #[arg(short, long)]
        frequency: Option<f64>,

        /// Samples per channel
        #[arg(short = 'n', long)]
        samples: Option<usize>,

        /// Packing strategy (round-robin, replicated)
        #[arg(long)]
        strategy: Option<String>,

        /// Replication factor for the replicated strategy
        #[arg(long, default_value = "4")]
        factor: usize,
    },

    /// Emit the three plot views as JSON
    Pattern {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        steering: SteeringArgs,

        /// Target direction marker in degrees
        #[arg(long, allow_negative_numbers = true)]
        target: Option<f64>,
    },

    /// Convert between beam angle and phase step
    Steer {
        #[command(flatten)]
        steering: SteeringArgs,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show derived sampling and array values
    Info,

    /// Print an example configuration file
    Config {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct SteeringArgs {
    /// Beam angle from broadside in degrees
    #[arg(short, long, allow_negative_numbers = true, conflicts_with = "phase_step")]
    angle: Option<f64>,

    /// Inter-element phase step in degrees
    #[arg(short, long, allow_negative_numbers = true)]
    phase_step: Option<f64>,
}

impl SteeringArgs {
    fn apply(&self, config: &mut BeamdacConfig) {
        if let Some(angle) = self.angle {
            config.steering.beam_angle_deg = Some(angle);
        }
        if let Some(step) = self.phase_step {
            config.steering.phase_step_deg = step;
            config.steering.beam_angle_deg = None;
        }
    }
}

#[derive(Serialize)]
struct SteerReport {
    phase_step_deg: f64,
    beam_angle_deg: Option<f64>,
    max_scan_angle_deg: Option<f64>,
    channel_phases_deg: Vec<f64>,
}

fn load_config(path: Option<&Path>) -> Result<BeamdacConfig> {
    let config = match path {
        Some(path) => BeamdacConfig::load_from(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => BeamdacConfig::load().context("Failed to load config")?,
    };
    Ok(config)
}

fn validate_config(config: &BeamdacConfig) -> Result<()> {
    config.validate().context("Invalid configuration")
}

fn parse_strategy(name: &str, factor: usize) -> Result<PackingStrategy> {
    match name {
        "round-robin" | "round_robin" => Ok(PackingStrategy::RoundRobin),
        "replicated" => Ok(PackingStrategy::Replicated { factor }),
        _ => anyhow::bail!("Unknown packing strategy: {}. Use round-robin or replicated", name),
    }
}

fn write_samples_i16(samples: &[Sample], path: &Path) -> Result<()> {
    use byteorder::{LittleEndian, WriteBytesExt};

    let file = File::create(path).context("Failed to create output file")?;
    let mut writer = BufWriter::new(file);

    for &sample in samples {
        writer.write_i16::<LittleEndian>(sample)?;
    }

    writer.flush()?;
    Ok(())
}

/// Apply the `synth` tone, length and packing flags to `config`.
fn apply_synth_overrides(
    config: &mut BeamdacConfig,
    frequency: Option<f64>,
    samples: Option<usize>,
    strategy: Option<&str>,
    factor: usize,
) -> Result<()> {
    if let Some(mhz) = frequency {
        config.signal.rf_frequency_hz = mhz * 1e6;
    }
    if let Some(n) = samples {
        config.device.sample_count = n;
    }
    if let Some(name) = strategy {
        config.signal.packing = parse_strategy(name, factor)?;
    }
    if let PackingStrategy::Replicated { .. } = config.signal.packing {
        // Single-tone mode drives the first channel only
        config.device.channel_count = 1;
        config.device.levels_mv.truncate(1);
        config.array.element_amplitudes.truncate(1);
    }
    Ok(())
}

fn cmd_synth(
    mut config: BeamdacConfig,
    output: PathBuf,
    steering: SteeringArgs,
    frequency: Option<f64>,
    samples: Option<usize>,
    strategy: Option<String>,
    factor: usize,
) -> Result<()> {
    steering.apply(&mut config);
    apply_synth_overrides(&mut config, frequency, samples, strategy.as_deref(), factor)?;
    validate_config(&config)?;

    let beamformer = Beamformer::from_config(&config)?;
    let buffer = beamformer.fill()?;

    info!(
        "Output levels {:?} mV, filter {}",
        config.device.levels_mv, config.device.output_filter
    );
    write_samples_i16(buffer.samples(), &output)?;
    info!("Wrote buffer to {:?}", output);

    println!(
        "Wrote {} samples ({} bytes, {} channel(s), {:?}) to {}",
        buffer.len(),
        buffer.byte_len(),
        buffer.channel_count(),
        buffer.strategy(),
        output.display()
    );
    Ok(())
}

fn cmd_pattern(
    mut config: BeamdacConfig,
    output: Option<PathBuf>,
    steering: SteeringArgs,
    target: Option<f64>,
) -> Result<()> {
    steering.apply(&mut config);
    validate_config(&config)?;

    let mut beamformer = Beamformer::from_config(&config)?;
    if let Some(deg) = target {
        beamformer = beamformer.with_target_angle(deg.to_radians());
    }

    let data = beamformer.visualization()?;
    let json = data.to_json().context("Failed to serialize plot series")?;

    match output {
        Some(path) => {
            std::fs::write(&path, json).context("Failed to write output file")?;
            info!("Wrote plot series to {:?}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn cmd_steer(mut config: BeamdacConfig, steering: SteeringArgs, json: bool) -> Result<()> {
    steering.apply(&mut config);
    validate_config(&config)?;

    let beamformer = Beamformer::from_config(&config)?;
    let geometry = beamformer.geometry();
    let phase_step = beamformer.phase_step();

    let report = SteerReport {
        phase_step_deg: phase_step.to_degrees(),
        beam_angle_deg: beamformer.beam_angle().ok().map(f64::to_degrees),
        max_scan_angle_deg: ArrayFactorEngine::compute_max_scan_angle(geometry)
            .ok()
            .map(f64::to_degrees),
        channel_phases_deg: channel_phases(phase_step, geometry.element_count())
            .into_iter()
            .map(f64::to_degrees)
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("=== Beam Steering ===");
    println!();
    println!("  Phase step:        {:.3} deg", report.phase_step_deg);
    match report.beam_angle_deg {
        Some(angle) => println!("  Beam angle:        {:.3} deg", angle),
        None => println!("  Beam angle:        unrealizable (main lobe outside visible region)"),
    }
    match report.max_scan_angle_deg {
        Some(angle) => println!("  Max scan angle:    ±{:.3} deg", angle),
        None => println!("  Max scan angle:    none (spacing at or above one wavelength)"),
    }
    println!();
    println!("Channel phases:");
    for (k, phase) in report.channel_phases_deg.iter().enumerate() {
        println!("  Channel {}:         {:.3} deg", k + 1, phase);
    }
    Ok(())
}

fn cmd_info(config: BeamdacConfig) -> Result<()> {
    validate_config(&config)?;

    let beamformer = Beamformer::from_config(&config)?;
    let ctx = beamformer.context();
    let geometry = beamformer.geometry();
    let region = ArrayFactorEngine::compute_visible_region(beamformer.phase_step(), geometry);

    println!("=== Beamformer Configuration ===");
    println!();
    println!("Sampling:");
    println!("  Native rate:       {:.3} MS/s", ctx.native_sample_rate() / 1e6);
    println!("  Output rate:       {:.3} MS/s", ctx.output_sample_rate() / 1e6);
    println!("  Correction factor: {:.4}", ctx.correction_factor());
    println!("  Nyquist limit:     {:.3} MHz", ctx.nyquist_hz() / 1e6);
    match ctx.integral_replication() {
        Some(factor) => println!("  Rate ratio:        integral (replicate x{})", factor),
        None => println!("  Rate ratio:        fractional"),
    }
    println!("  Samples/channel:   {}", ctx.sample_count());
    if let Some(spec) = beamformer.specs().first() {
        println!("  RF frequency:      {:.3} MHz", spec.frequency_hz() / 1e6);
        println!("  Effective freq:    {:.3} MHz", spec.effective_frequency(ctx) / 1e6);
    }
    println!();
    println!("Buffer:");
    println!("  Strategy:          {:?}", beamformer.strategy());
    let len = beamformer.required_len()?;
    println!("  Length:            {} samples ({} bytes)", len, len * std::mem::size_of::<Sample>());
    println!("  Levels:            {:?} mV", config.device.levels_mv);
    println!("  Output filter:     {}", config.device.output_filter);
    println!();
    println!("Array:");
    println!("  Elements:          {}", geometry.element_count());
    println!("  Spacing:           {:.4} m", geometry.element_spacing());
    println!("  Wavelength:        {:.4} m", geometry.wavelength());
    println!("  d/λ:               {:.4}", geometry.spacing_ratio());
    match ArrayFactorEngine::compute_max_scan_angle(geometry) {
        Ok(angle) => println!("  Max scan angle:    ±{:.3} deg", angle.to_degrees()),
        Err(e) => println!("  Max scan angle:    {}", e),
    }
    println!(
        "  Visible region:    [{:.4}, {:.4}] rad",
        region.lower, region.upper
    );

    Ok(())
}

fn cmd_config(output: Option<PathBuf>) -> Result<()> {
    let yaml = BeamdacConfig::example_yaml();
    match output {
        Some(path) => {
            std::fs::write(&path, yaml).context("Failed to write config file")?;
            println!("Wrote example config to {}", path.display());
        }
        None => print!("{}", yaml),
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Synth {
            output,
            steering,
            frequency,
            samples,
            strategy,
            factor,
        } => cmd_synth(load_config(config_path)?, output, steering, frequency, samples, strategy, factor),

        Commands::Pattern {
            output,
            steering,
            target,
        } => cmd_pattern(load_config(config_path)?, output, steering, target),

        Commands::Steer { steering, json } => cmd_steer(load_config(config_path)?, steering, json),

        Commands::Info => cmd_info(load_config(config_path)?),

        Commands::Config { output } => cmd_config(output),
    }
}
