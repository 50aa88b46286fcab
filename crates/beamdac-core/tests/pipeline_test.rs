//! Integration tests for the config → buffer → plot series pipeline.

use std::f64::consts::PI;

use beamdac_core::analysis::dominant_frequency_codes;
use beamdac_core::prelude::*;
use beamdac_core::{BeamdacConfig, VisualizationData};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn bench_config(sample_count: usize) -> BeamdacConfig {
    let mut config = BeamdacConfig::default();
    config.device.sample_count = sample_count;
    config
}

#[test]
fn test_default_bench_buffer() {
    let config = bench_config(4096);
    config.validate().expect("default config should validate");

    let beamformer = Beamformer::from_config(&config).expect("failed to build beamformer");
    let buffer = beamformer.fill().expect("fill failed");

    assert_eq!(buffer.len(), 4 * 4096);
    assert_eq!(buffer.byte_len(), 2 * 4 * 4096);

    // De-interleave channel 0 and check its spectrum: 75 MHz × 1.6 = 120 MHz
    let channel0: Vec<i16> = buffer.samples().iter().step_by(4).copied().collect();
    let peak = dominant_frequency_codes(&channel0, 1e9).expect("spectrum");
    let resolution = 1e9 / 4096.0;
    assert!(
        (peak.frequency_hz - 120e6).abs() <= resolution,
        "peak at {} Hz",
        peak.frequency_hz
    );
}

#[test]
fn test_steered_channels_carry_progressive_phase() {
    let mut config = bench_config(64);
    config.steering.beam_angle_deg = Some(25.0);
    let beamformer = Beamformer::from_config(&config).expect("failed to build beamformer");

    let beta = beamformer.phase_step();
    let waveforms = beamformer.synthesize().expect("synthesis failed");
    for (k, waveform) in waveforms.iter().enumerate() {
        // First sample is 32768·sin(k·β) before rounding
        let phase = (k as f64 * beta).rem_euclid(2.0 * PI);
        let expected = (32768.0 * phase.sin()).round().clamp(-32768.0, 32767.0) as i16;
        assert_eq!(waveform.samples()[0], expected, "channel {}", k);
    }
}

#[test]
fn test_replicated_single_tone() {
    let yaml = r#"
device:
  channel_count: 1
  levels_mv: [2000]
  sample_count: 512
signal:
  rf_frequency_hz: 75e6
  packing:
    mode: replicated
    factor: 4
"#;
    let config = BeamdacConfig::parse(yaml).expect("parse failed");
    config.validate().expect("replicated config should validate");

    let beamformer = Beamformer::from_config(&config).expect("failed to build beamformer");
    let buffer = beamformer.fill().expect("fill failed");

    assert_eq!(buffer.len(), 2048);
    for chunk in buffer.samples().chunks_exact(4) {
        assert!(chunk.iter().all(|&s| s == chunk[0]));
    }
}

#[test]
fn test_random_weights_stay_in_range() {
    let mut rng = StdRng::seed_from_u64(0xbeef);
    let ctx = SamplingContext::new(625e6, 1e9, 512).expect("context");

    for _ in 0..20 {
        let weight: f64 = rng.gen_range(-1.0..=1.0);
        let phase: f64 = rng.gen_range(0.0..2.0 * PI);
        let frequency: f64 = rng.gen_range(0.0..300e6);

        let spec = ChannelSignalSpec::new(0, frequency, weight, phase).expect("spec");
        let waveform = WaveformSynthesizer::synthesize(&spec, &ctx).expect("synthesis failed");
        let bound = (32768.0 * weight.abs()).ceil() as u32;
        assert!(waveform.samples().iter().all(|&s| (s as i32).unsigned_abs() <= bound));
    }
}

#[test]
fn test_random_angles_round_trip() {
    let mut rng = StdRng::seed_from_u64(7);
    let geometry = ArrayGeometry::from_carrier(0.04, 3.5e9, vec![1.0; 4]).expect("geometry");
    let max_scan = ArrayFactorEngine::compute_max_scan_angle(&geometry).expect("max scan");
    assert_eq!(max_scan, PI / 2.0);

    for _ in 0..50 {
        let angle: f64 = rng.gen_range(-1.5..1.5);
        let beta = ArrayFactorEngine::map_beam_angle_to_phase_step(angle, &geometry);
        let back = ArrayFactorEngine::phase_step_to_beam_angle(beta, &geometry).expect("inverse");
        assert!((back - angle).abs() < 1e-9);
    }
}

#[test]
fn test_visualization_json() {
    let mut config = bench_config(256);
    config.steering.beam_angle_deg = Some(10.0);
    let beamformer = Beamformer::from_config(&config).expect("failed to build beamformer");

    let data = beamformer.visualization().expect("visualization failed");
    let json = data.to_json().expect("serialize");
    let parsed: VisualizationData = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(parsed.visible_region.series.len(), data.visible_region.series.len());
    assert_eq!(parsed.generated_signals.series[0].label, "channel 1");

    // Main lobe visible: the pattern reaches 0 dB at the target marker
    let af = data.visible_region.series("array-factor").expect("array-factor series");
    let peak = af.ys().fold(f64::MIN, f64::max);
    assert!(peak > -0.5, "peak {} dB", peak);

    let target = data.visible_region.series("target").expect("target series");
    assert!(target.points[0].0.abs() < 1e-9);
}

#[test]
fn test_invalid_config_rejected_before_build() {
    let mut config = bench_config(256);
    config.device.levels_mv = vec![2000, 2000, 2500, 2000];
    assert!(config.validate().is_err());

    let mut config = bench_config(256);
    config.array.element_spacing = 0.11;
    // d > λ at 3.5 GHz: no grating-lobe free scan range
    let beamformer = Beamformer::from_config(&config).expect("failed to build beamformer");
    assert!(matches!(
        beamformer.visualization(),
        Err(BeamError::UnrealizableScanAngle(_))
    ));
}

#[test]
fn test_aliasing_config_fails_every_output() {
    let mut config = bench_config(256);
    config.signal.rf_frequency_hz = 400e6;
    config.validate().expect("config validation is static");

    let beamformer = Beamformer::from_config(&config).expect("failed to build beamformer");
    let fill_err = beamformer.fill().expect_err("fill should alias");
    match &fill_err {
        BeamError::AliasingDetected { effective_hz, nyquist_hz } => {
            assert!((effective_hz - 640e6).abs() < 1.0);
            assert_eq!(*nyquist_hz, 500e6);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(beamformer.visualization().err(), Some(fill_err));
}
