//! Plot series for the three beamformer views
//!
//! The rendering layer is outside this crate; it receives plain `(x, y)`
//! series with a label and a color tag and draws them as lines:
//!
//! - **Angular sector** (polar): x = angle from broadside (rad), y = radius.
//! - **Visible region**: x = ψ (rad), y = normalized array factor in dB,
//!   `20·log10(|AF| / Σ|a_k|)`, floored at [`PlotSettings::db_floor`].
//! - **Generated signals**: x = time (s), y = normalized amplitude, one series
//!   per channel covering one period of the effective frequency.

use serde::{Deserialize, Serialize};

use crate::array_factor::{ArrayFactorEngine, ArrayGeometry};
use crate::error::Result;
use crate::sampling::SamplingContext;
use crate::synthesizer::{ChannelSignalSpec, WaveformSynthesizer};
use crate::units::{amplitude_to_db, linspace};

/// Line color tag understood by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesColor {
    Blue,
    Red,
    Green,
    Orange,
    /// Renderer picks from its own cycle
    Auto,
}

/// One labelled polyline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotSeries {
    pub label: String,
    pub color: SeriesColor,
    pub points: Vec<(f64, f64)>,
}

impl PlotSeries {
    pub fn new(label: impl Into<String>, color: SeriesColor, points: Vec<(f64, f64)>) -> Self {
        Self {
            label: label.into(),
            color,
            points,
        }
    }

    /// Two-point vertical line at `x` spanning `y0..y1`.
    fn vertical(label: &str, color: SeriesColor, x: f64, y0: f64, y1: f64) -> Self {
        Self::new(label, color, vec![(x, y0), (x, y1)])
    }

    pub fn xs(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.0)
    }

    pub fn ys(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.1)
    }
}

/// A named group of series drawn on the same axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotFigure {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<PlotSeries>,
}

impl PlotFigure {
    /// First series carrying `label`
    pub fn series(&self, label: &str) -> Option<&PlotSeries> {
        self.series.iter().find(|s| s.label == label)
    }
}

/// Sampling density and scale for the generated series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotSettings {
    /// Points along the sector arc
    pub sector_points: usize,
    /// Points along the θ sweep of the visible-region curve
    pub pattern_points: usize,
    /// Points per channel in the time-domain view
    pub signal_points: usize,
    /// Lowest dB value drawn; also the bottom of the marker lines
    pub db_floor: f64,
}

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            sector_points: 100,
            pattern_points: 500,
            signal_points: 200,
            db_floor: -40.0,
        }
    }
}

/// All three views for one configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizationData {
    pub angular_sector: PlotFigure,
    pub visible_region: PlotFigure,
    pub generated_signals: PlotFigure,
}

impl VisualizationData {
    /// Pretty-printed JSON for the rendering layer.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Angular sector: reachable arc, its limits and the steered direction.
pub fn angular_sector(geometry: &ArrayGeometry, phase_step: f64, settings: &PlotSettings) -> Result<PlotFigure> {
    let max_scan = ArrayFactorEngine::compute_max_scan_angle(geometry)?;
    let steering = ArrayFactorEngine::phase_step_to_beam_angle(phase_step, geometry)?;
    let radius = 1.0;

    let arc = linspace(-max_scan, max_scan, settings.sector_points)
        .into_iter()
        .map(|theta| (theta, radius))
        .collect();

    Ok(PlotFigure {
        title: "steering".to_string(),
        x_label: "angle from broadside (rad)".to_string(),
        y_label: "radius".to_string(),
        series: vec![
            PlotSeries::new("sector", SeriesColor::Blue, arc),
            PlotSeries::vertical("sector-limit", SeriesColor::Red, max_scan, 0.0, radius),
            PlotSeries::vertical("sector-limit", SeriesColor::Red, -max_scan, 0.0, radius),
            PlotSeries::vertical("steering", SeriesColor::Green, steering, 0.0, radius),
        ],
    })
}

/// Visible region: array factor against ψ with region bounds and markers.
///
/// `target_angle` is the direction the operator asked for; it is placed in
/// ψ-space with [`ArrayFactorEngine::psi_for_angle`].
pub fn visible_region(
    geometry: &ArrayGeometry,
    phase_step: f64,
    target_angle: f64,
    settings: &PlotSettings,
) -> PlotFigure {
    let floor = settings.db_floor;
    let region = ArrayFactorEngine::compute_visible_region(phase_step, geometry);
    let peak = ArrayFactorEngine::peak_array_factor(geometry);

    let psi: Vec<f64> = linspace(
        -std::f64::consts::FRAC_PI_2,
        std::f64::consts::FRAC_PI_2,
        settings.pattern_points,
    )
    .into_iter()
    .map(|theta| ArrayFactorEngine::psi_for_angle(theta, phase_step, geometry))
    .collect();
    let af = ArrayFactorEngine::compute_array_factor(&psi, geometry);

    let curve = psi
        .into_iter()
        .zip(af)
        .map(|(p, a)| (p, normalized_db(a, peak).max(floor)))
        .collect();

    let target_psi = ArrayFactorEngine::psi_for_angle(target_angle, phase_step, geometry);

    PlotFigure {
        title: "visible region".to_string(),
        x_label: "psi (rad)".to_string(),
        y_label: "AF (dB)".to_string(),
        series: vec![
            PlotSeries::vertical("visible-lower", SeriesColor::Red, region.lower, 0.0, floor),
            PlotSeries::vertical("visible-upper", SeriesColor::Red, region.upper, 0.0, floor),
            PlotSeries::new("array-factor", SeriesColor::Blue, curve),
            PlotSeries::vertical("phase-step", SeriesColor::Green, phase_step, 0.0, floor),
            PlotSeries::vertical("target", SeriesColor::Orange, target_psi, 0.0, floor),
        ],
    }
}

/// One period of each channel's tone on the synthesis grid.
pub fn generated_signals(specs: &[ChannelSignalSpec], ctx: &SamplingContext, settings: &PlotSettings) -> Result<PlotFigure> {
    let mut series = Vec::with_capacity(specs.len());
    for spec in specs {
        // The plotting grid is finer than the card's, so check on the real one
        WaveformSynthesizer::check_realizable(spec, ctx)?;
        let points = match one_period(spec, ctx, settings.signal_points) {
            Some((ctx, len)) => WaveformSynthesizer::synthesize_analog(spec, &ctx, len)?,
            None => WaveformSynthesizer::synthesize_analog(spec, ctx, settings.signal_points)?,
        };
        series.push(PlotSeries::new(
            format!("channel {}", spec.channel_index() + 1),
            SeriesColor::Auto,
            points,
        ));
    }

    Ok(PlotFigure {
        title: "generated signals".to_string(),
        x_label: "time (s)".to_string(),
        y_label: "normalized amplitude".to_string(),
        series,
    })
}

/// Context and length covering one period of the effective tone.
///
/// A period usually spans only a handful of grid samples (about 8 at 75 MHz), so
/// the plot is drawn on a finer grid of `points` samples per period. Returns
/// `None` for DC, which has no period, or when `points` is too small to
/// resolve one.
fn one_period(spec: &ChannelSignalSpec, ctx: &SamplingContext, points: usize) -> Option<(SamplingContext, usize)> {
    let effective = spec.effective_frequency(ctx);
    if effective <= 0.0 || points < 3 {
        return None;
    }
    let period = 1.0 / effective;
    let plot_rate = (points - 1) as f64 / period;
    let cf = ctx.correction_factor();
    // Keep the correction factor so the effective frequency stays the same
    let fine = SamplingContext::new(plot_rate / cf, plot_rate, points).ok()?;
    Some((fine, points))
}

/// `20·log10(|AF| / peak)`
fn normalized_db(af: f64, peak: f64) -> f64 {
    amplitude_to_db(af / peak)
}
