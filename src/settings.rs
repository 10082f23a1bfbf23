use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::info;

/// How the view presents frames.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ViewSettings {
    pub paused: bool,
    pub redraw_on_demand: bool,
    pub preferred_fps: u32,
    pub clear_color: wgpu::Color,
    pub color_format: wgpu::TextureFormat,
    pub depth_format: wgpu::TextureFormat,
    pub framebuffer_only: bool,
}

impl ViewSettings {
    /// Draw every frame at the preferred rate.
    pub const CONTINUOUS: Self = Self {
        paused: false,
        redraw_on_demand: false,
        preferred_fps: 60,
        clear_color: wgpu::Color::BLACK,
        color_format: wgpu::TextureFormat::Bgra8Unorm,
        depth_format: wgpu::TextureFormat::Depth32Float,
        framebuffer_only: false,
    };

    /// Only draw when something asks for a redraw.
    pub const ON_DEMAND: Self = Self {
        paused: true,
        redraw_on_demand: true,
        ..Self::CONTINUOUS
    };
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ThermalState {
    Nominal,
    Fair,
    Serious,
    Critical,
}

impl ThermalState {
    /// Status colour for an on-screen thermal indicator.
    pub fn indicator_color(self) -> wgpu::Color {
        let rgb = |r, g, b| wgpu::Color { r, g, b, a: 1.0 };
        match self {
            Self::Nominal => rgb(0.0, 1.0, 0.0),
            Self::Fair => rgb(1.0, 1.0, 0.0),
            Self::Serious => rgb(1.0, 0.5, 0.0),
            Self::Critical => rgb(1.0, 0.0, 0.0),
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown thermal state `{0}` (expected nominal, fair, serious or critical)")]
pub struct ParseThermalStateError(String);

impl FromStr for ThermalState {
    type Err = ParseThermalStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nominal" => Ok(Self::Nominal),
            "fair" => Ok(Self::Fair),
            "serious" => Ok(Self::Serious),
            "critical" => Ok(Self::Critical),
            _ => Err(ParseThermalStateError(s.to_owned())),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RenderMode {
    Continuous,
    OnDemand,
}

impl RenderMode {
    /// Back off to on-demand drawing as soon as the device heats up.
    pub fn for_thermal(state: ThermalState) -> Self {
        match state {
            ThermalState::Nominal => Self::Continuous,
            ThermalState::Fair | ThermalState::Serious | ThermalState::Critical => Self::OnDemand,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Continuous => Self::OnDemand,
            Self::OnDemand => Self::Continuous,
        }
    }

    pub fn settings(self) -> ViewSettings {
        match self {
            Self::Continuous => ViewSettings::CONTINUOUS,
            Self::OnDemand => ViewSettings::ON_DEMAND,
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continuous => f.write_str("continuous"),
            Self::OnDemand => f.write_str("on-demand"),
        }
    }
}

/// Tracks the active render mode across thermal changes and user toggles.
#[derive(Clone, Debug)]
pub struct RenderModeController {
    mode: RenderMode,
}

impl RenderModeController {
    pub fn new() -> Self {
        Self {
            mode: RenderMode::Continuous,
        }
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn on_thermal_change(&mut self, state: ThermalState) -> ViewSettings {
        let mode = RenderMode::for_thermal(state);
        if mode != self.mode {
            info!(?state, from = %self.mode, to = %mode, "thermal state changed render mode");
        }
        self.mode = mode;
        mode.settings()
    }

    /// Pause/resume, as a tap on the view does.
    pub fn toggle(&mut self) -> ViewSettings {
        let mode = self.mode.toggled();
        info!(from = %self.mode, to = %mode, "render mode toggled");
        self.mode = mode;
        mode.settings()
    }
}

impl Default for RenderModeController {
    fn default() -> Self {
        Self::new()
    }
}
