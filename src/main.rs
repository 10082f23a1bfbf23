use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{ensure, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use frameparams::clock::FrameClock;
use frameparams::frame::FrameParams;
use frameparams::gpu::{self, ParamsBuffer, ParamsUpdater};
use frameparams::layout::{self, PARAMS_WGSL};
use frameparams::noise::{NoiseTexture, NOISE_SIZE};
use frameparams::settings::{RenderMode, RenderModeController, ThermalState, ViewSettings};

#[derive(Parser)]
#[clap(version, about = "Produce, upload and check per-frame shader params")]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the frame loop with a fixed timestep and dump each frame's params.
    Simulate {
        #[clap(long, default_value_t = 10)]
        frames: u32,
        #[clap(long, default_value_t = 1920)]
        width: u32,
        #[clap(long, default_value_t = 1080)]
        height: u32,
        #[clap(long, default_value_t = 60.0)]
        fps: f32,
        /// Push every frame through the update kernel and read it back.
        #[clap(long)]
        gpu: bool,
    },
    /// Check a WGSL `Params` declaration against the host struct.
    VerifyLayout {
        /// Defaults to the bundled shaders/params.wgsl.
        #[clap(long)]
        shader: Option<PathBuf>,
    },
    /// Write the random noise texture as a PNG.
    Noise {
        #[clap(long)]
        out: PathBuf,
        #[clap(long, default_value_t = NOISE_SIZE)]
        size: u32,
        #[clap(long, default_value_t = 0)]
        seed: u64,
    },
    /// Show the view settings picked for a thermal state.
    Mode {
        #[clap(long)]
        thermal: ThermalState,
        /// Apply a pause/resume toggle afterwards.
        #[clap(long)]
        toggle: bool,
    },
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fixed frame step for a target rate.
fn timestep(fps: f32) -> Result<Duration> {
    ensure!(fps.is_finite() && fps > 0.0, "fps must be positive, got {fps}");
    Duration::try_from_secs_f32(1.0 / fps)
        .with_context(|| format!("fps {fps} gives an unrepresentable timestep"))
}

fn simulate(frames: u32, width: u32, height: u32, fps: f32, use_gpu: bool) -> Result<()> {
    let step = timestep(fps)?;

    let t0 = Instant::now();
    let mut frame_params = FrameParams::with_clock(FrameClock::starting_at(t0), width, height);
    if !frame_params.is_drawable() {
        info!(width, height, "drawable is empty, params will carry a zero size");
    }

    let gfx = if use_gpu {
        let (device, queue) =
            pollster::block_on(gpu::request_device()).context("couldn't set up the gpu")?;
        let buffer = ParamsBuffer::new(&device);
        let updater = ParamsUpdater::new(&device);
        Some((device, queue, buffer, updater))
    } else {
        None
    };

    for frame in 1..=frames {
        let now = step
            .checked_mul(frame)
            .and_then(|elapsed| t0.checked_add(elapsed))
            .with_context(|| format!("frame {frame} is too far in the future at {fps} fps"))?;
        let params = frame_params.advance_at(now);
        println!(
            "frame {frame:>4}  time {:>9.4}  dt {:.4}  {}x{}  [{}]",
            params.time,
            params.delta_time,
            params.width,
            params.height,
            hex(&params.to_le_bytes())
        );

        if let Some((device, queue, buffer, updater)) = &gfx {
            updater.update(device, queue, buffer, &params);
            let device_params = buffer
                .read_back(device, queue)
                .context("couldn't read params back")?;
            debug!(frame, ?device_params, "device params");
            ensure!(
                device_params.to_le_bytes() == params.to_le_bytes(),
                "device holds {device_params:?}, host wrote {params:?}"
            );
        }
    }

    if gfx.is_some() {
        info!(frames, "device params matched host params every frame");
    }
    Ok(())
}

fn verify_layout(shader: Option<PathBuf>) -> Result<()> {
    let source = match &shader {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("couldn't read {}", path.display()))?,
        None => PARAMS_WGSL.to_owned(),
    };

    let device = layout::verify_shader_source(&source)?;
    print!("{device}");
    info!("shader layout matches host params");
    Ok(())
}

fn pick_mode(thermal: ThermalState, toggle: bool) -> (RenderMode, ViewSettings) {
    let mut controller = RenderModeController::new();
    let mut settings = controller.on_thermal_change(thermal);
    if toggle {
        settings = controller.toggle();
    }
    (controller.mode(), settings)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Command::Simulate {
            frames,
            width,
            height,
            fps,
            gpu,
        } => simulate(frames, width, height, fps, gpu)?,
        Command::VerifyLayout { shader } => verify_layout(shader)?,
        Command::Noise { out, size, seed } => {
            NoiseTexture::generate(size, size, seed)?
                .save_png(&out)
                .with_context(|| format!("couldn't save {}", out.display()))?;
            info!(path = %out.display(), "wrote noise texture");
        }
        Command::Mode { thermal, toggle } => {
            let (mode, settings) = pick_mode(thermal, toggle);
            println!("mode: {mode}");
            println!("{settings:#?}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestep() {
        assert_eq!(timestep(4.0).unwrap(), Duration::from_millis(250));
        assert!(timestep(0.0).is_err());
        assert!(timestep(f32::NAN).is_err());
        // 1/fps overflows a Duration
        assert!(timestep(1e-30).is_err());
    }

    #[test]
    fn test_simulate_without_gpu() {
        simulate(3, 0, 0, 60.0, false).unwrap();
        simulate(3, 1920, 1080, 144.0, false).unwrap();
        assert!(simulate(3, 64, 64, 1e-30, false).is_err());
    }

    #[test]
    fn test_verify_layout() {
        verify_layout(None).unwrap();

        let path = std::env::temp_dir().join(format!("frameparams-reordered-{}.wgsl", std::process::id()));
        std::fs::write(
            &path,
            "struct Params { delta_time: f32, time: f32, width: f32, height: f32, }",
        )
        .unwrap();
        let res = verify_layout(Some(path.clone()));
        std::fs::remove_file(&path).unwrap();

        let err = res.unwrap_err();
        assert!(err.downcast_ref::<layout::LayoutError>().is_some(), "{err:#}");
    }

    #[test]
    fn test_verify_layout_missing_file() {
        let err = verify_layout(Some(PathBuf::from("/nonexistent/params.wgsl"))).unwrap_err();
        assert!(err.to_string().contains("couldn't read"));
    }

    #[test]
    fn test_pick_mode() {
        assert_eq!(
            pick_mode(ThermalState::Nominal, false),
            (RenderMode::Continuous, ViewSettings::CONTINUOUS)
        );
        assert_eq!(
            pick_mode(ThermalState::Critical, false),
            (RenderMode::OnDemand, ViewSettings::ON_DEMAND)
        );
        assert_eq!(
            pick_mode(ThermalState::Fair, true),
            (RenderMode::Continuous, ViewSettings::CONTINUOUS)
        );
    }
}
