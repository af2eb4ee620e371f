//! Entry point for Ripple.
//! Logging + CLI flags + exit status.

use std::path::PathBuf;
use std::process::ExitCode;

use corelib::CoreError;
use platform::RunConfig;

fn parse_backend_arg(args: &[String]) -> wgpu::Backends {
    // Accept: --gpu-backend=auto|vulkan|dx12|metal|gl
    let mut backends = wgpu::Backends::all(); // default = auto
    for arg in args {
        if let Some(val) = arg.strip_prefix("--gpu-backend=") {
            backends = match val.to_ascii_lowercase().as_str() {
                "auto" => wgpu::Backends::all(),
                "vulkan" | "vk" => wgpu::Backends::VULKAN,
                "dx12" | "d3d12" => wgpu::Backends::DX12,
                "metal" | "mtl" => wgpu::Backends::METAL,
                "gl" | "opengl" | "gles" => wgpu::Backends::GL,
                other => {
                    log::warn!("Unknown backend '{}', falling back to auto.", other);
                    wgpu::Backends::all()
                }
            };
        }
    }
    backends
}

fn parse_show_fps_arg(args: &[String]) -> bool {
    // --show-fps[=on|off], default off
    for arg in args {
        if arg == "--show-fps" {
            return true;
        }
        if let Some(val) = arg.strip_prefix("--show-fps=") {
            return matches!(
                val.to_ascii_lowercase().as_str(),
                "1" | "true" | "on" | "yes"
            );
        }
    }
    false
}

fn parse_size_args(args: &[String], default: (u32, u32)) -> (u32, u32) {
    let mut w: Option<u32> = None;
    let mut h: Option<u32> = None;

    for arg in args {
        if let Some(v) = arg.strip_prefix("--size=") {
            if let Some((sw, sh)) = v.split_once('x').or_else(|| v.split_once('X')) {
                if let (Ok(pw), Ok(ph)) = (sw.parse::<u32>(), sh.parse::<u32>()) {
                    w = Some(pw);
                    h = Some(ph);
                }
            }
        } else if let Some(v) = arg.strip_prefix("--width=") {
            if let Ok(pw) = v.parse::<u32>() {
                w = Some(pw);
            }
        } else if let Some(v) = arg.strip_prefix("--height=") {
            if let Ok(ph) = v.parse::<u32>() {
                h = Some(ph);
            }
        }
    }

    let ww = w.unwrap_or(default.0).max(1);
    let hh = h.unwrap_or(default.1).max(1);
    (ww, hh)
}

fn parse_assets_arg(args: &[String], default: PathBuf) -> PathBuf {
    // --assets=DIR
    args.iter()
        .rev()
        .find_map(|arg| arg.strip_prefix("--assets="))
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .unwrap_or(default)
}

fn parse_grid_arg(args: &[String], default: u32) -> u32 {
    // --grid=N, 1 <= N <= MAX_GRID_SIZE
    let mut grid = default;
    for arg in args {
        if let Some(v) = arg.strip_prefix("--grid=") {
            match v.parse::<u32>() {
                Ok(n) if n > asset::MAX_GRID_SIZE => {
                    log::warn!(
                        "Grid size {} too large, clamping to {}",
                        n,
                        asset::MAX_GRID_SIZE
                    );
                    grid = asset::MAX_GRID_SIZE;
                }
                Ok(n) if n >= 1 => grid = n,
                _ => log::warn!("Ignoring invalid grid size '{}'", v),
            }
        }
    }
    grid
}

fn parse_config(args: &[String]) -> RunConfig {
    let defaults = RunConfig::default();
    let (width, height) = parse_size_args(args, (defaults.width, defaults.height));
    RunConfig {
        backends: parse_backend_arg(args),
        show_fps: parse_show_fps_arg(args),
        width,
        height,
        asset_root: parse_assets_arg(args, defaults.asset_root),
        grid_size: parse_grid_arg(args, defaults.grid_size),
    }
}

/// Exit status for a failed run: a typed core error decides, else 1.
fn exit_status(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<CoreError>())
        .map_or(1, |core| core.exit_code() as u8)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = parse_config(&args);
    log::info!(
        "Starting Ripple. Backend: {:?}, show_fps={}, window_size={}x{}, assets={:?}, grid={}",
        config.backends,
        config.show_fps,
        config.width,
        config.height,
        config.asset_root,
        config.grid_size
    );

    match platform::run_with_renderer(config) {
        Ok(()) => {
            log::info!("Graceful shutdown. Bye!");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("EXITING: {e:#}");
            ExitCode::from(exit_status(&e))
        }
    }
}
