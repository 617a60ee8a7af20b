mod signals;
mod soft;

use anyhow::{bail, Context as _};
use glview_core::{EnvCallback, HostLooper, ShutdownToken, SurfaceView, SurfaceViewConfig};
use glview_modules_logging::LoggingConfig;
use log::{error, info, warn};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::soft::{ClearRenderer, SoftSurface, SoftwareBackend};

const DEFAULT_CONFIG: &str = "glview.toml";
const READY_TIMEOUT: Duration = Duration::from_secs(5);
const PUMP_SLICE: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Deserialize)]
struct ScriptConfig {
    /// Attach/detach cycles to run.
    #[serde(default = "default_cycles")]
    cycles: u32,
    #[serde(default = "default_width")]
    width: u32,
    #[serde(default = "default_height")]
    height: u32,
    /// Frames drawn per render request when continuous redraw is on.
    #[serde(default = "default_frames")]
    frames: u32,
    #[serde(default)]
    max_side: Option<u32>,
}

fn default_cycles() -> u32 {
    3
}

fn default_width() -> u32 {
    320
}

fn default_height() -> u32 {
    200
}

fn default_frames() -> u32 {
    4
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            cycles: default_cycles(),
            width: default_width(),
            height: default_height(),
            frames: default_frames(),
            max_side: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DemoConfig {
    #[serde(default)]
    view: SurfaceViewConfig,
    #[serde(default)]
    logging: LoggingConfig,
    #[serde(default)]
    script: ScriptConfig,
}

impl DemoConfig {
    fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read {}", path.display()))?;
        toml::from_str(&s).with_context(|| format!("parse {}", path.display()))
    }
}

/// Runs host tasks until `cond` holds. Detach completion arrives through here.
fn pump_until(
    looper: &HostLooper,
    shutdown: &ShutdownToken,
    mut cond: impl FnMut() -> bool,
) -> anyhow::Result<bool> {
    let deadline = Instant::now() + READY_TIMEOUT;
    while !cond() {
        if shutdown.is_requested() {
            return Ok(false);
        }
        if Instant::now() >= deadline {
            bail!("timed out waiting on render thread");
        }
        looper.pump_timeout(PUMP_SLICE);
    }
    Ok(true)
}

fn report_fault(view: &SurfaceView<SoftwareBackend>) {
    if let Some(e) = view.take_fault() {
        if e.is_fatal() {
            error!(target: "demo", "render thread fault: {}", e);
        } else {
            warn!(target: "demo", "render thread error: {}", e);
        }
    }
}

fn run_cycle(
    view: &SurfaceView<SoftwareBackend>,
    looper: &HostLooper,
    shutdown: &ShutdownToken,
    surface: &SoftSurface,
    script: &ScriptConfig,
    cycle: u32,
) -> anyhow::Result<bool> {
    // The previous cycle detached right before this; the attach may be parked.
    view.on_attach()?;
    if !pump_until(looper, shutdown, || view.gl_env_ready())? {
        return Ok(false);
    }

    view.on_surface_available(surface.clone(), script.width, script.height);
    view.on_surface_resized(script.width + cycle * 16, script.height);
    view.request_render();

    view.pause();
    view.on_surface_resized(script.width, script.height + cycle * 16);
    view.resume();
    view.request_render();

    looper.pump_timeout(PUMP_SLICE);
    report_fault(view);

    info!(
        target: "demo",
        "cycle {} epoch={} presented={} probe={:x?}",
        cycle,
        view.epoch(),
        surface.presented(),
        surface.probe()
    );

    view.on_detach();
    Ok(true)
}

fn main() -> anyhow::Result<()> {
    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let cfg = DemoConfig::load(Path::new(&path))?;
    glview_modules_logging::init_logging(&cfg.logging);

    let shutdown = ShutdownToken::new();
    if let Err(e) = signals::install_ctrlc(&shutdown) {
        warn!(target: "demo", "ctrl-c handler not installed: {}", e);
    }

    let backend = match cfg.script.max_side {
        Some(side) => SoftwareBackend::with_max_side(side),
        None => SoftwareBackend::default(),
    };

    let looper = Arc::new(HostLooper::new());
    let view = SurfaceView::with_config(backend, looper.clone(), cfg.view.clone());
    view.set_renderer(ClearRenderer::new(cfg.script.frames));

    let on_env: EnvCallback<SoftwareBackend> = Box::new(|v: &SurfaceView<SoftwareBackend>| {
        info!(target: "demo", "render env ready epoch={}", v.epoch());
    });
    view.set_env_callback(Some(on_env));

    let surface = SoftSurface::new();
    for cycle in 0..cfg.script.cycles {
        if !run_cycle(&view, &looper, &shutdown, &surface, &cfg.script, cycle)? {
            break;
        }
    }

    // No-op unless a cycle was cut short by ctrl-c.
    view.on_detach();
    pump_until(&looper, &ShutdownToken::new(), || !view.is_detach_pending())?;
    report_fault(&view);

    let (w, h) = surface.size();
    info!(
        target: "demo",
        "done epochs={} presented={} last_size={}x{}",
        view.epoch(),
        surface.presented(),
        w,
        h
    );
    Ok(())
}
