mod demo;

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use pixels::{Pixels, SurfaceTexture};
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowBuilder;

use radial_gauge::{
    DataBridge, GaugeSettings, HostEventKind, RasterSurface, Rasterizer, Trigger, Viewport,
};

use crate::demo::{DataSource, DemoHost, Toggle, ToggleDialog};

const WINDOW_WIDTH: f64 = 480.0;
const WINDOW_HEIGHT: f64 = 360.0;

struct Args {
    config: Option<PathBuf>,
    data: Option<PathBuf>,
    title: String,
    refresh: Option<Duration>,
}

fn parse_args() -> Args {
    let mut parsed = Args {
        config: None,
        data: None,
        title: "Radial Gauge".to_string(),
        refresh: None,
    };
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => parsed.config = args.next().map(PathBuf::from),
            "--data" => parsed.data = args.next().map(PathBuf::from),
            "--title" => {
                if let Some(title) = args.next() {
                    parsed.title = title;
                }
            }
            "--refresh" => {
                parsed.refresh = args
                    .next()
                    .and_then(|secs| secs.parse::<f64>().ok())
                    .filter(|secs| *secs > 0.0)
                    .map(Duration::from_secs_f64);
            }
            other => tracing::warn!(arg = other, "ignoring unknown argument"),
        }
    }
    parsed
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args();
    let settings = match &args.config {
        Some(path) => GaugeSettings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => GaugeSettings::default(),
    };
    let rasterizer = Rasterizer::from_config(&settings.render)?;
    if !rasterizer.has_font() {
        tracing::warn!(
            "text disabled: set render.font_path in --config (or GAUGE__RENDER__FONT_PATH) \
             to a .ttf/.otf file to draw labels and messages"
        );
    }

    let source = match args.data {
        Some(path) => DataSource::File(path),
        None => DataSource::Random,
    };
    let host = Arc::new(DemoHost::new(source));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title(&args.title)
        .with_inner_size(LogicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT))
        .with_resizable(true)
        .build(&event_loop)?;
    let window = Arc::new(window);
    let window_clone = window.clone();

    let size = window.inner_size();
    let mut fb_width = size.width as usize;
    let mut fb_height = size.height as usize;
    let surface_texture = SurfaceTexture::new(size.width, size.height, &window);
    let mut pixels = Pixels::new(size.width, size.height, surface_texture)?;

    let viewport = Viewport::new(size.width as f64, size.height as f64);
    let mut bridge = DataBridge::new(host.clone(), RasterSurface::new(), settings, viewport);
    let mut triggers = runtime.block_on(bridge.initialize());
    let mut painted_revision = None;
    let mut last_refresh = Instant::now();

    tracing::info!("R reloads, P flips the domain policy, F flips the number format, Esc quits");

    event_loop.run(move |event, window_target| {
        match args.refresh {
            Some(every) => window_target.set_control_flow(ControlFlow::WaitUntil(last_refresh + every)),
            None => window_target.set_control_flow(ControlFlow::Wait),
        }
        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    bridge.dispose();
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    fb_width = new_size.width as usize;
                    fb_height = new_size.height as usize;
                    let _ = pixels.resize_buffer(new_size.width, new_size.height);
                    let _ = pixels.resize_surface(new_size.width, new_size.height);
                    let viewport = Viewport::new(new_size.width as f64, new_size.height as f64);
                    runtime.block_on(bridge.handle(Trigger::Resize(viewport)));
                    painted_revision = None;
                    window_clone.request_redraw();
                }
                WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            logical_key,
                            state: ElementState::Pressed,
                            repeat: false,
                            ..
                        },
                    ..
                } => match logical_key {
                    Key::Named(NamedKey::Escape) => {
                        runtime.block_on(bridge.handle(Trigger::Teardown));
                        window_target.exit();
                    }
                    Key::Character(key) => {
                        match key.as_str() {
                            "r" | "R" => {
                                host.notify(HostEventKind::SummaryDataChanged);
                            }
                            "p" | "P" => runtime.block_on(bridge.configure(&ToggleDialog(Toggle::Policy))),
                            "f" | "F" => {
                                runtime.block_on(bridge.configure(&ToggleDialog(Toggle::NumberFormat)))
                            }
                            _ => {}
                        }
                        window_clone.request_redraw();
                    }
                    _ => {}
                },
                WindowEvent::RedrawRequested => {
                    let revision = bridge.surface().revision();
                    if painted_revision != Some(revision) {
                        bridge
                            .surface()
                            .paint(&rasterizer, pixels.frame_mut(), fb_width, fb_height);
                        painted_revision = Some(revision);
                    }
                    if let Err(err) = pixels.render() {
                        tracing::error!(error = %err, "failed to present frame");
                        window_target.exit();
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                if let Some(every) = args.refresh {
                    if last_refresh.elapsed() >= every {
                        host.notify(HostEventKind::SummaryDataChanged);
                        last_refresh = Instant::now();
                    }
                }
                while let Ok(trigger) = triggers.try_recv() {
                    runtime.block_on(bridge.handle(trigger));
                    window_clone.request_redraw();
                }
            }
            _ => {}
        }
    })?;

    Ok(())
}
