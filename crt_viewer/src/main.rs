mod cli;
mod display;
mod headless;
mod host;
mod shaders;
mod video;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crt_core::variant::{RASTER_HEIGHT, RASTER_WIDTH};
use crt_core::{FrameDriver, InputEvent, Session};
use log::{debug, error, info};
use pollster::FutureExt;
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, Event, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::WindowBuilder,
};

use crate::cli::Args;
use crate::display::CrtRenderer;
use crate::headless::DumpRequest;
use crate::host::WindowHost;

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::init();

    args.validate()?;
    let config = cli::load_app_config(&args)?;
    let font = cli::load_font(args.font.as_deref())?;

    if let Some(destination) = args.dump_render.as_ref() {
        let mut video = video::open_video(args.video.as_deref());
        headless::dump_render(
            config.clone(),
            font.clone(),
            video.as_mut(),
            &DumpRequest {
                destination,
                window: (args.window_width, args.window_height),
                elapsed: Duration::from_secs_f32(args.dump_time),
            },
        )
        .context("rendering --dump-render frame")?;
    }

    if args.headless {
        info!("headless mode requested; window bootstrap skipped");
        return Ok(());
    }

    let event_loop = EventLoop::new().context("creating winit event loop")?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.text.title.clone())
            .with_inner_size(PhysicalSize::new(args.window_width, args.window_height))
            .build(&event_loop)
            .context("creating viewer window")?,
    );

    let mut renderer = CrtRenderer::new(window.clone(), (RASTER_WIDTH, RASTER_HEIGHT))
        .block_on()
        .context("initialising GPU renderer")?;
    let size = renderer.size();
    let mut session =
        Session::new(config, font, (size.width, size.height)).context("building UI session")?;
    let mut host = WindowHost::new(window);
    session.mount(&mut host);

    let mut video = video::open_video(args.video.as_deref());
    let mut driver = FrameDriver::new();
    let start = Instant::now();
    let mut pointer = (0.0f32, 0.0f32);

    event_loop
        .run(move |event, target| {
            target.set_control_flow(ControlFlow::Poll);

            let mut input = None;
            match event {
                Event::WindowEvent { window_id, event } if window_id == renderer.window().id() => {
                    match event {
                        WindowEvent::CloseRequested
                        | WindowEvent::KeyboardInput {
                            event:
                                KeyEvent {
                                    logical_key: Key::Named(NamedKey::Escape),
                                    state: ElementState::Pressed,
                                    ..
                                },
                            ..
                        } => {
                            session.unmount(&mut host);
                            target.exit();
                        }
                        WindowEvent::Resized(new_size) => {
                            renderer.resize(new_size);
                            input = Some(InputEvent::Resize {
                                width: new_size.width,
                                height: new_size.height,
                            });
                        }
                        WindowEvent::CursorMoved { position, .. } => {
                            pointer = (position.x as f32, position.y as f32);
                            input = Some(InputEvent::PointerMove {
                                x: pointer.0,
                                y: pointer.1,
                            });
                        }
                        WindowEvent::MouseInput {
                            state: ElementState::Pressed,
                            button: MouseButton::Left,
                            ..
                        } => {
                            input = Some(InputEvent::Click {
                                x: pointer.0,
                                y: pointer.1,
                            });
                        }
                        WindowEvent::RedrawRequested => {
                            let ticked = driver.tick(
                                start.elapsed(),
                                &mut session,
                                video.as_mut(),
                                &mut renderer,
                            );
                            match ticked {
                                Ok(report) => {
                                    if report.ui_redrawn {
                                        debug!("ui redrawn at {:.2}s", report.elapsed);
                                    }
                                }
                                Err(err) => {
                                    error!("frame failed: {err:#}");
                                    session.unmount(&mut host);
                                    target.exit();
                                }
                            }
                        }
                        _ => {}
                    }
                }
                Event::AboutToWait => renderer.window().request_redraw(),
                _ => {}
            }

            if let Some(input) = input {
                if !host.wants(input.kind()) {
                    return;
                }
                if let Err(err) = session.handle(&mut host, input) {
                    error!("handling {:?} failed: {err:#}", input.kind());
                    session.unmount(&mut host);
                    target.exit();
                }
            }
        })
        .context("running viewer event loop")?;
    Ok(())
}

