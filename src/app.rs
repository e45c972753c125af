use crate::config::LandscapeConfig;
use crate::input::InputState;
use crate::scene_builder;
use anyhow::{Context, Result};
use landscape_render::WgpuDevice;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

/// Open a window and render the landscape until it is closed.
pub fn run(config: LandscapeConfig) -> Result<()> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window.title.as_str())
            .with_inner_size(PhysicalSize::new(config.window.width, config.window.height))
            .build(&event_loop)
            .context("Failed to create window")?,
    );

    let mut gpu = pollster::block_on(WgpuDevice::new(window.clone()))
        .inspect_err(|err| tracing::error!(%err, "GPU initialization failed"))
        .context("Failed to initialize GPU")?;
    info!(format = ?gpu.surface_format(), "GPU ready");

    let scene_builder::BuiltScene {
        mut scene,
        mut driver,
        terrain,
    } = scene_builder::build(&mut gpu, &config)?;
    info!(faces = terrain.faces, hash = %terrain.hash, "landscape loaded");

    let mut input = InputState::default();
    let mut last_frame = Instant::now();

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { event, window_id } if window_id == window.id() => {
            input.handle_event(&event);
            match event {
                WindowEvent::CloseRequested => {
                    info!(frames = driver.frames(), "Closing landscape");
                    elwt.exit();
                }
                WindowEvent::Resized(size) => {
                    driver.resize(&mut gpu, size.width, size.height);
                }
                WindowEvent::MouseInput {
                    state: ElementState::Pressed,
                    button: MouseButton::Left,
                    ..
                } if !input.cursor_captured => {
                    input.set_cursor_capture(&window, true);
                }
                WindowEvent::KeyboardInput { event, .. }
                    if event.state == ElementState::Pressed
                        && event.physical_key == PhysicalKey::Code(KeyCode::Escape) =>
                {
                    if input.cursor_captured {
                        input.set_cursor_capture(&window, false);
                    } else {
                        elwt.exit();
                    }
                }
                WindowEvent::Focused(false) if input.cursor_captured => {
                    input.set_cursor_capture(&window, false);
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let dt = now.duration_since(last_frame).as_secs_f32();
                    last_frame = now;

                    input.apply_to_camera(&mut scene.camera, dt);
                    if let Err(err) = driver.render(&mut gpu, &scene) {
                        tracing::error!(%err, frame = driver.frames(), "frame failed");
                    }
                }
                _ => {}
            }
        }
        Event::DeviceEvent { event, .. } => input.handle_device_event(&event),
        Event::AboutToWait => window.request_redraw(),
        Event::LoopExiting => {
            info!(presented = gpu.frames_presented(), "event loop exiting");
        }
        _ => {}
    })?;

    Ok(())
}
