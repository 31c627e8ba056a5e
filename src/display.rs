/*!
Windowed frontend (feature `display`).

One emulated frame is run per redraw and copied into a `pixels` surface;
presentation uses the surface's vsync, so the core itself is never paced.

Keyboard (pad 1): Z = A, X = B, Right Shift = Select, Enter = Start, arrows.
Escape or closing the window quits.
*/

use std::sync::Arc;

use pixels::{Pixels, SurfaceTexture};
use thiserror::Error;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::controller::Button;
use crate::cpu::CpuError;
use crate::ppu::{NES_HEIGHT, NES_WIDTH};
use crate::system::Nes;

const SCALE: f64 = 3.0;

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("surface: {0}")]
    Pixels(#[from] pixels::Error),
    #[error("surface resize: {0}")]
    Texture(#[from] pixels::TextureError),
    #[error(transparent)]
    Cpu(#[from] CpuError),
}

fn button_for(key: KeyCode) -> Option<Button> {
    match key {
        KeyCode::KeyZ => Some(Button::A),
        KeyCode::KeyX => Some(Button::B),
        KeyCode::ShiftRight => Some(Button::Select),
        KeyCode::Enter => Some(Button::Start),
        KeyCode::ArrowUp => Some(Button::Up),
        KeyCode::ArrowDown => Some(Button::Down),
        KeyCode::ArrowLeft => Some(Button::Left),
        KeyCode::ArrowRight => Some(Button::Right),
        _ => None,
    }
}

struct App {
    nes: Nes,
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    error: Option<DisplayError>,
}

impl App {
    fn open(&mut self, event_loop: &ActiveEventLoop) -> Result<(), DisplayError> {
        let size = LogicalSize::new(NES_WIDTH as f64 * SCALE, NES_HEIGHT as f64 * SCALE);
        let attributes = Window::default_attributes()
            .with_title("famicore")
            .with_inner_size(size)
            .with_min_inner_size(LogicalSize::new(NES_WIDTH as f64, NES_HEIGHT as f64));
        let window = Arc::new(event_loop.create_window(attributes)?);
        let physical = window.inner_size();
        let surface = SurfaceTexture::new(physical.width, physical.height, Arc::clone(&window));
        self.pixels = Some(Pixels::new(NES_WIDTH as u32, NES_HEIGHT as u32, surface)?);
        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn redraw(&mut self) -> Result<(), DisplayError> {
        self.nes.run_frame()?;
        let Some(pixels) = self.pixels.as_mut() else {
            return Ok(());
        };
        for (dst, &src) in pixels
            .frame_mut()
            .chunks_exact_mut(4)
            .zip(self.nes.frame_buffer())
        {
            dst.copy_from_slice(&[(src >> 16) as u8, (src >> 8) as u8, src as u8, 0xFF]);
        }
        pixels.render()?;
        if let Some(window) = &self.window {
            window.request_redraw();
        }
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: DisplayError) {
        log::error!("{error}");
        self.error = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.open(event_loop) {
                self.fail(event_loop, e);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(pixels) = self.pixels.as_mut() {
                    if let Err(e) = pixels.resize_surface(size.width, size.height) {
                        self.fail(event_loop, e.into());
                    }
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(code) = event.physical_key else {
                    return;
                };
                if code == KeyCode::Escape {
                    event_loop.exit();
                    return;
                }
                if let (Some(button), Some(pad)) = (button_for(code), self.nes.controller_mut(0)) {
                    pad.set_button(button, event.state == ElementState::Pressed);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    self.fail(event_loop, e);
                }
            }
            _ => {}
        }
    }
}

/// Open a window and run `nes` until it is closed or the CPU faults.
pub fn run(nes: Nes) -> Result<(), DisplayError> {
    let event_loop = EventLoop::new()?;
    let mut app = App {
        nes,
        window: None,
        pixels: None,
        error: None,
    };
    event_loop.run_app(&mut app)?;
    match app.error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
