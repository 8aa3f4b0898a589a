mod render;
mod text;

use std::sync::Arc;
use std::time::{Duration, Instant};

use render::{push_rect, CellInstance, Rect, Renderer, Vertex};
use text::{draw_text, text_pixel_width, FONT_HEIGHT};
use universe::grid::{Cell, Universe};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowAttributes, WindowId};

const CELL_PIXELS: f32 = 12.0;
const STEP_INTERVAL: Duration = Duration::from_millis(100);
const UI_HEIGHT: f32 = 90.0;
const BUTTON_WIDTH: f32 = 180.0;
const BUTTON_HEIGHT: f32 = 44.0;
const BUTTON_PADDING: f32 = 24.0;
const BUTTON_VERTICAL_OFFSET: f32 = 12.0;
const BUTTON_GAP: f32 = 16.0;
const TEXT_SCALE_HEADING: f32 = 8.0;
const TEXT_SCALE_BUTTON: f32 = 3.0;
const TEXT_SCALE_STATUS: f32 = 4.0;

/// Where the grid sits in the window: the universe dimensions are whatever
/// number of fixed-size cells fits below the UI strip, centered.
#[derive(Copy, Clone)]
struct GridLayout {
    origin: [f32; 2],
    cols: usize,
    rows: usize,
}

impl GridLayout {
    fn for_window(size: PhysicalSize<u32>) -> Self {
        let width = size.width.max(1) as f32;
        let height = size.height.max(1) as f32;
        let usable_height = (height - UI_HEIGHT).max(CELL_PIXELS);
        let cols = ((width / CELL_PIXELS) as usize).max(1);
        let rows = ((usable_height / CELL_PIXELS) as usize).max(1);
        let origin = [
            (width - cols as f32 * CELL_PIXELS) * 0.5,
            UI_HEIGHT + (usable_height - rows as f32 * CELL_PIXELS) * 0.5,
        ];
        Self { origin, cols, rows }
    }

    fn cell_at(&self, point: [f32; 2]) -> Option<(usize, usize)> {
        let col = (point[0] - self.origin[0]) / CELL_PIXELS;
        let row = (point[1] - self.origin[1]) / CELL_PIXELS;
        if col < 0.0 || row < 0.0 {
            return None;
        }
        let (row, col) = (row as usize, col as usize);
        (row < self.rows && col < self.cols).then_some((row, col))
    }

    fn cell_rect(&self, row: usize, col: usize) -> Rect {
        let x = self.origin[0] + col as f32 * CELL_PIXELS;
        let y = self.origin[1] + row as f32 * CELL_PIXELS;
        Rect {
            min: [x, y],
            max: [x + CELL_PIXELS, y + CELL_PIXELS],
        }
    }
}

struct Scene {
    universe: Universe,
    layout: GridLayout,
    paused: bool,
    last_step: Instant,
    window_size: PhysicalSize<u32>,
    cursor_position: Option<[f32; 2]>,
    instances: Vec<CellInstance>,
    ui_vertices: Vec<Vertex>,
}

impl Scene {
    fn new(window_size: PhysicalSize<u32>) -> Self {
        let layout = GridLayout::for_window(window_size);
        let universe =
            Universe::new(layout.cols, layout.rows).expect("window layout yields a non-empty grid");
        Self {
            universe,
            layout,
            paused: false,
            last_step: Instant::now(),
            window_size,
            cursor_position: None,
            instances: Vec::with_capacity(layout.cols * layout.rows),
            ui_vertices: Vec::with_capacity(2048),
        }
    }

    fn cell_count(&self) -> usize {
        self.universe.cells().len()
    }

    /// The viewport changed. A universe has no resize operation, so the old
    /// one is discarded for a fresh randomized grid matching the new layout.
    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.window_size = size;
        let layout = GridLayout::for_window(size);
        if layout.cols != self.universe.width() || layout.rows != self.universe.height() {
            self.universe = Universe::new(layout.cols, layout.rows)
                .expect("window layout yields a non-empty grid");
            self.last_step = Instant::now();
        }
        self.layout = layout;
    }

    fn update(&mut self) {
        if !self.paused && self.last_step.elapsed() >= STEP_INTERVAL {
            self.universe.tick();
            self.last_step = Instant::now();
        }
    }

    fn randomize(&mut self) {
        self.universe.randomize();
        self.last_step = Instant::now();
    }

    fn clear(&mut self) {
        self.universe.clear();
    }

    fn toggle_paused(&mut self) {
        self.paused = !self.paused;
    }

    fn handle_click(&mut self, position: [f32; 2]) {
        if self.randomize_button_rect().contains(position) {
            self.randomize();
            return;
        }
        if self.clear_button_rect().contains(position) {
            self.clear();
            return;
        }
        if let Some((row, col)) = self.layout.cell_at(position) {
            if let Err(err) = self.universe.toggle_cell(row, col) {
                log::debug!("toggle rejected: {err}");
            }
        }
    }

    fn randomize_button_rect(&self) -> Rect {
        let width = self.window_size.width.max(1) as f32;
        Rect {
            min: [
                width - BUTTON_PADDING - BUTTON_WIDTH,
                BUTTON_PADDING + BUTTON_VERTICAL_OFFSET,
            ],
            max: [
                width - BUTTON_PADDING,
                BUTTON_PADDING + BUTTON_VERTICAL_OFFSET + BUTTON_HEIGHT,
            ],
        }
    }

    fn clear_button_rect(&self) -> Rect {
        let randomize = self.randomize_button_rect();
        Rect {
            min: [randomize.min[0] - BUTTON_GAP - BUTTON_WIDTH, randomize.min[1]],
            max: [randomize.min[0] - BUTTON_GAP, randomize.max[1]],
        }
    }

    fn build_frame(&mut self) -> (&[CellInstance], &[Vertex]) {
        self.instances.clear();
        self.ui_vertices.clear();

        let width = self.window_size.width.max(1) as f32;
        let height = self.window_size.height.max(1) as f32;
        let screen = [width, height];

        let cols = self.universe.width();
        for (row_index, row) in self.universe.cells().chunks(cols).enumerate() {
            for (col_index, cell) in row.iter().enumerate() {
                let rect = self.layout.cell_rect(row_index, col_index);
                let color = match cell {
                    Cell::Alive => [0.85, 0.93, 0.78],
                    Cell::Dead => [0.10, 0.12, 0.16],
                };
                self.instances.push(CellInstance::from_pixels(rect, color, screen));
            }
        }

        let header_line = Rect {
            min: [0.0, UI_HEIGHT - 4.0],
            max: [width, UI_HEIGHT],
        };
        push_rect(&mut self.ui_vertices, header_line, [0.15, 0.15, 0.2], screen);

        let cursor = self.cursor_position;
        let randomize_rect = self.randomize_button_rect();
        let clear_rect = self.clear_button_rect();
        for (rect, label) in [(randomize_rect, "Randomize"), (clear_rect, "Clear")] {
            let hovered = cursor.map(|pos| rect.contains(pos)).unwrap_or(false);
            let color = if hovered { [0.35, 0.45, 0.75] } else { [0.25, 0.33, 0.55] };
            push_rect(&mut self.ui_vertices, rect, color, screen);
            label_button(&mut self.ui_vertices, rect, label, screen);
        }

        let heading = "Game of Life";
        draw_text(
            &mut self.ui_vertices,
            heading,
            [BUTTON_PADDING, BUTTON_PADDING],
            TEXT_SCALE_HEADING,
            [0.9, 0.9, 0.95],
            screen,
        );

        if self.paused {
            let x = BUTTON_PADDING
                + text_pixel_width(heading) * TEXT_SCALE_HEADING
                + 4.0 * TEXT_SCALE_STATUS;
            draw_text(
                &mut self.ui_vertices,
                "Paused",
                [x, BUTTON_PADDING + 14.0],
                TEXT_SCALE_STATUS,
                [0.85, 0.65, 0.35],
                screen,
            );
        }

        (&self.instances, &self.ui_vertices)
    }
}

fn label_button(vertices: &mut Vec<Vertex>, rect: Rect, label: &str, screen: [f32; 2]) {
    let text_width = text_pixel_width(label) * TEXT_SCALE_BUTTON;
    let text_height = FONT_HEIGHT as f32 * TEXT_SCALE_BUTTON;
    let origin_x = rect.min[0] + (rect.max[0] - rect.min[0] - text_width) * 0.5;
    let origin_y = rect.min[1] + (rect.max[1] - rect.min[1] - text_height) * 0.5;
    draw_text(
        vertices,
        label,
        [origin_x, origin_y],
        TEXT_SCALE_BUTTON,
        [0.95, 0.95, 0.98],
        screen,
    );
}

fn key_matches(event: &KeyEvent, target: &str) -> bool {
    match &event.logical_key {
        Key::Named(NamedKey::Space) => target.eq_ignore_ascii_case("SPACE"),
        Key::Character(text) => text.eq_ignore_ascii_case(target),
        _ => false,
    }
}

struct App {
    window_attrs: WindowAttributes,
    window: Option<Arc<Window>>,
    window_id: Option<WindowId>,
    renderer: Option<Renderer>,
    scene: Option<Scene>,
    last_cursor: [f32; 2],
    frame_count: u32,
    last_fps_log: Instant,
}

impl App {
    fn new() -> Self {
        let attrs = Window::default_attributes()
            .with_title("Game of Life Backdrop")
            .with_inner_size(PhysicalSize::new(1280, 720));
        Self {
            window_attrs: attrs,
            window: None,
            window_id: None,
            renderer: None,
            scene: None,
            last_cursor: [0.0, 0.0],
            frame_count: 0,
            last_fps_log: Instant::now(),
        }
    }
}

impl ApplicationHandler<()> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let window = event_loop
            .create_window(self.window_attrs.clone())
            .expect("failed to create window");
        let window = Arc::new(window);
        let window_id = window.id();

        let scene = Scene::new(window.inner_size());
        let renderer = pollster::block_on(Renderer::new(window.clone(), scene.cell_count()))
            .expect("failed to create GPU state");
        window.request_redraw();

        self.window = Some(window);
        self.window_id = Some(window_id);
        self.renderer = Some(renderer);
        self.scene = Some(scene);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if Some(window_id) != self.window_id {
            return;
        }
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(size);
                }
                if let Some(scene) = self.scene.as_mut() {
                    scene.resize(size);
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::ScaleFactorChanged { mut inner_size_writer, .. } => {
                if let Some(renderer) = self.renderer.as_ref() {
                    let _ = inner_size_writer.request_inner_size(renderer.size);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.last_cursor = [position.x as f32, position.y as f32];
                if let Some(scene) = self.scene.as_mut() {
                    scene.cursor_position = Some(self.last_cursor);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left && state == ElementState::Released {
                    if let Some(scene) = self.scene.as_mut() {
                        scene.handle_click(self.last_cursor);
                    }
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed {
                    if let Some(scene) = self.scene.as_mut() {
                        if key_matches(&event, "R") {
                            scene.randomize();
                        } else if key_matches(&event, "C") {
                            scene.clear();
                        } else if key_matches(&event, "SPACE") {
                            scene.toggle_paused();
                        }
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                if let (Some(renderer), Some(scene)) = (self.renderer.as_mut(), self.scene.as_mut()) {
                    scene.update();
                    let (instances, ui_vertices) = scene.build_frame();
                    if let Err(err) = renderer.render(instances, ui_vertices) {
                        match err {
                            wgpu::SurfaceError::Lost => renderer.resize(renderer.size),
                            wgpu::SurfaceError::OutOfMemory => event_loop.exit(),
                            _ => {}
                        }
                    } else {
                        self.frame_count += 1;
                        let elapsed = self.last_fps_log.elapsed();
                        if elapsed >= Duration::from_secs(1) {
                            let fps = self.frame_count as f64 / elapsed.as_secs_f64();
                            log::info!("fps: {:.1}", fps);
                            self.frame_count = 0;
                            self.last_fps_log = Instant::now();
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
        event_loop.set_control_flow(ControlFlow::Poll);
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let event_loop = EventLoop::new()?;
    let mut app = App::new();
    event_loop.run_app(&mut app)?;
    Ok(())
}
