use eframe::egui;
use eframe::egui::{ScrollArea, Ui};
use eframe::run_native;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use universe::grid::{Cell, Universe};

const GRID_WIDTH: usize = 160;
const GRID_HEIGHT: usize = GRID_WIDTH * 9 / 16;
const CELL_SIZE: f32 = 8.0;
const TICK_INTERVAL: Duration = Duration::from_millis(80);

/// Universe plus the bookkeeping the tick thread and the UI share.
struct Shared {
    universe: Universe,
    generation: u64,
    paused: bool,
}

fn main() {
    // Shared state wrapped in Arc<Mutex<T>>: the tick thread and the UI
    // thread both mutate the universe, so all access is serialized here
    let shared = Arc::new(Mutex::new(Shared {
        universe: Universe::new(GRID_WIDTH, GRID_HEIGHT).expect("backdrop dimensions are positive"),
        generation: 0,
        paused: false,
    }));

    run_native(
        "Life Backdrop",
        eframe::NativeOptions::default(),
        Box::new(|cc| {
            let ctx = cc.egui_ctx.clone();
            let shared_clone = Arc::clone(&shared);

            // Advance the universe off the UI thread, one generation per interval
            thread::spawn(move || loop {
                thread::sleep(TICK_INTERVAL);
                let mut shared = shared_clone.lock().unwrap();
                if shared.paused {
                    continue;
                }
                let changed = shared.universe.tick();
                shared.generation += 1;
                if changed {
                    ctx.request_repaint();
                }
            });

            Ok(Box::new(BackdropApp::new(cc, shared)))
        }),
    )
    .unwrap();
}

struct BackdropApp {
    shared: Arc<Mutex<Shared>>,
}

impl BackdropApp {
    fn new(_cc: &eframe::CreationContext<'_>, shared: Arc<Mutex<Shared>>) -> Self {
        Self { shared }
    }

    fn randomize(&mut self) {
        let mut shared = self.shared.lock().unwrap();
        shared.universe.randomize();
        shared.generation = 0;
    }

    fn clear(&mut self) {
        let mut shared = self.shared.lock().unwrap();
        shared.universe.clear();
        shared.generation = 0;
    }

    fn show_grid(&mut self, ui: &mut Ui) {
        let mut shared = self.shared.lock().unwrap();

        let (rect, response) = ui.allocate_exact_size(
            egui::vec2(
                CELL_SIZE * shared.universe.width() as f32,
                CELL_SIZE * shared.universe.height() as f32,
            ),
            egui::Sense::click(),
        );

        // A click lands on exactly one cell; flip it
        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                let col = ((pos.x - rect.min.x) / CELL_SIZE) as usize;
                let row = ((pos.y - rect.min.y) / CELL_SIZE) as usize;
                let _ = shared.universe.toggle_cell(row, col);
            }
        }

        // Draw each cell at its calculated position
        let painter = ui.painter();
        let width = shared.universe.width();
        for (row_index, row) in shared.universe.cells().chunks(width).enumerate() {
            for (col_index, cell) in row.iter().enumerate() {
                let pos = rect.min
                    + egui::vec2(col_index as f32 * CELL_SIZE, row_index as f32 * CELL_SIZE);

                let color = match cell {
                    Cell::Alive => egui::Color32::WHITE,
                    Cell::Dead => egui::Color32::DARK_GRAY,
                };

                painter.rect_filled(
                    egui::Rect::from_min_size(pos, egui::vec2(CELL_SIZE, CELL_SIZE)),
                    CELL_SIZE / 4f32,
                    color,
                );
            }
        }
    }
}

impl eframe::App for BackdropApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ScrollArea::both().show(ui, |ui| {
                ui.heading("Life Backdrop");
                ui.horizontal(|ui| {
                    if ui.button("Randomize").clicked() {
                        self.randomize();
                    }
                    if ui.button("Clear").clicked() {
                        self.clear();
                    }
                    let (paused, generation, population) = {
                        let shared = self.shared.lock().unwrap();
                        (shared.paused, shared.generation, shared.universe.population())
                    };
                    if ui.button(if paused { "Resume" } else { "Pause" }).clicked() {
                        self.shared.lock().unwrap().paused = !paused;
                    }
                    ui.label(format!("gen {generation}, {population} alive"));
                });

                self.show_grid(ui);
            });
        });
    }
}
