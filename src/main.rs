mod aqi;
mod colors;
mod config;
mod geocode;
mod map;
mod notifications;
mod session;

use clap::Parser;
use eframe::egui;
use log::{error, info, warn};
use std::sync::{Arc, Mutex};

use aqi::AqiClient;
use config::AppConfig;
use geocode::{GeocodeClient, Place, SearchError};
use map::MapController;
use notifications::NotificationCenter;
use session::SessionGate;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Desktop air quality map with live station readings and place search
#[derive(Debug, Parser)]
#[command(name = "airaware-desktop", version)]
struct Args {
    /// API token for the air-quality service (session only, not persisted)
    #[arg(long)]
    token: Option<String>,

    /// Enable debug logging
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> Result<(), eframe::Error> {
    let args = Args::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .init();

    info!("Starting AirAware Desktop...");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 800.0])
            .with_title("AirAware Desktop"),
        ..Default::default()
    };

    eframe::run_native(
        "AirAware Desktop",
        options,
        Box::new(move |_cc| Ok(Box::new(AirAwareApp::new(args)))),
    )
}

/// Mailbox filled by the background geocoding thread
type SearchSlot = Arc<Mutex<Option<Result<Vec<Place>, SearchError>>>>;

/// Search input state and its in-flight request mailbox
#[derive(Debug, Default)]
struct SearchState {
    query: String,
    candidates: Vec<Place>,
    slot: SearchSlot,
    in_flight: bool,
}

#[derive(Debug)]
struct AirAwareApp {
    config: AppConfig,
    gate: SessionGate,
    controller: Option<MapController>,

    /// Raw token text bound to the credential form
    token_entry: String,

    /// Whether a successful unlock should persist the token
    persist_token: bool,

    geocoder: GeocodeClient,
    search: SearchState,
    notifications: NotificationCenter,
}

impl AirAwareApp {
    fn new(args: Args) -> Self {
        let config = AppConfig::load().unwrap_or_else(|e| {
            warn!("Failed to load config, using defaults: {e}");
            AppConfig::default()
        });

        // CLI token overrides the persisted one for this session only
        let (token_entry, persist_token) = match args.token {
            Some(token) => (token, false),
            None => (config.api_token.clone().unwrap_or_default(), true),
        };

        Self {
            config,
            gate: SessionGate::new(),
            controller: None,
            token_entry,
            persist_token,
            geocoder: GeocodeClient::new(),
            search: SearchState::default(),
            notifications: NotificationCenter::new(),
        }
    }

    /// Validate the entered token and, on success, build the map controller.
    fn try_unlock(&mut self, ctx: &egui::Context) {
        self.gate.set_credential(self.token_entry.clone());
        if let Err(e) = self.gate.unlock() {
            self.notifications.error(e.to_string());
            return;
        }

        if self.persist_token {
            self.config.api_token = Some(self.gate.credential().trim().to_owned());
            if let Err(e) = self.config.save() {
                warn!("Failed to persist token: {e}");
            }
        }

        let mut controller = MapController::new(self.gate.credential(), AqiClient::new());
        match controller.initialize(&self.config, ctx) {
            Ok(()) => self.controller = Some(controller),
            Err(e) => {
                // No partially-built map is retained; back to the gate
                error!("Map initialization failed: {e}");
                self.notifications.error(e.to_string());
                self.gate.lock();
            }
        }
    }

    /// Tear the map down, remember where it was, and close the gate.
    fn sign_out(&mut self) {
        if let Some(mut controller) = self.controller.take() {
            if let Some((lat, lon)) = controller.center() {
                self.config.last_center_lat = Some(lat);
                self.config.last_center_lon = Some(lon);
                if let Err(e) = self.config.save() {
                    warn!("Failed to save map position: {e}");
                }
            }
            controller.destroy();
        }
        self.gate.lock();
        self.search = SearchState::default();
    }

    /// Kick off a geocoding request on a background thread.
    ///
    /// A blank query clears the candidate list without a network call.
    fn submit_search(&mut self, ctx: &egui::Context) {
        if self.search.query.trim().is_empty() {
            self.search.candidates.clear();
            return;
        }
        if self.search.in_flight {
            return;
        }
        self.search.in_flight = true;

        let geocoder = self.geocoder.clone();
        let query = self.search.query.clone();
        let slot = Arc::clone(&self.search.slot);
        let ctx = ctx.clone();

        std::thread::spawn(move || {
            let result = geocoder.search(&query);
            if let Ok(mut slot) = slot.lock() {
                *slot = Some(result);
            }
            ctx.request_repaint();
        });
    }

    /// Apply a completed geocoding request, if one arrived.
    fn poll_search(&mut self) {
        let completed = match self.search.slot.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        };
        let Some(result) = completed else {
            return;
        };

        self.search.in_flight = false;
        match result {
            Ok(candidates) => {
                info!("Search returned {} candidates", candidates.len());
                self.search.candidates = candidates;
            }
            Err(e) => {
                error!("{e}");
                self.search.candidates.clear();
                self.notifications.error(e.to_string());
            }
        }
    }

    fn draw_credential_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(ui.available_height() * 0.3);
                ui.heading("AirAware Desktop");
                ui.label("Enter your air-quality API token to load the map");
                ui.add_space(12.0);

                let field = ui.add(
                    egui::TextEdit::singleline(&mut self.token_entry)
                        .hint_text("API token")
                        .desired_width(280.0),
                );

                ui.add_space(8.0);
                let unlock_clicked = ui.button("Unlock map").clicked();
                let enter_pressed =
                    field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

                if unlock_clicked || enter_pressed {
                    self.try_unlock(ctx);
                }
            });
        });
    }

    fn draw_search_window(&mut self, ctx: &egui::Context) {
        let mut selected: Option<Place> = None;
        let mut signed_out = false;

        egui::Window::new("Search")
            .anchor(egui::Align2::LEFT_TOP, egui::vec2(10.0, 10.0))
            .resizable(false)
            .collapsible(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let field = ui.add(
                        egui::TextEdit::singleline(&mut self.search.query)
                            .hint_text("Find a place...")
                            .desired_width(220.0),
                    );
                    let submitted = ui.button("Search").clicked()
                        || (field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)));
                    if submitted {
                        self.submit_search(ctx);
                    }
                    if ui.button("Sign out").clicked() {
                        signed_out = true;
                    }
                });

                if self.search.in_flight {
                    ui.label(
                        egui::RichText::new("Searching...")
                            .color(egui::Color32::from_rgb(150, 150, 150))
                            .size(10.0),
                    );
                }

                for place in &self.search.candidates {
                    if ui
                        .selectable_label(false, place.display_name.as_str())
                        .clicked()
                    {
                        selected = Some(place.clone());
                    }
                }
            });

        if signed_out {
            self.sign_out();
            return;
        }

        if let Some(place) = selected {
            // Selection closes the dropdown and refreshes the focused area
            self.search.candidates.clear();
            if let Some(controller) = self.controller.as_mut() {
                controller.select_location(&place, ctx, &mut self.notifications);
            }
        }
    }
}

impl eframe::App for AirAwareApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.notifications.prune();
        self.poll_search();
        if let Some(controller) = self.controller.as_mut() {
            controller.poll(&mut self.notifications);
        }

        if self.gate.is_unlocked() {
            egui::CentralPanel::default()
                .frame(egui::Frame::NONE)
                .show(ctx, |ui| {
                    if let Some(controller) = self.controller.as_mut() {
                        controller.draw(ui);
                    }
                });
            self.draw_search_window(ctx);
        } else {
            self.draw_credential_panel(ctx);
        }

        self.notifications.draw(ctx);
    }
}
