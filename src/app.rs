use eframe::egui;

use crate::state::{AppState, Dashboard};
use crate::ui::panels;

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct MyelinApp {
    pub state: AppState,
}

impl MyelinApp {
    pub fn new(cc: &eframe::CreationContext<'_>, state: AppState) -> Self {
        // Charts are styled for a white background.
        cc.egui_ctx.set_visuals(egui::Visuals::light());
        // Install image loaders so egui can render png/jpg/etc.
        egui_extras::install_image_loaders(&cc.egui_ctx);
        Self { state }
    }
}

impl eframe::App for MyelinApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: dashboard switcher ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Central panel: active dashboard ----
        egui::CentralPanel::default().show(ctx, |ui| match self.state.dashboard {
            Dashboard::Ensheathments => panels::ensheathments(ui, &mut self.state),
            Dashboard::SheathAnalysis => panels::sheath_analysis(ui, &mut self.state),
        });
    }
}
