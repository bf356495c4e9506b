use eframe::egui::{self, Ui};

use super::plot::placeholder;
use crate::chart::spec::ImagePanelSpec;

const IMAGE_HEIGHT: f32 = 360.0;

/// Draw one drill-down image slot. Decoding is left to the egui_extras
/// loaders installed at startup.
pub fn image_panel(ui: &mut Ui, spec: &ImagePanelSpec) {
    match spec {
        ImagePanelSpec::Image { title, path } => {
            ui.strong(title);
            let uri = format!("file://{}", path.display());
            ui.add(
                egui::Image::new(uri)
                    .max_width(ui.available_width())
                    .max_height(IMAGE_HEIGHT)
                    .maintain_aspect_ratio(true),
            );
        }
        ImagePanelSpec::Placeholder { title } => placeholder(ui, title, IMAGE_HEIGHT),
    }
}
