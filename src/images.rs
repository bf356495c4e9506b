use std::path::PathBuf;

use crate::chart::spec::ImagePanelSpec;

/// Imaging days shown in the drill-down.
pub const DAYS: [u8; 3] = [1, 2, 3];

/// Maps a cell and imaging day to its max-projection JPEG.
#[derive(Debug, Clone)]
pub struct ImageResolver {
    dir: PathBuf,
}

impl ImageResolver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ImageResolver { dir: dir.into() }
    }

    /// `<dir>/MAX_<cell_id>_d<day>.jpg`
    pub fn path_for(&self, cell_id: &str, day: u8) -> PathBuf {
        self.dir.join(format!("MAX_{cell_id}_d{day}.jpg"))
    }

    /// Image panel for one day, or a "not found" placeholder.
    pub fn panel(&self, cell_id: &str, day: u8) -> ImagePanelSpec {
        let path = self.path_for(cell_id, day);
        if DAYS.contains(&day) && path.is_file() {
            ImagePanelSpec::Image {
                title: format!("Cell ID: {cell_id} Day {day}"),
                path,
            }
        } else {
            log::debug!("no image at {}", path.display());
            ImagePanelSpec::Placeholder {
                title: format!("Image for day {day} not found"),
            }
        }
    }

    pub fn panels(&self, cell_id: &str) -> [ImagePanelSpec; 3] {
        DAYS.map(|day| self.panel(cell_id, day))
    }
}
