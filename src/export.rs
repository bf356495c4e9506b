use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::data::metrics::ConditionSelection;
use crate::dispatch::Dispatcher;

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .with_context(|| format!("writing {}", path.display()))
}

/// Write every chart the dashboards can show without a click:
/// both heatmaps and the metric charts for each dropdown choice.
pub fn export_all(dispatcher: &Dispatcher, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut written = Vec::new();
    let [dmso, win] = dispatcher.heatmaps();
    for (name, chart) in [("heatmap_dmso.json", dmso), ("heatmap_win.json", win)] {
        let path = dir.join(name);
        write_json(&path, &chart)?;
        written.push(path);
    }

    for selection in ConditionSelection::ALL {
        let path = dir.join(format!("metrics_{selection}.json"));
        write_json(&path, &dispatcher.metrics(selection))?;
        written.push(path);
    }

    log::info!("exported {} chart files to {}", written.len(), dir.display());
    Ok(written)
}
