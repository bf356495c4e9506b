//! Writes a synthetic OL single-cell table to `sample_data/` as Parquet and CSV.
//!
//! Three conditions (0.0, 0.5, 1.0), ages 1-4, with gaps and missing values
//! so every filtering rule of the viewer has something to act on.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    /// `Some(value)` except with probability `p_missing`.
    fn maybe(&mut self, p_missing: f64, value: f64) -> Option<f64> {
        (self.next_f64() >= p_missing).then_some(value)
    }
}

#[derive(Default)]
struct Columns {
    cell_id: Vec<String>,
    cell_age: Vec<i64>,
    cond: Vec<f64>,
    aberrant: Vec<Option<f64>>,
    no_sheaths: Vec<Option<f64>>,
    avg_sheath_len: Vec<Option<f64>>,
    total_output: Vec<Option<f64>>,
}

fn generate(rng: &mut SimpleRng) -> Columns {
    const CELLS_PER_CONDITION: usize = 14;
    let conditions = [("D", 0.0, 0.4), ("H", 0.5, 0.8), ("W", 1.0, 1.2)];

    let mut cols = Columns::default();
    for (prefix, cond, aberrant_rate) in conditions {
        for n in 1..=CELLS_PER_CONDITION {
            let cell_id = format!("{prefix}{n:02}");
            // Roughly one cell in five was lost before day 3.
            let last_age = if rng.next_f64() < 0.2 { 2 } else { 4 };
            let mut sheaths = rng.gauss(12.0, 3.0).max(2.0);
            let mut length = rng.gauss(22.0, 4.0).max(5.0);

            for age in 1..=last_age {
                sheaths = (sheaths + rng.gauss(2.0, 1.5)).max(1.0).round();
                length = (length + rng.gauss(1.5, 2.0)).max(3.0);
                let aberrant = (rng.gauss(aberrant_rate * age as f64 * 0.5, 0.8))
                    .round()
                    .clamp(0.0, 4.0);

                cols.cell_id.push(cell_id.clone());
                cols.cell_age.push(age);
                cols.cond.push(cond);
                cols.aberrant.push(rng.maybe(0.05, aberrant));
                cols.no_sheaths.push(rng.maybe(0.05, sheaths));
                cols.avg_sheath_len.push(rng.maybe(0.05, (length * 100.0).round() / 100.0));
                cols.total_output
                    .push(rng.maybe(0.05, (sheaths * length * 100.0).round() / 100.0));
            }
        }
    }
    cols
}

fn write_parquet(cols: &Columns, path: &Path) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("cell_ID", DataType::Utf8, false),
        Field::new("cell_age", DataType::Int64, false),
        Field::new("cond", DataType::Float64, false),
        Field::new("aberrant", DataType::Float64, true),
        Field::new("no_sheaths", DataType::Float64, true),
        Field::new("avg_sheath_len", DataType::Float64, true),
        Field::new("total_output", DataType::Float64, true),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(
                cols.cell_id.iter().map(String::as_str).collect::<Vec<_>>(),
            )),
            Arc::new(Int64Array::from(cols.cell_age.clone())),
            Arc::new(Float64Array::from(cols.cond.clone())),
            Arc::new(Float64Array::from(cols.aberrant.clone())),
            Arc::new(Float64Array::from(cols.no_sheaths.clone())),
            Arc::new(Float64Array::from(cols.avg_sheath_len.clone())),
            Arc::new(Float64Array::from(cols.total_output.clone())),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;
    Ok(())
}

fn write_csv(cols: &Columns, path: &Path) -> Result<()> {
    fn cell(v: Option<f64>) -> String {
        v.map(|v| v.to_string()).unwrap_or_default()
    }

    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    writer.write_record([
        "cell_ID",
        "cell_age",
        "cond",
        "aberrant",
        "no_sheaths",
        "avg_sheath_len",
        "total_output",
    ])?;
    for i in 0..cols.cell_id.len() {
        writer.write_record([
            cols.cell_id[i].clone(),
            cols.cell_age[i].to_string(),
            format!("{:.1}", cols.cond[i]),
            cell(cols.aberrant[i]),
            cell(cols.no_sheaths[i]),
            cell(cols.avg_sheath_len[i]),
            cell(cols.total_output[i]),
        ])?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let cols = generate(&mut rng);

    let out_dir = Path::new("sample_data");
    std::fs::create_dir_all(out_dir).context("creating sample_data/")?;
    let parquet_path = out_dir.join("ol_single_cell.parquet");
    let csv_path = out_dir.join("ol_single_cell.csv");

    write_parquet(&cols, &parquet_path)?;
    write_csv(&cols, &csv_path)?;

    println!(
        "Wrote {} observations to {} and {}",
        cols.cell_id.len(),
        parquet_path.display(),
        csv_path.display()
    );
    Ok(())
}
