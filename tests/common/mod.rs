#![allow(dead_code)]

use std::fs;
use std::path::Path;

use image::{ImageBuffer, Luma, Rgb};

pub const TABLE_HEADER: &str = "imageFilename,x(column),y(row),width,height";

fn ensure_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
}

pub fn write_png(path: &Path, width: u32, height: u32) {
    ensure_parent(path);
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
        ImageBuffer::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 0]));
    img.save(path).expect("write png file");
}

/// Single-channel 16-bit TIFF, the shape raw thermal frames come in.
pub fn write_thermal_tiff(path: &Path, width: u32, height: u32) {
    ensure_parent(path);
    let img: ImageBuffer<Luma<u16>, Vec<u16>> =
        ImageBuffer::from_fn(width, height, |x, y| Luma([(x * 31 + y * 7) as u16]));
    img.save(path).expect("write tiff file");
}

/// Writes `Bounding Box Label.csv` with the given data rows.
pub fn write_table(data_dir: &Path, rows: &[&str]) {
    fs::create_dir_all(data_dir).expect("create data dir");
    let mut csv = String::from(TABLE_HEADER);
    csv.push('\n');
    for row in rows {
        csv.push_str(row);
        csv.push('\n');
    }
    fs::write(data_dir.join("Bounding Box Label.csv"), csv).expect("write table");
}

/// Creates `Positive/` and `Negative/` with `positive` and `negative` small
/// PNG frames named `pos_NNN.png` / `neg_NNN.png`.
pub fn write_pools(data_dir: &Path, positive: usize, negative: usize) {
    fs::create_dir_all(data_dir.join("Positive")).expect("create positive");
    fs::create_dir_all(data_dir.join("Negative")).expect("create negative");
    for i in 0..positive {
        write_png(&data_dir.join(format!("Positive/pos_{i:03}.png")), 8, 6);
    }
    for i in 0..negative {
        write_png(&data_dir.join(format!("Negative/neg_{i:03}.png")), 8, 6);
    }
}

/// Sorted file names directly inside `dir`.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("read dir")
        .map(|entry| {
            entry
                .expect("dir entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}

/// Strips the extension from each name.
pub fn stems(names: &[String]) -> Vec<String> {
    names
        .iter()
        .map(|name| match name.rfind('.') {
            Some(idx) => name[..idx].to_string(),
            None => name.clone(),
        })
        .collect()
}
