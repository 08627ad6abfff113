//! Shared fixture helpers for integration tests.
//!
//! Fixtures are generated programmatically: raster images through the
//! image codec, PDFs through lopdf.

#![allow(dead_code)]

use image::{Rgb, RgbImage};
use lopdf::{Document, Object, dictionary};
use std::fs;
use std::path::{Path, PathBuf};

/// Write a small checkerboard PNG.
pub fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }

    let img = RgbImage::from_fn(width, height, |x, y| {
        if (x + y) % 2 == 0 {
            Rgb([220, 30, 30])
        } else {
            Rgb([30, 30, 220])
        }
    });
    img.save(&path).unwrap();
    path
}

/// Write a file that claims to be an image but is not.
pub fn write_garbage(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, b"not an image at all").unwrap();
    path
}

/// Build a minimal valid PDF with the given number of pages and a
/// distinctive page width, and save it to disk.
pub fn write_pdf(dir: &Path, name: &str, pages: usize, width: i64) -> PathBuf {
    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();

    let mut page_ids = Vec::new();
    for _ in 0..pages {
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), 792.into()],
        });
        page_ids.push(page_id);
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.into_iter().map(Object::Reference).collect::<Vec<Object>>(),
            "Count" => pages as i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let path = dir.join(name);
    doc.save(&path).unwrap();
    path
}

/// Width of the MediaBox of each page, in page order.
pub fn page_widths(path: &Path) -> Vec<i64> {
    let doc = Document::load(path).unwrap();
    doc.get_pages()
        .into_values()
        .map(|page_id| {
            let Ok(Object::Dictionary(dict)) = doc.get_object(page_id) else {
                panic!("page is not a dictionary");
            };
            let Ok(Object::Array(mediabox)) = dict.get(b"MediaBox") else {
                panic!("page has no MediaBox");
            };
            mediabox[2].as_i64().unwrap()
        })
        .collect()
}
