use std::io::Cursor;

use base64::Engine as _;

use super::*;
use crate::model::element::{Element, Geometry};
use crate::model::presentation::PresentationSettings;
use crate::model::slide::Slide;

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "slidecanvas_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn png(rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(2, 2, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn normalize_rel_path_strips_leading_slash_and_rejects_parents() {
    assert_eq!(normalize_rel_path("/img/./a.png").unwrap(), "img/a.png");
    assert_eq!(normalize_rel_path("img\\b.png").unwrap(), "img/b.png");
    assert!(normalize_rel_path("../secret.png").is_err());
    assert!(normalize_rel_path("/").is_err());
}

#[test]
fn prefetch_loads_files_and_records_missing() {
    let tmp = temp_dir("prefetch");
    std::fs::create_dir_all(tmp.join("img")).unwrap();
    std::fs::write(tmp.join("img/hero.png"), png([10, 20, 30, 255])).unwrap();

    let mut slide = Slide::empty("/slides/001.tsx");
    slide.background = Background::Image {
        src: "/img/hero.png".into(),
    };
    slide.elements.push(Element::image(
        Geometry::rect(0.0, 0.0, 10.0, 10.0),
        "/img/missing.png",
    ));
    let pres = Presentation::new(vec![slide], PresentationSettings::default());

    let mut store = AssetStore::new(tmp.clone());
    assert_eq!(store.prefetch(&pres), 1);
    let hero = store.get("/img/hero.png").unwrap();
    assert_eq!((hero.width, hero.height), (2, 2));
    assert_eq!(hero.format, ImageFormat::Png);
    assert!(store.missing_reason("/img/missing.png").is_some());

    // A second prefetch does not retry or duplicate.
    assert_eq!(store.prefetch(&pres), 1);
    let _ = std::fs::remove_dir_all(&tmp);
}

#[test]
fn data_uris_decode_and_share_hashes() {
    let bytes = png([255, 0, 0, 255]);
    let b64 = base64::engine::general_purpose::STANDARD.encode(&bytes);
    let uri = format!("data:image/png;base64,{b64}");

    let mut store = AssetStore::new(".");
    let a = store.ensure(&uri).unwrap().content_hash;
    let b = store.insert_bytes("copy.png", bytes).unwrap().content_hash;
    assert_eq!(a, b);

    assert!(store.ensure("data:text/plain,hello").is_none());
    assert!(store.ensure("https://example.com/a.png").is_none());
    assert_eq!(store.missing_count(), 2);
}

#[test]
fn svg_sources_are_rasterized_and_reencoded_for_embedding() {
    let svg = br##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><rect width="10" height="10" fill="#00ff00"/></svg>"##;
    let mut store = AssetStore::new(".");
    let img = store.insert_bytes("logo.svg", svg.to_vec()).unwrap();
    assert_eq!(img.format, ImageFormat::Svg);
    assert_eq!((img.width, img.height), (1024, 1024));
    let (bytes, ext) = img.embeddable().unwrap();
    assert_eq!(ext, "png");
    assert!(bytes.starts_with(b"\x89PNG"));
}
