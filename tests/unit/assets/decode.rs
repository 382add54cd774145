use std::io::Cursor;

use super::*;

pub(crate) fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_image_png_dimensions_and_premul() {
    let prepared = decode_image(&png_bytes(1, 1, [100, 50, 200, 128])).unwrap();
    assert_eq!(prepared.width, 1);
    assert_eq!(prepared.height, 1);
    assert_eq!(
        prepared.rgba8_premul.as_slice(),
        &[
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn decode_rejects_garbage() {
    assert!(decode_image(b"not an image").is_err());
}

#[test]
fn svg_parse_ok_and_err() {
    let ok = br#"<svg xmlns="http://www.w3.org/2000/svg" width="1" height="1"></svg>"#;
    parse_svg(ok).unwrap();
    assert!(parse_svg(br#"<svg"#).is_err());
}

#[test]
fn svg_rasterizes_at_legible_size() {
    let svg = br##"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="10"><rect width="20" height="10" fill="#ff0000"/></svg>"##;
    let tree = parse_svg(svg).unwrap();
    let img = rasterize_svg(&tree).unwrap();
    assert_eq!((img.width, img.height), (1024, 512));
    let mid = ((256 * img.width + 512) * 4) as usize;
    assert_eq!(&img.rgba8_premul[mid..mid + 4], &[255, 0, 0, 255]);
}

#[test]
fn png_encoding_restores_straight_alpha() {
    let premul = vec![64u8, 0, 0, 128];
    let png = encode_png(1, 1, &premul).unwrap();
    let back = image::load_from_memory(&png).unwrap().to_rgba8();
    let px = back.get_pixel(0, 0).0;
    assert_eq!(px[3], 128);
    assert!((i16::from(px[0]) - 128).abs() <= 1);
}
