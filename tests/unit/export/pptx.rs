use std::io::{Cursor, Read};

use super::*;
use crate::foundation::core::{Affine, Rect, Rgba8};
use crate::model::element::{
    ClipRegion, CornerRadius, Element, ElementKind, FlexDirection, FlexboxTextGroup, Geometry,
    ObjectFit, ShapeElement, ShapeKind, TextStyle,
};
use crate::model::presentation::PresentationSettings;
use crate::model::slide::Slide;

fn png(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([20, 120, 220, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn titled(n: usize) -> Slide {
    let mut s = Slide::empty(format!("/slides/{n:03}.tsx"));
    s.elements.push(Element::text(
        Geometry::rect(100.0, 80.0, 1200.0, 100.0),
        format!("Slide {n}"),
        TextStyle::default(),
    ));
    s
}

fn package(slides: Vec<Slide>, assets: &AssetStore) -> zip::ZipArchive<Cursor<Vec<u8>>> {
    let pres = Presentation::new(slides, PresentationSettings::default());
    let bytes = PptxExporter.export(&pres, assets).unwrap();
    zip::ZipArchive::new(Cursor::new(bytes)).unwrap()
}

fn part(zip: &mut zip::ZipArchive<Cursor<Vec<u8>>>, name: &str) -> String {
    let mut out = String::new();
    zip.by_name(name).unwrap().read_to_string(&mut out).unwrap();
    out
}

#[test]
fn slides_are_written_in_model_order() {
    let mut zip = package(
        vec![titled(1), titled(2), titled(3)],
        &AssetStore::default(),
    );
    for name in [
        "[Content_Types].xml",
        "_rels/.rels",
        "ppt/presentation.xml",
        "ppt/slideMasters/slideMaster1.xml",
        "ppt/slideLayouts/slideLayout1.xml",
        "ppt/theme/theme1.xml",
    ] {
        assert!(zip.by_name(name).is_ok(), "missing {name}");
    }

    let pres = part(&mut zip, "ppt/presentation.xml");
    assert_eq!(pres.matches("<p:sldId ").count(), 3);
    assert!(pres.contains(r#"<p:sldSz cx="18288000" cy="10287000"/>"#));

    for n in 1..=3 {
        let slide = part(&mut zip, &format!("ppt/slides/slide{n}.xml"));
        assert!(slide.contains(&format!("<a:t>Slide {n}</a:t>")));
    }
}

#[test]
fn shapes_map_to_preset_geometry_in_emu() {
    let mut s = Slide::empty("/slides/001.tsx");
    s.elements.push(Element::rect(
        Geometry::rect(100.0, 100.0, 400.0, 200.0),
        Rgba8::rgb(0x1e, 0x40, 0xaf),
        CornerRadius::uniform(20.0),
    ));
    let mut ellipse = Element::new(
        Geometry::rect(600.0, 100.0, 200.0, 200.0),
        ElementKind::Shape(ShapeElement {
            shape: ShapeKind::Ellipse,
            fill: Rgba8::rgb(0xef, 0x44, 0x44),
            stroke: None,
        }),
    );
    ellipse.geometry.rotation_deg = 90.0;
    s.elements.push(ellipse);

    let mut zip = package(vec![s], &AssetStore::default());
    let xml = part(&mut zip, "ppt/slides/slide1.xml");

    assert!(xml.contains(r#"<a:prstGeom prst="roundRect"><a:avLst><a:gd name="adj" fmla="val 10000"/>"#));
    assert!(xml.contains(r#"<a:off x="952500" y="952500"/><a:ext cx="3810000" cy="1905000"/>"#));
    assert!(xml.contains(r#"<a:srgbClr val="1E40AF"/>"#));
    assert!(xml.contains(r#"prst="ellipse""#));
    assert!(xml.contains(r#"<a:xfrm rot="5400000">"#));
}

#[test]
fn text_is_escaped_and_sized_in_points() {
    let mut s = Slide::empty("/slides/001.tsx");
    let style = TextStyle {
        font_size: 32.0,
        bold: true,
        ..TextStyle::default()
    };
    s.elements.push(Element::text(
        Geometry::rect(0.0, 0.0, 800.0, 100.0),
        "R&D <2026>\nsecond",
        style,
    ));
    let mut zip = package(vec![s], &AssetStore::default());
    let xml = part(&mut zip, "ppt/slides/slide1.xml");

    assert!(xml.contains(r#"txBox="1""#));
    assert!(xml.contains("<a:t>R&amp;D &lt;2026&gt;</a:t>"));
    assert!(xml.contains("<a:t>second</a:t>"));
    assert!(xml.contains(r#"sz="2400" b="1""#));
}

#[test]
fn media_is_stored_once_per_content_hash() {
    let mut assets = AssetStore::default();
    assets.insert_bytes("a.png", png(8, 8)).unwrap();
    assets.insert_bytes("copy-of-a.png", png(8, 8)).unwrap();

    let slides = (1..=2)
        .map(|n| {
            let mut s = titled(n);
            s.elements.push(Element::image(
                Geometry::rect(0.0, 200.0, 300.0, 300.0),
                "a.png",
            ));
            s.elements.push(Element::image(
                Geometry::rect(400.0, 200.0, 300.0, 300.0),
                "copy-of-a.png",
            ));
            s
        })
        .collect();
    let mut zip = package(slides, &assets);

    let media: Vec<String> = zip
        .file_names()
        .filter(|n| n.starts_with("ppt/media/"))
        .map(str::to_owned)
        .collect();
    assert_eq!(media, vec!["ppt/media/image1.png".to_owned()]);

    let rels = part(&mut zip, "ppt/slides/_rels/slide2.xml.rels");
    assert_eq!(rels.matches("../media/image1.png").count(), 1);
    let xml = part(&mut zip, "ppt/slides/slide2.xml");
    assert_eq!(xml.matches(r#"r:embed="rId2""#).count(), 2);

    let types = part(&mut zip, "[Content_Types].xml");
    assert!(types.contains(r#"<Default Extension="png" ContentType="image/png"/>"#));
}

#[test]
fn clip_becomes_source_rect_and_placement() {
    let g = Geometry::rect(200.0, 100.0, 400.0, 200.0);
    let clip = ClipRegion::covering(200.0, 200.0);
    let local = shapes::local_clip(Some(&clip), Affine::IDENTITY, &g);
    assert_eq!(local, Rect::new(0.0, 0.0, 200.0, 200.0));
    assert_eq!(
        shapes::source_rect(ObjectFit::Fill, &g, local, 40, 20),
        [0, 0, 50_000, 0]
    );

    // Cover on a square image shows its middle half vertically.
    let full = Rect::new(0.0, 0.0, 400.0, 200.0);
    assert_eq!(
        shapes::source_rect(ObjectFit::Cover, &g, full, 100, 100),
        [0, 25_000, 0, 25_000]
    );

    let mut assets = AssetStore::default();
    assets.insert_bytes("photo.png", png(40, 20)).unwrap();
    let mut s = Slide::empty("/slides/001.tsx");
    let mut img = Element::image(g, "photo.png");
    img.clip = Some(clip);
    s.elements.push(img);
    let mut zip = package(vec![s], &assets);
    let xml = part(&mut zip, "ppt/slides/slide1.xml");
    assert!(xml.contains(r#"<a:srcRect l="0" t="0" r="50000" b="0"/>"#));
    assert!(xml.contains(r#"<a:off x="1905000" y="952500"/><a:ext cx="1905000" cy="1905000"/>"#));
}

#[test]
fn crop_on_scaled_image_maps_to_local_box() {
    let g = Geometry {
        scale_x: 2.0,
        scale_y: 2.0,
        ..Geometry::rect(100.0, 100.0, 100.0, 100.0)
    };
    let clip = ClipRegion {
        left: 20.0,
        top: 20.0,
        ..ClipRegion::covering(160.0, 160.0)
    };
    let local = shapes::local_clip(Some(&clip), Affine::IDENTITY, &g);
    assert_eq!(local, Rect::new(10.0, 10.0, 90.0, 90.0));
    assert_eq!(
        shapes::source_rect(ObjectFit::Fill, &g, local, 100, 100),
        [10_000, 10_000, 10_000, 10_000]
    );
}

#[test]
fn missing_images_become_placeholder_rectangles() {
    let mut s = Slide::empty("/slides/001.tsx");
    s.elements.push(Element::image(
        Geometry::rect(0.0, 0.0, 100.0, 100.0),
        "nowhere.png",
    ));
    let mut zip = package(vec![s], &AssetStore::default());
    let xml = part(&mut zip, "ppt/slides/slide1.xml");
    assert!(!xml.contains("<p:pic>"));
    assert!(xml.contains(r#"<a:srgbClr val="E2E8F0"/>"#));
}

#[test]
fn flexbox_groups_become_group_shapes() {
    let group = FlexboxTextGroup {
        children: vec![
            Element::rect(
                Geometry::rect(-200.0, -100.0, 400.0, 200.0),
                Rgba8::WHITE,
                CornerRadius::default(),
            ),
            Element::text(Geometry::rect(-180.0, -80.0, 360.0, 40.0), "one", TextStyle::default()),
            Element::text(Geometry::rect(-180.0, -30.0, 360.0, 40.0), "two", TextStyle::default()),
        ],
        direction: FlexDirection::Column,
        gap: 10.0,
        padding: 20.0,
    };
    let mut s = Slide::empty("/slides/001.tsx");
    s.elements.push(Element::new(
        Geometry::rect(100.0, 100.0, 400.0, 200.0),
        ElementKind::FlexboxTextGroup(group),
    ));
    let mut zip = package(vec![s], &AssetStore::default());
    let xml = part(&mut zip, "ppt/slides/slide1.xml");

    assert!(xml.contains("<p:grpSp>"));
    assert!(xml.contains(r#"<a:chOff x="-1905000" y="-952500"/><a:chExt cx="3810000" cy="1905000"/>"#));
    let one = xml.find("<a:t>one</a:t>").unwrap();
    let two = xml.find("<a:t>two</a:t>").unwrap();
    assert!(one < two);
}

#[test]
fn empty_presentation_is_an_export_error() {
    let pres = Presentation::new(Vec::new(), PresentationSettings::default());
    let err = PptxExporter.export(&pres, &AssetStore::default()).unwrap_err();
    assert!(err.to_string().starts_with("pptx export failed"));
}
