use super::*;
use crate::model::element::{ObjectFit, TextAlign};
use crate::parse::parser::parse_markup;

fn lower(src: &str) -> (Slide, Vec<ParseDiagnostic>) {
    let nodes = parse_markup(src).unwrap();
    lower_markup(
        "/slides/001.tsx",
        &nodes,
        CanvasSize::default(),
        TextStyle::default(),
    )
}

fn text_of(e: &Element) -> &TextElement {
    match &e.kind {
        ElementKind::Text(t) => t,
        other => panic!("expected text, got {}", other.name()),
    }
}

#[test]
fn absolute_elements_keep_their_explicit_boxes() {
    let (slide, diags) = lower(
        r#"
        <div className="relative w-full h-full bg-[#0f172a]">
          <h1 className="absolute left-[100px] top-[80px] w-[800px] text-[64px] text-white">Quarterly Review</h1>
          <img className="absolute left-[1000px] top-[200px] w-[600px] h-[400px] rounded-[24px] object-cover" src="/hero.png" alt="hero" />
          <div className="absolute left-[100px] top-[500px] w-[200px] h-[200px] bg-[#f97316] rounded-full" />
        </div>"#,
    );
    assert!(diags.is_empty(), "{diags:?}");
    assert_eq!(
        slide.background,
        Background::Color {
            color: Rgba8::rgb(0x0f, 0x17, 0x2a)
        }
    );
    assert_eq!(slide.elements.len(), 3);

    let title = &slide.elements[0];
    assert_eq!((title.geometry.x, title.geometry.y), (100.0, 80.0));
    assert_eq!(title.geometry.width, 800.0);
    assert!(title.geometry.height > 0.0);
    let t = text_of(title);
    assert_eq!(t.content, "Quarterly Review");
    assert_eq!(t.source, TextSource::Literal);
    assert_eq!(t.style.font_size, 64.0);
    assert!(t.style.bold);
    assert_eq!(t.style.color, Rgba8::WHITE);

    let img = &slide.elements[1];
    assert_eq!(img.geometry, Geometry::rect(1000.0, 200.0, 600.0, 400.0));
    let ElementKind::Image(i) = &img.kind else {
        panic!("expected image");
    };
    assert_eq!(i.src, "/hero.png");
    assert_eq!(i.alt, "hero");
    assert_eq!(i.fit, ObjectFit::Cover);
    let clip = img.clip.unwrap();
    assert_eq!((clip.rx, clip.ry), (24.0, 24.0));
    assert_eq!((clip.width, clip.height), (600.0, 400.0));
    assert!(!clip.absolute_positioned);

    let dot = &slide.elements[2];
    assert_eq!(dot.geometry, Geometry::rect(100.0, 500.0, 200.0, 200.0));
    assert_eq!(dot.kind.name(), "ellipse");
}

#[test]
fn flex_list_of_text_becomes_group() {
    let (slide, _) = lower(
        r#"
        <div className="absolute inset-0">
          <ul className="absolute left-[200px] top-[300px] w-[600px] h-[400px] flex flex-col gap-4 p-6 bg-slate-800">
            <li>First point</li>
            <li>Second point</li>
            <li>Third point</li>
          </ul>
        </div>"#,
    );
    assert_eq!(slide.elements.len(), 1);
    let group_el = &slide.elements[0];
    assert_eq!(group_el.geometry, Geometry::rect(200.0, 300.0, 600.0, 400.0));
    let group = group_el.group().unwrap();
    assert_eq!(group.children.len(), 4);
    assert_eq!(group.direction, FlexDirection::Column);
    assert_eq!(group.gap, 16.0);
    assert_eq!(group.padding, 24.0);

    let bg = group.background().unwrap();
    assert_eq!(bg.geometry, Geometry::rect(-300.0, -200.0, 600.0, 400.0));
    assert_eq!(bg.kind.name(), "rect");

    let texts = group.text_children();
    assert_eq!(text_of(&texts[0]).content, "First point");
    assert_eq!(text_of(&texts[2]).content, "Third point");
    assert_eq!((texts[0].geometry.x, texts[0].geometry.y), (-276.0, -176.0));
    assert_eq!(texts[0].geometry.width, 552.0);
    let second_y = texts[0].geometry.y + texts[0].geometry.height + 16.0;
    assert!((texts[1].geometry.y - second_y).abs() < 1e-3);

    // Layout and reflow agree, so a later reorder does not jump.
    let mut reflowed = group.clone();
    reflowed.reflow();
    for (a, b) in reflowed.children.iter().zip(&group.children) {
        assert!((a.geometry.x - b.geometry.x).abs() < 1e-3);
        assert!((a.geometry.y - b.geometry.y).abs() < 1e-3);
    }
}

#[test]
fn centered_group_survives_a_move_and_its_inverse() {
    let (slide, _) = lower(
        r#"
        <div className="absolute inset-0">
          <div className="absolute left-[200px] top-[300px] w-[600px] h-[400px] flex flex-col items-center justify-center gap-4 p-6 bg-slate-800">
            <h2>Done</h2>
            <p>A much longer second line of text</p>
            <p>Third</p>
          </div>
        </div>"#,
    );
    let mut group = slide.elements[0].group().unwrap().clone();
    let before: Vec<(f64, f64)> = group
        .text_children()
        .iter()
        .map(|c| (c.geometry.x, c.geometry.y))
        .collect();
    assert!(before[0].1 > -176.0 + 1.0);

    let moved = group.children.remove(1);
    group.children.insert(3, moved);
    group.reflow();
    assert!((group.text_children()[0].geometry.y - before[0].1).abs() < 1e-3);
    let moved = group.children.remove(3);
    group.children.insert(1, moved);
    group.reflow();

    for (c, (x, y)) in group.text_children().iter().zip(&before) {
        assert!((c.geometry.x - x).abs() < 1e-3);
        assert!((c.geometry.y - y).abs() < 1e-3);
    }
}

#[test]
fn unknown_components_and_expressions_pass_through_literally() {
    let (slide, diags) = lower(
        r#"
        <div>
          <Chart data={rows} />
          <p>Revenue: {total}</p>
        </div>"#,
    );
    assert_eq!(slide.elements.len(), 2);

    let chart = text_of(&slide.elements[0]);
    assert_eq!(chart.content, "<Chart />");
    assert_eq!(chart.source, TextSource::Opaque);

    let revenue = text_of(&slide.elements[1]);
    assert_eq!(revenue.content, "Revenue: {total}");
    assert_eq!(revenue.source, TextSource::Opaque);

    assert!(diags.iter().any(|d| matches!(
        d,
        ParseDiagnostic::Unsupported { construct, .. } if construct == "<Chart>"
    )));
}

#[test]
fn two_column_root_splits_the_canvas() {
    let (slide, _) = lower(
        r#"
        <div className="grid grid-cols-2 gap-8 p-16">
          <div><h2>Left</h2></div>
          <div><h2>Right</h2></div>
        </div>"#,
    );
    assert_eq!(slide.layout, LayoutHint::TwoColumn);
    assert_eq!(slide.elements.len(), 2);
    assert_eq!(slide.elements[0].geometry.x, 64.0);
    assert_eq!(slide.elements[1].geometry.x, 976.0);
    assert_eq!(text_of(&slide.elements[1]).style.font_size, 36.0);
}

#[test]
fn centered_root_centers_content() {
    let (slide, _) = lower(
        r#"<div className="flex items-center justify-center bg-white"><h1>Hi there</h1></div>"#,
    );
    assert_eq!(slide.layout, LayoutHint::Centered);
    let g = slide.elements[0].geometry;
    assert!((g.x + g.width / 2.0 - 960.0).abs() < 1.0);
    assert!((g.y + g.height / 2.0 - 540.0).abs() < 1.0);
}

#[test]
fn transform_tokens_scale_about_the_center() {
    let (slide, _) = lower(
        r#"<div><div className="absolute left-[100px] top-[100px] w-[200px] h-[100px] bg-red-500 scale-50 rotate-45 opacity-50" /></div>"#,
    );
    let el = &slide.elements[0];
    assert_eq!(el.kind.name(), "rect");
    assert_eq!(el.geometry.x, 150.0);
    assert_eq!(el.geometry.y, 125.0);
    assert_eq!((el.geometry.scale_x, el.geometry.scale_y), (0.5, 0.5));
    assert_eq!(el.geometry.rotation_deg, 45.0);
    assert_eq!(el.opacity, 0.5);
}

#[test]
fn headings_inherit_container_color() {
    let (slide, _) = lower(r#"<div className="text-sky-500 text-center"><h3>Note</h3><p>Body</p></div>"#);
    let h3 = text_of(&slide.elements[0]);
    let p = text_of(&slide.elements[1]);
    assert_eq!(h3.style.font_size, 30.0);
    assert!(h3.style.bold);
    assert_eq!(p.style.font_size, 24.0);
    assert!(!p.style.bold);
    assert_eq!(h3.style.color, p.style.color);
    assert_eq!(p.style.align, TextAlign::Center);
}
