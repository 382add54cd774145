use super::*;
use crate::model::element::ElementKind;

fn unit(path: &str, body: &str) -> SourceUnit {
    SourceUnit::new(
        path,
        format!("export default function Slide() {{\n  return (\n{body}\n  );\n}}\n"),
    )
}

#[test]
fn missing_return_block_yields_empty_slide() {
    let u = SourceUnit::new("/slides/001.tsx", "export const x = 1;\n");
    let (slide, diags) = parse_slide(&u, &PresentationSettings::default());
    assert_eq!(slide.elements.len(), 0);
    assert_eq!(
        diags,
        vec![ParseDiagnostic::ParseIncomplete {
            path: "/slides/001.tsx".into()
        }]
    );
}

#[test]
fn malformed_markup_yields_empty_slide_with_diagnostic() {
    let u = unit("/slides/001.tsx", "<div><p>oops</div>");
    let (slide, diags) = parse_slide(&u, &PresentationSettings::default());
    assert_eq!(slide.elements.len(), 0);
    assert!(matches!(
        diags.as_slice(),
        [ParseDiagnostic::Malformed { offset, .. }] if *offset > 0
    ));
}

#[test]
fn smiley_in_heading_keeps_the_whole_slide() {
    let u = unit(
        "/slides/001.tsx",
        "<div><h1>Done :)</h1><p>Second</p></div>",
    );
    let (slide, diags) = parse_slide(&u, &PresentationSettings::default());
    assert!(diags.is_empty(), "{diags:?}");
    let texts: Vec<&str> = slide
        .elements
        .iter()
        .filter_map(|e| match &e.kind {
            ElementKind::Text(t) => Some(t.content.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(texts, ["Done :)", "Second"]);
}

#[test]
fn only_the_first_return_block_is_used() {
    let u = SourceUnit::new(
        "/slides/001.tsx",
        "function S({ a }) {\n  if (a) { return <p>First</p>; }\n  return (<p>Second</p>);\n}\n",
    );
    let (slide, diags) = parse_slide(&u, &PresentationSettings::default());
    assert_eq!(slide.elements.len(), 1);
    let ElementKind::Text(t) = &slide.elements[0].kind else {
        panic!("expected text");
    };
    assert_eq!(t.content, "First");
    assert!(diags.contains(&ParseDiagnostic::MultipleReturnBlocks {
        path: "/slides/001.tsx".into(),
        count: 2,
    }));
}

#[test]
fn presentation_orders_by_path_and_skips_non_slides() {
    let units = vec![
        unit("/slides/010.tsx", "<h1>Ten</h1>"),
        unit("/components/Button.tsx", "<button>x</button>"),
        unit("/slides/001.tsx", "<h1>One</h1>"),
        unit("/slides/002.tsx", "<h1>Two</h1>"),
    ];
    let parsed = parse_presentation(units, PresentationSettings::default());
    let paths: Vec<_> = parsed
        .presentation
        .slides()
        .iter()
        .map(|s| s.path.as_str())
        .collect();
    assert_eq!(
        paths,
        vec!["/slides/001.tsx", "/slides/002.tsx", "/slides/010.tsx"]
    );
    assert!(parsed.diagnostics.contains(&ParseDiagnostic::NotASlide {
        path: "/components/Button.tsx".into()
    }));
}

#[test]
fn theme_text_color_is_the_default() {
    let mut settings = PresentationSettings::default();
    settings.theme.text_color = crate::foundation::core::Rgba8::rgb(1, 2, 3);
    let (slide, _) = parse_slide(&unit("/slides/001.tsx", "<p>Body</p>"), &settings);
    let ElementKind::Text(t) = &slide.elements[0].kind else {
        panic!("expected text");
    };
    assert_eq!(t.style.color, crate::foundation::core::Rgba8::rgb(1, 2, 3));
}
