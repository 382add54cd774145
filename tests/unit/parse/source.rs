use super::*;

#[test]
fn extracts_first_parenthesized_block() {
    let src = r#"
import React from "react";

export default function Slide() {
  const title = "return (not this)";
  // return (<p>nor this</p>);
  return (
    <div className="flex">
      <h1>Hello (world)</h1>
    </div>
  );
}
"#;
    let blocks = extract_return_blocks(src);
    assert_eq!(blocks.count, 1);
    let body = blocks.first.unwrap().trim();
    assert!(body.starts_with("<div"));
    assert!(body.ends_with("</div>"));
    assert_eq!(&src[blocks.offset..blocks.offset + 1], "\n");
}

#[test]
fn counts_multiple_markup_returns() {
    let src = r#"
function A() { if (x) { return <p>early</p>; } return (<div>late</div>); }
"#;
    let blocks = extract_return_blocks(src);
    assert_eq!(blocks.count, 2);
    assert_eq!(blocks.first.unwrap(), "<p>early</p>");
}

#[test]
fn non_markup_returns_are_ignored() {
    let src = "function f() { return 42; }\nconst returned = 1;";
    let blocks = extract_return_blocks(src);
    assert_eq!(blocks.count, 0);
    assert!(blocks.first.is_none());
}

#[test]
fn apostrophes_in_text_do_not_break_matching() {
    let src = "export default () => { return (<p>It's fine</p>); }";
    let blocks = extract_return_blocks(src);
    assert_eq!(blocks.first.unwrap(), "<p>It's fine</p>");
}

#[test]
fn unbalanced_parens_in_text_do_not_end_the_block() {
    let src = "export default () => { return (<div><h1>Done :)</h1><p>Second (draft</p><br/></div>); }";
    let blocks = extract_return_blocks(src);
    assert_eq!(blocks.count, 1);
    assert_eq!(
        blocks.first.unwrap(),
        "<div><h1>Done :)</h1><p>Second (draft</p><br/></div>"
    );
}

#[test]
fn unclosed_element_still_yields_its_block() {
    let src = "export default () => { return (\n<div><p>never closed\n</div>\n); }";
    let blocks = extract_return_blocks(src);
    assert_eq!(blocks.count, 1);
    assert_eq!(blocks.first.unwrap().trim(), "<div><p>never closed\n</div>");
}

#[test]
fn slide_namespace_and_ordering() {
    let mut units = vec![
        SourceUnit::new("/slides/010", ""),
        SourceUnit::new("/slides/001", ""),
        SourceUnit::new("/slides/002", ""),
    ];
    sort_units(&mut units);
    let paths: Vec<&str> = units.iter().map(|u| u.path.as_str()).collect();
    assert_eq!(paths, ["/slides/001", "/slides/002", "/slides/010"]);

    assert!(SourceUnit::new("slides/a.tsx", "").is_slide());
    assert!(!SourceUnit::new("/components/Button.tsx", "").is_slide());
    assert!(!SourceUnit::new("/slides/", "").is_slide());
}
