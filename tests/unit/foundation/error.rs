use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        SlideError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(SlideError::parse("x").to_string().contains("parse error:"));
    assert!(
        SlideError::surface("x")
            .to_string()
            .contains("surface error:")
    );
    assert!(
        SlideError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn export_error_names_its_format() {
    let err = SlideError::export("pptx", "zip writer closed");
    assert_eq!(err.to_string(), "pptx export failed: zip writer closed");
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = SlideError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
