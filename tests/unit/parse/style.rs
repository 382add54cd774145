use super::*;

#[test]
fn absolute_box_from_arbitrary_values() {
    let s = StyleTokens::parse("absolute left-[120px] top-[80px] w-[640px] h-[1.5rem]");
    assert!(s.absolute);
    assert_eq!(s.left, Some(Length::Px(120.0)));
    assert_eq!(s.top, Some(Length::Px(80.0)));
    assert_eq!(s.width, Some(Length::Px(640.0)));
    assert_eq!(s.height, Some(Length::Px(24.0)));
    assert!(s.unresolved.is_empty());
}

#[test]
fn spacing_scale_and_fractions() {
    let s = StyleTokens::parse("w-1/2 h-full p-6 gap-[12px] -top-4");
    assert_eq!(s.width, Some(Length::Fraction(0.5)));
    assert_eq!(s.height, Some(Length::Fraction(1.0)));
    assert_eq!(s.padding(), (24.0, 24.0));
    assert_eq!(s.gap, Some(12.0));
    assert_eq!(s.top, Some(Length::Px(-16.0)));
}

#[test]
fn colors_and_background_images() {
    let s = StyleTokens::parse("bg-[#0f172a] text-white/50");
    assert_eq!(s.bg, Some(Rgba8::rgb(15, 23, 42)));
    assert_eq!(s.text_color, Some(Rgba8::WHITE.with_alpha(128)));

    let s = StyleTokens::parse("bg-[url('/images/hero.jpg')] bg-cover");
    assert_eq!(s.bg_image.as_deref(), Some("/images/hero.jpg"));
    assert_eq!(s.unresolved.as_slice(), ["bg-cover".to_owned()]);
}

#[test]
fn text_size_is_not_confused_with_color() {
    let s = StyleTokens::parse("text-4xl text-[#ff0000] text-center font-semibold italic");
    assert_eq!(s.text_size, Some(36.0));
    assert_eq!(s.text_color, Some(Rgba8::rgb(255, 0, 0)));
    assert_eq!(s.align, Some(TextAlign::Center));
    assert_eq!(s.bold, Some(true));
    assert!(s.italic);

    assert_eq!(StyleTokens::parse("text-[48px]").text_size, Some(48.0));
}

#[test]
fn transforms_radius_and_layout_flags() {
    let s = StyleTokens::parse("-rotate-[12deg] scale-150 rounded-2xl flex-col grid-cols-2");
    assert_eq!(s.rotate, Some(-12.0));
    assert_eq!((s.scale_x, s.scale_y), (Some(1.5), Some(1.5)));
    assert_eq!(s.rounded, Some(Rounded::Px(16.0)));
    assert!(s.flex);
    assert_eq!(s.direction, Some(FlexDirection::Column));
    assert!(s.grid_two);
    assert_eq!(StyleTokens::parse("rounded-full").rounded, Some(Rounded::Full));
}

#[test]
fn variants_and_unknown_tokens_are_unresolved() {
    let s = StyleTokens::parse("md:w-1/2 shadow-xl w-[oops]");
    assert_eq!(s.width, None);
    assert_eq!(s.unresolved.len(), 3);
}
