use smallvec::SmallVec;

use crate::foundation::color::{named_color, parse_color};
use crate::foundation::core::Rgba8;
use crate::model::element::{FlexDirection, ObjectFit, TextAlign};

/// A length from a class token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Length {
    Px(f64),
    /// Fraction of the containing box, `0.0..=1.0`.
    Fraction(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Rounded {
    Px(f64),
    Full,
}

/// Styling recovered from a class list.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct StyleTokens {
    pub(crate) absolute: bool,
    pub(crate) inset_0: bool,
    pub(crate) left: Option<Length>,
    pub(crate) top: Option<Length>,
    pub(crate) width: Option<Length>,
    pub(crate) height: Option<Length>,
    pub(crate) rotate: Option<f64>,
    pub(crate) scale_x: Option<f64>,
    pub(crate) scale_y: Option<f64>,
    pub(crate) bg: Option<Rgba8>,
    pub(crate) bg_image: Option<String>,
    pub(crate) text_size: Option<f64>,
    pub(crate) text_color: Option<Rgba8>,
    pub(crate) align: Option<TextAlign>,
    pub(crate) bold: Option<bool>,
    pub(crate) italic: bool,
    pub(crate) leading: Option<f64>,
    pub(crate) rounded: Option<Rounded>,
    pub(crate) opacity: Option<f64>,
    pub(crate) flex: bool,
    pub(crate) direction: Option<FlexDirection>,
    pub(crate) gap: Option<f64>,
    pub(crate) pad_x: Option<f64>,
    pub(crate) pad_y: Option<f64>,
    pub(crate) items_center: bool,
    pub(crate) justify_center: bool,
    pub(crate) justify_between: bool,
    pub(crate) grid_two: bool,
    pub(crate) fit: Option<ObjectFit>,
    pub(crate) triangle: bool,
    pub(crate) unresolved: SmallVec<[String; 4]>,
}

impl StyleTokens {
    pub(crate) fn parse(class_list: &str) -> Self {
        let mut s = Self::default();
        for tok in class_list.split_whitespace() {
            if !s.apply(tok) {
                s.unresolved.push(tok.to_owned());
            }
        }
        s
    }

    pub(crate) fn padding(&self) -> (f64, f64) {
        (self.pad_x.unwrap_or(0.0), self.pad_y.unwrap_or(0.0))
    }

    fn apply(&mut self, tok: &str) -> bool {
        if tok.contains(':') && !tok.contains('[') {
            // Responsive and state variants (`md:`, `hover:`) are not interpreted.
            return false;
        }
        match tok {
            "absolute" => self.absolute = true,
            "relative" | "static" => self.absolute = false,
            "inset-0" => self.inset_0 = true,
            "italic" => self.italic = true,
            "flex" | "inline-flex" => self.flex = true,
            "flex-col" => {
                self.flex = true;
                self.direction = Some(FlexDirection::Column);
            }
            "flex-row" => {
                self.flex = true;
                self.direction = Some(FlexDirection::Row);
            }
            "items-center" => self.items_center = true,
            "justify-center" => self.justify_center = true,
            "justify-between" => self.justify_between = true,
            "grid-cols-2" => self.grid_two = true,
            "object-cover" => self.fit = Some(ObjectFit::Cover),
            "object-contain" => self.fit = Some(ObjectFit::Contain),
            "object-fill" => self.fit = Some(ObjectFit::Fill),
            "triangle" => self.triangle = true,
            "text-left" => self.align = Some(TextAlign::Left),
            "text-center" => self.align = Some(TextAlign::Center),
            "text-right" => self.align = Some(TextAlign::Right),
            "font-bold" | "font-semibold" | "font-extrabold" | "font-black" => {
                self.bold = Some(true)
            }
            "font-normal" | "font-medium" | "font-light" | "font-thin" => self.bold = Some(false),
            "rounded" => self.rounded = Some(Rounded::Px(4.0)),
            _ => return self.apply_valued(tok),
        }
        true
    }

    fn apply_valued(&mut self, tok: &str) -> bool {
        let (neg, tok) = match tok.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, tok),
        };
        let sign = if neg { -1.0 } else { 1.0 };

        if let Some(v) = tok.strip_prefix("left-") {
            return set(&mut self.left, length(v).map(|l| negate(l, neg)));
        }
        if let Some(v) = tok.strip_prefix("top-") {
            return set(&mut self.top, length(v).map(|l| negate(l, neg)));
        }
        if let Some(v) = tok.strip_prefix("w-") {
            return set(&mut self.width, length(v));
        }
        if let Some(v) = tok.strip_prefix("h-") {
            return set(&mut self.height, length(v));
        }
        if let Some(v) = tok.strip_prefix("rotate-") {
            return set(&mut self.rotate, degrees(v).map(|d| d * sign));
        }
        if let Some(v) = tok.strip_prefix("scale-x-") {
            return set(&mut self.scale_x, scale(v));
        }
        if let Some(v) = tok.strip_prefix("scale-y-") {
            return set(&mut self.scale_y, scale(v));
        }
        if let Some(v) = tok.strip_prefix("scale-") {
            let Some(s) = scale(v) else {
                return false;
            };
            self.scale_x = Some(s);
            self.scale_y = Some(s);
            return true;
        }
        if let Some(v) = tok.strip_prefix("bg-") {
            if let Some(inner) = bracketed(v)
                && let Some(url) = inner.strip_prefix("url(").and_then(|u| u.strip_suffix(')'))
            {
                self.bg_image = Some(url.trim_matches(['\'', '"']).to_owned());
                return true;
            }
            return set(&mut self.bg, color(v));
        }
        if let Some(v) = tok.strip_prefix("text-") {
            if let Some(size) = text_size(v) {
                self.text_size = Some(size);
                return true;
            }
            return set(&mut self.text_color, color(v));
        }
        if let Some(v) = tok.strip_prefix("leading-") {
            return set(&mut self.leading, leading(v));
        }
        if let Some(v) = tok.strip_prefix("rounded-") {
            return set(&mut self.rounded, rounded(v));
        }
        if let Some(v) = tok.strip_prefix("opacity-") {
            return set(
                &mut self.opacity,
                v.parse::<f64>().ok().map(|p| (p / 100.0).clamp(0.0, 1.0)),
            );
        }
        if let Some(v) = tok.strip_prefix("gap-") {
            return set(&mut self.gap, spacing(v));
        }
        if let Some(v) = tok.strip_prefix("px-") {
            return set(&mut self.pad_x, spacing(v));
        }
        if let Some(v) = tok.strip_prefix("py-") {
            return set(&mut self.pad_y, spacing(v));
        }
        if let Some(v) = tok.strip_prefix("p-") {
            let Some(p) = spacing(v) else {
                return false;
            };
            self.pad_x = Some(p);
            self.pad_y = Some(p);
            return true;
        }
        false
    }
}

fn set<T>(slot: &mut Option<T>, v: Option<T>) -> bool {
    match v {
        Some(v) => {
            *slot = Some(v);
            true
        }
        None => false,
    }
}

fn negate(l: Length, neg: bool) -> Length {
    if !neg {
        return l;
    }
    match l {
        Length::Px(v) => Length::Px(-v),
        Length::Fraction(f) => Length::Fraction(-f),
    }
}

fn bracketed(v: &str) -> Option<&str> {
    v.strip_prefix('[')?.strip_suffix(']')
}

/// `[24px]`, `[1.5rem]`, `[50%]`, spacing scale `6`, `px`, `full`, `1/2`.
fn length(v: &str) -> Option<Length> {
    if let Some(inner) = bracketed(v) {
        return arbitrary_length(inner);
    }
    match v {
        "full" | "screen" => return Some(Length::Fraction(1.0)),
        "px" => return Some(Length::Px(1.0)),
        _ => {}
    }
    if let Some((n, d)) = v.split_once('/') {
        let n = n.parse::<f64>().ok()?;
        let d = d.parse::<f64>().ok()?;
        if d == 0.0 {
            return None;
        }
        return Some(Length::Fraction(n / d));
    }
    spacing(v).map(Length::Px)
}

fn arbitrary_length(inner: &str) -> Option<Length> {
    if let Some(p) = inner.strip_suffix('%') {
        return p.parse::<f64>().ok().map(|v| Length::Fraction(v / 100.0));
    }
    if let Some(p) = inner.strip_suffix("px") {
        return p.parse::<f64>().ok().map(Length::Px);
    }
    if let Some(p) = inner.strip_suffix("rem") {
        return p.parse::<f64>().ok().map(|v| Length::Px(v * 16.0));
    }
    inner.parse::<f64>().ok().map(Length::Px)
}

/// Tailwind spacing scale: `N` is `N * 4px`; brackets take an explicit length.
fn spacing(v: &str) -> Option<f64> {
    if let Some(inner) = bracketed(v) {
        return match arbitrary_length(inner)? {
            Length::Px(px) => Some(px),
            Length::Fraction(_) => None,
        };
    }
    if v == "px" {
        return Some(1.0);
    }
    let n = v.parse::<f64>().ok()?;
    (n.is_finite() && n >= 0.0).then_some(n * 4.0)
}

fn degrees(v: &str) -> Option<f64> {
    let raw = bracketed(v).unwrap_or(v);
    let raw = raw.strip_suffix("deg").unwrap_or(raw);
    raw.parse::<f64>().ok().filter(|d| d.is_finite())
}

fn scale(v: &str) -> Option<f64> {
    if let Some(inner) = bracketed(v) {
        return inner.parse::<f64>().ok().filter(|s| s.is_finite());
    }
    v.parse::<f64>().ok().map(|p| p / 100.0)
}

fn text_size(v: &str) -> Option<f64> {
    if let Some(inner) = bracketed(v) {
        return match arbitrary_length(inner)? {
            Length::Px(px) if px > 0.0 => Some(px),
            _ => None,
        };
    }
    let px = match v {
        "xs" => 12.0,
        "sm" => 14.0,
        "base" => 16.0,
        "lg" => 18.0,
        "xl" => 20.0,
        "2xl" => 24.0,
        "3xl" => 30.0,
        "4xl" => 36.0,
        "5xl" => 48.0,
        "6xl" => 60.0,
        "7xl" => 72.0,
        "8xl" => 96.0,
        "9xl" => 128.0,
        _ => return None,
    };
    Some(px)
}

fn leading(v: &str) -> Option<f64> {
    if let Some(inner) = bracketed(v) {
        return inner.parse::<f64>().ok();
    }
    let lh = match v {
        "none" => 1.0,
        "tight" => 1.25,
        "snug" => 1.375,
        "normal" => 1.5,
        "relaxed" => 1.625,
        "loose" => 2.0,
        _ => return None,
    };
    Some(lh)
}

fn rounded(v: &str) -> Option<Rounded> {
    if let Some(inner) = bracketed(v) {
        return match arbitrary_length(inner)? {
            Length::Px(px) => Some(Rounded::Px(px.max(0.0))),
            Length::Fraction(_) => Some(Rounded::Full),
        };
    }
    let px = match v {
        "none" => 0.0,
        "sm" => 2.0,
        "md" => 6.0,
        "lg" => 8.0,
        "xl" => 12.0,
        "2xl" => 16.0,
        "3xl" => 24.0,
        "full" => return Some(Rounded::Full),
        _ => return None,
    };
    Some(Rounded::Px(px))
}

/// `[#hex]`, `[rgb(...)]`, palette names, optional `/NN` alpha suffix.
fn color(v: &str) -> Option<Rgba8> {
    if let Some(inner) = bracketed(v) {
        return parse_color(inner).ok();
    }
    let (name, alpha) = match v.split_once('/') {
        Some((n, a)) => (n, a.parse::<f64>().ok().map(|p| (p / 100.0).clamp(0.0, 1.0))),
        None => (v, None),
    };
    let c = named_color(name)?;
    Some(match alpha {
        Some(a) => c.with_alpha((a * 255.0).round() as u8),
        None => c,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/parse/style.rs"]
mod tests;
