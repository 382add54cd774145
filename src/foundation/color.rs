use crate::foundation::core::Rgba8;

/// Parse a CSS-ish color value: `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb()/rgba()`,
/// `hsl()/hsla()` or a palette name (`white`, `slate-900`, ...).
pub fn parse_color(s: &str) -> Result<Rgba8, String> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }
    if let Some(args) = func_args(s, "rgba").or_else(|| func_args(s, "rgb")) {
        return parse_rgb_args(&args);
    }
    if let Some(args) = func_args(s, "hsla").or_else(|| func_args(s, "hsl")) {
        return parse_hsl_args(&args);
    }
    named_color(s).ok_or_else(|| format!("unknown color \"{s}\""))
}

fn func_args(s: &str, name: &str) -> Option<Vec<String>> {
    let rest = s.strip_prefix(name)?.trim_start();
    let inner = rest.strip_prefix('(')?.strip_suffix(')')?;
    Some(
        inner
            .split([',', ' ', '/'])
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_owned)
            .collect(),
    )
}

fn parse_hex(s: &str) -> Result<Rgba8, String> {
    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }
    fn nibble(c: &str) -> Result<u8, String> {
        let v = hex_byte(c)?;
        Ok(v * 17)
    }

    if !s.is_ascii() {
        return Err("hex color must be ascii".to_owned());
    }
    match s.len() {
        3 => Ok(Rgba8::rgb(nibble(&s[0..1])?, nibble(&s[1..2])?, nibble(&s[2..3])?)),
        6 => Ok(Rgba8::rgb(
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
        )),
        8 => Ok(Rgba8 {
            r: hex_byte(&s[0..2])?,
            g: hex_byte(&s[2..4])?,
            b: hex_byte(&s[4..6])?,
            a: hex_byte(&s[6..8])?,
        }),
        _ => Err("hex color must be #RGB, #RRGGBB or #RRGGBBAA".to_owned()),
    }
}

fn parse_alpha(s: Option<&String>) -> Result<u8, String> {
    let Some(s) = s else {
        return Ok(255);
    };
    let v = if let Some(p) = s.strip_suffix('%') {
        p.parse::<f64>().map_err(|_| format!("invalid alpha \"{s}\""))? / 100.0
    } else {
        s.parse::<f64>().map_err(|_| format!("invalid alpha \"{s}\""))?
    };
    Ok((v.clamp(0.0, 1.0) * 255.0).round() as u8)
}

fn parse_rgb_args(args: &[String]) -> Result<Rgba8, String> {
    if args.len() != 3 && args.len() != 4 {
        return Err("rgb() takes 3 or 4 components".to_owned());
    }
    let mut ch = [0u8; 3];
    for (i, a) in args.iter().take(3).enumerate() {
        let v = a
            .parse::<f64>()
            .map_err(|_| format!("invalid rgb component \"{a}\""))?;
        ch[i] = v.clamp(0.0, 255.0).round() as u8;
    }
    Ok(Rgba8 {
        r: ch[0],
        g: ch[1],
        b: ch[2],
        a: parse_alpha(args.get(3))?,
    })
}

fn parse_hsl_args(args: &[String]) -> Result<Rgba8, String> {
    if args.len() != 3 && args.len() != 4 {
        return Err("hsl() takes 3 or 4 components".to_owned());
    }
    let num = |s: &str| -> Result<f64, String> {
        s.trim_end_matches(['%'])
            .trim_end_matches("deg")
            .parse::<f64>()
            .map_err(|_| format!("invalid hsl component \"{s}\""))
    };
    let h = num(&args[0])?;
    let s = num(&args[1])? / 100.0;
    let l = num(&args[2])? / 100.0;
    let (r, g, b) = hsl_to_rgb(h, s, l);
    let to_u8 = |x: f64| (x.clamp(0.0, 1.0) * 255.0).round() as u8;
    Ok(Rgba8 {
        r: to_u8(r),
        g: to_u8(g),
        b: to_u8(b),
        a: parse_alpha(args.get(3))?,
    })
}

fn hsl_to_rgb(h_deg: f64, s: f64, l: f64) -> (f64, f64, f64) {
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);
    let h = (h_deg.rem_euclid(360.0)) / 360.0;

    if s == 0.0 {
        return (l, l, l);
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            return p + (q - p) * 6.0 * t;
        }
        if t < 1.0 / 2.0 {
            return q;
        }
        if t < 2.0 / 3.0 {
            return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
        }
        p
    }

    (
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
    )
}

/// Named colors accepted in class tokens (`bg-slate-900`, `text-white`).
pub fn named_color(name: &str) -> Option<Rgba8> {
    let c = match name {
        "white" => Rgba8::WHITE,
        "black" => Rgba8::BLACK,
        "transparent" => Rgba8::TRANSPARENT,
        "gray-100" => Rgba8::rgb(0xf3, 0xf4, 0xf6),
        "gray-200" => Rgba8::rgb(0xe5, 0xe7, 0xeb),
        "gray-300" => Rgba8::rgb(0xd1, 0xd5, 0xdb),
        "gray-400" => Rgba8::rgb(0x9c, 0xa3, 0xaf),
        "gray-500" => Rgba8::rgb(0x6b, 0x72, 0x80),
        "gray-600" => Rgba8::rgb(0x4b, 0x55, 0x63),
        "gray-700" => Rgba8::rgb(0x37, 0x41, 0x51),
        "gray-800" => Rgba8::rgb(0x1f, 0x29, 0x37),
        "gray-900" => Rgba8::rgb(0x11, 0x18, 0x27),
        "slate-50" => Rgba8::rgb(0xf8, 0xfa, 0xfc),
        "slate-100" => Rgba8::rgb(0xf1, 0xf5, 0xf9),
        "slate-300" => Rgba8::rgb(0xcb, 0xd5, 0xe1),
        "slate-500" => Rgba8::rgb(0x64, 0x74, 0x8b),
        "slate-700" => Rgba8::rgb(0x33, 0x41, 0x55),
        "slate-800" => Rgba8::rgb(0x1e, 0x29, 0x3b),
        "slate-900" => Rgba8::rgb(0x0f, 0x17, 0x2a),
        "red-500" => Rgba8::rgb(0xef, 0x44, 0x44),
        "orange-500" => Rgba8::rgb(0xf9, 0x73, 0x16),
        "amber-400" => Rgba8::rgb(0xfb, 0xbf, 0x24),
        "yellow-400" => Rgba8::rgb(0xfa, 0xcc, 0x15),
        "green-500" => Rgba8::rgb(0x22, 0xc5, 0x5e),
        "emerald-500" => Rgba8::rgb(0x10, 0xb9, 0x81),
        "teal-500" => Rgba8::rgb(0x14, 0xb8, 0xa6),
        "sky-500" => Rgba8::rgb(0x0e, 0xa5, 0xe9),
        "blue-500" => Rgba8::rgb(0x3b, 0x82, 0xf6),
        "blue-600" => Rgba8::rgb(0x25, 0x63, 0xeb),
        "indigo-600" => Rgba8::rgb(0x4f, 0x46, 0xe5),
        "violet-600" => Rgba8::rgb(0x7c, 0x3a, 0xed),
        "purple-600" => Rgba8::rgb(0x93, 0x33, 0xea),
        "pink-500" => Rgba8::rgb(0xec, 0x48, 0x99),
        _ => return None,
    };
    Some(c)
}
