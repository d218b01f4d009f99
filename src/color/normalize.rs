//! Accepting colors from other tools: hex strings or HSV-profile objects.

use serde::Deserialize;

use super::hsv::{hsv_to_rgb, Hsv, Rgb, CHANNEL_MAX, HUE_RANGE};

/// Anything a color picker might hand us. Extra fields on the HSV form
/// (tolerances) are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ColorSpec {
    Hex(String),
    Hsv { h: f64, s: f64, v: f64 },
}

pub fn rgb_to_hex(r: u8, g: u8, b: u8) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Parses `#rrggbb`, `rrggbb`, `#rgb` or `rgb` (case-insensitive).
pub fn parse_hex(input: &str) -> Option<Rgb> {
    let digits = input.trim().trim_start_matches('#');
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    match digits.len() {
        6 => {
            let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
            Some(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
        }
        3 => {
            let channel = |i: usize| {
                u8::from_str_radix(&digits[i..i + 1], 16)
                    .ok()
                    .map(|nibble| nibble * 17)
            };
            Some(Rgb::new(channel(0)?, channel(1)?, channel(2)?))
        }
        _ => None,
    }
}

/// `None` means "no usable calibration", never an error to propagate.
pub fn normalize_color(spec: &ColorSpec) -> Option<Rgb> {
    match spec {
        ColorSpec::Hex(hex) => parse_hex(hex),
        ColorSpec::Hsv { h, s, v } => {
            let valid = h.is_finite()
                && s.is_finite()
                && v.is_finite()
                && (0.0..=HUE_RANGE as f64).contains(h)
                && (0.0..=CHANNEL_MAX as f64).contains(s)
                && (0.0..=CHANNEL_MAX as f64).contains(v);
            valid.then(|| {
                hsv_to_rgb(Hsv {
                    h: *h as f32,
                    s: *s as f32,
                    v: *v as f32,
                })
            })
        }
    }
}

/// Same as [`normalize_color`] for raw JSON coming from an external tool.
pub fn normalize_color_value(value: &serde_json::Value) -> Option<Rgb> {
    serde_json::from_value::<ColorSpec>(value.clone())
        .ok()
        .and_then(|spec| normalize_color(&spec))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hex_strings_parse_to_channels() {
        assert_eq!(rgb_to_hex(255, 0, 128), "#ff0080");
        assert_eq!(
            normalize_color(&ColorSpec::Hex("#FF0080".into())),
            Some(Rgb::new(255, 0, 128))
        );
        assert_eq!(parse_hex("  0a0b0c "), Some(Rgb::new(10, 11, 12)));
    }

    #[test]
    fn hex_output_parses_back_to_the_same_channels() {
        let channels: Vec<u8> = (0..=255u8).step_by(5).chain([1, 254]).collect();
        for &r in &channels {
            for &g in &channels {
                for &b in &channels {
                    assert_eq!(parse_hex(&rgb_to_hex(r, g, b)), Some(Rgb::new(r, g, b)), "({r}, {g}, {b})");
                }
            }
        }
    }

    #[test]
    fn short_hex_expands_nibbles() {
        assert_eq!(parse_hex("#f0a"), Some(Rgb::new(255, 0, 170)));
        assert_eq!(parse_hex("FFFFFF"), Some(Rgb::new(255, 255, 255)));
    }

    #[test]
    fn malformed_input_yields_none() {
        assert_eq!(parse_hex("#12345"), None);
        assert_eq!(parse_hex("#gg0000"), None);
        assert_eq!(parse_hex(""), None);
        assert_eq!(parse_hex("#ÿÿÿ"), None);
        assert_eq!(
            normalize_color(&ColorSpec::Hsv { h: 200.0, s: 10.0, v: 10.0 }),
            None
        );
        assert_eq!(
            normalize_color(&ColorSpec::Hsv { h: f64::NAN, s: 10.0, v: 10.0 }),
            None
        );
        assert_eq!(normalize_color_value(&json!({"h": 10})), None);
        assert_eq!(normalize_color_value(&json!(42)), None);
    }

    #[test]
    fn profile_objects_are_accepted_with_tolerances() {
        let rgb = normalize_color_value(&json!({
            "h": 0, "s": 255, "v": 255, "dH": 10, "dS": 60, "dV": 60
        }));
        assert_eq!(rgb, Some(Rgb::new(255, 0, 0)));

        let rgb = normalize_color_value(&json!("#0000ff"));
        assert_eq!(rgb, Some(Rgb::new(0, 0, 255)));
    }
}
