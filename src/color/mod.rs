pub mod hsv;
pub mod normalize;

pub use hsv::{circular_mean_hue, hsv_to_rgb, hue_distance, rgb_to_hsv, Hsv, Rgb, HUE_RANGE};
pub use normalize::{normalize_color, normalize_color_value, parse_hex, rgb_to_hex, ColorSpec};
