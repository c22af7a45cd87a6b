mod hsv;
pub use hsv::value_from_rgb;
