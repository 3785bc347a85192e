//! Fill colours for the overlay grades.

use redline_common::HolcGrade;

pub const GRADE_A: &str = "#5bcc04";
pub const GRADE_B: &str = "#04b8cc";
pub const GRADE_C: &str = "#e9ed0e";
pub const GRADE_D: &str = "#d11d1d";
pub const GRADE_OTHER: &str = "#ccc";

pub const FILL_OPACITY: f32 = 0.2;

pub fn grade_color(grade: HolcGrade) -> &'static str {
    match grade {
        HolcGrade::A => GRADE_A,
        HolcGrade::B => GRADE_B,
        HolcGrade::C => GRADE_C,
        HolcGrade::D => GRADE_D,
        HolcGrade::Other => GRADE_OTHER,
    }
}

/// Parse `#rgb` or `#rrggbb` into its channels.
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#').filter(|d| d.is_ascii())?;
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match digits.len() {
        3 => {
            let mut chars = digits.chars().map(|c| c.to_digit(16).map(|d| (d * 17) as u8));
            Some((chars.next()??, chars.next()??, chars.next()??))
        }
        6 => Some((
            channel(&digits[0..2])?,
            channel(&digits[2..4])?,
            channel(&digits[4..6])?,
        )),
        _ => None,
    }
}

/// CSS `rgba()` for a hex colour at the given alpha.
pub fn hex_to_css_alpha(hex: &str, alpha: f32) -> Option<String> {
    let (r, g, b) = hex_to_rgb(hex)?;
    Some(format!("rgba({}, {}, {}, {})", r, g, b, alpha))
}
