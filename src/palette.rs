use serde::Serialize;

const DAY_COLORS: [&str; 6] = [
    "#ff4d4f", "#2f54eb", "#52c41a", "#722ed1", "#fa8c16", "#13c2c2",
];
pub const FALLBACK_COLOR: &str = "#ffd54f";

pub fn color_for_day(day: u32) -> &'static str {
    match day {
        1..=6 => DAY_COLORS[(day - 1) as usize],
        _ => FALLBACK_COLOR,
    }
}

pub fn day_label(day: u32) -> String {
    format!("Día {day}")
}

/// Teardrop map pin filled with a day color.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PinIcon {
    pub color: &'static str,
    pub svg: String,
    pub icon_size: [u32; 2],
    pub icon_anchor: [u32; 2],
    pub popup_anchor: [i32; 2],
}

impl PinIcon {
    pub fn for_day(day: u32) -> Self {
        let color = color_for_day(day);
        PinIcon {
            color,
            svg: format!(
                "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 32 48'>\
                 <path d='M16 0C7.2 0 0 7.2 0 16c0 12 16 32 16 32s16-20 16-32C32 7.2 24.8 0 16 0z' fill='{color}'/>\
                 <circle cx='16' cy='16' r='6' fill='white'/></svg>"
            ),
            icon_size: [28, 42],
            icon_anchor: [14, 40],
            popup_anchor: [0, -34],
        }
    }
}
