/// Palette shared by the block defaults and the renderers.
pub struct ThemeColors;

impl ThemeColors {
	pub const PRIMARY: &'static str = "#3b82f6";
	pub const SECONDARY: &'static str = "#6b7280";
	pub const SUCCESS: &'static str = "#10b981";
	pub const DANGER: &'static str = "#ef4444";
	pub const TEXT_DEFAULT: &'static str = "#333333";
	pub const TEXT_ON_PRIMARY: &'static str = "#ffffff";
	pub const DIVIDER: &'static str = "#e5e7eb";
	pub const BACKGROUND: &'static str = "#ffffff";
	pub const BACKGROUND_TRANSPARENT: &'static str = "transparent";

	/// Background for a button `variant`. An explicit color wins.
	pub fn button_background<'a>(variant: &str, explicit: Option<&'a str>) -> &'a str {
		if let Some(color) = explicit.filter(|color| !color.is_empty()) {
			return color;
		}

		match variant {
			"secondary" => Self::SECONDARY,
			"success" => Self::SUCCESS,
			"danger" => Self::DANGER,
			"outline" => Self::BACKGROUND_TRANSPARENT,
			_ => Self::PRIMARY,
		}
	}

	/// Label color for a button `variant`. An explicit color wins.
	pub fn button_text<'a>(variant: &str, explicit: Option<&'a str>) -> &'a str {
		if let Some(color) = explicit.filter(|color| !color.is_empty()) {
			return color;
		}

		match variant {
			"outline" => Self::PRIMARY,
			_ => Self::TEXT_ON_PRIMARY,
		}
	}
}

/// Parses `#rgb` or `#rrggbb` into its channels.
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
	let hex = hex.trim_start_matches('#');
	let expanded: String = if hex.len() == 3 {
		hex.chars().flat_map(|ch| [ch, ch]).collect()
	} else {
		hex.to_string()
	};

	if expanded.len() != 6 || !expanded.is_ascii() {
		return None;
	}

	let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&expanded[range], 16).ok();
	Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Blends `overlay` over `base` at `opacity` (0.0 to 1.0). Returns `base`
/// unchanged when either color is not a hex color.
pub fn blend_overlay(base: &str, overlay: &str, opacity: f64) -> String {
	let (Some(base_rgb), Some(overlay_rgb)) = (hex_to_rgb(base), hex_to_rgb(overlay)) else {
		return base.to_string();
	};

	let mix = |top: u8, bottom: u8| {
		(f64::from(top) * opacity + f64::from(bottom) * (1.0 - opacity))
			.round()
			.clamp(0.0, 255.0) as u8
	};

	format!(
		"#{:02x}{:02x}{:02x}",
		mix(overlay_rgb.0, base_rgb.0),
		mix(overlay_rgb.1, base_rgb.1),
		mix(overlay_rgb.2, base_rgb.2)
	)
}
