use serde_json::Value;
use serde_json::json;

use crate::BlockKind;
use crate::Props;
use crate::RowProps;
use crate::document::to_props;
use crate::theme::ThemeColors;

/// Props a freshly added block of `kind` starts with. Custom kinds start
/// empty. Row defaults come with fresh column ids.
pub fn default_props(kind: &BlockKind) -> Props {
	let value = match kind {
		BlockKind::Text => {
			json!({
				"content": "",
				"variant": "paragraph",
				"align": "left",
				"color": ThemeColors::TEXT_DEFAULT,
				"fontSize": 16,
				"lineHeight": 1.5,
				"fontWeight": "normal",
				"padding": content_padding(),
			})
		}
		BlockKind::Heading => {
			json!({
				"content": "",
				"level": "h1",
				"align": "left",
				"color": ThemeColors::TEXT_DEFAULT,
				"fontSize": 28,
				"lineHeight": 1.2,
				"fontWeight": "bold",
				"padding": content_padding(),
			})
		}
		BlockKind::Image => {
			json!({
				"src": "",
				"alt": "",
				"href": "",
				"width": "100%",
				"align": "center",
				"fluidOnMobile": true,
				"borderRadius": 0,
				"padding": content_padding(),
			})
		}
		BlockKind::Button => {
			json!({
				"text": "Click Here",
				"href": "#",
				"variant": "primary",
				"size": "md",
				"align": "center",
				"borderRadius": 6,
				"fullWidth": false,
				"padding": content_padding(),
			})
		}
		BlockKind::Divider => {
			json!({
				"style": "solid",
				"color": ThemeColors::DIVIDER,
				"width": "100%",
				"align": "center",
				"thickness": 1,
				"padding": { "top": 20, "right": 0, "bottom": 20, "left": 0 },
			})
		}
		BlockKind::Spacer => {
			json!({
				"height": 40,
				"backgroundColor": "transparent",
			})
		}
		BlockKind::Html => {
			json!({
				"content": "",
				"padding": { "top": 10, "right": 20, "bottom": 10, "left": 20 },
			})
		}
		BlockKind::Video => {
			json!({
				"videoUrl": "",
				"thumbnailUrl": "",
				"alt": "Video",
				"width": "100%",
				"align": "center",
				"borderRadius": 0,
				"padding": content_padding(),
			})
		}
		BlockKind::Social => {
			let links: Vec<Value> = SOCIAL_PLATFORMS
				.iter()
				.map(|platform| json!({ "platform": platform, "url": "", "enabled": false }))
				.collect();

			json!({
				"links": links,
				"iconSize": "md",
				"iconStyle": "filled",
				"iconColor": "",
				"align": "center",
				"gap": 12,
				"padding": content_padding(),
			})
		}
		BlockKind::Row => return to_props(&RowProps::default()),
		BlockKind::Custom(_) => return Props::new(),
	};

	match value {
		Value::Object(props) => props,
		_ => Props::new(),
	}
}

/// Platforms listed by a new social block, in display order.
pub const SOCIAL_PLATFORMS: [&str; 8] = [
	"facebook",
	"twitter",
	"instagram",
	"linkedin",
	"youtube",
	"tiktok",
	"pinterest",
	"email",
];

fn content_padding() -> Value {
	json!({ "top": 10, "right": 0, "bottom": 10, "left": 0 })
}
