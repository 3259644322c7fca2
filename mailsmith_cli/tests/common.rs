use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub fn mailsmith_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("mailsmith"));
	cmd.env("NO_COLOR", "1");
	cmd
}

/// A template with a required `name` tag and a global `app_name` in the
/// subject.
#[allow(dead_code)]
pub const WELCOME_TEMPLATE: &str = r#"{
  "name": "Welcome Email",
  "subject": "Welcome to {{app_name}}, {{name}}",
  "content": {
    "version": "1.0",
    "blocks": [
      {
        "id": "3f2b9a4e-8c1d-4b6a-9f0e-2d7c5a1b8e90",
        "type": "text",
        "props": { "content": "<p>Hi {{name|capitalize}}</p>" }
      }
    ]
  },
  "tags": [
    { "key": "name", "label": "Name", "required": true }
  ]
}"#;
