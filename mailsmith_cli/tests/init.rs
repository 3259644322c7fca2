use mailsmith_core::AnyEmptyResult;

mod common;

#[test]
fn can_init() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let assert = common::mailsmith_cmd()
		.arg("init")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();
	assert
		.stdout(predicates::str::contains("Created template file"))
		.stdout(predicates::str::contains("Created mailsmith.toml"));

	let template_path = tmp.path().join("template.json");
	let content = std::fs::read_to_string(&template_path)?;
	assert!(content.contains("{{name|capitalize}}"));
	assert!(content.contains("\"required\": true"));

	let config_content = std::fs::read_to_string(tmp.path().join("mailsmith.toml"))?;
	assert!(config_content.contains("[merge_tags]"));
	assert!(config_content.contains("[compiler]"));

	Ok(())
}

#[test]
fn init_does_not_overwrite() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let template_path = tmp.path().join("template.json");
	std::fs::write(&template_path, "existing content")?;

	let config_path = tmp.path().join("mailsmith.toml");
	std::fs::write(&config_path, "existing config")?;

	common::mailsmith_cmd()
		.arg("init")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("already exists"));

	similar_asserts::assert_eq!(std::fs::read_to_string(&template_path)?, "existing content");
	similar_asserts::assert_eq!(std::fs::read_to_string(&config_path)?, "existing config");

	Ok(())
}

#[test]
fn init_respects_dotted_config() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join(".mailsmith.toml"), "")?;

	common::mailsmith_cmd()
		.arg("init")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Config file already exists"));

	assert!(!tmp.path().join("mailsmith.toml").exists());

	Ok(())
}

#[test]
fn generated_template_is_valid() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::mailsmith_cmd()
		.arg("init")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	common::mailsmith_cmd()
		.arg("validate")
		.arg("template.json")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Valid:"));

	Ok(())
}
