//! Integration tests for TOML configuration loading.
//!
//! Uses `figment::Jail` for sandboxed cwd and env var manipulation.

use autodoc_config::{AutodocConfig, ExtractionMode};
use figment::{
    Figment, Jail,
    providers::{Format, Serialized, Toml},
};

#[test]
fn loads_llm_config_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[llm]
model = "gpt-4o-mini"
organization = "org-123"
project = "proj_456"
api_key = "sk-toml"
base_url = "http://localhost:11434/v1"
temperature = 0.0
timeout_secs = 30
"#,
        )?;

        let config: AutodocConfig = Figment::from(Serialized::defaults(AutodocConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.organization, "org-123");
        assert_eq!(config.llm.project, "proj_456");
        assert_eq!(config.llm.api_key, "sk-toml");
        assert_eq!(config.llm.base_url, "http://localhost:11434/v1");
        assert_eq!(config.llm.timeout_secs, 30);
        assert!(config.llm.is_configured());
        Ok(())
    });
}

#[test]
fn loads_dbt_and_general_config_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[dbt]
project_dir = "/srv/dbt"
program = "/opt/venv/bin/dbt"
extra_args = ["--target", "dev"]
docs_path = "docs/columns.md"

[general]
extraction = "structural"
domain = "property assessment"
"#,
        )?;

        let config: AutodocConfig = Figment::from(Serialized::defaults(AutodocConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.dbt.program, "/opt/venv/bin/dbt");
        assert_eq!(config.dbt.extra_args, vec!["--target", "dev"]);
        assert_eq!(
            config.dbt.docs_store_path().to_string_lossy(),
            "/srv/dbt/docs/columns.md"
        );
        assert_eq!(config.general.extraction, ExtractionMode::Structural);
        assert_eq!(config.general.domain, "property assessment");
        Ok(())
    });
}

#[test]
fn project_file_is_picked_up_by_load() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "autodoc.toml",
            r#"
[llm]
model = "from-project-file"
"#,
        )?;

        let config = AutodocConfig::load().expect("config loads");
        assert_eq!(config.llm.model, "from-project-file");
        Ok(())
    });
}

#[test]
fn missing_sections_fall_back_to_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[llm]\nmodel = \"m\"\n")?;

        let config: AutodocConfig = Figment::from(Serialized::defaults(AutodocConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.llm.base_url, "https://api.openai.com/v1");
        assert_eq!(config.dbt.program, "dbt");
        assert_eq!(config.general.extraction, ExtractionMode::Model);
        Ok(())
    });
}
