use autodoc_config::AutodocConfig;

/// Emit warnings for likely mistyped env var keys that silently fell back to defaults.
pub fn warn_unconfigured(config: &AutodocConfig) {
    for warning in collect_unconfigured_warnings(config, std::env::vars()) {
        tracing::warn!("{warning}");
    }
}

fn collect_unconfigured_warnings<I>(config: &AutodocConfig, env: I) -> Vec<String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let env_keys = env.into_iter().map(|(key, _)| key).collect::<Vec<_>>();

    let mut warnings = Vec::new();

    if !config.llm.is_configured() && has_env_prefix(&env_keys, "AUTODOC_LLM") {
        warnings.push(
            "LLM config appears default while AUTODOC_LLM* env vars exist. Use double underscores (example: AUTODOC_LLM__API_KEY)."
                .to_string(),
        );
    }

    if config.dbt.program == "dbt"
        && env_keys
            .iter()
            .any(|key| key.starts_with("AUTODOC_DBT") && !key.starts_with("AUTODOC_DBT__"))
    {
        warnings.push(
            "AUTODOC_DBT* env vars exist without a section separator. Use double underscores (example: AUTODOC_DBT__PROGRAM)."
                .to_string(),
        );
    }

    warnings
}

fn has_env_prefix(keys: &[String], prefix: &str) -> bool {
    keys.iter().any(|key| key.starts_with(prefix))
}
