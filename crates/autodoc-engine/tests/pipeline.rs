//! End-to-end model runs against a scripted completion backend and a fixed
//! manifest, on a temporary dbt project layout.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use autodoc_config::{ExtractionMode, GeneralConfig};
use autodoc_core::blocks;
use autodoc_core::responses::SummaryOutcome;
use autodoc_dbt::{GenerationError, ManifestSource};
use autodoc_engine::metadata::has_summary;
use autodoc_engine::{DocumentationStore, EngineError, Pipeline, Progress, prompts};
use autodoc_llm::ScriptedCompletion;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const MODEL: &str = "stg_parcels";

const SQL: &str = "select parcel_id, owner_name from {{ source('raw', 'parcels') }}";

const CODEGEN_STDOUT: &str = "\
18:36:01  Running with dbt=1.8.2
18:36:03  version: 2

models:
  - name: stg_parcels
    description: \"\"
    columns:
      - name: parcel_id
        data_type: varchar
        description: \"\"
      - name: owner_name
        data_type: varchar
        description: \"\"
";

const DESCRIBED: &str = "\
{% docs parcel_id %}
The identifier for the parcel.
{% enddocs %}

{% docs owner_name %}
Name of the owner of record.
{% enddocs %}";

const SUMMARY: &str = "This model stages raw parcel records with their owners.";

/// Serves the same codegen output for every model except those listed as broken.
struct FixedManifest {
    broken: Vec<String>,
}

impl FixedManifest {
    fn new() -> Self {
        Self::failing_for(&[])
    }

    fn failing_for(models: &[&str]) -> Self {
        Self {
            broken: models.iter().map(ToString::to_string).collect(),
        }
    }
}

#[async_trait]
impl ManifestSource for FixedManifest {
    async fn generate_manifest(&self, model: &str) -> Result<String, GenerationError> {
        if self.broken.iter().any(|m| m == model) {
            return Err(GenerationError::Failed {
                model: model.to_string(),
                status: "status 1".into(),
                diagnostics: "Compilation Error".into(),
            });
        }
        Ok(CODEGEN_STDOUT.to_string())
    }
}

struct Project {
    _root: TempDir,
    models: PathBuf,
    store: PathBuf,
}

impl Project {
    fn new(models: &[&str]) -> Self {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("models").join("staging");
        std::fs::create_dir_all(&dir).unwrap();
        for model in models {
            std::fs::write(dir.join(format!("{model}.sql")), SQL).unwrap();
        }
        Self {
            store: root.path().join("docs").join("_docs.md"),
            models: dir,
            _root: root,
        }
    }

    fn metadata(&self, model: &str) -> PathBuf {
        self.models.join(format!("{model}.yml"))
    }
}

fn general(extraction: ExtractionMode) -> GeneralConfig {
    GeneralConfig {
        extraction,
        ..GeneralConfig::default()
    }
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

fn model_entry(path: &Path, model: &str) -> serde_yaml::Value {
    let doc: serde_yaml::Value = serde_yaml::from_str(&read(path)).unwrap();
    doc["models"]
        .as_sequence()
        .unwrap()
        .iter()
        .find(|entry| entry["name"].as_str() == Some(model))
        .cloned()
        .unwrap()
}

/// `(column, description)` pairs of [`MODEL`]'s entry in a properties file.
fn column_descriptions(path: &Path) -> Vec<(String, String)> {
    model_entry(path, MODEL)["columns"]
        .as_sequence()
        .unwrap()
        .iter()
        .map(|column| {
            (
                column["name"].as_str().unwrap().to_string(),
                column["description"].as_str().unwrap_or_default().to_string(),
            )
        })
        .collect()
}

fn referenced(columns: &[&str]) -> Vec<(String, String)> {
    columns
        .iter()
        .map(|c| (c.to_string(), format!("{{{{ doc(\"{c}\") }}}}")))
        .collect()
}

#[tokio::test]
async fn first_run_documents_every_column() {
    let project = Project::new(&[MODEL]);
    let script = ScriptedCompletion::with_responses(["parcel_id, owner_name", DESCRIBED, SUMMARY]);
    let pipeline = Pipeline::new(script, FixedManifest::new(), &general(ExtractionMode::Model));
    let mut store = DocumentationStore::open(&project.store).await.unwrap();

    let report = pipeline
        .run_model(&project.models, MODEL, &mut store)
        .await
        .unwrap();

    // The empty store is never sent to the service.
    let calls = pipeline.completion().calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].instruction, prompts::MANIFEST_EXTRACTION);
    assert!(calls[0].payload.starts_with("version: 2"));
    assert_eq!(calls[1].payload, "parcel_id\nowner_name");
    assert_eq!(calls[2].instruction, prompts::DESCRIBE_ENTITY);
    assert_eq!(calls[2].payload, SQL);

    assert_eq!(read(&project.store), DESCRIBED);
    assert_eq!(blocks::block_names(&read(&project.store)), vec!["parcel_id", "owner_name"]);

    assert_eq!(
        column_descriptions(&project.metadata(MODEL)),
        referenced(&["parcel_id", "owner_name"])
    );
    let metadata = read(&project.metadata(MODEL));
    assert!(metadata.contains(SUMMARY));
    assert!(has_summary(&metadata, MODEL).unwrap());

    assert!(report.metadata_created);
    assert_eq!(report.manifest_columns, 2);
    assert_eq!(report.described, vec!["parcel_id", "owner_name"]);
    assert_eq!(report.references, 2);
    assert_eq!(report.summary, SummaryOutcome::Generated);
}

#[tokio::test]
async fn second_run_changes_nothing() {
    let project = Project::new(&[MODEL]);
    let script = ScriptedCompletion::with_responses(["parcel_id, owner_name", DESCRIBED, SUMMARY]);
    let pipeline = Pipeline::new(script, FixedManifest::new(), &general(ExtractionMode::Model));
    let mut store = DocumentationStore::open(&project.store).await.unwrap();
    pipeline
        .run_model(&project.models, MODEL, &mut store)
        .await
        .unwrap();

    let store_before = read(&project.store);
    let metadata_before = read(&project.metadata(MODEL));

    pipeline.completion().push_response("parcel_id, owner_name");
    pipeline.completion().push_response("parcel_id, owner_name");
    let mut store = DocumentationStore::open(&project.store).await.unwrap();
    let report = pipeline
        .run_model(&project.models, MODEL, &mut store)
        .await
        .unwrap();

    // Store extraction and manifest extraction only.
    assert_eq!(pipeline.completion().call_count(), 5);
    assert_eq!(pipeline.completion().remaining(), 0);
    assert_eq!(read(&project.store), store_before);
    assert_eq!(read(&project.metadata(MODEL)), metadata_before);
    assert!(!report.metadata_created);
    assert!(report.described.is_empty());
    assert_eq!(report.references, 2);
    assert_eq!(report.summary, SummaryOutcome::Preserved);
}

#[tokio::test]
async fn only_undocumented_columns_are_described() {
    let project = Project::new(&[MODEL]);
    let existing = "# Shared column docs\n\n{% docs parcel_id %}\nHand-written parcel text.\n{% enddocs %}\n";
    std::fs::create_dir_all(project.store.parent().unwrap()).unwrap();
    std::fs::write(&project.store, existing).unwrap();

    let script = ScriptedCompletion::with_responses([
        "parcel_id",
        "parcel_id, owner_name",
        "{% docs owner_name %}\nName of the owner of record.\n{% enddocs %}",
        SUMMARY,
    ]);
    let pipeline = Pipeline::new(script, FixedManifest::new(), &general(ExtractionMode::Model));
    let mut store = DocumentationStore::open(&project.store).await.unwrap();

    let report = pipeline
        .run_model(&project.models, MODEL, &mut store)
        .await
        .unwrap();

    let calls = pipeline.completion().calls();
    assert_eq!(calls[0].instruction, prompts::STORE_EXTRACTION);
    assert_eq!(calls[0].payload, existing);
    assert_eq!(calls[2].payload, "owner_name");

    let text = read(&project.store);
    assert!(text.starts_with(existing));
    assert!(blocks::diagnose(&text).is_clean());
    assert_eq!(report.described, vec!["owner_name"]);
    assert_eq!(report.references, 2);
}

#[tokio::test]
async fn existing_summary_is_not_regenerated() {
    let project = Project::new(&[MODEL]);
    let metadata = "\
version: 2
models:
  - name: stg_parcels
    description: \"Maintained by hand.\"
    columns:
      - name: parcel_id
";
    std::fs::write(project.metadata(MODEL), metadata).unwrap();

    let script = ScriptedCompletion::with_responses(["parcel_id, owner_name", DESCRIBED]);
    let pipeline = Pipeline::new(script, FixedManifest::new(), &general(ExtractionMode::Model));
    let mut store = DocumentationStore::open(&project.store).await.unwrap();

    let report = pipeline
        .run_model(&project.models, MODEL, &mut store)
        .await
        .unwrap();

    assert_eq!(pipeline.completion().call_count(), 2);
    assert_eq!(report.summary, SummaryOutcome::Preserved);

    assert!(read(&project.metadata(MODEL)).contains("Maintained by hand."));
    // owner_name came from the fresh manifest.
    assert_eq!(
        column_descriptions(&project.metadata(MODEL)),
        referenced(&["parcel_id", "owner_name"])
    );
}

#[tokio::test]
async fn structural_extraction_only_calls_for_descriptions() {
    let project = Project::new(&[MODEL]);
    let script = ScriptedCompletion::with_responses([DESCRIBED, SUMMARY]);
    let pipeline = Pipeline::new(
        script,
        FixedManifest::new(),
        &general(ExtractionMode::Structural),
    );
    let mut store = DocumentationStore::open(&project.store).await.unwrap();

    let report = pipeline
        .run_model(&project.models, MODEL, &mut store)
        .await
        .unwrap();

    let calls = pipeline.completion().calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].payload, "parcel_id\nowner_name");
    assert_eq!(report.references, 2);
}

#[tokio::test]
async fn missing_source_fails_before_any_external_call() {
    let project = Project::new(&[]);
    let manifests = FixedManifest::new();
    let pipeline = Pipeline::new(ScriptedCompletion::new(), manifests, &general(ExtractionMode::Model));
    let mut store = DocumentationStore::open(&project.store).await.unwrap();

    let err = pipeline
        .run_model(&project.models, "ghost", &mut store)
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::MissingSource(_)));
    assert_eq!(pipeline.completion().call_count(), 0);
    assert!(!project.store.exists());
}

#[tokio::test]
async fn batch_continues_past_failed_models() {
    let project = Project::new(&["broken", MODEL]);
    let script = ScriptedCompletion::with_responses(["parcel_id, owner_name", DESCRIBED, SUMMARY]);
    let pipeline = Pipeline::new(
        script,
        FixedManifest::failing_for(&["broken"]),
        &general(ExtractionMode::Model),
    );
    let mut store = DocumentationStore::open(&project.store).await.unwrap();
    let models = autodoc_engine::discover_models(&project.models).await.unwrap();
    assert_eq!(models, vec!["broken", MODEL]);

    let mut events = Vec::new();
    let report = pipeline
        .run_batch(&project.models, &models, &mut store, |event| {
            events.push(match event {
                Progress::Started { model, .. } => format!("start {model}"),
                Progress::Finished { model, succeeded } => format!("done {model} {succeeded}"),
            });
        })
        .await;

    assert!(!report.is_success());
    assert_eq!(report.total(), 2);
    assert_eq!(report.failed[0].model, "broken");
    assert!(report.failed[0].error.contains("Compilation Error"));
    assert_eq!(report.succeeded[0].model, MODEL);
    assert_eq!(
        events,
        vec![
            "start broken",
            "done broken false",
            "start stg_parcels",
            "done stg_parcels true",
        ]
    );
}

#[tokio::test]
async fn service_failure_leaves_store_untouched() {
    let project = Project::new(&[MODEL]);
    let script = ScriptedCompletion::with_responses(["parcel_id, owner_name"]);
    script.push_failure("connection reset");
    let pipeline = Pipeline::new(script, FixedManifest::new(), &general(ExtractionMode::Model));
    let mut store = DocumentationStore::open(&project.store).await.unwrap();

    let err = pipeline
        .run_model(&project.models, MODEL, &mut store)
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Service(_)));
    assert!(!project.store.exists());
    assert!(!project.metadata(MODEL).exists());
}

#[tokio::test]
async fn shared_metadata_file_gets_its_own_entry() {
    let project = Project::new(&[MODEL]);
    let metadata = "\
version: 2
models:
  - name: stg_owners
    description: \"Owners, maintained by hand.\"
    columns:
      - name: owner_id
";
    std::fs::write(project.metadata(MODEL), metadata).unwrap();

    let script = ScriptedCompletion::with_responses(["parcel_id, owner_name", DESCRIBED, SUMMARY]);
    let pipeline = Pipeline::new(script, FixedManifest::new(), &general(ExtractionMode::Model));
    let mut store = DocumentationStore::open(&project.store).await.unwrap();

    let report = pipeline
        .run_model(&project.models, MODEL, &mut store)
        .await
        .unwrap();

    assert_eq!(report.summary, SummaryOutcome::Generated);
    assert_eq!(report.references, 2);
    assert_eq!(
        column_descriptions(&project.metadata(MODEL)),
        referenced(&["parcel_id", "owner_name"])
    );
    assert_eq!(model_entry(&project.metadata(MODEL), MODEL)["description"], SUMMARY);

    let owners = model_entry(&project.metadata(MODEL), "stg_owners");
    assert_eq!(owners["description"], "Owners, maintained by hand.");
    assert_eq!(owners["columns"].as_sequence().unwrap().len(), 1);
    assert_eq!(owners["columns"][0]["name"], "owner_id");
    assert!(owners["columns"][0].get("description").is_none());
}

#[tokio::test]
async fn extracted_names_missing_from_store_are_described() {
    let project = Project::new(&[MODEL]);
    let existing = "{% docs parcel_id %}\nThe identifier for the parcel.\n{% enddocs %}\n";
    std::fs::create_dir_all(project.store.parent().unwrap()).unwrap();
    std::fs::write(&project.store, existing).unwrap();

    // The store extraction answer names a block the store does not have.
    let script = ScriptedCompletion::with_responses([
        "parcel_id, owner_name",
        "parcel_id, owner_name",
        "{% docs owner_name %}\nName of the owner of record.\n{% enddocs %}",
        SUMMARY,
    ]);
    let pipeline = Pipeline::new(script, FixedManifest::new(), &general(ExtractionMode::Model));
    let mut store = DocumentationStore::open(&project.store).await.unwrap();

    let report = pipeline
        .run_model(&project.models, MODEL, &mut store)
        .await
        .unwrap();

    assert_eq!(pipeline.completion().calls()[2].payload, "owner_name");
    assert_eq!(report.described, vec!["owner_name"]);
    assert_eq!(
        blocks::block_names(&read(&project.store)),
        vec!["parcel_id", "owner_name"]
    );
    assert_eq!(
        column_descriptions(&project.metadata(MODEL)),
        referenced(&["parcel_id", "owner_name"])
    );
}
