//! Per-model dbt properties files.
//!
//! The text-level functions take and return YAML text and report whether
//! anything changed; [`MetadataFile`] wraps them with a file that is written
//! after every change. Key order is preserved, formatting is not.

use std::borrow::Cow;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use autodoc_core::Identifier;
use serde_yaml::{Mapping, Value};

use crate::error::EngineError;
use crate::fs;

const MODELS: &str = "models";
const COLUMNS: &str = "columns";
const NAME: &str = "name";
const DESCRIPTION: &str = "description";

/// The expression that makes dbt pull a column description from the store.
#[must_use]
pub fn doc_reference(id: &str) -> String {
    format!("{{{{ doc(\"{id}\") }}}}")
}

/// Column names of the first model in a manifest, in order.
///
/// # Errors
///
/// Returns [`EngineError::Yaml`] or [`EngineError::Metadata`] if the text is
/// not a properties file with at least one model.
pub fn manifest_columns(manifest: &str) -> Result<Vec<String>, EngineError> {
    let doc = parse(manifest)?;
    let model = select_model(&doc, None)?;
    Ok(columns(model)
        .filter_map(|column| column_name(column).map(str::to_string))
        .collect())
}

/// Whether `model` already has a non-blank description.
///
/// # Errors
///
/// Returns an error if `metadata` is not a properties file.
pub fn has_summary(metadata: &str, model: &str) -> Result<bool, EngineError> {
    let doc = parse(metadata)?;
    Ok(has_description(select_model(&doc, Some(model))?))
}

/// Point every column named in `store_ids` at its store entry.
///
/// Returns the updated text (borrowed when nothing changed) and how many
/// columns now reference the store. Columns without a store entry are left
/// alone.
///
/// # Errors
///
/// Returns an error if `metadata` is not a properties file.
pub fn write_identifier_references<'a>(
    metadata: &'a str,
    model: &str,
    store_ids: &[Identifier],
) -> Result<(Cow<'a, str>, usize), EngineError> {
    let known: HashSet<&str> = store_ids.iter().map(Identifier::as_str).collect();
    let mut doc = parse(metadata)?;
    let mut referenced = 0;
    let mut changed = false;

    for column in columns_mut(select_model_mut(&mut doc, Some(model))?) {
        let Some(name) = column_name(column).filter(|n| known.contains(n)) else {
            continue;
        };
        let reference = Value::from(doc_reference(name));
        referenced += 1;
        if let Some(mapping) = column.as_mapping_mut()
            && mapping.get(DESCRIPTION) != Some(&reference)
        {
            set_after_name(mapping, DESCRIPTION, reference);
            changed = true;
        }
    }

    let text = if changed {
        Cow::Owned(serde_yaml::to_string(&doc)?)
    } else {
        Cow::Borrowed(metadata)
    };
    Ok((text, referenced))
}

/// Set the model description unless a non-blank one is already present.
///
/// An existing description is returned byte-for-byte.
///
/// # Errors
///
/// Returns an error if `metadata` is not a properties file.
pub fn write_entity_summary<'a>(
    metadata: &'a str,
    model: &str,
    summary: &str,
) -> Result<Cow<'a, str>, EngineError> {
    let mut doc = parse(metadata)?;
    let entry = select_model_mut(&mut doc, Some(model))?;
    if has_description(entry) || summary.trim().is_empty() {
        return Ok(Cow::Borrowed(metadata));
    }
    set_after_name(entry, DESCRIPTION, Value::from(summary.trim()));
    Ok(Cow::Owned(serde_yaml::to_string(&doc)?))
}

/// Append an entry for `model`, copied from the manifest, when `metadata`
/// has none.
///
/// Entries of other models are left untouched.
///
/// # Errors
///
/// Returns an error if either text is not a properties file.
pub fn add_model_entry<'a>(
    metadata: &'a str,
    manifest: &str,
    model: &str,
) -> Result<Cow<'a, str>, EngineError> {
    let mut doc = parse(metadata)?;
    if models(&doc).iter().any(|entry| is_named(entry, model)) {
        return Ok(Cow::Borrowed(metadata));
    }

    let fresh = parse(manifest)?;
    let mut entry = manifest_model(&fresh, model)?.clone();
    entry.insert(Value::from(NAME), Value::from(model));
    doc.get_mut(MODELS)
        .and_then(Value::as_sequence_mut)
        .ok_or_else(|| EngineError::Metadata("expected a top-level `models` list".into()))?
        .push(Value::Mapping(entry));
    Ok(Cow::Owned(serde_yaml::to_string(&doc)?))
}

/// Append manifest columns that `metadata` does not list yet.
///
/// Existing columns are never removed or reordered. Returns the updated text
/// and the names that were added.
///
/// # Errors
///
/// Returns an error if either text is not a properties file or `metadata`
/// has no entry for `model`.
pub fn add_missing_columns<'a>(
    metadata: &'a str,
    manifest: &str,
    model: &str,
) -> Result<(Cow<'a, str>, Vec<String>), EngineError> {
    let fresh = parse(manifest)?;
    let fresh_model = manifest_model(&fresh, model)?;

    let mut doc = parse(metadata)?;
    let entry = select_model_mut(&mut doc, Some(model))?;
    let present: HashSet<String> = columns(entry)
        .filter_map(|column| column_name(column).map(str::to_string))
        .collect();

    let additions: Vec<Value> = columns(fresh_model)
        .filter(|column| column_name(column).is_some_and(|name| !present.contains(name)))
        .cloned()
        .collect();
    if additions.is_empty() {
        return Ok((Cow::Borrowed(metadata), Vec::new()));
    }

    let added = additions
        .iter()
        .filter_map(|column| column_name(column).map(str::to_string))
        .collect();
    match entry.get_mut(COLUMNS).and_then(Value::as_sequence_mut) {
        Some(list) => list.extend(additions),
        None => {
            entry.insert(Value::from(COLUMNS), Value::Sequence(additions));
        }
    }
    Ok((Cow::Owned(serde_yaml::to_string(&doc)?), added))
}

fn parse(text: &str) -> Result<Value, EngineError> {
    let doc: Value = serde_yaml::from_str(text)?;
    if doc.get(MODELS).and_then(Value::as_sequence).is_none() {
        return Err(EngineError::Metadata("expected a top-level `models` list".into()));
    }
    Ok(doc)
}

fn models(doc: &Value) -> &[Value] {
    doc.get(MODELS)
        .and_then(Value::as_sequence)
        .map_or(&[][..], Vec::as_slice)
}

fn is_named(entry: &Value, model: &str) -> bool {
    entry.get(NAME).and_then(Value::as_str) == Some(model)
}

/// `None` picks the first entry; a name must match exactly.
fn model_index(models: &[Value], model: Option<&str>) -> Result<usize, EngineError> {
    if models.is_empty() {
        return Err(EngineError::Metadata("`models` list is empty".into()));
    }
    match model {
        None => Ok(0),
        Some(wanted) => models
            .iter()
            .position(|entry| is_named(entry, wanted))
            .ok_or_else(|| EngineError::Metadata(format!("no entry for model `{wanted}`"))),
    }
}

/// Codegen output describes the requested model, usually under its own name.
fn manifest_model<'v>(doc: &'v Value, model: &str) -> Result<&'v Mapping, EngineError> {
    let named = models(doc).iter().any(|entry| is_named(entry, model));
    select_model(doc, named.then_some(model))
}

fn select_model<'v>(doc: &'v Value, model: Option<&str>) -> Result<&'v Mapping, EngineError> {
    let models = models(doc);
    let index = model_index(models, model)?;
    models[index]
        .as_mapping()
        .ok_or_else(|| EngineError::Metadata("model entry is not a mapping".into()))
}

fn select_model_mut<'v>(
    doc: &'v mut Value,
    model: Option<&str>,
) -> Result<&'v mut Mapping, EngineError> {
    let models = doc
        .get_mut(MODELS)
        .and_then(Value::as_sequence_mut)
        .ok_or_else(|| EngineError::Metadata("expected a top-level `models` list".into()))?;
    let index = model_index(models, model)?;
    models[index]
        .as_mapping_mut()
        .ok_or_else(|| EngineError::Metadata("model entry is not a mapping".into()))
}

fn columns(model: &Mapping) -> impl Iterator<Item = &Value> {
    model
        .get(COLUMNS)
        .and_then(Value::as_sequence)
        .into_iter()
        .flatten()
}

fn columns_mut(model: &mut Mapping) -> impl Iterator<Item = &mut Value> {
    model
        .get_mut(COLUMNS)
        .and_then(Value::as_sequence_mut)
        .into_iter()
        .flatten()
}

fn column_name(column: &Value) -> Option<&str> {
    column.get(NAME).and_then(Value::as_str)
}

fn has_description(entry: &Mapping) -> bool {
    entry
        .get(DESCRIPTION)
        .and_then(Value::as_str)
        .is_some_and(|d| !d.trim().is_empty())
}

/// Set `key`, placing a new key right after `name`.
fn set_after_name(mapping: &mut Mapping, key: &str, value: Value) {
    if let Some(slot) = mapping.get_mut(key) {
        *slot = value;
        return;
    }

    let mut rebuilt = Mapping::with_capacity(mapping.len() + 1);
    let mut pending = Some(value);
    for (k, v) in std::mem::take(mapping) {
        let is_name = k.as_str() == Some(NAME);
        rebuilt.insert(k, v);
        if is_name && let Some(value) = pending.take() {
            rebuilt.insert(Value::from(key), value);
        }
    }
    if let Some(value) = pending {
        rebuilt.insert(Value::from(key), value);
    }
    *mapping = rebuilt;
}

/// A model's properties file, written after every change.
#[derive(Debug, Clone)]
pub struct MetadataFile {
    path: PathBuf,
    model: String,
    text: String,
    created: bool,
}

impl MetadataFile {
    /// Open the file at `path`, creating it from `manifest` if it is missing.
    ///
    /// An existing file without an entry for `model` gets one copied from
    /// the manifest.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Metadata`] or [`EngineError::Yaml`] if the
    /// existing file (or the manifest, on creation) is not a properties file
    /// with a model, and [`EngineError::Io`] on filesystem failures.
    pub async fn open_or_create(
        path: impl Into<PathBuf>,
        model: &str,
        manifest: &str,
    ) -> Result<Self, EngineError> {
        let path = path.into();
        let (text, created) = match fs::read_optional(&path).await? {
            Some(text) => {
                let extended = match add_model_entry(&text, manifest, model)? {
                    Cow::Borrowed(_) => None,
                    Cow::Owned(extended) => Some(extended),
                };
                match extended {
                    None => (text, false),
                    Some(extended) => {
                        fs::write_atomic(&path, &extended).await?;
                        tracing::info!(path = %path.display(), model, "model entry added to metadata");
                        (extended, false)
                    }
                }
            }
            None => {
                let mut text = manifest.trim_end().to_string();
                text.push('\n');
                (text, true)
            }
        };

        let doc = parse(&text)?;
        select_model(&doc, Some(model))?;

        if created {
            fs::write_atomic(&path, &text).await?;
            tracing::info!(path = %path.display(), "metadata created from manifest");
        }

        Ok(Self {
            path,
            model: model.to_string(),
            text,
            created,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether this run created the file.
    #[must_use]
    pub const fn created(&self) -> bool {
        self.created
    }

    /// # Errors
    ///
    /// Returns an error if the text no longer parses.
    pub fn has_summary(&self) -> Result<bool, EngineError> {
        has_summary(&self.text, &self.model)
    }

    /// Append columns the manifest has gained since the file was written.
    ///
    /// # Errors
    ///
    /// Returns parse errors for either document and [`EngineError::Io`] on
    /// write failure.
    pub async fn sync_columns(&mut self, manifest: &str) -> Result<Vec<String>, EngineError> {
        let (text, added) = add_missing_columns(&self.text, manifest, &self.model)?;
        if let Cow::Owned(text) = text {
            tracing::info!(model = %self.model, ?added, "columns added to metadata");
            self.persist(text).await?;
        }
        Ok(added)
    }

    /// # Errors
    ///
    /// Returns parse errors and [`EngineError::Io`] on write failure.
    pub async fn write_identifier_references(
        &mut self,
        store_ids: &[Identifier],
    ) -> Result<usize, EngineError> {
        let (text, referenced) = write_identifier_references(&self.text, &self.model, store_ids)?;
        if let Cow::Owned(text) = text {
            self.persist(text).await?;
        }
        Ok(referenced)
    }

    /// Returns whether the summary was written.
    ///
    /// # Errors
    ///
    /// Returns parse errors and [`EngineError::Io`] on write failure.
    pub async fn write_entity_summary(&mut self, summary: &str) -> Result<bool, EngineError> {
        match write_entity_summary(&self.text, &self.model, summary)? {
            Cow::Borrowed(_) => Ok(false),
            Cow::Owned(text) => {
                self.persist(text).await?;
                Ok(true)
            }
        }
    }

    async fn persist(&mut self, text: String) -> Result<(), EngineError> {
        fs::write_atomic(&self.path, &text).await?;
        self.text = text;
        Ok(())
    }
}
