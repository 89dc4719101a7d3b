//! Instructions sent to the completion service.

/// Lists the names inside `{% docs <name> %}` tags.
pub const STORE_EXTRACTION: &str = "\
You read Markdown files that hold dbt docs blocks.
Each block opens with {% docs <column name> %} and closes with {% enddocs %}.
List every <column name> that appears in an opening tag, in the order they appear.
Return only the names as a single comma-separated list, with no other text.
If there are no docs blocks, return NONE.";

/// Lists the column names in a codegen manifest.
pub const MANIFEST_EXTRACTION: &str = "\
You read dbt properties YAML generated by the codegen package.
List the `name` of every entry under `columns`, in the order they appear.
Do not include model names or any other keys.
Return only the names as a single comma-separated list, with no other text.
If there are no columns, return NONE.";

/// Column descriptions as docs blocks, written from `domain` expertise.
#[must_use]
pub fn describe_identifiers(domain: &str) -> String {
    format!(
        "\
You are an expert in {domain}. You frequently interpret technical column names \
and provide plain, informative descriptions.

You will receive a list of column names, one per line.
For each column:
1. Read the column name.
2. Write a one or two sentence description based on your expertise.
3. Output the description as a dbt docs block. For the column parcel_id you write:
{{% docs parcel_id %}}
This is the identifier for the parcel.
{{% enddocs %}}

Write exactly one block per column, using the column name exactly as given.
Only return the docs blocks."
    )
}

/// One-paragraph summary of a model's SQL.
pub const DESCRIBE_ENTITY: &str = "\
You will receive the SQL of a dbt model.
Describe what the transformation does: its sources, joins, filters, \
aggregations, and derived columns. Do not speculate about business meaning.
Write one short, factual paragraph in the present tense that starts with \"This model\".
Only return the paragraph.";
