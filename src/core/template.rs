use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue, ser::PrettyFormatter};

/// Escapes text placed inside the report body.
fn escape_text(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// TOML has no null; drop those entries the way table writers usually do.
fn without_nulls(value: &JsonValue) -> Option<JsonValue> {
    match value {
        JsonValue::Null => None,
        JsonValue::Object(map) => Some(JsonValue::Object(
            map.iter()
                .filter_map(|(k, v)| without_nulls(v).map(|v| (k.clone(), v)))
                .collect(),
        )),
        JsonValue::Array(items) => Some(JsonValue::Array(
            items.iter().filter_map(without_nulls).collect(),
        )),
        other => Some(other.clone()),
    }
}

pub fn to_pretty_json(data: &Map<String, JsonValue>) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    data.serialize(&mut ser)?;
    Ok(String::from_utf8(buf)?)
}

pub fn to_toml(data: &Map<String, JsonValue>) -> Result<String> {
    let table = without_nulls(&JsonValue::Object(data.clone())).unwrap_or_default();
    toml::to_string(&table).context("data cannot be expressed as TOML")
}

/// Renders the structured-data report page.
///
/// `title` is the stored artifact name, `heading` the name the caller asked for.
pub fn generate_report(
    data: &Map<String, JsonValue>,
    title: &str,
    heading: &str,
    generated_at: &str,
) -> Result<String> {
    let toml_text = to_toml(data)?;
    let json_text = to_pretty_json(data)?;

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>{}</title>
</head>
<body>
    <h2>{}</h2>
    <h2>{}</h2>
    <h3>TOML</h3><pre>{}</pre>
    <h3>JSON</h3><pre>{}</pre>
</body>
</html>
"#,
        escape_text(title),
        escape_text(heading),
        generated_at,
        escape_text(&toml_text),
        escape_text(&json_text)
    );

    Ok(html)
}
