//! Output schema descriptors.
//!
//! A task can constrain the provider to a JSON shape. The same descriptor is
//! rendered as a JSON Schema document for the provider's structured-output
//! mode and used locally to validate whatever comes back before it is
//! handed to the next stage.

use serde_json::{json, Map, Value};

use crate::error::{CoreError, SchemaViolation};

#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    String {
        description: Option<String>,
    },
    Integer {
        description: Option<String>,
    },
    Number {
        description: Option<String>,
    },
    Boolean {
        description: Option<String>,
    },
    /// A string restricted to the listed literals.
    Enum {
        values: Vec<String>,
        description: Option<String>,
    },
    Array {
        items: Box<Schema>,
        description: Option<String>,
    },
    Object {
        fields: Vec<Field>,
        description: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub schema: Schema,
    pub required: bool,
}

impl Field {
    pub fn required(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            required: false,
        }
    }
}

impl Schema {
    pub fn string() -> Self {
        Schema::String { description: None }
    }

    pub fn integer() -> Self {
        Schema::Integer { description: None }
    }

    pub fn number() -> Self {
        Schema::Number { description: None }
    }

    pub fn boolean() -> Self {
        Schema::Boolean { description: None }
    }

    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Schema::Enum {
            values: values.into_iter().map(Into::into).collect(),
            description: None,
        }
    }

    pub fn array(items: Schema) -> Self {
        Schema::Array {
            items: Box::new(items),
            description: None,
        }
    }

    pub fn object(fields: Vec<Field>) -> Self {
        Schema::Object {
            fields,
            description: None,
        }
    }

    /// Attach a human-readable description, forwarded to the provider.
    pub fn describe(mut self, text: impl Into<String>) -> Self {
        let slot = match &mut self {
            Schema::String { description }
            | Schema::Integer { description }
            | Schema::Number { description }
            | Schema::Boolean { description }
            | Schema::Enum { description, .. }
            | Schema::Array { description, .. }
            | Schema::Object { description, .. } => description,
        };
        *slot = Some(text.into());
        self
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Schema::String { description }
            | Schema::Integer { description }
            | Schema::Number { description }
            | Schema::Boolean { description }
            | Schema::Enum { description, .. }
            | Schema::Array { description, .. }
            | Schema::Object { description, .. } => description.as_deref(),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Schema::String { .. } | Schema::Enum { .. } => "string",
            Schema::Integer { .. } => "integer",
            Schema::Number { .. } => "number",
            Schema::Boolean { .. } => "boolean",
            Schema::Array { .. } => "array",
            Schema::Object { .. } => "object",
        }
    }

    /// Render as a JSON Schema document accepted by strict structured output.
    ///
    /// Strict mode wants every property listed in `required`, so optional
    /// fields are expressed as nullable instead of omittable.
    pub fn to_json_schema(&self) -> Value {
        let mut doc = match self {
            Schema::String { .. }
            | Schema::Integer { .. }
            | Schema::Number { .. }
            | Schema::Boolean { .. } => json!({ "type": self.type_name() }),
            Schema::Enum { values, .. } => json!({ "type": "string", "enum": values }),
            Schema::Array { items, .. } => json!({
                "type": "array",
                "items": items.to_json_schema(),
            }),
            Schema::Object { fields, .. } => {
                let mut properties = Map::new();
                for field in fields {
                    let rendered = field.schema.to_json_schema();
                    let rendered = if field.required {
                        rendered
                    } else {
                        json!({ "anyOf": [rendered, { "type": "null" }] })
                    };
                    properties.insert(field.name.clone(), rendered);
                }
                let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
                json!({
                    "type": "object",
                    "properties": properties,
                    "required": names,
                    "additionalProperties": false,
                })
            }
        };

        if let Some(text) = self.description() {
            doc["description"] = json!(text);
        }
        doc
    }

    /// Check `value` against this schema, reporting the first mismatch.
    pub fn validate(&self, value: &Value) -> Result<(), SchemaViolation> {
        self.validate_at(value, "$")
    }

    fn validate_at(&self, value: &Value, path: &str) -> Result<(), SchemaViolation> {
        match (self, value) {
            (Schema::String { .. }, Value::String(_)) => Ok(()),
            (Schema::Integer { .. }, Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(()),
            (Schema::Number { .. }, Value::Number(_)) => Ok(()),
            (Schema::Boolean { .. }, Value::Bool(_)) => Ok(()),
            (Schema::Enum { values, .. }, Value::String(s)) => {
                if values.iter().any(|v| v == s) {
                    Ok(())
                } else {
                    Err(SchemaViolation::new(
                        path,
                        format!("'{}' is not one of [{}]", s, values.join(", ")),
                    ))
                }
            }
            (Schema::Array { items, .. }, Value::Array(elements)) => {
                for (index, element) in elements.iter().enumerate() {
                    items.validate_at(element, &format!("{path}[{index}]"))?;
                }
                Ok(())
            }
            (Schema::Object { fields, .. }, Value::Object(map)) => {
                if let Some(extra) = map.keys().find(|k| !fields.iter().any(|f| &f.name == *k)) {
                    return Err(SchemaViolation::new(
                        format!("{path}.{extra}"),
                        "property is not declared in the schema",
                    ));
                }
                for field in fields {
                    let child = format!("{path}.{}", field.name);
                    match map.get(&field.name) {
                        None | Some(Value::Null) if field.required => {
                            return Err(SchemaViolation::new(child, "missing required field"));
                        }
                        None | Some(Value::Null) => {}
                        Some(inner) => field.schema.validate_at(inner, &child)?,
                    }
                }
                Ok(())
            }
            (schema, other) => Err(SchemaViolation::new(
                path,
                format!("expected {}, found {}", schema.type_name(), json_type_name(other)),
            )),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The named top-level schema a task attaches to its provider call.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSchema {
    name: String,
    description: Option<String>,
    root: Schema,
}

impl OutputSchema {
    /// `name` is sent to the provider and must match `^[a-zA-Z0-9_-]{1,64}$`.
    /// Structured output only accepts an object at the top level.
    pub fn new(name: impl Into<String>, root: Schema) -> Result<Self, CoreError> {
        let name = name.into();
        if !matches!(root, Schema::Object { .. }) {
            return Err(CoreError::InvalidDefinition(format!(
                "{name}: output schema root must be an object"
            )));
        }
        Ok(Self {
            name,
            description: None,
            root,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn root(&self) -> &Schema {
        &self.root
    }

    pub fn to_json_schema(&self) -> Value {
        let mut doc = self.root.to_json_schema();
        doc["title"] = json!(self.name);
        if let Some(text) = &self.description {
            doc["description"] = json!(text);
        }
        doc
    }

    /// Parse raw provider text and validate it.
    pub fn parse(&self, raw: &str) -> Result<Value, SchemaViolation> {
        let value: Value = serde_json::from_str(raw.trim())
            .map_err(|e| SchemaViolation::new("$", format!("response is not valid JSON: {e}")))?;
        self.root.validate(&value)?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn needs_schema() -> OutputSchema {
        OutputSchema::new(
            "needs",
            Schema::object(vec![
                Field::required(
                    "user_needs",
                    Schema::array(Schema::object(vec![
                        Field::required("need", Schema::string()),
                        Field::required(
                            "importance",
                            Schema::enumeration(["High", "Medium", "Low"]),
                        ),
                        Field::optional("votes", Schema::integer()),
                    ])),
                ),
                Field::optional("note", Schema::string().describe("free text")),
            ]),
        )
        .unwrap()
        .with_description("Needs expressed by the interviewee")
    }

    #[test]
    fn renders_strict_json_schema() {
        let doc = needs_schema().to_json_schema();

        assert_eq!(doc["title"], "needs");
        assert_eq!(doc["description"], "Needs expressed by the interviewee");
        assert_eq!(doc["additionalProperties"], false);
        assert_eq!(doc["required"], json!(["user_needs", "note"]));
        assert_eq!(
            doc["properties"]["note"],
            json!({
                "anyOf": [{ "type": "string", "description": "free text" }, { "type": "null" }]
            })
        );

        let item = &doc["properties"]["user_needs"]["items"];
        assert_eq!(item["additionalProperties"], false);
        assert_eq!(
            item["properties"]["importance"],
            json!({ "type": "string", "enum": ["High", "Medium", "Low"] })
        );
    }

    #[test]
    fn accepts_conforming_value() {
        let raw = r#"{"user_needs": [{"need": "clear steps", "importance": "High", "votes": 3}],
                     "note": null}"#;
        let value = needs_schema().parse(raw).unwrap();
        assert_eq!(value["user_needs"][0]["need"], "clear steps");
    }

    #[test]
    fn optional_fields_may_be_omitted() {
        let raw = r#"{"user_needs": []}"#;
        assert!(needs_schema().parse(raw).is_ok());
    }

    #[test]
    fn rejects_missing_required_field() {
        let err = needs_schema()
            .parse(r#"{"user_needs": [{"importance": "Low"}]}"#)
            .unwrap_err();
        assert_eq!(err.path, "$.user_needs[0].need");
        assert_eq!(err.reason, "missing required field");
    }

    #[test]
    fn rejects_null_for_required_field() {
        let err = needs_schema().parse(r#"{"user_needs": null}"#).unwrap_err();
        assert_eq!(err.path, "$.user_needs");
    }

    #[test]
    fn rejects_value_outside_enum() {
        let err = needs_schema()
            .parse(r#"{"user_needs": [{"need": "x", "importance": "Urgent"}]}"#)
            .unwrap_err();
        assert_eq!(err.path, "$.user_needs[0].importance");
        assert!(err.reason.contains("'Urgent'"));
    }

    #[test]
    fn rejects_wrong_primitive_type() {
        let err = needs_schema()
            .parse(r#"{"user_needs": [{"need": "x", "importance": "Low", "votes": 1.5}]}"#)
            .unwrap_err();
        assert_eq!(err.path, "$.user_needs[0].votes");
        assert_eq!(err.reason, "expected integer, found number");
    }

    #[test]
    fn rejects_undeclared_property() {
        let err = needs_schema()
            .parse(r#"{"user_needs": [], "extra": true}"#)
            .unwrap_err();
        assert_eq!(err.path, "$.extra");
    }

    #[test]
    fn rejects_malformed_json() {
        let err = needs_schema().parse("Sure! Here is the JSON:").unwrap_err();
        assert_eq!(err.path, "$");
        assert!(err.reason.starts_with("response is not valid JSON"));
    }

    #[test]
    fn root_must_be_an_object() {
        let err = OutputSchema::new("tags", Schema::array(Schema::string())).unwrap_err();
        assert_eq!(err.kind(), "invalid_definition");
        assert!(err.to_string().contains("tags"), "message: {err}");
        assert!(OutputSchema::new("tags", Schema::object(vec![])).is_ok());
    }
}
