//! Meta-schema loading and compilation.
//!
//! A meta-schema is compiled once into an arena of [`Node`]s. Every `$ref`
//! is resolved during compilation, so a compiled [`MetaSchema`] can be
//! walked without any further failure mode. Recursive references (`"#"`)
//! become back-edges into the arena.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::HashMap;

use crate::error::SchemaError;

const DRAFT_07_META_SCHEMA: &str = include_str!("../schemas/draft-07.json");
const DRAFT_04_META_SCHEMA: &str = include_str!("../schemas/draft-04.json");

/// JSON Schema draft whose meta-schema and keyword semantics apply.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Draft {
    #[serde(rename = "draft-04")]
    Draft4,
    #[default]
    #[serde(rename = "draft-07")]
    Draft7,
}

impl Draft {
    /// The embedded meta-schema document for this draft.
    pub fn meta_schema_source(self) -> &'static str {
        match self {
            Draft::Draft4 => DRAFT_04_META_SCHEMA,
            Draft::Draft7 => DRAFT_07_META_SCHEMA,
        }
    }

    /// The canonical URI of this draft's meta-schema.
    pub fn uri(self) -> &'static str {
        match self {
            Draft::Draft4 => "http://json-schema.org/draft-04/schema#",
            Draft::Draft7 => "http://json-schema.org/draft-07/schema#",
        }
    }

    fn id_keyword(self) -> &'static str {
        match self {
            Draft::Draft4 => "id",
            Draft::Draft7 => "$id",
        }
    }
}

pub(crate) type NodeId = usize;

/// JSON value kinds a `type` keyword can name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum InstanceType {
    Null,
    Boolean,
    Object,
    Array,
    Number,
    Integer,
    String,
}

impl InstanceType {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "null" => InstanceType::Null,
            "boolean" => InstanceType::Boolean,
            "object" => InstanceType::Object,
            "array" => InstanceType::Array,
            "number" => InstanceType::Number,
            "integer" => InstanceType::Integer,
            "string" => InstanceType::String,
            _ => return None,
        })
    }
}

/// A numeric bound, kept with its source text for messages.
#[derive(Clone, Debug)]
pub(crate) struct Limit {
    pub value: f64,
    pub text: String,
    pub exclusive: bool,
}

#[derive(Clone, Debug)]
pub(crate) enum Items {
    Uniform(NodeId),
    Tuple(Vec<NodeId>),
}

#[derive(Clone, Debug)]
pub(crate) enum Dependency {
    Properties(Vec<String>),
    Schema(NodeId),
}

/// Compiled keywords of one schema object. Absent keywords are `None` or empty.
#[derive(Clone, Debug, Default)]
pub(crate) struct Keywords {
    pub reference: Option<NodeId>,
    pub types: Option<Vec<InstanceType>>,
    pub enumeration: Option<Vec<Value>>,
    pub constant: Option<Value>,
    pub all_of: Vec<NodeId>,
    pub any_of: Vec<NodeId>,
    pub one_of: Vec<NodeId>,
    pub not: Option<NodeId>,
    pub if_: Option<NodeId>,
    pub then_: Option<NodeId>,
    pub else_: Option<NodeId>,

    pub properties: Vec<(String, NodeId)>,
    pub pattern_properties: Vec<(Regex, NodeId)>,
    pub additional_properties: Option<NodeId>,
    pub required: Vec<String>,
    pub min_properties: Option<u64>,
    pub max_properties: Option<u64>,
    pub property_names: Option<NodeId>,
    pub dependencies: Vec<(String, Dependency)>,

    pub items: Option<Items>,
    pub additional_items: Option<NodeId>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: bool,
    pub contains: Option<NodeId>,

    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<Regex>,
    pub format: Option<String>,

    pub lower: Vec<Limit>,
    pub upper: Vec<Limit>,
    pub multiple_of: Option<Limit>,
}

#[derive(Clone, Debug)]
pub(crate) enum Node {
    Bool(bool),
    Schema(Box<Keywords>),
}

/// A compiled, immutable meta-schema.
#[derive(Clone, Debug)]
pub struct MetaSchema {
    draft: Draft,
    id: Option<String>,
    nodes: Vec<Node>,
}

impl MetaSchema {
    /// Compiles the embedded meta-schema of `draft`.
    pub fn for_draft(draft: Draft) -> Result<Self, SchemaError> {
        Self::parse(draft.meta_schema_source(), draft)
    }

    /// Parses and compiles a meta-schema supplied as JSON text.
    pub fn parse(source: &str, draft: Draft) -> Result<Self, SchemaError> {
        let document: Value =
            serde_json::from_str(source).map_err(|e| SchemaError::Parse(e.to_string()))?;
        Self::from_value(&document, draft)
    }

    /// Compiles a meta-schema document.
    pub fn from_value(document: &Value, draft: Draft) -> Result<Self, SchemaError> {
        let id = document
            .get(draft.id_keyword())
            .and_then(Value::as_str)
            .map(|s| s.trim_end_matches('#').to_string());

        let mut compiler = Compiler {
            document,
            draft,
            id: id.as_deref(),
            nodes: Vec::new(),
            by_pointer: HashMap::new(),
        };
        let root = compiler.compile_at("")?;
        debug_assert_eq!(root, MetaSchema::ROOT);
        let nodes = compiler.nodes;
        check_reference_cycles(&nodes, &compiler.by_pointer)?;

        tracing::debug!(?draft, id = ?id, nodes = nodes.len(), "compiled meta-schema");
        Ok(MetaSchema { draft, id, nodes })
    }

    pub(crate) const ROOT: NodeId = 0;

    pub fn draft(&self) -> Draft {
        self.draft
    }

    /// The meta-schema's own identifier, without a trailing `#`.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }
}

// ─── Compilation ────────────────────────────────────────────────────────────

struct Compiler<'a> {
    document: &'a Value,
    draft: Draft,
    id: Option<&'a str>,
    nodes: Vec<Node>,
    by_pointer: HashMap<String, NodeId>,
}

impl<'a> Compiler<'a> {
    /// Compiles the schema at `pointer` (RFC 6901, relative to the document
    /// root), reusing the node if that location was already compiled.
    fn compile_at(&mut self, pointer: &str) -> Result<NodeId, SchemaError> {
        if let Some(&id) = self.by_pointer.get(pointer) {
            return Ok(id);
        }
        let document = self.document;
        let value = document
            .pointer(pointer)
            .ok_or_else(|| SchemaError::UnresolvedReference {
                pointer: format!("#{}", pointer),
                reference: format!("#{}", pointer),
            })?;

        // Reserve the slot first so recursive references resolve to it.
        let id = self.nodes.len();
        self.nodes.push(Node::Bool(true));
        self.by_pointer.insert(pointer.to_string(), id);

        let node = match value {
            Value::Bool(b) => Node::Bool(*b),
            Value::Object(obj) => Node::Schema(Box::new(self.compile_keywords(obj, pointer)?)),
            _ => {
                return Err(SchemaError::MalformedNode {
                    pointer: format!("#{}", pointer),
                });
            }
        };
        self.nodes[id] = node;
        Ok(id)
    }

    fn child(&mut self, pointer: &str, segments: &[&str]) -> Result<NodeId, SchemaError> {
        let mut p = pointer.to_string();
        for seg in segments {
            p.push('/');
            p.push_str(&escape_pointer_segment(seg));
        }
        self.compile_at(&p)
    }

    fn compile_keywords(
        &mut self,
        obj: &'a Map<String, Value>,
        pointer: &str,
    ) -> Result<Keywords, SchemaError> {
        let mut kw = Keywords::default();

        // A reference replaces every sibling keyword.
        if let Some(reference) = obj.get("$ref") {
            let reference = reference
                .as_str()
                .ok_or_else(|| malformed(pointer, "$ref", "must be a string"))?;
            let target = self.resolve_reference(reference, pointer)?;
            kw.reference = Some(self.compile_at(&target)?);
            return Ok(kw);
        }

        if let Some(t) = obj.get("type") {
            kw.types = Some(parse_types(t, pointer)?);
        }
        if let Some(e) = obj.get("enum") {
            let values = e
                .as_array()
                .ok_or_else(|| malformed(pointer, "enum", "must be an array"))?;
            kw.enumeration = Some(values.clone());
        }
        if let Some(c) = obj.get("const") {
            kw.constant = Some(c.clone());
        }
        kw.all_of = self.schema_list(obj, "allOf", pointer)?;
        kw.any_of = self.schema_list(obj, "anyOf", pointer)?;
        kw.one_of = self.schema_list(obj, "oneOf", pointer)?;
        kw.not = self.optional_schema(obj, "not", pointer)?;
        if self.draft == Draft::Draft7 {
            kw.if_ = self.optional_schema(obj, "if", pointer)?;
            kw.then_ = self.optional_schema(obj, "then", pointer)?;
            kw.else_ = self.optional_schema(obj, "else", pointer)?;
        }

        // Object keywords.
        if let Some(props) = obj.get("properties") {
            let props = props
                .as_object()
                .ok_or_else(|| malformed(pointer, "properties", "must be an object"))?;
            for name in props.keys() {
                let id = self.child(pointer, &["properties", name.as_str()])?;
                kw.properties.push((name.clone(), id));
            }
        }
        if let Some(props) = obj.get("patternProperties") {
            let props = props
                .as_object()
                .ok_or_else(|| malformed(pointer, "patternProperties", "must be an object"))?;
            for pattern in props.keys() {
                let re = Regex::new(pattern)
                    .map_err(|e| malformed(pointer, "patternProperties", &e.to_string()))?;
                let id = self.child(pointer, &["patternProperties", pattern.as_str()])?;
                kw.pattern_properties.push((re, id));
            }
        }
        kw.additional_properties = self.optional_schema(obj, "additionalProperties", pointer)?;
        if let Some(req) = obj.get("required") {
            kw.required = string_list(req, pointer, "required")?;
        }
        kw.min_properties = count(obj, "minProperties", pointer)?;
        kw.max_properties = count(obj, "maxProperties", pointer)?;
        if self.draft == Draft::Draft7 {
            kw.property_names = self.optional_schema(obj, "propertyNames", pointer)?;
        }
        if let Some(deps) = obj.get("dependencies") {
            let deps = deps
                .as_object()
                .ok_or_else(|| malformed(pointer, "dependencies", "must be an object"))?;
            for (name, dep) in deps {
                let dependency = match dep {
                    Value::Array(_) => {
                        Dependency::Properties(string_list(dep, pointer, "dependencies")?)
                    }
                    _ => Dependency::Schema(
                        self.child(pointer, &["dependencies", name.as_str()])?,
                    ),
                };
                kw.dependencies.push((name.clone(), dependency));
            }
        }

        // Array keywords.
        match obj.get("items") {
            None => {}
            Some(Value::Array(list)) => {
                let mut ids = Vec::with_capacity(list.len());
                for i in 0..list.len() {
                    ids.push(self.child(pointer, &["items", i.to_string().as_str()])?);
                }
                kw.items = Some(Items::Tuple(ids));
            }
            Some(_) => kw.items = Some(Items::Uniform(self.child(pointer, &["items"])?)),
        }
        kw.additional_items = self.optional_schema(obj, "additionalItems", pointer)?;
        kw.min_items = count(obj, "minItems", pointer)?;
        kw.max_items = count(obj, "maxItems", pointer)?;
        if let Some(u) = obj.get("uniqueItems") {
            kw.unique_items = u
                .as_bool()
                .ok_or_else(|| malformed(pointer, "uniqueItems", "must be a boolean"))?;
        }
        if self.draft == Draft::Draft7 {
            kw.contains = self.optional_schema(obj, "contains", pointer)?;
        }

        // String keywords.
        kw.min_length = count(obj, "minLength", pointer)?;
        kw.max_length = count(obj, "maxLength", pointer)?;
        if let Some(p) = obj.get("pattern") {
            let p = p
                .as_str()
                .ok_or_else(|| malformed(pointer, "pattern", "must be a string"))?;
            kw.pattern =
                Some(Regex::new(p).map_err(|e| malformed(pointer, "pattern", &e.to_string()))?);
        }
        if let Some(f) = obj.get("format") {
            let f = f
                .as_str()
                .ok_or_else(|| malformed(pointer, "format", "must be a string"))?;
            kw.format = Some(f.to_string());
        }

        // Numeric keywords.
        self.compile_bounds(obj, pointer, &mut kw)?;
        if let Some(m) = obj.get("multipleOf") {
            let limit = limit(m, false, pointer, "multipleOf")?;
            if limit.value <= 0.0 {
                return Err(malformed(pointer, "multipleOf", "must be greater than 0"));
            }
            kw.multiple_of = Some(limit);
        }

        Ok(kw)
    }

    fn compile_bounds(
        &self,
        obj: &Map<String, Value>,
        pointer: &str,
        kw: &mut Keywords,
    ) -> Result<(), SchemaError> {
        match self.draft {
            Draft::Draft4 => {
                let flag = |key: &str| -> Result<bool, SchemaError> {
                    match obj.get(key) {
                        None => Ok(false),
                        Some(v) => v
                            .as_bool()
                            .ok_or_else(|| malformed(pointer, key, "must be a boolean")),
                    }
                };
                let exclusive_min = flag("exclusiveMinimum")?;
                let exclusive_max = flag("exclusiveMaximum")?;
                if let Some(v) = obj.get("minimum") {
                    kw.lower.push(limit(v, exclusive_min, pointer, "minimum")?);
                }
                if let Some(v) = obj.get("maximum") {
                    kw.upper.push(limit(v, exclusive_max, pointer, "maximum")?);
                }
            }
            Draft::Draft7 => {
                if let Some(v) = obj.get("minimum") {
                    kw.lower.push(limit(v, false, pointer, "minimum")?);
                }
                if let Some(v) = obj.get("exclusiveMinimum") {
                    kw.lower.push(limit(v, true, pointer, "exclusiveMinimum")?);
                }
                if let Some(v) = obj.get("maximum") {
                    kw.upper.push(limit(v, false, pointer, "maximum")?);
                }
                if let Some(v) = obj.get("exclusiveMaximum") {
                    kw.upper.push(limit(v, true, pointer, "exclusiveMaximum")?);
                }
            }
        }
        Ok(())
    }

    fn optional_schema(
        &mut self,
        obj: &Map<String, Value>,
        key: &str,
        pointer: &str,
    ) -> Result<Option<NodeId>, SchemaError> {
        if obj.contains_key(key) {
            Ok(Some(self.child(pointer, &[key])?))
        } else {
            Ok(None)
        }
    }

    fn schema_list(
        &mut self,
        obj: &Map<String, Value>,
        key: &str,
        pointer: &str,
    ) -> Result<Vec<NodeId>, SchemaError> {
        let Some(list) = obj.get(key) else {
            return Ok(Vec::new());
        };
        let list = list
            .as_array()
            .ok_or_else(|| malformed(pointer, key, "must be an array of schemas"))?;
        (0..list.len())
            .map(|i| self.child(pointer, &[key, i.to_string().as_str()]))
            .collect()
    }

    /// Maps a `$ref` onto a pointer into this document.
    fn resolve_reference(&self, reference: &str, pointer: &str) -> Result<String, SchemaError> {
        let unresolved = || SchemaError::UnresolvedReference {
            pointer: format!("#{}", pointer),
            reference: reference.to_string(),
        };
        let (base, fragment) = match reference.split_once('#') {
            Some((base, fragment)) => (base, fragment),
            None => (reference, ""),
        };
        if !base.is_empty() && Some(base) != self.id {
            return Err(unresolved());
        }
        if fragment.is_empty() || fragment.starts_with('/') {
            Ok(fragment.to_string())
        } else {
            Err(unresolved())
        }
    }
}

/// Rejects references that lead back to themselves without passing
/// through a schema that consumes part of the instance.
fn check_reference_cycles(
    nodes: &[Node],
    by_pointer: &HashMap<String, NodeId>,
) -> Result<(), SchemaError> {
    for start in 0..nodes.len() {
        let mut seen = vec![start];
        let mut current = start;
        while let Node::Schema(kw) = &nodes[current]
            && let Some(next) = kw.reference
        {
            if seen.contains(&next) {
                let pointer = by_pointer
                    .iter()
                    .find(|(_, id)| **id == start)
                    .map(|(p, _)| format!("#{}", p))
                    .unwrap_or_else(|| "#".to_string());
                return Err(SchemaError::ReferenceCycle { pointer });
            }
            seen.push(next);
            current = next;
        }
    }
    Ok(())
}

fn malformed(pointer: &str, keyword: &str, reason: &str) -> SchemaError {
    SchemaError::MalformedKeyword {
        pointer: format!("#{}", pointer),
        keyword: keyword.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_types(value: &Value, pointer: &str) -> Result<Vec<InstanceType>, SchemaError> {
    let parse_one = |v: &Value| {
        v.as_str()
            .and_then(InstanceType::parse)
            .ok_or_else(|| malformed(pointer, "type", &format!("unknown type {}", v)))
    };
    match value {
        Value::Array(list) if !list.is_empty() => list.iter().map(parse_one).collect(),
        Value::Array(_) => Err(malformed(pointer, "type", "must not be empty")),
        other => Ok(vec![parse_one(other)?]),
    }
}

fn string_list(value: &Value, pointer: &str, keyword: &str) -> Result<Vec<String>, SchemaError> {
    value
        .as_array()
        .and_then(|list| {
            list.iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
        })
        .ok_or_else(|| malformed(pointer, keyword, "must be an array of strings"))
}

fn count(obj: &Map<String, Value>, key: &str, pointer: &str) -> Result<Option<u64>, SchemaError> {
    match obj.get(key) {
        None => Ok(None),
        Some(v) => v
            .as_u64()
            .map(Some)
            .ok_or_else(|| malformed(pointer, key, "must be a non-negative integer")),
    }
}

fn limit(value: &Value, exclusive: bool, pointer: &str, keyword: &str) -> Result<Limit, SchemaError> {
    let number: &Number = value
        .as_number()
        .ok_or_else(|| malformed(pointer, keyword, "must be a number"))?;
    let value = number
        .as_f64()
        .ok_or_else(|| malformed(pointer, keyword, "must be a finite number"))?;
    Ok(Limit {
        value,
        text: number.to_string(),
        exclusive,
    })
}

/// Escapes a key for use as a JSON pointer segment (RFC 6901).
pub(crate) fn escape_pointer_segment(segment: &str) -> String {
    if segment.contains(['~', '/']) {
        segment.replace('~', "~0").replace('/', "~1")
    } else {
        segment.to_string()
    }
}
