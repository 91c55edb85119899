//! Conformance of nested documents to a compiled meta-schema.
//!
//! The walker descends the document and the meta-schema together, tracking
//! a `#`-rooted JSON pointer into the document. Every broken rule yields one
//! [`Violation`]; nothing stops the walk early.
//!
//! A `type` keyword listing several types is evaluated as an any-of with one
//! branch per type. If no branch passes, every branch's findings are
//! reported. The same flattening applies to failing `anyOf` and `oneOf`.
//!
//! Documents nested deeper than [`MAX_NESTING_DEPTH`] are not descended
//! further; the cut-off point gets a single `maximum nesting depth exceeded`
//! finding.

use regex::Regex;
use serde_json::{Map, Number, Value};
use std::collections::HashSet;
use std::fmt::Write as _;
use std::sync::{Arc, LazyLock};

use crate::email::is_valid_email;
use crate::error::SchemaError;
use crate::report::Violation;
use crate::schema::{
    Dependency, Draft, InstanceType, Items, Keywords, Limit, MetaSchema, Node, NodeId,
    escape_pointer_segment,
};

static URI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:[^\s]*$").unwrap());

/// Deepest container nesting, counted from the document root, that the
/// walker descends into. YAML input is capped at the same depth when parsed.
pub const MAX_NESTING_DEPTH: usize = 64;

static URI_REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[^\s]*$").unwrap());

/// Checks documents against one meta-schema. Cheap to clone and shareable
/// across threads.
#[derive(Clone, Debug)]
pub struct SchemaConformanceChecker {
    meta: Arc<MetaSchema>,
}

impl SchemaConformanceChecker {
    pub fn new(meta: MetaSchema) -> Self {
        SchemaConformanceChecker {
            meta: Arc::new(meta),
        }
    }

    /// A checker over the embedded meta-schema of `draft`.
    pub fn for_draft(draft: Draft) -> Result<Self, SchemaError> {
        Ok(Self::new(MetaSchema::for_draft(draft)?))
    }

    pub fn meta_schema(&self) -> &MetaSchema {
        &self.meta
    }

    /// Validates `document` as a schema, returning one violation per
    /// non-conformance in meta-schema evaluation order.
    pub fn check(&self, document: &Value) -> Vec<Violation> {
        let mut out = Vec::new();
        let walker = Walker { meta: &self.meta };
        walker.validate(MetaSchema::ROOT, document, "#", 0, &mut out);
        out
    }

    /// Validates a declared definition. An empty definition is undeclared
    /// and always conforms.
    pub fn check_definition(&self, definition: &Map<String, Value>) -> Vec<Violation> {
        if definition.is_empty() {
            return Vec::new();
        }
        self.check(&Value::Object(definition.clone()))
    }
}

struct Walker<'m> {
    meta: &'m MetaSchema,
}

impl Walker<'_> {
    fn validate(
        &self,
        id: NodeId,
        instance: &Value,
        path: &str,
        depth: usize,
        out: &mut Vec<Violation>,
    ) {
        if depth > MAX_NESTING_DEPTH {
            out.push(Violation::at(path, "maximum nesting depth exceeded"));
            return;
        }
        let kw = match self.meta.node(id) {
            Node::Bool(true) => return,
            Node::Bool(false) => {
                out.push(Violation::at(path, "false schema always fails"));
                return;
            }
            Node::Schema(kw) => kw,
        };

        if let Some(target) = kw.reference {
            self.validate(target, instance, path, depth, out);
            return;
        }

        match kw.types.as_deref() {
            None => self.typed(kw, instance, path, depth, out),
            Some([only]) => {
                if matches_type(*only, instance) {
                    self.typed(kw, instance, path, depth, out);
                } else {
                    out.push(type_mismatch(*only, instance, path));
                }
            }
            Some(types) => {
                let mut branches = Vec::with_capacity(types.len());
                let mut passed = false;
                for &t in types {
                    let mut found = Vec::new();
                    if matches_type(t, instance) {
                        self.typed(kw, instance, path, depth, &mut found);
                    } else {
                        found.push(type_mismatch(t, instance, path));
                    }
                    if found.is_empty() {
                        passed = true;
                        break;
                    }
                    branches.push(found);
                }
                if !passed {
                    out.extend(branches.into_iter().flatten());
                }
            }
        }

        self.combined(kw, instance, path, depth, out);
    }

    fn is_valid(&self, id: NodeId, instance: &Value, path: &str, depth: usize) -> bool {
        let mut scratch = Vec::new();
        self.validate(id, instance, path, depth, &mut scratch);
        scratch.is_empty()
    }

    fn typed(
        &self,
        kw: &Keywords,
        instance: &Value,
        path: &str,
        depth: usize,
        out: &mut Vec<Violation>,
    ) {
        match instance {
            Value::Object(map) => self.object(kw, instance, map, path, depth, out),
            Value::Array(items) => self.array(kw, items, path, depth, out),
            Value::String(s) => string(kw, s, path, out),
            Value::Number(n) => number(kw, n, path, out),
            Value::Bool(_) | Value::Null => {}
        }
    }

    fn combined(
        &self,
        kw: &Keywords,
        instance: &Value,
        path: &str,
        depth: usize,
        out: &mut Vec<Violation>,
    ) {
        if let Some(allowed) = &kw.enumeration
            && !allowed.iter().any(|candidate| json_equal(candidate, instance))
        {
            out.push(Violation::at(
                path,
                format!("{} is not a valid enum value", render(instance)),
            ));
        }

        if let Some(constant) = &kw.constant
            && !json_equal(constant, instance)
        {
            out.push(Violation::at(
                path,
                format!("{} does not match the const value", render(instance)),
            ));
        }

        for &id in &kw.all_of {
            self.validate(id, instance, path, depth, out);
        }

        if !kw.any_of.is_empty() {
            let mut found = Vec::new();
            let mut matched = false;
            for &id in &kw.any_of {
                let mut branch = Vec::new();
                self.validate(id, instance, path, depth, &mut branch);
                if branch.is_empty() {
                    matched = true;
                    break;
                }
                found.append(&mut branch);
            }
            if !matched {
                out.append(&mut found);
            }
        }

        if !kw.one_of.is_empty() {
            let mut found = Vec::new();
            let mut matches = 0usize;
            for &id in &kw.one_of {
                let mut branch = Vec::new();
                self.validate(id, instance, path, depth, &mut branch);
                if branch.is_empty() {
                    matches += 1;
                } else {
                    found.append(&mut branch);
                }
            }
            match matches {
                0 => out.append(&mut found),
                1 => {}
                n => out.push(Violation::at(
                    path,
                    format!("{} subschemas matched instead of one", n),
                )),
            }
        }

        if let Some(id) = kw.not
            && self.is_valid(id, instance, path, depth)
        {
            out.push(Violation::at(path, "subject must not be valid against schema"));
        }

        if let Some(condition) = kw.if_ {
            let branch = if self.is_valid(condition, instance, path, depth) {
                kw.then_
            } else {
                kw.else_
            };
            if let Some(id) = branch {
                self.validate(id, instance, path, depth, out);
            }
        }
    }

    fn object(
        &self,
        kw: &Keywords,
        instance: &Value,
        map: &Map<String, Value>,
        path: &str,
        depth: usize,
        out: &mut Vec<Violation>,
    ) {
        let child = depth + 1;
        for (name, id) in &kw.properties {
            if let Some(value) = map.get(name) {
                self.validate(*id, value, &child_path(path, name), child, out);
            }
        }

        for (re, id) in &kw.pattern_properties {
            for (key, value) in map {
                if re.is_match(key) {
                    self.validate(*id, value, &child_path(path, key), child, out);
                }
            }
        }

        if let Some(extra) = kw.additional_properties {
            for (key, value) in map {
                let declared = kw.properties.iter().any(|(name, _)| name == key)
                    || kw.pattern_properties.iter().any(|(re, _)| re.is_match(key));
                if declared {
                    continue;
                }
                if let Node::Bool(false) = self.meta.node(extra) {
                    out.push(Violation::at(
                        path,
                        format!("extraneous key [{}] is not permitted", key),
                    ));
                } else {
                    self.validate(extra, value, &child_path(path, key), child, out);
                }
            }
        }

        for key in &kw.required {
            if !map.contains_key(key) {
                out.push(Violation::at(
                    path,
                    format!("required key [{}] not found", key),
                ));
            }
        }

        let size = map.len() as u64;
        if let Some(min) = kw.min_properties
            && size < min
        {
            out.push(Violation::at(
                path,
                format!("minimum size: [{}], found: [{}]", min, size),
            ));
        }
        if let Some(max) = kw.max_properties
            && size > max
        {
            out.push(Violation::at(
                path,
                format!("maximum size: [{}], found: [{}]", max, size),
            ));
        }

        for (name, dependency) in &kw.dependencies {
            if !map.contains_key(name) {
                continue;
            }
            match dependency {
                Dependency::Properties(required) => {
                    for dep in required {
                        if !map.contains_key(dep) {
                            out.push(Violation::at(
                                path,
                                format!("property [{}] is required", dep),
                            ));
                        }
                    }
                }
                Dependency::Schema(id) => self.validate(*id, instance, path, depth, out),
            }
        }

        if let Some(id) = kw.property_names {
            for key in map.keys() {
                self.validate(id, &Value::String(key.clone()), path, depth, out);
            }
        }
    }

    fn array(
        &self,
        kw: &Keywords,
        items: &[Value],
        path: &str,
        depth: usize,
        out: &mut Vec<Violation>,
    ) {
        let child = depth + 1;
        match &kw.items {
            None => {}
            Some(Items::Uniform(id)) => {
                for (i, item) in items.iter().enumerate() {
                    self.validate(*id, item, &child_path(path, &i.to_string()), child, out);
                }
            }
            Some(Items::Tuple(ids)) => {
                for (i, (id, item)) in ids.iter().zip(items).enumerate() {
                    self.validate(*id, item, &child_path(path, &i.to_string()), child, out);
                }
                if let Some(extra) = kw.additional_items
                    && items.len() > ids.len()
                {
                    if let Node::Bool(false) = self.meta.node(extra) {
                        out.push(Violation::at(
                            path,
                            format!(
                                "expected: [{}] array items, found: [{}]",
                                ids.len(),
                                items.len()
                            ),
                        ));
                    } else {
                        for (i, item) in items.iter().enumerate().skip(ids.len()) {
                            let item_path = child_path(path, &i.to_string());
                            self.validate(extra, item, &item_path, child, out);
                        }
                    }
                }
            }
        }

        let len = items.len() as u64;
        if let Some(min) = kw.min_items
            && len < min
        {
            out.push(Violation::at(
                path,
                format!("expected minimum item count: {}, found: {}", min, len),
            ));
        }
        if let Some(max) = kw.max_items
            && len > max
        {
            out.push(Violation::at(
                path,
                format!("expected maximum item count: {}, found: {}", max, len),
            ));
        }

        if kw.unique_items && has_duplicates(items) {
            out.push(Violation::at(path, "array items are not unique"));
        }

        if let Some(id) = kw.contains {
            let any = items
                .iter()
                .enumerate()
                .any(|(i, item)| {
                    self.is_valid(id, item, &child_path(path, &i.to_string()), child)
                });
            if !any {
                out.push(Violation::at(
                    path,
                    "expected at least one array item to match 'contains' schema",
                ));
            }
        }
    }
}

fn string(kw: &Keywords, s: &str, path: &str, out: &mut Vec<Violation>) {
    let len = s.chars().count() as u64;
    if let Some(min) = kw.min_length
        && len < min
    {
        out.push(Violation::at(
            path,
            format!("expected minLength: {}, actual: {}", min, len),
        ));
    }
    if let Some(max) = kw.max_length
        && len > max
    {
        out.push(Violation::at(
            path,
            format!("expected maxLength: {}, actual: {}", max, len),
        ));
    }
    if let Some(re) = &kw.pattern
        && !re.is_match(s)
    {
        out.push(Violation::at(
            path,
            format!("string [{}] does not match pattern {}", s, re.as_str()),
        ));
    }
    if let Some(format) = &kw.format
        && let Some(description) = format_violation(format, s)
    {
        out.push(Violation::at(
            path,
            format!("[{}] is not a valid {}", s, description),
        ));
    }
}

/// Describes what `s` fails to be under `format`. Unknown formats are
/// annotations and always pass.
fn format_violation(format: &str, s: &str) -> Option<&'static str> {
    let valid = match format {
        "regex" => Regex::new(s).is_ok(),
        "uri" => URI_RE.is_match(s),
        "uri-reference" => URI_REFERENCE_RE.is_match(s),
        "email" => is_valid_email(s),
        _ => return None,
    };
    if valid {
        return None;
    }
    Some(match format {
        "regex" => "regular expression",
        "uri" => "URI",
        "uri-reference" => "URI reference",
        _ => "email address",
    })
}

fn number(kw: &Keywords, n: &Number, path: &str, out: &mut Vec<Violation>) {
    let Some(value) = n.as_f64() else {
        return;
    };
    for limit in &kw.lower {
        if limit.exclusive && value <= limit.value {
            out.push(Violation::at(
                path,
                format!("{} is not greater than {}", n, limit.text),
            ));
        } else if !limit.exclusive && value < limit.value {
            out.push(Violation::at(
                path,
                format!("{} is not greater or equal to {}", n, limit.text),
            ));
        }
    }
    for limit in &kw.upper {
        if limit.exclusive && value >= limit.value {
            out.push(Violation::at(
                path,
                format!("{} is not less than {}", n, limit.text),
            ));
        } else if !limit.exclusive && value > limit.value {
            out.push(Violation::at(
                path,
                format!("{} is not less or equal to {}", n, limit.text),
            ));
        }
    }
    if let Some(divisor) = &kw.multiple_of
        && !is_multiple(n, divisor)
    {
        out.push(Violation::at(
            path,
            format!("{} is not a multiple of {}", n, divisor.text),
        ));
    }
}

fn is_multiple(n: &Number, divisor: &Limit) -> bool {
    if let Some(i) = n.as_i64()
        && divisor.value.fract() == 0.0
        && divisor.value.abs() < i64::MAX as f64
    {
        let d = divisor.value as i64;
        return d != 0 && i % d == 0;
    }
    let Some(value) = n.as_f64() else {
        return true;
    };
    let quotient = value / divisor.value;
    (quotient - quotient.round()).abs() < 1e-9
}

fn matches_type(t: InstanceType, instance: &Value) -> bool {
    match (t, instance) {
        (InstanceType::Null, Value::Null) => true,
        (InstanceType::Boolean, Value::Bool(_)) => true,
        (InstanceType::Object, Value::Object(_)) => true,
        (InstanceType::Array, Value::Array(_)) => true,
        (InstanceType::String, Value::String(_)) => true,
        (InstanceType::Number, Value::Number(_)) => true,
        (InstanceType::Integer, Value::Number(n)) => {
            n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
        }
        _ => false,
    }
}

fn type_mismatch(expected: InstanceType, instance: &Value, path: &str) -> Violation {
    Violation::at(
        path,
        format!(
            "expected type: {}, found: {}",
            expected_kind(expected),
            found_kind(instance)
        ),
    )
}

fn expected_kind(t: InstanceType) -> &'static str {
    match t {
        InstanceType::Null => "Null",
        InstanceType::Boolean => "Boolean",
        InstanceType::Object => "JSONObject",
        InstanceType::Array => "JSONArray",
        InstanceType::Number => "Number",
        InstanceType::Integer => "Integer",
        InstanceType::String => "String",
    }
}

fn found_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "Null",
        Value::Bool(_) => "Boolean",
        Value::Object(_) => "JSONObject",
        Value::Array(_) => "JSONArray",
        Value::String(_) => "String",
        Value::Number(n) => match n.as_i64() {
            Some(i) if i32::try_from(i).is_ok() => "Integer",
            Some(_) => "Long",
            None if n.is_u64() => "BigInteger",
            None => "Double",
        },
    }
}

/// Strings render bare, everything else as compact JSON.
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn child_path(path: &str, segment: &str) -> String {
    format!("{}/{}", path, escape_pointer_segment(segment))
}

fn has_duplicates(items: &[Value]) -> bool {
    let mut seen = HashSet::with_capacity(items.len());
    items.iter().any(|item| !seen.insert(canonical(item)))
}

/// Structural JSON equality where numbers compare by value (`1 == 1.0`).
fn json_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => number_key(x) == number_key(y),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| json_equal(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, v)| y.get(k).is_some_and(|w| json_equal(v, w)))
        }
        _ => a == b,
    }
}

/// A string that is equal for two values exactly when [`json_equal`] holds:
/// numbers by value, object keys sorted.
fn canonical(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Number(n) => {
            out.push('n');
            out.push_str(&number_key(n));
        }
        Value::String(s) => {
            let _ = write!(out, "s{:?}", s);
        }
        Value::Array(items) => {
            out.push('[');
            for item in items {
                write_canonical(item, out);
                out.push(',');
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for key in keys {
                let _ = write!(out, "{:?}:", key);
                write_canonical(&map[key.as_str()], out);
                out.push(',');
            }
            out.push('}');
        }
        other => out.push_str(&other.to_string()),
    }
}

/// Integral values render as integers whatever their JSON spelling, so
/// `1` and `1.0` share a key.
fn number_key(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            (f as i64).to_string()
        }
        Some(f) if f.fract() == 0.0 && f >= 0.0 && f < u64::MAX as f64 => (f as u64).to_string(),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}
