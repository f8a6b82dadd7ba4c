//! Declarative schemas for request parts. A schema either returns the sanitized
//! value or every field error it found, in declaration order.

use crate::error::FieldError;
use regex::Regex;
use serde_json::{Map, Number, Value};
use std::sync::OnceLock;

pub trait Schema: Send + Sync {
    fn parse(&self, input: &Value) -> Result<Value, Vec<FieldError>>;
}

/// Collects errors against the current dotted path while a schema walks its input.
struct Ctx {
    path: Vec<String>,
    errors: Vec<FieldError>,
}

impl Ctx {
    fn new() -> Self {
        Ctx {
            path: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn push(&mut self, message: impl Into<String>) {
        self.errors.push(FieldError::new(self.path.join("."), message));
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub enum FieldSchema {
    Text(TextSchema),
    Number(NumberSchema),
    Object(ObjectSchema),
}

impl FieldSchema {
    fn is_optional(&self) -> bool {
        match self {
            FieldSchema::Text(s) => s.optional,
            FieldSchema::Number(s) => s.optional,
            FieldSchema::Object(_) => false,
        }
    }

    fn default_value(&self) -> Option<Value> {
        match self {
            FieldSchema::Text(s) => s.default.clone().map(Value::String),
            FieldSchema::Number(s) => s.default.and_then(number_value),
            FieldSchema::Object(_) => None,
        }
    }

    fn check(&self, input: &Value, ctx: &mut Ctx) -> Option<Value> {
        match self {
            FieldSchema::Text(s) => s.check(input, ctx),
            FieldSchema::Number(s) => s.check(input, ctx),
            FieldSchema::Object(s) => s.check(input, ctx),
        }
    }
}

impl From<TextSchema> for FieldSchema {
    fn from(s: TextSchema) -> Self {
        FieldSchema::Text(s)
    }
}

impl From<NumberSchema> for FieldSchema {
    fn from(s: NumberSchema) -> Self {
        FieldSchema::Number(s)
    }
}

impl From<ObjectSchema> for FieldSchema {
    fn from(s: ObjectSchema) -> Self {
        FieldSchema::Object(s)
    }
}

#[derive(Default)]
pub struct ObjectSchema {
    fields: Vec<(String, FieldSchema)>,
    strict: bool,
}

pub fn object() -> ObjectSchema {
    ObjectSchema::default()
}

impl ObjectSchema {
    pub fn field(mut self, name: impl Into<String>, schema: impl Into<FieldSchema>) -> Self {
        self.fields.push((name.into(), schema.into()));
        self
    }

    /// Reject keys that are not declared instead of stripping them.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    fn check(&self, input: &Value, ctx: &mut Ctx) -> Option<Value> {
        let Value::Object(map) = input else {
            ctx.push(format!("Expected object, received {}", type_name(input)));
            return None;
        };
        let before = ctx.errors.len();
        let mut out = Map::new();
        for (name, schema) in &self.fields {
            ctx.path.push(name.clone());
            match map.get(name) {
                Some(v) => {
                    if let Some(clean) = schema.check(v, ctx) {
                        out.insert(name.clone(), clean);
                    }
                }
                None => {
                    if let Some(d) = schema.default_value() {
                        out.insert(name.clone(), d);
                    } else if !schema.is_optional() {
                        ctx.push("Required");
                    }
                }
            }
            ctx.path.pop();
        }
        if self.strict {
            let unknown: Vec<String> = map
                .keys()
                .filter(|k| !self.fields.iter().any(|(name, _)| name == *k))
                .map(|k| format!("'{}'", k))
                .collect();
            if !unknown.is_empty() {
                ctx.push(format!("Unrecognized key(s) in object: {}", unknown.join(", ")));
            }
        }
        (ctx.errors.len() == before).then_some(Value::Object(out))
    }
}

impl Schema for ObjectSchema {
    fn parse(&self, input: &Value) -> Result<Value, Vec<FieldError>> {
        let mut ctx = Ctx::new();
        match self.check(input, &mut ctx) {
            Some(v) if ctx.errors.is_empty() => Ok(v),
            _ => Err(ctx.errors),
        }
    }
}

enum TextCheck {
    Min(usize),
    Max(usize),
    Email,
    Pattern(Regex),
}

pub struct TextSchema {
    checks: Vec<(TextCheck, Option<String>)>,
    optional: bool,
    default: Option<String>,
}

pub fn text() -> TextSchema {
    TextSchema {
        checks: Vec::new(),
        optional: false,
        default: None,
    }
}

impl TextSchema {
    pub fn min(mut self, n: usize) -> Self {
        self.checks.push((TextCheck::Min(n), None));
        self
    }

    pub fn max(mut self, n: usize) -> Self {
        self.checks.push((TextCheck::Max(n), None));
        self
    }

    pub fn email(mut self) -> Self {
        self.checks.push((TextCheck::Email, None));
        self
    }

    pub fn pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.checks.push((TextCheck::Pattern(Regex::new(pattern)?), None));
        Ok(self)
    }

    /// Override the message of the most recently added check.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        if let Some((_, slot)) = self.checks.last_mut() {
            *slot = Some(message.into());
        }
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn default(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    fn check(&self, input: &Value, ctx: &mut Ctx) -> Option<Value> {
        let Value::String(s) = input else {
            ctx.push(format!("Expected string, received {}", type_name(input)));
            return None;
        };
        let len = s.chars().count();
        let before = ctx.errors.len();
        for (check, custom) in &self.checks {
            let failed = match check {
                TextCheck::Min(n) => (len < *n).then(|| format!("String must contain at least {} character(s)", n)),
                TextCheck::Max(n) => (len > *n).then(|| format!("String must contain at most {} character(s)", n)),
                TextCheck::Email => (!is_email(s)).then(|| "Invalid email".to_string()),
                TextCheck::Pattern(re) => (!re.is_match(s)).then(|| "Invalid".to_string()),
            };
            if let Some(default_message) = failed {
                ctx.push(custom.clone().unwrap_or(default_message));
            }
        }
        (ctx.errors.len() == before).then(|| Value::String(s.clone()))
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_'+\-.]*[A-Za-z0-9_+\-]@([A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$")
            .expect("email pattern compiles")
    })
}

fn is_email(s: &str) -> bool {
    !s.starts_with('.') && !s.contains("..") && email_regex().is_match(s)
}

pub struct NumberSchema {
    coerce: bool,
    integer: bool,
    min: Option<f64>,
    max: Option<f64>,
    optional: bool,
    default: Option<f64>,
}

pub fn number() -> NumberSchema {
    NumberSchema {
        coerce: false,
        integer: false,
        min: None,
        max: None,
        optional: false,
        default: None,
    }
}

fn number_value(n: f64) -> Option<Value> {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        Some(Value::Number(Number::from(n as i64)))
    } else {
        Number::from_f64(n).map(Value::Number)
    }
}

impl NumberSchema {
    /// Accept numeric strings (query strings and path params are always text).
    pub fn coerce(mut self) -> Self {
        self.coerce = true;
        self
    }

    pub fn int(mut self) -> Self {
        self.integer = true;
        self
    }

    pub fn min(mut self, n: f64) -> Self {
        self.min = Some(n);
        self
    }

    pub fn max(mut self, n: f64) -> Self {
        self.max = Some(n);
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn default(mut self, n: f64) -> Self {
        self.default = Some(n);
        self
    }

    fn check(&self, input: &Value, ctx: &mut Ctx) -> Option<Value> {
        let n = match input {
            Value::Number(n) => n.as_f64(),
            Value::String(s) if self.coerce => match s.trim() {
                "" => Some(0.0),
                t => Some(t.parse::<f64>().unwrap_or(f64::NAN)),
            },
            other => {
                ctx.push(format!("Expected number, received {}", type_name(other)));
                return None;
            }
        };
        let n = match n {
            Some(n) if n.is_finite() => n,
            _ => {
                ctx.push("Expected number, received nan");
                return None;
            }
        };
        let before = ctx.errors.len();
        if self.integer && n.fract() != 0.0 {
            ctx.push("Expected integer, received float");
        }
        if let Some(min) = self.min {
            if n < min {
                ctx.push(format!("Number must be greater than or equal to {}", min));
            }
        }
        if let Some(max) = self.max {
            if n > max {
                ctx.push(format!("Number must be less than or equal to {}", max));
            }
        }
        if ctx.errors.len() != before {
            return None;
        }
        number_value(n)
    }
}
