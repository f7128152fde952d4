//! Extraction of question packages from the normalized SIQ JSON document.
//!
//! The document mirrors the package XML: attributes become `@name` keys, text
//! content becomes `#text`, and every child element is wrapped in an array
//! under its tag name (`rounds[].round[].themes[].theme[]...`).

use std::sync::Arc;

use axum::body::Bytes;
use futures::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;

use crate::state::package::{Package, PackageDocument, Question, Round, Theme};

/// Failures raised while turning uploaded bytes into a package.
#[derive(Debug, Error)]
pub enum PackageError {
    /// The upload was empty.
    #[error("package is empty")]
    Empty,
    /// The upload is not valid JSON.
    #[error("package is not valid JSON")]
    InvalidJson(#[from] serde_json::Error),
    /// The document root is not an object.
    #[error("package root must be an object")]
    NotAnObject,
    /// The document has no rounds at all.
    #[error("package has no rounds")]
    NoRounds,
}

/// Source of question packages.
pub trait PackageStore: Send + Sync {
    /// Turn uploaded bytes into a queryable package document.
    fn extract(&self, bytes: Bytes) -> BoxFuture<'static, Result<PackageDocument, PackageError>>;
}

/// Reads packages already converted to the normalized SIQ JSON shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct SiqJsonStore;

impl PackageStore for SiqJsonStore {
    fn extract(&self, bytes: Bytes) -> BoxFuture<'static, Result<PackageDocument, PackageError>> {
        Box::pin(async move { parse_document(&bytes) })
    }
}

/// Parse a normalized SIQ document.
pub fn parse_document(bytes: &[u8]) -> Result<PackageDocument, PackageError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(PackageError::Empty);
    }

    let raw: Value = serde_json::from_slice(bytes)?;
    if !raw.is_object() {
        return Err(PackageError::NotAnObject);
    }

    let rounds: Vec<Round> = children(&raw, "rounds", "round").map(parse_round).collect();
    if rounds.is_empty() {
        return Err(PackageError::NoRounds);
    }

    let package = Package {
        name: attr(&raw, "name"),
        rounds,
    };
    Ok(PackageDocument {
        raw: Arc::new(raw),
        package,
    })
}

fn parse_round(node: &Value) -> Round {
    Round {
        name: attr(node, "name"),
        themes: children(node, "themes", "theme").map(parse_theme).collect(),
    }
}

fn parse_theme(node: &Value) -> Theme {
    Theme {
        name: attr(node, "name"),
        questions: children(node, "questions", "question")
            .map(parse_question)
            .collect(),
    }
}

fn parse_question(node: &Value) -> Question {
    let text = param_items(node, "question").collect::<Vec<_>>().join(" ");

    let mut answers: Vec<String> = children(node, "right", "answer")
        .filter_map(text_of)
        .map(str::to_string)
        .collect();
    if answers.is_empty() {
        answers = param_items(node, "answer").map(str::to_string).collect();
    }

    Question {
        price: attr(node, "price"),
        text,
        answers,
    }
}

/// `#text` of every item of the `param` named `name`.
fn param_items<'a>(node: &'a Value, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    children(node, "params", "param")
        .filter(move |param| param.get("@name").and_then(Value::as_str) == Some(name))
        .flat_map(|param| elements(param, "item"))
        .filter_map(text_of)
}

/// Elements `<element>` nested under every `<container>` child of `node`.
fn children<'a>(
    node: &'a Value,
    container: &'a str,
    element: &'a str,
) -> impl Iterator<Item = &'a Value> + 'a {
    elements(node, container).flat_map(move |group| elements(group, element))
}

fn elements<'a>(node: &'a Value, tag: &str) -> impl Iterator<Item = &'a Value> + use<'a> {
    match node.get(tag) {
        Some(Value::Array(items)) => items.as_slice(),
        Some(single @ Value::Object(_)) => std::slice::from_ref(single),
        _ => &[],
    }
    .iter()
}

fn text_of(node: &Value) -> Option<&str> {
    node.get("#text")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
}

fn attr(node: &Value, name: &str) -> String {
    node.get(format!("@{name}").as_str())
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
