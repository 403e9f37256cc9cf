//! Search domain builder for Odoo
//!
//! A domain is the service's record filter: a boolean combination of
//! `[field, operator, value]` clauses written in prefix (Polish) notation,
//! e.g. `["|", ["a", "=", 1], ["b", "=", 2]]`.
//!
//! # Example
//! ```
//! use odoo_jsonrpc::domain::Domain;
//!
//! let adults = Domain::new().greater_than_or_equal("age", 18);
//! let filter = Domain::new()
//!     .equals("active", true)
//!     .and([adults]);
//!
//! assert_eq!(
//!     filter.to_string(),
//!     r#"["&",["active","=",true],["age",">=",18]]"#
//! );
//! ```

use serde::de::{self, Deserializer};
use serde::ser::{SerializeTuple, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::protocol::MAX_DOMAIN_DEPTH;

/// Comparison operator of a single clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
  Eq,
  Ne,
  Lt,
  Gt,
  Le,
  Ge,
  Like,
  ILike,
  NotLike,
  NotILike,
  In,
  NotIn,
  ChildOf,
}

impl Operator {
  pub fn as_str(&self) -> &'static str {
    match self {
      Operator::Eq => "=",
      Operator::Ne => "!=",
      Operator::Lt => "<",
      Operator::Gt => ">",
      Operator::Le => "<=",
      Operator::Ge => ">=",
      Operator::Like => "like",
      Operator::ILike => "ilike",
      Operator::NotLike => "not like",
      Operator::NotILike => "not ilike",
      Operator::In => "in",
      Operator::NotIn => "not in",
      Operator::ChildOf => "child_of",
    }
  }
}

impl fmt::Display for Operator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Operator {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    Ok(match s {
      "=" => Operator::Eq,
      "!=" => Operator::Ne,
      "<" => Operator::Lt,
      ">" => Operator::Gt,
      "<=" => Operator::Le,
      ">=" => Operator::Ge,
      "like" => Operator::Like,
      "ilike" => Operator::ILike,
      "not like" => Operator::NotLike,
      "not ilike" => Operator::NotILike,
      "in" => Operator::In,
      "not in" => Operator::NotIn,
      "child_of" => Operator::ChildOf,
      other => return Err(Error::InvalidDomain(format!("unknown operator {other:?}"))),
    })
  }
}

impl Serialize for Operator {
  fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(self.as_str())
  }
}

/// A single `[field, operator, value]` condition
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
  pub field: String,
  pub operator: Operator,
  pub value: Value,
}

impl Clause {
  pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
    Self {
      field: field.into(),
      operator,
      value: value.into(),
    }
  }
}

impl Serialize for Clause {
  fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    let mut tuple = serializer.serialize_tuple(3)?;
    tuple.serialize_element(&self.field)?;
    tuple.serialize_element(&self.operator)?;
    tuple.serialize_element(&self.value)?;
    tuple.end()
  }
}

/// Node of a canonical prefix expression.
///
/// `And` and `Or` are strictly binary; longer chains nest.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
  Clause(Clause),
  And(Box<Node>, Box<Node>),
  Or(Box<Node>, Box<Node>),
  Not(Box<Node>),
}

impl Node {
  pub fn and(left: Node, right: Node) -> Node {
    Node::And(Box::new(left), Box::new(right))
  }

  pub fn or(left: Node, right: Node) -> Node {
    Node::Or(Box::new(left), Box::new(right))
  }

  pub fn not(inner: Node) -> Node {
    Node::Not(Box::new(inner))
  }

  /// Wire symbol of a logical node, `None` for a clause
  pub fn symbol(&self) -> Option<&'static str> {
    match self {
      Node::Clause(_) => None,
      Node::And(..) => Some("&"),
      Node::Or(..) => Some("|"),
      Node::Not(_) => Some("!"),
    }
  }

  pub fn is_logical(&self) -> bool {
    self.symbol().is_some()
  }

  /// Flatten into prefix tokens
  pub fn to_prefix(&self) -> Vec<Value> {
    let mut out = Vec::new();
    let mut pending = vec![self];
    while let Some(node) = pending.pop() {
      match node {
        Node::Clause(c) => out.push(Value::Array(vec![
          Value::String(c.field.clone()),
          Value::String(c.operator.as_str().to_string()),
          c.value.clone(),
        ])),
        Node::And(l, r) | Node::Or(l, r) => {
          out.push(Value::from(node.symbol().unwrap_or_default()));
          pending.push(r);
          pending.push(l);
        }
        Node::Not(inner) => {
          out.push(Value::from("!"));
          pending.push(inner);
        }
      }
    }
    out
  }

  fn parse<'a>(tokens: &mut impl Iterator<Item = &'a Value>, depth: usize) -> Result<Node> {
    if depth > MAX_DOMAIN_DEPTH {
      return Err(Error::InvalidDomain(format!(
        "domain is nested deeper than {MAX_DOMAIN_DEPTH} operators"
      )));
    }

    let token = tokens
      .next()
      .ok_or_else(|| Error::InvalidDomain("operator is missing an operand".to_string()))?;
    let next = depth + 1;
    match token {
      Value::String(s) if s == "&" => {
        Ok(Node::and(Node::parse(tokens, next)?, Node::parse(tokens, next)?))
      }
      Value::String(s) if s == "|" => {
        Ok(Node::or(Node::parse(tokens, next)?, Node::parse(tokens, next)?))
      }
      Value::String(s) if s == "!" => Ok(Node::not(Node::parse(tokens, next)?)),
      Value::Array(parts) if parts.len() == 3 => {
        let field = parts[0].as_str().ok_or_else(|| {
          Error::InvalidDomain(format!("clause field must be a string: {}", parts[0]))
        })?;
        let operator = parts[1]
          .as_str()
          .ok_or_else(|| {
            Error::InvalidDomain(format!("clause operator must be a string: {}", parts[1]))
          })?
          .parse()?;
        Ok(Node::Clause(Clause::new(field, operator, parts[2].clone())))
      }
      other => Err(Error::InvalidDomain(format!("unexpected domain token {other}"))),
    }
  }
}

impl From<Clause> for Node {
  fn from(clause: Clause) -> Self {
    Node::Clause(clause)
  }
}

impl Serialize for Node {
  fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    self.to_prefix().serialize(serializer)
  }
}

/// Search domain.
///
/// Holds either a list of clauses that are implicitly ANDed, or a single
/// logical root produced by [`Domain::and`], [`Domain::or`] or
/// [`Domain::negate`]. Builder methods consume the domain and return the
/// extended value; clone first to keep the original.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Domain {
  entries: Vec<Node>,
}

impl Domain {
  /// Create an empty domain (matches every record)
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn entries(&self) -> &[Node] {
    &self.entries
  }

  /// Append a raw entry (a clause or a previously built sub-expression)
  pub fn push(mut self, node: impl Into<Node>) -> Self {
    self.entries.push(node.into());
    self
  }

  /// Append a clause with an explicit operator
  pub fn clause(
    self,
    field: impl Into<String>,
    operator: Operator,
    value: impl Into<Value>,
  ) -> Self {
    self.push(Clause::new(field, operator, value))
  }

  pub fn equals(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
    self.clause(field, Operator::Eq, value)
  }

  pub fn not_equals(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
    self.clause(field, Operator::Ne, value)
  }

  pub fn less_than(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
    self.clause(field, Operator::Lt, value)
  }

  pub fn greater_than(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
    self.clause(field, Operator::Gt, value)
  }

  pub fn less_than_or_equal(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
    self.clause(field, Operator::Le, value)
  }

  pub fn greater_than_or_equal(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
    self.clause(field, Operator::Ge, value)
  }

  /// Case-sensitive pattern match; the server wraps the value in `%`
  pub fn like(self, field: impl Into<String>, pattern: impl Into<String>) -> Self {
    self.clause(field, Operator::Like, pattern.into())
  }

  pub fn ilike(self, field: impl Into<String>, pattern: impl Into<String>) -> Self {
    self.clause(field, Operator::ILike, pattern.into())
  }

  pub fn not_like(self, field: impl Into<String>, pattern: impl Into<String>) -> Self {
    self.clause(field, Operator::NotLike, pattern.into())
  }

  pub fn not_ilike(self, field: impl Into<String>, pattern: impl Into<String>) -> Self {
    self.clause(field, Operator::NotILike, pattern.into())
  }

  pub fn is_in<V: Into<Value>>(
    self,
    field: impl Into<String>,
    values: impl IntoIterator<Item = V>,
  ) -> Self {
    let values: Vec<Value> = values.into_iter().map(Into::into).collect();
    self.clause(field, Operator::In, values)
  }

  pub fn not_in<V: Into<Value>>(
    self,
    field: impl Into<String>,
    values: impl IntoIterator<Item = V>,
  ) -> Self {
    let values: Vec<Value> = values.into_iter().map(Into::into).collect();
    self.clause(field, Operator::NotIn, values)
  }

  /// Match records under `value` in a parent/child hierarchy
  pub fn child_of(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
    self.clause(field, Operator::ChildOf, value)
  }

  /// Reduce the domain to its single canonical root.
  ///
  /// Returns `None` for an empty domain. A lone logical entry is returned as
  /// is; otherwise entries are left-folded into nested `And` nodes in append
  /// order. Logical entries pushed after the first are skipped.
  pub fn expression(&self) -> Option<Node> {
    self.clone().into_expression()
  }

  pub fn into_expression(self) -> Option<Node> {
    let mut entries = self.entries.into_iter();
    let first = entries.next()?;
    Some(entries.fold(first, |acc, entry| match entry {
      Node::Clause(_) => Node::and(acc, entry),
      skipped => {
        tracing::trace!(entry = ?skipped, "skipping non-clause domain entry");
        acc
      }
    }))
  }

  /// Combine with `others` using AND, receiver first.
  ///
  /// Empty domains are ignored. With no arguments the receiver is returned
  /// unchanged.
  pub fn and(self, others: impl IntoIterator<Item = Domain>) -> Domain {
    self.combine(others, Node::and)
  }

  /// Combine with `others` using OR, receiver first.
  pub fn or(self, others: impl IntoIterator<Item = Domain>) -> Domain {
    self.combine(others, Node::or)
  }

  /// Negate the whole domain. An empty domain stays empty.
  pub fn negate(self) -> Domain {
    match self.into_expression() {
      Some(root) => Domain::from(Node::not(root)),
      None => Domain::new(),
    }
  }

  fn combine(self, others: impl IntoIterator<Item = Domain>, op: fn(Node, Node) -> Node) -> Domain {
    let mut others = others.into_iter().peekable();
    if others.peek().is_none() {
      return self;
    }

    std::iter::once(self)
      .chain(others)
      .filter_map(Domain::into_expression)
      .reduce(op)
      .map(Domain::from)
      .unwrap_or_default()
  }

  /// Parse the wire form, e.g. `["|", ["a", "=", 1], ["b", "=", 2]]`.
  ///
  /// Complete top-level expressions are implicitly ANDed, so
  /// `[a, "|", b, c]` reads as `a AND (b OR c)`. The result holds a single
  /// root. Nesting deeper than `MAX_DOMAIN_DEPTH` is rejected.
  pub fn from_prefix(tokens: &[Value]) -> Result<Domain> {
    let mut iter = tokens.iter().peekable();
    let mut root: Option<Node> = None;
    while iter.peek().is_some() {
      let node = Node::parse(&mut iter, 0)?;
      root = Some(match root {
        Some(acc) => Node::and(acc, node),
        None => node,
      });
    }
    Ok(root.map(Domain::from).unwrap_or_default())
  }

  /// Canonical wire form; `[]` for an empty domain
  pub fn to_prefix(&self) -> Vec<Value> {
    self.expression().map(|root| root.to_prefix()).unwrap_or_default()
  }
}

impl From<Node> for Domain {
  fn from(node: Node) -> Self {
    Domain { entries: vec![node] }
  }
}

impl From<Clause> for Domain {
  fn from(clause: Clause) -> Self {
    Domain::from(Node::Clause(clause))
  }
}

impl TryFrom<Value> for Domain {
  type Error = Error;

  fn try_from(value: Value) -> Result<Self> {
    match value {
      Value::Array(tokens) => Domain::from_prefix(&tokens),
      other => Err(Error::InvalidDomain(format!("domain must be an array, got {other}"))),
    }
  }
}

impl Serialize for Domain {
  fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    self.to_prefix().serialize(serializer)
  }
}

impl<'de> Deserialize<'de> for Domain {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
    let tokens = Vec::<Value>::deserialize(deserializer)?;
    Domain::from_prefix(&tokens).map_err(de::Error::custom)
  }
}

impl fmt::Display for Domain {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", Value::Array(self.to_prefix()))
  }
}
