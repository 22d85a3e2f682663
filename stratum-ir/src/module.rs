//! Module tree: operations, regions, and attributes
//!
//! Operations are opaque to the pipeline. An op has a dotted
//! `"dialect.name"` identifier, an attribute map, and zero or more nested
//! regions; passes attach whatever meaning they like to them.

use crate::markers::MarkerSet;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// An attribute value attached to a module or operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Attr {
    Unit,
    Bool(bool),
    Int(i64),
    Str(String),
    Array(Vec<Attr>),
}

/// Attribute map. Ordered so printing is deterministic.
pub type AttrMap = BTreeMap<String, Attr>;

/// A region: an ordered list of nested operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Region(pub Vec<Op>);

/// A single operation in the module tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Op {
    /// Dotted operation name, e.g. `"tile.load"`.
    pub name: String,
    pub attrs: AttrMap,
    pub regions: Vec<Region>,
}

impl Op {
    /// Create an op with no attributes and no regions.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: AttrMap::new(),
            regions: Vec::new(),
        }
    }

    /// Set an attribute, returning `self` for chaining.
    pub fn with_attr(mut self, key: impl Into<String>, value: Attr) -> Self {
        self.attrs.insert(key.into(), value);
        self
    }

    /// Append a region, returning `self` for chaining.
    pub fn with_region(mut self, region: Region) -> Self {
        self.regions.push(region);
        self
    }

    /// Walk this op and every nested op, depth first.
    pub fn walk<F: FnMut(&Op)>(&self, f: &mut F) {
        f(self);
        for region in &self.regions {
            for op in &region.0 {
                op.walk(f);
            }
        }
    }

    /// Walk this op and every nested op mutably, depth first.
    pub fn walk_mut<F: FnMut(&mut Op)>(&mut self, f: &mut F) {
        f(self);
        for region in &mut self.regions {
            for op in &mut region.0 {
                op.walk_mut(f);
            }
        }
    }
}

/// The program representation passed through every pass.
///
/// The marker set lives next to, not inside, the attribute map: markers are
/// a transient control side channel, and readers of the primary data never
/// see them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Module {
    pub name: String,
    pub attrs: AttrMap,
    pub body: Vec<Op>,
    pub markers: MarkerSet,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Walk every op in the module, depth first.
    pub fn walk<F: FnMut(&Op)>(&self, mut f: F) {
        for op in &self.body {
            op.walk(&mut f);
        }
    }

    /// Walk every op in the module mutably, depth first.
    pub fn walk_mut<F: FnMut(&mut Op)>(&mut self, mut f: F) {
        for op in &mut self.body {
            op.walk_mut(&mut f);
        }
    }

    /// Render the module in its textual form.
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    /// Check structural invariants.
    ///
    /// Used as the per-pass postcondition check when verification is
    /// enabled: a pass that leaves the tree malformed fails its stage.
    pub fn verify(&self) -> Result<(), VerifyError> {
        if self.name.is_empty() {
            return Err(VerifyError::EmptyModuleName);
        }
        let mut result = Ok(());
        self.walk(|op| {
            if result.is_err() {
                return;
            }
            if op.name.is_empty() {
                result = Err(VerifyError::EmptyOpName);
            } else if !op.name.contains('.') {
                result = Err(VerifyError::MissingNamespace {
                    op: op.name.clone(),
                });
            } else if op.attrs.keys().any(|k| k.is_empty()) {
                result = Err(VerifyError::EmptyAttrKey {
                    op: op.name.clone(),
                });
            }
        });
        result
    }
}

/// Structural invariant violations reported by [`Module::verify`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VerifyError {
    #[error("module name is empty")]
    EmptyModuleName,

    #[error("operation with empty name")]
    EmptyOpName,

    #[error("operation '{op}' has no dialect namespace (expected 'dialect.name')")]
    MissingNamespace { op: String },

    #[error("operation '{op}' has an attribute with an empty key")]
    EmptyAttrKey { op: String },
}

impl fmt::Display for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attr::Unit => write!(f, "unit"),
            Attr::Bool(b) => write!(f, "{}", b),
            Attr::Int(i) => write!(f, "{}", i),
            Attr::Str(s) => write!(f, "{:?}", s),
            Attr::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

fn fmt_attrs(attrs: &AttrMap, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if attrs.is_empty() {
        return Ok(());
    }
    write!(f, " [")?;
    for (i, (key, value)) in attrs.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{} = {}", key, value)?;
    }
    write!(f, "]")
}

fn fmt_op(op: &Op, indent: usize, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:indent$}{:?}", "", op.name, indent = indent)?;
    fmt_attrs(&op.attrs, f)?;
    for region in &op.regions {
        writeln!(f, " (")?;
        for nested in &region.0 {
            fmt_op(nested, indent + 2, f)?;
            writeln!(f)?;
        }
        write!(f, "{:indent$})", "", indent = indent)?;
    }
    Ok(())
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_op(self, 0, f)
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module @{}", self.name)?;
        fmt_attrs(&self.attrs, f)?;
        writeln!(f, " {{")?;
        for op in &self.body {
            fmt_op(op, 2, f)?;
            writeln!(f)?;
        }
        write!(f, "}}")
    }
}
