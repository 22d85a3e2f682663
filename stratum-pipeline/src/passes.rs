//! Built-in utility passes
//!
//! The engine treats passes as opaque, so nothing here is required by the
//! scheduler itself. These exist for the CLI demo pipeline and for tests:
//! small, predictable transformations plus the marker and failure probes
//! the integration suite is built on.

use crate::error::PassError;
use crate::pass::{Pass, PassContext};
use std::sync::atomic::{AtomicBool, Ordering};
use stratum_ir::{Diagnostic, Module};

/// Does nothing, successfully.
pub struct NoOpPass {
    name: &'static str,
}

impl NoOpPass {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl Pass for NoOpPass {
    fn name(&self) -> &str {
        self.name
    }

    fn run(&self, _module: &mut Module, _ctx: &PassContext<'_>) -> Result<(), PassError> {
        Ok(())
    }
}

/// Removes one attribute key from every op in the module.
pub struct StripAttrPass {
    key: String,
}

impl StripAttrPass {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl Pass for StripAttrPass {
    fn name(&self) -> &str {
        "strip-attr"
    }

    fn run(&self, module: &mut Module, _ctx: &PassContext<'_>) -> Result<(), PassError> {
        let mut removed = 0usize;
        module.walk_mut(|op| {
            if op.attrs.remove(&self.key).is_some() {
                removed += 1;
            }
        });
        tracing::debug!(target: "stratum::stage", key = self.key.as_str(), removed, "stripped attrs");
        Ok(())
    }
}

/// Rewrites the dialect namespace of every matching op, e.g. `tile.*`
/// into `xegpu.*`.
pub struct RenameDialectPass {
    from: String,
    to: String,
}

impl RenameDialectPass {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl Pass for RenameDialectPass {
    fn name(&self) -> &str {
        "rename-dialect"
    }

    fn run(&self, module: &mut Module, _ctx: &PassContext<'_>) -> Result<(), PassError> {
        let prefix = format!("{}.", self.from);
        module.walk_mut(|op| {
            if let Some(rest) = op.name.strip_prefix(&prefix) {
                op.name = format!("{}.{}", self.to, rest);
            }
        });
        Ok(())
    }
}

/// Asserts a jump marker on the module, once or on every invocation.
///
/// The `once` form is how a real legalization pass behaves: it requests a
/// detour the first time around and stays quiet after the detour ran.
pub struct MarkerPass {
    name: &'static str,
    marker: String,
    once: bool,
    fired: AtomicBool,
}

impl MarkerPass {
    pub fn once(name: &'static str, marker: impl Into<String>) -> Self {
        Self {
            name,
            marker: marker.into(),
            once: true,
            fired: AtomicBool::new(false),
        }
    }

    pub fn repeating(name: &'static str, marker: impl Into<String>) -> Self {
        Self {
            name,
            marker: marker.into(),
            once: false,
            fired: AtomicBool::new(false),
        }
    }
}

impl Pass for MarkerPass {
    fn name(&self) -> &str {
        self.name
    }

    fn run(&self, module: &mut Module, _ctx: &PassContext<'_>) -> Result<(), PassError> {
        if self.once && self.fired.swap(true, Ordering::Relaxed) {
            return Ok(());
        }
        module.markers.set(self.marker.clone());
        Ok(())
    }
}

/// Raises an error diagnostic and fails.
pub struct FailPass {
    name: &'static str,
    message: String,
}

impl FailPass {
    pub fn new(name: &'static str, message: impl Into<String>) -> Self {
        Self {
            name,
            message: message.into(),
        }
    }
}

impl Pass for FailPass {
    fn name(&self) -> &str {
        self.name
    }

    fn run(&self, _module: &mut Module, ctx: &PassContext<'_>) -> Result<(), PassError> {
        ctx.diagnostics().emit(
            Diagnostic::error(self.message.clone()).with_note(format!("in pass '{}'", self.name)),
        );
        Err(PassError::TransformFailed(self.message.clone()))
    }
}
