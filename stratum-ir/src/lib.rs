//! Stratum IR - the program representation
//!
//! A module is a mutable tree of named operations with attribute maps.
//! It is the single shared artifact a pipeline run mutates in place: the
//! caller owns it, passes receive it by mutable reference, and nothing in
//! this crate holds pipeline state.
//!
//! Alongside the tree itself this crate provides:
//! - the marker side channel passes use to request stage jumps
//!   ([`MarkerSet`]),
//! - the diagnostics engine with scoped handlers ([`DiagnosticEngine`]),
//! - a textual form with a printer (`Display`) and parser
//!   ([`parse_module`]).

pub mod diagnostics;
pub mod markers;
pub mod module;
pub mod parser;

pub use diagnostics::{Diagnostic, DiagnosticEngine, ScopedHandler, Severity};
pub use markers::MarkerSet;
pub use module::{Attr, AttrMap, Module, Op, Region, VerifyError};
pub use parser::{parse_module, ParseError};
