//! Script generation: phased deployment scripts, rollback scripts, and
//! safety warnings.

pub mod generator;
pub mod statements;
pub mod warnings;

pub use generator::{Action, GeneratedScript, Operation, Phase, ScriptGenerator};
pub use warnings::{Severity, Warning};
