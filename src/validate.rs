#[cfg(feature = "napi")]
use napi_derive::napi;
use oxc_allocator::Allocator;
use oxc_ast::ast::{BindingPattern, Statement};
use oxc_parser::Parser;
use oxc_span::SourceType;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// DIAGNOSTIC CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const DIAG_INVALID_IDENTIFIER: &str = "Q-WARN-INVALID-ID";
pub const DIAG_RESERVED_IDENTIFIER: &str = "Q-WARN-RESERVED-ID";

fn get_guarantee(code: &str) -> &'static str {
    match code {
        DIAG_INVALID_IDENTIFIER => {
            "Only identifier-safe query names are bound as script variables."
        }
        DIAG_RESERVED_IDENTIFIER => {
            "Query bindings never shadow preamble or generated helper names, and are never reserved words."
        }
        _ => "Unknown diagnostic.",
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PreprocessError {
    #[error("unterminated query fence opened at line {line}")]
    UnterminatedFence { line: usize },

    #[error("generated script for {file} does not parse: {}", .messages.join("; "))]
    InvalidGeneratedScript { file: String, messages: Vec<String> },

    #[error("invalid preprocessor options: {reason}")]
    InvalidOptions { reason: String },
}

// ═══════════════════════════════════════════════════════════════════════════════
// DIAGNOSTICS
// ═══════════════════════════════════════════════════════════════════════════════

/// A non-fatal finding produced while processing a document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "napi", napi(object))]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub code: String,
    pub message: String,
    pub guarantee: String,
    pub file: String,
    pub identifier: String,
}

impl Diagnostic {
    pub fn new(code: &str, message: &str, file: &str, identifier: &str) -> Self {
        Diagnostic {
            code: code.to_string(),
            message: message.to_string(),
            guarantee: get_guarantee(code).to_string(),
            file: file.to_string(),
            identifier: identifier.to_string(),
        }
    }

    pub fn invalid_identifier(file: &str, identifier: &str) -> Self {
        Self::new(
            DIAG_INVALID_IDENTIFIER,
            &format!(
                "Query \"{}\" is not a valid identifier and will not be bound in the page script.",
                identifier
            ),
            file,
            identifier,
        )
    }

    pub fn reserved_identifier(file: &str, identifier: &str) -> Self {
        Self::new(
            DIAG_RESERVED_IDENTIFIER,
            &format!(
                "Query \"{}\" is a reserved word or collides with a generated script name and will not be bound.",
                identifier
            ),
            file,
            identifier,
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// GENERATED SCRIPT VERIFICATION
// ═══════════════════════════════════════════════════════════════════════════════

fn module_source_type() -> SourceType {
    SourceType::default().with_module(true)
}

/// Parse generated script text as an ES module and collect parser errors.
pub fn verify_generated_script(file: &str, script: &str) -> Result<(), PreprocessError> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, script, module_source_type()).parse();

    if ret.errors.is_empty() {
        return Ok(());
    }

    Err(PreprocessError::InvalidGeneratedScript {
        file: file.to_string(),
        messages: ret.errors.iter().map(|e| e.to_string()).collect(),
    })
}

/// Top-level `let`/`const`/`var` and function names declared by a script.
///
/// Destructuring patterns are skipped; the preamble only destructures props.
pub fn declared_bindings(script: &str) -> Vec<String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, script, module_source_type()).parse();

    let mut names = Vec::new();
    for stmt in &ret.program.body {
        match stmt {
            Statement::VariableDeclaration(var_decl) => {
                for decl in &var_decl.declarations {
                    if let BindingPattern::BindingIdentifier(id) = &decl.id {
                        names.push(id.name.to_string());
                    }
                }
            }
            Statement::FunctionDeclaration(func) => {
                if let Some(id) = &func.id {
                    names.push(id.name.to_string());
                }
            }
            _ => {}
        }
    }
    names
}
