// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error code system in the style of rustc's E0001 codes
//!
//! Every [`SearchError`](super::SearchError) maps to a stable `FS0001`-style code
//! with a title, a description, and a help text.

use std::fmt;

/// Error categories for organizing error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Request and expression parsing errors (FS0001-FS0050)
    Parser,
    /// Compilation errors against the metadata catalog (FS0051-FS0100)
    Compilation,
    /// Schema declaration errors (FS0101-FS0150)
    Schema,
    /// Errors reported by the query engine (FS0151-FS0200)
    Execution,
}

/// Error code following the rustc pattern (FS0001, FS0002, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode {
    pub code: u16,
}

impl ErrorCode {
    /// Create a new error code
    pub const fn new(code: u16) -> Self {
        Self { code }
    }

    /// Get the full error code string (e.g., "FS0001")
    pub fn code_str(&self) -> String {
        format!("FS{:04}", self.code)
    }

    /// Get error information from the registry
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_REGISTRY.get_error_info(self)
    }

    /// Get error category for this error code
    pub fn category(&self) -> ErrorCategory {
        match self.code {
            1..=50 => ErrorCategory::Parser,
            51..=100 => ErrorCategory::Compilation,
            101..=150 => ErrorCategory::Schema,
            _ => ErrorCategory::Execution,
        }
    }

    /// Get human-readable description for this error code
    pub fn description(&self) -> &'static str {
        self.info().title
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FS{:04}", self.code)
    }
}

/// Error information with help text
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Error code number
    pub code: u16,
    /// Human-readable error title
    pub title: &'static str,
    /// Detailed description of the error
    pub description: &'static str,
    /// Help information and suggested solutions
    pub help: &'static str,
}

impl ErrorInfo {
    pub const fn new(
        code: u16,
        title: &'static str,
        description: &'static str,
        help: &'static str,
    ) -> Self {
        Self {
            code,
            title,
            description,
            help,
        }
    }
}

/// Central error registry containing all error definitions
pub struct ErrorRegistry;

impl ErrorRegistry {
    /// Get error information for a given error code
    pub fn get_error_info(&self, error_code: &ErrorCode) -> &'static ErrorInfo {
        match error_code.code {
            1 => &FS0001_INFO,
            2 => &FS0002_INFO,
            3 => &FS0003_INFO,
            4 => &FS0004_INFO,
            51 => &FS0051_INFO,
            52 => &FS0052_INFO,
            53 => &FS0053_INFO,
            54 => &FS0054_INFO,
            101 => &FS0101_INFO,
            151 => &FS0151_INFO,
            _ => &UNKNOWN_ERROR_INFO,
        }
    }
}

/// Global error registry instance
pub static ERROR_REGISTRY: ErrorRegistry = ErrorRegistry;

// Parser error codes (FS0001-FS0050)
pub const FS0001: ErrorCode = ErrorCode::new(1); // Invalid search request
pub const FS0002: ErrorCode = ErrorCode::new(2); // Malformed filter expression
pub const FS0003: ErrorCode = ErrorCode::new(3); // Unknown operator
pub const FS0004: ErrorCode = ErrorCode::new(4); // Operator name conflict

// Compilation error codes (FS0051-FS0100)
pub const FS0051: ErrorCode = ErrorCode::new(51); // Unknown field path
pub const FS0052: ErrorCode = ErrorCode::new(52); // Unknown entity type
pub const FS0053: ErrorCode = ErrorCode::new(53); // Type coercion failure
pub const FS0054: ErrorCode = ErrorCode::new(54); // Unresolvable join

// Schema error codes (FS0101-FS0150)
pub const FS0101: ErrorCode = ErrorCode::new(101); // Invalid schema declaration

// Execution error codes (FS0151-FS0200)
pub const FS0151: ErrorCode = ErrorCode::new(151); // Query engine failure

static FS0001_INFO: ErrorInfo = ErrorInfo::new(
    1,
    "Invalid search request",
    "The request envelope is not an object, or its options have the wrong shape.",
    "Send an object with a `filter` member and optional `options` carrying `sortKey`, `pageSize` and `pageOffset`.",
);

static FS0002_INFO: ErrorInfo = ErrorInfo::new(
    2,
    "Malformed filter expression",
    "An operator received the wrong number or the wrong kind of arguments.",
    "Check the operator arity. Combinators take predicates, unary checks take exactly one field.",
);

static FS0003_INFO: ErrorInfo = ErrorInfo::new(
    3,
    "Unknown operator",
    "The first element of a call is not a registered operator name.",
    "Use one of the built-in operators or register a custom operator before compiling.",
);

static FS0004_INFO: ErrorInfo = ErrorInfo::new(
    4,
    "Operator name conflict",
    "An operator with the same name is already registered and the collision policy rejects overrides.",
    "Pick another name or configure the engine with the override collision policy.",
);

static FS0051_INFO: ErrorInfo = ErrorInfo::new(
    51,
    "Unknown field path",
    "The field path is not declared searchable on the queried entity.",
    "Relations are written with `>` (e.g. `>children.name`), embedded values and the final field with `.`.",
);

static FS0052_INFO: ErrorInfo = ErrorInfo::new(
    52,
    "Unknown entity type",
    "The entity type is not registered in the schema.",
    "Register the entity schema before searching it.",
);

static FS0053_INFO: ErrorInfo = ErrorInfo::new(
    53,
    "Type coercion failure",
    "A literal cannot be converted to the field's type, or violates a declared constraint.",
    "Check the literal format against the field type, date pattern and size/digit limits.",
);

static FS0054_INFO: ErrorInfo = ErrorInfo::new(
    54,
    "Unresolvable join",
    "A path segment is declared on a type that is not related to the type being traversed.",
    "Verify the inheritance declared in the schema.",
);

static FS0101_INFO: ErrorInfo = ErrorInfo::new(
    101,
    "Invalid schema declaration",
    "An entity schema references unknown types or is registered twice.",
    "Register every referenced entity and give each entity a unique name.",
);

static FS0151_INFO: ErrorInfo = ErrorInfo::new(
    151,
    "Query engine failure",
    "The query engine could not execute the compiled query.",
    "Inspect the message reported by the query engine.",
);

static UNKNOWN_ERROR_INFO: ErrorInfo = ErrorInfo::new(
    0,
    "Unknown error",
    "An unknown error occurred.",
    "This is an internal error, please report it.",
);
