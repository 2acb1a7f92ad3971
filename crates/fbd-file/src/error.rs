//! 文档解析错误定义

use fbd_core::expression::EvalError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML decode error: {0}")]
    XmlDecode(#[from] quick_xml::de::DeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("No Problem element found")]
    MissingRoot,

    #[error("Unknown problem: {0}")]
    UnknownProblem(String),

    #[error("Body #{index} has an empty name")]
    EmptyBodyName { index: usize },

    #[error("Body '{body}' has a point with an empty name")]
    EmptyPointName { body: String },

    #[error("Duplicate point '{point}' in body '{body}'")]
    DuplicatePoint { body: String, point: String },

    #[error("Force in body '{body}' references missing point '{point}'")]
    DanglingForce { body: String, point: String },

    #[error("Unknown direction '{direction}' in body '{body}'")]
    UnknownDirection { body: String, direction: String },

    #[error("Failed to evaluate '{expression}' ({field}) in body '{body}': {source}")]
    Eval {
        body: String,
        field: String,
        expression: String,
        #[source]
        source: EvalError,
    },
}
