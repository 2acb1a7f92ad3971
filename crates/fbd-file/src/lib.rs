//! FBD 题目文档处理
//!
//! 支持：
//! - XML / JSON 题目文档读取
//! - 在符号表下求值为数值化的题目
//! - 题目目录与符号覆盖后的重新解析

pub mod catalogue;
pub mod document;
pub mod error;
pub mod parser;

pub use catalogue::{ProblemCatalogue, BUILTIN_PROBLEM_ID, PROBLEM_6_XML};
pub use document::ProblemDocument;
pub use error::FileError;
pub use parser::{ParserOptions, ProblemParser};
