//! PPTX (Office Open XML) reader producing the slide shape tree.
//!
//! Parses .pptx files which are ZIP archives containing XML documents.

pub mod omml;
pub mod package;
pub mod parser;
pub mod xml;

pub use parser::PptxParser;
