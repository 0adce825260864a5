//! Pipeline stages for presentation-to-document generation.
//!
//! Each submodule implements exactly one transformation step. Data flows
//! strictly forward; no stage reads back from a later one.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ llm ──▶ postprocess ──▶ sections ──▶ populate
//! (path/URL) (PPTX text) (reply) (cleanup)      (SectionMap)  (DOCX)
//! ```
//!
//! 1. [`input`]      : canonicalise the user-supplied path or URL to a local file
//! 2. [`extract`]    : walk slides and shapes, one line per text frame
//! 3. [`llm`]        : the single summary request to the model
//! 4. [`postprocess`]: deterministic clean-up of model formatting quirks
//! 5. [`sections`]   : colon-header sectioning of the reply
//! 6. [`populate`]   : build a new document or fill a template

pub mod extract;
pub mod input;
pub mod llm;
pub mod populate;
pub mod postprocess;
pub mod sections;
