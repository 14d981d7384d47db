//! C code generation for the Lumen programming language.
//!
//! This crate lowers resolved Lumen ASTs into portable C99: a header and a
//! source buffer per output unit, preserving module scoping, linkage and
//! name mangling.
//!
//! # Architecture
//!
//! The generator runs four ordered passes over the aggregate of all entry
//! ASTs:
//!
//! 1. **Includes**: imports split into system (`<name.h>`) and local
//!    (`"name.h"`) sets, sorted and deduplicated
//! 2. **Type declarations**: typedefs for aliases, structs, enums and
//!    function types
//! 3. **Variables**: `extern` declarations and definitions
//! 4. **Functions**: prototypes and definitions
//!
//! Public declarations land in the header buffer, everything else in the
//! source buffer; the header is wrapped in an include guard.
//!
//! # Example
//!
//! ```ignore
//! use lumen_cgen::{CGenerator, Mode};
//!
//! let mut gen = CGenerator::new("demo", Mode::MultiFile, false, &modules, &arena);
//! gen.add_entry(&ast);
//! gen.generate();
//! gen.write(Path::new("output/demo"))?;
//! ```

pub mod error;
pub mod generator;
pub mod genutils;

pub use error::*;
pub use generator::*;

pub use lumen_util::StringBuilder;
