//! URL hygiene: canonicalization and admission filtering
//!
//! Everything in this module is a pure function over string slices. The
//! crawler runs every discovered link through `resolve` + `admissible`
//! before it may enter the frontier, and every stored URL is in the
//! canonical form produced here.

mod canonical;
mod filter;

pub use canonical::{canonicalize, resolve};
pub use filter::{admissible, same_origin};
