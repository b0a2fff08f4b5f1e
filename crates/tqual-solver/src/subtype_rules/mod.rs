//! Kind-pair rules of the subtype checker.
//!
//! Each file extends [`SubtypeChecker`](crate::subtype::SubtypeChecker) with
//! the rules for one family of kinds:
//!
//! - `declared`: declared types, arrays, boxing, and type-argument containment
//! - `type_vars`: type variables as subtype or supertype
//! - `wildcards`: wildcards, including uninferred ones
//! - `composite`: intersections, unions, and the null type against them

mod composite;
mod declared;
mod type_vars;
mod wildcards;
