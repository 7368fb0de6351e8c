//! # flatsite
//!
//! A Flask-like static site generator. You register view functions against
//! URL-style route patterns, each pattern's typed placeholders are expanded
//! against caller-supplied value domains into the complete set of concrete
//! routes, and one synchronous build pass writes the rendered tree — pages,
//! stylesheet, icon, collected assets — to a destination directory. No
//! server process, no watcher, no cache: registration then one build.
//!
//! # Architecture: Register Then Replay
//!
//! Everything combinatorial happens at registration time:
//!
//! ```text
//! 1. Compile   route string  →  RoutePattern     (placeholders + dir pattern)
//! 2. Expand    value sources →  RouteVariables   (concrete value tuples)
//! 3. Claim     route strings →  uniqueness map   (global, fail-fast)
//! ----------------------------------------------------------------------
//! 4. Build     replay stored tuples → directories, rendered files, static/
//! ```
//!
//! This split exists for one reason: **every failure is a registration
//! failure**. A malformed route, a mistyped value list, a chained domain
//! with a missing key, or two pages colliding on a route all abort before
//! any filesystem side effect happens for *any* page. The build pass is
//! deliberately boring — it replays immutable, pre-validated data in a
//! deterministic order.
//!
//! # Route Patterns
//!
//! ```text
//! /data/<string:ship>/cruise/<int:cruise_id>/report.html
//! ```
//!
//! Placeholder types are `string`, `int`, `float`, and `path`. A trailing
//! segment with an extension is the (static) output filename; everything
//! else becomes directories. Value domains are either flat lists — expanded
//! as a Cartesian product — or keyed sub-lists chained on the preceding
//! placeholder's values, expanded as a sum. See [`expand`] for the exact
//! policy.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`route`] | Route pattern compiler — placeholders, filename split, directory pattern |
//! | [`values`] | Scalar values, typed value lists, flat/keyed value sources |
//! | [`expand`] | Route variable expansion — Cartesian and chained modes, validation |
//! | [`builder`] | The session: registration, uniqueness, `url_for`, build replay |
//! | [`templates`] | Named template registry over JSON-valued contexts |
//! | [`statics`] | Static file registration and collection (files/images/downloads) |
//! | [`markdown`] | Markdown-to-HTML conversion for page bodies |
//! | [`config`] | `site.toml` loading, validation, stock config |
//! | [`fsio`] | Filesystem primitives, permission modes, relative paths, path hygiene |
//! | [`output`] | CLI output formatting for build reports |
//!
//! # Design Decisions
//!
//! ## Session Object, Not Globals
//!
//! The Flask lineage this follows keeps its page table, route set, and
//! "currently rendering" marker in process-wide state. Here they are fields
//! of [`builder::Builder`]; two sessions are two independent sites, and the
//! route being rendered is threaded into views through
//! [`builder::PageContext`] rather than read from anywhere global.
//!
//! ## Tagged Values, Not Runtime Inspection
//!
//! Value domains are sum types ([`values::ValueList`],
//! [`values::ValueSource`]) decided once at the API boundary. Expansion
//! matches exhaustively instead of re-inspecting element types, and a
//! mixed-type or mixed-shape domain cannot be constructed at all.
//!
//! ## Indexed Substitution, Not Format Strings
//!
//! Directory patterns compile to literal pieces and slot indices
//! ([`route::DirPattern`]). Substitution is positional lookup, so a literal
//! route segment may contain any character a format string would
//! misinterpret.

pub mod builder;
pub mod config;
pub mod expand;
pub mod fsio;
pub mod markdown;
pub mod output;
pub mod route;
pub mod statics;
pub mod templates;
pub mod values;
