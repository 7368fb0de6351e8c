//! Route pattern compilation.
//!
//! A route string is literal path text interleaved with `<type:name>`
//! placeholders:
//!
//! ```text
//! /data/<string:ship>/cruise/<int:cruise_id>/report.html
//! ```
//!
//! Compilation separates the static output filename from the directory
//! remainder, extracts the ordered placeholder list, and lowers the
//! directory remainder into a [`DirPattern`] — literal pieces and slot
//! indices applied by indexed substitution, so literal route text may
//! contain any formatting character.
//!
//! The placeholder grammar tolerates whitespace around both tokens
//! (`< string : ship >` parses), the type token must be one of `string`,
//! `int`, `float`, `path`, and the output filename must be fully static.
//! Every violation is a [`RouteError`] at compile time; nothing is deferred
//! to the build.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::values::{Value, VarType};

/// Canonical output filename for routes that do not end in one.
pub const INDEX_FILENAME: &str = "index.html";

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\s*(\w+)\s*:\s*(\w+)\s*>").expect("placeholder regex"));

#[derive(Error, Debug)]
pub enum RouteError {
    #[error("malformed placeholder syntax in route '{route}'")]
    MalformedPlaceholder { route: String },
    #[error("placeholders cannot be used in output filenames: '{filename}' in route '{route}'")]
    PlaceholderInFilename { route: String, filename: String },
    #[error(
        "'{ty}' type for '{name}' in route '{route}' is not supported; \
         available types: string, int, float, path"
    )]
    UnsupportedType {
        route: String,
        ty: String,
        name: String,
    },
}

/// One `<type:name>` occurrence, in left-to-right route order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub ty: VarType,
    pub name: String,
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}:{}>", self.ty, self.name)
    }
}

/// A piece of a compiled directory pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Slot(usize),
}

/// Directory pattern with one indexed slot per placeholder.
///
/// Compiled once; [`DirPattern::render`] substitutes a concrete value tuple
/// without re-parsing anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirPattern {
    pieces: Vec<Piece>,
}

impl DirPattern {
    /// Substitute one value per slot, in slot order. `values` must have
    /// exactly as many entries as the pattern has slots.
    pub fn render(&self, values: &[Value]) -> String {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Slot(idx) => out.push_str(&values[*idx].to_string()),
            }
        }
        out
    }

    pub fn slot_count(&self) -> usize {
        self.pieces
            .iter()
            .filter(|p| matches!(p, Piece::Slot(_)))
            .count()
    }
}

/// Immutable result of compiling one route string.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    route: String,
    dir_pattern: DirPattern,
    output_filename: String,
    placeholders: Vec<Placeholder>,
}

impl RoutePattern {
    /// Compile a route string. Pure; no I/O.
    pub fn compile(route: &str) -> Result<Self, RouteError> {
        let (dir_part, output_filename) = split_filename(route)?;

        let mut placeholders = Vec::new();
        let mut pieces = Vec::new();
        let mut last_end = 0;
        for caps in PLACEHOLDER_RE.captures_iter(dir_part) {
            let whole = caps.get(0).expect("match");
            let ty_token = &caps[1];
            let name = &caps[2];
            let Some(ty) = VarType::from_token(ty_token) else {
                return Err(RouteError::UnsupportedType {
                    route: route.to_string(),
                    ty: ty_token.to_string(),
                    name: name.to_string(),
                });
            };
            if whole.start() > last_end {
                pieces.push(Piece::Literal(dir_part[last_end..whole.start()].to_string()));
            }
            pieces.push(Piece::Slot(placeholders.len()));
            placeholders.push(Placeholder {
                ty,
                name: name.to_string(),
            });
            last_end = whole.end();
        }
        if last_end < dir_part.len() {
            pieces.push(Piece::Literal(dir_part[last_end..].to_string()));
        }

        // Any angle bracket surviving placeholder extraction is a
        // placeholder that failed to parse.
        for piece in &pieces {
            if let Piece::Literal(text) = piece {
                if text.contains('<') || text.contains('>') {
                    return Err(RouteError::MalformedPlaceholder {
                        route: route.to_string(),
                    });
                }
            }
        }

        // Keep the pattern relative to the destination root.
        if let Some(Piece::Literal(first)) = pieces.first_mut() {
            if first.starts_with('/') {
                first.remove(0);
            }
            if first.is_empty() {
                pieces.remove(0);
            }
        }

        Ok(RoutePattern {
            route: route.to_string(),
            dir_pattern: DirPattern { pieces },
            output_filename,
            placeholders,
        })
    }

    /// The route string this pattern was compiled from.
    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn dir_pattern(&self) -> &DirPattern {
        &self.dir_pattern
    }

    /// Terminal file name for this page; `index.html` unless the route
    /// ends in an explicit filename.
    pub fn output_filename(&self) -> &str {
        &self.output_filename
    }

    /// `(type, name)` pairs in left-to-right route order.
    pub fn placeholders(&self) -> &[Placeholder] {
        &self.placeholders
    }
}

/// Split an explicit trailing filename off the route, if present.
///
/// The final `/`-separated segment is a filename when it contains an
/// extension marker (`.`). Filenames must be static: placeholder syntax in
/// the segment is a hard error.
fn split_filename(route: &str) -> Result<(&str, String), RouteError> {
    let last_segment = route.rsplit('/').next().unwrap_or(route);
    if !last_segment.contains('.') {
        return Ok((route, INDEX_FILENAME.to_string()));
    }
    if last_segment.contains('<') || last_segment.contains('>') {
        return Err(RouteError::PlaceholderInFilename {
            route: route.to_string(),
            filename: last_segment.to_string(),
        });
    }
    let dir_part = &route[..route.len() - last_segment.len()];
    Ok((dir_part, last_segment.to_string()))
}
