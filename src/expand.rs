//! Route variable expansion.
//!
//! Turns a compiled placeholder list plus the caller-supplied value sources
//! into the complete, ordered set of concrete value tuples for a page. This
//! is where the combinatorial policy lives:
//!
//! - **Independent mode** — every placeholder is flat: the result is the
//!   Cartesian product, in placeholder order, preserving each list's given
//!   order. For sizes `k1..kn` that is exactly `k1*k2*...*kn` tuples.
//! - **Dependent mode** — at least one placeholder is keyed: placeholders
//!   are resolved strictly left to right over partial tuples. A flat source
//!   extends every partial tuple by every value; a keyed source extends
//!   each tuple by the sub-list selected by that tuple's most recent value,
//!   so the total is the sum of sub-list sizes, not a product.
//!
//! A keyed source must cover exactly the value set its preceding
//! placeholder realizes — a missing or extra key is fatal, never silently
//! dropped. The first placeholder has nothing preceding it and therefore
//! cannot be keyed.
//!
//! Everything here is validated eagerly, at page registration; a failure is
//! a programming error in the calling code, reported with the route string
//! and placeholder name for diagnosis, and nothing is retried.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::route::Placeholder;
use crate::values::{TypeError, Value, ValueSource, ValueSources};

#[derive(Error, Debug)]
pub enum ExpandError {
    #[error(
        "route '{route}' declares {expected} placeholder(s) {expected_names:?} \
         but {given} value source(s) {given_names:?} were supplied"
    )]
    ArityMismatch {
        route: String,
        expected: usize,
        given: usize,
        expected_names: Vec<String>,
        given_names: Vec<String>,
    },
    #[error(
        "value source names or order do not match route '{route}': \
         route declares {expected:?}, sources were given as {given:?}"
    )]
    NameOrderMismatch {
        route: String,
        expected: Vec<String>,
        given: Vec<String>,
    },
    #[error("invalid values for '{name}' (e.g. route: {route}): {source}")]
    BadValues {
        route: String,
        name: String,
        #[source]
        source: TypeError,
    },
    #[error(
        "keyed values for '{name}' require a placeholder to be defined just \
         before it in route '{route}'; keys given: {keys:?}"
    )]
    KeyedFirst {
        route: String,
        name: String,
        keys: Vec<String>,
    },
    #[error(
        "keyed values for '{name}' in route '{route}' must have exactly \
         {required:?} as keys, not {given:?}"
    )]
    KeySetMismatch {
        route: String,
        name: String,
        required: Vec<String>,
        given: Vec<String>,
    },
    #[error("duplicate key '{key}' in keyed values for '{name}' in route '{route}'")]
    DuplicateKey {
        route: String,
        name: String,
        key: String,
    },
}

/// One fully concrete tuple of scalars, one per placeholder, in
/// placeholder order. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteVariable(Vec<Value>);

impl RouteVariable {
    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.0.iter()
    }
}

/// A source after per-placeholder validation: scalars sanitized, sub-lists
/// checked, duplicate keys rejected.
enum CheckedSource {
    Flat(Vec<Value>),
    Keyed(Vec<(Value, Vec<Value>)>),
}

/// Expand `sources` against `placeholders` into the ordered set of route
/// variables for one page.
///
/// `route` is the originating route string, used only for diagnostics.
/// Pure apart from the existence probe `path`-typed values require.
pub fn expand(
    route: &str,
    placeholders: &[Placeholder],
    sources: &ValueSources,
) -> Result<Vec<RouteVariable>, ExpandError> {
    check_names(route, placeholders, sources)?;
    let checked = check_sources(route, placeholders, sources)?;
    resolve(route, placeholders, checked)
}

/// Arity and name-order check: the sources' key order must equal the
/// placeholders' name order exactly.
fn check_names(
    route: &str,
    placeholders: &[Placeholder],
    sources: &ValueSources,
) -> Result<(), ExpandError> {
    let expected: Vec<String> = placeholders.iter().map(|p| p.name.clone()).collect();
    let given: Vec<String> = sources.names().iter().map(|n| n.to_string()).collect();
    if expected.len() != given.len() {
        return Err(ExpandError::ArityMismatch {
            route: route.to_string(),
            expected: expected.len(),
            given: given.len(),
            expected_names: expected,
            given_names: given,
        });
    }
    if expected != given {
        return Err(ExpandError::NameOrderMismatch {
            route: route.to_string(),
            expected,
            given,
        });
    }
    Ok(())
}

fn check_sources(
    route: &str,
    placeholders: &[Placeholder],
    sources: &ValueSources,
) -> Result<Vec<CheckedSource>, ExpandError> {
    let bad = |name: &str, source: TypeError| ExpandError::BadValues {
        route: route.to_string(),
        name: name.to_string(),
        source,
    };

    let mut checked = Vec::with_capacity(placeholders.len());
    for (placeholder, (name, source)) in placeholders.iter().zip(sources.iter()) {
        match source {
            ValueSource::Flat(list) => {
                let values = list.check(placeholder.ty).map_err(|e| bad(name, e))?;
                checked.push(CheckedSource::Flat(values));
            }
            ValueSource::Keyed(entries) => {
                let mut seen = BTreeSet::new();
                let mut out: Vec<(Value, Vec<Value>)> = Vec::with_capacity(entries.len());
                for (key, list) in entries {
                    if !seen.insert(key.clone()) {
                        return Err(ExpandError::DuplicateKey {
                            route: route.to_string(),
                            name: name.to_string(),
                            key: key.to_string(),
                        });
                    }
                    let values = list.check(placeholder.ty).map_err(|e| bad(name, e))?;
                    out.push((key.clone(), values));
                }
                checked.push(CheckedSource::Keyed(out));
            }
        }
    }
    Ok(checked)
}

/// Left-to-right resolution over partial tuples. Flat sources extend by
/// Cartesian product; keyed sources extend by lookup on each tuple's most
/// recent value. Output order is deterministic: existing tuples outermost,
/// source order innermost.
fn resolve(
    route: &str,
    placeholders: &[Placeholder],
    checked: Vec<CheckedSource>,
) -> Result<Vec<RouteVariable>, ExpandError> {
    let mut tuples: Vec<Vec<Value>> = Vec::new();
    for (i, (placeholder, source)) in placeholders.iter().zip(checked).enumerate() {
        match source {
            CheckedSource::Flat(values) => {
                if i == 0 {
                    tuples = values.into_iter().map(|v| vec![v]).collect();
                } else {
                    let old = std::mem::take(&mut tuples);
                    for tuple in &old {
                        for value in &values {
                            let mut next = tuple.clone();
                            next.push(value.clone());
                            tuples.push(next);
                        }
                    }
                }
            }
            CheckedSource::Keyed(entries) => {
                if i == 0 {
                    return Err(ExpandError::KeyedFirst {
                        route: route.to_string(),
                        name: placeholder.name.clone(),
                        keys: entries.iter().map(|(k, _)| k.to_string()).collect(),
                    });
                }
                // The key set must equal the set of values the preceding
                // placeholder actually realizes.
                let required: BTreeSet<&Value> =
                    tuples.iter().map(|t| t.last().expect("nonempty")).collect();
                let given: BTreeSet<&Value> = entries.iter().map(|(k, _)| k).collect();
                if required != given {
                    return Err(ExpandError::KeySetMismatch {
                        route: route.to_string(),
                        name: placeholder.name.clone(),
                        required: required.iter().map(|v| v.to_string()).collect(),
                        given: given.iter().map(|v| v.to_string()).collect(),
                    });
                }
                let old = std::mem::take(&mut tuples);
                for tuple in old {
                    let key = tuple.last().expect("nonempty");
                    let sub = &entries
                        .iter()
                        .find(|(k, _)| k == key)
                        .expect("key set checked")
                        .1;
                    for value in sub {
                        let mut next = tuple.clone();
                        next.push(value.clone());
                        tuples.push(next);
                    }
                }
            }
        }
    }
    Ok(tuples.into_iter().map(RouteVariable).collect())
}
