//! Typed gene values.
//!
//! A [`Gene`] is a single value slot within a chromosome. Its type tag is
//! derived from the stored value: booleans become [`GeneType::Binary`],
//! integers [`GeneType::Integer`], floats [`GeneType::Real`], and anything
//! else is an opaque [`GeneType::Object`] behind the [`ObjectValue`] trait.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Returns a process-unique identifier for genes and chromosomes.
pub(crate) fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// The type tag of a gene, derived from its stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GeneType {
    /// Boolean-valued gene.
    Binary,
    /// Integer-valued gene.
    Integer,
    /// Real-valued (f64) gene.
    Real,
    /// Opaque user-supplied object.
    Object,
}

/// Opaque object stored in an [`GeneValue::Object`] gene.
///
/// The `Display` rendering is the object's canonical value: it drives
/// duplicate detection and the value-equality checks of ordered crossover,
/// so two objects that render identically are considered the same value.
pub trait ObjectValue: fmt::Display + Send + Sync {}

impl<T: fmt::Display + Send + Sync> ObjectValue for T {}

/// The value stored in a gene.
#[derive(Clone)]
pub enum GeneValue {
    Binary(bool),
    Integer(i64),
    Real(f64),
    Object(Arc<dyn ObjectValue>),
}

impl GeneValue {
    /// Derives the type tag for this value.
    pub fn gene_type(&self) -> GeneType {
        match self {
            GeneValue::Binary(_) => GeneType::Binary,
            GeneValue::Integer(_) => GeneType::Integer,
            GeneValue::Real(_) => GeneType::Real,
            GeneValue::Object(_) => GeneType::Object,
        }
    }
}

impl fmt::Debug for GeneValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneValue::Binary(b) => write!(f, "Binary({b})"),
            GeneValue::Integer(i) => write!(f, "Integer({i})"),
            GeneValue::Real(r) => write!(f, "Real({r})"),
            GeneValue::Object(o) => write!(f, "Object({o})"),
        }
    }
}

impl From<bool> for GeneValue {
    fn from(v: bool) -> Self {
        GeneValue::Binary(v)
    }
}

impl From<i64> for GeneValue {
    fn from(v: i64) -> Self {
        GeneValue::Integer(v)
    }
}

impl From<f64> for GeneValue {
    fn from(v: f64) -> Self {
        GeneValue::Real(v)
    }
}

/// A single typed value unit within a chromosome.
#[derive(Debug)]
pub struct Gene {
    id: u64,
    value: GeneValue,
    gene_type: GeneType,
}

impl Gene {
    /// Constructs a gene, deriving the type tag from the value.
    pub fn new(value: impl Into<GeneValue>) -> Self {
        let value = value.into();
        let gene_type = value.gene_type();
        Gene {
            id: next_id(),
            value,
            gene_type,
        }
    }

    /// Constructs an object gene from an opaque value.
    pub fn object(value: Arc<dyn ObjectValue>) -> Self {
        Gene::new(GeneValue::Object(value))
    }

    /// The gene's identity. Fresh identities are assigned on construction
    /// and on every clone.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The derived type tag.
    pub fn gene_type(&self) -> GeneType {
        self.gene_type
    }

    /// The stored value.
    pub fn value(&self) -> &GeneValue {
        &self.value
    }

    /// Replaces the stored value, re-deriving the type tag.
    pub fn set_value(&mut self, value: impl Into<GeneValue>) {
        self.value = value.into();
        self.gene_type = self.value.gene_type();
    }

    /// The binary view of the gene: numeric values above zero map to 1,
    /// everything else to 0. Object genes always map to 1.
    pub fn binary_value(&self) -> u8 {
        match &self.value {
            GeneValue::Binary(b) => u8::from(*b),
            GeneValue::Integer(i) => u8::from(*i > 0),
            GeneValue::Real(r) => u8::from(*r > 0.0),
            GeneValue::Object(_) => 1,
        }
    }

    /// The real-number view of the gene. Object genes have no numeric
    /// interpretation and yield NaN.
    pub fn real_value(&self) -> f64 {
        match &self.value {
            GeneValue::Binary(b) => f64::from(u8::from(*b)),
            GeneValue::Integer(i) => *i as f64,
            GeneValue::Real(r) => *r,
            GeneValue::Object(_) => f64::NAN,
        }
    }

    /// Canonical rendering of the gene's value, used for duplicate
    /// detection and value-equality checks.
    pub fn canonical_value(&self) -> String {
        match &self.value {
            GeneValue::Binary(_) => self.binary_value().to_string(),
            GeneValue::Integer(i) => i.to_string(),
            GeneValue::Real(r) => r.to_string(),
            GeneValue::Object(o) => o.to_string(),
        }
    }

    /// Deep-clones the gene, verifying that the clone's re-derived type tag
    /// matches the source. A divergence indicates a corrupted gene and
    /// fails with [`Error::GeneCloneInconsistency`].
    pub fn deep_clone(&self) -> Result<Gene> {
        let clone = Gene::new(self.value.clone());
        if clone.gene_type != self.gene_type {
            return Err(Error::GeneCloneInconsistency);
        }
        Ok(clone)
    }
}

// A cloned gene carries the same value but a fresh identity.
impl Clone for Gene {
    fn clone(&self) -> Self {
        Gene::new(self.value.clone())
    }
}
