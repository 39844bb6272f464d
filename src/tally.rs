//! Resource tally
//!
//! Counts declared resources per resource type and shape. Counts only ever
//! go up, and the order in which sources are applied does not matter.
//! Maps are ordered so that every later stage iterates deterministically.

use crate::shape::ShapeKey;
use serde::Serialize;
use std::collections::BTreeMap;

/// Count of declared resources: resource type → shape key → count
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourceTally {
    resources: BTreeMap<String, BTreeMap<ShapeKey, u64>>,
}

impl ResourceTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a shape with a zero count so that its resource type is
    /// reported even when nothing of it is declared.
    pub fn seed(&mut self, resource_type: &str, shape: ShapeKey) {
        self.resources
            .entry(resource_type.to_string())
            .or_default()
            .entry(shape)
            .or_insert(0);
    }

    /// Make sure a resource type is present, without any shapes.
    pub fn ensure_type(&mut self, resource_type: &str) {
        self.resources.entry(resource_type.to_string()).or_default();
    }

    /// Count one more resource of this shape.
    pub fn increment(&mut self, resource_type: &str, shape: &ShapeKey) {
        self.add(resource_type, shape, 1);
    }

    /// Count `n` more resources of this shape.
    pub fn add(&mut self, resource_type: &str, shape: &ShapeKey, n: u64) {
        let count = self
            .resources
            .entry(resource_type.to_string())
            .or_default()
            .entry(shape.clone())
            .or_insert(0);
        *count += n;
    }

    /// Fold another tally into this one.
    pub fn merge(&mut self, other: ResourceTally) {
        for (resource_type, shapes) in other.resources {
            let target = self.resources.entry(resource_type).or_default();
            for (shape, n) in shapes {
                *target.entry(shape).or_insert(0) += n;
            }
        }
    }

    /// Count for one shape; absent shapes count zero.
    pub fn count(&self, resource_type: &str, shape: &ShapeKey) -> u64 {
        self.resources
            .get(resource_type)
            .and_then(|shapes| shapes.get(shape))
            .copied()
            .unwrap_or(0)
    }

    /// Total count across all shapes of a resource type.
    pub fn total(&self, resource_type: &str) -> u64 {
        self.resources
            .get(resource_type)
            .map(|shapes| shapes.values().sum())
            .unwrap_or(0)
    }

    /// Resource types present in the tally, including zero-count ones.
    pub fn resource_types(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    /// Shapes of a resource type with their counts, in key order.
    pub fn shapes(&self, resource_type: &str) -> impl Iterator<Item = (&ShapeKey, u64)> {
        self.resources
            .get(resource_type)
            .into_iter()
            .flat_map(|shapes| shapes.iter().map(|(k, n)| (k, *n)))
    }

    /// True when no shape has a positive count.
    pub fn is_empty(&self) -> bool {
        self.resources
            .values()
            .all(|shapes| shapes.values().all(|n| *n == 0))
    }
}
