//! Typed camera properties validated against a static descriptor table

use std::collections::HashMap;
use std::fmt;

use log::debug;

use crate::error::{Result, RheedError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Float,
    Int,
    Bool,
}

impl PropertyKind {
    fn name(&self) -> &'static str {
        match self {
            PropertyKind::Float => "float",
            PropertyKind::Int => "integer",
            PropertyKind::Bool => "boolean",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyValue {
    Float(f64),
    Int(i64),
    Bool(bool),
}

impl PropertyValue {
    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyValue::Float(_) => PropertyKind::Float,
            PropertyValue::Int(_) => PropertyKind::Int,
            PropertyValue::Bool(_) => PropertyKind::Bool,
        }
    }

    /// Numeric view (integers widen to floats)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(v) => Some(*v),
            PropertyValue::Int(v) => Some(*v as f64),
            PropertyValue::Bool(_) => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Float(v) => write!(f, "{}", v),
            PropertyValue::Int(v) => write!(f, "{}", v),
            PropertyValue::Bool(v) => write!(f, "{}", v),
        }
    }
}

/// Static description of one property
#[derive(Debug, Clone, Copy)]
pub struct PropertyDescriptor {
    pub name: &'static str,
    pub kind: PropertyKind,
    pub default: PropertyValue,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub writable: bool,
    pub description: &'static str,
}

/// Current property values of one camera
#[derive(Debug, Clone)]
pub struct PropertyMap {
    descriptors: &'static [PropertyDescriptor],
    values: HashMap<&'static str, PropertyValue>,
}

impl PropertyMap {
    /// Create a map holding every descriptor's default
    pub fn new(descriptors: &'static [PropertyDescriptor]) -> Self {
        let values = descriptors.iter().map(|d| (d.name, d.default)).collect();
        Self {
            descriptors,
            values,
        }
    }

    /// A map with no properties
    pub fn empty() -> Self {
        Self::new(&[])
    }

    pub fn descriptors(&self) -> &'static [PropertyDescriptor] {
        self.descriptors
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        self.descriptors.iter().map(|d| d.name)
    }

    fn descriptor(&self, name: &str) -> Result<&'static PropertyDescriptor> {
        self.descriptors
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| RheedError::UnknownProperty(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Result<PropertyValue> {
        let descriptor = self.descriptor(name)?;
        Ok(self
            .values
            .get(descriptor.name)
            .copied()
            .unwrap_or(descriptor.default))
    }

    /// Numeric value of a float or integer property
    pub fn get_f64(&self, name: &str) -> Result<f64> {
        self.get(name)?
            .as_f64()
            .ok_or_else(|| RheedError::PropertyKind {
                name: name.to_string(),
                expected: PropertyKind::Float.name(),
            })
    }

    /// Set a writable property
    ///
    /// Integers are accepted for float properties.
    pub fn set(&mut self, name: &str, value: PropertyValue) -> Result<()> {
        let descriptor = self.descriptor(name)?;
        if !descriptor.writable {
            return Err(RheedError::ReadOnlyProperty(name.to_string()));
        }
        self.store(descriptor, value)
    }

    /// Update a property regardless of writability (for the camera itself)
    pub(crate) fn set_internal(&mut self, name: &str, value: PropertyValue) -> Result<()> {
        let descriptor = self.descriptor(name)?;
        self.store(descriptor, value)
    }

    fn store(&mut self, descriptor: &'static PropertyDescriptor, value: PropertyValue) -> Result<()> {
        let value = match (descriptor.kind, value) {
            (PropertyKind::Float, PropertyValue::Int(v)) => PropertyValue::Float(v as f64),
            (kind, value) if kind == value.kind() => value,
            (kind, _) => {
                return Err(RheedError::PropertyKind {
                    name: descriptor.name.to_string(),
                    expected: kind.name(),
                })
            }
        };

        if let Some(v) = value.as_f64() {
            let min = descriptor.min.unwrap_or(f64::NEG_INFINITY);
            let max = descriptor.max.unwrap_or(f64::INFINITY);
            if !v.is_finite() || v < min || v > max {
                return Err(RheedError::PropertyRange {
                    name: descriptor.name.to_string(),
                    value: v,
                    min,
                    max,
                });
            }
        }

        debug!("Setting {} to {}", descriptor.name, value);
        self.values.insert(descriptor.name, value);
        Ok(())
    }
}
