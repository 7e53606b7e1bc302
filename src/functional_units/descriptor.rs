use crate::core::error::{PoolError, Result};
use crate::core::op_class::OpClass;
use std::fmt::{self, Display};

/// Latency and occupancy of one operation class on a functional unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencySpec {
    pub op: OpClass,
    /// Cycles until the result is ready, at least 1.
    pub latency: u32,
    /// A pipelined unit can start a new operation every cycle.
    pub pipelined: bool,
}

impl Display for LatencySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = if self.pipelined { "P" } else { "NP" };
        write!(f, "{}({}, {})", self.op, self.latency, mode)
    }
}

/// Static definition of one functional unit type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuDescriptor {
    name: String,
    ops: Vec<LatencySpec>,
    count: usize,
    width_cap: Option<u32>,
    /// Reserved. Parsed and kept, never consulted by the allocator.
    fuse_cap: Option<u32>,
    floating_point: bool,
    simd: bool,
}

impl Display for FuDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x{}", self.name, self.count)?;
        if let Some(cap) = self.width_cap {
            write!(f, " <= {} bits", cap)?;
        }
        Ok(())
    }
}

impl FuDescriptor {
    /// Start describing a unit named `name`, with a single replica.
    pub fn create(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ops: Vec::new(),
            count: 1,
            width_cap: None,
            fuse_cap: None,
            floating_point: false,
            simd: false,
        }
    }
    pub fn op(mut self, op: OpClass, latency: u32, pipelined: bool) -> Self {
        self.ops.push(LatencySpec {
            op,
            latency,
            pipelined,
        });
        self
    }
    pub fn count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }
    pub fn width_cap(mut self, bits: u32) -> Self {
        self.width_cap = Some(bits);
        self
    }
    pub fn fuse_cap(mut self, cap: u32) -> Self {
        self.fuse_cap = Some(cap);
        self
    }
    pub fn floating_point(mut self) -> Self {
        self.floating_point = true;
        self
    }
    pub fn simd(mut self) -> Self {
        self.simd = true;
        self
    }
    /// Finish the description, rejecting anything the pool can not model.
    pub fn done(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }
    pub fn validate(&self) -> Result<()> {
        let invalid = |detail: String| PoolError::InvalidDescriptor {
            name: self.name.clone(),
            detail,
        };
        if self.count == 0 {
            return Err(invalid("replica count must be at least 1".to_string()));
        }
        if self.ops.is_empty() {
            return Err(invalid("no operation class declared".to_string()));
        }
        if self.width_cap == Some(0) {
            return Err(invalid("width cap must be at least 1 bit".to_string()));
        }
        for (idx, spec) in self.ops.iter().enumerate() {
            if spec.latency == 0 {
                return Err(invalid(format!("{} has zero latency", spec.op)));
            }
            if self.ops[..idx].iter().any(|prev| prev.op == spec.op) {
                return Err(PoolError::DuplicateOperationClass {
                    op: spec.op,
                    first: self.name.clone(),
                    second: self.name.clone(),
                });
            }
        }
        Ok(())
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn ops(&self) -> &[LatencySpec] {
        &self.ops
    }
    /// Latency spec of `op`, if this unit services it.
    pub fn spec(&self, op: OpClass) -> Option<&LatencySpec> {
        self.ops.iter().find(|s| s.op == op)
    }
    pub fn replicas(&self) -> usize {
        self.count
    }
    pub fn get_width_cap(&self) -> Option<u32> {
        self.width_cap
    }
    pub fn get_fuse_cap(&self) -> Option<u32> {
        self.fuse_cap
    }
    pub fn is_floating_point(&self) -> bool {
        self.floating_point
    }
    pub fn is_simd(&self) -> bool {
        self.simd
    }
    /// Whether an operand of `bits` fits through this unit in one allocation.
    pub fn fits(&self, bits: u32) -> bool {
        self.width_cap.map_or(true, |cap| bits <= cap)
    }
}

#[cfg(test)]
mod descriptor {
    use super::*;

    #[test]
    fn builder() -> Result<()> {
        let desc = FuDescriptor::create("ComplexInt")
            .op(OpClass::IntMult, 4, true)
            .op(OpClass::IntDiv, 8, false)
            .count(2)
            .done()?;
        assert_eq!(2, desc.replicas());
        assert_eq!(8, desc.spec(OpClass::IntDiv).map(|s| s.latency).unwrap_or(0));
        assert!(desc.spec(OpClass::IntAlu).is_none());
        assert!(desc.fits(u32::MAX));
        Ok(())
    }

    #[test]
    fn zero_replicas() {
        let got = FuDescriptor::create("u").op(OpClass::IntAlu, 1, true).count(0).done();
        assert!(matches!(got, Err(PoolError::InvalidDescriptor { .. })));
    }

    #[test]
    fn zero_latency() {
        let got = FuDescriptor::create("u").op(OpClass::IntAlu, 0, true).done();
        assert!(matches!(got, Err(PoolError::InvalidDescriptor { .. })));
    }

    #[test]
    fn no_ops() {
        assert!(FuDescriptor::create("empty").done().is_err());
    }

    #[test]
    fn op_declared_twice_in_one_unit() {
        let got = FuDescriptor::create("u")
            .op(OpClass::IntAlu, 1, true)
            .op(OpClass::IntAlu, 2, false)
            .done();
        assert!(matches!(
            got,
            Err(PoolError::DuplicateOperationClass { op: OpClass::IntAlu, .. })
        ));
    }

    #[test]
    fn width_cap() -> Result<()> {
        let desc = FuDescriptor::create("FP")
            .op(OpClass::FloatAdd, 3, true)
            .width_cap(128)
            .floating_point()
            .done()?;
        assert!(desc.fits(128));
        assert!(!desc.fits(129));
        assert!(desc.is_floating_point());
        assert!(!desc.is_simd());
        Ok(())
    }
}
