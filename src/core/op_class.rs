use serde::Deserialize;
use std::fmt::{self, Display};
use std::str::FromStr;

/// Kind of work a micro-operation asks a functional unit to do.
/// Only used as a lookup key: it carries no behavior of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
pub enum OpClass {
    IntAlu,
    IntMult,
    IntDiv,
    FloatAdd,
    FloatCmp,
    FloatCvt,
    FloatMult,
    FloatMultAcc,
    FloatDiv,
    FloatMisc,
    FloatSqrt,
    SimdAdd,
    SimdAddAcc,
    SimdAlu,
    SimdCmp,
    SimdCvt,
    SimdMisc,
    SimdMult,
    SimdMultAcc,
    SimdShift,
    SimdShiftAcc,
    SimdDiv,
    SimdSqrt,
    SimdFloatAdd,
    SimdFloatAlu,
    SimdFloatCmp,
    SimdFloatCvt,
    SimdFloatDiv,
    SimdFloatMisc,
    SimdFloatMult,
    SimdFloatMultAcc,
    SimdFloatSqrt,
    MemRead,
    MemWrite,
    FloatMemRead,
    FloatMemWrite,
    IprAccess,
    InstPrefetch,
}

const ALL: [OpClass; 38] = {
    use OpClass::*;
    [
        IntAlu,
        IntMult,
        IntDiv,
        FloatAdd,
        FloatCmp,
        FloatCvt,
        FloatMult,
        FloatMultAcc,
        FloatDiv,
        FloatMisc,
        FloatSqrt,
        SimdAdd,
        SimdAddAcc,
        SimdAlu,
        SimdCmp,
        SimdCvt,
        SimdMisc,
        SimdMult,
        SimdMultAcc,
        SimdShift,
        SimdShiftAcc,
        SimdDiv,
        SimdSqrt,
        SimdFloatAdd,
        SimdFloatAlu,
        SimdFloatCmp,
        SimdFloatCvt,
        SimdFloatDiv,
        SimdFloatMisc,
        SimdFloatMult,
        SimdFloatMultAcc,
        SimdFloatSqrt,
        MemRead,
        MemWrite,
        FloatMemRead,
        FloatMemWrite,
        IprAccess,
        InstPrefetch,
    ]
};

impl OpClass {
    /// Every class in declaration order.
    pub fn all() -> &'static [OpClass] {
        &ALL
    }
    /// Loads and stores take their latency from the cache hierarchy.
    pub fn is_memory(&self) -> bool {
        use OpClass::*;
        matches!(self, MemRead | MemWrite | FloatMemRead | FloatMemWrite)
    }
    pub fn is_float(&self) -> bool {
        use OpClass::*;
        matches!(
            self,
            FloatAdd
                | FloatCmp
                | FloatCvt
                | FloatMult
                | FloatMultAcc
                | FloatDiv
                | FloatMisc
                | FloatSqrt
                | FloatMemRead
                | FloatMemWrite
        )
    }
    pub fn is_simd(&self) -> bool {
        format!("{:?}", self).starts_with("Simd")
    }
}

impl Display for OpClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl FromStr for OpClass {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL.iter()
            .find(|op| op.to_string() == s)
            .copied()
            .ok_or_else(|| format!("Unknown operation class {}", s))
    }
}
