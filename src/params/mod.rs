//! Construction time configuration of a core.
//!
//! Everything here is read once, validated, and turned into a
//! [`FuPool`](crate::core::pool::FuPool) before the first cycle runs.

pub mod branch_predictor;
pub mod cache;
pub mod error;

use crate::core::op_class::OpClass;
use crate::core::pool::FuPool;
use crate::functional_units::descriptor::FuDescriptor;
use crate::functional_units::power::PowerGate;
use branch_predictor::BranchPredictorParams;
use cache::{CacheParams, Clusivity, PrefetcherKind, PrefetcherParams, ReplacementPolicy};
use error::{ConfigError, Result};
use log::info;
use serde::Deserialize;
use std::path::Path;

/// One `(class, latency, pipelined)` entry of a unit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OpConfig {
    pub op: OpClass,
    #[serde(default = "OpConfig::default_latency")]
    pub latency: u32,
    #[serde(default = "OpConfig::default_pipelined")]
    pub pipelined: bool,
}

impl OpConfig {
    fn default_latency() -> u32 {
        1
    }
    fn default_pipelined() -> bool {
        true
    }
    fn new(op: OpClass, latency: u32) -> Self {
        Self {
            op,
            latency,
            pipelined: true,
        }
    }
    fn exclusive(op: OpClass, latency: u32) -> Self {
        Self {
            op,
            latency,
            pipelined: false,
        }
    }
}

/// Declaration of one functional unit type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UnitConfig {
    pub name: String,
    pub ops: Vec<OpConfig>,
    #[serde(default = "UnitConfig::default_count")]
    pub count: usize,
    #[serde(default)]
    pub width_cap: Option<u32>,
    #[serde(default)]
    pub fuse_cap: Option<u32>,
    #[serde(default)]
    pub floating_point: bool,
    #[serde(default)]
    pub simd: bool,
}

impl UnitConfig {
    fn default_count() -> usize {
        1
    }
    fn new(name: &str, count: usize, ops: Vec<OpConfig>) -> Self {
        Self {
            name: name.to_string(),
            ops,
            count,
            width_cap: None,
            fuse_cap: None,
            floating_point: false,
            simd: false,
        }
    }
    /// Turn the declaration into a validated descriptor.
    pub fn descriptor(&self) -> crate::core::error::Result<FuDescriptor> {
        let mut desc = FuDescriptor::create(&self.name).count(self.count);
        for op in self.ops.iter() {
            desc = desc.op(op.op, op.latency, op.pipelined);
        }
        if let Some(bits) = self.width_cap {
            desc = desc.width_cap(bits);
        }
        if let Some(cap) = self.fuse_cap {
            desc = desc.fuse_cap(cap);
        }
        if self.floating_point {
            desc = desc.floating_point();
        }
        if self.simd {
            desc = desc.simd();
        }
        desc.done()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PoolConfig {
    /// Idle cycles before an instance is gated. Zero disables gating.
    #[serde(default)]
    pub breakeven_threshold: u64,
    #[serde(default = "PoolConfig::default_wake_latency")]
    pub wake_latency: u32,
    pub units: Vec<UnitConfig>,
}

impl PoolConfig {
    fn default_wake_latency() -> u32 {
        1
    }
    pub fn build(&self) -> Result<FuPool> {
        let descriptors = self
            .units
            .iter()
            .map(|u| u.descriptor())
            .collect::<crate::core::error::Result<Vec<_>>>()?;
        let gate = PowerGate::new(self.breakeven_threshold, self.wake_latency);
        Ok(FuPool::build(descriptors, gate)?)
    }
}

/// Issue stage sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CoreParams {
    #[serde(default = "CoreParams::default_issue_width")]
    pub issue_width: usize,
    #[serde(default = "CoreParams::default_num_iq_entries")]
    pub num_iq_entries: usize,
}

impl CoreParams {
    fn default_issue_width() -> usize {
        8
    }
    fn default_num_iq_entries() -> usize {
        64
    }
}

impl Default for CoreParams {
    fn default() -> Self {
        Self {
            issue_width: Self::default_issue_width(),
            num_iq_entries: Self::default_num_iq_entries(),
        }
    }
}

/// Full description of one core.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CoreConfig {
    #[serde(default)]
    pub core: CoreParams,
    pub pool: PoolConfig,
    #[serde(default)]
    pub branch_predictor: Option<BranchPredictorParams>,
    #[serde(default)]
    pub caches: Vec<CacheParams>,
}

impl CoreConfig {
    /// Load a TOML configuration file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        info!("Loaded core configuration from {}", path.display());
        Ok(config)
    }
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }
    /// Check every record, including building a throwaway pool, so that
    /// configuration mistakes surface before the simulation starts.
    pub fn validate(&self) -> Result<()> {
        if self.core.issue_width == 0 || self.core.num_iq_entries == 0 {
            return Err(ConfigError::Validation {
                detail: String::from("issue width and IQ entries must be at least 1"),
            });
        }
        self.pool.build()?;
        if let Some(bp) = self.branch_predictor.as_ref() {
            bp.validate()?;
        }
        for cache in self.caches.iter() {
            cache.validate()?;
        }
        Ok(())
    }
    pub fn cache(&self, name: &str) -> Option<&CacheParams> {
        self.caches.iter().find(|c| c.name == name)
    }
    /// The high performance out-of-order core used as the default model.
    pub fn o3_arm_v7a() -> Self {
        use OpClass::*;
        let complex_int = UnitConfig::new(
            "ComplexInt",
            2,
            vec![
                OpConfig::new(IntMult, 4),
                OpConfig::exclusive(IntDiv, 8),
                OpConfig::new(IprAccess, 3),
            ],
        );
        let mut load = UnitConfig::new(
            "Load",
            2,
            vec![OpConfig::new(MemRead, 2), OpConfig::new(FloatMemRead, 2)],
        );
        load.width_cap = Some(128);
        let mut store = UnitConfig::new(
            "Store",
            2,
            vec![OpConfig::new(MemWrite, 2), OpConfig::new(FloatMemWrite, 2)],
        );
        store.width_cap = Some(128);
        let mut fp = UnitConfig::new(
            "FP",
            2,
            vec![
                OpConfig::new(FloatAdd, 3),
                OpConfig::new(FloatCmp, 3),
                OpConfig::new(FloatCvt, 3),
                OpConfig::exclusive(FloatDiv, 9),
                OpConfig::exclusive(FloatSqrt, 33),
                OpConfig::new(FloatMult, 4),
                OpConfig::new(FloatMultAcc, 4),
                OpConfig::new(FloatMisc, 3),
            ],
        );
        fp.width_cap = Some(128);
        fp.floating_point = true;
        let simd_ops = [
            (SimdAdd, 3),
            (SimdAddAcc, 3),
            (SimdAlu, 3),
            (SimdCmp, 3),
            (SimdCvt, 3),
            (SimdMisc, 3),
            (SimdMult, 4),
            (SimdMultAcc, 4),
            (SimdShift, 3),
            (SimdShiftAcc, 3),
            (SimdSqrt, 10),
            (SimdFloatAdd, 4),
            (SimdFloatAlu, 4),
            (SimdFloatCmp, 4),
            (SimdFloatCvt, 4),
            (SimdFloatDiv, 4),
            (SimdFloatMisc, 4),
            (SimdFloatMult, 5),
            (SimdFloatMultAcc, 5),
            (SimdFloatSqrt, 10),
        ];
        let mut simd = UnitConfig::new(
            "AdvSimd",
            2,
            simd_ops
                .iter()
                .map(|(op, lat)| OpConfig::new(*op, *lat))
                .collect(),
        );
        simd.fuse_cap = Some(0);
        simd.width_cap = Some(128);
        simd.simd = true;

        let pool = PoolConfig {
            breakeven_threshold: 150,
            wake_latency: PoolConfig::default_wake_latency(),
            units: vec![
                UnitConfig::new("SimpleInt", 6, vec![OpConfig::new(IntAlu, 1)]),
                complex_int,
                load,
                store,
                fp,
                simd,
            ],
        };
        Self {
            core: CoreParams {
                issue_width: 12,
                num_iq_entries: 180,
            },
            pool,
            branch_predictor: Some(BranchPredictorParams::bimode()),
            caches: reference_caches(),
        }
    }
}

fn reference_caches() -> Vec<CacheParams> {
    let level = |name: &str, tag: u32, data: u32, response: u32, size: &str, assoc: u32| {
        CacheParams {
            name: name.to_string(),
            tag_latency: tag,
            data_latency: data,
            response_latency: response,
            sequential_access: false,
            mshrs: 8,
            tgts_per_mshr: 8,
            size: size.to_string(),
            assoc,
            line_size: 64,
            write_buffers: 0,
            is_read_only: false,
            writeback_clean: true,
            prefetch_on_access: false,
            clusivity: Clusivity::MostlyIncl,
            prefetcher: None,
            replacement_policy: ReplacementPolicy::Lru,
        }
    };

    let mut icache = level("icache", 1, 1, 1, "64kB", 4);
    icache.is_read_only = true;

    let mut dcache = level("dcache", 2, 2, 1, "64kB", 4);
    dcache.mshrs = 20;
    dcache.tgts_per_mshr = 16;
    dcache.write_buffers = 24;

    let mut walk = level("walk_cache", 4, 4, 4, "1kB", 8);
    walk.mshrs = 6;
    walk.write_buffers = 16;
    walk.is_read_only = true;

    let mut l2 = level("l2", 9, 9, 5, "256kB", 8);
    l2.mshrs = 46;
    l2.tgts_per_mshr = 16;
    l2.write_buffers = 24;
    l2.prefetch_on_access = true;
    l2.prefetcher = Some(PrefetcherParams {
        kind: PrefetcherKind::Stride,
        degree: 8,
        latency: 1,
    });
    l2.replacement_policy = ReplacementPolicy::Random;

    vec![icache, dcache, walk, l2]
}

#[cfg(test)]
mod params {
    use super::*;

    const SMALL: &str = r#"
[core]
issue_width = 4

[pool]
breakeven_threshold = 10
wake_latency = 2

[[pool.units]]
name = "Int"
count = 2
ops = [{ op = "IntAlu" }, { op = "IntDiv", latency = 8, pipelined = false }]

[[pool.units]]
name = "Vec"
width_cap = 128
simd = true
ops = [{ op = "SimdAdd", latency = 3 }]

[branch_predictor]
kind = "BiModeBP"
global_predictor_size = 4096
global_ctr_bits = 2
choice_predictor_size = 4096
choice_ctr_bits = 2
btb_entries = 2048
btb_tag_size = 16
ras_size = 8

[[caches]]
name = "dcache"
tag_latency = 2
data_latency = 2
response_latency = 1
mshrs = 4
tgts_per_mshr = 8
size = "32kB"
assoc = 4
replacement_policy = "RandomRP"
prefetcher = { kind = "StridePrefetcher", degree = 4 }
"#;

    #[test]
    fn parse_small_config() -> Result<()> {
        let config = CoreConfig::from_toml_str(SMALL)?;
        assert_eq!(4, config.core.issue_width);
        assert_eq!(64, config.core.num_iq_entries);
        assert_eq!(2, config.pool.units.len());
        let int = &config.pool.units[0];
        assert_eq!(OpConfig::new(OpClass::IntAlu, 1), int.ops[0]);
        assert!(!int.ops[1].pipelined);
        let dcache = config.cache("dcache").ok_or_else(|| ConfigError::Validation {
            detail: String::from("dcache missing"),
        })?;
        assert_eq!(ReplacementPolicy::Random, dcache.replacement_policy);
        assert_eq!(Some(4), dcache.prefetcher.map(|p| p.degree));
        assert_eq!(Some(1), dcache.prefetcher.map(|p| p.latency));

        let pool = config.pool.build()?;
        assert_eq!(3, pool.instances().len());
        assert_eq!(10, pool.power_gate().breakeven());
        assert_eq!(2, pool.power_gate().wake_latency());
        Ok(())
    }

    #[test]
    fn duplicate_class_is_a_config_error() {
        let text = r#"
[pool]
units = [
    { name = "A", ops = [{ op = "IntAlu" }] },
    { name = "B", ops = [{ op = "IntAlu" }] },
]
"#;
        let got = CoreConfig::from_toml_str(text);
        assert!(matches!(got, Err(ConfigError::Pool(_))));
    }

    #[test]
    fn unknown_class_is_a_parse_error() {
        let text = r#"
[pool]
units = [{ name = "A", ops = [{ op = "IntAdd" }] }]
"#;
        assert!(matches!(
            CoreConfig::from_toml_str(text),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn gating_off_by_default() -> Result<()> {
        let text = r#"
[pool]
units = [{ name = "A", ops = [{ op = "IntAlu" }] }]
"#;
        let config = CoreConfig::from_toml_str(text)?;
        assert!(!config.pool.build()?.power_gate().is_enabled());
        assert!(config.branch_predictor.is_none());
        Ok(())
    }

    #[test]
    fn reference_core_is_valid() -> Result<()> {
        let config = CoreConfig::o3_arm_v7a();
        config.validate()?;
        let pool = config.pool.build()?;
        assert_eq!(16, pool.instances().len());
        let fp = pool
            .descriptor_for(OpClass::FloatSqrt)
            .ok_or_else(|| ConfigError::Validation {
                detail: String::from("FloatSqrt unsupported"),
            })?;
        assert_eq!("FP", fp.name());
        assert_eq!(Some(128), fp.get_width_cap());
        let simd = pool.descriptor_for(OpClass::SimdFloatSqrt);
        assert_eq!(Some(Some(0)), simd.map(|d| d.get_fuse_cap()));
        assert_eq!(4, config.caches.len());
        Ok(())
    }
}
