use super::op_class::OpClass;
use crate::params::cache::CacheParams;

/// Default completion latency of a memory operation without a cache model.
pub const ACCESS_LATENCY: u32 = 5;

/// Supplies the completion latency of memory operations.
/// This is where a cache hierarchy model plugs into the issue stage.
pub trait LatencySource {
    /// Cycles the memory operation `op` issued at `cycle` takes.
    fn latency(&mut self, op: OpClass, cycle: u64) -> u32;
}

/// Every access takes the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedLatency(pub u32);

impl Default for FixedLatency {
    fn default() -> Self {
        FixedLatency(ACCESS_LATENCY)
    }
}

impl LatencySource for FixedLatency {
    fn latency(&mut self, _op: OpClass, _cycle: u64) -> u32 {
        self.0
    }
}

/// Every access hits in one cache level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheLatency {
    load: u32,
    store: u32,
}

impl CacheLatency {
    pub fn from_params(cache: &CacheParams) -> Self {
        let load = cache.hit_latency();
        // a free write buffer takes the store right after the tag check
        let store = if cache.write_buffers > 0 {
            cache.tag_latency + cache.response_latency
        } else {
            load
        };
        Self {
            load: load.max(1),
            store: store.max(1),
        }
    }
}

impl LatencySource for CacheLatency {
    fn latency(&mut self, op: OpClass, _cycle: u64) -> u32 {
        match op {
            OpClass::MemWrite | OpClass::FloatMemWrite => self.store,
            _ => self.load,
        }
    }
}

#[cfg(test)]
mod latency {
    use super::*;
    use crate::params::CoreConfig;

    #[test]
    fn fixed() {
        let mut src = FixedLatency::default();
        assert_eq!(ACCESS_LATENCY, src.latency(OpClass::MemRead, 0));
    }

    #[test]
    fn reference_dcache() {
        let config = CoreConfig::o3_arm_v7a();
        let dcache = config.cache("dcache").expect("preset has a dcache");
        let mut src = CacheLatency::from_params(dcache);
        assert_eq!(3, src.latency(OpClass::MemRead, 0));
        assert_eq!(3, src.latency(OpClass::FloatMemRead, 0));
        assert_eq!(3, src.latency(OpClass::MemWrite, 0));
    }

    #[test]
    fn l2_hit() {
        let config = CoreConfig::o3_arm_v7a();
        let l2 = config.cache("l2").expect("preset has an l2");
        let mut src = CacheLatency::from_params(l2);
        assert_eq!(14, src.latency(OpClass::MemRead, 7));
        assert_eq!(14, src.latency(OpClass::MemWrite, 7));
    }

    #[test]
    fn store_without_write_buffers_pays_full_hit() {
        let mut icache = CoreConfig::o3_arm_v7a()
            .cache("icache")
            .cloned()
            .expect("preset has an icache");
        icache.tag_latency = 1;
        icache.data_latency = 3;
        let mut src = CacheLatency::from_params(&icache);
        assert_eq!(4, src.latency(OpClass::MemWrite, 0));
    }
}
