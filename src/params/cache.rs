//! Cache geometry and timing records.
//!
//! Consumed by the cache model, not by the functional unit pool. The pool
//! only sees the latency a [`CacheLatency`](crate::core::latency::CacheLatency)
//! derives from one of these.

use super::error::{ConfigError, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Clusivity {
    #[default]
    MostlyIncl,
    MostlyExcl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum ReplacementPolicy {
    #[default]
    #[serde(alias = "LRURP")]
    Lru,
    #[serde(alias = "RandomRP")]
    Random,
    #[serde(alias = "FIFORP")]
    Fifo,
    #[serde(alias = "TreePLRURP")]
    TreePlru,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum PrefetcherKind {
    #[serde(alias = "StridePrefetcher")]
    Stride,
    #[serde(alias = "TaggedPrefetcher")]
    Tagged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PrefetcherParams {
    pub kind: PrefetcherKind,
    #[serde(default = "PrefetcherParams::default_degree")]
    pub degree: u32,
    #[serde(default = "PrefetcherParams::default_latency")]
    pub latency: u32,
}

impl PrefetcherParams {
    fn default_degree() -> u32 {
        1
    }
    fn default_latency() -> u32 {
        1
    }
}

/// One cache level.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CacheParams {
    pub name: String,
    pub tag_latency: u32,
    pub data_latency: u32,
    pub response_latency: u32,
    /// Tag and data arrays accessed one after the other.
    #[serde(default)]
    pub sequential_access: bool,
    pub mshrs: u32,
    pub tgts_per_mshr: u32,
    /// Capacity with a unit suffix, e.g. `"64kB"`.
    pub size: String,
    pub assoc: u32,
    #[serde(default = "CacheParams::default_line_size")]
    pub line_size: u32,
    #[serde(default)]
    pub write_buffers: u32,
    #[serde(default)]
    pub is_read_only: bool,
    #[serde(default)]
    pub writeback_clean: bool,
    #[serde(default)]
    pub prefetch_on_access: bool,
    #[serde(default)]
    pub clusivity: Clusivity,
    #[serde(default)]
    pub prefetcher: Option<PrefetcherParams>,
    #[serde(default)]
    pub replacement_policy: ReplacementPolicy,
}

impl CacheParams {
    fn default_line_size() -> u32 {
        64
    }
    /// Capacity in bytes.
    pub fn size_bytes(&self) -> Result<u64> {
        parse_size(&self.size).ok_or_else(|| ConfigError::Validation {
            detail: format!("{}: invalid cache size {:?}", self.name, self.size),
        })
    }
    pub fn num_sets(&self) -> Result<u64> {
        let lines = self.size_bytes()? / u64::from(self.line_size.max(1));
        Ok(lines / u64::from(self.assoc.max(1)))
    }
    /// Cycles for a hit, from request to response.
    pub fn hit_latency(&self) -> u32 {
        let access = if self.sequential_access {
            self.tag_latency + self.data_latency
        } else {
            self.tag_latency.max(self.data_latency)
        };
        access + self.response_latency
    }
    pub fn validate(&self) -> Result<()> {
        let invalid = |detail: String| ConfigError::Validation {
            detail: format!("{}: {}", self.name, detail),
        };
        if self.assoc == 0 {
            return Err(invalid("associativity must be at least 1".to_string()));
        }
        if !self.line_size.is_power_of_two() {
            return Err(invalid(format!("line size {} is not a power of two", self.line_size)));
        }
        if self.mshrs == 0 || self.tgts_per_mshr == 0 {
            return Err(invalid("needs at least one MSHR and one target".to_string()));
        }
        let sets = self.num_sets()?;
        if sets == 0 || !sets.is_power_of_two() {
            return Err(invalid(format!("{} sets is not a power of two", sets)));
        }
        Ok(())
    }
}

/// Parse a capacity such as `"64kB"`, `"8MB"` or `"512B"`.
pub fn parse_size(text: &str) -> Option<u64> {
    let text = text.trim();
    let split = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let (digits, unit) = text.split_at(split);
    let value: u64 = digits.parse().ok()?;
    let scale = match unit.trim() {
        "" | "B" => 1,
        "kB" | "KB" | "KiB" => 1 << 10,
        "MB" | "MiB" => 1 << 20,
        "GB" | "GiB" => 1 << 30,
        _ => return None,
    };
    value.checked_mul(scale)
}

#[cfg(test)]
mod cache {
    use super::*;

    fn dcache() -> CacheParams {
        CacheParams {
            name: String::from("dcache"),
            tag_latency: 2,
            data_latency: 2,
            response_latency: 1,
            sequential_access: false,
            mshrs: 20,
            tgts_per_mshr: 16,
            size: String::from("64kB"),
            assoc: 4,
            line_size: 64,
            write_buffers: 24,
            is_read_only: false,
            writeback_clean: true,
            prefetch_on_access: false,
            clusivity: Clusivity::MostlyIncl,
            prefetcher: None,
            replacement_policy: ReplacementPolicy::Lru,
        }
    }

    #[test]
    fn sizes() {
        assert_eq!(Some(64 * 1024), parse_size("64kB"));
        assert_eq!(Some(1024), parse_size("1kB"));
        assert_eq!(Some(8 << 20), parse_size("8MB"));
        assert_eq!(Some(512), parse_size("512B"));
        assert_eq!(Some(512), parse_size("512"));
        assert_eq!(None, parse_size("64 furlongs"));
        assert_eq!(None, parse_size("kB"));
    }

    #[test]
    fn geometry() -> Result<()> {
        let c = dcache();
        assert_eq!(256, c.num_sets()?);
        c.validate()?;
        Ok(())
    }

    #[test]
    fn hit_latency() {
        let mut c = dcache();
        assert_eq!(3, c.hit_latency());
        c.sequential_access = true;
        assert_eq!(5, c.hit_latency());
    }

    #[test]
    fn odd_set_count_rejected() {
        let mut c = dcache();
        c.assoc = 3;
        assert!(c.validate().is_err());
    }

    #[test]
    fn bad_size_rejected() {
        let mut c = dcache();
        c.size = String::from("lots");
        assert!(matches!(c.validate(), Err(ConfigError::Validation { .. })));
    }
}
