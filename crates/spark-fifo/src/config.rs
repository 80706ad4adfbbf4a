//! 可序列化的队列配置。
//!
//! ## 设计动机（Why）
//! - 容量与记录头宽通常来自部署配置而非代码常量；集中在一个结构体中，便于
//!   宿主以 TOML/JSON 等任意 `serde` 格式承载；
//! - 校验与分配分离：[`FifoConfig::validate`] 只做纯计算，不触发分配，可在启动早期执行。
//!
//! ## 契约说明（What）
//! - `capacity`：请求容量（元素数），会向上取整到 2 的幂；
//! - `header_width`：可选的记录头宽，缺省时使用 [`HeaderWidth::DEFAULT`]；
//! - 未知字段一律拒绝，避免拼写错误被静默忽略。

#[cfg(feature = "config")]
use alloc::string::ToString;

use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    fifo::DynamicFifo,
    record::HeaderWidth,
    units::{Capacity, ElementSize},
};

/// 动态队列的构造参数。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FifoConfig {
    pub capacity: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_width: Option<u8>,
}

impl FifoConfig {
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            header_width: None,
        }
    }

    pub const fn with_header_width(mut self, width: u8) -> Self {
        self.header_width = Some(width);
        self
    }

    /// 解析配置中的头宽；未配置返回 `Ok(None)`。
    pub fn header_width(&self) -> Result<Option<HeaderWidth>> {
        self.header_width
            .map(|width| HeaderWidth::new(usize::from(width)))
            .transpose()
    }

    /// 取整后的实际容量。
    pub fn rounded_capacity(&self) -> Result<usize> {
        Capacity::round_up(self.capacity).map(Capacity::get)
    }

    /// 以元素类型 `T` 校验全部字段，不分配内存。
    pub fn validate<T>(&self) -> Result<()> {
        ElementSize::of::<T>()?;
        self.rounded_capacity()?;
        self.header_width()?;
        Ok(())
    }

    /// 从 TOML 文本解析并校验（按字节记录队列的口径）。
    #[cfg(feature = "config")]
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(raw).map_err(|err| crate::FifoError::MalformedConfig {
                detail: err.to_string(),
            })?;
        config.validate::<u8>()?;
        Ok(config)
    }
}

impl<T: Copy> DynamicFifo<T> {
    /// 按配置分配平铺队列；头宽字段仍会被校验，但对平铺操作没有影响。
    pub fn from_config(config: &FifoConfig) -> Result<Self> {
        config.header_width()?;
        Self::allocate(config.capacity)
    }
}

#[cfg(all(test, not(any(loom, spark_loom))))]
mod tests {
    use super::*;
    use crate::error::FifoError;

    #[test]
    fn validate_reports_the_first_offending_field() {
        assert_eq!(FifoConfig::new(16).validate::<u32>(), Ok(()));
        assert_eq!(
            FifoConfig::new(1).validate::<u8>(),
            Err(FifoError::CapacityTooSmall { requested: 1 })
        );
        assert_eq!(
            FifoConfig::new(16).with_header_width(9).validate::<u8>(),
            Err(FifoError::InvalidHeaderWidth { width: 9 })
        );
        assert_eq!(
            FifoConfig::new(16).validate::<()>(),
            Err(FifoError::ZeroSizedElement)
        );
    }

    #[test]
    fn rounded_capacity_matches_allocation() {
        let config = FifoConfig::new(100);
        assert_eq!(config.rounded_capacity(), Ok(128));
        let fifo = DynamicFifo::<u16>::from_config(&config).expect("配置合法");
        assert_eq!(fifo.capacity(), 128);
    }
}
