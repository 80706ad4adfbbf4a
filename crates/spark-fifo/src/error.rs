//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 集中声明构造期与分配期可能出现的失败：非法配置与资源耗尽；
//! - “队列已满/已空/只搬运了一部分”属于正常背压信号，通过计数或布尔值返回，不在此处建模。
//!
//! ## 设计要求（What）
//! - 启用 `std` 时派生 `thiserror::Error`，与 `std::error::Error` 生态兼容；
//! - `no_std` 下手写 `Display`，文案与 `std` 版本保持一致。

#[cfg(not(feature = "std"))]
use core::fmt;

use alloc::string::String;

#[cfg(feature = "std")]
use thiserror::Error;

/// FIFO 构造、分配与配置阶段的错误域。
///
/// # 教案式说明
/// - **意图 (Why)**：把“调用方给错了参数”和“系统没内存了”区分开，前者应修正配置，
///   后者可由调用方自行决定是否稍后重试；
/// - **契约 (What)**：所有变体均为 `Send + Sync + 'static`，可跨线程传播；
///   发生错误时不会留下半构造的队列；
/// - **风险 (Trade-offs)**：`MalformedConfig` 携带 `String` 细节，只在冷路径上产生。
#[cfg_attr(feature = "std", derive(Error))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FifoError {
    /// 请求容量取整到 2 的幂后仍小于最小容量 2。
    #[cfg_attr(
        feature = "std",
        error("requested capacity {requested} rounds below the minimum of 2 slots")
    )]
    CapacityTooSmall { requested: usize },

    /// 请求容量无法取整到可表示的 2 的幂，或字节总量溢出。
    #[cfg_attr(
        feature = "std",
        error("requested capacity {requested} overflows the addressable region")
    )]
    CapacityOverflow { requested: usize },

    /// 元素类型大小为 0，无法构成可寻址的存储区。
    #[cfg_attr(feature = "std", error("zero-sized element types cannot back a fifo"))]
    ZeroSizedElement,

    /// 堆分配失败；与“队列已满”是两类不同的条件。
    #[cfg_attr(feature = "std", error("failed to allocate {bytes} bytes of fifo storage"))]
    OutOfMemory { bytes: usize },

    /// 记录头宽度不在 1..=8 字节之间。
    #[cfg_attr(
        feature = "std",
        error("record header width {width} is outside the supported range 1..=8")
    )]
    InvalidHeaderWidth { width: usize },

    /// 外部配置文本无法解析。
    #[cfg_attr(feature = "std", error("malformed fifo configuration: {detail}"))]
    MalformedConfig { detail: String },
}

impl FifoError {
    /// 是否属于资源耗尽（分配失败），而非参数错误。
    pub fn is_resource_exhaustion(&self) -> bool {
        matches!(self, FifoError::OutOfMemory { .. })
    }

    /// 是否属于调用方可修正的非法配置。
    pub fn is_invalid_config(&self) -> bool {
        !self.is_resource_exhaustion()
    }
}

#[cfg(not(feature = "std"))]
impl fmt::Display for FifoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FifoError::CapacityTooSmall { requested } => write!(
                f,
                "requested capacity {requested} rounds below the minimum of 2 slots"
            ),
            FifoError::CapacityOverflow { requested } => write!(
                f,
                "requested capacity {requested} overflows the addressable region"
            ),
            FifoError::ZeroSizedElement => {
                f.write_str("zero-sized element types cannot back a fifo")
            }
            FifoError::OutOfMemory { bytes } => {
                write!(f, "failed to allocate {bytes} bytes of fifo storage")
            }
            FifoError::InvalidHeaderWidth { width } => write!(
                f,
                "record header width {width} is outside the supported range 1..=8"
            ),
            FifoError::MalformedConfig { detail } => {
                write!(f, "malformed fifo configuration: {detail}")
            }
        }
    }
}

/// 本 crate 统一的结果类型。
pub type Result<T, E = FifoError> = core::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn only_allocation_failure_counts_as_exhaustion() {
        assert!(FifoError::OutOfMemory { bytes: 64 }.is_resource_exhaustion());
        assert!(FifoError::CapacityTooSmall { requested: 1 }.is_invalid_config());
        assert!(FifoError::ZeroSizedElement.is_invalid_config());
    }

    #[test]
    fn display_mentions_the_offending_value() {
        let text = FifoError::InvalidHeaderWidth { width: 9 }.to_string();
        assert!(text.contains('9'), "错误文案应包含非法宽度: {text}");
    }
}
