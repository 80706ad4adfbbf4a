#![cfg_attr(not(feature = "std"), no_std)]
#![warn(clippy::undocumented_unsafe_blocks)]

//! `spark-fifo` 提供基于 2 的幂容量的环形 FIFO。
//!
//! # 模块定位（Why）
//! - 在生产者/消费者之间搬运定长元素或变长记录，热路径上不分配内存、不加锁；
//! - 同一套引擎同时服务“编译期容量 + 内联存储”与“运行期容量 + 堆存储”两种形态，
//!   调用方只需在类型别名 [`StaticFifo`] 与 [`DynamicFifo`] 之间选择。
//!
//! # 设计概要（How）
//! - `state`：读写游标快照与占用/空闲计数，游标自由递增，仅在索引时按掩码取模；
//! - `copy`：平铺拷贝引擎，唯一处理环绕（fold）的位置，以强类型的元素数/字节偏移换算；
//! - `storage`：内联与堆两种后端，堆后端负责 2 的幂取整、零初始化分配与一次性释放；
//! - `fifo`：单线程独占 API（`&mut self`）；
//! - `record`：带小端长度头的记录帧；
//! - `spsc`：拆分后的 [`Producer`]/[`Consumer`]，以 Acquire/Release 发布游标；
//! - `config`：可序列化的容量/头宽配置。
//!
//! # 并发契约（What）
//! - 独占 API 依赖借用规则，天然无竞争；
//! - 跨线程使用必须经由 [`Fifo::split`]，且仅支持单生产者/单消费者；
//!   多生产者或多消费者需在外部串行化（互斥锁或通道）后再调用。

extern crate alloc;

mod config;
mod copy;
mod error;
mod fifo;
mod record;
mod spsc;
mod state;
mod storage;
mod sync;
mod units;

pub use config::FifoConfig;
pub use error::{FifoError, Result};
pub use fifo::{DynamicFifo, Fifo, StaticFifo};
pub use record::{
    DynamicRecordFifo, HeaderWidth, RecordConsumer, RecordFifo, RecordProducer, StaticRecordFifo,
};
pub use spsc::{Consumer, Producer};
pub use storage::{HeapStorage, InlineStorage, Storage};

/// 仅本 crate 可实现的 trait 封印。
mod sealed {
    pub trait Sealed {}
}
