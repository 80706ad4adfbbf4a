//! `spark-fifo` 的演示程序公共部分。
//!
//! # 模块定位（Why）
//! - 两个二进制（`fifo_selftest` 与 `fifo_spsc_demo`）共享日志初始化与配置加载；
//! - 自检矩阵放在库中，既能由二进制调用，也能在 `cargo test` 中直接运行。

pub mod selftest;

use std::{fs, path::Path};

use anyhow::Context;
use serde::Deserialize;
use spark_fifo::FifoConfig;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// 安装 `fmt` 输出与 `RUST_LOG` 过滤器；未设置环境变量时使用 `info`。
///
/// 重复调用（例如在测试中）不会 panic，后续调用直接忽略。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// 双线程示例的配置。
///
/// ```toml
/// messages = 4096
///
/// [fifo]
/// capacity = 16
/// header_width = 1   # 省略时以平铺模式逐字节传输
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DemoConfig {
    #[serde(default = "DemoConfig::default_fifo")]
    pub fifo: FifoConfig,
    #[serde(default = "DemoConfig::default_messages")]
    pub messages: usize,
}

impl DemoConfig {
    fn default_fifo() -> FifoConfig {
        FifoConfig::new(16)
    }

    fn default_messages() -> usize {
        4096
    }

    /// 解析配置文本并校验其中的队列参数。
    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(raw).context("解析示例配置失败")?;
        config.fifo.validate::<u8>()?;
        Ok(config)
    }

    /// 读取配置文件；`None` 时返回默认配置。
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件 {} 失败", path.display()))?;
        Self::from_toml_str(&raw).with_context(|| format!("配置文件 {} 无效", path.display()))
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            fifo: Self::default_fifo(),
            messages: Self::default_messages(),
        }
    }
}
