//! 运行自检矩阵；任一检查失败即以非零退出码结束。

use spark_fifo_demos::{init_tracing, selftest};
use tracing::info;

fn main() -> anyhow::Result<()> {
    init_tracing();
    let passed = selftest::run()?;
    info!(passed, "fifo selftest finished");
    Ok(())
}
