//! 正确性自检矩阵：字节/字 × 静态/动态 × 平铺/记录。
//!
//! 每一步通过后记录一条 `info` 事件，第一处失败即返回错误，由二进制转换为非零退出码。

use std::fmt::Debug;

use anyhow::{Context, ensure};
use spark_fifo::{
    DynamicFifo, DynamicRecordFifo, Fifo, HeaderWidth, RecordFifo, StaticFifo, StaticRecordFifo,
    Storage,
};
use tracing::info;

/// 每个用例的容量与循环次数。
pub const TEST_LOOP: usize = 16;

pub const BYTE_TABLE: [u8; TEST_LOOP] = *b"lightcore,helllo";

pub const WORD_TABLE: [u64; TEST_LOOP] = [
    0x0000_0000_0000_0000,
    0x1111_1111_1111_1111,
    0x2222_2222_2222_2222,
    0x3333_3333_3333_3333,
    0x4444_4444_4444_4444,
    0x5555_5555_5555_5555,
    0x6666_6666_6666_6666,
    0x7777_7777_7777_7777,
    0x8888_8888_8888_8888,
    0x9999_9999_9999_9999,
    0xaaaa_aaaa_aaaa_aaaa,
    0xbbbb_bbbb_bbbb_bbbb,
    0xcccc_cccc_cccc_cccc,
    0xdddd_dddd_dddd_dddd,
    0xeeee_eeee_eeee_eeee,
    0xffff_ffff_ffff_ffff,
];

/// 运行完整矩阵，返回通过的检查数。
pub fn run() -> anyhow::Result<usize> {
    let mut passed = 0;

    let mut normal_bytes = StaticFifo::<u8, TEST_LOOP>::new();
    let mut normal_words = StaticFifo::<u64, TEST_LOOP>::new();
    passed += check_flat("normal_bytetest", &mut normal_bytes, &BYTE_TABLE)?;
    passed += check_flat("normal_longtest", &mut normal_words, &WORD_TABLE)?;

    let mut dynamic_bytes =
        DynamicFifo::<u8>::allocate(TEST_LOOP).context("分配 dynamic_bytetest 失败")?;
    let mut dynamic_words =
        DynamicFifo::<u64>::allocate(TEST_LOOP).context("分配 dynamic_longtest 失败")?;
    passed += check_flat("dynamic_bytetest", &mut dynamic_bytes, &BYTE_TABLE)?;
    passed += check_flat("dynamic_longtest", &mut dynamic_words, &WORD_TABLE)?;

    let width = HeaderWidth::DEFAULT;
    let mut normal_records = StaticRecordFifo::<TEST_LOOP>::new(width);
    passed += check_records("record_bytetest", &mut normal_records)?;
    let mut dynamic_records = DynamicRecordFifo::allocate(TEST_LOOP, width)
        .context("分配 dynamic_record_bytetest 失败")?;
    passed += check_records("dynamic_record_bytetest", &mut dynamic_records)?;

    passed += check_released("dynamic_bytetest", &mut dynamic_bytes)?;
    Ok(passed)
}

fn check_flat<T, S>(
    case: &str,
    fifo: &mut Fifo<T, S>,
    table: &[T; TEST_LOOP],
) -> anyhow::Result<usize>
where
    T: Copy + Debug + PartialEq + Default,
    S: Storage<T>,
{
    let mut passed = 0;
    for (count, value) in table.iter().copied().enumerate() {
        ensure!(
            fifo.put(value) && fifo.len() == count + 1,
            "{case} {count} put {value:?}: failed"
        );
        info!(case, count, ?value, "put pass");
        passed += 1;
    }

    ensure!(fifo.is_full(), "{case} check full: failed");
    info!(case, "check full pass");
    passed += 1;

    ensure!(
        !fifo.put(table[0]) && fifo.len() == TEST_LOOP,
        "{case} put when full: failed"
    );
    info!(case, "put when full pass");
    passed += 1;

    for (count, expected) in table.iter().copied().enumerate() {
        let value = fifo.get();
        ensure!(value == Some(expected), "{case} {count} get {value:?}: failed");
        info!(case, count, ?expected, "get pass");
        passed += 1;
    }

    ensure!(fifo.get().is_none(), "{case} get when empty: failed");
    info!(case, "get when empty pass");
    passed += 1;

    let written = fifo.push_slice(table);
    ensure!(written == TEST_LOOP, "{case} copy in: failed ({written})");
    let mut out = [T::default(); TEST_LOOP];
    let read = fifo.pop_slice(&mut out);
    ensure!(read == TEST_LOOP, "{case} copy out: failed ({read})");
    ensure!(&out == table, "{case} check copy: failed");
    info!(case, "copy in/out pass");
    Ok(passed + 3)
}

fn check_records<S: Storage<u8>>(case: &str, fifo: &mut RecordFifo<S>) -> anyhow::Result<usize> {
    let mut passed = 0;
    let mut out = [0u8; TEST_LOOP];
    for count in 1..TEST_LOOP {
        let written = fifo.push_record(&BYTE_TABLE[..count]);
        ensure!(written == count, "{case} copy {count} in: failed ({written})");
        let read = fifo.pop_record(&mut out);
        ensure!(read == count, "{case} copy {count} out: failed ({read})");
        ensure!(
            out[..count] == BYTE_TABLE[..count],
            "{case} check {count} copy: failed"
        );
        info!(case, count, "record round trip pass");
        passed += 3;
    }
    Ok(passed)
}

fn check_released(case: &str, fifo: &mut DynamicFifo<u8>) -> anyhow::Result<usize> {
    fifo.free();
    ensure!(fifo.capacity() == 0 && fifo.is_empty(), "{case} free: failed");
    ensure!(!fifo.put(b'x'), "{case} put after free: failed");
    info!(case, "free pass");
    Ok(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_matrix_passes() {
        let passed = run().expect("自检矩阵应全部通过");
        // 4 个平铺用例各 38 项，2 个记录用例各 45 项，外加释放检查。
        assert_eq!(passed, 4 * 38 + 2 * 45 + 2);
    }
}
