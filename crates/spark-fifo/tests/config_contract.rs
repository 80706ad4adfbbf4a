//! TOML 配置加载的契约测试（需启用 `config` 特性）。
#![cfg(not(any(loom, spark_loom)))]

use spark_fifo::{DynamicFifo, DynamicRecordFifo, FifoConfig, FifoError, HeaderWidth};

#[test]
fn full_document_builds_a_record_queue() {
    let config = FifoConfig::from_toml_str("capacity = 300\nheader_width = 2\n").expect("配置合法");
    assert_eq!(config, FifoConfig::new(300).with_header_width(2));
    assert_eq!(config.rounded_capacity(), Ok(512));

    let fifo = DynamicRecordFifo::from_config(&config).expect("分配应成功");
    assert_eq!(fifo.capacity(), 512);
    assert_eq!(fifo.header_width(), HeaderWidth::new(2).expect("合法宽度"));
}

#[test]
fn header_width_defaults_when_absent() {
    let config = FifoConfig::from_toml_str("capacity = 16").expect("配置合法");
    assert_eq!(config.header_width, None);
    let fifo = DynamicRecordFifo::from_config(&config).expect("分配应成功");
    assert_eq!(fifo.header_width(), HeaderWidth::DEFAULT);

    let flat = DynamicFifo::<u32>::from_config(&config).expect("分配应成功");
    assert_eq!(flat.capacity(), 16);
}

#[test]
fn unknown_fields_and_bad_syntax_are_malformed() {
    for raw in ["capacity = 16\nheadr_width = 2", "capacity = ", "header_width = 1"] {
        let err = FifoConfig::from_toml_str(raw).expect_err("应被拒绝");
        assert!(
            matches!(err, FifoError::MalformedConfig { .. }),
            "{raw:?} 得到了 {err:?}"
        );
    }
}

#[test]
fn well_formed_but_invalid_values_are_validated() {
    assert_eq!(
        FifoConfig::from_toml_str("capacity = 1"),
        Err(FifoError::CapacityTooSmall { requested: 1 })
    );
    assert_eq!(
        FifoConfig::from_toml_str("capacity = 8\nheader_width = 0"),
        Err(FifoError::InvalidHeaderWidth { width: 0 })
    );
}

#[test]
fn config_serialises_back_to_toml() {
    let text = toml::to_string(&FifoConfig::new(64)).expect("序列化应成功");
    assert_eq!(text.trim(), "capacity = 64");
}
