//! 必须由集成层替换的内建操作。
//!
//! # 设计背景（Why）
//! - 某些操作只能由外部状态机生成器或具体运行时提供实现（例如某个元数的 `create` 工厂）；
//!   若调用方到达了未被替换的默认实现，说明集成出错，任何“兜底”都会掩盖问题；
//! - 因此这些默认实现统一调用 [`unimplemented_intrinsic`]：先以 `error` 级别记录，再立即 panic。
//!
//! # 契约说明（What）
//! - 该函数永不返回；panic 文本即 [`IntrinsicError`] 的展示文本，便于测试与排障检索。

use thiserror::Error;

/// 内建操作缺失错误。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IntrinsicError {
    #[error("intrinsic `{name}` is not implemented; it must be provided by the integration layer")]
    Unimplemented { name: &'static str },
}

/// 报告并终止于未被替换的内建操作。
#[track_caller]
pub fn unimplemented_intrinsic(name: &'static str) -> ! {
    let error = IntrinsicError::Unimplemented { name };
    tracing::error!(intrinsic = name, "{error}");
    panic!("{error}")
}
