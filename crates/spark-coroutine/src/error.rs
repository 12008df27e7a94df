//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 挂起计算内部产生的错误必须恰好一次地送达 `completion` 的失败路径；
//!   为此需要一个可跨线程移动、类型擦除的错误载体。
//!
//! ## 设计要求（What）
//! - [`BoxError`] 是续体失败路径上的统一载荷，任何 `std::error::Error + Send + Sync` 都可直接 `?` 转换；
//! - [`CoroutineError`] 覆盖由运行时自身合成的错误（例如被捕获的 panic）。

use thiserror::Error;

/// 续体失败路径上传递的类型擦除错误。
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// 运行时合成的错误。
///
/// # 教案式说明
/// - **意图 (Why)**：在 [`PanicPolicy::Capture`](crate::PanicPolicy::Capture) 下，协程块内的 panic
///   不应击穿恢复方的调用栈，而应作为普通失败交给 `completion`；
/// - **契约 (What)**：变体均为 `Send + Sync + 'static`，可装箱为 [`BoxError`]；
/// - **风险 (Trade-offs)**：panic 载荷仅保留字符串形式，非字符串载荷记为占位文本。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CoroutineError {
    /// 协程块在执行中 panic，载荷已被捕获。
    #[error("coroutine block panicked: {message}")]
    Panicked { message: String },
}

impl CoroutineError {
    /// 从 `catch_unwind` 得到的 panic 载荷构造错误。
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(text) = payload.downcast_ref::<&'static str>() {
            (*text).to_owned()
        } else if let Some(text) = payload.downcast_ref::<String>() {
            text.clone()
        } else {
            "<non-string panic payload>".to_owned()
        };
        CoroutineError::Panicked { message }
    }
}
