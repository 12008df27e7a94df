//! 挂起标记与“挂起或返回”结果类型。
//!
//! # 设计背景（Why）
//! - 挂起块需要一个与任何合法结果都不相交的带外信号来表达“暂时没有结果”；
//! - 若直接以结构相等比较某个普通值，任意结果类型都可能与之碰撞，因此标记必须是独立的不透明类型。
//!
//! # 契约说明（What）
//! - [`SuspendMarker`] 为零尺寸令牌，字段私有，Crate 外部无法构造，只能通过 [`COROUTINE_SUSPENDED`] 取得；
//! - 由于全进程只存在这一个取值，任何两个 `SuspendMarker` 的比较都等价于身份比较；
//! - 挂起块返回 [`SuspendOr<T>`]，`Suspended` 与 `Returned` 在类型层面互斥。

use core::fmt;

/// 进程级唯一的挂起标记。
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SuspendMarker {
    _sealed: (),
}

/// 唯一的挂起标记取值；挂起块返回它表示“已接管续体，稍后恢复”。
pub const COROUTINE_SUSPENDED: SuspendMarker = SuspendMarker { _sealed: () };

impl fmt::Debug for SuspendMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("COROUTINE_SUSPENDED")
    }
}

/// 挂起块的返回值：要么已挂起，要么同步给出结果。
///
/// # 契约说明（What）
/// - `Suspended`：块已取得续体所有权，将在之后（可能永不、可能在其他线程）恢复它；
/// - `Returned(v)`：计算已同步完成，`v` 即结果，续体**不得**再被调用。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use = "挂起块的返回值决定调用方是继续执行还是让出控制权"]
pub enum SuspendOr<T> {
    Suspended(SuspendMarker),
    Returned(T),
}

impl<T> SuspendOr<T> {
    /// 构造挂起结果。
    pub const fn suspended() -> Self {
        SuspendOr::Suspended(COROUTINE_SUSPENDED)
    }

    /// 是否为挂起标记。
    pub fn is_suspended(&self) -> bool {
        matches!(self, SuspendOr::Suspended(_))
    }

    /// 取出同步结果；挂起时返回 `None`。
    pub fn into_returned(self) -> Option<T> {
        match self {
            SuspendOr::Suspended(_) => None,
            SuspendOr::Returned(value) => Some(value),
        }
    }

    /// 映射同步结果，挂起标记原样透传。
    pub fn map<U>(self, mapper: impl FnOnce(T) -> U) -> SuspendOr<U> {
        match self {
            SuspendOr::Suspended(marker) => SuspendOr::Suspended(marker),
            SuspendOr::Returned(value) => SuspendOr::Returned(mapper(value)),
        }
    }
}
