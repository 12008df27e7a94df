//! 拦截钩子与“挂起或返回”协议。
//!
//! # 设计综述（Why）
//! - 调度器需要保证“恢复总是发生在上下文 X 上”，而编写挂起操作的代码不应感知调度细节；
//! - 解决办法是在续体交给挂起块之前，按其上下文中的 [`ContinuationInterceptor`] 包装一层：
//!   恢复包装后的续体时，先询问拦截器是否需要转交，再转发到原续体。
//!
//! # 契约说明（What）
//! - 上下文不含拦截器时，[`intercepted`] 原样返回同一个 `Box`，无额外分配；
//! - 对已包装的续体再次拦截是空操作，不会叠加第二层包装，也不会产生两次调度跳转；
//! - [`suspend_or_return`] 是编写新挂起操作的唯一原语；
//!   [`suspend_or_return_unintercepted`] 供拦截机制自身及已持有拦截后续体的代码使用，避免无限递归。

use std::sync::Arc;

use crate::context::CoroutineContext;
use crate::continuation::{BoxContinuation, Continuation, ResumeResult};
use crate::marker::SuspendOr;

/// 拦截器转交的恢复动作；执行它即把结果送达原续体。
pub type Resumption = Box<dyn FnOnce() + Send + 'static>;

/// 执行上下文提供的调度能力。
///
/// # 契约说明（What）
/// - `dispatch` 必须恰好执行一次 `resumption`（在其选择的线程/工作者上），或在取消语义下直接丢弃它；
///   丢弃即意味着该续体永不恢复；
/// - `is_dispatch_needed` 返回 `false` 时恢复在调用方帧内直接进行，省去一次跳转。
pub trait ContinuationInterceptor: Send + Sync + 'static {
    /// 把恢复动作转交给目标执行环境。
    fn dispatch(&self, context: &CoroutineContext, resumption: Resumption);

    /// 是否需要转交；默认总是需要。
    fn is_dispatch_needed(&self, _context: &CoroutineContext) -> bool {
        true
    }
}

struct DispatchedContinuation<T> {
    interceptor: Arc<dyn ContinuationInterceptor>,
    delegate: BoxContinuation<T>,
}

impl<T: Send + 'static> Continuation<T> for DispatchedContinuation<T> {
    fn context(&self) -> &CoroutineContext {
        self.delegate.context()
    }

    fn resume_with(self: Box<Self>, result: ResumeResult<T>) {
        let DispatchedContinuation {
            interceptor,
            delegate,
        } = *self;
        let context = delegate.context().clone();
        if interceptor.is_dispatch_needed(&context) {
            tracing::trace!(coroutine = context.name(), "dispatching resumption");
            interceptor.dispatch(&context, Box::new(move || delegate.resume_with(result)));
        } else {
            delegate.resume_with(result);
        }
    }

    fn is_intercepted(&self) -> bool {
        true
    }
}

/// 按续体上下文中的拦截器包装续体。
pub fn intercepted<T: Send + 'static>(continuation: BoxContinuation<T>) -> BoxContinuation<T> {
    if continuation.is_intercepted() {
        return continuation;
    }
    let Some(interceptor) = continuation.context().interceptor().cloned() else {
        return continuation;
    };
    tracing::trace!(
        coroutine = continuation.context().name(),
        "continuation intercepted"
    );
    Box::new(DispatchedContinuation {
        interceptor,
        delegate: continuation,
    })
}

/// 挂起或同步返回。
///
/// # 教案式说明
/// - **意图 (Why)**：挂起操作的作者只需描述“拿到续体之后做什么”，是否真正挂起由块的返回值表达；
/// - **逻辑 (How)**：先对 `continuation` 执行 [`intercepted`]，再把结果交给 `block` 并原样返回块的结果；
/// - **契约 (What)**：
///   - `block` 返回 [`SuspendOr::Suspended`]：块已接管续体，将在之后恢复它；
///   - `block` 返回 [`SuspendOr::Returned`]：结果即该值，块不得再恢复续体；
/// - **风险 (Trade-offs)**：块既返回挂起标记又在返回前同步恢复续体属于误用。在本 Crate 创建的协程内，
///   这一同步恢复被蹦床延后到块返回之后执行，因而仍只送达一次；若块恢复后又返回 `Returned`，
///   按“先写者胜”丢弃后者并输出告警。
pub fn suspend_or_return<T, F>(continuation: BoxContinuation<T>, block: F) -> SuspendOr<T>
where
    T: Send + 'static,
    F: FnOnce(BoxContinuation<T>) -> SuspendOr<T>,
{
    block(intercepted(continuation))
}

/// 不经拦截的 [`suspend_or_return`]。
pub fn suspend_or_return_unintercepted<T, F>(
    continuation: BoxContinuation<T>,
    block: F,
) -> SuspendOr<T>
where
    F: FnOnce(BoxContinuation<T>) -> SuspendOr<T>,
{
    block(continuation)
}
