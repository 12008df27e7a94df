//! 续体契约：“结果可用之后要做什么”。
//!
//! # 设计背景（Why）
//! - 挂起计算把“后续步骤”具象化为续体对象，恢复方只需调用它即可继续执行，而无需知道计算内部结构；
//! - 续体可能在任意后续调用帧、任意线程上被恢复，因此契约必须对所有权与线程安全做出明确约束。
//!
//! # 契约说明（What）
//! - 每个续体实例**至多恢复一次**。恢复入口均以 `self: Box<Self>` 消费自身：同一实例的第二次恢复
//!   与两个线程同时恢复都会在编译期被借用检查拒绝，热路径上不需要任何运行时簿记；
//! - `resume` 与 `resume_failure` 互斥，二者都委托给 [`Continuation::resume_with`]；
//! - 恢复后续体即被消费，恢复方不再持有它。
//!
//! # 风险提示（Trade-offs）
//! - 续体以 `Box<dyn Continuation<T>>` 形式流转，每层包装一次堆分配；换来的是对象安全与可跨线程移动。

use crate::context::CoroutineContext;
use crate::error::BoxError;
use crate::intercept;

/// 续体恢复时携带的结果。
pub type ResumeResult<T> = Result<T, BoxError>;

/// 类型擦除后的续体。
pub type BoxContinuation<T> = Box<dyn Continuation<T>>;

/// 可恢复计算的接口。
pub trait Continuation<T>: Send {
    /// 续体绑定的执行上下文。
    fn context(&self) -> &CoroutineContext;

    /// 以成功值或失败恢复续体。
    fn resume_with(self: Box<Self>, result: ResumeResult<T>);

    /// 以成功值恢复。
    fn resume(self: Box<Self>, value: T) {
        self.resume_with(Ok(value));
    }

    /// 以失败恢复。
    fn resume_failure(self: Box<Self>, error: BoxError) {
        self.resume_with(Err(error));
    }

    /// 是否已被拦截器包装；拦截逻辑据此避免叠加冗余包装层。
    fn is_intercepted(&self) -> bool {
        false
    }
}

/// 续体的方法式扩展。
pub trait ContinuationExt<T> {
    /// 等价于 [`intercept::intercepted`]。
    fn intercepted(self) -> BoxContinuation<T>;
}

impl<T: Send + 'static> ContinuationExt<T> for BoxContinuation<T> {
    fn intercepted(self) -> BoxContinuation<T> {
        intercept::intercepted(self)
    }
}

struct FnContinuation<F> {
    context: CoroutineContext,
    on_resume: F,
}

impl<T, F> Continuation<T> for FnContinuation<F>
where
    F: FnOnce(ResumeResult<T>) + Send,
{
    fn context(&self) -> &CoroutineContext {
        &self.context
    }

    fn resume_with(self: Box<Self>, result: ResumeResult<T>) {
        (self.on_resume)(result)
    }
}

/// 由闭包构造续体。
///
/// # 教案式说明
/// - **意图 (Why)**：多数完成续体只是“记录结果”或“变换后转交下一个续体”，无需为此定义具名类型；
/// - **契约 (What)**：`context` 成为续体的执行上下文；闭包在恢复时恰好被调用一次；
/// - **风险 (Trade-offs)**：闭包直接运行在恢复方的调用帧中。若闭包内再恢复由本 Crate 创建的协程，
///   该恢复会交给当前线程的蹦床循环，栈深度仍保持有界。
pub fn continuation_fn<T, F>(context: CoroutineContext, on_resume: F) -> BoxContinuation<T>
where
    T: 'static,
    F: FnOnce(ResumeResult<T>) + Send + 'static,
{
    Box::new(FnContinuation { context, on_resume })
}
