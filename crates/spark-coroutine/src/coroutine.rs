//! 非检查式协程实例化。
//!
//! # 设计背景（Why）
//! - 普通代码需要一个原语把“可挂起计算的配方”与一个 `completion` 续体组合成**全新**续体，
//!   随后以启动信号恢复它一次即开始执行；
//! - 配方有两种形态：普通闭包，以及外部生成器产出的已编译状态机。后者自带重入管理，直接委托其工厂；
//!   前者由本模块包装，借助蹦床保证同步自恢复不会撑爆调用栈。
//!
//! # 逻辑解析（How）
//! - 闭包路径：产出的续体被恢复时，在蹦床上调用闭包，并传入一个指向 `completion` 的恢复句柄；
//!   闭包的返回值与恢复句柄共享同一个完成槽位，二者中先取得 `completion` 者负责送达结果；
//! - 状态机路径：调用 [`StateMachineFactory::create`] / [`StateMachineFactory::create_with_receiver`]
//!   并返回其门面（facade）续体。
//!
//! # 契约说明（What）
//! - 本操作是**非检查式**的：产出的续体只能被恢复一次、只能在一个线程上恢复；
//!   所有权模型已在编译期排除了同一实例的重复恢复，其余约束属于调用方责任；
//! - 计算中的错误（返回 `Err` 或在 [`PanicPolicy::Capture`] 下被捕获的 panic）恰好一次地送达
//!   `completion` 的失败路径，绝不会同时送达成功路径。

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::{self, PanicPolicy};
use crate::context::CoroutineContext;
use crate::continuation::{BoxContinuation, Continuation, ResumeResult};
use crate::error::{BoxError, CoroutineError};
use crate::intercept::intercepted;
use crate::intrinsic::unimplemented_intrinsic;
use crate::marker::SuspendOr;
use crate::trampoline;

/// 普通闭包形态的协程配方：接收可选的接收者与续体，返回挂起标记、同步结果或错误。
pub type CoroutineBlock<T, R = ()> =
    Box<dyn FnOnce(R, BoxContinuation<T>) -> Result<SuspendOr<T>, BoxError> + Send>;

/// 已编译状态机的工厂，是与外部生成器的集成接缝。
///
/// # 契约说明（What）
/// - 生成器为其支持的元数覆写对应方法，返回状态机的门面续体；门面被以启动信号恢复时开始执行；
/// - 未覆写的元数保留默认实现，被调用即视为集成错误，经 [`unimplemented_intrinsic`] 立即失败；
/// - 状态机自行管理重入，本 Crate 不再为其包装蹦床。
pub trait StateMachineFactory<T>: Send + 'static {
    /// 接收者类型；无接收者的状态机使用 `()`。
    type Receiver;

    /// 以 `completion` 创建状态机并返回门面。
    fn create(self: Box<Self>, _completion: BoxContinuation<T>) -> BoxContinuation<()> {
        unimplemented_intrinsic("StateMachineFactory::create(completion)")
    }

    /// 以接收者与 `completion` 创建状态机并返回门面。
    fn create_with_receiver(
        self: Box<Self>,
        _receiver: Self::Receiver,
        _completion: BoxContinuation<T>,
    ) -> BoxContinuation<()> {
        unimplemented_intrinsic("StateMachineFactory::create_with_receiver(receiver, completion)")
    }
}

/// 可挂起计算的配方。
pub enum Coroutine<T, R = ()> {
    Block(CoroutineBlock<T, R>),
    Compiled(Box<dyn StateMachineFactory<T, Receiver = R>>),
}

impl<T: 'static> Coroutine<T> {
    /// 由不带接收者的闭包构造配方。
    pub fn from_fn<F>(block: F) -> Self
    where
        F: FnOnce(BoxContinuation<T>) -> Result<SuspendOr<T>, BoxError> + Send + 'static,
    {
        Coroutine::Block(Box::new(move |(), continuation| block(continuation)))
    }
}

impl<T: 'static, R: 'static> Coroutine<T, R> {
    /// 由带接收者的闭包构造配方。
    pub fn with_receiver<F>(block: F) -> Self
    where
        F: FnOnce(R, BoxContinuation<T>) -> Result<SuspendOr<T>, BoxError> + Send + 'static,
    {
        Coroutine::Block(Box::new(block))
    }

    /// 由已编译状态机工厂构造配方。
    pub fn compiled<M>(factory: M) -> Self
    where
        M: StateMachineFactory<T, Receiver = R>,
    {
        Coroutine::Compiled(Box::new(factory))
    }

    /// 是否为已编译状态机。
    pub fn is_compiled(&self) -> bool {
        matches!(self, Coroutine::Compiled(_))
    }
}

/// 创建“从头启动该计算”的全新续体（无接收者）。
///
/// 返回的续体须由调用方以 `resume(())` 恰好恢复一次；以失败恢复时，该失败直接送达 `completion`，
/// 闭包不会执行。
pub fn create_coroutine_unintercepted<T>(
    coroutine: Coroutine<T>,
    completion: BoxContinuation<T>,
) -> BoxContinuation<()>
where
    T: Send + 'static,
{
    match coroutine {
        Coroutine::Block(block) => BlockContinuation::boxed(block, (), completion),
        Coroutine::Compiled(factory) => factory.create(completion),
    }
}

/// 创建“从头启动该计算”的全新续体，并在启动时传入接收者。
pub fn create_coroutine_unintercepted_with_receiver<T, R>(
    coroutine: Coroutine<T, R>,
    receiver: R,
    completion: BoxContinuation<T>,
) -> BoxContinuation<()>
where
    T: Send + 'static,
    R: Send + 'static,
{
    match coroutine {
        Coroutine::Block(block) => BlockContinuation::boxed(block, receiver, completion),
        Coroutine::Compiled(factory) => factory.create_with_receiver(receiver, completion),
    }
}

/// 创建、拦截并立即以启动信号恢复。
pub fn start_coroutine<T>(coroutine: Coroutine<T>, completion: BoxContinuation<T>)
where
    T: Send + 'static,
{
    intercepted(create_coroutine_unintercepted(coroutine, completion)).resume(());
}

/// 带接收者的 [`start_coroutine`]。
pub fn start_coroutine_with_receiver<T, R>(
    coroutine: Coroutine<T, R>,
    receiver: R,
    completion: BoxContinuation<T>,
) where
    T: Send + 'static,
    R: Send + 'static,
{
    intercepted(create_coroutine_unintercepted_with_receiver(
        coroutine, receiver, completion,
    ))
    .resume(());
}

/// 块返回值与恢复句柄共享的完成槽位：先取得 `completion` 者送达结果。
struct CompletionSlot<T> {
    context: CoroutineContext,
    completion: Mutex<Option<BoxContinuation<T>>>,
}

impl<T> CompletionSlot<T> {
    fn claim(&self) -> Option<BoxContinuation<T>> {
        self.completion.lock().take()
    }
}

/// 交给闭包的续体；恢复它即把结果转交 `completion`。
struct ResumeHandle<T> {
    slot: Arc<CompletionSlot<T>>,
}

impl<T: Send + 'static> Continuation<T> for ResumeHandle<T> {
    fn context(&self) -> &CoroutineContext {
        &self.slot.context
    }

    fn resume_with(self: Box<Self>, result: ResumeResult<T>) {
        match self.slot.claim() {
            Some(completion) => trampoline::run(move || completion.resume_with(result)),
            None => tracing::warn!(
                coroutine = self.slot.context.name(),
                "completion already claimed; late resumption discarded"
            ),
        }
    }
}

struct BlockContinuation<T, R> {
    context: CoroutineContext,
    block: CoroutineBlock<T, R>,
    receiver: R,
    completion: BoxContinuation<T>,
}

impl<T, R> BlockContinuation<T, R>
where
    T: Send + 'static,
    R: Send + 'static,
{
    fn boxed(
        block: CoroutineBlock<T, R>,
        receiver: R,
        completion: BoxContinuation<T>,
    ) -> BoxContinuation<()> {
        Box::new(BlockContinuation {
            context: completion.context().clone(),
            block,
            receiver,
            completion,
        })
    }

    fn start(self, signal: ResumeResult<()>) {
        let BlockContinuation {
            context,
            block,
            receiver,
            completion,
        } = self;

        if let Err(error) = signal {
            completion.resume_failure(error);
            return;
        }

        let slot = Arc::new(CompletionSlot {
            context: context.clone(),
            completion: Mutex::new(Some(completion)),
        });
        let handle: BoxContinuation<T> = Box::new(ResumeHandle {
            slot: Arc::clone(&slot),
        });

        let outcome = match config::panic_policy() {
            PanicPolicy::Capture => catch_unwind(AssertUnwindSafe(|| block(receiver, handle)))
                .unwrap_or_else(|payload| {
                    let error = CoroutineError::from_panic(payload);
                    tracing::warn!(coroutine = context.name(), %error, "coroutine block panicked");
                    Err(error.into())
                }),
            PanicPolicy::Propagate => block(receiver, handle),
        };

        match outcome {
            Ok(SuspendOr::Suspended(_)) => {
                tracing::debug!(coroutine = context.name(), "coroutine suspended");
            }
            Ok(SuspendOr::Returned(value)) => deliver(&slot, Ok(value)),
            Err(error) => deliver(&slot, Err(error)),
        }
    }
}

impl<T, R> Continuation<()> for BlockContinuation<T, R>
where
    T: Send + 'static,
    R: Send + 'static,
{
    fn context(&self) -> &CoroutineContext {
        &self.context
    }

    fn resume_with(self: Box<Self>, signal: ResumeResult<()>) {
        trampoline::run(move || (*self).start(signal));
    }
}

fn deliver<T>(slot: &CompletionSlot<T>, result: ResumeResult<T>) {
    let coroutine = slot.context.name();
    match slot.claim() {
        Some(completion) => {
            tracing::debug!(coroutine, failed = result.is_err(), "coroutine completed");
            completion.resume_with(result);
        }
        None => tracing::warn!(
            coroutine,
            failed = result.is_err(),
            "completion already claimed; late result discarded"
        ),
    }
}
