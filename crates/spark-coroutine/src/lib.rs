#![deny(unsafe_code)]
#![doc = "spark-coroutine: 续体传递风格（CPS）的挂起/恢复最小运行时内核。"]
#![doc = ""]
#![doc = "== 定位 =="]
#![doc = "本 Crate 只提供“计算可以在中途暂停、把控制权交还调用方、稍后以值或错误恢复”的底层原语；"]
#![doc = "何时恢复由外部协作者（调度器、定时器、I/O 回调）决定，本 Crate 不包含线程池、计时器或 I/O 多路复用。"]
#![doc = ""]
#![doc = "== 模块依赖（自底向上） =="]
#![doc = "`error` → `marker` → `context` → `continuation` → `trampoline` → `intercept` → `coroutine`；"]
#![doc = "`config` 提供进程级运行时设置，`intrinsic` 描述必须由集成层替换的内建操作。"]

pub mod config;
pub mod context;
pub mod continuation;
pub mod coroutine;
pub mod error;
pub mod intercept;
pub mod intrinsic;
pub mod marker;
mod trampoline;

pub use config::{PanicPolicy, RuntimeSettings, SettingsError, TrampolineSettings};
pub use context::{ContextElement, CoroutineContext, CoroutineName};
pub use continuation::{BoxContinuation, Continuation, ContinuationExt, ResumeResult, continuation_fn};
pub use coroutine::{
    Coroutine, CoroutineBlock, StateMachineFactory, create_coroutine_unintercepted,
    create_coroutine_unintercepted_with_receiver, start_coroutine, start_coroutine_with_receiver,
};
pub use error::{BoxError, CoroutineError};
pub use intercept::{
    ContinuationInterceptor, Resumption, intercepted, suspend_or_return,
    suspend_or_return_unintercepted,
};
pub use intrinsic::{IntrinsicError, unimplemented_intrinsic};
pub use marker::{COROUTINE_SUSPENDED, SuspendMarker, SuspendOr};
