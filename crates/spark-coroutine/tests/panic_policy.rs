//! `panic_policy = "propagate"` 下的行为。
//!
//! - **Why**：宿主可选择让协程块内的 panic 直接展开到 `resume` 调用方；此时 completion 不得被调用，
//!   且当前线程的蹦床必须被复位，后续协程照常运行；
//! - **What**：本文件修改进程级设置，故独立为一个测试二进制，且只包含一个用例。

mod support;

use std::panic::{AssertUnwindSafe, catch_unwind};

use spark_coroutine::{
    BoxContinuation, Coroutine, PanicPolicy, RuntimeSettings, SuspendOr,
    create_coroutine_unintercepted,
};
use support::Recorder;

#[test]
fn propagated_panics_unwind_to_the_caller_and_leave_the_trampoline_usable() {
    let settings = RuntimeSettings::from_toml_str(
        r#"
        [trampoline]
        panic_policy = "propagate"
        "#,
    )
    .expect("合法文档应解析成功");
    settings.install();
    assert_eq!(
        RuntimeSettings::current().trampoline.panic_policy,
        PanicPolicy::Propagate
    );

    let recorder = Recorder::<i32>::new();
    let exploding = Coroutine::from_fn(|_: BoxContinuation<i32>| -> Result<SuspendOr<i32>, _> {
        panic!("boom")
    });
    let completion = recorder.continuation();
    let unwound = catch_unwind(AssertUnwindSafe(move || {
        create_coroutine_unintercepted(exploding, completion).resume(());
    }));
    assert!(unwound.is_err(), "panic 应展开到调用方");
    assert!(recorder.is_empty(), "completion 不得被调用");

    let healthy = Coroutine::from_fn(|_| Ok(SuspendOr::Returned(1 + 2)));
    create_coroutine_unintercepted(healthy, recorder.continuation()).resume(());
    assert_eq!(recorder.values(), vec![3]);

    RuntimeSettings::default().install();
}
