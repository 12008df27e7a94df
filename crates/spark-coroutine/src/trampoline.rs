//! 同步恢复蹦床。
//!
//! # 设计背景（Why）
//! - 以嵌套同步回调表达的计算会在同一调用帧内反复恢复自己的续体：
//!   “恢复 → 运行块 → 恢复 → 运行块 ……”，朴素实现每一步都压一层栈，长循环终将栈溢出；
//! - 蹦床把这条递归链展开为迭代：最外层的恢复成为循环所有者，内层恢复只登记待办步骤后立即返回。
//!
//! # 逻辑解析（How）
//! 1. 当前线程已有活动循环（即在某个步骤内部发生了重入恢复）：把步骤追加到队尾并返回；
//! 2. 否则成为活动循环：执行步骤，再按 FIFO 顺序逐个取出待办步骤执行，直到队列为空；
//! 3. 每个步骤单独捕获 panic：循环继续排空，其余计算照常推进；队列清空、活动标记复位后，
//!    再把捕获到的第一个 panic 重新抛给循环所有者。同一轮中后续的 panic 只记录告警后丢弃。
//!
//! # 契约说明（What）
//! - 任意长度的同步恢复链栈深度为 O(1)；
//! - 最外层 `run` 返回（或展开）时，其间登记的所有步骤均已执行完毕；
//! - 状态为线程局部：跨线程恢复会在目标线程上形成各自独立的循环，不存在跨线程共享的可变状态。
//!
//! # 风险提示（Trade-offs）
//! - 位于循环内部的恢复调用在返回时工作尚未执行；若调用方在同一线程内阻塞等待该结果将导致死锁；
//! - 内层步骤的 panic 不会在其恢复调用处展开，而是延后到循环所有者处展开。

use std::any::Any;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind, resume_unwind};

use crate::config;

type Step = Box<dyn FnOnce()>;

#[derive(Default)]
struct LoopState {
    active: bool,
    pending: VecDeque<Step>,
}

thread_local! {
    static LOOP: RefCell<LoopState> = RefCell::new(LoopState::default());
}

/// 在当前线程的蹦床上执行 `step`。
pub(crate) fn run<F>(step: F)
where
    F: FnOnce() + 'static,
{
    let owned = LOOP.with(|cell| {
        let mut state = cell.borrow_mut();
        if state.active {
            state.pending.push_back(Box::new(step));
            let pending = state.pending.len();
            let threshold = config::backlog_warn_threshold();
            if threshold != 0 && pending == threshold {
                tracing::warn!(pending, "trampoline backlog reached warning threshold");
            } else {
                tracing::trace!(pending, "resumption deferred to active trampoline");
            }
            None
        } else {
            state.active = true;
            Some(step)
        }
    });

    let Some(first) = owned else {
        return;
    };

    let mut first_panic = catch_unwind(AssertUnwindSafe(first)).err();
    let mut steps: u64 = 1;
    while let Some(next) = next_pending() {
        if let Err(payload) = catch_unwind(AssertUnwindSafe(next)) {
            record_panic(&mut first_panic, payload);
        }
        steps += 1;
    }
    tracing::trace!(steps, "trampoline drained");

    if let Some(payload) = first_panic {
        resume_unwind(payload);
    }
}

/// 取出下一个待办步骤；队列为空时在同一次借用内复位活动标记。
fn next_pending() -> Option<Step> {
    LOOP.with(|cell| {
        let mut state = cell.borrow_mut();
        let next = state.pending.pop_front();
        if next.is_none() {
            state.active = false;
        }
        next
    })
}

fn record_panic(first_panic: &mut Option<Box<dyn Any + Send>>, payload: Box<dyn Any + Send>) {
    let pending = LOOP.with(|cell| cell.borrow().pending.len());
    match first_panic {
        None => {
            tracing::warn!(
                pending,
                "trampoline step panicked; remaining resumptions keep draining"
            );
            *first_panic = Some(payload);
        }
        Some(_) => {
            tracing::warn!(pending, "additional trampoline step panicked; payload dropped");
        }
    }
}

/// 当前线程是否正运行蹦床循环。
#[cfg(test)]
pub(crate) fn is_active() -> bool {
    LOOP.try_with(|cell| cell.borrow().active).unwrap_or(false)
}
