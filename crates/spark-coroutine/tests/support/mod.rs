//! 集成测试支撑模块：记录型完成续体与若干测试用拦截器。
//!
//! # 模块定位（Why）
//! - 几乎每个用例都需要“记录 completion 收到了什么、收到了几次”，集中实现以保证断言语义一致；
//! - 拦截器替身覆盖三种典型调度：原地执行、排队延后、跨线程跳转。
//!
//! # 风险提示（Trade-offs）
//! - 各测试二进制只使用其中一部分辅助函数，故整体放开 `dead_code` 告警。
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

use spark_coroutine::{
    BoxContinuation, ContinuationInterceptor, CoroutineContext, Resumption, ResumeResult,
    continuation_fn,
};

/// completion 观测到的一次送达。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Delivery<T> {
    Value(T),
    Failure(String),
}

/// 记录型 completion：保存每一次送达，并允许跨线程等待。
pub struct Recorder<T> {
    state: Arc<(Mutex<Vec<Delivery<T>>>, Condvar)>,
}

impl<T> Clone for Recorder<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: Clone + Send + 'static> Recorder<T> {
    pub fn new() -> Self {
        Self {
            state: Arc::new((Mutex::new(Vec::new()), Condvar::new())),
        }
    }

    /// 以空上下文构造记录续体。
    pub fn continuation(&self) -> BoxContinuation<T> {
        self.continuation_in(CoroutineContext::empty())
    }

    pub fn continuation_in(&self, context: CoroutineContext) -> BoxContinuation<T> {
        let state = Arc::clone(&self.state);
        continuation_fn(context, move |result: ResumeResult<T>| {
            let (deliveries, ready) = &*state;
            deliveries.lock().unwrap().push(match result {
                Ok(value) => Delivery::Value(value),
                Err(error) => Delivery::Failure(error.to_string()),
            });
            ready.notify_all();
        })
    }

    pub fn deliveries(&self) -> Vec<Delivery<T>> {
        self.state.0.lock().unwrap().clone()
    }

    pub fn values(&self) -> Vec<T> {
        self.deliveries()
            .into_iter()
            .filter_map(|delivery| match delivery {
                Delivery::Value(value) => Some(value),
                Delivery::Failure(_) => None,
            })
            .collect()
    }

    pub fn failures(&self) -> Vec<String> {
        self.deliveries()
            .into_iter()
            .filter_map(|delivery| match delivery {
                Delivery::Value(_) => None,
                Delivery::Failure(message) => Some(message),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.state.0.lock().unwrap().is_empty()
    }

    /// 等待至少 `count` 次送达；超时返回 `false`。
    pub fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let (deliveries, ready) = &*self.state;
        let guard = deliveries.lock().unwrap();
        let (guard, _) = ready
            .wait_timeout_while(guard, timeout, |seen| seen.len() < count)
            .unwrap();
        guard.len() >= count
    }
}

/// 原地执行恢复动作并计数。
#[derive(Default)]
pub struct CountingInterceptor {
    pub dispatched: AtomicUsize,
}

impl CountingInterceptor {
    pub fn count(&self) -> usize {
        self.dispatched.load(Ordering::SeqCst)
    }
}

impl ContinuationInterceptor for CountingInterceptor {
    fn dispatch(&self, _context: &CoroutineContext, resumption: Resumption) {
        self.dispatched.fetch_add(1, Ordering::SeqCst);
        resumption();
    }
}

/// 把恢复动作排队，由测试显式驱动，模拟“跳转到另一工作者”。
#[derive(Default)]
pub struct QueueInterceptor {
    queue: Mutex<Vec<Resumption>>,
}

impl QueueInterceptor {
    pub fn pending(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    /// 执行当前排队的全部恢复动作，返回执行数量。
    pub fn run_pending(&self) -> usize {
        let drained: Vec<Resumption> = std::mem::take(&mut *self.queue.lock().unwrap());
        let count = drained.len();
        for resumption in drained {
            resumption();
        }
        count
    }
}

impl ContinuationInterceptor for QueueInterceptor {
    fn dispatch(&self, _context: &CoroutineContext, resumption: Resumption) {
        self.queue.lock().unwrap().push(resumption);
    }
}

/// 每次恢复都新开线程执行。
pub struct ThreadHopInterceptor;

impl ContinuationInterceptor for ThreadHopInterceptor {
    fn dispatch(&self, _context: &CoroutineContext, resumption: Resumption) {
        thread::spawn(resumption);
    }
}

/// 声明无需转交的拦截器：恢复应在调用方帧内直接进行。
#[derive(Default)]
pub struct InlineInterceptor {
    pub dispatched: AtomicUsize,
}

impl ContinuationInterceptor for InlineInterceptor {
    fn dispatch(&self, _context: &CoroutineContext, resumption: Resumption) {
        self.dispatched.fetch_add(1, Ordering::SeqCst);
        resumption();
    }

    fn is_dispatch_needed(&self, _context: &CoroutineContext) -> bool {
        false
    }
}

/// 便捷构造携带拦截器的上下文。
pub fn context_with(interceptor: Arc<dyn ContinuationInterceptor>) -> CoroutineContext {
    CoroutineContext::empty().with_interceptor(interceptor)
}
