//! 协程执行上下文：与续体绑定的只读能力集合。
//!
//! # 设计初衷（Why）
//! - 每个续体恰好携带一个上下文，拦截逻辑通过它查询“是否需要把恢复动作转交给特定调度器”；
//! - 其余能力（协程名称、租户标签等）对本内核不透明，由上层以类型化元素的形式挂载。
//!
//! # 关键逻辑（How）
//! - 内部以 `Arc` 共享不可变数据，克隆仅增加引用计数；
//! - `with_*` 系列方法采用写时复制：返回新上下文，原上下文保持不变；
//! - 元素按具体类型去重，同类型后写入者覆盖先写入者。
//!
//! # 生命周期与线程安全
//! - 上下文满足 `Send + Sync`，可随续体跨线程迁移；元素必须同样满足 `Send + Sync + 'static`。

use core::any::{Any, TypeId};
use core::fmt;
use std::borrow::Cow;
use std::sync::Arc;

use crate::intercept::ContinuationInterceptor;

/// 可挂载到 [`CoroutineContext`] 的类型化元素。
pub trait ContextElement: Any + Send + Sync {}

/// 协程名称，仅用于日志与诊断。
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CoroutineName(pub Cow<'static, str>);

impl CoroutineName {
    /// 以给定名称构造元素。
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        CoroutineName(name.into())
    }

    /// 名称文本。
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ContextElement for CoroutineName {}

#[derive(Clone, Default)]
struct ContextInner {
    interceptor: Option<Arc<dyn ContinuationInterceptor>>,
    elements: Vec<(TypeId, Arc<dyn Any + Send + Sync>)>,
}

/// 续体绑定的执行上下文。
///
/// # 契约说明（What）
/// - **前置条件**：无；[`CoroutineContext::empty`] 即为不含任何能力的上下文；
/// - **后置条件**：上下文一经构造即不可变，所有修改都返回新实例；
/// - 拦截器槽位单独存放，便于热路径以一次字段读取判断是否需要包装续体。
#[derive(Clone, Default)]
pub struct CoroutineContext {
    inner: Arc<ContextInner>,
}

impl CoroutineContext {
    /// 空上下文：无拦截器、无元素。
    pub fn empty() -> Self {
        Self::default()
    }

    /// 返回挂载了给定拦截器的新上下文，覆盖已有拦截器。
    pub fn with_interceptor(mut self, interceptor: Arc<dyn ContinuationInterceptor>) -> Self {
        Arc::make_mut(&mut self.inner).interceptor = Some(interceptor);
        self
    }

    /// 返回移除拦截器后的新上下文。
    pub fn without_interceptor(mut self) -> Self {
        if self.inner.interceptor.is_some() {
            Arc::make_mut(&mut self.inner).interceptor = None;
        }
        self
    }

    /// 查询调度能力。
    pub fn interceptor(&self) -> Option<&Arc<dyn ContinuationInterceptor>> {
        self.inner.interceptor.as_ref()
    }

    /// 挂载类型化元素；同类型元素被替换。
    pub fn with_element<E: ContextElement>(mut self, element: E) -> Self {
        let key = TypeId::of::<E>();
        let inner = Arc::make_mut(&mut self.inner);
        inner.elements.retain(|(existing, _)| *existing != key);
        inner.elements.push((key, Arc::new(element)));
        self
    }

    /// 按类型查询元素。
    pub fn element<E: ContextElement>(&self) -> Option<&E> {
        let key = TypeId::of::<E>();
        self.inner
            .elements
            .iter()
            .find(|(existing, _)| *existing == key)
            .and_then(|(_, element)| element.downcast_ref::<E>())
    }

    /// 便捷读取协程名称，供日志字段使用。
    pub fn name(&self) -> Option<&str> {
        self.element::<CoroutineName>().map(CoroutineName::as_str)
    }

    /// 是否既无拦截器也无元素。
    pub fn is_empty(&self) -> bool {
        self.inner.interceptor.is_none() && self.inner.elements.is_empty()
    }
}

impl fmt::Debug for CoroutineContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoroutineContext")
            .field("interceptor", &self.inner.interceptor.is_some())
            .field("elements", &self.inner.elements.len())
            .field("name", &self.name())
            .finish()
    }
}
