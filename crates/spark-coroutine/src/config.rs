//! 进程级运行时设置。
//!
//! # 设计目的（Why）
//! - 蹦床与协程块的少量行为（panic 处置、积压告警阈值）需要由宿主统一决定，而不是散落在各个调用点；
//! - 设置以 TOML 文档表达，与工作区其他组件的配置文件风格一致；
//! - 通过 `ArcSwap` 实现“读无锁、写原子替换”，宿主可在运行中热更新，已在执行的蹦床循环在下一次读取时生效。
//!
//! # 契约说明（What）
//! ```toml
//! [trampoline]
//! panic_policy = "capture"        # "capture" | "propagate"
//! backlog_warn_threshold = 4096   # 0 表示关闭告警
//! ```
//! - 所有字段均有默认值，缺省文档等价于 [`RuntimeSettings::default`]；
//! - 未知字段视为配置错误，避免拼写错误被静默忽略。

use std::sync::{Arc, LazyLock};

use arc_swap::ArcSwap;
use serde::Deserialize;
use thiserror::Error;

static CURRENT: LazyLock<ArcSwap<RuntimeSettings>> =
    LazyLock::new(|| ArcSwap::from_pointee(RuntimeSettings::default()));

/// 协程块内 panic 的处置策略。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanicPolicy {
    /// 捕获 panic，转换为 [`CoroutineError::Panicked`](crate::CoroutineError::Panicked) 交给 `completion`。
    #[default]
    Capture,
    /// 让 panic 继续展开：同一蹦床循环中的其余步骤排空后，由循环所有者重新抛出。
    Propagate,
}

/// 蹦床相关设置。
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrampolineSettings {
    pub panic_policy: PanicPolicy,
    /// 待执行步骤积压达到该值时输出一次告警；`0` 关闭。
    pub backlog_warn_threshold: usize,
}

impl Default for TrampolineSettings {
    fn default() -> Self {
        Self {
            panic_policy: PanicPolicy::Capture,
            backlog_warn_threshold: 4096,
        }
    }
}

/// 运行时设置根节点。
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeSettings {
    pub trampoline: TrampolineSettings,
}

/// 设置解析错误。
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("invalid runtime settings: {0}")]
    Parse(#[from] toml::de::Error),
}

impl RuntimeSettings {
    /// 从 TOML 文本解析设置。
    pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(text)?)
    }

    /// 原子替换进程级设置。
    pub fn install(self) {
        tracing::debug!(
            panic_policy = ?self.trampoline.panic_policy,
            backlog_warn_threshold = self.trampoline.backlog_warn_threshold,
            "runtime settings installed"
        );
        CURRENT.store(Arc::new(self));
    }

    /// 当前生效的设置快照。
    pub fn current() -> Arc<Self> {
        CURRENT.load_full()
    }
}

/// 热路径读取：仅取所需字段，避免克隆 `Arc`。
pub(crate) fn panic_policy() -> PanicPolicy {
    CURRENT.load().trampoline.panic_policy
}

pub(crate) fn backlog_warn_threshold() -> usize {
    CURRENT.load().trampoline.backlog_warn_threshold
}
