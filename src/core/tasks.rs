//! 后台任务管理
//!
//! 统一管理后台任务的注册、启动和关闭。目前唯一的定时任务是
//! 分类折扣过期清理 (offer expiry sweep)。

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::db::repository::{CategoryRepository, ProductRepository};

/// 任务类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// 长期后台工作者
    Worker,
    /// 定时任务
    Periodic,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Worker => write!(f, "Worker"),
            TaskKind::Periodic => write!(f, "Periodic"),
        }
    }
}

/// 已注册的后台任务
struct RegisteredTask {
    name: &'static str,
    kind: TaskKind,
    handle: JoinHandle<()>,
}

/// 后台任务管理器
pub struct BackgroundTasks {
    tasks: Vec<RegisteredTask>,
    shutdown: CancellationToken,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// 取消令牌，任务内部用它感知关闭
    pub fn token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// 注册并启动一个后台任务 (panic 不会拖垮进程)
    pub fn spawn<F>(&mut self, name: &'static str, kind: TaskKind, fut: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            if AssertUnwindSafe(fut).catch_unwind().await.is_err() {
                tracing::error!(task = name, "background task panicked");
            }
        });
        tracing::info!(task = name, kind = %kind, "background task started");
        self.tasks.push(RegisteredTask { name, kind, handle });
    }

    /// Graceful shutdown：发出取消信号并等待所有任务退出
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        for task in self.tasks {
            if let Err(e) = task.handle.await {
                tracing::warn!(task = task.name, kind = %task.kind, error = %e, "background task join failed");
            }
        }
    }
}

impl Default for BackgroundTasks {
    fn default() -> Self {
        Self::new()
    }
}

/// 分类折扣过期清理
///
/// 周期性清除 `end_date` 已过的分类折扣，并重新捕获该分类下商品/变体的
/// `offer_price`。定价规则必须容忍折扣在两次读取之间消失。
pub async fn run_offer_expiry_sweep(
    categories: CategoryRepository,
    products: ProductRepository,
    interval: Duration,
    token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                tracing::info!("offer expiry sweep stopped");
                return;
            }
            _ = ticker.tick() => {}
        }

        let now = chrono::Utc::now();
        let expired = match categories.find_expired_offers(now).await {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!(error = %e, "offer sweep: failed to list expired offers");
                continue;
            }
        };

        for category in expired {
            let Some(id) = category.id.clone() else { continue };
            let id_str = id.to_string();
            if let Err(e) = categories.clear_offer(&id_str).await {
                tracing::warn!(category = %id_str, error = %e, "offer sweep: clear failed");
                continue;
            }
            if let Err(e) = products.recapture_offer_prices(&id, None).await {
                tracing::warn!(category = %id_str, error = %e, "offer sweep: recapture failed");
                continue;
            }
            tracing::info!(category = %id_str, "expired category offer cleared");
        }
    }
}
