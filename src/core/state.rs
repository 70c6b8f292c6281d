//! 服务器状态
//!
//! [`ServerState`] 持有所有共享服务的引用，通过 `Arc`/`Clone` 在各
//! 请求处理器之间低成本传递。

use std::sync::Arc;
use std::time::Duration;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::auth::JwtService;
use crate::core::Config;
use crate::core::tasks::{BackgroundTasks, TaskKind, run_offer_expiry_sweep};
use crate::db::DbService;
use crate::db::repository::{CategoryRepository, ProductRepository};
use crate::utils::AppError;

/// 服务器状态 - 持有所有服务的单例引用
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 嵌入式数据库 (SurrealDB)
    pub db: Surreal<Db>,
    /// JWT 认证服务
    pub jwt_service: Arc<JwtService>,
}

impl ServerState {
    /// 以现有数据库句柄构造状态 (测试用)
    pub fn with_db(config: Config, db: Surreal<Db>) -> Self {
        let jwt_service = Arc::new(JwtService::new(config.jwt.clone()));
        Self {
            config,
            db,
            jwt_service,
        }
    }

    /// 初始化服务器状态
    ///
    /// 1. 确保工作目录结构存在
    /// 2. 打开数据库 (work_dir/database/commerce.db)
    /// 3. 初始化 JWT 服务
    pub async fn initialize(config: &Config) -> Result<Self, AppError> {
        config
            .ensure_work_dir_structure()
            .map_err(|e| AppError::internal(format!("Failed to create work directory: {e}")))?;

        let db_path = config.database_dir().join("commerce.db");
        let db_service = DbService::new(&db_path.to_string_lossy()).await?;

        Ok(Self::with_db(config.clone(), db_service.db))
    }

    /// 启动后台任务 (必须在 `Server::run()` 前调用)
    ///
    /// - 分类折扣过期清理 (Periodic)
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new();

        let categories = CategoryRepository::new(self.db.clone());
        let products = ProductRepository::new(self.db.clone());
        let interval = Duration::from_secs(self.config.offer_sweep_interval_secs);
        let token = tasks.token();
        tasks.spawn(
            "offer_expiry_sweep",
            TaskKind::Periodic,
            run_offer_expiry_sweep(categories, products, interval, token),
        );

        tasks
    }

    /// 获取数据库实例
    pub fn get_db(&self) -> Surreal<Db> {
        self.db.clone()
    }
}
