//! 持久化层：每局夜晚结束落一条快照记录，供房主端查询/排障。

pub mod migrations;
pub mod models;
pub mod repository;

pub use models::{DatabaseStatistics, NightRecord};

use crate::error::{AppError, AppResult};
use log::info;
use sqlx::SqlitePool;
use std::path::PathBuf;

/// 数据库管理器，持有连接池并转发到 `repository` 查询函数。
pub struct DatabaseManager {
    pool: SqlitePool,
}

impl DatabaseManager {
    pub async fn new() -> AppResult<Self> {
        let db_path = Self::get_database_path()?;

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::Database(format!("创建数据库目录失败: {}", e)))?;
        }

        let database_url = format!("sqlite:{}?mode=rwc", db_path.to_string_lossy());
        info!("连接数据库: {}", database_url);

        let pool = SqlitePool::connect(&database_url)
            .await
            .map_err(|e| AppError::Database(format!("连接数据库失败: {}", e)))?;

        migrations::run(&pool).await?;

        Ok(Self { pool })
    }

    fn get_database_path() -> AppResult<PathBuf> {
        let mut path =
            dirs::data_dir().ok_or_else(|| AppError::Database("无法获取数据目录".to_string()))?;
        path.push("DuskWolf");
        path.push("duskwolf.db");
        Ok(path)
    }

    pub fn get_pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(self) {
        self.pool.close().await;
        info!("数据库连接已关闭");
    }

    pub async fn record_night(&self, record: &NightRecord) -> AppResult<()> {
        repository::insert_night_record(&self.pool, record).await
    }

    pub async fn night_records_for_room(&self, room_code: &str) -> AppResult<Vec<NightRecord>> {
        repository::list_night_records_for_room(&self.pool, room_code).await
    }

    pub async fn get_statistics(&self) -> AppResult<DatabaseStatistics> {
        repository::get_statistics(&self.pool).await
    }

    pub async fn cleanup_old_data(&self, days_to_keep: u32) -> AppResult<u32> {
        repository::cleanup_old_records(&self.pool, days_to_keep).await
    }
}
