//! 版本化的 schema 迁移，沿用教师 `CREATE TABLE IF NOT EXISTS` 的直接风格
//! （无外部迁移框架）。

use crate::error::AppError;
use log::info;
use sqlx::SqlitePool;

pub async fn run(pool: &SqlitePool) -> Result<(), AppError> {
    info!("运行数据库迁移...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS night_records (
            id TEXT PRIMARY KEY,
            room_code TEXT NOT NULL,
            template_roles TEXT NOT NULL,
            final_deaths TEXT NOT NULL,
            state_snapshot TEXT NOT NULL,
            created_at DATETIME NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| AppError::Database(format!("创建night_records表失败: {}", e)))?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_night_records_room_code ON night_records (room_code)",
    )
    .execute(pool)
    .await
    .map_err(|e| AppError::Database(format!("创建room_code索引失败: {}", e)))?;

    info!("数据库迁移完成");
    Ok(())
}
