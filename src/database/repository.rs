//! 查询层：围绕 [`crate::database::models::NightRecord`] 的增删查。

use crate::database::models::{DatabaseStatistics, NightRecord};
use crate::error::AppError;
use sqlx::{Row, SqlitePool};

pub async fn insert_night_record(pool: &SqlitePool, record: &NightRecord) -> Result<(), AppError> {
    let template_json = serde_json::to_string(&record.template_roles)?;
    let deaths_json = serde_json::to_string(&record.final_deaths)?;

    sqlx::query(
        r#"
        INSERT INTO night_records (id, room_code, template_roles, final_deaths, state_snapshot, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.id)
    .bind(&record.room_code)
    .bind(template_json)
    .bind(deaths_json)
    .bind(&record.state_snapshot)
    .bind(record.created_at)
    .execute(pool)
    .await
    .map_err(|e| AppError::Database(format!("写入夜晚记录失败: {}", e)))?;

    Ok(())
}

pub async fn list_night_records_for_room(
    pool: &SqlitePool,
    room_code: &str,
) -> Result<Vec<NightRecord>, AppError> {
    let rows = sqlx::query(
        "SELECT id, room_code, template_roles, final_deaths, state_snapshot, created_at \
         FROM night_records WHERE room_code = ? ORDER BY created_at ASC",
    )
    .bind(room_code)
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::Database(format!("查询夜晚记录失败: {}", e)))?;

    rows.into_iter()
        .map(|row| {
            let template_roles_json: String = row.try_get("template_roles").map_err(|e| {
                AppError::Database(format!("读取template_roles列失败: {}", e))
            })?;
            let final_deaths_json: String = row
                .try_get("final_deaths")
                .map_err(|e| AppError::Database(format!("读取final_deaths列失败: {}", e)))?;
            Ok(NightRecord {
                id: row
                    .try_get("id")
                    .map_err(|e| AppError::Database(format!("读取id列失败: {}", e)))?,
                room_code: row
                    .try_get("room_code")
                    .map_err(|e| AppError::Database(format!("读取room_code列失败: {}", e)))?,
                template_roles: serde_json::from_str(&template_roles_json)?,
                final_deaths: serde_json::from_str(&final_deaths_json)?,
                state_snapshot: row
                    .try_get("state_snapshot")
                    .map_err(|e| AppError::Database(format!("读取state_snapshot列失败: {}", e)))?,
                created_at: row
                    .try_get("created_at")
                    .map_err(|e| AppError::Database(format!("读取created_at列失败: {}", e)))?,
            })
        })
        .collect()
}

pub async fn get_statistics(pool: &SqlitePool) -> Result<DatabaseStatistics, AppError> {
    let total_nights = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM night_records")
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::Database(format!("查询夜晚记录数量失败: {}", e)))? as u32;

    let last_night_time = sqlx::query_scalar::<_, Option<chrono::DateTime<chrono::Utc>>>(
        "SELECT MAX(created_at) FROM night_records",
    )
    .fetch_one(pool)
    .await
    .map_err(|e| AppError::Database(format!("查询最近夜晚时间失败: {}", e)))?;

    Ok(DatabaseStatistics {
        total_nights,
        last_night_time,
    })
}

pub async fn cleanup_old_records(pool: &SqlitePool, days_to_keep: u32) -> Result<u32, AppError> {
    let cutoff = chrono::Utc::now() - chrono::Duration::days(days_to_keep as i64);
    let result = sqlx::query("DELETE FROM night_records WHERE created_at < ?")
        .bind(cutoff)
        .execute(pool)
        .await
        .map_err(|e| AppError::Database(format!("清理旧记录失败: {}", e)))?;
    Ok(result.rows_affected() as u32)
}
