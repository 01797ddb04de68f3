// src/main.rs

use std::time::Duration;

use labqms_exam::config::Config;
use labqms_exam::error::AppError;
use labqms_exam::exam::assignment::assign_questions;
use labqms_exam::state::AppState;
use labqms_exam::telemetry;
use serde_json::json;
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;

const USAGE: &str = "usage: labqms-assign <paper-id> <student-id>";

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let mut args = std::env::args().skip(1);
    let (Some(paper_id), Some(student_id)) = (args.next(), args.next()) else {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    };

    let config = Config::from_env()?;
    let _guard = telemetry::init(&config)?;

    let state = match &config.database_url {
        Some(database_url) => {
            let pool = connect_with_retry(database_url).await?;
            tracing::info!("Database connected...");
            AppState::mysql(config.clone(), pool)
        }
        None => {
            tracing::info!("Using backend at {}", config.api_base_url);
            AppState::http(config.clone())
        }
    };

    let paper = state
        .questions
        .paper(&paper_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Paper {} not found", paper_id)))?;

    let assigned = assign_questions(&paper, &student_id);
    tracing::info!(
        paper_id = %paper.id,
        student_id = %student_id,
        pool = paper.questions.len(),
        assigned = assigned.len(),
        "Assignment computed"
    );

    let output = json!({
        "paperId": paper.id,
        "studentId": student_id,
        "questions": assigned,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn connect_with_retry(database_url: &str) -> Result<MySqlPool, AppError> {
    let mut retry_count = 0;
    loop {
        match MySqlPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await
        {
            Ok(pool) => return Ok(pool),
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    tracing::error!("Failed to connect to database after 5 retries: {}", e);
                    return Err(e.into());
                }
                tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    }
}
