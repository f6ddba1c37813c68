// ==========================================
// 牧场管理系统 - 命令行入口
// ==========================================
// 用法:
//   farm-records [--db PATH] top-producers <farm_id> [window_days] [limit]
//   farm-records [--db PATH] sync-batch <animal_id>
//   farm-records [--db PATH] reproduction <animal_id>
//   farm-records [--db PATH] phase-summary
// 输出: JSON（stdout），日志写 stderr
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use farm_records::app::{get_default_db_path, AppState};
use farm_records::logging;

const USAGE: &str = "用法: farm-records [--db PATH] <top-producers <farm_id> [window_days] [limit] | sync-batch <animal_id> | reproduction <animal_id> | phase-summary>";

fn main() -> Result<()> {
    logging::init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();

    let db_path = match args.iter().position(|a| a == "--db") {
        Some(idx) => {
            if idx + 1 >= args.len() {
                bail!("--db 缺少路径参数\n{}", USAGE);
            }
            let path = args.remove(idx + 1);
            args.remove(idx);
            path
        }
        None => get_default_db_path(),
    };

    let mut args = args.into_iter();
    let command = args.next().ok_or_else(|| anyhow!(USAGE))?;

    tracing::info!(db_path = %db_path, command = %command, "farm-records 启动");
    let state = AppState::new(db_path).map_err(|e| anyhow!(e))?;

    let output = match command.as_str() {
        "top-producers" => {
            let farm_id = parse_arg(args.next(), "farm_id")?;
            let window_days = args.next().map(|v| parse_i64(&v, "window_days")).transpose()?;
            let limit = args.next().map(|v| parse_i64(&v, "limit")).transpose()?;
            let ranking = state
                .production_api
                .top_producers(farm_id, window_days, limit)?;
            serde_json::to_string_pretty(&ranking)?
        }
        "sync-batch" => {
            let animal_id = parse_arg(args.next(), "animal_id")?;
            let outcome = state.production_api.update_animal_batch(animal_id)?;
            serde_json::to_string_pretty(&outcome)?
        }
        "reproduction" => {
            let animal_id = parse_arg(args.next(), "animal_id")?;
            let record = state.reproduction_api.get_record_by_animal(animal_id)?;
            serde_json::to_string_pretty(&record)?
        }
        "phase-summary" => {
            let summary = state.reproduction_api.phase_summary()?;
            serde_json::to_string_pretty(&summary)?
        }
        other => bail!("未知命令: {}\n{}", other, USAGE),
    };

    println!("{}", output);
    Ok(())
}

fn parse_arg(value: Option<String>, name: &str) -> Result<i64> {
    let value = value.ok_or_else(|| anyhow!("缺少参数 {}\n{}", name, USAGE))?;
    parse_i64(&value, name)
}

fn parse_i64(value: &str, name: &str) -> Result<i64> {
    value
        .trim()
        .parse::<i64>()
        .with_context(|| format!("参数 {} 不是整数: {}", name, value))
}
