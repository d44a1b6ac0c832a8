// ==========================================
// 工程报价系统 - 命令行入口
// ==========================================
// 用法:
//   cotizador [--db PATH] import FILE...
//   cotizador [--db PATH] search [QUERY]
//   cotizador [--db PATH] summary QUOTATION_ID
//
// 输出: JSON（stdout）；日志走 tracing（stderr）
// ==========================================

use cotizador::app::{get_default_db_path, AppState};
use cotizador::logging;
use std::path::PathBuf;

const USAGE: &str = "用法: cotizador [--db PATH] <import FILE...|search [QUERY]|summary QUOTATION_ID>";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();

    let db_path = match args.iter().position(|a| a == "--db") {
        Some(idx) => {
            if idx + 1 >= args.len() {
                return Err(format!("--db 缺少路径参数\n{}", USAGE).into());
            }
            let path = args.remove(idx + 1);
            args.remove(idx);
            path
        }
        None => get_default_db_path(),
    };

    let mut args = args.into_iter();
    let command = args.next().ok_or(USAGE)?;

    tracing::info!("{} v{}，数据库: {}", cotizador::APP_NAME, cotizador::VERSION, db_path);
    let state = AppState::new(db_path)?;

    match command.as_str() {
        "import" => {
            let files: Vec<PathBuf> = args.map(PathBuf::from).collect();
            if files.is_empty() {
                return Err(USAGE.into());
            }

            let mut failed = false;
            for (file, result) in files
                .iter()
                .zip(state.import_api.import_files(files.clone()).await)
            {
                match result {
                    Ok(response) => {
                        println!("{}: {}", file.display(), response.message);
                        println!("{}", serde_json::to_string_pretty(&response.report)?);
                    }
                    Err(e) => {
                        eprintln!("{}", e);
                        failed = true;
                    }
                }
            }

            if failed {
                std::process::exit(1);
            }
        }
        "search" => {
            let query = args.next();
            let materials = state
                .catalog_api
                .search_materials(query.as_deref())
                .map_err(|e| e.user_message())?;
            println!("{}", serde_json::to_string_pretty(&materials)?);
        }
        "summary" => {
            let id = args.next().ok_or(USAGE)?;
            let detail = state
                .quotation_api
                .get_detail(&id)
                .map_err(|e| e.user_message())?;
            println!("{}", serde_json::to_string_pretty(&detail)?);
        }
        other => {
            return Err(format!("未知命令: {}\n{}", other, USAGE).into());
        }
    }

    Ok(())
}
