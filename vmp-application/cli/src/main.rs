//! VMP CLI 应用
//!
//! 围绕批量配置文档的离线驱动：校验描述、预览创建规格。
//! 真正的置备执行需要外部会话提供方建立到管理端的连接，
//! 由集成方的驱动程序调用 `vmp-engine` 完成。

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "vmp")]
#[command(about = "VMP - 虚拟机批量置备工具", long_about = None)]
#[command(version)]
struct Cli {
    /// 日志级别
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 校验批量配置文档
    Validate {
        /// 配置文件路径 (JSON)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// 输出每台虚拟机的创建规格预览
    Plan {
        /// 配置文件路径 (JSON)
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Validate { config } => commands::validate(&config),
        Commands::Plan { config } => commands::plan(&config),
    }
}
