//! 批量配置命令

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::info;

use vmp_engine::{build_create_spec, BatchConfig, PipelineConfig};

/// 读取并解析批量配置文档
fn load_config(path: &Path) -> Result<BatchConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("无法读取配置文件 {}", path.display()))?;
    let config: BatchConfig =
        serde_json::from_str(&raw).with_context(|| format!("配置文件 {} 解析失败", path.display()))?;
    info!("配置加载完成: {} 台虚拟机", config.vms.len());
    Ok(config)
}

/// 校验配置文档中的每台虚拟机描述
pub fn validate(path: &Path) -> Result<()> {
    let config = load_config(path)?;

    PipelineConfig::new(config.datastore.as_str())
        .validate()
        .context("流水线配置无效")?;

    let mut failures = 0usize;
    for vm in &config.vms {
        match build_create_spec(vm, &config.datastore) {
            Ok(_) => println!("{} {}", "✓".green().bold(), vm.name.cyan()),
            Err(e) => {
                failures += 1;
                println!("{} {}: {}", "✗".red().bold(), vm.name.cyan(), e);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} 台虚拟机的描述未通过校验", failures);
    }

    println!(
        "\n{} 共 {} 台虚拟机, 目标数据存储 {}",
        "校验通过".green().bold(),
        config.vms.len(),
        config.datastore.yellow()
    );
    Ok(())
}

/// 输出每台虚拟机的创建规格预览
///
/// 规格构建是确定性的，这里打印的 JSON 与实际提交的内容一致。
pub fn plan(path: &Path) -> Result<()> {
    let config = load_config(path)?;

    for vm in &config.vms {
        let spec = build_create_spec(vm, &config.datastore)
            .with_context(|| format!("虚拟机 {} 的描述无效", vm.name))?;

        println!("{} {}", "==".bold(), vm.name.cyan().bold());
        println!("{}", serde_json::to_string_pretty(&spec)?);

        match &vm.iso_path {
            Some(iso) => println!("  挂载 ISO: {}", iso.yellow()),
            None => println!("  无移动介质"),
        }
        println!();
    }

    Ok(())
}
