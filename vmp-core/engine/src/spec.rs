//! 规格构建
//!
//! 把调用方的声明式虚拟机描述翻译为创建规格。纯函数、无 I/O，
//! 同一描述永远产出相同规格——这使整台虚拟机粒度的重试成为幂等操作。

use serde::{Deserialize, Serialize};

use vmp_hypervisor::{ConfigSpec, FileInfo};

use crate::{ProvisionError, Result};

/// 未指定客户机系统时的默认值
pub const DEFAULT_GUEST_ID: &str = "otherLinux64Guest";

/// 虚拟硬件版本
pub const HARDWARE_VERSION: &str = "vmx-14";

/// 虚拟机描述
///
/// 字段名对齐外部批量配置文档（`ram`/`cpu`/`disk_size`）。
/// 提交到流水线后不再变更。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VmDescriptor {
    /// 虚拟机名称（作用域内唯一，非空）
    pub name: String,

    /// 内存大小 (MB)
    #[serde(rename = "ram")]
    pub memory_mb: u64,

    /// CPU 核心数
    #[serde(rename = "cpu")]
    pub num_cpus: u32,

    /// 磁盘大小 (GB)；批量文档携带但创建规格暂不消费
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_size: Option<u64>,

    /// 要挂载的 ISO 路径，形如 `[datastore1] test/Core-5.4.iso`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iso_path: Option<String>,

    /// 客户机操作系统标识，缺省为 `otherLinux64Guest`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_id: Option<String>,
}

impl VmDescriptor {
    /// 校验描述不变量
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ProvisionError::Validation("虚拟机名称不能为空".to_string()));
        }
        if self.memory_mb == 0 {
            return Err(ProvisionError::Validation(format!(
                "虚拟机 {} 的内存必须大于 0",
                self.name
            )));
        }
        if self.num_cpus == 0 {
            return Err(ProvisionError::Validation(format!(
                "虚拟机 {} 的 CPU 数必须大于 0",
                self.name
            )));
        }
        Ok(())
    }
}

/// 构建创建规格
///
/// 校验描述后派生 vmx 路径 `[{datastore}] {name}/{name}.vmx`，
/// 客户机系统缺省取 [`DEFAULT_GUEST_ID`]。校验失败不发起任何网络调用。
pub fn build_create_spec(descriptor: &VmDescriptor, datastore: &str) -> Result<ConfigSpec> {
    descriptor.validate()?;

    if datastore.trim().is_empty() {
        return Err(ProvisionError::Validation("数据存储名称不能为空".to_string()));
    }

    let vm_path_name = format!(
        "[{}] {}/{}.vmx",
        datastore, descriptor.name, descriptor.name
    );

    Ok(ConfigSpec {
        name: Some(descriptor.name.clone()),
        memory_mb: Some(descriptor.memory_mb),
        num_cpus: Some(descriptor.num_cpus),
        files: Some(FileInfo { vm_path_name }),
        guest_id: Some(
            descriptor
                .guest_id
                .clone()
                .unwrap_or_else(|| DEFAULT_GUEST_ID.to_string()),
        ),
        version: Some(HARDWARE_VERSION.to_string()),
        device_change: vec![],
    })
}
