//! 写入侧配置模型
//!
//! 发送给管理端的请求结构。管理端 API 以 camelCase 键名寻址字段，
//! 这里统一通过 serde 重命名对齐。结构在构造后提交，提交后不再修改。

use serde::Serialize;

use crate::object::ObjectRef;

/// 虚拟机配置规格
///
/// 创建与重配置共用：创建时填写名称、内存、CPU 与文件信息，
/// 重配置时通常只携带 `device_change` 列表。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSpec {
    /// 虚拟机名称
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// 内存大小 (MB)
    #[serde(rename = "memoryMB", skip_serializing_if = "Option::is_none")]
    pub memory_mb: Option<u64>,

    /// CPU 核心数
    #[serde(rename = "numCPUs", skip_serializing_if = "Option::is_none")]
    pub num_cpus: Option<u32>,

    /// 虚拟机文件布局
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<FileInfo>,

    /// 客户机操作系统标识
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_id: Option<String>,

    /// 虚拟硬件版本
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// 设备变更列表（有序）
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub device_change: Vec<DeviceChange>,
}

impl ConfigSpec {
    /// 校验设备变更列表的不变量
    ///
    /// - 同一规格内设备 key 不得重复；
    /// - 引用控制器 key 的设备必须出现在该控制器的 add 条目之后。
    ///
    /// 仅适用于自带控制器 add 条目的规格；复用虚拟机上已有控制器的
    /// 规格应改用 [`Self::validate_device_changes_with`] 并传入已有
    /// 控制器的 key。
    pub fn validate_device_changes(&self) -> std::result::Result<(), String> {
        self.validate_device_changes_with(&[])
    }

    /// 同 [`Self::validate_device_changes`]，但允许设备引用
    /// `existing_controllers` 中已存在于目标虚拟机上的控制器 key
    pub fn validate_device_changes_with(
        &self,
        existing_controllers: &[i32],
    ) -> std::result::Result<(), String> {
        let mut seen_keys = Vec::new();
        let mut added_controllers: Vec<i32> = existing_controllers.to_vec();

        for change in &self.device_change {
            let key = change.device.key();
            if seen_keys.contains(&key) {
                return Err(format!("设备 key {} 重复", key));
            }
            seen_keys.push(key);

            if let Some(controller_key) = change.device.controller_key() {
                if !added_controllers.contains(&controller_key) {
                    return Err(format!(
                        "设备 key {} 引用的控制器 {} 尚未在变更列表中添加",
                        key, controller_key
                    ));
                }
            }

            if change.operation == DeviceOperation::Add
                && matches!(change.device, VirtualDevice::IdeController(_))
            {
                added_controllers.push(key);
            }
        }

        Ok(())
    }
}

/// 虚拟机文件布局
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    /// vmx 文件路径，形如 `[datastore] name/name.vmx`
    pub vm_path_name: String,
}

/// 设备变更操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceOperation {
    Add,
    Remove,
    Edit,
}

/// 一条设备变更
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceChange {
    /// 操作类型
    pub operation: DeviceOperation,

    /// 目标设备
    pub device: VirtualDevice,
}

/// 虚拟设备
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum VirtualDevice {
    IdeController(IdeController),
    Cdrom(Cdrom),
}

impl VirtualDevice {
    /// 设备 key
    pub fn key(&self) -> i32 {
        match self {
            Self::IdeController(c) => c.key,
            Self::Cdrom(c) => c.key,
        }
    }

    /// 所挂控制器的 key（控制器自身为 None）
    pub fn controller_key(&self) -> Option<i32> {
        match self {
            Self::IdeController(_) => None,
            Self::Cdrom(c) => Some(c.controller_key),
        }
    }
}

/// IDE 控制器
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeController {
    /// 设备 key
    pub key: i32,

    /// 总线号
    pub bus_number: i32,

    /// 已占用的单元号
    pub device: Vec<i32>,
}

/// CD-ROM 设备
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cdrom {
    /// 设备 key
    pub key: i32,

    /// 所挂控制器的 key
    pub controller_key: i32,

    /// 控制器上的单元号
    pub unit_number: i32,

    /// ISO 后端
    pub backing: IsoBacking,

    /// 连接属性
    pub connectable: ConnectInfo,
}

/// ISO 文件后端
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IsoBacking {
    /// 数据存储上的 ISO 路径
    pub file_name: String,
}

/// 设备连接属性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectInfo {
    /// 开机时自动连接
    pub start_connected: bool,

    /// 允许客户机控制
    pub allow_guest_control: bool,

    /// 当前已连接
    pub connected: bool,
}

/// 克隆规格
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneSpec {
    /// 重定位规格
    pub location: RelocateSpec,

    /// 克隆完成后是否开机
    pub power_on: bool,

    /// 是否克隆为模板
    pub template: bool,
}

/// 重定位规格
///
/// 字段为 `None` 表示沿用源虚拟机的资源池/数据存储。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelocateSpec {
    /// 目标资源池
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<ObjectRef>,

    /// 目标数据存储
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datastore: Option<ObjectRef>,
}

/// 虚拟机上已存在设备的摘要（读取侧）
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSummary {
    /// 设备 key
    pub key: i32,

    /// 设备类别
    pub kind: DeviceKind,
}

/// 已存在设备的类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    /// IDE 控制器
    IdeController { bus_number: i32 },
    /// CD-ROM
    Cdrom { controller_key: i32 },
    /// 其他设备（只参与 key 冲突检查）
    Other,
}
