//! VMP 虚拟化层
//!
//! 定义与虚拟化管理端交互的会话抽象（[`HypervisorSession`]）、
//! 受管对象引用（[`ObjectRef`]）、异步任务句柄（[`TaskRef`]）以及
//! 写入侧配置模型（[`ConfigSpec`] 等）。
//!
//! 传输层（TLS、认证握手、SOAP/REST 编码）不在本 crate 范围内：
//! 具体的会话实现由外部 crate 提供，本 crate 只约定接口与数据模型。

pub mod models;
pub mod object;
pub mod session;
pub mod task;

pub use models::{
    Cdrom, CloneSpec, ConfigSpec, ConnectInfo, DeviceChange, DeviceKind, DeviceOperation,
    DeviceSummary, FileInfo, IdeController, IsoBacking, RelocateSpec, VirtualDevice,
};
pub use object::{InventoryItem, InventoryRoot, ObjectKind, ObjectRef, ViewHandle};
pub use session::HypervisorSession;
pub use task::{TaskFault, TaskInfo, TaskRef, TaskState};

use thiserror::Error;

/// 虚拟化层错误
#[derive(Error, Debug)]
pub enum HypervisorError {
    #[error("连接失败: {0}")]
    ConnectionFailed(String),

    #[error("认证错误: {0}")]
    AuthError(String),

    #[error("API 错误 [{0}]: {1}")]
    ApiError(u16, String),

    #[error("对象引用不属于当前会话: {0}")]
    InvalidRef(String),

    #[error("库存视图已失效: {0}")]
    ViewGone(String),

    #[error("任务 {0} 不存在")]
    TaskGone(String),

    #[error("解析错误: {0}")]
    ParseError(String),
}

/// 虚拟化层结果类型
pub type Result<T> = std::result::Result<T, HypervisorError>;
