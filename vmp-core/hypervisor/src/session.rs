//! 管理端会话抽象
//!
//! [`HypervisorSession`] 是置备引擎与具体传输实现之间的接口。
//! 真实实现负责 TLS、认证与线缆编码；引擎只通过本 trait 提交操作、
//! 扫描库存并查询任务状态。会话由调用方持有并负责关闭，
//! 引擎一律以引用方式借用。

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{CloneSpec, ConfigSpec, DeviceSummary};
use crate::object::{InventoryItem, InventoryRoot, ObjectKind, ObjectRef, ViewHandle};
use crate::task::{TaskInfo, TaskRef};
use crate::Result;

/// 管理端会话
///
/// 实现必须可在多个并发置备流间共享（`Send + Sync`）：
/// 会话本身是读多写少的共享资源，线程安全由传输实现保证。
#[async_trait]
pub trait HypervisorSession: Send + Sync {
    /// 会话标识，用于校验对象引用的归属
    fn session_id(&self) -> Uuid;

    /// 库存根部的默认放置位置（虚拟机文件夹与资源池）
    async fn inventory_root(&self) -> Result<InventoryRoot>;

    /// 创建限定对象类型的临时库存视图
    async fn create_view(&self, kind: ObjectKind) -> Result<ViewHandle>;

    /// 枚举视图内的对象，顺序为管理端的遍历顺序
    async fn list_view(&self, view: &ViewHandle) -> Result<Vec<InventoryItem>>;

    /// 销毁临时库存视图
    async fn destroy_view(&self, view: ViewHandle) -> Result<()>;

    /// 提交创建虚拟机操作，返回任务句柄
    async fn create_vm(
        &self,
        folder: &ObjectRef,
        pool: &ObjectRef,
        spec: &ConfigSpec,
    ) -> Result<TaskRef>;

    /// 提交重配置虚拟机操作，返回任务句柄
    async fn reconfigure_vm(&self, vm: &ObjectRef, spec: &ConfigSpec) -> Result<TaskRef>;

    /// 提交克隆操作，返回任务句柄
    async fn clone_vm(
        &self,
        source: &ObjectRef,
        folder: &ObjectRef,
        name: &str,
        spec: &CloneSpec,
    ) -> Result<TaskRef>;

    /// 查询任务的当前状态快照
    async fn query_task(&self, task: &TaskRef) -> Result<TaskInfo>;

    /// 查询虚拟机上已存在的设备摘要
    async fn vm_devices(&self, vm: &ObjectRef) -> Result<Vec<DeviceSummary>>;

    /// 查询虚拟机所在的父文件夹
    async fn vm_parent_folder(&self, vm: &ObjectRef) -> Result<ObjectRef>;
}
