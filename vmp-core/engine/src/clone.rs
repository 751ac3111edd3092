//! 克隆编排
//!
//! 解析源虚拟机并提交克隆任务。源不存在时在提交前即失败，
//! 绝不拿空引用去发起克隆。提交后直接返回任务句柄，等待由
//! 调用方通过 [`crate::await_task`] 完成，编排本身不阻塞。

use tracing::info;

use vmp_hypervisor::{CloneSpec, HypervisorSession, ObjectKind, RelocateSpec, TaskRef};

use crate::resolver::resolve;
use crate::{ProvisionError, Result};

/// 克隆请求
#[derive(Debug, Clone, PartialEq)]
pub struct CloneRequest {
    /// 源虚拟机名称
    pub source_name: String,

    /// 新虚拟机名称
    pub dest_name: String,

    /// 目标文件夹名称；缺省为源虚拟机所在文件夹
    pub folder: Option<String>,

    /// 克隆完成后是否开机
    pub power_on: bool,

    /// 是否克隆为模板
    pub template: bool,
}

impl CloneRequest {
    /// 创建默认选项的克隆请求（不开机、非模板、同文件夹）
    pub fn new(source_name: impl Into<String>, dest_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            dest_name: dest_name.into(),
            folder: None,
            power_on: false,
            template: false,
        }
    }
}

/// 提交克隆任务
///
/// 重定位规格默认沿用源虚拟机的资源池与数据存储。
pub async fn submit_clone(
    session: &dyn HypervisorSession,
    request: &CloneRequest,
) -> Result<TaskRef> {
    if request.dest_name.trim().is_empty() {
        return Err(ProvisionError::Validation("新虚拟机名称不能为空".to_string()));
    }

    let source = resolve(session, ObjectKind::VirtualMachine, &request.source_name)
        .await?
        .ok_or_else(|| ProvisionError::ObjectNotFound {
            kind: ObjectKind::VirtualMachine,
            name: request.source_name.clone(),
        })?;

    let folder = match &request.folder {
        Some(name) => resolve(session, ObjectKind::Folder, name)
            .await?
            .ok_or_else(|| ProvisionError::ObjectNotFound {
                kind: ObjectKind::Folder,
                name: name.clone(),
            })?,
        None => session.vm_parent_folder(&source).await?,
    };

    let spec = CloneSpec {
        location: RelocateSpec::default(),
        power_on: request.power_on,
        template: request.template,
    };

    let task = session
        .clone_vm(&source, &folder, &request.dest_name, &spec)
        .await?;

    info!(
        "已提交克隆任务 {}: {} -> {}",
        task.id(),
        request.source_name,
        request.dest_name
    );

    Ok(task)
}
