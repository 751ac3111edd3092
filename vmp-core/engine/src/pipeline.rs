//! 置备流水线
//!
//! 把一批虚拟机描述逐台推进到终态。单台虚拟机内部严格串行：
//! 创建任务到达成功终态之前绝不开始挂载设备；批内各台之间没有
//! 数据依赖，可在并发上限内并行，互相之间不保证顺序。
//!
//! 每台虚拟机的状态机:
//!
//! ```text
//! Pending -> Creating -> (CreateFailed | Created)
//!                          Created -> AttachingMedia -> (AttachFailed | Ready)
//!                          Created -> Ready            (无 ISO 时)
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use vmp_hypervisor::{HypervisorSession, InventoryRoot, ObjectKind};

use crate::config::{FailurePolicy, PipelineConfig};
use crate::device::build_cdrom_attachment;
use crate::resolver::resolve;
use crate::spec::{build_create_spec, VmDescriptor};
use crate::task::await_task;
use crate::Result;

/// 单台虚拟机的置备状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VmState {
    /// 尚未开始（失败策略生效时保持此状态被跳过）
    Pending,
    /// 创建任务已提交，等待终态
    Creating,
    /// 创建失败（终态）
    CreateFailed,
    /// 创建成功
    Created,
    /// 挂载任务已提交，等待终态
    AttachingMedia,
    /// 挂载失败（终态）
    AttachFailed,
    /// 置备完成（终态）
    Ready,
}

/// 单台虚拟机的置备结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VmReport {
    /// 虚拟机名称
    pub name: String,

    /// 最终状态
    pub state: VmState,

    /// 失败原因
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// 创建任务 id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_task: Option<String>,

    /// 挂载任务 id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attach_task: Option<String>,
}

impl VmReport {
    fn pending(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: VmState::Pending,
            error: None,
            create_task: None,
            attach_task: None,
        }
    }

    fn fail(mut self, state: VmState, error: impl std::fmt::Display) -> Self {
        self.state = state;
        self.error = Some(error.to_string());
        self
    }
}

/// 批量置备报告
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// 开始时间
    pub started_at: DateTime<Utc>,

    /// 结束时间
    pub finished_at: DateTime<Utc>,

    /// 逐台结果，顺序与输入描述一致
    pub reports: Vec<VmReport>,

    /// 到达 Ready 的台数
    pub succeeded: usize,

    /// 创建或挂载失败的台数
    pub failed: usize,

    /// 因失败策略未开始的台数
    pub skipped: usize,
}

impl BatchReport {
    fn finalize(started_at: DateTime<Utc>, reports: Vec<VmReport>) -> Self {
        let succeeded = reports.iter().filter(|r| r.state == VmState::Ready).count();
        let failed = reports
            .iter()
            .filter(|r| matches!(r.state, VmState::CreateFailed | VmState::AttachFailed))
            .count();
        let skipped = reports.iter().filter(|r| r.state == VmState::Pending).count();

        Self {
            started_at,
            finished_at: Utc::now(),
            reports,
            succeeded,
            failed,
            skipped,
        }
    }
}

/// 置备流水线
pub struct ProvisionPipeline {
    session: Arc<dyn HypervisorSession>,
    config: PipelineConfig,
}

impl ProvisionPipeline {
    /// 创建流水线，配置在此处整体校验
    pub fn new(session: Arc<dyn HypervisorSession>, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { session, config })
    }

    /// 处理一批虚拟机描述
    ///
    /// 返回的报告覆盖每台虚拟机的终态；单台失败不会使整批返回
    /// `Err`，只有取不到库存根这类批级故障才会。
    pub async fn run(&self, descriptors: Vec<VmDescriptor>) -> Result<BatchReport> {
        let started_at = Utc::now();
        info!(
            "开始批量置备: {} 台, 并发上限 {}, 失败策略 {:?}",
            descriptors.len(),
            self.config.max_concurrency,
            self.config.failure_policy
        );

        let root = self.session.inventory_root().await?;

        let mut reports: Vec<VmReport> = descriptors
            .iter()
            .map(|d| VmReport::pending(&d.name))
            .collect();

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency));
        let aborted = Arc::new(AtomicBool::new(false));
        let mut join_set: JoinSet<(usize, VmReport)> = JoinSet::new();

        for (index, descriptor) in descriptors.into_iter().enumerate() {
            let session = Arc::clone(&self.session);
            let config = self.config.clone();
            let root = root.clone();
            let semaphore = Arc::clone(&semaphore);
            let aborted = Arc::clone(&aborted);

            join_set.spawn(async move {
                let permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return (index, VmReport::pending(&descriptor.name)),
                };

                if aborted.load(Ordering::SeqCst) {
                    info!("跳过 {}: 批已中止", descriptor.name);
                    return (index, VmReport::pending(&descriptor.name));
                }

                let report = provision_one(session.as_ref(), &root, &config, &descriptor).await;

                if config.failure_policy == FailurePolicy::FailFast
                    && matches!(report.state, VmState::CreateFailed | VmState::AttachFailed)
                {
                    warn!("{} 失败, 中止批内后续调度", descriptor.name);
                    aborted.store(true, Ordering::SeqCst);
                }

                drop(permit);
                (index, report)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, report)) => reports[index] = report,
                Err(e) => warn!("置备子任务异常退出: {}", e),
            }
        }

        let report = BatchReport::finalize(started_at, reports);
        info!(
            "批量置备结束: 成功 {}, 失败 {}, 跳过 {}",
            report.succeeded, report.failed, report.skipped
        );

        Ok(report)
    }
}

/// 置备单台虚拟机：创建 -> 等待 -> （可选）挂载 ISO -> 等待
async fn provision_one(
    session: &dyn HypervisorSession,
    root: &InventoryRoot,
    config: &PipelineConfig,
    descriptor: &VmDescriptor,
) -> VmReport {
    let mut report = VmReport::pending(&descriptor.name);

    let spec = match build_create_spec(descriptor, &config.datastore) {
        Ok(spec) => spec,
        Err(e) => {
            warn!("{} 描述校验失败: {}", descriptor.name, e);
            return report.fail(VmState::CreateFailed, e);
        }
    };

    report.state = VmState::Creating;
    info!("{}: 提交创建任务", descriptor.name);

    let create_task = match session
        .create_vm(&root.vm_folder, &root.resource_pool, &spec)
        .await
    {
        Ok(task) => task,
        Err(e) => return report.fail(VmState::CreateFailed, e),
    };
    report.create_task = Some(create_task.id().to_string());

    if let Err(e) = await_task(session, &create_task, config.await_options).await {
        warn!("{} 创建失败: {}", descriptor.name, e);
        return report.fail(VmState::CreateFailed, e);
    }

    report.state = VmState::Created;
    info!("{}: 创建完成", descriptor.name);

    let iso_path = match &descriptor.iso_path {
        Some(path) => path,
        None => {
            report.state = VmState::Ready;
            return report;
        }
    };

    report.state = VmState::AttachingMedia;

    let vm = match resolve(session, ObjectKind::VirtualMachine, &descriptor.name).await {
        Ok(Some(vm)) => vm,
        Ok(None) => {
            return report.fail(
                VmState::AttachFailed,
                format!("创建成功但在库存中未找到虚拟机 {}", descriptor.name),
            );
        }
        Err(e) => return report.fail(VmState::AttachFailed, e),
    };

    let attach_spec = match build_cdrom_attachment(session, &vm, iso_path).await {
        Ok(spec) => spec,
        Err(e) => return report.fail(VmState::AttachFailed, e),
    };

    let attach_task = match session.reconfigure_vm(&vm, &attach_spec).await {
        Ok(task) => task,
        Err(e) => return report.fail(VmState::AttachFailed, e),
    };
    report.attach_task = Some(attach_task.id().to_string());

    if let Err(e) = await_task(session, &attach_task, config.await_options).await {
        warn!("{} 挂载失败: {}", descriptor.name, e);
        return report.fail(VmState::AttachFailed, e);
    }

    report.state = VmState::Ready;
    info!("{}: 置备完成", descriptor.name);
    report
}
