//! VMP 置备引擎
//!
//! 面向虚拟化管理端的虚拟机批量置备核心：解析命名对象、构建配置
//! 规格、编排设备变更、轮询异步任务，并把一批虚拟机描述逐台推进到
//! 明确的成功或失败终态。
//!
//! # 组成
//!
//! - **对象解析** ([`resolver`]): 按类型和名称在会话库存中查找受管对象
//! - **规格构建** ([`spec`]): 把声明式描述翻译为创建规格（纯函数）
//! - **设备挂载** ([`device`]): 生成有序设备变更列表，key 分配避开已占用值
//! - **任务等待** ([`task`]): 轮询异步任务到终态，超时与失败区分上报
//! - **克隆编排** ([`clone`]): 解析源虚拟机并提交克隆任务（不阻塞等待）
//! - **置备流水线** ([`pipeline`]): 按批处理描述，受限并发，失败策略显式可配
//!
//! # 示例
//!
//! ```ignore
//! use std::sync::Arc;
//! use vmp_engine::{PipelineConfig, ProvisionPipeline};
//!
//! let config = PipelineConfig::new("datastore1");
//! let pipeline = ProvisionPipeline::new(session, config)?;
//! let report = pipeline.run(batch.vms).await?;
//! println!("成功 {} 台, 失败 {} 台", report.succeeded, report.failed);
//! ```
//!
//! 引擎内部不做任何隐式重试；重试由调用方以整台虚拟机为粒度发起
//! （规格构建是确定性的，重复提交得到相同规格）。

pub mod clone;
pub mod config;
pub mod device;
pub mod pipeline;
pub mod resolver;
pub mod spec;
pub mod task;

pub use clone::{submit_clone, CloneRequest};
pub use config::{BatchConfig, EsxiEndpoint, FailurePolicy, PipelineConfig};
pub use device::build_cdrom_attachment;
pub use pipeline::{BatchReport, ProvisionPipeline, VmReport, VmState};
pub use resolver::resolve;
pub use spec::{build_create_spec, VmDescriptor};
pub use task::{await_task, AwaitOptions, TaskOutcome};

use thiserror::Error;
use vmp_hypervisor::{HypervisorError, ObjectKind, TaskFault};

/// 置备引擎错误
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// 描述校验失败，尚未发起任何网络调用
    #[error("描述校验失败: {0}")]
    Validation(String),

    /// 解析器未找到目标对象
    #[error("对象不存在: {kind} \"{name}\"")]
    ObjectNotFound { kind: ObjectKind, name: String },

    /// 服务端上报任务失败，原因原样携带
    #[error("任务失败: {fault}")]
    TaskFailed { fault: TaskFault },

    /// 轮询超时，服务端任务可能仍在执行
    #[error("等待任务超时 ({waited:?})，服务端任务可能仍在执行")]
    TaskTimeout { waited: std::time::Duration },

    /// 会话层错误，原样上抛
    #[error("虚拟化层错误: {0}")]
    Hypervisor(#[from] HypervisorError),
}

/// 置备引擎结果类型
pub type Result<T> = std::result::Result<T, ProvisionError>;
