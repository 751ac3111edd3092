//! 任务等待
//!
//! 引擎唯一的同步点：所有对管理端的变更操作都是异步的，依赖步骤
//! 开始前必须在这里等到前序任务的终态。轮询通过 `tokio::time::sleep`
//! 让出线程，间隔按剩余期限收窄，整个等待受显式期限约束。

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use vmp_hypervisor::{HypervisorSession, TaskRef, TaskState};

use crate::{ProvisionError, Result};

/// 轮询参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AwaitOptions {
    /// 轮询间隔
    pub poll_interval: Duration,

    /// 等待期限；到期后返回超时，服务端任务不会被取消
    pub timeout: Duration,
}

impl Default for AwaitOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(600),
        }
    }
}

impl AwaitOptions {
    /// 校验参数
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(ProvisionError::Validation("轮询间隔必须大于 0".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(ProvisionError::Validation("等待期限必须大于 0".to_string()));
        }
        Ok(())
    }
}

/// 任务的成功结果
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    /// 服务端返回的结果载荷（可为空）
    pub result: Option<serde_json::Value>,
}

/// 等待任务到达终态
///
/// 只在三种情况下返回：任务成功（携带结果载荷）、任务失败
/// （[`ProvisionError::TaskFailed`]，服务端原因原样携带）、期限到达
/// （[`ProvisionError::TaskTimeout`]，服务端任务仍在执行，是否继续
/// 等待由调用方决定）。观察到终态后不再发起轮询。
pub async fn await_task(
    session: &dyn HypervisorSession,
    task: &TaskRef,
    options: AwaitOptions,
) -> Result<TaskOutcome> {
    options.validate()?;

    let started = Instant::now();
    let deadline = started + options.timeout;

    loop {
        let info = session.query_task(task).await?;

        match info.state {
            TaskState::Success => {
                info!("任务 {} 成功, 耗时 {:?}", task.id(), started.elapsed());
                return Ok(TaskOutcome {
                    result: info.result,
                });
            }
            TaskState::Error => {
                let fault = info.error.unwrap_or_else(|| vmp_hypervisor::TaskFault {
                    fault_type: None,
                    message: "服务端未提供失败原因".to_string(),
                });
                info!("任务 {} 失败: {}", task.id(), fault);
                return Err(ProvisionError::TaskFailed { fault });
            }
            TaskState::Queued | TaskState::Running => {
                let now = Instant::now();
                if now >= deadline {
                    return Err(ProvisionError::TaskTimeout {
                        waited: started.elapsed(),
                    });
                }

                let remaining = deadline - now;
                let pause = options.poll_interval.min(remaining);
                debug!("任务 {} 状态 {:?}, {} ms 后重试", task.id(), info.state, pause.as_millis());
                tokio::time::sleep(pause).await;
            }
        }
    }
}
