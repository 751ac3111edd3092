//! 异步任务模型
//!
//! 管理端的所有变更操作都是异步的：提交后返回一个任务句柄，
//! 由调用方轮询到终态。任务状态只向前推进，`Success`/`Error`
//! 之后不会回到 `Queued`/`Running`。

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    /// 排队中
    Queued,
    /// 执行中
    Running,
    /// 成功（终态）
    Success,
    /// 失败（终态）
    Error,
}

impl TaskState {
    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }
}

/// 任务句柄
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRef {
    id: String,
    session: Uuid,
}

impl TaskRef {
    /// 创建任务句柄（仅供会话实现使用）
    pub fn new(id: impl Into<String>, session: Uuid) -> Self {
        Self {
            id: id.into(),
            session,
        }
    }

    /// 任务标识
    pub fn id(&self) -> &str {
        &self.id
    }

    /// 句柄是否属于指定会话
    pub fn is_bound_to(&self, session: Uuid) -> bool {
        self.session == session
    }
}

/// 服务端上报的任务失败原因
///
/// 原因原样透传给调用方，不做摘要或改写。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFault {
    /// 故障类型（如 "InsufficientResourcesFault"）
    pub fault_type: Option<String>,

    /// 故障描述
    pub message: String,
}

impl std::fmt::Display for TaskFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.fault_type {
            Some(t) => write!(f, "{}: {}", t, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// 任务的一次状态快照
#[derive(Debug, Clone)]
pub struct TaskInfo {
    /// 当前状态
    pub state: TaskState,

    /// 成功时的结果载荷（可为空）
    pub result: Option<serde_json::Value>,

    /// 失败时的原因
    pub error: Option<TaskFault>,
}

impl TaskInfo {
    /// 排队中的快照
    pub fn queued() -> Self {
        Self {
            state: TaskState::Queued,
            result: None,
            error: None,
        }
    }

    /// 执行中的快照
    pub fn running() -> Self {
        Self {
            state: TaskState::Running,
            result: None,
            error: None,
        }
    }

    /// 成功的快照
    pub fn success(result: Option<serde_json::Value>) -> Self {
        Self {
            state: TaskState::Success,
            result,
            error: None,
        }
    }

    /// 失败的快照
    pub fn failed(fault: TaskFault) -> Self {
        Self {
            state: TaskState::Error,
            result: None,
            error: Some(fault),
        }
    }
}
