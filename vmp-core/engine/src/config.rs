//! 置备配置
//!
//! 批量配置文档的内存结构与流水线运行参数。流水线的全部行为
//! 由显式配置决定：失败策略、并发上限、轮询参数都在构造时校验，
//! 不存在驱动程序里的隐式全局默认值。

use serde::{Deserialize, Serialize};

use crate::spec::VmDescriptor;
use crate::task::AwaitOptions;
use crate::{ProvisionError, Result};

/// 管理端接入信息
///
/// 仅作为已解析文档的载体透传给会话提供方，引擎自身不消费
/// 凭据，也不负责建立连接。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EsxiEndpoint {
    /// 管理端地址
    pub host: String,

    /// 用户名
    pub user: String,

    /// 密码
    pub password: String,
}

/// 批量配置文档
///
/// 对应外部 JSON 结构
/// `{esxi: {host, user, password}, datastore, vms: [...]}`。
/// 文件读取与解析是驱动程序的职责，引擎只消费解析后的结构。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// 管理端接入信息
    pub esxi: EsxiEndpoint,

    /// 目标数据存储名称
    pub datastore: String,

    /// 虚拟机描述列表
    pub vms: Vec<VmDescriptor>,
}

/// 批内失败策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// 任一虚拟机失败后不再调度尚未开始的虚拟机
    FailFast,
    /// 记录失败并继续处理其余虚拟机
    ContinueOnError,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self::ContinueOnError
    }
}

/// 流水线配置
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// 目标数据存储名称
    pub datastore: String,

    /// 失败策略
    pub failure_policy: FailurePolicy,

    /// 并发置备的虚拟机数上限，避免压垮管理端任务队列
    pub max_concurrency: usize,

    /// 任务轮询参数
    pub await_options: AwaitOptions,
}

impl PipelineConfig {
    /// 创建默认参数的流水线配置
    pub fn new(datastore: impl Into<String>) -> Self {
        Self {
            datastore: datastore.into(),
            failure_policy: FailurePolicy::default(),
            max_concurrency: default_max_concurrency(),
            await_options: AwaitOptions::default(),
        }
    }

    /// 校验所有字段
    pub fn validate(&self) -> Result<()> {
        if self.datastore.trim().is_empty() {
            return Err(ProvisionError::Validation("数据存储名称不能为空".to_string()));
        }
        if self.max_concurrency == 0 {
            return Err(ProvisionError::Validation("并发上限必须大于 0".to_string()));
        }
        self.await_options.validate()
    }
}

fn default_max_concurrency() -> usize {
    4
}
