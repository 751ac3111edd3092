//! 对象解析器
//!
//! 按类型和名称在会话库存中查找受管对象。名称精确匹配、大小写敏感，
//! 同名对象取遍历顺序中第一个命中——管理端不保证名称唯一，
//! 调用方不得依赖唯一性。

use tracing::{debug, warn};

use vmp_hypervisor::{HypervisorSession, ObjectKind, ObjectRef};

use crate::Result;

/// 解析命名对象
///
/// 未找到时返回 `Ok(None)`，由调用方决定缺失是否致命。
/// 每次调用创建一个临时库存视图，扫描结束后无论成败都释放；
/// 释放失败只记录告警，不掩盖扫描结果。
pub async fn resolve(
    session: &dyn HypervisorSession,
    kind: ObjectKind,
    name: &str,
) -> Result<Option<ObjectRef>> {
    debug!("解析对象: {} \"{}\"", kind, name);

    let view = session.create_view(kind).await?;

    let scan = session.list_view(&view).await;

    if let Err(e) = session.destroy_view(view).await {
        warn!("释放库存视图失败: {}", e);
    }

    let items = scan?;
    let found = items.into_iter().find(|item| item.name == name);

    match &found {
        Some(item) => debug!("解析命中: {}", item.object),
        None => debug!("解析未命中: {} \"{}\"", kind, name),
    }

    Ok(found.map(|item| item.object))
}
