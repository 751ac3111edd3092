//! 受管对象引用
//!
//! 管理端以"类型 + 不透明标识"的弱类型引用寻址库存对象。
//! [`ObjectRef`] 在此之上绑定产生它的会话 id：引用离开其会话即失去意义，
//! 会话实现可据此拒绝跨会话引用。

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 受管对象类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// 虚拟机
    VirtualMachine,
    /// 文件夹
    Folder,
    /// 资源池
    ResourcePool,
    /// 数据存储
    Datastore,
    /// 宿主机
    HostSystem,
}

impl ObjectKind {
    /// 管理端一侧的类型名
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VirtualMachine => "VirtualMachine",
            Self::Folder => "Folder",
            Self::ResourcePool => "ResourcePool",
            Self::Datastore => "Datastore",
            Self::HostSystem => "HostSystem",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 受管对象引用
///
/// 只能由会话实现或对象解析器构造，调用方不得手工拼装。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    kind: ObjectKind,
    id: String,
    session: Uuid,
}

impl ObjectRef {
    /// 创建对象引用（仅供会话实现使用）
    pub fn new(kind: ObjectKind, id: impl Into<String>, session: Uuid) -> Self {
        Self {
            kind,
            id: id.into(),
            session,
        }
    }

    /// 对象类型
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// 不透明标识
    pub fn id(&self) -> &str {
        &self.id
    }

    /// 引用是否属于指定会话
    pub fn is_bound_to(&self, session: Uuid) -> bool {
        self.session == session
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// 临时库存视图句柄
///
/// 由 `create_view` 创建，扫描完成后必须通过 `destroy_view` 释放。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewHandle {
    id: String,
    session: Uuid,
}

impl ViewHandle {
    /// 创建视图句柄（仅供会话实现使用）
    pub fn new(id: impl Into<String>, session: Uuid) -> Self {
        Self {
            id: id.into(),
            session,
        }
    }

    /// 视图标识
    pub fn id(&self) -> &str {
        &self.id
    }

    /// 句柄是否属于指定会话
    pub fn is_bound_to(&self, session: Uuid) -> bool {
        self.session == session
    }
}

/// 库存视图扫描得到的条目
#[derive(Debug, Clone)]
pub struct InventoryItem {
    /// 对象名称
    pub name: String,

    /// 对象引用
    pub object: ObjectRef,
}

/// 库存根部的默认放置位置
#[derive(Debug, Clone)]
pub struct InventoryRoot {
    /// 虚拟机文件夹
    pub vm_folder: ObjectRef,

    /// 资源池
    pub resource_pool: ObjectRef,
}
