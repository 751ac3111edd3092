//! 测试用的内存版管理端会话
//!
//! 代替外部会话提供方：库存、设备表与任务脚本都在内存里，
//! 任务的状态序列可按虚拟机逐台编排，同时统计提交与视图次数，
//! 供各测试断言引擎行为。

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use vmp_hypervisor::{
    CloneSpec, ConfigSpec, DeviceSummary, HypervisorError, HypervisorSession, InventoryItem,
    InventoryRoot, ObjectKind, ObjectRef, Result, TaskInfo, TaskRef, TaskState, ViewHandle,
};

#[derive(Default)]
struct FakeState {
    /// 每种类型的库存对象，遍历顺序与插入顺序一致
    inventory: HashMap<ObjectKind, Vec<(String, ObjectRef)>>,

    /// 虚拟机 id -> 已存在设备
    devices: HashMap<String, Vec<DeviceSummary>>,

    /// 虚拟机 id -> 父文件夹
    parents: HashMap<String, ObjectRef>,

    /// 任务 id -> 剩余状态序列（最后一个快照重复返回）
    tasks: HashMap<String, VecDeque<TaskInfo>>,

    /// 任务 id -> 被查询次数
    query_counts: HashMap<String, usize>,

    /// 虚拟机名 -> 创建任务的状态脚本
    create_scripts: HashMap<String, Vec<TaskInfo>>,

    /// 虚拟机 id -> 重配置任务的状态脚本
    reconfigure_scripts: HashMap<String, Vec<TaskInfo>>,

    create_submissions: Vec<ConfigSpec>,
    reconfigure_submissions: Vec<(String, ConfigSpec)>,
    clone_submissions: Vec<(String, String, CloneSpec)>,

    views_created: usize,
    views_destroyed: usize,
    fail_list_view: bool,

    next_task: usize,
    next_view: usize,
    next_object: usize,
}

pub struct FakeHypervisor {
    id: Uuid,
    state: Mutex<FakeState>,
    vm_folder: ObjectRef,
    resource_pool: ObjectRef,
}

impl FakeHypervisor {
    pub fn new() -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            state: Mutex::new(FakeState::default()),
            vm_folder: ObjectRef::new(ObjectKind::Folder, "folder-root", id),
            resource_pool: ObjectRef::new(ObjectKind::ResourcePool, "pool-root", id),
        }
    }

    fn alloc_object(&self, state: &mut FakeState, kind: ObjectKind) -> ObjectRef {
        state.next_object += 1;
        ObjectRef::new(kind, format!("obj-{}", state.next_object), self.id)
    }

    /// 向库存注入一台已存在的虚拟机
    pub fn add_vm(&self, name: &str) -> ObjectRef {
        let mut state = self.state.lock().unwrap();
        let vm = self.alloc_object(&mut state, ObjectKind::VirtualMachine);
        state
            .inventory
            .entry(ObjectKind::VirtualMachine)
            .or_default()
            .push((name.to_string(), vm.clone()));
        state.devices.entry(vm.id().to_string()).or_default();
        state
            .parents
            .insert(vm.id().to_string(), self.vm_folder.clone());
        vm
    }

    /// 向库存注入一个文件夹
    pub fn add_folder(&self, name: &str) -> ObjectRef {
        let mut state = self.state.lock().unwrap();
        let folder = self.alloc_object(&mut state, ObjectKind::Folder);
        state
            .inventory
            .entry(ObjectKind::Folder)
            .or_default()
            .push((name.to_string(), folder.clone()));
        folder
    }

    /// 设置某台虚拟机上已存在的设备
    pub fn set_devices(&self, vm: &ObjectRef, devices: Vec<DeviceSummary>) {
        let mut state = self.state.lock().unwrap();
        state.devices.insert(vm.id().to_string(), devices);
    }

    /// 编排某台虚拟机创建任务的状态序列
    pub fn script_create(&self, vm_name: &str, script: Vec<TaskInfo>) {
        let mut state = self.state.lock().unwrap();
        state.create_scripts.insert(vm_name.to_string(), script);
    }

    /// 编排某台虚拟机重配置任务的状态序列
    pub fn script_reconfigure(&self, vm: &ObjectRef, script: Vec<TaskInfo>) {
        let mut state = self.state.lock().unwrap();
        state
            .reconfigure_scripts
            .insert(vm.id().to_string(), script);
    }

    /// 让后续的 list_view 调用失败
    pub fn fail_list_view(&self) {
        self.state.lock().unwrap().fail_list_view = true;
    }

    pub fn create_count(&self) -> usize {
        self.state.lock().unwrap().create_submissions.len()
    }

    pub fn reconfigure_count(&self) -> usize {
        self.state.lock().unwrap().reconfigure_submissions.len()
    }

    pub fn clone_count(&self) -> usize {
        self.state.lock().unwrap().clone_submissions.len()
    }

    pub fn last_reconfigure(&self) -> Option<(String, ConfigSpec)> {
        self.state.lock().unwrap().reconfigure_submissions.last().cloned()
    }

    pub fn last_clone(&self) -> Option<(String, String, CloneSpec)> {
        self.state.lock().unwrap().clone_submissions.last().cloned()
    }

    pub fn views_created(&self) -> usize {
        self.state.lock().unwrap().views_created
    }

    pub fn views_destroyed(&self) -> usize {
        self.state.lock().unwrap().views_destroyed
    }

    pub fn query_count(&self, task: &TaskRef) -> usize {
        self.state
            .lock()
            .unwrap()
            .query_counts
            .get(task.id())
            .copied()
            .unwrap_or(0)
    }

    /// 注册一个任务并返回句柄；script 为空时默认一步成功
    pub fn register_task(&self, script: Vec<TaskInfo>) -> TaskRef {
        let mut state = self.state.lock().unwrap();
        self.register_task_locked(&mut state, script)
    }

    fn register_task_locked(&self, state: &mut FakeState, script: Vec<TaskInfo>) -> TaskRef {
        state.next_task += 1;
        let id = format!("task-{}", state.next_task);
        let script = if script.is_empty() {
            vec![TaskInfo::success(None)]
        } else {
            script
        };
        state.tasks.insert(id.clone(), script.into());
        TaskRef::new(id, self.id)
    }

    fn check_ref(&self, object: &ObjectRef) -> Result<()> {
        if !object.is_bound_to(self.id) {
            return Err(HypervisorError::InvalidRef(object.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl HypervisorSession for FakeHypervisor {
    fn session_id(&self) -> Uuid {
        self.id
    }

    async fn inventory_root(&self) -> Result<InventoryRoot> {
        Ok(InventoryRoot {
            vm_folder: self.vm_folder.clone(),
            resource_pool: self.resource_pool.clone(),
        })
    }

    async fn create_view(&self, kind: ObjectKind) -> Result<ViewHandle> {
        let mut state = self.state.lock().unwrap();
        state.views_created += 1;
        state.next_view += 1;
        Ok(ViewHandle::new(
            format!("view-{}-{}", kind, state.next_view),
            self.id,
        ))
    }

    async fn list_view(&self, view: &ViewHandle) -> Result<Vec<InventoryItem>> {
        if !view.is_bound_to(self.id) {
            return Err(HypervisorError::ViewGone(view.id().to_string()));
        }
        let state = self.state.lock().unwrap();
        if state.fail_list_view {
            return Err(HypervisorError::ApiError(503, "视图扫描失败".to_string()));
        }

        // 视图 id 形如 view-{kind}-{n}
        let kind_str = view
            .id()
            .split('-')
            .nth(1)
            .ok_or_else(|| HypervisorError::ViewGone(view.id().to_string()))?;

        let items = state
            .inventory
            .iter()
            .filter(|(kind, _)| kind.as_str() == kind_str)
            .flat_map(|(_, entries)| entries.iter())
            .map(|(name, object)| InventoryItem {
                name: name.clone(),
                object: object.clone(),
            })
            .collect();
        Ok(items)
    }

    async fn destroy_view(&self, view: ViewHandle) -> Result<()> {
        if !view.is_bound_to(self.id) {
            return Err(HypervisorError::ViewGone(view.id().to_string()));
        }
        self.state.lock().unwrap().views_destroyed += 1;
        Ok(())
    }

    async fn create_vm(
        &self,
        folder: &ObjectRef,
        pool: &ObjectRef,
        spec: &ConfigSpec,
    ) -> Result<TaskRef> {
        self.check_ref(folder)?;
        self.check_ref(pool)?;

        let mut state = self.state.lock().unwrap();
        state.create_submissions.push(spec.clone());

        let name = spec.name.clone().unwrap_or_default();
        let script = state
            .create_scripts
            .get(&name)
            .cloned()
            .unwrap_or_else(|| vec![TaskInfo::running(), TaskInfo::success(None)]);

        // 创建成功的脚本意味着任务完成后虚拟机进入库存
        let will_succeed = script
            .iter()
            .any(|info| info.state == TaskState::Success);
        if will_succeed {
            let vm = self.alloc_object(&mut state, ObjectKind::VirtualMachine);
            state
                .inventory
                .entry(ObjectKind::VirtualMachine)
                .or_default()
                .push((name, vm.clone()));
            state.devices.entry(vm.id().to_string()).or_default();
            state
                .parents
                .insert(vm.id().to_string(), self.vm_folder.clone());
        }

        Ok(self.register_task_locked(&mut state, script))
    }

    async fn reconfigure_vm(&self, vm: &ObjectRef, spec: &ConfigSpec) -> Result<TaskRef> {
        self.check_ref(vm)?;

        let mut state = self.state.lock().unwrap();
        state
            .reconfigure_submissions
            .push((vm.id().to_string(), spec.clone()));

        let script = state
            .reconfigure_scripts
            .get(vm.id())
            .cloned()
            .unwrap_or_else(|| vec![TaskInfo::success(None)]);
        Ok(self.register_task_locked(&mut state, script))
    }

    async fn clone_vm(
        &self,
        source: &ObjectRef,
        folder: &ObjectRef,
        name: &str,
        spec: &CloneSpec,
    ) -> Result<TaskRef> {
        self.check_ref(source)?;
        self.check_ref(folder)?;

        let mut state = self.state.lock().unwrap();
        state
            .clone_submissions
            .push((source.id().to_string(), name.to_string(), spec.clone()));
        Ok(self.register_task_locked(&mut state, vec![TaskInfo::success(None)]))
    }

    async fn query_task(&self, task: &TaskRef) -> Result<TaskInfo> {
        if !task.is_bound_to(self.id) {
            return Err(HypervisorError::TaskGone(task.id().to_string()));
        }

        let mut state = self.state.lock().unwrap();
        *state.query_counts.entry(task.id().to_string()).or_insert(0) += 1;

        let script = state
            .tasks
            .get_mut(task.id())
            .ok_or_else(|| HypervisorError::TaskGone(task.id().to_string()))?;

        // 最后一个快照重复返回，模拟停留在某个状态的任务
        if script.len() > 1 {
            Ok(script.pop_front().expect("script non-empty"))
        } else {
            script
                .front()
                .cloned()
                .ok_or_else(|| HypervisorError::TaskGone(task.id().to_string()))
        }
    }

    async fn vm_devices(&self, vm: &ObjectRef) -> Result<Vec<DeviceSummary>> {
        self.check_ref(vm)?;
        let state = self.state.lock().unwrap();
        Ok(state.devices.get(vm.id()).cloned().unwrap_or_default())
    }

    async fn vm_parent_folder(&self, vm: &ObjectRef) -> Result<ObjectRef> {
        self.check_ref(vm)?;
        let state = self.state.lock().unwrap();
        state
            .parents
            .get(vm.id())
            .cloned()
            .ok_or_else(|| HypervisorError::ApiError(404, format!("虚拟机 {} 不存在", vm)))
    }
}
