//! 设备挂载
//!
//! 生成把 CD-ROM 挂到虚拟机上的有序设备变更列表：控制器条目先于
//! 依赖它的设备条目。key 分配前先查询虚拟机上已存在的设备，
//! 避开已占用的 key——对已带 IDE 控制器的虚拟机硬编码 key
//! 会导致冲突或设备覆盖。

use tracing::debug;

use vmp_hypervisor::{
    Cdrom, ConfigSpec, ConnectInfo, DeviceChange, DeviceKind, DeviceOperation, HypervisorSession,
    IdeController, IsoBacking, ObjectRef, VirtualDevice,
};

use crate::Result;

/// IDE 控制器 key 的起始值
const IDE_CONTROLLER_KEY_BASE: i32 = 200;

/// CD-ROM 设备 key 的起始值
const CDROM_KEY_BASE: i32 = 3000;

/// 从 base 起挑选第一个未被占用的 key
fn allocate_key(base: i32, used: &[i32]) -> i32 {
    let mut key = base;
    while used.contains(&key) {
        key += 1;
    }
    key
}

/// 构建 CD-ROM 挂载的重配置规格
///
/// 若虚拟机已有 0 号总线的 IDE 控制器则复用其 key，不再生成
/// 控制器 add 条目（控制器层面幂等）；否则先添加控制器。
/// 重复调用会挂上第二台 CD-ROM，需要严格幂等的调用方应先查询
/// 已有 CD-ROM 设备。
pub async fn build_cdrom_attachment(
    session: &dyn HypervisorSession,
    vm: &ObjectRef,
    iso_path: &str,
) -> Result<ConfigSpec> {
    let existing = session.vm_devices(vm).await?;
    let mut used_keys: Vec<i32> = existing.iter().map(|d| d.key).collect();

    let bus0_controller = existing.iter().find(
        |d| matches!(d.kind, DeviceKind::IdeController { bus_number } if bus_number == 0),
    );

    let mut device_change = Vec::new();

    let controller_key = match bus0_controller {
        Some(controller) => {
            debug!("{} 已有 IDE 控制器 (key={})，复用", vm, controller.key);
            controller.key
        }
        None => {
            let key = allocate_key(IDE_CONTROLLER_KEY_BASE, &used_keys);
            debug!("{} 无 IDE 控制器，分配 key={}", vm, key);
            // 新控制器的 key 也算已占用，后续 CD-ROM 分配不得撞上
            used_keys.push(key);
            device_change.push(DeviceChange {
                operation: DeviceOperation::Add,
                device: VirtualDevice::IdeController(IdeController {
                    key,
                    bus_number: 0,
                    device: vec![0],
                }),
            });
            key
        }
    };

    let cdrom_key = allocate_key(CDROM_KEY_BASE, &used_keys);

    // 单元号 = 该控制器上已有 CD-ROM 的数量
    let unit_number = existing
        .iter()
        .filter(|d| matches!(d.kind, DeviceKind::Cdrom { controller_key: ck } if ck == controller_key))
        .count() as i32;

    device_change.push(DeviceChange {
        operation: DeviceOperation::Add,
        device: VirtualDevice::Cdrom(Cdrom {
            key: cdrom_key,
            controller_key,
            unit_number,
            backing: IsoBacking {
                file_name: iso_path.to_string(),
            },
            connectable: ConnectInfo {
                start_connected: true,
                allow_guest_control: true,
                connected: true,
            },
        }),
    });

    Ok(ConfigSpec {
        device_change,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_key_skips_used() {
        assert_eq!(allocate_key(200, &[]), 200);
        assert_eq!(allocate_key(200, &[200]), 201);
        assert_eq!(allocate_key(3000, &[3000, 3001, 3002]), 3003);
        assert_eq!(allocate_key(3000, &[3001]), 3000);
    }
}
