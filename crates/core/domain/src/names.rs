//! 点名表：按段内位置把原始值映射到现场设备名。
//!
//! 表内容与控制器侧的上报顺序一一对应，超出表长的索引合成通用名。

/// 设备状态点名表（遥测段 0x01，14 项）。
pub const DEVICE_STATUS_NAMES: [&str; 14] = [
    "停止器1",
    "停止器2",
    "锁定机构1",
    "锁定机构2",
    "喷枪1",
    "喷枪2",
    "喷涂机1压力",
    "喷涂机2压力",
    "喷涂管路1压力",
    "喷涂管路2压力",
    "搅拌器1",
    "搅拌器2",
    "进料门",
    "出料门",
];

/// 传感器点名表（遥测段 0x02，7 项）。
pub const SENSOR_NAMES: [&str; 7] = [
    "涂料桶1液位",
    "涂料桶2液位",
    "喷涂管路1压力",
    "喷涂管路2压力",
    "喷涂机1压力",
    "喷涂机2压力",
    "上料管路实时压力",
];

/// 喷涂记录点名表（遥测段 0x03，3 项）。
pub const SPRAY_NAMES: [&str; 3] = ["机器人1进度", "机器人2进度", "相机"];

/// 报警点名表（遥测段 0x00，17 项）。
pub const ALARM_DEVICE_NAMES: [&str; 17] = [
    "停止器1",
    "停止器2",
    "锁定结构1",
    "锁定机构2",
    "机器人1地轨",
    "机器人2地轨",
    "机器人1",
    "机器人2",
    "喷涂机1",
    "喷涂机2",
    "压力传感器1",
    "压力传感器2",
    "压力传感器3",
    "压力传感器4",
    "压力传感器5",
    "搅拌器1",
    "搅拌器2",
];

/// 设备状态名，越界合成 `设备{n}`。
pub fn device_status_name(index: usize) -> String {
    DEVICE_STATUS_NAMES
        .get(index)
        .map(|name| (*name).to_string())
        .unwrap_or_else(|| format!("设备{}", index + 1))
}

/// 传感器名，越界合成 `传感器{n}`。
pub fn sensor_name(index: usize) -> String {
    SENSOR_NAMES
        .get(index)
        .map(|name| (*name).to_string())
        .unwrap_or_else(|| format!("传感器{}", index + 1))
}

/// 喷涂记录点名，越界合成 `喷涂点{n}`。
pub fn spray_name(index: usize) -> String {
    SPRAY_NAMES
        .get(index)
        .map(|name| (*name).to_string())
        .unwrap_or_else(|| format!("喷涂点{}", index + 1))
}

/// 报警设备名，越界合成 `报警设备{n}`。
pub fn alarm_device_name(index: usize) -> String {
    ALARM_DEVICE_NAMES
        .get(index)
        .map(|name| (*name).to_string())
        .unwrap_or_else(|| format!("报警设备{}", index + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_resolve_in_order() {
        assert_eq!(device_status_name(0), "停止器1");
        assert_eq!(device_status_name(13), "出料门");
        assert_eq!(sensor_name(6), "上料管路实时压力");
        assert_eq!(spray_name(2), "相机");
        assert_eq!(alarm_device_name(16), "搅拌器2");
    }

    #[test]
    fn out_of_table_index_synthesizes_name() {
        assert_eq!(device_status_name(14), "设备15");
        assert_eq!(sensor_name(7), "传感器8");
        assert_eq!(spray_name(3), "喷涂点4");
        assert_eq!(alarm_device_name(17), "报警设备18");
    }
}
