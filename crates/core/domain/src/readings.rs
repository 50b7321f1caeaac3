//! 读数记录：每帧解码后生成的领域对象。
//!
//! 记录在一次解码/路由周期内构造并交给存储协作者，核心不持有缓存。

/// 设备状态读数（遥测段 0x01）。
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceStatusReading {
    /// 设备名（按点名表位置解析）
    pub dev_name: String,
    /// 是否处于激活状态（原始字节非零）
    pub active: bool,
    /// 采集时间戳（毫秒）
    pub ts_ms: i64,
}

/// 传感器模拟量读数（遥测段 0x02，REAL32）。
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub dev_name: String,
    pub value: f32,
    pub ts_ms: i64,
}

/// 喷涂进度/速率读数（遥测段 0x03）。
#[derive(Debug, Clone, PartialEq)]
pub struct SprayReading {
    pub dev_name: String,
    pub rate: f64,
    pub ts_ms: i64,
}

/// 产量读数（遥测段 0x04：index 0 = 当日每时，index 1 = 当月每周）。
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionReading {
    pub hourly: Option<i32>,
    pub weekly: Option<i32>,
    pub ts_ms: i64,
}

/// 报警事件（遥测段 0x00 的单个置位 bit）。
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmEvent {
    /// 报警设备名（按报警点名表位置解析）
    pub device: String,
    /// 位索引（低位起）
    pub bit_index: usize,
    /// 来源网关号（MBAP unit id）
    pub unit_id: u8,
    pub ts_ms: i64,
}

/// 单条读数记录：存储协作者一次接收一条。
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    DeviceStatus(DeviceStatusReading),
    Sensor(SensorReading),
    Spray(SprayReading),
    Production(ProductionReading),
}

impl Reading {
    /// 记录类别名，用于日志与指标标签。
    pub fn kind(&self) -> &'static str {
        match self {
            Reading::DeviceStatus(_) => "device_status",
            Reading::Sensor(_) => "sensor",
            Reading::Spray(_) => "spray_record",
            Reading::Production(_) => "production",
        }
    }
}
